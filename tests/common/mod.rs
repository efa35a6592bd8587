use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};

use axum::Router;
use tempfile::TempDir;

static ROOT: OnceLock<TempDir> = OnceLock::new();
static ENV_LOCK: Mutex<()> = Mutex::new(());
static APP_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Builds an app over a fresh data directory. Environment mutation is
/// serialized; the returned state captured its paths, so later calls don't
/// affect it.
pub fn create_test_app() -> Router {
    let root = ROOT.get_or_init(|| tempfile::tempdir().expect("create temp data dir"));
    let _guard = ENV_LOCK.lock().expect("env lock");

    let dir = root
        .path()
        .join(format!("app-{}", APP_COUNTER.fetch_add(1, Ordering::SeqCst)));
    std::fs::create_dir_all(&dir).expect("create app data dir");

    std::env::set_var("NODE_ENV", "test");
    std::env::set_var("JWT_SECRET", "integration-test-secret");
    std::env::set_var("DATA_DIR", &dir);
    std::env::remove_var("GEMINI_API_KEY");

    intellilearn_backend::create_app().expect("create app")
}
