use std::sync::Arc;

use crate::config::Config;
use crate::mastery::{FileProfileStore, MasteryEngine};
use crate::models::{Course, User};
use crate::services::tutor::TutorService;
use crate::store::{JsonCollection, StoreError};

#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    users: Arc<JsonCollection<User>>,
    courses: Arc<JsonCollection<Course>>,
    mastery: Arc<MasteryEngine<FileProfileStore>>,
    tutor: Arc<TutorService>,
}

impl AppState {
    pub fn from_config(config: Config) -> Result<Self, StoreError> {
        std::fs::create_dir_all(&config.data_dir)?;

        let users = JsonCollection::open(config.data_dir.join("users.json"))?;
        let courses = JsonCollection::open(config.data_dir.join("courses.json"))?;
        let profile_store = FileProfileStore::new(config.data_dir.join("learning_rates"));

        Ok(Self {
            config: Arc::new(config),
            users: Arc::new(users),
            courses: Arc::new(courses),
            mastery: Arc::new(MasteryEngine::new(profile_store)),
            tutor: Arc::new(TutorService::from_env()),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn users(&self) -> &JsonCollection<User> {
        &self.users
    }

    pub fn courses(&self) -> &JsonCollection<Course> {
        &self.courses
    }

    pub fn mastery(&self) -> &MasteryEngine<FileProfileStore> {
        &self.mastery
    }

    pub fn tutor(&self) -> &TutorService {
        &self.tutor
    }
}
