pub mod course;
pub mod user;

pub use course::{Assignment, Course};
pub use user::{AssignmentProgress, Preferences, PreferencesPatch, PublicUser, Role, User, UserSummary};
