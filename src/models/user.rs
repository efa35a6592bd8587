use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Parent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub dark_mode: bool,
    pub notifications: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            dark_mode: false,
            notifications: true,
        }
    }
}

/// Partial preference update: absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesPatch {
    pub dark_mode: Option<bool>,
    pub notifications: Option<bool>,
}

impl Preferences {
    pub fn merge(&mut self, patch: PreferencesPatch) {
        if let Some(dark_mode) = patch.dark_mode {
            self.dark_mode = dark_mode;
        }
        if let Some(notifications) = patch.notifications {
            self.notifications = notifications;
        }
    }
}

/// A student's standing on one course assignment, stamped onto the student
/// when the teacher publishes the assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentProgress {
    pub course_id: String,
    pub assignment_id: String,
    pub status: String,
    pub attempts: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub preferences: Preferences,
    // Students enroll in courses and accumulate assignment progress;
    // teachers own courses and a roster; parents link children. All four
    // lists stay empty for the roles they don't apply to.
    #[serde(default)]
    pub enrolled_courses: Vec<String>,
    #[serde(default)]
    pub achievements: Vec<AssignmentProgress>,
    #[serde(default)]
    pub courses: Vec<String>,
    #[serde(default)]
    pub students: Vec<String>,
    #[serde(default)]
    pub children: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: String, name: String, password_hash: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email,
            name,
            password_hash,
            role,
            avatar: None,
            preferences: Preferences::default(),
            enrolled_courses: Vec::new(),
            achievements: Vec::new(),
            courses: Vec::new(),
            students: Vec::new(),
            children: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
            avatar: self.avatar.clone(),
            preferences: self.preferences.clone(),
            enrolled_courses: self.enrolled_courses.clone(),
            achievements: self.achievements.clone(),
            courses: self.courses.clone(),
            students: self.students.clone(),
            children: self.children.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn to_summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

/// Wire shape of a user: everything but the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub preferences: Preferences,
    pub enrolled_courses: Vec<String>,
    pub achievements: Vec<AssignmentProgress>,
    pub courses: Vec<String>,
    pub students: Vec<String>,
    pub children: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Minimal fields for roster and leaderboard listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_view_omits_password_hash() {
        let user = User::new(
            "s@example.com".into(),
            "Sam".into(),
            "$2b$10$hash".into(),
            Role::Student,
        );
        let json = serde_json::to_value(user.to_public()).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["role"], "student");
    }

    #[test]
    fn preferences_merge_is_partial() {
        let mut prefs = Preferences::default();
        prefs.merge(PreferencesPatch {
            dark_mode: Some(true),
            notifications: None,
        });
        assert!(prefs.dark_mode);
        assert!(prefs.notifications);
    }
}
