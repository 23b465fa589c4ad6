use crate::domain_model::UserId;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PICTURE: &str = "https://res.cloudinary.com/acquaint/image/upload/default_pic.png";

/// Free-form "intro" section of a profile. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileDetails {
    pub bio: Option<String>,
    pub other_name: Option<String>,
    pub job: Option<String>,
    pub workplace: Option<String>,
    pub high_school: Option<String>,
    pub college: Option<String>,
    pub current_city: Option<String>,
    pub hometown: Option<String>,
    pub relationship: Option<String>,
    pub instagram: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub user_id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub picture: String,
}
