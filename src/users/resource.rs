use serde::{Deserialize, Serialize};
use time::{format_description::FormatItem, macros::format_description, OffsetDateTime};

use crate::users::repo_types::{User, UserStatus};

const TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Public JSON shape of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResource {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub status: UserStatus,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<User> for UserResource {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            full_name: format!("{} {}", u.first_name, u.last_name),
            first_name: u.first_name,
            last_name: u.last_name,
            email: u.email,
            phone: u.phone,
            status: u.status,
            created_at: u.created_at.and_then(format_timestamp),
            updated_at: u.updated_at.and_then(format_timestamp),
        }
    }
}

fn format_timestamp(ts: OffsetDateTime) -> Option<String> {
    ts.format(TIMESTAMP_FORMAT).ok()
}
