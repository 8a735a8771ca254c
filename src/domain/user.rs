use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub external_id: String,
    pub display_name: Option<String>,
    #[serde(skip_serializing)]
    pub email: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Profile fields recorded when an external identifier is first seen.
#[derive(Debug, Clone, Copy)]
pub struct NewUser<'a> {
    pub external_id: &'a str,
    pub display_name: Option<&'a str>,
    pub email: Option<&'a str>,
}

impl<'a> NewUser<'a> {
    /// A user known only by its external identifier.
    pub fn anonymous(external_id: &'a str) -> Self {
        Self {
            external_id,
            display_name: None,
            email: None,
        }
    }
}
