use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A single submitted comment.
///
/// Persisted as `{"username", "content", "createdTime"}` with the creation
/// time stored as integer milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    username: String,
    content: String,
    #[serde(with = "jiff::fmt::serde::timestamp::millisecond::required")]
    created_time: Timestamp,
}

impl Comment {
    /// `created_time` is truncated to whole milliseconds, the precision it is
    /// stored with.
    pub fn new(username: String, content: String, created_time: Timestamp) -> Self {
        let created_time =
            Timestamp::from_millisecond(created_time.as_millisecond()).unwrap_or(created_time);
        Self {
            username,
            content,
            created_time,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_time(&self) -> Timestamp {
        self.created_time
    }
}
