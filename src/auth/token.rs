//! The session token stored inside the encrypted auth cookie.

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::UserID;

/// Identifies the logged in user and when their session ends.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Token {
    pub user_id: UserID,

    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl Token {
    /// Create a token for `user_id` that expires `duration` after `now`.
    pub fn new(user_id: UserID, now: OffsetDateTime, duration: Duration) -> Self {
        Self {
            user_id,
            expires_at: now.saturating_add(duration),
        }
    }

    /// Whether the session is over at `now`.
    ///
    /// The cookie expiry is enforced by the browser, but a client can keep
    /// sending a cookie past its expiry so it is checked on the server too.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}
