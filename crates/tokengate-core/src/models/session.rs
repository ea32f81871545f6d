//! Session domain model.
//!
//! A `Session` is never stored server-side. It is built once per
//! successful login and immediately projected into signed claims.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Login channel that produced a session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Local username/password.
    Form,
    /// Delegated external identity provider.
    Exter,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Form => "form",
            Channel::Exter => "exter",
        }
    }

    /// Select a channel from a request `mode` parameter.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    /// Anything other than `exter`, including an empty string, selects
    /// [`Channel::Form`].
    pub fn from_mode(mode: &str) -> Self {
        if mode.trim().eq_ignore_ascii_case("exter") {
            Channel::Exter
        } else {
            Channel::Form
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    /// Id of the request context the session was issued to.
    pub client_ref: String,
    pub channel: Channel,
    pub user_id: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub expired_at: DateTime<Utc>,
    /// Channel-specific payload. For `exter` sessions this is the raw
    /// token re-issued by the provider.
    #[serde(default)]
    pub data: Vec<u8>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expired_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn mode_selection_is_lenient() {
        assert_eq!(Channel::from_mode("exter"), Channel::Exter);
        assert_eq!(Channel::from_mode("EXTER"), Channel::Exter);
        assert_eq!(Channel::from_mode(" Exter "), Channel::Exter);
        assert_eq!(Channel::from_mode("form"), Channel::Form);
        assert_eq!(Channel::from_mode(""), Channel::Form);
        assert_eq!(Channel::from_mode("oauth"), Channel::Form);
    }

    #[test]
    fn channel_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Channel::Exter).unwrap(), "\"exter\"");
        let parsed: Channel = serde_json::from_str("\"form\"").unwrap();
        assert_eq!(parsed, Channel::Form);
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let now = Utc::now();
        let session = Session {
            client_ref: "req-1".into(),
            channel: Channel::Form,
            user_id: "u1".into(),
            display_name: "Alice".into(),
            created_at: now - Duration::seconds(10),
            expired_at: now,
            data: Vec::new(),
        };
        assert!(session.is_expired_at(now));
        assert!(!session.is_expired_at(now - Duration::seconds(1)));
    }
}
