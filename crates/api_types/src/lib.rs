use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Human-readable outcome of an action, shown to the operator as a transient
/// notice.
#[derive(Debug, Serialize, Deserialize)]
pub struct Notice {
    pub message: String,
}

impl Notice {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Explicit boolean parsing for form-like inputs.
///
/// Accepts JSON booleans, the integers `0`/`1` and the strings `true`,
/// `false`, `1`, `0`, `on`, `off`, `yes`, `no` (any case) or `""`. Use with
/// `#[serde(default, deserialize_with = "api_types::flag::deserialize")]` so
/// that an absent field reads as `false`.
pub mod flag {
    use serde::{Deserialize, Deserializer, de::Error};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    pub fn parse(value: &str) -> Option<bool> {
        match value.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "on" | "yes" => Some(true),
            "false" | "0" | "off" | "no" | "" => Some(false),
            _ => None,
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Repr::deserialize(deserializer)? {
            Repr::Bool(value) => Ok(value),
            Repr::Int(0) => Ok(false),
            Repr::Int(1) => Ok(true),
            Repr::Int(other) => Err(D::Error::custom(format!("invalid flag: {other}"))),
            Repr::Text(text) => {
                parse(&text).ok_or_else(|| D::Error::custom(format!("invalid flag: {text}")))
            }
        }
    }
}

pub mod session {
    use super::*;
    use crate::user::UserRole;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Login {
        pub username: String,
        pub password: String,
    }

    /// The logged-in identity as seen by the client.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SessionView {
        pub user_id: i32,
        pub username: String,
        pub role: UserRole,
        /// When `true` only `/account/password` and `/logout` are usable.
        pub must_change_password: bool,
    }
}

pub mod account {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PasswordChange {
        pub current_password: String,
        pub new_password: String,
    }
}

pub mod participant {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ParticipantView {
        pub id: i32,
        pub name: String,
        pub surname: String,
        /// Job title.
        pub role: String,
        pub company: String,
        pub attended: bool,
        /// `Presente` or `Assente`.
        pub status: String,
        pub created_at: DateTime<Utc>,
    }

    /// Query string shared by the roster listings.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct Search {
        pub search: Option<String>,
    }

    /// New participant. Missing fields are stored as empty strings.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ParticipantNew {
        pub name: String,
        pub surname: String,
        pub role: String,
        pub company: String,
    }

    /// Full overwrite of a participant.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ParticipantUpdate {
        pub name: String,
        pub surname: String,
        pub role: String,
        pub company: String,
        /// Absent means not attended.
        #[serde(deserialize_with = "crate::flag::deserialize")]
        pub attended: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ParticipantSaved {
        pub message: String,
        pub participant: ParticipantView,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ParticipantDeleted {
        pub message: String,
        pub id: i32,
        /// `false` when the participant was already gone.
        pub deleted: bool,
    }

    /// Attendance toggle as sent by the dashboard: the status the operator
    /// currently sees, which is flipped.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AttendanceToggle {
        pub participant_id: i32,
        #[serde(default, deserialize_with = "crate::flag::deserialize")]
        pub current_status: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AttendanceToggled {
        pub message: String,
        pub participant_id: i32,
        pub attended: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ImportSummary {
        pub message: String,
        pub imported: usize,
    }
}

pub mod dashboard {
    use super::*;
    use crate::participant::ParticipantView;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Dashboard {
        pub total_participants: u64,
        pub present_participants: u64,
        pub absent_participants: u64,
        pub total_users: u64,
        pub search: String,
        pub participants: Vec<ParticipantView>,
    }
}

pub mod user {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum UserRole {
        Admin,
        Staff,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub id: i32,
        pub username: String,
        pub role: UserRole,
        pub must_change_password: bool,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserNew {
        pub username: String,
        pub password: String,
        pub role: UserRole,
    }

    /// Role is always applied; the password only when present and non-empty.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserUpdate {
        pub role: UserRole,
        #[serde(default)]
        pub new_password: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserSaved {
        pub message: String,
        pub user: UserView,
    }
}
