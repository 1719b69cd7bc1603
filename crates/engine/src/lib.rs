//! Roster and staff-account logic for the event check-in desk.
//!
//! [`Engine`] owns the database connection and exposes one async method per
//! operation; every write runs inside its own transaction.

pub use error::EngineError;
pub use ops::{Bootstrap, Engine, EngineBuilder, RosterStats};
pub use participants::{ABSENT_LABEL, PRESENT_LABEL, Participant, ParticipantFields};
pub use password::{generate_password, hash_password, verify_password};
pub use session::Session;
pub use spreadsheet::{RosterRow, export_csv, export_xlsx, parse_roster};
pub use users::{Role, User};

mod error;
mod ops;
mod participants;
mod password;
mod session;
pub mod spreadsheet;
mod users;

type ResultEngine<T> = Result<T, EngineError>;
