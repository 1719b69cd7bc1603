//! The module contains `Participant` and its table.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// Label shown for participants who checked in.
pub const PRESENT_LABEL: &str = "Presente";
/// Label shown for participants who did not check in yet.
pub const ABSENT_LABEL: &str = "Assente";

/// A roster entry.
///
/// `role` is the participant's free-text job title and has nothing to do
/// with [`crate::Role`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Participant {
    pub id: i32,
    pub name: String,
    pub surname: String,
    pub role: String,
    pub company: String,
    pub attended: bool,
    pub created_at: DateTime<Utc>,
}

impl Participant {
    /// Human readable attendance status.
    pub fn status_label(&self) -> &'static str {
        if self.attended {
            PRESENT_LABEL
        } else {
            ABSENT_LABEL
        }
    }
}

impl From<Model> for Participant {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            surname: model.surname,
            role: model.role,
            company: model.company,
            attended: model.attended,
            created_at: model.created_at,
        }
    }
}

/// Editable fields of a participant.
///
/// Used both for inserts (where `attended` is ignored and forced to `false`)
/// and for full overwrites.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParticipantFields {
    pub name: String,
    pub surname: String,
    pub role: String,
    pub company: String,
    pub attended: bool,
}

impl ParticipantFields {
    /// Strip surrounding whitespace from the text fields, as uploads are.
    pub(crate) fn trimmed(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            surname: self.surname.trim().to_string(),
            role: self.role.trim().to_string(),
            company: self.company.trim().to_string(),
            attended: self.attended,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "participants")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub surname: String,
    pub role: String,
    pub company: String,
    pub attended: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
