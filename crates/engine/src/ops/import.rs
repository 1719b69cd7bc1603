use sea_orm::{QueryFilter, TransactionTrait, prelude::*};

use crate::{ParticipantFields, ResultEngine, RosterRow, participants};

use super::{Engine, participants::insert_participant, with_tx};

impl Engine {
    /// Merge uploaded roster rows into the participants table.
    ///
    /// A row whose exact (name, surname) pair already exists is skipped and
    /// the existing participant keeps its role, company and attendance. Rows
    /// repeated inside the upload are inserted once. Everything runs in one
    /// transaction: on error nothing is imported. Returns how many
    /// participants were added.
    pub async fn import_roster(&self, rows: Vec<RosterRow>) -> ResultEngine<usize> {
        with_tx!(self, |db_tx| {
            let mut imported = 0;
            for row in rows {
                let existing = participants::Entity::find()
                    .filter(participants::Column::Name.eq(row.name.as_str()))
                    .filter(participants::Column::Surname.eq(row.surname.as_str()))
                    .one(&db_tx)
                    .await?;
                if existing.is_some() {
                    continue;
                }

                insert_participant(
                    &db_tx,
                    ParticipantFields {
                        name: row.name,
                        surname: row.surname,
                        role: row.role,
                        company: row.company,
                        attended: false,
                    },
                )
                .await?;
                imported += 1;
            }
            Ok(imported)
        })
    }
}
