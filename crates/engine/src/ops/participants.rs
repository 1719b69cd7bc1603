use chrono::Utc;
use sea_orm::{
    ActiveValue, Condition, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
    sea_query::{Expr, LikeExpr},
};

use crate::{EngineError, Participant, ParticipantFields, ResultEngine, participants};

use super::{Engine, LIKE_ESCAPE, escape_like, with_tx};

/// Text columns the roster search looks into.
const SEARCH_COLUMNS: [&str; 4] = ["name", "surname", "company", "role"];

/// Build the search condition: `query` is a case-insensitive substring of
/// any of [`SEARCH_COLUMNS`]. Blank queries match everything.
///
/// SQLite `LOWER()` folds ASCII only, so the query is folded the same way;
/// non-ASCII letters match with their exact case.
fn search_condition(query: Option<&str>) -> Condition {
    let Some(query) = query.map(str::trim).filter(|q| !q.is_empty()) else {
        return Condition::all();
    };

    let pattern = format!("%{}%", escape_like(&query.to_ascii_lowercase()));
    SEARCH_COLUMNS
        .iter()
        .fold(Condition::any(), |condition, column| {
            condition.add(
                Expr::expr(Expr::cust(format!("LOWER({column})")))
                    .like(LikeExpr::new(pattern.clone()).escape(LIKE_ESCAPE)),
            )
        })
}

impl Engine {
    /// Participants matching `search`, ordered by name then surname.
    pub async fn participants(&self, search: Option<&str>) -> ResultEngine<Vec<Participant>> {
        let models = participants::Entity::find()
            .filter(search_condition(search))
            .order_by_asc(participants::Column::Name)
            .order_by_asc(participants::Column::Surname)
            .order_by_asc(participants::Column::Id)
            .all(&self.database)
            .await?;

        Ok(models.into_iter().map(Participant::from).collect())
    }

    pub async fn participant(&self, participant_id: i32) -> ResultEngine<Participant> {
        participants::Entity::find_by_id(participant_id)
            .one(&self.database)
            .await?
            .map(Participant::from)
            .ok_or_else(|| EngineError::KeyNotFound(format!("participant {participant_id}")))
    }

    /// Add a participant. New participants are always absent.
    pub async fn add_participant(&self, fields: ParticipantFields) -> ResultEngine<Participant> {
        with_tx!(self, |db_tx| {
            let model = insert_participant(&db_tx, fields.trimmed()).await?;
            Ok(Participant::from(model))
        })
    }

    /// Overwrite every editable field of a participant, attendance included.
    pub async fn update_participant(
        &self,
        participant_id: i32,
        fields: ParticipantFields,
    ) -> ResultEngine<Participant> {
        let fields = fields.trimmed();
        with_tx!(self, |db_tx| {
            participants::Entity::find_by_id(participant_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| {
                    EngineError::KeyNotFound(format!("participant {participant_id}"))
                })?;

            let active = participants::ActiveModel {
                id: ActiveValue::Set(participant_id),
                name: ActiveValue::Set(fields.name),
                surname: ActiveValue::Set(fields.surname),
                role: ActiveValue::Set(fields.role),
                company: ActiveValue::Set(fields.company),
                attended: ActiveValue::Set(fields.attended),
                created_at: ActiveValue::NotSet,
            };
            let model = active.update(&db_tx).await?;
            Ok(Participant::from(model))
        })
    }

    /// Delete a participant. Returns whether a row was removed; deleting an
    /// unknown id is not an error.
    pub async fn delete_participant(&self, participant_id: i32) -> ResultEngine<bool> {
        let result = participants::Entity::delete_by_id(participant_id)
            .exec(&self.database)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Flip attendance from what the caller believes it is.
    ///
    /// The new value is `!current_status`, written unconditionally: there is
    /// no check that the stored value still equals `current_status`, so two
    /// concurrent toggles sent from the same stale view both land on the same
    /// end state. Returns the value written.
    pub async fn toggle_attendance(
        &self,
        participant_id: i32,
        current_status: bool,
    ) -> ResultEngine<bool> {
        let attended = !current_status;
        let result = participants::Entity::update_many()
            .col_expr(participants::Column::Attended, Expr::value(attended))
            .filter(participants::Column::Id.eq(participant_id))
            .exec(&self.database)
            .await?;

        if result.rows_affected == 0 {
            return Err(EngineError::KeyNotFound(format!(
                "participant {participant_id}"
            )));
        }
        Ok(attended)
    }
}

pub(super) async fn insert_participant<C: ConnectionTrait>(
    db: &C,
    fields: ParticipantFields,
) -> ResultEngine<participants::Model> {
    let active = participants::ActiveModel {
        id: ActiveValue::NotSet,
        name: ActiveValue::Set(fields.name),
        surname: ActiveValue::Set(fields.surname),
        role: ActiveValue::Set(fields.role),
        company: ActiveValue::Set(fields.company),
        attended: ActiveValue::Set(false),
        created_at: ActiveValue::Set(Utc::now()),
    };
    Ok(active.insert(db).await?)
}
