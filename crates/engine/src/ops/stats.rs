use sea_orm::{PaginatorTrait, QueryFilter, prelude::*};

use crate::{ResultEngine, participants, users};

use super::Engine;

/// Counters shown at the top of the dashboard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RosterStats {
    pub total_participants: u64,
    pub present_participants: u64,
    pub absent_participants: u64,
    pub total_users: u64,
}

impl Engine {
    pub async fn roster_stats(&self) -> ResultEngine<RosterStats> {
        let total_participants = participants::Entity::find().count(&self.database).await?;
        let present_participants = participants::Entity::find()
            .filter(participants::Column::Attended.eq(true))
            .count(&self.database)
            .await?;
        let total_users = users::Entity::find().count(&self.database).await?;

        Ok(RosterStats {
            total_participants,
            present_participants,
            absent_participants: total_participants.saturating_sub(present_participants),
            total_users,
        })
    }
}
