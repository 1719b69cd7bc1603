use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};

use crate::{
    EngineError, ResultEngine, Session,
    password::{hash_password, verify_against_dummy, verify_password},
    users,
};

use super::{Engine, require_password, with_tx};

impl Engine {
    /// Check a username/password pair and open a session for it.
    ///
    /// Unknown usernames and wrong passwords both yield
    /// [`EngineError::InvalidCredentials`] after the same amount of hashing
    /// work.
    pub async fn authenticate(&self, username: &str, password: &str) -> ResultEngine<Session> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.database)
            .await?;

        let Some(user) = user else {
            verify_against_dummy(password);
            return Err(EngineError::InvalidCredentials);
        };

        if !verify_password(password, &user.password)? {
            return Err(EngineError::InvalidCredentials);
        }

        Session::try_from(user)
    }

    /// Rebuild the session of `user_id` from the current database row.
    ///
    /// Returns `None` when the user no longer exists, so stale cookies stop
    /// working. Role changes take effect on the next request.
    pub async fn session(&self, user_id: i32) -> ResultEngine<Option<Session>> {
        users::Entity::find_by_id(user_id)
            .one(&self.database)
            .await?
            .map(Session::try_from)
            .transpose()
    }

    /// Change the password of the logged-in user.
    ///
    /// The current password must be supplied and the new one must differ from
    /// it. Clears the forced-rotation flag of the bootstrap admin.
    pub async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> ResultEngine<()> {
        require_password(new_password, "new password")?;
        if current_password == new_password {
            return Err(EngineError::InvalidInput(
                "new password must differ from the current one".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let user = users::Entity::find_by_id(user_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("user {user_id}")))?;

            if !verify_password(current_password, &user.password)? {
                return Err(EngineError::InvalidCredentials);
            }

            let active = users::ActiveModel {
                id: ActiveValue::Set(user.id),
                password: ActiveValue::Set(hash_password(new_password)?),
                must_change_password: ActiveValue::Set(false),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            Ok(())
        })
    }
}
