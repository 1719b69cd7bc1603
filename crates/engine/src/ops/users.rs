use chrono::Utc;
use sea_orm::{
    ActiveValue, PaginatorTrait, QueryFilter, QueryOrder, SqlErr, TransactionTrait, prelude::*,
};

use crate::{EngineError, ResultEngine, Role, User, password::hash_password, users};

use super::{Engine, normalize_required, require_password, with_tx};

/// Outcome of [`Engine::ensure_bootstrap_admin`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Bootstrap {
    /// Users already exist; nothing was written.
    Skipped,
    /// The first admin was created and must rotate its password at login.
    Created(User),
}

/// Turn a unique-index violation on `users.username` into `ExistingKey`.
fn map_duplicate_username(err: DbErr, username: &str) -> EngineError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => EngineError::ExistingKey(username.to_string()),
        _ => EngineError::Database(err),
    }
}

impl Engine {
    /// Create a staff account. The password is hashed before storage.
    ///
    /// A taken username fails with [`EngineError::ExistingKey`] and leaves the
    /// existing account untouched.
    pub async fn create_user(&self, username: &str, password: &str, role: Role) -> ResultEngine<User> {
        self.insert_user(username, password, role, false).await
    }

    async fn insert_user(
        &self,
        username: &str,
        password: &str,
        role: Role,
        must_change_password: bool,
    ) -> ResultEngine<User> {
        let username = normalize_required(username, "username")?;
        require_password(password, "password")?;
        let hash = hash_password(password)?;

        with_tx!(self, |db_tx| {
            let active = users::ActiveModel {
                id: ActiveValue::NotSet,
                username: ActiveValue::Set(username.clone()),
                password: ActiveValue::Set(hash),
                role: ActiveValue::Set(role.as_str().to_string()),
                must_change_password: ActiveValue::Set(must_change_password),
                created_at: ActiveValue::Set(Utc::now()),
            };
            let model = active
                .insert(&db_tx)
                .await
                .map_err(|err| map_duplicate_username(err, &username))?;
            User::try_from(model)
        })
    }

    /// Update the role of a user and, when `new_password` is non-empty, its
    /// password. An empty or absent password leaves the stored hash as is.
    pub async fn update_user(
        &self,
        user_id: i32,
        role: Role,
        new_password: Option<&str>,
    ) -> ResultEngine<User> {
        let new_hash = match new_password.filter(|p| !p.is_empty()) {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };

        with_tx!(self, |db_tx| {
            let model = users::Entity::find_by_id(user_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("user {user_id}")))?;

            let mut active: users::ActiveModel = model.into();
            active.role = ActiveValue::Set(role.as_str().to_string());
            if let Some(hash) = new_hash {
                active.password = ActiveValue::Set(hash);
            }
            let model = active.update(&db_tx).await?;
            User::try_from(model)
        })
    }

    /// Set a new password for `username` and clear its rotation flag.
    ///
    /// Meant for operators with direct database access (admin CLI).
    pub async fn reset_password(&self, username: &str, new_password: &str) -> ResultEngine<()> {
        require_password(new_password, "password")?;
        let hash = hash_password(new_password)?;

        with_tx!(self, |db_tx| {
            let model = users::Entity::find()
                .filter(users::Column::Username.eq(username))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(username.to_string()))?;

            let mut active: users::ActiveModel = model.into();
            active.password = ActiveValue::Set(hash);
            active.must_change_password = ActiveValue::Set(false);
            active.update(&db_tx).await?;
            Ok(())
        })
    }

    /// All users, newest first.
    pub async fn users(&self) -> ResultEngine<Vec<User>> {
        users::Entity::find()
            .order_by_desc(users::Column::CreatedAt)
            .order_by_desc(users::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    pub async fn user_count(&self) -> ResultEngine<u64> {
        Ok(users::Entity::find().count(&self.database).await?)
    }

    /// Create the first admin account when the users table is empty.
    ///
    /// The account is flagged so its password must be changed before any
    /// roster route can be used.
    pub async fn ensure_bootstrap_admin(
        &self,
        username: &str,
        password: &str,
    ) -> ResultEngine<Bootstrap> {
        if self.user_count().await? > 0 {
            return Ok(Bootstrap::Skipped);
        }

        match self.insert_user(username, password, Role::Admin, true).await {
            Ok(user) => Ok(Bootstrap::Created(user)),
            // Another process bootstrapped between the count and the insert.
            Err(EngineError::ExistingKey(_)) => Ok(Bootstrap::Skipped),
            Err(err) => Err(err),
        }
    }
}
