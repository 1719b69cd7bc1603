//! The identity carried by a logged-in request.

use crate::{Role, users};

/// Proof of a successful login, bound to a user id and role.
///
/// The engine never stores sessions; the server serializes the identifying
/// part into a signed cookie and rebuilds a `Session` from the database on
/// every request via [`crate::Engine::session`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub user_id: i32,
    pub username: String,
    pub role: Role,
    /// Set on the bootstrap admin until its password is changed.
    pub must_change_password: bool,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl TryFrom<users::Model> for Session {
    type Error = crate::EngineError;

    fn try_from(model: users::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: model.id,
            role: Role::try_from(model.role.as_str())?,
            username: model.username,
            must_change_password: model.must_change_password,
        })
    }
}
