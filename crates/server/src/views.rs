//! Conversions between engine values and the JSON shapes of `api_types`.

use api_types::{
    participant::ParticipantView,
    session::SessionView,
    user::{UserRole, UserView},
};
use engine::{Participant, Role, Session, User};

pub(crate) fn api_role(role: Role) -> UserRole {
    match role {
        Role::Admin => UserRole::Admin,
        Role::Staff => UserRole::Staff,
    }
}

pub(crate) fn engine_role(role: UserRole) -> Role {
    match role {
        UserRole::Admin => Role::Admin,
        UserRole::Staff => Role::Staff,
    }
}

pub(crate) fn participant_view(participant: Participant) -> ParticipantView {
    let status = participant.status_label().to_string();
    ParticipantView {
        id: participant.id,
        name: participant.name,
        surname: participant.surname,
        role: participant.role,
        company: participant.company,
        attended: participant.attended,
        status,
        created_at: participant.created_at,
    }
}

pub(crate) fn user_view(user: User) -> UserView {
    UserView {
        id: user.id,
        username: user.username,
        role: api_role(user.role),
        must_change_password: user.must_change_password,
        created_at: user.created_at,
    }
}

pub(crate) fn session_view(session: &Session) -> SessionView {
    SessionView {
        user_id: session.user_id,
        username: session.username.clone(),
        role: api_role(session.role),
        must_change_password: session.must_change_password,
    }
}
