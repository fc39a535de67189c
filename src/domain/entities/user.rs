use super::RecordId;
use serde::{Deserialize, Serialize};

/// Stable external identity of a user (the chat platform's user id)
pub type UserId = i64;

/// A registered user row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Last record opened by `sleep`; stays set after `wake` so the record can be annotated
    pub current_record: Option<RecordId>,
    pub is_asleep: bool,
}

/// Per-user state observed by the command processor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserState {
    Unregistered,
    Awake { last_record: Option<RecordId> },
    Asleep { open_record: RecordId },
}

impl UserState {
    pub fn of(user: Option<&User>) -> Self {
        match user {
            None => UserState::Unregistered,
            Some(User { is_asleep: true, current_record: Some(id), .. }) => {
                UserState::Asleep { open_record: *id }
            }
            Some(user) => UserState::Awake { last_record: user.current_record },
        }
    }

    pub fn is_asleep(&self) -> bool {
        matches!(self, UserState::Asleep { .. })
    }
}

/// Identity of whoever sent an inbound message
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sender {
    pub id: UserId,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

impl Sender {
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            username: None,
            first_name: None,
        }
    }

    pub fn with_first_name(mut self, first: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self
    }

    /// First name first, the way users are greeted
    pub fn display_name(&self) -> String {
        if let Some(ref first) = self.first_name {
            first.clone()
        } else if let Some(ref username) = self.username {
            username.clone()
        } else {
            self.id.to_string()
        }
    }
}
