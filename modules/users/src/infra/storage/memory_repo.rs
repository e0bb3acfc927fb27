//! Process-local user store. Everything is lost on restart.
use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::contract::model::User;
use crate::domain::repo::{UserDraft, UsersRepository};

#[derive(Debug)]
struct State {
    next_id: u64,
    users: BTreeMap<u64, User>,
}

/// In-memory implementation of [`UsersRepository`].
///
/// The id counter and the map share one lock, so concurrent inserts
/// always observe distinct, increasing ids.
#[derive(Debug)]
pub struct InMemoryUsersRepository {
    state: RwLock<State>,
}

impl Default for InMemoryUsersRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUsersRepository {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State {
                next_id: 1,
                users: BTreeMap::new(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.state.read().users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UsersRepository for InMemoryUsersRepository {
    async fn find_by_id(&self, id: u64) -> anyhow::Result<Option<User>> {
        Ok(self.state.read().users.get(&id).cloned())
    }

    async fn list(&self) -> anyhow::Result<Vec<User>> {
        Ok(self.state.read().users.values().cloned().collect())
    }

    async fn insert(&self, draft: UserDraft) -> anyhow::Result<User> {
        let mut state = self.state.write();
        let id = state.next_id;
        state.next_id = id
            .checked_add(1)
            .ok_or_else(|| anyhow::anyhow!("user id space exhausted"))?;
        let user = draft.with_id(id);
        state.users.insert(id, user.clone());
        Ok(user)
    }

    async fn update(&self, u: User) -> anyhow::Result<bool> {
        let mut state = self.state.write();
        match state.users.get_mut(&u.id) {
            Some(slot) => {
                *slot = u;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: u64) -> anyhow::Result<bool> {
        Ok(self.state.write().users.remove(&id).is_some())
    }
}
