use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use blog_core::domain::User;
use blog_core::error::RepoError;
use blog_core::ports::{BaseRepository, UserRepository};

#[derive(Default)]
struct State {
    users: BTreeMap<i32, User>,
    next_id: i32,
}

/// User repository backed by a map behind an async RwLock.
#[derive(Default)]
pub struct InMemoryUserRepository {
    state: RwLock<State>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<User, i32> for InMemoryUserRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, RepoError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn save(&self, mut user: User) -> Result<User, RepoError> {
        let mut state = self.state.write().await;

        let taken = state
            .users
            .values()
            .any(|u| u.email == user.email && u.id != user.id);
        if taken {
            return Err(RepoError::Constraint("user.email_unique".to_string()));
        }

        let id = match user.id {
            Some(id) if state.users.contains_key(&id) => id,
            Some(_) => return Err(RepoError::NotFound),
            None => {
                state.next_id += 1;
                state.next_id
            }
        };
        user.id = Some(id);
        state.users.insert(id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: i32) -> Result<(), RepoError> {
        match self.state.write().await.users.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }
}
