//! Follow management between authors.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::repos::{FollowsRepo, RepoError, UsersRepo};
use crate::domain::entities::UserRecord;

#[derive(Debug, Error)]
pub enum FollowError {
    #[error("unknown user")]
    UnknownUser,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct ProfileService {
    users: Arc<dyn UsersRepo>,
    follows: Arc<dyn FollowsRepo>,
}

impl ProfileService {
    pub fn new(users: Arc<dyn UsersRepo>, follows: Arc<dyn FollowsRepo>) -> Self {
        Self { users, follows }
    }

    /// Start following `username`. Following yourself is a silent no-op;
    /// following someone twice is idempotent.
    pub async fn follow(&self, viewer: &UserRecord, username: &str) -> Result<(), FollowError> {
        if viewer.username == username {
            return Ok(());
        }

        let target = self.lookup(username).await?;
        if target.id == viewer.id {
            // Username spoofing aside, ids are authoritative for self-checks.
            return Ok(());
        }

        self.follows.create_follow(viewer.id, target.id).await?;
        Ok(())
    }

    /// Stop following `username`. Removing an absent edge is a no-op.
    pub async fn unfollow(&self, viewer: &UserRecord, username: &str) -> Result<(), FollowError> {
        let target = self.lookup(username).await?;
        self.follows.delete_follow(viewer.id, target.id).await?;
        Ok(())
    }

    async fn lookup(&self, username: &str) -> Result<UserRecord, FollowError> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or(FollowError::UnknownUser)
    }
}
