//! Traits the storage adapters implement, and the shapes they exchange.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::{
    CommentEntry, CommentRecord, FeedEntry, GroupRecord, PostRecord, UserRecord,
};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("storage failure: {0}")]
    Persistence(String),
    #[error("unique constraint `{constraint}` violated")]
    Duplicate { constraint: String },
    #[error("record not found")]
    NotFound,
    #[error("rejected input: {message}")]
    InvalidInput { message: String },
    #[error("integrity violation: {message}")]
    Integrity { message: String },
    #[error("query timed out")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Ordering applied to a feed query. Always stated at the call site so a
/// reader of the caller can see which way the posts come back; the store
/// itself has no default ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOrdering {
    CreatedDesc,
    CreatedAsc,
}

/// Which slice of the post table a feed query covers.
#[derive(Debug, Clone, Copy)]
pub enum FeedFilter {
    /// Every post.
    Global,
    /// Posts attached to one group.
    Group(Uuid),
    /// Posts written by one author.
    Author(Uuid),
    /// Posts written by any author the given user follows.
    FollowedBy(Uuid),
}

#[derive(Debug, Clone)]
pub struct CreateUserParams {
    pub username: String,
}

#[derive(Debug, Clone)]
pub struct CreateGroupParams {
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub body: String,
    pub image: Option<String>,
    pub author_id: Uuid,
    pub group_id: Option<Uuid>,
}

/// Fields a post's author may change after creation. The author and the
/// creation timestamp are deliberately absent.
#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: Uuid,
    pub body: String,
    pub image: Option<String>,
    pub group_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct CreateCommentParams {
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError>;
}

#[async_trait]
pub trait GroupsRepo: Send + Sync {
    async fn create_group(&self, params: CreateGroupParams) -> Result<GroupRecord, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError>;

    /// All groups, ordered by title, for the post form's group picker.
    async fn list_all(&self) -> Result<Vec<GroupRecord>, RepoError>;

    /// Deleting a group keeps its posts; their group reference is
    /// nullified by the store, never cascaded.
    async fn delete_group(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// The full candidate set for one view, author and group pre-joined.
    /// Pagination is the caller's concern.
    async fn list_feed(
        &self,
        filter: FeedFilter,
        ordering: PostOrdering,
    ) -> Result<Vec<FeedEntry>, RepoError>;

    async fn find_entry(&self, id: Uuid) -> Result<Option<FeedEntry>, RepoError>;

    async fn count_by_author(&self, author_id: Uuid) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;

    /// Deletes the post; the store cascades to its comments.
    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    async fn create_comment(&self, params: CreateCommentParams)
    -> Result<CommentRecord, RepoError>;

    /// Comments of one post, oldest first, author pre-joined.
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentEntry>, RepoError>;
}

#[async_trait]
pub trait FollowsRepo: Send + Sync {
    /// Idempotent: inserting an existing edge is a no-op.
    async fn create_follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<(), RepoError>;

    async fn delete_follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<(), RepoError>;

    async fn follow_exists(&self, follower_id: Uuid, followee_id: Uuid)
    -> Result<bool, RepoError>;
}
