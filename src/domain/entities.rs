//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRecord {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub created_at: OffsetDateTime,
}

/// A post as persisted. `created_at` is set once at creation and never
/// updated; `author_id` is never reassigned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub id: Uuid,
    pub body: String,
    pub image: Option<String>,
    pub author_id: Uuid,
    pub group_id: Option<Uuid>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentRecord {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub created_at: OffsetDateTime,
}

/// Directed follow edge: the follower receives the followee's posts in
/// their followed feed. Uniqueness of the (follower, followee) pair and
/// rejection of self-edges are enforced by the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowRecord {
    pub follower_id: Uuid,
    pub followee_id: Uuid,
    pub created_at: OffsetDateTime,
}

/// A post joined with what every listing view needs: its author and,
/// when present, its group. Built in one query so rendering never does
/// per-item lookups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedEntry {
    pub post: PostRecord,
    pub author: UserRecord,
    pub group: Option<GroupRecord>,
}

/// A comment joined with its author for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentEntry {
    pub comment: CommentRecord,
    pub author: UserRecord,
}
