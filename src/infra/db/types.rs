use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{
    CommentEntry, CommentRecord, FeedEntry, GroupRecord, PostRecord, UserRecord,
};

#[derive(sqlx::FromRow)]
pub(crate) struct UserRow {
    pub(crate) id: Uuid,
    pub(crate) username: String,
    pub(crate) created_at: OffsetDateTime,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct GroupRow {
    pub(crate) id: Uuid,
    pub(crate) title: String,
    pub(crate) slug: String,
    pub(crate) description: String,
    pub(crate) created_at: OffsetDateTime,
}

impl From<GroupRow> for GroupRecord {
    fn from(row: GroupRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct PostRow {
    pub(crate) id: Uuid,
    pub(crate) body: String,
    pub(crate) image: Option<String>,
    pub(crate) author_id: Uuid,
    pub(crate) group_id: Option<Uuid>,
    pub(crate) created_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            body: row.body,
            image: row.image,
            author_id: row.author_id,
            group_id: row.group_id,
            created_at: row.created_at,
        }
    }
}

/// One row of the post/author/group join. Group columns come back null
/// when the post has no group or the group was deleted out from under it.
#[derive(sqlx::FromRow)]
pub(crate) struct FeedEntryRow {
    pub(crate) id: Uuid,
    pub(crate) body: String,
    pub(crate) image: Option<String>,
    pub(crate) author_id: Uuid,
    pub(crate) group_id: Option<Uuid>,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) author_username: String,
    pub(crate) author_created_at: OffsetDateTime,
    pub(crate) group_title: Option<String>,
    pub(crate) group_slug: Option<String>,
    pub(crate) group_description: Option<String>,
    pub(crate) group_created_at: Option<OffsetDateTime>,
}

impl From<FeedEntryRow> for FeedEntry {
    fn from(row: FeedEntryRow) -> Self {
        let group = match (
            row.group_id,
            row.group_title,
            row.group_slug,
            row.group_description,
            row.group_created_at,
        ) {
            (Some(id), Some(title), Some(slug), Some(description), Some(created_at)) => {
                Some(GroupRecord {
                    id,
                    title,
                    slug,
                    description,
                    created_at,
                })
            }
            _ => None,
        };

        Self {
            post: PostRecord {
                id: row.id,
                body: row.body,
                image: row.image,
                author_id: row.author_id,
                group_id: row.group_id,
                created_at: row.created_at,
            },
            author: UserRecord {
                id: row.author_id,
                username: row.author_username,
                created_at: row.author_created_at,
            },
            group,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct CommentEntryRow {
    pub(crate) id: Uuid,
    pub(crate) post_id: Uuid,
    pub(crate) author_id: Uuid,
    pub(crate) body: String,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) author_username: String,
    pub(crate) author_created_at: OffsetDateTime,
}

impl From<CommentEntryRow> for CommentEntry {
    fn from(row: CommentEntryRow) -> Self {
        Self {
            comment: CommentRecord {
                id: row.id,
                post_id: row.post_id,
                author_id: row.author_id,
                body: row.body,
                created_at: row.created_at,
            },
            author: UserRecord {
                id: row.author_id,
                username: row.author_username,
                created_at: row.author_created_at,
            },
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct CommentRow {
    pub(crate) id: Uuid,
    pub(crate) post_id: Uuid,
    pub(crate) author_id: Uuid,
    pub(crate) body: String,
    pub(crate) created_at: OffsetDateTime,
}

impl From<CommentRow> for CommentRecord {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            author_id: row.author_id,
            body: row.body,
            created_at: row.created_at,
        }
    }
}
