//! Post authoring: drafts, authorization, comments, deletion.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::repos::{
    CommentsRepo, CreateCommentParams, CreatePostParams, PostsRepo, PostsWriteRepo, RepoError,
    UpdatePostParams,
};
use crate::domain::entities::{CommentEntry, FeedEntry, PostRecord};

#[derive(Debug, Error)]
pub enum PostError {
    #[error("post not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Outcome of an authorization check on a post mutation.
///
/// Non-authors are not an error path: they are redirected to the post's
/// detail view. Modelling both arms forces callers to handle the
/// redirect case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditAccess {
    Allowed,
    RedirectTo(String),
}

/// Only the post's author may change it; everyone else is bounced to the
/// detail view without an error.
pub fn edit_access(post: &PostRecord, viewer_id: Uuid) -> EditAccess {
    if post.author_id == viewer_id {
        EditAccess::Allowed
    } else {
        EditAccess::RedirectTo(post_detail_path(post.id))
    }
}

pub fn post_detail_path(post_id: Uuid) -> String {
    format!("/posts/{post_id}")
}

/// A validated post draft ready for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub body: String,
    pub group_id: Option<Uuid>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl PostDraft {
    /// Validate raw form input. On failure the form is re-rendered with
    /// the field errors and nothing is persisted.
    pub fn parse(
        body: &str,
        group: Option<&str>,
        image: Option<&str>,
    ) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();

        let body = body.trim();
        if body.is_empty() {
            errors.push(FieldError {
                field: "body",
                message: "Post text must not be empty".to_string(),
            });
        }

        let group_id = match group.map(str::trim).filter(|raw| !raw.is_empty()) {
            None => None,
            Some(raw) => match Uuid::parse_str(raw) {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.push(FieldError {
                        field: "group",
                        message: "Select a group from the list".to_string(),
                    });
                    None
                }
            },
        };

        let image = image
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(str::to_string);

        if errors.is_empty() {
            Ok(Self {
                body: body.to_string(),
                group_id,
                image,
            })
        } else {
            Err(errors)
        }
    }
}

/// What the post detail view renders: the post with author and group,
/// the author's total post count, and the comment thread.
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub entry: FeedEntry,
    pub author_post_count: u64,
    pub comments: Vec<CommentEntry>,
}

/// Outcome of an author-gated mutation.
#[derive(Debug, Clone)]
pub enum MutationOutcome {
    Applied,
    RedirectTo(String),
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostsRepo>,
    posts_write: Arc<dyn PostsWriteRepo>,
    comments: Arc<dyn CommentsRepo>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        posts_write: Arc<dyn PostsWriteRepo>,
        comments: Arc<dyn CommentsRepo>,
    ) -> Self {
        Self {
            posts,
            posts_write,
            comments,
        }
    }

    pub async fn create(&self, author_id: Uuid, draft: PostDraft) -> Result<PostRecord, PostError> {
        let record = self
            .posts_write
            .create_post(CreatePostParams {
                body: draft.body,
                image: draft.image,
                author_id,
                group_id: draft.group_id,
            })
            .await?;

        Ok(record)
    }

    pub async fn detail(&self, id: Uuid) -> Result<PostDetail, PostError> {
        let entry = self
            .posts
            .find_entry(id)
            .await?
            .ok_or(PostError::NotFound)?;
        let author_post_count = self.posts.count_by_author(entry.post.author_id).await?;
        let comments = self.comments.list_for_post(id).await?;

        Ok(PostDetail {
            entry,
            author_post_count,
            comments,
        })
    }

    /// Look the post up and decide whether the viewer may edit it.
    pub async fn edit_target(
        &self,
        id: Uuid,
        viewer_id: Uuid,
    ) -> Result<(FeedEntry, EditAccess), PostError> {
        let entry = self
            .posts
            .find_entry(id)
            .await?
            .ok_or(PostError::NotFound)?;
        let access = edit_access(&entry.post, viewer_id);
        Ok((entry, access))
    }

    pub async fn update(
        &self,
        id: Uuid,
        viewer_id: Uuid,
        draft: PostDraft,
    ) -> Result<MutationOutcome, PostError> {
        let (_, access) = self.edit_target(id, viewer_id).await?;
        if let EditAccess::RedirectTo(target) = access {
            return Ok(MutationOutcome::RedirectTo(target));
        }

        self.posts_write
            .update_post(UpdatePostParams {
                id,
                body: draft.body,
                image: draft.image,
                group_id: draft.group_id,
            })
            .await?;

        Ok(MutationOutcome::Applied)
    }

    /// Deleting a post cascades to its comments in the store.
    pub async fn delete(&self, id: Uuid, viewer_id: Uuid) -> Result<MutationOutcome, PostError> {
        let (_, access) = self.edit_target(id, viewer_id).await?;
        if let EditAccess::RedirectTo(target) = access {
            return Ok(MutationOutcome::RedirectTo(target));
        }

        self.posts_write.delete_post(id).await?;
        Ok(MutationOutcome::Applied)
    }

    /// Attach a comment to a post. Blank comments are dropped without an
    /// error; the caller redirects back to the detail view either way.
    pub async fn add_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        body: &str,
    ) -> Result<(), PostError> {
        let body = body.trim();
        if body.is_empty() {
            return Ok(());
        }

        if self.posts.find_entry(post_id).await?.is_none() {
            return Err(PostError::NotFound);
        }

        self.comments
            .create_comment(CreateCommentParams {
                post_id,
                author_id,
                body: body.to_string(),
            })
            .await?;

        Ok(())
    }
}
