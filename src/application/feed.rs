//! Feed composition: the ordered candidate sets behind every listing view.
//!
//! The service only answers "which posts, in which order". Pagination is
//! layered on by the caller and the index response cache sits in front of
//! the HTTP handler, so neither concern leaks in here.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::repos::{
    FeedFilter, FollowsRepo, GroupsRepo, PostOrdering, PostsRepo, RepoError, UsersRepo,
};
use crate::domain::entities::{FeedEntry, GroupRecord, UserRecord};

/// Page size for the index, group, and followed-authors views.
pub const FEED_PAGE_SIZE: usize = 10;
/// Page size for profile views.
pub const PROFILE_PAGE_SIZE: usize = 2;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("unknown group")]
    UnknownGroup,
    #[error("unknown user")]
    UnknownUser,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// A group feed: the group itself plus its ordered posts.
#[derive(Debug, Clone)]
pub struct GroupFeed {
    pub group: GroupRecord,
    pub entries: Vec<FeedEntry>,
}

/// A profile feed: the owner's posts plus the derived facts the profile
/// page renders alongside them.
#[derive(Debug, Clone)]
pub struct ProfileFeed {
    pub owner: UserRecord,
    pub entries: Vec<FeedEntry>,
    pub post_count: u64,
    /// Whether the requesting viewer already follows the owner. Always
    /// false for anonymous viewers and for the owner's own profile.
    pub following: bool,
}

#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostsRepo>,
    groups: Arc<dyn GroupsRepo>,
    users: Arc<dyn UsersRepo>,
    follows: Arc<dyn FollowsRepo>,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        groups: Arc<dyn GroupsRepo>,
        users: Arc<dyn UsersRepo>,
        follows: Arc<dyn FollowsRepo>,
    ) -> Self {
        Self {
            posts,
            groups,
            users,
            follows,
        }
    }

    /// Every post on the site.
    pub async fn global_feed(&self, ordering: PostOrdering) -> Result<Vec<FeedEntry>, FeedError> {
        Ok(self.posts.list_feed(FeedFilter::Global, ordering).await?)
    }

    /// Posts belonging to the group with the given slug.
    pub async fn group_feed(
        &self,
        slug: &str,
        ordering: PostOrdering,
    ) -> Result<GroupFeed, FeedError> {
        let group = self
            .groups
            .find_by_slug(slug)
            .await?
            .ok_or(FeedError::UnknownGroup)?;

        let entries = self
            .posts
            .list_feed(FeedFilter::Group(group.id), ordering)
            .await?;

        Ok(GroupFeed { group, entries })
    }

    /// Posts authored by the named user, plus their total post count and
    /// whether `viewer` follows them.
    pub async fn profile_feed(
        &self,
        username: &str,
        viewer: Option<Uuid>,
        ordering: PostOrdering,
    ) -> Result<ProfileFeed, FeedError> {
        let owner = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(FeedError::UnknownUser)?;

        let entries = self
            .posts
            .list_feed(FeedFilter::Author(owner.id), ordering)
            .await?;
        let post_count = self.posts.count_by_author(owner.id).await?;

        let following = match viewer {
            Some(viewer_id) if viewer_id != owner.id => {
                self.follows.follow_exists(viewer_id, owner.id).await?
            }
            _ => false,
        };

        Ok(ProfileFeed {
            owner,
            entries,
            post_count,
            following,
        })
    }

    /// Posts authored by anyone the viewer follows. Empty when the viewer
    /// follows no one.
    pub async fn followed_feed(
        &self,
        viewer_id: Uuid,
        ordering: PostOrdering,
    ) -> Result<Vec<FeedEntry>, FeedError> {
        Ok(self
            .posts
            .list_feed(FeedFilter::FollowedBy(viewer_id), ordering)
            .await?)
    }
}
