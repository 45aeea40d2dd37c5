//! In-memory repository implementations for service-level tests.
//!
//! The store mirrors the relational semantics the Postgres adapters rely
//! on: strictly increasing creation timestamps, comment cascade on post
//! deletion, group nullification on group deletion, and follow-edge
//! uniqueness with self-edges rejected.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicI64, Ordering},
};

use async_trait::async_trait;
use time::{Duration, OffsetDateTime, macros::datetime};
use uuid::Uuid;

use rostra::application::repos::{
    CommentsRepo, CreateCommentParams, CreateGroupParams, CreatePostParams, CreateUserParams,
    FeedFilter, FollowsRepo, GroupsRepo, PostOrdering, PostsRepo, PostsWriteRepo, RepoError,
    UpdatePostParams, UsersRepo,
};
use rostra::domain::entities::{
    CommentEntry, CommentRecord, FeedEntry, FollowRecord, GroupRecord, PostRecord, UserRecord,
};

const TIME_BASE: OffsetDateTime = datetime!(2024-01-01 00:00 UTC);

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<UserRecord>>,
    groups: Mutex<Vec<GroupRecord>>,
    posts: Mutex<Vec<PostRecord>>,
    comments: Mutex<Vec<CommentRecord>>,
    follows: Mutex<Vec<FollowRecord>>,
    ticks: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn next_timestamp(&self) -> OffsetDateTime {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
        TIME_BASE + Duration::seconds(tick)
    }

    fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn user_by_id(&self, id: Uuid) -> Option<UserRecord> {
        Self::lock(&self.users)
            .iter()
            .find(|user| user.id == id)
            .cloned()
    }

    fn group_by_id(&self, id: Uuid) -> Option<GroupRecord> {
        Self::lock(&self.groups)
            .iter()
            .find(|group| group.id == id)
            .cloned()
    }

    fn entry_for(&self, post: &PostRecord) -> Result<FeedEntry, RepoError> {
        let author = self
            .user_by_id(post.author_id)
            .ok_or_else(|| RepoError::from_persistence("post author missing"))?;
        let group = post.group_id.and_then(|group_id| self.group_by_id(group_id));

        Ok(FeedEntry {
            post: post.clone(),
            author,
            group,
        })
    }
}

#[async_trait]
impl UsersRepo for MemoryStore {
    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError> {
        let mut users = Self::lock(&self.users);
        if users.iter().any(|user| user.username == params.username) {
            return Err(RepoError::Duplicate {
                constraint: "users_username_key".to_string(),
            });
        }

        let record = UserRecord {
            id: Uuid::new_v4(),
            username: params.username,
            created_at: self.next_timestamp(),
        };
        users.push(record.clone());
        Ok(record)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError> {
        Ok(Self::lock(&self.users)
            .iter()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError> {
        Ok(self.user_by_id(id))
    }
}

#[async_trait]
impl GroupsRepo for MemoryStore {
    async fn create_group(&self, params: CreateGroupParams) -> Result<GroupRecord, RepoError> {
        let mut groups = Self::lock(&self.groups);
        if groups.iter().any(|group| group.slug == params.slug) {
            return Err(RepoError::Duplicate {
                constraint: "post_groups_slug_key".to_string(),
            });
        }

        let record = GroupRecord {
            id: Uuid::new_v4(),
            title: params.title,
            slug: params.slug,
            description: params.description,
            created_at: self.next_timestamp(),
        };
        groups.push(record.clone());
        Ok(record)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError> {
        Ok(Self::lock(&self.groups)
            .iter()
            .find(|group| group.slug == slug)
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<GroupRecord>, RepoError> {
        let mut groups = Self::lock(&self.groups).clone();
        groups.sort_by(|left, right| left.title.cmp(&right.title));
        Ok(groups)
    }

    async fn delete_group(&self, id: Uuid) -> Result<(), RepoError> {
        let mut groups = Self::lock(&self.groups);
        let before = groups.len();
        groups.retain(|group| group.id != id);
        if groups.len() == before {
            return Err(RepoError::NotFound);
        }
        drop(groups);

        // Mirrors ON DELETE SET NULL: the group's posts survive.
        for post in Self::lock(&self.posts).iter_mut() {
            if post.group_id == Some(id) {
                post.group_id = None;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl PostsRepo for MemoryStore {
    async fn list_feed(
        &self,
        filter: FeedFilter,
        ordering: PostOrdering,
    ) -> Result<Vec<FeedEntry>, RepoError> {
        let posts = Self::lock(&self.posts).clone();

        let mut selected: Vec<PostRecord> = match filter {
            FeedFilter::Global => posts,
            FeedFilter::Group(group_id) => posts
                .into_iter()
                .filter(|post| post.group_id == Some(group_id))
                .collect(),
            FeedFilter::Author(author_id) => posts
                .into_iter()
                .filter(|post| post.author_id == author_id)
                .collect(),
            FeedFilter::FollowedBy(viewer_id) => {
                let followees: Vec<Uuid> = Self::lock(&self.follows)
                    .iter()
                    .filter(|edge| edge.follower_id == viewer_id)
                    .map(|edge| edge.followee_id)
                    .collect();
                posts
                    .into_iter()
                    .filter(|post| followees.contains(&post.author_id))
                    .collect()
            }
        };

        match ordering {
            PostOrdering::CreatedDesc => {
                selected.sort_by(|left, right| right.created_at.cmp(&left.created_at));
            }
            PostOrdering::CreatedAsc => {
                selected.sort_by(|left, right| left.created_at.cmp(&right.created_at));
            }
        }

        selected.iter().map(|post| self.entry_for(post)).collect()
    }

    async fn find_entry(&self, id: Uuid) -> Result<Option<FeedEntry>, RepoError> {
        let post = Self::lock(&self.posts)
            .iter()
            .find(|post| post.id == id)
            .cloned();
        match post {
            Some(post) => Ok(Some(self.entry_for(&post)?)),
            None => Ok(None),
        }
    }

    async fn count_by_author(&self, author_id: Uuid) -> Result<u64, RepoError> {
        Ok(Self::lock(&self.posts)
            .iter()
            .filter(|post| post.author_id == author_id)
            .count() as u64)
    }
}

#[async_trait]
impl PostsWriteRepo for MemoryStore {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let record = PostRecord {
            id: Uuid::new_v4(),
            body: params.body,
            image: params.image,
            author_id: params.author_id,
            group_id: params.group_id,
            created_at: self.next_timestamp(),
        };
        Self::lock(&self.posts).push(record.clone());
        Ok(record)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let mut posts = Self::lock(&self.posts);
        let post = posts
            .iter_mut()
            .find(|post| post.id == params.id)
            .ok_or(RepoError::NotFound)?;

        post.body = params.body;
        post.image = params.image;
        post.group_id = params.group_id;
        Ok(post.clone())
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let mut posts = Self::lock(&self.posts);
        let before = posts.len();
        posts.retain(|post| post.id != id);
        if posts.len() == before {
            return Err(RepoError::NotFound);
        }
        drop(posts);

        // Mirrors ON DELETE CASCADE on comments.post_id.
        Self::lock(&self.comments).retain(|comment| comment.post_id != id);
        Ok(())
    }
}

#[async_trait]
impl CommentsRepo for MemoryStore {
    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let record = CommentRecord {
            id: Uuid::new_v4(),
            post_id: params.post_id,
            author_id: params.author_id,
            body: params.body,
            created_at: self.next_timestamp(),
        };
        Self::lock(&self.comments).push(record.clone());
        Ok(record)
    }

    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentEntry>, RepoError> {
        let mut comments: Vec<CommentRecord> = Self::lock(&self.comments)
            .iter()
            .filter(|comment| comment.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|left, right| left.created_at.cmp(&right.created_at));

        comments
            .into_iter()
            .map(|comment| {
                let author = self
                    .user_by_id(comment.author_id)
                    .ok_or_else(|| RepoError::from_persistence("comment author missing"))?;
                Ok(CommentEntry { comment, author })
            })
            .collect()
    }
}

#[async_trait]
impl FollowsRepo for MemoryStore {
    async fn create_follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<(), RepoError> {
        if follower_id == followee_id {
            return Err(RepoError::Integrity {
                message: "follows_check: self-follow rejected".to_string(),
            });
        }

        let mut follows = Self::lock(&self.follows);
        let exists = follows
            .iter()
            .any(|edge| edge.follower_id == follower_id && edge.followee_id == followee_id);
        if !exists {
            follows.push(FollowRecord {
                follower_id,
                followee_id,
                created_at: self.next_timestamp(),
            });
        }
        Ok(())
    }

    async fn delete_follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<(), RepoError> {
        Self::lock(&self.follows)
            .retain(|edge| !(edge.follower_id == follower_id && edge.followee_id == followee_id));
        Ok(())
    }

    async fn follow_exists(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
    ) -> Result<bool, RepoError> {
        Ok(Self::lock(&self.follows)
            .iter()
            .any(|edge| edge.follower_id == follower_id && edge.followee_id == followee_id))
    }
}

pub async fn seed_user(store: &Arc<MemoryStore>, username: &str) -> UserRecord {
    store
        .create_user(CreateUserParams {
            username: username.to_string(),
        })
        .await
        .expect("user created")
}

pub async fn seed_group(store: &Arc<MemoryStore>, title: &str) -> GroupRecord {
    let slug = rostra::domain::slug::derive_slug(title).expect("slug derived");
    store
        .create_group(CreateGroupParams {
            title: title.to_string(),
            slug,
            description: format!("{title} description"),
        })
        .await
        .expect("group created")
}

pub async fn seed_post(
    store: &Arc<MemoryStore>,
    author: &UserRecord,
    group: Option<&GroupRecord>,
    body: &str,
) -> PostRecord {
    store
        .create_post(CreatePostParams {
            body: body.to_string(),
            image: None,
            author_id: author.id,
            group_id: group.map(|group| group.id),
        })
        .await
        .expect("post created")
}
