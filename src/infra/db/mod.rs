//! Postgres-backed repository implementations.

mod comments;
mod follows;
mod groups;
mod posts;
mod types;
mod users;
mod util;

pub use util::map_sqlx_error;

use std::sync::Arc;

use sqlx::{
    Postgres, QueryBuilder,
    postgres::{PgPool, PgPoolOptions},
    query,
};

use crate::application::repos::{FeedFilter, PostOrdering};

/// Column list shared by every query that builds a [`FeedEntry`]: the
/// post joined with its author and optional group in one round trip.
const FEED_ENTRY_COLUMNS: &str = "p.id, p.body, p.image, p.author_id, p.group_id, p.created_at, \
     u.username AS author_username, u.created_at AS author_created_at, \
     g.title AS group_title, g.slug AS group_slug, \
     g.description AS group_description, g.created_at AS group_created_at";

const FEED_ENTRY_JOINS: &str = " FROM posts p \
     INNER JOIN users u ON u.id = p.author_id \
     LEFT JOIN post_groups g ON g.id = p.group_id ";

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }

    fn apply_feed_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: FeedFilter) {
        match filter {
            FeedFilter::Global => {}
            FeedFilter::Group(group_id) => {
                qb.push(" AND p.group_id = ");
                qb.push_bind(group_id);
            }
            FeedFilter::Author(author_id) => {
                qb.push(" AND p.author_id = ");
                qb.push_bind(author_id);
            }
            FeedFilter::FollowedBy(viewer_id) => {
                qb.push(
                    " AND p.author_id IN (SELECT f.followee_id FROM follows f WHERE f.follower_id = ",
                );
                qb.push_bind(viewer_id);
                qb.push(")");
            }
        }
    }

    fn apply_feed_ordering(qb: &mut QueryBuilder<'_, Postgres>, ordering: PostOrdering) {
        match ordering {
            PostOrdering::CreatedDesc => {
                qb.push(" ORDER BY p.created_at DESC, p.id DESC ");
            }
            PostOrdering::CreatedAsc => {
                qb.push(" ORDER BY p.created_at ASC, p.id ASC ");
            }
        }
    }

    pub(crate) fn convert_count(count: i64) -> Result<u64, crate::application::repos::RepoError> {
        u64::try_from(count).map_err(crate::application::repos::RepoError::from_persistence)
    }
}
