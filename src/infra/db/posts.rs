use async_trait::async_trait;
use sqlx::QueryBuilder;
use uuid::Uuid;

use crate::application::repos::{
    CreatePostParams, FeedFilter, PostOrdering, PostsRepo, PostsWriteRepo, RepoError,
    UpdatePostParams,
};
use crate::domain::entities::{FeedEntry, PostRecord};

use super::types::{FeedEntryRow, PostRow};
use super::{FEED_ENTRY_COLUMNS, FEED_ENTRY_JOINS, PostgresRepositories, map_sqlx_error};

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_feed(
        &self,
        filter: FeedFilter,
        ordering: PostOrdering,
    ) -> Result<Vec<FeedEntry>, RepoError> {
        let mut qb = QueryBuilder::new(format!("SELECT {FEED_ENTRY_COLUMNS}"));
        qb.push(FEED_ENTRY_JOINS);
        qb.push(" WHERE 1=1 ");
        Self::apply_feed_filter(&mut qb, filter);
        Self::apply_feed_ordering(&mut qb, ordering);

        let rows = qb
            .build_query_as::<FeedEntryRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(FeedEntry::from).collect())
    }

    async fn find_entry(&self, id: Uuid) -> Result<Option<FeedEntry>, RepoError> {
        let mut qb = QueryBuilder::new(format!("SELECT {FEED_ENTRY_COLUMNS}"));
        qb.push(FEED_ENTRY_JOINS);
        qb.push(" WHERE p.id = ");
        qb.push_bind(id);

        let row = qb
            .build_query_as::<FeedEntryRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(FeedEntry::from))
    }

    async fn count_by_author(&self, author_id: Uuid) -> Result<u64, RepoError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM posts p WHERE p.author_id = $1")
                .bind(author_id)
                .fetch_one(self.pool())
                .await
                .map_err(map_sqlx_error)?;

        Self::convert_count(count)
    }
}

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(
            "INSERT INTO posts (id, body, image, author_id, group_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, body, image, author_id, group_id, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&params.body)
        .bind(&params.image)
        .bind(params.author_id)
        .bind(params.group_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(PostRecord::from(row))
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        // author_id and created_at are immutable and deliberately not in
        // the SET list.
        let row = sqlx::query_as::<_, PostRow>(
            "UPDATE posts SET body = $2, image = $3, group_id = $4 \
             WHERE id = $1 \
             RETURNING id, body, image, author_id, group_id, created_at",
        )
        .bind(params.id)
        .bind(&params.body)
        .bind(&params.image)
        .bind(params.group_id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?
        .ok_or(RepoError::NotFound)?;

        Ok(PostRecord::from(row))
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}
