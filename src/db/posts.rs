use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use sqlx::PgPool;

use super::StoreError;
use crate::models::post::{Post, PostRow};

/// Read access to the site's posts.
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn get_post(&self, id: i64) -> Result<Option<Post>, StoreError>;
}

pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn get_post(&self, id: i64) -> Result<Option<Post>, StoreError> {
        let row = sqlx::query_as::<_, PostRow>(
            "SELECT id, title, slug, status, kind, author_id FROM posts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Post::try_from)
            .transpose()
            .map_err(|e| StoreError::Invalid(e.to_string()))
    }
}

/// In-memory post table, keyed by id.
#[derive(Default)]
pub struct MemoryPostRepository {
    posts: RwLock<HashMap<i64, Post>>,
}

impl MemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, post: Post) {
        let mut posts = self.posts.write().unwrap_or_else(PoisonError::into_inner);
        posts.insert(post.id, post);
    }

    pub fn remove(&self, id: i64) -> Option<Post> {
        let mut posts = self.posts.write().unwrap_or_else(PoisonError::into_inner);
        posts.remove(&id)
    }
}

#[async_trait]
impl PostRepository for MemoryPostRepository {
    async fn get_post(&self, id: i64) -> Result<Option<Post>, StoreError> {
        let posts = self.posts.read().unwrap_or_else(PoisonError::into_inner);
        Ok(posts.get(&id).cloned())
    }
}
