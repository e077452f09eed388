use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Publish,
    Draft,
    Pending,
    Private,
    Future,
    Trash,
}

/// Regular posts vs. the shadow copies the editor keeps around.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PostKind {
    Post,
    Revision,
    Autosave,
}

impl std::str::FromStr for PostStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "publish" => Ok(PostStatus::Publish),
            "draft" => Ok(PostStatus::Draft),
            "pending" => Ok(PostStatus::Pending),
            "private" => Ok(PostStatus::Private),
            "future" => Ok(PostStatus::Future),
            "trash" => Ok(PostStatus::Trash),
            other => anyhow::bail!("Unknown post status: {other}"),
        }
    }
}

impl std::str::FromStr for PostKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(PostKind::Post),
            "revision" => Ok(PostKind::Revision),
            "autosave" => Ok(PostKind::Autosave),
            other => anyhow::bail!("Unknown post kind: {other}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub status: PostStatus,
    pub kind: PostKind,
    pub author_id: Uuid,
}

/// DB row struct: status and kind are plain TEXT columns.
#[derive(Debug, Clone, FromRow)]
pub struct PostRow {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub status: String,
    pub kind: String,
    pub author_id: Uuid,
}

impl TryFrom<PostRow> for Post {
    type Error = anyhow::Error;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        Ok(Post {
            id: row.id,
            title: row.title,
            slug: row.slug,
            status: row.status.parse()?,
            kind: row.kind.parse()?,
            author_id: row.author_id,
        })
    }
}

impl Post {
    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Publish
    }

    pub fn permalink(&self, site_url: &str) -> String {
        let base = site_url.trim_end_matches('/');
        if self.slug.is_empty() {
            format!("{base}/?p={}", self.id)
        } else {
            format!("{base}/{}/", self.slug)
        }
    }

    pub fn edit_link(&self, site_url: &str) -> String {
        format!("{}/admin/posts/{}/edit", site_url.trim_end_matches('/'), self.id)
    }
}
