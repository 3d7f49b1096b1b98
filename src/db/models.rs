use serde::{Deserialize, Serialize};

/// A registered account, including the credential hash.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

/// Public representation of a user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            created_at: user.created_at.clone(),
        }
    }
}

/// A post row joined with its author.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    pub id: i64,
    pub user_id: i64,
    pub content: String,
    pub image_url: Option<String>,
    pub is_private: bool,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
    pub author_first_name: String,
    pub author_last_name: String,
    pub author_email: String,
    pub author_created_at: String,
}

impl PostRow {
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Whether `viewer` may see this post.
    #[must_use]
    pub fn is_visible_to(&self, viewer: i64) -> bool {
        !self.is_private || self.user_id == viewer
    }

    #[must_use]
    pub fn author(&self) -> UserSummary {
        UserSummary {
            id: self.user_id,
            first_name: self.author_first_name.clone(),
            last_name: self.author_last_name.clone(),
            email: self.author_email.clone(),
            created_at: self.author_created_at.clone(),
        }
    }
}

/// A comment row joined with its author.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentRow {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub parent_comment_id: Option<i64>,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
    pub author_first_name: String,
    pub author_last_name: String,
    pub author_email: String,
    pub author_created_at: String,
}

impl CommentRow {
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    #[must_use]
    pub fn is_reply(&self) -> bool {
        self.parent_comment_id.is_some()
    }

    #[must_use]
    pub fn author(&self) -> UserSummary {
        UserSummary {
            id: self.user_id,
            first_name: self.author_first_name.clone(),
            last_name: self.author_last_name.clone(),
            email: self.author_email.clone(),
            created_at: self.author_created_at.clone(),
        }
    }
}

/// Kind of entity a like points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Post,
    Comment,
}

impl TargetKind {
    /// Value stored in `likes.likeable_type`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Comment => "comment",
        }
    }
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
