use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DecodeError, Record};
use crate::Toggleable;

/// Author fields joined onto a post by the aggregated feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// A feed post with the current user's like and bookmark state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Toggleable)]
pub struct Post {
    #[toggle(id)]
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub text_content: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "profiles", default)]
    pub author: Option<AuthorSummary>,
    pub like_count: u64,
    #[toggle(relation = Like, count = like_count)]
    pub liked_by_user: bool,
    #[toggle(relation = Bookmark)]
    pub bookmarked_by_user: bool,
    #[serde(default)]
    pub comment_count: u64,
}

impl Post {
    /// Display name of the author, falling back when the profile join is missing.
    pub fn author_name(&self) -> &str {
        self.author
            .as_ref()
            .map(|author| author.username.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or("A User")
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

impl Record for Post {
    const NAME: &'static str = "post";

    fn validate(&self) -> Result<(), DecodeError> {
        if self.id.trim().is_empty() {
            return Err(DecodeError::Invalid {
                record: Self::NAME,
                message: "empty id".into(),
            });
        }
        if self.user_id.trim().is_empty() {
            return Err(DecodeError::Invalid {
                record: Self::NAME,
                message: format!("post {} has empty user_id", self.id),
            });
        }
        Ok(())
    }
}
