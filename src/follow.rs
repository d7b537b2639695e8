use crate::api::MangaApi;
use crate::error::{describe, UserMessage};

/// Optimistic follow button state for one manga
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowToggle {
    pub manga_id: String,
    pub following: bool,
    pub followers: u64,
}

impl FollowToggle {
    pub fn new(manga_id: impl Into<String>, following: bool, followers: u64) -> Self {
        Self {
            manga_id: manga_id.into(),
            following,
            followers,
        }
    }

    fn flip(&mut self) {
        self.following = !self.following;
        self.followers = if self.following {
            self.followers.saturating_add(1)
        } else {
            self.followers.saturating_sub(1)
        };
    }

    /// Flip immediately, then confirm with the backend.
    ///
    /// On failure the previous state is restored and the toast text is
    /// returned.
    pub async fn toggle(&mut self, api: &MangaApi) -> Result<bool, UserMessage> {
        let previous = self.clone();
        self.flip();

        let result = if self.following {
            api.follow(&self.manga_id).await
        } else {
            api.unfollow(&self.manga_id).await
        };

        match result {
            Ok(()) => Ok(self.following),
            Err(e) => {
                log::warn!("Follow toggle for {} rolled back: {}", self.manga_id, e);
                *self = previous;
                Err(describe(&e))
            }
        }
    }
}
