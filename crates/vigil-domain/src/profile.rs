//! User profiles as seen by the friendship subsystem

use crate::UserId;
use serde::{Deserialize, Serialize};

/// A user profile
///
/// Created on first authentication and edited by its owner; the friendship
/// subsystem only ever reads profiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Stable identifier
    pub id: UserId,

    /// Name shown to other users
    pub display_name: String,

    /// Avatar location, if the user uploaded one
    pub image_url: Option<String>,
}

impl UserProfile {
    /// Create a profile without an avatar
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            image_url: None,
        }
    }

    /// Attach an avatar location
    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }
}
