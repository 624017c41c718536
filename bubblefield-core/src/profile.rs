use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Name used when the profile source does not supply one.
pub const DEFAULT_PROFILE_NAME: &str = "User";

fn default_name() -> String {
    DEFAULT_PROFILE_NAME.to_string()
}

/// A user profile that may decorate a bubble with its avatar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(rename = "image", alias = "image_url")]
    pub image_url: String,
}

impl Profile {
    pub fn new(name: impl Into<String>, image_url: impl Into<String>) -> Self {
        Profile {
            name: name.into(),
            image_url: image_url.into(),
        }
    }
}

/// State of the external profile source as seen by the simulation.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ProfileFeed {
    /// Still fetching; the simulation runs without avatars meanwhile.
    #[default]
    Loading,
    Ready(Vec<Profile>),
    /// The source failed; the simulation degrades to solid colors.
    Failed(String),
}

impl ProfileFeed {
    /// Profiles available for binding (empty unless `Ready`)
    pub fn profiles(&self) -> &[Profile] {
        match self {
            ProfileFeed::Ready(profiles) => profiles,
            ProfileFeed::Loading | ProfileFeed::Failed(_) => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ProfileFeed::Failed(msg) => Some(msg),
            _ => None,
        }
    }
}

/// Keeps the first profile for every distinct image URL, preserving order.
pub fn dedupe_profiles(profiles: Vec<Profile>) -> Vec<Profile> {
    let mut seen = HashSet::new();
    profiles
        .into_iter()
        .filter(|p| seen.insert(p.image_url.clone()))
        .collect()
}
