//! crates/book_corner_core/src/profile.rs
//!
//! Holds the single reader profile. The profile is only ever replaced whole.

use crate::domain::{UserProfile, AVATAR_STYLES};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileError {
    #[error("Reading goal must be at least 1")]
    InvalidGoal,
    #[error("Profile name must not be empty")]
    EmptyName,
    #[error("Unknown avatar style: {0}")]
    UnknownAvatarStyle(String),
}

#[derive(Debug, Clone, Default)]
pub struct ProfileStore {
    profile: UserProfile,
}

impl ProfileStore {
    pub fn new(profile: UserProfile) -> Self {
        Self {
            profile: normalize(profile),
        }
    }

    pub fn get(&self) -> &UserProfile {
        &self.profile
    }

    /// Replaces the profile after checking it.
    pub fn set(&mut self, profile: UserProfile) -> Result<(), ProfileError> {
        validate(&profile)?;
        self.profile = profile;
        Ok(())
    }
}

pub fn validate(profile: &UserProfile) -> Result<(), ProfileError> {
    if profile.reading_goal == 0 {
        return Err(ProfileError::InvalidGoal);
    }
    if profile.name.trim().is_empty() {
        return Err(ProfileError::EmptyName);
    }
    if !AVATAR_STYLES.contains(&profile.avatar_choice.as_str()) {
        return Err(ProfileError::UnknownAvatarStyle(
            profile.avatar_choice.clone(),
        ));
    }
    Ok(())
}

/// Repairs a profile read from storage or an import: anything unusable falls
/// back to its default instead of being rejected.
pub fn normalize(mut profile: UserProfile) -> UserProfile {
    let defaults = UserProfile::default();
    if profile.reading_goal == 0 {
        profile.reading_goal = defaults.reading_goal;
    }
    if profile.name.trim().is_empty() {
        profile.name = defaults.name;
    }
    if !AVATAR_STYLES.contains(&profile.avatar_choice.as_str()) {
        profile.avatar_choice = defaults.avatar_choice;
    }
    profile
}

/// Dicebear avatar URL for the profile's chosen style and seed.
pub fn avatar_url(profile: &UserProfile) -> String {
    let mut url = format!(
        "https://api.dicebear.com/7.x/{}/svg?seed={}",
        profile.avatar_choice,
        urlencoding::encode(&profile.avatar_seed)
    );
    if let Some(flip) = profile.avatar_flip {
        url.push_str(&format!("&flip={}", flip));
    }
    if let Some(rotate) = profile.avatar_rotate {
        url.push_str(&format!("&rotate={}", rotate));
    }
    url
}
