// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile model and the auth provider's identity record.

use crate::time_utils::format_millis_rfc3339;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// User profile as stored by the marketplace backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Stable identity key (the auth provider's user ID)
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(
        default,
        rename = "displayName",
        skip_serializing_if = "Option::is_none"
    )]
    pub display_name: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub preferences: Preferences,
}

impl UserProfile {
    /// Synthesize a profile from the auth provider's identity.
    ///
    /// Used directly when the auth provider is the data source, and as the
    /// fallback when the backend profile is unavailable.
    pub fn from_identity(identity: &AuthIdentity) -> Self {
        Self {
            id: identity.id.clone(),
            email: identity.primary_email.clone().unwrap_or_default(),
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            avatar_url: identity.image_url.clone(),
            display_name: identity.full_name(),
            created_at: format_millis_rfc3339(identity.created_at),
            updated_at: format_millis_rfc3339(identity.updated_at),
            preferences: Preferences::default(),
        }
    }

    /// Return a copy with `changes` merged over this profile.
    ///
    /// The `id` never changes.
    pub fn merged(&self, changes: &UserUpdate) -> Self {
        let mut next = self.clone();
        if let Some(first) = &changes.first_name {
            next.first_name = Some(first.clone());
        }
        if let Some(last) = &changes.last_name {
            next.last_name = Some(last.clone());
        }
        if let Some(avatar) = &changes.avatar_url {
            next.avatar_url = Some(avatar.clone());
        }
        if let Some(display) = &changes.display_name {
            next.display_name = Some(display.clone());
        }
        if let Some(prefs) = &changes.preferences {
            next.preferences = prefs.clone();
        }
        next
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub notifications: NotificationPreferences,
    #[serde(default)]
    pub privacy: PrivacyPreferences,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub email: bool,
    pub app: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            email: true,
            app: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivacyPreferences {
    #[serde(rename = "showReviews")]
    pub show_reviews: bool,
}

impl Default for PrivacyPreferences {
    fn default() -> Self {
        Self { show_reviews: true }
    }
}

/// Partial profile update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct UserUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(url)]
    pub avatar_url: Option<String>,
    #[serde(
        default,
        rename = "displayName",
        skip_serializing_if = "Option::is_none"
    )]
    #[validate(length(min = 1, max = 200))]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Preferences>,
}

impl UserUpdate {
    /// The name fields the auth provider knows about, if any are set.
    pub fn name_update(&self) -> Option<NameUpdate> {
        if self.first_name.is_none() && self.last_name.is_none() {
            return None;
        }
        Some(NameUpdate {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        })
    }
}

/// Name change pushed to the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// Identity record held by the external auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthIdentity {
    pub id: String,
    pub primary_email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
    /// Unix milliseconds
    pub created_at: i64,
    /// Unix milliseconds
    pub updated_at: i64,
}

impl AuthIdentity {
    fn full_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}
