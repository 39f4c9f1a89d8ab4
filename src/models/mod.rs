// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod provider;
pub mod user;

pub use provider::{Category, NewReview, Provider, ProviderQuery, Review};
pub use user::{AuthIdentity, NameUpdate, Preferences, UserProfile, UserUpdate};
