// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cache key registry.
//!
//! Every cached query is addressed by a [`QueryKey`] built here, so readers,
//! writers and invalidations agree on the same tuple. Keys are hierarchical:
//! invalidating `bookmarks::all()` also hits `bookmarks::list()` and
//! `bookmarks::details()`.

use crate::models::ProviderQuery;
use std::fmt;

/// One element of a key tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPart {
    Name(&'static str),
    Id(u64),
    Text(String),
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Name(name) => f.write_str(name),
            KeyPart::Id(id) => write!(f, "{}", id),
            KeyPart::Text(text) => write!(f, "{:?}", text),
        }
    }
}

/// Structural cache key; equal arguments always produce equal keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<KeyPart>);

impl QueryKey {
    fn new(parts: impl IntoIterator<Item = KeyPart>) -> Self {
        Self(parts.into_iter().collect())
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    /// Whether `prefix` addresses this key or one of its ancestors.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", part)?;
        }
        f.write_str("]")
    }
}

pub mod user {
    use super::{KeyPart, QueryKey};

    pub fn all() -> QueryKey {
        QueryKey::new([KeyPart::Name("user")])
    }

    /// Resolved profile for one auth identity.
    pub fn profile(id: &str) -> QueryKey {
        QueryKey::new([
            KeyPart::Name("user"),
            KeyPart::Name("profile"),
            KeyPart::Text(id.to_string()),
        ])
    }
}

pub mod provider {
    use super::{KeyPart, QueryKey};
    use crate::models::ProviderQuery;

    pub fn all() -> QueryKey {
        QueryKey::new([KeyPart::Name("providers")])
    }

    pub fn lists() -> QueryKey {
        QueryKey::new([KeyPart::Name("providers"), KeyPart::Name("list")])
    }

    pub fn list(query: &ProviderQuery) -> QueryKey {
        QueryKey::new([
            KeyPart::Name("providers"),
            KeyPart::Name("list"),
            KeyPart::Text(super::filters_fingerprint(query)),
        ])
    }

    pub fn detail(id: u64) -> QueryKey {
        QueryKey::new([
            KeyPart::Name("providers"),
            KeyPart::Name("detail"),
            KeyPart::Id(id),
        ])
    }
}

pub mod bookmarks {
    use super::{KeyPart, QueryKey};

    pub fn all() -> QueryKey {
        QueryKey::new([KeyPart::Name("bookmarks")])
    }

    /// Bookmarked provider IDs of the signed-in user.
    pub fn list() -> QueryKey {
        QueryKey::new([KeyPart::Name("bookmarks"), KeyPart::Name("list")])
    }

    /// Provider details for every bookmarked ID.
    pub fn details() -> QueryKey {
        QueryKey::new([KeyPart::Name("bookmarks"), KeyPart::Name("details")])
    }
}

pub mod reviews {
    use super::{KeyPart, QueryKey};

    pub fn by_provider(provider_id: u64) -> QueryKey {
        QueryKey::new([
            KeyPart::Name("reviews"),
            KeyPart::Name("provider"),
            KeyPart::Id(provider_id),
        ])
    }
}

pub mod categories {
    use super::{KeyPart, QueryKey};

    pub fn all() -> QueryKey {
        QueryKey::new([KeyPart::Name("categories")])
    }

    pub fn list() -> QueryKey {
        QueryKey::new([KeyPart::Name("categories"), KeyPart::Name("list")])
    }
}

/// Stable text form of a filter set, independent of how it was built.
fn filters_fingerprint(query: &ProviderQuery) -> String {
    query
        .to_pairs()
        .into_iter()
        .map(|(name, value)| format!("{}={}", name, urlencoding::encode(&value)))
        .collect::<Vec<_>>()
        .join("&")
}
