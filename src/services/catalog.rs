// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cached provider browsing: search, detail, reviews and categories.

use crate::error::Result;
use crate::models::{Category, NewReview, Provider, ProviderQuery, Review};
use crate::query::{keys, QueryCache, QueryKey};
use crate::services::backend::BackendClient;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;

#[derive(Clone)]
pub struct ProviderCatalog {
    client: BackendClient,
    cache: QueryCache,
}

impl ProviderCatalog {
    pub fn new(client: BackendClient, cache: QueryCache) -> Self {
        Self { client, cache }
    }

    pub async fn search(&self, query: &ProviderQuery) -> Result<Vec<Provider>> {
        self.cached(keys::provider::list(query), || {
            self.client.search_providers(query)
        })
        .await
    }

    pub async fn provider(&self, id: u64) -> Result<Provider> {
        self.cached(keys::provider::detail(id), || self.client.provider(id))
            .await
    }

    pub async fn reviews(&self, provider_id: u64) -> Result<Vec<Review>> {
        self.cached(keys::reviews::by_provider(provider_id), || {
            self.client.reviews(provider_id)
        })
        .await
    }

    pub async fn categories(&self) -> Result<Vec<Category>> {
        self.cached(keys::categories::list(), || self.client.categories())
            .await
    }

    /// Post a review. The provider's reviews and rating summary go stale.
    pub async fn submit_review(
        &self,
        token: &str,
        provider_id: u64,
        review: &NewReview,
    ) -> Result<Review> {
        let created = self
            .client
            .create_review(token, provider_id, review)
            .await?;
        self.cache.invalidate(&keys::reviews::by_provider(provider_id));
        self.cache.invalidate(&keys::provider::detail(provider_id));
        self.cache.invalidate(&keys::provider::lists());
        tracing::info!(provider_id, rating = review.rating, "Review submitted");
        Ok(created)
    }

    /// The hero image changed; drop anything showing the old one.
    pub fn hero_image_changed(&self, provider: &Provider) -> Result<()> {
        self.cache.set(keys::provider::detail(provider.id), provider)?;
        self.cache.invalidate(&keys::provider::lists());
        self.cache.invalidate(&keys::bookmarks::details());
        Ok(())
    }

    async fn cached<T, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !self.cache.is_stale(&key) {
            if let Some(value) = self.cache.get(&key) {
                tracing::debug!(key = %key, "Catalog cache hit");
                return Ok(value);
            }
        }
        let value = fetch().await?;
        self.cache.set(key, &value)?;
        Ok(value)
    }
}
