//! Per-donor query cache.
//!
//! Caches normalized DSO reads using `moka` (5-minute TTL). Entries are keyed
//! by resource and donor, so one donor's data is dropped without touching
//! anyone else's.

use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use donor_portal_core::DonorId;

use crate::models::{Child, Donation, Letter};
use crate::normalize::Profile;

/// How long cached reads stay fresh.
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Upper bound on cached entries across all donors.
const CACHE_CAPACITY: u64 = 10_000;

/// Kind of cached query.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Resource {
    Profile,
    Donations,
    Children,
    Letters,
}

impl Resource {
    /// Every cached resource.
    pub const ALL: [Self; 4] = [Self::Profile, Self::Donations, Self::Children, Self::Letters];

    /// Short name used in throttle keys and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Donations => "donations",
            Self::Children => "children",
            Self::Letters => "letters",
        }
    }
}

/// Cache key for per-donor queries.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct CacheKey {
    pub resource: Resource,
    pub donor: DonorId,
}

impl CacheKey {
    #[must_use]
    pub const fn new(resource: Resource, donor: DonorId) -> Self {
        Self { resource, donor }
    }
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Profile(Box<Profile>),
    Donations(Vec<Donation>),
    Children(Vec<Child>),
    Letters(Vec<Letter>),
}

/// In-memory cache of normalized DSO reads.
#[derive(Clone)]
pub struct QueryCache {
    cache: Cache<CacheKey, CacheValue>,
}

impl QueryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(CACHE_TTL)
    }

    /// Cache with a custom time-to-live.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(ttl)
            .build();
        Self { cache }
    }

    async fn get(&self, resource: Resource, donor: &DonorId) -> Option<CacheValue> {
        let value = self
            .cache
            .get(&CacheKey::new(resource, donor.clone()))
            .await;
        if value.is_some() {
            debug!(resource = resource.as_str(), "Cache hit");
        }
        value
    }

    pub async fn profile(&self, donor: &DonorId) -> Option<Profile> {
        match self.get(Resource::Profile, donor).await {
            Some(CacheValue::Profile(profile)) => Some(*profile),
            _ => None,
        }
    }

    pub async fn donations(&self, donor: &DonorId) -> Option<Vec<Donation>> {
        match self.get(Resource::Donations, donor).await {
            Some(CacheValue::Donations(donations)) => Some(donations),
            _ => None,
        }
    }

    pub async fn children(&self, donor: &DonorId) -> Option<Vec<Child>> {
        match self.get(Resource::Children, donor).await {
            Some(CacheValue::Children(children)) => Some(children),
            _ => None,
        }
    }

    pub async fn letters(&self, donor: &DonorId) -> Option<Vec<Letter>> {
        match self.get(Resource::Letters, donor).await {
            Some(CacheValue::Letters(letters)) => Some(letters),
            _ => None,
        }
    }

    /// Store a value under the resource its variant belongs to.
    pub async fn insert(&self, donor: &DonorId, value: CacheValue) {
        let resource = match &value {
            CacheValue::Profile(_) => Resource::Profile,
            CacheValue::Donations(_) => Resource::Donations,
            CacheValue::Children(_) => Resource::Children,
            CacheValue::Letters(_) => Resource::Letters,
        };
        self.cache
            .insert(CacheKey::new(resource, donor.clone()), value)
            .await;
    }

    /// Drop one cached resource for a donor.
    pub async fn invalidate(&self, resource: Resource, donor: &DonorId) {
        self.cache
            .invalidate(&CacheKey::new(resource, donor.clone()))
            .await;
    }

    /// Drop every cached resource for a donor.
    pub async fn invalidate_donor(&self, donor: &DonorId) {
        for resource in Resource::ALL {
            self.invalidate(resource, donor).await;
        }
        debug!(donor = %donor, "Invalidated cached queries");
    }

    /// Invalidate all cached data.
    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use donor_portal_core::{ChildId, DonorId};

    use super::*;

    fn child(id: &str) -> Child {
        Child {
            id: ChildId::new(id),
            name: "Ana".to_string(),
            birth_date: None,
            gender: None,
            country: None,
            photo_url: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_typed() {
        let cache = QueryCache::new();
        let donor = DonorId::new("D-1");
        cache
            .insert(&donor, CacheValue::Children(vec![child("C-1")]))
            .await;

        let children = cache.children(&donor).await.expect("cached");
        assert_eq!(children.len(), 1);
        assert!(cache.letters(&donor).await.is_none());
        assert!(cache.children(&DonorId::new("D-2")).await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_donor_keeps_other_donors() {
        let cache = QueryCache::new();
        let one = DonorId::new("D-1");
        let two = DonorId::new("D-2");
        cache.insert(&one, CacheValue::Children(vec![child("C-1")])).await;
        cache.insert(&one, CacheValue::Letters(Vec::new())).await;
        cache.insert(&two, CacheValue::Children(vec![child("C-2")])).await;

        cache.invalidate_donor(&one).await;

        assert!(cache.children(&one).await.is_none());
        assert!(cache.letters(&one).await.is_none());
        assert!(cache.children(&two).await.is_some());
    }
}
