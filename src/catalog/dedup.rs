//! Run-scoped de-duplication
//!
//! A product can show up in many listings; its detail page must be fetched
//! once. One `ProductDeduplicator` exists per site per crawl run and is
//! handed to the listing handler explicitly.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// A mutex-guarded set with atomic check-and-insert
#[derive(Debug, Default)]
pub struct SeenSet<K> {
    inner: Mutex<HashSet<K>>,
}

impl<K: Eq + Hash> SeenSet<K> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashSet::new()),
        }
    }

    /// Inserts `key`, returning true if it was not present
    pub fn insert(&self, key: K) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Which fields make up a product's dedup key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DedupScope {
    /// The base SKU alone
    #[default]
    Sku,

    /// Country code and base SKU
    CountrySku,
}

/// Identity used to allow one detail fetch per base product
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub country_code: Option<String>,
    pub base_sku: String,
}

/// Decides which listing rows trigger a detail fetch
#[derive(Debug)]
pub struct ProductDeduplicator {
    scope: DedupScope,
    seen: SeenSet<DedupKey>,
    skipped: AtomicU64,
}

impl ProductDeduplicator {
    pub fn new(scope: DedupScope) -> Self {
        Self {
            scope,
            seen: SeenSet::new(),
            skipped: AtomicU64::new(0),
        }
    }

    pub fn scope(&self) -> DedupScope {
        self.scope
    }

    /// Builds the key for a product under this deduplicator's scope
    pub fn key(&self, base_sku: &str, country_code: &str) -> DedupKey {
        let country_code = match self.scope {
            DedupScope::Sku => None,
            DedupScope::CountrySku => Some(country_code.to_lowercase()),
        };

        DedupKey {
            country_code,
            base_sku: base_sku.trim().to_string(),
        }
    }

    /// Returns true exactly once per key; the first caller wins
    pub fn should_fetch_detail(&self, base_sku: &str, country_code: &str) -> bool {
        let fresh = self.seen.insert(self.key(base_sku, country_code));
        if !fresh {
            self.skipped.fetch_add(1, Ordering::Relaxed);
        }
        fresh
    }

    /// Number of distinct products that triggered a detail fetch
    pub fn distinct_products(&self) -> usize {
        self.seen.len()
    }

    /// Number of listing rows whose detail fetch was suppressed
    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }
}
