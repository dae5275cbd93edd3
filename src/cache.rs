use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use log::trace;

use crate::config::{ResolverOptions, Timeout};
use crate::dns_parser::{Class, Name, Question, Response, Type};

/// Every time the cache grows by this many entries, `add` drops the
/// expired ones.
const SWEEP_INTERVAL: usize = 1024;

/// Identifies cached responses, the name is kept lower-cased
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    name: Name,
    qtype: Type,
    qclass: Class,
}

impl CacheKey {
    pub fn new(name: &Name, qtype: Type, qclass: Class) -> CacheKey {
        CacheKey {
            name: name.to_lowercase(),
            qtype,
            qclass,
        }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }
}

impl<'a> From<&'a Question> for CacheKey {
    fn from(question: &'a Question) -> CacheKey {
        CacheKey::new(&question.qname, question.qtype, question.qclass)
    }
}

#[derive(Debug)]
struct CacheEntry {
    response: Arc<Response>,
    /// `None` never expires
    expires: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires.map_or(true, |expires| now < expires)
    }
}

/// Responses by question, expiring after their records' TTL
///
/// At most one entry exists per key. Expired entries are treated as
/// absent. They are dropped when they are looked up or replaced, and in
/// bulk once the cache has grown large.
#[derive(Debug)]
pub struct ResponseCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    minimum: Option<Timeout>,
    maximum: Option<Timeout>,
    failure_duration: Duration,
    sweep_interval: usize,
}

impl Default for ResponseCache {
    fn default() -> ResponseCache {
        ResponseCache::new(&ResolverOptions::default())
    }
}

impl ResponseCache {
    pub fn new(options: &ResolverOptions) -> ResponseCache {
        ResponseCache {
            entries: RwLock::new(HashMap::new()),
            minimum: options.minimum_cache_timeout,
            maximum: options.maximum_cache_timeout,
            failure_duration: options.failed_results_cache_duration,
            sweep_interval: SWEEP_INTERVAL,
        }
    }

    /// Stores `response` unless a live entry exists for `key`.
    ///
    /// Returns whether the response was stored. Responses with a zero
    /// lifetime are never stored. Error responses are only stored when
    /// `allow_caching_failures` is set.
    pub fn add(&self, key: CacheKey, response: Arc<Response>, allow_caching_failures: bool) -> bool {
        let lifetime = match self.lifetime(&response, allow_caching_failures) {
            Some(lifetime) => lifetime,
            None => return false,
        };
        let now = Instant::now();
        let entry = CacheEntry {
            response,
            expires: lifetime.as_duration().and_then(|d| now.checked_add(d)),
        };

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let len = entries.len();
        if len > 0 && len % self.sweep_interval == 0 {
            entries.retain(|_, entry| entry.is_live(now));
            trace!("dropped {} expired cache entries", len - entries.len());
        }
        match entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_live(now) {
                    return false;
                }
                trace!("replacing expired cache entry for {}", occupied.key().name);
                occupied.insert(entry);
            }
            Entry::Vacant(vacant) => {
                trace!("caching {} for {:?}", vacant.key().name, lifetime);
                vacant.insert(entry);
            }
        }
        true
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<Response>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.get(key) {
                Some(entry) if entry.is_live(now) => return Some(entry.response.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Entry::Occupied(occupied) = entries.entry(key.clone()) {
            if !occupied.get().is_live(now) {
                occupied.remove();
            }
        }
        None
    }

    pub fn remove(&self, key: &CacheKey) -> Option<Arc<Response>> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .map(|entry| entry.response)
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of entries, including expired ones not dropped yet.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How long `response` may be cached, `None` if not at all.
    fn lifetime(&self, response: &Response, allow_caching_failures: bool) -> Option<Timeout> {
        if !response.response_code.is_success() {
            if !allow_caching_failures || self.failure_duration == Duration::from_secs(0) {
                return None;
            }
            return Some(Timeout::Finite(self.failure_duration));
        }

        let mut lifetime = Timeout::Finite(Duration::from_secs(response.min_ttl().into()));
        if let Some(minimum) = self.minimum {
            lifetime = lifetime.max(minimum);
        }
        if let Some(maximum) = self.maximum {
            lifetime = lifetime.min(maximum);
        }
        if lifetime == Timeout::Finite(Duration::from_secs(0)) {
            return None;
        }
        Some(lifetime)
    }
}
