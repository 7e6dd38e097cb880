use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tracing::trace;

use crate::{Model, Record, canon};

/// A memoizing adapter around a deterministic evaluation model.
///
/// The cache is keyed by the canonical digest of the input record and is
/// bounded with least-recently-used eviction. Caching is an acceleration
/// feature only: because the wrapped model is pure, a cached value is a
/// function of its key and concurrent writes are last-write-wins without
/// affecting correctness.
///
/// `Evaluator` itself implements [`Model`], so solvers and explorers accept
/// a raw model or a caching adapter interchangeably.
pub struct Evaluator<M: Model> {
    model: M,
    cache: Option<Mutex<Cache<M::Output>>>,
}

/// Cache diagnostics counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
    pub capacity: usize,
}

struct Cache<O> {
    map: HashMap<[u8; 32], O>,
    order: VecDeque<[u8; 32]>,
    capacity: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<O: Clone> Cache<O> {
    fn new(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    fn lookup(&mut self, key: &[u8; 32]) -> Option<O> {
        match self.map.get(key).cloned() {
            Some(output) => {
                self.hits += 1;
                self.touch(key);
                Some(output)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    fn store(&mut self, key: [u8; 32], output: O) {
        if self.map.insert(key, output).is_none() {
            self.order.push_back(key);
        } else {
            self.touch(&key);
        }
        while self.map.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.map.remove(&oldest);
                self.evictions += 1;
            }
        }
    }

    /// Moves a key to the most-recently-used position.
    fn touch(&mut self, key: &[u8; 32]) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
            self.order.push_back(*key);
        }
    }
}

impl<M: Model> Evaluator<M>
where
    M::Input: Record,
    M::Output: Clone,
{
    /// Wraps a model without memoization.
    pub fn new(model: M) -> Self {
        Self { model, cache: None }
    }

    /// Wraps a model with a bounded LRU memo cache.
    ///
    /// A `capacity` of zero disables caching.
    pub fn with_cache(model: M, capacity: usize) -> Self {
        let cache = (capacity > 0).then(|| Mutex::new(Cache::new(capacity)));
        Self { model, cache }
    }

    /// Evaluates the model, consulting the cache first.
    ///
    /// # Errors
    ///
    /// Returns the wrapped model's error if the call fails. Failed calls are
    /// never cached.
    pub fn evaluate(&self, input: &M::Input) -> Result<M::Output, M::Error> {
        let Some(cache) = &self.cache else {
            return self.model.call(input);
        };

        let key = canon::digest(input);
        {
            let mut cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(output) = cache.lookup(&key) {
                trace!("evaluator cache hit");
                return Ok(output);
            }
        }
        trace!("evaluator cache miss");

        // The lock is not held across the model call; a concurrent miss on
        // the same key recomputes the same value and either write is correct.
        let output = self.model.call(input)?;
        cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .store(key, output.clone());
        Ok(output)
    }

    /// Returns a snapshot of the cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        match &self.cache {
            Some(cache) => {
                let cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
                CacheStats {
                    hits: cache.hits,
                    misses: cache.misses,
                    evictions: cache.evictions,
                    size: cache.map.len(),
                    capacity: cache.capacity,
                }
            }
            None => CacheStats::default(),
        }
    }

    /// Returns the wrapped model.
    pub fn model(&self) -> &M {
        &self.model
    }
}

impl<M: Model> Model for Evaluator<M>
where
    M::Input: Record,
    M::Output: Clone,
{
    type Input = M::Input;
    type Output = M::Output;
    type Error = M::Error;

    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        self.evaluate(input)
    }
}
