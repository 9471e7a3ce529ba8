//! # TTL Cache
//!
//! A single-value cache with a time-to-live and explicit invalidation.
//!
//! ## Entry Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   put(v) ──► FRESH ──── ttl elapsed ────► STALE ──── put(v') ──► FRESH │
//! │                │                            ▲                           │
//! │                └──── invalidate() ──────────┘                           │
//! │                                                                         │
//! │   get_fresh(): FRESH only                                               │
//! │   get_any():   FRESH or STALE (the "last known good" copy)             │
//! │   clear():     drops the value entirely                                 │
//! │                                                                         │
//! │   record_failure() ──► retry_due() is false for one ttl                 │
//! │                        (put / invalidate / clear lift it)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Invalidation never throws the value away: a failed refetch can still fall
//! back to it.

use std::sync::RwLock;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    stored_at: Instant,
    stored_wall: DateTime<Utc>,
    invalidated: bool,
}

/// A cached value together with when it was stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    pub value: T,
    pub stored_at: DateTime<Utc>,
    pub fresh: bool,
}

#[derive(Debug)]
pub struct TtlCache<T> {
    slot: RwLock<Option<Entry<T>>>,
    failed_at: RwLock<Option<Instant>>,
    ttl: Duration,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        TtlCache {
            slot: RwLock::new(None),
            failed_at: RwLock::new(None),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the value only while it is fresh.
    pub fn get_fresh(&self) -> Option<Cached<T>> {
        self.get_any().filter(|c| c.fresh)
    }

    /// Returns the value whether fresh or stale.
    pub fn get_any(&self) -> Option<Cached<T>> {
        let guard = self.slot.read().ok()?;
        guard.as_ref().map(|entry| Cached {
            value: entry.value.clone(),
            stored_at: entry.stored_wall,
            fresh: !entry.invalidated && entry.stored_at.elapsed() < self.ttl,
        })
    }

    pub fn put(&self, value: T) {
        if let Ok(mut guard) = self.slot.write() {
            *guard = Some(Entry {
                value,
                stored_at: Instant::now(),
                stored_wall: Utc::now(),
                invalidated: false,
            });
        }
        self.set_failed_at(None);
    }

    /// Marks the value stale so the next read refetches.
    pub fn invalidate(&self) {
        if let Ok(mut guard) = self.slot.write() {
            if let Some(entry) = guard.as_mut() {
                entry.invalidated = true;
            }
        }
        self.set_failed_at(None);
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.slot.write() {
            *guard = None;
        }
        self.set_failed_at(None);
    }

    /// Notes a failed refetch. Until a ttl has passed, `retry_due` is false.
    pub fn record_failure(&self) {
        self.set_failed_at(Some(Instant::now()));
    }

    /// Whether the origin may be asked again.
    pub fn retry_due(&self) -> bool {
        match self.failed_at.read() {
            Ok(guard) => guard.map_or(true, |at| at.elapsed() >= self.ttl),
            Err(_) => true,
        }
    }

    fn set_failed_at(&self, at: Option<Instant>) {
        if let Ok(mut guard) = self.failed_at.write() {
            *guard = at;
        }
    }
}
