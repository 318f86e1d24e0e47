//! Key Order Module
//!
//! Tracks the order in which keys should be evicted.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

// == Eviction Policy ==
/// Which entry is chosen when the store is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// Evict the oldest-inserted entry; reads do not reorder.
    #[default]
    Fifo,
    /// Evict the least recently read or written entry.
    Lru,
}

impl EvictionPolicy {
    /// Whether a successful read moves the key to the newest position.
    pub fn promotes_on_read(self) -> bool {
        matches!(self, EvictionPolicy::Lru)
    }
}

impl FromStr for EvictionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fifo" => Ok(EvictionPolicy::Fifo),
            "lru" => Ok(EvictionPolicy::Lru),
            other => Err(format!("unknown eviction policy: {}", other)),
        }
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvictionPolicy::Fifo => write!(f, "fifo"),
            EvictionPolicy::Lru => write!(f, "lru"),
        }
    }
}

// == Key Order ==
/// Ordered list of keys used to pick eviction victims.
///
/// Keys are stored in a VecDeque where:
/// - Front = Newest
/// - Back = Oldest (next eviction candidate)
#[derive(Debug, Default)]
pub struct KeyOrder {
    order: VecDeque<String>,
}

impl KeyOrder {
    // == Constructor ==
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Touch ==
    /// Moves a key to the newest position, inserting it if untracked.
    pub fn touch(&mut self, key: &str) {
        self.remove(key);
        self.order.push_front(key.to_string());
    }

    // == Insert ==
    /// Tracks a key as newest. A key already tracked keeps its position.
    pub fn insert(&mut self, key: &str) {
        if !self.contains(key) {
            self.order.push_front(key.to_string());
        }
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove(&mut self, key: &str) {
        self.order.retain(|k| k != key);
    }

    // == Pop Oldest ==
    /// Returns and removes the oldest key.
    ///
    /// Returns None if tracker is empty.
    pub fn pop_oldest(&mut self) -> Option<String> {
        self.order.pop_back()
    }

    // == Peek Oldest ==
    /// Returns the oldest key without removing it.
    pub fn peek_oldest(&self) -> Option<&String> {
        self.order.back()
    }

    // == Oldest First ==
    /// Iterates keys from oldest to newest.
    pub fn oldest_first(&self) -> impl Iterator<Item = &String> {
        self.order.iter().rev()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.order.iter().any(|k| k == key)
    }
}
