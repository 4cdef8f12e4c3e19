use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::models::chat::participant_pair;
use crate::models::ChatMessage;

pub const CHAT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);
pub const CHAT_CACHE_CAPACITY: usize = 10_000;

struct Entry {
    messages: Vec<ChatMessage>,
    expires_at: Instant,
}

/// Conversation history keyed by participant pair with a fixed expiry.
/// Bounded: the least recently used pair goes first once full, and expired
/// entries are swept from the cold end on every write. Lookups are best
/// effort: a poisoned lock behaves like a miss.
pub struct ChatCache {
    ttl: Duration,
    entries: Mutex<LruCache<(String, String), Entry>>,
}

impl Default for ChatCache {
    fn default() -> Self {
        Self::new(CHAT_CACHE_TTL)
    }
}

impl ChatCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, CHAT_CACHE_CAPACITY)
    }

    pub fn with_capacity(ttl: Duration, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            ttl,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn key(a: &str, b: &str) -> (String, String) {
        let (a, b) = participant_pair(a, b);
        (a.to_string(), b.to_string())
    }

    pub fn get(&self, a: &str, b: &str) -> Option<Vec<ChatMessage>> {
        let mut entries = self.entries.lock().ok()?;
        let key = Self::key(a, b);
        match entries.get(&key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.messages.clone()),
            Some(_) => {
                entries.pop(&key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, a: &str, b: &str, messages: Vec<ChatMessage>) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        let now = Instant::now();
        while entries
            .peek_lru()
            .is_some_and(|(_, entry)| entry.expires_at <= now)
        {
            entries.pop_lru();
        }
        entries.put(
            Self::key(a, b),
            Entry {
                messages,
                expires_at: now + self.ttl,
            },
        );
    }

    pub fn invalidate(&self, a: &str, b: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.pop(&Self::key(a, b));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(content: &str) -> ChatMessage {
        ChatMessage {
            id: content.to_string(),
            chat_id: "c1".to_string(),
            sender_id: "u1".to_string(),
            recipient_id: "u2".to_string(),
            content: content.to_string(),
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_hit_is_symmetric() {
        let cache = ChatCache::default();
        cache.put("u1", "u2", vec![message("hi")]);
        assert_eq!(cache.get("u2", "u1").unwrap().len(), 1);
        assert!(cache.get("u1", "u3").is_none());
    }

    #[test]
    fn test_invalidate() {
        let cache = ChatCache::default();
        cache.put("u1", "u2", vec![message("hi")]);
        cache.invalidate("u2", "u1");
        assert!(cache.get("u1", "u2").is_none());
    }

    #[test]
    fn test_entries_expire() {
        let cache = ChatCache::new(Duration::from_millis(0));
        cache.put("u1", "u2", vec![message("hi")]);
        assert!(cache.get("u1", "u2").is_none());
    }

    #[test]
    fn test_expired_entries_are_swept_on_write() {
        let cache = ChatCache::new(Duration::from_millis(0));
        for i in 0..10_000 {
            cache.put("u1", &format!("peer{i}"), vec![message("hi")]);
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let cache = ChatCache::with_capacity(CHAT_CACHE_TTL, 2);
        cache.put("u1", "u2", vec![message("a")]);
        cache.put("u1", "u3", vec![message("b")]);
        // Touch u1/u2 so u1/u3 becomes the eviction candidate.
        assert!(cache.get("u2", "u1").is_some());
        cache.put("u1", "u4", vec![message("c")]);

        assert_eq!(cache.len(), 2);
        assert!(cache.get("u1", "u2").is_some());
        assert!(cache.get("u1", "u3").is_none());
        assert!(cache.get("u1", "u4").is_some());
    }
}
