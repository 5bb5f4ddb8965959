//! Topic prefix filtering for cooked subscribers.
//!
//! A message matches when its topic (first frame) starts with any
//! subscribed prefix. The empty prefix matches everything; a filter with no
//! subscriptions matches nothing.

use bytes::Bytes;

/// One subscribed topic prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Matched against the start of the topic; empty matches all.
    pub prefix: Bytes,
}

impl Subscription {
    /// Create a new subscription for a topic prefix
    #[must_use]
    pub const fn new(prefix: Bytes) -> Self {
        Self { prefix }
    }

    /// Whether `topic` starts with this prefix.
    #[must_use]
    pub fn matches(&self, topic: &[u8]) -> bool {
        topic.starts_with(&self.prefix)
    }
}

/// Set of subscribed prefixes, matched linearly.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionSet {
    /// Create an empty set
    #[must_use]
    pub const fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
        }
    }

    /// Add a prefix. Returns `false` if it was already present.
    pub fn subscribe(&mut self, prefix: Bytes) -> bool {
        if self.subscriptions.iter().any(|s| s.prefix == prefix) {
            return false;
        }
        self.subscriptions.push(Subscription::new(prefix));
        true
    }

    /// Remove a prefix. Returns `false` if it was not present.
    pub fn unsubscribe(&mut self, prefix: &[u8]) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.prefix != prefix);
        self.subscriptions.len() != before
    }

    /// Check if a topic matches any subscription
    #[must_use]
    pub fn matches(&self, topic: &[u8]) -> bool {
        self.subscriptions.iter().any(|s| s.matches(topic))
    }

    /// Current prefixes, in subscription order.
    #[must_use]
    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    /// Check if there are no subscriptions
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Get the number of subscriptions
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_matches() {
        let sub = Subscription::new(Bytes::from_static(b"topic."));

        assert!(sub.matches(b"topic.foo"));
        assert!(sub.matches(b"topic.bar"));
        assert!(!sub.matches(b"other.foo"));
        assert!(!sub.matches(b"topi"));
    }

    #[test]
    fn test_empty_subscription_matches_all() {
        let sub = Subscription::new(Bytes::new());

        assert!(sub.matches(b"anything"));
        assert!(sub.matches(b""));
    }

    #[test]
    fn test_set_basic() {
        let mut set = SubscriptionSet::new();
        assert!(!set.matches(b"topic.foo"));

        assert!(set.subscribe(Bytes::from_static(b"topic.")));
        assert!(!set.subscribe(Bytes::from_static(b"topic.")));
        assert_eq!(set.len(), 1);
        assert!(set.matches(b"topic.foo"));
        assert!(!set.matches(b"other.foo"));

        assert!(set.unsubscribe(b"topic."));
        assert!(!set.unsubscribe(b"topic."));
        assert!(set.is_empty());
        assert!(!set.matches(b"topic.foo"));
    }

    #[test]
    fn test_overlapping_prefixes() {
        let mut set = SubscriptionSet::new();
        set.subscribe(Bytes::from_static(b"weather."));
        set.subscribe(Bytes::from_static(b"weather.temp"));

        set.unsubscribe(b"weather.temp");
        // Still covered by the broader prefix.
        assert!(set.matches(b"weather.temp.celsius"));

        set.unsubscribe(b"weather.");
        assert!(!set.matches(b"weather.temp.celsius"));
    }
}
