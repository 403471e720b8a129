//! Topic prefix matching for SUB endpoints.
//!
//! A published message is delivered to a subscriber when its first frame
//! (the topic frame) starts with one of the subscriber's prefixes.

use bytes::Bytes;

/// A subscription entry with topic prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Topic prefix (empty = subscribe to all)
    pub prefix: Bytes,
}

impl Subscription {
    /// Create a new subscription for a topic prefix
    #[must_use]
    pub const fn new(prefix: Bytes) -> Self {
        Self { prefix }
    }

    /// Check if this subscription matches a given topic
    #[must_use]
    pub fn matches(&self, topic: &[u8]) -> bool {
        topic.starts_with(&self.prefix)
    }
}

/// The set of prefixes a subscriber listens to.
///
/// A linear scan is enough here: a bridge subscriber carries exactly one
/// filter, applied once at creation.
#[derive(Debug, Default, Clone)]
pub struct SubscriptionSet {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionSet {
    /// Create a new empty set
    #[must_use]
    pub const fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
        }
    }

    /// Add a subscription, ignoring duplicates
    pub fn subscribe(&mut self, prefix: &[u8]) {
        if !self.subscriptions.iter().any(|s| s.prefix == prefix) {
            self.subscriptions
                .push(Subscription::new(Bytes::copy_from_slice(prefix)));
        }
    }

    /// Remove a subscription
    pub fn unsubscribe(&mut self, prefix: &[u8]) {
        self.subscriptions.retain(|s| s.prefix != prefix);
    }

    /// Check if a topic matches any subscription
    ///
    /// No subscriptions means nothing is delivered.
    #[must_use]
    pub fn matches(&self, topic: &[u8]) -> bool {
        self.subscriptions.iter().any(|s| s.matches(topic))
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
        let sub = Subscription::new(Bytes::from_static(b"vehicle."));

        assert!(sub.matches(b"vehicle.speed"));
        assert!(sub.matches(b"vehicle."));
        assert!(!sub.matches(b"camera.front"));
        assert!(!sub.matches(b"vehic"));
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

        assert!(!set.matches(b"vehicle"));

        set.subscribe(b"vehicle");
        set.subscribe(b"vehicle");
        assert_eq!(set.len(), 1);
        assert!(set.matches(b"vehicle"));
        assert!(!set.matches(b"lidar"));

        set.unsubscribe(b"vehicle");
        assert!(set.is_empty());
        assert!(!set.matches(b"vehicle"));
    }

    #[test]
    fn test_set_multiple_subscriptions() {
        let mut set = SubscriptionSet::new();

        set.subscribe(b"vehicle");
        set.subscribe(b"camera");

        assert!(set.matches(b"vehicle/state"));
        assert!(set.matches(b"camera"));
        assert!(!set.matches(b"lidar"));
    }
}
