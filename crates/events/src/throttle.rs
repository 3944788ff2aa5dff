//! Per-channel alert throttle.
//!
//! [`AlertThrottle`] remembers when each channel last sent successfully and
//! refuses sends closer together than the channel's minimum interval. Each
//! channel has its own lock so a suppressed or slow channel never blocks
//! another; holding a [`ThrottleGuard`] across check, send and record makes
//! that sequence atomic per channel.
//!
//! Spacing is measured on a [`Clock`] read while the guard is held, so it
//! reflects when alerts actually go out rather than when their cycle began.

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use sitewatch_core::channels::Channel;
use sitewatch_core::config::ChannelPolicy;
use sitewatch_core::types::{self, Timestamp};

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of the send time used for throttling.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        types::now()
    }
}

// ---------------------------------------------------------------------------
// AlertThrottle
// ---------------------------------------------------------------------------

/// `None` means the channel has never sent, so the first alert always passes.
type Slot = Arc<Mutex<Option<Timestamp>>>;

/// Last-successful-send state for every channel.
#[derive(Debug, Default)]
pub struct AlertThrottle {
    email: Slot,
    webhook: Slot,
}

/// Exclusive access to one channel's throttle state.
pub struct ThrottleGuard {
    last_sent: OwnedMutexGuard<Option<Timestamp>>,
}

impl AlertThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, channel: Channel) -> &Slot {
        match channel {
            Channel::Email => &self.email,
            Channel::Webhook => &self.webhook,
        }
    }

    /// Lock one channel's state until the guard is dropped.
    ///
    /// This is the only way to check or record a send: the guard keeps the
    /// check and the record atomic for the channel.
    pub async fn acquire(&self, channel: Channel) -> ThrottleGuard {
        ThrottleGuard {
            last_sent: Arc::clone(self.slot(channel)).lock_owned().await,
        }
    }

    pub async fn last_sent(&self, channel: Channel) -> Option<Timestamp> {
        *self.slot(channel).lock().await
    }
}

impl ThrottleGuard {
    pub fn may_send(&self, policy: ChannelPolicy, now: Timestamp) -> bool {
        if !policy.enabled {
            return false;
        }
        match *self.last_sent {
            None => true,
            // A clock that moved backwards yields a negative delta; hold off
            // until it has caught up.
            Some(last) => (now - last)
                .to_std()
                .map(|elapsed| elapsed >= policy.min_interval)
                .unwrap_or(false),
        }
    }

    pub fn record_sent(&mut self, now: Timestamp) {
        *self.last_sent = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    impl AlertThrottle {
        async fn may_send(&self, channel: Channel, policy: ChannelPolicy, now: Timestamp) -> bool {
            self.acquire(channel).await.may_send(policy, now)
        }

        async fn record_sent(&self, channel: Channel, now: Timestamp) {
            self.acquire(channel).await.record_sent(now);
        }
    }

    fn policy(secs: u64) -> ChannelPolicy {
        ChannelPolicy {
            enabled: true,
            min_interval: Duration::from_secs(secs),
        }
    }

    fn at(secs: i64) -> Timestamp {
        chrono::DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn system_clock_tracks_wall_clock() {
        let before = chrono::Utc::now();
        let now = SystemClock.now();
        assert!(now >= before);
        assert!(now <= chrono::Utc::now());
    }

    #[tokio::test]
    async fn first_send_is_never_suppressed() {
        let throttle = AlertThrottle::new();
        assert!(throttle.may_send(Channel::Email, policy(3600), at(0)).await);
        assert!(throttle.last_sent(Channel::Email).await.is_none());
    }

    #[tokio::test]
    async fn disabled_channel_never_sends() {
        let throttle = AlertThrottle::new();
        let disabled = ChannelPolicy {
            enabled: false,
            min_interval: Duration::ZERO,
        };
        assert!(!throttle.may_send(Channel::Webhook, disabled, at(0)).await);
    }

    #[tokio::test]
    async fn spacing_is_measured_from_last_success() {
        let throttle = AlertThrottle::new();
        throttle.record_sent(Channel::Email, at(0)).await;

        assert!(!throttle.may_send(Channel::Email, policy(3600), at(10)).await);
        assert!(!throttle.may_send(Channel::Email, policy(3600), at(3599)).await);
        assert!(throttle.may_send(Channel::Email, policy(3600), at(3600)).await);
        assert_eq!(throttle.last_sent(Channel::Email).await, Some(at(0)));
    }

    #[tokio::test]
    async fn channels_are_independent() {
        let throttle = AlertThrottle::new();
        throttle.record_sent(Channel::Email, at(0)).await;

        assert!(!throttle.may_send(Channel::Email, policy(60), at(1)).await);
        assert!(throttle.may_send(Channel::Webhook, policy(60), at(1)).await);
    }

    #[tokio::test]
    async fn clock_going_backwards_suppresses() {
        let throttle = AlertThrottle::new();
        throttle.record_sent(Channel::Email, at(100)).await;
        assert!(!throttle.may_send(Channel::Email, policy(0), at(50)).await);
    }

    #[tokio::test]
    async fn guard_serialises_check_and_record() {
        let throttle = Arc::new(AlertThrottle::new());
        let mut handles = Vec::new();

        for _ in 0..8 {
            let throttle = Arc::clone(&throttle);
            handles.push(tokio::spawn(async move {
                let mut guard = throttle.acquire(Channel::Email).await;
                if guard.may_send(policy(3600), at(0)) {
                    tokio::task::yield_now().await;
                    guard.record_sent(at(0));
                    true
                } else {
                    false
                }
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
