//! Cancellable refresh loop with exponential backoff on failure.

use futures_util::future::{AbortHandle, Abortable};
use std::future::Future;
use std::time::Duration;
use wasm_bindgen_futures::spawn_local;
use yew::Callback;

#[derive(Clone, Debug, PartialEq)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    failures: u32,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Backoff {
            base,
            max,
            failures: 0,
        }
    }

    /// Delay before the next poll given the outcome of the last one.
    pub fn next_delay(&mut self, succeeded: bool) -> Duration {
        if succeeded {
            self.failures = 0;
            return self.base;
        }
        self.failures = self.failures.saturating_add(1);
        let factor = 2u32.saturating_pow(self.failures.min(16));
        self.base.saturating_mul(factor).min(self.max)
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }
}

/// Decides what a poll outcome should surface to the page.
#[derive(Debug)]
pub struct Tracker<T> {
    last: Option<T>,
    failing: bool,
}

impl<T> Default for Tracker<T> {
    fn default() -> Self {
        Tracker {
            last: None,
            failing: false,
        }
    }
}

impl<T: PartialEq + Clone> Tracker<T> {
    /// The value to deliver, if it differs from the last one delivered.
    pub fn succeeded(&mut self, value: T) -> Option<T> {
        self.failing = false;
        if self.last.as_ref() == Some(&value) {
            return None;
        }
        self.last = Some(value.clone());
        Some(value)
    }

    /// True on the first failure of a streak. The page clears what it shows
    /// when told, so the next success is delivered even if it is unchanged.
    pub fn failed(&mut self) -> bool {
        if self.failing {
            return false;
        }
        self.failing = true;
        self.last = None;
        true
    }
}

/// Dropping the subscription stops the loop.
pub struct Subscription {
    handle: AbortHandle,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Fetches right away, then polls `fetch` until the subscription is dropped.
/// `on_change` only fires when the value differs from the last one delivered;
/// `on_error` fires once per run of failures.
pub fn subscribe<T, F, Fut, E>(
    backoff: Backoff,
    fetch: F,
    on_change: Callback<T>,
    on_error: Callback<String>,
) -> Subscription
where
    T: PartialEq + Clone + 'static,
    E: std::fmt::Display + 'static,
    F: Fn() -> Fut + 'static,
    Fut: Future<Output = Result<T, E>> + 'static,
{
    let (handle, registration) = AbortHandle::new_pair();
    let mut backoff = backoff;
    let task = async move {
        let mut tracker = Tracker::default();
        loop {
            let delay = match fetch().await {
                Ok(value) => {
                    if let Some(changed) = tracker.succeeded(value) {
                        on_change.emit(changed);
                    }
                    backoff.next_delay(true)
                }
                Err(e) => {
                    let delay = backoff.next_delay(false);
                    log::warn!(
                        "Refresh failed ({} in a row), retrying in {:?}: {}",
                        backoff.failures(),
                        delay,
                        e
                    );
                    if tracker.failed() {
                        on_error.emit(e.to_string());
                    }
                    delay
                }
            };
            if wasm_timer::Delay::new(delay).await.is_err() {
                log::warn!("Poll timer failed, stopping refresh");
                break;
            }
        }
    };
    spawn_local(async move {
        let _ = Abortable::new(task, registration).await;
    });
    Subscription { handle }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_double_the_delay_up_to_the_cap() {
        let mut backoff = Backoff::new(Duration::from_millis(1500), Duration::from_secs(30));
        assert_eq!(backoff.next_delay(true), Duration::from_millis(1500));
        assert_eq!(backoff.next_delay(false), Duration::from_millis(3000));
        assert_eq!(backoff.next_delay(false), Duration::from_millis(6000));
        assert_eq!(backoff.next_delay(false), Duration::from_millis(12000));
        assert_eq!(backoff.next_delay(false), Duration::from_millis(24000));
        assert_eq!(backoff.next_delay(false), Duration::from_secs(30));
        assert_eq!(backoff.failures(), 5);
    }

    #[test]
    fn success_resets_the_delay() {
        let mut backoff = Backoff::new(Duration::from_millis(1500), Duration::from_secs(30));
        backoff.next_delay(false);
        backoff.next_delay(false);
        assert_eq!(backoff.next_delay(true), Duration::from_millis(1500));
        assert_eq!(backoff.failures(), 0);
    }

    #[test]
    fn unchanged_values_are_delivered_once() {
        let mut tracker = Tracker::default();
        assert_eq!(tracker.succeeded(vec![1, 2]), Some(vec![1, 2]));
        assert_eq!(tracker.succeeded(vec![1, 2]), None);
        assert_eq!(tracker.succeeded(vec![3]), Some(vec![3]));
    }

    #[test]
    fn first_failure_is_reported_once_per_streak() {
        let mut tracker: Tracker<Vec<u8>> = Tracker::default();
        assert!(tracker.failed());
        assert!(!tracker.failed());
        assert!(!tracker.failed());
        assert_eq!(tracker.succeeded(vec![1]), Some(vec![1]));
        assert!(tracker.failed());
    }

    #[test]
    fn value_after_a_reported_failure_is_delivered_again() {
        let mut tracker = Tracker::default();
        assert_eq!(tracker.succeeded(vec![7]), Some(vec![7]));
        assert!(tracker.failed());
        assert_eq!(tracker.succeeded(vec![7]), Some(vec![7]));
    }

    #[test]
    fn many_failures_do_not_overflow() {
        let mut backoff = Backoff::new(Duration::from_secs(1), Duration::from_secs(30));
        for _ in 0..100 {
            backoff.next_delay(false);
        }
        assert_eq!(backoff.next_delay(false), Duration::from_secs(30));
    }
}
