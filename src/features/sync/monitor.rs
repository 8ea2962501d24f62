//! Connectivity monitor.
//!
//! Probes the service health endpoint on demand and records the answer in
//! the shared [`SyncContext`]. There is no background polling: checks run at
//! startup and when the user asks for a retry.

use std::time::Duration;

use tracing::{debug, info};

use super::context::SyncContext;
use crate::api::Backend;
use crate::config::RetryPolicy;

/// On-demand reachability checks for the registration service.
pub struct ConnectivityMonitor<'a> {
    backend: &'a dyn Backend,
    context: &'a SyncContext,
}

impl<'a> ConnectivityMonitor<'a> {
    #[must_use]
    pub const fn new(backend: &'a dyn Backend, context: &'a SyncContext) -> Self {
        Self { backend, context }
    }

    /// Probe the service once and update the availability flag.
    ///
    /// Returns `true` only when the health endpoint answered with a success
    /// status and a parseable body.
    pub fn check_now(&self) -> bool {
        let available = match self.backend.health() {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "health check failed");
                false
            }
        };

        if let Some(change) = self.context.set_available(available) {
            if change.came_online() {
                info!("registration service is reachable");
            } else {
                info!("registration service is unreachable");
            }
        }

        available
    }

    /// Keep probing with bounded exponential backoff until the service
    /// answers or the policy runs out of attempts.
    pub fn wait_until_available(&self, policy: &RetryPolicy) -> bool {
        self.wait_until_available_with(policy, std::thread::sleep)
    }

    /// Like [`Self::wait_until_available`] with a custom sleep function.
    pub fn wait_until_available_with(
        &self,
        policy: &RetryPolicy,
        mut sleep: impl FnMut(Duration),
    ) -> bool {
        let attempts = policy.max_attempts.max(1);

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = policy.delay_for(attempt - 1);
                debug!(attempt, max = attempts, ?delay, "retrying health check");
                sleep(delay);
            }

            if self.check_now() {
                return true;
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::api::MockBackend;
    use crate::error::RollcallError;

    fn offline() -> Result<(), RollcallError> {
        Err(RollcallError::Network("connection refused".to_string()))
    }

    #[test]
    fn test_check_now_available() {
        let mut backend = MockBackend::new();
        backend.expect_health().times(1).returning(|| Ok(()));
        let context = SyncContext::new();

        assert!(ConnectivityMonitor::new(&backend, &context).check_now());
        assert!(context.is_available());
    }

    #[test]
    fn test_check_now_network_error() {
        let mut backend = MockBackend::new();
        backend.expect_health().returning(offline);
        let context = SyncContext::new();

        assert!(!ConnectivityMonitor::new(&backend, &context).check_now());
        assert!(!context.is_available());
    }

    #[test]
    fn test_check_now_error_status() {
        let mut backend = MockBackend::new();
        backend.expect_health().returning(|| {
            Err(RollcallError::Rejected {
                status: 500,
                message: "boom".to_string(),
            })
        });
        let context = SyncContext::new();
        context.set_available(true);

        assert!(!ConnectivityMonitor::new(&backend, &context).check_now());
        assert!(!context.is_available());
    }

    #[test]
    fn test_notifies_only_on_change() {
        let mut backend = MockBackend::new();
        let mut answers = vec![Ok(()), Ok(()), offline()].into_iter();
        backend
            .expect_health()
            .times(3)
            .returning(move || answers.next().unwrap());

        let changes = Rc::new(RefCell::new(Vec::new()));
        let context = SyncContext::new();
        let sink = Rc::clone(&changes);
        context.subscribe(move |c| sink.borrow_mut().push(c.current));

        let monitor = ConnectivityMonitor::new(&backend, &context);
        monitor.check_now();
        monitor.check_now();
        monitor.check_now();

        assert_eq!(*changes.borrow(), vec![true, false]);
    }

    #[test]
    fn test_wait_until_available_backs_off() {
        let mut backend = MockBackend::new();
        let mut answers = vec![offline(), offline(), Ok(())].into_iter();
        backend
            .expect_health()
            .times(3)
            .returning(move || answers.next().unwrap());
        let context = SyncContext::new();
        let policy = RetryPolicy {
            initial_backoff_ms: 100,
            max_backoff_ms: 1_000,
            max_attempts: 5,
        };

        let mut delays = Vec::new();
        let up = ConnectivityMonitor::new(&backend, &context)
            .wait_until_available_with(&policy, |d| delays.push(d));

        assert!(up);
        assert_eq!(
            delays,
            vec![Duration::from_millis(100), Duration::from_millis(200)]
        );
    }

    #[test]
    fn test_wait_until_available_gives_up() {
        let mut backend = MockBackend::new();
        backend.expect_health().times(3).returning(offline);
        let context = SyncContext::new();
        let policy = RetryPolicy {
            initial_backoff_ms: 1,
            max_backoff_ms: 1,
            max_attempts: 3,
        };

        let mut sleeps = 0;
        let up = ConnectivityMonitor::new(&backend, &context)
            .wait_until_available_with(&policy, |_| sleeps += 1);

        assert!(!up);
        assert_eq!(sleeps, 2);
    }
}
