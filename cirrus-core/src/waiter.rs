//! Waiter - Poll a remote object until it reaches a target state
//!
//! Cloud APIs acknowledge create/delete requests before the work is done.
//! `StateChangeConf` repeatedly calls a refresh function and inspects the
//! status string it reports, until the status is one of the targets, a
//! failure status shows up, or the overall timeout elapses.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// Error returned by a refresh callback
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced while waiting for a state change
#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    #[error(
        "timeout while waiting for state to become '{}' (last state: '{}', timeout: {:?})",
        target.join(", "),
        last_state.as_deref().unwrap_or(""),
        timeout
    )]
    Timeout {
        target: Vec<String>,
        last_state: Option<String>,
        timeout: Duration,
    },

    #[error("unexpected state '{state}', wanted target '{}'", target.join(", "))]
    UnexpectedState { state: String, target: Vec<String> },

    #[error("failed state '{state}'")]
    FailureState { state: String },

    #[error("couldn't find resource ({checks} retries)")]
    NotFound { checks: usize },

    #[error(transparent)]
    Refresh(BoxError),
}

impl WaitError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout { .. })
    }
}

/// Configuration of a single wait for a state change
///
/// A refresh returning `None` as its object means "not found". Callers that
/// want a not-found to count as success (e.g., waiting for deletion) map it
/// to an explicit target status themselves.
#[derive(Debug, Clone)]
pub struct StateChangeConf {
    pub pending: Vec<String>,
    pub target: Vec<String>,
    /// Statuses that abort the wait immediately
    pub failure: Vec<String>,
    pub timeout: Duration,
    /// Wait before the first refresh
    pub delay: Duration,
    /// Smallest interval between two refreshes
    pub min_timeout: Duration,
    /// Largest interval between two refreshes
    pub max_interval: Duration,
    /// Fixed interval between refreshes, replacing the growing backoff
    pub poll_interval: Option<Duration>,
    /// Consecutive not-found refreshes tolerated before giving up
    pub not_found_checks: usize,
}

const INITIAL_INTERVAL: Duration = Duration::from_millis(100);

impl StateChangeConf {
    pub fn new(pending: &[&str], target: &[&str]) -> Self {
        Self {
            pending: pending.iter().map(|s| s.to_string()).collect(),
            target: target.iter().map(|s| s.to_string()).collect(),
            failure: Vec::new(),
            timeout: Duration::from_secs(20 * 60),
            delay: Duration::ZERO,
            min_timeout: Duration::ZERO,
            max_interval: Duration::from_secs(10),
            poll_interval: None,
            not_found_checks: 20,
        }
    }

    pub fn with_failure(mut self, failure: &[&str]) -> Self {
        self.failure = failure.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_min_timeout(mut self, min_timeout: Duration) -> Self {
        self.min_timeout = min_timeout;
        self
    }

    pub fn with_max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = max_interval;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn with_not_found_checks(mut self, checks: usize) -> Self {
        self.not_found_checks = checks;
        self
    }

    /// Interval to sleep after the given number of pending refreshes
    fn interval(&self, attempt: u32) -> Duration {
        if let Some(fixed) = self.poll_interval {
            return fixed;
        }
        let backoff = INITIAL_INTERVAL.saturating_mul(2u32.saturating_pow(attempt));
        backoff.max(self.min_timeout).min(self.max_interval.max(self.min_timeout))
    }

    /// Poll `refresh` until the reported status is one of the targets
    ///
    /// Returns the object from the refresh that reached the target, or
    /// `None` when the target set is empty and the object disappeared.
    pub async fn wait_for_state<T, E, F, Fut>(&self, mut refresh: F) -> Result<Option<T>, WaitError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(Option<T>, String), E>>,
        E: Into<BoxError>,
    {
        let deadline = Instant::now() + self.timeout;
        let mut last_state: Option<String> = None;
        let mut not_found = 0;
        let mut attempt = 0;

        log::debug!(
            "Waiting {:?} for state to become: {:?}",
            self.timeout,
            self.target
        );
        tokio::time::sleep_until((Instant::now() + self.delay).min(deadline)).await;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(self.timeout_error(last_state));
            }

            let refreshed = match tokio::time::timeout(remaining, refresh()).await {
                Ok(result) => result.map_err(|e| WaitError::Refresh(e.into()))?,
                Err(_) => return Err(self.timeout_error(last_state)),
            };

            match refreshed {
                (None, _) => {
                    if self.target.is_empty() {
                        return Ok(None);
                    }
                    not_found += 1;
                    if not_found > self.not_found_checks {
                        return Err(WaitError::NotFound {
                            checks: self.not_found_checks,
                        });
                    }
                    log::debug!("Refresh found nothing ({} of {})", not_found, self.not_found_checks);
                }
                (Some(object), state) => {
                    not_found = 0;
                    log::debug!("Current state: {}", state);

                    if self.target.contains(&state) {
                        return Ok(Some(object));
                    }
                    if self.failure.contains(&state) {
                        return Err(WaitError::FailureState { state });
                    }
                    if !self.pending.contains(&state) {
                        return Err(WaitError::UnexpectedState {
                            state,
                            target: self.target.clone(),
                        });
                    }
                    last_state = Some(state);
                }
            }

            let interval = self.interval(attempt);
            attempt = attempt.saturating_add(1);
            tokio::time::sleep_until((Instant::now() + interval).min(deadline)).await;
        }
    }

    fn timeout_error(&self, last_state: Option<String>) -> WaitError {
        WaitError::Timeout {
            target: self.target.clone(),
            last_state,
            timeout: self.timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence(
        states: &[&'static str],
    ) -> impl FnMut() -> std::future::Ready<Result<(Option<&'static str>, String), String>> {
        let mut iter = states.to_vec().into_iter();
        let last = states.last().copied().unwrap_or("");
        move || {
            let state = iter.next().unwrap_or(last);
            std::future::ready(Ok((Some(state), state.to_string())))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reaches_target_after_pending() {
        let conf = StateChangeConf::new(&["CREATING"], &["ACTIVE"])
            .with_delay(Duration::from_secs(5))
            .with_min_timeout(Duration::from_secs(3))
            .with_timeout(Duration::from_secs(60));

        let result = conf
            .wait_for_state(sequence(&["CREATING", "CREATING", "ACTIVE"]))
            .await
            .unwrap();
        assert_eq!(result, Some("ACTIVE"));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_state_is_fatal() {
        let conf = StateChangeConf::new(&["Creating"], &["Available"]).with_failure(&["Error"]);

        let err = conf
            .wait_for_state(sequence(&["Creating", "Error"]))
            .await
            .unwrap_err();
        assert!(matches!(err, WaitError::FailureState { ref state } if state == "Error"));
    }

    #[tokio::test(start_paused = true)]
    async fn unexpected_state_is_fatal() {
        let conf = StateChangeConf::new(&["CREATING"], &["ACTIVE"]);

        let err = conf.wait_for_state(sequence(&["DOWN"])).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "unexpected state 'DOWN', wanted target 'ACTIVE'"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_while_pending() {
        let conf = StateChangeConf::new(&["CREATING"], &["ACTIVE"])
            .with_delay(Duration::from_secs(5))
            .with_min_timeout(Duration::from_secs(3))
            .with_timeout(Duration::from_secs(30));

        let started = Instant::now();
        let err = conf.wait_for_state(sequence(&["CREATING"])).await.unwrap_err();

        assert!(err.is_timeout());
        assert!(matches!(
            err,
            WaitError::Timeout { last_state: Some(ref s), .. } if s == "CREATING"
        ));
        assert_eq!(started.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_error_is_propagated() {
        let conf = StateChangeConf::new(&["CREATING"], &["ACTIVE"]);

        let err = conf
            .wait_for_state(|| async {
                Err::<(Option<()>, String), _>("Vpc status: 'DOWN'".to_string())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, WaitError::Refresh(_)));
        assert_eq!(err.to_string(), "Vpc status: 'DOWN'");
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_not_found_checks() {
        let conf = StateChangeConf::new(&["CREATING"], &["ACTIVE"]).with_not_found_checks(3);

        let mut calls = 0;
        let err = conf
            .wait_for_state(|| {
                calls += 1;
                async { Ok::<(Option<()>, String), String>((None, String::new())) }
            })
            .await
            .unwrap_err();
        assert!(matches!(err, WaitError::NotFound { checks: 3 }));
        assert_eq!(calls, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_target_accepts_disappearance() {
        let conf = StateChangeConf::new(&["ACTIVE"], &[]);

        let result = conf
            .wait_for_state(|| async { Ok::<(Option<()>, String), String>((None, String::new())) })
            .await
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test(start_paused = true)]
    async fn polls_after_delay_with_min_interval() {
        let conf = StateChangeConf::new(&["CREATING"], &["ACTIVE"])
            .with_delay(Duration::from_secs(5))
            .with_min_timeout(Duration::from_secs(3))
            .with_timeout(Duration::from_secs(60));

        let started = Instant::now();
        let mut seen = Vec::new();
        let mut states = vec!["CREATING", "CREATING", "ACTIVE"].into_iter();
        conf.wait_for_state(|| {
            seen.push(started.elapsed());
            let state = states.next().unwrap_or("ACTIVE");
            async move { Ok::<_, String>((Some(()), state.to_string())) }
        })
        .await
        .unwrap();

        assert_eq!(
            seen,
            vec![
                Duration::from_secs(5),
                Duration::from_secs(8),
                Duration::from_secs(11)
            ]
        );
    }

    #[test]
    fn backoff_doubles_up_to_max_interval() {
        let conf = StateChangeConf::new(&[], &["ACTIVE"]);
        assert_eq!(conf.interval(0), Duration::from_millis(100));
        assert_eq!(conf.interval(1), Duration::from_millis(200));
        assert_eq!(conf.interval(3), Duration::from_millis(800));
        assert_eq!(conf.interval(10), Duration::from_secs(10));
        assert_eq!(conf.interval(40), Duration::from_secs(10));

        let fixed = conf.with_poll_interval(Duration::from_secs(2));
        assert_eq!(fixed.interval(5), Duration::from_secs(2));
    }
}
