#![expect(
    clippy::module_name_repetitions,
    reason = "Configuration types intentionally mirror the module name for clarity"
)]

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use backoff::backoff::Backoff as _;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};

const DEFAULT_HEARTBEAT_INTERVAL_DURATION: Duration = Duration::from_secs(30);
const DEFAULT_INITIAL_BACKOFF_DURATION: Duration = Duration::from_secs(1);
const DEFAULT_MAX_BACKOFF_DURATION: Duration = Duration::from_secs(60);
const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Shortest heartbeat period a registry runs with. Shorter periods are raised to it.
pub const MIN_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(10);

/// Configuration for realtime subscription behavior.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct Config {
    /// Period of the heartbeat monitor. A connection must answer at least one
    /// PING per period, two silent periods terminate it. Never below
    /// [`MIN_HEARTBEAT_INTERVAL`] once handed to a registry.
    pub heartbeat_interval: Duration,
}

impl Config {
    #[must_use]
    pub fn with_heartbeat_interval(mut self, heartbeat_interval: Duration) -> Self {
        self.heartbeat_interval = heartbeat_interval;
        self
    }

    /// Heartbeat period actually used by the monitor.
    #[must_use]
    pub fn effective_heartbeat_interval(&self) -> Duration {
        self.heartbeat_interval.max(MIN_HEARTBEAT_INTERVAL)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL_DURATION,
        }
    }
}

/// Backoff settings for callers that re-subscribe from their `reconnect` hook.
///
/// Connections never reconnect on their own. Turn this into a
/// [`ReconnectPolicy`] and ask it for the delay before each new subscription.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Maximum number of consecutive attempts before giving up.
    /// `None` means infinite retries.
    pub max_attempts: Option<u32>,
    /// Delay before the first attempt, before jitter
    pub initial_backoff: Duration,
    /// Upper bound for the delay, before jitter
    pub max_backoff: Duration,
    /// Growth factor between consecutive delays
    pub backoff_multiplier: f64,
}

impl ReconnectConfig {
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    #[must_use]
    pub fn with_initial_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    #[must_use]
    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    #[must_use]
    pub fn with_backoff_multiplier(mut self, backoff_multiplier: f64) -> Self {
        self.backoff_multiplier = backoff_multiplier;
        self
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::default()
            .with_initial_interval(self.initial_backoff)
            .with_max_interval(self.max_backoff)
            .with_multiplier(self.backoff_multiplier)
            // The attempt limit replaces an elapsed time limit
            .with_max_elapsed_time(None)
            .build()
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: None,
            initial_backoff: DEFAULT_INITIAL_BACKOFF_DURATION,
            max_backoff: DEFAULT_MAX_BACKOFF_DURATION,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

#[derive(Debug)]
struct Attempts {
    backoff: ExponentialBackoff,
    count: u32,
}

/// Delays between consecutive re-subscriptions of one stream.
///
/// Share it between the `reconnect` hook, which asks for the next delay, and
/// the `open_callback`, which resets it once a connection is open again.
///
/// ```
/// use std::time::Duration;
///
/// use upbit_client_sdk::ws::config::{ReconnectConfig, ReconnectPolicy};
///
/// let policy = ReconnectPolicy::new(&ReconnectConfig::default().with_max_attempts(1));
///
/// assert!(policy.next_delay().is_some_and(|delay| delay <= Duration::from_millis(1500)));
/// assert_eq!(policy.next_delay(), None);
///
/// policy.reset();
/// assert!(policy.next_delay().is_some());
/// ```
#[derive(Debug)]
pub struct ReconnectPolicy {
    config: ReconnectConfig,
    attempts: Mutex<Attempts>,
}

impl ReconnectPolicy {
    #[must_use]
    pub fn new(config: &ReconnectConfig) -> Self {
        Self {
            config: config.clone(),
            attempts: Mutex::new(Attempts {
                backoff: config.backoff(),
                count: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Attempts> {
        self.attempts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count one more attempt and return how long to wait before it, or
    /// `None` once `max_attempts` consecutive attempts have been made.
    pub fn next_delay(&self) -> Option<Duration> {
        let mut attempts = self.lock();
        if self
            .config
            .max_attempts
            .is_some_and(|max| attempts.count >= max)
        {
            return None;
        }

        attempts.count = attempts.count.saturating_add(1);
        attempts.backoff.next_backoff()
    }

    /// Start over from the initial delay, typically once a connection opens.
    pub fn reset(&self) {
        let mut attempts = self.lock();
        attempts.count = 0;
        attempts.backoff.reset();
    }

    /// Attempts made since the last reset.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.lock().count
    }

    #[must_use]
    pub fn config(&self) -> &ReconnectConfig {
        &self.config
    }
}

impl From<ReconnectConfig> for ReconnectPolicy {
    fn from(config: ReconnectConfig) -> Self {
        Self::new(&config)
    }
}
