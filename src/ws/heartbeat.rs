//! Two-tick dead peer detection over every registered connection.
//!
//! Each tick demands a fresh proof of life since the previous one: a target
//! that was alive is marked dead and probed, a target still marked dead (no
//! PONG since the previous tick) is terminated. A peer that stays silent is
//! therefore dropped after at most two periods.

use std::sync::Weak;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;

use super::registry::Registry;
use super::traits::HeartbeatTarget;

/// Run one heartbeat pass over `targets`.
pub fn tick<T: HeartbeatTarget>(targets: &[(String, T)]) {
    for (key, target) in targets {
        if target.take_alive() {
            if target.is_open() {
                target.send_probe();
            }
        } else if target.is_open() {
            #[cfg(feature = "tracing")]
            tracing::warn!(%key, "No PONG since last heartbeat, terminating connection");
            #[cfg(not(feature = "tracing"))]
            let _ = key;

            target.force_close();
        }
    }
}

/// Spawn the recurring monitor. The first tick happens one `period` after the
/// call, the task exits once `token` is cancelled or the registry is dropped.
pub(crate) fn spawn<T>(registry: Weak<Registry<T>>, period: Duration, token: CancellationToken)
where
    T: HeartbeatTarget + Clone,
{
    let start = Instant::now() + period;

    tokio::spawn(async move {
        let mut ticker = interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        #[cfg(feature = "tracing")]
        tracing::debug!(?period, "Heartbeat monitor started");

        loop {
            tokio::select! {
                biased;

                () = token.cancelled() => break,
                _ = ticker.tick() => {
                    let Some(registry) = registry.upgrade() else {
                        break;
                    };
                    tick(&registry.snapshot());
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Heartbeat monitor stopped");
    });
}
