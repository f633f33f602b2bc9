//! Ping/pong liveness monitoring.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::connection::ClientConnection;

/// Why the heartbeat loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatResult {
    /// A probe went unanswered for a full interval.
    TimedOut,
    /// The connection was torn down by something else.
    Cancelled,
}

/// Probe `connection` every `interval`, starting one interval after the call.
///
/// At each tick the liveness flag is read and cleared. If it was already
/// clear, the previous probe was never answered and the loop returns
/// [`HeartbeatResult::TimedOut`]; otherwise a new ping is queued.
///
/// A ping that cannot be queued because the outbound channel is full puts
/// the flag back, so the peer is not blamed for a probe it never got. A
/// second consecutive tick with a full channel counts as a timeout.
pub async fn run_heartbeat(
    connection: Arc<ClientConnection>,
    interval: Duration,
    cancel: CancellationToken,
) -> HeartbeatResult {
    let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut deferred = false;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                return HeartbeatResult::Cancelled;
            }
            _ = ticker.tick() => {
                if !connection.check_alive() {
                    return HeartbeatResult::TimedOut;
                }
                if connection.probe() {
                    deferred = false;
                } else if deferred {
                    tracing::debug!(connection_id = %connection.id, "outbound queue still full");
                    return HeartbeatResult::TimedOut;
                } else {
                    tracing::debug!(connection_id = %connection.id, "ping not queued");
                    connection.restore_alive();
                    deferred = true;
                }
            }
        }
    }
}
