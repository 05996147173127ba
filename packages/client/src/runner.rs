//! Client execution logic with reconnection support.

use std::time::Duration;

use crate::{error::ClientError, session::run_client_session, ui::spawn_input_reader};

pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;
pub const DEFAULT_RECONNECT_INTERVAL_SECS: u64 = 5;

/// How often and how fast to retry a lost connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Consecutive failures tolerated before giving up
    pub max_attempts: u32,
    /// Pause between attempts
    pub interval: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            interval: Duration::from_secs(DEFAULT_RECONNECT_INTERVAL_SECS),
        }
    }
}

impl ReconnectPolicy {
    /// Whether to try again after `failures` consecutive failures.
    pub fn should_retry(&self, failures: u32) -> bool {
        failures < self.max_attempts
    }
}

/// Run the client, reconnecting when the connection drops.
///
/// A connection that was established and then lost resets the failure count;
/// only back-to-back failures count towards `policy.max_attempts`.
pub async fn run_client(url: String, policy: ReconnectPolicy) -> Result<(), ClientError> {
    let mut input = spawn_input_reader();
    let mut failures = 0;

    loop {
        tracing::info!(
            "Attempting to connect to {} (attempt {}/{})",
            url,
            failures + 1,
            policy.max_attempts
        );

        match run_client_session(&url, &mut input).await {
            Ok(()) => {
                tracing::info!("Client session ended normally");
                return Ok(());
            }
            Err(e) => {
                tracing::warn!("{}", e);
                failures = match e {
                    ClientError::ConnectionLost => 1,
                    _ => failures + 1,
                };

                if !policy.should_retry(failures) {
                    tracing::error!(
                        "Failed to reconnect after {} attempts. Exiting.",
                        failures
                    );
                    return Err(ClientError::ReconnectExhausted(failures));
                }

                tracing::info!(
                    "Reconnecting in {} seconds... (attempt {}/{})",
                    policy.interval.as_secs(),
                    failures + 1,
                    policy.max_attempts
                );
                tokio::time::sleep(policy.interval).await;
            }
        }
    }
}
