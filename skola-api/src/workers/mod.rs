//! Background consumers that apply entity events to the store.
//!
//! Each service binary spawns one worker next to its HTTP router. The
//! worker decodes envelopes from its topic and drives the repository,
//! reporting a [`Handled`] outcome back to the consumer loop so it can
//! commit the offset or dead-letter the message.

pub mod class;
pub mod course;
pub mod path;

pub use class::ClassWorker;
pub use course::CourseWorker;
pub use path::PathWorker;

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{error, info, warn};

use skola_core::{ApplyOutcome, Handled};
use skola_shared::RawEnvelope;

/// How often a failing apply is attempted before the event is given up on.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            pause: Duration::from_millis(200),
        }
    }
}

/// Runs `op` until it yields an outcome or the retry budget is spent.
///
/// Store errors are transient as far as the worker can tell, so they are
/// retried. A [`ApplyOutcome::Missing`] target is final: the row is gone
/// and retrying cannot bring it back.
pub(crate) async fn apply_with_retries<F, Fut>(retry: RetryPolicy, what: &str, mut op: F) -> Handled
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<ApplyOutcome, Box<dyn std::error::Error + Send + Sync>>>,
{
    for attempt in 1..=retry.attempts {
        match op().await {
            Ok(ApplyOutcome::Applied { id }) => {
                info!("Applied {} to row {}", what, id);
                return Handled::Applied;
            }
            Ok(ApplyOutcome::Duplicate) => {
                info!("Skipping already processed {}", what);
                return Handled::Skipped;
            }
            Ok(ApplyOutcome::Missing) => {
                warn!("Target row for {} does not exist", what);
                return Handled::Skipped;
            }
            Err(e) if attempt < retry.attempts => {
                warn!("Attempt {} for {} failed: {}", attempt, what, e);
                tokio::time::sleep(retry.pause).await;
            }
            Err(e) => {
                error!("Giving up on {} after {} attempts: {}", what, retry.attempts, e);
                return Handled::Failed(e.to_string());
            }
        }
    }

    Handled::Failed("no attempts configured".to_string())
}

/// Recovers the typed payload carried inside a decoded envelope.
///
/// An absent payload decodes as JSON null, which fails for any payload
/// type with required fields and so surfaces as poison upstream.
pub(crate) fn decode_payload<P: DeserializeOwned>(
    envelope: &RawEnvelope,
) -> Result<P, serde_json::Error> {
    let value = envelope.payload.clone().unwrap_or(serde_json::Value::Null);
    serde_json::from_value(value)
}
