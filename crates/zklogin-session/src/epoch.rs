//! Network epoch lookup.
//!
//! The ephemeral key is valid until `current_epoch + epoch_buffer`. A live
//! source (an RPC client) is supplied by the caller; without one the epoch is
//! estimated from the clock.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ExternalError;

/// Approximate network start (2022-01-01T00:00:00Z), Unix milliseconds.
pub const EPOCH_GENESIS_MS: i64 = 1_640_995_200_000;

/// Approximate epoch length: 24 hours.
pub const EPOCH_DURATION_MS: i64 = 86_400_000;

/// Estimates never go below this epoch.
pub const MINIMUM_EPOCH: u64 = 100;

#[async_trait]
pub trait EpochSource: Send + Sync {
    async fn current_epoch(&self) -> Result<u64, ExternalError>;
}

/// Clock-based epoch estimate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimatedEpochSource;

impl EstimatedEpochSource {
    pub fn estimate_at(now_ms: i64) -> u64 {
        let elapsed = now_ms.saturating_sub(EPOCH_GENESIS_MS).max(0);
        let estimate = u64::try_from(elapsed / EPOCH_DURATION_MS).unwrap_or(0);
        estimate.max(MINIMUM_EPOCH)
    }
}

#[async_trait]
impl EpochSource for EstimatedEpochSource {
    async fn current_epoch(&self) -> Result<u64, ExternalError> {
        Ok(Self::estimate_at(chrono::Utc::now().timestamp_millis()))
    }
}

/// Ask a live source first and fall back to the clock estimate when it fails.
pub struct FallbackEpochSource {
    primary: Arc<dyn EpochSource>,
}

impl FallbackEpochSource {
    pub fn new(primary: Arc<dyn EpochSource>) -> Self {
        Self { primary }
    }
}

#[async_trait]
impl EpochSource for FallbackEpochSource {
    async fn current_epoch(&self) -> Result<u64, ExternalError> {
        match self.primary.current_epoch().await {
            Ok(epoch) => Ok(epoch),
            Err(e) => {
                tracing::warn!(error = %e, "epoch lookup failed; using clock estimate");
                EstimatedEpochSource.current_epoch().await
            }
        }
    }
}
