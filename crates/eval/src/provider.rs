//! Almanac provider trait and implementations.
//!
//! An `AlmanacProvider` asynchronously supplies the day's ephemeris
//! table for an evaluation context. Implementations fetch from
//! external systems (an ephemeris service, a cache); evaluation
//! itself stays synchronous against the assembled [`StaticAlmanac`].

use async_trait::async_trait;

use crate::astronomy::StaticAlmanac;
use crate::types::EvalContext;

/// Errors that can occur when an almanac provider fetches ephemerides.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AlmanacProviderError {
    /// A provider-specific error occurred.
    #[error("almanac provider error: {0}")]
    Provider(String),
}

/// Asynchronous provider of ephemeris tables for evaluation.
///
/// The evaluation context is provided so implementations can fetch
/// for the right date, coordinates, and elevation.
#[async_trait]
pub trait AlmanacProvider: Send + Sync {
    async fn fetch(&self, context: &EvalContext) -> Result<StaticAlmanac, AlmanacProviderError>;
}

/// A provider that returns a fixed almanac on every call. Useful for
/// testing and for callers that precompute their ephemerides.
pub struct StaticAlmanacProvider {
    almanac: StaticAlmanac,
}

impl StaticAlmanacProvider {
    pub fn new(almanac: StaticAlmanac) -> Self {
        Self { almanac }
    }
}

#[async_trait]
impl AlmanacProvider for StaticAlmanacProvider {
    async fn fetch(&self, _context: &EvalContext) -> Result<StaticAlmanac, AlmanacProviderError> {
        Ok(self.almanac.clone())
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
