use thiserror::Error;

use crate::infra::{source::FetchError, store::StoreError};

/// Failures surfaced by the prioritization engine
#[derive(Debug, Error)]
pub enum PrioritizeError
{
    /// Tracker failure during a fetch phase; nothing was cached
    #[error("an error occurred, please try again later")]
    TransientFailure(#[source] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// No live cache entry for the requested fingerprint or chart key
    #[error("no cached prioritization for {0}")]
    NotCached(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<FetchError> for PrioritizeError
{
    fn from(err: FetchError) -> Self
    {
        PrioritizeError::TransientFailure(err)
    }
}
