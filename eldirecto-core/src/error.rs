//! Errors surfaced by the content store.

use thiserror::Error;

use crate::collection::CollectionKind;
use crate::gateway::GatewayError;

/// Errors from content store operations.
///
/// Partial load failures are not errors; they are reported in
/// [`LoadReport`](crate::store::LoadReport) and resolved by fallback.
#[derive(Debug, Error)]
pub enum ContentError {
    /// No valid session, or the gateway answered 401.
    #[error("not authenticated; log in again")]
    NotAuthenticated,

    /// The collection has not finished loading.
    #[error("{0} has not been loaded yet")]
    NotLoaded(CollectionKind),

    #[error("no {kind} record with id '{id}'")]
    NotFound { kind: CollectionKind, id: String },

    #[error("branch '{branch}' already has hours for '{day}'")]
    DuplicateDayLabel { branch: String, day: String },

    /// A create, update or delete was rejected. Unsaved edits are kept.
    #[error("saving {kind} failed: {source}")]
    Write {
        kind: CollectionKind,
        #[source]
        source: GatewayError,
    },

    /// A bulk order update was rejected. The local order was not changed.
    #[error("updating {kind} order failed: {source}")]
    OrderSync {
        kind: CollectionKind,
        #[source]
        source: GatewayError,
    },
}

impl ContentError {
    /// Whether the operator has to go back through login.
    pub fn is_auth(&self) -> bool {
        matches!(self, ContentError::NotAuthenticated)
    }
}
