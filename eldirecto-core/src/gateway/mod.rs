//! The remote content gateway.
//!
//! The content store talks to the backend only through [`Gateway`]. The
//! production implementation is [`HttpGateway`]; tests use an in-memory fake.

mod error;
#[cfg(test)]
pub(crate) mod fake;
mod http;
pub mod protocol;

pub use error::GatewayError;
pub use http::HttpGateway;

use crate::collection::CollectionKind;
use crate::mail::ContactMessage;
use crate::models::Record;
use crate::ordering::OrderPatch;

/// Operations the backend exposes to the admin layer.
///
/// Every call except `login` and `send_mail` carries the session's bearer
/// token.
#[allow(async_fn_in_trait)]
pub trait Gateway {
    /// Exchanges credentials for a bearer token.
    async fn login(&self, user: &str, pass: &str) -> Result<String, GatewayError>;

    /// Reads a whole collection.
    async fn read<T: Record>(&self, token: &str) -> Result<Vec<T>, GatewayError>;

    /// Creates a record. The returned record carries the server's id.
    async fn create<T: Record>(&self, token: &str, record: &T) -> Result<T, GatewayError>;

    /// Replaces an existing record by id.
    async fn update<T: Record>(&self, token: &str, record: &T) -> Result<T, GatewayError>;

    /// Applies a bulk `{id, order}` update to an ordered collection.
    async fn update_order(
        &self,
        token: &str,
        kind: CollectionKind,
        patch: &[OrderPatch],
    ) -> Result<(), GatewayError>;

    async fn delete(&self, token: &str, kind: CollectionKind, id: &str)
        -> Result<(), GatewayError>;

    /// Hands a public contact message to the mail relay.
    async fn send_mail(&self, message: &ContactMessage) -> Result<(), GatewayError>;
}
