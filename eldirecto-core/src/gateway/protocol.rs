//! Request and response bodies shared by the HTTP gateway client and server.

use serde::{Deserialize, Serialize};

use crate::ordering::OrderPatch;

/// `POST /login` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub user: String,
    pub pass: String,
}

/// `POST /login` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// `PATCH /collection/<name>` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatchRequest {
    /// Bulk `{id, order}` update; answered with the whole collection.
    Order { items: Vec<OrderPatch> },
    /// Full replacement of one record; answered with the stored record.
    Record { id: String, fields: serde_json::Value },
}

/// Error body returned with any non-success status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}
