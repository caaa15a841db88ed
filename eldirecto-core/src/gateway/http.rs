use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::protocol::{ErrorBody, LoginRequest, LoginResponse, PatchRequest};
use super::{Gateway, GatewayError};
use crate::collection::CollectionKind;
use crate::mail::ContactMessage;
use crate::models::Record;
use crate::ordering::OrderPatch;

/// JSON-over-HTTP gateway client.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    base_url: String,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn collection_url(&self, kind: CollectionKind) -> String {
        self.url(&format!("/collection/{}", kind.name()))
    }

    async fn send<B: Serialize>(
        &self,
        request: reqwest::RequestBuilder,
        token: Option<&str>,
        body: Option<&B>,
    ) -> Result<Response, GatewayError> {
        let mut request = request;
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        check_status(response).await
    }
}

/// Maps a non-success response to a [`GatewayError`].
async fn check_status(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::UNAUTHORIZED => Err(GatewayError::Unauthorized),
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            Err(GatewayError::RateLimited { retry_after })
        }
        _ => {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.message)
                .unwrap_or(text);
            Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            })
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
    response
        .json()
        .await
        .map_err(|e| GatewayError::Malformed(e.to_string()))
}

impl Gateway for HttpGateway {
    async fn login(&self, user: &str, pass: &str) -> Result<String, GatewayError> {
        let body = LoginRequest {
            user: user.to_string(),
            pass: pass.to_string(),
        };
        let response = self
            .send(self.client.post(self.url("/login")), None, Some(&body))
            .await?;
        let login: LoginResponse = decode(response).await?;
        Ok(login.token)
    }

    async fn read<T: Record>(&self, token: &str) -> Result<Vec<T>, GatewayError> {
        let request = self.client.get(self.collection_url(T::KIND));
        let response = self.send::<()>(request, Some(token), None).await?;
        decode(response).await
    }

    async fn create<T: Record>(&self, token: &str, record: &T) -> Result<T, GatewayError> {
        let request = self.client.post(self.collection_url(T::KIND));
        let response = self.send(request, Some(token), Some(record)).await?;
        decode(response).await
    }

    async fn update<T: Record>(&self, token: &str, record: &T) -> Result<T, GatewayError> {
        let fields =
            serde_json::to_value(record).map_err(|e| GatewayError::Malformed(e.to_string()))?;
        let body = PatchRequest::Record {
            id: record.id().to_string(),
            fields,
        };
        let request = self.client.patch(self.collection_url(T::KIND));
        let response = self.send(request, Some(token), Some(&body)).await?;
        decode(response).await
    }

    async fn update_order(
        &self,
        token: &str,
        kind: CollectionKind,
        patch: &[OrderPatch],
    ) -> Result<(), GatewayError> {
        let body = PatchRequest::Order {
            items: patch.to_vec(),
        };
        let request = self.client.patch(self.collection_url(kind));
        self.send(request, Some(token), Some(&body)).await?;
        Ok(())
    }

    async fn delete(
        &self,
        token: &str,
        kind: CollectionKind,
        id: &str,
    ) -> Result<(), GatewayError> {
        let url = format!("{}/{}", self.collection_url(kind), id);
        self.send::<()>(self.client.delete(url), Some(token), None)
            .await?;
        Ok(())
    }

    async fn send_mail(&self, message: &ContactMessage) -> Result<(), GatewayError> {
        self.send(self.client.post(self.url("/mail")), None, Some(message))
            .await?;
        Ok(())
    }
}
