//! HTTP seam between the client components and the network.
//!
//! Components build an [`OutboundRequest`] and hand it to a [`Transport`].
//! Any failure to obtain an HTTP response at all (DNS, refused connection,
//! TLS, timeout from the network stack) surfaces as [`TransportError`];
//! every HTTP status, including 4xx/5xx, is a successful [`InboundResponse`].

mod http_transport;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use http_transport::HttpTransport;

/// Header carrying the supporter access key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header carrying a one-time token.
pub const TOKEN_HEADER: &str = "x-token";

/// Transport-level failures (no HTTP response was obtained).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// HTTP verb used by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// The single credential a request carries. The two header kinds are
/// mutually exclusive by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// `x-api-key: <key>`
    ApiKey(String),
    /// `x-token: <token>`
    Token(String),
}

impl Credential {
    /// Header name and value for this credential.
    pub fn header(&self) -> (&'static str, &str) {
        match self {
            Credential::ApiKey(key) => (API_KEY_HEADER, key.as_str()),
            Credential::Token(token) => (TOKEN_HEADER, token.as_str()),
        }
    }
}

/// A request about to be sent.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub credential: Option<Credential>,
    pub body: Option<serde_json::Value>,
}

impl OutboundRequest {
    /// `POST` with a JSON body.
    pub fn post_json<T: Serialize>(url: &str, body: &T) -> Result<Self, TransportError> {
        let body = serde_json::to_value(body)
            .map_err(|e| TransportError::InvalidRequest(format!("body encode: {e}")))?;
        Ok(Self {
            method: Method::Post,
            url: url.to_string(),
            query: Vec::new(),
            credential: None,
            body: Some(body),
        })
    }

    /// `GET` with query parameters.
    pub fn get(url: &str, query: Vec<(String, String)>) -> Self {
        Self {
            method: Method::Get,
            url: url.to_string(),
            query,
            credential: None,
            body: None,
        }
    }

    /// Attach the request credential.
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Look up a query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A received HTTP response, body already read.
#[derive(Debug, Clone)]
pub struct InboundResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl InboundResponse {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the response declares a JSON body.
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"))
    }

    /// Decode the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Sends requests. Implementations must not retry and must not add timeouts
/// beyond what the underlying network stack does.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<InboundResponse, TransportError>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording fake transport for component tests.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Scripted reply for the fake transport.
    #[derive(Debug, Clone)]
    pub enum Reply {
        Status(u16, String),
        Json(u16, serde_json::Value),
        NetworkError,
    }

    /// Records every request and answers from a queue; an empty queue
    /// answers `200 {}`.
    #[derive(Debug, Default)]
    pub struct FakeTransport {
        replies: Mutex<VecDeque<Reply>>,
        pub sent: Mutex<Vec<OutboundRequest>>,
    }

    impl FakeTransport {
        pub fn replying(replies: impl IntoIterator<Item = Reply>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().collect()),
                sent: Mutex::new(Vec::new()),
            }
        }

        pub fn sent(&self) -> Vec<OutboundRequest> {
            self.sent.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn send(&self, request: OutboundRequest) -> Result<InboundResponse, TransportError> {
            self.sent.lock().unwrap().push(request);
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Reply::Json(200, serde_json::json!({})));
            match reply {
                Reply::Status(status, body) => Ok(InboundResponse {
                    status,
                    content_type: Some("text/plain".into()),
                    body,
                }),
                Reply::Json(status, value) => Ok(InboundResponse {
                    status,
                    content_type: Some("application/json".into()),
                    body: value.to_string(),
                }),
                Reply::NetworkError => Err(TransportError::Network("connection refused".into())),
            }
        }
    }
}
