//! Request, message and response types.

use std::collections::BTreeMap;

use bytes::Bytes;

/// Content type assumed when none is set.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// An outbound or inbound request addressed to `service` at `endpoint`.
pub trait Request: Send + Sync {
    /// Name of the service being addressed.
    fn service(&self) -> &str;

    /// Endpoint within the service, e.g. `Greeter.Hello`.
    fn endpoint(&self) -> &str;

    /// Content type of the body.
    fn content_type(&self) -> &str {
        DEFAULT_CONTENT_TYPE
    }

    /// Encoded request body.
    fn body(&self) -> &Bytes;
}

/// A publish/subscribe message.
pub trait Message: Send + Sync {
    /// Topic the message is published on.
    fn topic(&self) -> &str;

    /// Content type of the payload.
    fn content_type(&self) -> &str {
        DEFAULT_CONTENT_TYPE
    }

    /// Encoded payload.
    fn payload(&self) -> &Bytes;
}

/// Plain request value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcRequest {
    service: String,
    endpoint: String,
    content_type: String,
    body: Bytes,
}

impl RpcRequest {
    /// Create a request with an empty body.
    pub fn new(service: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            endpoint: endpoint.into(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            body: Bytes::new(),
        }
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}

impl Request for RpcRequest {
    fn service(&self) -> &str {
        &self.service
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn body(&self) -> &Bytes {
        &self.body
    }
}

/// Plain message value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcMessage {
    topic: String,
    content_type: String,
    payload: Bytes,
}

impl RpcMessage {
    /// Create a message on `topic`.
    pub fn new(topic: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            payload: payload.into(),
        }
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}

impl Message for RpcMessage {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn payload(&self) -> &Bytes {
        &self.payload
    }
}

/// Response slot written by the callee.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    /// Encoded response body.
    pub body: Bytes,
    /// Response headers.
    pub metadata: BTreeMap<String, String>,
}

impl Response {
    /// Create an empty response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the body.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    /// Set a header.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let req = RpcRequest::new("greeter", "Greeter.Hello")
            .with_body("ping")
            .with_content_type("application/json");

        assert_eq!(req.service(), "greeter");
        assert_eq!(req.endpoint(), "Greeter.Hello");
        assert_eq!(req.content_type(), "application/json");
        assert_eq!(req.body().as_ref(), b"ping");
    }

    #[test]
    fn test_message_defaults() {
        let msg = RpcMessage::new("events", "payload");
        assert_eq!(msg.topic(), "events");
        assert_eq!(msg.content_type(), DEFAULT_CONTENT_TYPE);
        assert_eq!(msg.payload().as_ref(), b"payload");
    }

    #[test]
    fn test_response_slot() {
        let mut rsp = Response::new();
        rsp.set_body("pong");
        rsp.set_metadata("x-served-by", "node-1");

        assert_eq!(rsp.body.as_ref(), b"pong");
        assert_eq!(rsp.metadata.get("x-served-by").map(String::as_str), Some("node-1"));
    }
}
