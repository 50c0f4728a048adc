use std::fmt;
use std::time::Duration;

use log::{debug, error, info, warn};
use serde::Serialize;
use serde_json::Value;

use crate::config::GatewayConfig;
use crate::connectivity::NetworkLink;
use crate::identity::SessionKey;

pub const AGENT_ID_HEADER: &str = "x-openclaw-agent-id";
pub const SESSION_KEY_HEADER: &str = "x-openclaw-session-key";

/// Role of a message in the chat request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage<'a> {
    role: ChatRole,
    content: &'a str,
}

/// Request body for `POST /v1/chat/completions`
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    model: &'a str,
    user: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

impl<'a> ChatRequest<'a> {
    pub fn new(model: &'a str, user: &'a str, prompt: &'a str) -> Self {
        ChatRequest {
            model,
            user,
            messages: vec![ChatMessage {
                role: ChatRole::User,
                content: prompt,
            }],
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Raw answer from the gateway: status line plus the full body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse {
    pub status: u16,
    pub body: String,
}

/// The request never produced an HTTP status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    pub code: i32,
    pub detail: String,
}

impl TransportFailure {
    pub fn new(code: i32, detail: impl Into<String>) -> Self {
        TransportFailure {
            code,
            detail: detail.into(),
        }
    }
}

/// One blocking HTTP(S) POST, body fully buffered in both directions.
pub trait HttpTransport {
    fn post(
        &mut self,
        url: &str,
        headers: &[(&str, &str)],
        body: &[u8],
        timeout: Duration,
    ) -> Result<GatewayResponse, TransportFailure>;
}

/// Outcome of one chat exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatResult {
    Reply(String),
    /// The request body could not be serialized.
    EncodeError(String),
    TransportError { code: i32, detail: String },
    HttpError { status: u16, body: String },
    ParseError(String),
    /// Well-formed `{"error":{"message":...}}` from the gateway, whatever the status.
    GatewayError(String),
    /// Well-formed JSON without `choices[0].message.content`.
    SchemaError,
}

impl ChatResult {
    pub fn is_reply(&self) -> bool {
        matches!(self, ChatResult::Reply(_))
    }
}

impl fmt::Display for ChatResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatResult::Reply(text) => f.write_str(text),
            ChatResult::EncodeError(msg) => write!(f, "[request-error] {}", msg),
            ChatResult::TransportError { code, detail } if detail.is_empty() => {
                write!(f, "[http-error] POST failed: {}", code)
            }
            ChatResult::TransportError { code, detail } => {
                write!(f, "[http-error] POST failed: {} ({})", code, detail)
            }
            ChatResult::HttpError { status, body } => write!(f, "[http-{}] {}", status, body),
            ChatResult::ParseError(msg) => write!(f, "[json-parse-error] {}", msg),
            ChatResult::GatewayError(msg) => write!(f, "[openclaw-error] {}", msg),
            ChatResult::SchemaError => {
                f.write_str("[openclaw-error] missing choices[0].message.content")
            }
        }
    }
}

/// Turn a raw gateway answer into a [`ChatResult`].
pub fn classify(response: &GatewayResponse) -> ChatResult {
    if response.status == 0 {
        return ChatResult::TransportError {
            code: 0,
            detail: "no status received".to_string(),
        };
    }
    if response.status >= 400 {
        return ChatResult::HttpError {
            status: response.status,
            body: response.body.clone(),
        };
    }
    extract_assistant_text(&response.body)
}

fn extract_assistant_text(body: &str) -> ChatResult {
    let doc: Value = match serde_json::from_str(body) {
        Ok(doc) => doc,
        Err(e) => return ChatResult::ParseError(e.to_string()),
    };

    // The gateway may report errors inside a 2xx answer.
    if let Some(message) = doc["error"]["message"].as_str() {
        return ChatResult::GatewayError(message.to_string());
    }

    match doc["choices"][0]["message"]["content"].as_str() {
        Some(text) => ChatResult::Reply(text.to_string()),
        None => ChatResult::SchemaError,
    }
}

/// Client for the OpenClaw chat-completion gateway
pub struct ChatClient<T> {
    transport: T,
    gateway: GatewayConfig,
    url: String,
    session_key: SessionKey,
}

impl<T: HttpTransport> ChatClient<T> {
    pub fn new(transport: T, gateway: GatewayConfig, session_key: SessionKey) -> Self {
        let url = gateway.url();
        ChatClient {
            transport,
            gateway,
            url,
            session_key,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn session_key(&self) -> &SessionKey {
        &self.session_key
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            ("Content-Type", "application/json".to_string()),
            (AGENT_ID_HEADER, self.gateway.agent_id.clone()),
            (SESSION_KEY_HEADER, self.session_key.to_string()),
        ];
        if self.gateway.has_token() {
            headers.push(("Authorization", format!("Bearer {}", self.gateway.token)));
        }
        headers
    }

    /// Send `prompt` to the gateway and wait for the whole answer.
    ///
    /// Blocks until the network is up, then performs exactly one POST. Failures are
    /// returned as [`ChatResult`] variants and never retried here.
    pub fn ask<N: NetworkLink>(&mut self, network: &mut N, prompt: &str) -> ChatResult {
        network.ensure_connected();

        let request = ChatRequest::new(&self.gateway.model, &self.gateway.user, prompt);
        let body = match request.to_json() {
            Ok(body) => body,
            Err(e) => {
                error!("Failed to encode chat request: {}", e);
                return ChatResult::EncodeError(e.to_string());
            }
        };

        let headers = self.headers();
        let header_refs: Vec<(&str, &str)> =
            headers.iter().map(|(k, v)| (*k, v.as_str())).collect();

        debug!("POST {} ({} bytes)", self.url, body.len());
        let result = match self.transport.post(
            &self.url,
            &header_refs,
            body.as_bytes(),
            self.gateway.timeout(),
        ) {
            Ok(response) => {
                info!("HTTP response status: {}", response.status);
                classify(&response)
            }
            Err(failure) => {
                error!("POST to {} failed: {} ({})", self.url, failure.code, failure.detail);
                ChatResult::TransportError {
                    code: failure.code,
                    detail: failure.detail,
                }
            }
        };

        if !result.is_reply() {
            warn!("Chat exchange failed: {}", result);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_gateway;
    use crate::identity::DeviceIdentity;

    struct FakeNetwork {
        calls: u32,
    }

    impl NetworkLink for FakeNetwork {
        fn ensure_connected(&mut self) {
            self.calls += 1;
        }
    }

    #[derive(Default)]
    struct SentRequest {
        url: String,
        headers: Vec<(String, String)>,
        body: String,
        timeout: Duration,
    }

    struct FakeTransport {
        reply: Result<GatewayResponse, TransportFailure>,
        sent: Vec<SentRequest>,
    }

    impl FakeTransport {
        fn answering(status: u16, body: &str) -> Self {
            FakeTransport {
                reply: Ok(GatewayResponse {
                    status,
                    body: body.to_string(),
                }),
                sent: Vec::new(),
            }
        }
    }

    impl HttpTransport for FakeTransport {
        fn post(
            &mut self,
            url: &str,
            headers: &[(&str, &str)],
            body: &[u8],
            timeout: Duration,
        ) -> Result<GatewayResponse, TransportFailure> {
            self.sent.push(SentRequest {
                url: url.to_string(),
                headers: headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                body: String::from_utf8(body.to_vec()).unwrap(),
                timeout,
            });
            self.reply.clone()
        }
    }

    fn client(transport: FakeTransport, gateway: GatewayConfig) -> ChatClient<FakeTransport> {
        let identity = DeviceIdentity::from_efuse_mac(0x0000_0001_ABCD_1234);
        let key = SessionKey::compose(&gateway.agent_id, &identity);
        ChatClient::new(transport, gateway, key)
    }

    fn response(status: u16, body: &str) -> GatewayResponse {
        GatewayResponse {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_request_escapes_quotes_and_reply_is_extracted() {
        let mut net = FakeNetwork { calls: 0 };
        let transport = FakeTransport::answering(200, r#"{"choices":[{"message":{"content":"hi"}}]}"#);
        let mut client = client(transport, test_gateway());

        let result = client.ask(&mut net, "hello \"world\"");

        assert_eq!(result, ChatResult::Reply("hi".to_string()));
        assert_eq!(net.calls, 1);
        let sent = &client.transport.sent[0];
        assert_eq!(
            sent.body,
            r#"{"model":"openclaw","user":"esp32-speaker","messages":[{"role":"user","content":"hello \"world\""}]}"#
        );
        let parsed: Value = serde_json::from_str(&sent.body).unwrap();
        assert_eq!(parsed["messages"][0]["content"], "hello \"world\"");
    }

    #[test]
    fn test_control_characters_and_unicode_survive_encoding() {
        let prompt = "tab\there\u{1}\\ ünïcödé 🦀";
        let body = ChatRequest::new("m", "u", prompt).to_json().unwrap();
        assert!(body.contains("\\t"));
        assert!(body.contains("\\u0001"));
        let parsed: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed["messages"][0]["content"], prompt);
        assert_eq!(parsed["messages"][0]["role"], "user");
    }

    #[test]
    fn test_headers_url_and_timeout() {
        let mut net = FakeNetwork { calls: 0 };
        let transport = FakeTransport::answering(200, r#"{"choices":[{"message":{"content":"ok"}}]}"#);
        let mut client = client(transport, test_gateway());
        client.ask(&mut net, "ping");

        let sent = &client.transport.sent[0];
        assert_eq!(sent.url, "http://192.168.1.50:18789/v1/chat/completions");
        assert_eq!(sent.timeout, Duration::from_millis(45000));
        let header = |name: &str| {
            sent.headers
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        };
        assert_eq!(header("Content-Type").as_deref(), Some("application/json"));
        assert_eq!(header(AGENT_ID_HEADER).as_deref(), Some("main"));
        assert_eq!(
            header(SESSION_KEY_HEADER).as_deref(),
            Some("agent:main:openai:esp32-0001ABCD1234")
        );
        assert_eq!(header("Authorization").as_deref(), Some("Bearer secret"));
    }

    #[test]
    fn test_no_authorization_without_token() {
        let mut gateway = test_gateway();
        gateway.token.clear();
        let mut net = FakeNetwork { calls: 0 };
        let transport = FakeTransport::answering(200, r#"{"choices":[{"message":{"content":"ok"}}]}"#);
        let mut client = client(transport, gateway);
        client.ask(&mut net, "ping");

        let sent = &client.transport.sent[0];
        assert!(sent.headers.iter().all(|(k, _)| k != "Authorization"));
    }

    #[test]
    fn test_gateway_error_wins_over_success_status() {
        let result = classify(&response(200, r#"{"error":{"message":"rate limited"}}"#));
        assert_eq!(result, ChatResult::GatewayError("rate limited".to_string()));
    }

    #[test]
    fn test_http_error_keeps_status_and_body() {
        let result = classify(&response(500, "internal error"));
        assert_eq!(
            result,
            ChatResult::HttpError {
                status: 500,
                body: "internal error".to_string()
            }
        );
        assert_eq!(result.to_string(), "[http-500] internal error");
    }

    #[test]
    fn test_non_json_body_is_a_parse_error() {
        let result = classify(&response(200, "not json"));
        match result {
            ChatResult::ParseError(msg) => assert!(msg.contains("expected")),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_missing_content_is_a_schema_error() {
        assert_eq!(classify(&response(200, r#"{"choices":[{}]}"#)), ChatResult::SchemaError);
        assert_eq!(classify(&response(200, r#"{"choices":[]}"#)), ChatResult::SchemaError);
        assert_eq!(
            classify(&response(200, r#"{"choices":[{"message":{"content":7}}]}"#)),
            ChatResult::SchemaError
        );
    }

    #[test]
    fn test_redirect_range_is_still_parsed() {
        let result = classify(&response(302, r#"{"choices":[{"message":{"content":"moved"}}]}"#));
        assert_eq!(result, ChatResult::Reply("moved".to_string()));
    }

    #[test]
    fn test_transport_failure_is_not_retried() {
        let mut net = FakeNetwork { calls: 0 };
        let transport = FakeTransport {
            reply: Err(TransportFailure::new(-1, "connect")),
            sent: Vec::new(),
        };
        let mut client = client(transport, test_gateway());
        let result = client.ask(&mut net, "ping");

        assert_eq!(
            result,
            ChatResult::TransportError {
                code: -1,
                detail: "connect".to_string()
            }
        );
        assert_eq!(client.transport.sent.len(), 1);
        assert_eq!(result.to_string(), "[http-error] POST failed: -1 (connect)");
    }

    #[test]
    fn test_zero_status_is_a_transport_error() {
        assert!(matches!(
            classify(&response(0, "")),
            ChatResult::TransportError { code: 0, .. }
        ));
    }
}
