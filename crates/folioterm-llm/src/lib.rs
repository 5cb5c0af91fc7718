use folioterm_core::{AssistantConfig, ChatError, RECENT_HISTORY_WINDOW};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde_json::{Value, json};
use std::time::Duration;

/// Text completion against the conversational assistant service.
///
/// `complete` performs no retries — a repeated submission by the user is a
/// fresh call. Implementations classify failures into [`ChatError`] kinds;
/// callers match on the kind, never on message text.
pub trait ChatService: Send + Sync {
    fn complete(&self, prompt: &str, recent_history: &[String]) -> Result<String, ChatError>;
}

/// The trailing window of history sent along as disambiguating context:
/// at most the last three entries, oldest first.
pub fn context_window(history: &[String]) -> &[String] {
    let start = history.len().saturating_sub(RECENT_HISTORY_WINDOW);
    &history[start..]
}

#[derive(Debug, Clone)]
pub struct HttpChatService {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout_seconds: u64,
    client: Client,
}

impl HttpChatService {
    pub fn new(cfg: &AssistantConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_seconds))
            .build()?;
        let api_key = cfg
            .api_key
            .clone()
            .or_else(|| std::env::var(&cfg.api_key_env).ok())
            .filter(|key| !key.trim().is_empty());
        Ok(Self {
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key,
            timeout_seconds: cfg.timeout_seconds,
            client,
        })
    }

    fn build_payload(&self, prompt: &str, recent_history: &[String]) -> Value {
        json!({
            "model": self.model,
            "prompt": prompt,
            "recent_history": context_window(recent_history),
        })
    }
}

impl ChatService for HttpChatService {
    fn complete(&self, prompt: &str, recent_history: &[String]) -> Result<String, ChatError> {
        let payload = self.build_payload(prompt, recent_history);
        let mut request = self.client.post(&self.endpoint).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .map_err(|e| classify_transport_error(&e, self.timeout_seconds))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| classify_transport_error(&e, self.timeout_seconds))?;

        if !status.is_success() {
            return Err(classify_status_error(status, &body));
        }

        let value: Value = serde_json::from_str(&body).map_err(|e| ChatError::Other {
            detail: format!("malformed assistant response: {e}"),
        })?;
        value
            .get("text")
            .and_then(|t| t.as_str())
            .map(ToString::to_string)
            .ok_or_else(|| ChatError::Other {
                detail: "assistant response missing text field".to_string(),
            })
    }
}

fn classify_transport_error(err: &reqwest::Error, timeout_seconds: u64) -> ChatError {
    if err.is_connect() {
        ChatError::Unreachable {
            detail: "connection refused".to_string(),
        }
    } else if err.is_timeout() {
        ChatError::TimedOut {
            seconds: timeout_seconds,
        }
    } else {
        ChatError::Other {
            detail: err.to_string(),
        }
    }
}

/// First match wins: credentials, throttling, content policy, then other.
/// Connection-level failures never reach here — they are classified from
/// the transport error itself.
fn classify_status_error(status: StatusCode, body: &str) -> ChatError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ChatError::Unauthorized {
            status: status.as_u16(),
        },
        StatusCode::TOO_MANY_REQUESTS => ChatError::RateLimited,
        _ => {
            if error_code(body).is_some_and(|code| code == "content_filter") {
                ChatError::ContentFiltered
            } else {
                ChatError::Other {
                    detail: error_detail(status, body),
                }
            }
        }
    }
}

fn error_code(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("code")?
        .as_str()
        .map(ToString::to_string)
}

/// Pull the service's error message out of a JSON body, falling back to a
/// truncated raw body for non-JSON responses.
fn error_detail(status: StatusCode, body: &str) -> String {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message").or(Some(e)))
                .and_then(|m| m.as_str().map(ToString::to_string))
        })
        .unwrap_or_else(|| body.chars().take(200).collect());
    format!("HTTP {}: {}", status.as_u16(), message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    fn service_for(endpoint: String) -> HttpChatService {
        let cfg = AssistantConfig {
            endpoint,
            api_key: Some("test-key".to_string()),
            timeout_seconds: 5,
            ..AssistantConfig::default()
        };
        HttpChatService::new(&cfg).expect("client")
    }

    /// One-shot HTTP fixture: answers with the canned status/body and hands
    /// back the raw request for assertions.
    fn spawn_one_shot(status_line: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut buf = vec![0_u8; 16384];
            let n = stream.read(&mut buf).expect("read request");
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
            request
        });
        (format!("http://{addr}/chat"), server)
    }

    #[test]
    fn success_returns_the_response_text() {
        let (endpoint, server) = spawn_one_shot("HTTP/1.1 200 OK", r#"{"text":"hi"}"#);
        let service = service_for(endpoint);
        let reply = service.complete("hello", &[]).expect("reply");
        assert_eq!(reply, "hi");
        let request = server.join().expect("request");
        assert!(request.contains("POST /chat"));
        assert!(request.contains("Bearer test-key"));
    }

    #[test]
    fn request_carries_exactly_the_last_three_history_entries_oldest_first() {
        let (endpoint, server) = spawn_one_shot("HTTP/1.1 200 OK", r#"{"text":"ok"}"#);
        let service = service_for(endpoint);
        let history = vec![
            "a".to_string(),
            "b".to_string(),
            "c".to_string(),
            "d".to_string(),
        ];
        service.complete("next", &history).expect("reply");

        let request = server.join().expect("request");
        let json_start = request.find('{').expect("json body");
        let payload: Value = serde_json::from_str(&request[json_start..]).expect("payload");
        assert_eq!(payload["recent_history"], json!(["b", "c", "d"]));
        assert_eq!(payload["prompt"], "next");
    }

    #[test]
    fn unauthorized_status_maps_to_the_credentials_kind() {
        let (endpoint, server) = spawn_one_shot(
            "HTTP/1.1 401 Unauthorized",
            r#"{"error":{"message":"bad key"}}"#,
        );
        let service = service_for(endpoint);
        let err = service.complete("hello", &[]).expect_err("must fail");
        assert_eq!(err, ChatError::Unauthorized { status: 401 });
        // The credential itself never appears in the error.
        assert!(!err.to_string().contains("test-key"));
        let _ = server.join();
    }

    #[test]
    fn too_many_requests_maps_to_rate_limited() {
        let (endpoint, server) = spawn_one_shot("HTTP/1.1 429 Too Many Requests", "{}");
        let service = service_for(endpoint);
        let err = service.complete("hello", &[]).expect_err("must fail");
        assert_eq!(err, ChatError::RateLimited);
        let _ = server.join();
    }

    #[test]
    fn content_filter_code_maps_to_content_filtered() {
        let (endpoint, server) = spawn_one_shot(
            "HTTP/1.1 400 Bad Request",
            r#"{"error":{"code":"content_filter","message":"blocked"}}"#,
        );
        let service = service_for(endpoint);
        let err = service.complete("hello", &[]).expect_err("must fail");
        assert_eq!(err, ChatError::ContentFiltered);
        let _ = server.join();
    }

    #[test]
    fn other_statuses_keep_the_service_detail() {
        let (endpoint, server) = spawn_one_shot(
            "HTTP/1.1 500 Internal Server Error",
            r#"{"error":{"message":"model exploded"}}"#,
        );
        let service = service_for(endpoint);
        let err = service.complete("hello", &[]).expect_err("must fail");
        match err {
            ChatError::Other { detail } => {
                assert!(detail.contains("500"));
                assert!(detail.contains("model exploded"));
            }
            other => panic!("expected Other, got {other:?}"),
        }
        let _ = server.join();
    }

    #[test]
    fn refused_connection_maps_to_unreachable() {
        // Bind then immediately drop so the port is very likely closed.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("addr").port()
        };
        let service = service_for(format!("http://127.0.0.1:{port}/chat"));
        let err = service.complete("hello", &[]).expect_err("must fail");
        assert!(matches!(err, ChatError::Unreachable { .. }), "got {err:?}");
    }

    #[test]
    fn context_window_is_the_trailing_three() {
        let history: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        assert_eq!(context_window(&history), &history[1..]);
        assert_eq!(context_window(&history[..2]), &history[..2]);
        assert!(context_window(&[]).is_empty());
    }
}
