use serde::Serialize;

use super::ModelError;
use crate::models::ChatTurn;

/// Capability to turn an instruction plus history into one reply.
///
/// Implementations block until the reply is complete; callers inside an
/// async runtime must run them on a blocking thread.
pub trait ChatModel: Send + Sync {
    fn complete(&self, instruction: &str, history: &[ChatTurn]) -> Result<String, ModelError>;
}

/// Chat message in the role/content shape both HTTP backends accept.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub(crate) struct WireMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

/// Instruction as the leading system message, then the history in order.
pub(crate) fn wire_messages<'a>(instruction: &'a str, history: &'a [ChatTurn]) -> Vec<WireMessage<'a>> {
    std::iter::once(WireMessage {
        role: "system",
        content: instruction,
    })
    .chain(history.iter().map(|turn| WireMessage {
        role: turn.role.as_str(),
        content: turn.content.as_str(),
    }))
    .collect()
}

pub(crate) fn map_send_error(err: reqwest::Error, base_url: &str, timeout_secs: u64) -> ModelError {
    if err.is_connect() {
        ModelError::Connection(base_url.to_string())
    } else if err.is_timeout() {
        ModelError::Timeout(timeout_secs)
    } else {
        ModelError::HttpClient(err.to_string())
    }
}

pub(crate) fn non_empty_reply(content: String) -> Result<String, ModelError> {
    if content.trim().is_empty() {
        Err(ModelError::EmptyReply)
    } else {
        Ok(content)
    }
}

/// Deterministic model for tests: returns a fixed reply (or fails) and
/// records what it was asked.
#[cfg(test)]
pub struct StubChatModel {
    reply: Option<String>,
    pub calls: std::sync::Mutex<Vec<(String, Vec<ChatTurn>)>>,
}

#[cfg(test)]
impl StubChatModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn last_call(&self) -> Option<(String, Vec<ChatTurn>)> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[cfg(test)]
impl ChatModel for StubChatModel {
    fn complete(&self, instruction: &str, history: &[ChatTurn]) -> Result<String, ModelError> {
        self.calls
            .lock()
            .unwrap()
            .push((instruction.to_string(), history.to_vec()));
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(ModelError::Upstream {
                status: 503,
                body: "stub unavailable".into(),
            }),
        }
    }
}

/// One-shot HTTP server on an ephemeral port. Answers the first request
/// with `status` and `body`, and hands back the raw request text.
#[cfg(test)]
pub(crate) fn serve_once(status: u16, body: &str) -> (String, std::thread::JoinHandle<String>) {
    use std::io::{BufRead, BufReader, Read, Write};

    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let body = body.to_string();

    let handle = std::thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut head = String::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                content_length = value.trim().parse().unwrap();
            }
            head.push_str(&line);
            if line == "\r\n" || line.is_empty() {
                break;
            }
        }
        let mut request_body = vec![0u8; content_length];
        reader.read_exact(&mut request_body).unwrap();

        let mut stream = stream;
        let response = format!(
            "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();

        head + &String::from_utf8(request_body).unwrap()
    });

    (url, handle)
}

/// Address nothing listens on.
#[cfg(test)]
pub(crate) fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
