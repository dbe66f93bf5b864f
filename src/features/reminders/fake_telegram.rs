//! Local stand-in for the Bot API `sendMessage` endpoint, for tests

use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

type Responder = dyn Fn(usize, &Value) -> (u16, Value) + Send + Sync;

/// Received request bodies with whether each was accepted
type Log = Arc<Mutex<Vec<(Value, bool)>>>;

pub struct FakeTelegram {
    pub base_url: String,
    log: Log,
}

impl FakeTelegram {
    /// `responder` gets the request index and JSON body, returns status and reply
    pub async fn start<F>(responder: F) -> Self
    where
        F: Fn(usize, &Value) -> (u16, Value) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let responder: Arc<Responder> = Arc::new(responder);

        let seen = log.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let seen = seen.clone();
                let responder = responder.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, seen, responder).await;
                });
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            log,
        }
    }

    /// Rejects text whose `<code>` tags do not balance, like the real HTML parser
    pub async fn strict_html() -> Self {
        Self::start(|_, body| {
            let text = body["text"].as_str().unwrap_or_default();
            if text.matches("<code>").count() == text.matches("</code>").count() {
                accepted()
            } else {
                refused(400, "Bad Request: can't parse entities")
            }
        })
        .await
    }

    pub fn requests(&self) -> usize {
        self.log.lock().unwrap().len()
    }

    pub fn delivered(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, ok)| *ok)
            .map(|(body, _)| body["text"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

pub fn accepted() -> (u16, Value) {
    (200, json!({"ok": true, "result": {"message_id": 1}}))
}

pub fn refused(code: u16, description: &str) -> (u16, Value) {
    (
        code,
        json!({"ok": false, "error_code": code, "description": description}),
    )
}

async fn serve(mut stream: TcpStream, log: Log, responder: Arc<Responder>) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let body_start = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..body_start]).to_ascii_lowercase();
    let length = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < body_start + length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let end = (body_start + length).min(buf.len());
    let body: Value = serde_json::from_slice(&buf[body_start..end]).unwrap_or(Value::Null);
    let index = log.lock().unwrap().len();
    let (status, reply) = responder(index, &body);
    log.lock().unwrap().push((body, status == 200));

    let payload = reply.to_string();
    let reason = if status == 200 { "OK" } else { "Error" };
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
        payload.len()
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}
