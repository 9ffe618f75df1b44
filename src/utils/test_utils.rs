//! Minimal HTTP/1.1 stub server for provider tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl StubResponse {
    pub fn json(body: serde_json::Value) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: "{}".to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn raw(body: &str) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Serves fixed responses keyed by request path and records every path hit.
pub struct StubServer {
    pub base_url: String,
    hits: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    pub async fn start(routes: Vec<(&str, StubResponse)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("stub listener should bind");
        let addr = listener.local_addr().expect("stub addr should resolve");
        let routes: Arc<HashMap<String, StubResponse>> = Arc::new(
            routes
                .into_iter()
                .map(|(path, response)| (path.to_string(), response))
                .collect(),
        );
        let hits = Arc::new(Mutex::new(Vec::new()));
        let server_hits = Arc::clone(&hits);

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let routes = Arc::clone(&routes);
                let hits = Arc::clone(&server_hits);
                tokio::spawn(async move {
                    let mut buffer = vec![0_u8; 8 * 1024];
                    let Ok(read) = stream.read(&mut buffer).await else {
                        return;
                    };
                    let request = String::from_utf8_lossy(&buffer[..read]);
                    let target = request
                        .lines()
                        .next()
                        .and_then(|line| line.split_whitespace().nth(1))
                        .unwrap_or("/")
                        .to_string();
                    let path = target.split('?').next().unwrap_or("/").to_string();
                    hits.lock().await.push(target);

                    let response = routes
                        .get(&path)
                        .cloned()
                        .unwrap_or_else(|| StubResponse::status(404));
                    if !response.delay.is_zero() {
                        tokio::time::sleep(response.delay).await;
                    }
                    let reply = format!(
                        "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        response.status,
                        response.body.len(),
                        response.body
                    );
                    let _ = stream.write_all(reply.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        Self {
            base_url: format!("http://{}", addr),
            hits,
        }
    }

    /// URL template for `path`, with a `{uid}` placeholder.
    pub fn template(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Request targets received so far, in arrival order.
    pub async fn hits(&self) -> Vec<String> {
        self.hits.lock().await.clone()
    }
}
