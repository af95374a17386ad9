//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use resilient_auth::config::ServiceConfig;
use resilient_auth::http::HttpServer;
use resilient_auth::lifecycle::Shutdown;
use resilient_auth::resilience::CircuitBreaker;
use resilient_auth::users::{RemoteUserFetch, UpstreamError, User};

/// Start a programmable mock user API on an ephemeral port.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;

                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// JSON body the user API returns for `username`.
pub fn user_json(username: &str, first: &str, last: &str, role: &str) -> String {
    format!(
        r#"{{"username":"{}","firstname":"{}","lastname":"{}","role":"{}"}}"#,
        username, first, last, role
    )
}

/// Config tuned for fast tests against `upstream`.
pub fn test_config(upstream: SocketAddr) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstream.base_url = format!("http://{}", upstream);
    config.breaker.max_failures = 3;
    config.breaker.reset_timeout_ms = 300;
    config.breaker.call_timeout_ms = 200;
    config.timeouts.request_secs = 5;
    config.admin.enabled = true;
    config.admin.api_key = "test-key".to_string();
    config
}

/// Start the service and return its address, breaker and shutdown handle.
pub async fn start_service(config: ServiceConfig) -> (SocketAddr, Arc<CircuitBreaker>, Shutdown) {
    let server = HttpServer::new(config).unwrap();
    let breaker = server.breaker();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, breaker, shutdown)
}

/// How a [`ScriptedFetch`] answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Succeed,
    Fail,
    Hang,
    Slow(Duration),
}

/// In-process user source with switchable behavior and a call counter.
pub struct ScriptedFetch {
    calls: AtomicUsize,
    behavior: Mutex<Behavior>,
}

impl ScriptedFetch {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            behavior: Mutex::new(behavior),
        })
    }

    pub fn set(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteUserFetch for ScriptedFetch {
    async fn fetch(&self, username: &str) -> Result<User, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let behavior = *self.behavior.lock().unwrap();

        match behavior {
            Behavior::Succeed => Ok(User::new(username, "Remote", "User", "USER")),
            Behavior::Fail => Err(UpstreamError::Server { status: 503 }),
            Behavior::Hang => std::future::pending().await,
            Behavior::Slow(delay) => {
                tokio::time::sleep(delay).await;
                Ok(User::new(username, "Remote", "User", "USER"))
            }
        }
    }
}
