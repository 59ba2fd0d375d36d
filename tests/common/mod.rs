//! Shared utilities for integration tests.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use status_checker::config::{PlatformMode, StatusConfig};
use status_checker::platform::{MemoryPlatform, Platform};
use status_checker::{App, Shutdown, StatusServer};

pub const API_KEY: &str = "integration-secret";

/// Start a mock backend on an ephemeral port that always answers `200 OK`.
pub async fn start_mock_backend(response: &'static str) -> SocketAddr {
    start_programmable_backend(move || async move { (200, response.to_string()) }).await
}

/// Start a mock backend whose status and body come from `f`.
#[allow(dead_code)]
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
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
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

/// Memory-mode config whose ping probes target `ping_addr`.
pub fn memory_config(ping_addr: SocketAddr) -> StatusConfig {
    let mut config = StatusConfig::default();
    config.runner.region = "eu".into();
    config.runner.probe_timeout_secs = 2;
    config.auth.api_key = API_KEY.into();
    config.platform.mode = PlatformMode::Memory;
    config.platform.base_ping_url = format!("http://{}/base", ping_addr);
    config.platform.drive_ping_url = format!("http://{}/drive", ping_addr);
    config.platform.micro_ping_url = format!("http://{}/ping", ping_addr);
    config.scheduler.enabled = false;
    config
}

/// A running server; dropping the handle does not stop it, call `stop`.
pub struct TestServer {
    pub addr: SocketAddr,
    pub app: App,
    pub memory: MemoryPlatform,
    shutdown: Shutdown,
}

impl TestServer {
    pub async fn start(config: StatusConfig) -> Self {
        let memory = MemoryPlatform::new();
        let app = App::with_platform(config, Platform::Memory(memory.clone())).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let server = StatusServer::new(&app);
        let rx = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = server.run(listener, rx).await;
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        Self {
            addr,
            app,
            memory,
            shutdown,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    #[allow(dead_code)]
    pub fn stop(&self) {
        self.shutdown.trigger();
    }
}
