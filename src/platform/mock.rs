//! Local stand-in for the platform REST API.

use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::PlatformConfig;
use crate::platform::PlatformClient;

/// Project key whose id (`proj`) prefixes every route.
pub(crate) const PROJECT_KEY: &str = "proj_secret";

/// Serve `router` on an ephemeral port and return a client aimed at it.
pub(crate) async fn serve(router: Router) -> PlatformClient {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let host = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    let config = PlatformConfig {
        project_key: PROJECT_KEY.into(),
        base_host: host.clone(),
        drive_host: host,
        ..PlatformConfig::default()
    };
    PlatformClient::new(&config, Duration::from_secs(5)).unwrap()
}
