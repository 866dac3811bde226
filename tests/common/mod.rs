//! Common test utilities and helpers
//!
//! - Session tokens signed with the test secret
//! - A relay served on an ephemeral port over the in-process broker
//! - Polling and receive helpers with timeouts

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout, Duration};

use teamhub::shared::{BackoffConfig, RelayConfig};

pub const SECRET: &str = "integration-test-secret";

/// Generous upper bound for anything a test waits on
pub const WAIT: Duration = Duration::from_secs(5);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("teamhub=debug"))
        .with_test_writer()
        .try_init();
}

pub fn test_config() -> RelayConfig {
    RelayConfig::builder()
        .host("127.0.0.1")
        .port(0)
        .jwt_secret(SECRET)
        .ping_interval_secs(25)
        .reconnect(BackoffConfig::immediate())
        .build()
        .expect("valid test config")
}

/// Poll `condition` until it holds or [`WAIT`] elapses
pub async fn wait_until<F>(mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + WAIT;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// Receive one item or fail the test after [`WAIT`]
pub async fn recv<T>(rx: &mut mpsc::Receiver<T>) -> T {
    timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for a frame")
        .expect("channel closed")
}

/// Assert that nothing arrives within a short window
pub async fn assert_silent<T: std::fmt::Debug>(rx: &mut mpsc::Receiver<T>) {
    if let Ok(Some(item)) = timeout(Duration::from_millis(150), rx.recv()).await {
        panic!("unexpected delivery: {:?}", item);
    }
}

/// Await a future with the standard timeout
pub async fn within<F: Future>(future: F) -> F::Output {
    timeout(WAIT, future).await.expect("operation timed out")
}

#[cfg(feature = "ssr")]
pub use server::*;

#[cfg(feature = "ssr")]
mod server {
    use super::*;
    use teamhub::backend::auth::{create_token, MembershipVerifier, TrustClaimedTeam};
    use teamhub::backend::realtime::InMemoryBroker;
    use teamhub::backend::server::{create_app_with, App};

    pub fn token(user_id: &str, team_id: Option<&str>) -> String {
        create_token(SECRET, user_id, &format!("{}@example.com", user_id), team_id)
            .expect("token")
    }

    /// A relay listening on an ephemeral port
    pub struct TestRelay {
        pub addr: SocketAddr,
        pub app: App,
        pub broker: Arc<InMemoryBroker>,
        server: tokio::task::JoinHandle<()>,
    }

    impl TestRelay {
        pub async fn start() -> Self {
            Self::start_with(Arc::new(TrustClaimedTeam)).await
        }

        pub async fn start_with(membership: Arc<dyn MembershipVerifier>) -> Self {
            Self::start_with_config(test_config(), membership).await
        }

        pub async fn start_with_config(
            config: RelayConfig,
            membership: Arc<dyn MembershipVerifier>,
        ) -> Self {
            init_tracing();
            let broker = Arc::new(InMemoryBroker::new());
            let app = create_app_with(&config, broker.clone(), membership)
                .await
                .expect("app starts");

            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("bind");
            let addr = listener.local_addr().expect("local addr");
            let router = app.router.clone();
            let server = tokio::spawn(async move {
                let _ = axum::serve(listener, router).await;
            });

            Self {
                addr,
                app,
                broker,
                server,
            }
        }

        pub fn ws_url(&self) -> String {
            format!("ws://{}/ws", self.addr)
        }

        /// Stop accepting connections, then shut the app down, which closes
        /// every upgraded connection and stops the relay
        pub async fn stop(self) {
            self.server.abort();
            self.app.shutdown().await;
        }
    }
}
