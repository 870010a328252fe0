use std::sync::OnceLock;

use clusteer_client::ClusteerConfig;
use tracing_subscriber::EnvFilter;
use wiremock::MockServer;

static INIT: OnceLock<()> = OnceLock::new();

pub fn init_test_tracing() {
    INIT.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
            .with_test_writer()
            .try_init();
    });
}

pub fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

pub fn config_for(server: &MockServer) -> ClusteerConfig {
    ClusteerConfig::with_endpoint(format!("{}/crawl", server.uri()))
}
