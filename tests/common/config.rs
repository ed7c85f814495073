//! Test configuration helpers pointing a collector at a mock API server

use dock_collector::config::TENANT_PLACEHOLDER;
use dock_collector::{Config, Credentials};
use std::path::Path;
use std::time::Duration;
use wiremock::MockServer;

/// Path of the docks endpoint below the tenant segment
pub const DOCKS_PATH: &str = "/api/logistics/pvt/configuration/docks";

/// Config targeting `server`, writing output and audit files under `dir`
///
/// Tenants are addressed as the first path segment, since a mock server
/// cannot serve per-tenant subdomains.
pub fn mock_config(server: &MockServer, dir: &Path) -> Config {
    let mut config = Config::default();
    config.api.url_template = format!("{}/{}{}", server.uri(), TENANT_PLACEHOLDER, DOCKS_PATH);
    config.api.request_timeout = Duration::from_secs(5);
    config.collection.inter_tenant_delay = Duration::from_millis(10);
    config.output.output_dir = dir.join("output");
    config.audit.log_file = dir.join("logs").join("api_logs.csv");
    config
}

/// Credentials the mocks expect
pub fn test_credentials() -> Credentials {
    Credentials::new("int-key", "int-token")
}
