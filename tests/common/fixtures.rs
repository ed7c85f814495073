//! Test fixtures: API payloads and mock mounting helpers

use super::config::DOCKS_PATH;
use dock_collector::client::{APP_KEY_HEADER, APP_TOKEN_HEADER};
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A tenant with two fully populated docks
pub fn full_docks() -> Value {
    json!([
        {
            "id": "1a2b",
            "name": "Main warehouse",
            "isActive": true,
            "dockTimeFake": "1.00:00:00",
            "priority": 0
        },
        {
            "id": "3c4d",
            "name": "Overflow",
            "isActive": false,
            "dockTimeFake": "0.04:30:00",
            "priority": 5
        }
    ])
}

/// A tenant whose only dock lacks the optional fields
pub fn sparse_docks() -> Value {
    json!([{ "id": 9, "name": "Pickup point" }])
}

/// Serve `body` for `tenant`, requiring the test credentials
pub async fn mount_docks(server: &MockServer, tenant: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/{}{}", tenant, DOCKS_PATH)))
        .and(header(APP_KEY_HEADER, "int-key"))
        .and(header(APP_TOKEN_HEADER, "int-token"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

/// Answer `tenant` with a bare status code
pub async fn mount_status(server: &MockServer, tenant: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/{}{}", tenant, DOCKS_PATH)))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Answer `tenant` with a body that is not a dock array
pub async fn mount_garbage(server: &MockServer, tenant: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/{}{}", tenant, DOCKS_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(server)
        .await;
}
