//! Shared helpers for wiremock-backed provider tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use permsys_common::OperationContext;
use permsys_domain::ProviderConfig;
use permsys_infra::Provider;
use serde_json::{json, Value};
use wiremock::{MockServer, Request, ResponseTemplate};

pub const SCOPE: &str = "ps-1";

/// Provider pointed at `server` with its own lane registry.
pub fn provider(server: &MockServer) -> Provider {
    init_tracing();
    Provider::isolated(ProviderConfig::new(server.uri(), "test-token"))
        .expect("provider should build")
}

pub fn ctx() -> OperationContext {
    OperationContext::new().with_timeout(Duration::from_secs(30))
}

/// Install a test subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// 200/201 response carrying `body` and an `ETag` header.
pub fn entity(status: u16, etag: &str, body: Value) -> ResponseTemplate {
    ResponseTemplate::new(status).insert_header("ETag", etag).set_body_json(body)
}

pub fn role_json(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "permissionsSystemId": SCOPE,
        "permissions": { "p1": "", "p2": "", "p3": "", "p4": "" },
        "createdAt": "2026-01-01T00:00:00Z",
        "creator": "tester",
    })
}

pub fn account_json(id: &str, name: &str, description: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": description,
        "createdAt": "2026-01-01T00:00:00Z",
        "creator": "tester",
    })
}

/// Records request arrival times and mints sequential ids for creates.
#[derive(Clone, Default)]
pub struct CreateRecorder {
    arrivals: Arc<Mutex<Vec<Instant>>>,
    next_id: Arc<AtomicU64>,
}

impl CreateRecorder {
    /// Responder echoing the posted name with a fresh id after `delay`.
    pub fn responder(&self, delay: Duration) -> impl Fn(&Request) -> ResponseTemplate + Send + Sync {
        let recorder = self.clone();
        move |request: &Request| {
            recorder.arrivals.lock().unwrap().push(Instant::now());
            let n = recorder.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            let posted: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
            let name = posted["name"].as_str().unwrap_or("unnamed");
            entity(201, &format!("\"v{n}\""), role_json(&format!("role-{n}"), name)).set_delay(delay)
        }
    }

    /// Gaps between consecutive arrivals, in arrival order.
    pub fn gaps(&self) -> Vec<Duration> {
        let mut arrivals = self.arrivals.lock().unwrap().clone();
        arrivals.sort();
        arrivals.windows(2).map(|w| w[1] - w[0]).collect()
    }

    pub fn count(&self) -> usize {
        self.arrivals.lock().unwrap().len()
    }
}
