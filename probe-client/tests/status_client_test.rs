//! Typed system-client tests: broadcast and single-target status queries
//! over scripted responders, decoding the wire documents end to end.

use std::sync::Arc;

use serde_json::json;
use tokio::time::Duration;

use probe_client::transport::memory::{MemoryTransport, ResponderReply};
use probe_client::{status_subject, GatherOptions, SysClient, BROADCAST_TARGET};
use probe_types::StatusFilter;

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Minimal complete status document for one server.
fn status_doc(name: &str, id: &str) -> serde_json::Value {
    json!({
        "server": {
            "name": name,
            "host": "10.0.0.1",
            "id": id,
            "ver": "2.9.3",
            "seq": 1,
            "jetstream": false,
            "time": "2024-03-01T12:00:00Z"
        },
        "data": {
            "server_id": id,
            "server_name": name,
            "version": "2.9.3",
            "proto": 1,
            "go": "go1.21.3",
            "host": "0.0.0.0",
            "port": 4222,
            "max_connections": 65536,
            "ping_interval": 120000000000i64,
            "ping_max": 2,
            "http_host": "0.0.0.0",
            "http_port": 8222,
            "http_base_path": "/",
            "https_port": 0,
            "auth_timeout": 2.0,
            "max_control_line": 4096,
            "max_payload": 1048576,
            "max_pending": 67108864,
            "tls_timeout": 2.0,
            "write_deadline": 10000000000i64,
            "start": "2024-02-28T00:00:00Z",
            "now": "2024-03-01T12:00:00Z",
            "uptime": "2d12h0m0s",
            "mem": 23068672,
            "cores": 8,
            "gomaxprocs": 8,
            "cpu": 1.5,
            "connections": 12,
            "total_connections": 200,
            "routes": 2,
            "remotes": 0,
            "leafnodes": 1,
            "in_msgs": 5000,
            "out_msgs": 4800,
            "in_bytes": 123456,
            "out_bytes": 120000,
            "slow_consumers": 0,
            "subscriptions": 37,
            "config_load_time": "2024-02-28T00:00:00Z"
        }
    })
}

fn serve_status(transport: &MemoryTransport, subject: &str, name: &'static str, id: &'static str, delay: u64) {
    transport.serve(subject, move |_request| {
        vec![ResponderReply::new(status_doc(name, id).to_string()).after(ms(delay))]
    });
}

// ─── Tests ───────────────────────────────────────────────────────────────────

/// Broadcast query: three servers answer, all three documents decode.
#[tokio::test]
async fn test_server_status_all_collects_the_fleet() {
    let transport = MemoryTransport::new();
    let broadcast = status_subject(BROADCAST_TARGET);
    serve_status(&transport, &broadcast, "s-1", "SRV1", 5);
    serve_status(&transport, &broadcast, "s-2", "SRV2", 15);
    serve_status(&transport, &broadcast, "s-3", "SRV3", 25);

    let client = SysClient::new(Arc::new(transport));
    let statuses = client
        .server_status_all(&StatusFilter::default())
        .await
        .expect("status query");

    assert_eq!(statuses.len(), 3);
    let names: Vec<&str> = statuses.iter().map(|s| s.server.name.as_str()).collect();
    assert_eq!(names, vec!["s-1", "s-2", "s-3"]);
    assert_eq!(statuses[0].data.port, 4222);
}

/// Single-target query hits the per-server subject and returns one decoded
/// document.
#[tokio::test]
async fn test_server_status_targets_one_server() {
    let transport = MemoryTransport::new();
    serve_status(&transport, &status_subject("SRV9"), "s-9", "SRV9", 5);

    let client = SysClient::new(Arc::new(transport));
    let status = client
        .server_status("SRV9", &StatusFilter::default())
        .await
        .expect("status");

    assert_eq!(status.server.id, "SRV9");
    assert_eq!(status.data.name, "s-9");
}

/// The filter travels as the request payload, JSON-encoded with wire field
/// names, for the responders to interpret.
#[tokio::test]
async fn test_filter_is_sent_as_request_payload() {
    let transport = Arc::new(MemoryTransport::new());
    let client = SysClient::new(Arc::clone(&transport));

    let filter = StatusFilter {
        cluster: Some("east".into()),
        ..Default::default()
    };
    // Nothing answers; we only care about what was published.
    let subject = status_subject(BROADCAST_TARGET);
    let _ = client
        .request_many(
            &subject,
            serde_json::to_vec(&filter).expect("encode"),
            &GatherOptions::default().max_wait(ms(100)).max_interval(ms(50)),
        )
        .await
        .expect("empty gather");

    let published = transport.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].subject, subject);
    assert!(published[0].reply_to.starts_with("_INBOX."));
    let sent: serde_json::Value =
        serde_json::from_slice(&published[0].payload).expect("payload is JSON");
    assert_eq!(sent, json!({ "cluster": "east" }));
}
