//! Wire-contract types for the probe monitoring query client.
//!
//! These types mirror the JSON documents exchanged with monitored servers:
//! - replies carry a [`StatusResponse`] (server identity + runtime status)
//! - requests carry a [`StatusFilter`] narrowing which servers should answer
//!
//! The collector in `probe-client` never looks inside these payloads; they
//! are decoded by whoever issued the query. Field names follow the wire
//! contract exactly, so changing a rename here is a protocol change.

#![recursion_limit = "256"]

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Reply envelope
// ============================================================================

/// One server's answer to a status query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Identity of the responding server.
    pub server: ServerInfo,
    /// The status document itself.
    pub data: ServerStatus,
}

/// Identifies a remote server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub host: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(rename = "ver")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Monotonically increasing per-server event sequence.
    pub seq: u64,
    /// Whether the storage subsystem is enabled on this server.
    pub jetstream: bool,
    pub time: DateTime<Utc>,
}

// ============================================================================
// Server status document
// ============================================================================

/// General runtime information about a server: listener configuration,
/// resource usage, traffic counters, and optional per-subsystem sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerStatus {
    #[serde(rename = "server_id")]
    pub id: String,
    #[serde(rename = "server_name")]
    pub name: String,
    pub version: String,
    pub proto: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_commit: Option<String>,
    #[serde(rename = "go")]
    pub go_version: String,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub auth_required: bool,
    #[serde(default)]
    pub tls_required: bool,
    #[serde(default)]
    pub tls_verify: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_urls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws_connect_urls: Option<Vec<String>>,
    pub max_connections: i64,
    #[serde(default)]
    pub max_subscriptions: i64,
    /// Nanoseconds.
    pub ping_interval: i64,
    #[serde(rename = "ping_max")]
    pub max_pings_out: i64,
    pub http_host: String,
    pub http_port: u16,
    pub http_base_path: String,
    pub https_port: u16,
    pub auth_timeout: f64,
    pub max_control_line: i32,
    pub max_payload: i64,
    pub max_pending: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<ClusterStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<GatewayStatus>,
    #[serde(rename = "leaf", default, skip_serializing_if = "Option::is_none")]
    pub leaf_node: Option<LeafNodeStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mqtt: Option<MqttStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub websocket: Option<WebsocketStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jetstream: Option<JetStreamStatus>,
    pub tls_timeout: f64,
    /// Nanoseconds.
    pub write_deadline: i64,
    pub start: DateTime<Utc>,
    pub now: DateTime<Utc>,
    pub uptime: String,
    pub mem: i64,
    pub cores: i64,
    #[serde(rename = "gomaxprocs")]
    pub max_procs: i64,
    pub cpu: f64,
    pub connections: i64,
    pub total_connections: u64,
    pub routes: i64,
    pub remotes: i64,
    #[serde(rename = "leafnodes")]
    pub leafs: i64,
    pub in_msgs: i64,
    pub out_msgs: i64,
    pub in_bytes: i64,
    pub out_bytes: i64,
    pub slow_consumers: i64,
    pub subscriptions: u32,
    #[serde(default)]
    pub http_req_stats: HashMap<String, u64>,
    pub config_load_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trusted_operators_jwt: Option<Vec<String>>,
    /// Operator claim documents, kept opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trusted_operators_claim: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_account: Option<String>,
    #[serde(rename = "pinned_account_fails", default)]
    pub pinned_account_fail: u64,
}

/// Cluster listener section of [`ServerStatus`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "addr", default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(rename = "cluster_port", default)]
    pub port: u16,
    #[serde(default)]
    pub auth_timeout: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,
    #[serde(default)]
    pub tls_timeout: f64,
    #[serde(default)]
    pub tls_required: bool,
    #[serde(default)]
    pub tls_verify: bool,
}

/// Gateway listener section of [`ServerStatus`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub auth_timeout: f64,
    #[serde(default)]
    pub tls_timeout: f64,
    #[serde(default)]
    pub tls_required: bool,
    #[serde(default)]
    pub tls_verify: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advertise: Option<String>,
    #[serde(default)]
    pub connect_retries: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateways: Option<Vec<RemoteGatewayStatus>>,
    #[serde(rename = "reject_unknown", default)]
    pub reject_unknown: bool,
}

/// One remote gateway as seen by the gateway listener.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteGatewayStatus {
    pub name: String,
    #[serde(default)]
    pub tls_timeout: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,
}

/// Leaf-node listener section of [`ServerStatus`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeafNodeStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub auth_timeout: f64,
    #[serde(default)]
    pub tls_timeout: f64,
    #[serde(default)]
    pub tls_required: bool,
    #[serde(default)]
    pub tls_verify: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remotes: Option<Vec<RemoteLeafStatus>>,
}

/// One configured remote leaf connection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteLeafStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_account: Option<String>,
    #[serde(default)]
    pub tls_timeout: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deny: Option<DenyRules>,
}

/// Subjects a leaf connection may not import or export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DenyRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exports: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imports: Option<Vec<String>>,
}

/// MQTT listener section of [`ServerStatus`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MqttStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default)]
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_auth_user: Option<String>,
    #[serde(default)]
    pub auth_timeout: f64,
    #[serde(default)]
    pub tls_map: bool,
    #[serde(default)]
    pub tls_timeout: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_pinned_certs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub js_domain: Option<String>,
    /// Nanoseconds.
    #[serde(default)]
    pub ack_wait: i64,
    #[serde(default)]
    pub max_ack_pending: u16,
}

/// Websocket listener section of [`ServerStatus`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebsocketStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default)]
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advertise: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_auth_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt_cookie: Option<String>,
    /// Nanoseconds.
    #[serde(default)]
    pub handshake_timeout: i64,
    #[serde(default)]
    pub auth_timeout: f64,
    #[serde(default)]
    pub no_tls: bool,
    #[serde(default)]
    pub tls_map: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_pinned_certs: Option<Vec<String>>,
    #[serde(default)]
    pub same_origin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_origins: Option<Vec<String>>,
    #[serde(default)]
    pub compression: bool,
}

// ============================================================================
// Storage subsystem sub-report
// ============================================================================

/// Embedded storage subsystem report: configured limits, usage statistics,
/// and (when clustered) the meta-group consensus summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JetStreamStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<JetStreamConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<JetStreamStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<MetaClusterInfo>,
}

/// Storage subsystem limits. Memory and store maxima are in bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JetStreamConfig {
    pub max_memory: i64,
    #[serde(rename = "max_storage")]
    pub max_store: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default)]
    pub compress_ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_tag: Option<String>,
}

/// Storage subsystem usage statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JetStreamStats {
    pub memory: u64,
    #[serde(rename = "storage")]
    pub store: u64,
    pub reserved_memory: u64,
    #[serde(rename = "reserved_storage")]
    pub reserved_store: u64,
    pub accounts: i64,
    pub ha_assets: i64,
    pub api: JetStreamApiStats,
}

/// Storage subsystem API call counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JetStreamApiStats {
    pub total: u64,
    pub errors: u64,
    #[serde(default)]
    pub inflight: u64,
}

/// Consensus summary for the storage meta group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaClusterInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leader: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<Vec<PeerInfo>>,
    #[serde(rename = "cluster_size")]
    pub size: i64,
}

/// One replica in the storage meta group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeerInfo {
    pub name: String,
    /// Whether the replica has caught up to the leader.
    pub current: bool,
    #[serde(default)]
    pub offline: bool,
    /// Nanoseconds since the replica was last heard from.
    pub active: i64,
    #[serde(default)]
    pub lag: u64,
    pub peer: String,
}

// ============================================================================
// Request filter
// ============================================================================

/// Narrows which servers should answer a status query. Serialized as the
/// request payload and interpreted entirely by the remote servers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusFilter {
    /// Filter by server name.
    #[serde(rename = "server_name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Filter by cluster name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    /// Filter by host name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Filter by tags; a server must match all of them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Filter by storage domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_status_json() -> serde_json::Value {
        json!({
            "server": {
                "name": "s-1",
                "host": "10.0.0.1",
                "id": "NAB2QC",
                "cluster": "east",
                "ver": "2.9.3",
                "seq": 42,
                "jetstream": true,
                "time": "2024-03-01T12:00:00Z"
            },
            "data": {
                "server_id": "NAB2QC",
                "server_name": "s-1",
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
                "cluster": { "name": "east", "addr": "0.0.0.0", "cluster_port": 6222 },
                "jetstream": {
                    "config": { "max_memory": 1073741824i64, "max_storage": 10737418240i64, "store_dir": "/data" },
                    "stats": {
                        "memory": 1024, "storage": 2048,
                        "reserved_memory": 0, "reserved_storage": 0,
                        "accounts": 1, "ha_assets": 2,
                        "api": { "total": 10, "errors": 1 }
                    },
                    "meta": {
                        "name": "east", "leader": "s-1", "cluster_size": 3,
                        "replicas": [
                            { "name": "s-2", "current": true, "active": 150000000, "peer": "p2" },
                            { "name": "s-3", "current": false, "lag": 7, "active": 900000000, "peer": "p3" }
                        ]
                    }
                },
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
                "http_req_stats": { "/varz": 9 },
                "config_load_time": "2024-02-28T00:00:00Z"
            }
        })
    }

    #[test]
    fn test_status_response_decodes_wire_document() {
        let resp: StatusResponse =
            serde_json::from_value(sample_status_json()).expect("decode status response");

        assert_eq!(resp.server.id, "NAB2QC");
        assert_eq!(resp.server.cluster.as_deref(), Some("east"));
        assert_eq!(resp.server.seq, 42);
        assert!(resp.server.jetstream);

        assert_eq!(resp.data.version, "2.9.3");
        assert_eq!(resp.data.port, 4222);
        assert_eq!(resp.data.cores, 8);
        assert_eq!(resp.data.http_req_stats.get("/varz"), Some(&9));

        let cluster = resp.data.cluster.as_ref().expect("cluster section");
        assert_eq!(cluster.port, 6222);

        let js = resp.data.jetstream.as_ref().expect("storage section");
        assert_eq!(js.config.as_ref().expect("config").max_store, 10_737_418_240);
        let meta = js.meta.as_ref().expect("meta");
        assert_eq!(meta.leader.as_deref(), Some("s-1"));
        assert_eq!(meta.size, 3);
        let replicas = meta.replicas.as_ref().expect("replicas");
        assert!(replicas[0].current);
        assert_eq!(replicas[1].lag, 7);
    }

    #[test]
    fn test_status_response_roundtrip() {
        let resp: StatusResponse =
            serde_json::from_value(sample_status_json()).expect("decode");
        let encoded = serde_json::to_value(&resp).expect("encode");
        let again: StatusResponse = serde_json::from_value(encoded).expect("re-decode");
        assert_eq!(resp, again);
    }

    #[test]
    fn test_empty_filter_serializes_to_empty_object() {
        let filter = StatusFilter::default();
        let encoded = serde_json::to_value(&filter).expect("encode filter");
        assert_eq!(encoded, json!({}));
    }

    #[test]
    fn test_filter_uses_wire_field_names() {
        let filter = StatusFilter {
            name: Some("s-1".into()),
            tags: Some(vec!["edge".into(), "eu".into()]),
            ..Default::default()
        };
        let encoded = serde_json::to_value(&filter).expect("encode filter");
        assert_eq!(
            encoded,
            json!({ "server_name": "s-1", "tags": ["edge", "eu"] })
        );
    }
}
