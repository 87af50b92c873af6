//! Multi-node integration tests.
//!
//! Boots full nodes in-process on ephemeral ports and drives them over real
//! HTTP: quorum writes and reads through arbitrary coordinators, quorum
//! failure with unreachable replicas, and gossip-driven ring convergence on
//! fast clocks.

use ringkv::config::Config;
use ringkv::membership::service::MembershipService;
use ringkv::node::Node;
use ringkv::routing::ring::HashRing;
use serde_json::Value;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

struct TestNode {
    url: String,
    ring: Arc<RwLock<HashRing>>,
    membership: Arc<MembershipService>,
}

/// Reserves `n` distinct free ports by holding the listeners open until all
/// are allocated.
fn free_ports(n: usize) -> Vec<u16> {
    let listeners: Vec<TcpListener> = (0..n)
        .map(|_| TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port"))
        .collect();
    listeners
        .iter()
        .map(|l| l.local_addr().expect("local addr").port())
        .collect()
}

fn url_for(port: u16) -> String {
    format!("http://127.0.0.1:{}", port)
}

fn node_config(port: u16, peer_ports: &[u16]) -> Config {
    Config {
        self_url: url_for(port),
        port,
        peers: peer_ports.iter().map(|p| url_for(*p)).collect(),
        replicas: 3,
        read_quorum: 2,
        write_quorum: 2,
        virtual_nodes: 1,
        gossip_interval: Duration::from_millis(200),
        peer_timeout: Duration::from_secs(15),
    }
}

fn spawn_node(config: Config) -> TestNode {
    let node = Node::new(config.clone()).expect("build node");
    let handles = TestNode {
        url: config.self_url.clone(),
        ring: node.ring.clone(),
        membership: node.membership.clone(),
    };
    tokio::spawn(async move {
        if let Err(e) = node.serve().await {
            eprintln!("node exited: {}", e);
        }
    });
    handles
}

async fn wait_healthy(client: &reqwest::Client, url: &str) {
    for _ in 0..50 {
        if let Ok(resp) = client.get(format!("{}/health", url)).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("node {} never became healthy", url);
}

fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
        .expect("build client")
}

#[tokio::test(flavor = "multi_thread")]
async fn test_put_and_get_through_any_coordinator() {
    let ports = free_ports(3);
    let nodes: Vec<TestNode> = (0..3)
        .map(|i| {
            let peer_ports: Vec<u16> = ports
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, p)| *p)
                .collect();
            spawn_node(node_config(ports[i], &peer_ports))
        })
        .collect();

    let client = http_client();
    for node in &nodes {
        wait_healthy(&client, &node.url).await;
    }

    // Write through node 0.
    let resp = client
        .post(format!("{}/kv", nodes[0].url))
        .query(&[("key", "apple"), ("value", "red")])
        .send()
        .await
        .expect("put");
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.expect("json");
    assert_eq!(body["key"], "apple");
    assert_eq!(body["value"], "red");
    let timestamp = body["timestamp"].as_i64().expect("timestamp");
    assert!(timestamp > 0);

    // Read back through a different coordinator.
    let resp = client
        .get(format!("{}/kv", nodes[1].url))
        .query(&[("key", "apple")])
        .send()
        .await
        .expect("get");
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.expect("json");
    assert_eq!(body["value"], "red");
    assert_eq!(body["timestamp"].as_i64(), Some(timestamp));

    // At least a write quorum of replicas holds the identical version
    // (forwarded reads bypass coordination).
    let mut holders = 0;
    for node in &nodes {
        let resp = client
            .get(format!("{}/kv", node.url))
            .query(&[("key", "apple")])
            .header("X-From-Node", "true")
            .send()
            .await
            .expect("forwarded get");
        if resp.status() == 200 {
            let body: Value = resp.json().await.expect("json");
            assert_eq!(body["timestamp"].as_i64(), Some(timestamp));
            holders += 1;
        }
    }
    assert!(holders >= 2, "only {} replicas hold the version", holders);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_write_quorum_failure_reports_counts() {
    // One live node; its two configured peers are never started.
    let ports = free_ports(3);
    let node = spawn_node(node_config(ports[0], &ports[1..]));

    let client = http_client();
    wait_healthy(&client, &node.url).await;

    let resp = client
        .post(format!("{}/kv", node.url))
        .query(&[("key", "k"), ("value", "v")])
        .send()
        .await
        .expect("put");
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.expect("json");
    let error = body["error"].as_str().expect("error message");
    assert!(error.contains("1 < 2"), "unexpected error: {}", error);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_parameters_are_client_errors() {
    let ports = free_ports(1);
    let node = spawn_node(node_config(ports[0], &[]));

    let client = http_client();
    wait_healthy(&client, &node.url).await;

    let resp = client
        .get(format!("{}/kv", node.url))
        .send()
        .await
        .expect("get");
    assert_eq!(resp.status(), 400);

    let resp = client
        .post(format!("{}/kv", node.url))
        .query(&[("key", "k")])
        .send()
        .await
        .expect("put");
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.expect("json");
    assert_eq!(body["error"], "Missing value");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_gossip_propagates_transitive_peers() {
    // A only knows B; B and C know each other. A must learn C through
    // gossip and admit it to its ring.
    let ports = free_ports(3);
    let node_a = spawn_node(node_config(ports[0], &ports[1..2]));
    let node_b = spawn_node(node_config(ports[1], &ports[2..3]));
    let node_c = spawn_node(node_config(ports[2], &ports[1..2]));

    let client = http_client();
    for node in [&node_a, &node_b, &node_c] {
        wait_healthy(&client, node.url.as_str()).await;
    }

    let c_url = node_c.url.clone();
    let mut converged = false;
    for _ in 0..100 {
        if node_a.ring.read().await.contains(&c_url) {
            converged = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(converged, "node A never learned about node C");
    assert!(node_a.membership.peer(&c_url).is_some());

    // The converged ring covers the full peer set.
    let peers = node_a.ring.read().await.all_peers();
    assert_eq!(peers.len(), 3);
}
