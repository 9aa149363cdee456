//! End-to-end scenarios over small hand-built topologies.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use hivecom_mesh::{message::MessageFlag, Message, NetworkGrid, Node, RandomRoutingPolicy, RoutingPolicy};

const WAIT: Duration = Duration::from_secs(5);

fn build_grid(edges: &[(&str, &[&str])], policy: Arc<dyn RoutingPolicy>) -> Arc<NetworkGrid> {
    let mut nodes = HashMap::new();
    for (id, neighbours) in edges {
        let connections = neighbours.iter().map(|s| s.to_string()).collect();
        nodes.insert(id.to_string(), Node::new(*id, connections, Arc::clone(&policy)));
    }
    NetworkGrid::new(nodes)
}

#[test]
fn direct_send_two_node_grid() {
    let policy: Arc<dyn RoutingPolicy> = Arc::new(RandomRoutingPolicy::new());
    let grid = build_grid(&[("A", &["B"]), ("B", &["A"])], policy);

    let a = grid.node("A").unwrap().clone();
    let b = grid.node("B").unwrap().clone();

    let msg = a.send("B", b"hello".to_vec());
    assert!(msg.wait_timeout(WAIT), "message to B never completed");

    assert!(a.has_session_with("B"));
    assert!(b.has_session_with("A"));
}

#[test]
fn one_hop_forwarding_through_b() {
    let policy: Arc<dyn RoutingPolicy> = Arc::new(RandomRoutingPolicy::new());
    let grid = build_grid(&[("A", &["B"]), ("B", &["A", "C"]), ("C", &["B"])], policy);

    let a = grid.node("A").unwrap().clone();
    let b = grid.node("B").unwrap().clone();
    let c = grid.node("C").unwrap().clone();

    let msg = a.send("C", b"ping".to_vec());
    assert!(msg.wait_timeout(WAIT), "message to C never completed");

    assert!(a.has_session_with("C"));
    assert!(c.has_session_with("A"));
    // B only ever forwards: it never establishes a session keyed "A" or "C"
    // as the destination of this conversation, so it holds no key that
    // could decrypt the A<->C payload.
    assert!(!b.has_session_with("A"));
    assert!(!b.has_session_with("C"));
}

#[test]
fn randomized_routing_reaches_far_end_of_a_chain() {
    // A-B-C-D-E: only D is a direct neighbour of E, so every earlier hop
    // must be resolved by the routing policy. A seeded generator keeps the
    // walk reproducible; a random walk on a line is recurrent, so it
    // reaches E almost surely well within the wait budget below.
    let policy: Arc<dyn RoutingPolicy> = Arc::new(RandomRoutingPolicy::from_seed(42));
    let grid = build_grid(
        &[("A", &["B"]), ("B", &["A", "C"]), ("C", &["B", "D"]), ("D", &["C", "E"]), ("E", &["D"])],
        policy,
    );

    let a = grid.node("A").unwrap().clone();
    let e = grid.node("E").unwrap().clone();

    let msg = a.send("E", b"reach the far end".to_vec());
    assert!(msg.wait_timeout(Duration::from_secs(10)), "message to E never completed");
    assert!(e.has_session_with("A"));
}

#[test]
fn invalid_certificate_is_rejected_without_establishing_a_session() {
    let policy: Arc<dyn RoutingPolicy> = Arc::new(RandomRoutingPolicy::new());
    let grid = build_grid(&[("A", &["B"]), ("B", &["A"])], policy);

    let a = grid.node("A").unwrap().clone();
    let b = grid.node("B").unwrap().clone();

    let mut cert_text = a.certificate().to_text();
    // Flip a byte inside the base64(public_key) line (line index 4) so the
    // signature no longer verifies.
    let mut lines: Vec<String> = cert_text.lines().map(String::from).collect();
    let mut chars: Vec<char> = lines[4].chars().collect();
    chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
    lines[4] = chars.into_iter().collect();
    cert_text = lines.join("\n") + "\n";

    let discovery = Message::new("A", "B", MessageFlag::Discovery, cert_text.into_bytes());
    b.deliver(Arc::clone(&discovery));

    // No Authorization is emitted, so nothing will ever fire this
    // Discovery's own completion signal; give the worker a moment to
    // process, then assert no session resulted.
    std::thread::sleep(Duration::from_millis(200));
    assert!(!b.has_session_with("A"));
}

#[test]
fn concurrent_sends_to_same_peer_both_deliver() {
    let policy: Arc<dyn RoutingPolicy> = Arc::new(RandomRoutingPolicy::new());
    let grid = build_grid(&[("A", &["B"]), ("B", &["A"])], policy);

    let a = grid.node("A").unwrap().clone();

    let first = a.send("B", b"one".to_vec());
    let second = a.send("B", b"two".to_vec());

    assert!(first.wait_timeout(WAIT));
    assert!(second.wait_timeout(WAIT));
    assert!(a.has_session_with("B"));
}
