//! Identifier → node map and the single entry point for hop delivery
//! Read-only after construction; no lock is needed for
//! lookup. Ported from
//! `examples/original_source/Source/Desktop/Simulator/NetworkGrid.cpp`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::message::Message;
use crate::node::Node;

pub struct NetworkGrid {
    nodes: HashMap<String, Arc<Node>>,
}

impl NetworkGrid {
    /// Build a grid from already-constructed nodes and attach each node's
    /// (non-owning) back reference to this grid.
    pub fn new(nodes: HashMap<String, Arc<Node>>) -> Arc<Self> {
        let grid = Arc::new(Self { nodes });
        let weak = Arc::downgrade(&grid);
        for node in grid.nodes.values() {
            node.attach_grid(weak.clone());
        }
        grid
    }

    /// Hand `message` to `next_hop`'s executor. The grid never inspects
    /// flags or payloads. An unknown `next_hop` is a silent drop (log only).
    pub fn deliver(&self, message: Arc<Message>, next_hop: &str) {
        match self.nodes.get(next_hop) {
            Some(node) => node.deliver(message),
            None => tracing::warn!(next_hop, "unknown next hop, dropping message"),
        }
    }

    pub fn node(&self, identifier: &str) -> Option<&Arc<Node>> {
        self.nodes.get(identifier)
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::RandomRoutingPolicy;

    #[test]
    fn deliver_to_unknown_hop_does_not_panic() {
        let policy: Arc<dyn crate::routing::RoutingPolicy> = Arc::new(RandomRoutingPolicy::new());
        let node = Node::new("A", vec![], policy);
        let mut nodes = HashMap::new();
        nodes.insert("A".to_string(), node);
        let grid = NetworkGrid::new(nodes);

        let message = Message::new("A", "Z", crate::message::MessageFlag::Message, Vec::new());
        grid.deliver(message, "Z");
    }
}
