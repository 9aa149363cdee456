//! Convenience grid-building helpers, ported from
//! `examples/original_source/Source/Desktop/Simulator/NetworkGrid.{hpp,cpp}`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::grid::NetworkGrid;
use crate::node::Node;
use crate::routing::RoutingPolicy;

/// A node's identifier and its direct neighbours.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connection {
    pub source: String,
    pub connections: Vec<String>,
}

impl Connection {
    pub fn new(source: impl Into<String>, connections: Vec<String>) -> Self {
        Self {
            source: source.into(),
            connections,
        }
    }

    /// Build a [`Connection`] from a literal where each character of
    /// `connections` names one neighbouring node, e.g. `Connection::from_chars("A", "BCD")`
    /// connects `A` to `B`, `C`, and `D`.
    pub fn from_chars(source: impl Into<String>, connections: &str) -> Self {
        Self {
            source: source.into(),
            connections: connections.chars().map(|c| c.to_string()).collect(),
        }
    }
}

/// Build a grid from a connection list, creating one [`Node`] per entry.
/// Every entry's `source` must be unique.
pub fn build_grid(connections: &[Connection], policy: Arc<dyn RoutingPolicy>) -> Arc<NetworkGrid> {
    let mut nodes = HashMap::new();
    for connection in connections {
        let node = Node::new(&connection.source, connection.connections.clone(), Arc::clone(&policy));
        nodes.insert(connection.source.clone(), node);
    }
    NetworkGrid::new(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::RandomRoutingPolicy;

    #[test]
    fn from_chars_splits_each_character_into_a_neighbour() {
        let connection = Connection::from_chars("A", "BCD");
        assert_eq!(connection.source, "A");
        assert_eq!(connection.connections, vec!["B", "C", "D"]);
    }

    #[test]
    fn build_grid_creates_one_node_per_connection() {
        let policy: Arc<dyn RoutingPolicy> = Arc::new(RandomRoutingPolicy::new());
        let connections = vec![
            Connection::from_chars("A", "B"),
            Connection::from_chars("B", "A"),
        ];
        let grid = build_grid(&connections, policy);
        assert!(grid.node("A").is_some());
        assert!(grid.node("B").is_some());
    }
}
