//! Pluggable next-hop selection for destinations that are not a direct
//! neighbour.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Given a message's destination and the caller's static neighbour list,
/// choose a next hop or drop. Must never block the caller.
pub trait RoutingPolicy: Send + Sync {
    fn route(&self, destination: &str, neighbours: &[String]) -> Option<String>;
}

/// Reference implementation: picks a uniformly random neighbour, or drops
/// if the connection list is empty. Ported from
/// `examples/original_source/Source/Desktop/Simulator/RandomizedRouterNode.cpp`.
pub struct RandomRoutingPolicy {
    rng: Mutex<StdRng>,
}

impl RandomRoutingPolicy {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic variant for tests that need a reproducible walk.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomRoutingPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl RoutingPolicy for RandomRoutingPolicy {
    fn route(&self, _destination: &str, neighbours: &[String]) -> Option<String> {
        if neighbours.is_empty() {
            return None;
        }
        let mut rng = self.rng.lock().expect("routing rng lock poisoned");
        let index = rng.gen_range(0..neighbours.len());
        Some(neighbours[index].clone())
    }
}
