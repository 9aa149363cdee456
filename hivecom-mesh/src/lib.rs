//! HiveCom mesh core: identity certificates, the per-node handshake state
//! machine, the single-worker executor, the network grid, and pluggable
//! routing.
//!
//! The hard engineering here is the secure messaging protocol and its
//! per-node concurrency: turning "send plaintext to peer X" into a
//! sequence of discovery / authorization / encrypted-payload packets that
//! hop through intermediaries, funnelled through one serial executor per
//! node so the node's mutable state never needs its own lock beyond the
//! executor's own queue mutex.

pub mod certificate;
pub mod certificate_authority;
pub mod executor;
pub mod grid;
pub mod message;
pub mod node;
pub mod routing;
pub mod topology;

pub use certificate::Certificate;
pub use executor::Executor;
pub use grid::NetworkGrid;
pub use message::{Message, MessageFlag};
pub use node::{HandshakeRole, Node, PeerState};
pub use routing::{RandomRoutingPolicy, RoutingPolicy};
pub use topology::{build_grid, Connection};
