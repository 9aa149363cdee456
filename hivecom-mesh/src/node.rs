//! The node: identity, session-key table, pending-message table, connection
//! list, and the handshake/forwarding state machine that runs on the
//! node's own executor.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, OnceLock, Weak};

use hivecom_crypto::{aead, b64, Kem, Kyber768Kem};

use crate::certificate::Certificate;
use crate::certificate_authority;
use crate::executor::Executor;
use crate::grid::NetworkGrid;
use crate::message::{Message, MessageFlag};
use crate::routing::RoutingPolicy;

/// Who initiated the in-flight handshake with a given peer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandshakeRole {
    Initiator,
    Responder,
}

/// Per-peer handshake state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeerState {
    None,
    Handshaking(HandshakeRole),
    Established,
}

#[derive(Default)]
struct NodeState {
    peer_states: HashMap<String, PeerState>,
    session_keys: HashMap<String, [u8; 32]>,
    pending: HashMap<String, VecDeque<Arc<Message>>>,
    /// Messages this node sent and is awaiting an Acknowledgement for,
    /// keyed by timestamp (used when an Acknowledgement arrives).
    outstanding: HashMap<u64, Arc<Message>>,
}

impl NodeState {
    fn peer_state(&self, peer: &str) -> PeerState {
        self.peer_states.get(peer).copied().unwrap_or(PeerState::None)
    }
}

/// Owns its executor, certificate, KEM key pair, static connection list,
/// session-key table, pending-message table, and a non-owning back
/// reference to the grid (the grid outlives all nodes, so the back
/// reference is a `Weak`, avoiding an ownership cycle).
pub struct Node {
    identifier: String,
    executor: Executor,
    connections: Vec<String>,
    certificate: Certificate,
    kem: Kyber768Kem,
    kem_secret_key: Vec<u8>,
    routing_policy: Arc<dyn RoutingPolicy>,
    grid: OnceLock<Weak<NetworkGrid>>,
    state: Mutex<NodeState>,
}

impl Node {
    pub fn new(identifier: impl Into<String>, connections: Vec<String>, routing_policy: Arc<dyn RoutingPolicy>) -> Arc<Self> {
        let identifier = identifier.into();
        let kem = Kyber768Kem::new();
        let keypair = kem.keygen().expect("node KEM key generation failed");
        let certificate = certificate_authority::mint(&keypair.public_key);

        Arc::new(Self {
            identifier,
            executor: Executor::new(),
            connections,
            certificate,
            kem,
            kem_secret_key: keypair.secret_key,
            routing_policy,
            grid: OnceLock::new(),
            state: Mutex::new(NodeState::default()),
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn connections(&self) -> &[String] {
        &self.connections
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    pub(crate) fn attach_grid(&self, grid: Weak<NetworkGrid>) {
        let _ = self.grid.set(grid);
    }

    /// Current handshake state for `peer`, for tests and diagnostics.
    pub fn peer_state(&self, peer: &str) -> PeerState {
        self.state.lock().expect("node state lock poisoned").peer_state(peer)
    }

    pub fn has_session_with(&self, peer: &str) -> bool {
        self.state.lock().expect("node state lock poisoned").session_keys.contains_key(peer)
    }

    /// Inbound entry point, called by the grid. Enqueues processing on this
    /// node's own executor so every node's mutable state is touched by
    /// exactly one thread.
    pub fn deliver(self: &Arc<Self>, message: Arc<Message>) {
        let this = Arc::clone(self);
        self.executor.execute(move || this.handle_inbound(message));
    }

    /// Send a user payload to `destination`. Returns the message handle
    /// the caller can `wait()` on.
    pub fn send(self: &Arc<Self>, destination: impl Into<String>, payload: Vec<u8>) -> Arc<Message> {
        let destination = destination.into();
        let message = Message::new(self.identifier.clone(), destination, MessageFlag::Message, payload);
        let this = Arc::clone(self);
        let enqueued = Arc::clone(&message);
        self.executor.execute(move || this.handle_send(enqueued));
        message
    }

    // -- everything below runs only inside a task on this node's own executor --

    fn handle_send(self: &Arc<Self>, message: Arc<Message>) {
        if message.destination == self.identifier {
            // Send-to-self resolves as trivial local delivery.
            tracing::debug!(node = %self.identifier, "send to self, trivial delivery");
            message.received();
            return;
        }

        let mut state = self.state.lock().expect("node state lock poisoned");
        if let Some(&key) = state.session_keys.get(&message.destination) {
            let wire = self.encrypt_for_wire(&message, &key);
            state.outstanding.insert(message.timestamp, Arc::clone(&message));
            drop(state);
            self.forward_or_route(wire);
            return;
        }

        let already_handshaking = matches!(state.peer_state(&message.destination), PeerState::Handshaking(_));
        state
            .pending
            .entry(message.destination.clone())
            .or_default()
            .push_back(Arc::clone(&message));

        if !already_handshaking {
            state.peer_states.insert(message.destination.clone(), PeerState::Handshaking(HandshakeRole::Initiator));
            let discovery = Message::new(self.identifier.clone(), message.destination.clone(), MessageFlag::Discovery, self.certificate.to_text().into_bytes());
            state.outstanding.insert(discovery.timestamp, Arc::clone(&discovery));
            drop(state);
            self.forward_or_route(discovery);
        }
    }

    fn handle_inbound(self: &Arc<Self>, message: Arc<Message>) {
        if message.destination != self.identifier {
            self.forward_or_route(message);
            return;
        }

        match message.flag {
            MessageFlag::Discovery => self.handle_discovery(message),
            MessageFlag::Authorization => self.handle_authorization(message),
            MessageFlag::Message => self.handle_user_message(message),
            MessageFlag::Acknowledgement => self.handle_acknowledgement(&message),
        }
    }

    fn handle_discovery(self: &Arc<Self>, message: Arc<Message>) {
        let peer = message.source.clone();
        let cert_text = match std::str::from_utf8(&message.payload) {
            Ok(text) => text,
            Err(_) => {
                tracing::error!(node = %self.identifier, %peer, "Invalid discovery packet");
                return;
            }
        };
        let certificate = certificate_authority::parse(cert_text);
        if !certificate.is_valid {
            tracing::error!(node = %self.identifier, %peer, "Invalid discovery packet");
            return;
        }

        let encapsulation = match self.kem.encapsulate(&certificate.public_key) {
            Ok(encapsulation) => encapsulation,
            Err(err) => {
                tracing::error!(node = %self.identifier, %peer, %err, "KEM encapsulation failed");
                return;
            }
        };

        let mut key = [0u8; 32];
        key.copy_from_slice(&encapsulation.shared_secret[..32]);

        {
            let mut state = self.state.lock().expect("node state lock poisoned");
            state.session_keys.insert(peer.clone(), key);
            state.peer_states.insert(peer.clone(), PeerState::Established);
        }

        let payload = format!(
            "{}\n{}\n",
            b64::encode(self.certificate.to_text().as_bytes()),
            b64::encode(&encapsulation.ciphertext),
        );
        let authorization = Message::new(self.identifier.clone(), peer.clone(), MessageFlag::Authorization, payload.into_bytes());
        {
            let mut state = self.state.lock().expect("node state lock poisoned");
            state.outstanding.insert(authorization.timestamp, Arc::clone(&authorization));
        }
        self.forward_or_route(authorization);

        let ack = message.acknowledgement();
        self.forward_or_route(ack);
    }

    fn handle_authorization(self: &Arc<Self>, message: Arc<Message>) {
        let peer = message.source.clone();
        let text = match std::str::from_utf8(&message.payload) {
            Ok(text) => text,
            Err(_) => {
                tracing::error!(node = %self.identifier, %peer, "malformed authorization: not utf8");
                return;
            }
        };
        let mut lines = text.lines();
        let (Some(cert_b64), Some(ciphertext_b64)) = (lines.next(), lines.next()) else {
            tracing::error!(node = %self.identifier, %peer, "malformed authorization: fewer than two lines");
            return;
        };

        let cert_text = match b64::decode(cert_b64).ok().and_then(|bytes| String::from_utf8(bytes).ok()) {
            Some(text) => text,
            None => {
                tracing::error!(node = %self.identifier, %peer, "malformed authorization: bad certificate encoding");
                return;
            }
        };
        let certificate = certificate_authority::parse(&cert_text);
        if !certificate.is_valid {
            tracing::error!(node = %self.identifier, %peer, "malformed authorization: inner certificate invalid");
            return;
        }

        let ciphertext = match b64::decode(ciphertext_b64) {
            Ok(bytes) => bytes,
            Err(_) => {
                tracing::error!(node = %self.identifier, %peer, "malformed authorization: bad ciphertext encoding");
                return;
            }
        };

        let shared_secret = match self.kem.decapsulate(&self.kem_secret_key, &ciphertext) {
            Ok(secret) => secret,
            Err(err) => {
                tracing::error!(node = %self.identifier, %peer, %err, "KEM decapsulation failed");
                return;
            }
        };
        let mut key = [0u8; 32];
        key.copy_from_slice(&shared_secret[..32]);

        let drained: Vec<Arc<Message>> = {
            let mut state = self.state.lock().expect("node state lock poisoned");
            state.session_keys.insert(peer.clone(), key);
            state.peer_states.insert(peer.clone(), PeerState::Established);
            state.pending.remove(&peer).map(Vec::from).unwrap_or_default()
        };

        for queued in drained {
            let wire = self.encrypt_for_wire(&queued, &key);
            {
                let mut state = self.state.lock().expect("node state lock poisoned");
                state.outstanding.insert(queued.timestamp, Arc::clone(&queued));
            }
            self.forward_or_route(wire);
        }

        let ack = message.acknowledgement();
        self.forward_or_route(ack);
    }

    fn handle_user_message(self: &Arc<Self>, message: Arc<Message>) {
        let peer = message.source.clone();
        let session_key = self.state.lock().expect("node state lock poisoned").session_keys.get(&peer).copied();

        let plaintext = match session_key {
            Some(key) => {
                let ciphertext = match b64::decode(std::str::from_utf8(&message.payload).unwrap_or_default()) {
                    Ok(bytes) => bytes,
                    Err(_) => {
                        tracing::error!(node = %self.identifier, %peer, "malformed message payload encoding");
                        return;
                    }
                };
                match aead::decrypt(&key, &ciphertext) {
                    Ok(plain) => plain,
                    Err(err) => {
                        tracing::error!(node = %self.identifier, %peer, %err, "AEAD decrypt failed");
                        return;
                    }
                }
            }
            // No session yet: bootstrap path, payload is plain text.
            None => message.payload.clone(),
        };

        tracing::debug!(node = %self.identifier, %peer, bytes = plaintext.len(), "message delivered");
        message.received();

        let ack = message.acknowledgement();
        self.forward_or_route(ack);
    }

    fn handle_acknowledgement(self: &Arc<Self>, message: &Arc<Message>) {
        let outstanding = {
            let mut state = self.state.lock().expect("node state lock poisoned");
            state.outstanding.remove(&message.timestamp)
        };
        match outstanding {
            Some(original) => original.received(),
            None => tracing::debug!(node = %self.identifier, timestamp = message.timestamp, "acknowledgement for unknown message"),
        }
    }

    fn encrypt_for_wire(&self, message: &Arc<Message>, key: &[u8; 32]) -> Arc<Message> {
        let ciphertext = aead::encrypt(key, &message.payload).expect("AEAD encrypt failed");
        Message::new_with_timestamp(
            message.source.clone(),
            message.destination.clone(),
            MessageFlag::Message,
            b64::encode(&ciphertext).into_bytes(),
            message.timestamp,
        )
    }

    fn forward_or_route(self: &Arc<Self>, message: Arc<Message>) {
        if message.destination == self.identifier {
            self.deliver(message);
            return;
        }

        let next_hop = if self.connections.iter().any(|c| c == &message.destination) {
            Some(message.destination.clone())
        } else {
            self.routing_policy.route(&message.destination, &self.connections)
        };

        match next_hop {
            Some(hop) => self.deliver_via_grid(message, &hop),
            None => tracing::warn!(node = %self.identifier, destination = %message.destination, "no route, dropping message"),
        }
    }

    fn deliver_via_grid(&self, message: Arc<Message>, next_hop: &str) {
        match self.grid.get().and_then(Weak::upgrade) {
            Some(grid) => grid.deliver(message, next_hop),
            None => tracing::warn!(node = %self.identifier, "node has no grid attached, dropping message"),
        }
    }
}
