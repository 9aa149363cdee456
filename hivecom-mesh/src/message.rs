//! The wire packet and its completion signal.

use std::sync::{Arc, Condvar, Mutex, OnceLock};
use std::time::{Duration, Instant};

/// Closed set of packet kinds. Not a bitflag: exactly one tag
/// per message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageFlag {
    Acknowledgement,
    Discovery,
    Authorization,
    Message,
}

static CLOCK_EPOCH: OnceLock<Instant> = OnceLock::new();

/// Monotonic nanoseconds since an arbitrary process-local epoch, captured
/// at message construction.
pub fn monotonic_ns() -> u64 {
    let epoch = CLOCK_EPOCH.get_or_init(Instant::now);
    epoch.elapsed().as_nanos() as u64
}

struct CompletionInner {
    fired: Mutex<bool>,
    condvar: Condvar,
}

/// A single-shot completion signal. `fire` is idempotent; `wait` blocks
/// until `fire` has been called at least once.
#[derive(Clone)]
pub struct Completion(Arc<CompletionInner>);

impl Completion {
    pub fn new() -> Self {
        Self(Arc::new(CompletionInner {
            fired: Mutex::new(false),
            condvar: Condvar::new(),
        }))
    }

    pub fn fire(&self) {
        let mut fired = self.0.fired.lock().expect("completion lock poisoned");
        *fired = true;
        self.0.condvar.notify_all();
    }

    pub fn wait(&self) {
        let mut fired = self.0.fired.lock().expect("completion lock poisoned");
        while !*fired {
            fired = self.0.condvar.wait(fired).expect("completion lock poisoned");
        }
    }

    /// Blocks until `fire` or `timeout` elapses; returns whether it fired.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let fired = self.0.fired.lock().expect("completion lock poisoned");
        let (guard, result) = self
            .0
            .condvar
            .wait_timeout_while(fired, timeout, |fired| !*fired)
            .expect("completion lock poisoned");
        let _ = guard;
        !result.timed_out()
    }

    pub fn is_fired(&self) -> bool {
        *self.0.fired.lock().expect("completion lock poisoned")
    }
}

impl Default for Completion {
    fn default() -> Self {
        Self::new()
    }
}

/// The wire packet. Never copied or mutated by intermediaries; shared by
/// reference (`Arc<Message>`) as it hops across the grid.
#[derive(Clone)]
pub struct Message {
    pub source: String,
    pub destination: String,
    pub flag: MessageFlag,
    pub payload: Vec<u8>,
    pub timestamp: u64,
    completion: Completion,
}

impl Message {
    pub fn new(source: impl Into<String>, destination: impl Into<String>, flag: MessageFlag, payload: Vec<u8>) -> Arc<Self> {
        Arc::new(Self {
            source: source.into(),
            destination: destination.into(),
            flag,
            payload,
            timestamp: monotonic_ns(),
            completion: Completion::new(),
        })
    }

    /// Build a message carrying an explicit timestamp rather than one
    /// captured fresh at construction. Used when a node re-wraps a pending
    /// or just-encrypted payload for the wire: the timestamp must match the
    /// original so the eventual Acknowledgement still correlates.
    pub fn new_with_timestamp(
        source: impl Into<String>,
        destination: impl Into<String>,
        flag: MessageFlag,
        payload: Vec<u8>,
        timestamp: u64,
    ) -> Arc<Self> {
        Arc::new(Self {
            source: source.into(),
            destination: destination.into(),
            flag,
            payload,
            timestamp,
            completion: Completion::new(),
        })
    }

    /// Build the Acknowledgement for `self`: source and
    /// destination swap, timestamp is copied verbatim for correlation.
    pub fn acknowledgement(&self) -> Arc<Self> {
        Arc::new(Self {
            source: self.destination.clone(),
            destination: self.source.clone(),
            flag: MessageFlag::Acknowledgement,
            payload: Vec::new(),
            timestamp: self.timestamp,
            completion: Completion::new(),
        })
    }

    /// Block until this message's completion signal fires.
    pub fn wait(&self) {
        self.completion.wait();
    }

    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        self.completion.wait_timeout(timeout)
    }

    /// Fire the completion signal. Idempotent; "at most once" is enforced
    /// by the caller only ever invoking it on final delivery.
    pub fn received(&self) {
        self.completion.fire();
    }

    pub fn is_received(&self) -> bool {
        self.completion.is_fired()
    }

    /// Elapsed time since construction. Supplemental diagnostic, not part
    /// of the wire protocol (carried over from the original implementation's
    /// `getTravelTime`).
    pub fn travel_time(&self) -> Duration {
        Duration::from_nanos(monotonic_ns().saturating_sub(self.timestamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acknowledgement_swaps_endpoints_and_copies_timestamp() {
        let msg = Message::new("A", "B", MessageFlag::Message, b"hello".to_vec());
        let ack = msg.acknowledgement();
        assert_eq!(ack.source, "B");
        assert_eq!(ack.destination, "A");
        assert_eq!(ack.timestamp, msg.timestamp);
        assert!(ack.payload.is_empty());
    }

    #[test]
    fn completion_fires_exactly_once_observably() {
        let msg = Message::new("A", "B", MessageFlag::Message, Vec::new());
        assert!(!msg.is_received());
        msg.received();
        assert!(msg.is_received());
        msg.received();
        assert!(msg.is_received());
    }

    #[test]
    fn wait_timeout_returns_false_when_never_fired() {
        let msg = Message::new("A", "B", MessageFlag::Message, Vec::new());
        assert!(!msg.wait_timeout(Duration::from_millis(10)));
    }
}
