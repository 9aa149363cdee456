//! Per-node single-worker executor.
//!
//! One dedicated thread, a FIFO task queue behind a mutex and condition
//! variable, and a start-latch so the constructor only returns once the
//! worker has entered its loop. Ported from the reference `Reactor` design
//! (`examples/original_source/Source/Desktop/Simulator/Reactor.cpp`).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

type Task = Box<dyn FnOnce() + Send + 'static>;

struct Shared {
    queue: Mutex<VecDeque<Task>>,
    condvar: Condvar,
    running: AtomicBool,
}

/// A single-worker FIFO executor. Every inbound message, handshake step,
/// and outgoing send for one node runs through its executor, so the node's
/// mutable state needs no further locking.
pub struct Executor {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl Executor {
    pub fn new() -> Self {
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            condvar: Condvar::new(),
            running: AtomicBool::new(true),
        });

        let worker_shared = Arc::clone(&shared);
        let (start_tx, start_rx) = mpsc::sync_channel::<()>(0);
        let worker = thread::spawn(move || {
            let _ = start_tx.send(());
            Self::worker_loop(&worker_shared);
        });
        start_rx.recv().expect("executor worker failed to signal startup");

        Self {
            shared,
            worker: Some(worker),
        }
    }

    fn worker_loop(shared: &Shared) {
        loop {
            let task = {
                let mut queue = shared.queue.lock().expect("executor queue lock poisoned");
                loop {
                    if let Some(task) = queue.pop_front() {
                        break Some(task);
                    }
                    if !shared.running.load(Ordering::Acquire) {
                        break None;
                    }
                    queue = shared.condvar.wait(queue).expect("executor queue lock poisoned");
                }
            };
            match task {
                Some(task) => task(),
                None => {
                    tracing::debug!("executor worker draining complete, exiting");
                    return;
                }
            }
        }
    }

    /// Enqueue a task. Runs strictly after every previously enqueued task.
    pub fn execute(&self, task: impl FnOnce() + Send + 'static) {
        let mut queue = self.shared.queue.lock().expect("executor queue lock poisoned");
        queue.push_back(Box::new(task));
        self.shared.condvar.notify_one();
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        self.shared.condvar.notify_all();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn tasks_run_in_enqueue_order() {
        let executor = Executor::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..10 {
            let order = Arc::clone(&order);
            executor.execute(move || order.lock().unwrap().push(i));
        }
        drop(executor);
        assert_eq!(*order.lock().unwrap(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn shutdown_drains_all_queued_tasks() {
        let executor = Executor::new();
        let completed = Arc::new(AtomicUsize::new(0));
        for _ in 0..100 {
            let completed = Arc::clone(&completed);
            executor.execute(move || {
                completed.fetch_add(1, Ordering::SeqCst);
            });
        }
        drop(executor);
        assert_eq!(completed.load(Ordering::SeqCst), 100);
    }
}
