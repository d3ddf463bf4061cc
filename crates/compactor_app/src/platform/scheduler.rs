use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use compactor_core::Msg;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

impl TimerId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Delivers messages back into the control loop after a delay or on a cadence.
pub trait Scheduler {
    fn every(&mut self, interval: Duration, msg: Msg) -> TimerId;
    fn after(&mut self, delay: Duration, msg: Msg) -> TimerId;
    fn cancel(&mut self, id: TimerId);
}

/// One sleeping thread per timer; cancellation is checked before each send.
pub struct ThreadScheduler {
    msg_tx: mpsc::Sender<Msg>,
    timers: HashMap<TimerId, Arc<AtomicBool>>,
    next_id: u64,
}

impl ThreadScheduler {
    pub fn new(msg_tx: mpsc::Sender<Msg>) -> Self {
        Self {
            msg_tx,
            timers: HashMap::new(),
            next_id: 0,
        }
    }

    fn register(&mut self) -> (TimerId, Arc<AtomicBool>) {
        // Drop flags of timers whose thread has already exited.
        self.timers.retain(|_, flag| Arc::strong_count(flag) > 1);

        self.next_id += 1;
        let id = TimerId::new(self.next_id);
        let cancelled = Arc::new(AtomicBool::new(false));
        self.timers.insert(id, cancelled.clone());
        (id, cancelled)
    }
}

impl Scheduler for ThreadScheduler {
    fn every(&mut self, interval: Duration, msg: Msg) -> TimerId {
        let (id, cancelled) = self.register();
        let tx = self.msg_tx.clone();
        thread::spawn(move || loop {
            thread::sleep(interval);
            if cancelled.load(Ordering::Relaxed) || tx.send(msg.clone()).is_err() {
                break;
            }
        });
        id
    }

    fn after(&mut self, delay: Duration, msg: Msg) -> TimerId {
        let (id, cancelled) = self.register();
        let tx = self.msg_tx.clone();
        thread::spawn(move || {
            thread::sleep(delay);
            if !cancelled.load(Ordering::Relaxed) {
                let _ = tx.send(msg);
            }
        });
        id
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(flag) = self.timers.remove(&id) {
            flag.store(true, Ordering::Relaxed);
        }
    }
}
