//! In-process event bus.
//!
//! Publishers enqueue onto an unbounded channel; a single dispatcher thread
//! matches each event against the current subscriptions and calls listeners.
//! Delivery is therefore asynchronous with respect to the publisher, and
//! listeners must not assume they run on the thread that caused the change.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, trace};

use super::event::Event;
use super::subscription::{EventListener, SubscriptionId, SubscriptionParams};

struct Subscription {
    params: SubscriptionParams,
    listener: Arc<dyn EventListener>,
}

enum BusMessage {
    Publish(Event),
    Removed(SubscriptionId, Arc<dyn EventListener>),
    Barrier(oneshot::Sender<()>),
    Stop,
}

type SubscriptionMap = Arc<RwLock<HashMap<SubscriptionId, Subscription>>>;

pub struct EventBus {
    subs: SubscriptionMap,
    next_id: AtomicU64,
    tx: mpsc::UnboundedSender<BusMessage>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl EventBus {
    /// Create the bus and spawn its dispatcher thread.
    pub fn start() -> std::io::Result<Arc<Self>> {
        let (tx, mut rx) = mpsc::unbounded_channel::<BusMessage>();
        let subs: SubscriptionMap = Arc::new(RwLock::new(HashMap::new()));
        let worker_subs = subs.clone();
        let handle = std::thread::Builder::new().name("mudsec-events".into()).spawn(move || {
            while let Some(msg) = rx.blocking_recv() {
                match msg {
                    BusMessage::Publish(ev) => dispatch(&worker_subs, &ev),
                    BusMessage::Removed(id, listener) => {
                        let out = std::panic::catch_unwind(AssertUnwindSafe(|| listener.on_subscription_removed(id)));
                        if out.is_err() { error!(target: "mudsec::events", "listener panicked in on_subscription_removed id={}", id); }
                    }
                    BusMessage::Barrier(done) => { let _ = done.send(()); }
                    BusMessage::Stop => break,
                }
            }
            debug!(target: "mudsec::events", "dispatcher stopped");
        })?;
        Ok(Arc::new(Self { subs, next_id: AtomicU64::new(1), tx, worker: Mutex::new(Some(handle)) }))
    }

    pub fn subscribe(&self, params: SubscriptionParams, listener: Arc<dyn EventListener>) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(target: "mudsec::events", "subscribe id={} params={:?}", id, params);
        self.subs.write().insert(id, Subscription { params, listener });
        id
    }

    /// Subscriber-initiated removal. The listener is not notified.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subs.write().remove(&id).is_some()
    }

    /// Tear down a subscription from the bus side. The listener is told via
    /// `on_subscription_removed` on the dispatcher thread.
    pub fn force_remove(&self, id: SubscriptionId) -> bool {
        let removed = self.subs.write().remove(&id);
        match removed {
            Some(sub) => {
                debug!(target: "mudsec::events", "force_remove id={}", id);
                let _ = self.tx.send(BusMessage::Removed(id, sub.listener));
                true
            }
            None => false,
        }
    }

    pub fn is_subscribed(&self, id: SubscriptionId) -> bool { self.subs.read().contains_key(&id) }

    pub fn subscription_count(&self) -> usize { self.subs.read().len() }

    pub fn publish(&self, event: Event) {
        trace!(target: "mudsec::events", "publish {:?}", event);
        let site_deleted = match &event { Event::SiteDeleted { site_id } => Some(*site_id), _ => None };
        if self.tx.send(BusMessage::Publish(event)).is_err() {
            error!(target: "mudsec::events", "publish after dispatcher stopped; event dropped");
        }
        if let Some(site) = site_deleted {
            let doomed: Vec<SubscriptionId> = self.subs.read().iter()
                .filter(|(_, s)| s.params.scoped_site() == Some(site))
                .map(|(id, _)| *id)
                .collect();
            for id in doomed { self.force_remove(id); }
        }
    }

    /// Block until everything queued before this call has been delivered.
    /// Must not be called from a listener.
    pub fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(BusMessage::Barrier(done_tx)).is_err() { return; }
        let _ = done_rx.blocking_recv();
    }

    pub fn shutdown(&self) {
        let handle = self.worker.lock().take();
        if let Some(h) = handle {
            let _ = self.tx.send(BusMessage::Stop);
            if h.join().is_err() { error!(target: "mudsec::events", "dispatcher thread panicked"); }
        }
        self.subs.write().clear();
    }
}

impl Drop for EventBus {
    fn drop(&mut self) {
        let _ = self.tx.send(BusMessage::Stop);
    }
}

fn dispatch(subs: &SubscriptionMap, event: &Event) {
    // Collect first so listeners may subscribe/unsubscribe while being called.
    let targets: Vec<(SubscriptionId, Arc<dyn EventListener>)> = subs.read().iter()
        .filter(|(_, s)| s.params.matches(event))
        .map(|(id, s)| (*id, s.listener.clone()))
        .collect();
    for (id, listener) in targets {
        let out = std::panic::catch_unwind(AssertUnwindSafe(|| listener.on_event(id, event)));
        if out.is_err() { error!(target: "mudsec::events", "listener panicked handling event sub={}", id); }
    }
}
