use celeris_dns_application::ports::AddressChangeListener;
use celeris_dns_domain::AddressChangeEvent;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::warn;

type EventCallback = Box<dyn Fn(&AddressChangeEvent) + Send + Sync>;
type EventFilter = Box<dyn Fn(&AddressChangeEvent) -> bool + Send + Sync>;

#[derive(Default)]
struct BusState {
    listeners: HashMap<String, Arc<dyn AddressChangeListener>>,
    callbacks: HashMap<String, EventCallback>,
    filters: HashMap<String, EventFilter>,
    paused: bool,
    queue: VecDeque<AddressChangeEvent>,
}

/// Address-change notification bus.
///
/// Constructor-injected collaborator (one per resolver graph, shareable).
/// `notify` holds the bus lock across dispatch; recipients must not re-enter
/// the bus. A panicking recipient is logged and the remaining recipients
/// still run.
#[derive(Default)]
pub struct EventBus {
    state: Mutex<BusState>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_listener(&self, listener: Arc<dyn AddressChangeListener>) {
        let mut state = self.state.lock();
        state.listeners.insert(listener.name().to_string(), listener);
    }

    pub fn unregister_listener(&self, name: &str) {
        self.state.lock().listeners.remove(name);
    }

    pub fn add_callback(
        &self,
        name: impl Into<String>,
        callback: impl Fn(&AddressChangeEvent) + Send + Sync + 'static,
    ) {
        let mut state = self.state.lock();
        state.callbacks.insert(name.into(), Box::new(callback));
    }

    pub fn remove_callback(&self, name: &str) {
        self.state.lock().callbacks.remove(name);
    }

    /// An event is dispatched iff every registered filter accepts it.
    pub fn add_filter(
        &self,
        name: impl Into<String>,
        filter: impl Fn(&AddressChangeEvent) -> bool + Send + Sync + 'static,
    ) {
        let mut state = self.state.lock();
        state.filters.insert(name.into(), Box::new(filter));
    }

    pub fn remove_filter(&self, name: &str) {
        self.state.lock().filters.remove(name);
    }

    /// While paused, events enqueue instead of dispatching.
    pub fn pause(&self) {
        self.state.lock().paused = true;
    }

    /// Drains the queue in FIFO order, then resumes live dispatch.
    pub fn resume(&self) {
        let mut state = self.state.lock();
        state.paused = false;
        while let Some(event) = state.queue.pop_front() {
            Self::dispatch(&state, &event);
        }
    }

    pub fn clear_queue(&self) {
        self.state.lock().queue.clear();
    }

    pub fn notify(&self, event: AddressChangeEvent) {
        let mut state = self.state.lock();
        if state.paused {
            state.queue.push_back(event);
            return;
        }
        Self::dispatch(&state, &event);
    }

    /// Registered listeners plus registered callbacks.
    pub fn listener_count(&self) -> usize {
        let state = self.state.lock();
        state.listeners.len() + state.callbacks.len()
    }

    pub fn queued_events(&self) -> usize {
        self.state.lock().queue.len()
    }

    fn dispatch(state: &BusState, event: &AddressChangeEvent) {
        for filter in state.filters.values() {
            if !filter(event) {
                return;
            }
        }

        for (name, listener) in &state.listeners {
            if !listener.is_enabled() {
                continue;
            }
            let result = catch_unwind(AssertUnwindSafe(|| listener.on_address_changed(event)));
            if result.is_err() {
                warn!(listener = %name, hostname = %event.hostname, "Listener panicked during dispatch");
            }
        }

        for (name, callback) in &state.callbacks {
            let result = catch_unwind(AssertUnwindSafe(|| callback(event)));
            if result.is_err() {
                warn!(callback = %name, hostname = %event.hostname, "Callback panicked during dispatch");
            }
        }
    }
}
