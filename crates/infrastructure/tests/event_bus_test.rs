use celeris_dns_application::ports::AddressChangeListener;
use celeris_dns_domain::{AddressChangeEvent, EventSource, RecordType};
use celeris_dns_infrastructure::EventBus;
use parking_lot::Mutex;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

fn event(hostname: &str) -> AddressChangeEvent {
    AddressChangeEvent {
        hostname: hostname.to_string(),
        old_addresses: vec!["1.1.1.1".parse::<IpAddr>().unwrap()],
        new_addresses: vec!["2.2.2.2".parse::<IpAddr>().unwrap()],
        timestamp: SystemTime::now(),
        source: EventSource::Query,
        ttl_seconds: 300,
        record_type: RecordType::A,
        authoritative: false,
    }
}

struct RecordingListener {
    name: String,
    enabled: AtomicBool,
    seen: Mutex<Vec<String>>,
}

impl RecordingListener {
    fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            enabled: AtomicBool::new(true),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn seen(&self) -> Vec<String> {
        self.seen.lock().clone()
    }
}

impl AddressChangeListener for RecordingListener {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_address_changed(&self, event: &AddressChangeEvent) {
        self.seen.lock().push(event.hostname.clone());
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

struct PanickingListener;

impl AddressChangeListener for PanickingListener {
    fn name(&self) -> &str {
        "panicking"
    }

    fn on_address_changed(&self, _event: &AddressChangeEvent) {
        panic!("listener blew up");
    }
}

#[test]
fn listeners_and_callbacks_receive_events() {
    let bus = EventBus::new();
    let listener = RecordingListener::new("recorder");
    bus.register_listener(listener.clone());

    let callback_seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&callback_seen);
    bus.add_callback("cb", move |event| {
        captured.lock().push(event.hostname.clone());
    });

    assert_eq!(bus.listener_count(), 2);

    bus.notify(event("changed.example"));
    assert_eq!(listener.seen(), vec!["changed.example"]);
    assert_eq!(callback_seen.lock().clone(), vec!["changed.example"]);
}

#[test]
fn disabled_listeners_are_skipped() {
    let bus = EventBus::new();
    let listener = RecordingListener::new("recorder");
    listener.enabled.store(false, Ordering::SeqCst);
    bus.register_listener(listener.clone());

    bus.notify(event("missed.example"));
    assert!(listener.seen().is_empty());
    // still registered
    assert_eq!(bus.listener_count(), 1);
}

#[test]
fn unregistered_recipients_stop_receiving() {
    let bus = EventBus::new();
    let listener = RecordingListener::new("recorder");
    bus.register_listener(listener.clone());
    let callback_seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&callback_seen);
    bus.add_callback("cb", move |event| {
        captured.lock().push(event.hostname.clone());
    });

    bus.unregister_listener("recorder");
    bus.remove_callback("cb");
    assert_eq!(bus.listener_count(), 0);

    bus.notify(event("ignored.example"));
    assert!(listener.seen().is_empty());
    assert!(callback_seen.lock().is_empty());
}

#[test]
fn panicking_recipient_does_not_starve_the_others() {
    let bus = EventBus::new();
    bus.register_listener(Arc::new(PanickingListener));
    let listener = RecordingListener::new("survivor");
    bus.register_listener(listener.clone());

    let callback_seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&callback_seen);
    bus.add_callback("cb", move |event| {
        captured.lock().push(event.hostname.clone());
    });

    bus.notify(event("resilient.example"));

    assert_eq!(listener.seen(), vec!["resilient.example"]);
    assert_eq!(callback_seen.lock().clone(), vec!["resilient.example"]);
}

#[test]
fn every_filter_must_accept_an_event() {
    let bus = EventBus::new();
    let listener = RecordingListener::new("recorder");
    bus.register_listener(listener.clone());

    bus.add_filter("only-example-org", |event| {
        event.hostname.ends_with(".org")
    });
    bus.add_filter("never-internal", |event| {
        !event.hostname.starts_with("internal.")
    });

    bus.notify(event("app.org"));
    bus.notify(event("app.com"));
    bus.notify(event("internal.org"));

    assert_eq!(listener.seen(), vec!["app.org"]);

    bus.remove_filter("only-example-org");
    bus.notify(event("app.com"));
    assert_eq!(listener.seen(), vec!["app.org", "app.com"]);
}

#[test]
fn paused_bus_queues_and_resume_drains_in_fifo_order() {
    let bus = EventBus::new();
    let listener = RecordingListener::new("recorder");
    bus.register_listener(listener.clone());

    bus.pause();
    bus.notify(event("first.example"));
    bus.notify(event("second.example"));
    bus.notify(event("third.example"));

    assert!(listener.seen().is_empty());
    assert_eq!(bus.queued_events(), 3);

    bus.resume();
    assert_eq!(
        listener.seen(),
        vec!["first.example", "second.example", "third.example"]
    );
    assert_eq!(bus.queued_events(), 0);

    // live dispatch again after resume
    bus.notify(event("fourth.example"));
    assert_eq!(listener.seen().len(), 4);
}

#[test]
fn clear_queue_drops_pending_events() {
    let bus = EventBus::new();
    let listener = RecordingListener::new("recorder");
    bus.register_listener(listener.clone());

    bus.pause();
    bus.notify(event("dropped.example"));
    bus.clear_queue();
    bus.resume();

    assert!(listener.seen().is_empty());
}

#[test]
fn queued_events_pass_the_filters_on_resume() {
    let bus = EventBus::new();
    let listener = RecordingListener::new("recorder");
    bus.register_listener(listener.clone());
    bus.add_filter("org-only", |event| event.hostname.ends_with(".org"));

    bus.pause();
    bus.notify(event("kept.org"));
    bus.notify(event("dropped.com"));
    bus.resume();

    assert_eq!(listener.seen(), vec!["kept.org"]);
}
