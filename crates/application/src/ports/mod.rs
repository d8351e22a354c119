mod address_provider;
mod alert_sink;
mod event_listener;

pub use address_provider::{AddressInfoProvider, FamilyPreference, ProviderResponse};
pub use alert_sink::AlertSink;
pub use event_listener::AddressChangeListener;
