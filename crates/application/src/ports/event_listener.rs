use celeris_dns_domain::AddressChangeEvent;

/// Named recipient of address-change notifications.
///
/// Must not call back into the event bus from `on_address_changed`; the bus
/// lock is held for the duration of dispatch.
pub trait AddressChangeListener: Send + Sync {
    fn name(&self) -> &str;

    fn on_address_changed(&self, event: &AddressChangeEvent);

    /// Disabled listeners stay registered but are skipped during dispatch.
    fn is_enabled(&self) -> bool {
        true
    }
}
