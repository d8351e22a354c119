/// Receives threshold-breach alerts from the metrics sink.
///
/// Dispatch iterates a snapshot of the registered sinks, so implementations
/// may take their own locks freely.
pub trait AlertSink: Send + Sync {
    fn on_alert(&self, message: &str);
}

impl<F> AlertSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn on_alert(&self, message: &str) {
        self(message)
    }
}
