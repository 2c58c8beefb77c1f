use tracing::warn;

/// Blocking, user-facing alerts (wrong network, no wallet installed).
pub trait UserNotifier: Send + Sync {
    fn alert(&self, message: &str);
}

#[derive(Default)]
pub struct TracingNotifier;

impl UserNotifier for TracingNotifier {
    fn alert(&self, message: &str) {
        warn!(alert = message, "user alert");
    }
}
