use em_mint_core::UserNotifier;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use tracing::warn;

/// Alerts kept for `/alerts` when nobody collects them; older ones are dropped.
const MAX_PENDING_ALERTS: usize = 32;

/// Holds alerts until the presentation layer collects them from `/alerts`.
#[derive(Default)]
pub(crate) struct AlertQueue {
    pending: Mutex<VecDeque<String>>,
}

impl AlertQueue {
    pub(crate) fn drain(&self) -> Vec<String> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.drain(..).collect()
    }
}

impl UserNotifier for AlertQueue {
    fn alert(&self, message: &str) {
        warn!(alert = message, "user alert");
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if pending.len() == MAX_PENDING_ALERTS {
            pending.pop_front();
        }
        pending.push_back(message.to_owned());
    }
}
