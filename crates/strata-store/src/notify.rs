use std::sync::atomic::{AtomicBool, Ordering};

/// Receives the coalesced "settings changed" signal.
pub trait ChangeSink: Send + Sync {
    fn settings_changed(&self);
}

/// Pending-flag half of the change notification.
///
/// Mutations call [`queue`](Self::queue); an external scheduler calls
/// [`deliver`](Self::deliver) once per tick. Any number of queued changes
/// between two deliveries produce one notification.
#[derive(Debug, Default)]
pub struct ChangeNotifier {
    pending: AtomicBool,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a change. Returns `true` if this call set the flag.
    pub fn queue(&self) -> bool {
        !self.pending.swap(true, Ordering::AcqRel)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Clear the flag and notify `sink` if a change was pending.
    pub fn deliver(&self, sink: &dyn ChangeSink) -> bool {
        if self.pending.swap(false, Ordering::AcqRel) {
            sink.settings_changed();
            true
        } else {
            false
        }
    }
}
