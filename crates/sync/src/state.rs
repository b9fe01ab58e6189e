use std::sync::RwLock;

/// The two head counters shared across scheduling tasks.
///
/// `latest_at_startup` is seeded once from the store when the listener
/// boots; `latest_observed` advances monotonically as valid headers arrive.
/// Both serialize through one lock so a write is visible to every reader
/// before the next scheduling decision.
#[derive(Debug, Default)]
pub struct HeadState {
    inner: RwLock<Counters>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    latest_at_startup: u64,
    latest_observed: u64,
}

impl HeadState {
    /// Creates a new state with both counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the latest block number found in the store at boot.
    pub fn latest_at_startup(&self) -> u64 {
        self.inner.read().expect("head state lock poisoned").latest_at_startup
    }

    /// Records the latest block number found in the store at boot.
    pub fn set_latest_at_startup(&self, number: u64) {
        self.inner.write().expect("head state lock poisoned").latest_at_startup = number;
    }

    /// Returns the highest head number observed live.
    pub fn latest_observed(&self) -> u64 {
        self.inner.read().expect("head state lock poisoned").latest_observed
    }

    /// Records a newly observed head number.
    pub fn set_latest_observed(&self, number: u64) {
        self.inner.write().expect("head state lock poisoned").latest_observed = number;
    }
}
