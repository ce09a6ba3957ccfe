use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// Handle to one playable unit living on the audio thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub u64);

// atomic so the loader worker can hand out ids without going through the controller
pub fn next_unit_id() -> UnitId {
    UnitId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
}
