use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

type Inner = Arc<AtomicBool>;

/// Read side of a flag shared with exactly one background thread.
pub struct FlagWatch {
    inner: Inner,
}

/// Owning side. Lowering it (or dropping it) is the only way to clear the flag.
pub struct FlagHolder {
    inner: Inner,
}

/// Creates a raised flag.
pub fn new_sync_flag() -> (FlagWatch, FlagHolder) {
    let inner = Arc::new(AtomicBool::new(true));
    (
        FlagWatch {
            inner: Arc::clone(&inner),
        },
        FlagHolder { inner },
    )
}

impl FlagWatch {
    pub fn is_raised(&self) -> bool {
        self.inner.load(Ordering::Acquire)
    }
}

impl FlagHolder {
    pub fn is_raised(&self) -> bool {
        self.inner.load(Ordering::Acquire)
    }

    pub fn lower(&self) {
        self.inner.store(false, Ordering::Release);
    }
}

impl Drop for FlagHolder {
    fn drop(&mut self) {
        self.lower();
    }
}
