//! One-time, process-wide engine library initialisation.
//!
//! The entry point calls [`load`] before building any configuration. Loading is
//! idempotent: later calls return the same handle without re-initialising.

use once_cell::sync::OnceCell;
use std::time::SystemTime;

static LIBRARY: OnceCell<EngineLibrary> = OnceCell::new();

/// Handle proving the engine library has been initialised
#[derive(Debug)]
pub struct EngineLibrary {
    version: &'static str,
    loaded_at: SystemTime,
}

impl EngineLibrary {
    pub fn version(&self) -> &'static str {
        self.version
    }

    pub fn loaded_at(&self) -> SystemTime {
        self.loaded_at
    }
}

/// Initialise the engine library once for the whole process.
pub fn load() -> &'static EngineLibrary {
    LIBRARY.get_or_init(|| {
        tracing::info!(version = crate::VERSION, "engine library initialised");
        EngineLibrary { version: crate::VERSION, loaded_at: SystemTime::now() }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_is_idempotent() {
        let first = load();
        let second = load();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.loaded_at(), second.loaded_at());
        assert_eq!(first.version(), crate::VERSION);
    }
}
