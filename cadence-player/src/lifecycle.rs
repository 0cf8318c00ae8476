//! Resource lifecycle manager
//!
//! Tracks the screen wake lock across pause toggles and guarantees teardown
//! runs exactly once. The engine drives the ordering of the other releases
//! (audio, section event, session); this module owns the wake lock itself.

use thiserror::Error;
use tracing::{debug, info, warn};

/// Wake lock failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WakeLockError {
    /// The host has no wake lock capability (not an error condition)
    #[error("Wake lock unsupported")]
    Unsupported,

    #[error("Wake lock request failed: {0}")]
    Failed(String),
}

/// Host capability that keeps the screen awake during a class
pub trait WakeLock: Send {
    fn acquire(&mut self) -> Result<(), WakeLockError>;
    fn release(&mut self);
}

/// Host without a wake lock
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopWakeLock;

impl WakeLock for NoopWakeLock {
    fn acquire(&mut self) -> Result<(), WakeLockError> {
        Err(WakeLockError::Unsupported)
    }

    fn release(&mut self) {}
}

pub struct ResourceLifecycle {
    wake_lock: Box<dyn WakeLock>,
    held: bool,
    released: bool,
}

impl ResourceLifecycle {
    pub fn new(wake_lock: Box<dyn WakeLock>) -> Self {
        Self {
            wake_lock,
            held: false,
            released: false,
        }
    }

    /// Engine entered Running (start or resume): take the wake lock
    pub fn on_running(&mut self) {
        if self.released || self.held {
            return;
        }
        match self.wake_lock.acquire() {
            Ok(()) => {
                self.held = true;
                debug!("Wake lock acquired");
            }
            Err(WakeLockError::Unsupported) => debug!("Wake lock unsupported; continuing without"),
            Err(e) => warn!("{}", e),
        }
    }

    /// Engine paused: drop the wake lock if held
    pub fn on_paused(&mut self) {
        self.drop_lock();
    }

    fn drop_lock(&mut self) {
        if self.held {
            self.wake_lock.release();
            self.held = false;
            debug!("Wake lock released");
        }
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Final release; returns false if already done
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.drop_lock();
        self.released = true;
        info!("Lifecycle resources released");
        true
    }
}
