//! Cooperative Ctrl-C handling
//!
//! The first interrupt stops new submissions and cancels queued tasks while
//! running tool calls finish. A second interrupt exits at once.

use crate::errors::{BatchError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route Ctrl-C to this flag. Can only be installed once per process.
    pub fn install_handler(&self) -> Result<()> {
        let flag = Arc::clone(&self.flag);
        ctrlc::set_handler(move || {
            if flag.swap(true, Ordering::SeqCst) {
                eprintln!("\n🛑 Second interrupt, exiting now");
                std::process::exit(130);
            }
            eprintln!("\n⚠️  Interrupt received: finishing running conversions, no new work will start");
        })
        .map_err(|e| BatchError::Pool(format!("cannot install Ctrl-C handler: {}", e)))
    }

    pub fn request(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
