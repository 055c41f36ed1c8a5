//! Batch Result Module
//!
//! Per-run tallies. Worker threads record into a [`SharedBatchResult`]; the
//! final [`BatchResult`] feeds the summary report.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchResult {
    pub total: usize,
    pub converted: usize,
    /// Subset of `converted` that needed the fallback chain.
    pub converted_with_fallback: usize,
    pub copied: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub errors: Vec<(PathBuf, String)>,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn convert(&mut self, used_fallback: bool) {
        self.total += 1;
        self.converted += 1;
        if used_fallback {
            self.converted_with_fallback += 1;
        }
    }

    pub fn copy(&mut self) {
        self.total += 1;
        self.copied += 1;
    }

    pub fn skip(&mut self) {
        self.total += 1;
        self.skipped += 1;
    }

    pub fn cancel(&mut self) {
        self.total += 1;
        self.cancelled += 1;
    }

    pub fn fail(&mut self, path: PathBuf, error: String) {
        self.total += 1;
        self.failed += 1;
        self.errors.push((path, error));
    }

    pub fn succeeded(&self) -> usize {
        self.converted + self.copied
    }

    /// Share of attempted files (skips excluded) that went through.
    pub fn success_rate(&self) -> f64 {
        let attempted = self.total - self.skipped;
        if attempted == 0 {
            100.0
        } else {
            (self.succeeded() as f64 / attempted as f64) * 100.0
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Thread-safe wrapper handed to pool tasks.
#[derive(Debug, Default)]
pub struct SharedBatchResult(Mutex<BatchResult>);

impl SharedBatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record<F: FnOnce(&mut BatchResult)>(&self, f: F) {
        let mut guard = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard);
    }

    pub fn snapshot(&self) -> BatchResult {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}
