//! Worker count defaults
//!
//! Audio transcodes and page pre-processing are light enough to run one per
//! core. Lossless image encoding can take gigabytes per process, so that
//! workload is capped at three.

use crate::errors::{BatchError, Result};
use std::sync::OnceLock;

static CPU_COUNT: OnceLock<usize> = OnceLock::new();

/// Cap for memory-heavy encoders.
pub const MEMORY_HEAVY_MAX_WORKERS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadType {
    /// One worker per logical core.
    CpuBound,
    /// Few workers, each allowed to use lots of memory.
    MemoryHeavy,
}

pub fn cpu_count() -> usize {
    *CPU_COUNT.get_or_init(|| num_cpus::get().max(1))
}

pub fn default_workers(workload: WorkloadType) -> usize {
    match workload {
        WorkloadType::CpuBound => cpu_count(),
        WorkloadType::MemoryHeavy => cpu_count().min(MEMORY_HEAVY_MAX_WORKERS),
    }
}

/// Explicit `--max-workers` wins; zero is rejected.
pub fn resolve_workers(requested: Option<usize>, workload: WorkloadType) -> Result<usize> {
    match requested {
        Some(0) => Err(BatchError::invalid("--max-workers", "must be at least 1")),
        Some(n) => Ok(n),
        None => Ok(default_workers(workload)),
    }
}
