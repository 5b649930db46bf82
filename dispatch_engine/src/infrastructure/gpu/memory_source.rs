// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # GPU Memory Source
//!
//! Pluggable memory-pressure reading for the admission controller. This
//! build has no CUDA binding, so the default source always reports
//! "no reading available", which the controller treats as sufficient
//! memory per spec §4.B.

use dispatch_domain::services::GpuMemoryInfo;

/// A source of point-in-time GPU memory readings.
pub trait GpuMemorySource: Send + Sync {
    fn read(&self) -> Option<GpuMemoryInfo>;
}

/// Always reports no reading available. The admission controller's memory
/// gate is a no-op under this source - capacity is the only limit.
pub struct NoGpuMemorySource;

impl GpuMemorySource for NoGpuMemorySource {
    fn read(&self) -> Option<GpuMemoryInfo> {
        None
    }
}

/// A fixed reading, useful for tests that need to exercise the memory gate
/// without a real GPU.
#[cfg(test)]
pub struct FixedGpuMemorySource(pub GpuMemoryInfo);

#[cfg(test)]
impl GpuMemorySource for FixedGpuMemorySource {
    fn read(&self) -> Option<GpuMemoryInfo> {
        Some(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_source_reports_nothing() {
        assert!(NoGpuMemorySource.read().is_none());
    }

    #[test]
    fn fixed_source_reports_its_reading() {
        let info = GpuMemoryInfo {
            allocated_gib: 10.0,
            reserved_gib: 11.0,
            total_gib: 24.0,
        };
        let source = FixedGpuMemorySource(info);
        assert_eq!(source.read().unwrap().free_gib(), 14.0);
    }
}
