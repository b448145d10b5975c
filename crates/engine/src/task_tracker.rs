// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Live worker-task counter feeding the Resource Governor's "goroutine
//! count" sample (spec §4.1). Tokio exposes no API to enumerate running
//! tasks, so each pipeline's worker spawn/join point increments and
//! decrements a shared atomic counter instead — the adaptation SPEC_FULL.md
//! §2 (C1) calls for in place of the Go-runtime notion this policy was
//! originally phrased against.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct TaskCounter(Arc<AtomicU64>);

impl TaskCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    /// Marks one worker task active for the lifetime of the returned guard.
    pub fn guard(&self) -> TaskGuard {
        self.0.fetch_add(1, Ordering::Relaxed);
        TaskGuard(self.0.clone())
    }
}

pub struct TaskGuard(Arc<AtomicU64>);

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_increments_then_decrements_on_drop() {
        let counter = TaskCounter::new();
        assert_eq!(counter.count(), 0);
        let guard = counter.guard();
        assert_eq!(counter.count(), 1);
        drop(guard);
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn concurrent_guards_stack_and_unwind_independently() {
        let counter = TaskCounter::new();
        let g1 = counter.guard();
        let g2 = counter.guard();
        assert_eq!(counter.count(), 2);
        drop(g1);
        assert_eq!(counter.count(), 1);
        drop(g2);
        assert_eq!(counter.count(), 0);
    }
}
