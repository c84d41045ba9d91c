use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Storage operations tracked by [`PerformanceMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `find_issues`
    Find,
    /// `insert_issue`
    Insert,
    /// `update_issue`
    Update,
    /// `delete_issue`
    Delete,
}

impl Operation {
    /// Every tracked operation
    pub const ALL: [Operation; 4] = [
        Operation::Find,
        Operation::Insert,
        Operation::Update,
        Operation::Delete,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Short lowercase name used in log output
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Find => "find",
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Default)]
struct OperationStats {
    count: AtomicU64,
    failures: AtomicU64,
    total_micros: AtomicU64,
}

/// Lock-free counters and timings for storage operations
///
/// Cloning shares the underlying counters.
#[derive(Debug, Clone, Default)]
pub struct PerformanceMetrics {
    stats: Arc<[OperationStats; 4]>,
}

impl PerformanceMetrics {
    /// Create a collector with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed operation
    pub fn record_operation(&self, operation: Operation, duration: Duration, succeeded: bool) {
        let stats = &self.stats[operation.index()];
        stats.count.fetch_add(1, Ordering::Relaxed);
        stats
            .total_micros
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        if !succeeded {
            stats.failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Read the counters into a plain snapshot
    pub fn get_stats(&self) -> MetricsSnapshot {
        let mut snapshot = MetricsSnapshot::default();
        for operation in Operation::ALL {
            let stats = &self.stats[operation.index()];
            let count = stats.count.load(Ordering::Relaxed);
            let total = stats.total_micros.load(Ordering::Relaxed);
            snapshot.operations[operation.index()] = OperationSnapshot {
                count,
                failures: stats.failures.load(Ordering::Relaxed),
                avg_micros: if count == 0 {
                    0.0
                } else {
                    total as f64 / count as f64
                },
            };
        }
        snapshot
    }

    /// Zero every counter
    pub fn reset(&self) {
        for stats in self.stats.iter() {
            stats.count.store(0, Ordering::Relaxed);
            stats.failures.store(0, Ordering::Relaxed);
            stats.total_micros.store(0, Ordering::Relaxed);
        }
    }
}

/// Counters for one operation at a point in time
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OperationSnapshot {
    /// Calls made, successful or not
    pub count: u64,
    /// Calls that returned an error
    pub failures: u64,
    /// Mean call time in microseconds
    pub avg_micros: f64,
}

/// Point-in-time copy of [`PerformanceMetrics`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    operations: [OperationSnapshot; 4],
}

impl MetricsSnapshot {
    /// Counters for one operation
    pub fn operation(&self, operation: Operation) -> OperationSnapshot {
        self.operations[operation.index()]
    }

    /// Calls across every operation
    pub fn total_operations(&self) -> u64 {
        self.operations.iter().map(|op| op.count).sum()
    }

    /// Failed calls across every operation
    pub fn total_failures(&self) -> u64 {
        self.operations.iter().map(|op| op.failures).sum()
    }

    /// Mean call time in microseconds, weighted by call count
    pub fn overall_avg_time(&self) -> f64 {
        let total_ops = self.total_operations();
        if total_ops == 0 {
            return 0.0;
        }
        let total_time: f64 = self
            .operations
            .iter()
            .map(|op| op.count as f64 * op.avg_micros)
            .sum();
        total_time / total_ops as f64
    }

    /// Throughput over `elapsed_seconds`
    pub fn operations_per_second(&self, elapsed_seconds: f64) -> f64 {
        if elapsed_seconds <= 0.0 {
            0.0
        } else {
            self.total_operations() as f64 / elapsed_seconds
        }
    }

    /// The operation with the lowest mean time, ignoring unused ones
    pub fn fastest_operation(&self) -> Option<Operation> {
        self.used_operations()
            .min_by(|a, b| a.1.avg_micros.total_cmp(&b.1.avg_micros))
            .map(|(op, _)| op)
    }

    /// The operation with the highest mean time, ignoring unused ones
    pub fn slowest_operation(&self) -> Option<Operation> {
        self.used_operations()
            .max_by(|a, b| a.1.avg_micros.total_cmp(&b.1.avg_micros))
            .map(|(op, _)| op)
    }

    fn used_operations(&self) -> impl Iterator<Item = (Operation, OperationSnapshot)> + '_ {
        Operation::ALL
            .into_iter()
            .map(|op| (op, self.operation(op)))
            .filter(|(_, stats)| stats.count > 0)
    }
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} storage operations ({} failed), avg {:.1}µs",
            self.total_operations(),
            self.total_failures(),
            self.overall_avg_time()
        )?;
        for (operation, stats) in self.used_operations() {
            write!(
                f,
                "; {} x{} avg {:.1}µs",
                operation, stats.count, stats.avg_micros
            )?;
        }
        Ok(())
    }
}
