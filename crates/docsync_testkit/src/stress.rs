//! Stress tests for the gateway.
//!
//! These helpers drive a [`SyncGateway`] from several threads at once.

use crate::fixtures::{request_body, sample_document};
use axum::http::Method;
use docsync_gateway::SyncGateway;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total requests performed.
    pub total_ops: usize,
    /// Requests answered with a success status.
    pub successful_ops: usize,
    /// Requests answered with an error status.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Requests per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total requests: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} req/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Requests per thread.
    pub operations: usize,
    /// Number of concurrent threads.
    pub threads: usize,
    /// Documents per write request.
    pub batch_size: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 1_000,
            threads: 4,
            batch_size: 4,
        }
    }
}

/// Runs concurrent PUT requests against one collection.
pub fn stress_concurrent_puts(
    gateway: &SyncGateway,
    collection: &str,
    config: &StressConfig,
) -> StressTestResult {
    let successful = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    let path = format!("/{}/{}", gateway.config().object_root, collection);
    let start = Instant::now();

    thread::scope(|scope| {
        for t in 0..config.threads {
            let gateway = gateway.clone();
            let (path, successful, failed) = (&path, &successful, &failed);
            scope.spawn(move || {
                for i in 0..config.operations {
                    let documents: Vec<_> = (0..config.batch_size)
                        .map(|j| sample_document(t * 1_000_000 + i * config.batch_size + j))
                        .collect();
                    let response = gateway.handle(&Method::PUT, path, &request_body(&documents));
                    let counter = if response.status.is_success() {
                        successful
                    } else {
                        failed
                    };
                    counter.fetch_add(1, Ordering::Relaxed);
                }
            });
        }
    });

    StressTestResult::new(
        successful.into_inner(),
        failed.into_inner(),
        start.elapsed(),
    )
}

/// Runs writers and delta readers side by side.
///
/// Each reader polls `GET .../mtime/{stamp}` and counts a failure whenever
/// the last-modified header moves backwards.
pub fn stress_mixed_sync(
    gateway: &SyncGateway,
    collection: &str,
    config: &StressConfig,
) -> StressTestResult {
    let successful = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    let root = format!("/{}/{}", gateway.config().object_root, collection);
    let start = Instant::now();

    thread::scope(|scope| {
        for t in 0..config.threads {
            let gateway = gateway.clone();
            let (root, successful, failed) = (&root, &successful, &failed);
            let reader = t % 2 == 1;
            scope.spawn(move || {
                let mut stamp = 0i64;
                for i in 0..config.operations {
                    let ok = if reader {
                        let path = format!("{root}/mtime/{stamp}");
                        let response = gateway.handle(&Method::GET, &path, &[]);
                        match response.last_modified {
                            Some(latest) if latest >= stamp && !response.status.is_server_error() => {
                                stamp = latest;
                                true
                            }
                            _ => false,
                        }
                    } else {
                        let body = request_body(&[sample_document(t * 1_000_000 + i)]);
                        gateway.handle(&Method::PUT, root, &body).status.is_success()
                    };
                    let counter = if ok { successful } else { failed };
                    counter.fetch_add(1, Ordering::Relaxed);
                }
            });
        }
    });

    StressTestResult::new(
        successful.into_inner(),
        failed.into_inner(),
        start.elapsed(),
    )
}
