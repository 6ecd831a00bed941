/// Performance benchmarks for the navigation core.
/// Run with: cargo test --release bench_ -- --nocapture

use crate::core::{MbContext, ScanFlags};
use std::time::Instant;

pub struct BenchResult {
    pub name: &'static str,
    pub iterations: usize,
    pub total_ms: f64,
    pub per_iter_us: f64,
    pub throughput_mb_s: Option<f64>,
}

impl std::fmt::Display for BenchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {:.1}µs/iter ({} iters, {:.1}ms total",
               self.name, self.per_iter_us, self.iterations, self.total_ms)?;
        if let Some(tp) = self.throughput_mb_s {
            write!(f, ", {:.1} MB/s", tp)?;
        }
        write!(f, ")")
    }
}

fn mixed_line() -> Vec<u8> {
    (0..200)
        .flat_map(|_| "abc café 中文 e\u{0301} ".bytes())
        .collect()
}

/// Forward scan across a mixed-script line, one character at a time.
pub fn bench_forward_scan() -> BenchResult {
    let line = mixed_line();
    let mut ctx = MbContext::utf8();
    let iterations = if cfg!(debug_assertions) { 5 } else { 100 };
    let start = Instant::now();
    for _ in 0..iterations {
        let mut pos = 0;
        while pos < line.len() {
            pos = ctx.find_next(&line, pos, 1, ScanFlags::FIND_NONZERO);
        }
    }
    let elapsed = start.elapsed();
    let total_bytes = line.len() * iterations;
    BenchResult {
        name: "forward_scan",
        iterations,
        total_ms: elapsed.as_secs_f64() * 1000.0,
        per_iter_us: elapsed.as_secs_f64() * 1_000_000.0 / iterations as f64,
        throughput_mb_s: Some(total_bytes as f64 / elapsed.as_secs_f64() / 1_048_576.0),
    }
}

/// Backward step from the end of an 80-column line.
pub fn bench_backward_step() -> BenchResult {
    let line: Vec<u8> = "中文 café ".repeat(8).into_bytes();
    let mut ctx = MbContext::utf8();
    let iterations = if cfg!(debug_assertions) { 1_000 } else { 100_000 };
    let start = Instant::now();
    for _ in 0..iterations {
        ctx.find_prev(&line, line.len(), ScanFlags::empty());
    }
    let elapsed = start.elapsed();
    BenchResult {
        name: "backward_step",
        iterations,
        total_ms: elapsed.as_secs_f64() * 1000.0,
        per_iter_us: elapsed.as_secs_f64() * 1_000_000.0 / iterations as f64,
        throughput_mb_s: None,
    }
}

/// Cached width lookups over the Basic Multilingual Plane.
pub fn bench_width_cache() -> BenchResult {
    let mut ctx = MbContext::utf8();
    let iterations = 10;
    let start = Instant::now();
    for _ in 0..iterations {
        for cp in 0..0x1_0000u32 {
            ctx.width_or_default(cp);
        }
    }
    let elapsed = start.elapsed();
    BenchResult {
        name: "width_cache",
        iterations,
        total_ms: elapsed.as_secs_f64() * 1000.0,
        per_iter_us: elapsed.as_secs_f64() * 1_000_000.0 / iterations as f64,
        throughput_mb_s: None,
    }
}

/// Snapping every offset of a line onto a boundary.
pub fn bench_adjust_point() -> BenchResult {
    let line: Vec<u8> = "中文 café ".repeat(8).into_bytes();
    let mut ctx = MbContext::utf8();
    let iterations = if cfg!(debug_assertions) { 100 } else { 10_000 };
    let start = Instant::now();
    for _ in 0..iterations {
        for point in 0..=line.len() {
            ctx.adjust_point(&line, point, None);
        }
    }
    let elapsed = start.elapsed();
    BenchResult {
        name: "adjust_point",
        iterations,
        total_ms: elapsed.as_secs_f64() * 1000.0,
        per_iter_us: elapsed.as_secs_f64() * 1_000_000.0 / iterations as f64,
        throughput_mb_s: None,
    }
}

/// Run all benchmarks and return results.
pub fn run_all() -> Vec<BenchResult> {
    vec![
        bench_width_cache(),
        bench_forward_scan(),
        bench_backward_step(),
        bench_adjust_point(),
    ]
}
