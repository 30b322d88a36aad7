//! Benchmarks for bias estimation, gap detection and ranking.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fvgscan::prelude::*;

/// Simple test bar structure
#[derive(Debug, Clone, Copy)]
struct TestBar {
  o: f64,
  h: f64,
  l: f64,
  c: f64,
}

impl OHLCV for TestBar {
  fn open(&self) -> f64 {
    self.o
  }

  fn high(&self) -> f64 {
    self.h
  }

  fn low(&self) -> f64 {
    self.l
  }

  fn close(&self) -> f64 {
    self.c
  }

  fn volume(&self) -> f64 {
    1000.0
  }
}

/// Generate bars with occasional displacement candles
fn generate_bars(n: usize) -> Vec<TestBar> {
  let mut bars = Vec::with_capacity(n);
  let mut price = 100.0;

  for i in 0..n {
    let change = ((i * 7 + 13) % 100) as f64 / 50.0 - 1.0; // Deterministic "random"
    let thrust = if i % 11 == 0 { 3.0 } else { 0.0 };
    let volatility = 0.5 + ((i * 3) % 10) as f64 / 10.0;

    let o = price;
    let c = price + change + thrust;
    let h = o.max(c) + volatility * 0.5;
    let l = o.min(c) - volatility * 0.5;

    bars.push(TestBar { o, h, l, c });
    price = c;
  }

  bars
}

fn bench_bias(c: &mut Criterion) {
  let bars = generate_bars(1000);

  c.bench_function("estimate_bias_1000_bars", |b| {
    b.iter(|| black_box(estimate_bias(black_box(&bars))))
  });
}

fn bench_gaps_scaling(c: &mut Criterion) {
  let detector = GapDetector::with_defaults();
  let mut group = c.benchmark_group("gap_scaling");

  for size in [100, 1000, 10000].iter() {
    let bars = generate_bars(*size);

    group.bench_with_input(BenchmarkId::new("detect", size), size, |b, _| {
      b.iter(|| black_box(detector.detect(black_box(&bars), Direction::Bullish)))
    });
  }

  group.finish();
}

fn bench_parallel_scan(c: &mut Criterion) {
  let coarse = generate_bars(500);
  let fine: Vec<Vec<TestBar>> = (0..9).map(|_| generate_bars(2000)).collect();
  let symbols = ["AAPL", "MSFT", "NVDA", "AMD", "GOOG", "SPY", "QQQ", "AMZN", "TSLA"];

  let scanner = ScannerBuilder::new().build().unwrap();
  let instruments: Vec<(&str, &[TestBar], &[TestBar])> =
    symbols.iter().zip(&fine).map(|(s, f)| (*s, coarse.as_slice(), f.as_slice())).collect();

  c.bench_function("parallel_scan_9_symbols", |b| {
    b.iter(|| {
      let (results, _) = scan_parallel(black_box(&scanner), black_box(instruments.clone()));
      black_box(scanner.report(&results))
    })
  });
}

criterion_group!(benches, bench_bias, bench_gaps_scaling, bench_parallel_scan);

criterion_main!(benches);
