//! Performance benchmark for smoothing and phenology extraction
//!
//! Run with: cargo bench --bench phenology_perf

use anofox_pheno_core::{
    daily_series, extract_phenology, savgol_filter, smooth, DailyObservation, NaturalCubicSpline,
    PhenologyOptions, SmoothingMode, SplineSmoother,
};
use chrono::NaiveDate;
use std::time::{Duration, Instant};

/// Yearly green-up/senescence cycle with some deterministic noise and an
/// occasional cloudy (missing) day.
fn generate_ndvi_series(years: usize) -> Vec<DailyObservation> {
    let start = NaiveDate::from_ymd_opt(2001, 1, 1).unwrap();
    let n: usize = (0..years)
        .map(|y| anofox_pheno_core::days_in_year(2001 + y as i32))
        .sum();
    let values: Vec<Option<f64>> = (0..n)
        .map(|i| {
            if i % 17 == 0 {
                return None;
            }
            let phase = 2.0 * std::f64::consts::PI * (i as f64 - 90.0) / 365.25;
            Some(0.45 + 0.3 * phase.sin() + (i % 5) as f64 * 0.01)
        })
        .collect();
    daily_series(start, &values)
}

fn benchmark_fn<F, R>(name: &str, iterations: usize, mut f: F) -> Duration
where
    F: FnMut() -> R,
{
    // Warmup
    let _ = f();

    let start = Instant::now();
    for _ in 0..iterations {
        let _ = std::hint::black_box(f());
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "{}: total={:?}, per_iter={:?}, iters={}",
        name, elapsed, per_iter, iterations
    );
    elapsed
}

fn main() {
    println!("=== Phenology Performance Benchmark ===\n");

    let year_counts = [1, 5, 10, 20];

    println!("--- 1. Spline Fit Benchmarks ---\n");

    for &knots in &[8, 10, 15] {
        let values: Vec<f64> = (0..405).map(|i| (i as f64 / 60.0).sin()).collect();
        benchmark_fn(&format!("spline_fit(n=405, knots={})", knots), 200, || {
            NaturalCubicSpline.fit(&values, knots)
        });
    }

    println!("\n--- 2. Savitzky-Golay Benchmarks ---\n");

    let year: Vec<f64> = (0..365).map(|i| (i as f64 / 58.0).sin()).collect();
    for &window in &[101, 201] {
        benchmark_fn(&format!("savgol_filter(n=365, window={})", window), 200, || {
            savgol_filter(&year, window, 3)
        });
    }

    println!("\n--- 3. Smoothing Benchmarks ---\n");

    for &years in &year_counts {
        let series = generate_ndvi_series(years);
        let iters = if years <= 5 { 50 } else { 10 };

        for mode in [SmoothingMode::Integral, SmoothingMode::Direct] {
            benchmark_fn(
                &format!("smooth(years={}, mode={})", years, mode.as_str()),
                iters,
                || smooth(&series, mode, 10),
            );
        }
    }

    println!("\n--- 4. Extraction Benchmarks ---\n");

    for &years in &year_counts {
        let series = generate_ndvi_series(years);
        let iters = if years <= 5 { 50 } else { 10 };

        benchmark_fn(&format!("extract_phenology(years={})", years), iters, || {
            extract_phenology(&series, &PhenologyOptions::default())
        });
    }

    println!("\n--- 5. Scalability Test (many pixels) ---\n");

    // One series per pixel, as in a raster batch
    let pixel_counts = [10, 100, 1000];
    let series = generate_ndvi_series(3);

    for &n_pixels in &pixel_counts {
        benchmark_fn(&format!("  extract_phenology x{}", n_pixels), 1, || {
            (0..n_pixels)
                .map(|_| extract_phenology(&series, &PhenologyOptions::default()))
                .collect::<Vec<_>>()
        });
    }

    println!("\n=== Benchmark Complete ===");
}
