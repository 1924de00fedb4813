use anyhow::Result;
use ppg_decoder::config::NOMINAL_FRAME_RATE;
use ppg_decoder::data_loading::read_recording;
use ppg_decoder::preprocessing::{mean, std_dev};
use ppg_decoder::RangeStats;
use std::path::Path;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        println!("Usage: {} <recording.json|recording.csv>", args[0]);
        std::process::exit(1);
    }

    let samples = read_recording(Path::new(&args[1]))?;
    println!("\nSamples: {}", samples.len());
    if samples.len() < 2 {
        return Ok(());
    }

    let values: Vec<f32> = samples.iter().map(|s| s.value).collect();
    let range = RangeStats::of(&values);
    println!("Value range: {:.4} - {:.4}", range.min, range.max);
    println!("Value mean: {:.4} (std {:.4})", mean(&values), std_dev(&values));

    // Capture jitter is what the nominal frame rate hides
    let intervals: Vec<f32> = samples
        .windows(2)
        .map(|w| (w[1].timestamp - w[0].timestamp) as f32)
        .collect();
    let mean_interval = mean(&intervals);
    let span_ms = samples[samples.len() - 1].timestamp - samples[0].timestamp;

    println!("Duration: {:.2} s", span_ms as f32 / 1000.0);
    println!(
        "Frame interval: {:.2} ms (std {:.2} ms, min {:.0}, max {:.0})",
        mean_interval,
        std_dev(&intervals),
        intervals.iter().fold(f32::INFINITY, |a, &b| a.min(b)),
        intervals.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b)),
    );
    if mean_interval > 0.0 {
        let effective = 1000.0 / mean_interval;
        println!(
            "Effective frame rate: {:.1} fps (nominal {:.0}, BPM scale factor {:.3})",
            effective,
            NOMINAL_FRAME_RATE,
            effective / NOMINAL_FRAME_RATE
        );
    }

    Ok(())
}
