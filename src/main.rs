use anyhow::{bail, Result};
use chrono::Local;
use clap::Parser;
use log::{debug, warn};
use ppg_decoder::config::Args;
use ppg_decoder::data_loading::{find_recordings, read_recording, recording_label, skip_start_delay};
use ppg_decoder::output::{export_samples_json, report_path, write_frames_to_csv};
use ppg_decoder::pipeline::{LogObserver, PipelineState};
use ppg_decoder::placement::FeedbackState;
use ppg_decoder::Frame;
use std::collections::HashMap;
use std::path::Path;

fn replay_recording(path: &Path, label: Option<&str>, args: &Args) -> Result<Vec<Frame>> {
    println!("Loading recording: {}", path.display());
    let samples = read_recording(path)?;
    let samples = skip_start_delay(&samples, args.start_delay_ms);
    println!("  {} samples after start delay", samples.len());

    let mut state = PipelineState::new(args.pipeline_config());
    let mut observer = LogObserver::default();
    let frames: Vec<Frame> = samples
        .iter()
        .map(|&sample| state.tick(sample, &mut observer))
        .collect();

    if let Some(dir) = &args.export_dir {
        let exported = export_samples_json(&state.samples().to_vec(), dir, &Local::now(), label)?;
        println!("  Exported sample buffer to {}", exported.display());
    }

    Ok(frames)
}

fn summarize_frames(frames: &[Frame]) {
    if frames.is_empty() {
        println!("  No frames to summarize");
        return;
    }

    let estimates: Vec<f32> = frames.iter().filter_map(|f| f.result.bpm).collect();
    println!(
        "  Frames with a heart rate: {}/{}",
        estimates.len(),
        frames.len()
    );

    if let Some(last) = frames.iter().rev().find_map(|f| f.result.bpm) {
        println!("  Last displayed heart rate: {} BPM", last.round());
        let mean = estimates.iter().sum::<f32>() / estimates.len() as f32;
        println!("  Mean over frames: {:.1} BPM", mean);
    } else {
        println!("  No heart rate detected");
    }

    let mut feedback_counts: HashMap<FeedbackState, usize> = HashMap::new();
    for frame in frames {
        *feedback_counts.entry(frame.feedback).or_insert(0) += 1;
    }

    println!("\n  Finger placement:");
    for state in [
        FeedbackState::Good,
        FeedbackState::Unstable,
        FeedbackState::TooLight,
        FeedbackState::TooDark,
    ] {
        let count = feedback_counts.get(&state).copied().unwrap_or(0);
        let share = count as f32 / frames.len() as f32 * 100.0;
        println!("    {:?}: {} frames ({:.0}%)", state, count, share);
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    debug!("{:?}", args);

    let recordings = if args.input_path.is_dir() {
        find_recordings(&args.input_path)?
    } else {
        vec![args.input_path.clone()]
    };

    if recordings.is_empty() {
        bail!("No recordings found in {}", args.input_path.display());
    }

    let multiple = recordings.len() > 1;
    for path in &recordings {
        // Directory replays name their outputs after each recording
        let label = multiple.then(|| recording_label(&args.input_path, path));
        let frames = match replay_recording(path, label.as_deref(), &args) {
            Ok(frames) => frames,
            Err(e) if multiple => {
                warn!("Skipping {}: {:#}", path.display(), e);
                continue;
            }
            Err(e) => return Err(e),
        };

        println!("\nResults for {}:", path.display());
        summarize_frames(&frames);

        if let Some(base) = &args.csv_output {
            let report = report_path(base, label.as_deref());
            println!("Writing results to {}", report.display());
            write_frames_to_csv(&report, &frames)?;
        }
    }

    Ok(())
}
