use crate::Sample;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Average brightness of an RGBA pixel buffer, scaled to 0..1.
///
/// Only the red and green channels are summed; that pair gives the strongest
/// pulse signal with the torch on.
pub fn average_brightness(pixels: &[u8]) -> f32 {
    if pixels.len() < 4 {
        return 0.0;
    }

    let sum: u64 = pixels
        .chunks_exact(4)
        .map(|px| px[0] as u64 + px[1] as u64)
        .sum();

    // Two of every four bytes contribute
    let avg = sum as f32 / (pixels.len() as f32 * 0.5);
    avg / 255.0
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    value: f32,
    time: i64,
}

/// Read a JSON export: an array of `{ "value": .., "time": .. }` records.
pub fn read_json_recording(path: &Path) -> Result<Vec<Sample>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    let mut samples: Vec<Sample> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse JSON recording: {}", path.display()))?;

    sort_chronologically(&mut samples);
    Ok(samples)
}

/// Read a CSV recording with `value` and `time` header columns.
pub fn read_csv_recording(path: &Path) -> Result<Vec<Sample>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);
    let mut samples = Vec::new();

    for (row, result) in rdr.deserialize::<CsvRow>().enumerate() {
        let record = result.with_context(|| {
            format!("Failed to parse row {} of {}", row + 1, path.display())
        })?;
        samples.push(Sample::new(record.value, record.time));
    }

    sort_chronologically(&mut samples);
    Ok(samples)
}

/// Load a recording, picking the format from the file extension.
pub fn read_recording(path: &Path) -> Result<Vec<Sample>> {
    match extension(path).as_deref() {
        Some("json") => read_json_recording(path),
        Some("csv") => read_csv_recording(path),
        _ => bail!("Unsupported recording format: {}", path.display()),
    }
}

/// All `.json`/`.csv` files below `dir`, sorted by path.
pub fn find_recordings(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
        let path = entry.path();
        if entry.file_type().is_file() && matches!(extension(path).as_deref(), Some("json" | "csv"))
        {
            paths.push(path.to_path_buf());
        }
    }
    paths.sort();
    Ok(paths)
}

/// Name for a recording found under `root`, unique among its siblings:
/// `morning/x.csv` becomes `morning_x_csv`.
pub fn recording_label(root: &Path, recording: &Path) -> String {
    let relative = recording.strip_prefix(root).unwrap_or(recording);
    let label = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("_")
        .replace('.', "_");

    if label.is_empty() {
        "recording".to_string()
    } else {
        label
    }
}

/// Drop samples captured before the camera image has settled.
pub fn skip_start_delay(samples: &[Sample], delay_ms: i64) -> &[Sample] {
    let Some(first) = samples.first() else {
        return samples;
    };
    let start = samples
        .iter()
        .position(|s| s.timestamp - first.timestamp >= delay_ms)
        .unwrap_or(samples.len());
    &samples[start..]
}

fn sort_chronologically(samples: &mut [Sample]) {
    // Stable, so equal timestamps keep file order
    samples.sort_by_key(|s| s.timestamp);
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
}
