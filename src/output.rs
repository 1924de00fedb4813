use crate::{Frame, Sample};
use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone, Utc};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// File name for a buffer export, e.g. `heart_rate_data_2024-11-08_14-30-45.json`.
///
/// `label` tells apart exports written within the same second.
pub fn export_file_name<Tz: TimeZone>(now: &DateTime<Tz>, label: Option<&str>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let stamp = now.format("%Y-%m-%d_%H-%M-%S");
    match label {
        Some(label) => format!("heart_rate_data_{}_{}.json", stamp, label),
        None => format!("heart_rate_data_{}.json", stamp),
    }
}

/// Dump the retained samples as a pretty-printed JSON array of `{ value, time }`.
///
/// Fails rather than overwrite an existing export.
pub fn export_samples_json(
    samples: &[Sample],
    dir: &Path,
    now: &DateTime<Local>,
    label: Option<&str>,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let path = dir.join(export_file_name(now, label));
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, samples)
        .with_context(|| format!("Failed to write samples to {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to write samples to {}", path.display()))?;

    Ok(path)
}

/// Where a recording's frame report goes. A single recording uses `base`
/// as is; otherwise the recording label is appended to its stem.
pub fn report_path(base: &Path, label: Option<&str>) -> PathBuf {
    let Some(label) = label else {
        return base.to_path_buf();
    };
    let dir = base.parent().unwrap_or(Path::new(""));
    let stem = base
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("frames");
    dir.join(format!("{}_{}.csv", stem, label))
}

/// Write one row per replayed frame.
pub fn write_frames_to_csv(path: &Path, frames: &[Frame]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }

    let file = File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);

    writer.write_record([
        "time",
        "value",
        "feedback",
        "bpm",
        "peaks",
        "range_min",
        "range_max",
    ])?;

    for frame in frames {
        let time = DateTime::<Utc>::from_timestamp_millis(frame.sample.timestamp)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
            .unwrap_or_else(|| frame.sample.timestamp.to_string());
        let range = &frame.result.range;
        let (range_min, range_max) = if range.min.is_finite() && range.max.is_finite() {
            (range.min.to_string(), range.max.to_string())
        } else {
            (String::new(), String::new())
        };

        writer.write_record([
            time,
            frame.sample.value.to_string(),
            format!("{:?}", frame.feedback),
            frame
                .result
                .bpm
                .map(|v| format!("{:.2}", v))
                .unwrap_or_default(),
            frame.result.peaks.len().to_string(),
            range_min,
            range_max,
        ])?;
    }

    writer.flush()?;
    Ok(())
}
