use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use rayon::prelude::*;

#[path = "../loader.rs"]
mod loader;
#[path = "../metadata.rs"]
mod metadata;
#[path = "../processing/mod.rs"]
mod processing;
#[path = "../state.rs"]
mod state;

/// Matches the editor's working-copy size.
const PREVIEW_MAX: u32 = 1920;

fn list_photos(dir: &Path, limit: usize) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("read_dir failed for {}", dir.display()))?
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .map(|e| e.to_string_lossy())
                    .is_some_and(|ext| {
                        loader::SUPPORTED_IMAGE_EXTS
                            .iter()
                            .any(|known| ext.eq_ignore_ascii_case(known))
                    })
        })
        .collect();
    files.sort();
    files.truncate(limit);
    Ok(files)
}

fn median_ms(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) * 0.5
    } else {
        sorted[mid]
    }
}

fn build_params() -> state::AdjustmentParameters {
    let mut p = state::AdjustmentParameters::default();
    p.set(state::Adjustment::Brightness, 0.1);
    p.set(state::Adjustment::Contrast, 1.2);
    p.set(state::Adjustment::Saturation, 1.3);
    p.set(state::Adjustment::Blur, 1.5);
    p.set(state::Adjustment::Temperature, 0.4);
    p
}

fn ms_since(t0: Instant) -> f64 {
    t0.elapsed().as_secs_f64() * 1000.0
}

fn main() -> Result<()> {
    let mut args = std::env::args();
    let _bin = args.next();
    let dir = args
        .next()
        .map(PathBuf::from)
        .context("usage: perf_probe <photo-dir> [count]")?;
    let count = args
        .next()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(20);

    let files = list_photos(&dir, count)?;
    if files.is_empty() {
        anyhow::bail!("No photos found in {}", dir.display());
    }
    eprintln!("Using {} photos from {}", files.len(), dir.display());

    let params = build_params();
    let mut decode_samples = Vec::with_capacity(files.len());
    let mut normalize_samples = Vec::with_capacity(files.len());
    let mut temperature_samples = Vec::with_capacity(files.len());
    let mut compose_samples = Vec::with_capacity(files.len());
    for path in &files {
        let t0 = Instant::now();
        let source = loader::open(path)
            .with_context(|| format!("open failed for {}", path.display()))?;
        decode_samples.push(ms_since(t0));

        let t0 = Instant::now();
        let source = processing::orientation::normalize(source);
        normalize_samples.push(ms_since(t0));

        let preview = processing::pipeline::fit_within(&source.pixels, PREVIEW_MAX, PREVIEW_MAX);
        let t0 = Instant::now();
        let warmed = processing::temperature::apply_temperature(
            &preview,
            params.get(state::Adjustment::Temperature),
        );
        temperature_samples.push(ms_since(t0));

        let t0 = Instant::now();
        let composed = processing::pipeline::compose(&warmed, &params);
        let _raw = composed.to_rgba8().into_raw();
        compose_samples.push(ms_since(t0));
    }

    let out_dir = std::env::temp_dir().join(format!(
        "yoi-perf-probe-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    ));
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("create_dir_all {}", out_dir.display()))?;

    let export_start = Instant::now();
    files.par_iter().try_for_each(|path| -> Result<()> {
        let source = processing::orientation::normalize(
            loader::open(path).with_context(|| format!("open failed for {}", path.display()))?,
        );
        let rendered = processing::pipeline::render(&source.pixels, &params);
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("image");
        let output = out_dir.join(format!("{}.jpg", stem));
        let file = fs::File::create(&output)
            .with_context(|| format!("create output failed {}", output.display()))?;
        let encoder = JpegEncoder::new_with_quality(BufWriter::new(file), 92);
        image::DynamicImage::ImageRgb8(rendered.to_rgb8())
            .write_with_encoder(encoder)
            .with_context(|| format!("jpeg encode failed {}", output.display()))?;
        Ok(())
    })?;
    let export_wall_s = export_start.elapsed().as_secs_f64();
    let images_per_sec = files.len() as f64 / export_wall_s.max(1e-9);

    println!("METRIC file_count={}", files.len());
    println!("METRIC decode_ms_median={:.2}", median_ms(&decode_samples));
    println!("METRIC normalize_ms_median={:.2}", median_ms(&normalize_samples));
    println!(
        "METRIC temperature_ms_median={:.2}",
        median_ms(&temperature_samples)
    );
    println!("METRIC compose_ms_median={:.2}", median_ms(&compose_samples));
    println!("METRIC export_wall_s={:.2}", export_wall_s);
    println!("METRIC export_images_per_sec={:.3}", images_per_sec);
    println!("METRIC export_out_dir={}", out_dir.display());

    Ok(())
}
