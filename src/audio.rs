//! Fire-and-forget playback of short WAV assets.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, bail};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

/// Decoded PCM audio, interleaved and normalized to [-1.0, 1.0].
#[derive(Debug, Clone, PartialEq)]
pub struct WavClip {
    pub channels: u16,
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

struct Format {
    tag: u16,
    channels: u16,
    sample_rate: u32,
    bits: u16,
}

const FORMAT_PCM: u16 = 1;
const FORMAT_FLOAT: u16 = 3;
const FORMAT_EXTENSIBLE: u16 = 0xFFFE;

impl WavClip {
    /// Parses a RIFF/WAVE file by walking its chunks.
    pub fn parse(bytes: &[u8]) -> anyhow::Result<Self> {
        if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
            bail!("not a RIFF/WAVE file");
        }

        let mut format = None;
        let mut data = None;
        let mut offset = 12;
        while offset + 8 <= bytes.len() {
            let id = &bytes[offset..offset + 4];
            let len = u32::from_le_bytes([
                bytes[offset + 4],
                bytes[offset + 5],
                bytes[offset + 6],
                bytes[offset + 7],
            ]) as usize;
            let start = offset + 8;
            let end = start.saturating_add(len).min(bytes.len());
            let body = &bytes[start..end];

            match id {
                b"fmt " => {
                    if body.len() < 16 {
                        bail!("fmt chunk too short");
                    }
                    let mut tag = u16::from_le_bytes([body[0], body[1]]);
                    if tag == FORMAT_EXTENSIBLE && body.len() >= 26 {
                        // First two bytes of the sub-format GUID carry the real tag.
                        tag = u16::from_le_bytes([body[24], body[25]]);
                    }
                    format = Some(Format {
                        tag,
                        channels: u16::from_le_bytes([body[2], body[3]]),
                        sample_rate: u32::from_le_bytes([body[4], body[5], body[6], body[7]]),
                        bits: u16::from_le_bytes([body[14], body[15]]),
                    });
                }
                b"data" => data = Some(body),
                _ => {}
            }

            // Chunks are word aligned.
            offset = start.saturating_add(len + (len & 1));
        }

        let format = format.context("missing fmt chunk")?;
        let data = data.context("missing data chunk")?;
        if format.channels == 0 || format.sample_rate == 0 {
            bail!("invalid channel count or sample rate");
        }

        let samples: Vec<f32> = match (format.tag, format.bits) {
            (FORMAT_PCM, 8) => data.iter().map(|&b| (b as f32 - 128.0) / 128.0).collect(),
            (FORMAT_PCM, 16) => data
                .chunks_exact(2)
                .map(|s| i16::from_le_bytes([s[0], s[1]]) as f32 / 32768.0)
                .collect(),
            (FORMAT_PCM, 24) => data
                .chunks_exact(3)
                .map(|s| {
                    let v = i32::from_le_bytes([0, s[0], s[1], s[2]]) >> 8;
                    v as f32 / 8_388_608.0
                })
                .collect(),
            (FORMAT_PCM, 32) => data
                .chunks_exact(4)
                .map(|s| i32::from_le_bytes([s[0], s[1], s[2], s[3]]) as f32 / 2_147_483_648.0)
                .collect(),
            (FORMAT_FLOAT, 32) => data
                .chunks_exact(4)
                .map(|s| f32::from_le_bytes([s[0], s[1], s[2], s[3]]).clamp(-1.0, 1.0))
                .collect(),
            (tag, bits) => bail!("unsupported WAV encoding (format {tag}, {bits} bits)"),
        };

        Ok(Self {
            channels: format.channels,
            sample_rate: format.sample_rate,
            samples,
        })
    }

    /// Nearest-neighbour conversion to the output device's rate and layout.
    pub fn convert(&self, out_rate: u32, out_channels: u16) -> Vec<f32> {
        let in_channels = self.channels as usize;
        let out_channels = out_channels.max(1) as usize;
        let in_frames = self.samples.len() / in_channels;
        if in_frames == 0 || out_rate == 0 {
            return Vec::new();
        }
        let out_frames = (in_frames as u64 * out_rate as u64 / self.sample_rate as u64) as usize;

        let mut out = Vec::with_capacity(out_frames * out_channels);
        for i in 0..out_frames {
            let src = ((i as u64 * self.sample_rate as u64 / out_rate as u64) as usize)
                .min(in_frames - 1);
            let frame = &self.samples[src * in_channels..(src + 1) * in_channels];
            for c in 0..out_channels {
                out.push(frame[c.min(in_channels - 1)]);
            }
        }
        out
    }
}

/// Owns the output streams for one screen's sounds.
///
/// Streams stay alive until [`AudioSession::release`] or drop.
pub struct AudioSession {
    sounds_dir: PathBuf,
    players: HashMap<String, cpal::Stream>,
}

impl AudioSession {
    pub fn new(sounds_dir: PathBuf) -> Self {
        Self {
            sounds_dir,
            players: HashMap::new(),
        }
    }

    /// Plays `<sounds_dir>/<name>.wav`. Failures are logged, never returned.
    pub fn play(&mut self, name: &str) {
        if let Err(err) = self.try_play(name) {
            tracing::warn!(sound = name, "error playing sound: {err:#}");
        }
    }

    pub fn active(&self) -> usize {
        self.players.len()
    }

    /// Stops every sound started by this session.
    pub fn release(&mut self) {
        if !self.players.is_empty() {
            tracing::debug!(count = self.players.len(), "releasing audio players");
        }
        self.players.clear();
    }

    fn try_play(&mut self, name: &str) -> anyhow::Result<()> {
        let path = self.sounds_dir.join(format!("{name}.wav"));
        if !path.is_file() {
            bail!("sound file {name}.wav not found in {}", self.sounds_dir.display());
        }
        let bytes = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
        let clip = WavClip::parse(&bytes).with_context(|| format!("decoding {}", path.display()))?;

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .context("no audio output device found")?;
        let supported = device
            .default_output_config()
            .context("failed to get audio config")?;
        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels();
        let samples = Arc::new(clip.convert(sample_rate, channels));

        let config: cpal::StreamConfig = supported.config();
        let stream = match supported.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, samples)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, samples)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, samples)?,
            other => bail!("unsupported audio sample format {other:?}"),
        };
        stream.play().context("failed to start audio stream")?;

        // Replacing an entry stops the previous instance of the same sound.
        self.players.insert(name.to_string(), stream);
        Ok(())
    }
}

impl Drop for AudioSession {
    fn drop(&mut self) {
        self.release();
    }
}

fn build_stream<T: cpal::SizedSample + cpal::FromSample<f32>>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    samples: Arc<Vec<f32>>,
) -> anyhow::Result<cpal::Stream> {
    let cursor = AtomicUsize::new(0);
    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let start = cursor.fetch_add(data.len(), Ordering::Relaxed);
                for (i, sample) in data.iter_mut().enumerate() {
                    let v = samples.get(start + i).copied().unwrap_or(0.0);
                    *sample = T::from_sample(v.clamp(-1.0, 0.999_999_9));
                }
            },
            |err| {
                tracing::warn!("audio output error: {err}");
            },
            None,
        )
        .context("failed to build audio stream")?;
    Ok(stream)
}
