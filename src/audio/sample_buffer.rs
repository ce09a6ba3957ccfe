use std::io::Cursor;

use anyhow::Context;
use symphonia::core::audio::SampleBuffer as PcmBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::frame::StereoFrame;

// ten minutes at 48 kHz; anything longer is a broken header, not a drum hit
const MAX_FRAMES: usize = 48_000 * 60 * 10;

#[derive(Clone, Debug, Default)]
pub struct SampleBuffer {
    pub data: Vec<StereoFrame>, // already at the engine's sample rate
}

impl SampleBuffer {
    pub fn from_frames(data: Vec<StereoFrame>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Decode a raw audio payload into stereo frames at `target_rate`.
    ///
    /// RIFF/WAVE payloads go through hound; everything else is probed by
    /// symphonia, with `extension` as a format hint.
    pub fn decode(bytes: &[u8], extension: Option<&str>, target_rate: u32) -> anyhow::Result<Self> {
        let pcm = if is_riff_wave(bytes) {
            decode_wav(bytes)?
        } else {
            decode_compressed(bytes, extension)?
        };

        if pcm.channels == 0 {
            anyhow::bail!("payload reports zero channels");
        }
        if pcm.rate == 0 || target_rate == 0 {
            anyhow::bail!("payload reports a zero sample rate");
        }
        let mut frames = to_frames(&pcm.samples, pcm.channels as usize);
        if frames.is_empty() {
            anyhow::bail!("payload decoded to zero frames");
        }
        if pcm.rate != target_rate {
            frames = resample_linear(&frames, pcm.rate, target_rate)?;
        }
        Ok(Self { data: frames })
    }
}

// interleaved samples straight out of a decoder
struct Pcm {
    samples: Vec<f32>,
    channels: u16,
    rate: u32,
}

fn is_riff_wave(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

fn decode_wav(bytes: &[u8]) -> anyhow::Result<Pcm> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            if !(1..=32).contains(&spec.bits_per_sample) {
                anyhow::bail!("unsupported bit depth {}", spec.bits_per_sample);
            }
            let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|x| x as f32 / max))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    Ok(Pcm {
        samples,
        channels: spec.channels,
        rate: spec.sample_rate,
    })
}

fn decode_compressed(bytes: &[u8], extension: Option<&str>) -> anyhow::Result<Pcm> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .context("unrecognised audio format")?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| anyhow::anyhow!("no default track"))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut rate = codec_params.sample_rate;
    let mut channels = codec_params.channels.map(|c| c.count() as u16);
    let mut decoder = symphonia::default::get_codecs().make(&codec_params, &DecoderOptions::default())?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(_)) => continue, // one bad frame, keep going
            Err(e) => return Err(e.into()),
        };
        let spec = *decoded.spec();
        rate.get_or_insert(spec.rate);
        channels.get_or_insert(spec.channels.count() as u16);

        let mut pcm = PcmBuffer::<f32>::new(decoded.capacity() as u64, spec);
        pcm.copy_interleaved_ref(decoded);
        samples.extend_from_slice(pcm.samples());
    }

    Ok(Pcm {
        samples,
        channels: channels.unwrap_or(2),
        rate: rate.ok_or_else(|| anyhow::anyhow!("stream has no sample rate"))?,
    })
}

fn to_frames(samples: &[f32], channels: usize) -> Vec<StereoFrame> {
    if channels == 1 {
        return samples.iter().map(|&x| StereoFrame::mono(x)).collect();
    }
    // anything wider than stereo keeps its first two channels
    samples
        .chunks_exact(channels)
        .map(|c| StereoFrame { left: c[0], right: c[1] })
        .collect()
}

fn resample_linear(frames: &[StereoFrame], source_rate: u32, target_rate: u32) -> anyhow::Result<Vec<StereoFrame>> {
    let ratio = target_rate as f64 / source_rate as f64;
    let out_len = (frames.len() as f64 * ratio).ceil();
    if !out_len.is_finite() || out_len > MAX_FRAMES as f64 {
        anyhow::bail!("resampled length {out_len} frames is out of range");
    }
    let out_len = out_len as usize;
    let last = frames.last().copied().unwrap_or_default();

    let resampled = (0..out_len)
        .map(|i| {
            let src_pos = i as f64 / ratio;
            let idx = src_pos.floor() as usize;
            if idx + 1 >= frames.len() {
                return last;
            }
            let frac = (src_pos - idx as f64) as f32;
            let (a, b) = (frames[idx], frames[idx + 1]);
            StereoFrame {
                left: a.left * (1.0 - frac) + b.left * frac,
                right: a.right * (1.0 - frac) + b.right * frac,
            }
        })
        .collect();
    Ok(resampled)
}
