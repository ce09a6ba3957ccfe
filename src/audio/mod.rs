use anyhow::Context;
use crossbeam_channel::{Receiver, Sender};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::audio_api::AudioCommand;
use crate::error::PlaybackError;

mod click;
mod engine;
mod frame;
mod sample_buffer;
mod synth;
mod unit_id;
mod voice;

pub use click::generate_click;
pub use frame::StereoFrame;
pub use sample_buffer::SampleBuffer;
pub use unit_id::{next_unit_id, UnitId};

use engine::Engine;

/// Controller-side handle to the output stream. Dropping it stops audio.
pub struct AudioHandle {
    tx: Sender<AudioCommand>,
    errors_rx: Receiver<PlaybackError>,
    sample_rate: u32,
    _output_stream: cpal::Stream,
}

impl AudioHandle {
    pub fn send(&self, cmd: AudioCommand) {
        if self.tx.try_send(cmd).is_err() {
            log::warn!(target: "audio", "command queue full, dropping command");
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    // trigger failures reported back by the callback since the last poll
    pub fn poll_errors(&self) -> Vec<PlaybackError> {
        self.errors_rx.try_iter().collect()
    }
}

pub fn start_audio() -> anyhow::Result<AudioHandle> {
    let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(1024);
    let (errors_tx, errors_rx) = crossbeam_channel::bounded::<PlaybackError>(256);

    let host = cpal::default_host();
    let device = host.default_output_device().context("no default output device")?;
    let config = device.default_output_config().context("no default output config")?;

    let sample_rate = config.sample_rate();
    let channels = config.channels() as usize;

    match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let stream = build_output_stream_f32(&device, &config.into(), rx, errors_tx, sample_rate, channels)?;
            stream.play().context("failed to play output stream")?;
            log::info!(target: "audio", "output stream running at {sample_rate} Hz, {channels} channels");

            Ok(AudioHandle {
                tx,
                errors_rx,
                sample_rate,
                _output_stream: stream,
            })
        }
        other => anyhow::bail!("unsupported sample format {other:?} (only f32 supported)"),
    }
}

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<AudioCommand>,
    errors_tx: Sender<PlaybackError>,
    sample_rate: u32,
    channels: usize,
) -> anyhow::Result<cpal::Stream> {
    let mut engine = Engine::new(sample_rate);
    let mut block: Vec<StereoFrame> = Vec::with_capacity(4096);

    let err_fn = |err| log::error!(target: "audio", "output stream error: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _info| {
            while let Ok(cmd) = rx.try_recv() {
                if let Err(e) = engine.handle_cmd(cmd) {
                    let _ = errors_tx.try_send(e);
                }
            }

            let n_frames = data.len() / channels.max(1);
            block.resize(n_frames, StereoFrame::zero());
            engine.render_block(&mut block);

            // master sink: fan stereo out to whatever the device has
            for (out, frame) in data.chunks_exact_mut(channels.max(1)).zip(&block) {
                match out {
                    [mono] => *mono = 0.5 * (frame.left + frame.right),
                    [l, r, rest @ ..] => {
                        *l = frame.left;
                        *r = frame.right;
                        rest.fill(0.0);
                    }
                    [] => {}
                }
            }
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}
