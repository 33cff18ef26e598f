//! # Audio Capture Module
//!
//! This module handles real-time audio capture using CPAL (Cross-Platform Audio Library).
//! It selects an input configuration, cuts the incoming stream into
//! fixed-size windows and hands them to the tuning loop through a channel.
//!
//! ## Features
//! - Automatic audio device selection
//! - Sample rate chosen as close as the device allows to the configured target
//! - Multi-channel input downmixed to mono
//! - Bounded hand-off that drops frames instead of blocking the callback

use anyhow::{Result, anyhow};
use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::buffer::SignalBuffer;
use crate::config::TunerConfig;
use crate::session::CaptureSource;

/// Starts audio capture from the default input device.
///
/// This function:
/// 1. Selects the default audio input device
/// 2. Picks an f32 configuration, preferring mono, near the target rate
/// 3. Sets up a callback that emits `buffer_size` windows over `sender`
///
/// # Arguments
/// * `sender` - Channel sender for finished windows
/// * `config` - Buffer size and target sample rate
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Running stream handle and its sample rate
/// * `Err(e)` - No usable device or configuration, or the stream failed to start
pub fn start_audio_capture(
    sender: Sender<SignalBuffer>,
    config: &TunerConfig,
) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    log::info!("[AUDIO] Using audio input device: {}", device.name()?);

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, config.target_sample_rate)
        .ok_or_else(|| anyhow!("No suitable f32 input format found"))?;

    let sample_rate = clamp_rate(&supported_config, config.target_sample_rate);
    let stream_config: cpal::StreamConfig = supported_config
        .with_sample_rate(cpal::SampleRate(sample_rate))
        .into();
    let channels = stream_config.channels as usize;

    log::info!(
        "[AUDIO] Selected sample rate: {} Hz, {} channel(s)",
        sample_rate,
        channels
    );

    let err_fn = |err| log::error!("[AUDIO] An error occurred on the audio stream: {}", err);

    let mut framer = Framer::new(config.buffer_size);

    let stream = device.build_input_stream(
        &stream_config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            framer.push_interleaved(data, channels, |frame| {
                // Ignore a full channel: the loop only wants the newest window.
                let _ = sender.try_send(frame);
            });
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok((stream, sample_rate))
}

/// Finds the best supported audio configuration for the target sample rate.
///
/// Only 32-bit float configurations qualify. Among those, mono wins over
/// multi-channel, then the range closest to `target_rate`.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let rate_distance = target_rate.abs_diff(clamp_rate(c, target_rate));
            (c.channels() != 1, rate_distance)
        })
}

fn clamp_rate(config: &SupportedStreamConfigRange, target_rate: u32) -> u32 {
    target_rate.clamp(config.min_sample_rate().0, config.max_sample_rate().0)
}

/// Accumulates callback data into fixed-size mono windows.
struct Framer {
    size: usize,
    pending: Vec<f32>,
}

impl Framer {
    fn new(size: usize) -> Self {
        Self {
            size,
            pending: Vec::with_capacity(size * 2),
        }
    }

    /// Downmixes interleaved `data` and emits every completed window.
    fn push_interleaved(
        &mut self,
        data: &[f32],
        channels: usize,
        mut emit: impl FnMut(SignalBuffer),
    ) {
        let channels = channels.max(1);
        self.pending.extend(
            data.chunks_exact(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32),
        );

        while self.pending.len() >= self.size {
            match SignalBuffer::from_slice(&self.pending[..self.size]) {
                Ok(frame) => emit(frame),
                Err(e) => log::debug!("[AUDIO] Dropping captured window: {}", e),
            }
            self.pending.drain(..self.size);
        }
    }
}

/// A [`CaptureSource`] fed by the audio callback through a channel.
#[derive(Debug)]
pub struct ChannelSource {
    receiver: Receiver<SignalBuffer>,
    sample_rate: u32,
    disconnected: bool,
}

impl ChannelSource {
    pub fn new(receiver: Receiver<SignalBuffer>, sample_rate: u32) -> Self {
        Self {
            receiver,
            sample_rate,
            disconnected: false,
        }
    }

    /// True once the sending side has gone away.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }
}

impl CaptureSource for ChannelSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Drains the channel and keeps only the newest window.
    fn next_buffer(&mut self) -> Option<SignalBuffer> {
        let mut latest = None;
        loop {
            match self.receiver.try_recv() {
                Ok(frame) => latest = Some(frame),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.disconnected {
                        log::warn!("[AUDIO] Capture channel closed");
                        self.disconnected = true;
                    }
                    break;
                }
            }
        }
        latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framer_emits_fixed_windows_and_keeps_remainder() {
        let mut framer = Framer::new(4);
        let mut frames = Vec::new();
        framer.push_interleaved(&[1.0, 2.0, 3.0], 1, |f| frames.push(f));
        assert!(frames.is_empty());
        framer.push_interleaved(&[4.0, 5.0, 6.0, 7.0, 8.0, 9.0], 1, |f| frames.push(f));
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].samples(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(frames[1].samples(), &[5.0, 6.0, 7.0, 8.0]);
        assert_eq!(framer.pending, vec![9.0]);
    }

    #[test]
    fn framer_downmixes_stereo() {
        let mut framer = Framer::new(2);
        let mut frames = Vec::new();
        framer.push_interleaved(&[1.0, 0.0, -1.0, -0.5], 2, |f| frames.push(f));
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].samples(), &[0.5, -0.75]);
    }

    #[test]
    fn framer_drops_windows_with_non_finite_samples() {
        let mut framer = Framer::new(2);
        let mut frames = Vec::new();
        framer.push_interleaved(&[f32::NAN, 0.0, 0.1, 0.2], 1, |f| frames.push(f));
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].samples(), &[0.1, 0.2]);
    }

    #[test]
    fn channel_source_keeps_the_newest_window() {
        let (tx, rx) = crossbeam_channel::bounded(4);
        let mut source = ChannelSource::new(rx, 48_000);
        assert!(source.next_buffer().is_none());

        tx.send(SignalBuffer::new(vec![0.1, 0.1]).unwrap()).unwrap();
        tx.send(SignalBuffer::new(vec![0.2, 0.2]).unwrap()).unwrap();
        let frame = source.next_buffer().unwrap();
        assert_eq!(frame.samples(), &[0.2, 0.2]);
        assert_eq!(source.sample_rate(), 48_000);
        assert!(source.next_buffer().is_none());

        drop(tx);
        assert!(source.next_buffer().is_none());
        assert!(source.is_disconnected());
    }
}
