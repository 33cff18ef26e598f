//! # Tuner - Chromatic Tuner GUI
//!
//! This module contains the main GUI application for the tuner.
//! It starts microphone capture on request, drives the tuning loop from a
//! timer and renders the detected note, frequency and detune.
//!
//! ## Architecture
//! - **Main Thread**: Iced GUI application; runs one tuning tick per timer event
//! - **Audio Thread**: Owns the CPAL stream for the lifetime of the session
//! - **Communication**: Crossbeam channels carry windows, status events and shutdown
//! - **Updates**: ~60 FPS ticks via the subscription system

mod ui;

use cpal::traits::StreamTrait;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use iced::{Element, Subscription, Theme};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tuner_core::{
    PitchEstimator, PresentationSink, Session, TickOutcome, TunerConfig, TuningMode,
    TuningResult,
    audio::{self, ChannelSource},
    tuning,
};
use ui::main_display::create_main_view;

/// Main entry point for the tuner application.
///
/// Initializes logging (controlled by `RUST_LOG`) and the Iced GUI
/// application with the dark theme.
pub fn main() -> iced::Result {
    env_logger::init();
    log::info!("[MAIN] Starting tuner application...");
    let result = iced::application("Tuner", TunerApp::update, TunerApp::view)
        .subscription(TunerApp::subscription)
        .theme(TunerApp::theme)
        .run();
    log::info!("[MAIN] Application finished with result: {:?}", result);
    result
}

/// Application message types for the Iced GUI framework.
#[derive(Debug, Clone)]
pub enum Message {
    StartTuning,          // Start button pressed
    NoteSelected(usize),  // Note button pressed (index into the note table)
    Tick,                 // Timer tick for the tuning loop
}

/// Lifecycle of the microphone capture.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CaptureStatus {
    #[default]
    Idle,
    Starting,
    Running { sample_rate: u32 },
    Failed(String),
}

/// UI-specific data needed for rendering the interface.
///
/// Acts as the presentation sink of the tuning loop, so the last result
/// stays on screen while ticks produce no pitch.
#[derive(Debug, Clone)]
pub struct AppDisplayData {
    pub status: CaptureStatus,
    pub last_result: Option<TuningResult>,
    pub tuning_mode: TuningMode,
    pub px_per_cent: f32,
}

impl PresentationSink for AppDisplayData {
    fn present(&mut self, result: &TuningResult) {
        self.last_result = Some(*result);
    }
}

/// Status reported by the audio thread once capture is set up.
#[derive(Debug)]
enum AudioEvent {
    Started { sample_rate: u32 },
    Failed(String),
}

/// Audio thread management structure.
///
/// Dropping the worker signals the thread to stop the stream and waits
/// for it to finish.
#[derive(Debug)]
struct AudioWorker {
    shutdown_tx: Sender<()>,
    thread_handle: Option<JoinHandle<()>>,
}

impl Drop for AudioWorker {
    fn drop(&mut self) {
        log::info!("[MAIN] Shutting down audio worker...");
        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                log::error!("[MAIN] Audio thread panicked during shutdown");
            }
        }
    }
}

/// Main application state for the tuner.
#[derive(Debug)]
struct TunerApp {
    config: TunerConfig,
    audio_worker: Option<AudioWorker>,
    audio_events: Option<Receiver<AudioEvent>>,
    // Held until the audio thread reports its sample rate.
    pending_frames: Option<Receiver<tuner_core::SignalBuffer>>,
    session: Option<Session<ChannelSource>>,

    // Single source of truth for all display data
    display_data: AppDisplayData,
}

impl Default for TunerApp {
    fn default() -> Self {
        let config = TunerConfig::load();
        if let Err(e) = config.validate() {
            log::warn!("[MAIN] Configuration problem: {}", e);
        }
        let px_per_cent = config.indicator_px_per_cent;
        Self {
            config,
            audio_worker: None,
            audio_events: None,
            pending_frames: None,
            session: None,
            display_data: AppDisplayData {
                status: CaptureStatus::Idle,
                last_result: None,
                tuning_mode: TuningMode::Auto,
                px_per_cent,
            },
        }
    }
}

impl TunerApp {
    /// Starts the dedicated audio thread.
    ///
    /// The thread opens the input stream, reports the outcome over
    /// `audio_events`, then parks on the shutdown channel while the
    /// stream pushes windows to the GUI thread.
    fn start_audio_processing(&mut self) {
        let (frame_tx, frame_rx) = crossbeam_channel::bounded(self.config.capture_queue);
        let (event_tx, event_rx) = crossbeam_channel::bounded(1);
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);
        let config = self.config.clone();

        let thread_handle = thread::spawn(move || {
            log::info!("[AUDIO-THREAD] Attempting to start audio capture...");
            let stream = match audio::start_audio_capture(frame_tx, &config) {
                Ok((stream, sample_rate)) => {
                    log::info!("[AUDIO-THREAD] Audio capture started at {} Hz", sample_rate);
                    let _ = event_tx.send(AudioEvent::Started { sample_rate });
                    stream
                }
                Err(e) => {
                    log::error!("[AUDIO-THREAD] Error starting audio: {:#}", e);
                    let _ = event_tx.send(AudioEvent::Failed(format!("{:#}", e)));
                    return;
                }
            };

            // Either a shutdown signal or a dropped sender ends the session.
            let _ = shutdown_rx.recv();

            log::info!("[AUDIO-THREAD] Stopping stream and exiting...");
            if let Err(e) = stream.pause() {
                log::warn!("[AUDIO-THREAD] Error pausing stream: {}", e);
            }
            drop(stream);
        });

        self.audio_worker = Some(AudioWorker {
            shutdown_tx,
            thread_handle: Some(thread_handle),
        });
        self.audio_events = Some(event_rx);
        self.pending_frames = Some(frame_rx);
        self.display_data.status = CaptureStatus::Starting;
    }

    /// Consumes the audio thread's startup report, if one has arrived.
    fn poll_audio_events(&mut self) {
        let Some(events) = &self.audio_events else {
            return;
        };
        let event = match events.try_recv() {
            Ok(event) => event,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                AudioEvent::Failed("Audio thread exited before capture started".to_string())
            }
        };
        self.audio_events = None;

        match event {
            AudioEvent::Started { sample_rate } => {
                if let Some(frames) = self.pending_frames.take() {
                    let mut session = Session::new(
                        ChannelSource::new(frames, sample_rate),
                        PitchEstimator::from_config(&self.config),
                    );
                    session.set_mode(self.display_data.tuning_mode);
                    self.session = Some(session);
                }
                self.display_data.status = CaptureStatus::Running { sample_rate };
            }
            AudioEvent::Failed(reason) => {
                self.pending_frames = None;
                self.audio_worker = None;
                self.display_data.status = CaptureStatus::Failed(reason);
            }
        }
    }

    fn select_note(&mut self, index: usize) {
        let Some(note) = tuning::NOTE_TABLE.get(index) else {
            return;
        };
        // Selecting the active note again returns to automatic detection.
        let mode = match self.display_data.tuning_mode {
            TuningMode::Manual(current) if std::ptr::eq(current, note) => TuningMode::Auto,
            _ => TuningMode::Manual(note),
        };
        log::info!("[MAIN] Tuning mode: {:?}", mode);
        self.display_data.tuning_mode = mode;
        if let Some(session) = self.session.as_mut() {
            session.set_mode(mode);
        }
    }

    /// Handles application state updates based on incoming messages.
    fn update(&mut self, message: Message) {
        match message {
            Message::StartTuning => {
                if matches!(
                    self.display_data.status,
                    CaptureStatus::Idle | CaptureStatus::Failed(_)
                ) {
                    log::info!("[MAIN] Starting audio processing...");
                    self.start_audio_processing();
                }
            }
            Message::NoteSelected(index) => self.select_note(index),
            Message::Tick => {
                self.poll_audio_events();

                if let Some(session) = self.session.as_mut() {
                    if let TickOutcome::NoBuffer = session.tick(&mut self.display_data) {
                        if session.source().is_disconnected() {
                            log::error!("[MAIN] Audio stream stopped delivering samples");
                            self.session = None;
                            self.audio_worker = None;
                            self.display_data.status =
                                CaptureStatus::Failed("Audio stream stopped".to_string());
                        }
                    }
                }
            }
        }
    }

    /// Renders the main application interface.
    fn view(&self) -> Element<'_, Message> {
        create_main_view(&self.display_data)
    }

    /// Creates the timer subscription that drives the tuning loop.
    fn subscription(&self) -> Subscription<Message> {
        iced::time::every(Duration::from_millis(self.config.tick_interval_ms))
            .map(|_| Message::Tick)
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}
