//! # Main Display Module
//!
//! This module contains the main display components and layout logic
//! for the tuner application.

use iced::widget::{button, column, container, row, text, Space};
use iced::{Alignment, Element, Length};
use tuner_core::{tuning, TuningMode};

use super::cent_meter;
use crate::{AppDisplayData, CaptureStatus, Message};

const ACCESS_DENIED: &str = "Microphone access denied. Please allow microphone access.";

/// Creates the complete main application view
pub fn create_main_view(data: &AppDisplayData) -> Element<'static, Message> {
    let title = text("Tuner").size(28);

    let body = match &data.status {
        CaptureStatus::Idle => create_start_panel(None),
        CaptureStatus::Starting => text("Starting microphone...").size(18).into(),
        CaptureStatus::Failed(reason) => create_start_panel(Some(reason)),
        CaptureStatus::Running { .. } => create_tuner_panel(data),
    };

    let main_content = column![title, Space::with_height(20), body]
        .width(Length::Fill)
        .align_x(Alignment::Center)
        .padding(20);

    container(main_content)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .into()
}

/// Start button, with the failure message above it after a failed start.
fn create_start_panel(failure: Option<&String>) -> Element<'static, Message> {
    let mut panel = column![].spacing(10).align_x(Alignment::Center);

    if let Some(reason) = failure {
        panel = panel
            .push(text(ACCESS_DENIED).size(18))
            .push(text(reason.clone()).size(12));
    }

    panel
        .push(
            button(text("Start tuning").size(18))
                .padding([12, 20])
                .on_press(Message::StartTuning),
        )
        .into()
}

/// Note, frequency, detune and the indicator, followed by the note selector.
fn create_tuner_panel(data: &AppDisplayData) -> Element<'static, Message> {
    let (note_name, freq_text, detune_text, cents) = match &data.last_result {
        Some(result) => (
            result.note.name.to_string(),
            result.frequency_label(),
            result.detune_label(),
            Some(result.detune_cents),
        ),
        None => (
            "--".to_string(),
            "Frequency: -- Hz".to_string(),
            "Detune: -- cents".to_string(),
            None,
        ),
    };

    let readout = column![
        text(note_name).size(64),
        text(freq_text).size(20),
        text(detune_text).size(20),
    ]
    .spacing(5)
    .align_x(Alignment::Center);

    column![
        readout,
        Space::with_height(10),
        cent_meter::CentMeter::new(cents, data.px_per_cent).view(),
        Space::with_height(10),
        create_note_selector(data),
    ]
    .spacing(5)
    .align_x(Alignment::Center)
    .into()
}

/// Row of note buttons; the manually selected note is highlighted.
fn create_note_selector(data: &AppDisplayData) -> Element<'static, Message> {
    let selected = match data.tuning_mode {
        TuningMode::Manual(note) => Some(note.name),
        TuningMode::Auto => None,
    };

    let buttons = tuning::NOTE_TABLE
        .iter()
        .enumerate()
        .fold(row![].spacing(4), |row, (index, note)| {
            let mut key = button(text(note.name).size(14)).padding([6, 10]);
            if selected == Some(note.name) {
                key = key.style(|_theme, _status| button::Style {
                    background: Some(iced::Background::Color(iced::Color::from_rgb(0.8, 0.2, 0.2))),
                    text_color: iced::Color::WHITE,
                    ..button::Style::default()
                });
            }
            row.push(key.on_press(Message::NoteSelected(index)))
        });

    let label = match selected {
        Some(name) => format!("Target: {} (press again for auto)", name),
        None => "Target: auto".to_string(),
    };

    column![text(label).size(14), buttons]
        .spacing(8)
        .align_x(Alignment::Center)
        .into()
}
