//! # Cent Meter Widget
//!
//! Draws the tuning indicator: a centre reference line and a marker
//! displaced horizontally in proportion to the detune.
//!
//! ## Features
//! - Marker offset of `detune * px_per_cent` from the centre
//! - Color-coded accuracy zones (green/yellow/red)
//! - Marker hidden until the first pitch is detected

use iced::widget::canvas::{self, Geometry, Path, Stroke};
use iced::widget::container;
use iced::{mouse, Color, Element, Point, Rectangle, Renderer, Size, Theme};

const MARKER_WIDTH: f32 = 5.0;
const MARKER_HEIGHT: f32 = 20.0;
const MARKER_TOP: f32 = 40.0;

/// Cent meter widget for displaying tuning accuracy.
pub struct CentMeter {
    /// Current detune in cents (None if no pitch detected yet)
    cents: Option<i32>,
    px_per_cent: f32,
}

impl CentMeter {
    pub fn new(cents: Option<i32>, px_per_cent: f32) -> Self {
        Self { cents, px_per_cent }
    }

    /// Creates the view element for the cent meter.
    pub fn view(self) -> Element<'static, crate::Message> {
        container(
            canvas::Canvas::new(self)
                .width(iced::Length::Fill)
                .height(iced::Length::Fixed(80.0)),
        )
        .into()
    }
}

/// Horizontal position of the marker's left edge, kept inside the canvas.
fn marker_x(width: f32, cents: i32, px_per_cent: f32) -> f32 {
    let x = width / 2.0 + cents as f32 * px_per_cent;
    x.clamp(0.0, (width - MARKER_WIDTH).max(0.0))
}

fn zone_color(cents: i32) -> Color {
    match cents.unsigned_abs() {
        0..5 => Color::from_rgb8(0x34, 0xDB, 0x98),   // Green
        5..20 => Color::from_rgb8(0xFF, 0xC3, 0x00),  // Yellow
        _ => Color::from_rgb8(0xFF, 0x57, 0x33),      // Red
    }
}

impl<Message> canvas::Program<Message> for CentMeter {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        // Draw meter background
        let background = Path::rectangle(Point::ORIGIN, bounds.size());
        frame.fill(&background, Color::from_rgb8(0x40, 0x40, 0x40));

        // Draw center line
        let center_x = bounds.width / 2.0;
        let center_line = Path::line(
            Point::new(center_x, 0.0),
            Point::new(center_x, bounds.height),
        );
        frame.stroke(
            &center_line,
            Stroke::default().with_width(2.0).with_color(Color::WHITE),
        );

        if let Some(c) = self.cents {
            let x = marker_x(bounds.width, c, self.px_per_cent);
            let top = MARKER_TOP.min((bounds.height - MARKER_HEIGHT).max(0.0));
            let marker = Path::rectangle(Point::new(x, top), Size::new(MARKER_WIDTH, MARKER_HEIGHT));
            frame.fill(&marker, zone_color(c));
        }

        vec![frame.into_geometry()]
    }
}
