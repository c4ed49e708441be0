use iced::border::Border;
use iced::widget::{column, container, text};
use iced::{Color, Element, Font, Length, Theme};

use facecam_core::detection::domain::face_analysis::FaceAnalysis;

use crate::app::scaled;
use crate::theme::{muted_color, surface_color};

const CORNER_RADIUS: f32 = 10.0;
const BORDER_WIDTH: f32 = 1.0;
pub const CARD_WIDTH: f32 = 180.0;

/// One result card: face number, age, gender, confidence.
pub fn view<'a, Message: 'a>(
    index: usize,
    face: &FaceAnalysis,
    fs: f32,
    theme: &Theme,
) -> Element<'a, Message> {
    let muted = muted_color(theme);
    let surface = surface_color(theme);
    let accent = theme.extended_palette().primary.base.color;

    let content = column![
        text(format!("Face {}", index + 1))
            .size(scaled(14.0, fs))
            .color(accent)
            .font(Font {
                weight: iced::font::Weight::Semibold,
                ..Font::DEFAULT
            }),
        text(format!("Age: {} years", face.rounded_age())).size(scaled(13.0, fs)),
        text(format!("Gender: {}", face.gender)).size(scaled(13.0, fs)),
        text(format!("Confidence: {}%", face.confidence_percent()))
            .size(scaled(12.0, fs))
            .color(muted),
    ]
    .spacing(4);

    container(content)
        .padding([12, 14])
        .width(Length::Fixed(CARD_WIDTH))
        .style(move |theme: &Theme| container::Style {
            background: Some(surface.into()),
            border: Border {
                color: Color {
                    a: 0.15,
                    ..theme.palette().text
                },
                width: BORDER_WIDTH,
                radius: CORNER_RADIUS.into(),
            },
            ..container::Style::default()
        })
        .into()
}
