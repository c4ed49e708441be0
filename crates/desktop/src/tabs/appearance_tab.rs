use iced::widget::{button, checkbox, column, pick_list, row, slider, text, Space};
use iced::{Alignment, Element};

use crate::app::{scaled, Message};
use crate::settings::{Appearance, Settings};

const FONT_SCALE_RANGE: std::ops::RangeInclusive<f32> = 0.8..=1.5;

pub fn view<'a>(settings: &Settings) -> Element<'a, Message> {
    let fs = settings.font_scale;

    let theme_section = section(
        "Theme",
        fs,
        column![
            row![
                text("Mode").size(scaled(13.0, fs)),
                pick_list(Appearance::ALL, Some(settings.appearance), Message::AppearanceChanged)
                    .text_size(scaled(13.0, fs)),
            ]
            .spacing(12)
            .align_y(Alignment::Center),
            checkbox(settings.high_contrast)
                .label("High contrast")
                .on_toggle(Message::HighContrastChanged)
                .text_size(scaled(13.0, fs)),
        ]
        .spacing(12)
        .into(),
    );

    let text_section = section(
        "Text size",
        fs,
        row![
            slider(FONT_SCALE_RANGE, settings.font_scale, Message::FontScaleChanged).step(0.05),
            text(format!("{:.0}%", settings.font_scale * 100.0)).size(scaled(13.0, fs)),
        ]
        .spacing(12)
        .align_y(Alignment::Center)
        .into(),
    );

    let restore = button(text("Restore Defaults").size(scaled(13.0, fs)))
        .padding([8, 16])
        .style(button::secondary);
    let restore = if *settings == Settings::default() {
        restore
    } else {
        restore.on_press(Message::RestoreAppearance)
    };

    column![
        theme_section,
        Space::new().height(20),
        text_section,
        Space::new().height(24),
        restore,
        Space::new().height(8),
        text("Detection settings are not saved and reset on every launch.")
            .size(scaled(11.0, fs)),
    ]
    .into()
}

fn section<'a>(title: &'a str, fs: f32, body: Element<'a, Message>) -> Element<'a, Message> {
    column![text(title).size(scaled(16.0, fs)), Space::new().height(8), body].into()
}
