use iced::border::Border;
use iced::widget::{canvas, column, container, image, row, slider, stack, text, Space};
use iced::{Color, ContentFit, Element, Font, Length, Theme};

use facecam_core::session::app_mode::AppMode;
use facecam_core::shared::constants::{CONFIDENCE_STEP, MAX_CONFIDENCE, MIN_CONFIDENCE};

use crate::app::{scaled, App, ButtonId, Message};
use crate::theme::{muted_color, surface_color, tertiary_color};
use crate::widgets::action_button::{action_button, ButtonKind};
use crate::widgets::detection_card;
use crate::widgets::overlay_canvas::OverlayCanvas;

const VIDEO_HEIGHT: f32 = 400.0;
const SNAPSHOT_HEIGHT: f32 = 240.0;

pub fn view<'a>(app: &'a App, theme: &Theme) -> Element<'a, Message> {
    let fs = app.font_scale();
    let session = &app.session;

    let mut col = column![header(fs, theme), Space::new().height(16), controls(app)]
        .spacing(0)
        .width(Length::Fill);

    if session.settings_open() && session.mode().camera_on() {
        col = col
            .push(Space::new().height(12))
            .push(settings_panel(session.confidence(), fs, theme));
    }

    if let Some(error) = session.error() {
        col = col
            .push(Space::new().height(12))
            .push(error_banner(error, fs, theme));
    }

    if session.mode() == AppMode::Loading {
        col = col
            .push(Space::new().height(12))
            .push(loading(app.load_status.as_deref(), fs, theme));
    }

    col = col
        .push(Space::new().height(16))
        .push(camera_view(app, fs, theme));

    if let Some(handle) = &app.snapshot {
        col = col
            .push(Space::new().height(20))
            .push(captured_image(app, handle.clone(), fs, theme));
    }

    if !session.detections().is_empty() {
        col = col
            .push(Space::new().height(20))
            .push(results(app, fs, theme));
    }

    col.into()
}

fn header<'a>(fs: f32, theme: &Theme) -> Element<'a, Message> {
    column![
        text("\u{1F916} AI Face Detector")
            .size(scaled(24.0, fs))
            .font(Font {
                weight: iced::font::Weight::Bold,
                ..Font::DEFAULT
            }),
        text("Real-time face detection, age estimation, and gender recognition")
            .size(scaled(13.0, fs))
            .color(muted_color(theme)),
    ]
    .spacing(4)
    .align_x(iced::Alignment::Center)
    .width(Length::Fill)
    .into()
}

fn controls(app: &App) -> Element<'_, Message> {
    let fs = app.font_scale();
    let mode = app.session.mode();
    let size = scaled(14.0, fs);
    let button = |label: &str, kind: ButtonKind, id: ButtonId, on_press: Option<Message>| {
        action_button(
            label.to_string(),
            size,
            kind,
            on_press,
            app.hovered == Some(id),
            move |hovered| Message::ButtonHover(id, hovered),
        )
    };

    let (label, kind) = if mode.camera_on() {
        ("Stop Camera", ButtonKind::Danger)
    } else {
        ("Start Camera", ButtonKind::Primary)
    };
    let toggle = mode.is_ready().then_some(Message::ToggleCamera);

    let mut buttons = row![button(label, kind, ButtonId::Camera, toggle)]
        .spacing(10)
        .align_y(iced::Alignment::Center);

    if mode.camera_on() {
        buttons = buttons
            .push(button(
                "\u{1F4F8} Capture",
                ButtonKind::Success,
                ButtonId::Capture,
                app.video.as_ref().map(|_| Message::Capture),
            ))
            .push(button(
                "Reset",
                ButtonKind::Neutral,
                ButtonId::Reset,
                Some(Message::Reset),
            ))
            .push(button(
                "Settings",
                ButtonKind::Neutral,
                ButtonId::Settings,
                Some(Message::ToggleSettings),
            ));
    }

    container(buttons).width(Length::Fill).center_x(Length::Fill).into()
}

fn settings_panel<'a>(confidence: f32, fs: f32, theme: &Theme) -> Element<'a, Message> {
    let percent = (confidence * 100.0).round() as u32;
    let content = column![
        text("Detection Settings").size(scaled(15.0, fs)),
        Space::new().height(8),
        text(format!("Confidence Threshold: {percent}%")).size(scaled(13.0, fs)),
        Space::new().height(6),
        slider(
            MIN_CONFIDENCE..=MAX_CONFIDENCE,
            confidence,
            Message::ConfidenceChanged
        )
        .step(CONFIDENCE_STEP),
    ];
    panel(content.into(), theme)
}

fn error_banner<'a>(error: &str, fs: f32, theme: &Theme) -> Element<'a, Message> {
    let danger = theme.palette().danger;
    container(text(format!("\u{26A0}\u{FE0F} {error}")).size(scaled(13.0, fs)).color(danger))
        .padding([10, 14])
        .width(Length::Fill)
        .style(move |_theme: &Theme| container::Style {
            background: Some(Color { a: 0.12, ..danger }.into()),
            border: Border {
                color: Color { a: 0.4, ..danger },
                width: 1.0,
                radius: 8.0.into(),
            },
            ..container::Style::default()
        })
        .into()
}

fn loading<'a>(status: Option<&str>, fs: f32, theme: &Theme) -> Element<'a, Message> {
    let tertiary = tertiary_color(theme);
    let mut col = column![text("\u{23F3} Loading AI models...").size(scaled(15.0, fs))]
        .spacing(6)
        .align_x(iced::Alignment::Center)
        .width(Length::Fill);
    if let Some(status) = status {
        col = col.push(text(status.to_owned()).size(scaled(12.0, fs)).color(tertiary));
    }
    container(col).width(Length::Fill).padding([12, 0]).into()
}

fn camera_view<'a>(app: &'a App, fs: f32, theme: &Theme) -> Element<'a, Message> {
    let session = &app.session;
    let tertiary = tertiary_color(theme);

    let Some(video) = app.video.as_ref().filter(|_| session.mode().camera_on()) else {
        let hint = if session.mode().camera_on() {
            "Starting camera..."
        } else {
            "Click \"Start Camera\" to begin face detection"
        };
        let placeholder = container(text(hint).size(scaled(14.0, fs)).color(tertiary))
            .width(Length::Fill)
            .height(VIDEO_HEIGHT)
            .center_x(Length::Fill)
            .center_y(VIDEO_HEIGHT);
        return panel(placeholder.into(), theme);
    };

    let frame = image(video.handle.clone())
        .content_fit(ContentFit::Contain)
        .width(Length::Fill)
        .height(VIDEO_HEIGHT);

    let (results, frame_size) = match session.current_batch() {
        Some(batch) => (batch.results.as_slice(), batch.frame_size),
        None => (&[][..], video.size),
    };
    let overlay = canvas(OverlayCanvas::new(results, frame_size, scaled(12.0, fs)))
        .width(Length::Fill)
        .height(VIDEO_HEIGHT);

    let mut layers: Vec<Element<'a, Message>> = vec![frame.into(), overlay.into()];
    if session.is_processing() {
        layers.push(processing_badge(fs));
    }

    container(stack(layers))
        .width(Length::Fill)
        .style(|_theme: &Theme| container::Style {
            background: Some(Color::BLACK.into()),
            border: Border {
                radius: 12.0.into(),
                ..Border::default()
            },
            ..container::Style::default()
        })
        .into()
}

fn processing_badge<'a>(fs: f32) -> Element<'a, Message> {
    let badge = container(
        text("Processing...")
            .size(scaled(12.0, fs))
            .color(Color::WHITE),
    )
    .padding([4, 10])
    .style(|_theme: &Theme| container::Style {
        background: Some(Color::from_rgba(0.0, 0.0, 0.0, 0.6).into()),
        border: Border {
            radius: 6.0.into(),
            ..Border::default()
        },
        ..container::Style::default()
    });

    container(badge)
        .width(Length::Fill)
        .height(VIDEO_HEIGHT)
        .padding(10)
        .align_x(iced::alignment::Horizontal::Right)
        .align_y(iced::alignment::Vertical::Top)
        .into()
}

fn captured_image<'a>(
    app: &'a App,
    handle: image::Handle,
    fs: f32,
    theme: &Theme,
) -> Element<'a, Message> {
    let download = action_button(
        "Download".to_string(),
        scaled(14.0, fs),
        ButtonKind::Primary,
        Some(Message::Download),
        app.hovered == Some(ButtonId::Download),
        |hovered| Message::ButtonHover(ButtonId::Download, hovered),
    );

    let mut col = column![
        text("\u{1F4F8} Captured Image").size(scaled(16.0, fs)),
        Space::new().height(10),
        image(handle)
            .content_fit(ContentFit::Contain)
            .width(Length::Fill)
            .height(SNAPSHOT_HEIGHT),
        Space::new().height(10),
        download,
    ]
    .align_x(iced::Alignment::Center);

    if let Some(status) = &app.export_status {
        col = col
            .push(Space::new().height(6))
            .push(text(status.clone()).size(scaled(12.0, fs)).color(muted_color(theme)));
    }

    panel(col.into(), theme)
}

fn results<'a>(app: &'a App, fs: f32, theme: &Theme) -> Element<'a, Message> {
    let cards = app
        .session
        .detections()
        .iter()
        .enumerate()
        .map(|(i, face)| detection_card::view(i, face, fs, theme))
        .collect::<Vec<_>>();

    column![
        text("\u{1F50D} Detection Results").size(scaled(16.0, fs)),
        Space::new().height(10),
        row(cards).spacing(12).wrap(),
    ]
    .into()
}

fn panel<'a>(content: Element<'a, Message>, theme: &Theme) -> Element<'a, Message> {
    let surface = surface_color(theme);
    container(content)
        .padding([14, 16])
        .width(Length::Fill)
        .style(move |theme: &Theme| container::Style {
            background: Some(surface.into()),
            border: Border {
                color: Color {
                    a: 0.12,
                    ..theme.palette().text
                },
                width: 1.0,
                radius: 12.0.into(),
            },
            ..container::Style::default()
        })
        .into()
}
