use iced::widget::{column, text, Space};
use iced::Element;

use facecam_core::models::model_loader::ModelBundle;

use crate::app::{scaled, Message};

pub fn view(fs: f32) -> Element<'static, Message> {
    let version = env!("CARGO_PKG_VERSION");

    let models = ModelBundle::ALL
        .iter()
        .fold(column![].spacing(2), |col, bundle| {
            col.push(
                text(format!("\u{2022} {bundle} ({})", bundle.file_name())).size(scaled(12.0, fs)),
            )
        });

    column![
        text("AI Face Detector").size(scaled(22.0, fs)),
        Space::new().height(4),
        text(format!("Version {version}")).size(scaled(13.0, fs)),
        Space::new().height(12),
        text(
            "Finds faces in your webcam feed and estimates age, gender and \
             expression for each one. Everything runs locally; no frames \
             leave this computer."
        )
        .size(scaled(13.0, fs)),
        Space::new().height(16),
        text("Models").size(scaled(16.0, fs)),
        Space::new().height(6),
        models,
        Space::new().height(16),
        text("Set RUST_LOG=info to see detection loop logs.").size(scaled(12.0, fs)),
    ]
    .spacing(0)
    .into()
}
