mod app;
mod settings;
mod theme;

mod tabs {
    pub mod about_tab;
    pub mod appearance_tab;
    pub mod main_tab;
}

mod widgets {
    pub mod action_button;
    pub mod detection_card;
    pub mod overlay_canvas;
}

mod workers {
    pub mod model_loader;
}

use app::App;

fn main() -> iced::Result {
    env_logger::init();

    iced::application(App::new, App::update, App::view)
        .title("AI Face Detector")
        .theme(App::theme)
        .subscription(App::subscription)
        .window(iced::window::Settings {
            size: iced::Size::new(900.0, 820.0),
            min_size: Some(iced::Size::new(640.0, 560.0)),
            ..Default::default()
        })
        .run()
}
