use std::process::Command;

use iced::color;
use iced::theme::Palette;
use iced::{Color, Theme};

use crate::settings::Appearance;

/// Resolve the iced Theme from appearance + high_contrast settings.
pub fn resolve_theme(appearance: Appearance, high_contrast: bool) -> Theme {
    let is_dark = match appearance {
        Appearance::Dark => true,
        Appearance::Light => false,
        Appearance::System => system_dark_mode(),
    };

    let palette = match (is_dark, high_contrast) {
        (true, false) => dark_palette(),
        (false, false) => light_palette(),
        (true, true) => high_contrast_dark_palette(),
        (false, true) => high_contrast_light_palette(),
    };

    Theme::custom("AI Face Detector", palette)
}

/// Secondary text (subtitles, captions).
pub fn muted_color(theme: &Theme) -> Color {
    Color {
        a: 0.75,
        ..theme.palette().text
    }
}

/// Hints and placeholder text.
pub fn tertiary_color(theme: &Theme) -> Color {
    Color {
        a: 0.5,
        ..theme.palette().text
    }
}

/// Card and panel background, one step off the window background.
pub fn surface_color(theme: &Theme) -> Color {
    let p = theme.palette();
    if is_light(p.background) {
        Color::WHITE
    } else {
        Color {
            r: (p.background.r + 0.06).min(1.0),
            g: (p.background.g + 0.06).min(1.0),
            b: (p.background.b + 0.06).min(1.0),
            a: 1.0,
        }
    }
}

/// Box colour of the detection overlay.
pub fn overlay_color() -> Color {
    let [r, g, b] = facecam_core::render::overlay::BOX_COLOR;
    Color::from_rgb8(r, g, b)
}

fn is_light(background: Color) -> bool {
    background.r * 0.299 + background.g * 0.587 + background.b * 0.114 > 0.5
}

fn dark_palette() -> Palette {
    Palette {
        background: color!(0x17, 0x17, 0x1f),
        text: color!(0xd4, 0xd4, 0xdc),
        primary: color!(0x8b, 0x9c, 0xf4),
        success: color!(0x34, 0xc7, 0x7b),
        warning: color!(0xf5, 0xb7, 0x2e),
        danger: color!(0xff, 0x45, 0x3a),
    }
}

fn light_palette() -> Palette {
    Palette {
        background: color!(0xf4, 0xf4, 0xfa),
        text: color!(0x1f, 0x1f, 0x2e),
        primary: color!(0x66, 0x7e, 0xea),
        success: color!(0x1f, 0xa8, 0x5f),
        warning: color!(0xe0, 0x8e, 0x0b),
        danger: color!(0xff, 0x3b, 0x30),
    }
}

fn high_contrast_dark_palette() -> Palette {
    Palette {
        background: color!(0x00, 0x00, 0x00),
        text: color!(0xff, 0xff, 0xff),
        primary: color!(0xa5, 0xb4, 0xfc),
        success: color!(0x30, 0xd1, 0x58),
        warning: color!(0xff, 0xd6, 0x0a),
        danger: color!(0xff, 0x45, 0x3a),
    }
}

fn high_contrast_light_palette() -> Palette {
    Palette {
        background: color!(0xff, 0xff, 0xff),
        text: color!(0x00, 0x00, 0x00),
        primary: color!(0x43, 0x38, 0xca),
        success: color!(0x24, 0x8a, 0x3d),
        warning: color!(0xb2, 0x5c, 0x00),
        danger: color!(0xd7, 0x00, 0x15),
    }
}

/// Asks the OS whether it is in dark mode. Defaults to dark when the
/// query fails.
fn system_dark_mode() -> bool {
    #[cfg(target_os = "macos")]
    {
        Command::new("defaults")
            .args(["read", "-g", "AppleInterfaceStyle"])
            .output()
            .map(|o| {
                String::from_utf8_lossy(&o.stdout)
                    .trim()
                    .eq_ignore_ascii_case("dark")
            })
            .unwrap_or(true)
    }
    #[cfg(target_os = "windows")]
    {
        // AppsUseLightTheme is 0x0 in dark mode
        Command::new("reg")
            .args([
                "query",
                r"HKCU\Software\Microsoft\Windows\CurrentVersion\Themes\Personalize",
                "/v",
                "AppsUseLightTheme",
            ])
            .output()
            .map(|o| String::from_utf8_lossy(&o.stdout).contains("0x0"))
            .unwrap_or(true)
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        Command::new("gsettings")
            .args(["get", "org.gnome.desktop.interface", "color-scheme"])
            .output()
            .ok()
            .filter(|o| o.status.success())
            .map(|o| String::from_utf8_lossy(&o.stdout).contains("dark"))
            .unwrap_or(true)
    }
}
