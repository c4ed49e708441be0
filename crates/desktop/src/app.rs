use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crossbeam_channel::Receiver;
use iced::widget::{button, column, container, image, row, scrollable, text};
use iced::{Element, Length, Subscription, Task, Theme};

use facecam_core::capture::infrastructure::nokhwa_camera::NokhwaCamera;
use facecam_core::detection::domain::inference_pipeline::ConfidenceThreshold;
use facecam_core::export::infrastructure::jpeg_snapshot_encoder::JpegSnapshotEncoder;
use facecam_core::export::snapshot::{download_dir, save_snapshot};
use facecam_core::pipeline::detection_loop::{
    DetectionLoop, LoopConfig, LoopEvent, SharedPipeline,
};
use facecam_core::pipeline::pipeline_logger::NullPipelineLogger;
use facecam_core::session::session_state::{CameraCommand, Session};
use facecam_core::shared::config::AppConfig;
use facecam_core::shared::constants::SNAPSHOT_FILENAME;
use facecam_core::shared::frame::Frame;

use crate::settings::{Appearance, Settings};
use crate::tabs;
use crate::theme;
use crate::workers::model_loader::{self, LoaderMessage};

/// UI refresh while the camera streams or models load.
const FRAME_POLL: Duration = Duration::from_millis(33);

// ---------------------------------------------------------------------------
// Tab enum
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Main,
    Appearance,
    About,
}

impl Tab {
    const ALL: &[Tab] = &[Tab::Main, Tab::Appearance, Tab::About];

    fn label(self) -> &'static str {
        match self {
            Tab::Main => "Camera",
            Tab::Appearance => "Appearance",
            Tab::About => "About",
        }
    }
}

/// Buttons that animate on hover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonId {
    Camera,
    Capture,
    Reset,
    Settings,
    Download,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Message {
    TabSelected(Tab),
    Tick,
    ToggleCamera,
    Capture,
    Download,
    DownloadTarget(Option<PathBuf>),
    Reset,
    ToggleSettings,
    ConfidenceChanged(f32),
    ButtonHover(ButtonId, bool),
    AppearanceChanged(Appearance),
    HighContrastChanged(bool),
    FontScaleChanged(f32),
    RestoreAppearance,
    PollSystemTheme,
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// Latest camera frame converted for display.
pub struct VideoFrame {
    pub handle: image::Handle,
    pub size: (u32, u32),
    sequence: u64,
}

struct Loader {
    messages: Receiver<LoaderMessage>,
    cancelled: Arc<AtomicBool>,
}

pub struct App {
    active_tab: Tab,
    pub settings: Settings,
    config: AppConfig,
    pub session: Session,
    confidence: ConfidenceThreshold,
    pipeline: Option<SharedPipeline>,
    loader: Option<Loader>,
    pub load_status: Option<String>,
    detection_loop: Option<DetectionLoop>,
    pub video: Option<VideoFrame>,
    pub snapshot: Option<image::Handle>,
    pub export_status: Option<String>,
    pub hovered: Option<ButtonId>,
}

impl App {
    pub fn new() -> (Self, Task<Message>) {
        let config = AppConfig::load().unwrap_or_else(|e| {
            log::warn!("{e}; using default configuration");
            AppConfig::default()
        });

        let mut session = Session::new();
        let confidence = ConfidenceThreshold::new(session.set_confidence(config.confidence));
        session.begin_loading();
        let (messages, cancelled) = model_loader::spawn(&config, confidence.clone());

        (
            Self {
                active_tab: Tab::Main,
                settings: Settings::load(),
                config,
                session,
                confidence,
                pipeline: None,
                loader: Some(Loader {
                    messages,
                    cancelled,
                }),
                load_status: None,
                detection_loop: None,
                video: None,
                snapshot: None,
                export_status: None,
                hovered: None,
            },
            Task::none(),
        )
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::TabSelected(tab) => {
                self.active_tab = tab;
            }
            Message::Tick => {
                self.poll_loader();
                self.poll_detection_loop();
            }
            Message::ToggleCamera => match self.session.toggle_camera() {
                CameraCommand::Start(generation) => self.start_loop(generation),
                CameraCommand::Stop => self.stop_loop(),
                CameraCommand::None => {}
            },
            Message::Capture => {
                let frame = self.detection_loop.as_ref().and_then(|l| l.latest_frame());
                if self
                    .session
                    .capture(frame.as_deref(), &JpegSnapshotEncoder::default())
                {
                    self.export_status = None;
                }
                self.sync_snapshot();
            }
            Message::Download => {
                let Some(extension) = self.session.snapshot().map(|s| s.extension) else {
                    return Task::none();
                };
                let dir = download_dir();
                return Task::perform(
                    async move {
                        rfd::AsyncFileDialog::new()
                            .set_title("Save snapshot")
                            .add_filter("Snapshot", &[extension])
                            .set_directory(dir)
                            .set_file_name(SNAPSHOT_FILENAME)
                            .save_file()
                            .await
                            .map(|h| h.path().to_path_buf())
                    },
                    Message::DownloadTarget,
                );
            }
            Message::DownloadTarget(Some(path)) => {
                if let Some(snapshot) = self.session.snapshot() {
                    self.export_status = Some(match save_snapshot(snapshot, &path) {
                        Ok(()) => format!("Saved to {}", path.display()),
                        Err(e) => {
                            log::error!("Could not save snapshot: {e}");
                            format!("Could not save snapshot: {e}")
                        }
                    });
                }
            }
            Message::DownloadTarget(None) => {}
            Message::Reset => {
                if self.session.reset() == CameraCommand::Stop {
                    self.stop_loop();
                }
                self.sync_snapshot();
                self.export_status = None;
            }
            Message::ToggleSettings => {
                self.session.toggle_settings();
            }
            Message::ConfidenceChanged(value) => {
                let stored = self.session.set_confidence(value);
                self.confidence.set(stored);
            }
            Message::ButtonHover(id, true) => {
                self.hovered = Some(id);
            }
            Message::ButtonHover(id, false) => {
                if self.hovered == Some(id) {
                    self.hovered = None;
                }
            }
            Message::AppearanceChanged(appearance) => {
                self.settings.appearance = appearance;
                self.settings.save();
            }
            Message::HighContrastChanged(enabled) => {
                self.settings.high_contrast = enabled;
                self.settings.save();
            }
            Message::FontScaleChanged(scale) => {
                self.settings.font_scale = scale;
                self.settings.save();
            }
            Message::RestoreAppearance => {
                self.settings = Settings::default();
                self.settings.save();
            }
            Message::PollSystemTheme => {
                // Theme is resolved fresh in theme() on every render,
                // so just requesting a redraw is enough.
            }
        }
        Task::none()
    }

    pub fn view(&self) -> Element<'_, Message> {
        let fs = self.settings.font_scale;

        // Tab bar
        let tab_bar = row(Tab::ALL
            .iter()
            .map(|&tab| {
                let label = text(tab.label()).size(scaled(13.0, fs));
                let btn = button(label)
                    .on_press(Message::TabSelected(tab))
                    .padding([6, 14]);
                if tab == self.active_tab {
                    btn.style(button::primary).into()
                } else {
                    btn.style(button::text).into()
                }
            })
            .collect::<Vec<_>>())
        .spacing(2);

        let theme = self.theme();
        let content: Element<'_, Message> = match self.active_tab {
            Tab::Main => tabs::main_tab::view(self, &theme),
            Tab::Appearance => tabs::appearance_tab::view(&self.settings),
            Tab::About => tabs::about_tab::view(fs),
        };

        let tab_content = container(scrollable(content).height(Length::Fill))
            .padding(16)
            .height(Length::Fill);

        let footer = container(
            text("Powered by ONNX Runtime & iced")
                .size(scaled(11.0, fs))
                .color(theme::tertiary_color(&theme)),
        )
        .width(Length::Fill)
        .center_x(Length::Fill)
        .padding([6, 0]);

        column![tab_bar, tab_content, footer]
            .spacing(0)
            .height(Length::Fill)
            .into()
    }

    pub fn theme(&self) -> Theme {
        theme::resolve_theme(self.settings.appearance, self.settings.high_contrast)
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let mut subs = Vec::new();
        if self.loader.is_some() || self.detection_loop.is_some() {
            subs.push(iced::time::every(FRAME_POLL).map(|_| Message::Tick));
        }
        if self.settings.appearance == Appearance::System {
            subs.push(iced::time::every(Duration::from_secs(2)).map(|_| Message::PollSystemTheme));
        }
        Subscription::batch(subs)
    }

    pub fn font_scale(&self) -> f32 {
        self.settings.font_scale
    }

    // --- workers ---

    fn poll_loader(&mut self) {
        let Some(loader) = &self.loader else {
            return;
        };
        let messages: Vec<LoaderMessage> = loader.messages.try_iter().collect();
        for message in messages {
            match message {
                LoaderMessage::DownloadProgress(bundle, downloaded, total) => {
                    self.load_status =
                        Some(model_loader::progress_text(bundle, downloaded, total));
                }
                LoaderMessage::Loaded(pipeline) => {
                    self.pipeline = Some(Arc::new(Mutex::new(pipeline)));
                    self.session.models_loaded();
                    self.finish_loading();
                }
                LoaderMessage::Failed(e) => {
                    self.session.models_failed(&e);
                    self.finish_loading();
                }
            }
        }
    }

    fn finish_loading(&mut self) {
        self.loader = None;
        self.load_status = None;
    }

    fn poll_detection_loop(&mut self) {
        let Some(detection_loop) = &self.detection_loop else {
            return;
        };
        let events: Vec<LoopEvent> = detection_loop.events().try_iter().collect();
        let frame = detection_loop.latest_frame();

        for event in events {
            match event {
                LoopEvent::Started {
                    generation,
                    width,
                    height,
                } => {
                    log::info!("Camera {generation} streaming at {width}x{height}");
                }
                LoopEvent::Detections(batch) => {
                    self.session.apply_detections(batch);
                }
                LoopEvent::Processing(processing) => self.session.set_processing(processing),
                LoopEvent::TickFailed(e) => log::debug!("Detection tick failed: {e}"),
                LoopEvent::CameraError {
                    generation,
                    message,
                } => {
                    if self.session.camera_failed(generation, &message) {
                        self.stop_loop();
                        return;
                    }
                }
                LoopEvent::Stopped { .. } => {}
            }
        }

        if let Some(frame) = frame {
            let stale = self
                .video
                .as_ref()
                .map_or(true, |v| v.sequence != frame.sequence());
            if stale {
                self.video = Some(video_frame(&frame));
            }
        }
    }

    fn start_loop(&mut self, generation: u64) {
        self.stop_loop();
        let Some(pipeline) = &self.pipeline else {
            log::warn!("Camera requested before models were loaded");
            return;
        };
        let config = LoopConfig {
            generation,
            interval: self.config.detection_interval(),
            constraints: self.config.video_constraints(),
        };
        self.detection_loop = Some(DetectionLoop::spawn(
            Box::new(NokhwaCamera::new()),
            pipeline.clone(),
            config,
            Box::new(NullPipelineLogger),
        ));
    }

    /// Signals the loop and joins it off the UI thread; a camera read can
    /// take a frame interval to return.
    fn stop_loop(&mut self) {
        self.video = None;
        self.sync_snapshot();
        if let Some(detection_loop) = self.detection_loop.take() {
            detection_loop.stop();
            thread::spawn(move || detection_loop.join());
        }
    }

    fn sync_snapshot(&mut self) {
        self.snapshot = self
            .session
            .snapshot()
            .map(|s| image::Handle::from_bytes(s.bytes.clone()));
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Some(loader) = &self.loader {
            loader.cancelled.store(true, Ordering::Relaxed);
        }
        if let Some(detection_loop) = self.detection_loop.take() {
            detection_loop.join();
        }
    }
}

/// Expands an RGB frame to the RGBA pixels iced expects.
fn video_frame(frame: &Frame) -> VideoFrame {
    VideoFrame {
        handle: image::Handle::from_rgba(frame.width(), frame.height(), rgb_to_rgba(frame)),
        size: frame.size(),
        sequence: frame.sequence(),
    }
}

fn rgb_to_rgba(frame: &Frame) -> Vec<u8> {
    let channels = frame.channels().max(1) as usize;
    let mut rgba = Vec::with_capacity(frame.width() as usize * frame.height() as usize * 4);
    for px in frame.data().chunks_exact(channels) {
        let r = px[0];
        let g = *px.get(1).unwrap_or(&r);
        let b = *px.get(2).unwrap_or(&r);
        rgba.extend_from_slice(&[r, g, b, 255]);
    }
    rgba
}

/// Scale a base font size by the user's font_scale setting.
pub fn scaled(base: f32, font_scale: f32) -> f32 {
    (base * font_scale).round()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_to_rgba() {
        let frame = Frame::new(vec![1, 2, 3, 4, 5, 6], 2, 1, 3, 0);
        assert_eq!(rgb_to_rgba(&frame), vec![1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn test_gray_expands_to_rgba() {
        let frame = Frame::new(vec![9, 7], 2, 1, 1, 0);
        assert_eq!(rgb_to_rgba(&frame), vec![9, 9, 9, 255, 7, 7, 7, 255]);
    }

    #[test]
    fn test_scaled_rounds() {
        assert_eq!(scaled(13.0, 1.0), 13.0);
        assert_eq!(scaled(13.0, 1.25), 16.0);
    }
}
