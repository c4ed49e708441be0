use iced::widget::canvas::{self, Geometry, Path, Stroke, Text};
use iced::{mouse, Color, Pixels, Point, Rectangle, Renderer, Size, Theme};

use facecam_core::detection::domain::face_analysis::FaceAnalysis;
use facecam_core::render::overlay::{OverlayScene, BOX_LINE_WIDTH};

use crate::theme::overlay_color;

const LABEL_HEIGHT: f32 = 20.0;
const LABEL_PADDING: f32 = 4.0;
/// Rough advance per glyph, used to size the label background.
const CHAR_WIDTH: f32 = 0.55;

/// Draws labelled face boxes over a video image laid out with
/// `ContentFit::Contain` in the same bounds.
pub struct OverlayCanvas {
    results: Vec<FaceAnalysis>,
    frame_size: (u32, u32),
    label_size: f32,
}

impl OverlayCanvas {
    pub fn new(results: &[FaceAnalysis], frame_size: (u32, u32), label_size: f32) -> Self {
        Self {
            results: results.to_vec(),
            frame_size,
            label_size,
        }
    }
}

impl<Message> canvas::Program<Message> for OverlayCanvas {
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
        let Some(area) = fit_contain(self.frame_size, bounds.size()) else {
            return vec![frame.into_geometry()];
        };

        let display = (area.width.round() as u32, area.height.round() as u32);
        let scene = OverlayScene::from_results(&self.results, self.frame_size, display);
        let color = overlay_color();

        for item in &scene.items {
            let top_left = Point::new(area.x + item.bbox.x as f32, area.y + item.bbox.y as f32);
            let size = Size::new(item.bbox.width as f32, item.bbox.height as f32);
            frame.stroke(
                &Path::rectangle(top_left, size),
                Stroke::default()
                    .with_color(color)
                    .with_width(BOX_LINE_WIDTH as f32),
            );

            let label_width =
                item.label.chars().count() as f32 * self.label_size * CHAR_WIDTH + LABEL_PADDING * 2.0;
            // Inside the box when there is no room above it
            let label_y = if top_left.y - LABEL_HEIGHT >= area.y {
                top_left.y - LABEL_HEIGHT
            } else {
                top_left.y
            };
            frame.fill_rectangle(
                Point::new(top_left.x, label_y),
                Size::new(label_width, LABEL_HEIGHT),
                color,
            );
            frame.fill_text(Text {
                content: item.label.clone(),
                position: Point::new(top_left.x + LABEL_PADDING, label_y + 3.0),
                color: Color::WHITE,
                size: Pixels(self.label_size),
                ..Text::default()
            });
        }

        vec![frame.into_geometry()]
    }
}

/// The rectangle a `frame`-sized image occupies when scaled to fit inside
/// `bounds` without cropping, centred. `None` if either has no area.
pub fn fit_contain(frame: (u32, u32), bounds: Size) -> Option<Rectangle> {
    let (fw, fh) = (frame.0 as f32, frame.1 as f32);
    if fw <= 0.0 || fh <= 0.0 || bounds.width <= 0.0 || bounds.height <= 0.0 {
        return None;
    }
    let scale = (bounds.width / fw).min(bounds.height / fh);
    let width = fw * scale;
    let height = fh * scale;
    Some(Rectangle {
        x: (bounds.width - width) / 2.0,
        y: (bounds.height - height) / 2.0,
        width,
        height,
    })
}
