//! Interactive point picking on the displayed image.
//!
//! Opens a window, shows the image fitted to it, and records one click for the
//! start point and one for the end point. The window stays open with the
//! resulting line drawn until the operator presses Enter or closes it.

use crate::acquire::{PointSource, Prompt};
use crate::error::AppError;
use crate::geometry::{Point, Segment};
use eframe::egui;
use image::DynamicImage;
use std::sync::{Arc, Mutex};

const START_COLOR: egui::Color32 = egui::Color32::from_rgb(0, 160, 0);
const END_COLOR: egui::Color32 = egui::Color32::from_rgb(220, 0, 0);
const LINE_COLOR: egui::Color32 = egui::Color32::from_rgb(30, 110, 255);
const MARKER_RADIUS: f32 = 5.0;

/// [`PointSource`] backed by a native window.
#[derive(Debug, Default)]
pub struct ClickPicker;

impl PointSource for ClickPicker {
    fn acquire(&mut self, prompt: &Prompt) -> Result<Segment, AppError> {
        let picture = image::open(&prompt.image)?;
        let clicks: Arc<Mutex<Vec<Point>>> = Arc::new(Mutex::new(Vec::new()));

        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size(initial_window_size(prompt))
                .with_title(format!("scalebar: {}", prompt.image.display())),
            ..Default::default()
        };

        let app = PickerApp::new(picture, prompt.clone(), Arc::clone(&clicks));
        eframe::run_native(
            "scalebar",
            options,
            Box::new(move |_cc| Ok(Box::new(app))),
        )
        .map_err(|e| AppError::Viewer(e.to_string()))?;

        let clicks = clicks
            .lock()
            .map_err(|_| AppError::Viewer("click buffer poisoned".to_string()))?;
        match clicks.as_slice() {
            [start, end, ..] => Ok(Segment::new(*start, *end)),
            _ => Err(AppError::SelectionAborted),
        }
    }
}

fn initial_window_size(prompt: &Prompt) -> [f32; 2] {
    let w = prompt.size.width as f32;
    let h = prompt.size.height as f32;
    let fit = (1200.0 / w).min(800.0 / h).min(1.0);
    [(w * fit).max(400.0), (h * fit).max(300.0) + 60.0]
}

/// Upload size keeping the aspect ratio with neither side above `max_side`,
/// or `None` when the image already fits.
///
/// Clicks are mapped through the original image size, so a smaller texture
/// does not change the picked coordinates.
fn texture_size(width: u32, height: u32, max_side: usize) -> Option<(u32, u32)> {
    let max_side = u32::try_from(max_side).unwrap_or(u32::MAX).max(1);
    if width <= max_side && height <= max_side {
        return None;
    }
    let longest = u64::from(width.max(height));
    let fit = |side: u32| {
        let scaled = u64::from(side) * u64::from(max_side) / longest;
        (scaled as u32).clamp(1, max_side)
    };
    Some((fit(width), fit(height)))
}

struct PickerApp {
    raw_image: Option<DynamicImage>,
    texture: Option<egui::TextureHandle>,
    image_size: egui::Vec2,
    prompt: Prompt,
    clicks: Arc<Mutex<Vec<Point>>>,
}

impl PickerApp {
    fn new(raw_image: DynamicImage, prompt: Prompt, clicks: Arc<Mutex<Vec<Point>>>) -> Self {
        let image_size = egui::vec2(raw_image.width() as f32, raw_image.height() as f32);
        Self {
            raw_image: Some(raw_image),
            texture: None,
            image_size,
            prompt,
            clicks,
        }
    }

    fn ensure_texture(&mut self, ctx: &egui::Context) {
        if self.texture.is_some() {
            return;
        }
        // The decoded image is only needed until it lives on the GPU.
        if let Some(img) = self.raw_image.take() {
            let max_side = ctx.input(|i| i.max_texture_side);
            let img = match texture_size(img.width(), img.height(), max_side) {
                Some((w, h)) => {
                    log::debug!(
                        "downscaling {}x{} image to {}x{} for display",
                        img.width(),
                        img.height(),
                        w,
                        h
                    );
                    img.resize_exact(w, h, image::imageops::FilterType::Triangle)
                }
                None => img,
            };
            let rgba = img.to_rgba8();
            let size = [rgba.width() as usize, rgba.height() as usize];
            let pixels = rgba.as_flat_samples();
            let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());
            self.texture = Some(ctx.load_texture("image", color_image, egui::TextureOptions::LINEAR));
        }
    }

    fn points(&self) -> Vec<Point> {
        self.clicks.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn title(&self, count: usize) -> String {
        match count {
            0 => self.prompt.start_title(),
            1 => self.prompt.end_title(),
            _ => self.prompt.done_title(),
        }
    }

    /// Largest rect with the image's aspect ratio centered in `canvas`.
    fn image_rect(&self, canvas: egui::Rect) -> egui::Rect {
        let zoom = (canvas.width() / self.image_size.x).min(canvas.height() / self.image_size.y);
        egui::Rect::from_center_size(canvas.center(), self.image_size * zoom)
    }

    fn screen_to_image(&self, img_rect: egui::Rect, pos: egui::Pos2) -> Point {
        let rel = pos - img_rect.min;
        Point::new(
            f64::from(rel.x / img_rect.width() * self.image_size.x),
            f64::from(rel.y / img_rect.height() * self.image_size.y),
        )
    }

    fn image_to_screen(&self, img_rect: egui::Rect, p: Point) -> egui::Pos2 {
        img_rect.min
            + egui::vec2(
                p.x as f32 / self.image_size.x * img_rect.width(),
                p.y as f32 / self.image_size.y * img_rect.height(),
            )
    }
}

impl eframe::App for PickerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ensure_texture(ctx);
        let points = self.points();

        if points.len() >= 2 && ctx.input(|i| i.key_pressed(egui::Key::Enter)) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        egui::TopBottomPanel::top("prompt").show(ctx, |ui| {
            for line in self.title(points.len()).lines() {
                ui.label(line);
            }
            if points.len() >= 2 {
                ui.weak("Press Enter or close the window to continue.");
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::click());
            let canvas = response.rect;
            painter.rect_filled(canvas, 0.0, egui::Color32::from_gray(40));

            let img_rect = self.image_rect(canvas);
            if let Some(ref tex) = self.texture {
                painter.image(
                    tex.id(),
                    img_rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }

            // First click per prompt wins; clicks after the end point are ignored.
            if response.clicked() && points.len() < 2 {
                if let Some(pos) = response.interact_pointer_pos() {
                    if img_rect.contains(pos) {
                        let p = self.screen_to_image(img_rect, pos);
                        log::debug!("click {} at ({:.1}, {:.1})", points.len() + 1, p.x, p.y);
                        if let Ok(mut clicks) = self.clicks.lock() {
                            clicks.push(p);
                        }
                        ctx.request_repaint();
                    }
                }
            }

            if let [start, end, ..] = points.as_slice() {
                painter.line_segment(
                    [self.image_to_screen(img_rect, *start), self.image_to_screen(img_rect, *end)],
                    egui::Stroke::new(2.0, LINE_COLOR),
                );
            }
            for (i, p) in points.iter().take(2).enumerate() {
                let color = if i == 0 { START_COLOR } else { END_COLOR };
                painter.circle_filled(self.image_to_screen(img_rect, *p), MARKER_RADIUS, color);
            }
        });
    }
}
