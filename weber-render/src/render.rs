use std::time::Duration;

use anyhow::{Context, Result};
use tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, Rect, Transform};
use tracing::debug;
use weber_core::{Canvas, DotColor, StimulusPair};
use weber_timing::{CalibrationStats, HighPrecisionTimer, Timer};

/// Side of one mask checker cell, in pixels.
const MASK_CELL: f32 = 24.0;

pub struct FrameStats {
    pub clear: Duration,
    pub paint: Duration,
    pub copy: Duration,
    pub total: Duration,
    pub dirty_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dot {
    pub x: f32,
    pub y: f32,
    pub diameter: f32,
    pub rgba: [u8; 4],
}

/// What the dot area should show after the next frame
#[derive(Debug, Clone, PartialEq)]
pub enum Scene {
    Blank,
    Dots(Vec<Dot>),
    Mask([u8; 4]),
}

impl Scene {
    pub fn from_pair(pair: &StimulusPair, color_a: DotColor, color_b: DotColor) -> Self {
        let dots = [(pair.set_a(), color_a), (pair.set_b(), color_b)]
            .into_iter()
            .flat_map(|(set, color)| {
                set.positions()
                    .iter()
                    .zip(set.diameters())
                    .map(move |(p, d)| Dot {
                        x: p.x,
                        y: p.y,
                        diameter: *d as f32,
                        rgba: color.rgba,
                    })
            })
            .collect();
        Scene::Dots(dots)
    }
}

/// Paints dot clusters and masks offscreen and copies only what changed
/// into the window's frame buffer.
pub struct DotsRenderer {
    width: u32,
    height: u32,
    /// Top-left of the dot canvas inside the window.
    origin: (f32, f32),
    canvas_size: (f32, f32),

    canvas: Pixmap,
    dirty_regions: Vec<Rect>,
    pending: Option<Scene>,
    first_frame: bool,
    clear_buffer: Vec<u8>,

    paint_timer: HighPrecisionTimer,
}

impl DotsRenderer {
    pub fn new(width: u32, height: u32, canvas: &Canvas) -> Result<Self> {
        let mut renderer = Self {
            width,
            height,
            origin: (0.0, 0.0),
            canvas_size: (canvas.width, canvas.height),
            canvas: Pixmap::new(1, 1).context("allocating pixmap")?,
            dirty_regions: Vec::with_capacity(128),
            pending: None,
            first_frame: true,
            clear_buffer: Vec::new(),
            paint_timer: HighPrecisionTimer::new(),
        };
        renderer.resize(width, height)?;
        Ok(renderer)
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) -> Result<()> {
        self.width = new_width.max(1);
        self.height = new_height.max(1);
        self.origin = (
            ((self.width as f32 - self.canvas_size.0) / 2.0).max(0.0).floor(),
            ((self.height as f32 - self.canvas_size.1) / 2.0).max(0.0).floor(),
        );

        self.canvas = Pixmap::new(self.width, self.height)
            .with_context(|| format!("allocating {}x{} canvas", self.width, self.height))?;
        self.canvas.fill(Color::from_rgba8(0, 0, 0, 255));
        self.clear_buffer = [0u8, 0, 0, 255]
            .into_iter()
            .cycle()
            .take((self.width * self.height * 4) as usize)
            .collect();
        self.dirty_regions.clear();
        self.first_frame = true;
        debug!(width = self.width, height = self.height, origin = ?self.origin, "renderer resized");
        Ok(())
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn show(&mut self, scene: Scene) {
        self.pending = Some(scene);
    }

    pub fn show_pair(&mut self, pair: &StimulusPair, color_a: DotColor, color_b: DotColor) {
        self.show(Scene::from_pair(pair, color_a, color_b));
    }

    pub fn show_mask(&mut self, color: DotColor) {
        self.show(Scene::Mask(color.rgba));
    }

    pub fn clear(&mut self) {
        self.show(Scene::Blank);
    }

    /// A scene change is waiting for the next frame.
    pub fn needs_redraw(&self) -> bool {
        self.pending.is_some() || self.first_frame
    }

    pub fn paint_stats(&self) -> CalibrationStats {
        self.paint_timer.calibration_stats()
    }

    fn clear_dirty(&mut self, dirty: &[Rect]) {
        let stride = self.width as usize * 4;
        let canvas_data = self.canvas.data_mut();

        for rect in dirty {
            let Some((x0, y0, x1, y1)) = pixel_bounds(rect, self.width, self.height) else {
                continue;
            };
            let row_len = (x1 - x0) * 4;
            for y in y0..y1 {
                let off = y * stride + x0 * 4;
                canvas_data[off..off + row_len]
                    .copy_from_slice(&self.clear_buffer[off..off + row_len]);
            }
        }
    }

    fn copy_dirty_region(&self, dirty: &Rect, frame_buffer: &mut [u8]) {
        let Some((x0, y0, x1, y1)) = pixel_bounds(dirty, self.width, self.height) else {
            return;
        };
        let bytes = (x1 - x0) * 4;
        let row_bytes = self.width as usize * 4;
        let canvas_data = self.canvas.data();

        for row in y0..y1 {
            let off = row * row_bytes + x0 * 4;
            frame_buffer[off..off + bytes].copy_from_slice(&canvas_data[off..off + bytes]);
        }
    }

    fn coalesce_dirty(rects: &mut Vec<Rect>) {
        rects.sort_by(|a, b| a.y().total_cmp(&b.y()).then(a.x().total_cmp(&b.x())));
        let mut out: Vec<Rect> = Vec::with_capacity(rects.len());
        for r in rects.drain(..) {
            if let Some(last) = out.last_mut() {
                let same_row =
                    (r.y() - last.y()).abs() < 1.0 && (r.height() - last.height()).abs() < 1.0;
                let touching = r.x() <= last.x() + last.width() + 1.0;
                if same_row && touching {
                    let nx = last.x().min(r.x());
                    let nx2 = (last.x() + last.width()).max(r.x() + r.width());
                    if let Some(merged) = Rect::from_xywh(nx, last.y(), nx2 - nx, last.height()) {
                        *last = merged;
                        continue;
                    }
                }
            }
            out.push(r);
        }
        *rects = out;
    }

    fn paint_scene(&mut self, scene: &Scene) {
        match scene {
            Scene::Blank => {}
            Scene::Dots(dots) => {
                for dot in dots {
                    self.paint_dot(dot);
                }
            }
            Scene::Mask(rgba) => self.paint_mask(*rgba),
        }
    }

    fn paint_dot(&mut self, dot: &Dot) {
        let r = dot.diameter / 2.0;
        let (cx, cy) = (self.origin.0 + dot.x, self.origin.1 + dot.y);
        let Some(path) = PathBuilder::from_circle(cx, cy, r) else {
            return;
        };
        let mut paint = Paint::default();
        paint.anti_alias = true;
        paint.set_color_rgba8(dot.rgba[0], dot.rgba[1], dot.rgba[2], dot.rgba[3]);
        self.canvas
            .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);

        let span = dot.diameter + 2.0;
        if let Some(bounds) = Rect::from_xywh(cx - r - 1.0, cy - r - 1.0, span, span) {
            self.dirty_regions.push(bounds);
        }
    }

    /// Checkerboard over the whole dot canvas.
    fn paint_mask(&mut self, rgba: [u8; 4]) {
        let mut paint = Paint::default();
        paint.anti_alias = false;
        paint.set_color_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]);

        let cols = (self.canvas_size.0 / MASK_CELL).ceil() as u32;
        let rows = (self.canvas_size.1 / MASK_CELL).ceil() as u32;
        let mut pb = PathBuilder::new();
        for row in 0..rows {
            for col in (row % 2..cols).step_by(2) {
                let x = self.origin.0 + col as f32 * MASK_CELL;
                let y = self.origin.1 + row as f32 * MASK_CELL;
                let w = MASK_CELL.min(self.origin.0 + self.canvas_size.0 - x);
                let h = MASK_CELL.min(self.origin.1 + self.canvas_size.1 - y);
                if let Some(cell) = Rect::from_xywh(x, y, w, h) {
                    pb.push_rect(cell);
                }
            }
        }
        if let Some(path) = pb.finish() {
            self.canvas
                .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }
        if let Some(area) = Rect::from_xywh(
            self.origin.0,
            self.origin.1,
            self.canvas_size.0,
            self.canvas_size.1,
        ) {
            self.dirty_regions.push(area);
        }
    }

    /// Applies the pending scene and copies the changed pixels into
    /// `frame_buffer` (RGBA8, `width * height * 4` bytes).
    pub fn render_frame<T: Timer>(
        &mut self,
        frame_buffer: &mut [u8],
        timer: &mut T,
    ) -> Result<FrameStats> {
        let expected = (self.width * self.height * 4) as usize;
        anyhow::ensure!(
            frame_buffer.len() == expected,
            "frame buffer holds {} bytes, expected {expected}",
            frame_buffer.len()
        );

        if self.first_frame {
            self.first_frame = false;
            self.canvas.fill(Color::from_rgba8(0, 0, 0, 255));
            frame_buffer.copy_from_slice(&self.clear_buffer);
            self.dirty_regions.clear();
        }

        let Some(scene) = self.pending.take() else {
            return Ok(FrameStats {
                clear: Duration::ZERO,
                paint: Duration::ZERO,
                copy: Duration::ZERO,
                total: Duration::ZERO,
                dirty_count: 0,
            });
        };

        let old_dirty = std::mem::take(&mut self.dirty_regions);
        let t_clear = {
            let t = timer.now();
            self.clear_dirty(&old_dirty);
            timer.elapsed(t)
        };

        let t_paint = {
            let t = timer.now();
            self.paint_scene(&scene);
            timer.elapsed(t)
        };

        let mut present_rects = old_dirty;
        present_rects.extend_from_slice(&self.dirty_regions);
        Self::coalesce_dirty(&mut present_rects);

        let t_copy = {
            let t = timer.now();
            for rect in &present_rects {
                self.copy_dirty_region(rect, frame_buffer);
            }
            timer.elapsed(t)
        };

        let total = t_clear + t_paint + t_copy;
        self.paint_timer.record_frame(t_paint);
        timer.record_frame(total);

        Ok(FrameStats {
            clear: t_clear,
            paint: t_paint,
            copy: t_copy,
            total,
            dirty_count: present_rects.len(),
        })
    }
}

/// Clamps `rect` to the pixmap and rounds outwards. `None` if nothing is left.
fn pixel_bounds(rect: &Rect, width: u32, height: u32) -> Option<(usize, usize, usize, usize)> {
    let x0 = rect.x().floor().clamp(0.0, width as f32) as usize;
    let y0 = rect.y().floor().clamp(0.0, height as f32) as usize;
    let x1 = (rect.x() + rect.width()).ceil().clamp(0.0, width as f32) as usize;
    let y1 = (rect.y() + rect.height()).ceil().clamp(0.0, height as f32) as usize;
    (x1 > x0 && y1 > y0).then_some((x0, y0, x1, y1))
}
