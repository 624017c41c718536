//! The 2D immediate-mode drawing surface bubbles render into.

use crate::color::Rgba;
use crate::image::ImageHandle;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Canvas size in CSS pixels (before the device pixel ratio is applied).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f32,
    pub height: f32,
}

impl Dimensions {
    pub fn new(width: f32, height: f32) -> Self {
        Dimensions { width, height }
    }

    /// True if a circle at `center` with `margin` around it touches the area
    pub fn overlaps_circle(&self, center: Vec2, margin: f32) -> bool {
        center.x >= -margin
            && center.x <= self.width + margin
            && center.y >= -margin
            && center.y <= self.height + margin
    }
}

/// Minimal canvas-style API: paths, fill, stroke, clip, images and global alpha.
///
/// `save`/`restore` bracket state changes (alpha, clip) exactly like a 2D canvas context.
pub trait Surface {
    fn clear(&mut self, area: Dimensions);
    /// Uniform scale applied to all later drawing (device pixel ratio)
    fn set_scale(&mut self, scale: f32);
    fn save(&mut self);
    fn restore(&mut self);
    fn set_global_alpha(&mut self, alpha: f32);
    fn begin_path(&mut self);
    fn arc(&mut self, center: Vec2, radius: f32, start_angle: f32, end_angle: f32);
    fn fill(&mut self, color: Rgba);
    fn stroke(&mut self, color: Rgba, line_width: f32);
    /// Restricts later drawing to the current path
    fn clip(&mut self);
    fn draw_image(&mut self, image: &ImageHandle, origin: Vec2, size: Vec2);
}

/// A single recorded drawing call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Dimensions),
    Scale(f32),
    Save,
    Restore,
    GlobalAlpha(f32),
    BeginPath,
    Arc { center: Vec2, radius: f32 },
    Fill(Rgba),
    Stroke { color: Rgba, width: f32 },
    Clip,
    Image { origin: Vec2, size: Vec2 },
}

/// Surface that records every call made against it.
///
/// `clear` discards the previous frame so the buffer always holds the latest frame.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    commands: Vec<DrawCommand>,
    depth: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Number of arcs drawn since the last clear
    pub fn arc_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Arc { .. }))
            .count()
    }

    pub fn image_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Image { .. }))
            .count()
    }

    /// True if every save has been matched by a restore
    pub fn is_balanced(&self) -> bool {
        self.depth == 0
    }
}

impl Surface for RecordingSurface {
    fn clear(&mut self, area: Dimensions) {
        self.commands.clear();
        self.depth = 0;
        self.commands.push(DrawCommand::Clear(area));
    }

    fn set_scale(&mut self, scale: f32) {
        self.commands.push(DrawCommand::Scale(scale));
    }

    fn save(&mut self) {
        self.depth += 1;
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.commands.push(DrawCommand::Restore);
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        self.commands.push(DrawCommand::GlobalAlpha(alpha));
    }

    fn begin_path(&mut self) {
        self.commands.push(DrawCommand::BeginPath);
    }

    fn arc(&mut self, center: Vec2, radius: f32, _start_angle: f32, _end_angle: f32) {
        self.commands.push(DrawCommand::Arc { center, radius });
    }

    fn fill(&mut self, color: Rgba) {
        self.commands.push(DrawCommand::Fill(color));
    }

    fn stroke(&mut self, color: Rgba, line_width: f32) {
        self.commands.push(DrawCommand::Stroke {
            color,
            width: line_width,
        });
    }

    fn clip(&mut self) {
        self.commands.push(DrawCommand::Clip);
    }

    fn draw_image(&mut self, _image: &ImageHandle, origin: Vec2, size: Vec2) {
        self.commands.push(DrawCommand::Image { origin, size });
    }
}
