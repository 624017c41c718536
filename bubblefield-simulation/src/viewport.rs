use bubblefield_config::{BubbleConfig, DeviceClass};
use bubblefield_core::{Dimensions, Vec2};

/// What a resize changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeOutcome {
    pub dimensions: Dimensions,
    /// Backing buffer size in device pixels
    pub buffer_width: u32,
    pub buffer_height: u32,
    pub device: DeviceClass,
    /// True if the change is large enough to reseed the field
    pub significant: bool,
}

/// Tracks canvas size, device pixel ratio and device class across resizes.
#[derive(Debug, Clone)]
pub struct Viewport {
    dimensions: Option<Dimensions>,
    /// Size at the last significant resize
    baseline: Option<Dimensions>,
    pixel_ratio: f32,
    device: DeviceClass,
    user_agent: Option<String>,
}

impl Viewport {
    pub fn new(user_agent: Option<String>) -> Self {
        Viewport {
            dimensions: None,
            baseline: None,
            pixel_ratio: 1.0,
            device: DeviceClass::Desktop,
            user_agent,
        }
    }

    pub fn dimensions(&self) -> Option<Dimensions> {
        self.dimensions
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    pub fn device(&self) -> DeviceClass {
        self.device
    }

    /// Records a new canvas size and decides whether it warrants a reseed.
    ///
    /// The first resize is always significant. Later ones are significant when width or
    /// height moved by more than the new device class's threshold since the last
    /// significant resize.
    pub fn resize(
        &mut self,
        width: f32,
        height: f32,
        pixel_ratio: f32,
        config: &BubbleConfig,
    ) -> ResizeOutcome {
        let dimensions = Dimensions::new(width.max(0.0), height.max(0.0));
        let pixel_ratio = if pixel_ratio > 0.0 { pixel_ratio } else { 1.0 };
        let device = config.classify(dimensions.width, self.user_agent.as_deref());
        let threshold = config.device(device).resize_threshold;

        let significant = match self.baseline {
            None => true,
            Some(old) => {
                (dimensions.width - old.width).abs() > threshold
                    || (dimensions.height - old.height).abs() > threshold
            }
        };
        if significant {
            self.baseline = Some(dimensions);
        }

        self.dimensions = Some(dimensions);
        self.pixel_ratio = pixel_ratio;
        self.device = device;

        ResizeOutcome {
            dimensions,
            buffer_width: (dimensions.width * pixel_ratio).round() as u32,
            buffer_height: (dimensions.height * pixel_ratio).round() as u32,
            device,
            significant,
        }
    }
}

/// Last known pointer position in canvas coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pointer {
    position: Option<Vec2>,
}

impl Pointer {
    pub fn move_to(&mut self, position: Vec2) {
        self.position = Some(position);
    }

    pub fn leave(&mut self) {
        self.position = None;
    }

    pub fn position(&self) -> Option<Vec2> {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_resize_is_significant_and_scales_the_buffer() {
        let config = BubbleConfig::default();
        let mut viewport = Viewport::new(None);
        let outcome = viewport.resize(800.0, 600.0, 2.0, &config);
        assert!(outcome.significant);
        assert_eq!((outcome.buffer_width, outcome.buffer_height), (1600, 1200));
        assert_eq!(outcome.device, DeviceClass::Desktop);
    }

    #[test]
    fn small_desktop_changes_are_ignored() {
        let config = BubbleConfig::default();
        let mut viewport = Viewport::new(None);
        viewport.resize(800.0, 600.0, 1.0, &config);
        assert!(!viewport.resize(805.0, 600.0, 1.0, &config).significant);
        // deltas are measured from the last significant size
        assert!(viewport.resize(811.0, 600.0, 1.0, &config).significant);
    }

    #[test]
    fn mobile_threshold_absorbs_keyboard_jitter() {
        let config = BubbleConfig::default();
        let ua = "Mozilla/5.0 (Linux; Android 14; Pixel 8)";
        let mut viewport = Viewport::new(Some(ua.to_string()));
        viewport.resize(390.0, 844.0, 3.0, &config);
        assert_eq!(viewport.device(), DeviceClass::Mobile);

        // on-screen keyboard shrinks the height by ~60px
        assert!(!viewport.resize(390.0, 780.0, 3.0, &config).significant);
        assert!(viewport.resize(390.0, 600.0, 3.0, &config).significant);
    }

    #[test]
    fn narrowing_switches_to_mobile() {
        let config = BubbleConfig::default();
        let mut viewport = Viewport::new(None);
        viewport.resize(800.0, 600.0, 1.0, &config);
        let outcome = viewport.resize(400.0, 600.0, 1.0, &config);
        assert!(outcome.significant);
        assert_eq!(outcome.device, DeviceClass::Mobile);
    }

    #[test]
    fn pointer_tracks_and_clears() {
        let mut pointer = Pointer::default();
        pointer.move_to(Vec2::new(3.0, 4.0));
        assert_eq!(pointer.position(), Some(Vec2::new(3.0, 4.0)));
        pointer.leave();
        assert_eq!(pointer.position(), None);
    }
}
