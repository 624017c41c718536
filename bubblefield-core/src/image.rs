//! Decoded image handles and the seam through which avatar images are requested.

use crate::entity::BubbleId;
use std::fmt;
use std::sync::Arc;

/// A decoded RGBA8 image shared between the cache and every bubble that shows it.
#[derive(Clone)]
pub struct ImageHandle {
    inner: Arc<DecodedImage>,
}

struct DecodedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl ImageHandle {
    /// Wraps raw RGBA8 pixels. Returns `None` if the buffer does not match the size.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        if pixels.len() != expected {
            return None;
        }
        Some(ImageHandle {
            inner: Arc::new(DecodedImage {
                width,
                height,
                pixels,
            }),
        })
    }

    pub fn width(&self) -> u32 {
        self.inner.width
    }

    pub fn height(&self) -> u32 {
        self.inner.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.inner.pixels
    }

    /// True if both handles point at the same decoded image
    pub fn same_image(&self, other: &ImageHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("width", &self.inner.width)
            .field("height", &self.inner.height)
            .finish()
    }
}

/// Result of one avatar request
#[derive(Debug, Clone)]
pub enum ImageOutcome {
    Loaded(ImageHandle),
    Failed(String),
}

/// An image result addressed to the bubble that asked for it.
#[derive(Debug, Clone)]
pub struct ImageEvent {
    pub bubble: BubbleId,
    pub outcome: ImageOutcome,
}

/// Asynchronous image provider used by the simulation.
///
/// `request` must not block; results are collected on the render thread through
/// `drain`, which is called once per tick.
pub trait ImageSource {
    fn request(&mut self, bubble: BubbleId, url: &str);
    fn drain(&mut self) -> Vec<ImageEvent>;
}

/// An image source with no transport: every request fails on the next drain.
#[derive(Debug, Default)]
pub struct Offline {
    pending: Vec<ImageEvent>,
}

impl Offline {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ImageSource for Offline {
    fn request(&mut self, bubble: BubbleId, url: &str) {
        self.pending.push(ImageEvent {
            bubble,
            outcome: ImageOutcome::Failed(format!("no image transport for {url}")),
        });
    }

    fn drain(&mut self) -> Vec<ImageEvent> {
        std::mem::take(&mut self.pending)
    }
}
