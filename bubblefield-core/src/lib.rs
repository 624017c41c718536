//! Shared value types and seams for the bubble field simulation.
//!
//! The simulation crate owns all behavior; this crate only defines what the simulation
//! talks to: the drawing surface, the image source, the profile feed and the timers that
//! stand in for a browser event loop.

pub mod color;
pub mod entity;
pub mod image;
pub mod profile;
pub mod scheduler;
pub mod surface;

pub use glam::Vec2;

pub use color::{PaletteCursor, Rgba};
pub use entity::{BubbleId, IdAllocator};
pub use image::{ImageEvent, ImageHandle, ImageOutcome, ImageSource, Offline};
pub use profile::{dedupe_profiles, Profile, ProfileFeed};
pub use scheduler::{FramePacer, Millis, Scheduler};
pub use surface::{Dimensions, DrawCommand, RecordingSurface, Surface};
