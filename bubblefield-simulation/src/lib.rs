//! The bubble field: entities, collisions, timers and input handling.
//!
//! [`Simulation`] owns every bubble in a single `Vec` and is driven by explicit millisecond
//! timestamps, so it runs the same inside a browser-style animation loop, a headless runner
//! or a unit test.

mod bubble;
mod driver;
mod grid;
mod profiles;
mod respawn;
mod viewport;

// --- Entities ---
pub use bubble::{AvatarBinding, Bubble, Kind, LoadState, Phase, MIN_RADIUS};

// --- Systems ---
pub use driver::{Simulation, PROFILE_NOTICE};
pub use grid::CollisionGrid;
pub use profiles::ProfilePicker;
pub use respawn::RespawnQueue;

// --- Input ---
pub use viewport::{Pointer, ResizeOutcome, Viewport};
