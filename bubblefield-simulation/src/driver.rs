use crate::bubble::Bubble;
use crate::grid::CollisionGrid;
use crate::profiles::ProfilePicker;
use crate::respawn::RespawnQueue;
use crate::viewport::{Pointer, ResizeOutcome, Viewport};
use bubblefield_config::{BubbleConfig, ConfigError, DeviceClass, DeviceProfile};
use bubblefield_core::{
    BubbleId, Dimensions, FramePacer, IdAllocator, ImageOutcome, ImageSource, Millis,
    PaletteCursor, Profile, ProfileFeed, Scheduler, Surface, Vec2,
};
use log::{debug, info, warn};
use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use smallvec::SmallVec;
use std::sync::Arc;

/// Shown instead of avatars when the profile source has failed.
pub const PROFILE_NOTICE: &str = "Profiles unavailable; showing plain bubbles";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timer {
    AutoPop,
    RespawnDrain,
    SeedStep,
    ResizeDebounce,
}

/// Owns the active bubble collection and drives it frame by frame.
///
/// The host calls [`Simulation::tick`] from its animation loop with a monotonic timestamp.
/// Each tick applies finished image loads, fires due timers (auto-pop, respawn drain,
/// staggered seeding, resize debounce) and, if the frame pacer allows, runs one simulation
/// step and draws. Input handlers mutate the collection directly between ticks.
pub struct Simulation<S> {
    config: Arc<BubbleConfig>,
    source: S,
    rng: StdRng,
    ids: IdAllocator,
    palette: PaletteCursor,
    bubbles: Vec<Bubble>,
    respawns: RespawnQueue,
    timers: Scheduler<Timer>,
    pacer: FramePacer,
    grid: CollisionGrid,
    viewport: Viewport,
    pointer: Pointer,
    picker: ProfilePicker,
    profiles: ProfileFeed,
    /// Bubbles still to be created by the running seed
    pending_seed: usize,
    mounted: bool,
    frames: u64,
}

impl<S: ImageSource> Simulation<S> {
    /// Fails if `config` does not pass [`BubbleConfig::validate`].
    pub fn new(config: Arc<BubbleConfig>, source: S, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Simulation {
            palette: PaletteCursor::new(config.render.palette.clone()),
            pacer: FramePacer::new(config.desktop.target_fps),
            picker: ProfilePicker::new(config.avatars.rotation_threshold),
            config,
            source,
            rng: StdRng::seed_from_u64(seed),
            ids: IdAllocator::new(),
            bubbles: Vec::new(),
            respawns: RespawnQueue::new(),
            timers: Scheduler::new(),
            grid: CollisionGrid::new(),
            viewport: Viewport::new(None),
            pointer: Pointer::default(),
            profiles: ProfileFeed::Loading,
            pending_seed: 0,
            mounted: false,
            frames: 0,
        })
    }

    /// Enables user-agent based mobile detection
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.viewport = Viewport::new(Some(user_agent.into()));
        self
    }

    // --- Lifecycle ---

    /// Starts the auxiliary timers and seeds the field if the canvas size is known.
    pub fn mount(&mut self, now: Millis) {
        if self.mounted {
            return;
        }
        self.mounted = true;
        self.pacer.reset();
        self.timers
            .every(Timer::AutoPop, self.config.timing.auto_pop_interval_ms, now);
        self.timers
            .every(Timer::RespawnDrain, self.config.timing.rate_limit_interval_ms, now);
        info!("Bubble field mounted");

        if self.viewport.dimensions().is_some() {
            self.start_seed(now);
        }
    }

    /// Cancels every timer and drops all state. Late image results are ignored afterwards.
    pub fn unmount(&mut self) {
        self.timers.clear();
        self.pacer.reset();
        self.bubbles.clear();
        self.respawns.clear();
        self.pointer.leave();
        self.pending_seed = 0;
        self.mounted = false;
        info!("Bubble field unmounted after {} frames", self.frames);
    }

    /// Records a new canvas size. Significant changes reseed the field once the debounce
    /// delay passes without another significant resize.
    pub fn resize(&mut self, width: f32, height: f32, pixel_ratio: f32, now: Millis) -> ResizeOutcome {
        let outcome = self.viewport.resize(width, height, pixel_ratio, &self.config);
        self.pacer
            .set_target_fps(self.config.device(outcome.device).target_fps);

        if outcome.significant && self.mounted {
            self.timers
                .once(Timer::ResizeDebounce, self.config.timing.resize_debounce_ms, now);
            debug!(
                "Significant resize to {}x{} ({:?}), reseed scheduled",
                width, height, outcome.device
            );
        }
        outcome
    }

    // --- Frame Loop ---

    /// Runs one iteration of the host loop. Returns true if a frame was drawn.
    pub fn tick<T: Surface + ?Sized>(&mut self, now: Millis, surface: &mut T) -> bool {
        if !self.mounted {
            return false;
        }

        self.apply_image_events();
        self.expire_avatars(now);

        for timer in self.timers.fire_due(now) {
            match timer {
                Timer::AutoPop => {
                    self.pop_random(now);
                }
                Timer::RespawnDrain => {
                    self.drain_respawns(now);
                }
                Timer::SeedStep => self.seed_step(now),
                Timer::ResizeDebounce => self.start_seed(now),
            }
        }

        if !self.pacer.ready(now) {
            return false;
        }
        self.step();
        self.render(surface);
        true
    }

    /// Update, remove finished entities, cap particles, resolve collisions.
    pub fn step(&mut self) {
        let Some(area) = self.viewport.dimensions() else {
            return;
        };
        let pointer = self.pointer.position();

        for bubble in &mut self.bubbles {
            bubble.update(area, pointer, &self.config, &mut self.rng);
        }

        let cap = self.config.particles.max_particles;
        let mut particles = 0;
        self.bubbles.retain(|bubble| {
            if bubble.is_marked_for_removal() {
                return false;
            }
            if bubble.is_particle() {
                particles += 1;
                return particles <= cap;
            }
            true
        });

        let device = self.config.device(self.viewport.device());
        self.grid.resolve(
            &mut self.bubbles,
            area,
            device.grid_cell_size,
            device.collision_damping,
            self.config.physics.collision_jitter,
            &mut self.rng,
        );
        self.frames += 1;
    }

    /// Draws every bubble in collection order.
    pub fn render<T: Surface + ?Sized>(&self, surface: &mut T) {
        let Some(area) = self.viewport.dimensions() else {
            return;
        };
        surface.clear(area);
        surface.set_scale(self.viewport.pixel_ratio());
        for bubble in &self.bubbles {
            bubble.draw(surface, area, &self.config);
        }
    }

    // --- Seeding & Respawn ---

    fn start_seed(&mut self, now: Millis) {
        let Some(area) = self.viewport.dimensions() else {
            return;
        };
        let count = self.device_profile().bubble_count;

        self.bubbles.clear();
        self.respawns.clear();
        self.picker.reset();
        self.palette.reset();
        self.pending_seed = count;
        self.timers
            .every(Timer::SeedStep, self.config.timing.spawn_stagger_ms, now);
        info!(
            "Seeding {} bubbles into {}x{} ({:?})",
            count,
            area.width,
            area.height,
            self.viewport.device()
        );
    }

    fn seed_step(&mut self, now: Millis) {
        if self.pending_seed > 0 && self.spawn_bubble(now).is_some() {
            self.pending_seed -= 1;
        }
        if self.pending_seed == 0 {
            self.timers.cancel(Timer::SeedStep);
            debug!("Seeding complete with {} bubbles", self.bubbles.len());
        }
    }

    /// Creates one bubble at a random position, possibly carrying an avatar.
    fn spawn_bubble(&mut self, now: Millis) -> Option<BubbleId> {
        let area = self.viewport.dimensions()?;
        let (min_radius, max_radius) = {
            let device = self.device_profile();
            (device.min_radius, device.max_radius)
        };

        let radius = self.rng.gen_range(min_radius..=max_radius).max(1.0);
        let position = Vec2::new(
            random_coordinate(area.width, max_radius, &mut self.rng),
            random_coordinate(area.height, max_radius, &mut self.rng),
        );
        let color = self.palette.next_color();
        let profile = self.choose_profile();
        let id = self.ids.next();

        let mut bubble = Bubble::normal(
            id,
            position,
            radius,
            color,
            profile,
            &self.config,
            &mut self.rng,
        );
        bubble.request_avatar(&mut self.source, now);
        self.bubbles.push(bubble);
        Some(id)
    }

    fn choose_profile(&mut self) -> Option<Profile> {
        let profiles = self.profiles.profiles();
        if profiles.is_empty() || self.rng.gen::<f32>() >= self.config.avatars.profile_ratio {
            return None;
        }
        self.picker.pick(profiles, &mut self.rng).cloned()
    }

    /// Creates one bubble for every respawn that is due. Returns how many were created.
    pub fn drain_respawns(&mut self, now: Millis) -> usize {
        let due = self.respawns.take_due(now);
        for _ in 0..due {
            self.spawn_bubble(now);
        }
        if due > 0 {
            debug!("Respawned {} bubble(s), {} still queued", due, self.respawns.len());
        }
        due
    }

    // --- Popping ---

    /// Pops one uniformly chosen live bubble.
    pub fn pop_random(&mut self, now: Millis) -> Option<BubbleId> {
        let candidates: SmallVec<[usize; 32]> = self
            .bubbles
            .iter()
            .enumerate()
            .filter(|(_, bubble)| bubble.is_poppable())
            .map(|(index, _)| index)
            .collect();
        let index = *candidates.choose(&mut self.rng)?;
        self.pop_at(index, now)
    }

    /// Pops the bubble at `index`, moves it behind the others, appends its fragments and
    /// queues one respawn.
    fn pop_at(&mut self, index: usize, now: Millis) -> Option<BubbleId> {
        if !self.bubbles.get(index)?.is_poppable() {
            return None;
        }
        let mut bubble = self.bubbles.remove(index);
        let fragments = bubble.pop(&mut self.ids, &self.config, &mut self.rng);
        let id = bubble.id();

        self.bubbles.push(bubble);
        self.bubbles.extend(fragments);
        self.respawns
            .push(now + self.config.timing.respawn_delay_ms);
        debug!("Popped bubble {}", id.id());
        Some(id)
    }

    // --- Input ---

    /// Pops the live bubble closest to the click, if the click hit any.
    pub fn click(&mut self, x: f32, y: f32, now: Millis) -> Option<BubbleId> {
        if !self.mounted {
            return None;
        }
        let point = Vec2::new(x, y);
        let (index, _) = self
            .bubbles
            .iter()
            .enumerate()
            .filter(|(_, bubble)| bubble.is_poppable())
            .map(|(index, bubble)| (index, bubble.position().distance(point), bubble.radius()))
            .filter(|&(_, distance, radius)| distance < radius)
            .map(|(index, distance, _)| (index, distance))
            .min_by_key(|&(_, distance)| OrderedFloat(distance))?;
        self.pop_at(index, now)
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.pointer.move_to(Vec2::new(x, y));
    }

    pub fn pointer_leave(&mut self) {
        self.pointer.leave();
    }

    // --- Images & Profiles ---

    /// Replaces the profile list. Only bubbles created afterwards pick from it.
    pub fn set_profiles(&mut self, feed: ProfileFeed) {
        match &feed {
            ProfileFeed::Ready(profiles) => info!("Using {} profiles for avatars", profiles.len()),
            ProfileFeed::Failed(reason) => {
                warn!("Profile source failed ({reason}); continuing without avatars")
            }
            ProfileFeed::Loading => {}
        }
        self.profiles = feed;
        self.picker.reset();
    }

    /// A short user-facing notice, present only while the profile source is failing
    pub fn profile_notice(&self) -> Option<&'static str> {
        self.profiles.error().map(|_| PROFILE_NOTICE)
    }

    fn apply_image_events(&mut self) {
        for event in self.source.drain() {
            if let ImageOutcome::Failed(reason) = &event.outcome {
                debug!("Avatar for bubble {} failed: {}", event.bubble.id(), reason);
            }
            if let Some(bubble) = self.bubbles.iter_mut().find(|b| b.id() == event.bubble) {
                bubble.apply_image(event.outcome);
            }
        }
    }

    fn expire_avatars(&mut self, now: Millis) {
        let timeout = self.config.timing.avatar_load_timeout_ms;
        for bubble in &mut self.bubbles {
            if bubble.expire_avatar(now, timeout) {
                warn!(
                    "Avatar for bubble {} timed out after {} ms",
                    bubble.id().id(),
                    timeout
                );
            }
        }
    }

    // --- Accessors ---

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    pub fn normal_count(&self) -> usize {
        self.bubbles.iter().filter(|b| !b.is_particle()).count()
    }

    pub fn particle_count(&self) -> usize {
        self.bubbles.iter().filter(|b| b.is_particle()).count()
    }

    pub fn respawn_queue(&self) -> &RespawnQueue {
        &self.respawns
    }

    pub fn dimensions(&self) -> Option<Dimensions> {
        self.viewport.dimensions()
    }

    pub fn device(&self) -> DeviceClass {
        self.viewport.device()
    }

    pub fn frame_interval_ms(&self) -> f64 {
        self.pacer.interval_ms()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn is_seeding(&self) -> bool {
        self.pending_seed > 0
    }

    pub fn scheduled_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn device_profile(&self) -> &DeviceProfile {
        self.config.device(self.viewport.device())
    }
}

/// Uniform coordinate keeping `margin` clear of both edges; centered if the extent is too small.
fn random_coordinate<R: Rng + ?Sized>(extent: f32, margin: f32, rng: &mut R) -> f32 {
    if extent > 2.0 * margin {
        rng.gen::<f32>() * (extent - 2.0 * margin) + margin
    } else {
        extent / 2.0
    }
}
