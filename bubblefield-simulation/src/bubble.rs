use bubblefield_config::BubbleConfig;
use bubblefield_core::{
    BubbleId, Dimensions, IdAllocator, ImageHandle, ImageOutcome, ImageSource, Millis, Profile,
    Rgba, Surface, Vec2,
};
use rand::Rng;
use std::f32::consts::{PI, TAU};

/// Smallest radius ever used for drawing or collision.
pub const MIN_RADIUS: f32 = 0.1;

/// Radius floor for newly created bubbles and fragments.
const MIN_SPAWN_RADIUS: f32 = 1.0;
const MIN_FRAGMENT_RADIUS: f32 = 0.5;

/// Pop progress right after a pop starts, so a popping bubble is never mistaken for an idle one.
const POP_START: f32 = 0.01;

/// Fraction of the remaining opacity gap closed per frame while fading out.
const FADE_OUT_RATE: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Interactive bubble: collides, can be popped
    Normal,
    /// Pop fragment: only fades and shrinks
    Particle,
}

/// Lifecycle of an entity.
///
/// Normal bubbles go `Spawning -> Live -> Popping`; particles are always `Decaying`.
/// Progress values only ever increase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    Spawning(f32),
    Live,
    Popping(f32),
    Decaying,
}

#[derive(Debug, Clone)]
pub enum LoadState {
    NotRequested,
    Loading { since: Millis },
    Loaded(ImageHandle),
}

/// A profile attached to a bubble, plus the state of its image.
///
/// A failed or timed-out load removes the binding altogether.
#[derive(Debug, Clone)]
pub struct AvatarBinding {
    pub profile: Profile,
    pub state: LoadState,
}

impl AvatarBinding {
    pub fn is_loaded(&self) -> bool {
        matches!(self.state, LoadState::Loaded(_))
    }
}

#[derive(Debug, Clone)]
pub struct Bubble {
    id: BubbleId,
    kind: Kind,
    phase: Phase,
    pub(crate) position: Vec2,
    pub(crate) velocity: Vec2,
    radius: f32,
    target_radius: f32,
    opacity: f32,
    target_opacity: f32,
    color: Rgba,
    avatar: Option<AvatarBinding>,
    marked_for_removal: bool,
    age: u32,
}

impl Bubble {
    /// A new interactive bubble. It starts invisible and grows in over the spawn animation.
    pub fn normal<R: Rng + ?Sized>(
        id: BubbleId,
        position: Vec2,
        radius: f32,
        color: Rgba,
        profile: Option<Profile>,
        config: &BubbleConfig,
        rng: &mut R,
    ) -> Self {
        let speed = config.physics.initial_speed;
        Bubble {
            id,
            kind: Kind::Normal,
            phase: Phase::Spawning(0.0),
            position,
            velocity: Vec2::new(
                (rng.gen::<f32>() - 0.5) * 2.0 * speed,
                (rng.gen::<f32>() - 0.5) * 2.0 * speed,
            ),
            radius: 0.0,
            target_radius: radius.max(MIN_SPAWN_RADIUS),
            opacity: 0.0,
            target_opacity: 1.0,
            color,
            avatar: profile.map(|profile| AvatarBinding {
                profile,
                state: LoadState::NotRequested,
            }),
            marked_for_removal: false,
            age: 0,
        }
    }

    /// A pop fragment: full size and opacity at birth, flying off in a random direction.
    pub fn particle<R: Rng + ?Sized>(
        id: BubbleId,
        position: Vec2,
        radius: f32,
        color: Rgba,
        config: &BubbleConfig,
        rng: &mut R,
    ) -> Self {
        let speed = config.particles.max_speed;
        Bubble {
            id,
            kind: Kind::Particle,
            phase: Phase::Decaying,
            position,
            velocity: Vec2::new(
                (rng.gen::<f32>() - 0.5) * 2.0 * speed,
                (rng.gen::<f32>() - 0.5) * 2.0 * speed,
            ),
            radius,
            target_radius: radius.max(MIN_SPAWN_RADIUS),
            opacity: 1.0,
            target_opacity: 0.0,
            color,
            avatar: None,
            marked_for_removal: false,
            age: 0,
        }
    }

    pub fn id(&self) -> BubbleId {
        self.id
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn target_radius(&self) -> f32 {
        self.target_radius
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn color(&self) -> Rgba {
        self.color
    }

    pub fn avatar(&self) -> Option<&AvatarBinding> {
        self.avatar.as_ref()
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn is_particle(&self) -> bool {
        self.kind == Kind::Particle
    }

    pub fn is_marked_for_removal(&self) -> bool {
        self.marked_for_removal
    }

    pub fn spawn_progress(&self) -> f32 {
        match self.phase {
            Phase::Spawning(p) => p,
            _ => 1.0,
        }
    }

    /// 0 unless the bubble is popping
    pub fn pop_progress(&self) -> f32 {
        match self.phase {
            Phase::Popping(p) => p,
            _ => 0.0,
        }
    }

    /// Fully spawned, not popping, not a fragment
    pub fn is_poppable(&self) -> bool {
        self.kind == Kind::Normal && self.phase == Phase::Live && !self.marked_for_removal
    }

    /// Takes part in collision resolution
    pub fn collides(&self) -> bool {
        self.kind == Kind::Normal && !self.marked_for_removal
    }

    /// Radius used when drawing: eased in while spawning, pulsing while popping.
    pub fn draw_radius(&self, config: &BubbleConfig) -> f32 {
        let r = match self.phase {
            Phase::Spawning(p) => self.target_radius * ease_out_cubic(p),
            Phase::Popping(p) if p < 1.0 => {
                self.radius * (1.0 + (config.animation.pop_scale - 1.0) * (p * PI).sin())
            }
            _ => self.radius,
        };
        r.max(MIN_RADIUS)
    }

    /// Advances one frame of animation and physics.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        area: Dimensions,
        pointer: Option<Vec2>,
        config: &BubbleConfig,
        rng: &mut R,
    ) {
        self.age = self.age.saturating_add(1);

        if let Phase::Spawning(progress) = self.phase {
            let progress = advance(progress, config.animation.spawn_frames);
            self.radius = self.target_radius * ease_out_cubic(progress);
            self.phase = if progress >= 1.0 {
                Phase::Live
            } else {
                Phase::Spawning(progress)
            };
        }

        if self.opacity < self.target_opacity {
            self.opacity += (self.target_opacity - self.opacity) * config.animation.fade_in_rate;
        } else if self.opacity > self.target_opacity {
            self.opacity += (self.target_opacity - self.opacity) * FADE_OUT_RATE;
        }

        if let Some(pointer) = pointer {
            if matches!(self.phase, Phase::Spawning(_) | Phase::Live) {
                self.repel_from(pointer, config);
            }
        }

        self.velocity *= config.physics.friction;
        self.position += self.velocity;
        self.bounce_off_edges(area, config, rng);

        match self.phase {
            Phase::Decaying => {
                self.opacity -= config.particles.fade_per_frame;
                self.radius = (self.radius - config.particles.shrink_per_frame).max(0.0);
                if self.opacity <= 0.0 || self.radius <= MIN_RADIUS {
                    self.opacity = self.opacity.max(0.0);
                    self.marked_for_removal = true;
                }
            }
            Phase::Popping(progress) => {
                let progress = advance(progress, config.animation.pop_frames);
                self.phase = Phase::Popping(progress);
                if progress >= 1.0 {
                    self.marked_for_removal = true;
                }
            }
            Phase::Spawning(_) | Phase::Live => {}
        }
    }

    fn repel_from(&mut self, pointer: Vec2, config: &BubbleConfig) {
        let max_distance = config.pointer.max_repel_distance;
        let strength = config.pointer.repel_force;
        if max_distance <= 0.0 || strength <= 0.0 {
            return;
        }

        let offset = self.position - pointer;
        let distance = offset.length();
        if distance > 0.0 && distance < max_distance {
            let force = (1.0 - distance / max_distance) * strength;
            self.velocity += offset / distance * force;
        }
    }

    fn bounce_off_edges<R: Rng + ?Sized>(
        &mut self,
        area: Dimensions,
        config: &BubbleConfig,
        rng: &mut R,
    ) {
        let damping = config.physics.bounce_damping;
        let jitter = config.physics.bounce_jitter;
        let r = self.radius;

        if self.position.x - r < 0.0 || self.position.x + r > area.width {
            self.velocity.x *= -damping;
            self.position.x = clamp_inside(self.position.x, r, area.width);
            self.velocity.y += (rng.gen::<f32>() - 0.5) * jitter;
        }

        if self.position.y - r < 0.0 || self.position.y + r > area.height {
            self.velocity.y *= -damping;
            self.position.y = clamp_inside(self.position.y, r, area.height);
            self.velocity.x += (rng.gen::<f32>() - 0.5) * jitter;
        }
    }

    /// Starts the pop animation and returns the fragments it throws off.
    ///
    /// Only live bubbles pop; anything else returns no fragments and is left untouched.
    pub fn pop<R: Rng + ?Sized>(
        &mut self,
        ids: &mut IdAllocator,
        config: &BubbleConfig,
        rng: &mut R,
    ) -> Vec<Bubble> {
        if !self.is_poppable() {
            return Vec::new();
        }
        self.phase = Phase::Popping(POP_START);
        self.target_opacity = 0.0;

        let settings = &config.particles;
        (0..settings.count)
            .map(|_| {
                let r = rng
                    .gen_range(settings.min_radius..=settings.max_radius)
                    .max(MIN_FRAGMENT_RADIUS);
                Bubble::particle(ids.next(), self.position, r, self.color, config, rng)
            })
            .collect()
    }

    /// Asks `source` for the avatar image, once.
    pub fn request_avatar<S: ImageSource + ?Sized>(&mut self, source: &mut S, now: Millis) {
        if let Some(binding) = &mut self.avatar {
            if matches!(binding.state, LoadState::NotRequested) {
                binding.state = LoadState::Loading { since: now };
                source.request(self.id, &binding.profile.image_url);
            }
        }
    }

    /// Applies a finished load. Failures drop the binding so the bubble stays solid.
    pub fn apply_image(&mut self, outcome: ImageOutcome) {
        let loading = matches!(
            self.avatar,
            Some(AvatarBinding {
                state: LoadState::Loading { .. },
                ..
            })
        );
        if !loading {
            return;
        }
        match outcome {
            ImageOutcome::Loaded(image) => {
                if let Some(binding) = &mut self.avatar {
                    binding.state = LoadState::Loaded(image);
                }
            }
            ImageOutcome::Failed(_) => self.avatar = None,
        }
    }

    /// Drops an avatar that has been loading for `timeout` ms or more. Returns true if it did.
    pub fn expire_avatar(&mut self, now: Millis, timeout: Millis) -> bool {
        let expired = matches!(
            self.avatar,
            Some(AvatarBinding {
                state: LoadState::Loading { since },
                ..
            }) if now.saturating_sub(since) >= timeout
        );
        if expired {
            self.avatar = None;
        }
        expired
    }

    /// Draws the bubble unless it is well outside `area`.
    pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S, area: Dimensions, config: &BubbleConfig) {
        let margin = self.radius + config.render.cull_distance;
        if !area.overlaps_circle(self.position, margin) {
            return;
        }

        let r = self.draw_radius(config);
        surface.save();
        surface.set_global_alpha(self.opacity);
        surface.begin_path();
        surface.arc(self.position, r, 0.0, TAU);

        match self.avatar.as_ref().map(|binding| &binding.state) {
            Some(LoadState::Loaded(image)) => self.draw_avatar(surface, image, r, config),
            _ => self.draw_solid(surface, config),
        }

        surface.restore();
    }

    fn draw_solid<S: Surface + ?Sized>(&self, surface: &mut S, config: &BubbleConfig) {
        surface.fill(self.color);
        surface.stroke(
            config.render.outline.scale_alpha(self.opacity),
            config.render.outline_width,
        );
    }

    fn draw_avatar<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        image: &ImageHandle,
        r: f32,
        config: &BubbleConfig,
    ) {
        let render = &config.render;

        surface.clip();
        surface.fill(render.avatar_backdrop);
        let image_radius = (r - render.avatar_padding).max(MIN_RADIUS);
        surface.draw_image(
            image,
            self.position - Vec2::splat(image_radius),
            Vec2::splat(image_radius * 2.0),
        );

        // drop the clip before drawing the borders
        surface.restore();
        surface.save();
        surface.set_global_alpha(self.opacity);

        surface.begin_path();
        surface.arc(self.position, r, 0.0, TAU);
        surface.stroke(
            render.avatar_border.scale_alpha(self.opacity),
            render.avatar_border_width,
        );

        surface.begin_path();
        surface.arc(
            self.position,
            (r - render.avatar_border_width / 2.0).max(MIN_RADIUS),
            0.0,
            TAU,
        );
        surface.stroke(render.avatar_inner_border.scale_alpha(self.opacity), 1.0);
    }

    /// A fully spawned, fully opaque bubble.
    #[cfg(test)]
    pub(crate) fn settled(id: BubbleId, position: Vec2, radius: f32, color: Rgba) -> Self {
        Bubble {
            id,
            kind: Kind::Normal,
            phase: Phase::Live,
            position,
            velocity: Vec2::ZERO,
            radius,
            target_radius: radius,
            opacity: 1.0,
            target_opacity: 1.0,
            color,
            avatar: None,
            marked_for_removal: false,
            age: 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }
}

/// Steps a progress counter by one frame of an animation `frames` long, snapping to 1 at the end.
fn advance(progress: f32, frames: u32) -> f32 {
    let next = progress + 1.0 / frames.max(1) as f32;
    if next >= 1.0 - 1e-4 {
        1.0
    } else {
        next
    }
}

fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Clamps a coordinate so a circle of radius `r` stays inside `[0, extent]`.
/// Circles wider than the extent are centered.
fn clamp_inside(value: f32, r: f32, extent: f32) -> f32 {
    if extent <= 2.0 * r {
        extent / 2.0
    } else {
        value.clamp(r, extent - r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bubblefield_core::{DrawCommand, Offline, RecordingSurface};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const GRAY: Rgba = Rgba::rgb(0x33, 0x33, 0x33);

    fn area() -> Dimensions {
        Dimensions::new(800.0, 600.0)
    }

    fn spawned(config: &BubbleConfig, rng: &mut StdRng) -> Bubble {
        let mut bubble = Bubble::normal(
            BubbleId::new(1),
            Vec2::new(400.0, 300.0),
            30.0,
            GRAY,
            None,
            config,
            rng,
        );
        for _ in 0..config.animation.spawn_frames {
            bubble.update(area(), None, config, rng);
        }
        bubble
    }

    #[test]
    fn spawn_eases_radius_and_reaches_live() {
        let config = BubbleConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut bubble = Bubble::normal(
            BubbleId::new(1),
            Vec2::new(400.0, 300.0),
            30.0,
            GRAY,
            None,
            &config,
            &mut rng,
        );
        assert_eq!(bubble.radius(), 0.0);
        assert_eq!(bubble.opacity(), 0.0);

        let mut last = 0.0;
        for _ in 0..config.animation.spawn_frames {
            bubble.update(area(), None, &config, &mut rng);
            assert!(bubble.spawn_progress() >= last);
            last = bubble.spawn_progress();
        }
        assert_eq!(bubble.phase(), Phase::Live);
        assert!((bubble.radius() - 30.0).abs() < 1e-3);
        assert!(bubble.opacity() > 0.9);
        assert_eq!(bubble.age(), config.animation.spawn_frames);
    }

    #[test]
    fn only_live_bubbles_pop() {
        let config = BubbleConfig::default();
        let mut rng = StdRng::seed_from_u64(2);
        let mut ids = IdAllocator::new();
        let mut fresh = Bubble::normal(
            ids.next(),
            Vec2::new(100.0, 100.0),
            30.0,
            GRAY,
            None,
            &config,
            &mut rng,
        );
        assert!(fresh.pop(&mut ids, &config, &mut rng).is_empty());
        assert_eq!(fresh.pop_progress(), 0.0);

        let mut bubble = spawned(&config, &mut rng);
        let fragments = bubble.pop(&mut ids, &config, &mut rng);
        assert_eq!(fragments.len(), 4);
        assert!(bubble.pop_progress() > 0.0);
        assert!(fragments.iter().all(|f| f.is_particle()
            && f.avatar().is_none()
            && f.color() == GRAY
            && f.position() == bubble.position()
            && (0.5..=4.0).contains(&f.radius())));

        // popping twice is a no-op
        let before = bubble.pop_progress();
        assert!(bubble.pop(&mut ids, &config, &mut rng).is_empty());
        assert_eq!(bubble.pop_progress(), before);
    }

    #[test]
    fn pop_animation_marks_for_removal() {
        let config = BubbleConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut ids = IdAllocator::new();
        let mut bubble = spawned(&config, &mut rng);
        bubble.pop(&mut ids, &config, &mut rng);

        let mut frames = 0;
        while !bubble.is_marked_for_removal() {
            bubble.update(area(), None, &config, &mut rng);
            frames += 1;
            assert!(frames <= config.animation.pop_frames);
        }
        assert_eq!(bubble.pop_progress(), 1.0);
    }

    #[test]
    fn particles_always_decay_away() {
        let config = BubbleConfig::default();
        let mut rng = StdRng::seed_from_u64(4);
        for seed in 0..20u64 {
            let radius = 1.0 + seed as f32 * 0.15;
            let mut particle = Bubble::particle(
                BubbleId::new(seed),
                Vec2::new(50.0, 50.0),
                radius,
                GRAY,
                &config,
                &mut rng,
            );
            let mut frames = 0;
            while !particle.is_marked_for_removal() {
                let (opacity, r) = (particle.opacity(), particle.radius());
                particle.update(area(), None, &config, &mut rng);
                assert!(particle.opacity() < opacity);
                assert!(particle.radius() < r || particle.radius() == 0.0);
                frames += 1;
                assert!(frames < 100, "particle never expired");
            }
            assert!(particle.radius() >= 0.0);
        }
    }

    #[test]
    fn draw_radius_never_collapses() {
        let config = BubbleConfig::default();
        let mut rng = StdRng::seed_from_u64(5);
        let mut ids = IdAllocator::new();
        let mut bubble = Bubble::normal(
            ids.next(),
            Vec2::new(400.0, 300.0),
            30.0,
            GRAY,
            None,
            &config,
            &mut rng,
        );
        assert!(bubble.draw_radius(&config) >= MIN_RADIUS);
        for _ in 0..config.animation.spawn_frames {
            bubble.update(area(), None, &config, &mut rng);
            assert!(bubble.draw_radius(&config) >= MIN_RADIUS);
        }
        let fragments = bubble.pop(&mut ids, &config, &mut rng);
        for mut fragment in fragments {
            while !fragment.is_marked_for_removal() {
                fragment.update(area(), None, &config, &mut rng);
                assert!(fragment.draw_radius(&config) >= MIN_RADIUS);
            }
        }
        // pulses above its resting size mid-pop
        bubble.update(area(), None, &config, &mut rng);
        assert!(bubble.draw_radius(&config) > bubble.radius());
    }

    #[test]
    fn stays_inside_the_canvas() {
        let config = BubbleConfig::default();
        let mut rng = StdRng::seed_from_u64(6);
        let mut bubble = Bubble::settled(BubbleId::new(1), Vec2::new(790.0, 5.0), 30.0, GRAY)
            .with_velocity(Vec2::new(25.0, -25.0));
        for _ in 0..200 {
            bubble.update(area(), None, &config, &mut rng);
            let p = bubble.position();
            let r = bubble.radius();
            assert!(p.x >= r && p.x <= 800.0 - r, "x = {}", p.x);
            assert!(p.y >= r && p.y <= 600.0 - r, "y = {}", p.y);
        }

        // wider than the canvas: centered instead of panicking
        let tiny = Dimensions::new(40.0, 40.0);
        bubble.update(tiny, None, &config, &mut rng);
        assert_eq!(bubble.position(), Vec2::new(20.0, 20.0));
    }

    #[test]
    fn pointer_repulsion_is_off_by_default() {
        let mut config = BubbleConfig::default();
        config.physics.friction = 1.0;
        let mut rng = StdRng::seed_from_u64(7);
        let mut bubble = Bubble::settled(BubbleId::new(1), Vec2::new(400.0, 300.0), 30.0, GRAY);
        bubble.update(area(), Some(Vec2::new(390.0, 300.0)), &config, &mut rng);
        assert_eq!(bubble.velocity(), Vec2::ZERO);

        config.pointer.repel_force = 2.0;
        config.pointer.max_repel_distance = 100.0;
        bubble.update(area(), Some(Vec2::new(390.0, 300.0)), &config, &mut rng);
        assert!(bubble.velocity().x > 0.0);
    }

    #[test]
    fn avatar_failure_and_timeout_fall_back_to_solid() {
        let config = BubbleConfig::default();
        let mut rng = StdRng::seed_from_u64(8);
        let profile = Profile::new("Ada", "https://unreachable.invalid/ada.png");
        let mut source = Offline::new();

        let mut failed = Bubble::normal(
            BubbleId::new(1),
            Vec2::new(100.0, 100.0),
            30.0,
            GRAY,
            Some(profile.clone()),
            &config,
            &mut rng,
        );
        failed.request_avatar(&mut source, 0);
        for event in source.drain() {
            failed.apply_image(event.outcome);
        }
        assert!(failed.avatar().is_none());

        let mut stuck = Bubble::normal(
            BubbleId::new(2),
            Vec2::new(100.0, 100.0),
            30.0,
            GRAY,
            Some(profile),
            &config,
            &mut rng,
        );
        stuck.request_avatar(&mut source, 1000);
        assert!(!stuck.expire_avatar(5999, 5000));
        assert!(stuck.expire_avatar(6000, 5000));
        assert!(stuck.avatar().is_none());
    }

    #[test]
    fn draws_avatar_or_solid_but_never_both() {
        let config = BubbleConfig::default();
        let mut rng = StdRng::seed_from_u64(9);
        let mut bubble = Bubble::normal(
            BubbleId::new(1),
            Vec2::new(100.0, 100.0),
            30.0,
            GRAY,
            Some(Profile::new("Ada", "ada.png")),
            &config,
            &mut rng,
        );
        let mut source = Offline::new();
        bubble.request_avatar(&mut source, 0);

        let mut surface = RecordingSurface::new();
        surface.clear(area());
        bubble.draw(&mut surface, area(), &config);
        assert_eq!(surface.image_count(), 0);
        assert!(surface.commands().contains(&DrawCommand::Fill(GRAY)));
        assert!(surface.is_balanced());

        let image = ImageHandle::from_rgba(1, 1, vec![255; 4]).unwrap();
        bubble.apply_image(ImageOutcome::Loaded(image));
        assert!(bubble.avatar().is_some_and(AvatarBinding::is_loaded));

        surface.clear(area());
        bubble.draw(&mut surface, area(), &config);
        assert_eq!(surface.image_count(), 1);
        assert!(!surface.commands().contains(&DrawCommand::Fill(GRAY)));
        assert!(surface.commands().contains(&DrawCommand::Clip));
        assert!(surface.is_balanced());
    }

    #[test]
    fn culls_far_offscreen_bubbles() {
        let config = BubbleConfig::default();
        let bubble = Bubble::settled(BubbleId::new(1), Vec2::new(-500.0, 300.0), 30.0, GRAY);
        let mut surface = RecordingSurface::new();
        surface.clear(area());
        bubble.draw(&mut surface, area(), &config);
        assert_eq!(surface.commands().len(), 1);
    }
}
