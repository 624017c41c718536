use bubblefield_core::Rgba;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

// --- Error Type ---
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

// --- Device Classes ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    Desktop,
    Mobile,
}

/// Per-device tuning, selected once per resize.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DeviceProfile {
    pub bubble_count: usize,
    pub min_radius: f32,
    pub max_radius: f32,
    pub target_fps: u32,
    pub grid_cell_size: f32,
    /// Velocity scale applied when two bubbles exchange velocities
    pub collision_damping: f32,
    /// Width or height change (px) that counts as a significant resize
    pub resize_threshold: f32,
}

impl DeviceProfile {
    pub fn desktop() -> Self {
        Self {
            bubble_count: 20,
            min_radius: 25.0,
            max_radius: 50.0,
            target_fps: 60,
            grid_cell_size: 100.0,
            collision_damping: 0.9,
            resize_threshold: 10.0,
        }
    }

    pub fn mobile() -> Self {
        Self {
            bubble_count: 12,
            min_radius: 20.0,
            max_radius: 35.0,
            target_fps: 45,
            grid_cell_size: 80.0,
            collision_damping: 0.85,
            resize_threshold: 100.0,
        }
    }
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self::desktop()
    }
}

// --- Configuration Sections ---

/// Timer intervals, all in milliseconds.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TimingSettings {
    pub respawn_delay_ms: u64,
    /// Period of the respawn drainer; bounds how fast respawns can happen
    pub rate_limit_interval_ms: u64,
    pub auto_pop_interval_ms: u64,
    /// Delay between bubbles during a staggered seed
    pub spawn_stagger_ms: u64,
    pub resize_debounce_ms: u64,
    /// After this long a still-loading avatar is dropped and the bubble stays solid
    pub avatar_load_timeout_ms: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            respawn_delay_ms: 4000,
            rate_limit_interval_ms: 750,
            auto_pop_interval_ms: 10_000,
            spawn_stagger_ms: 150,
            resize_debounce_ms: 300,
            avatar_load_timeout_ms: 5000,
        }
    }
}

/// Animation lengths are counted in rendered frames.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AnimationSettings {
    pub spawn_frames: u32,
    pub pop_frames: u32,
    /// Peak radius multiplier reached halfway through a pop
    pub pop_scale: f32,
    /// Fraction of the remaining opacity gap closed per frame while fading in
    pub fade_in_rate: f32,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            spawn_frames: 30,
            pop_frames: 15,
            pop_scale: 1.2,
            fade_in_rate: 0.1,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ParticleSettings {
    /// Fragments created per pop
    pub count: usize,
    pub min_radius: f32,
    pub max_radius: f32,
    /// Upper bound on live fragments; the newest excess is dropped
    pub max_particles: usize,
    pub fade_per_frame: f32,
    pub shrink_per_frame: f32,
    pub max_speed: f32,
}

impl Default for ParticleSettings {
    fn default() -> Self {
        Self {
            count: 4,
            min_radius: 1.0,
            max_radius: 4.0,
            max_particles: 50,
            fade_per_frame: 0.02,
            shrink_per_frame: 0.1,
            max_speed: 2.0,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PhysicsSettings {
    /// Per-frame velocity multiplier
    pub friction: f32,
    pub bounce_damping: f32,
    pub bounce_jitter: f32,
    pub collision_jitter: f32,
    /// Largest per-axis speed a new bubble starts with
    pub initial_speed: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            friction: 0.995,
            bounce_damping: 0.3,
            bounce_jitter: 0.5,
            collision_jitter: 0.5,
            initial_speed: 1.0,
        }
    }
}

/// Pointer repulsion. Zero force keeps tracking the pointer without pushing anything.
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct PointerSettings {
    pub repel_force: f32,
    pub max_repel_distance: f32,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RenderSettings {
    /// Extra margin around the viewport before a bubble is culled
    pub cull_distance: f32,
    pub palette: Vec<Rgba>,
    pub outline: Rgba,
    pub outline_width: f32,
    pub avatar_padding: f32,
    pub avatar_border_width: f32,
    pub avatar_backdrop: Rgba,
    pub avatar_border: Rgba,
    pub avatar_inner_border: Rgba,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            cull_distance: 100.0,
            palette: vec![
                Rgba::rgb(0x1A, 0x1A, 0x1A),
                Rgba::rgb(0x33, 0x33, 0x33),
                Rgba::rgb(0x4D, 0x4D, 0x4D),
                Rgba::rgb(0xCC, 0xCC, 0xCC),
                Rgba::rgb(0xF5, 0xF5, 0xF5),
            ],
            outline: Rgba::rgb(100, 100, 100),
            outline_width: 3.0,
            avatar_padding: 1.0,
            avatar_border_width: 3.0,
            avatar_backdrop: Rgba::rgb(0xF8, 0xF9, 0xFA),
            avatar_border: Rgba::rgba(59, 130, 246, 0.8),
            avatar_inner_border: Rgba::rgba(255, 255, 255, 0.6),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AvatarSettings {
    /// Probability that a new bubble carries a profile avatar
    pub profile_ratio: f32,
    /// Lists at least this long are rotated; shorter ones are sampled without replacement
    pub rotation_threshold: usize,
    pub max_concurrent_loads: usize,
    /// Transport-level timeout of the shared image cache
    pub load_timeout_ms: u64,
}

impl Default for AvatarSettings {
    fn default() -> Self {
        Self {
            profile_ratio: 0.4,
            rotation_threshold: 10,
            max_concurrent_loads: 4,
            load_timeout_ms: 10_000,
        }
    }
}

fn default_mobile_user_agents() -> Vec<String> {
    [
        "Android",
        "webOS",
        "iPhone",
        "iPad",
        "iPod",
        "BlackBerry",
        "IEMobile",
        "Opera Mini",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

// --- Top-Level Config Struct ---

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BubbleConfig {
    /// Viewports narrower than this use the mobile profile
    pub mobile_breakpoint: f32,
    pub mobile_user_agents: Vec<String>,
    pub desktop: DeviceProfile,
    pub mobile: DeviceProfile,
    pub timing: TimingSettings,
    pub animation: AnimationSettings,
    pub particles: ParticleSettings,
    pub physics: PhysicsSettings,
    pub pointer: PointerSettings,
    pub render: RenderSettings,
    pub avatars: AvatarSettings,
}

impl Default for BubbleConfig {
    fn default() -> Self {
        Self {
            mobile_breakpoint: 640.0,
            mobile_user_agents: default_mobile_user_agents(),
            desktop: DeviceProfile::desktop(),
            mobile: DeviceProfile::mobile(),
            timing: TimingSettings::default(),
            animation: AnimationSettings::default(),
            particles: ParticleSettings::default(),
            physics: PhysicsSettings::default(),
            pointer: PointerSettings::default(),
            render: RenderSettings::default(),
            avatars: AvatarSettings::default(),
        }
    }
}

// --- Helper Methods ---

impl BubbleConfig {
    /// Profile for the given device class
    pub fn device(&self, class: DeviceClass) -> &DeviceProfile {
        match class {
            DeviceClass::Desktop => &self.desktop,
            DeviceClass::Mobile => &self.mobile,
        }
    }

    /// True if the user agent matches one of the configured mobile patterns
    pub fn is_mobile_user_agent(&self, user_agent: &str) -> bool {
        let ua = user_agent.to_ascii_lowercase();
        self.mobile_user_agents
            .iter()
            .any(|pattern| ua.contains(&pattern.to_ascii_lowercase()))
    }

    /// Classifies a viewport by user agent first, then by width
    pub fn classify(&self, width: f32, user_agent: Option<&str>) -> DeviceClass {
        let mobile_agent = user_agent.map_or(false, |ua| self.is_mobile_user_agent(ua));
        if mobile_agent || width < self.mobile_breakpoint {
            DeviceClass::Mobile
        } else {
            DeviceClass::Desktop
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: BubbleConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: BubbleConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, device) in [("desktop", &self.desktop), ("mobile", &self.mobile)] {
            if device.target_fps == 0 {
                return invalid(format!("{name}.target_fps cannot be zero."));
            }
            if device.grid_cell_size <= 0.0 {
                return invalid(format!("{name}.grid_cell_size must be positive."));
            }
            if device.min_radius <= 0.0 || device.min_radius > device.max_radius {
                return invalid(format!(
                    "{name} radius range must satisfy 0 < min_radius <= max_radius."
                ));
            }
            if !(0.0..=1.0).contains(&device.collision_damping) {
                return invalid(format!("{name}.collision_damping must be within [0, 1]."));
            }
        }

        if self.mobile_breakpoint < 0.0 {
            return invalid("mobile_breakpoint cannot be negative.".to_string());
        }
        if self.animation.spawn_frames == 0 || self.animation.pop_frames == 0 {
            return invalid("Animation frame counts cannot be zero.".to_string());
        }
        if self.animation.pop_scale < 1.0 {
            return invalid("animation.pop_scale must be at least 1.0.".to_string());
        }
        if self.particles.min_radius <= 0.0 || self.particles.min_radius > self.particles.max_radius
        {
            return invalid(
                "particles radius range must satisfy 0 < min_radius <= max_radius.".to_string(),
            );
        }
        if self.particles.fade_per_frame <= 0.0 || self.particles.shrink_per_frame <= 0.0 {
            return invalid("Particles must fade and shrink every frame.".to_string());
        }
        if self.physics.friction <= 0.0 || self.physics.friction > 1.0 {
            return invalid("physics.friction must be within (0, 1].".to_string());
        }
        if !(0.0..=1.0).contains(&self.physics.bounce_damping) {
            return invalid("physics.bounce_damping must be within [0, 1].".to_string());
        }
        if self.pointer.repel_force < 0.0 || self.pointer.max_repel_distance < 0.0 {
            return invalid("Pointer repulsion settings cannot be negative.".to_string());
        }
        if self.render.palette.is_empty() {
            return invalid("render.palette needs at least one color.".to_string());
        }
        if !(0.0..=1.0).contains(&self.avatars.profile_ratio) {
            return invalid("avatars.profile_ratio must be within [0, 1].".to_string());
        }
        if self.avatars.max_concurrent_loads == 0 {
            return invalid("avatars.max_concurrent_loads cannot be zero.".to_string());
        }
        if self.timing.rate_limit_interval_ms == 0 || self.timing.spawn_stagger_ms == 0 {
            return invalid("Timer intervals cannot be zero.".to_string());
        }

        Ok(())
    }
}

fn invalid(msg: String) -> Result<(), ConfigError> {
    Err(ConfigError::Validation(msg))
}

// --- Loading Function ---

/// Loads a config file, picking TOML for `.toml` files and JSON otherwise.
pub fn load_config(path: &Path) -> Result<BubbleConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("toml"));

    if is_toml {
        BubbleConfig::from_toml_str(&content)
    } else {
        BubbleConfig::from_json_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_are_valid() {
        let config = BubbleConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.desktop.bubble_count, 20);
        assert_eq!(config.particles.count, 4);
        assert_eq!(config.pointer.repel_force, 0.0);
    }

    #[test]
    fn load_partial_json() {
        let content = r##"{
          "mobile_breakpoint": 700,
          "desktop": { "bubble_count": 30 },
          "render": { "palette": ["#101010", "#202020"] }
        }"##;
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.mobile_breakpoint, 700.0);
        assert_eq!(config.desktop.bubble_count, 30);
        // untouched fields keep their defaults
        assert_eq!(config.desktop.max_radius, 50.0);
        assert_eq!(config.mobile, DeviceProfile::mobile());
        assert_eq!(config.render.palette.len(), 2);
        assert_eq!(config.render.palette[1], Rgba::rgb(0x20, 0x20, 0x20));
    }

    #[test]
    fn load_toml_by_extension() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("bubbles.toml");
        file.write_str(
            r#"
            [timing]
            respawn_delay_ms = 2500

            [avatars]
            profile_ratio = 0.7
            "#,
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.timing.respawn_delay_ms, 2500);
        assert_eq!(config.avatars.profile_ratio, 0.7);
        assert_eq!(config.timing.auto_pop_interval_ms, 10_000);
    }

    #[test]
    fn load_invalid_framerate() {
        let content = r#"{ "mobile": { "target_fps": 0 } }"#;
        let result = BubbleConfig::from_json_str(content);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn rejects_inverted_radius_range() {
        let content = r#"{ "desktop": { "min_radius": 60, "max_radius": 50 } }"#;
        assert!(matches!(
            BubbleConfig::from_json_str(content),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn rejects_bad_color() {
        let content = r#"{ "render": { "palette": ["not-a-color"] } }"#;
        assert!(matches!(
            BubbleConfig::from_json_str(content),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn classify_by_width_and_agent() {
        let config = BubbleConfig::default();
        assert_eq!(config.classify(800.0, None), DeviceClass::Desktop);
        assert_eq!(config.classify(400.0, None), DeviceClass::Mobile);
        assert_eq!(config.classify(640.0, None), DeviceClass::Desktop);
        let iphone = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)";
        assert_eq!(config.classify(1024.0, Some(iphone)), DeviceClass::Mobile);
        assert!(config.is_mobile_user_agent("opera mini/8.0"));
        assert!(!config.is_mobile_user_agent("Mozilla/5.0 (X11; Linux x86_64)"));
    }

    #[test]
    fn device_lookup() {
        let config = BubbleConfig::default();
        assert_eq!(config.device(DeviceClass::Mobile).target_fps, 45);
        assert_eq!(config.device(DeviceClass::Desktop).grid_cell_size, 100.0);
    }
}
