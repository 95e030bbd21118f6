//! Orbit camera rig - position/target state, bounds and animated transitions
//!
//! Coordinates are Y-up. The orbit is expressed in spherical coordinates
//! around the target: the polar angle is measured from +Y and the azimuth
//! from +Z towards +X.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::CameraConfig;
use crate::registry::ModelConfig;
use crate::tween::{Ease, Tween};

/// Limits applied to user orbit input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitBounds {
    pub enable_pan: bool,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Radians from +Y
    pub min_polar: f32,
    pub max_polar: f32,
}

impl OrbitBounds {
    /// Framed view: no panning, limited zoom, no looking from above/below
    pub fn locked() -> Self {
        Self {
            enable_pan: false,
            min_distance: 120.0,
            max_distance: 450.0,
            min_polar: std::f32::consts::FRAC_PI_3,
            max_polar: 2.0 * std::f32::consts::FRAC_PI_3,
        }
    }

    /// Free view: pan enabled, zoom right into the model
    pub fn unlocked() -> Self {
        Self {
            enable_pan: true,
            min_distance: 0.5,
            max_distance: 1500.0,
            min_polar: 0.01,
            max_polar: std::f32::consts::PI - 0.01,
        }
    }

    /// Reason these bounds cannot constrain an orbit, if any
    pub fn check(&self) -> Result<(), String> {
        let values = [self.min_distance, self.max_distance, self.min_polar, self.max_polar];
        if values.iter().any(|v| !v.is_finite()) {
            return Err("bounds must be finite".to_string());
        }
        if self.min_distance <= 0.0 || self.min_distance > self.max_distance {
            return Err(format!(
                "distance range {}..{} must be positive and ascending",
                self.min_distance, self.max_distance
            ));
        }
        if self.min_polar < 0.0 || self.max_polar > std::f32::consts::PI || self.min_polar > self.max_polar {
            return Err(format!(
                "polar range {}..{} must be ascending within 0..pi",
                self.min_polar, self.max_polar
            ));
        }
        Ok(())
    }

    // max/min rather than clamp: never panics on bounds that skipped `check`
    pub fn clamp_distance(&self, distance: f32) -> f32 {
        distance.max(self.min_distance).min(self.max_distance)
    }

    pub fn clamp_polar(&self, polar: f32) -> f32 {
        polar.max(self.min_polar).min(self.max_polar)
    }
}

/// The two orbit presets switched by the lock toggle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LockPresets {
    #[serde(default = "OrbitBounds::locked")]
    pub locked: OrbitBounds,
    #[serde(default = "OrbitBounds::unlocked")]
    pub unlocked: OrbitBounds,
}

impl Default for LockPresets {
    fn default() -> Self {
        Self {
            locked: OrbitBounds::locked(),
            unlocked: OrbitBounds::unlocked(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockState {
    #[default]
    Locked,
    Unlocked,
}

impl LockState {
    pub fn toggled(self) -> Self {
        match self {
            LockState::Locked => LockState::Unlocked,
            LockState::Unlocked => LockState::Locked,
        }
    }
}

/// Spherical offset of the camera from its target
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    radius: f32,
    polar: f32,
    azimuth: f32,
}

impl Spherical {
    fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return Self {
                radius: 0.0,
                polar: std::f32::consts::FRAC_PI_2,
                azimuth: 0.0,
            };
        }
        Self {
            radius,
            polar: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            azimuth: offset.x.atan2(offset.z),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_polar = self.polar.sin();
        Vec3::new(
            self.radius * sin_polar * self.azimuth.sin(),
            self.radius * self.polar.cos(),
            self.radius * sin_polar * self.azimuth.cos(),
        )
    }

    fn constrained(mut self, bounds: &OrbitBounds) -> Self {
        self.radius = bounds.clamp_distance(self.radius);
        self.polar = bounds.clamp_polar(self.polar);
        self
    }
}

/// Camera position, orbit target and the transitions between them
#[derive(Debug, Clone)]
pub struct CameraRig {
    position: Vec3,
    target: Vec3,
    lock: LockState,
    presets: LockPresets,
    duration: f32,
    ease: Ease,
    position_tween: Option<Tween<Vec3>>,
    target_tween: Option<Tween<Vec3>>,
}

impl CameraRig {
    /// Rig at the configured start position, looking at the origin, locked
    pub fn new(camera: &CameraConfig, presets: LockPresets) -> Self {
        Self {
            position: camera.start_position,
            target: Vec3::ZERO,
            lock: LockState::Locked,
            presets,
            duration: camera.transition_secs,
            ease: camera.ease,
            position_tween: None,
            target_tween: None,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn lock_state(&self) -> LockState {
        self.lock
    }

    pub fn is_locked(&self) -> bool {
        self.lock == LockState::Locked
    }

    pub fn bounds(&self) -> &OrbitBounds {
        match self.lock {
            LockState::Locked => &self.presets.locked,
            LockState::Unlocked => &self.presets.unlocked,
        }
    }

    pub fn is_animating(&self) -> bool {
        self.position_tween.is_some() || self.target_tween.is_some()
    }

    /// Fly the camera to the model's viewing position
    pub fn focus_model(&mut self, model: &ModelConfig) {
        self.animate_position(model.camera_position);
    }

    /// Fly both camera and orbit target back to the model's defaults
    pub fn reset(&mut self, model: &ModelConfig) {
        self.animate_position(model.camera_position);
        self.animate_target(model.orbit_target);
    }

    /// Swap orbit presets and re-center on the model
    pub fn toggle_lock(&mut self, model: &ModelConfig) -> LockState {
        self.lock = self.lock.toggled();

        let settled = self
            .position_tween
            .as_ref()
            .map(Tween::target)
            .unwrap_or(self.position);
        let offset = Spherical::from_offset(settled - model.orbit_target).constrained(self.bounds());

        self.animate_target(model.orbit_target);
        self.animate_position(model.orbit_target + offset.to_offset());
        self.lock
    }

    /// Rotate around the target by the given angle deltas (radians)
    pub fn orbit(&mut self, d_azimuth: f32, d_polar: f32) {
        self.position_tween = None;
        let mut spherical = Spherical::from_offset(self.position - self.target);
        spherical.azimuth += d_azimuth;
        spherical.polar += d_polar;
        self.position = self.target + spherical.constrained(self.bounds()).to_offset();
    }

    /// Scale the orbit distance; `factor < 1` moves closer
    pub fn zoom(&mut self, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        self.position_tween = None;
        let mut spherical = Spherical::from_offset(self.position - self.target);
        spherical.radius *= factor;
        self.position = self.target + spherical.constrained(self.bounds()).to_offset();
    }

    /// Move camera and target together in the view plane. `right` and `up`
    /// are fractions of the orbit distance. Ignored when panning is off.
    pub fn pan(&mut self, right: f32, up: f32) -> bool {
        if !self.bounds().enable_pan {
            return false;
        }
        self.position_tween = None;
        self.target_tween = None;

        let offset = self.position - self.target;
        let distance = offset.length();
        let forward = (-offset).normalize_or_zero();
        let right_dir = forward.cross(Vec3::Y).normalize_or_zero();
        let up_dir = right_dir.cross(forward).normalize_or_zero();

        let delta = (right_dir * right + up_dir * up) * distance;
        self.position += delta;
        self.target += delta;
        true
    }

    /// Tick running transitions. When none is running the position is kept
    /// inside the active bounds.
    pub fn advance(&mut self, dt_secs: f32) {
        if let Some(tween) = self.position_tween.as_mut() {
            self.position = tween.advance(dt_secs);
            if tween.is_finished() {
                self.position_tween = None;
            }
        }
        if let Some(tween) = self.target_tween.as_mut() {
            self.target = tween.advance(dt_secs);
            if tween.is_finished() {
                self.target_tween = None;
            }
        }

        if !self.is_animating() {
            let spherical = Spherical::from_offset(self.position - self.target).constrained(self.bounds());
            self.position = self.target + spherical.to_offset();
        }
    }

    fn animate_position(&mut self, to: Vec3) {
        self.position_tween = Some(Tween::new(self.position, to, self.duration, self.ease));
    }

    fn animate_target(&mut self, to: Vec3) {
        self.target_tween = Some(Tween::new(self.target, to, self.duration, self.ease));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(camera_position: Vec3, orbit_target: Vec3) -> ModelConfig {
        ModelConfig {
            id: "cat_skull".to_string(),
            label: None,
            asset: "models/cat_skull/scene.gltf".to_string(),
            scale: 2.0,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            camera_position,
            orbit_target,
            text: "kannssai".to_string(),
            text_color: "#ff0000".to_string(),
            text_position: Vec3::new(0.0, -50.0, 0.0),
            text_rotation: Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0),
            text_size: 20.0,
            font: None,
        }
    }

    fn rig() -> CameraRig {
        CameraRig::new(&CameraConfig::default(), LockPresets::default())
    }

    fn settle(rig: &mut CameraRig) {
        for _ in 0..200 {
            rig.advance(1.0 / 60.0);
        }
        assert!(!rig.is_animating());
    }

    fn assert_close(a: Vec3, b: Vec3) {
        assert!(a.distance(b) < 1e-2, "{a} != {b}");
    }

    #[test]
    fn test_spherical_roundtrip_axis() {
        let s = Spherical::from_offset(Vec3::new(300.0, 0.0, 0.0));
        assert!((s.radius - 300.0).abs() < 1e-4);
        assert!((s.polar - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
        assert_close(s.to_offset(), Vec3::new(300.0, 0.0, 0.0));
    }

    #[test]
    fn test_focus_model_animates_over_duration() {
        let mut rig = rig();
        let skull = model(Vec3::new(0.0, 0.0, 250.0), Vec3::ZERO);
        rig.focus_model(&skull);

        rig.advance(0.6);
        assert!(rig.is_animating());
        let halfway = rig.position();
        assert!(halfway.distance(Vec3::new(300.0, 0.0, 0.0)) > 1.0);
        assert!(halfway.distance(skull.camera_position) > 1.0);

        rig.advance(0.6);
        assert!(!rig.is_animating());
        assert_close(rig.position(), skull.camera_position);
    }

    #[test]
    fn test_lock_toggle_switches_between_two_presets() {
        let mut rig = rig();
        let skull = model(Vec3::new(300.0, 0.0, 0.0), Vec3::ZERO);
        assert_eq!(*rig.bounds(), OrbitBounds::locked());

        assert_eq!(rig.toggle_lock(&skull), LockState::Unlocked);
        assert_eq!(*rig.bounds(), OrbitBounds::unlocked());

        assert_eq!(rig.toggle_lock(&skull), LockState::Locked);
        assert_eq!(*rig.bounds(), OrbitBounds::locked());
    }

    #[test]
    fn test_locked_rig_ignores_pan_and_clamps_zoom() {
        let mut rig = rig();
        assert!(!rig.pan(0.5, 0.0));
        assert_eq!(rig.target(), Vec3::ZERO);

        rig.zoom(100.0);
        assert!((rig.position().length() - 450.0).abs() < 1e-2);
        rig.zoom(0.0001);
        assert!((rig.position().length() - 120.0).abs() < 1e-2);

        // Straight up is outside the locked polar range
        rig.orbit(0.0, -3.0);
        let polar = Spherical::from_offset(rig.position()).polar;
        assert!((polar - std::f32::consts::FRAC_PI_3).abs() < 1e-4);
    }

    #[test]
    fn test_unlocked_rig_pans_and_zooms_inside() {
        let mut rig = rig();
        let skull = model(Vec3::new(300.0, 0.0, 0.0), Vec3::ZERO);
        rig.toggle_lock(&skull);
        settle(&mut rig);

        rig.zoom(0.001);
        assert!((rig.position().length() - 0.5).abs() < 1e-3);

        let before = rig.position() - rig.target();
        assert!(rig.pan(0.0, 1.0));
        assert!(rig.target().y > 0.0);
        assert_close(rig.position() - rig.target(), before);
    }

    #[test]
    fn test_relocking_recenters_into_locked_bounds() {
        let mut rig = rig();
        let skull = model(Vec3::new(300.0, 0.0, 0.0), Vec3::ZERO);
        rig.toggle_lock(&skull);
        settle(&mut rig);
        rig.pan(0.2, 0.1);
        rig.zoom(0.01);

        rig.toggle_lock(&skull);
        settle(&mut rig);
        assert_close(rig.target(), Vec3::ZERO);
        let distance = rig.position().length();
        assert!((120.0..=450.0).contains(&distance), "{distance}");
    }

    #[test]
    fn test_reset_restores_model_defaults() {
        let mut rig = rig();
        let skull = model(Vec3::new(0.0, 40.0, 280.0), Vec3::new(0.0, 10.0, 0.0));
        rig.toggle_lock(&skull);
        settle(&mut rig);
        rig.orbit(1.2, 0.4);
        rig.pan(0.3, -0.2);
        rig.zoom(0.5);

        rig.reset(&skull);
        settle(&mut rig);
        assert_close(rig.position(), skull.camera_position);
        assert_close(rig.target(), skull.orbit_target);
    }

    #[test]
    fn test_new_transition_replaces_running_one() {
        let mut rig = rig();
        let a = model(Vec3::new(0.0, 0.0, 300.0), Vec3::ZERO);
        let b = model(Vec3::new(-300.0, 0.0, 0.0), Vec3::ZERO);
        rig.focus_model(&a);
        rig.advance(0.3);
        rig.focus_model(&b);
        settle(&mut rig);
        assert_close(rig.position(), b.camera_position);
    }

    #[test]
    fn test_inverted_bounds_do_not_panic() {
        let mut presets = LockPresets::default();
        presets.locked.min_distance = 450.0;
        presets.locked.max_distance = 120.0;
        assert!(presets.locked.check().is_err());

        let mut rig = CameraRig::new(&CameraConfig::default(), presets);
        rig.advance(0.016);
        rig.orbit(0.1, 0.1);
        assert!(rig.position().is_finite());
    }
}
