//! Simulation settings and data-file loaders.

use std::{fs, path::Path};

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use weapon_factory_core::EntityProfile;

use crate::SearchBudget;

/// Tunables of one simulation session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Frame-rate cap of the wall clock; zero runs uncapped.
    pub fps: u32,
    /// Width of one grid square in pixels.
    pub square_width: f64,
    /// Height of one grid square in pixels.
    pub square_height: f64,
    /// Limits applied to every path search.
    pub search: SearchBudget,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fps: 60,
            square_width: 32.0,
            square_height: 32.0,
            search: SearchBudget::default(),
        }
    }
}

impl SimulationConfig {
    /// Parses and validates a TOML document; missing keys take their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).context("failed to parse simulation config toml contents")?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses the TOML file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read simulation config at {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("invalid simulation config at {}", path.display()))
    }

    /// Checks that the settings describe a usable grid and search budget.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.square_width.is_finite() && self.square_width > 0.0,
            "square width must be positive, got {}",
            self.square_width
        );
        ensure!(
            self.square_height.is_finite() && self.square_height > 0.0,
            "square height must be positive, got {}",
            self.square_height
        );
        ensure!(
            self.search.max_expansions > 0,
            "search budget must allow at least one expansion"
        );
        Ok(())
    }
}

/// Parses an entity profile from TOML; missing keys take their defaults.
pub fn profile_from_toml_str(contents: &str) -> Result<EntityProfile> {
    let profile: EntityProfile =
        toml::from_str(contents).context("failed to parse entity profile toml contents")?;
    ensure!(
        profile.speed.is_finite() && profile.speed > 0.0,
        "entity `{}` speed must be positive, got {}",
        profile.name,
        profile.speed
    );
    ensure!(
        profile.angular_speed.is_finite() && profile.angular_speed > 0.0,
        "entity `{}` angular speed must be positive, got {}",
        profile.name,
        profile.angular_speed
    );
    ensure!(
        profile.orig_angle.is_finite(),
        "entity `{}` initial angle must be finite, got {}",
        profile.name,
        profile.orig_angle
    );
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = SimulationConfig::from_toml_str("fps = 30\n").expect("valid config");

        assert_eq!(config.fps, 30);
        assert_eq!(config.square_width, 32.0);
        assert_eq!(config.search, SearchBudget::default());
    }

    #[test]
    fn nested_search_budget_is_parsed() {
        let config = SimulationConfig::from_toml_str(
            r#"
                square_width = 16.0
                square_height = 24.0

                [search]
                max_expansions = 500
            "#,
        )
        .expect("valid config");

        assert_eq!(config.square_height, 24.0);
        assert_eq!(config.search.max_expansions, 500);
        assert_eq!(config.search.time_limit_ms, SearchBudget::default().time_limit_ms);
    }

    #[test]
    fn degenerate_squares_are_rejected() {
        let error = SimulationConfig::from_toml_str("square_width = 0.0\n")
            .expect_err("zero width must fail");

        assert!(error.to_string().contains("square width"));
    }

    #[test]
    fn malformed_toml_reports_context() {
        let error = SimulationConfig::from_toml_str("fps = \"fast\"").expect_err("must fail");

        assert!(format!("{error:#}").contains("failed to parse simulation config"));
    }

    #[test]
    fn entity_profiles_load_with_animation() {
        let profile = profile_from_toml_str(
            r#"
                name = "soldier"
                speed = 0.1
                angular_speed = 0.5

                [animation]
                name = "walk"
                looped = true
                frames = [
                    { frame = "walk-0", duration_ms = 80 },
                    { frame = "walk-1", duration_ms = 80 },
                ]
            "#,
        )
        .expect("valid profile");

        assert_eq!(profile.name, "soldier");
        assert_eq!(profile.orig_angle, 0.0);
        let animation = profile.animation.expect("animation present");
        assert_eq!(animation.frames.len(), 2);
        assert!(animation.looped);
    }

    #[test]
    fn entity_profiles_need_positive_speeds() {
        assert!(profile_from_toml_str("speed = -1.0\n").is_err());
    }

    #[test]
    fn entity_profiles_need_a_finite_initial_angle() {
        let error = profile_from_toml_str("orig_angle = nan\n").expect_err("nan must fail");
        assert!(error.to_string().contains("initial angle"));

        assert!(profile_from_toml_str("orig_angle = inf\n").is_err());
        assert!(profile_from_toml_str("orig_angle = -inf\n").is_err());
    }
}
