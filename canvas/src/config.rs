//! Scene options and cache limits.
//!
//! Every field has a default, so a host can deserialize a partial JSON
//! document (camelCase keys) and get a complete [`SceneOptions`]. Call
//! [`SceneOptions::validate`] (or use [`SceneOptions::from_json`]) before
//! handing options to a scene.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_CACHE_SIDE_LIMIT, MIN_CACHE_SIDE_LIMIT, NUM_FRACTION_DIGITS, PERF_LIMIT_SIZE_TOTAL};
use crate::error::ConfigError;
use crate::input::ModifierKey;

/// Bounds applied to every cache surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    pub min_cache_side_limit: u32,
    pub max_cache_side_limit: u32,
    /// Maximum area of one surface, in device pixels.
    pub perf_limit_size_total: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            min_cache_side_limit: MIN_CACHE_SIDE_LIMIT,
            max_cache_side_limit: MAX_CACHE_SIDE_LIMIT,
            perf_limit_size_total: PERF_LIMIT_SIZE_TOTAL,
        }
    }
}

impl CacheConfig {
    /// A min-by-max surface must fit the area budget, or the limiter could not
    /// honor both bounds at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (min, max) = (self.min_cache_side_limit, self.max_cache_side_limit);
        if min > max {
            return Err(ConfigError::CacheSides { min, max });
        }
        if u64::from(min) * u64::from(max) > self.perf_limit_size_total {
            return Err(ConfigError::CacheArea { min, max, budget: self.perf_limit_size_total });
        }
        Ok(())
    }
}

/// Scene-wide behavior, bindings and styling.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SceneOptions {
    /// Viewport width in CSS pixels.
    pub width: f64,
    /// Viewport height in CSS pixels.
    pub height: f64,
    pub interactive: bool,
    /// Marquee and multi-selection are enabled.
    pub selection: bool,
    pub selection_fully_contained: bool,
    pub selection_key: ModifierKey,
    pub alt_selection_key: Option<ModifierKey>,
    pub uni_scale_key: Option<ModifierKey>,
    pub centered_key: Option<ModifierKey>,
    pub alt_action_key: Option<ModifierKey>,
    pub uni_scale_transform: bool,
    pub centered_scaling: bool,
    pub centered_rotation: bool,
    pub preserve_object_stacking: bool,
    pub per_pixel_target_find: bool,
    /// Extra distance in scene units accepted by shape-precise hit testing.
    pub target_find_tolerance: f64,
    pub skip_target_find: bool,
    pub skip_offscreen: bool,
    pub enable_retina_scaling: bool,
    pub device_pixel_ratio: f64,
    pub render_on_add_remove: bool,
    pub controls_above_overlay: bool,
    pub background_color: Option<String>,
    pub overlay_color: Option<String>,
    pub selection_color: String,
    pub selection_border_color: String,
    pub selection_line_width: f64,
    pub selection_dash_array: Vec<f64>,
    pub default_cursor: String,
    pub hover_cursor: String,
    pub move_cursor: String,
    pub rotation_cursor: String,
    pub not_allowed_cursor: String,
    pub num_fraction_digits: u32,
    pub cache: CacheConfig,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            width: 300.0,
            height: 150.0,
            interactive: true,
            selection: true,
            selection_fully_contained: false,
            selection_key: ModifierKey::Shift,
            alt_selection_key: None,
            uni_scale_key: Some(ModifierKey::Shift),
            centered_key: Some(ModifierKey::Alt),
            alt_action_key: Some(ModifierKey::Shift),
            uni_scale_transform: false,
            centered_scaling: false,
            centered_rotation: false,
            preserve_object_stacking: false,
            per_pixel_target_find: false,
            target_find_tolerance: 0.0,
            skip_target_find: false,
            skip_offscreen: true,
            enable_retina_scaling: true,
            device_pixel_ratio: 1.0,
            render_on_add_remove: true,
            controls_above_overlay: false,
            background_color: None,
            overlay_color: None,
            selection_color: "rgba(100, 100, 255, 0.3)".to_owned(),
            selection_border_color: "rgba(255, 255, 255, 0.3)".to_owned(),
            selection_line_width: 1.0,
            selection_dash_array: Vec::new(),
            default_cursor: "default".to_owned(),
            hover_cursor: "move".to_owned(),
            move_cursor: "move".to_owned(),
            rotation_cursor: "crosshair".to_owned(),
            not_allowed_cursor: "not-allowed".to_owned(),
            num_fraction_digits: NUM_FRACTION_DIGITS,
            cache: CacheConfig::default(),
        }
    }
}

impl SceneOptions {
    /// Parse and validate a JSON options document.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let options: Self = serde_json::from_str(raw)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.device_pixel_ratio > 0.0) {
            return Err(ConfigError::PixelRatio(self.device_pixel_ratio));
        }
        self.cache.validate()
    }

    /// Pixel ratio applied to cache surfaces and shadows.
    #[must_use]
    pub fn retina_scaling(&self) -> f64 {
        if self.enable_retina_scaling { self.device_pixel_ratio } else { 1.0 }
    }
}
