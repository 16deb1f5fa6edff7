//! Error types for the canvas crate.
//!
//! Geometry never fails: degenerate values are clamped where they are
//! produced. The errors here cover the edges of the engine, namely backend
//! surfaces, asynchronous loading, serialized payloads and option validation.

// =============================================================================
// RENDER
// =============================================================================

/// Errors produced while creating or drawing to a rendering surface.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The backend could not allocate a surface.
    #[error("surface creation failed ({width}x{height}): {reason}")]
    SurfaceCreation { width: u32, height: u32, reason: String },

    /// A backend drawing call was rejected.
    #[error("backend call failed: {0}")]
    Backend(String),

    /// The scene was configured with invalid options.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

// =============================================================================
// LOADING
// =============================================================================

/// Errors produced while turning a payload into live entities.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// An image or pattern source could not be fetched or decoded.
    #[error("image load failed for {src}: {reason}")]
    Image { src: String, reason: String },

    /// The payload named a type this engine does not know.
    #[error("unknown object type: {0}")]
    UnknownType(String),

    /// The payload itself was malformed.
    #[error(transparent)]
    Payload(#[from] PayloadError),
}

/// Errors produced while decoding a serialized scene or object.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// The payload is not valid JSON for the expected shape.
    #[error("payload parse failed: {0}")]
    Json(#[from] serde_json::Error),

    /// A field holds a value outside its domain.
    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

// =============================================================================
// CONFIG
// =============================================================================

/// Errors produced while validating scene options.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The minimum cache side is larger than the maximum.
    #[error("min cache side {min} exceeds max cache side {max}")]
    CacheSides { min: u32, max: u32 },

    /// A min-by-max cache surface would not fit the area budget.
    #[error("cache sides {min}x{max} exceed the area budget of {budget} pixels")]
    CacheArea { min: u32, max: u32, budget: u64 },

    /// The device pixel ratio is not a positive number.
    #[error("device pixel ratio must be positive, got {0}")]
    PixelRatio(f64),

    /// The options document could not be parsed.
    #[error("options parse failed: {0}")]
    Parse(#[from] serde_json::Error),
}
