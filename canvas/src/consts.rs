//! Shared numeric constants for the canvas crate.

// ── Geometry ────────────────────────────────────────────────────

/// Scale substituted for an exact zero so object matrices stay invertible.
pub const MIN_SCALE_EPSILON: f64 = 0.0001;

/// Bezier handle ratio used to approximate a quarter ellipse (rounded rects).
pub const KAPPA: f64 = 1.0 - 0.552_284_749_8;

/// Tolerance used when comparing computed geometry.
pub const GEOMETRY_EPSILON: f64 = 1e-9;

// ── Render cache ────────────────────────────────────────────────

/// Extra pixels added to a cache surface so antialiased edges are not clipped.
pub const ALIASING_LIMIT: f64 = 2.0;

/// Default smallest side of a cache surface, in device pixels.
pub const MIN_CACHE_SIDE_LIMIT: u32 = 256;

/// Default largest side of a cache surface, in device pixels.
pub const MAX_CACHE_SIDE_LIMIT: u32 = 4096;

/// Default maximum area of a cache surface, in device pixels.
pub const PERF_LIMIT_SIZE_TOTAL: u64 = 2_097_152;

/// Slack added when a cache surface has to grow.
pub const CACHE_GROWTH_SLACK: f64 = 0.1;

/// A cache surface only shrinks below this fraction of its current size.
pub const CACHE_SHRINK_THRESHOLD: f64 = 0.9;

// ── Controls ────────────────────────────────────────────────────

/// Default side of a control handle in viewport pixels.
pub const CORNER_SIZE: f64 = 13.0;

/// Default distance from the top edge to the rotate handle, in viewport pixels.
pub const ROTATING_POINT_OFFSET: f64 = 40.0;

/// Half of the diagonal of a unit square (√2 / 2).
pub const HALF_SQRT_2: f64 = 0.707_106;

// ── Serialization ───────────────────────────────────────────────

/// Default number of fraction digits kept when serializing numbers.
pub const NUM_FRACTION_DIGITS: u32 = 2;

/// Version tag written into serialized payloads.
pub const PAYLOAD_VERSION: &str = "2.4.0";
