use serde::{Deserialize, Serialize};

use crate::error::CheckError;

/// All analysis thresholds in one struct.
///
/// The defaults are tuned for outlines drawn at a units-per-em in the
/// hundreds to low thousands. Serializable so presets can be stored as
/// JSON; missing fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckConfig {
    // -- Point / segment tests --
    /// A line whose horizontal or vertical delta is in `(0, near_miss_max]`
    /// is reported as almost, but not exactly, axis aligned.
    pub near_miss_max: f64,
    /// Maximum distance (units) between an extreme point and a vertical
    /// metric or blue zone edge for the point to be reported.
    pub metrics_zone_threshold: f64,
    /// Decimal places used when comparing handle angles at smooth points.
    pub unsmooth_angle_precision: u32,
    /// Longer/shorter sub-chord ratio above which handles are uneven.
    pub uneven_handle_ratio: f64,
    /// Both sub-chords must be at least this long to be compared.
    pub uneven_handle_min_length: f64,
    /// Half-length of the synthetic ray built through a handle when
    /// looking for indirect handle crossings.
    pub handle_ray_half_width: f64,
    /// Half-length of the "infinite" perpendicular rays used by the
    /// uneven handle test.
    pub long_ray_length: f64,
    /// Whether smooth curve points are also tested for being removable.
    pub detect_unnecessary_curve_points: bool,
    /// Allowed deviation, as a fraction of the combined arc length, when
    /// testing whether a curve point can be removed.
    pub curve_point_leash: f64,
    /// Number of samples per curve for the removable curve point test.
    pub curve_point_samples: usize,

    // -- Contour tests --
    /// Contours whose bounding box area is at or below this are flagged.
    pub small_contour_max_area: f64,
    /// Width/height tolerance when pairing curves for symmetry.
    pub curve_symmetry_size_tolerance: f64,
    /// Handle length tolerance when pairing curves for symmetry.
    pub curve_symmetry_handle_tolerance: f64,

    // -- Glyph tests --
    /// Tolerance window around each registered stem snap value.
    pub stem_tolerance: f64,
    /// Side-bearings differing by `(0, symmetry_max_difference]` are flagged.
    pub symmetry_max_difference: f64,
    /// Overlap removal may merge at most this many contours before the
    /// glyph is considered to have too many overlapping contours.
    pub overlap_contour_excess: usize,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            near_miss_max: 5.0,
            metrics_zone_threshold: 5.0,
            unsmooth_angle_precision: 0,
            uneven_handle_ratio: 1.5,
            uneven_handle_min_length: 3.0,
            handle_ray_half_width: 1000.0,
            long_ray_length: 100_000.0,
            detect_unnecessary_curve_points: true,
            curve_point_leash: 0.035,
            curve_point_samples: 10,
            small_contour_max_area: 4.0,
            curve_symmetry_size_tolerance: 5.0,
            curve_symmetry_handle_tolerance: 10.0,
            stem_tolerance: 5.0,
            symmetry_max_difference: 5.0,
            overlap_contour_excess: 2,
        }
    }
}

impl CheckConfig {
    /// Parse a (possibly partial) JSON preset.
    pub fn from_json(text: &str) -> Result<Self, CheckError> {
        serde_json::from_str(text).map_err(|e| CheckError::InvalidConfig(e.to_string()))
    }
}
