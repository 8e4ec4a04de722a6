//! Placement resolution: watermark footprint + placement spec -> top-left
//! pixel offset.
//!
//! This table is the single source of truth for export, preview, and any
//! interactive hit-testing; all of them must call [`resolve`] so a given
//! configuration lands on identical coordinates everywhere.

use crate::types::{Anchor, PlacementSpec};

/// Fixed margin from the relevant edges for anchored placements, in pixels.
pub const ANCHOR_MARGIN: i64 = 20;

/// Resolve a placement to the watermark's top-left corner.
///
/// `canvas` is the target image size, `footprint` the watermark's pixel
/// size. Custom fractional coordinates are mapped as `round(f * dim)`
/// with no extra clamping; anchored placements apply [`ANCHOR_MARGIN`].
/// Coordinates may be negative when the footprint exceeds the canvas;
/// the compositor clips safely.
pub fn resolve(canvas: (u32, u32), footprint: (u32, u32), spec: &PlacementSpec) -> (i64, i64) {
    let (cw, ch) = (canvas.0 as i64, canvas.1 as i64);
    let (w, h) = (footprint.0 as i64, footprint.1 as i64);
    let m = ANCHOR_MARGIN;

    match spec {
        PlacementSpec::Custom { fx, fy } => (
            (fx * canvas.0 as f64).round() as i64,
            (fy * canvas.1 as f64).round() as i64,
        ),
        PlacementSpec::Anchor(anchor) => match anchor {
            Anchor::LeftTop => (m, m),
            Anchor::CenterTop => ((cw - w) / 2, m),
            Anchor::RightTop => (cw - w - m, m),
            Anchor::LeftCenter => (m, (ch - h) / 2),
            Anchor::Center => ((cw - w) / 2, (ch - h) / 2),
            Anchor::RightCenter => (cw - w - m, (ch - h) / 2),
            Anchor::LeftBottom => (m, ch - h - m),
            Anchor::CenterBottom => ((cw - w) / 2, ch - h - m),
            Anchor::RightBottom => (cw - w - m, ch - h - m),
        },
    }
}
