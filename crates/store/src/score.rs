use tracing::warn;

/// Distance after clamping, with its presentable score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalized {
    pub distance: f64,
    pub score: f64,
}

/// Map a raw cosine distance to a score in [0, 100].
///
/// Total over every f64: NaN, infinite and negative distances clamp to 0
/// first, then `(1 - distance) * 100` clamps to 0 when negative or not finite.
pub fn normalize(distance: f64) -> Normalized {
    let distance = if distance.is_nan() || distance.is_infinite() || distance < 0.0 {
        warn!("Clamping anomalous distance from store: {}", distance);
        0.0
    } else {
        distance
    };

    let score = (1.0 - distance) * 100.0;
    let score = if score < 0.0 || !score.is_finite() { 0.0 } else { score };

    Normalized { distance, score }
}
