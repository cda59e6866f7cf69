//! Overlap metrics and non-max suppression.
//!
//! Suppression runs per class: repeatedly take the highest-scoring candidate
//! as a keeper, then either zero out (hard) or Gaussian-decay (soft) the
//! scores of overlapping candidates. CIOU is exposed as a standalone metric
//! for distance-aware duplicate scoring; the default suppression path uses
//! plain IOU.

use std::collections::BTreeMap;

use crate::config::NmsMode;
use crate::postprocess::Detection;
use crate::Bbox;

/// Intersection over union, floored to a small positive epsilon so callers
/// can divide by it. Degenerate boxes therefore yield epsilon, not zero.
pub fn iou(a: &Bbox, b: &Bbox) -> f32 {
    let inter = a.intersection_area(b);
    let union = a.union_area(b);
    (inter / union).max(f32::EPSILON)
}

/// Complete IOU: overlap penalized by center distance and aspect-ratio
/// disagreement. Signed; a strong mismatch can push it below zero.
///
/// `ciou = iou - d²/c² - α·v` where `d` is the center distance, `c` the
/// diagonal of the smallest enclosing box, and `v` the aspect-ratio penalty
/// `(4/π²)(atan(w_a/h_a) - atan(w_b/h_b))²` with `α = v / (1 - iou + v + ε)`.
pub fn ciou(a: &Bbox, b: &Bbox) -> f32 {
    const EPS: f32 = 1e-6;

    let overlap = iou(a, b);

    // Smallest enclosing box diagonal.
    let enclose_w = a.xmax.max(b.xmax) - a.xmin.min(b.xmin);
    let enclose_h = a.ymax.max(b.ymax) - a.ymin.min(b.ymin);
    let c2 = (enclose_w * enclose_w + enclose_h * enclose_h).max(EPS);

    let (acx, acy) = a.cxcy();
    let (bcx, bcy) = b.cxcy();
    let d2 = (acx - bcx) * (acx - bcx) + (acy - bcy) * (acy - bcy);

    // Zero-height boxes still get a finite aspect term.
    let ar_a = (a.width() / a.height().max(EPS)).atan();
    let ar_b = (b.width() / b.height().max(EPS)).atan();
    let v = 4.0 / (std::f32::consts::PI * std::f32::consts::PI) * (ar_a - ar_b) * (ar_a - ar_b);
    let alpha = v / (1.0 - overlap + v + EPS);

    overlap - d2 / c2 - alpha * v
}

// Lowest index wins ties, for reproducible output.
fn argmax_score(pool: &[Detection]) -> usize {
    let mut best = 0;
    let mut best_score = f32::NEG_INFINITY;
    for (i, d) in pool.iter().enumerate() {
        if d.bbox.score > best_score {
            best = i;
            best_score = d.bbox.score;
        }
    }
    best
}

/// Per-class greedy suppression. Returns the keepers; in soft mode surviving
/// candidates carry their decayed scores.
pub fn run(
    detections: Vec<Detection>,
    iou_threshold: f32,
    mode: NmsMode,
    sigma: f32,
) -> Vec<Detection> {
    let mut by_class: BTreeMap<usize, Vec<Detection>> = BTreeMap::new();
    for d in detections {
        by_class.entry(d.bbox.class_id).or_default().push(d);
    }

    let mut best = Vec::new();
    for (_, mut pool) in by_class {
        while !pool.is_empty() {
            let keeper = pool.swap_remove(argmax_score(&pool));
            pool.retain_mut(|d| {
                let overlap = iou(&keeper.bbox, &d.bbox);
                let weight = match mode {
                    NmsMode::Hard => {
                        if overlap > iou_threshold {
                            0.0
                        } else {
                            1.0
                        }
                    }
                    NmsMode::Soft => (-(overlap * overlap) / sigma).exp(),
                };
                d.bbox.score *= weight;
                d.bbox.score > 0.0
            });
            best.push(keeper);
        }
    }
    best
}
