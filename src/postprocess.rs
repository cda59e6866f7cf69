//! Coordinate rescaling, validity filtering and confidence scoring.
//!
//! Takes decoded candidates in network-input space, removes the letterbox
//! padding to land in original-image pixels, drops geometric noise, then
//! scores the survivors and applies the confidence threshold.

use crate::decoder::Candidate;
use crate::Bbox;

/// A scored box in original-image coordinates.
///
/// The full class-probability vector is retained alongside the box; the
/// people-confusion filter needs it after NMS.
#[derive(Debug, Clone)]
pub struct Detection {
    pub bbox: Bbox,
    pub probs: Vec<f32>,
}

/// Maps candidates from the padded square input back to original-image
/// coordinates and drops invalid or degenerate boxes.
///
/// The inverse of letterboxing: subtract the padding, divide by the resize
/// ratio, clip into `[0, org-1]`. Boxes that end up inverted after clipping
/// (entirely inside the padding) or with zero area are filtered out rather
/// than clamped.
pub fn rescale_boxes(
    candidates: Vec<Candidate>,
    input_size: u32,
    org_w: u32,
    org_h: u32,
) -> Vec<Candidate> {
    let input_size = input_size as f32;
    let org_w = org_w as f32;
    let org_h = org_h as f32;

    let resize_ratio = (input_size / org_w).min(input_size / org_h);
    let dw = (input_size - resize_ratio * org_w) / 2.0;
    let dh = (input_size - resize_ratio * org_h) / 2.0;

    candidates
        .into_iter()
        .filter_map(|mut c| {
            c.xmin = (c.xmin - dw) / resize_ratio;
            c.xmax = (c.xmax - dw) / resize_ratio;
            c.ymin = (c.ymin - dh) / resize_ratio;
            c.ymax = (c.ymax - dh) / resize_ratio;

            c.xmin = c.xmin.max(0.0);
            c.ymin = c.ymin.max(0.0);
            c.xmax = c.xmax.min(org_w - 1.0);
            c.ymax = c.ymax.min(org_h - 1.0);

            if c.xmin > c.xmax || c.ymin > c.ymax {
                return None;
            }
            // sqrt(area) must lie in (0, inf): zero-area and non-finite
            // boxes are detector noise.
            let scale = ((c.xmax - c.xmin) * (c.ymax - c.ymin)).sqrt();
            if scale > 0.0 && scale.is_finite() {
                Some(c)
            } else {
                None
            }
        })
        .collect()
}

// First index wins on equal probabilities, matching argmax.
fn argmax(probs: &[f32]) -> (usize, f32) {
    let mut best = 0;
    let mut best_p = f32::NEG_INFINITY;
    for (i, &p) in probs.iter().enumerate() {
        if p > best_p {
            best = i;
            best_p = p;
        }
    }
    (best, best_p)
}

/// Picks each candidate's best class, computes `objectness * class_prob` and
/// keeps boxes scoring strictly above the threshold.
pub fn score_boxes(candidates: Vec<Candidate>, score_threshold: f32) -> Vec<Detection> {
    candidates
        .into_iter()
        .filter_map(|c| {
            let (class_id, class_prob) = argmax(&c.probs);
            let score = c.objectness * class_prob;
            if score > score_threshold {
                Some(Detection {
                    bbox: Bbox::new(c.xmin, c.ymin, c.xmax, c.ymax, score, class_id),
                    probs: c.probs,
                })
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(xmin: f32, ymin: f32, xmax: f32, ymax: f32) -> Candidate {
        Candidate {
            xmin,
            ymin,
            xmax,
            ymax,
            objectness: 1.0,
            probs: vec![1.0],
        }
    }

    #[test]
    fn rescale_is_identity_without_letterboxing() {
        // org == input: resize_ratio = 1, dw = dh = 0.
        let out = rescale_boxes(vec![candidate(10.0, 20.0, 30.0, 60.0)], 416, 416, 416);
        assert_eq!(out.len(), 1);
        let c = &out[0];
        assert_eq!((c.xmin, c.ymin, c.xmax, c.ymax), (10.0, 20.0, 30.0, 60.0));
    }

    #[test]
    fn rescale_removes_letterbox_padding() {
        // 416 input over a 208x104 image: ratio 2, dh = (416 - 208) / 2 = 104.
        let out = rescale_boxes(vec![candidate(0.0, 104.0, 416.0, 312.0)], 416, 208, 104);
        assert_eq!(out.len(), 1);
        let c = &out[0];
        assert_eq!(c.xmin, 0.0);
        assert_eq!(c.ymin, 0.0);
        assert_eq!(c.xmax, 207.0); // clipped to org_w - 1
        assert_eq!(c.ymax, 103.0);
    }

    #[test]
    fn box_inside_padding_is_dropped() {
        // Entirely above the image content: clips to ymin > ymax.
        let out = rescale_boxes(vec![candidate(10.0, 0.0, 30.0, 50.0)], 416, 208, 104);
        assert!(out.is_empty());
    }

    #[test]
    fn zero_area_box_is_dropped() {
        let out = rescale_boxes(vec![candidate(10.0, 10.0, 10.0, 50.0)], 416, 416, 416);
        assert!(out.is_empty());
    }

    #[test]
    fn scorer_multiplies_objectness_and_best_class() {
        let mut c = candidate(0.0, 0.0, 10.0, 10.0);
        c.objectness = 0.8;
        c.probs = vec![0.1, 0.9, 0.3];
        let out = score_boxes(vec![c], 0.5);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].bbox.class_id, 1);
        assert!((out[0].bbox.score - 0.72).abs() < 1e-6);
        assert_eq!(out[0].probs.len(), 3);
    }

    #[test]
    fn scorer_threshold_is_strict() {
        let mut c = candidate(0.0, 0.0, 10.0, 10.0);
        c.objectness = 0.5;
        c.probs = vec![1.0];
        assert!(score_boxes(vec![c.clone()], 0.5).is_empty());
        assert_eq!(score_boxes(vec![c], 0.49).len(), 1);
    }

    #[test]
    fn empty_input_is_a_valid_terminal_state() {
        assert!(rescale_boxes(vec![], 416, 416, 416).is_empty());
        assert!(score_boxes(vec![], 0.5).is_empty());
    }
}
