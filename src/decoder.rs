//! Raw tensor decoding.
//!
//! One detector output tensor per scale, shaped
//! `(grid_rows, grid_cols, anchors_per_cell, 4 box params + objectness + C)`.
//! The first two box parameters are a sigmoid-activated offset within the
//! grid cell, the next two are log-space size factors relative to the anchor
//! template. Objectness and class probabilities are passed through untouched;
//! the scorer consumes them later.

use ndarray::{Array, IxDyn};

use crate::error::PipelineError;

/// Fixed per-scale decoding priors: anchor (width, height) pairs in input
/// pixels, the stride (pixels per grid cell) and an XY-scale adjustment.
#[derive(Debug, Clone)]
pub struct AnchorTemplate {
    pub anchors: Vec<(f32, f32)>,
    pub stride: u32,
    pub xy_scale: f32,
}

impl AnchorTemplate {
    pub fn new(anchors: Vec<(f32, f32)>, stride: u32, xy_scale: f32) -> Self {
        Self {
            anchors,
            stride,
            xy_scale,
        }
    }
}

/// A decoded box in network-input space, before scoring.
///
/// Corner coordinates may stick out of the input square; the rescaler clips
/// them against the original image later.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
    pub objectness: f32,
    pub probs: Vec<f32>,
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Decodes one scale's raw tensor into image-space candidates.
///
/// Cell offset: `sigmoid(dx) * xy_scale - 0.5 * (xy_scale - 1)`, re-centering
/// the scaled sigmoid on the cell, plus the grid coordinate, times stride.
/// Size: `exp(dw) * anchor_w` (anchors are already in input pixels).
///
/// Iteration order is row-major over cells, then anchor slot, which keeps
/// the output stable across calls.
pub fn decode_scale(
    pred: &Array<f32, IxDyn>,
    template: &AnchorTemplate,
    num_classes: usize,
) -> Result<Vec<Candidate>, PipelineError> {
    let channels = 5 + num_classes;
    let shape = pred.shape();
    if shape.len() != 4 || shape[2] != template.anchors.len() || shape[3] != channels {
        return Err(PipelineError::ShapeMismatch {
            expected: format!(
                "(rows, cols, {}, {})",
                template.anchors.len(),
                channels
            ),
            got: shape.to_vec(),
        });
    }

    let rows = shape[0];
    let cols = shape[1];
    let stride = template.stride as f32;
    let s = template.xy_scale;

    let mut candidates = Vec::with_capacity(rows * cols * template.anchors.len());
    for row in 0..rows {
        for col in 0..cols {
            for (a, &(anchor_w, anchor_h)) in template.anchors.iter().enumerate() {
                let dx = sigmoid(pred[[row, col, a, 0]]);
                let dy = sigmoid(pred[[row, col, a, 1]]);
                let cx = (dx * s - 0.5 * (s - 1.0) + col as f32) * stride;
                let cy = (dy * s - 0.5 * (s - 1.0) + row as f32) * stride;
                let w = pred[[row, col, a, 2]].exp() * anchor_w;
                let h = pred[[row, col, a, 3]].exp() * anchor_h;

                candidates.push(Candidate {
                    xmin: cx - w / 2.0,
                    ymin: cy - h / 2.0,
                    xmax: cx + w / 2.0,
                    ymax: cy + h / 2.0,
                    objectness: pred[[row, col, a, 4]],
                    probs: (0..num_classes)
                        .map(|c| pred[[row, col, a, 5 + c]])
                        .collect(),
                });
            }
        }
    }
    Ok(candidates)
}

/// Decodes all scales and concatenates them in call order.
pub fn decode(
    preds: &[Array<f32, IxDyn>],
    templates: &[AnchorTemplate],
    num_classes: usize,
) -> Result<Vec<Candidate>, PipelineError> {
    if preds.len() != templates.len() {
        return Err(PipelineError::ShapeMismatch {
            expected: format!("{} output tensors (one per anchor template)", templates.len()),
            got: vec![preds.len()],
        });
    }

    let mut all = Vec::new();
    for (pred, template) in preds.iter().zip(templates) {
        all.extend(decode_scale(pred, template, num_classes)?);
    }
    Ok(all)
}
