/// Errors reported by the post-processing pipeline.
///
/// Degenerate geometry (zero-area boxes, epsilon overlaps) is recovered
/// locally by the stages themselves and never surfaces here; these variants
/// cover precondition and configuration violations only.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("raw output shape mismatch: expected {expected}, got {got:?}")]
    ShapeMismatch { expected: String, got: Vec<usize> },

    #[error("invalid NMS mode {0:?} (expected \"hard\" or \"soft\")")]
    InvalidNmsMode(String),

    #[error("anchor list length {0} is not divisible into (scales, {1} anchors, 2)")]
    MalformedAnchors(usize, usize),

    #[error("class name file is empty")]
    EmptyClassNames,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to parse anchor value {0:?}")]
    AnchorParse(String),
}
