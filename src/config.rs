use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;

use crate::error::PipelineError;

/// Suppression variant used by the NMS engine.
///
/// `Hard` discards every candidate overlapping a keeper beyond the IOU
/// threshold; `Soft` decays candidate scores with a Gaussian of the overlap
/// instead (soft-NMS, <https://arxiv.org/pdf/1704.04503.pdf>).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NmsMode {
    Hard,
    Soft,
}

impl FromStr for NmsMode {
    type Err = PipelineError;

    // Unknown modes are a configuration error, never silently defaulted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hard" | "nms" => Ok(NmsMode::Hard),
            "soft" | "soft-nms" => Ok(NmsMode::Soft),
            other => Err(PipelineError::InvalidNmsMode(other.to_string())),
        }
    }
}

/// Read-only pipeline parameters, fixed after initialization.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Side length of the square network input, in pixels.
    pub input_size: u32,
    /// Minimum `objectness * class_prob` for a box to survive scoring.
    pub score_threshold: f32,
    /// Overlap above which hard NMS suppresses a candidate.
    pub iou_threshold: f32,
    pub nms_mode: NmsMode,
    /// Gaussian decay parameter for soft NMS.
    pub sigma: f32,
    pub num_classes: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_size: 416,
            score_threshold: 0.25,
            iou_threshold: 0.45,
            nms_mode: NmsMode::Hard,
            sigma: 0.3,
            num_classes: 80, // COCO
        }
    }
}

/// Command-line arguments for the offline frame-dump runner.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Occupancy analytics over raw detector output dumps")]
pub struct Args {
    /// JSON frame dump: original image size plus one raw tensor per scale.
    #[arg(long)]
    pub frame: PathBuf,

    /// Comma-delimited anchor list (reshaped to scales x anchors x 2).
    #[arg(long)]
    pub anchors: PathBuf,

    /// Newline-delimited class name list.
    #[arg(long)]
    pub names: PathBuf,

    /// Per-scale strides, matching the anchor file's scale count.
    #[arg(long, value_delimiter = ',', default_values_t = vec![8, 16, 32])]
    pub strides: Vec<u32>,

    /// Per-scale XY-scale adjustment factors.
    #[arg(long, value_delimiter = ',', default_values_t = vec![1.2, 1.1, 1.05])]
    pub xyscale: Vec<f32>,

    /// Network input size (square).
    #[arg(long, default_value_t = 416)]
    pub input_size: u32,

    #[arg(long, default_value_t = 0.25)]
    pub conf: f32,

    #[arg(long, default_value_t = 0.45)]
    pub iou: f32,

    /// NMS variant: "hard" or "soft".
    #[arg(long, default_value = "hard")]
    pub nms: String,

    /// Soft-NMS Gaussian decay parameter.
    #[arg(long, default_value_t = 0.3)]
    pub sigma: f32,

    /// Occupancy log file; one delimited row is appended per frame.
    #[arg(long, default_value = "occupancy_log.csv")]
    pub log: PathBuf,

    /// Optional source image to apply face redaction to.
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Output path for the redacted image.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Seed for the display color palette.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

impl Args {
    pub fn pipeline_config(&self, num_classes: usize) -> Result<PipelineConfig, PipelineError> {
        Ok(PipelineConfig {
            input_size: self.input_size,
            score_threshold: self.conf,
            iou_threshold: self.iou,
            nms_mode: self.nms.parse()?,
            sigma: self.sigma,
            num_classes,
        })
    }
}
