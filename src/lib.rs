//! Detector post-processing and occupancy analytics.
//!
//! Turns raw per-anchor detector output tensors into a filtered, deduplicated
//! set of bounding boxes in original-image coordinates, then derives
//! occupancy/compliance analytics from them:
//!
//! ```text
//! raw tensors → decode → rescale/clip → score → NMS → people filter
//!             → foot points → occupancy report (+ face redaction)
//! ```
//!
//! The detection network itself, weight loading and video I/O are external
//! collaborators; this crate starts where the network output ends.

pub mod analytics;
pub mod config;
pub mod decoder;
pub mod error;
pub mod labels;
pub mod letterbox;
pub mod nms;
pub mod people;
pub mod pipeline;
pub mod postprocess;
pub mod redact;

pub use crate::analytics::{foot_points, FootPoint, OccupancyReport, ReportWriter};
pub use crate::config::{NmsMode, PipelineConfig};
pub use crate::decoder::{decode, decode_scale, AnchorTemplate, Candidate};
pub use crate::error::PipelineError;
pub use crate::people::PeopleFilter;
pub use crate::pipeline::{FrameAnalysis, Pipeline};
pub use crate::postprocess::Detection;

/// Timestamp string for report rows and output file names.
pub fn gen_time_string(delimiter: &str) -> String {
    let t_now = chrono::Local::now();
    let fmt = format!("%Y{}%m{}%d %H:%M:%S%.3f", delimiter, delimiter);
    t_now.format(&fmt).to_string()
}

/// A bounding box in corner form with its confidence and class.
///
/// Coordinates are floating point; which space they live in (network input
/// vs. original image) depends on the pipeline stage that produced the box.
#[derive(Debug, Clone, PartialEq)]
pub struct Bbox {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
    pub score: f32,
    pub class_id: usize,
}

impl Bbox {
    pub fn new(xmin: f32, ymin: f32, xmax: f32, ymax: f32, score: f32, class_id: usize) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
            score,
            class_id,
        }
    }

    pub fn width(&self) -> f32 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f32 {
        self.ymax - self.ymin
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Geometric mean of width and height, used by the validity filter.
    pub fn scale(&self) -> f32 {
        self.area().sqrt()
    }

    pub fn cxcy(&self) -> (f32, f32) {
        (
            (self.xmin + self.xmax) / 2.0,
            (self.ymin + self.ymax) / 2.0,
        )
    }

    pub fn intersection_area(&self, other: &Bbox) -> f32 {
        let l = self.xmin.max(other.xmin);
        let r = self.xmax.min(other.xmax);
        let t = self.ymin.max(other.ymin);
        let b = self.ymax.min(other.ymax);
        (r - l).max(0.0) * (b - t).max(0.0)
    }

    pub fn union_area(&self, other: &Bbox) -> f32 {
        self.area() + other.area() - self.intersection_area(other)
    }
}
