//! Foot-point projection and occupancy/compliance aggregation.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::PipelineError;
use crate::gen_time_string;
use crate::postprocess::Detection;

/// Ground-contact point of a detected subject: the midpoint of the box's
/// bottom edge, in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FootPoint {
    pub x: i32,
    pub y: i32,
}

impl fmt::Display for FootPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One foot point per box, order-preserving. Integer (floor) division keeps
/// the coordinate on a whole pixel.
pub fn foot_points(detections: &[Detection]) -> Vec<FootPoint> {
    detections
        .iter()
        .map(|d| {
            let xmin = d.bbox.xmin as i32;
            let xmax = d.bbox.xmax as i32;
            let ymax = d.bbox.ymax as i32;
            FootPoint {
                x: xmin + (xmax - xmin) / 2,
                y: ymax,
            }
        })
        .collect()
}

/// Per-frame occupancy summary, written once per processed frame.
///
/// `count` is the caller-supplied number of people violating the distancing
/// predicate; the compliance percentage is derived from it.
#[derive(Debug, Clone, Serialize)]
pub struct OccupancyReport {
    pub timestamp: String,
    pub people: usize,
    pub count: usize,
    pub avg_distance: f32,
    pub avg_min_distance: f32,
    pub footpoints: Vec<FootPoint>,
}

impl OccupancyReport {
    pub fn new(
        people: usize,
        count: usize,
        avg_distance: f32,
        avg_min_distance: f32,
        footpoints: Vec<FootPoint>,
    ) -> Self {
        Self {
            timestamp: gen_time_string("-"),
            people,
            count,
            avg_distance,
            avg_min_distance,
            footpoints,
        }
    }

    /// Compliance percentage. An empty scene is fully compliant.
    pub fn compliance(&self) -> f32 {
        if self.people == 0 {
            100.0
        } else {
            (1.0 - self.count as f32 / self.people as f32) * 100.0
        }
    }

    /// The overlay text: `Occupants : N  Compliance: xx.xx %`.
    pub fn summary(&self) -> String {
        format!(
            "Occupants : {}  Compliance: {:.2} %",
            self.people,
            self.compliance()
        )
    }

    /// Delimited log row:
    /// `timestamp,people,count,avg_distance,avg_min_distance,"[(x, y), ...]"`.
    pub fn to_row(&self) -> String {
        let pts = self
            .footpoints
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{},{},{},{},{},\"[{}]\"",
            self.timestamp, self.people, self.count, self.avg_distance, self.avg_min_distance, pts
        )
    }
}

/// Append-only sink for occupancy rows.
pub struct ReportWriter {
    file: File,
}

impl ReportWriter {
    pub fn open(path: &Path) -> Result<Self, PipelineError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file })
    }

    pub fn append(&mut self, report: &OccupancyReport) -> Result<(), PipelineError> {
        writeln!(self.file, "{}", report.to_row())?;
        log::debug!(
            "occupancy row appended: people={} count={}",
            report.people,
            report.count
        );
        Ok(())
    }
}
