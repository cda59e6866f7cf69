//! Stage wiring: raw tensors in, frame analysis out.
//!
//! The pipeline is a pure, synchronous, single-frame transformation. All
//! state is read-only configuration; every invocation's intermediates are
//! local, so frames may be processed in parallel by cloning the pipeline.

use ndarray::{Array, IxDyn};

use crate::analytics::{foot_points, FootPoint, OccupancyReport};
use crate::config::PipelineConfig;
use crate::decoder::{decode, AnchorTemplate};
use crate::error::PipelineError;
use crate::nms;
use crate::people::PeopleFilter;
use crate::postprocess::{rescale_boxes, score_boxes, Detection};

/// Everything derived from one frame's raw detector output.
#[derive(Debug, Clone)]
pub struct FrameAnalysis {
    /// Post-NMS detections of all classes, people filter applied.
    pub detections: Vec<Detection>,
    /// The accepted-person subset of `detections`.
    pub people: Vec<Detection>,
    /// Ground-contact points, one per accepted person.
    pub footpoints: Vec<FootPoint>,
}

impl FrameAnalysis {
    /// Builds the per-frame occupancy report. `count` is the caller-supplied
    /// number of people violating the distancing predicate.
    pub fn report(&self, count: usize, avg_distance: f32, avg_min_distance: f32) -> OccupancyReport {
        OccupancyReport::new(
            self.people.len(),
            count,
            avg_distance,
            avg_min_distance,
            self.footpoints.clone(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    templates: Vec<AnchorTemplate>,
    people_filter: PeopleFilter,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, templates: Vec<AnchorTemplate>) -> Self {
        Self {
            config,
            templates,
            people_filter: PeopleFilter::default(),
        }
    }

    pub fn with_people_filter(mut self, people_filter: PeopleFilter) -> Self {
        self.people_filter = people_filter;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the full post-processing chain on one frame's raw outputs.
    ///
    /// An empty result at any stage is a valid terminal state; the only
    /// errors are precondition violations (tensor shape / scale count).
    pub fn process(
        &self,
        outputs: &[Array<f32, IxDyn>],
        org_w: u32,
        org_h: u32,
    ) -> Result<FrameAnalysis, PipelineError> {
        let candidates = decode(outputs, &self.templates, self.config.num_classes)?;
        let total = candidates.len();

        let candidates = rescale_boxes(candidates, self.config.input_size, org_w, org_h);
        let scored = score_boxes(candidates, self.config.score_threshold);
        let kept = nms::run(
            scored,
            self.config.iou_threshold,
            self.config.nms_mode,
            self.config.sigma,
        );
        let detections = self.people_filter.filter(kept);

        let people: Vec<Detection> = detections
            .iter()
            .filter(|d| self.people_filter.is_person(d))
            .cloned()
            .collect();
        let footpoints = foot_points(&people);

        log::debug!(
            "frame processed: {} candidates -> {} boxes, {} people",
            total,
            detections.len(),
            people.len()
        );

        Ok(FrameAnalysis {
            detections,
            people,
            footpoints,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NmsMode;

    fn pipeline() -> Pipeline {
        let config = PipelineConfig {
            input_size: 32,
            score_threshold: 0.25,
            iou_threshold: 0.45,
            nms_mode: NmsMode::Hard,
            sigma: 0.3,
            num_classes: 14,
        };
        let templates = vec![AnchorTemplate::new(vec![(16.0, 16.0)], 32, 1.0)];
        Pipeline::new(config, templates)
    }

    #[test]
    fn empty_scene_produces_empty_analysis() {
        let p = pipeline();
        // All-zero tensor: objectness 0 everywhere, nothing survives scoring.
        let outputs = vec![Array::zeros(IxDyn(&[1, 1, 1, 19]))];
        let analysis = p.process(&outputs, 32, 32).unwrap();
        assert!(analysis.detections.is_empty());
        assert!(analysis.footpoints.is_empty());
        let report = analysis.report(3, 0.0, 0.0);
        assert_eq!(report.compliance(), 100.0);
    }

    #[test]
    fn confident_person_flows_through_to_a_foot_point() {
        let p = pipeline();
        let mut pred = Array::zeros(IxDyn(&[1, 1, 1, 19]));
        pred[[0, 0, 0, 4]] = 0.9; // objectness
        pred[[0, 0, 0, 5]] = 0.95; // person probability
        let analysis = p.process(&[pred], 32, 32).unwrap();
        assert_eq!(analysis.detections.len(), 1);
        assert_eq!(analysis.people.len(), 1);
        assert_eq!(analysis.footpoints.len(), 1);
        // Box is anchor-sized (16px) centered mid-cell: (8, 8)..(24, 24).
        assert_eq!(analysis.footpoints[0].x, 16);
        assert_eq!(analysis.footpoints[0].y, 24);
    }

    #[test]
    fn confusable_person_is_dropped_from_people_but_scene_still_reports() {
        let p = pipeline();
        let mut pred = Array::zeros(IxDyn(&[1, 1, 1, 19]));
        pred[[0, 0, 0, 4]] = 0.9;
        pred[[0, 0, 0, 5]] = 0.95;
        pred[[0, 0, 0, 5 + 11]] = 0.5; // stop sign
        let analysis = p.process(&[pred], 32, 32).unwrap();
        assert!(analysis.people.is_empty());
        assert!(analysis.detections.is_empty()); // person-classed fake is dropped
    }

    #[test]
    fn shape_violation_fails_fast() {
        let p = pipeline();
        let outputs = vec![Array::zeros(IxDyn(&[1, 1, 1, 7]))];
        assert!(matches!(
            p.process(&outputs, 32, 32),
            Err(PipelineError::ShapeMismatch { .. })
        ));
    }
}
