//! Person/confusable-class filter.
//!
//! The detector routinely leaks marginal "person" probability onto street
//! furniture. A person-classed box is accepted only when every confusable
//! class carries effectively zero probability; this is a precision-biased
//! heuristic, not a learned model.
//!
//! Only boxes whose class is `person_class` are inspected. Boxes of any
//! other class pass through untouched — whether those were already filtered
//! out upstream is the caller's business.

use crate::postprocess::Detection;

/// COCO ids of the classes most often confused with a person:
/// traffic light, fire hydrant, stop sign, parking meter, bench.
pub const CONFUSABLE_CLASSES: [usize; 5] = [9, 10, 11, 12, 13];

#[derive(Debug, Clone)]
pub struct PeopleFilter {
    pub person_class: usize,
    pub confusable: Vec<usize>,
    /// A person box is rejected once any confusable probability reaches this.
    pub micro_threshold: f32,
}

impl Default for PeopleFilter {
    fn default() -> Self {
        Self {
            person_class: 0,
            confusable: CONFUSABLE_CLASSES.to_vec(),
            micro_threshold: 0.002,
        }
    }
}

impl PeopleFilter {
    /// True when the detection is an accepted person.
    pub fn is_person(&self, detection: &Detection) -> bool {
        detection.bbox.class_id == self.person_class
            && self.confusable.iter().all(|&c| {
                detection
                    .probs
                    .get(c)
                    .map_or(true, |&p| p < self.micro_threshold)
            })
    }

    /// Drops person-classed boxes that look like street furniture; keeps
    /// everything else as-is.
    pub fn filter(&self, detections: Vec<Detection>) -> Vec<Detection> {
        detections
            .into_iter()
            .filter(|d| d.bbox.class_id != self.person_class || self.is_person(d))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bbox;

    fn detection(class_id: usize, probs: Vec<f32>) -> Detection {
        Detection {
            bbox: Bbox::new(0.0, 0.0, 10.0, 20.0, 0.9, class_id),
            probs,
        }
    }

    fn probs_with(class: usize, p: f32) -> Vec<f32> {
        let mut probs = vec![0.0; 80];
        probs[0] = 0.9;
        probs[class] = p;
        probs
    }

    #[test]
    fn clean_person_is_retained() {
        let filter = PeopleFilter::default();
        let d = detection(0, probs_with(9, 0.0019));
        assert!(filter.is_person(&d));
        assert_eq!(filter.filter(vec![d]).len(), 1);
    }

    #[test]
    fn confusable_probability_at_threshold_rejects() {
        let filter = PeopleFilter::default();
        for &c in &CONFUSABLE_CLASSES {
            let d = detection(0, probs_with(c, 0.002));
            assert!(!filter.is_person(&d), "class {} should reject", c);
        }
    }

    #[test]
    fn non_person_boxes_pass_through() {
        let filter = PeopleFilter::default();
        let d = detection(2, probs_with(9, 0.5));
        assert!(!filter.is_person(&d));
        assert_eq!(filter.filter(vec![d]).len(), 1);
    }

    #[test]
    fn short_probability_vector_is_tolerated() {
        // A detector with fewer classes than COCO simply has no confusable
        // slots to inspect.
        let filter = PeopleFilter::default();
        let d = detection(0, vec![0.9, 0.1]);
        assert!(filter.is_person(&d));
    }
}
