//! Class-name and anchor sources, plus the display palette.
//!
//! Class names come from a newline-delimited list, anchors from a single
//! comma-delimited line reshaped into `(num_scales, anchors_per_scale, 2)`.
//! Both are loaded once at startup and read-only afterwards.

use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::PipelineError;

/// Anchor (width, height) pairs per scale.
pub const ANCHORS_PER_SCALE: usize = 3;

/// Ordered class id → display name mapping.
pub fn read_class_names(path: &Path) -> Result<Vec<String>, PipelineError> {
    let contents = fs::read_to_string(path)?;
    let names: Vec<String> = contents
        .lines()
        .map(|l| l.trim_end().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    if names.is_empty() {
        return Err(PipelineError::EmptyClassNames);
    }
    Ok(names)
}

/// Parses a comma-delimited anchor line into per-scale (width, height) sets.
///
/// The value count must divide into `(scales, 3, 2)`; a tiny two-scale model
/// yields 12 values, a three-scale model 18.
pub fn load_anchors(path: &Path) -> Result<Vec<Vec<(f32, f32)>>, PipelineError> {
    let contents = fs::read_to_string(path)?;
    let values: Vec<f32> = contents
        .split(',')
        .map(|v| {
            let v = v.trim();
            v.parse::<f32>()
                .map_err(|_| PipelineError::AnchorParse(v.to_string()))
        })
        .collect::<Result<_, _>>()?;

    let per_scale = ANCHORS_PER_SCALE * 2;
    if values.is_empty() || values.len() % per_scale != 0 {
        return Err(PipelineError::MalformedAnchors(
            values.len(),
            ANCHORS_PER_SCALE,
        ));
    }

    Ok(values
        .chunks(per_scale)
        .map(|scale| scale.chunks(2).map(|wh| (wh[0], wh[1])).collect())
        .collect())
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (u8, u8, u8) {
    let i = (h * 6.0).floor();
    let f = h * 6.0 - i;
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);
    let (r, g, b) = match (i as i32).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    ((r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8)
}

/// One display color per class: a hue wheel shuffled by a seeded generator.
/// Pure function of `(num_classes, seed)` — no process-wide random state.
pub fn class_palette(num_classes: usize, seed: u64) -> Vec<(u8, u8, u8)> {
    let mut colors: Vec<(u8, u8, u8)> = (0..num_classes)
        .map(|i| hsv_to_rgb(i as f32 / num_classes.max(1) as f32, 1.0, 1.0))
        .collect();
    let mut rng = StdRng::seed_from_u64(seed);
    colors.shuffle(&mut rng);
    colors
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn class_names_keep_file_order() {
        let f = write_temp("person\nbicycle\ncar\n");
        let names = read_class_names(f.path()).unwrap();
        assert_eq!(names, vec!["person", "bicycle", "car"]);
    }

    #[test]
    fn empty_class_file_is_an_error() {
        let f = write_temp("\n\n");
        assert!(matches!(
            read_class_names(f.path()),
            Err(PipelineError::EmptyClassNames)
        ));
    }

    #[test]
    fn anchors_reshape_per_scale() {
        let f = write_temp("12,16, 19,36, 40,28, 36,75, 76,55, 72,146");
        let anchors = load_anchors(f.path()).unwrap();
        assert_eq!(anchors.len(), 2);
        assert_eq!(anchors[0], vec![(12.0, 16.0), (19.0, 36.0), (40.0, 28.0)]);
        assert_eq!(anchors[1][2], (72.0, 146.0));
    }

    #[test]
    fn truncated_anchor_list_is_rejected() {
        let f = write_temp("12,16,19,36");
        assert!(matches!(
            load_anchors(f.path()),
            Err(PipelineError::MalformedAnchors(4, _))
        ));
    }

    #[test]
    fn garbage_anchor_value_is_rejected() {
        let f = write_temp("12,16,19,x,40,28");
        assert!(matches!(
            load_anchors(f.path()),
            Err(PipelineError::AnchorParse(_))
        ));
    }

    #[test]
    fn palette_is_a_pure_function_of_the_seed() {
        assert_eq!(class_palette(80, 0), class_palette(80, 0));
        assert_ne!(class_palette(80, 0), class_palette(80, 1));
        assert_eq!(class_palette(5, 42).len(), 5);
    }
}
