//! Privacy redaction: face pixelation and blur.
//!
//! The face region of a detection is the top third of its box, full width.
//! Redaction is deterministic, lossy and irreversible, and must be applied
//! before any boxes or labels are rendered over the same pixels — drawing
//! first would leave readable pixels under the overlay.

use image::RgbImage;

use crate::postprocess::Detection;
use crate::Bbox;

/// Default pixelation grid: 6x6 blocks per face region.
pub const DEFAULT_BLOCKS: u32 = 6;

/// Face region of a box in whole pixels, clamped to the image: top third of
/// the height, full width. Returns `None` when the clamped region is empty.
pub fn face_region(bbox: &Bbox, img_w: u32, img_h: u32) -> Option<(u32, u32, u32, u32)> {
    let x0 = (bbox.xmin.max(0.0) as u32).min(img_w);
    let y0 = (bbox.ymin.max(0.0) as u32).min(img_h);
    let x1 = (bbox.xmax.max(0.0) as u32).min(img_w);
    let y_face = bbox.ymin as i64 + (bbox.ymax as i64 - bbox.ymin as i64) / 3;
    let y1 = (y_face.max(0) as u32).min(img_h);
    if x1 > x0 && y1 > y0 {
        Some((x0, y0, x1, y1))
    } else {
        None
    }
}

// Evenly spaced integer boundaries over [0, extent], blocks+1 of them, with
// the remainder spread across cells (truncated linear interpolation).
fn grid_steps(extent: u32, blocks: u32) -> Vec<u32> {
    (0..=blocks).map(|i| i * extent / blocks).collect()
}

/// Block-mean pixelation of a pixel-coordinate region: partition into an
/// `blocks`x`blocks` grid and replace every cell with its mean color.
pub fn pixelate_region(img: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, blocks: u32) {
    debug_assert!(x1 <= img.width() && y1 <= img.height());
    let w = x1 - x0;
    let h = y1 - y0;
    if w == 0 || h == 0 || blocks == 0 {
        return;
    }

    let x_steps = grid_steps(w, blocks);
    let y_steps = grid_steps(h, blocks);

    for yi in 1..y_steps.len() {
        for xi in 1..x_steps.len() {
            let (cx0, cx1) = (x0 + x_steps[xi - 1], x0 + x_steps[xi]);
            let (cy0, cy1) = (y0 + y_steps[yi - 1], y0 + y_steps[yi]);
            let count = ((cx1 - cx0) * (cy1 - cy0)) as u64;
            if count == 0 {
                continue;
            }

            let mut sum = [0u64; 3];
            for y in cy0..cy1 {
                for x in cx0..cx1 {
                    let p = img.get_pixel(x, y);
                    sum[0] += p.0[0] as u64;
                    sum[1] += p.0[1] as u64;
                    sum[2] += p.0[2] as u64;
                }
            }
            let mean = image::Rgb([
                (sum[0] / count) as u8,
                (sum[1] / count) as u8,
                (sum[2] / count) as u8,
            ]);
            for y in cy0..cy1 {
                for x in cx0..cx1 {
                    img.put_pixel(x, y, mean);
                }
            }
        }
    }
}

/// Pixelates the face region of one detection box.
pub fn pixelate_face(img: &mut RgbImage, bbox: &Bbox, blocks: u32) {
    if let Some((x0, y0, x1, y1)) = face_region(bbox, img.width(), img.height()) {
        pixelate_region(img, x0, y0, x1, y1, blocks);
    }
}

/// Gaussian-blur variant: kernel size derived from the region extent divided
/// by `factor`, forced odd; sigma follows the kernel.
pub fn blur_face(img: &mut RgbImage, bbox: &Bbox, factor: f32) {
    let Some((x0, y0, x1, y1)) = face_region(bbox, img.width(), img.height()) else {
        return;
    };
    let w = x1 - x0;
    let h = y1 - y0;

    let mut k_w = (w as f32 / factor) as u32;
    let mut k_h = (h as f32 / factor) as u32;
    if k_w % 2 == 0 {
        k_w = k_w.saturating_sub(1);
    }
    if k_h % 2 == 0 {
        k_h = k_h.saturating_sub(1);
    }
    if k_w < 1 || k_h < 1 {
        return;
    }

    let sub = image::imageops::crop_imm(img, x0, y0, w, h).to_image();
    let sigma = (k_w.min(k_h) as f32 / 6.0).max(0.5);
    let blurred = imageproc::filter::gaussian_blur_f32(&sub, sigma);
    image::imageops::replace(img, &blurred, x0 as i64, y0 as i64);
}

/// Redacts every detection's face region in place.
pub fn redact_all(img: &mut RgbImage, detections: &[Detection], blocks: u32) {
    for d in detections {
        pixelate_face(img, &d.bbox, blocks);
    }
}
