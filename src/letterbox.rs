//! Forward letterbox preprocessing.
//!
//! Resizes an image onto a gray square canvas, preserving aspect ratio and
//! centering the content. The rescaler in `postprocess` is the exact inverse
//! of this transform.

use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use ndarray::{Array, IxDyn};

/// Gray fill value for the letterbox padding.
const PAD_FILL: u8 = 128;

/// Letterboxes `img` into an `input_size` x `input_size` canvas.
pub fn letterbox(img: &DynamicImage, input_size: u32) -> RgbImage {
    let (w0, h0) = (img.width() as f32, img.height() as f32);
    let size = input_size as f32;
    let scale = (size / w0).min(size / h0);
    let nw = (scale * w0) as u32;
    let nh = (scale * h0) as u32;

    let resized = img.resize_exact(nw.max(1), nh.max(1), FilterType::Triangle);
    let mut canvas = RgbImage::from_pixel(input_size, input_size, image::Rgb([PAD_FILL; 3]));
    let dw = (input_size - nw) / 2;
    let dh = (input_size - nh) / 2;
    image::imageops::replace(&mut canvas, &resized.to_rgb8(), dw as i64, dh as i64);
    canvas
}

/// Converts a letterboxed image to a normalized HWC `f32` tensor in `[0, 1]`.
pub fn to_tensor(img: &RgbImage) -> Array<f32, IxDyn> {
    let (w, h) = (img.width() as usize, img.height() as usize);
    let mut tensor = Array::zeros(IxDyn(&[h, w, 3]));
    for (x, y, pixel) in img.enumerate_pixels() {
        for c in 0..3 {
            tensor[[y as usize, x as usize, c]] = pixel.0[c] as f32 / 255.0;
        }
    }
    tensor
}
