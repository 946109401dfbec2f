// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for YOLO classification and detection models

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use ndarray::Array4;

/// Default input size for YOLOv8 classification exports
pub const CLASSIFY_INPUT_SIZE: u32 = 224;

/// Default input size for YOLOv8 detection exports
pub const DETECT_INPUT_SIZE: u32 = 640;

/// Padding color used by Ultralytics letterboxing
pub const LETTERBOX_FILL: u8 = 114;

/// Geometry of a letterbox transform, used to map boxes back to the source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxInfo {
    /// Factor applied to the source dimensions
    pub scale: f32,
    /// Horizontal padding on the left edge
    pub pad_x: f32,
    /// Vertical padding on the top edge
    pub pad_y: f32,
}

impl LetterboxInfo {
    /// Map a center-origin box from model space back to source pixel space
    pub fn unmap(&self, cx: f32, cy: f32, w: f32, h: f32) -> (f32, f32, f32, f32) {
        if self.scale <= 0.0 {
            return (cx, cy, w, h);
        }
        (
            (cx - self.pad_x) / self.scale,
            (cy - self.pad_y) / self.scale,
            w / self.scale,
            h / self.scale,
        )
    }
}

/// Scale an image to fit `target` x `target` keeping aspect ratio, then pad
pub fn letterbox(image: &DynamicImage, target: u32) -> (RgbImage, LetterboxInfo) {
    let (orig_w, orig_h) = image.dimensions();
    let mut canvas = RgbImage::from_pixel(target, target, Rgb([LETTERBOX_FILL; 3]));

    if orig_w == 0 || orig_h == 0 {
        let info = LetterboxInfo {
            scale: 0.0,
            pad_x: 0.0,
            pad_y: 0.0,
        };
        return (canvas, info);
    }

    let scale = (target as f32 / orig_w as f32).min(target as f32 / orig_h as f32);
    let new_w = ((orig_w as f32 * scale).round() as u32).clamp(1, target);
    let new_h = ((orig_h as f32 * scale).round() as u32).clamp(1, target);

    let resized = image.resize_exact(new_w, new_h, FilterType::Triangle).to_rgb8();
    let offset_x = (target - new_w) / 2;
    let offset_y = (target - new_h) / 2;
    image::imageops::replace(&mut canvas, &resized, offset_x as i64, offset_y as i64);

    let info = LetterboxInfo {
        scale,
        pad_x: offset_x as f32,
        pad_y: offset_y as f32,
    };
    (canvas, info)
}

/// Resize the short side to `target` and take the central square
pub fn center_crop(image: &DynamicImage, target: u32) -> RgbImage {
    let (orig_w, orig_h) = image.dimensions();
    if orig_w == 0 || orig_h == 0 {
        return RgbImage::from_pixel(target, target, Rgb([0, 0, 0]));
    }

    let scale = target as f32 / orig_w.min(orig_h) as f32;
    let new_w = ((orig_w as f32 * scale).round() as u32).max(target);
    let new_h = ((orig_h as f32 * scale).round() as u32).max(target);
    let resized = image.resize_exact(new_w, new_h, FilterType::Triangle);

    let x = (new_w - target) / 2;
    let y = (new_h - target) / 2;
    resized.crop_imm(x, y, target, target).to_rgb8()
}

/// Convert an RGB image into an NCHW tensor with values in [0, 1]
pub fn to_nchw(rgb: &RgbImage) -> Array4<f32> {
    let (w, h) = rgb.dimensions();
    let mut tensor = Array4::zeros((1, 3, h as usize, w as usize));
    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }
    tensor
}

/// Tensor for a classification model
pub fn preprocess_for_classification(image: &DynamicImage, input_size: u32) -> Array4<f32> {
    to_nchw(&center_crop(image, input_size))
}

/// Tensor for a detection model, plus the transform needed to undo it
pub fn preprocess_for_detection(
    image: &DynamicImage,
    input_size: u32,
) -> (Array4<f32>, LetterboxInfo) {
    let (canvas, info) = letterbox(image, input_size);
    (to_nchw(&canvas), info)
}
