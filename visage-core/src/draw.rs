//! Drawing helpers for annotated detection output.

use image::{DynamicImage, Rgb};
use imageproc::{
    drawing::{draw_filled_circle_mut, draw_hollow_rect_mut},
    rect::Rect,
};
use visage_utils::{ColorSpace, Image};

use crate::landmarks::LandmarkRow;
use crate::objects::ObjectDetection;

const LANDMARK_RADIUS: i32 = 3;
const LANDMARK_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Copy the image and mark each landmark with a filled dot.
pub fn draw_landmark_rows(image: &Image, rows: &[LandmarkRow]) -> Image {
    let mut canvas = image.to_rgb8();
    let (width, height) = image.dimensions();

    for row in rows {
        let (px, py) = row.pixel(width, height);
        let cx = clamp_to_i32(px, width);
        let cy = clamp_to_i32(py, height);
        draw_filled_circle_mut(&mut canvas, (cx, cy), LANDMARK_RADIUS, LANDMARK_COLOR);
    }

    Image::from_buffer(DynamicImage::ImageRgb8(canvas), ColorSpace::Rgb)
}

/// Copy the image and outline each detection's bounding box.
pub fn draw_object_boxes(image: &Image, detections: &[ObjectDetection]) -> Image {
    let mut canvas = image.to_rgb8();
    let (width, height) = image.dimensions();

    for detection in detections {
        let (x1, y1, x2, y2) = detection.bbox.corners();
        let px1 = clamp_to_i32(x1 * width as f32, width);
        let py1 = clamp_to_i32(y1 * height as f32, height);
        let px2 = clamp_to_i32(x2 * width as f32, width);
        let py2 = clamp_to_i32(y2 * height as f32, height);
        let rect_w = (px2 - px1).max(1) as u32;
        let rect_h = (py2 - py1).max(1) as u32;
        draw_hollow_rect_mut(&mut canvas, Rect::at(px1, py1).of_size(rect_w, rect_h), BOX_COLOR);
    }

    Image::from_buffer(DynamicImage::ImageRgb8(canvas), ColorSpace::Rgb)
}

fn clamp_to_i32(value: f32, limit: u32) -> i32 {
    let max = if limit == 0 { 0.0 } else { (limit - 1) as f32 };
    value.clamp(0.0, max).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn blank(width: u32, height: u32) -> Image {
        let buf = RgbImage::from_pixel(width, height, image::Rgb([0, 0, 0]));
        Image::from_buffer(DynamicImage::ImageRgb8(buf), ColorSpace::Rgb)
    }

    #[test]
    fn drawing_marks_landmark_pixels() {
        let image = blank(20, 20);
        let rows = vec![LandmarkRow { entity: 0, index: 0, x: 0.5, y: 0.5, z: 0.0 }];
        let annotated = draw_landmark_rows(&image, &rows);
        assert_eq!(annotated.to_rgb8().get_pixel(10, 10)[0], 255);
        // Source image untouched.
        assert_eq!(image.to_rgb8().get_pixel(10, 10)[0], 0);
    }

    #[test]
    fn box_outline_lands_on_the_border() {
        let image = blank(20, 20);
        let detections = vec![ObjectDetection {
            class_id: 0,
            bbox: crate::objects::BoundingBox::from_corners(0.25, 0.25, 0.75, 0.75),
            score: 0.9,
        }];
        let annotated = draw_object_boxes(&image, &detections);
        let rgb = annotated.to_rgb8();
        assert_eq!(rgb.get_pixel(5, 5)[1], 255);
        assert_eq!(rgb.get_pixel(10, 10)[1], 0);
    }

    #[test]
    fn out_of_range_landmarks_are_clamped() {
        let image = blank(8, 8);
        let rows = vec![LandmarkRow { entity: 0, index: 0, x: 1.5, y: -0.5, z: 0.0 }];
        // Must not panic.
        let _ = draw_landmark_rows(&image, &rows);
    }
}
