//! Label mask rasterization for export.
//!
//! Annotations are painted in commit order onto a `(height, width)` label
//! array: positive strokes paint their class id as a round brush, negative
//! strokes paint background (0) and polylines paint a one-pixel outline.

use image::GrayImage;
use ndarray::Array2;

use crate::geometry::Point;
use crate::model::{Annotation, AnnotationShape, Polarity};

/// Background label.
pub const BACKGROUND: u8 = 0;

fn label_for(class_id: u32) -> u8 {
    u8::try_from(class_id).unwrap_or_else(|_| {
        log::warn!("Class id {} does not fit an 8-bit mask, saturating", class_id);
        u8::MAX
    })
}

/// Paint a filled disk, clipped to the mask.
fn stamp_disk(mask: &mut Array2<u8>, center: Point, radius: f64, value: u8) {
    let (h, w) = mask.dim();
    let r2 = radius * radius;
    let y0 = (center.y - radius).floor().max(0.0) as usize;
    let x0 = (center.x - radius).floor().max(0.0) as usize;
    let y1 = ((center.y + radius).ceil().max(0.0) as usize).min(h);
    let x1 = ((center.x + radius).ceil().max(0.0) as usize).min(w);

    for y in y0..y1 {
        for x in x0..x1 {
            // Pixel centers
            let dx = x as f64 + 0.5 - center.x;
            let dy = y as f64 + 0.5 - center.y;
            if dx * dx + dy * dy <= r2 {
                mask[[y, x]] = value;
            }
        }
    }
}

/// Visit points along a segment at most `step` apart, including both ends.
fn walk_segment(a: Point, b: Point, step: f64, mut visit: impl FnMut(Point)) {
    let steps = (a.distance(b) / step).ceil().max(1.0) as usize;
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        visit(a + (b - a) * t);
    }
}

/// Clip a segment to the mask rectangle grown by `margin` (Liang-Barsky).
/// `None` when the segment misses it entirely.
fn clip_segment(
    a: Point,
    b: Point,
    width: usize,
    height: usize,
    margin: f64,
) -> Option<(Point, Point)> {
    let (min_x, min_y) = (-margin, -margin);
    let (max_x, max_y) = (width as f64 + margin, height as f64 + margin);
    let d = b - a;
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);

    for (p, q) in [
        (-d.x, a.x - min_x),
        (d.x, max_x - a.x),
        (-d.y, a.y - min_y),
        (d.y, max_y - a.y),
    ] {
        if p == 0.0 {
            // Parallel to this edge
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    Some((a + d * t0, a + d * t1))
}

fn paint_pixel(mask: &mut Array2<u8>, p: Point, value: u8) {
    let (h, w) = mask.dim();
    if p.x < 0.0 || p.y < 0.0 {
        return;
    }
    let (x, y) = (p.x.floor() as usize, p.y.floor() as usize);
    if x < w && y < h {
        mask[[y, x]] = value;
    }
}

fn paint_stroke(mask: &mut Array2<u8>, points: &[Point], radius: f64, value: u8) {
    let (h, w) = mask.dim();
    let step = (radius / 2.0).max(0.5);
    match points {
        [single] => stamp_disk(mask, *single, radius, value),
        _ => {
            for pair in points.windows(2) {
                // Only the part that can reach the mask is walked
                let Some((a, b)) = clip_segment(pair[0], pair[1], w, h, radius + 1.0) else {
                    continue;
                };
                walk_segment(a, b, step, |p| stamp_disk(mask, p, radius, value));
            }
        }
    }
}

fn paint_polyline(mask: &mut Array2<u8>, points: &[Point], closed: bool, value: u8) {
    let mut segments: Vec<(Point, Point)> = points.windows(2).map(|w| (w[0], w[1])).collect();
    if closed && points.len() > 2 {
        segments.push((points[points.len() - 1], points[0]));
    }
    let (h, w) = mask.dim();
    for (a, b) in segments {
        if let Some((a, b)) = clip_segment(a, b, w, h, 1.0) {
            walk_segment(a, b, 0.5, |p| paint_pixel(mask, p, value));
        }
    }
}

/// Rasterize annotations into a label mask of the image size.
pub fn rasterize_label_mask(annotations: &[Annotation], width: usize, height: usize) -> Array2<u8> {
    let mut mask = Array2::from_elem((height, width), BACKGROUND);

    for annotation in annotations {
        match annotation.shape() {
            AnnotationShape::Stroke(s) => {
                let value = match s.polarity() {
                    Polarity::Positive => label_for(annotation.class_id()),
                    Polarity::Negative => BACKGROUND,
                };
                paint_stroke(&mut mask, s.points(), s.radius(), value);
            }
            AnnotationShape::Polyline(p) => {
                paint_polyline(&mut mask, p.points(), p.closed(), label_for(annotation.class_id()));
            }
        }
    }

    log::debug!(
        "Rasterized {} annotations into {}x{} mask",
        annotations.len(),
        width,
        height
    );
    mask
}

/// Convert a label mask to an 8-bit grayscale image.
pub fn mask_to_image(mask: &Array2<u8>) -> GrayImage {
    let (h, w) = mask.dim();
    GrayImage::from_fn(w as u32, h as u32, |x, y| {
        image::Luma([mask[[y as usize, x as usize]]])
    })
}
