use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_polygon_mut};
use imageproc::point::Point;
use tempfile::NamedTempFile;

/// Black image with a white filled disk at each `(x, y, radius)`.
pub fn disks(width: u32, height: u32, disks: &[(i32, i32, i32)]) -> GrayImage {
    let mut img = GrayImage::new(width, height);
    for &(x, y, r) in disks {
        draw_filled_circle_mut(&mut img, (x, y), r, Luma([255u8]));
    }
    img
}

/// Colour version of `disks`: white disks on black.
pub fn rgb_disks(width: u32, height: u32, centres: &[(i32, i32, i32)]) -> RgbImage {
    let mut img = RgbImage::new(width, height);
    for &(x, y, r) in centres {
        draw_filled_circle_mut(&mut img, (x, y), r, Rgb([255u8, 255, 255]));
    }
    img
}

/// Corners of a regular hexagon, vertex 0 at `rotation` radians from the x axis.
pub fn hexagon_corners(cx: f64, cy: f64, radius: f64, rotation: f64) -> [(f64, f64); 6] {
    std::array::from_fn(|k| {
        let t = rotation + k as f64 * std::f64::consts::FRAC_PI_3;
        (cx + radius * t.cos(), cy + radius * t.sin())
    })
}

/// Draw a filled white regular hexagon onto `img`.
pub fn draw_hexagon(img: &mut GrayImage, cx: f64, cy: f64, radius: f64, rotation: f64) {
    let poly: Vec<Point<i32>> = hexagon_corners(cx, cy, radius, rotation)
        .iter()
        .map(|&(x, y)| Point::new(x.round() as i32, y.round() as i32))
        .collect();
    draw_polygon_mut(img, &poly, Luma([255u8]));
}

/// Writes a test image to a temporary PNG and returns the temp file.
/// The file will be automatically cleaned up when dropped.
pub fn save_temp_png(img: &RgbImage) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("Failed to create temp image file");
    img.save_with_format(file.path(), image::ImageFormat::Png)
        .expect("Failed to save test image");
    file
}

