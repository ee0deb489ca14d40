pub mod analysis;
pub mod cutout;

use image::GrayImage;
use imageproc::contours::BorderType;

use crate::models::{Contour, Point2D};

pub use analysis::{
    center_of_mass, contour_area, find_contour_corners, rotated_bounding_rectangle,
    sort_contours,
};
pub use cutout::{crop_and_mask, cut_out_object, mask_image, MaskColour};

/// Trace the borders of the non-zero regions of a binary image.
///
/// Outer borders and hole borders are both returned; `parent` indexes into
/// the same result.
pub fn find_contours(binary: &GrayImage) -> Vec<Contour> {
    imageproc::contours::find_contours::<i32>(binary)
        .into_iter()
        .map(|c| Contour {
            points: c.points.into_iter().map(Point2D::from).collect(),
            parent: c.parent,
            is_hole: c.border_type == BorderType::Hole,
        })
        .collect()
}

/// Only the outermost borders, i.e. those without a parent.
pub fn find_external_contours(binary: &GrayImage) -> Vec<Contour> {
    find_contours(binary)
        .into_iter()
        .filter(|c| c.parent.is_none())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn ring_has_outer_and_hole_border() {
        let mut img = GrayImage::new(20, 20);
        for y in 4..16 {
            for x in 4..16 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        for y in 8..12 {
            for x in 8..12 {
                img.put_pixel(x, y, Luma([0]));
            }
        }

        let contours = find_contours(&img);
        assert_eq!(contours.len(), 2);
        let outer = contours.iter().position(|c| !c.is_hole).unwrap();
        let hole = contours.iter().find(|c| c.is_hole).unwrap();
        assert_eq!(hole.parent, Some(outer));
        assert_eq!(find_external_contours(&img).len(), 1);
    }

    #[test]
    fn blank_image_has_no_contours() {
        assert!(find_contours(&GrayImage::new(8, 8)).is_empty());
    }
}
