mod common;

use std::f64::consts::FRAC_PI_3;

use common::*;
use image::GrayImage;
use imtools::contours::{
    contour_area, cut_out_object, find_contour_corners, find_external_contours,
    rotated_bounding_rectangle, sort_contours,
};
use imtools::features::extract_largest_component;
use imtools::geometry::{fit_circle_three_points, fit_regular_hexagon, min_enclosing_circle};
use imtools::FeatureError;

fn drawn_hexagon() -> (GrayImage, Contour) {
    let mut img = GrayImage::new(120, 120);
    draw_hexagon(&mut img, 60.0, 60.0, 30.0, 0.0);
    let mut contours = find_external_contours(&img);
    assert_eq!(contours.len(), 1);
    (img, contours.remove(0))
}

#[test]
fn hexagon_is_recovered_from_pixels() -> anyhow::Result<()> {
    init_logging();
    let (_, contour) = drawn_hexagon();

    let hex = fit_regular_hexagon(&contour, &HexFitConfig::default())?;
    assert!((hex.center.x - 60.0).abs() < 1.5, "{:?}", hex.center);
    assert!((hex.center.y - 60.0).abs() < 1.5, "{:?}", hex.center);
    assert!((hex.radius - 30.0).abs() < 2.0, "radius {}", hex.radius);

    let off = hex.rotation.rem_euclid(FRAC_PI_3);
    assert!(off.min(FRAC_PI_3 - off) < 0.05, "rotation {}", hex.rotation);
    Ok(())
}

#[test]
fn hexagon_corners_land_on_vertices() -> anyhow::Result<()> {
    let (_, contour) = drawn_hexagon();

    let (corners, _) = find_contour_corners(&contour, 6, true)?;
    assert_eq!(corners.len(), 6);

    let mut unique = corners.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), 6);

    for (x, y) in hexagon_corners(60.0, 60.0, 30.0, 0.0) {
        let nearest = corners
            .iter()
            .map(|&i| contour.points[i].distance(&Point2D::new(x, y)))
            .fold(f64::INFINITY, f64::min);
        assert!(nearest < 3.0, "no corner near ({x:.1}, {y:.1}): {nearest:.2}");
    }
    Ok(())
}

#[test]
fn rotated_rect_of_disk_is_square_ish() -> anyhow::Result<()> {
    let img = disks(80, 80, &[(40, 40, 20)]);
    let contours = find_external_contours(&img);

    let rect = rotated_bounding_rectangle(&contours[0])?;
    assert!(rect.length >= rect.width);
    assert!((rect.length - rect.width) < 3.0);
    assert!((rect.center.x - 40.0).abs() < 1.0 && (rect.center.y - 40.0).abs() < 1.0);
    assert!((-90.0..0.0).contains(&rect.angle));
    Ok(())
}

#[test]
fn enclosing_circle_covers_the_contour() -> anyhow::Result<()> {
    let img = disks(80, 80, &[(40, 40, 20)]);
    let contours = find_external_contours(&img);

    let circle = min_enclosing_circle(&contours[0].points)?;
    assert!(contours[0].points.iter().all(|p| circle.contains(p, 1e-6)));
    assert!((circle.radius - 20.0).abs() < 1.5);

    // three points of the same outline give nearly the same circle
    let pts = &contours[0].points;
    let n = pts.len();
    let through = fit_circle_three_points(pts[0], pts[n / 3], pts[2 * n / 3])?;
    assert!(through.center.distance(&circle.center) < 2.0);
    Ok(())
}

#[test]
fn contours_sort_by_area() {
    let img = disks(160, 60, &[(20, 30, 12), (70, 30, 5), (125, 30, 20)]);
    let sorted = sort_contours(find_external_contours(&img));

    let areas: Vec<f64> = sorted.iter().map(contour_area).collect();
    assert_eq!(areas.len(), 3);
    assert!(areas.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(sort_contours(sorted.clone()), sorted);
}

#[test]
fn cut_out_at_the_image_edge_stays_inside() -> anyhow::Result<()> {
    let img = disks(40, 40, &[(3, 3, 8)]);
    let contours = find_external_contours(&img);

    let (crop, bbox) = cut_out_object(&img, &contours[0], 10, true)?;
    assert_eq!((bbox.x, bbox.y), (0, 0));
    assert!(bbox.x + bbox.width <= 40 && bbox.y + bbox.height <= 40);
    assert_eq!(crop.dimensions(), (bbox.width, bbox.height));

    // the blackened ring closes the object so it traces as one region again
    let (w, h) = crop.dimensions();
    assert!(crop.enumerate_pixels().all(|(x, y, p)| !(x == 0 || y == 0 || x == w - 1 || y == h - 1) || p[0] == 0));
    assert_eq!(find_external_contours(&crop).len(), 1);
    Ok(())
}

#[test]
fn largest_component_wins() -> anyhow::Result<()> {
    let img = disks(120, 60, &[(20, 30, 8), (80, 30, 18)]);
    let mask = extract_largest_component(&img)?;
    assert_eq!(mask.get_pixel(80, 30)[0], 255);
    assert_eq!(mask.get_pixel(20, 30)[0], 0);

    let err = extract_largest_component(&GrayImage::new(10, 10)).unwrap_err();
    assert_eq!(err, FeatureError::NoForegroundComponents);
    Ok(())
}
