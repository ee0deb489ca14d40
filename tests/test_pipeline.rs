mod common;

use std::sync::Arc;

use common::*;
use image::{DynamicImage, GrayImage};
use imtools::contours::find_external_contours;
use imtools::segmentation::steps::*;
use imtools::ThresholdMode;

fn two_hexagons() -> GrayImage {
    let mut img = GrayImage::new(160, 90);
    draw_hexagon(&mut img, 40.0, 45.0, 12.0, 0.0);
    draw_hexagon(&mut img, 110.0, 45.0, 25.0, 0.0);
    img
}

#[test]
fn cutout_splits_one_item_per_object() -> anyhow::Result<()> {
    init_logging();
    let pipeline = Pipeline::new()
        .add_step_boxed(Box::new(GrayscaleStep))
        .add_step_boxed(Box::new(ContourCutoutStep {
            min_area: 20.0,
            buffer: 4,
            blacken_border: true,
            mask_neighbours: false,
        }))
        .add_step_boxed(Box::new(HexagonFitStep {
            config: HexFitConfig::default(),
        }));
    assert_eq!(pipeline.len(), 3);

    let results = pipeline.run(DynamicImage::ImageLuma8(two_hexagons()))?;
    assert_eq!(results.len(), 2);

    // ascending area: the small hexagon comes first
    for (item, (cx, radius)) in results.iter().zip([(40.0, 12.0), (110.0, 25.0)]) {
        let bbox = item.bbox.expect("cut-outs carry their placement");
        assert!(bbox.x as f64 <= cx && cx <= (bbox.x + bbox.width) as f64);
        assert!(item.get_float("area").unwrap() > 20.0);

        let length = item.get_float("rect_length").unwrap();
        let width = item.get_float("rect_width").unwrap();
        assert!(length >= width);

        let hex_cx = item.get_float("hex_cx").unwrap();
        let hex_cy = item.get_float("hex_cy").unwrap();
        let hex_r = item.get_float("hex_radius").unwrap();
        assert!((hex_cx - cx).abs() < 1.5, "cx {hex_cx}");
        assert!((hex_cy - 45.0).abs() < 1.5, "cy {hex_cy}");
        assert!((hex_r - radius).abs() < 2.0, "radius {hex_r}");
        assert!(item.get_bool("hex_converged").is_some());

        // corners are reported in full-image coordinates
        let corners = item.get_points("corners").expect("six corners");
        assert_eq!(corners.len(), 6);
        for (x, y) in hexagon_corners(cx, 45.0, radius, 0.0) {
            let nearest = corners
                .iter()
                .map(|c| c.distance(&Point2D::new(x, y)))
                .fold(f64::INFINITY, f64::min);
            assert!(nearest < 3.0, "no corner near ({x:.1}, {y:.1})");
        }
    }
    Ok(())
}

#[test]
fn min_area_filters_small_objects() -> anyhow::Result<()> {
    let pipeline = Pipeline::new().add_step(Arc::new(ContourCutoutStep {
        min_area: 1000.0,
        buffer: 0,
        blacken_border: false,
        mask_neighbours: false,
    }));
    let results = pipeline.run(DynamicImage::ImageLuma8(two_hexagons()))?;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].get_int("contour_index"), Some(1));
    Ok(())
}

fn cutouts_of(img: &GrayImage, mask_neighbours: bool) -> anyhow::Result<Vec<imtools::PipelineData>> {
    Pipeline::new()
        .add_step_boxed(Box::new(ContourCutoutStep {
            min_area: 20.0,
            buffer: 8,
            blacken_border: false,
            mask_neighbours,
        }))
        .run(DynamicImage::ImageLuma8(img.clone()))
}

#[test]
fn neighbours_can_be_masked_out_of_a_cutout() -> anyhow::Result<()> {
    let mut img = GrayImage::new(100, 90);
    draw_hexagon(&mut img, 25.0, 45.0, 10.0, 0.0);
    draw_hexagon(&mut img, 65.0, 45.0, 25.0, 0.0);

    // the small hexagon sorts first and its buffered box reaches the big one
    let plain = cutouts_of(&img, false)?;
    assert_eq!(plain.len(), 2);
    let crop = plain[0].image.to_luma8();
    assert_eq!(find_external_contours(&crop).len(), 2);

    let masked = cutouts_of(&img, true)?;
    assert_eq!(masked.len(), 2);
    let crop = masked[0].image.to_luma8();
    assert_eq!(find_external_contours(&crop).len(), 1);
    assert_eq!(masked[0].bbox, plain[0].bbox);
    Ok(())
}

#[test]
fn largest_component_drops_blank_items() -> anyhow::Result<()> {
    let pipeline = Pipeline::new().add_step_boxed(Box::new(LargestComponentStep));

    assert!(pipeline.run(DynamicImage::new_luma8(20, 20))?.is_empty());

    let results = pipeline.run(DynamicImage::ImageLuma8(two_hexagons()))?;
    assert_eq!(results.len(), 1);
    let mask = results[0].image.to_luma8();
    assert_eq!(mask.get_pixel(110, 45)[0], 255);
    assert_eq!(mask.get_pixel(40, 45)[0], 0);
    Ok(())
}

#[test]
fn run_partial_stops_early() -> anyhow::Result<()> {
    let pipeline = Pipeline::new()
        .add_step_boxed(Box::new(GrayscaleStep))
        .add_step_boxed(Box::new(OpeningStep { iterations: 1 }))
        .add_step_boxed(Box::new(LargestComponentStep));

    let results = pipeline.run_partial(DynamicImage::new_luma8(20, 20), 2)?;
    assert_eq!(results.len(), 1);
    assert!(pipeline.run(DynamicImage::new_luma8(20, 20))?.is_empty());
    Ok(())
}

#[test]
fn debug_dir_must_be_empty() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    std::fs::write(dir.path().join("leftover.txt"), "x")?;
    assert!(Pipeline::new().with_debug(dir.path().to_path_buf()).is_err());

    let fresh = dir.path().join("fresh");
    assert!(Pipeline::new().with_debug(fresh.clone()).is_ok());
    assert!(fresh.is_dir());
    Ok(())
}

#[test]
fn debug_run_saves_every_step() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let pipeline = Pipeline::new()
        .with_debug(dir.path().to_path_buf())?
        .add_step_boxed(Box::new(WatershedStep {
            config: WatershedConfig {
                watershed_threshold: 5.0,
                block_size: 51,
                mode: ThresholdMode::Binary,
                ..WatershedConfig::default()
            },
            emit_regions: true,
        }));

    let img = rgb_disks(120, 80, &[(30, 40, 15), (90, 40, 15)]);
    let results = pipeline.run(DynamicImage::ImageRgb8(img))?;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].get_int("seeds"), Some(2));

    assert!(dir.path().join("00_input").join("01.png").is_file());
    assert!(dir.path().join("01_watershed").join("01.png").is_file());
    assert!(dir.path().join("watershed_markers").join("01_sure_foreground.png").is_file());

    let regions = results[0].image.to_luma8();
    assert_eq!(regions.get_pixel(30, 40)[0], 255);
    assert_eq!(regions.get_pixel(60, 40)[0], 0);
    Ok(())
}

#[test]
fn adaptive_threshold_step_rejects_bad_block() {
    let pipeline = Pipeline::new().add_step_boxed(Box::new(AdaptiveThresholdStep {
        block_size: 2,
        constant: 0,
        mode: ThresholdMode::Binary,
    }));
    assert!(pipeline.run(DynamicImage::new_luma8(10, 10)).is_err());
}

#[test]
fn items_keep_the_original() -> anyhow::Result<()> {
    let pipeline = Pipeline::new().add_step_boxed(Box::new(GrayscaleStep));
    let img = DynamicImage::ImageRgb8(rgb_disks(30, 30, &[(15, 15, 5)]));
    let results = pipeline.run(img.clone())?;
    assert_eq!(results[0].original.as_ref(), &img);
    assert!(results[0].bbox.is_none());
    assert!(matches!(results[0].image, DynamicImage::ImageLuma8(_)));
    Ok(())
}
