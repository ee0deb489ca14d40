use image::{GrayImage, ImageBuffer, Pixel, Primitive};

use crate::error::FitError;
use crate::models::{BoundingBox, Contour};

/// What pixels outside a mask are replaced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskColour {
    #[default]
    Black,
    White,
}

/// Keep the pixels where `mask` is non-zero and paint the rest `colour`.
pub fn mask_image<P>(
    image: &ImageBuffer<P, Vec<P::Subpixel>>,
    mask: &GrayImage,
    colour: MaskColour,
) -> Result<ImageBuffer<P, Vec<P::Subpixel>>, FitError>
where
    P: Pixel,
{
    if image.dimensions() != mask.dimensions() {
        return Err(FitError::InvalidParameter(format!(
            "mask size {:?} does not match image size {:?}",
            mask.dimensions(),
            image.dimensions()
        )));
    }
    let fill = match colour {
        MaskColour::Black => <P::Subpixel as Primitive>::DEFAULT_MIN_VALUE,
        MaskColour::White => <P::Subpixel as Primitive>::DEFAULT_MAX_VALUE,
    };

    let mut out = image.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        if mask.get_pixel(x, y)[0] == 0 {
            pixel.channels_mut().iter_mut().for_each(|c| *c = fill);
        }
    }
    Ok(out)
}

/// Mask the image, then crop it to `bbox`.
pub fn crop_and_mask<P>(
    image: &ImageBuffer<P, Vec<P::Subpixel>>,
    bbox: BoundingBox,
    mask: &GrayImage,
    colour: MaskColour,
) -> Result<ImageBuffer<P, Vec<P::Subpixel>>, FitError>
where
    P: Pixel + 'static,
{
    let (width, height) = image.dimensions();
    if bbox.width == 0
        || bbox.height == 0
        || bbox.x as u64 + bbox.width as u64 > width as u64
        || bbox.y as u64 + bbox.height as u64 > height as u64
    {
        return Err(FitError::OutOfBounds);
    }
    let masked = mask_image(image, mask, colour)?;
    Ok(image::imageops::crop_imm(&masked, bbox.x, bbox.y, bbox.width, bbox.height).to_image())
}

/// Crop the axis-aligned box around a contour, grown by `buffer` pixels.
///
/// The grown box is clipped to the image, so the crop never reaches past an
/// edge. With `blacken_border` the outermost ring of the crop is set to zero,
/// which closes any object touching the crop edge for a later contour pass.
pub fn cut_out_object<P>(
    image: &ImageBuffer<P, Vec<P::Subpixel>>,
    contour: &Contour,
    buffer: u32,
    blacken_border: bool,
) -> Result<(ImageBuffer<P, Vec<P::Subpixel>>, BoundingBox), FitError>
where
    P: Pixel + 'static,
    P::Subpixel: Default,
{
    let (min_x, min_y, max_x, max_y) = contour.pixel_bounds().ok_or(FitError::EmptyInput)?;
    let buffer = buffer as i64;

    let x0 = (min_x - buffer).max(0);
    let y0 = (min_y - buffer).max(0);
    let x1 = (max_x + 1 + buffer).min(image.width() as i64);
    let y1 = (max_y + 1 + buffer).min(image.height() as i64);
    if x1 <= x0 || y1 <= y0 {
        return Err(FitError::OutOfBounds);
    }

    let bbox = BoundingBox {
        x: x0 as u32,
        y: y0 as u32,
        width: (x1 - x0) as u32,
        height: (y1 - y0) as u32,
    };
    let mut crop = image::imageops::crop_imm(image, bbox.x, bbox.y, bbox.width, bbox.height).to_image();

    if blacken_border {
        let (w, h) = crop.dimensions();
        for (x, y, pixel) in crop.enumerate_pixels_mut() {
            if x == 0 || y == 0 || x == w - 1 || y == h - 1 {
                pixel.channels_mut().iter_mut().for_each(|c| *c = P::Subpixel::default());
            }
        }
    }

    Ok((crop, bbox))
}
