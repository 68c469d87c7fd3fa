use image::{DynamicImage, GrayImage, Luma, Pixel};

/// ITU-R BT.601 luma in 14-bit fixed point; the weights sum to 1 << 14
const R_WEIGHT: u32 = 4899;
const G_WEIGHT: u32 = 9617;
const B_WEIGHT: u32 = 1868;

#[inline(always)]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * R_WEIGHT + g as u32 * G_WEIGHT + b as u32 * B_WEIGHT + (1 << 13)) >> 14) as u8
}

/// Single-channel 8-bit intensity view of a decoded image.
///
/// Gray inputs pass through, alpha is discarded, colour is reduced with
/// BT.601 weights. Deeper formats are first brought down to 8 bits.
pub fn to_luma(img: &DynamicImage) -> GrayImage {
    match img {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        DynamicImage::ImageLumaA8(gray_alpha) => {
            GrayImage::from_fn(gray_alpha.width(), gray_alpha.height(), |x, y| {
                Luma([gray_alpha.get_pixel(x, y)[0]])
            })
        }
        DynamicImage::ImageRgb8(rgb) => GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
            let p = rgb.get_pixel(x, y);
            Luma([luma(p[0], p[1], p[2])])
        }),
        DynamicImage::ImageRgba8(rgba) => GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
            let p = rgba.get_pixel(x, y).to_rgb();
            Luma([luma(p[0], p[1], p[2])])
        }),
        other if other.color().has_color() => to_luma(&DynamicImage::ImageRgb8(other.to_rgb8())),
        other => other.to_luma8(),
    }
}
