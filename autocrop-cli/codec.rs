use std::path::Path;

use image::{DynamicImage, ImageFormat, ImageReader};
use log::debug;

use crate::error::{CropError, CropResult};

/// Decode any raster the `image` crate understands, guessing from content first
pub fn load_image(path: &Path) -> CropResult<DynamicImage> {
    let unreadable = |source: image::ImageError| CropError::UnreadableImage {
        path: path.to_path_buf(),
        source,
    };
    let img = ImageReader::open(path)
        .map_err(|e| unreadable(image::ImageError::IoError(e)))?
        .with_guessed_format()
        .map_err(|e| unreadable(image::ImageError::IoError(e)))?
        .decode()
        .map_err(unreadable)?;
    debug!("decoded {} as {}x{} {:?}", path.display(), img.width(), img.height(), img.color());
    Ok(img)
}

/// Encode by file extension; formats without alpha get a flattened RGB copy
pub fn save_image(img: &DynamicImage, path: &Path) -> CropResult<()> {
    let write_failed = |source: image::ImageError| CropError::OutputWrite {
        path: path.to_path_buf(),
        source,
    };
    let format = ImageFormat::from_path(path).map_err(write_failed)?;
    let encodable = match format {
        ImageFormat::Jpeg if !matches!(img, DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_)) => {
            DynamicImage::ImageRgb8(img.to_rgb8())
        }
        _ => img.clone(),
    };
    encodable.save_with_format(path, format).map_err(write_failed)
}
