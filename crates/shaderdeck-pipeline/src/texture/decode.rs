use std::path::Path;

use image::imageops::FilterType;

use crate::error::TextureLoadError;

/// Tightly packed RGBA8 pixels, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl DecodedImage {
    /// Wraps raw RGBA8 pixels. Rejects zero extents and buffers whose length
    /// does not match `width * 4` bytes per row.
    pub fn from_rgba8(
        path: &Path,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    ) -> Result<Self, TextureLoadError> {
        if width == 0 || height == 0 {
            return Err(TextureLoadError::Unsupported {
                path: path.to_path_buf(),
                reason: format!("zero extent ({width}x{height})"),
            });
        }

        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(TextureLoadError::Unsupported {
                path: path.to_path_buf(),
                reason: format!(
                    "non-contiguous row stride ({} bytes for {width}x{height})",
                    pixels.len()
                ),
            });
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Levels in a full chain down to 1x1.
    pub fn mip_level_count(&self) -> u32 {
        32 - self.width.max(self.height).leading_zeros()
    }

    /// All mip levels concatenated, largest first.
    pub fn mip_chain(&self) -> Vec<u8> {
        let levels = self.mip_level_count();
        let mut out = self.pixels.clone();

        let Some(mut prev) = image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
        else {
            return out;
        };

        for level in 1..levels {
            let w = (self.width >> level).max(1);
            let h = (self.height >> level).max(1);
            let next = image::imageops::resize(&prev, w, h, FilterType::Triangle);
            out.extend_from_slice(next.as_raw());
            prev = next;
        }

        out
    }
}

/// Reads and decodes a PNG/JPEG file into RGBA8.
pub fn decode_file(path: &Path) -> Result<DecodedImage, TextureLoadError> {
    let bytes = std::fs::read(path).map_err(|source| TextureLoadError::NotFound {
        path: path.to_path_buf(),
        source,
    })?;

    let img = image::load_from_memory(&bytes).map_err(|source| TextureLoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    DecodedImage::from_rgba8(path, width, height, rgba.into_raw())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("shaderdeck-decode-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn mip_chain_covers_every_level() {
        let img = DecodedImage::from_rgba8(Path::new("x"), 8, 2, vec![255; 8 * 2 * 4]).unwrap();
        assert_eq!(img.mip_level_count(), 4);

        // 8x2, 4x1, 2x1, 1x1
        let texels = 16 + 4 + 2 + 1;
        assert_eq!(img.mip_chain().len(), texels * 4);
    }

    #[test]
    fn single_texel_has_one_level() {
        let img = DecodedImage::from_rgba8(Path::new("x"), 1, 1, vec![0, 0, 0, 255]).unwrap();
        assert_eq!(img.mip_level_count(), 1);
        assert_eq!(img.mip_chain(), vec![0, 0, 0, 255]);
    }

    #[test]
    fn zero_extent_is_unsupported() {
        let err = DecodedImage::from_rgba8(Path::new("empty.png"), 0, 4, Vec::new()).unwrap_err();
        assert!(matches!(err, TextureLoadError::Unsupported { .. }));
    }

    #[test]
    fn padded_rows_are_unsupported() {
        // 3 pixels wide, rows padded to 16 bytes.
        let err = DecodedImage::from_rgba8(Path::new("padded.png"), 3, 2, vec![0; 32]).unwrap_err();
        match err {
            TextureLoadError::Unsupported { reason, .. } => assert!(reason.contains("stride")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_names_the_path() {
        let path = Path::new("/no/such/dir/noise.png");
        let err = decode_file(path).unwrap_err();
        assert!(matches!(err, TextureLoadError::NotFound { .. }));
        assert_eq!(err.path(), path);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let path = scratch_dir().join("garbage.png");
        std::fs::write(&path, b"definitely not an image").unwrap();
        assert!(matches!(decode_file(&path), Err(TextureLoadError::Decode { .. })));
    }

    #[test]
    fn png_rows_stay_top_to_bottom() {
        let path = scratch_dir().join("two_rows.png");
        let mut img = image::RgbaImage::new(1, 2);
        img.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        img.put_pixel(0, 1, image::Rgba([0, 0, 255, 255]));
        img.save(&path).unwrap();

        let decoded = decode_file(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1, 2));
        assert_eq!(&decoded.pixels()[..4], &[255, 0, 0, 255]);
        assert_eq!(&decoded.pixels()[4..], &[0, 0, 255, 255]);
    }
}
