//! Product image rules
//!
//! One validation component for every product write path. Checks run in a
//! fixed order and the first failure wins: minimum resolution, maximum
//! resolution, byte size.

use std::io::Cursor;
use thiserror::Error;

pub const MIN_RESOLUTION: (u32, u32) = (400, 400);
pub const MAX_RESOLUTION: (u32, u32) = (2000, 2000);
pub const MAX_IMAGE_BYTES: usize = 3_145_728;

#[derive(Clone, Copy, Debug)]
pub struct ImagePolicy {
    pub min_width: u32,
    pub min_height: u32,
    pub max_width: u32,
    pub max_height: u32,
    pub max_bytes: usize,
}

impl Default for ImagePolicy {
    fn default() -> Self {
        Self {
            min_width: MIN_RESOLUTION.0,
            min_height: MIN_RESOLUTION.1,
            max_width: MAX_RESOLUTION.0,
            max_height: MAX_RESOLUTION.1,
            max_bytes: MAX_IMAGE_BYTES,
        }
    }
}

impl ImagePolicy {
    /// Bounds check on already-known dimensions and blob length.
    pub fn check(&self, width: u32, height: u32, len: usize) -> Result<(), ImageRuleError> {
        if width < self.min_width || height < self.min_height {
            return Err(ImageRuleError::MinResolution {
                width,
                height,
                min_width: self.min_width,
                min_height: self.min_height,
            });
        }
        if width > self.max_width || height > self.max_height {
            return Err(ImageRuleError::MaxResolution {
                width,
                height,
                max_width: self.max_width,
                max_height: self.max_height,
            });
        }
        if len > self.max_bytes {
            return Err(ImageRuleError::MaxSize {
                len,
                max_bytes: self.max_bytes,
            });
        }
        Ok(())
    }

    /// Probes the blob's dimensions (header read, no full decode) and runs
    /// the bounds check against them.
    pub fn validate(&self, blob: &[u8]) -> Result<(), ImageRuleError> {
        let reader = image::ImageReader::new(Cursor::new(blob))
            .with_guessed_format()
            .map_err(|e| ImageRuleError::Unreadable(e.to_string()))?;
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| ImageRuleError::Unreadable(e.to_string()))?;
        self.check(width, height, blob.len())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ImageRuleError {
    #[error("image is {width}x{height}, below the {min_width}x{min_height} minimum")]
    MinResolution {
        width: u32,
        height: u32,
        min_width: u32,
        min_height: u32,
    },
    #[error("image is {width}x{height}, above the {max_width}x{max_height} maximum")]
    MaxResolution {
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },
    #[error("image is {len} bytes, above the {max_bytes} byte limit")]
    MaxSize { len: usize, max_bytes: usize },
    #[error("image could not be read: {0}")]
    Unreadable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::new_rgb8(width, height)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_min_resolution_rejected() {
        let err = ImagePolicy::default().validate(&png(300, 300)).unwrap_err();
        assert!(matches!(err, ImageRuleError::MinResolution { .. }));
    }

    #[test]
    fn test_max_resolution_rejected() {
        let err = ImagePolicy::default().validate(&png(2500, 2500)).unwrap_err();
        assert!(matches!(err, ImageRuleError::MaxResolution { .. }));
    }

    #[test]
    fn test_byte_bound_independent_of_resolution() {
        // In resolution bounds but past the byte limit.
        let err = ImagePolicy::default()
            .check(500, 500, 4 * 1024 * 1024)
            .unwrap_err();
        assert!(matches!(err, ImageRuleError::MaxSize { .. }));
    }

    #[test]
    fn test_oversized_blob_rejected() {
        // Dimension probing only reads the header, so trailing padding keeps
        // the dimensions valid while pushing the blob past the byte limit.
        let mut blob = png(500, 500);
        blob.resize(4 * 1024 * 1024, 0);
        let err = ImagePolicy::default().validate(&blob).unwrap_err();
        assert!(matches!(err, ImageRuleError::MaxSize { .. }));
    }

    #[test]
    fn test_min_check_wins_over_size() {
        // Short-circuit order: an image failing both bounds reports the
        // resolution violation.
        let err = ImagePolicy::default()
            .check(300, 300, 4 * 1024 * 1024)
            .unwrap_err();
        assert!(matches!(err, ImageRuleError::MinResolution { .. }));
    }

    #[test]
    fn test_valid_image_accepted() {
        assert_eq!(ImagePolicy::default().validate(&png(500, 500)), Ok(()));
    }

    #[test]
    fn test_garbage_blob_unreadable() {
        let err = ImagePolicy::default().validate(b"not an image").unwrap_err();
        assert!(matches!(err, ImageRuleError::Unreadable(_)));
    }

    #[test]
    fn test_edge_dimensions_accepted() {
        assert_eq!(ImagePolicy::default().check(400, 400, 1024), Ok(()));
        assert_eq!(ImagePolicy::default().check(2000, 2000, 1024), Ok(()));
    }
}
