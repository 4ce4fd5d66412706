//! # Image Sources
//!
//! Resolves image sources (file paths, data URIs, raw base64 strings or
//! in-memory bytes) to encoded bytes, and decodes PNG, JPEG and WebP data
//! into RGBA bitmaps for the backends.
//!
//! Reading a source is the core's job and fails as an unsupported source.
//! Decoding belongs to the backend and fails as a backend error.

use crate::backend::Bitmap;
use crate::error::BackendError;
use image::ImageFormat;
use std::path::{Path, PathBuf};

/// Where an image comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
    /// A `src` string: `data:image/...;base64,...`, a path starting with
    /// `/`, `./` or `../`, or raw base64.
    Src(String),
}

impl From<&str> for ImageSource {
    fn from(src: &str) -> Self {
        ImageSource::Src(src.to_string())
    }
}

impl From<String> for ImageSource {
    fn from(src: String) -> Self {
        ImageSource::Src(src)
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        ImageSource::Bytes(bytes)
    }
}

/// How a `src` string is read.
#[derive(Debug, PartialEq)]
enum SrcKind<'a> {
    /// Payload after the comma of a data URI.
    DataUri(&'a str),
    File(&'a Path),
    Base64(&'a str),
}

impl<'a> SrcKind<'a> {
    /// Base64 text may contain `/`, so only relative or absolute path
    /// prefixes make a file.
    fn of(src: &'a str) -> Result<SrcKind<'a>, String> {
        if let Some(uri) = src.strip_prefix("data:") {
            let (_, payload) = uri
                .split_once(',')
                .ok_or_else(|| format!("data URI without a payload: '{}'", truncate(src)))?;
            return Ok(SrcKind::DataUri(payload));
        }
        if ["/", "./", "../"].iter().any(|prefix| src.starts_with(prefix)) {
            return Ok(SrcKind::File(Path::new(src)));
        }
        Ok(SrcKind::Base64(src))
    }
}

fn truncate(src: &str) -> &str {
    match src.char_indices().nth(32) {
        Some((i, _)) => &src[..i],
        None => src,
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, String> {
    std::fs::read(path).map_err(|e| format!("cannot read '{}': {}", path.display(), e))
}

fn decode_base64(text: &str) -> Result<Vec<u8>, String> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(text.trim())
        .map_err(|e| format!("not a path, data URI or base64 ({})", e))
}

/// Resolve a source to its encoded bytes.
pub fn read_source(source: &ImageSource) -> Result<Vec<u8>, String> {
    match source {
        ImageSource::Path(path) => read_file(path),
        ImageSource::Bytes(bytes) => Ok(bytes.clone()),
        ImageSource::Src(src) => read_source_bytes(src),
    }
}

/// Bytes behind a `src` string. Fonts are loaded the same way.
pub(crate) fn read_source_bytes(src: &str) -> Result<Vec<u8>, String> {
    match SrcKind::of(src)? {
        SrcKind::DataUri(payload) | SrcKind::Base64(payload) => decode_base64(payload),
        SrcKind::File(path) => read_file(path),
    }
}

/// Decode PNG, JPEG or WebP data to RGBA. The format is guessed from the
/// leading bytes.
pub fn decode_bitmap(data: &[u8]) -> Result<Bitmap, BackendError> {
    let format = image::guess_format(data)
        .map_err(|_| BackendError::UnsupportedFormat("unrecognised image data".to_string()))?;
    if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP) {
        return Err(BackendError::UnsupportedFormat(format!(
            "{:?} images are not supported, use PNG, JPEG or WebP",
            format
        )));
    }

    let decoded = image::load_from_memory_with_format(data, format)?;
    Ok(Bitmap::new(decoded.to_rgba8()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encoded(width: u32, height: u32, pixel: [u8; 4], format: ImageOutputFormat) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(pixel)));
        let img = match format {
            ImageOutputFormat::Png => img,
            _ => image::DynamicImage::ImageRgb8(img.to_rgb8()),
        };
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    #[test]
    fn test_src_kinds() {
        assert_eq!(SrcKind::of("data:image/png;base64,AAAA"), Ok(SrcKind::DataUri("AAAA")));
        assert_eq!(SrcKind::of("./logo.png"), Ok(SrcKind::File(Path::new("./logo.png"))));
        assert_eq!(SrcKind::of("/tmp/logo.png"), Ok(SrcKind::File(Path::new("/tmp/logo.png"))));
        // base64 alphabet includes '/'
        assert_eq!(SrcKind::of("iVBO/w=="), Ok(SrcKind::Base64("iVBO/w==")));
        assert!(SrcKind::of("data:image/png;base64").is_err());
    }

    #[test]
    fn test_unreadable_sources() {
        let missing = read_source(&ImageSource::from("./no/such/badge.png")).unwrap_err();
        assert!(missing.contains("cannot read './no/such/badge.png'"));
        let garbage = read_source(&ImageSource::from("not base64 at all!")).unwrap_err();
        assert!(garbage.starts_with("not a path, data URI or base64"));
    }

    #[test]
    fn test_only_raster_formats_decode() {
        assert!(matches!(
            decode_bitmap(&[0x00, 0x01, 0x02]),
            Err(BackendError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            decode_bitmap(b"GIF89a\x01\x00\x01\x00"),
            Err(BackendError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_png_keeps_straight_alpha() {
        let bytes = encoded(2, 1, [255, 0, 0, 128], ImageOutputFormat::Png);
        let bitmap = decode_bitmap(&bytes).unwrap();
        assert_eq!((bitmap.width(), bitmap.height()), (2, 1));
        assert_eq!(bitmap.pixels().get_pixel(1, 0).0, [255, 0, 0, 128]);
    }

    #[test]
    fn test_jpeg_is_opaque() {
        let bytes = encoded(3, 3, [0, 128, 255, 255], ImageOutputFormat::Jpeg(90));
        let bitmap = decode_bitmap(&bytes).unwrap();
        assert_eq!(bitmap.width(), 3);
        assert!(bitmap.pixels().pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn test_data_uri_and_raw_base64_agree() {
        use base64::Engine;
        let png = encoded(1, 1, [0, 255, 0, 255], ImageOutputFormat::Png);
        let b64 = base64::engine::general_purpose::STANDARD.encode(&png);

        let from_uri = read_source(&ImageSource::from(format!("data:image/png;base64,{}", b64)));
        let from_raw = read_source(&ImageSource::from(b64));
        assert_eq!(from_uri.unwrap(), png);
        assert_eq!(from_raw.unwrap(), png);
        assert_eq!(read_source(&ImageSource::from(png.clone())).unwrap(), png);
    }
}
