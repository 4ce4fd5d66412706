//! # dynimage
//!
//! Declarative composite raster images.
//!
//! Describe an image as a tree of boxes (blocks, tables, text and embedded
//! images) with CSS-like options, and dynimage resolves every box to pixel
//! geometry and draws it through a backend. Sizes can be fixed, relative to
//! the parent, or taken from the content; tables size their columns and rows
//! from their cells; text can be cropped or shrunk until it fits its box.
//!
//! ## Architecture
//!
//! ```text
//! Input (builder API or JSON)
//!       ↓
//!   [model]     : serde description of a document
//!       ↓
//!   [document]  : root block, pixel format, backend
//!       ↓
//!   [layout]    : resolve sizes bottom-up, draw top-down
//!       ↓         ([style] options, [paint] colours and gradients,
//!       ↓          [text] fitting)
//!   [backend]   : measure, rasterize, encode (PNG/JPEG)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use dynimage::{Document, DocumentOptions, RasterBackend, SaveOptions};
//! use dynimage::style::{BoxOptions, Edges, Size};
//! use dynimage::text::TextOptions;
//!
//! let mut options = DocumentOptions::default();
//! options.frame.width = Size::Fixed(320.0);
//! options.frame.padding = Edges::uniform(10.0);
//! let mut doc = Document::new(options, RasterBackend::new());
//! doc.text("Hello", TextOptions::with_font("Sans Bold 24"))
//!     .block(BoxOptions::default(), |b| {
//!         b.text("<i>world</i>", TextOptions::default());
//!     });
//! doc.save("hello.png", &SaveOptions::default()).unwrap();
//! ```

pub mod backend;
pub mod document;
pub mod error;
pub mod font;
pub mod geometry;
pub mod image_loader;
pub mod layout;
pub mod model;
pub mod paint;
pub mod style;
pub mod text;

pub use backend::{Backend, Canvas, RasterBackend, RecordingBackend};
pub use document::{Document, DocumentOptions, SaveOptions};
pub use error::{ConfigError, DynImageError, Result};
pub use model::DocumentSpec;
pub use paint::PaintSource;

/// Render a document described as JSON with the raster backend.
///
/// Fonts listed in the document are registered first; the output format
/// and quality come from its `output` section.
pub fn render_json(json: &str) -> Result<Vec<u8>> {
    let spec = DocumentSpec::from_json(json)?;
    let mut backend = RasterBackend::new();
    spec.register_fonts(&mut backend)?;
    let output = spec.output.clone();
    let mut document = spec.build(backend)?;
    document.encode(&output)
}

/// Render a document described as JSON with any backend. Fonts listed in
/// the document are ignored; register them with the backend beforehand.
pub fn render_json_with(json: &str, backend: impl Backend + 'static) -> Result<Vec<u8>> {
    let spec = DocumentSpec::from_json(json)?;
    if !spec.fonts.is_empty() {
        log::warn!(
            "{} font entries ignored, register them with the backend",
            spec.fonts.len()
        );
    }
    let output = spec.output.clone();
    let mut document = spec.build(backend)?;
    document.encode(&output)
}
