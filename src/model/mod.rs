//! # Document Model
//!
//! A serde description of a whole image, for callers that would rather send
//! JSON than drive the builder. Every node carries a `type` and an
//! `options` object using the same option names as the builder:
//!
//! ```json
//! {
//!   "width": 200, "background": "#fff", "padding": "10 20",
//!   "children": [
//!     { "type": "text", "content": "<b>Hello</b>", "options": { "font": "Sans 14" } },
//!     { "type": "table", "options": { "cols": 2 }, "children": [
//!       { "type": "cell", "options": { "width": 50 }, "children": [] },
//!       { "type": "row" }
//!     ]}
//!   ],
//!   "output": { "format": "png" }
//! }
//! ```
//!
//! The document's own box options sit at the top level next to `children`.

use crate::backend::{Backend, RasterBackend};
use crate::document::{Document, DocumentOptions, SaveOptions};
use crate::error::{BackendError, Result};
use crate::image_loader;
use crate::layout::{Block, CellOptions, ImageOptions, Table, TableOptions};
use crate::style::BoxOptions;
use crate::text::TextOptions;
use serde::Deserialize;

/// A complete image description.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DocumentSpec {
    #[serde(flatten)]
    pub options: DocumentOptions,

    /// Image source to draw underneath everything; also fills in the size.
    pub base: Option<String>,

    pub children: Vec<NodeSpec>,

    /// How `render_json` encodes the result.
    pub output: SaveOptions,

    /// Font faces to register with the raster backend before layout.
    pub fonts: Vec<FontEntry>,
}

/// A font face to register, see [`RasterBackend::register_font`].
#[derive(Debug, Clone, Deserialize)]
pub struct FontEntry {
    pub family: String,
    /// Path, data URI or base64 font data.
    pub src: String,
    /// 100-900. 600 and up counts as bold.
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default)]
    pub italic: bool,
}

fn default_weight() -> u32 {
    400
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeSpec {
    Block {
        #[serde(default)]
        options: BoxOptions,
        #[serde(default)]
        children: Vec<NodeSpec>,
    },
    Text {
        content: String,
        #[serde(default)]
        options: TextOptions,
    },
    Image {
        src: String,
        #[serde(default)]
        options: ImageOptions,
    },
    Table {
        #[serde(default)]
        options: TableOptions,
        #[serde(default)]
        children: Vec<TableItem>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TableItem {
    Cell {
        #[serde(default)]
        options: CellOptions,
        #[serde(default)]
        children: Vec<NodeSpec>,
    },
    /// Explicit row break.
    Row,
}

impl NodeSpec {
    fn add_to(self, parent: &mut Block) {
        match self {
            NodeSpec::Block { options, children } => {
                parent.block(options, |block| add_all(children, block));
            }
            NodeSpec::Text { content, options } => {
                parent.text(content, options);
            }
            NodeSpec::Image { src, options } => {
                parent.image(src, options);
            }
            NodeSpec::Table { options, children } => {
                parent.table(options, |table| fill_table(children, table));
            }
        }
    }
}

fn add_all(children: Vec<NodeSpec>, parent: &mut Block) {
    for child in children {
        child.add_to(parent);
    }
}

fn fill_table(items: Vec<TableItem>, table: &mut Table) {
    for item in items {
        match item {
            TableItem::Cell { options, children } => {
                table.cell(options, |cell| add_all(children, cell));
            }
            TableItem::Row => {
                table.row();
            }
        }
    }
}

impl DocumentSpec {
    pub fn from_json(json: &str) -> Result<DocumentSpec> {
        Ok(serde_json::from_str(json)?)
    }

    /// Register the listed fonts with `backend`.
    pub fn register_fonts(&self, backend: &mut RasterBackend) -> Result<()> {
        for font in &self.fonts {
            let data = image_loader::read_source_bytes(&font.src).map_err(BackendError::Font)?;
            backend.register_font(&font.family, font.weight >= 600, font.italic, data)?;
        }
        Ok(())
    }

    /// Build the tree on `backend`. Fonts are not registered here.
    pub fn build(self, backend: impl Backend + 'static) -> Result<Document> {
        let mut document = match self.base {
            Some(src) => Document::from_image(src, self.options, backend)?,
            None => Document::new(self.options, backend),
        };
        add_all(self.children, document.root_mut());
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingBackend;
    use crate::error::DynImageError;
    use crate::geometry::Dimensions;
    use crate::layout::Node;
    use crate::style::Size;

    const DOC: &str = r##"{
        "width": 200,
        "background": "#ffffff",
        "padding": "10 20",
        "children": [
            { "type": "text", "content": "Title", "options": { "font": "Sans Bold 14", "align": "center" } },
            { "type": "block", "options": { "height": 20 }, "children": [] },
            { "type": "table", "options": { "width": "100%", "cols": 2 }, "children": [
                { "type": "cell", "options": { "width": 50, "height": 10 } },
                { "type": "cell", "options": { "width": "0%", "height": 10 } },
                { "type": "row" },
                { "type": "cell", "options": { "colspan": 2, "height": 15 } }
            ]}
        ],
        "output": { "format": "jpeg", "quality": 80 }
    }"##;

    #[test]
    fn test_parse_document() {
        let spec = DocumentSpec::from_json(DOC).unwrap();
        assert_eq!(spec.options.frame.width, Size::Fixed(200.0));
        assert!(spec.options.frame.background.is_some());
        assert_eq!(spec.children.len(), 3);
        assert_eq!(spec.output.quality, Some(80));
        match &spec.children[2] {
            NodeSpec::Table { options, children } => {
                assert_eq!(options.cols, Some(2));
                assert_eq!(children.len(), 4);
                assert!(matches!(children[2], TableItem::Row));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_build_and_resolve() {
        let spec = DocumentSpec::from_json(DOC).unwrap();
        let mut doc = spec.build(RecordingBackend::new()).unwrap();
        let size = doc.resolve_size().unwrap();
        assert_eq!(size.width, 240.0);

        let table = doc
            .root_mut()
            .child_mut(2)
            .and_then(Node::as_table_mut)
            .unwrap();
        let (columns, rows) = table.tracks().unwrap();
        assert_eq!(columns, &[50.0, 150.0]);
        assert_eq!(rows, &[10.0, 15.0]);
        let spanning = table.cells()[2].block().boxes().unwrap();
        assert_eq!(spanning.outer, Dimensions::new(200.0, 15.0));
    }

    #[test]
    fn test_unknown_node_type() {
        let err = DocumentSpec::from_json(r#"{"children": [{"type": "video"}]}"#).unwrap_err();
        assert!(matches!(err, DynImageError::Parse { .. }));
    }

    #[test]
    fn test_bad_font_source() {
        let spec = DocumentSpec::from_json(
            r#"{"fonts": [{"family": "Broken", "src": "data:font/ttf;base64,AAAA"}]}"#,
        )
        .unwrap();
        let mut backend = RasterBackend::new();
        assert!(matches!(
            spec.register_fonts(&mut backend),
            Err(DynImageError::Backend(BackendError::Font(_)))
        ));
    }
}
