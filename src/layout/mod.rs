//! # Layout Engine
//!
//! Resolves a tree of boxes into pixel geometry and draws it.
//!
//! ## Two passes
//!
//! 1. **Resolve** (bottom-up, memoized): every node computes its content,
//!    element and outer size. A node's explicit size (fixed pixels, or a
//!    percentage of the parent's content size) wins; otherwise the size
//!    comes from its children or its text or image.
//! 2. **Draw** (top-down): each node paints its background and borders, then
//!    draws its children at their resolved offsets, accumulating the origin.
//!
//! Upward questions (how big is my parent? which alignment do I inherit?
//! which backend measures text?) are answered by the [`Scope`] passed down
//! the traversal. Nodes never hold references to their parents.
//!
//! ## The box
//!
//! ```text
//! +-------------------------------- outer --+
//! |  margin                                 |
//! |  +---------------------- element ----+  |
//! |  |  border (drawn on the edge)       |  |
//! |  |  padding                          |  |
//! |  |  +------------ content --------+  |  |
//! |  |  |                             |  |  |
//! ```
//!
//! Borders do not take up space; they are stroked just inside the element
//! box.
//!
//! ## Caching
//!
//! Resolved boxes are cached per node together with the scope they were
//! resolved in. Mutating a node's options drops its cache; a parent notices
//! dirty descendants and resolves again on the next pass.

pub mod block;
pub mod grid;
pub mod image;
pub mod table;

pub use block::Block;
pub use image::{Image, ImageOptions};
pub use table::{Cell, CellOptions, Table, TableOptions};

use crate::backend::{Backend, Canvas, Stroke};
use crate::error::Result;
use crate::geometry::{Axis, Dimensions, Point, Rect};
use crate::style::{Align, BoxOptions, Side, VerticalAlign};
use crate::text::Text;
use serde::Serialize;

/// Sizes known on each axis. `None` means "sized by content".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Extent {
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl Extent {
    pub fn new(width: Option<f64>, height: Option<f64>) -> Self {
        Self { width, height }
    }

    pub fn get(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }

    pub fn set(&mut self, axis: Axis, value: Option<f64>) {
        match axis {
            Axis::Horizontal => self.width = value,
            Axis::Vertical => self.height = value,
        }
    }
}

/// What a node may ask about its surroundings while resolving and drawing.
#[derive(Clone, Copy)]
pub struct Scope<'a> {
    pub backend: &'a dyn Backend,
    /// The parent's content size, where it is known.
    pub parent: Extent,
    /// Alignment inherited from the nearest ancestor that sets one.
    pub align: Option<Align>,
    pub vertical_align: Option<VerticalAlign>,
    /// Whether a percentage without a known parent size is an error.
    pub strict: bool,
}

/// The parts of a [`Scope`] a resolved size depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScopeKey {
    parent: Extent,
    align: Option<Align>,
    vertical_align: Option<VerticalAlign>,
    strict: bool,
}

impl<'a> Scope<'a> {
    pub fn root(backend: &'a dyn Backend) -> Self {
        Self {
            backend,
            parent: Extent::default(),
            align: None,
            vertical_align: None,
            strict: true,
        }
    }

    pub fn with_parent(self, parent: Extent) -> Self {
        Self { parent, ..self }
    }

    /// The scope seen by the children of a node with `options` whose content
    /// size is `content`.
    pub fn nested(&self, content: Extent, options: &BoxOptions) -> Scope<'a> {
        Scope {
            backend: self.backend,
            parent: content,
            align: options.align.or(self.align),
            vertical_align: options.vertical_align.or(self.vertical_align),
            strict: self.strict,
        }
    }

    /// Unconstrained and lenient: used to measure natural sizes.
    pub fn relaxed(&self) -> Scope<'a> {
        Scope {
            parent: Extent::default(),
            strict: false,
            ..*self
        }
    }

    pub fn key(&self) -> ScopeKey {
        ScopeKey {
            parent: self.parent,
            align: self.align,
            vertical_align: self.vertical_align,
            strict: self.strict,
        }
    }
}

/// Resolved sizes of a node's three boxes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Boxes {
    pub content: Dimensions,
    /// Content plus padding; backgrounds and borders cover this box.
    pub element: Dimensions,
    /// Element plus margin; the space the node takes in its parent.
    pub outer: Dimensions,
}

impl Boxes {
    pub fn around(content: Dimensions, options: &BoxOptions) -> Boxes {
        let padding = options.padding();
        let margin = options.margin();
        let element = Dimensions::new(
            content.width + padding.horizontal(),
            content.height + padding.vertical(),
        );
        let outer = Dimensions::new(
            element.width + margin.horizontal(),
            element.height + margin.vertical(),
        );
        Boxes {
            content,
            element,
            outer,
        }
    }
}

/// The explicit content size of a node on each axis. `assigned` holds outer
/// sizes pushed down by a table and wins over the node's own options.
pub(crate) fn explicit_content(
    options: &BoxOptions,
    scope: &Scope<'_>,
    assigned: Extent,
) -> Result<Extent> {
    let insets = options.insets();
    let mut content = Extent::default();
    for axis in [Axis::Horizontal, Axis::Vertical] {
        let size = match assigned.get(axis) {
            Some(outer) => Some((outer - insets.along(axis)).max(0.0)),
            None => options
                .size(axis)
                .resolve(scope.parent.get(axis), axis, scope.strict)?,
        };
        content.set(axis, size);
    }
    Ok(content)
}

/// Paint the background and borders of a node whose outer box starts at
/// `origin`.
pub fn paint_frame(canvas: &mut dyn Canvas, options: &BoxOptions, origin: Point, boxes: &Boxes) {
    let margin = options.margin();
    let element = Rect::from_origin(origin.offset(margin.left, margin.top), boxes.element);
    if element.is_empty() {
        return;
    }

    if let Some(background) = &options.background {
        canvas.save_state();
        canvas.set_clip_rect(element);
        canvas.fill_with(&background.realize(element));
        canvas.restore_state();
    }

    for (side, border) in options.border_sides() {
        if border.width <= 0.0 {
            continue;
        }
        let half = border.width / 2.0;
        let (from, to) = match side {
            Side::Top => (
                Point::new(element.x, element.y + half),
                Point::new(element.right(), element.y + half),
            ),
            Side::Right => (
                Point::new(element.right() - half, element.y),
                Point::new(element.right() - half, element.bottom()),
            ),
            Side::Bottom => (
                Point::new(element.x, element.bottom() - half),
                Point::new(element.right(), element.bottom() - half),
            ),
            Side::Left => (
                Point::new(element.x + half, element.y),
                Point::new(element.x + half, element.bottom()),
            ),
        };
        let stroke = Stroke {
            width: border.width,
            dash: border.style.dash_pattern(border.width),
            paint: border.paint.realize(element),
        };
        canvas.stroke_path(&[from, to], &stroke);
    }
}

/// Any node of the tree.
#[derive(Debug, Clone)]
pub enum Node {
    Block(Block),
    Table(Table),
    Text(Text),
    Image(Image),
}

impl Node {
    pub fn options(&self) -> &BoxOptions {
        match self {
            Node::Block(block) => block.options(),
            Node::Table(table) => &table.options().frame,
            Node::Text(text) => &text.options().frame,
            Node::Image(image) => &image.options().frame,
        }
    }

    pub fn resolve(&mut self, scope: &Scope<'_>) -> Result<Boxes> {
        match self {
            Node::Block(block) => block.resolve(scope),
            Node::Table(table) => table.resolve(scope),
            Node::Text(text) => text.resolve(scope),
            Node::Image(image) => image.resolve(scope),
        }
    }

    pub fn draw(&mut self, canvas: &mut dyn Canvas, origin: Point, scope: &Scope<'_>) -> Result<()> {
        match self {
            Node::Block(block) => block.draw(canvas, origin, scope),
            Node::Table(table) => table.draw(canvas, origin, scope),
            Node::Text(text) => text.draw(canvas, origin, scope),
            Node::Image(image) => image.draw(canvas, origin, scope),
        }
    }

    /// Whether this node or anything below it must resolve again.
    pub fn is_dirty(&self) -> bool {
        match self {
            Node::Block(block) => block.is_dirty(),
            Node::Table(table) => table.is_dirty(),
            Node::Text(text) => text.is_dirty(),
            Node::Image(image) => image.is_dirty(),
        }
    }

    pub fn as_block_mut(&mut self) -> Option<&mut Block> {
        match self {
            Node::Block(block) => Some(block),
            _ => None,
        }
    }

    pub fn as_table_mut(&mut self) -> Option<&mut Table> {
        match self {
            Node::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut Text> {
        match self {
            Node::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut Image> {
        match self {
            Node::Image(image) => Some(image),
            _ => None,
        }
    }
}

/// Child indices in drawing order: ascending `z`, ties in insertion order.
pub(crate) fn stacking_order(children: &[Node]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..children.len()).collect();
    order.sort_by_key(|&i| children[i].options().z);
    order
}
