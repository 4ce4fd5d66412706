//! Blocks: generic containers that stack their children top to bottom.

use super::{
    explicit_content, paint_frame, stacking_order, Boxes, Extent, Image, ImageOptions, Node,
    Scope, ScopeKey, Table, TableOptions,
};
use crate::backend::Canvas;
use crate::error::Result;
use crate::geometry::{Axis, Dimensions, Point};
use crate::image_loader::ImageSource;
use crate::style::{BoxOptions, Position};
use crate::text::{Text, TextOptions};

#[derive(Debug, Clone)]
struct BlockLayout {
    key: ScopeKey,
    boxes: Boxes,
    /// What the children were resolved against.
    inner: Extent,
    /// Child offsets from the content origin, in insertion order.
    offsets: Vec<Point>,
    /// Alignment shift applied to the in-flow children.
    shift: Point,
}

#[derive(Debug, Clone, Default)]
pub struct Block {
    options: BoxOptions,
    children: Vec<Node>,
    assigned: Extent,
    cache: Option<BlockLayout>,
}

impl Block {
    pub fn new(options: BoxOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Add a nested block, filled in by `build`.
    pub fn block(&mut self, options: BoxOptions, build: impl FnOnce(&mut Block)) -> &mut Self {
        let mut block = Block::new(options);
        build(&mut block);
        self.push(Node::Block(block))
    }

    pub fn text(&mut self, content: impl Into<String>, options: TextOptions) -> &mut Self {
        self.push(Node::Text(Text::new(content, options)))
    }

    pub fn image(&mut self, source: impl Into<ImageSource>, options: ImageOptions) -> &mut Self {
        self.push(Node::Image(Image::new(source, options)))
    }

    pub fn table(&mut self, options: TableOptions, build: impl FnOnce(&mut Table)) -> &mut Self {
        let mut table = Table::new(options);
        build(&mut table);
        self.push(Node::Table(table))
    }

    pub fn push(&mut self, node: Node) -> &mut Self {
        self.children.push(node);
        self.cache = None;
        self
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.children.get_mut(index)
    }

    pub fn options(&self) -> &BoxOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut BoxOptions {
        self.cache = None;
        &mut self.options
    }

    /// Resolved boxes from the last resolution, if still valid.
    pub fn boxes(&self) -> Option<Boxes> {
        self.cache.as_ref().map(|l| l.boxes)
    }

    /// Where child `index` was placed relative to this block's content
    /// origin, alignment shift included.
    pub fn child_offset(&self, index: usize) -> Option<Point> {
        let layout = self.cache.as_ref()?;
        let offset = *layout.offsets.get(index)?;
        let child = self.children.get(index)?;
        Some(if child.options().position == Position::Absolute {
            offset
        } else {
            offset.offset(layout.shift.x, layout.shift.y)
        })
    }

    pub fn is_dirty(&self) -> bool {
        self.cache.is_none() || self.children.iter().any(Node::is_dirty)
    }

    /// Fix the outer size on the axes a table decides.
    pub(crate) fn assign(&mut self, axis: Axis, outer: Option<f64>) {
        if self.assigned.get(axis) != outer {
            self.assigned.set(axis, outer);
            self.cache = None;
        }
    }

    pub fn resolve(&mut self, scope: &Scope<'_>) -> Result<Boxes> {
        Ok(self.layout(scope)?.boxes)
    }

    fn layout(&mut self, scope: &Scope<'_>) -> Result<&BlockLayout> {
        let key = scope.key();
        let fresh = !self.children.iter().any(Node::is_dirty);
        let layout = match self.cache.take() {
            Some(layout) if fresh && layout.key == key => layout,
            _ => self.compute(scope)?,
        };
        Ok(self.cache.insert(layout))
    }

    fn compute(&mut self, scope: &Scope<'_>) -> Result<BlockLayout> {
        let explicit = explicit_content(&self.options, scope, self.assigned)?;
        let inner = scope.nested(explicit, &self.options);

        let mut offsets = Vec::with_capacity(self.children.len());
        let mut next_y = 0.0;
        let mut flow = Dimensions::default();
        for child in &mut self.children {
            let boxes = child.resolve(&inner)?;
            let options = child.options();
            let x = options.x.unwrap_or(0.0);
            let offset = match options.position {
                Position::Static => {
                    let offset = Point::new(x, options.y.unwrap_or(next_y));
                    next_y = offset.y + boxes.outer.height;
                    offset
                }
                Position::Relative => {
                    let slot = Point::new(0.0, next_y);
                    next_y += boxes.outer.height;
                    slot.offset(x, options.y.unwrap_or(0.0))
                }
                Position::Absolute => Point::new(x, options.y.unwrap_or(0.0)),
            };
            if options.position != Position::Absolute {
                flow.width = flow.width.max(offset.x + boxes.outer.width);
                flow.height = flow.height.max(offset.y + boxes.outer.height);
            }
            offsets.push(offset);
        }

        let content = Dimensions::new(
            explicit.width.unwrap_or(flow.width),
            explicit.height.unwrap_or(flow.height),
        );
        let shift = Point::new(
            self.options
                .align
                .map_or(0.0, |a| a.offset(content.width, flow.width)),
            self.options
                .vertical_align
                .map_or(0.0, |v| v.offset(content.height, flow.height)),
        );
        let boxes = Boxes::around(content, &self.options);
        log::debug!(
            "block with {} children resolved to {}x{}",
            self.children.len(),
            boxes.outer.width,
            boxes.outer.height
        );

        Ok(BlockLayout {
            key: scope.key(),
            boxes,
            inner: explicit,
            offsets,
            shift,
        })
    }

    pub fn draw(&mut self, canvas: &mut dyn Canvas, origin: Point, scope: &Scope<'_>) -> Result<()> {
        let layout = self.layout(scope)?.clone();
        paint_frame(canvas, &self.options, origin, &layout.boxes);

        let insets = self.options.insets();
        let content_origin = origin.offset(insets.left, insets.top);
        let inner = scope.nested(layout.inner, &self.options);
        for index in stacking_order(&self.children) {
            let child = &mut self.children[index];
            let mut at = content_origin.offset(layout.offsets[index].x, layout.offsets[index].y);
            if child.options().position != Position::Absolute {
                at = at.offset(layout.shift.x, layout.shift.y);
            }
            child.draw(canvas, at, &inner)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingBackend;
    use crate::error::{ConfigError, DynImageError};
    use crate::style::{Align, Edges, Size, VerticalAlign};

    fn sized(width: f64, height: f64) -> BoxOptions {
        BoxOptions {
            width: Size::Fixed(width),
            height: Size::Fixed(height),
            ..Default::default()
        }
    }

    fn resolve(block: &mut Block) -> Boxes {
        let backend = RecordingBackend::new();
        block.resolve(&Scope::root(&backend)).unwrap()
    }

    #[test]
    fn test_auto_size_wraps_flow_children() {
        let mut block = Block::new(BoxOptions::default());
        block
            .block(sized(50.0, 20.0), |_| {})
            .block(sized(80.0, 10.0), |_| {});
        let boxes = resolve(&mut block);
        assert_eq!(boxes.content, Dimensions::new(80.0, 30.0));
        assert_eq!(block.child_offset(1), Some(Point::new(0.0, 20.0)));
    }

    #[test]
    fn test_insets_grow_the_outer_box() {
        let options = BoxOptions {
            margin: Edges::uniform(3.0),
            padding: Edges::uniform(2.0),
            ..Default::default()
        };
        let mut block = Block::new(options);
        block.block(sized(10.0, 10.0), |_| {});
        let boxes = resolve(&mut block);
        assert_eq!(boxes.element, Dimensions::new(14.0, 14.0));
        assert_eq!(boxes.outer, Dimensions::new(20.0, 20.0));
    }

    #[test]
    fn test_absolute_children_do_not_size_or_flow() {
        let mut block = Block::new(BoxOptions::default());
        let mut floating = sized(500.0, 500.0);
        floating.position = Position::Absolute;
        floating.x = Some(10.0);
        block
            .block(floating, |_| {})
            .block(sized(40.0, 10.0), |_| {});
        let boxes = resolve(&mut block);
        assert_eq!(boxes.content, Dimensions::new(40.0, 10.0));
        assert_eq!(block.child_offset(0), Some(Point::new(10.0, 0.0)));
        assert_eq!(block.child_offset(1), Some(Point::new(0.0, 0.0)));
    }

    #[test]
    fn test_relative_keeps_its_slot() {
        let mut block = Block::new(BoxOptions::default());
        let mut nudged = sized(10.0, 10.0);
        nudged.position = Position::Relative;
        nudged.x = Some(5.0);
        nudged.y = Some(5.0);
        block
            .block(sized(10.0, 10.0), |_| {})
            .block(nudged, |_| {})
            .block(sized(10.0, 10.0), |_| {});
        let boxes = resolve(&mut block);
        assert_eq!(block.child_offset(1), Some(Point::new(5.0, 15.0)));
        assert_eq!(block.child_offset(2), Some(Point::new(0.0, 20.0)));
        assert_eq!(boxes.content, Dimensions::new(15.0, 30.0));
    }

    #[test]
    fn test_static_explicit_y_moves_the_flow() {
        let mut block = Block::new(BoxOptions::default());
        let mut placed = sized(10.0, 10.0);
        placed.y = Some(40.0);
        block
            .block(placed, |_| {})
            .block(sized(10.0, 10.0), |_| {});
        resolve(&mut block);
        assert_eq!(block.child_offset(1), Some(Point::new(0.0, 50.0)));
    }

    #[test]
    fn test_percentages_resolve_against_content() {
        let mut block = Block::new(BoxOptions {
            padding: Edges::uniform(10.0),
            ..sized(200.0, 100.0)
        });
        block.block(
            BoxOptions {
                width: Size::Percent(0.5),
                height: Size::Percent(0.1),
                ..Default::default()
            },
            |_| {},
        );
        resolve(&mut block);
        let child = block.children()[0].clone();
        match child {
            Node::Block(b) => {
                assert_eq!(b.boxes().unwrap().content, Dimensions::new(100.0, 10.0))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_percentage_under_auto_parent_fails() {
        let backend = RecordingBackend::new();
        let mut block = Block::new(BoxOptions::default());
        block.block(
            BoxOptions {
                width: Size::Percent(0.5),
                ..Default::default()
            },
            |_| {},
        );
        let err = block.resolve(&Scope::root(&backend)).unwrap_err();
        assert!(matches!(
            err,
            DynImageError::Config(ConfigError::UnresolvablePercentage { axis: "width" })
        ));
    }

    #[test]
    fn test_alignment_shifts_flow_group() {
        let mut block = Block::new(BoxOptions {
            align: Some(Align::Center),
            vertical_align: Some(VerticalAlign::Bottom),
            ..sized(100.0, 100.0)
        });
        block
            .block(sized(40.0, 10.0), |_| {})
            .block(sized(20.0, 10.0), |_| {});
        resolve(&mut block);
        assert_eq!(block.child_offset(0), Some(Point::new(30.0, 80.0)));
        assert_eq!(block.child_offset(1), Some(Point::new(30.0, 90.0)));
    }

    #[test]
    fn test_mutation_invalidates_ancestors() {
        let backend = RecordingBackend::new();
        let scope = Scope::root(&backend);
        let mut block = Block::new(BoxOptions::default());
        block.block(sized(10.0, 10.0), |_| {});
        block.resolve(&scope).unwrap();
        assert!(!block.is_dirty());

        if let Some(child) = block.child_mut(0).and_then(Node::as_block_mut) {
            child.options_mut().width = Size::Fixed(30.0);
        }
        assert!(block.is_dirty());
        assert_eq!(block.resolve(&scope).unwrap().content.width, 30.0);
    }
}
