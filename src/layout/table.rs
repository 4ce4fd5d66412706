//! Tables: cells placed on a grid, columns and rows sized from the cells.
//!
//! Resolution runs in three rounds. Cells are first measured unconstrained
//! to size the columns. Each cell then gets its column span as its outer
//! width and is measured again, so text wraps to its column, to size the
//! rows. Finally the row spans are pushed down and everything resolves
//! against the table's real content box.

use super::grid::{resolve_tracks, span_size, track_offset, OccupancyMap, Placement, TrackItem};
use super::{explicit_content, paint_frame, Block, Boxes, Extent, Scope, ScopeKey};
use crate::backend::Canvas;
use crate::error::{ConfigError, Result};
use crate::geometry::{Axis, Dimensions, Point};
use crate::style::{number, BoxOptions};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TableOptions {
    #[serde(flatten)]
    pub frame: BoxOptions,
    /// Wrap to a new row after this many columns.
    #[serde(deserialize_with = "lenient_cols")]
    pub cols: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CellOptions {
    #[serde(flatten)]
    pub frame: BoxOptions,
    #[serde(deserialize_with = "lenient_span")]
    pub colspan: usize,
    #[serde(deserialize_with = "lenient_span")]
    pub rowspan: usize,
}

impl Default for CellOptions {
    fn default() -> Self {
        Self {
            frame: BoxOptions::default(),
            colspan: 1,
            rowspan: 1,
        }
    }
}

fn lenient_cols<'de, D>(deserializer: D) -> std::result::Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number(&Value::deserialize(deserializer)?)
        .filter(|v| *v >= 1.0)
        .map(|v| v as usize))
}

fn lenient_span<'de, D>(deserializer: D) -> std::result::Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_cols(deserializer)?.unwrap_or(1))
}

/// A block that lives on the grid.
#[derive(Debug, Clone)]
pub struct Cell {
    block: Block,
    placement: Placement,
}

impl Cell {
    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn block_mut(&mut self) -> &mut Block {
        &mut self.block
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }
}

#[derive(Debug, Clone)]
struct TableLayout {
    key: ScopeKey,
    boxes: Boxes,
    inner: Extent,
    columns: Vec<f64>,
    rows: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct Table {
    options: TableOptions,
    cells: Vec<Cell>,
    grid: OccupancyMap,
    /// First placement failure, reported when the table resolves.
    pending: Option<ConfigError>,
    cache: Option<TableLayout>,
}

impl Table {
    pub fn new(options: TableOptions) -> Self {
        Self {
            grid: OccupancyMap::new(options.cols),
            options,
            cells: Vec::new(),
            pending: None,
            cache: None,
        }
    }

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    /// Frame options only: `cols` is fixed once cells are placed.
    pub fn options_mut(&mut self) -> &mut BoxOptions {
        self.cache = None;
        &mut self.options.frame
    }

    /// Place the next cell, filled in by `build`.
    pub fn cell(&mut self, options: CellOptions, build: impl FnOnce(&mut Block)) -> &mut Self {
        self.cache = None;
        let placement = match self.grid.place(options.colspan, options.rowspan) {
            Ok(placement) => placement,
            Err(err) => {
                log::debug!("cell not placed: {}", err);
                self.pending.get_or_insert(err);
                return self;
            }
        };
        let mut block = Block::new(options.frame);
        build(&mut block);
        self.cells.push(Cell { block, placement });
        self
    }

    /// Start a new row.
    pub fn row(&mut self) -> &mut Self {
        self.cache = None;
        self.grid.break_row();
        self
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell_mut(&mut self, index: usize) -> Option<&mut Cell> {
        self.cells.get_mut(index)
    }

    /// Resolved column widths and row heights, if still valid.
    pub fn tracks(&self) -> Option<(&[f64], &[f64])> {
        self.cache
            .as_ref()
            .map(|l| (l.columns.as_slice(), l.rows.as_slice()))
    }

    pub fn is_dirty(&self) -> bool {
        self.cache.is_none() || self.cells.iter().any(|c| c.block.is_dirty())
    }

    pub fn resolve(&mut self, scope: &Scope<'_>) -> Result<Boxes> {
        Ok(self.layout(scope)?.boxes)
    }

    fn layout(&mut self, scope: &Scope<'_>) -> Result<&TableLayout> {
        let key = scope.key();
        let fresh = !self.cells.iter().any(|c| c.block.is_dirty());
        let layout = match self.cache.take() {
            Some(layout) if fresh && layout.key == key => layout,
            _ => self.compute(scope)?,
        };
        Ok(self.cache.insert(layout))
    }

    fn compute(&mut self, scope: &Scope<'_>) -> Result<TableLayout> {
        if let Some(err) = &self.pending {
            return Err(err.clone().into());
        }
        let explicit = explicit_content(&self.options.frame, scope, Extent::default())?;
        let inner = scope.nested(explicit, &self.options.frame);
        let measure = inner.relaxed();

        for cell in &mut self.cells {
            cell.block.assign(Axis::Horizontal, None);
            cell.block.assign(Axis::Vertical, None);
        }

        let columns = self.size_axis(Axis::Horizontal, &measure, explicit.width)?;
        for cell in &mut self.cells {
            let p = cell.placement;
            let width = span_size(p.col, p.colspan, &columns);
            cell.block.assign(Axis::Horizontal, Some(width));
        }

        let rows = self.size_axis(Axis::Vertical, &measure, explicit.height)?;
        for cell in &mut self.cells {
            let p = cell.placement;
            let height = span_size(p.row, p.rowspan, &rows);
            cell.block.assign(Axis::Vertical, Some(height));
            cell.block.resolve(&inner)?;
        }

        let content = Dimensions::new(
            explicit.width.unwrap_or_else(|| columns.iter().sum()),
            explicit.height.unwrap_or_else(|| rows.iter().sum()),
        );
        let boxes = Boxes::around(content, &self.options.frame);
        log::debug!(
            "table {}x{} resolved to {}x{}",
            columns.len(),
            rows.len(),
            boxes.outer.width,
            boxes.outer.height
        );

        Ok(TableLayout {
            key: scope.key(),
            boxes,
            inner: explicit,
            columns,
            rows,
        })
    }

    /// Measure every cell along `axis` and size that axis' tracks.
    fn size_axis(&mut self, axis: Axis, measure: &Scope<'_>, total: Option<f64>) -> Result<Vec<f64>> {
        let mut items = Vec::with_capacity(self.cells.len());
        for cell in &mut self.cells {
            let boxes = cell.block.resolve(measure)?;
            let p = cell.placement;
            let (start, span) = match axis {
                Axis::Horizontal => (p.col, p.colspan),
                Axis::Vertical => (p.row, p.rowspan),
            };
            items.push(TrackItem {
                start,
                span,
                size: cell.block.options().size(axis),
                natural: boxes.outer.get(axis),
            });
        }
        let count = match axis {
            Axis::Horizontal => self.grid.columns(),
            Axis::Vertical => self.grid.rows(),
        };
        Ok(resolve_tracks(count, &items, total))
    }

    pub fn draw(&mut self, canvas: &mut dyn Canvas, origin: Point, scope: &Scope<'_>) -> Result<()> {
        let layout = self.layout(scope)?.clone();
        let frame = &self.options.frame;
        paint_frame(canvas, frame, origin, &layout.boxes);

        let insets = frame.insets();
        let content_origin = origin.offset(insets.left, insets.top);
        let inner = scope.nested(layout.inner, frame);
        let mut order: Vec<usize> = (0..self.cells.len()).collect();
        order.sort_by_key(|&i| self.cells[i].block.options().z);
        for index in order {
            let cell = &mut self.cells[index];
            let p = cell.placement;
            let at = content_origin.offset(
                track_offset(p.col, &layout.columns),
                track_offset(p.row, &layout.rows),
            );
            cell.block.draw(canvas, at, &inner)?;
        }
        Ok(())
    }
}
