//! # Table Grid
//!
//! Cell placement and track sizing for tables.
//!
//! - Placement: row-major auto-placement into an occupancy map. Spanning
//!   cells claim every slot they cover; the cursor skips claimed slots.
//! - Sizing: each track (column or row) is classified by the cells that
//!   start in or span it, then space is handed out per class. Columns and
//!   rows use the same algorithm.

use crate::error::ConfigError;
use crate::style::Size;

/// Where a cell sits in the grid. Ends are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub row: usize,
    pub col: usize,
    pub rowspan: usize,
    pub colspan: usize,
}

impl Placement {
    pub fn row_end(&self) -> usize {
        self.row + self.rowspan
    }

    pub fn col_end(&self) -> usize {
        self.col + self.colspan
    }
}

/// Tracks which slots are taken and where the next cell goes.
#[derive(Debug, Clone, Default)]
pub struct OccupancyMap {
    /// Wrap to a new row after this many columns.
    cols: Option<usize>,
    occupied: Vec<Vec<bool>>,
    row: usize,
    col: usize,
}

impl OccupancyMap {
    pub fn new(cols: Option<usize>) -> Self {
        Self {
            cols,
            ..Self::default()
        }
    }

    /// Claim the first free `colspan` x `rowspan` area at or after the
    /// cursor.
    pub fn place(&mut self, colspan: usize, rowspan: usize) -> Result<Placement, ConfigError> {
        let colspan = colspan.max(1);
        let rowspan = rowspan.max(1);
        if let Some(cols) = self.cols {
            if colspan > cols {
                return Err(ConfigError::SpanExceedsColumns {
                    span: colspan,
                    cols,
                });
            }
        }

        loop {
            if self.cols.is_some_and(|cols| self.col + colspan > cols) {
                self.break_row();
                continue;
            }
            if self.is_free(self.row, self.col, colspan, rowspan) {
                break;
            }
            self.col += 1;
        }

        let placement = Placement {
            row: self.row,
            col: self.col,
            rowspan,
            colspan,
        };
        for r in placement.row..placement.row_end() {
            if self.occupied.len() <= r {
                self.occupied.resize(r + 1, Vec::new());
            }
            let row = &mut self.occupied[r];
            if row.len() < placement.col_end() {
                row.resize(placement.col_end(), false);
            }
            for slot in &mut row[placement.col..placement.col_end()] {
                *slot = true;
            }
        }
        self.col = placement.col_end();
        Ok(placement)
    }

    /// Move the cursor to the start of the next row.
    pub fn break_row(&mut self) {
        self.row += 1;
        self.col = 0;
    }

    pub fn is_occupied(&self, row: usize, col: usize) -> bool {
        self.occupied
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(false)
    }

    fn is_free(&self, row: usize, col: usize, colspan: usize, rowspan: usize) -> bool {
        (row..row + rowspan).all(|r| (col..col + colspan).all(|c| !self.is_occupied(r, c)))
    }

    /// Columns used so far (the configured count when set).
    pub fn columns(&self) -> usize {
        let used = self.occupied.iter().map(Vec::len).max().unwrap_or(0);
        self.cols.map_or(used, |cols| cols.max(used))
    }

    pub fn rows(&self) -> usize {
        self.occupied.len()
    }
}

/// A cell's contribution to the tracks it covers on one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackItem {
    pub start: usize,
    pub span: usize,
    /// What the cell asked for on this axis.
    pub size: Size,
    /// The cell's measured outer size on this axis.
    pub natural: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Track {
    Fill,
    Fixed(f64),
    Percent(f64),
    Natural { max: f64, avg: f64 },
}

fn classify(index: usize, items: &[TrackItem]) -> Track {
    let covering: Vec<&TrackItem> = items
        .iter()
        .filter(|item| item.start <= index && index < item.start + item.span.max(1))
        .collect();
    let per_unit = |item: &TrackItem| item.natural / item.span.max(1) as f64;

    if covering.iter().any(|item| item.size == Size::Fill) {
        return Track::Fill;
    }
    let fixed = covering
        .iter()
        .filter(|item| matches!(item.size, Size::Fixed(_)))
        .map(|item| per_unit(item))
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))));
    if let Some(value) = fixed {
        return Track::Fixed(value);
    }
    let percent = covering
        .iter()
        .filter_map(|item| match item.size {
            Size::Percent(f) => Some(f / item.span.max(1) as f64),
            _ => None,
        })
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))));
    if let Some(fraction) = percent {
        return Track::Percent(fraction);
    }

    let sizes: Vec<f64> = covering.iter().map(|item| per_unit(item)).collect();
    let max = sizes.iter().copied().fold(0.0, f64::max);
    let avg = if sizes.is_empty() {
        0.0
    } else {
        sizes.iter().sum::<f64>() / sizes.len() as f64
    };
    Track::Natural { max, avg }
}

/// Size `count` tracks on one axis.
///
/// With `total` unset the tracks take their natural sizes and the table
/// grows to fit. With `total` set:
/// 1. Fixed tracks take their size, percentage tracks their share of
///    `total`, natural tracks reserve their average size.
/// 2. Fill tracks split whatever is left evenly.
/// 3. Natural tracks then share the rest in proportion to their averages,
///    at least 1px each.
pub fn resolve_tracks(count: usize, items: &[TrackItem], total: Option<f64>) -> Vec<f64> {
    let tracks: Vec<Track> = (0..count).map(|i| classify(i, items)).collect();
    let auto = total.is_none();
    let total = total.unwrap_or_else(|| {
        tracks
            .iter()
            .map(|t| match *t {
                Track::Fixed(v) => v,
                Track::Natural { max, .. } => max,
                Track::Fill | Track::Percent(_) => 0.0,
            })
            .sum()
    });

    let mut sizes: Vec<f64> = tracks
        .iter()
        .map(|t| match *t {
            Track::Fixed(v) => v,
            Track::Percent(f) => total * f,
            Track::Natural { max, avg } => {
                if auto {
                    max
                } else {
                    avg
                }
            }
            Track::Fill => 0.0,
        })
        .collect();

    let fills = tracks.iter().filter(|t| **t == Track::Fill).count();
    if fills > 0 {
        let used: f64 = sizes.iter().sum();
        let each = (total - used).max(0.0) / fills as f64;
        for (size, track) in sizes.iter_mut().zip(&tracks) {
            if *track == Track::Fill {
                *size = each;
            }
        }
    }

    if !auto {
        let is_natural = |t: &Track| matches!(t, Track::Natural { .. });
        let naturals = tracks.iter().filter(|t| is_natural(t)).count();
        if naturals > 0 {
            let others: f64 = sizes
                .iter()
                .zip(&tracks)
                .filter(|(_, t)| !is_natural(t))
                .map(|(s, _)| *s)
                .sum();
            let remaining = total - others;
            let avg_sum: f64 = tracks
                .iter()
                .map(|t| match *t {
                    Track::Natural { avg, .. } => avg,
                    _ => 0.0,
                })
                .sum();
            for (size, track) in sizes.iter_mut().zip(&tracks) {
                if let Track::Natural { avg, .. } = *track {
                    let share = if avg_sum > 0.0 {
                        remaining * avg / avg_sum
                    } else {
                        remaining / naturals as f64
                    };
                    *size = share.max(1.0);
                }
            }
        }
    }

    sizes
}

/// Offset of track `index`: the sum of the tracks before it.
pub fn track_offset(index: usize, sizes: &[f64]) -> f64 {
    sizes.iter().take(index).sum()
}

/// Combined size of `span` tracks starting at `start`.
pub fn span_size(start: usize, span: usize, sizes: &[f64]) -> f64 {
    sizes.iter().skip(start).take(span).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(start: usize, span: usize, size: Size, natural: f64) -> TrackItem {
        TrackItem {
            start,
            span,
            size,
            natural,
        }
    }

    #[test]
    fn test_place_wraps_at_cols() {
        let mut map = OccupancyMap::new(Some(3));
        let placed: Vec<(usize, usize)> = (0..6)
            .map(|_| {
                let p = map.place(1, 1).unwrap();
                (p.row, p.col)
            })
            .collect();
        assert_eq!(placed, vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]);
        assert_eq!(map.rows(), 2);
        assert_eq!(map.columns(), 3);
    }

    #[test]
    fn test_place_skips_rowspan_slots() {
        let mut map = OccupancyMap::new(Some(2));
        let tall = map.place(1, 2).unwrap();
        assert_eq!((tall.row, tall.col), (0, 0));
        map.place(1, 1).unwrap();
        // (1, 0) is taken by the tall cell
        let next = map.place(1, 1).unwrap();
        assert_eq!((next.row, next.col), (1, 1));
    }

    #[test]
    fn test_colspan_wraps_when_it_does_not_fit() {
        let mut map = OccupancyMap::new(Some(3));
        map.place(2, 1).unwrap();
        let wide = map.place(2, 1).unwrap();
        assert_eq!((wide.row, wide.col), (1, 0));
        assert!(!map.is_occupied(0, 2));
    }

    #[test]
    fn test_explicit_rows_without_cols() {
        let mut map = OccupancyMap::new(None);
        map.place(1, 1).unwrap();
        map.place(1, 1).unwrap();
        map.place(1, 1).unwrap();
        map.break_row();
        let p = map.place(1, 1).unwrap();
        assert_eq!((p.row, p.col), (1, 0));
        assert_eq!(map.columns(), 3);
    }

    #[test]
    fn test_span_exceeding_cols_is_an_error() {
        let mut map = OccupancyMap::new(Some(2));
        assert_eq!(
            map.place(3, 1),
            Err(ConfigError::SpanExceedsColumns { span: 3, cols: 2 })
        );
    }

    #[test]
    fn test_fixed_plus_fill() {
        let items = [
            item(0, 1, Size::Fixed(90.0), 100.0),
            item(1, 1, Size::Fill, 10.0),
        ];
        let sizes = resolve_tracks(2, &items, Some(300.0));
        assert_eq!(sizes, vec![100.0, 200.0]);
    }

    #[test]
    fn test_fill_wins_over_fixed() {
        let items = [
            item(0, 1, Size::Fixed(50.0), 50.0),
            item(0, 1, Size::Fill, 10.0),
        ];
        assert_eq!(resolve_tracks(1, &items, Some(120.0)), vec![120.0]);
    }

    #[test]
    fn test_auto_table_uses_natural_maxima() {
        let items = [
            item(0, 1, Size::Auto, 40.0),
            item(0, 1, Size::Auto, 60.0),
            item(1, 1, Size::Auto, 30.0),
        ];
        assert_eq!(resolve_tracks(2, &items, None), vec![60.0, 30.0]);
    }

    #[test]
    fn test_percent_of_explicit_total() {
        let items = [
            item(0, 1, Size::Percent(0.25), 10.0),
            item(1, 1, Size::Fill, 10.0),
        ];
        assert_eq!(resolve_tracks(2, &items, Some(200.0)), vec![50.0, 150.0]);
    }

    #[test]
    fn test_naturals_share_explicit_total() {
        let items = [item(0, 1, Size::Auto, 10.0), item(1, 1, Size::Auto, 30.0)];
        let sizes = resolve_tracks(2, &items, Some(200.0));
        assert!((sizes[0] - 50.0).abs() < 0.001);
        assert!((sizes[1] - 150.0).abs() < 0.001);
        assert!((sizes.iter().sum::<f64>() - 200.0).abs() <= 1.0);
    }

    #[test]
    fn test_naturals_floor_at_one_pixel() {
        let items = [
            item(0, 1, Size::Fixed(300.0), 300.0),
            item(1, 1, Size::Auto, 20.0),
        ];
        let sizes = resolve_tracks(2, &items, Some(200.0));
        assert_eq!(sizes, vec![300.0, 1.0]);
    }

    #[test]
    fn test_span_spreads_natural_size() {
        let items = [item(0, 2, Size::Auto, 100.0), item(0, 1, Size::Auto, 20.0)];
        assert_eq!(resolve_tracks(2, &items, None), vec![50.0, 50.0]);
    }

    #[test]
    fn test_span_size_and_offset() {
        let sizes = [100.0, 200.0, 150.0];
        assert_eq!(span_size(0, 1, &sizes), 100.0);
        assert_eq!(span_size(0, 2, &sizes), 300.0);
        assert_eq!(span_size(1, 2, &sizes), 350.0);
        assert_eq!(track_offset(0, &sizes), 0.0);
        assert_eq!(track_offset(2, &sizes), 300.0);
    }
}
