//! Item packing for popups
//!
//! Items are stacked in a single column. When that column would be taller
//! than the space available on screen, the popup is split into several
//! columns of roughly equal height and grows wider instead of taller.

use crate::error::PopupError;
use crate::geometry::{Padding, Point};

use super::item::PopupItem;

/// Anything the layout can measure
pub trait Measure {
    fn height(&self) -> i32;
    fn desired_width(&self, max_width: i32) -> i32;
}

impl Measure for PopupItem {
    fn height(&self) -> i32 {
        PopupItem::height(self)
    }

    fn desired_width(&self, max_width: i32) -> i32 {
        PopupItem::desired_width(self, max_width)
    }
}

/// Sizing parameters of a popup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutParams {
    pub padding: Padding,
    pub spacing: i32,
    /// Configured popup width, padding included
    pub width: i32,
    /// Largest popup width items may ask for, padding included
    pub max_width: i32,
}

/// Result of packing a popup's items
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub width: i32,
    pub height: i32,
    /// Width assigned to every item
    pub item_width: i32,
    pub columns: usize,
    /// Top-left corner of each item, relative to the popup
    pub positions: Vec<Point>,
    /// Column and row of each item
    pub cells: Vec<(usize, usize)>,
}

/// Pack `items` for a confinement `available_height` pixels tall
///
/// Overflowing items fill one column top to bottom before starting the
/// next, rather than being dealt row by row (`index % columns`). Dealing by
/// row would put the third of three items under the first, while the filled
/// order keeps reading order per column and puts it at the top of the second
/// column; each column also stays within one item of the available height.
pub fn compute<M: Measure>(
    items: &[M],
    params: &LayoutParams,
    available_height: i32,
) -> Result<Layout, PopupError> {
    let padding = params.padding;
    let spacing = params.spacing;
    let max_item_width = params.max_width - padding.horizontal();

    let item_width = items
        .iter()
        .map(|item| item.desired_width(max_item_width))
        .fold(params.width - padding.horizontal(), i32::max);
    let column_width = item_width + padding.horizontal();

    let mut positions = Vec::with_capacity(items.len());
    let mut y = padding.top;
    for item in items {
        positions.push(Point::new(padding.left, y));
        y += item.height() + spacing;
    }
    let height = if items.is_empty() {
        padding.vertical()
    } else {
        y + padding.bottom - spacing
    };

    if height <= available_height || items.len() < 2 {
        tracing::trace!(height, item_width, "single column layout");
        return Ok(Layout {
            width: column_width,
            height,
            item_width,
            columns: 1,
            cells: (0..items.len()).map(|row| (0, row)).collect(),
            positions,
        });
    }

    let usable = available_height - padding.vertical();
    if usable <= 0 {
        return Err(PopupError::NoRoomForItems {
            available: available_height,
            padding: padding.vertical(),
        });
    }
    let content = height - padding.vertical();
    let wanted_columns = div_ceil(content, usable);
    // Each column closes once its content reaches the share of one column,
    // so no column overshoots `usable` by more than its last item.
    let target = div_ceil(content, wanted_columns);

    let mut positions = Vec::with_capacity(items.len());
    let mut cells = Vec::with_capacity(items.len());
    let (mut column, mut row) = (0usize, 0usize);
    let mut column_content = 0;
    let mut tallest_column = 0;
    for item in items {
        if row > 0 && column_content >= target {
            column += 1;
            row = 0;
            column_content = 0;
        }
        if row > 0 {
            column_content += spacing;
        }
        let x = padding.left + (column_width + spacing) * column as i32;
        positions.push(Point::new(x, padding.top + column_content));
        cells.push((column, row));
        column_content += item.height();
        tallest_column = tallest_column.max(column_content);
        row += 1;
    }

    let columns = column + 1;
    let width = column_width * columns as i32 + spacing * (columns as i32 - 1);
    let height = tallest_column + padding.vertical();
    tracing::trace!(columns, width, height, "multi column layout");

    Ok(Layout {
        width,
        height,
        item_width,
        columns,
        positions,
        cells,
    })
}

fn div_ceil(numerator: i32, denominator: i32) -> i32 {
    (numerator + denominator - 1) / denominator
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row(i32);

    impl Measure for Row {
        fn height(&self) -> i32 {
            self.0
        }

        fn desired_width(&self, max_width: i32) -> i32 {
            (self.0 * 4).min(max_width)
        }
    }

    fn params() -> LayoutParams {
        LayoutParams {
            padding: Padding::uniform(5),
            spacing: 2,
            width: 200,
            max_width: 300,
        }
    }

    #[test]
    fn single_column_height_sums_items_and_spacing() {
        let items = [Row(20), Row(20), Row(20)];
        let layout = compute(&items, &params(), 1000).unwrap();

        assert_eq!(layout.columns, 1);
        assert_eq!(layout.height, 5 + 20 + 2 + 20 + 2 + 20 + 5);
        assert_eq!(layout.width, 200);
        assert_eq!(layout.item_width, 190);
        assert_eq!(
            layout.positions,
            vec![Point::new(5, 5), Point::new(5, 27), Point::new(5, 49)]
        );
    }

    #[test]
    fn uneven_heights_follow_the_closed_form() {
        let items = [Row(22), Row(9), Row(30), Row(22)];
        let p = LayoutParams {
            padding: Padding::new(3, 4, 6, 8),
            spacing: 5,
            ..params()
        };
        let layout = compute(&items, &p, 1000).unwrap();
        assert_eq!(layout.height, 22 + 9 + 30 + 22 + 3 * 5 + 4 + 8);
    }

    #[test]
    fn overflow_splits_into_columns() {
        let items = [Row(20), Row(20), Row(20)];
        let layout = compute(&items, &params(), 50).unwrap();

        assert_eq!(layout.columns, 2);
        assert_eq!(layout.cells[2], (1, 0));
        assert_eq!(layout.positions[2], Point::new(5 + 200 + 2, 5));
        assert_eq!(layout.width, 200 * 2 + 2);
        assert_eq!(layout.height, 5 + 22 + 22 + 5 - 2);
    }

    #[test]
    fn columns_never_exceed_available_height_by_more_than_a_row() {
        let items: Vec<Row> = (0..57).map(|i| Row(15 + (i % 4) * 5)).collect();
        for available in [120, 250, 400, 777] {
            let layout = compute(&items, &params(), available).unwrap();
            let tallest_row = 30 + 2;
            assert!(
                layout.height <= available + tallest_row,
                "height {} for available {}",
                layout.height,
                available
            );
            assert!(layout.columns > 1);
        }
    }

    #[test]
    fn items_keep_their_order_across_columns() {
        let items: Vec<Row> = (0..10).map(|_| Row(20)).collect();
        let layout = compute(&items, &params(), 100).unwrap();
        let mut sorted = layout.cells.clone();
        sorted.sort();
        assert_eq!(sorted, layout.cells);
    }

    #[test]
    fn desired_width_is_capped_by_max_width() {
        let items = [Row(20), Row(100)];
        let layout = compute(&items, &params(), 1000).unwrap();
        assert_eq!(layout.item_width, 290);
        assert_eq!(layout.width, 300);
    }

    #[test]
    fn empty_popup_is_only_padding() {
        let layout = compute::<Row>(&[], &params(), 1000).unwrap();
        assert_eq!(layout.height, 10);
        assert!(layout.positions.is_empty());
    }

    #[test]
    fn no_usable_height_is_an_error() {
        let items = [Row(20), Row(20)];
        assert_eq!(
            compute(&items, &params(), 10),
            Err(PopupError::NoRoomForItems {
                available: 10,
                padding: 10
            })
        );
    }
}
