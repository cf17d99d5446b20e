//! Plot cell generation along a [`DirectionFrame`].

use crate::{split_into_strips, DirectionFrame, GridError, GridParams};
use fieldplots_core::{Polygon, Ring};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Corners of an undivided plot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellCorners {
    pub bottom_left: Point2<f64>,
    pub bottom_right: Point2<f64>,
    pub top_left: Point2<f64>,
    pub top_right: Point2<f64>,
}

impl CellCorners {
    /// Open ring `bottom_left, bottom_right, top_right, top_left`.
    pub fn ring(&self) -> Ring {
        Ring::new(vec![
            self.bottom_left,
            self.bottom_right,
            self.top_right,
            self.top_left,
        ])
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellShape {
    Quad(CellCorners),
    /// A row strip cut out of a plot.
    Clipped(Ring),
}

/// One output polygon with its position in the layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub range: usize,
    pub column: usize,
    /// Strip index inside the plot when plots are subdivided.
    pub row: Option<usize>,
    /// Plot anchor index for flexible layouts.
    pub plot: Option<usize>,
    pub shape: CellShape,
}

impl GridCell {
    pub fn ring(&self) -> Ring {
        match &self.shape {
            CellShape::Quad(c) => c.ring(),
            CellShape::Clipped(r) => r.clone(),
        }
    }

    pub fn polygon(&self) -> Polygon {
        Polygon::new(self.ring())
    }

    /// 1-based `"(range,column)"` or `"(range,column,row)"`; flexible cells
    /// use the plot index in place of the range.
    pub fn label(&self) -> String {
        let major = self.plot.unwrap_or(self.range) + 1;
        match self.row {
            Some(row) => format!("({},{},{})", major, self.column + 1, row + 1),
            None => format!("({},{})", major, self.column + 1),
        }
    }
}

/// Corners of the plot at `(range, column)`.
///
/// ```text
/// p1 = anchor + column * (column_length + column_spacing) * h
///             + range  * (range_length  + range_spacing)  * v
/// p2 = p1 + column_length * h
/// p3 = p1 + range_length  * v
/// p4 = p2 + range_length  * v
/// ```
pub fn cell_corners(
    frame: &DirectionFrame,
    params: &GridParams,
    range: usize,
    column: usize,
) -> CellCorners {
    let (pitch_h, pitch_v) = params.pitch();
    let p1 = frame.point_at(column as f64 * pitch_h, range as f64 * pitch_v);
    let p2 = p1 + frame.horizontal * params.column_length;
    let p3 = p1 + frame.vertical * params.range_length;
    let p4 = p2 + frame.vertical * params.range_length;
    CellCorners {
        bottom_left: p1,
        bottom_right: p2,
        top_left: p3,
        top_right: p4,
    }
}

/// Lay out `num_ranges x num_columns` plots, each split into `num_rows` strips.
///
/// Cells come out range-major, then by column, then by strip left to right.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(frame, params), fields(ranges = params.num_ranges, columns = params.num_columns, rows = params.num_rows))
)]
pub fn generate_grid(
    frame: &DirectionFrame,
    params: &GridParams,
) -> Result<Vec<GridCell>, GridError> {
    params.validate()?;
    if params.num_rows > 1 && frame.is_rotated() {
        log::warn!(
            "field is rotated; row strips are cut along the x axis, not along the plot edges"
        );
    }

    let mut cells =
        Vec::with_capacity(params.num_ranges * params.num_columns * params.num_rows);
    for range in 0..params.num_ranges {
        for column in 0..params.num_columns {
            let corners = cell_corners(frame, params, range, column);
            if params.num_rows == 1 {
                cells.push(GridCell {
                    range,
                    column,
                    row: None,
                    plot: None,
                    shape: CellShape::Quad(corners),
                });
                continue;
            }
            for (row, strip) in split_into_strips(&corners.ring(), params.num_rows)
                .into_iter()
                .enumerate()
            {
                cells.push(GridCell {
                    range,
                    column,
                    row: Some(row),
                    plot: None,
                    shape: CellShape::Clipped(strip),
                });
            }
        }
    }
    log::info!(
        "generated {} cells ({} ranges x {} columns x {} rows)",
        cells.len(),
        params.num_ranges,
        params.num_columns,
        params.num_rows
    );
    Ok(cells)
}

/// Place `num_rows` side-by-side row cells at every plot anchor.
///
/// Each cell is `column_length` wide and `range_length` tall, laid out along
/// the field directions; spacings and `num_ranges`/`num_columns` are unused.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(frame, anchors, params), fields(plots = anchors.len(), rows = params.num_rows))
)]
pub fn generate_flexible(
    frame: &DirectionFrame,
    anchors: &[Point2<f64>],
    params: &GridParams,
) -> Result<Vec<GridCell>, GridError> {
    params.validate()?;
    if anchors.is_empty() {
        return Err(GridError::InvalidInput("no plot anchor points".to_string()));
    }
    let row_params = GridParams {
        range_spacing: 0.0,
        column_spacing: 0.0,
        ..params.clone()
    };

    let mut cells = Vec::with_capacity(anchors.len() * params.num_rows);
    for (plot, anchor) in anchors.iter().enumerate() {
        let plot_frame = frame.with_anchor(*anchor);
        for column in 0..params.num_rows {
            cells.push(GridCell {
                range: 0,
                column,
                row: None,
                plot: Some(plot),
                shape: CellShape::Quad(cell_corners(&plot_frame, &row_params, 0, column)),
            });
        }
    }
    log::info!(
        "generated {} cells for {} plots",
        cells.len(),
        anchors.len()
    );
    Ok(cells)
}
