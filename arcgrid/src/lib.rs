// #![deny(missing_docs)]

//! ArcGrid raster formats: ASCII (`.asc`/`.omg`) and float (`.hdr` +
//! `.flt`) reading and writing.
//!
//! # References
//!
//! 1. [ESRI ASCII raster format](https://desktop.arcgis.com/en/arcmap/latest/manage-data/raster-and-images/esri-ascii-raster-format.htm)
//! 1. [ESRI float raster format](https://desktop.arcgis.com/en/arcmap/latest/manage-data/raster-and-images/float-function.htm)

pub mod ascii;
mod element;
mod error;
pub mod float;
mod progress;
mod scan;

pub use crate::element::{Element, ElementKind};
pub use crate::error::{ArcGridError, Result};
pub use crate::progress::{LogProgress, NoProgress, Progress};
use geo::{
    geometry::{Coord, Polygon},
    polygon,
};
#[cfg(feature = "image")]
use image::{ImageBuffer, Luma};
#[cfg(feature = "image")]
use num_traits::AsPrimitive;

/// A 2D raster of elevation (or categorical) values with geospatial
/// metadata.
///
/// Cells are stored row-major, row 0 first, matching the order rows
/// appear in every on-disk format this crate handles.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    /// Cell values, row-major.
    cells: Vec<T>,

    /// Number of columns.
    width: usize,

    /// Number of rows.
    height: usize,

    /// Lower-left corner of the covered area.
    llcorner: Coord<f64>,

    /// Edge length of one square cell, in map units.
    cellsize: f64,

    /// Sentinel marking cells without a valid measurement.
    no_data: T,

    /// Number of cells whose value differs from the sentinel.
    data_cells: usize,
}

impl<T: Element> Grid<T> {
    /// Returns a grid of `width` × `height` cells, all set to the
    /// `no_data` sentinel.
    pub fn new(width: usize, height: usize, no_data: T) -> Self {
        Self {
            cells: vec![no_data; width * height],
            width,
            height,
            llcorner: Coord { x: 0.0, y: 0.0 },
            cellsize: 1.0,
            no_data,
            data_cells: 0,
        }
    }

    /// Returns this grid's (width, height) dimensions.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Returns the number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the number of cells in this grid.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Returns the lower-left corner of the covered area.
    pub fn llcorner(&self) -> Coord<f64> {
        self.llcorner
    }

    /// Returns the x coordinate of the lower-left corner.
    pub fn xllcorner(&self) -> f64 {
        self.llcorner.x
    }

    /// Returns the y coordinate of the lower-left corner.
    pub fn yllcorner(&self) -> f64 {
        self.llcorner.y
    }

    /// Returns the edge length of one square cell, in map units.
    pub fn cellsize(&self) -> f64 {
        self.cellsize
    }

    /// Returns the no-data sentinel.
    pub fn no_data(&self) -> T {
        self.no_data
    }

    /// Returns the number of cells holding valid (non-sentinel) data.
    pub fn data_cells(&self) -> usize {
        self.data_cells
    }

    pub fn set_llcorner(&mut self, llcorner: Coord<f64>) {
        self.llcorner = llcorner;
    }

    pub fn set_cellsize(&mut self, cellsize: f64) {
        self.cellsize = cellsize;
    }

    /// Sets the no-data sentinel.
    ///
    /// Does not rescan existing cells; the valid-cell count is
    /// recomputed by the readers on every load.
    pub fn set_no_data(&mut self, no_data: T) {
        self.no_data = no_data;
    }

    pub(crate) fn set_data_cells(&mut self, data_cells: usize) {
        self.data_cells = data_cells;
    }

    /// Returns the cell at `(x, y)`, or `None` when out of bounds.
    pub fn get(&self, (x, y): (usize, usize)) -> Option<T> {
        if x < self.width && y < self.height {
            Some(self.cells[self.xy_to_linear_index((x, y))])
        } else {
            None
        }
    }

    /// Returns the cell at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is out of bounds.
    pub fn get_unchecked(&self, (x, y): (usize, usize)) -> T {
        self.cells[self.xy_to_linear_index((x, y))]
    }

    /// Sets the cell at `(x, y)`, keeping the valid-cell count in step.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is out of bounds.
    pub fn set(&mut self, (x, y): (usize, usize), value: T) {
        let idx = self.xy_to_linear_index((x, y));
        let old = self.cells[idx];
        if old != self.no_data && value == self.no_data {
            self.data_cells -= 1;
        } else if old == self.no_data && value != self.no_data {
            self.data_cells += 1;
        }
        self.cells[idx] = value;
    }

    /// Reallocates this grid to `width` × `height` cells, all set to
    /// the sentinel; the valid-cell count resets to 0.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.cells.clear();
        self.cells.resize(width * height, self.no_data);
        self.width = width;
        self.height = height;
        self.data_cells = 0;
    }

    /// Returns the lowest valid cell value, or `None` when every cell
    /// holds the sentinel.
    pub fn min(&self) -> Option<T> {
        self.valid_cells()
            .reduce(|a, b| if b < a { b } else { a })
    }

    /// Returns the highest valid cell value, or `None` when every cell
    /// holds the sentinel.
    pub fn max(&self) -> Option<T> {
        self.valid_cells()
            .reduce(|a, b| if b > a { b } else { a })
    }

    /// Returns an iterator over this grid's rows, top row first.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        self.cells.chunks(self.width.max(1))
    }

    /// Returns an iterator over all cells, row-major.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.cells.iter().copied()
    }

    /// Returns this grid's outline as a polygon.
    pub fn polygon(&self) -> Polygon {
        #[allow(clippy::cast_precision_loss)]
        let e = self.llcorner.x + self.width as f64 * self.cellsize;
        #[allow(clippy::cast_precision_loss)]
        let n = self.llcorner.y + self.height as f64 * self.cellsize;
        let s = self.llcorner.y;
        let w = self.llcorner.x;

        polygon![
            (x: w, y: s),
            (x: e, y: s),
            (x: e, y: n),
            (x: w, y: n),
            (x: w, y: s),
        ]
    }

    fn xy_to_linear_index(&self, (x, y): (usize, usize)) -> usize {
        y * self.width + x
    }

    fn valid_cells(&self) -> impl Iterator<Item = T> + '_ {
        self.cells
            .iter()
            .copied()
            .filter(move |cell| *cell != self.no_data)
    }
}

#[cfg(feature = "image")]
impl<T> Grid<T>
where
    T: Element + AsPrimitive<f32>,
{
    /// Returns an [`ImageBuffer`] of this grid.
    ///
    /// The image is scaled so that the lowest valid cell is `0` and the
    /// highest is `Pix::max_value()`; no-data cells render as `0`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_image<Pix>(&self) -> ImageBuffer<Luma<Pix>, Vec<Pix>>
    where
        Pix: image::Primitive + 'static,
        f32: AsPrimitive<Pix> + From<Pix>,
    {
        let mut img = ImageBuffer::new(self.width as u32, self.height as u32);
        let min: f32 = self.min().map_or(0.0, |v| v.as_());
        let max: f32 = self.max().map_or(0.0, |v| v.as_());
        let span = if max > min { max - min } else { 1.0 };
        let scale = |value: T| (value.as_() - min) / span * f32::from(Pix::max_value());
        for y in 0..self.height {
            for x in 0..self.width {
                let value = self.get_unchecked((x, y));
                let pixel = if value == self.no_data {
                    0.0
                } else {
                    scale(value)
                };
                img.put_pixel(x as u32, y as u32, Luma([pixel.as_()]));
            }
        }
        img
    }
}
