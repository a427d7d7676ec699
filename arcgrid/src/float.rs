//! Float rasters: a text `.hdr` / binary `.flt` file pair sharing a
//! basename.
//!
//! The payload is row-major, fixed-width cells in the element type's
//! native representation. Everything is host-native only: the header's
//! byte-order tag is always written as `LSBFIRST` without inspecting
//! the host, and readers assume the payload already matches host byte
//! order. No detection or conversion is performed.

use crate::{
    scan::{check_dimensions, expect_field, parse_field, Tokens},
    ArcGridError, Element, Grid, NoProgress, Progress, Result,
};
use geo::geometry::Coord;
use log::debug;
use std::{
    ffi::OsString,
    fs::File,
    io::{BufReader, BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
};

/// Fractional digits used for the `.hdr` metadata fields.
pub const HEADER_PRECISION: usize = 10;

/// Parsed form of a `.hdr` file.
///
/// Exactly seven labeled fields in fixed order; any deviation in
/// count, order, or labeling is a
/// [`HeaderParse`](ArcGridError::HeaderParse) failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Header<T> {
    pub ncols: usize,
    pub nrows: usize,
    pub xllcorner: f64,
    pub yllcorner: f64,
    pub cellsize: f64,
    pub no_data: T,
    /// First character of the byte-order tag, `'L'` for `LSBFIRST`.
    pub byteorder: char,
}

fn sibling(basename: &Path, extension: &str) -> PathBuf {
    let mut path = OsString::from(basename.as_os_str());
    path.push(extension);
    PathBuf::from(path)
}

fn open_error(path: &Path) -> impl FnOnce(std::io::Error) -> ArcGridError + '_ {
    move |source| ArcGridError::Open {
        path: path.to_path_buf(),
        source,
    }
}

/// Writes `grid` as `<basename>.hdr` and `<basename>.flt`.
///
/// If the header was already written when the data file fails to open,
/// the header is left on disk; there is no rollback.
pub fn write<T, P>(basename: P, grid: &Grid<T>) -> Result<()>
where
    T: Element,
    P: AsRef<Path>,
{
    write_with_progress(basename, grid, &mut NoProgress)
}

/// Like [`write`], reporting the data pass to `progress`.
pub fn write_with_progress<T, P, O>(basename: P, grid: &Grid<T>, progress: &mut O) -> Result<()>
where
    T: Element,
    P: AsRef<Path>,
    O: Progress,
{
    let basename = basename.as_ref();
    let hdr = sibling(basename, ".hdr");
    let flt = sibling(basename, ".flt");

    debug!("writing float header file {}", hdr.display());
    {
        let file = File::create(&hdr).map_err(open_error(&hdr))?;
        let mut out = BufWriter::new(file);
        let precision = HEADER_PRECISION;
        writeln!(out, "ncols\t{}", grid.width())?;
        writeln!(out, "nrows\t{}", grid.height())?;
        writeln!(out, "xllcorner\t{:.precision$}", grid.xllcorner())?;
        writeln!(out, "yllcorner\t{:.precision$}", grid.yllcorner())?;
        writeln!(out, "cellsize\t{:.precision$}", grid.cellsize())?;
        writeln!(out, "NODATA_value\t{}", grid.no_data().format(precision))?;
        // Host byte order is assumed, never inspected.
        writeln!(out, "BYTEORDER\tLSBFIRST")?;
        out.flush()?;
    }

    debug!("writing float data file {}", flt.display());
    let file = File::create(&flt).map_err(open_error(&flt))?;
    let mut out = BufWriter::new(file);
    progress.start(grid.len());
    for (y, row) in grid.rows().enumerate() {
        progress.update(y * grid.width());
        for cell in row {
            cell.write_to(&mut out)?;
        }
    }
    progress.stop();
    out.flush()?;
    Ok(())
}

/// Parses `<basename>.hdr` without touching the payload.
pub fn read_header<T, P>(basename: P) -> Result<Header<T>>
where
    T: Element,
    P: AsRef<Path>,
{
    let hdr = sibling(basename.as_ref(), ".hdr");
    debug!("reading float header file {}", hdr.display());
    let file = File::open(&hdr).map_err(open_error(&hdr))?;
    let mut tokens = Tokens::new(BufReader::new(file));
    parse_header(&mut tokens, &hdr)
}

/// Reads a float file pair into a fresh grid.
pub fn read<T, P>(basename: P) -> Result<Grid<T>>
where
    T: Element,
    P: AsRef<Path>,
{
    read_with_progress(basename, &mut NoProgress)
}

/// Like [`read`], reporting the data pass to `progress`.
pub fn read_with_progress<T, P, O>(basename: P, progress: &mut O) -> Result<Grid<T>>
where
    T: Element,
    P: AsRef<Path>,
    O: Progress,
{
    let basename = basename.as_ref();
    let header = read_header::<T, _>(basename)?;
    let mut grid = Grid::new(0, 0, header.no_data);
    apply_header(&mut grid, &header);
    read_payload(&mut grid, &sibling(basename, ".flt"), progress)?;
    Ok(grid)
}

/// Reads a float file pair into `grid`, resizing it to the dimensions
/// found in the header.
pub fn read_into<T, P>(basename: P, grid: &mut Grid<T>) -> Result<()>
where
    T: Element,
    P: AsRef<Path>,
{
    read_into_with_progress(basename, grid, &mut NoProgress)
}

/// Like [`read_into`], reporting the data pass to `progress`.
pub fn read_into_with_progress<T, P, O>(
    basename: P,
    grid: &mut Grid<T>,
    progress: &mut O,
) -> Result<()>
where
    T: Element,
    P: AsRef<Path>,
    O: Progress,
{
    let basename = basename.as_ref();
    let header = read_header::<T, _>(basename)?;
    apply_header(grid, &header);
    read_payload(grid, &sibling(basename, ".flt"), progress)
}

fn parse_header<T, R>(tokens: &mut Tokens<R>, path: &Path) -> Result<Header<T>>
where
    T: Element,
    R: std::io::BufRead,
{
    let ncols: usize = {
        let token = expect_field(tokens, path, "ncols")?;
        parse_field(path, "ncols", &token)?
    };
    let nrows: usize = {
        let token = expect_field(tokens, path, "nrows")?;
        parse_field(path, "nrows", &token)?
    };
    check_dimensions(path, ncols, nrows, T::WIDTH)?;
    let xllcorner: f64 = {
        let token = expect_field(tokens, path, "xllcorner")?;
        parse_field(path, "xllcorner", &token)?
    };
    let yllcorner: f64 = {
        let token = expect_field(tokens, path, "yllcorner")?;
        parse_field(path, "yllcorner", &token)?
    };
    let cellsize: f64 = {
        let token = expect_field(tokens, path, "cellsize")?;
        parse_field(path, "cellsize", &token)?
    };
    let no_data = {
        let token = expect_field(tokens, path, "NODATA_value")?;
        T::parse_token(&token).ok_or_else(|| ArcGridError::HeaderParse {
            path: path.to_path_buf(),
            reason: format!("unparsable value {token:?} for `NODATA_value`"),
        })?
    };
    let byteorder = {
        let token = expect_field(tokens, path, "BYTEORDER")?;
        token.chars().next().ok_or_else(|| ArcGridError::HeaderParse {
            path: path.to_path_buf(),
            reason: String::from("empty value for `BYTEORDER`"),
        })?
    };
    if let Some(extra) = tokens.next_token()? {
        return Err(ArcGridError::HeaderParse {
            path: path.to_path_buf(),
            reason: format!("unexpected trailing content {extra:?}"),
        });
    }
    Ok(Header {
        ncols,
        nrows,
        xllcorner,
        yllcorner,
        cellsize,
        no_data,
        byteorder,
    })
}

fn apply_header<T: Element>(grid: &mut Grid<T>, header: &Header<T>) {
    // Dimensions have passed `check_dimensions`, so this cannot wrap.
    let megabytes = header.ncols.saturating_mul(header.nrows).saturating_mul(T::WIDTH) / 1024 / 1024;
    debug!("the loaded grid will require approximately {megabytes}MB of RAM");
    grid.set_no_data(header.no_data);
    grid.resize(header.ncols, header.nrows);
    grid.set_llcorner(Coord {
        x: header.xllcorner,
        y: header.yllcorner,
    });
    grid.set_cellsize(header.cellsize);
}

/// Streams the payload row-major, recomputing the valid-cell count.
///
/// The count stored on the grid comes from this pass alone; it is
/// never copied from anywhere else.
fn read_payload<T, O>(grid: &mut Grid<T>, flt: &Path, progress: &mut O) -> Result<()>
where
    T: Element,
    O: Progress,
{
    debug!("reading float data file {}", flt.display());
    let file = File::open(flt).map_err(open_error(flt))?;
    let mut src = BufReader::new(file);

    let (width, height) = grid.dimensions();
    let expected = width * height;
    let no_data = grid.no_data();
    let mut data_cells = 0;
    let mut found = 0;

    progress.start(expected);
    for y in 0..height {
        progress.update(y * width);
        for x in 0..width {
            let value = match T::read_from(&mut src) {
                Ok(value) => value,
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                    return Err(ArcGridError::Truncated {
                        path: flt.to_path_buf(),
                        expected,
                        found,
                    });
                }
                Err(e) => return Err(e.into()),
            };
            if value != no_data {
                data_cells += 1;
            }
            grid.set((x, y), value);
            found += 1;
        }
    }
    progress.stop();

    grid.set_data_cells(data_cells);
    Ok(())
}
