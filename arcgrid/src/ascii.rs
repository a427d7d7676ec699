//! ArcGrid ASCII (`.asc`) and OmniGlyph (`.omg`) text rasters.
//!
//! The dialect is selected by the output path's suffix: paths ending in
//! [`OMG_SUFFIX`] get the OmniGlyph pixel-array layout, everything else
//! gets the ArcGrid key/value header followed by space-separated rows.
//! Only the ArcGrid dialect is readable; OmniGlyph is write-only.

use crate::{
    scan::{check_dimensions, expect_field, parse_field, Tokens},
    ArcGridError, Element, Grid, NoProgress, Progress, Result,
};
use geo::geometry::Coord;
use log::debug;
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// Default number of fractional digits for text output.
pub const DEFAULT_PRECISION: usize = 8;

/// Output paths with this suffix select the OmniGlyph dialect.
pub const OMG_SUFFIX: &str = ".omg";

/// Header labels of the ArcGrid dialect, in their fixed order.
const FIELDS: [&str; 6] = [
    "ncols",
    "nrows",
    "xllcorner",
    "yllcorner",
    "cellsize",
    "NODATA_value",
];

/// Writes `grid` as a text raster at `path`, with `precision`
/// fractional digits.
///
/// Integer and boolean grids are written as plain integers regardless
/// of `precision`.
pub fn write<T, P>(path: P, grid: &Grid<T>, precision: usize) -> Result<()>
where
    T: Element,
    P: AsRef<Path>,
{
    write_with_progress(path, grid, precision, &mut NoProgress)
}

/// Like [`write`], reporting the data pass to `progress`.
pub fn write_with_progress<T, P, O>(
    path: P,
    grid: &Grid<T>,
    precision: usize,
    progress: &mut O,
) -> Result<()>
where
    T: Element,
    P: AsRef<Path>,
    O: Progress,
{
    let path = path.as_ref();
    let omg = path
        .to_str()
        .is_some_and(|path| path.ends_with(OMG_SUFFIX));
    debug!(
        "writing {} file {}",
        if omg { "OmniGlyph" } else { "ArcGrid ASCII" },
        path.display()
    );

    let file = File::create(path).map_err(|source| ArcGridError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut out = BufWriter::new(file);

    if omg {
        write_omg_header(&mut out, grid)?;
    } else {
        write_arc_header(&mut out, grid, precision)?;
    }

    progress.start(grid.len());
    for (y, row) in grid.rows().enumerate() {
        progress.update(y * grid.width());
        for (x, cell) in row.iter().enumerate() {
            if omg {
                out.write_all(b"|")?;
            } else if x > 0 {
                out.write_all(b" ")?;
            }
            out.write_all(cell.format(precision).as_bytes())?;
        }
        out.write_all(b"\n")?;
    }
    progress.stop();

    out.flush()?;
    Ok(())
}

fn write_arc_header<T, W>(out: &mut W, grid: &Grid<T>, precision: usize) -> Result<()>
where
    T: Element,
    W: Write,
{
    writeln!(out, "ncols\t{}", grid.width())?;
    writeln!(out, "nrows\t{}", grid.height())?;
    writeln!(out, "xllcorner\t{:.precision$}", grid.xllcorner())?;
    writeln!(out, "yllcorner\t{:.precision$}", grid.yllcorner())?;
    writeln!(out, "cellsize\t{:.precision$}", grid.cellsize())?;
    writeln!(out, "NODATA_value\t{}", grid.no_data().format(precision))?;
    Ok(())
}

fn write_omg_header<T, W>(out: &mut W, grid: &Grid<T>) -> Result<()>
where
    T: Element,
    W: Write,
{
    let min = grid.min().unwrap_or_else(|| grid.no_data());
    let max = grid.max().unwrap_or_else(|| grid.no_data());
    writeln!(out, "Contents: Pixel array")?;
    writeln!(out)?;
    writeln!(out, "Width:    {}", grid.width())?;
    writeln!(out, "Height:   {}", grid.height())?;
    writeln!(out)?;
    writeln!(out, "Spectral bands:   1")?;
    writeln!(out, "Bits per band:   32")?;
    writeln!(
        out,
        "Range of values:   {},{}",
        min.format_plain(),
        max.format_plain()
    )?;
    // The lower bound is the sentinel verbatim; the format assumes it
    // is a small negative value.
    writeln!(
        out,
        "Actual range:   {},{}",
        grid.no_data().format_plain(),
        max.format_plain()
    )?;
    writeln!(out, "Gamma exponent:   0.")?;
    writeln!(out, "Resolution:   100 pixels per inch")?;
    writeln!(out)?;
    writeln!(out, "|")?;
    Ok(())
}

/// Reads an ArcGrid ASCII raster into a fresh grid.
pub fn read<T, P>(path: P) -> Result<Grid<T>>
where
    T: Element,
    P: AsRef<Path>,
{
    read_with_progress(path, &mut NoProgress)
}

/// Like [`read`], reporting the data pass to `progress`.
pub fn read_with_progress<T, P, O>(path: P, progress: &mut O) -> Result<Grid<T>>
where
    T: Element,
    P: AsRef<Path>,
    O: Progress,
{
    let path = path.as_ref();
    let mut tokens = open_tokens(path)?;
    let header = parse_arc_header::<T, _>(&mut tokens, path)?;
    let mut grid = Grid::new(header.ncols, header.nrows, header.no_data);
    grid.set_llcorner(Coord {
        x: header.xllcorner,
        y: header.yllcorner,
    });
    grid.set_cellsize(header.cellsize);
    fill_from_tokens(&mut grid, &mut tokens, path, progress)?;
    Ok(grid)
}

/// Reads an ArcGrid ASCII raster into `grid`, resizing it to the
/// dimensions found in the header.
pub fn read_into<T, P>(path: P, grid: &mut Grid<T>) -> Result<()>
where
    T: Element,
    P: AsRef<Path>,
{
    read_into_with_progress(path, grid, &mut NoProgress)
}

/// Like [`read_into`], reporting the data pass to `progress`.
pub fn read_into_with_progress<T, P, O>(path: P, grid: &mut Grid<T>, progress: &mut O) -> Result<()>
where
    T: Element,
    P: AsRef<Path>,
    O: Progress,
{
    let path = path.as_ref();
    let mut tokens = open_tokens(path)?;
    let header = parse_arc_header::<T, _>(&mut tokens, path)?;
    grid.set_no_data(header.no_data);
    grid.resize(header.ncols, header.nrows);
    grid.set_llcorner(Coord {
        x: header.xllcorner,
        y: header.yllcorner,
    });
    grid.set_cellsize(header.cellsize);
    fill_from_tokens(grid, &mut tokens, path, progress)
}

struct ArcHeader<T> {
    ncols: usize,
    nrows: usize,
    xllcorner: f64,
    yllcorner: f64,
    cellsize: f64,
    no_data: T,
}

fn open_tokens(path: &Path) -> Result<Tokens<BufReader<File>>> {
    debug!("reading ArcGrid ASCII file {}", path.display());
    let file = File::open(path).map_err(|source| ArcGridError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Tokens::new(BufReader::new(file)))
}

fn parse_arc_header<T, R>(tokens: &mut Tokens<R>, path: &Path) -> Result<ArcHeader<T>>
where
    T: Element,
    R: std::io::BufRead,
{
    let [ncols, nrows, xllcorner, yllcorner, cellsize, no_data] = FIELDS;
    let ncols: usize = {
        let token = expect_field(tokens, path, ncols)?;
        parse_field(path, "ncols", &token)?
    };
    let nrows: usize = {
        let token = expect_field(tokens, path, nrows)?;
        parse_field(path, "nrows", &token)?
    };
    check_dimensions(path, ncols, nrows, T::WIDTH)?;
    let xllcorner: f64 = {
        let token = expect_field(tokens, path, xllcorner)?;
        parse_field(path, "xllcorner", &token)?
    };
    let yllcorner: f64 = {
        let token = expect_field(tokens, path, yllcorner)?;
        parse_field(path, "yllcorner", &token)?
    };
    let cellsize: f64 = {
        let token = expect_field(tokens, path, cellsize)?;
        parse_field(path, "cellsize", &token)?
    };
    let no_data = {
        let token = expect_field(tokens, path, no_data)?;
        T::parse_token(&token).ok_or_else(|| ArcGridError::HeaderParse {
            path: path.to_path_buf(),
            reason: format!("unparsable value {token:?} for `NODATA_value`"),
        })?
    };
    Ok(ArcHeader {
        ncols,
        nrows,
        xllcorner,
        yllcorner,
        cellsize,
        no_data,
    })
}

/// Streams cell tokens into `grid`, recomputing the valid-cell count.
///
/// Surplus tokens after the last expected cell are ignored; too few are
/// a [`Truncated`](ArcGridError::Truncated) error.
fn fill_from_tokens<T, R, O>(
    grid: &mut Grid<T>,
    tokens: &mut Tokens<R>,
    path: &Path,
    progress: &mut O,
) -> Result<()>
where
    T: Element,
    R: std::io::BufRead,
    O: Progress,
{
    let (width, height) = grid.dimensions();
    let expected = width * height;
    let no_data = grid.no_data();
    let mut data_cells = 0;
    let mut found = 0;

    progress.start(expected);
    for y in 0..height {
        progress.update(y * width);
        for x in 0..width {
            let token = tokens
                .next_token()?
                .ok_or_else(|| ArcGridError::Truncated {
                    path: path.to_path_buf(),
                    expected,
                    found,
                })?;
            let value = T::parse_token(&token).ok_or_else(|| ArcGridError::InvalidCell {
                path: path.to_path_buf(),
                token,
            })?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::testing::Recorder;
    use std::fs;

    fn scenario_grid() -> Grid<i32> {
        let mut grid = Grid::new(2, 2, -9999);
        grid.set_cellsize(30.0);
        grid.set((0, 0), 10);
        grid.set((0, 1), 20);
        grid.set((1, 1), 30);
        grid
    }

    #[test]
    fn arc_output_matches_golden_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dem.asc");
        write(&path, &scenario_grid(), DEFAULT_PRECISION).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "ncols\t2\n\
             nrows\t2\n\
             xllcorner\t0.00000000\n\
             yllcorner\t0.00000000\n\
             cellsize\t30.00000000\n\
             NODATA_value\t-9999\n\
             10 -9999\n\
             20 30\n"
        );
    }

    #[test]
    fn float_cells_are_fixed_point() {
        let mut grid: Grid<f32> = Grid::new(2, 1, -9999.0);
        grid.set((0, 0), 1.5);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dem.asc");
        write(&path, &grid, 2).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.ends_with("NODATA_value\t-9999.00\n1.50 -9999.00\n"));
    }

    #[test]
    fn omg_output_matches_golden_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dem.omg");
        write(&path, &scenario_grid(), DEFAULT_PRECISION).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Contents: Pixel array\n\
             \n\
             Width:    2\n\
             Height:   2\n\
             \n\
             Spectral bands:   1\n\
             Bits per band:   32\n\
             Range of values:   10,30\n\
             Actual range:   -9999,30\n\
             Gamma exponent:   0.\n\
             Resolution:   100 pixels per inch\n\
             \n\
             |\n\
             |10|-9999\n\
             |20|30\n"
        );
    }

    #[test]
    fn omg_range_falls_back_to_sentinel_when_empty() {
        let grid: Grid<i32> = Grid::new(1, 1, -9999);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dem.omg");
        write(&path, &grid, DEFAULT_PRECISION).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("Range of values:   -9999,-9999\n"));
        assert!(contents.contains("Actual range:   -9999,-9999\n"));
    }

    #[test]
    fn empty_grid_writes_header_only() {
        let grid: Grid<f32> = Grid::new(0, 3, -9999.0);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.asc");
        write(&path, &grid, DEFAULT_PRECISION).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("ncols\t0\nnrows\t3\n"));
        assert!(contents.ends_with("NODATA_value\t-9999.00000000\n"));
    }

    #[test]
    fn read_recovers_scenario_grid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dem.asc");
        write(&path, &scenario_grid(), DEFAULT_PRECISION).unwrap();
        let back: Grid<i32> = read(&path).unwrap();
        assert_eq!(back, scenario_grid());
        assert_eq!(back.data_cells(), 3);
    }

    #[test]
    fn read_into_resizes_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dem.asc");
        write(&path, &scenario_grid(), DEFAULT_PRECISION).unwrap();
        let mut grid: Grid<i32> = Grid::new(7, 1, 0);
        read_into(&path, &mut grid).unwrap();
        assert_eq!(grid, scenario_grid());
    }

    #[test]
    fn out_of_order_header_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.asc");
        fs::write(&path, "nrows\t2\nncols\t2\n").unwrap();
        let err = read::<i32, _>(&path).unwrap_err();
        assert!(matches!(err, ArcGridError::HeaderParse { .. }));
    }

    #[test]
    fn unparsable_cell_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.asc");
        write(&path, &scenario_grid(), DEFAULT_PRECISION).unwrap();
        let mangled = fs::read_to_string(&path).unwrap().replace("30", "x30");
        fs::write(&path, mangled).unwrap();
        let err = read::<i32, _>(&path).unwrap_err();
        assert!(matches!(err, ArcGridError::InvalidCell { .. }));
    }

    #[test]
    fn short_payload_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.asc");
        let contents = fs::read_to_string({
            let full = dir.path().join("full.asc");
            write(&full, &scenario_grid(), DEFAULT_PRECISION).unwrap();
            full
        })
        .unwrap();
        fs::write(&path, contents.trim_end_matches("20 30\n")).unwrap();
        match read::<i32, _>(&path).unwrap_err() {
            ArcGridError::Truncated { expected, found, .. } => {
                assert_eq!(expected, 4);
                assert_eq!(found, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn surplus_tokens_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extra.asc");
        write(&path, &scenario_grid(), DEFAULT_PRECISION).unwrap();
        let mut contents = fs::read_to_string(&path).unwrap();
        contents.push_str("999 999\n");
        fs::write(&path, contents).unwrap();
        let back: Grid<i32> = read(&path).unwrap();
        assert_eq!(back, scenario_grid());
    }

    #[test]
    fn missing_file_is_open_error() {
        let err = read::<f32, _>("/nonexistent/dem.asc").unwrap_err();
        assert!(matches!(err, ArcGridError::Open { .. }));
    }

    #[test]
    fn progress_sees_one_update_per_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dem.asc");
        let mut recorder = Recorder::default();
        write_with_progress(&path, &scenario_grid(), DEFAULT_PRECISION, &mut recorder).unwrap();
        assert_eq!(recorder.started, [4]);
        assert_eq!(recorder.updates, [0, 2]);
        assert_eq!(recorder.stops, 1);
    }
}
