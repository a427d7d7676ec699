use anyhow::{Context, Result};
use arcgrid::{ascii, float, Grid};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use textplots::{Chart, Plot, Shape};

/// An ArcGrid raster multitool.
#[derive(Debug, Parser)]
struct Cli {
    #[command(subcommand)]
    command: SubCmd,
}

#[derive(Clone, Debug, Subcommand)]
enum SubCmd {
    /// Convert a raster between the text and float formats.
    Convert(ConvertArgs),
    /// Print a raster's header metadata.
    Info(InfoArgs),
    /// Plot one row of a raster in the terminal.
    Profile(ProfileArgs),
    /// Render a raster as a grayscale image.
    Render(RenderArgs),
}

#[derive(Args, Clone, Debug)]
struct ConvertArgs {
    /// Source raster.
    ///
    /// `.hdr`/`.flt` paths (or a bare basename) read the float pair;
    /// anything else reads ArcGrid ASCII.
    src: Utf8PathBuf,

    /// Destination raster, same extension rules as `src`; a `.omg`
    /// destination writes the OmniGlyph dialect.
    dest: Utf8PathBuf,

    /// Fractional digits for text output.
    #[arg(long, default_value_t = ascii::DEFAULT_PRECISION)]
    precision: usize,
}

#[derive(Args, Clone, Debug)]
struct InfoArgs {
    /// Source raster.
    src: Utf8PathBuf,

    /// Emit JSON instead of plain text.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Clone, Debug)]
struct ProfileArgs {
    /// Source raster.
    src: Utf8PathBuf,

    /// Row to plot; defaults to the middle row.
    #[arg(long)]
    row: Option<usize>,
}

#[derive(Args, Clone, Debug)]
struct RenderArgs {
    /// Source raster.
    src: Utf8PathBuf,

    /// Optional output file name.
    ///
    /// Image format will be based on `dest`'s extension.
    ///
    /// If not specified, a png will be written with the raster's
    /// basename in the raster's dir.
    dest: Option<Utf8PathBuf>,
}

/// Reads a grid from `path`, dispatching on its extension.
fn load(path: &Utf8Path) -> Result<Grid<f32>> {
    let grid = match path.extension() {
        Some("hdr" | "flt") => float::read(path.with_extension("").as_std_path())?,
        Some(_) => ascii::read(path.as_std_path())?,
        None => float::read(path.as_std_path())?,
    };
    Ok(grid)
}

fn convert(ConvertArgs { src, dest, precision }: ConvertArgs) -> Result<()> {
    let grid = load(&src)?;
    match dest.extension() {
        Some("hdr" | "flt") => float::write(dest.with_extension("").as_std_path(), &grid)?,
        Some(_) => ascii::write(dest.as_std_path(), &grid, precision)?,
        None => float::write(dest.as_std_path(), &grid)?,
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct GridInfo {
    ncols: usize,
    nrows: usize,
    xllcorner: f64,
    yllcorner: f64,
    cellsize: f64,
    nodata: f32,
    data_cells: usize,
}

fn info(InfoArgs { src, json }: InfoArgs) -> Result<()> {
    let grid = load(&src)?;
    let info = GridInfo {
        ncols: grid.width(),
        nrows: grid.height(),
        xllcorner: grid.xllcorner(),
        yllcorner: grid.yllcorner(),
        cellsize: grid.cellsize(),
        nodata: grid.no_data(),
        data_cells: grid.data_cells(),
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("{:<13}{}", "ncols", info.ncols);
        println!("{:<13}{}", "nrows", info.nrows);
        println!("{:<13}{}", "xllcorner", info.xllcorner);
        println!("{:<13}{}", "yllcorner", info.yllcorner);
        println!("{:<13}{}", "cellsize", info.cellsize);
        println!("{:<13}{}", "NODATA_value", info.nodata);
        println!("{:<13}{}", "data_cells", info.data_cells);
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn profile(ProfileArgs { src, row }: ProfileArgs) -> Result<()> {
    let grid = load(&src)?;
    let row = row.unwrap_or(grid.height() / 2);
    anyhow::ensure!(
        row < grid.height(),
        "row {row} is out of bounds for a {} row raster",
        grid.height()
    );
    let points: Vec<(f32, f32)> = (0..grid.width())
        .filter_map(|x| {
            let value = grid.get_unchecked((x, row));
            (value != grid.no_data()).then_some((x as f32, value))
        })
        .collect();
    anyhow::ensure!(!points.is_empty(), "row {row} holds no valid cells");
    Chart::new(300, 80, 0.0, grid.width() as f32)
        .lineplot(&Shape::Lines(&points))
        .display();
    Ok(())
}

fn render(RenderArgs { src, dest }: RenderArgs) -> Result<()> {
    let grid = load(&src)?;
    let out = dest.map_or_else(
        || {
            let mut out = src.clone();
            out.set_extension("png");
            out
        },
        |mut out| {
            if out.is_dir() {
                let name = src.file_name().unwrap_or("raster");
                out.push(name);
                out.set_extension("png");
            }
            out
        },
    );

    eprintln!("writing to {out:?}");
    if let Some("png" | "tif" | "tiff") = out.extension() {
        let img = grid.to_image::<u16>();
        img.save(&out).with_context(|| format!("saving {out}"))?;
    } else {
        let img = grid.to_image::<u8>();
        img.save(&out).with_context(|| format!("saving {out}"))?;
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        SubCmd::Convert(args) => convert(args),
        SubCmd::Info(args) => info(args),
        SubCmd::Profile(args) => profile(args),
        SubCmd::Render(args) => render(args),
    }
}
