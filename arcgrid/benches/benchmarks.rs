use arcgrid::{ascii, float, Grid};
use criterion::{criterion_group, criterion_main, Criterion};
use tempfile::TempDir;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn synthetic_grid(size: usize) -> Grid<f32> {
    let mut grid = Grid::new(size, size, -9999.0);
    grid.set_cellsize(30.0);
    for y in 0..size {
        for x in 0..size {
            #[allow(clippy::cast_precision_loss)]
            grid.set((x, y), ((x * 7 + y * 13) % 997) as f32 * 0.5);
        }
    }
    grid
}

fn ascii_write(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let grid = synthetic_grid(512);
    let path = dir.path().join("bench.asc");
    c.bench_function("ascii_write_512", |b| {
        b.iter(|| ascii::write(&path, &grid, ascii::DEFAULT_PRECISION).unwrap());
    });
}

fn ascii_read(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bench.asc");
    ascii::write(&path, &synthetic_grid(512), ascii::DEFAULT_PRECISION).unwrap();
    c.bench_function("ascii_read_512", |b| {
        b.iter(|| ascii::read::<f32, _>(&path).unwrap());
    });
}

fn float_write(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let grid = synthetic_grid(512);
    let basename = dir.path().join("bench");
    c.bench_function("float_write_512", |b| {
        b.iter(|| float::write(&basename, &grid).unwrap());
    });
}

fn float_read(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let basename = dir.path().join("bench");
    float::write(&basename, &synthetic_grid(512)).unwrap();
    c.bench_function("float_read_512", |b| {
        b.iter(|| float::read::<f32, _>(&basename).unwrap());
    });
}

criterion_group!(benches, ascii_write, ascii_read, float_write, float_read);
criterion_main!(benches);
