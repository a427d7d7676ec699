//! Injectable progress observers.
//!
//! Codec operations report their data pass through a [`Progress`]
//! observer: `start` with the total cell count before the pass, `update`
//! with the cells completed so far once per row, and `stop` after the
//! pass. Observers are never required for correctness; every operation
//! has a plain variant that wires in [`NoProgress`].

use std::time::Instant;

/// Receives progress notifications from a single codec operation.
pub trait Progress {
    /// A data pass over `total` cells is about to begin.
    fn start(&mut self, total: usize);

    /// `completed` cells have been processed so far.
    fn update(&mut self, completed: usize);

    /// The data pass finished.
    fn stop(&mut self);
}

/// Observer that ignores all notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn start(&mut self, _total: usize) {}

    fn update(&mut self, _completed: usize) {}

    fn stop(&mut self) {}
}

/// Observer that reports through the [`log`] facade.
///
/// Emits a `debug!` line per update and an `info!` line with the
/// elapsed wall time on `stop`.
#[derive(Debug, Default)]
pub struct LogProgress {
    total: usize,
    started_at: Option<Instant>,
}

impl LogProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Progress for LogProgress {
    fn start(&mut self, total: usize) {
        self.total = total;
        self.started_at = Some(Instant::now());
    }

    fn update(&mut self, completed: usize) {
        log::debug!("processed {completed}/{} cells", self.total);
    }

    fn stop(&mut self) {
        if let Some(started_at) = self.started_at.take() {
            log::info!(
                "processed {} cells in {:.3}s",
                self.total,
                started_at.elapsed().as_secs_f64()
            );
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Progress;

    /// Records every notification, for asserting observer placement.
    #[derive(Debug, Default)]
    pub(crate) struct Recorder {
        pub(crate) started: Vec<usize>,
        pub(crate) updates: Vec<usize>,
        pub(crate) stops: usize,
    }

    impl Progress for Recorder {
        fn start(&mut self, total: usize) {
            self.started.push(total);
        }

        fn update(&mut self, completed: usize) {
            self.updates.push(completed);
        }

        fn stop(&mut self) {
            self.stops += 1;
        }
    }
}
