use std::path::PathBuf;

/// All errors that can occur during grid I/O operations.
///
/// Any failure aborts the whole operation; no retries or partial
/// recovery happen inside the codec. The caller decides whether to
/// abort, retry with another path, or report.
#[derive(Debug, thiserror::Error)]
pub enum ArcGridError {
    /// A required file could not be opened for reading or writing.
    #[error("failed to open {}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A header deviated from the fixed field count, order, or labels.
    #[error("malformed header in {}: {reason}", path.display())]
    HeaderParse { path: PathBuf, reason: String },

    /// A data token could not be parsed as a cell value.
    #[error("invalid cell value {token:?} in {}", path.display())]
    InvalidCell { path: PathBuf, token: String },

    /// The payload ended before all declared cells were read.
    #[error("{} is truncated: expected {expected} cells, found {found}", path.display())]
    Truncated {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    /// An I/O error after a successful open.
    #[error("i/o error")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ArcGridError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn display_open() {
        let e = ArcGridError::Open {
            path: PathBuf::from("dem.hdr"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(e.to_string(), "failed to open dem.hdr");
    }

    #[test]
    fn display_header_parse() {
        let e = ArcGridError::HeaderParse {
            path: PathBuf::from("dem.hdr"),
            reason: String::from("expected field `ncols`, found `rows`"),
        };
        assert_eq!(
            e.to_string(),
            "malformed header in dem.hdr: expected field `ncols`, found `rows`"
        );
    }

    #[test]
    fn display_truncated() {
        let e = ArcGridError::Truncated {
            path: PathBuf::from("dem.flt"),
            expected: 4,
            found: 3,
        };
        assert_eq!(e.to_string(), "dem.flt is truncated: expected 4 cells, found 3");
    }
}
