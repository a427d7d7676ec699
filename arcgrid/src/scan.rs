//! Whitespace token scanner shared by the text readers and the binary
//! header parser.

use crate::{ArcGridError, Result};
use std::{io::BufRead, path::Path, str::FromStr};

/// Pulls whitespace-delimited tokens off a buffered reader, crossing
/// line boundaries transparently.
pub(crate) struct Tokens<R> {
    inner: R,
    line: String,
    pos: usize,
}

impl<R: BufRead> Tokens<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner,
            line: String::new(),
            pos: 0,
        }
    }

    /// Returns the next token, or `None` at end of input.
    pub(crate) fn next_token(&mut self) -> std::io::Result<Option<String>> {
        loop {
            let bytes = self.line.as_bytes();
            let mut start = self.pos;
            while start < bytes.len() && bytes[start].is_ascii_whitespace() {
                start += 1;
            }
            if start < bytes.len() {
                let mut end = start;
                while end < bytes.len() && !bytes[end].is_ascii_whitespace() {
                    end += 1;
                }
                self.pos = end;
                return Ok(Some(self.line[start..end].to_owned()));
            }
            self.line.clear();
            self.pos = 0;
            if self.inner.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
        }
    }
}

/// Consumes one labeled header field and returns its raw value token.
///
/// The label must match exactly; headers have a fixed field order and
/// any deviation is a parse failure.
pub(crate) fn expect_field<R: BufRead>(
    tokens: &mut Tokens<R>,
    path: &Path,
    label: &str,
) -> Result<String> {
    let header_parse = |reason: String| ArcGridError::HeaderParse {
        path: path.to_path_buf(),
        reason,
    };
    let found = tokens
        .next_token()?
        .ok_or_else(|| header_parse(format!("missing field `{label}`")))?;
    if found != label {
        return Err(header_parse(format!(
            "expected field `{label}`, found `{found}`"
        )));
    }
    tokens
        .next_token()?
        .ok_or_else(|| header_parse(format!("missing value for `{label}`")))
}

/// Validates payload dimensions before any allocation.
///
/// The payload's byte size must fit `usize` and stay within what a
/// single allocation can hold (`isize::MAX` bytes).
pub(crate) fn check_dimensions(
    path: &Path,
    ncols: usize,
    nrows: usize,
    cell_width: usize,
) -> Result<()> {
    let bytes = ncols
        .checked_mul(nrows)
        .and_then(|cells| cells.checked_mul(cell_width));
    match bytes {
        Some(bytes) if bytes <= isize::MAX as usize => Ok(()),
        _ => Err(ArcGridError::HeaderParse {
            path: path.to_path_buf(),
            reason: format!("dimensions {ncols}x{nrows} overflow"),
        }),
    }
}

/// Parses a header value token with [`FromStr`].
pub(crate) fn parse_field<V: FromStr>(path: &Path, label: &str, token: &str) -> Result<V> {
    token.parse().map_err(|_| ArcGridError::HeaderParse {
        path: path.to_path_buf(),
        reason: format!("unparsable value {token:?} for `{label}`"),
    })
}
