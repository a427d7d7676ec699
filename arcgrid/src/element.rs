//! Cell element types and their on-disk representations.

use byteorder::{NativeEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

/// Semantic kind of a grid's cell values.
///
/// Text output depends on the kind: floating-point cells are written
/// fixed-point at the caller's precision, while integer and boolean
/// cells are written as plain integers regardless of the requested
/// precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Float,
    Integer,
    Boolean,
}

/// A value that can live in a [`Grid`](crate::Grid) cell.
///
/// Covers the three format-facing concerns of a cell type: its
/// native-width binary representation (host byte order, see the
/// [`float`](crate::float) module docs), its text-token parse, and its
/// kind-aware text rendering.
pub trait Element: Copy + PartialEq + PartialOrd + std::fmt::Debug {
    /// Semantic kind of this element type.
    const KIND: ElementKind;

    /// On-disk width of one cell, in bytes.
    const WIDTH: usize;

    /// Reads one cell from `src` in host byte order.
    fn read_from<R: Read>(src: &mut R) -> std::io::Result<Self>;

    /// Writes one cell to `dst` in host byte order.
    fn write_to<W: Write>(&self, dst: &mut W) -> std::io::Result<()>;

    /// Parses a whitespace-delimited text token into a cell value.
    fn parse_token(token: &str) -> Option<Self>;

    /// Renders a cell for text output.
    ///
    /// `precision` is the number of fractional digits and only applies
    /// to [`ElementKind::Float`] types; integer and boolean cells
    /// ignore it.
    fn format(&self, precision: usize) -> String;

    /// Renders a cell with default (non-fixed) formatting, as used by
    /// the OmniGlyph range lines.
    fn format_plain(&self) -> String;
}

macro_rules! float_element {
    ($ty:ty, $read:ident, $write:ident) => {
        impl Element for $ty {
            const KIND: ElementKind = ElementKind::Float;
            const WIDTH: usize = std::mem::size_of::<$ty>();

            fn read_from<R: Read>(src: &mut R) -> std::io::Result<Self> {
                src.$read::<NativeEndian>()
            }

            fn write_to<W: Write>(&self, dst: &mut W) -> std::io::Result<()> {
                dst.$write::<NativeEndian>(*self)
            }

            fn parse_token(token: &str) -> Option<Self> {
                token.parse().ok()
            }

            fn format(&self, precision: usize) -> String {
                format!("{self:.precision$}")
            }

            fn format_plain(&self) -> String {
                format!("{self}")
            }
        }
    };
}

macro_rules! int_element {
    ($ty:ty, read_i8, write_i8) => {
        int_element!(@impl $ty, read_i8, write_i8, (), ());
    };
    ($ty:ty, read_u8, write_u8) => {
        int_element!(@impl $ty, read_u8, write_u8, (), ());
    };
    ($ty:ty, $read:ident, $write:ident) => {
        int_element!(@impl $ty, $read, $write, (::<NativeEndian>), (::<NativeEndian>));
    };
    (@impl $ty:ty, $read:ident, $write:ident, ($($rd:tt)*), ($($wr:tt)*)) => {
        impl Element for $ty {
            const KIND: ElementKind = ElementKind::Integer;
            const WIDTH: usize = std::mem::size_of::<$ty>();

            fn read_from<R: Read>(src: &mut R) -> std::io::Result<Self> {
                src.$read$($rd)*()
            }

            fn write_to<W: Write>(&self, dst: &mut W) -> std::io::Result<()> {
                dst.$write$($wr)*(*self)
            }

            fn parse_token(token: &str) -> Option<Self> {
                token.parse().ok()
            }

            fn format(&self, _precision: usize) -> String {
                format!("{self}")
            }

            fn format_plain(&self) -> String {
                format!("{self}")
            }
        }
    };
}

float_element!(f32, read_f32, write_f32);
float_element!(f64, read_f64, write_f64);
int_element!(i16, read_i16, write_i16);
int_element!(i32, read_i32, write_i32);
int_element!(i8, read_i8, write_i8);
int_element!(u8, read_u8, write_u8);

impl Element for bool {
    const KIND: ElementKind = ElementKind::Boolean;
    const WIDTH: usize = 1;

    fn read_from<R: Read>(src: &mut R) -> std::io::Result<Self> {
        Ok(src.read_u8()? != 0)
    }

    fn write_to<W: Write>(&self, dst: &mut W) -> std::io::Result<()> {
        dst.write_u8(u8::from(*self))
    }

    fn parse_token(token: &str) -> Option<Self> {
        token.parse::<i64>().ok().map(|v| v != 0)
    }

    fn format(&self, _precision: usize) -> String {
        format!("{}", u8::from(*self))
    }

    fn format_plain(&self) -> String {
        format!("{}", u8::from(*self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_format_is_fixed_point() {
        assert_eq!(10.0_f32.format(8), "10.00000000");
        assert_eq!((-9999.0_f64).format(2), "-9999.00");
    }

    #[test]
    fn integer_format_ignores_precision() {
        assert_eq!((-9999_i32).format(8), "-9999");
        assert_eq!(7_i16.format(3), "7");
        assert_eq!(true.format(8), "1");
        assert_eq!(false.format(8), "0");
    }

    #[test]
    fn token_parse() {
        assert_eq!(f32::parse_token("-9999.0"), Some(-9999.0));
        assert_eq!(i32::parse_token("42"), Some(42));
        assert_eq!(i32::parse_token("forty-two"), None);
        assert_eq!(bool::parse_token("0"), Some(false));
        assert_eq!(bool::parse_token("1"), Some(true));
    }

    #[test]
    fn binary_width_matches_native() {
        assert_eq!(f32::WIDTH, 4);
        assert_eq!(f64::WIDTH, 8);
        assert_eq!(i16::WIDTH, 2);
        assert_eq!(bool::WIDTH, 1);
    }

    #[test]
    fn binary_roundtrip_is_host_order() {
        let mut buf = Vec::new();
        1234.5_f32.write_to(&mut buf).unwrap();
        assert_eq!(buf, 1234.5_f32.to_ne_bytes());
        let back = f32::read_from(&mut buf.as_slice()).unwrap();
        assert_eq!(back, 1234.5);
    }
}
