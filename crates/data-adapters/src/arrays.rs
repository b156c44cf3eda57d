//! Binary and delimited array payloads from the coverage endpoints.
//!
//! Terrain surfaces arrive as NumPy `.npy` files (format versions 1 to 3)
//! holding a 2-D array; cross-sections arrive as a plain delimited list of
//! numbers.

use crate::error::AdapterError;
use crate::series::Grid;

const NPY_MAGIC: &[u8] = b"\x93NUMPY";

#[derive(Debug, Clone, Copy, PartialEq)]
enum DType {
    F4,
    F8,
    I2,
    I4,
}

impl DType {
    fn size(self) -> usize {
        match self {
            DType::I2 => 2,
            DType::F4 | DType::I4 => 4,
            DType::F8 => 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct NpyHeader {
    dtype: DType,
    big_endian: bool,
    fortran_order: bool,
    shape: Vec<usize>,
}

/// Parse a NumPy `.npy` body holding a 2-D array into a [`Grid`].
///
/// NaN cells become missing values. Fortran-ordered arrays are transposed
/// into row-major order.
pub fn parse_npy(body: &[u8]) -> Result<Grid, AdapterError> {
    if body.len() < 10 || &body[..6] != NPY_MAGIC {
        return Err(AdapterError::parse("npy", "missing NUMPY magic"));
    }

    let major = body[6];
    let (header_len, header_start) = match major {
        1 => (u16::from_le_bytes([body[8], body[9]]) as usize, 10),
        2 | 3 => {
            if body.len() < 12 {
                return Err(AdapterError::parse("npy", "truncated header length"));
            }
            (
                u32::from_le_bytes([body[8], body[9], body[10], body[11]]) as usize,
                12,
            )
        }
        v => return Err(AdapterError::parse("npy", format!("unsupported format version {}", v))),
    };

    let data_start = header_start + header_len;
    if body.len() < data_start {
        return Err(AdapterError::parse("npy", "truncated header"));
    }
    let header_text = std::str::from_utf8(&body[header_start..data_start])
        .map_err(|_| AdapterError::parse("npy", "header is not valid text"))?;
    let header = parse_header(header_text)?;

    let (rows, cols) = match header.shape.as_slice() {
        [rows, cols] => (*rows, *cols),
        other => {
            return Err(AdapterError::parse(
                "npy",
                format!("expected a 2-D array, got shape {:?}", other),
            ))
        }
    };

    let (count, expected) = rows
        .checked_mul(cols)
        .and_then(|n| Some((n, n.checked_mul(header.dtype.size())?)))
        .ok_or_else(|| {
            AdapterError::parse("npy", format!("shape ({}, {}) is too large", rows, cols))
        })?;
    let data = &body[data_start..];
    if data.len() < expected {
        return Err(AdapterError::parse(
            "npy",
            format!("expected {} data bytes, got {}", expected, data.len()),
        ));
    }

    let raw: Vec<f64> = data[..expected]
        .chunks_exact(header.dtype.size())
        .map(|chunk| decode(chunk, header.dtype, header.big_endian))
        .collect();

    let mut values = Vec::with_capacity(count);
    for r in 0..rows {
        for c in 0..cols {
            let v = if header.fortran_order {
                raw[c * rows + r]
            } else {
                raw[r * cols + c]
            };
            values.push(v.is_finite().then_some(v));
        }
    }

    Ok(Grid { rows, cols, values })
}

fn decode(chunk: &[u8], dtype: DType, big_endian: bool) -> f64 {
    macro_rules! read {
        ($t:ty, $n:expr) => {{
            let mut buf = [0u8; $n];
            buf.copy_from_slice(chunk);
            if big_endian {
                <$t>::from_be_bytes(buf) as f64
            } else {
                <$t>::from_le_bytes(buf) as f64
            }
        }};
    }
    match dtype {
        DType::F4 => read!(f32, 4),
        DType::F8 => read!(f64, 8),
        DType::I2 => read!(i16, 2),
        DType::I4 => read!(i32, 4),
    }
}

/// Parse the Python dict literal of an npy header, e.g.
/// `{'descr': '<f4', 'fortran_order': False, 'shape': (3, 4), }`.
fn parse_header(text: &str) -> Result<NpyHeader, AdapterError> {
    let descr = dict_value(text, "descr")
        .and_then(|v| v.trim().strip_prefix('\'').and_then(|v| v.split('\'').next()))
        .ok_or_else(|| AdapterError::parse("npy", "header has no descr"))?;

    if descr.len() < 3 {
        return Err(AdapterError::parse("npy", format!("unsupported descr '{}'", descr)));
    }
    let (endian, code) = descr.split_at(1);
    let big_endian = match endian {
        "<" | "|" | "=" => false,
        ">" => true,
        _ => return Err(AdapterError::parse("npy", format!("unsupported descr '{}'", descr))),
    };
    let dtype = match code {
        "f4" => DType::F4,
        "f8" => DType::F8,
        "i2" => DType::I2,
        "i4" => DType::I4,
        _ => return Err(AdapterError::parse("npy", format!("unsupported dtype '{}'", descr))),
    };

    let fortran_order = dict_value(text, "fortran_order")
        .map(|v| v.trim_start().starts_with("True"))
        .unwrap_or(false);

    let shape_text = dict_value(text, "shape")
        .and_then(|v| {
            let v = v.trim_start().strip_prefix('(')?;
            v.split(')').next()
        })
        .ok_or_else(|| AdapterError::parse("npy", "header has no shape"))?;

    let shape = shape_text
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| AdapterError::parse("npy", format!("invalid shape entry '{}'", s)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(NpyHeader {
        dtype,
        big_endian,
        fortran_order,
        shape,
    })
}

/// Text following `'key':` in the header dict.
fn dict_value<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    let needle = format!("'{}':", key);
    let start = text.find(&needle)? + needle.len();
    Some(&text[start..])
}

/// Parse a delimited 1-D array (commas, semicolons or whitespace).
pub fn parse_delimited(body: &[u8]) -> Result<Vec<Option<f64>>, AdapterError> {
    let text = std::str::from_utf8(body)
        .map_err(|_| AdapterError::parse("delimited", "body is not valid UTF-8"))?;

    text.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| {
            if token.eq_ignore_ascii_case("nan") {
                return Ok(None);
            }
            token
                .parse::<f64>()
                .map(|v| v.is_finite().then_some(v))
                .map_err(|_| AdapterError::parse("delimited", format!("invalid number '{}'", token)))
        })
        .collect()
}
