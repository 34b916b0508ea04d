//! Wire grammar for Hessian scalars: ints, longs, doubles, dates, strings and
//! binary blobs.
//!
//! Writers pick the shortest form a value fits in. Readers are handed the tag
//! byte the decoder already consumed and read whatever width that tag implies.
//!
//! Strings are measured in UTF-16 code units and every code unit is written as
//! a one to three byte sequence, which is how JVM Hessian peers read and write
//! them. Supplementary characters therefore travel as surrogate pairs.

use crate::constants::*;
use crate::data_input::WireSource;
use crate::data_output::WireSink;
use crate::error::{HessianError, Result};

/// Builds a [`HessianError::MalformedTag`] for a tag the input just yielded.
pub(crate) fn malformed<R: WireSource + ?Sized>(input: &R, tag: u8) -> HessianError {
    HessianError::MalformedTag {
        tag,
        offset: input.position().saturating_sub(1),
    }
}

/// Returns true if `tag` starts an int.
pub fn is_int_tag(tag: u8) -> bool {
    matches!(tag, 0x80..=0xd7 | BC_INT)
}

/// Returns true if `tag` starts a long.
pub fn is_long_tag(tag: u8) -> bool {
    matches!(tag, 0xd8..=0xff | 0x38..=0x3f | BC_LONG_INT | BC_LONG)
}

/// Returns true if `tag` starts a string.
pub fn is_string_tag(tag: u8) -> bool {
    matches!(tag, 0x00..=0x1f | 0x30..=0x33 | BC_STRING | BC_STRING_CHUNK)
}

/// Writes a null.
pub fn write_null<W: WireSink + ?Sized>(out: &mut W) {
    out.write_u8(BC_NULL);
}

/// Writes a boolean.
pub fn write_bool<W: WireSink + ?Sized>(out: &mut W, value: bool) {
    out.write_u8(if value { BC_TRUE } else { BC_FALSE });
}

/// Writes a 32-bit int in its shortest form.
pub fn write_int<W: WireSink + ?Sized>(out: &mut W, value: i32) {
    if (INT_DIRECT_MIN..=INT_DIRECT_MAX).contains(&value) {
        out.write_u8((value + BC_INT_ZERO as i32) as u8);
    } else if (INT_BYTE_MIN..=INT_BYTE_MAX).contains(&value) {
        out.write_u8((BC_INT_BYTE_ZERO as i32 + (value >> 8)) as u8);
        out.write_u8(value as u8);
    } else if (INT_SHORT_MIN..=INT_SHORT_MAX).contains(&value) {
        out.write_u8((BC_INT_SHORT_ZERO as i32 + (value >> 16)) as u8);
        out.write_u16(value as u16);
    } else {
        out.write_u8(BC_INT);
        out.write_i32(value);
    }
}

/// Reads the int introduced by `tag`.
pub fn read_int<R: WireSource + ?Sized>(input: &mut R, tag: u8) -> Result<i32> {
    match tag {
        0x80..=0xbf => Ok(tag as i32 - BC_INT_ZERO as i32),
        0xc0..=0xcf => {
            let high = (tag as i32 - BC_INT_BYTE_ZERO as i32) << 8;
            Ok(high + input.read_u8()? as i32)
        }
        0xd0..=0xd7 => {
            let high = (tag as i32 - BC_INT_SHORT_ZERO as i32) << 16;
            Ok(high + input.read_u16()? as i32)
        }
        BC_INT => input.read_i32(),
        _ => Err(malformed(input, tag)),
    }
}

/// Writes a 64-bit long in its shortest form.
pub fn write_long<W: WireSink + ?Sized>(out: &mut W, value: i64) {
    if (LONG_DIRECT_MIN..=LONG_DIRECT_MAX).contains(&value) {
        out.write_u8((value + BC_LONG_ZERO as i64) as u8);
    } else if (LONG_BYTE_MIN..=LONG_BYTE_MAX).contains(&value) {
        out.write_u8((BC_LONG_BYTE_ZERO as i64 + (value >> 8)) as u8);
        out.write_u8(value as u8);
    } else if (LONG_SHORT_MIN..=LONG_SHORT_MAX).contains(&value) {
        out.write_u8((BC_LONG_SHORT_ZERO as i64 + (value >> 16)) as u8);
        out.write_u16(value as u16);
    } else if let Ok(narrow) = i32::try_from(value) {
        out.write_u8(BC_LONG_INT);
        out.write_i32(narrow);
    } else {
        out.write_u8(BC_LONG);
        out.write_i64(value);
    }
}

/// Reads the long introduced by `tag`.
pub fn read_long<R: WireSource + ?Sized>(input: &mut R, tag: u8) -> Result<i64> {
    match tag {
        0xd8..=0xef => Ok(tag as i64 - BC_LONG_ZERO as i64),
        0xf0..=0xff => {
            let high = (tag as i64 - BC_LONG_BYTE_ZERO as i64) << 8;
            Ok(high + input.read_u8()? as i64)
        }
        0x38..=0x3f => {
            let high = (tag as i64 - BC_LONG_SHORT_ZERO as i64) << 16;
            Ok(high + input.read_u16()? as i64)
        }
        BC_LONG_INT => Ok(input.read_i32()? as i64),
        BC_LONG => input.read_i64(),
        _ => Err(malformed(input, tag)),
    }
}

/// Writes a double.
///
/// With `compact` set, whole numbers in short range and values that are an
/// exact count of thousandths use the short forms. Negative zero always takes
/// the full form so its sign survives.
pub fn write_double<W: WireSink + ?Sized>(out: &mut W, value: f64, compact: bool) {
    let negative_zero = value == 0.0 && value.is_sign_negative();
    if compact && !negative_zero {
        let int_value = value as i32;
        if int_value as f64 == value {
            match int_value {
                0 => return out.write_u8(BC_DOUBLE_ZERO),
                1 => return out.write_u8(BC_DOUBLE_ONE),
                -0x80..=0x7f => {
                    out.write_u8(BC_DOUBLE_BYTE);
                    return out.write_u8(int_value as u8);
                }
                -0x8000..=0x7fff => {
                    out.write_u8(BC_DOUBLE_SHORT);
                    return out.write_u16(int_value as u16);
                }
                _ => {}
            }
        }
        let mills = (value * 1000.0) as i32;
        if 0.001 * mills as f64 == value {
            out.write_u8(BC_DOUBLE_MILL);
            return out.write_i32(mills);
        }
    }
    out.write_u8(BC_DOUBLE);
    out.write_f64(value);
}

/// Reads the double introduced by `tag`.
pub fn read_double<R: WireSource + ?Sized>(input: &mut R, tag: u8) -> Result<f64> {
    match tag {
        BC_DOUBLE_ZERO => Ok(0.0),
        BC_DOUBLE_ONE => Ok(1.0),
        BC_DOUBLE_BYTE => Ok(input.read_u8()? as i8 as f64),
        BC_DOUBLE_SHORT => Ok(input.read_u16()? as i16 as f64),
        BC_DOUBLE_MILL => Ok(0.001 * input.read_i32()? as f64),
        BC_DOUBLE => input.read_f64(),
        _ => Err(malformed(input, tag)),
    }
}

/// Writes a UTC instant given in milliseconds since the epoch.
pub fn write_date<W: WireSink + ?Sized>(out: &mut W, millis: i64) {
    if millis % 60_000 == 0 {
        if let Ok(minutes) = i32::try_from(millis / 60_000) {
            out.write_u8(BC_DATE_MINUTE);
            return out.write_i32(minutes);
        }
    }
    out.write_u8(BC_DATE);
    out.write_i64(millis);
}

/// Reads the date introduced by `tag` as milliseconds since the epoch.
pub fn read_date<R: WireSource + ?Sized>(input: &mut R, tag: u8) -> Result<i64> {
    match tag {
        BC_DATE => input.read_i64(),
        BC_DATE_MINUTE => Ok(input.read_i32()? as i64 * 60_000),
        _ => Err(malformed(input, tag)),
    }
}

fn write_string_header<W: WireSink + ?Sized>(out: &mut W, len: usize) {
    if len <= STRING_DIRECT_MAX {
        out.write_u8(BC_STRING_DIRECT + len as u8);
    } else if len <= STRING_SHORT_MAX {
        out.write_u8(BC_STRING_SHORT + (len >> 8) as u8);
        out.write_u8(len as u8);
    } else {
        out.write_chunk_header(BC_STRING, len as u16);
    }
}

fn write_units<W: WireSink + ?Sized>(out: &mut W, units: &[u16]) {
    for &unit in units {
        if unit < 0x80 {
            out.write_u8(unit as u8);
        } else if unit < 0x800 {
            out.write_u8(0xc0 | (unit >> 6) as u8);
            out.write_u8(0x80 | (unit & 0x3f) as u8);
        } else {
            out.write_u8(0xe0 | (unit >> 12) as u8);
            out.write_u8(0x80 | ((unit >> 6) & 0x3f) as u8);
            out.write_u8(0x80 | (unit & 0x3f) as u8);
        }
    }
}

/// Writes a string, splitting it into chunks of at most `chunk_size` code
/// units. `chunk_size` must be between 2 and `0xFFFF`.
pub fn write_string<W: WireSink + ?Sized>(out: &mut W, value: &str, chunk_size: usize) {
    if value.is_ascii() {
        let mut rest = value.as_bytes();
        while rest.len() > chunk_size {
            let (head, tail) = rest.split_at(chunk_size);
            out.write_chunk_header(BC_STRING_CHUNK, head.len() as u16);
            out.write_bytes(head);
            rest = tail;
        }
        write_string_header(out, rest.len());
        out.write_bytes(rest);
        return;
    }

    let units: Vec<u16> = value.encode_utf16().collect();
    let mut rest = &units[..];
    while rest.len() > chunk_size {
        let mut sublen = chunk_size;
        // a chunk never ends on a high surrogate
        if (0xd800..=0xdbff).contains(&rest[sublen - 1]) {
            sublen -= 1;
        }
        out.write_chunk_header(BC_STRING_CHUNK, sublen as u16);
        write_units(out, &rest[..sublen]);
        rest = &rest[sublen..];
    }
    write_string_header(out, rest.len());
    write_units(out, rest);
}

fn continuation<R: WireSource + ?Sized>(input: &mut R) -> Result<u32> {
    let byte = input.read_u8()?;
    if byte & 0xc0 != 0x80 {
        return Err(HessianError::InvalidString(format!(
            "invalid continuation byte 0x{:02x} at offset {}",
            byte,
            input.position() - 1
        )));
    }
    Ok((byte & 0x3f) as u32)
}

fn read_units<R: WireSource + ?Sized>(input: &mut R, len: usize, units: &mut Vec<u16>) -> Result<()> {
    units.reserve(len.min(input.remaining()));
    let target = units.len() + len;
    while units.len() < target {
        let lead = input.read_u8()?;
        if lead < 0x80 {
            units.push(lead as u16);
        } else if lead & 0xe0 == 0xc0 {
            let unit = ((lead & 0x1f) as u32) << 6 | continuation(input)?;
            units.push(unit as u16);
        } else if lead & 0xf0 == 0xe0 {
            let unit = ((lead & 0x0f) as u32) << 12 | continuation(input)? << 6 | continuation(input)?;
            units.push(unit as u16);
        } else if lead & 0xf8 == 0xf0 {
            // four-byte UTF-8 from non-JVM writers; counts as a surrogate pair
            let code = ((lead & 0x07) as u32) << 18
                | continuation(input)? << 12
                | continuation(input)? << 6
                | continuation(input)?;
            let ch = char::from_u32(code).ok_or_else(|| {
                HessianError::InvalidString(format!("invalid code point U+{:X}", code))
            })?;
            let mut pair = [0u16; 2];
            units.extend_from_slice(ch.encode_utf16(&mut pair));
        } else {
            return Err(HessianError::InvalidString(format!(
                "invalid lead byte 0x{:02x} at offset {}",
                lead,
                input.position() - 1
            )));
        }
    }
    Ok(())
}

/// Reads the string introduced by `tag`, following chunks until the final one.
pub fn read_string<R: WireSource + ?Sized>(input: &mut R, tag: u8) -> Result<String> {
    let mut units = Vec::new();
    let mut tag = tag;
    loop {
        let (len, last) = match tag {
            0x00..=0x1f => ((tag - BC_STRING_DIRECT) as usize, true),
            0x30..=0x33 => {
                let high = ((tag - BC_STRING_SHORT) as usize) << 8;
                (high + input.read_u8()? as usize, true)
            }
            BC_STRING => (input.read_u16()? as usize, true),
            BC_STRING_CHUNK => (input.read_u16()? as usize, false),
            _ => return Err(malformed(input, tag)),
        };
        read_units(input, len, &mut units)?;
        if last {
            break;
        }
        tag = input.read_u8()?;
    }
    String::from_utf16(&units).map_err(|e| HessianError::InvalidString(e.to_string()))
}

/// Writes a binary blob, splitting it into chunks of at most `chunk_size`
/// bytes.
pub fn write_binary<W: WireSink + ?Sized>(out: &mut W, value: &[u8], chunk_size: usize) {
    let mut rest = value;
    while rest.len() > chunk_size {
        let (head, tail) = rest.split_at(chunk_size);
        out.write_chunk_header(BC_BINARY_CHUNK, head.len() as u16);
        out.write_bytes(head);
        rest = tail;
    }
    let len = rest.len();
    if len <= BINARY_DIRECT_MAX {
        out.write_u8(BC_BINARY_DIRECT + len as u8);
    } else if len <= BINARY_SHORT_MAX {
        out.write_u8(BC_BINARY_SHORT + (len >> 8) as u8);
        out.write_u8(len as u8);
    } else {
        out.write_chunk_header(BC_BINARY, len as u16);
    }
    out.write_bytes(rest);
}

/// Reads the binary blob introduced by `tag`, following chunks until the
/// final one.
pub fn read_binary<R: WireSource + ?Sized>(input: &mut R, tag: u8) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    let mut tag = tag;
    loop {
        let (len, last) = match tag {
            0x20..=0x2f => ((tag - BC_BINARY_DIRECT) as usize, true),
            0x34..=0x37 => {
                let high = ((tag - BC_BINARY_SHORT) as usize) << 8;
                (high + input.read_u8()? as usize, true)
            }
            BC_BINARY => (input.read_u16()? as usize, true),
            BC_BINARY_CHUNK => (input.read_u16()? as usize, false),
            _ => return Err(malformed(input, tag)),
        };
        data.extend_from_slice(input.read_bytes(len)?);
        if last {
            break;
        }
        tag = input.read_u8()?;
    }
    Ok(data)
}
