//! Tag bytes and range limits of the Hessian 2.0 grammar.

/// Null value.
pub const BC_NULL: u8 = b'N';
/// Boolean true.
pub const BC_TRUE: u8 = b'T';
/// Boolean false.
pub const BC_FALSE: u8 = b'F';

/// Full 32-bit int.
pub const BC_INT: u8 = b'I';
/// Single-byte int encoding zero; covers `0x80..=0xbf`.
pub const BC_INT_ZERO: u8 = 0x90;
/// Two-byte int encoding zero in the high bits; covers `0xc0..=0xcf`.
pub const BC_INT_BYTE_ZERO: u8 = 0xc8;
/// Three-byte int encoding zero in the high bits; covers `0xd0..=0xd7`.
pub const BC_INT_SHORT_ZERO: u8 = 0xd4;

/// Smallest int with a single-byte encoding.
pub const INT_DIRECT_MIN: i32 = -0x10;
/// Largest int with a single-byte encoding.
pub const INT_DIRECT_MAX: i32 = 0x2f;
/// Smallest int with a two-byte encoding.
pub const INT_BYTE_MIN: i32 = -0x800;
/// Largest int with a two-byte encoding.
pub const INT_BYTE_MAX: i32 = 0x7ff;
/// Smallest int with a three-byte encoding.
pub const INT_SHORT_MIN: i32 = -0x40000;
/// Largest int with a three-byte encoding.
pub const INT_SHORT_MAX: i32 = 0x3ffff;

/// Full 64-bit long.
pub const BC_LONG: u8 = b'L';
/// Long carried in 32 bits.
pub const BC_LONG_INT: u8 = 0x59;
/// Single-byte long encoding zero; covers `0xd8..=0xef`.
pub const BC_LONG_ZERO: u8 = 0xe0;
/// Two-byte long encoding zero in the high bits; covers `0xf0..=0xff`.
pub const BC_LONG_BYTE_ZERO: u8 = 0xf8;
/// Three-byte long encoding zero in the high bits; covers `0x38..=0x3f`.
pub const BC_LONG_SHORT_ZERO: u8 = 0x3c;

/// Smallest long with a single-byte encoding.
pub const LONG_DIRECT_MIN: i64 = -0x08;
/// Largest long with a single-byte encoding.
pub const LONG_DIRECT_MAX: i64 = 0x0f;
/// Smallest long with a two-byte encoding.
pub const LONG_BYTE_MIN: i64 = -0x800;
/// Largest long with a two-byte encoding.
pub const LONG_BYTE_MAX: i64 = 0x7ff;
/// Smallest long with a three-byte encoding.
pub const LONG_SHORT_MIN: i64 = -0x40000;
/// Largest long with a three-byte encoding.
pub const LONG_SHORT_MAX: i64 = 0x3ffff;

/// Full 64-bit IEEE double.
pub const BC_DOUBLE: u8 = b'D';
/// Double 0.0.
pub const BC_DOUBLE_ZERO: u8 = 0x5b;
/// Double 1.0.
pub const BC_DOUBLE_ONE: u8 = 0x5c;
/// Double carried as a signed byte.
pub const BC_DOUBLE_BYTE: u8 = 0x5d;
/// Double carried as a signed short.
pub const BC_DOUBLE_SHORT: u8 = 0x5e;
/// Double carried as a 32-bit count of thousandths.
pub const BC_DOUBLE_MILL: u8 = 0x5f;

/// Date as 64-bit UTC milliseconds.
pub const BC_DATE: u8 = b'J';
/// Date as 32-bit UTC minutes.
pub const BC_DATE_MINUTE: u8 = 0x4b;

/// Final string chunk with a two-byte length.
pub const BC_STRING: u8 = b'S';
/// Non-final string chunk.
pub const BC_STRING_CHUNK: u8 = b'R';
/// Short string, length in the low five bits; covers `0x00..=0x1f`.
pub const BC_STRING_DIRECT: u8 = 0x00;
/// Longest string with the single-byte header.
pub const STRING_DIRECT_MAX: usize = 0x1f;
/// Medium string, length high bits in the tag; covers `0x30..=0x33`.
pub const BC_STRING_SHORT: u8 = 0x30;
/// Longest string with the two-byte header.
pub const STRING_SHORT_MAX: usize = 0x3ff;

/// Final binary chunk with a two-byte length.
pub const BC_BINARY: u8 = b'B';
/// Non-final binary chunk.
pub const BC_BINARY_CHUNK: u8 = b'A';
/// Short binary, length in the low four bits; covers `0x20..=0x2f`.
pub const BC_BINARY_DIRECT: u8 = 0x20;
/// Longest binary with the single-byte header.
pub const BINARY_DIRECT_MAX: usize = 0x0f;
/// Medium binary, length high bits in the tag; covers `0x34..=0x37`.
pub const BC_BINARY_SHORT: u8 = 0x34;
/// Longest binary with the two-byte header.
pub const BINARY_SHORT_MAX: usize = 0x3ff;

/// Default maximum chunk length for strings and binary.
pub const DEFAULT_CHUNK_SIZE: usize = 0x8000;

/// Variable-length typed list, terminated by [`BC_END`].
pub const BC_LIST_VARIABLE: u8 = 0x55;
/// Fixed-length typed list.
pub const BC_LIST_FIXED: u8 = b'V';
/// Variable-length untyped list, terminated by [`BC_END`].
pub const BC_LIST_VARIABLE_UNTYPED: u8 = 0x57;
/// Fixed-length untyped list.
pub const BC_LIST_FIXED_UNTYPED: u8 = 0x58;
/// Short typed list, length in the low three bits; covers `0x70..=0x77`.
pub const BC_LIST_DIRECT: u8 = 0x70;
/// Short untyped list, length in the low three bits; covers `0x78..=0x7f`.
pub const BC_LIST_DIRECT_UNTYPED: u8 = 0x78;
/// Longest list with a single-byte header.
pub const LIST_DIRECT_MAX: usize = 0x07;

/// Typed map.
pub const BC_MAP: u8 = b'M';
/// Untyped map.
pub const BC_MAP_UNTYPED: u8 = b'H';

/// Class definition record.
pub const BC_OBJECT_DEF: u8 = b'C';
/// Object instance with an int definition index.
pub const BC_OBJECT: u8 = b'O';
/// Object instance, definition index in the low four bits; covers `0x60..=0x6f`.
pub const BC_OBJECT_DIRECT: u8 = 0x60;
/// Largest definition index with a single-byte object header.
pub const OBJECT_DIRECT_MAX: usize = 0x0f;

/// Back-reference to a previously seen list, map, or object.
pub const BC_REF: u8 = b'Q';
/// End of a variable-length list or a map.
pub const BC_END: u8 = b'Z';
