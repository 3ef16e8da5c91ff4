//! Deterministic span colors.

use crate::geometry::Color;

/// Span fill colors.
pub const PALETTE: [Color; 7] = [
    Color::rgb(0x04, 0x9c, 0xdb),
    Color::rgb(0x46, 0xa5, 0x46),
    Color::rgb(0x9d, 0x26, 0x1d),
    Color::rgb(0xff, 0xc4, 0x0d),
    Color::rgb(0xf8, 0x94, 0x06),
    Color::rgb(0xc3, 0x32, 0x5f),
    Color::rgb(0x7a, 0x43, 0xb6),
];

/// 31-multiplier string hash over UTF-16 code units, wrapping at 32 bits.
pub fn name_hash(name: &str) -> i32 {
    name.encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

/// Palette entry for a span name. The same name always maps to the same
/// color.
pub fn color_for_name(name: &str) -> Color {
    let index = name_hash(name).rem_euclid(PALETTE.len() as i32) as usize;
    PALETTE[index]
}
