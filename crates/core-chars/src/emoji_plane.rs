//! Low-plane (BMP) emoji ranges and the bitmap built over them.
//!
//! The table lists code points below U+10000 with emoji presentation or a
//! standard emoji variation sequence: legacy symbols, arrows, dingbats and
//! the Miscellaneous Symbols block. Supplementary-plane emoji are handled
//! wholesale by the recognizer (`U+1F000..=U+1FFFF`), so they need no table.

use once_cell::sync::Lazy;

/// Sorted, disjoint inclusive ranges of BMP emoji code points.
pub const LOW_PLANE_RANGES: &[(u32, u32)] = &[
    (0x00A9, 0x00A9), // copyright
    (0x00AE, 0x00AE), // registered
    (0x203C, 0x203C), // double exclamation
    (0x2049, 0x2049), // exclamation question
    (0x2122, 0x2122), // trade mark
    (0x2139, 0x2139), // information
    (0x2194, 0x2199), // bidirectional arrows
    (0x21A9, 0x21AA), // hooked arrows
    (0x231A, 0x231B), // watch, hourglass
    (0x2328, 0x2328), // keyboard
    (0x23CF, 0x23CF), // eject
    (0x23E9, 0x23F3), // media transport
    (0x23F8, 0x23FA), // pause, stop, record
    (0x24C2, 0x24C2), // circled M
    (0x25AA, 0x25AB), // small squares
    (0x25B6, 0x25B6), // play
    (0x25C0, 0x25C0), // reverse
    (0x25FB, 0x25FE), // medium squares
    (0x2600, 0x2604), // sun, cloud, umbrella, snowman, comet
    (0x260E, 0x260E), // telephone
    (0x2611, 0x2611), // ballot box with check
    (0x2614, 0x2615), // umbrella with rain, hot beverage
    (0x2618, 0x2618), // shamrock
    (0x261D, 0x261D), // index pointing up
    (0x2620, 0x2620), // skull and crossbones
    (0x2622, 0x2623), // radioactive, biohazard
    (0x2626, 0x2626), // orthodox cross
    (0x262A, 0x262A), // star and crescent
    (0x262E, 0x262F), // peace, yin yang
    (0x2638, 0x263A), // wheel of dharma, frowning/smiling face
    (0x2640, 0x2640), // female sign
    (0x2642, 0x2642), // male sign
    (0x2648, 0x2653), // zodiac
    (0x265F, 0x2660), // chess pawn, spade
    (0x2663, 0x2663), // club
    (0x2665, 0x2666), // heart, diamond
    (0x2668, 0x2668), // hot springs
    (0x267B, 0x267B), // recycling
    (0x267E, 0x267F), // infinity, wheelchair
    (0x2692, 0x2697), // tools, scales, alembic
    (0x2699, 0x2699), // gear
    (0x269B, 0x269C), // atom, fleur-de-lis
    (0x26A0, 0x26A1), // warning, high voltage
    (0x26A7, 0x26A7), // transgender symbol
    (0x26AA, 0x26AB), // circles
    (0x26B0, 0x26B1), // coffin, funeral urn
    (0x26BD, 0x26BE), // soccer, baseball
    (0x26C4, 0x26C5), // snowman, sun behind cloud
    (0x26C8, 0x26C8), // thunder cloud
    (0x26CE, 0x26CF), // ophiuchus, pick
    (0x26D1, 0x26D1), // rescue helmet
    (0x26D3, 0x26D4), // chains, no entry
    (0x26E9, 0x26EA), // shinto shrine, church
    (0x26F0, 0x26F5), // mountain .. sailboat
    (0x26F7, 0x26FA), // skier .. tent
    (0x26FD, 0x26FD), // fuel pump
    (0x2702, 0x2702), // scissors
    (0x2705, 0x2705), // check mark button
    (0x2708, 0x270D), // airplane .. writing hand
    (0x270F, 0x270F), // pencil
    (0x2712, 0x2712), // black nib
    (0x2714, 0x2714), // check mark
    (0x2716, 0x2716), // multiplication
    (0x271D, 0x271D), // latin cross
    (0x2721, 0x2721), // star of david
    (0x2728, 0x2728), // sparkles
    (0x2733, 0x2734), // eight-spoked asterisk, eight-pointed star
    (0x2744, 0x2744), // snowflake
    (0x2747, 0x2747), // sparkle
    (0x274C, 0x274C), // cross mark
    (0x274E, 0x274E), // cross mark button
    (0x2753, 0x2755), // question/exclamation ornaments
    (0x2757, 0x2757), // exclamation mark
    (0x2763, 0x2764), // heart ornaments
    (0x2795, 0x2797), // plus, minus, divide
    (0x27A1, 0x27A1), // right arrow
    (0x27B0, 0x27B0), // curly loop
    (0x27BF, 0x27BF), // double curly loop
    (0x2934, 0x2935), // curved arrows
    (0x2B05, 0x2B07), // left/up/down arrows
    (0x2B1B, 0x2B1C), // large squares
    (0x2B50, 0x2B50), // star
    (0x2B55, 0x2B55), // hollow red circle
    (0x3030, 0x3030), // wavy dash
    (0x303D, 0x303D), // part alternation mark
    (0x3297, 0x3297), // circled congratulations
    (0x3299, 0x3299), // circled secret
];

const BITMAP_WORDS: usize = 0x10000 / 64;

static LOW_PLANE_BITMAP: Lazy<Box<[u64]>> = Lazy::new(|| {
    debug_assert!(*crate::RANGES_SORTED, "low-plane table must be sorted");
    let mut bits = vec![0u64; BITMAP_WORDS].into_boxed_slice();
    for &(lo, hi) in LOW_PLANE_RANGES {
        for cp in lo..=hi {
            bits[(cp as usize) / 64] |= 1 << (cp % 64);
        }
    }
    bits
});

/// O(1) membership test for BMP code points. Callers must pass `cp < 0x10000`
/// for a meaningful answer; larger values return false.
pub fn is_low_plane_emoji(cp: u32) -> bool {
    if cp >= 0x10000 {
        return false;
    }
    LOW_PLANE_BITMAP[(cp as usize) / 64] & (1 << (cp % 64)) != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitmap_agrees_with_table() {
        for &(lo, hi) in LOW_PLANE_RANGES {
            for cp in lo..=hi {
                assert!(is_low_plane_emoji(cp), "U+{cp:04X} missing from bitmap");
            }
        }
        // Spot-check holes between ranges.
        for cp in [0x0041, 0x0023, 0x2005, 0x2612, 0x2706, 0x2B08] {
            assert!(!is_low_plane_emoji(cp), "U+{cp:04X} wrongly set");
        }
    }

    #[test]
    fn out_of_plane_is_false() {
        assert!(!is_low_plane_emoji(0x1F600));
        assert!(!is_low_plane_emoji(0x10FFFF));
    }
}
