//! Grade-1 braille letters. Bit `i` of a mask is dot `i + 1`.

use crate::constants::DOT_MASK;

const LETTERS: [(char, u8); 26] = [
    ('a', 0b000001),
    ('b', 0b000011),
    ('c', 0b001001),
    ('d', 0b011001),
    ('e', 0b010001),
    ('f', 0b001011),
    ('g', 0b011011),
    ('h', 0b010011),
    ('i', 0b001010),
    ('j', 0b011010),
    ('k', 0b000101),
    ('l', 0b000111),
    ('m', 0b001101),
    ('n', 0b011101),
    ('o', 0b010101),
    ('p', 0b001111),
    ('q', 0b011111),
    ('r', 0b010111),
    ('s', 0b001110),
    ('t', 0b011110),
    ('u', 0b100101),
    ('v', 0b100111),
    ('w', 0b111010),
    ('x', 0b101101),
    ('y', 0b111101),
    ('z', 0b110101),
];

/// Character for a chorded mask, if it is a letter.
pub fn dot_to_char(mask: u8) -> Option<char> {
    let mask = mask & DOT_MASK;
    LETTERS.iter().find(|(_, m)| *m == mask).map(|(c, _)| *c)
}

/// Mask for a letter (case-insensitive). Anything else has no cell.
pub fn char_to_mask(c: char) -> Option<u8> {
    let c = c.to_ascii_lowercase();
    LETTERS.iter().find(|(l, _)| *l == c).map(|(_, m)| *m)
}

/// Cells for `text`; characters without a letter cell render blank.
pub fn cells_for_text(text: &str) -> Vec<u8> {
    text.chars().map(|c| char_to_mask(c).unwrap_or(0)).collect()
}

/// Raised dots in a cell, the live density for a reading point over it.
pub fn raised_count(mask: u8) -> i32 {
    (mask & DOT_MASK).count_ones() as i32
}
