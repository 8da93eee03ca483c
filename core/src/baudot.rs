//! Baudot / ITA2 character code
//!
//! Two 32-entry tables indexed by the 5-bit code. The figures table follows
//! the US-TTY assignments. Two positions act as shift controls and hold the
//! same control character in both tables.

use crate::error::{Result, RttyError};

/// Control character standing for the Figures-shift code
pub const FIGURES_SHIFT: char = '\x0f';

/// Control character standing for the Letters-shift code
pub const LETTERS_SHIFT: char = '\x0e';

/// Code that switches the receiver to the Figures table
pub const FIGURES_SHIFT_CODE: u8 = 27;

/// Code that switches the receiver to the Letters table
pub const LETTERS_SHIFT_CODE: u8 = 31;

/// Mask keeping a value within the 5-bit code space
pub const CODE_MASK: u8 = 0x1F;

pub const LETTERS: [char; 32] = [
    '\0', 'E', '\n', 'A', ' ', 'S', 'I', 'U',
    '\r', 'D', 'R', 'J', 'N', 'F', 'C', 'K',
    'T', 'Z', 'L', 'W', 'H', 'Y', 'P', 'Q',
    'O', 'B', 'G', FIGURES_SHIFT, 'M', 'X', 'V', LETTERS_SHIFT,
];

pub const FIGURES: [char; 32] = [
    '\0', '3', '\n', '-', ' ', '\x07', '8', '7',
    '\r', '$', '4', '\'', ',', '!', ':', '(',
    '5', '"', ')', '2', '#', '6', '0', '1',
    '9', '?', '&', FIGURES_SHIFT, '.', '/', ';', LETTERS_SHIFT,
];

/// Which of the two tables is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShiftState {
    #[default]
    Letters,
    Figures,
}

impl ShiftState {
    pub fn table(self) -> &'static [char; 32] {
        match self {
            ShiftState::Letters => &LETTERS,
            ShiftState::Figures => &FIGURES,
        }
    }
}

/// Code of `ch` in the given table, if present
pub fn encode(ch: char, shift: ShiftState) -> Option<u8> {
    shift
        .table()
        .iter()
        .position(|&c| c == ch)
        .map(|code| code as u8)
}

/// Character at `code` in the given table (code is masked to 5 bits)
pub fn decode(code: u8, shift: ShiftState) -> char {
    shift.table()[(code & CODE_MASK) as usize]
}

/// Characters sent without a shift to Figures
fn is_letters_only(ch: char) -> bool {
    ch.is_ascii_uppercase() || matches!(ch, ' ' | '\r' | '\n')
}

/// Convert text into the code sequence to transmit
///
/// Text is upper-cased first. Every character outside A–Z, space, CR and LF
/// is wrapped in its own Figures-shift / Letters-shift pair, so the
/// sequence always starts and ends in the Letters table.
pub fn encode_text(text: &str) -> Result<Vec<u8>> {
    let mut codes = Vec::with_capacity(text.len());
    for ch in text.to_uppercase().chars() {
        if is_letters_only(ch) {
            codes.push(encode(ch, ShiftState::Letters).ok_or(RttyError::UnsupportedCharacter(ch))?);
        } else {
            let code = encode(ch, ShiftState::Figures).ok_or(RttyError::UnsupportedCharacter(ch))?;
            codes.push(FIGURES_SHIFT_CODE);
            codes.push(code);
            codes.push(LETTERS_SHIFT_CODE);
        }
    }
    Ok(codes)
}

/// Receiver-side shift tracking
///
/// Turns a stream of codes back into characters. Shift codes only switch the
/// active table. Carriage returns and the all-space NUL code are dropped; NUL
/// is what a false start on a dying carrier reads as.
#[derive(Debug, Clone, Default)]
pub struct ShiftTracker {
    shift: ShiftState,
}

impl ShiftTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shift(&self) -> ShiftState {
        self.shift
    }

    /// Feed one received code; returns the character to emit, if any
    pub fn push(&mut self, code: u8) -> Option<char> {
        match decode(code, self.shift) {
            FIGURES_SHIFT => {
                self.shift = ShiftState::Figures;
                None
            }
            LETTERS_SHIFT => {
                self.shift = ShiftState::Letters;
                None
            }
            '\r' | '\0' => None,
            ch => Some(ch),
        }
    }

    pub fn reset(&mut self) {
        self.shift = ShiftState::Letters;
    }
}
