//! # Scan-line encoders
//!
//! One function per display mode, each turning one row of the frame buffer
//! into the words HSTX expands for that mode. These run in the scan-line IRQ
//! with a deadline of one scan-line, so they do nothing but table lookups,
//! shifts and stores. Anything that can be worked out in advance (the font,
//! the palette words, the line headers) already has been.

// -----------------------------------------------------------------------------
// Licence Statement
// -----------------------------------------------------------------------------
// Copyright (c) Jonathan 'theJPster' Pallant and the Neotron Developers, 2021
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <https://www.gnu.org/licenses/>.
// -----------------------------------------------------------------------------

// -----------------------------------------------------------------------------
// Imports
// -----------------------------------------------------------------------------

use super::font::{FontCache, GlyphLayout, GLYPH_ROW_MASK};
use super::mode::{DisplayMode, ModeGeometry, RGB111_BYTES_PER_CELL};
use super::palette::Palette;
use super::text::{ATTR_LOW_INTEN, ATTR_V_LOW_INTEN};
use crate::Error;

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// How many times each frame buffer pixel goes out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HRepeat {
	X1,
	X2,
	X4,
}

/// The encoder picked for the session, and what it needs to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEncoder {
	Rgb565(HRepeat),
	Palette8(HRepeat),
	TextMono,
	TextRgb111,
}

// -----------------------------------------------------------------------------
// Static and Const Data
// -----------------------------------------------------------------------------

/// Bit for each colour within an RGB111 line buffer byte. Red is bits 7:6,
/// green 4:3 and blue 1:0; these are the low bit of each field.
const CLUT_R: u32 = 1 << 6;
const CLUT_G: u32 = 1 << 3;
const CLUT_B: u32 = 1 << 0;

/// The eight text colours, by attribute value.
const COLOUR_LUT: [u32; 8] = [
	0,
	CLUT_R,
	CLUT_G,
	CLUT_R | CLUT_G,
	CLUT_B,
	CLUT_R | CLUT_B,
	CLUT_G | CLUT_B,
	CLUT_R | CLUT_G | CLUT_B,
];

/// Picks out one 2-bit pixel from each byte of a scrambled glyph row.
const PIXEL_LANES: u32 = 0x0303_0303;

/// Bytes inverted to draw the cursor: the glyph but not the gap after it.
const CURSOR_BYTES: usize = RGB111_BYTES_PER_CELL - 1;

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

impl HRepeat {
	pub const fn from_shift(shift: u8) -> Option<HRepeat> {
		match shift {
			0 => Some(HRepeat::X1),
			1 => Some(HRepeat::X2),
			2 => Some(HRepeat::X4),
			_ => None,
		}
	}
}

impl LineEncoder {
	/// Pick the encoder for a mode.
	///
	/// There is no direct 32-bit colour encoder, so `Rgb888` is refused.
	pub fn for_mode(mode: DisplayMode, geometry: &ModeGeometry) -> Result<LineEncoder, Error> {
		let repeat = HRepeat::from_shift(geometry.h_repeat_shift).ok_or(Error::UnsupportedMode)?;
		match mode {
			DisplayMode::Rgb565 => Ok(LineEncoder::Rgb565(repeat)),
			DisplayMode::Palette8 => Ok(LineEncoder::Palette8(repeat)),
			DisplayMode::TextMono => Ok(LineEncoder::TextMono),
			DisplayMode::TextRgb111 => Ok(LineEncoder::TextRgb111),
			DisplayMode::Rgb888 => Err(Error::UnsupportedMode),
		}
	}

	/// The font layout this encoder reads, if it draws text.
	pub const fn glyph_layout(&self) -> Option<GlyphLayout> {
		match self {
			LineEncoder::TextMono => Some(GlyphLayout::Mono),
			LineEncoder::TextRgb111 => Some(GlyphLayout::Rgb111),
			_ => None,
		}
	}
}

/// Encode one row of 16-bit pixels.
///
/// Two pixels go in each word, the left one in the low half.
#[inline(always)]
pub fn encode_rgb565(row: &[u8], dst: &mut [u32], repeat: HRepeat) {
	let pixels = row
		.chunks_exact(2)
		.map(|px| u16::from_ne_bytes([px[0], px[1]]) as u32);
	match repeat {
		HRepeat::X1 => {
			let mut pixels = pixels;
			for word in dst.iter_mut() {
				let left = pixels.next().unwrap_or(0);
				let right = pixels.next().unwrap_or(0);
				*word = left | (right << 16);
			}
		}
		HRepeat::X2 => {
			for (word, px) in dst.iter_mut().zip(pixels) {
				*word = px * 0x10001;
			}
		}
		HRepeat::X4 => {
			for (words, px) in dst.chunks_exact_mut(2).zip(pixels) {
				words.fill(px * 0x10001);
			}
		}
	}
}

/// Encode one row of palette indices.
///
/// Every pixel is a whole word, so repeating it is just writing it again.
#[inline(always)]
pub fn encode_palette8(row: &[u8], dst: &mut [u32], repeat: HRepeat, palette: &Palette) {
	let width = match repeat {
		HRepeat::X1 => 1,
		HRepeat::X2 => 2,
		HRepeat::X4 => 4,
	};
	for (words, index) in dst.chunks_exact_mut(width).zip(row.iter()) {
		words.fill(palette.word(*index));
	}
}

/// Encode one raster line of a mono text row.
///
/// `row` is one byte per cell, and each cell is one word.
#[inline(always)]
pub fn encode_text_mono(
	row: &[u8],
	dst: &mut [u32],
	font: &FontCache,
	sub_row: usize,
	cursor_col: Option<usize>,
) {
	for (word, ch) in dst.iter_mut().zip(row.iter()) {
		*word = font.row(*ch, sub_row);
	}
	if let Some(word) = cursor_col.and_then(|col| dst.get_mut(col)) {
		*word ^= GLYPH_ROW_MASK;
	}
}

/// Colour one RGB111 cell: four words, four pixels per word.
///
/// Only the first two bytes of the last word are real (the thirteenth pixel
/// and the gap), which is why cells pack into three and a half words.
#[inline(always)]
fn rgb111_cell(font: &FontCache, ch: u8, attr: u8, sub_row: usize) -> [u32; 4] {
	let mut bits = font.row(ch, sub_row);
	if attr & ATTR_LOW_INTEN != 0 {
		bits &= 0xaaaa_aaaa;
	}
	if attr & ATTR_V_LOW_INTEN == ATTR_V_LOW_INTEN {
		bits >>= 1;
	}
	let bg = COLOUR_LUT[((attr >> 3) & 7) as usize];
	let colour = COLOUR_LUT[(attr & 7) as usize] ^ bg;
	let bg_xor = bg * PIXEL_LANES;
	[
		(colour * ((bits >> 6) & PIXEL_LANES)) ^ bg_xor,
		(colour * ((bits >> 4) & PIXEL_LANES)) ^ bg_xor,
		(colour * ((bits >> 2) & PIXEL_LANES)) ^ bg_xor,
		(colour * (bits & PIXEL_LANES)) ^ bg_xor,
	]
}

/// Encode one raster line of a colour text row.
///
/// `row` holds a glyph byte then an attribute byte for each cell. Each cell
/// is 14 bytes of line buffer, so cells are done two at a time: seven words.
#[inline(always)]
pub fn encode_text_rgb111(
	row: &[u8],
	dst: &mut [u32],
	font: &FontCache,
	sub_row: usize,
	cursor_col: Option<usize>,
) {
	let mut out = dst.iter_mut();
	let mut put = |value: u32| {
		if let Some(word) = out.next() {
			*word = value;
		}
	};
	for cells in row.chunks(4) {
		let first = rgb111_cell(font, cells[0], cells.get(1).copied().unwrap_or(0), sub_row);
		put(first[0]);
		put(first[1]);
		put(first[2]);
		if cells.len() < 4 {
			put(first[3]);
			break;
		}
		let second = rgb111_cell(font, cells[2], cells[3], sub_row);
		let mut tail = first[3];
		for value in second {
			put((tail & 0xffff) | (value << 16));
			tail = value >> 16;
		}
	}

	let cells = row.len() / 2;
	if let Some(col) = cursor_col.filter(|col| *col < cells) {
		let start = col * RGB111_BYTES_PER_CELL;
		for byte in start..start + CURSOR_BYTES {
			if let Some(word) = dst.get_mut(byte / 4) {
				*word ^= 0xff << ((byte % 4) * 8);
			}
		}
	}
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------


// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
