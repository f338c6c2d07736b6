//! # Glyphs for the text modes
//!
//! Fonts are described the way LVGL does it: a packed 2-bit-per-pixel bitmap
//! plus, for every glyph, a bounding box and an offset from the baseline. The
//! built-in font is the classic 8x8 ASCII set from `font8x8`, stretched to a
//! 12x16 box (columns widened 3:2, rows doubled) so it sits comfortably in
//! our 13x24 glyph cell.
//!
//! Pulling one row out of a glyph takes a fair bit of shifting and masking,
//! so at start-up we render every row of every printable character once, put
//! it through whatever bit shuffle the display mode's HSTX lane set-up needs,
//! and keep the result in a `FontCache`. The scan-line IRQ then does a single
//! table lookup per character cell.

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

use alloc::vec::Vec;

use font8x8::legacy::BASIC_LEGACY;

use crate::Error;

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// Where one glyph lives in the font bitmap, and how it sits in the cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphDesc {
	/// Byte offset of the glyph's first pixel in `Font::bitmap`.
	pub bitmap_index: u32,
	/// Width of the glyph's bounding box, in pixels.
	pub box_w: u8,
	/// Height of the glyph's bounding box, in pixels.
	pub box_h: u8,
	/// Pixels from the left of the cell to the left of the box.
	pub ofs_x: i8,
	/// Pixels from the baseline up to the bottom of the box.
	pub ofs_y: i8,
}

/// A 2-bit-per-pixel proportional font covering printable ASCII.
///
/// Glyph bitmaps are packed with no padding between rows, most significant
/// bits first. The bitmap must have at least three spare bytes at the end, as
/// rows are fetched four bytes at a time.
pub struct Font<'a> {
	/// Height of a text line, in pixels.
	pub line_height: u8,
	/// Pixels from the bottom of the line up to the baseline.
	pub base_line: u8,
	/// One entry per character, starting at `FIRST_GLYPH`.
	pub glyphs: &'a [GlyphDesc],
	pub bitmap: &'a [u8],
}

/// The order HSTX wants a glyph row's pixels in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphLayout {
	/// As rendered: 13 2-bit pixels, first pixel in bits 25:24.
	Mono,
	/// Pre-scrambled so that `(bits >> n) & 0x0303_0303` gives four pixels,
	/// one per byte, for n = 6, 4, 2 and 0.
	Rgb111,
}

/// Every row of every printable glyph, rendered and laid out for HSTX.
pub struct FontCache {
	rows: Vec<u32>,
}

// -----------------------------------------------------------------------------
// Static and Const Data
// -----------------------------------------------------------------------------

/// Raster lines in a character cell.
pub const FONT_HEIGHT: usize = 24;

/// Widest glyph row we can hold in a 32-bit word, in pixels.
pub const MAX_GLYPH_WIDTH: u8 = 13;

/// The bits a rendered glyph row can occupy.
pub const GLYPH_ROW_MASK: u32 = 0x03ff_ffff;

/// First character in the font (space).
pub const FIRST_GLYPH: u8 = 0x20;

/// Number of characters in the font (space to tilde).
pub const NUM_GLYPHS: usize = 95;

/// Size of the stretched 8x8 glyphs.
const BUILTIN_BOX_W: usize = 12;
const BUILTIN_BOX_H: usize = 16;

/// Bytes per stretched glyph. 12x16 pixels at 2 bits each.
const BUILTIN_GLYPH_BYTES: usize = BUILTIN_BOX_W * BUILTIN_BOX_H / 4;

/// Padding so the last row of the last glyph can be fetched as a whole word.
const BITMAP_PADDING: usize = 4;

static BUILTIN_BITMAP: [u8; NUM_GLYPHS * BUILTIN_GLYPH_BYTES + BITMAP_PADDING] =
	stretch_font8x8();

static BUILTIN_GLYPHS: [GlyphDesc; NUM_GLYPHS] = builtin_glyphs();

/// The font the text modes use.
///
/// Glyph rows 0..16 land on cell rows 4..20, leaving room above for accents
/// and below for the cursor.
pub static BUILTIN_FONT: Font<'static> = Font {
	line_height: FONT_HEIGHT as u8,
	base_line: 5,
	glyphs: &BUILTIN_GLYPHS,
	bitmap: &BUILTIN_BITMAP,
};

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

/// Widen each 8x8 glyph to 12 columns (every other column doubled) and double
/// every row, at full intensity.
const fn stretch_font8x8() -> [u8; NUM_GLYPHS * BUILTIN_GLYPH_BYTES + BITMAP_PADDING] {
	let mut out = [0u8; NUM_GLYPHS * BUILTIN_GLYPH_BYTES + BITMAP_PADDING];
	let mut glyph = 0;
	while glyph < NUM_GLYPHS {
		let source = BASIC_LEGACY[FIRST_GLYPH as usize + glyph];
		let mut row = 0;
		while row < BUILTIN_BOX_H {
			let bits = source[row / 2];
			let mut col = 0;
			while col < BUILTIN_BOX_W {
				// font8x8 puts the leftmost pixel in bit 0
				if (bits >> ((col * 2) / 3)) & 1 != 0 {
					let pixel = glyph * BUILTIN_BOX_W * BUILTIN_BOX_H + row * BUILTIN_BOX_W + col;
					out[pixel / 4] |= 0b11 << (6 - 2 * (pixel % 4));
				}
				col += 1;
			}
			row += 1;
		}
		glyph += 1;
	}
	out
}

const fn builtin_glyphs() -> [GlyphDesc; NUM_GLYPHS] {
	let mut out = [GlyphDesc {
		bitmap_index: 0,
		box_w: BUILTIN_BOX_W as u8,
		box_h: BUILTIN_BOX_H as u8,
		ofs_x: 0,
		ofs_y: -1,
	}; NUM_GLYPHS];
	let mut glyph = 0;
	while glyph < NUM_GLYPHS {
		out[glyph].bitmap_index = (glyph * BUILTIN_GLYPH_BYTES) as u32;
		glyph += 1;
	}
	out
}

impl<'a> Font<'a> {
	/// Render one row of one character.
	///
	/// Returns 13 2-bit pixels, the first (leftmost) in bits 25:24. Rows
	/// outside the glyph's box, and characters the font doesn't have, are
	/// blank. Glyphs wider than 13 pixels are clipped.
	pub fn render_char_line(&self, c: u8, y: usize) -> u32 {
		let Some(glyph) = c
			.checked_sub(FIRST_GLYPH)
			.and_then(|idx| self.glyphs.get(idx as usize))
		else {
			return 0;
		};
		if glyph.box_w == 0 {
			return 0;
		}

		// Row within the glyph's box
		let ey = y as i32 - self.line_height as i32
			+ self.base_line as i32
			+ glyph.ofs_y as i32
			+ glyph.box_h as i32;
		if ey < 0 || ey >= glyph.box_h as i32 {
			return 0;
		}

		// Pixel index of the start of the row, from the start of the glyph
		let bi = glyph.box_w as usize * ey as usize;
		let start = glyph.bitmap_index as usize + (bi >> 2);
		let mut word = [0u8; 4];
		for (dst, src) in word.iter_mut().zip(self.bitmap.iter().skip(start)) {
			*dst = *src;
		}
		let mut bits = u32::from_be_bytes(word);

		// Move the row's first pixel down to bits 25:24
		bits >>= 6 - ((bi & 3) << 1);

		// Drop anything past the end of the row
		let width = glyph.box_w.min(MAX_GLYPH_WIDTH) as u32;
		bits &= GLYPH_ROW_MASK & (GLYPH_ROW_MASK << ((MAX_GLYPH_WIDTH as u32 - width) << 1));

		// Offset within the cell
		let ofs_x = glyph.ofs_x.max(0) as u32;
		if ofs_x >= MAX_GLYPH_WIDTH as u32 {
			0
		} else {
			bits >> (ofs_x << 1)
		}
	}
}

/// Re-order a rendered glyph row for the RGB111 text mode.
///
/// Pixel `k` (0 is leftmost) moves to bits `6 - 2*(k/4) + 8*(k%4)`, so the
/// encoder can pick out four pixels at a time, one per byte, by shifting
/// down 6, 4, 2 and then 0 bits and masking with `0x0303_0303`.
pub const fn scramble_rgb111(bits: u32) -> u32 {
	let mut out = 0;
	let mut pixel = 0;
	while pixel < MAX_GLYPH_WIDTH as u32 {
		let src = 24 - 2 * pixel;
		let dst = 6 - 2 * (pixel / 4) + 8 * (pixel % 4);
		out |= ((bits >> src) & 0b11) << dst;
		pixel += 1;
	}
	out
}

impl GlyphLayout {
	fn apply(self, bits: u32) -> u32 {
		match self {
			GlyphLayout::Mono => bits,
			GlyphLayout::Rgb111 => scramble_rgb111(bits),
		}
	}
}

impl FontCache {
	/// Render the whole font.
	pub fn try_new(font: &Font<'_>, layout: GlyphLayout) -> Result<FontCache, Error> {
		let mut rows = Vec::new();
		rows.try_reserve_exact(NUM_GLYPHS * FONT_HEIGHT)
			.map_err(|_| Error::OutOfMemory)?;
		for idx in 0..NUM_GLYPHS {
			let c = FIRST_GLYPH + idx as u8;
			for y in 0..FONT_HEIGHT {
				rows.push(layout.apply(font.render_char_line(c, y)));
			}
		}
		Ok(FontCache { rows })
	}

	/// Get one row of a character's glyph.
	///
	/// Characters outside printable ASCII are blank.
	#[inline(always)]
	pub fn row(&self, c: u8, y: usize) -> u32 {
		let idx = c.wrapping_sub(FIRST_GLYPH) as usize;
		if idx < NUM_GLYPHS {
			self.rows[idx * FONT_HEIGHT + y]
		} else {
			0
		}
	}
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------


// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
