//! # Display modes and frame geometry
//!
//! A `DisplayMode` fixes how the frame buffer is laid out and how HSTX must
//! expand each 32-bit word into TMDS pixels. A `ModeGeometry` is what `init`
//! settles on for a requested size: which timing, how big the frame buffer
//! is, and how many times each pixel and line is repeated to fill the screen.

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

use super::commands::{GRAPHICS_HEADER_WORDS, TEXT_HEADER_WORDS};
use super::font::FONT_HEIGHT;
use super::timing::{self, VideoTimingMode, TIMING_1280X720P50_RB, TIMING_1920X1080P30_RB2};
use super::{NUM_CHANS, NUM_FRAME_LINES};
use crate::Error;

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// The pixel formats we can put on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum DisplayMode {
	/// 16-bit pixels, 5 bits red, 6 bits green, 5 bits blue.
	Rgb565,
	/// 8-bit pixels, looked up in a 256 entry palette of 24-bit colours.
	Palette8,
	/// 32-bit pixels, `0x00RRGGBB`. Not currently supported by the encoder.
	Rgb888,
	/// 91x30 text, one byte per cell, grey glyphs on black.
	TextMono,
	/// 91x30 text, a glyph byte and an attribute byte per cell, eight
	/// foreground and eight background colours.
	TextRgb111,
}

/// How HSTX expands one lane's worth of bits before TMDS encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneExpand {
	/// Number of valid data bits, minus one.
	pub nbits: u8,
	/// Right-rotate applied to the shift register before taking the bits.
	pub rot: u8,
}

/// The HSTX `EXPAND_TMDS` and `EXPAND_SHIFT` settings for a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpandConfig {
	/// Lanes 0, 1 and 2, in that order.
	pub lanes: [LaneExpand; 3],
	/// How many pixels each TMDS data word holds.
	pub enc_n_shifts: u8,
	/// How far the shifter moves between pixels.
	pub enc_shift: u8,
	pub raw_n_shifts: u8,
	pub raw_shift: u8,
}

/// What `init` decided to do with the requested resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeGeometry {
	pub timing: &'static VideoTimingMode,
	/// Frame buffer width, in pixels (or character cells)
	pub frame_width: u16,
	/// Frame buffer height, in pixels (or character cells)
	pub frame_height: u16,
	/// Each frame buffer pixel is sent `1 << h_repeat_shift` times.
	pub h_repeat_shift: u8,
	/// Each frame buffer line is sent `1 << v_repeat_shift` times.
	pub v_repeat_shift: u8,
}

// -----------------------------------------------------------------------------
// Static and Const Data
// -----------------------------------------------------------------------------

/// Character cells across the screen in the text modes.
pub const TEXT_COLS: u16 = 91;

/// Character cells down the screen in the text modes.
pub const TEXT_ROWS: u16 = 30;

/// Width of a character cell, in pixels. 13 for the glyph plus a gap.
pub const CELL_WIDTH: u16 = 14;

/// Bytes (pixels) one text cell occupies in an RGB111 line buffer.
pub const RGB111_BYTES_PER_CELL: usize = CELL_WIDTH as usize;

/// `CSR` settings common to every mode: expander on, 5 shifts of 2 bits per
/// 10-bit symbol, clock lane toggling every 5 cycles.
pub const CSR_EN: u32 = 1 << 0;
pub const CSR_EXPAND_EN: u32 = 1 << 1;
pub const CSR_BITS: u32 = CSR_EN | CSR_EXPAND_EN | (2 << 8) | (5 << 16) | (5 << 28);

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

impl DisplayMode {
	/// Bytes per pixel (or per character cell) in the frame buffer.
	pub const fn frame_bytes_per_pixel(self) -> usize {
		match self {
			DisplayMode::Rgb565 => 2,
			DisplayMode::Palette8 => 1,
			DisplayMode::Rgb888 => 4,
			DisplayMode::TextMono => 1,
			DisplayMode::TextRgb111 => 2,
		}
	}

	/// Bytes per pixel (or per character cell) in an encoded line buffer.
	pub const fn line_bytes_per_pixel(self) -> usize {
		match self {
			DisplayMode::Rgb565 => 2,
			DisplayMode::Palette8 => 4,
			DisplayMode::Rgb888 => 4,
			DisplayMode::TextMono => 4,
			DisplayMode::TextRgb111 => RGB111_BYTES_PER_CELL,
		}
	}

	/// Is this one of the character-cell modes?
	pub const fn is_text(self) -> bool {
		matches!(self, DisplayMode::TextMono | DisplayMode::TextRgb111)
	}

	/// How HSTX must unpack our line buffer words.
	pub const fn expand_config(self) -> ExpandConfig {
		const fn lane(nbits: u8, rot: u8) -> LaneExpand {
			LaneExpand { nbits, rot }
		}
		match self {
			// Each 32-bit word is two pixels. Red is bits 15:11, green 10:5
			// and blue 4:0, and each lane rotates its field up to bit 7.
			DisplayMode::Rgb565 => ExpandConfig {
				lanes: [lane(4, 29), lane(5, 3), lane(4, 8)],
				enc_n_shifts: 2,
				enc_shift: 16,
				raw_n_shifts: 1,
				raw_shift: 0,
			},
			// One pixel per word, `0x00RRGGBB`.
			DisplayMode::Palette8 | DisplayMode::Rgb888 => ExpandConfig {
				lanes: [lane(7, 0), lane(7, 8), lane(7, 16)],
				enc_n_shifts: 1,
				enc_shift: 0,
				raw_n_shifts: 1,
				raw_shift: 0,
			},
			// 2-bit grey, the same on every lane; one word is a whole cell.
			DisplayMode::TextMono => ExpandConfig {
				lanes: [lane(1, 18), lane(1, 18), lane(1, 18)],
				enc_n_shifts: 14,
				enc_shift: 30,
				raw_n_shifts: 1,
				raw_shift: 0,
			},
			// One byte per pixel, four pixels per word. Red is bits 7:6, green
			// 4:3 and blue 1:0, each a 2-bit intensity.
			DisplayMode::TextRgb111 => ExpandConfig {
				lanes: [lane(1, 26), lane(1, 29), lane(1, 0)],
				enc_n_shifts: 4,
				enc_shift: 8,
				raw_n_shifts: 1,
				raw_shift: 0,
			},
		}
	}
}

impl ExpandConfig {
	/// Value for the `EXPAND_TMDS` register.
	pub const fn tmds_bits(&self) -> u32 {
		let mut bits = 0;
		let mut idx = 0;
		while idx < 3 {
			let lane = self.lanes[idx];
			bits |= ((lane.rot as u32 & 0x1f) | ((lane.nbits as u32 & 0x7) << 5)) << (idx * 8);
			idx += 1;
		}
		bits
	}

	/// Value for the `EXPAND_SHIFT` register.
	pub const fn shift_bits(&self) -> u32 {
		(self.raw_shift as u32 & 0x1f)
			| ((self.raw_n_shifts as u32 & 0x1f) << 8)
			| ((self.enc_shift as u32 & 0x1f) << 16)
			| ((self.enc_n_shifts as u32 & 0x1f) << 24)
	}
}

/// Pick a video timing, and pixel/line repeat, for the requested frame size.
///
/// Text modes ignore the size and always run 91x30 cells on 1280x720.
/// Anything narrower than 640 pixels is doubled horizontally, and anything
/// shorter than 400 lines is doubled vertically, before we look for a timing.
pub fn select_mode(width: u16, height: u16, mode: DisplayMode) -> Result<ModeGeometry, Error> {
	let geometry = |timing, frame_width, frame_height, h_repeat_shift, v_repeat_shift| {
		ModeGeometry {
			timing,
			frame_width,
			frame_height,
			h_repeat_shift,
			v_repeat_shift,
		}
	};

	if mode.is_text() {
		return Ok(geometry(&TIMING_1280X720P50_RB, TEXT_COLS, TEXT_ROWS, 0, 0));
	}

	match (width, height) {
		(320, 180) => return Ok(geometry(&TIMING_1280X720P50_RB, width, height, 2, 2)),
		(640, 360) => return Ok(geometry(&TIMING_1280X720P50_RB, width, height, 1, 1)),
		(480, 270) => return Ok(geometry(&TIMING_1920X1080P30_RB2, width, height, 2, 2)),
		_ => {}
	}

	let h_repeat_shift = if width < 640 { 1 } else { 0 };
	let v_repeat_shift = if height < 400 { 1 } else { 0 };
	let full_width = width << h_repeat_shift;
	let full_height = height << v_repeat_shift;
	match timing::find(full_width, full_height) {
		Some(timing) => Ok(geometry(
			timing,
			width,
			height,
			h_repeat_shift,
			v_repeat_shift,
		)),
		None => Err(Error::UnsupportedResolution { width, height }),
	}
}

impl ModeGeometry {
	pub const fn h_repeat(&self) -> usize {
		1 << self.h_repeat_shift
	}

	pub const fn v_repeat(&self) -> usize {
		1 << self.v_repeat_shift
	}

	/// Bytes in one frame buffer.
	pub const fn frame_bytes(&self, mode: DisplayMode) -> usize {
		self.frame_width as usize * self.frame_height as usize * mode.frame_bytes_per_pixel()
	}

	/// Bytes in one row of the frame buffer.
	pub const fn frame_stride(&self, mode: DisplayMode) -> usize {
		self.frame_width as usize * mode.frame_bytes_per_pixel()
	}

	/// Words of encoded pixels after the header in each line buffer.
	pub const fn line_payload_words(&self, mode: DisplayMode) -> usize {
		(self.frame_width as usize * self.h_repeat() * mode.line_bytes_per_pixel() + 3) / 4
	}

	/// Words of header at the start of each line buffer.
	pub const fn line_header_words(&self, mode: DisplayMode) -> usize {
		if mode.is_text() {
			TEXT_HEADER_WORDS
		} else {
			GRAPHICS_HEADER_WORDS
		}
	}

	/// How many line buffers we need.
	///
	/// Without vertical repeat, each DMA channel has its own line. With it,
	/// we only ever need the current and next frame line.
	pub const fn line_buffer_count(&self) -> usize {
		if self.v_repeat_shift == 0 {
			NUM_CHANS
		} else {
			NUM_FRAME_LINES
		}
	}

	/// Raster lines per text row.
	pub const fn text_row_height(&self) -> usize {
		FONT_HEIGHT
	}
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;
	use crate::api::Resolution;

	#[test]
	fn every_resolution_fills_its_timing() {
		for res in Resolution::ALL.iter() {
			let geometry = select_mode(res.width(), res.height(), DisplayMode::Rgb565)
				.unwrap_or_else(|e| panic!("{:?}: {}", res, e));
			assert_eq!(
				geometry.timing.h_active_pixels as usize,
				res.width() as usize * geometry.h_repeat()
			);
			assert_eq!(
				geometry.timing.v_active_lines as usize,
				res.height() as usize * geometry.v_repeat()
			);
		}
	}

	#[test]
	fn special_cases() {
		let g = select_mode(320, 180, DisplayMode::Rgb565).unwrap();
		assert_eq!(g.timing.name, "1280x720p50rb");
		assert_eq!((g.h_repeat(), g.v_repeat()), (4, 4));
		let g = select_mode(480, 270, DisplayMode::Palette8).unwrap();
		assert_eq!(g.timing.name, "1920x1080p30rb2");
		assert_eq!((g.h_repeat(), g.v_repeat()), (4, 4));
		let g = select_mode(400, 300, DisplayMode::Rgb565).unwrap();
		assert_eq!(g.timing.name, "800x600p60");
		assert_eq!((g.h_repeat(), g.v_repeat()), (2, 2));
		let g = select_mode(640, 480, DisplayMode::Rgb565).unwrap();
		assert_eq!((g.h_repeat(), g.v_repeat()), (1, 1));
	}

	#[test]
	fn text_ignores_the_size() {
		let g = select_mode(0, 0, DisplayMode::TextRgb111).unwrap();
		assert_eq!((g.frame_width, g.frame_height), (TEXT_COLS, TEXT_ROWS));
		assert_eq!(g.timing, &TIMING_1280X720P50_RB);
		// Header, left border and all the cells exactly fill the line
		assert_eq!(
			TEXT_COLS * CELL_WIDTH + crate::video::commands::TEXT_LEFT_BORDER,
			g.timing.h_active_pixels
		);
	}

	#[test]
	fn unsupported_sizes() {
		assert_eq!(
			select_mode(333, 181, DisplayMode::Rgb565),
			Err(Error::UnsupportedResolution {
				width: 333,
				height: 181
			})
		);
		assert!(select_mode(1280, 720, DisplayMode::Rgb565).is_err());
	}

	#[test]
	fn line_buffer_sizes() {
		let g = select_mode(320, 180, DisplayMode::Rgb565).unwrap();
		assert_eq!(g.line_payload_words(DisplayMode::Rgb565), 640);
		assert_eq!(g.line_buffer_count(), NUM_FRAME_LINES);
		let g = select_mode(320, 180, DisplayMode::Palette8).unwrap();
		assert_eq!(g.line_payload_words(DisplayMode::Palette8), 1280);
		let g = select_mode(0, 0, DisplayMode::TextRgb111).unwrap();
		assert_eq!(g.line_payload_words(DisplayMode::TextRgb111), 319);
		assert_eq!(g.line_header_words(DisplayMode::TextRgb111), 14);
		assert_eq!(g.line_buffer_count(), NUM_CHANS);
		let g = select_mode(0, 0, DisplayMode::TextMono).unwrap();
		assert_eq!(g.line_payload_words(DisplayMode::TextMono), 91);
	}

	#[test]
	fn register_packing() {
		let cfg = DisplayMode::Rgb565.expand_config();
		assert_eq!(cfg.tmds_bits(), 29 | (4 << 5) | (3 << 8) | (5 << 13) | (8 << 16) | (4 << 21));
		assert_eq!(cfg.shift_bits(), (1 << 8) | (16 << 16) | (2 << 24));
		assert_eq!(CSR_BITS, 0x5005_0203);
	}
}

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
