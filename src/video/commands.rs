//! # HSTX command lists
//!
//! The HSTX command expander takes a stream of 32-bit words. A command word
//! has an opcode in bits 15:12 and a length in bits 11:0, and is followed by
//! the data it applies to. We use four of them:
//!
//! * `RAW_REPEAT n, w`: send the raw 30-bit symbol `w` on the three lanes,
//!   `n` times. This is how sync and blanking are generated.
//! * `RAW n, w1..wn`: send `n` raw symbols.
//! * `TMDS n, ...`: TMDS encode `n` pixels from the words that follow.
//! * `NOP`.
//!
//! A blank scan-line is six words. A visible scan-line is a header (seven
//! words, or fourteen in text mode) followed by the encoded pixels, and the
//! header lives at the front of every line buffer.

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

use super::timing::VideoTimingMode;

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// The header that starts every visible scan-line.
pub type LineHeader = heapless::Vec<u32, MAX_HEADER_WORDS>;

/// The pre-built command words for one video timing.
///
/// These never change once built, and the DMA engine reads straight out of
/// them, so they must not move while video is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLists {
	/// A blank line during the vertical sync pulse.
	pub vblank_vsync_on: [u32; BLANK_LINE_WORDS],
	/// A blank line in the vertical front or back porch.
	pub vblank_vsync_off: [u32; BLANK_LINE_WORDS],
	/// The front of every visible line; the pixel payload follows it.
	pub active_header: LineHeader,
}

// -----------------------------------------------------------------------------
// Static and Const Data
// -----------------------------------------------------------------------------

pub const HSTX_CMD_RAW: u32 = 0x0 << 12;
pub const HSTX_CMD_RAW_REPEAT: u32 = 0x1 << 12;
pub const HSTX_CMD_TMDS: u32 = 0x2 << 12;
pub const HSTX_CMD_TMDS_REPEAT: u32 = 0x3 << 12;
pub const HSTX_CMD_NOP: u32 = 0xf << 12;

/// TMDS control symbols. The two bits are (V-Sync, H-Sync) on lane 0.
const TMDS_CTRL_00: u32 = 0x354;
const TMDS_CTRL_01: u32 = 0x0ab;
const TMDS_CTRL_10: u32 = 0x154;
const TMDS_CTRL_11: u32 = 0x2ab;

/// Sync symbols for all three lanes. Syncs are active low, so `V1_H1` means
/// neither pulse is active.
pub const SYNC_V0_H0: u32 = TMDS_CTRL_00 | (TMDS_CTRL_00 << 10) | (TMDS_CTRL_00 << 20);
pub const SYNC_V0_H1: u32 = TMDS_CTRL_01 | (TMDS_CTRL_00 << 10) | (TMDS_CTRL_00 << 20);
pub const SYNC_V1_H0: u32 = TMDS_CTRL_10 | (TMDS_CTRL_00 << 10) | (TMDS_CTRL_00 << 20);
pub const SYNC_V1_H1: u32 = TMDS_CTRL_11 | (TMDS_CTRL_00 << 10) | (TMDS_CTRL_00 << 20);

/// A black pixel, pre-encoded, with both running-disparity polarities. Sent
/// alternately so the link stays DC balanced.
pub const BLACK_PIXEL_A: u32 = 0x100 | (0x100 << 10) | (0x100 << 20);
pub const BLACK_PIXEL_B: u32 = 0x2ff | (0x2ff << 10) | (0x2ff << 20);

/// Pixels of black we send by hand at the start of a text line.
///
/// The text line is then exactly 91 cells of 14 pixels wide.
pub const TEXT_LEFT_BORDER: u16 = 6;

/// Words in a blank scan-line.
pub const BLANK_LINE_WORDS: usize = 6;

/// Words in the header of a graphics-mode line.
pub const GRAPHICS_HEADER_WORDS: usize = 7;

/// Words in the header of a text-mode line.
pub const TEXT_HEADER_WORDS: usize = BLANK_LINE_WORDS + 1 + TEXT_LEFT_BORDER as usize + 1;

/// The biggest header we ever build.
pub const MAX_HEADER_WORDS: usize = TEXT_HEADER_WORDS;

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

const fn hstx_cmd_raw(len: u16) -> u32 {
	HSTX_CMD_RAW | len as u32
}

const fn hstx_cmd_raw_repeat(len: u16) -> u32 {
	HSTX_CMD_RAW_REPEAT | len as u32
}

const fn hstx_cmd_tmds(len: u16) -> u32 {
	HSTX_CMD_TMDS | len as u32
}

/// The three sync periods of one scan-line, with V-Sync either active or not.
///
/// `tail` is the length of the final blanking run, which is the back-porch on
/// a visible line and the back-porch plus active period on a blank one.
const fn sync_words(timing: &VideoTimingMode, vsync: bool, tail: u16) -> [u32; BLANK_LINE_WORDS] {
	let (idle, pulse) = if vsync {
		(SYNC_V0_H1, SYNC_V0_H0)
	} else {
		(SYNC_V1_H1, SYNC_V1_H0)
	};
	[
		hstx_cmd_raw_repeat(timing.h_front_porch),
		idle,
		hstx_cmd_raw_repeat(timing.h_sync_width),
		pulse,
		hstx_cmd_raw_repeat(tail),
		idle,
	]
}

impl CommandLists {
	/// Build the command lists for the given timing.
	///
	/// Text lines get a short run of black pixels before the glyphs, to make
	/// the visible width a whole number of character cells.
	pub fn new(timing: &VideoTimingMode, text: bool) -> CommandLists {
		let blank_tail = timing.h_back_porch + timing.h_active_pixels;
		let mut active_header = LineHeader::new();
		let mut push = |word: u32| {
			// Capacity covers the longest (text) header.
			let pushed = active_header.push(word);
			debug_assert!(pushed.is_ok());
		};
		for word in sync_words(timing, false, timing.h_back_porch) {
			push(word);
		}
		if text {
			push(hstx_cmd_raw(TEXT_LEFT_BORDER));
			for idx in 0..TEXT_LEFT_BORDER {
				push(if idx & 1 == 0 {
					BLACK_PIXEL_A
				} else {
					BLACK_PIXEL_B
				});
			}
			push(hstx_cmd_tmds(timing.h_active_pixels - TEXT_LEFT_BORDER));
		} else {
			push(hstx_cmd_tmds(timing.h_active_pixels));
		}
		CommandLists {
			vblank_vsync_on: sync_words(timing, true, blank_tail),
			vblank_vsync_off: sync_words(timing, false, blank_tail),
			active_header,
		}
	}
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;
	use crate::video::timing::{TIMING_1280X720P50_RB, TIMING_640X480P60};

	#[test]
	fn blank_lines() {
		let lists = CommandLists::new(&TIMING_640X480P60, false);
		assert_eq!(
			lists.vblank_vsync_off,
			[
				0x1000 | 16,
				SYNC_V1_H1,
				0x1000 | 96,
				SYNC_V1_H0,
				0x1000 | (48 + 640),
				SYNC_V1_H1
			]
		);
		assert_eq!(
			lists.vblank_vsync_on,
			[
				0x1000 | 16,
				SYNC_V0_H1,
				0x1000 | 96,
				SYNC_V0_H0,
				0x1000 | (48 + 640),
				SYNC_V0_H1
			]
		);
	}

	#[test]
	fn graphics_header() {
		let lists = CommandLists::new(&TIMING_640X480P60, false);
		assert_eq!(lists.active_header.len(), GRAPHICS_HEADER_WORDS);
		assert_eq!(lists.active_header[4], 0x1000 | 48);
		assert_eq!(lists.active_header[6], 0x2000 | 640);
	}

	#[test]
	fn text_header() {
		let lists = CommandLists::new(&TIMING_1280X720P50_RB, true);
		assert_eq!(lists.active_header.len(), TEXT_HEADER_WORDS);
		assert_eq!(lists.active_header[6], HSTX_CMD_RAW | 6);
		assert_eq!(
			&lists.active_header[7..13],
			&[
				BLACK_PIXEL_A,
				BLACK_PIXEL_B,
				BLACK_PIXEL_A,
				BLACK_PIXEL_B,
				BLACK_PIXEL_A,
				BLACK_PIXEL_B
			]
		);
		assert_eq!(lists.active_header[13], HSTX_CMD_TMDS | 1274);
	}

	#[test]
	fn building_twice_gives_the_same_words() {
		for text in [false, true] {
			let a = CommandLists::new(&TIMING_1280X720P50_RB, text);
			let b = CommandLists::new(&TIMING_1280X720P50_RB, text);
			assert_eq!(a, b);
		}
	}

	#[test]
	fn every_line_adds_up_to_the_full_width() {
		let timing = &TIMING_1280X720P50_RB;
		let lists = CommandLists::new(timing, false);
		let length = |words: &[u32]| -> u32 {
			words
				.iter()
				.filter(|w| (*w >> 12) == 1 || (*w >> 12) == 2)
				.map(|w| w & 0xfff)
				.sum()
		};
		let total = timing.h_total_pixels() as u32;
		assert_eq!(length(&lists.vblank_vsync_on), total);
		assert_eq!(length(&lists.vblank_vsync_off), total);
		assert_eq!(length(&lists.active_header), total);
	}
}

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
