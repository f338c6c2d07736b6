//! # The scan-line state machine
//!
//! Three DMA channels play scan-lines in turn, each chained to the next. When
//! one finishes, the IRQ re-arms it with the scan-line two ahead of the one
//! now playing. This module decides what that scan-line is; the IRQ handler
//! in `video` does the register writes and the encoding.

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
use super::{NUM_CHANS, NUM_FRAME_LINES};

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// What a DMA channel should play next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
	/// A blank line inside the vertical sync pulse.
	VsyncOn,
	/// A blank line in the vertical front or back porch.
	VsyncOff,
	/// A visible line.
	Active {
		/// Visible line number, before any vertical repeat is undone.
		raster: u16,
		/// Frame buffer row.
		row: u16,
		/// Which line buffer to play.
		slot: usize,
		/// The line buffer doesn't hold this row yet.
		encode: bool,
	},
}

/// The outcome of one DMA completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
	/// The channel that finished, and is to be re-armed.
	pub channel: usize,
	/// What to re-arm it with.
	pub line: LineKind,
	/// That was the last scan-line of the frame.
	pub frame_done: bool,
}

/// Where we are in the frame. Only the IRQ handler touches this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanlineState {
	/// The scan-line the next re-armed channel will play.
	scanline: u16,
	/// The channel that will finish next.
	channel: usize,
	/// The frame buffer row last encoded, if any this frame.
	last_row: Option<u16>,
}

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

impl ScanlineState {
	/// The state just after start-up.
	///
	/// Every channel starts out loaded with a blank line, so the first channel
	/// to finish is re-armed for the line after those.
	pub const fn new() -> ScanlineState {
		ScanlineState {
			scanline: (NUM_CHANS - 1) as u16,
			channel: 0,
			last_row: None,
		}
	}

	pub fn scanline(&self) -> u16 {
		self.scanline
	}

	/// The channel whose completion we are waiting for.
	pub fn next_channel(&self) -> usize {
		self.channel
	}

	/// Handle a DMA completion.
	pub fn step(&mut self, timing: &VideoTimingMode, v_repeat_shift: u8) -> Step {
		let channel = self.channel;
		self.channel = (self.channel + 1) % NUM_CHANS;

		let vsync_start = timing.v_front_porch;
		let vsync_end = timing.v_front_porch + timing.v_sync_width;
		let line = if (vsync_start..vsync_end).contains(&self.scanline) {
			LineKind::VsyncOn
		} else if self.scanline < timing.v_inactive_total() {
			LineKind::VsyncOff
		} else {
			let raster = self.scanline - timing.v_inactive_total();
			let row = raster >> v_repeat_shift;
			let slot = if v_repeat_shift == 0 {
				self.channel
			} else {
				row as usize & (NUM_FRAME_LINES - 1)
			};
			let encode = self.last_row != Some(row);
			self.last_row = Some(row);
			LineKind::Active {
				raster,
				row,
				slot,
				encode,
			}
		};

		self.scanline += 1;
		let frame_done = self.scanline == timing.v_total_lines();
		if frame_done {
			self.scanline = 0;
			self.last_row = None;
		}

		Step {
			channel,
			line,
			frame_done,
		}
	}
}

impl Default for ScanlineState {
	fn default() -> ScanlineState {
		ScanlineState::new()
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
	fn frame_period() {
		let timing = &TIMING_640X480P60;
		let mut state = ScanlineState::new();
		let start = state.scanline();
		let mut frames = 0;
		for _ in 0..timing.v_total_lines() {
			if state.step(timing, 0).frame_done {
				frames += 1;
			}
		}
		assert_eq!(frames, 1);
		assert_eq!(state.scanline(), start);
	}

	#[test]
	fn classifies_every_line() {
		let timing = &TIMING_1280X720P50_RB;
		let mut state = ScanlineState::new();
		// Run up to the start of a frame
		while !state.step(timing, 0).frame_done {}
		let (mut on, mut off, mut active) = (0, 0, 0);
		for line in 0..timing.v_total_lines() {
			match state.step(timing, 0).line {
				LineKind::VsyncOn => {
					assert!(line >= 3 && line < 8);
					on += 1;
				}
				LineKind::VsyncOff => off += 1,
				LineKind::Active { raster, row, .. } => {
					assert_eq!(raster, line - timing.v_inactive_total());
					assert_eq!(row, raster);
					active += 1;
				}
			}
		}
		assert_eq!(on, timing.v_sync_width);
		assert_eq!(off, timing.v_front_porch + timing.v_back_porch);
		assert_eq!(active, timing.v_active_lines);
	}

	#[test]
	fn channels_take_turns() {
		let mut state = ScanlineState::new();
		let channels: Vec<usize> = (0..7)
			.map(|_| state.step(&TIMING_640X480P60, 0).channel)
			.collect();
		assert_eq!(channels, [0, 1, 2, 0, 1, 2, 0]);
	}

	#[test]
	fn repeated_lines_are_encoded_once() {
		let timing = &TIMING_640X480P60;
		let mut state = ScanlineState::new();
		while !state.step(timing, 1).frame_done {}
		let mut encoded = Vec::new();
		for _ in 0..timing.v_total_lines() {
			if let LineKind::Active {
				row, slot, encode, ..
			} = state.step(timing, 1).line
			{
				assert_eq!(slot, row as usize & 1);
				if encode {
					encoded.push(row);
				}
			}
		}
		let expected: Vec<u16> = (0..240).collect();
		assert_eq!(encoded, expected);
	}

	#[test]
	fn unrepeated_lines_use_the_next_channel_slot() {
		let timing = &TIMING_640X480P60;
		let mut state = ScanlineState::new();
		while !state.step(timing, 0).frame_done {}
		for _ in 0..timing.v_total_lines() {
			let step = state.step(timing, 0);
			if let LineKind::Active { slot, encode, .. } = step.line {
				assert!(encode);
				assert_eq!(slot, (step.channel + 1) % NUM_CHANS);
			}
		}
	}

	#[test]
	fn row_marker_resets_each_frame() {
		// One frame buffer row per frame, so every frame shows row 0 again
		let timing = VideoTimingMode {
			name: "tiny",
			v_front_porch: 1,
			v_sync_width: 1,
			v_back_porch: 1,
			v_active_lines: 2,
			..TIMING_640X480P60
		};
		let mut state = ScanlineState::new();
		let mut encodes = 0;
		for _ in 0..(timing.v_total_lines() as usize * 4) {
			let step = state.step(&timing, 1);
			if let LineKind::Active { row, encode, .. } = step.line {
				assert_eq!(row, 0);
				if encode {
					encodes += 1;
				}
			}
			if step.frame_done {
				assert_eq!(state.last_row, None);
			}
		}
		assert_eq!(encodes, 4);
	}
}

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
