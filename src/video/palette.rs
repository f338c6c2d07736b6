//! # The 256 colour palette for the indexed colour mode
//!
//! Each entry is stored as `0x00RRGGBB`, which is exactly the word HSTX wants
//! for one pixel in that mode, so encoding a line is one load per pixel.
//! Entries are atomics: the application may write them at any time and the
//! scan-line IRQ picks up the new value the next time it encodes a line
//! using that index.

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

use core::sync::atomic::{AtomicU32, Ordering};

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// A 24-bit colour.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(transparent)]
pub struct Rgb888(u32);

/// Holds the 256-entry palette for indexed colour modes.
pub struct Palette {
	entries: [AtomicU32; PALETTE_SIZE],
}

// -----------------------------------------------------------------------------
// Static and Const Data
// -----------------------------------------------------------------------------

pub const PALETTE_SIZE: usize = 256;

/// The sixteen classic colours at the start of the palette.
const BASIC_COLOURS: [Rgb888; 16] = [
	Rgb888::new(0x00, 0x00, 0x00),
	Rgb888::new(0x80, 0x00, 0x00),
	Rgb888::new(0x00, 0x80, 0x00),
	Rgb888::new(0x80, 0x80, 0x00),
	Rgb888::new(0x00, 0x00, 0x80),
	Rgb888::new(0x80, 0x00, 0x80),
	Rgb888::new(0x00, 0x80, 0x80),
	Rgb888::new(0xc0, 0xc0, 0xc0),
	Rgb888::new(0x80, 0x80, 0x80),
	Rgb888::new(0xff, 0x00, 0x00),
	Rgb888::new(0x00, 0xff, 0x00),
	Rgb888::new(0xff, 0xff, 0x00),
	Rgb888::new(0x00, 0x00, 0xff),
	Rgb888::new(0xff, 0x00, 0xff),
	Rgb888::new(0x00, 0xff, 0xff),
	Rgb888::new(0xff, 0xff, 0xff),
];

/// Channel levels for the 6x6x6 colour cube (indices 16 to 231).
const CUBE_LEVELS: [u8; 6] = [0x00, 0x5f, 0x87, 0xaf, 0xd7, 0xff];

/// The palette you get after `init`.
///
/// The xterm layout: sixteen basic colours, a 6x6x6 cube, then a 24 step grey
/// ramp from `#080808` to `#eeeeee`.
pub const DEFAULT_PALETTE: [Rgb888; PALETTE_SIZE] = default_palette();

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

const fn default_palette() -> [Rgb888; PALETTE_SIZE] {
	let mut out = [Rgb888(0); PALETTE_SIZE];
	let mut idx = 0;
	while idx < BASIC_COLOURS.len() {
		out[idx] = BASIC_COLOURS[idx];
		idx += 1;
	}
	while idx < 232 {
		let cube = idx - 16;
		out[idx] = Rgb888::new(
			CUBE_LEVELS[cube / 36],
			CUBE_LEVELS[(cube / 6) % 6],
			CUBE_LEVELS[cube % 6],
		);
		idx += 1;
	}
	while idx < PALETTE_SIZE {
		let grey = (8 + (idx - 232) * 10) as u8;
		out[idx] = Rgb888::new(grey, grey, grey);
		idx += 1;
	}
	out
}

impl Rgb888 {
	pub const fn new(red: u8, green: u8, blue: u8) -> Rgb888 {
		Rgb888(((red as u32) << 16) | ((green as u32) << 8) | (blue as u32))
	}

	/// Make a colour from a `0xRRGGBB` value. The top byte is ignored.
	pub const fn from_u32(rgb: u32) -> Rgb888 {
		Rgb888(rgb & 0x00ff_ffff)
	}

	pub const fn red(self) -> u8 {
		(self.0 >> 16) as u8
	}

	pub const fn green(self) -> u8 {
		(self.0 >> 8) as u8
	}

	pub const fn blue(self) -> u8 {
		self.0 as u8
	}

	/// The colour as `0x00RRGGBB`.
	pub const fn as_u32(self) -> u32 {
		self.0
	}
}

impl Palette {
	/// Make a palette holding the default colours.
	pub const fn new() -> Palette {
		#[allow(clippy::declare_interior_mutable_const)]
		const BLACK: AtomicU32 = AtomicU32::new(0);
		let mut entries = [BLACK; PALETTE_SIZE];
		let mut idx = 0;
		while idx < PALETTE_SIZE {
			entries[idx] = AtomicU32::new(DEFAULT_PALETTE[idx].as_u32());
			idx += 1;
		}
		Palette { entries }
	}

	/// Read one entry.
	#[inline(always)]
	pub fn get(&self, index: u8) -> Rgb888 {
		Rgb888(self.entries[index as usize].load(Ordering::Relaxed))
	}

	/// Read one entry as the word HSTX sends for it.
	#[inline(always)]
	pub(crate) fn word(&self, index: u8) -> u32 {
		self.entries[index as usize].load(Ordering::Relaxed)
	}

	/// Change one entry.
	///
	/// Lines already encoded keep the old colour until they are next encoded.
	pub fn set(&self, index: u8, colour: Rgb888) {
		self.entries[index as usize].store(colour.as_u32(), Ordering::Relaxed);
	}

	/// Put every entry back to its default colour.
	pub fn reset(&self) {
		for (entry, colour) in self.entries.iter().zip(DEFAULT_PALETTE.iter()) {
			entry.store(colour.as_u32(), Ordering::Relaxed);
		}
	}
}

impl Default for Palette {
	fn default() -> Self {
		Palette::new()
	}
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_layout() {
		let palette = Palette::new();
		assert_eq!(palette.get(0), Rgb888::new(0, 0, 0));
		assert_eq!(palette.get(9), Rgb888::new(0xff, 0, 0));
		assert_eq!(palette.get(15).as_u32(), 0x00ff_ffff);
		// First and last entries of the cube
		assert_eq!(palette.get(16).as_u32(), 0x0000_0000);
		assert_eq!(palette.get(21).as_u32(), 0x0000_00ff);
		assert_eq!(palette.get(231).as_u32(), 0x00ff_ffff);
		// Grey ramp
		assert_eq!(palette.get(232).as_u32(), 0x0008_0808);
		assert_eq!(palette.get(255).as_u32(), 0x00ee_eeee);
	}

	#[test]
	fn set_and_reset() {
		let palette = Palette::new();
		palette.set(200, Rgb888::from_u32(0xff12_3456));
		assert_eq!(palette.word(200), 0x0012_3456);
		assert_eq!(palette.get(200).red(), 0x12);
		assert_eq!(palette.get(200).green(), 0x34);
		assert_eq!(palette.get(200).blue(), 0x56);
		palette.reset();
		assert_eq!(palette.get(200), DEFAULT_PALETTE[200]);
	}
}

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
