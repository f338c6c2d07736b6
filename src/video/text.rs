//! # Text mode attributes and a console
//!
//! In the colour text mode each cell is a glyph byte followed by an
//! attribute byte:
//!
//! ```text
//! bit  7     6     5 4 3   2 1 0
//!     VLOW  LOW   bg RGB   fg RGB
//! ```
//!
//! The mono text mode is just glyph bytes. `TextConsole` writes either kind
//! of buffer as a scrolling terminal.

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

use core::sync::atomic::{AtomicPtr, AtomicU8, AtomicUsize, Ordering};

use super::mode::{DisplayMode, TEXT_COLS, TEXT_ROWS};

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// The eight text colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
#[repr(u8)]
pub enum TextColour {
	Black = 0,
	Red = 1,
	Green = 2,
	Yellow = 3,
	Blue = 4,
	Magenta = 5,
	Cyan = 6,
	White = 7,
}

/// An attribute byte for the colour text mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct Attr(u8);

/// Writes text into a text mode frame buffer, like a terminal.
///
/// Has no buffer until `set_text_buffer` is called, and ignores writes until
/// then.
pub struct TextConsole {
	current_row: AtomicU8,
	current_col: AtomicU8,
	attr: AtomicU8,
	text_buffer: AtomicPtr<u8>,
	buffer_len: AtomicUsize,
	/// 1 for mono text, 2 for colour text.
	cell_bytes: AtomicUsize,
}

// -----------------------------------------------------------------------------
// Static and Const Data
// -----------------------------------------------------------------------------

pub const ATTR_NORMAL_INTEN: u8 = 0;
/// Draw the glyph at two thirds brightness.
pub const ATTR_LOW_INTEN: u8 = 1 << 6;
/// Draw the glyph at a third of full brightness.
pub const ATTR_V_LOW_INTEN: u8 = (1 << 7) | ATTR_LOW_INTEN;

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

impl TextColour {
	pub const fn from_bits(bits: u8) -> TextColour {
		match bits & 7 {
			0 => TextColour::Black,
			1 => TextColour::Red,
			2 => TextColour::Green,
			3 => TextColour::Yellow,
			4 => TextColour::Blue,
			5 => TextColour::Magenta,
			6 => TextColour::Cyan,
			_ => TextColour::White,
		}
	}
}

impl Attr {
	pub const fn new(fg: TextColour, bg: TextColour) -> Attr {
		Attr((fg as u8) | ((bg as u8) << 3))
	}

	pub const fn from_u8(value: u8) -> Attr {
		Attr(value)
	}

	pub const fn as_u8(self) -> u8 {
		self.0
	}

	pub const fn fg(self) -> TextColour {
		TextColour::from_bits(self.0)
	}

	pub const fn bg(self) -> TextColour {
		TextColour::from_bits(self.0 >> 3)
	}

	pub const fn normal_intensity(self) -> Attr {
		Attr((self.0 & !ATTR_V_LOW_INTEN) | ATTR_NORMAL_INTEN)
	}

	pub const fn low_intensity(self) -> Attr {
		Attr((self.0 & !ATTR_V_LOW_INTEN) | ATTR_LOW_INTEN)
	}

	pub const fn very_low_intensity(self) -> Attr {
		Attr(self.0 | ATTR_V_LOW_INTEN)
	}
}

impl Default for Attr {
	fn default() -> Attr {
		Attr::new(TextColour::White, TextColour::Black)
	}
}

impl TextConsole {
	/// Create a TextConsole.
	///
	/// Has no buffer associated with it
	pub const fn new() -> TextConsole {
		TextConsole {
			current_row: AtomicU8::new(0),
			current_col: AtomicU8::new(0),
			attr: AtomicU8::new(Attr::new(TextColour::White, TextColour::Black).as_u8()),
			text_buffer: AtomicPtr::new(core::ptr::null_mut()),
			buffer_len: AtomicUsize::new(0),
			cell_bytes: AtomicUsize::new(1),
		}
	}

	/// Update the text buffer we are using.
	///
	/// `mode` says how the buffer is laid out; graphics modes are ignored.
	/// Will reset the cursor. The screen is not cleared.
	pub fn set_text_buffer(&self, text_buffer: &'static mut [u8], mode: DisplayMode) {
		if !mode.is_text() {
			return;
		}
		self.cell_bytes
			.store(mode.frame_bytes_per_pixel(), Ordering::Relaxed);
		self.buffer_len.store(text_buffer.len(), Ordering::Relaxed);
		self.text_buffer
			.store(text_buffer.as_mut_ptr(), Ordering::Relaxed);
		self.move_to(0, 0);
	}

	/// Set the attribute value used for writing out text.
	pub fn set_attribute(&self, attr: Attr) {
		self.attr.store(attr.as_u8(), Ordering::Relaxed);
	}

	/// Moves the text cursor to the specified row and column.
	///
	/// If a value is out of bounds, the cursor is not moved in that axis.
	pub fn move_to(&self, row: u8, col: u8) {
		if u16::from(row) < TEXT_ROWS {
			self.current_row.store(row, Ordering::Relaxed);
		}
		if u16::from(col) < TEXT_COLS {
			self.current_col.store(col, Ordering::Relaxed);
		}
	}

	/// Where the next character will go, as (row, column).
	pub fn position(&self) -> (u8, u8) {
		(
			self.current_row.load(Ordering::Relaxed),
			self.current_col.load(Ordering::Relaxed),
		)
	}

	/// Fill the screen with spaces in the current attribute, and home the
	/// cursor.
	pub fn clear(&self) {
		let attr = self.attr.load(Ordering::Relaxed);
		for row in 0..TEXT_ROWS as u8 {
			self.blank_row(row, attr);
		}
		self.move_to(0, 0);
	}

	/// Convert a Unicode Scalar Value to a font glyph.
	///
	/// The font only has printable 7-bit US-ASCII.
	pub fn map_char_to_glyph(input: char) -> Option<u8> {
		if (' '..='~').contains(&input) {
			Some(input as u8)
		} else {
			None
		}
	}

	/// Put a single glyph at a specified point on screen.
	fn write_at(&self, glyph: u8, attr: u8, row: u8, col: u8) {
		let buffer = self.text_buffer.load(Ordering::Relaxed);
		let cell_bytes = self.cell_bytes.load(Ordering::Relaxed);
		let offset = (col as usize + TEXT_COLS as usize * row as usize) * cell_bytes;
		if buffer.is_null() || offset + cell_bytes > self.buffer_len.load(Ordering::Relaxed) {
			return;
		}
		// Note (safety): We checked `offset` against the buffer length
		unsafe {
			buffer.add(offset).write_volatile(glyph);
			if cell_bytes == 2 {
				buffer.add(offset + 1).write_volatile(attr);
			}
		}
	}

	fn blank_row(&self, row: u8, attr: u8) {
		for col in 0..TEXT_COLS as u8 {
			self.write_at(b' ', attr, row, col);
		}
	}

	/// Move everything up one row and blank the bottom row.
	fn scroll(&self, attr: u8) {
		let buffer = self.text_buffer.load(Ordering::Relaxed);
		let row_bytes = TEXT_COLS as usize * self.cell_bytes.load(Ordering::Relaxed);
		let screen_bytes = row_bytes * TEXT_ROWS as usize;
		if buffer.is_null() || screen_bytes > self.buffer_len.load(Ordering::Relaxed) {
			return;
		}
		// Note (safety): Both ranges are inside the buffer, and `copy` allows
		// them to overlap
		unsafe {
			core::ptr::copy(buffer.add(row_bytes), buffer, screen_bytes - row_bytes);
		}
		self.blank_row(TEXT_ROWS as u8 - 1, attr);
	}
}

impl Default for TextConsole {
	fn default() -> TextConsole {
		TextConsole::new()
	}
}

unsafe impl Sync for TextConsole {}

impl core::fmt::Write for &TextConsole {
	/// Allows us to call `writeln!(some_text_console, "hello")`
	fn write_str(&mut self, s: &str) -> core::fmt::Result {
		if self.text_buffer.load(Ordering::Relaxed).is_null() {
			return Ok(());
		}
		let (mut row, mut col) = self.position();
		let attr = self.attr.load(Ordering::Relaxed);
		let num_cols = TEXT_COLS as u8;
		let num_rows = TEXT_ROWS as u8;

		for ch in s.chars() {
			match ch {
				'\n' => {
					// New Line (with implicit carriage return, like UNIX)
					row += 1;
					col = 0;
				}
				'\r' => {
					col = 0;
				}
				_ => {
					let glyph = TextConsole::map_char_to_glyph(ch).unwrap_or(b'?');
					self.write_at(glyph, attr, row, col);
					col += 1;
				}
			}
			if col == num_cols {
				col = 0;
				row += 1;
			}
			if row == num_rows {
				// Stay on last line
				row = num_rows - 1;
				self.scroll(attr);
			}
		}

		self.current_row.store(row, Ordering::Relaxed);
		self.current_col.store(col, Ordering::Relaxed);
		Ok(())
	}
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;
	use core::fmt::Write;

	fn leak_buffer(mode: DisplayMode) -> &'static mut [u8] {
		let len = TEXT_COLS as usize * TEXT_ROWS as usize * mode.frame_bytes_per_pixel();
		Box::leak(vec![0u8; len].into_boxed_slice())
	}

	fn cell(buffer: *const u8, cell_bytes: usize, row: usize, col: usize) -> &'static [u8] {
		let offset = (row * TEXT_COLS as usize + col) * cell_bytes;
		unsafe { core::slice::from_raw_parts(buffer.add(offset), cell_bytes) }
	}

	#[test]
	fn attribute_bits() {
		let attr = Attr::new(TextColour::Yellow, TextColour::Blue);
		assert_eq!(attr.as_u8(), 0x23);
		assert_eq!(attr.fg(), TextColour::Yellow);
		assert_eq!(attr.bg(), TextColour::Blue);
		assert_eq!(attr.low_intensity().as_u8(), 0x63);
		assert_eq!(attr.very_low_intensity().as_u8(), 0xe3);
		assert_eq!(attr.very_low_intensity().normal_intensity(), attr);
	}

	#[test]
	fn writes_cells_with_attributes() {
		let console = TextConsole::new();
		let buffer = leak_buffer(DisplayMode::TextRgb111);
		let ptr = buffer.as_ptr();
		console.set_text_buffer(buffer, DisplayMode::TextRgb111);
		let attr = Attr::new(TextColour::Green, TextColour::Black);
		console.set_attribute(attr);
		write!(&console, "Hi\r\nthere\u{e9}").unwrap();
		assert_eq!(cell(ptr, 2, 0, 0), &[b'H', attr.as_u8()]);
		assert_eq!(cell(ptr, 2, 0, 1), &[b'i', attr.as_u8()]);
		assert_eq!(cell(ptr, 2, 1, 0), &[b't', attr.as_u8()]);
		assert_eq!(cell(ptr, 2, 1, 5), &[b'?', attr.as_u8()]);
		assert_eq!(console.position(), (1, 6));
	}

	#[test]
	fn wraps_and_scrolls() {
		let console = TextConsole::new();
		let buffer = leak_buffer(DisplayMode::TextMono);
		let ptr = buffer.as_ptr();
		console.set_text_buffer(buffer, DisplayMode::TextMono);
		console.clear();

		// A full row wraps to the next one
		for _ in 0..TEXT_COLS {
			write!(&console, "a").unwrap();
		}
		assert_eq!(console.position(), (1, 0));

		write!(&console, "b").unwrap();
		for _ in 1..TEXT_ROWS {
			writeln!(&console).unwrap();
		}
		// Everything moved up one row
		assert_eq!(console.position(), (TEXT_ROWS as u8 - 1, 0));
		assert_eq!(cell(ptr, 1, 0, 0), b"b");
		assert_eq!(cell(ptr, 1, TEXT_ROWS as usize - 1, 0), b" ");
	}

	#[test]
	fn no_buffer_no_writes() {
		let console = TextConsole::new();
		write!(&console, "hello").unwrap();
		assert_eq!(console.position(), (0, 0));
		console.move_to(200, 5);
		assert_eq!(console.position(), (0, 5));
	}
}

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
