//! # Frame and line buffer storage
//!
//! Both kinds of buffer are shared between the application, the scan-line
//! IRQ and the DMA engine, none of which can be told about Rust's borrowing
//! rules. So they are held as raw heap allocations and handed out as slices
//! only through `unsafe` accessors whose callers know who else is looking.

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

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicBool, Ordering};

use crate::Error;

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// Types a frame buffer can be viewed as.
///
/// This trait is sealed; it is implemented for `u8`, `u16` and `u32` only.
pub trait Pixel: Copy + private::Sealed {}

mod private {
	pub trait Sealed {}
	impl Sealed for u8 {}
	impl Sealed for u16 {}
	impl Sealed for u32 {}
}

/// A zeroed, word-aligned heap allocation that does not move.
pub struct WordBuffer {
	words: NonNull<[u32]>,
}

/// The display and back frame buffers.
///
/// When single buffered, both roles are the same allocation.
pub struct FramePair {
	a: WordBuffer,
	b: Option<WordBuffer>,
	display_is_b: AtomicBool,
	bytes: usize,
}

/// A ring of line buffers, each a copy of the line header followed by room
/// for one line of encoded pixels.
pub struct LinePool {
	storage: WordBuffer,
	count: usize,
	header_words: usize,
	line_words: usize,
}

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

impl Pixel for u8 {}
impl Pixel for u16 {}
impl Pixel for u32 {}

impl WordBuffer {
	/// Allocate `len` words, all zero.
	pub fn try_new(len: usize) -> Result<WordBuffer, Error> {
		let mut words: Vec<u32> = Vec::new();
		words
			.try_reserve_exact(len)
			.map_err(|_| Error::OutOfMemory)?;
		words.resize(len, 0);
		let words: &mut [u32] = Box::leak(words.into_boxed_slice());
		Ok(WordBuffer {
			words: NonNull::from(words),
		})
	}

	pub fn len(&self) -> usize {
		self.words.len()
	}

	pub fn is_empty(&self) -> bool {
		self.words.len() == 0
	}

	/// The address the DMA engine reads from.
	pub fn as_ptr(&self) -> *const u32 {
		self.words.as_ptr() as *const u32
	}

	/// View the buffer as `bytes` bytes' worth of `T`.
	///
	/// # Safety
	///
	/// The caller must make sure nothing is writing to this part of the
	/// buffer for as long as the slice lives.
	pub unsafe fn view<T: Pixel>(&self, bytes: usize) -> &[T] {
		let bytes = bytes.min(self.len() * 4);
		core::slice::from_raw_parts(
			self.words.as_ptr() as *const T,
			bytes / core::mem::size_of::<T>(),
		)
	}

	/// View the buffer as `bytes` bytes' worth of `T`, writeable.
	///
	/// # Safety
	///
	/// The caller must make sure nothing else is reading or writing this part
	/// of the buffer for as long as the slice lives.
	#[allow(clippy::mut_from_ref)]
	pub unsafe fn view_mut<T: Pixel>(&self, bytes: usize) -> &mut [T] {
		let bytes = bytes.min(self.len() * 4);
		core::slice::from_raw_parts_mut(
			self.words.as_ptr() as *mut T,
			bytes / core::mem::size_of::<T>(),
		)
	}

	/// The whole buffer as words.
	///
	/// # Safety
	///
	/// As for `view_mut`.
	#[allow(clippy::mut_from_ref)]
	pub unsafe fn words_mut(&self) -> &mut [u32] {
		&mut *self.words.as_ptr()
	}
}

impl Drop for WordBuffer {
	fn drop(&mut self) {
		// Note (safety): `words` came from `Box::leak` and nobody else frees it
		unsafe { drop(Box::from_raw(self.words.as_ptr())) };
	}
}

// Note (unsafe): The buffer is plain memory; the accessors are `unsafe` and
// carry the aliasing rules.
unsafe impl Send for WordBuffer {}
unsafe impl Sync for WordBuffer {}

impl FramePair {
	/// Allocate one or two zeroed frame buffers of `bytes` bytes each.
	pub fn try_new(bytes: usize, double_buffered: bool) -> Result<FramePair, Error> {
		let words = (bytes + 3) / 4;
		let a = WordBuffer::try_new(words)?;
		let b = if double_buffered {
			Some(WordBuffer::try_new(words)?)
		} else {
			None
		};
		Ok(FramePair {
			a,
			b,
			display_is_b: AtomicBool::new(false),
			bytes,
		})
	}

	pub fn is_double_buffered(&self) -> bool {
		self.b.is_some()
	}

	/// Size of each frame buffer, in bytes.
	pub fn bytes(&self) -> usize {
		self.bytes
	}

	/// The buffer being sent to the screen.
	pub fn display(&self) -> &WordBuffer {
		match &self.b {
			Some(b) if self.display_is_b.load(Ordering::Acquire) => b,
			_ => &self.a,
		}
	}

	/// The buffer the application draws into.
	pub fn back(&self) -> &WordBuffer {
		match &self.b {
			Some(b) if !self.display_is_b.load(Ordering::Acquire) => b,
			_ => &self.a,
		}
	}

	/// Exchange the display and back roles. Does nothing when single
	/// buffered.
	pub fn swap(&self) {
		if self.b.is_some() {
			self.display_is_b.fetch_xor(true, Ordering::AcqRel);
		}
	}
}

impl LinePool {
	/// Allocate `count` line buffers, each with `header` at the front and
	/// `payload_words` of zeroes after it.
	pub fn try_new(count: usize, header: &[u32], payload_words: usize) -> Result<LinePool, Error> {
		let header_words = header.len();
		let line_words = header_words + payload_words;
		let storage = WordBuffer::try_new(line_words * count)?;
		// Note (safety): Nothing else can see the storage yet
		let words = unsafe { storage.words_mut() };
		for line in words.chunks_exact_mut(line_words) {
			line[..header_words].copy_from_slice(header);
		}
		Ok(LinePool {
			storage,
			count,
			header_words,
			line_words,
		})
	}

	pub fn count(&self) -> usize {
		self.count
	}

	/// Words in each line buffer, header included.
	pub fn line_words(&self) -> usize {
		self.line_words
	}

	/// A whole line buffer, header and payload, ready for the DMA engine.
	///
	/// # Safety
	///
	/// The payload of this slot must not be being encoded while the slice
	/// lives.
	pub unsafe fn line(&self, slot: usize) -> &[u32] {
		debug_assert!(slot < self.count);
		let start = slot * self.line_words;
		core::slice::from_raw_parts(self.storage.as_ptr().add(start), self.line_words)
	}

	/// The pixel part of a line buffer.
	///
	/// # Safety
	///
	/// The DMA engine must not be reading this slot, and nothing else may be
	/// holding a slice of it.
	#[allow(clippy::mut_from_ref)]
	pub unsafe fn payload_mut(&self, slot: usize) -> &mut [u32] {
		debug_assert!(slot < self.count);
		let start = slot * self.line_words + self.header_words;
		core::slice::from_raw_parts_mut(
			(self.storage.as_ptr() as *mut u32).add(start),
			self.line_words - self.header_words,
		)
	}
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn allocation_failure_is_reported() {
		assert!(matches!(
			WordBuffer::try_new(usize::MAX / 2),
			Err(Error::OutOfMemory)
		));
	}

	#[test]
	fn views_of_a_word_buffer() {
		let buffer = WordBuffer::try_new(2).unwrap();
		unsafe {
			buffer.view_mut::<u16>(6).copy_from_slice(&[1, 2, 3]);
			assert_eq!(buffer.view::<u16>(8), &[1, 2, 3, 0]);
			assert_eq!(buffer.view::<u8>(100).len(), 8);
			assert_eq!(buffer.view::<u32>(8).len(), 2);
		}
	}

	#[test]
	fn single_buffered_frames_alias() {
		let frames = FramePair::try_new(10, false).unwrap();
		assert!(!frames.is_double_buffered());
		assert_eq!(frames.display().as_ptr(), frames.back().as_ptr());
		frames.swap();
		assert_eq!(frames.display().as_ptr(), frames.back().as_ptr());
		assert_eq!(frames.display().len(), 3);
	}

	#[test]
	fn double_buffered_frames_swap() {
		let frames = FramePair::try_new(16, true).unwrap();
		let first_display = frames.display().as_ptr();
		let first_back = frames.back().as_ptr();
		assert_ne!(first_display, first_back);
		frames.swap();
		assert_eq!(frames.display().as_ptr(), first_back);
		assert_eq!(frames.back().as_ptr(), first_display);
		frames.swap();
		assert_eq!(frames.display().as_ptr(), first_display);
	}

	#[test]
	fn line_pool_carries_headers() {
		let pool = LinePool::try_new(3, &[0xaa, 0xbb], 4).unwrap();
		assert_eq!(pool.line_words(), 6);
		unsafe {
			pool.payload_mut(1).fill(7);
			for slot in 0..3 {
				let line = pool.line(slot);
				assert_eq!(&line[..2], &[0xaa, 0xbb]);
				let fill = if slot == 1 { 7 } else { 0 };
				assert!(line[2..].iter().all(|w| *w == fill));
			}
		}
	}
}

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
