//! # The peripherals the video engine drives
//!
//! The engine never touches a register itself. Everything it needs from the
//! chip (clocks, the HSTX serialiser and its pins, three DMA channels and
//! their interrupt, and the event signal for waking the main loop) goes
//! through the `Hardware` trait. The RP2350 implementation lives in
//! `rp235x`; the unit tests use a recording mock instead.

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
// Sub-modules
// -----------------------------------------------------------------------------

#[cfg(test)]
pub mod mock;

#[cfg(target_os = "none")]
pub mod rp235x;

// -----------------------------------------------------------------------------
// Imports
// -----------------------------------------------------------------------------

use core::sync::atomic::{AtomicPtr, Ordering};

use crate::video::clock::PllConfig;
use crate::video::mode::ExpandConfig;
use crate::video::Dvhstx;
use crate::Error;

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// Register-level operations the video engine needs.
///
/// Every method takes `&self` because they are called from both the main
/// thread and the DMA interrupt. Implementations must not block, except in
/// `wait_for_event`.
pub trait Hardware: Sized {
	/// Run PLL_SYS at the given settings, and clock HSTX from it undivided.
	fn configure_clock(&self, pll: &PllConfig);

	/// Pulse the HSTX reset, which also empties its FIFO.
	fn reset_serializer(&self);

	/// Set up the expander for a pixel format, map the lanes onto the eight
	/// HSTX outputs, and enable the serialiser.
	fn configure_serializer(&self, expand: &ExpandConfig, bits: &[u32; 8]);

	/// Stop the serialiser.
	fn disable_serializer(&self);

	/// Hand GPIO 12 to 19 over to HSTX.
	fn select_serializer_pins(&self);

	/// Give DMA priority on the bus, so the FIFO never runs dry.
	fn prioritise_dma(&self);

	/// Set a channel up to feed `words` to the HSTX FIFO, paced by its DREQ,
	/// and to trigger `chain_to` when it is done. Does not start it.
	fn configure_dma_channel(&self, channel: usize, chain_to: usize, words: &[u32]);

	/// Point a finished channel at new words, without triggering it. The
	/// chain from the previous channel will start it.
	fn reload_dma_channel(&self, channel: usize, words: &[u32]);

	/// Clear a channel's interrupt flag.
	fn acknowledge_dma_irq(&self, channel: usize);

	/// Enable the interrupt for the channels in `channel_mask`, and unmask it
	/// in the NVIC at the highest priority.
	fn enable_dma_irq(&self, channel_mask: u32);

	/// Mask the DMA interrupt.
	fn disable_dma_irq(&self);

	fn start_dma_channel(&self, channel: usize);

	/// Stop a channel and wait for it to go idle.
	fn abort_dma_channel(&self, channel: usize);

	/// Sleep until something calls `signal_event` (or any interrupt fires).
	fn wait_for_event(&self);

	/// Wake anything sleeping in `wait_for_event`.
	fn signal_event(&self);

	/// The slot the DMA interrupt finds the running engine in.
	fn registration(&self) -> &Registration<Dvhstx<Self>>;
}

/// Holds a pointer to the one engine the interrupt handler should run.
///
/// An interrupt handler can't take arguments, so it finds its engine here.
/// Only one engine may be installed at a time.
pub struct Registration<T> {
	slot: AtomicPtr<T>,
}

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

impl<T> Registration<T> {
	pub const fn new() -> Registration<T> {
		Registration {
			slot: AtomicPtr::new(core::ptr::null_mut()),
		}
	}

	/// Make `engine` the active one.
	///
	/// Installing the same engine twice is fine; installing a different one
	/// while the slot is occupied is not.
	pub fn install(&self, engine: &'static T) -> Result<(), Error> {
		let ptr = engine as *const T as *mut T;
		match self.slot.compare_exchange(
			core::ptr::null_mut(),
			ptr,
			Ordering::AcqRel,
			Ordering::Acquire,
		) {
			Ok(_) => Ok(()),
			Err(current) if current == ptr => Ok(()),
			Err(_) => Err(Error::AlreadyActive),
		}
	}

	/// Empty the slot, if `engine` is the one in it.
	pub fn clear(&self, engine: &T) {
		let ptr = engine as *const T as *mut T;
		let _ = self.slot.compare_exchange(
			ptr,
			core::ptr::null_mut(),
			Ordering::AcqRel,
			Ordering::Acquire,
		);
	}

	/// The active engine, if there is one.
	pub fn get(&self) -> Option<&'static T> {
		// Note (unsafe): Only `install` puts a pointer here, and it only
		// takes `'static` references
		unsafe { self.slot.load(Ordering::Acquire).as_ref() }
	}
}

impl<T> Default for Registration<T> {
	fn default() -> Registration<T> {
		Registration::new()
	}
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn one_engine_at_a_time() {
		let slot: Registration<u32> = Registration::new();
		let first: &'static u32 = Box::leak(Box::new(1));
		let second: &'static u32 = Box::leak(Box::new(2));
		assert!(slot.get().is_none());

		slot.install(first).unwrap();
		assert_eq!(slot.get(), Some(&1));
		// Again is fine
		slot.install(first).unwrap();
		assert_eq!(slot.install(second), Err(Error::AlreadyActive));

		// Clearing with the wrong engine leaves the slot alone
		slot.clear(second);
		assert_eq!(slot.get(), Some(&1));

		slot.clear(first);
		assert!(slot.get().is_none());
		slot.install(second).unwrap();
		assert_eq!(slot.get(), Some(&2));
	}
}

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
