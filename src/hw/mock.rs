//! # A pretend RP2350 for the unit tests
//!
//! Records every operation the engine asks for, and remembers what each DMA
//! channel is pointed at so a test can read back exactly what would be sent.

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

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::{Hardware, Registration};
use crate::video::clock::PllConfig;
use crate::video::mode::ExpandConfig;
use crate::video::{Dvhstx, NUM_CHANS};

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// Something the engine asked the hardware to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
	ConfigureClock(PllConfig),
	ResetSerializer,
	ConfigureSerializer {
		tmds: u32,
		shift: u32,
		bits: [u32; 8],
	},
	DisableSerializer,
	SelectPins,
	PrioritiseDma,
	ConfigureDma {
		channel: usize,
		chain_to: usize,
		len: usize,
	},
	EnableIrq(u32),
	DisableIrq,
	Start(usize),
	Abort(usize),
}

/// Where a DMA channel reads from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Channel {
	pub read_addr: usize,
	pub len: usize,
	pub chain_to: usize,
	pub acks: usize,
}

pub struct MockHardware {
	ops: Mutex<Vec<Op>>,
	channels: Mutex<[Channel; NUM_CHANS]>,
	irq_enabled: AtomicBool,
	registration: Registration<Dvhstx<MockHardware>>,
}

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

impl MockHardware {
	pub fn new() -> MockHardware {
		MockHardware {
			ops: Mutex::new(Vec::new()),
			channels: Mutex::new([Channel::default(); NUM_CHANS]),
			irq_enabled: AtomicBool::new(false),
			registration: Registration::new(),
		}
	}

	fn record(&self, op: Op) {
		self.ops.lock().unwrap().push(op);
	}

	/// Everything recorded so far, oldest first.
	pub fn ops(&self) -> Vec<Op> {
		self.ops.lock().unwrap().clone()
	}

	pub fn clear_ops(&self) {
		self.ops.lock().unwrap().clear();
	}

	pub fn channel(&self, channel: usize) -> Channel {
		self.channels.lock().unwrap()[channel]
	}

	/// The words a channel would send if it started now.
	///
	/// Only meaningful while the engine that set the channel up is running.
	pub fn transmitted(&self, channel: usize) -> Vec<u32> {
		let ch = self.channel(channel);
		if ch.read_addr == 0 {
			return Vec::new();
		}
		// Note (unsafe): The engine keeps everything it points DMA at alive
		// until `reset`
		unsafe { core::slice::from_raw_parts(ch.read_addr as *const u32, ch.len).to_vec() }
	}

	pub fn irq_enabled(&self) -> bool {
		self.irq_enabled.load(Ordering::SeqCst)
	}

	fn point(&self, channel: usize, words: &[u32]) {
		let mut channels = self.channels.lock().unwrap();
		channels[channel].read_addr = words.as_ptr() as usize;
		channels[channel].len = words.len();
	}
}

impl Default for MockHardware {
	fn default() -> MockHardware {
		MockHardware::new()
	}
}

impl Hardware for MockHardware {
	fn configure_clock(&self, pll: &PllConfig) {
		self.record(Op::ConfigureClock(*pll));
	}

	fn reset_serializer(&self) {
		self.record(Op::ResetSerializer);
	}

	fn configure_serializer(&self, expand: &ExpandConfig, bits: &[u32; 8]) {
		self.record(Op::ConfigureSerializer {
			tmds: expand.tmds_bits(),
			shift: expand.shift_bits(),
			bits: *bits,
		});
	}

	fn disable_serializer(&self) {
		self.record(Op::DisableSerializer);
	}

	fn select_serializer_pins(&self) {
		self.record(Op::SelectPins);
	}

	fn prioritise_dma(&self) {
		self.record(Op::PrioritiseDma);
	}

	fn configure_dma_channel(&self, channel: usize, chain_to: usize, words: &[u32]) {
		self.record(Op::ConfigureDma {
			channel,
			chain_to,
			len: words.len(),
		});
		self.point(channel, words);
		self.channels.lock().unwrap()[channel].chain_to = chain_to;
	}

	fn reload_dma_channel(&self, channel: usize, words: &[u32]) {
		self.point(channel, words);
	}

	fn acknowledge_dma_irq(&self, channel: usize) {
		self.channels.lock().unwrap()[channel].acks += 1;
	}

	fn enable_dma_irq(&self, channel_mask: u32) {
		self.record(Op::EnableIrq(channel_mask));
		self.irq_enabled.store(true, Ordering::SeqCst);
	}

	fn disable_dma_irq(&self) {
		self.record(Op::DisableIrq);
		self.irq_enabled.store(false, Ordering::SeqCst);
	}

	fn start_dma_channel(&self, channel: usize) {
		self.record(Op::Start(channel));
	}

	fn abort_dma_channel(&self, channel: usize) {
		self.record(Op::Abort(channel));
		self.channels.lock().unwrap()[channel] = Channel::default();
	}

	fn wait_for_event(&self) {
		std::thread::yield_now();
	}

	fn signal_event(&self) {}

	fn registration(&self) -> &Registration<Dvhstx<MockHardware>> {
		&self.registration
	}
}

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
