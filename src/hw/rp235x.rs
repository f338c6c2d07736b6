//! # The RP2350 implementation of `Hardware`
//!
//! Talks to the registers through the PAC, because the HAL has no HSTX
//! support (and no `FunctionHstx` for the pins).
//!
//! The system clock must not be running from PLL_SYS: we re-program that PLL
//! to whatever the video timing needs and clock HSTX from it.

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

use cortex_m::peripheral::NVIC;
use rp235x_hal::pac::{self, Interrupt};

use super::{Hardware, Registration};
use crate::video::clock::PllConfig;
use crate::video::mode::{ExpandConfig, CSR_BITS};
use crate::video::Dvhstx;

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// The RP2350's clocks, HSTX, DMA channels 0 to 2 and DMA_IRQ_2.
///
/// Holds nothing; every method steals the peripherals it needs.
pub struct Rp235x {
	_private: (),
}

// -----------------------------------------------------------------------------
// Static and Const Data
// -----------------------------------------------------------------------------

/// The engine `irq` runs.
static ACTIVE: Registration<Dvhstx<Rp235x>> = Registration::new();

/// The DMA request line for the HSTX FIFO.
const DREQ_HSTX: u8 = 52;

/// IO_BANK0 function select for the HSTX outputs.
const FUNCTION_HSTX: u8 = 0;

/// HSTX can only drive these pins.
const HSTX_PINS: core::ops::Range<usize> = 12..20;

/// `CLK_HSTX_CTRL`: AUXSRC is bits 7:5, and 1 picks PLL_SYS.
const CLK_HSTX_AUXSRC_PLL_SYS: u32 = 1 << 5;
const CLK_HSTX_ENABLE: u32 = 1 << 11;
/// `CLK_HSTX_DIV`: an integer divide of one.
const CLK_HSTX_DIV_1: u32 = 1 << 16;

/// Cortex-M33 priorities use the top four bits; zero is the highest.
const HIGHEST_PRIORITY: u8 = 0;

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

impl Rp235x {
	/// # Safety
	///
	/// Only make one of these. It assumes ownership of PLL_SYS, CLK_HSTX,
	/// HSTX, GPIO 12 to 19, DMA channels 0 to 2 and DMA_IRQ_2.
	pub const unsafe fn new() -> Rp235x {
		Rp235x { _private: () }
	}

	fn peripherals() -> pac::Peripherals {
		// Note (unsafe): We only touch the blocks `new` claimed
		unsafe { pac::Peripherals::steal() }
	}
}

impl Hardware for Rp235x {
	fn configure_clock(&self, pll: &PllConfig) {
		let p = Self::peripherals();

		// Stop HSTX's clock while its source changes
		p.CLOCKS
			.clk_hstx_ctrl()
			.modify(|r, w| unsafe { w.bits(r.bits() & !CLK_HSTX_ENABLE) });

		p.RESETS.reset().modify(|_, w| w.pll_sys().set_bit());
		p.RESETS.reset().modify(|_, w| w.pll_sys().clear_bit());
		while p.RESETS.reset_done().read().pll_sys().bit_is_clear() {}

		let regs = &p.PLL_SYS;
		regs.cs().write(|w| unsafe { w.refdiv().bits(pll.refdiv) });
		regs.fbdiv_int()
			.write(|w| unsafe { w.fbdiv_int().bits(pll.fbdiv) });
		regs.pwr()
			.modify(|_, w| w.pd().clear_bit().vcopd().clear_bit());
		while regs.cs().read().lock().bit_is_clear() {}
		regs.prim().write(|w| unsafe { w.bits(pll.prim_bits()) });
		regs.pwr().modify(|_, w| w.postdivpd().clear_bit());

		p.CLOCKS
			.clk_hstx_div()
			.write(|w| unsafe { w.bits(CLK_HSTX_DIV_1) });
		p.CLOCKS
			.clk_hstx_ctrl()
			.write(|w| unsafe { w.bits(CLK_HSTX_AUXSRC_PLL_SYS | CLK_HSTX_ENABLE) });
	}

	fn reset_serializer(&self) {
		let p = Self::peripherals();
		p.RESETS.reset().modify(|_, w| w.hstx().set_bit());
		p.RESETS.reset().modify(|_, w| w.hstx().clear_bit());
		while p.RESETS.reset_done().read().hstx().bit_is_clear() {}
	}

	fn configure_serializer(&self, expand: &ExpandConfig, bits: &[u32; 8]) {
		let p = Self::peripherals();
		let hstx = &p.HSTX_CTRL;
		// Note (unsafe): All of these are plain configuration registers
		unsafe {
			hstx.expand_tmds().write(|w| w.bits(expand.tmds_bits()));
			hstx.expand_shift().write(|w| w.bits(expand.shift_bits()));
			hstx.csr().write(|w| w.bits(CSR_BITS));
			hstx.bit0().write(|w| w.bits(bits[0]));
			hstx.bit1().write(|w| w.bits(bits[1]));
			hstx.bit2().write(|w| w.bits(bits[2]));
			hstx.bit3().write(|w| w.bits(bits[3]));
			hstx.bit4().write(|w| w.bits(bits[4]));
			hstx.bit5().write(|w| w.bits(bits[5]));
			hstx.bit6().write(|w| w.bits(bits[6]));
			hstx.bit7().write(|w| w.bits(bits[7]));
		}
	}

	fn disable_serializer(&self) {
		let p = Self::peripherals();
		p.HSTX_CTRL.csr().write(|w| unsafe { w.bits(0) });
	}

	fn select_serializer_pins(&self) {
		let p = Self::peripherals();
		for pin in HSTX_PINS {
			p.PADS_BANK0
				.gpio(pin)
				.modify(|_, w| w.ie().set_bit().od().clear_bit());
			p.IO_BANK0
				.gpio(pin)
				.gpio_ctrl()
				.write(|w| unsafe { w.funcsel().bits(FUNCTION_HSTX) });
			p.PADS_BANK0.gpio(pin).modify(|_, w| w.iso().clear_bit());
		}
	}

	fn prioritise_dma(&self) {
		let p = Self::peripherals();
		p.BUSCTRL
			.bus_priority()
			.write(|w| w.dma_r().set_bit().dma_w().set_bit());
	}

	fn configure_dma_channel(&self, channel: usize, chain_to: usize, words: &[u32]) {
		let p = Self::peripherals();
		let ch = p.DMA.ch(channel);
		// Note (unsafe): The addresses are ours, and outlive the transfer
		unsafe {
			ch.ch_read_addr().write(|w| w.bits(words.as_ptr() as u32));
			ch.ch_write_addr()
				.write(|w| w.bits(p.HSTX_FIFO.fifo().as_ptr() as u32));
			ch.ch_trans_count().write(|w| w.bits(words.len() as u32));
			ch.ch_al1_ctrl().write(|w| {
				w.chain_to()
					.bits(chain_to as u8)
					.data_size()
					.bits(2)
					.incr_read()
					.set_bit()
					.treq_sel()
					.bits(DREQ_HSTX)
					.en()
					.set_bit()
			});
		}
	}

	#[inline(always)]
	fn reload_dma_channel(&self, channel: usize, words: &[u32]) {
		let p = Self::peripherals();
		let ch = p.DMA.ch(channel);
		// Note (unsafe): The channel is idle until the chain triggers it
		unsafe {
			ch.ch_read_addr().write(|w| w.bits(words.as_ptr() as u32));
			ch.ch_trans_count().write(|w| w.bits(words.len() as u32));
		}
	}

	#[inline(always)]
	fn acknowledge_dma_irq(&self, channel: usize) {
		let p = Self::peripherals();
		p.DMA.ints2().write(|w| unsafe { w.bits(1 << channel) });
	}

	fn enable_dma_irq(&self, channel_mask: u32) {
		let p = Self::peripherals();
		// Note (unsafe): Clearing stale flags and enabling our own channels
		unsafe {
			p.DMA.intr().write(|w| w.bits(channel_mask));
			p.DMA.ints2().write(|w| w.bits(channel_mask));
			p.DMA.inte2().write(|w| w.bits(channel_mask));
			let mut core = cortex_m::Peripherals::steal();
			core.NVIC
				.set_priority(Interrupt::DMA_IRQ_2, HIGHEST_PRIORITY);
			NVIC::unpend(Interrupt::DMA_IRQ_2);
			NVIC::unmask(Interrupt::DMA_IRQ_2);
		}
	}

	fn disable_dma_irq(&self) {
		NVIC::mask(Interrupt::DMA_IRQ_2);
		let p = Self::peripherals();
		p.DMA.inte2().write(|w| unsafe { w.bits(0) });
	}

	fn start_dma_channel(&self, channel: usize) {
		let p = Self::peripherals();
		p.DMA
			.multi_chan_trigger()
			.write(|w| unsafe { w.multi_chan_trigger().bits(1 << channel) });
	}

	fn abort_dma_channel(&self, channel: usize) {
		let p = Self::peripherals();
		let ch = p.DMA.ch(channel);
		// Stop the chain re-triggering it before aborting
		ch.ch_al1_ctrl().modify(|_, w| w.en().clear_bit());
		p.DMA.chan_abort().write(|w| unsafe { w.bits(1 << channel) });
		while p.DMA.chan_abort().read().bits() & (1 << channel) != 0 {}
		while ch.ch_ctrl_trig().read().busy().bit_is_set() {}
	}

	fn wait_for_event(&self) {
		cortex_m::asm::wfe();
	}

	fn signal_event(&self) {
		cortex_m::asm::sev();
	}

	fn registration(&self) -> &Registration<Dvhstx<Rp235x>> {
		&ACTIVE
	}
}

/// Run the scan-line handler for whichever engine is active.
///
/// Call this from your `DMA_IRQ_2` handler.
///
/// # Safety
///
/// Only call this from the `DMA_IRQ_2` interrupt handler.
#[link_section = ".data"]
pub unsafe fn irq() {
	if let Some(engine) = ACTIVE.get() {
		engine.on_dma_irq();
	} else {
		// Nothing to feed the channels with, so stop them interrupting
		let p = Rp235x::peripherals();
		p.DMA.ints2().write(|w| w.bits(p.DMA.ints2().read().bits()));
	}
}

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
