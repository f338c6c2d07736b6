//! # DVHSTX demo
//!
//! On an RP2350 this brings up 91x30 colour text over DVI, prints a banner
//! and then a frame counter, and blinks the LED once a second.
//!
//! Built for the host, it prints the table of resolutions and the video
//! timing each one runs on.

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

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

// -----------------------------------------------------------------------------
// Sub-modules
// -----------------------------------------------------------------------------

#[cfg(target_os = "none")]
mod embedded {
	// -------------------------------------------------------------------------
	// Imports
	// -------------------------------------------------------------------------

	use core::mem::MaybeUninit;
	use core::ptr::addr_of_mut;

	use defmt::info;
	use defmt_rtt as _;
	use embedded_alloc::Heap;
	use embedded_hal::digital::StatefulOutputPin;
	use fugit::RateExtU32;
	use panic_probe as _;
	use rp235x_hal::{
		self as hal,
		pac::{self, interrupt},
	};

	use pico_dvhstx::hw::rp235x::Rp235x;
	use pico_dvhstx::video::clock::XOSC_HZ;
	use pico_dvhstx::video::{Attr, TextColour, TextConsole};
	use pico_dvhstx::{DisplayMode, Dvhstx, Pinout};

	// -------------------------------------------------------------------------
	// Static and Const Data
	// -------------------------------------------------------------------------

	/// Tell the Boot ROM about our application
	#[link_section = ".start_block"]
	#[used]
	pub static IMAGE_DEF: hal::block::ImageDef = hal::block::ImageDef::secure_exe();

	/// Frame buffers, line buffers and the font cache all live here
	#[global_allocator]
	static HEAP: Heap = Heap::empty();

	const HEAP_SIZE: usize = 128 * 1024;

	static mut HEAP_MEM: [MaybeUninit<u8>; HEAP_SIZE] = [MaybeUninit::uninit(); HEAP_SIZE];

	/// The display
	// Note (unsafe): This is the only `Rp235x`
	static DISPLAY: Dvhstx<Rp235x> = Dvhstx::new(unsafe { Rp235x::new() });

	/// Writes characters into the display's text buffer
	static TEXT_CONSOLE: TextConsole = TextConsole::new();

	// -------------------------------------------------------------------------
	// Functions
	// -------------------------------------------------------------------------

	/// Prints to the screen
	macro_rules! print {
		($($arg:tt)*) => {
			{
				use core::fmt::Write as _;
				let _ = write!(&TEXT_CONSOLE, $($arg)*);
			}
		};
	}

	/// Prints to the screen and puts a new-line on the end
	macro_rules! println {
		() => (print!("\n"));
		($($arg:tt)*) => {
			{
				use core::fmt::Write as _;
				let _ = writeln!(&TEXT_CONSOLE, $($arg)*);
			}
		};
	}

	#[hal::entry]
	fn main() -> ! {
		info!("{} starting...", pico_dvhstx::api::VERSION);

		// Note (unsafe): Runs once, before anything allocates
		unsafe { HEAP.init(addr_of_mut!(HEAP_MEM) as usize, HEAP_SIZE) }

		let mut pac = pac::Peripherals::take().unwrap();

		// Reset the DMA engine. If we don't do this, starting from probe-rs
		// (as opposed to a cold-start) is unreliable.
		pac.RESETS.reset().modify(|_r, w| w.dma().set_bit());
		cortex_m::asm::nop();
		pac.RESETS.reset().modify(|_r, w| w.dma().clear_bit());
		while pac.RESETS.reset_done().read().dma().bit_is_clear() {}

		// Run the CPU at 264 MHz from PLL_USB, leaving PLL_SYS free for the
		// pixel clock.
		// TODO: raise the core voltage to 1.15 V first, once the HAL can
		// program the RP2350 regulator.
		let xosc = hal::xosc::setup_xosc_blocking(pac.XOSC, XOSC_HZ.Hz())
			.map_err(|_x| false)
			.unwrap();

		let mut clocks = hal::clocks::ClocksManager::new(pac.CLOCKS);

		let pll_usb = hal::pll::setup_pll_blocking(
			pac.PLL_USB,
			xosc.operating_frequency(),
			hal::pll::PLLConfig {
				vco_freq: 1584.MHz(),
				refdiv: 1,
				post_div1: 3,
				post_div2: 1,
			},
			&mut clocks,
			&mut pac.RESETS,
		)
		.map_err(|_x| false)
		.unwrap();

		clocks
			.reference_clock
			.configure_clock(&xosc, xosc.operating_frequency())
			.map_err(|_x| false)
			.unwrap();
		clocks
			.system_clock
			.configure_clock(&pll_usb, 264.MHz())
			.map_err(|_x| false)
			.unwrap();
		clocks
			.peripheral_clock
			.configure_clock(&pll_usb, 132.MHz())
			.map_err(|_x| false)
			.unwrap();

		info!("Clocks OK");

		let sio = hal::Sio::new(pac.SIO);
		let pins = hal::gpio::Pins::new(
			pac.IO_BANK0,
			pac.PADS_BANK0,
			sio.gpio_bank0,
			&mut pac.RESETS,
		);
		// The red LED on a Metro RP2350
		let mut led = pins.gpio23.into_push_pull_output();

		if let Err(e) = DISPLAY.init(0, 0, DisplayMode::TextRgb111, false, &Pinout::METRO_RP2350)
		{
			defmt::panic!("Video failed: {:?}", e);
		}

		// Note (unsafe): Single buffered, so the back buffer is the only
		// buffer, and it lives until `reset`, which we never call
		TEXT_CONSOLE.set_text_buffer(
			unsafe { DISPLAY.back_buffer::<u8>() },
			DisplayMode::TextRgb111,
		);
		TEXT_CONSOLE.set_attribute(Attr::new(TextColour::White, TextColour::Blue));
		TEXT_CONSOLE.clear();

		info!("Video OK");

		println!("{}", pico_dvhstx::api::VERSION);
		println!("Copyright (C) 2021 The Neotron Developers");
		println!("This program comes with ABSOLUTELY NO WARRANTY.");
		println!("This is free software, and you are welcome to redistribute it");
		println!("under certain conditions.");
		println!();
		for (idx, colour) in [
			TextColour::Red,
			TextColour::Green,
			TextColour::Yellow,
			TextColour::Blue,
			TextColour::Magenta,
			TextColour::Cyan,
		]
		.into_iter()
		.enumerate()
		{
			TEXT_CONSOLE.set_attribute(Attr::new(colour, TextColour::Black));
			print!(" Colour {} ", idx);
			TEXT_CONSOLE.set_attribute(Attr::new(colour, TextColour::Black).low_intensity());
			print!(" dim ");
		}
		TEXT_CONSOLE.set_attribute(Attr::new(TextColour::White, TextColour::Blue));
		println!();

		let (row, _col) = TEXT_CONSOLE.position();
		DISPLAY.set_cursor(0, u16::from(row) + 1);

		loop {
			DISPLAY.wait_for_vsync();
			let frames = DISPLAY.frame_count();
			TEXT_CONSOLE.move_to(row, 0);
			print!("Frame {:>10}", frames);
			if frames % 25 == 0 {
				let _ = led.toggle();
			}
		}
	}

	/// Called when DMA raises IRQ2; i.e. when one of the scan-line channels
	/// has finished.
	// In Rust 2024, this would need to be marked unsafe, but the cortex-m-rt
	// crate won't accept it. So 2021 it is.
	#[link_section = ".data"]
	#[interrupt]
	fn DMA_IRQ_2() {
		// Note (unsafe): We are the DMA_IRQ_2 handler
		unsafe {
			pico_dvhstx::hw::rp235x::irq();
		}
	}
}

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

#[cfg(not(target_os = "none"))]
fn main() {
	use pico_dvhstx::video::mode::select_mode;
	use pico_dvhstx::{DisplayMode, Resolution};

	println!("{}", pico_dvhstx::api::VERSION);
	println!();
	for res in Resolution::ALL.iter() {
		match select_mode(res.width(), res.height(), DisplayMode::Rgb565) {
			Ok(geometry) => {
				let mhz = geometry.timing.refresh_millihertz();
				println!(
					"{:>4}x{:<4} on {:<16} x{}/x{}  {}.{:03} Hz, {} kHz system clock",
					res.width(),
					res.height(),
					geometry.timing.name,
					geometry.h_repeat(),
					geometry.v_repeat(),
					mhz / 1000,
					mhz % 1000,
					geometry.timing.system_clock_khz()
				);
			}
			Err(e) => println!("{:?}: {}", res, e),
		}
	}
}

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
