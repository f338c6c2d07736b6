//! # PLL search for the HSTX clock
//!
//! DVI has no tolerance for a "nearly right" pixel clock, so we look for a
//! PLL_SYS configuration that hits the target exactly and give up otherwise.
//! The search order matches the Pico SDK's `check_sys_clock_khz`, so for any
//! given frequency we land on the same dividers it would.

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

use fugit::{HertzU32, RateExtU32};

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// The settings for one PLL.
///
/// Output frequency is `xosc / refdiv * fbdiv / (post_div1 * post_div2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PllConfig {
	pub refdiv: u8,
	pub fbdiv: u16,
	pub vco_freq: HertzU32,
	pub post_div1: u8,
	pub post_div2: u8,
}

// -----------------------------------------------------------------------------
// Static and Const Data
// -----------------------------------------------------------------------------

/// Every RP2350 board we know of has a 12 MHz crystal.
pub const XOSC_HZ: u32 = 12_000_000;

/// The VCO must run between these two frequencies.
const VCO_MIN_HZ: u32 = 750_000_000;
const VCO_MAX_HZ: u32 = 1_600_000_000;

/// The feedback divider range.
const FBDIV_MIN: u32 = 16;
const FBDIV_MAX: u32 = 320;

/// Each post-divider is 3 bits, and zero is not allowed.
const POST_DIV_MAX: u32 = 7;

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

/// Find a PLL configuration that gives exactly `freq_khz`.
///
/// The highest usable VCO frequency wins (less jitter), and for a given VCO
/// the largest first post-divider wins.
pub fn find_pll(freq_khz: u32) -> Option<PllConfig> {
	let freq_hz = freq_khz.checked_mul(1000)?;
	let refdiv = 1;
	let reference_hz = XOSC_HZ / refdiv;
	for fbdiv in (FBDIV_MIN..=FBDIV_MAX).rev() {
		let vco_hz = fbdiv * reference_hz;
		if !(VCO_MIN_HZ..=VCO_MAX_HZ).contains(&vco_hz) {
			continue;
		}
		for post_div1 in (1..=POST_DIV_MAX).rev() {
			for post_div2 in (1..=post_div1).rev() {
				let divide = post_div1 * post_div2;
				if vco_hz % divide == 0 && vco_hz / divide == freq_hz {
					return Some(PllConfig {
						refdiv: refdiv as u8,
						fbdiv: fbdiv as u16,
						vco_freq: vco_hz.Hz(),
						post_div1: post_div1 as u8,
						post_div2: post_div2 as u8,
					});
				}
			}
		}
	}
	None
}

impl PllConfig {
	/// The frequency that comes out of the post-dividers.
	pub fn output_freq(&self) -> HertzU32 {
		let divide = self.post_div1 as u32 * self.post_div2 as u32;
		(self.vco_freq.to_Hz() / divide).Hz()
	}

	/// The value for the PLL's `PRIM` register.
	pub const fn prim_bits(&self) -> u32 {
		((self.post_div1 as u32) << 16) | ((self.post_div2 as u32) << 12)
	}
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------


// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
