//! # The outward-facing configuration types
//!
//! The handful of frame buffer sizes that fill a supported timing exactly,
//! and the board pinouts that say which GPIO pairs carry which TMDS lane.

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

use crate::Error;

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// The frame buffer sizes we know how to show.
///
/// Each one is the visible area of a supported timing divided by a whole
/// number in each direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum Resolution {
	/// 16:9, on 1280x720p50
	R320x180,
	/// 16:9, on 1280x720p50
	R640x360,
	/// 16:9, on 1920x1080p30
	R480x270,
	/// 16:9, on 800x450p60
	R400x225,
	/// 4:3, on 640x480p60
	R320x240,
	/// 3:2, on 720x480p60
	R360x240,
	/// 18:10, on 720x400p70
	R360x200,
	/// 5:4, on 720x576p50
	R360x288,
	/// 4:3, on 800x600p60
	R400x300,
	/// 4:3, on 1024x768p60
	R512x384,
	/// 5:3, on 800x480p60
	R400x240,
}

/// Which GPIO pins carry the DVI signals.
///
/// Each number is the positive pin of a differential pair; the negative pin
/// is the other half of the pair (`pin ^ 1`). All pins must be between 12
/// and 19, where HSTX lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct Pinout {
	/// The TMDS clock.
	pub clk_p: u8,
	/// TMDS lanes 0, 1 and 2 (blue, green and red on the wire).
	pub rgb_p: [u8; 3],
}

// -----------------------------------------------------------------------------
// Static and Const Data
// -----------------------------------------------------------------------------

/// Name and version of this crate.
pub static VERSION: &str = concat!("pico-dvhstx, version ", env!("CARGO_PKG_VERSION"));

/// The first GPIO HSTX can drive.
pub const HSTX_FIRST_PIN: u8 = 12;

/// The last GPIO HSTX can drive.
pub const HSTX_LAST_PIN: u8 = 19;

/// `BITx` register fields.
const BIT_SEL_N_SHIFT: u32 = 8;
const BIT_INV: u32 = 1 << 16;
const BIT_CLK: u32 = 1 << 17;

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

impl Resolution {
	/// Every resolution, in the order they are usually listed.
	pub const ALL: [Resolution; 11] = [
		Resolution::R320x180,
		Resolution::R640x360,
		Resolution::R480x270,
		Resolution::R400x225,
		Resolution::R320x240,
		Resolution::R360x240,
		Resolution::R360x200,
		Resolution::R360x288,
		Resolution::R400x300,
		Resolution::R512x384,
		Resolution::R400x240,
	];

	pub const fn width(self) -> u16 {
		self.size().0
	}

	pub const fn height(self) -> u16 {
		self.size().1
	}

	const fn size(self) -> (u16, u16) {
		match self {
			Resolution::R320x180 => (320, 180),
			Resolution::R640x360 => (640, 360),
			Resolution::R480x270 => (480, 270),
			Resolution::R400x225 => (400, 225),
			Resolution::R320x240 => (320, 240),
			Resolution::R360x240 => (360, 240),
			Resolution::R360x200 => (360, 200),
			Resolution::R360x288 => (360, 288),
			Resolution::R400x300 => (400, 300),
			Resolution::R512x384 => (512, 384),
			Resolution::R400x240 => (400, 240),
		}
	}
}

impl Pinout {
	/// Adafruit Metro RP2350, HSTX connector.
	pub const METRO_RP2350: Pinout = Pinout {
		clk_p: 14,
		rgb_p: [18, 16, 12],
	};

	/// Adafruit Feather RP2350, HSTX connector.
	pub const FEATHER_RP2350: Pinout = Pinout {
		clk_p: 14,
		rgb_p: [18, 16, 12],
	};

	/// Adafruit Fruit Jam, DVI port.
	pub const FRUITJAM_RP2350: Pinout = Pinout {
		clk_p: 14,
		rgb_p: [18, 16, 12],
	};

	fn pins(&self) -> [u8; 4] {
		[self.clk_p, self.rgb_p[0], self.rgb_p[1], self.rgb_p[2]]
	}

	/// Check every pin is one HSTX can drive, and that no two signals share
	/// a pair.
	pub fn validate(&self) -> Result<(), Error> {
		let pins = self.pins();
		for (idx, pin) in pins.iter().enumerate() {
			if !(HSTX_FIRST_PIN..=HSTX_LAST_PIN).contains(pin) {
				return Err(Error::InvalidPinout);
			}
			if pins[..idx].iter().any(|other| (other ^ pin) & !1 == 0) {
				return Err(Error::InvalidPinout);
			}
		}
		Ok(())
	}

	/// The values for HSTX's eight `BITx` registers.
	///
	/// The clock pair outputs the clock, inverted on the negative pin. Each
	/// lane pair sends its lane's even bits in the first half of a cycle and
	/// odd bits in the second, again inverted on the negative pin. Pins the
	/// pinout doesn't use get zero. Call `validate` first; bad pins are
	/// skipped.
	pub fn serializer_bits(&self) -> [u32; 8] {
		let mut bits = [0u32; 8];
		let mut set = |pin: u8, value: u32| {
			for (pin, value) in [(pin, value), (pin ^ 1, value | BIT_INV)] {
				if let Some(slot) = pin
					.checked_sub(HSTX_FIRST_PIN)
					.and_then(|idx| bits.get_mut(idx as usize))
				{
					*slot = value;
				}
			}
		};
		set(self.clk_p, BIT_CLK);
		for (lane, pin) in self.rgb_p.iter().enumerate() {
			let sel_p = lane as u32 * 10;
			let sel_n = sel_p + 1;
			set(*pin, sel_p | (sel_n << BIT_SEL_N_SHIFT));
		}
		bits
	}
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn resolution_sizes() {
		assert_eq!(Resolution::ALL.len(), 11);
		assert_eq!(
			(Resolution::R320x180.width(), Resolution::R320x180.height()),
			(320, 180)
		);
		assert_eq!(
			(Resolution::R512x384.width(), Resolution::R512x384.height()),
			(512, 384)
		);
		for res in Resolution::ALL.iter() {
			assert_eq!(format!("{:?}", res), format!("R{}x{}", res.width(), res.height()));
		}
	}

	#[test]
	fn presets_are_valid() {
		for pinout in [
			Pinout::METRO_RP2350,
			Pinout::FEATHER_RP2350,
			Pinout::FRUITJAM_RP2350,
		] {
			assert_eq!(pinout.validate(), Ok(()));
		}
	}

	#[test]
	fn bad_pinouts() {
		let outside = Pinout {
			clk_p: 10,
			rgb_p: [18, 16, 12],
		};
		assert_eq!(outside.validate(), Err(Error::InvalidPinout));
		let too_high = Pinout {
			clk_p: 20,
			rgb_p: [18, 16, 12],
		};
		assert_eq!(too_high.validate(), Err(Error::InvalidPinout));
		// 15 is the other half of 14's pair
		let shared = Pinout {
			clk_p: 14,
			rgb_p: [18, 15, 12],
		};
		assert_eq!(shared.validate(), Err(Error::InvalidPinout));
		let repeated = Pinout {
			clk_p: 14,
			rgb_p: [12, 16, 12],
		};
		assert_eq!(repeated.validate(), Err(Error::InvalidPinout));
	}

	#[test]
	fn metro_serializer_bits() {
		let lane = |n: u32| (n * 10) | ((n * 10 + 1) << 8);
		assert_eq!(
			Pinout::METRO_RP2350.serializer_bits(),
			[
				// GPIO 12 and 13: lane 2
				lane(2),
				lane(2) | BIT_INV,
				// GPIO 14 and 15: clock
				BIT_CLK,
				BIT_CLK | BIT_INV,
				// GPIO 16 and 17: lane 1
				lane(1),
				lane(1) | BIT_INV,
				// GPIO 18 and 19: lane 0
				lane(0),
				lane(0) | BIT_INV,
			]
		);
	}

	#[test]
	fn odd_pins_swap_polarity() {
		let pinout = Pinout {
			clk_p: 15,
			rgb_p: [18, 16, 12],
		};
		let bits = pinout.serializer_bits();
		assert_eq!(bits[2], BIT_CLK | BIT_INV);
		assert_eq!(bits[3], BIT_CLK);
	}

	#[test]
	fn version_names_the_crate() {
		assert!(VERSION.starts_with("pico-dvhstx, version "));
	}
}

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
