//! # Video timings
//!
//! Every mode here is clocked so that the HSTX bit clock is exactly ten times
//! the pixel clock (one TMDS symbol per pixel per lane). The pixel clocks are
//! chosen so the PLL can hit `bit_clock_khz / 2` exactly from a 12 MHz crystal,
//! which is why some of them are a hair off the VESA/CEA figure.
//!
//! All syncs are negative polarity.

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
// Types
// -----------------------------------------------------------------------------

/// Describes one standard raster timing.
///
/// Horizontal values are in pixel clocks, vertical values are in scan-lines.
/// Each scan-line goes front-porch, sync, back-porch, active. Each frame goes
/// front-porch, sync, back-porch, active too, so scan-line 0 is the first line
/// of the vertical front porch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoTimingMode {
	/// A human readable name, for logging
	pub name: &'static str,
	pub h_front_porch: u16,
	pub h_sync_width: u16,
	pub h_back_porch: u16,
	pub h_active_pixels: u16,
	pub v_front_porch: u16,
	pub v_sync_width: u16,
	pub v_back_porch: u16,
	pub v_active_lines: u16,
	/// The HSTX bit clock, in kHz. Ten times the pixel clock.
	pub bit_clock_khz: u32,
	/// What the mode is sold as. The real rate is within 1 Hz of this.
	pub nominal_refresh_hz: u8,
}

// -----------------------------------------------------------------------------
// Static and Const Data
// -----------------------------------------------------------------------------

/// 640 x 480 @ 60 Hz, 25.2 MHz pixel clock.
pub static TIMING_640X480P60: VideoTimingMode = VideoTimingMode {
	name: "640x480p60",
	h_front_porch: 16,
	h_sync_width: 96,
	h_back_porch: 48,
	h_active_pixels: 640,
	v_front_porch: 10,
	v_sync_width: 2,
	v_back_porch: 33,
	v_active_lines: 480,
	bit_clock_khz: 252_000,
	nominal_refresh_hz: 60,
};

/// 720 x 480 @ 60 Hz (CEA-861 mode 3)
pub static TIMING_720X480P60: VideoTimingMode = VideoTimingMode {
	name: "720x480p60",
	h_front_porch: 16,
	h_sync_width: 62,
	h_back_porch: 60,
	h_active_pixels: 720,
	v_front_porch: 9,
	v_sync_width: 6,
	v_back_porch: 30,
	v_active_lines: 480,
	bit_clock_khz: 270_000,
	nominal_refresh_hz: 60,
};

/// 720 x 400 @ 70 Hz, the classic PC text mode timing.
pub static TIMING_720X400P70: VideoTimingMode = VideoTimingMode {
	name: "720x400p70",
	h_front_porch: 18,
	h_sync_width: 108,
	h_back_porch: 54,
	h_active_pixels: 720,
	v_front_porch: 12,
	v_sync_width: 2,
	v_back_porch: 35,
	v_active_lines: 400,
	bit_clock_khz: 283_200,
	nominal_refresh_hz: 70,
};

/// 720 x 576 @ 50 Hz (CEA-861 mode 17)
pub static TIMING_720X576P50: VideoTimingMode = VideoTimingMode {
	name: "720x576p50",
	h_front_porch: 12,
	h_sync_width: 64,
	h_back_porch: 68,
	h_active_pixels: 720,
	v_front_porch: 5,
	v_sync_width: 5,
	v_back_porch: 39,
	v_active_lines: 576,
	bit_clock_khz: 270_000,
	nominal_refresh_hz: 50,
};

/// 800 x 600 @ 60 Hz (VESA DMT)
pub static TIMING_800X600P60: VideoTimingMode = VideoTimingMode {
	name: "800x600p60",
	h_front_porch: 40,
	h_sync_width: 128,
	h_back_porch: 88,
	h_active_pixels: 800,
	v_front_porch: 1,
	v_sync_width: 4,
	v_back_porch: 23,
	v_active_lines: 600,
	bit_clock_khz: 400_000,
	nominal_refresh_hz: 60,
};

/// 800 x 480 @ 60 Hz, as used by small HDMI panels.
pub static TIMING_800X480P60: VideoTimingMode = VideoTimingMode {
	name: "800x480p60",
	h_front_porch: 24,
	h_sync_width: 72,
	h_back_porch: 96,
	h_active_pixels: 800,
	v_front_porch: 3,
	v_sync_width: 10,
	v_back_porch: 7,
	v_active_lines: 480,
	bit_clock_khz: 295_200,
	nominal_refresh_hz: 60,
};

/// 800 x 450 @ 60 Hz, a 16:9 variant of the above.
pub static TIMING_800X450P60: VideoTimingMode = VideoTimingMode {
	name: "800x450p60",
	h_front_porch: 24,
	h_sync_width: 72,
	h_back_porch: 96,
	h_active_pixels: 800,
	v_front_porch: 3,
	v_sync_width: 10,
	v_back_porch: 7,
	v_active_lines: 450,
	bit_clock_khz: 278_400,
	nominal_refresh_hz: 60,
};

/// 960 x 540 @ 60 Hz, quarter of 1080p.
pub static TIMING_960X540P60: VideoTimingMode = VideoTimingMode {
	name: "960x540p60",
	h_front_porch: 16,
	h_sync_width: 32,
	h_back_porch: 40,
	h_active_pixels: 960,
	v_front_porch: 3,
	v_sync_width: 6,
	v_back_porch: 15,
	v_active_lines: 540,
	bit_clock_khz: 354_000,
	nominal_refresh_hz: 60,
};

/// 1024 x 768 @ 60 Hz, CVT reduced blanking.
pub static TIMING_1024X768P60_RB: VideoTimingMode = VideoTimingMode {
	name: "1024x768p60rb",
	h_front_porch: 48,
	h_sync_width: 32,
	h_back_porch: 80,
	h_active_pixels: 1024,
	v_front_porch: 3,
	v_sync_width: 4,
	v_back_porch: 15,
	v_active_lines: 768,
	bit_clock_khz: 560_000,
	nominal_refresh_hz: 60,
};

/// 1280 x 720 @ 50 Hz, CVT reduced blanking. Used by the text modes and by
/// the pixel-doubled 640x360 and 320x180 modes.
pub static TIMING_1280X720P50_RB: VideoTimingMode = VideoTimingMode {
	name: "1280x720p50rb",
	h_front_porch: 48,
	h_sync_width: 32,
	h_back_porch: 80,
	h_active_pixels: 1280,
	v_front_porch: 3,
	v_sync_width: 5,
	v_back_porch: 13,
	v_active_lines: 720,
	bit_clock_khz: 528_000,
	nominal_refresh_hz: 50,
};

/// 1920 x 1080 @ 30 Hz, CVT reduced blanking v2. Only ever used with x4
/// pixel repeat (480x270), as a full frame would not fit in RAM.
pub static TIMING_1920X1080P30_RB2: VideoTimingMode = VideoTimingMode {
	name: "1920x1080p30rb2",
	h_front_porch: 8,
	h_sync_width: 32,
	h_back_porch: 40,
	h_active_pixels: 1920,
	v_front_porch: 3,
	v_sync_width: 5,
	v_back_porch: 23,
	v_active_lines: 1080,
	bit_clock_khz: 660_000,
	nominal_refresh_hz: 30,
};

/// The timings we search when asked for an arbitrary (doubled) resolution.
pub static LOOKUP_TIMINGS: [&VideoTimingMode; 9] = [
	&TIMING_640X480P60,
	&TIMING_720X480P60,
	&TIMING_720X400P70,
	&TIMING_720X576P50,
	&TIMING_800X600P60,
	&TIMING_800X480P60,
	&TIMING_800X450P60,
	&TIMING_960X540P60,
	&TIMING_1024X768P60_RB,
];

/// Every timing this crate can generate.
pub static ALL_TIMINGS: [&VideoTimingMode; 11] = [
	&TIMING_640X480P60,
	&TIMING_720X480P60,
	&TIMING_720X400P70,
	&TIMING_720X576P50,
	&TIMING_800X600P60,
	&TIMING_800X480P60,
	&TIMING_800X450P60,
	&TIMING_960X540P60,
	&TIMING_1024X768P60_RB,
	&TIMING_1280X720P50_RB,
	&TIMING_1920X1080P30_RB2,
];

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

/// Find the timing with exactly this many active pixels and lines.
pub fn find(h_active_pixels: u16, v_active_lines: u16) -> Option<&'static VideoTimingMode> {
	LOOKUP_TIMINGS.iter().copied().find(|t| {
		t.h_active_pixels == h_active_pixels && t.v_active_lines == v_active_lines
	})
}

impl VideoTimingMode {
	/// Number of blank lines before the first active line.
	pub const fn v_inactive_total(&self) -> u16 {
		self.v_front_porch + self.v_sync_width + self.v_back_porch
	}

	/// Number of scan-lines in a whole frame.
	pub const fn v_total_lines(&self) -> u16 {
		self.v_inactive_total() + self.v_active_lines
	}

	/// Number of pixel clocks in a whole scan-line.
	pub const fn h_total_pixels(&self) -> u16 {
		self.h_front_porch + self.h_sync_width + self.h_back_porch + self.h_active_pixels
	}

	/// The pixel clock, in kHz.
	pub const fn pixel_clock_khz(&self) -> u32 {
		self.bit_clock_khz / 10
	}

	/// The clock HSTX (and the CPU) must run at, in kHz.
	///
	/// HSTX shifts out two bits per clock, so it runs at half the bit clock.
	pub const fn system_clock_khz(&self) -> u32 {
		self.bit_clock_khz / 2
	}

	/// Actual frame rate, in millihertz.
	pub const fn refresh_millihertz(&self) -> u32 {
		let pixels_per_frame = self.h_total_pixels() as u64 * self.v_total_lines() as u64;
		((self.pixel_clock_khz() as u64 * 1_000_000) / pixels_per_frame) as u32
	}
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn refresh_rates_are_close_to_nominal() {
		for timing in ALL_TIMINGS.iter() {
			let actual = timing.refresh_millihertz() as i64;
			let nominal = timing.nominal_refresh_hz as i64 * 1000;
			assert!(
				(actual - nominal).abs() <= 1000,
				"{} runs at {} mHz",
				timing.name,
				actual
			);
		}
	}

	#[test]
	fn vga_totals() {
		assert_eq!(TIMING_640X480P60.h_total_pixels(), 800);
		assert_eq!(TIMING_640X480P60.v_total_lines(), 525);
		assert_eq!(TIMING_640X480P60.v_inactive_total(), 45);
		assert_eq!(TIMING_640X480P60.pixel_clock_khz(), 25_200);
		assert_eq!(TIMING_640X480P60.system_clock_khz(), 126_000);
	}

	#[test]
	fn lookup_only_covers_the_search_set() {
		assert_eq!(find(800, 600), Some(&TIMING_800X600P60));
		assert_eq!(find(720, 400), Some(&TIMING_720X400P70));
		assert_eq!(find(1280, 720), None);
		assert_eq!(find(641, 480), None);
	}

	#[test]
	fn sync_counts_fit_in_a_command_word() {
		// HSTX command lengths are 12 bits.
		for timing in ALL_TIMINGS.iter() {
			assert!(timing.h_back_porch + timing.h_active_pixels < 4096);
			assert!(timing.h_front_porch < 4096);
			assert!(timing.h_sync_width < 4096);
		}
	}
}

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
