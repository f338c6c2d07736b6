//! # Errors reported when starting the video engine

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

/// The ways `Dvhstx::init` can fail.
///
/// All of these are recoverable. When `init` returns one of them, no DMA
/// channel, interrupt or buffer has been left behind and `init` can be called
/// again with different arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum Error {
	/// No video timing can show a frame buffer of this size.
	UnsupportedResolution { width: u16, height: u16 },
	/// The scan-line encoder has no path for this display mode.
	UnsupportedMode,
	/// A pin is outside the HSTX GPIO window, or two lanes share a pair.
	InvalidPinout,
	/// We could not allocate a frame buffer, the line buffers or the font cache.
	OutOfMemory,
	/// Another engine already owns the DMA interrupt.
	AlreadyActive,
}

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

impl core::fmt::Display for Error {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		match self {
			Error::UnsupportedResolution { width, height } => {
				write!(f, "no video timing for {}x{}", width, height)
			}
			Error::UnsupportedMode => f.write_str("display mode not supported"),
			Error::InvalidPinout => f.write_str("invalid HSTX pinout"),
			Error::OutOfMemory => f.write_str("out of memory"),
			Error::AlreadyActive => f.write_str("another display is already active"),
		}
	}
}

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
