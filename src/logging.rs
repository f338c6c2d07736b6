//! # Logging macros
//!
//! On the RP2350 these go out over RTT via `defmt`. Everywhere else they go to
//! the `log` facade, so unit tests can capture them. Stick to `{}`
//! placeholders and arguments that both back-ends can format.

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

#![allow(unused_macros)]

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

macro_rules! debug {
	($($arg:tt)+) => {{
		#[cfg(target_os = "none")]
		::defmt::debug!($($arg)+);
		#[cfg(not(target_os = "none"))]
		::log::debug!($($arg)+);
	}};
}

macro_rules! info {
	($($arg:tt)+) => {{
		#[cfg(target_os = "none")]
		::defmt::info!($($arg)+);
		#[cfg(not(target_os = "none"))]
		::log::info!($($arg)+);
	}};
}

macro_rules! warn {
	($($arg:tt)+) => {{
		#[cfg(target_os = "none")]
		::defmt::warn!($($arg)+);
		#[cfg(not(target_os = "none"))]
		::log::warn!($($arg)+);
	}};
}

macro_rules! error {
	($($arg:tt)+) => {{
		#[cfg(target_os = "none")]
		::defmt::error!($($arg)+);
		#[cfg(not(target_os = "none"))]
		::log::error!($($arg)+);
	}};
}

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
