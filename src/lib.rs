//! # DVI output for the RP2350, using HSTX and DMA
//!
//! The RP2350 has no video block. It does have HSTX, a high-speed serialiser
//! that can TMDS-encode whatever words it is fed, and a DMA engine that can
//! feed it. This crate turns those two into a DVI transmitter:
//!
//! * the clock tree is programmed so the HSTX bit clock exactly matches the
//!   chosen video timing,
//! * three DMA channels are chained in a ring, each one playing out a whole
//!   scan-line (sync, blanking and pixels) from a pre-built word list, and
//! * an interrupt handler runs once per scan-line, re-arming the channel that
//!   just finished and encoding the next visible line from the frame buffer.
//!
//! The application draws into the back frame buffer and flips. Text modes
//! draw from a character/attribute buffer through a pre-rendered font cache.
//!
//! The library builds for the host too, so everything except the register
//! poking can be unit tested on a development machine.

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

#![cfg_attr(not(test), no_std)]

extern crate alloc;

// -----------------------------------------------------------------------------
// Sub-modules
// -----------------------------------------------------------------------------

#[macro_use]
mod logging;

pub mod api;
pub mod error;
pub mod hw;
pub mod video;

// -----------------------------------------------------------------------------
// Imports
// -----------------------------------------------------------------------------

pub use api::{Pinout, Resolution};
pub use error::Error;
pub use video::{DisplayMode, Dvhstx, Palette};

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
