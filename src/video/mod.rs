//! # The DVI video engine
//!
//! Start-up picks a timing for the requested frame size, programs the clock
//! tree, builds the command lists and buffers, and starts three DMA channels
//! playing blank lines into HSTX. From then on `on_dma_irq` runs once per
//! scan-line, re-arming the channel that just finished with the scan-line
//! two ahead and encoding it first if it is a visible one.
//!
//! The application owns the back buffer, and asks for a flip when it has
//! finished drawing. The flip itself happens inside the interrupt, at the end
//! of a frame, so a frame is never sent half from one buffer and half from
//! the other.

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

pub mod buffers;
pub mod clock;
pub mod commands;
pub mod encode;
pub mod font;
pub mod mode;
pub mod palette;
pub mod scanline;
pub mod text;
pub mod timing;

// -----------------------------------------------------------------------------
// Imports
// -----------------------------------------------------------------------------

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::api::Pinout;
use crate::hw::Hardware;
use crate::Error;

use buffers::{FramePair, LinePool};
use commands::CommandLists;
use encode::LineEncoder;
use font::{FontCache, BUILTIN_FONT};
use mode::ModeGeometry;
use scanline::{LineKind, ScanlineState};

pub use buffers::Pixel;
pub use mode::DisplayMode;
pub use palette::{Palette, Rgb888};
pub use text::{Attr, TextColour, TextConsole};

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// A DVI output, driven by HSTX and three DMA channels.
///
/// Put one in a `static`, call `init` and route the DMA interrupt to
/// `on_dma_irq` (the `hw` module has a ready-made handler for the RP2350).
pub struct Dvhstx<H> {
	hw: H,
	inited: AtomicBool,
	/// Set by the application, cleared by the IRQ once it has flipped.
	flip_next: AtomicBool,
	/// Frames sent since `init`.
	frame_count: AtomicU32,
	palette: Palette,
	/// Text cursor cell as `x | y << 16`, or `CURSOR_OFF`.
	cursor: AtomicU32,
	session: UnsafeCell<Option<Session>>,
}

/// Everything `init` builds. Dropped by `reset`.
struct Session {
	mode: DisplayMode,
	geometry: ModeGeometry,
	encoder: LineEncoder,
	/// The DMA engine reads the blank lines straight out of here.
	commands: CommandLists,
	frames: FramePair,
	lines: LinePool,
	font: Option<FontCache>,
	irq: UnsafeCell<IrqState>,
}

/// State only the interrupt handler touches.
struct IrqState {
	scan: ScanlineState,
	/// The cursor as it was at the start of this frame.
	cursor: Option<(u16, u16)>,
}

// -----------------------------------------------------------------------------
// Static and Const Data
// -----------------------------------------------------------------------------

/// DMA channels chained in a ring, playing one scan-line each.
pub const NUM_CHANS: usize = 3;

/// Line buffers used when each frame buffer row is sent more than once.
pub const NUM_FRAME_LINES: usize = 2;

const CURSOR_OFF: u32 = u32::MAX;

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

impl<H: Hardware> Dvhstx<H> {
	/// Make an engine. Nothing happens until `init`.
	pub const fn new(hw: H) -> Dvhstx<H> {
		Dvhstx {
			hw,
			inited: AtomicBool::new(false),
			flip_next: AtomicBool::new(false),
			frame_count: AtomicU32::new(0),
			palette: Palette::new(),
			cursor: AtomicU32::new(CURSOR_OFF),
			session: UnsafeCell::new(None),
		}
	}

	/// Start video.
	///
	/// Text modes ignore `width` and `height` and always give 91x30 cells.
	/// If video is already running it is stopped first. On error, video is
	/// left stopped and nothing is allocated or registered.
	///
	/// Panics if the chip can't make the pixel clock the timing needs.
	pub fn init(
		&'static self,
		width: u16,
		height: u16,
		mode: DisplayMode,
		double_buffered: bool,
		pinout: &Pinout,
	) -> Result<(), Error> {
		if self.inited.load(Ordering::Acquire) {
			self.reset();
		}

		let session = match Session::new(width, height, mode, double_buffered, pinout) {
			Ok(session) => session,
			Err(e) => {
				warn!("Can't start video at {}x{}: {:?}", width, height, e);
				return Err(e);
			}
		};
		let timing = session.geometry.timing;
		info!(
			"Video {:?} {}x{} on {} ({}x{} repeat)",
			mode,
			session.geometry.frame_width,
			session.geometry.frame_height,
			timing.name,
			session.geometry.h_repeat(),
			session.geometry.v_repeat()
		);

		let pll = match clock::find_pll(timing.system_clock_khz()) {
			Some(pll) => pll,
			None => panic!(
				"System clock of {} kHz cannot be exactly achieved",
				timing.system_clock_khz()
			),
		};

		if let Err(e) = self.hw.registration().install(self) {
			warn!("Another video engine is running");
			return Err(e);
		}

		self.flip_next.store(false, Ordering::Relaxed);
		self.frame_count.store(0, Ordering::Relaxed);
		self.cursor.store(CURSOR_OFF, Ordering::Relaxed);
		self.palette.reset();
		let session: &Session = critical_section::with(|_| {
			// Note (unsafe): The interrupt is off and `inited` is false, so
			// nothing else can be looking at the session
			unsafe { (*self.session.get()).insert(session) }
		});

		self.hw.configure_clock(&pll);
		debug!(
			"Clock: VCO {} MHz / {} / {}",
			pll.vco_freq.to_MHz(),
			pll.post_div1,
			pll.post_div2
		);

		self.hw.reset_serializer();
		self.hw
			.configure_serializer(&mode.expand_config(), &pinout.serializer_bits());
		self.hw.select_serializer_pins();
		self.hw.prioritise_dma();
		debug!("HSTX configured");

		for channel in 0..NUM_CHANS {
			self.hw.configure_dma_channel(
				channel,
				(channel + 1) % NUM_CHANS,
				&session.commands.vblank_vsync_off,
			);
		}
		self.hw.enable_dma_irq((1 << NUM_CHANS) - 1);
		self.hw.start_dma_channel(0);
		self.inited.store(true, Ordering::Release);
		info!("Video running");
		Ok(())
	}

	/// Stop video and free all the buffers.
	///
	/// Does nothing if video isn't running.
	pub fn reset(&self) {
		if !self.inited.swap(false, Ordering::AcqRel) {
			return;
		}
		critical_section::with(|_| {
			self.hw.disable_serializer();
			self.hw.disable_dma_irq();
			for channel in 0..NUM_CHANS {
				self.hw.abort_dma_channel(channel);
			}
			self.hw.registration().clear(self);
			// Note (unsafe): The interrupt is off and the DMA has stopped,
			// and `inited` being false keeps the accessors away
			unsafe { *self.session.get() = None };
		});
		self.flip_next.store(false, Ordering::Release);
		info!("Video stopped");
	}

	/// Handle the DMA interrupt: re-arm the channel that finished.
	///
	/// # Safety
	///
	/// Only call this from the DMA interrupt handler (or, in tests, from one
	/// thread at a time playing that part).
	#[inline(always)]
	pub unsafe fn on_dma_irq(&self) {
		let Some(session) = (*self.session.get()).as_ref() else {
			return;
		};
		let irq = &mut *session.irq.get();
		let step = irq
			.scan
			.step(session.geometry.timing, session.geometry.v_repeat_shift);
		self.hw.acknowledge_dma_irq(step.channel);

		match step.line {
			LineKind::VsyncOn => self
				.hw
				.reload_dma_channel(step.channel, &session.commands.vblank_vsync_on),
			LineKind::VsyncOff => self
				.hw
				.reload_dma_channel(step.channel, &session.commands.vblank_vsync_off),
			LineKind::Active {
				raster,
				row,
				slot,
				encode,
			} => {
				if encode {
					session.encode_line(raster, row, slot, irq.cursor, &self.palette);
				}
				self.hw
					.reload_dma_channel(step.channel, session.lines.line(slot));
			}
		}

		if step.frame_done {
			if self.flip_next.load(Ordering::Acquire) {
				session.frames.swap();
				self.flip_next.store(false, Ordering::Release);
			}
			irq.cursor = decode_cursor(self.cursor.load(Ordering::Relaxed));
			self.frame_count.fetch_add(1, Ordering::Release);
			self.hw.signal_event();
		}
	}

	fn session(&self) -> Option<&Session> {
		if !self.inited.load(Ordering::Acquire) {
			return None;
		}
		// Note (unsafe): The session is only replaced while `inited` is false
		unsafe { (*self.session.get()).as_ref() }
	}

	/// Flip at the end of this frame, and wait for it.
	pub fn flip_blocking(&self) {
		if !self.is_double_buffered() {
			return;
		}
		self.flip_async();
		self.wait_for_flip();
	}

	/// Ask for a flip at the end of this frame, and return straight away.
	///
	/// Don't touch the back buffer until `wait_for_flip` returns.
	pub fn flip_async(&self) {
		if self.is_double_buffered() {
			self.flip_next.store(true, Ordering::Release);
		}
	}

	/// Wait for a flip asked for with `flip_async` to happen.
	pub fn wait_for_flip(&self) {
		if !self.is_double_buffered() {
			return;
		}
		while self.flip_next.load(Ordering::Acquire) {
			self.hw.wait_for_event();
		}
	}

	/// Flip right now, wherever the beam is.
	///
	/// Only do this if you know the engine is not half way through a frame,
	/// or don't mind if it is.
	pub fn flip_now(&self) {
		if let Some(session) = self.session() {
			session.frames.swap();
		}
	}

	/// Wait for the end of the current frame.
	pub fn wait_for_vsync(&self) {
		if !self.is_inited() {
			return;
		}
		let start = self.frame_count.load(Ordering::Acquire);
		while self.frame_count.load(Ordering::Acquire) == start {
			self.hw.wait_for_event();
		}
	}

	/// Flip, and optionally copy what is now on screen into the new back
	/// buffer so you can carry on drawing over it.
	pub fn swap(&self, copy: bool) {
		self.flip_blocking();
		if !copy {
			return;
		}
		if let Some(session) = self.session().filter(|s| s.frames.is_double_buffered()) {
			let bytes = session.frames.bytes();
			// Note (unsafe): The IRQ only reads the display buffer, and the
			// back buffer belongs to us
			unsafe {
				let front = session.frames.display().view::<u8>(bytes);
				session.frames.back().view_mut::<u8>(bytes).copy_from_slice(front);
			}
		}
	}

	/// The frame buffer to draw into.
	///
	/// Empty if video isn't running. Pixels are `u16` in RGB565 mode, `u8`
	/// in the palette and mono text modes, and (glyph, attribute) `u8` pairs
	/// in the colour text mode, row after row.
	///
	/// # Safety
	///
	/// Don't keep the slice across a flip (it would become the display
	/// buffer), or across `reset` or `init`. When single buffered, what you
	/// write shows up immediately, possibly mid-frame.
	#[allow(clippy::mut_from_ref)]
	pub unsafe fn back_buffer<T: Pixel>(&self) -> &mut [T] {
		match self.session() {
			Some(session) => session.frames.back().view_mut(session.frames.bytes()),
			None => &mut [],
		}
	}

	/// The frame buffer being displayed.
	///
	/// # Safety
	///
	/// As for `back_buffer`. When single buffered this is the same memory as
	/// the back buffer.
	pub unsafe fn front_buffer<T: Pixel>(&self) -> &[T] {
		match self.session() {
			Some(session) => session.frames.display().view(session.frames.bytes()),
			None => &[],
		}
	}

	/// The colour table for `DisplayMode::Palette8`. Entries can be changed
	/// at any time.
	pub fn palette(&self) -> &Palette {
		&self.palette
	}

	/// Invert the text cell at column `x`, row `y`, from the next frame.
	pub fn set_cursor(&self, x: u16, y: u16) {
		self.cursor
			.store(u32::from(x) | (u32::from(y) << 16), Ordering::Relaxed);
	}

	/// Hide the text cursor, from the next frame.
	pub fn cursor_off(&self) {
		self.cursor.store(CURSOR_OFF, Ordering::Relaxed);
	}

	/// Frame buffer width in pixels (or text columns). Zero if not running.
	pub fn width(&self) -> u16 {
		self.session().map_or(0, |s| s.geometry.frame_width)
	}

	/// Frame buffer height in pixels (or text rows). Zero if not running.
	pub fn height(&self) -> u16 {
		self.session().map_or(0, |s| s.geometry.frame_height)
	}

	pub fn mode(&self) -> Option<DisplayMode> {
		self.session().map(|s| s.mode)
	}

	pub fn is_inited(&self) -> bool {
		self.inited.load(Ordering::Acquire)
	}

	pub fn is_double_buffered(&self) -> bool {
		self.session()
			.map_or(false, |s| s.frames.is_double_buffered())
	}

	/// Frames sent since `init`.
	pub fn frame_count(&self) -> u32 {
		self.frame_count.load(Ordering::Acquire)
	}
}

// Note (unsafe): The session is only written with the interrupt off, the
// IRQ state is only touched by the IRQ, and everything else is atomic.
unsafe impl<H: Hardware + Sync> Sync for Dvhstx<H> {}

impl Session {
	fn new(
		width: u16,
		height: u16,
		mode: DisplayMode,
		double_buffered: bool,
		pinout: &Pinout,
	) -> Result<Session, Error> {
		let geometry = mode::select_mode(width, height, mode)?;
		let encoder = LineEncoder::for_mode(mode, &geometry)?;
		pinout.validate()?;
		let commands = CommandLists::new(geometry.timing, mode.is_text());

		let frames = FramePair::try_new(geometry.frame_bytes(mode), double_buffered)?;
		let lines = LinePool::try_new(
			geometry.line_buffer_count(),
			&commands.active_header,
			geometry.line_payload_words(mode),
		)?;
		let font = match encoder.glyph_layout() {
			Some(layout) => Some(FontCache::try_new(&BUILTIN_FONT, layout)?),
			None => None,
		};
		debug!(
			"Buffers: {} x {} bytes, {} lines of {} words",
			if double_buffered { 2 } else { 1 },
			frames.bytes(),
			lines.count(),
			lines.line_words()
		);

		Ok(Session {
			mode,
			geometry,
			encoder,
			commands,
			frames,
			lines,
			font,
			irq: UnsafeCell::new(IrqState {
				scan: ScanlineState::new(),
				cursor: None,
			}),
		})
	}

	/// Encode one visible line into a line buffer.
	///
	/// # Safety
	///
	/// Only from the IRQ, and only into a slot no channel is reading.
	#[inline(always)]
	unsafe fn encode_line(
		&self,
		raster: u16,
		row: u16,
		slot: usize,
		cursor: Option<(u16, u16)>,
		palette: &Palette,
	) {
		let dst = self.lines.payload_mut(slot);
		let frame = self.frames.display().view::<u8>(self.frames.bytes());
		let stride = self.geometry.frame_stride(self.mode);
		let source_row = |row: usize| frame.get(row * stride..(row + 1) * stride).unwrap_or(&[]);

		match self.encoder {
			LineEncoder::Rgb565(repeat) => {
				encode::encode_rgb565(source_row(row as usize), dst, repeat);
			}
			LineEncoder::Palette8(repeat) => {
				encode::encode_palette8(source_row(row as usize), dst, repeat, palette);
			}
			LineEncoder::TextMono | LineEncoder::TextRgb111 => {
				let Some(font) = self.font.as_ref() else {
					return;
				};
				let height = self.geometry.text_row_height();
				let text_row = raster as usize / height;
				let sub_row = raster as usize % height;
				let cursor_col = cursor
					.filter(|(_, y)| *y as usize == text_row)
					.map(|(x, _)| x as usize);
				let cells = source_row(text_row);
				if self.encoder == LineEncoder::TextMono {
					encode::encode_text_mono(cells, dst, font, sub_row, cursor_col);
				} else {
					encode::encode_text_rgb111(cells, dst, font, sub_row, cursor_col);
				}
			}
		}
	}
}

fn decode_cursor(value: u32) -> Option<(u16, u16)> {
	if value == CURSOR_OFF {
		None
	} else {
		Some((value as u16, (value >> 16) as u16))
	}
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;
	use crate::hw::mock::{MockHardware, Op};

	type Engine = Dvhstx<MockHardware>;

	fn engine() -> &'static Engine {
		Box::leak(Box::new(Dvhstx::new(MockHardware::new())))
	}

	/// Play the IRQ until it re-arms a channel with visible line `raster`.
	/// Returns that channel.
	fn run_to_raster(engine: &Engine, raster: u16) -> usize {
		loop {
			let session = engine.session().unwrap();
			let (scanline, channel) = unsafe {
				let irq = &*session.irq.get();
				(irq.scan.scanline(), irq.scan.next_channel())
			};
			let wanted = session.geometry.timing.v_inactive_total() + raster;
			unsafe { engine.on_dma_irq() };
			if scanline == wanted {
				return channel;
			}
		}
	}

	/// Play the IRQ to the end of the current frame.
	fn run_frame(engine: &Engine) {
		let start = engine.frame_count();
		while engine.frame_count() == start {
			unsafe { engine.on_dma_irq() };
		}
	}

	fn payload(engine: &Engine, channel: usize) -> Vec<u32> {
		let session = engine.session().unwrap();
		let header = session.commands.active_header.len();
		engine.hw.transmitted(channel)[header..].to_vec()
	}

	#[test]
	fn start_up_sequence() {
		let engine = engine();
		engine
			.init(320, 180, DisplayMode::Rgb565, false, &Pinout::METRO_RP2350)
			.unwrap();
		let ops = engine.hw.ops();
		let pll = clock::find_pll(264_000).unwrap();
		let blank_len = commands::BLANK_LINE_WORDS;
		assert_eq!(ops[0], Op::ConfigureClock(pll));
		assert_eq!(ops[1], Op::ResetSerializer);
		assert!(matches!(ops[2], Op::ConfigureSerializer { .. }));
		assert_eq!(&ops[3..5], &[Op::SelectPins, Op::PrioritiseDma]);
		assert_eq!(
			&ops[5..],
			&[
				Op::ConfigureDma {
					channel: 0,
					chain_to: 1,
					len: blank_len
				},
				Op::ConfigureDma {
					channel: 1,
					chain_to: 2,
					len: blank_len
				},
				Op::ConfigureDma {
					channel: 2,
					chain_to: 0,
					len: blank_len
				},
				Op::EnableIrq(0b111),
				Op::Start(0),
			]
		);
		assert!(engine.is_inited());
		assert!(engine.hw.irq_enabled());
		assert!(engine.hw.registration().get().is_some());
		assert_eq!((engine.width(), engine.height()), (320, 180));
		assert_eq!(engine.mode(), Some(DisplayMode::Rgb565));
		assert!(!engine.is_double_buffered());
	}

	#[test]
	fn fill_and_swap_with_copy() {
		const C: u16 = 0xf81f;
		let engine = engine();
		engine
			.init(320, 180, DisplayMode::Rgb565, true, &Pinout::METRO_RP2350)
			.unwrap();
		unsafe { engine.back_buffer::<u16>() }.fill(C);

		let stop = AtomicBool::new(false);
		std::thread::scope(|s| {
			s.spawn(|| {
				while !stop.load(Ordering::Relaxed) {
					unsafe { engine.on_dma_irq() };
					std::thread::yield_now();
				}
			});
			engine.swap(true);
			stop.store(true, Ordering::Relaxed);
		});

		let back = unsafe { engine.back_buffer::<u16>() };
		assert_eq!(back.len(), 320 * 180);
		assert!(back.iter().all(|px| *px == C));
		let front = unsafe { engine.front_buffer::<u16>() };
		assert!(front.iter().all(|px| *px == C));
	}

	#[test]
	fn visible_lines_carry_the_frame_buffer() {
		let engine = engine();
		engine
			.init(320, 180, DisplayMode::Rgb565, false, &Pinout::METRO_RP2350)
			.unwrap();
		let back = unsafe { engine.back_buffer::<u16>() };
		back[..320].fill(0x1234);
		back[320..640].fill(0x5678);

		let channel = run_to_raster(engine, 0);
		let line = engine.hw.transmitted(channel);
		assert_eq!(&line[..7], &engine.session().unwrap().commands.active_header[..]);
		assert_eq!(line.len(), 7 + 640);
		assert!(line[7..].iter().all(|w| *w == 0x1234_1234));

		// Frame buffer row 1 starts at raster line 4
		let channel = run_to_raster(engine, 4);
		assert!(payload(engine, channel).iter().all(|w| *w == 0x5678_5678));
	}

	#[test]
	fn unsupported_size_leaves_nothing_behind() {
		let engine = engine();
		assert_eq!(
			engine.init(333, 181, DisplayMode::Rgb565, true, &Pinout::METRO_RP2350),
			Err(Error::UnsupportedResolution {
				width: 333,
				height: 181
			})
		);
		assert!(!engine.is_inited());
		assert!(engine.hw.ops().is_empty());
		assert!(engine.hw.registration().get().is_none());
		assert!(unsafe { engine.back_buffer::<u16>() }.is_empty());

		engine
			.init(320, 180, DisplayMode::Rgb565, true, &Pinout::METRO_RP2350)
			.unwrap();
		assert!(engine.is_inited());
		assert_eq!(unsafe { engine.back_buffer::<u16>() }.len(), 320 * 180);
	}

	#[test]
	fn other_bad_configurations() {
		let engine = engine();
		assert_eq!(
			engine.init(640, 480, DisplayMode::Rgb888, false, &Pinout::METRO_RP2350),
			Err(Error::UnsupportedMode)
		);
		let pinout = Pinout {
			clk_p: 2,
			rgb_p: [18, 16, 12],
		};
		assert_eq!(
			engine.init(640, 480, DisplayMode::Rgb565, false, &pinout),
			Err(Error::InvalidPinout)
		);
		assert!(!engine.is_inited());
		assert!(engine.hw.ops().is_empty());
	}

	#[test]
	fn flips_wait_for_the_frame_boundary() {
		let engine = engine();
		engine
			.init(640, 480, DisplayMode::Rgb565, true, &Pinout::METRO_RP2350)
			.unwrap();
		let first_front = unsafe { engine.front_buffer::<u8>() }.as_ptr();
		let first_back = unsafe { engine.back_buffer::<u8>() }.as_ptr();

		engine.flip_async();
		let start = engine.frame_count();
		loop {
			unsafe { engine.on_dma_irq() };
			let front = unsafe { engine.front_buffer::<u8>() }.as_ptr();
			if engine.frame_count() == start {
				assert_eq!(front, first_front);
			} else {
				assert_eq!(front, first_back);
				break;
			}
		}

		// No second flip without another request
		run_frame(engine);
		assert_eq!(unsafe { engine.front_buffer::<u8>() }.as_ptr(), first_back);

		// `flip_now` swaps exactly once per call
		engine.flip_now();
		assert_eq!(unsafe { engine.front_buffer::<u8>() }.as_ptr(), first_front);
		engine.flip_now();
		assert_eq!(unsafe { engine.front_buffer::<u8>() }.as_ptr(), first_back);
	}

	#[test]
	fn single_buffered_flips_do_nothing() {
		let engine = engine();
		engine
			.init(640, 480, DisplayMode::Rgb565, false, &Pinout::METRO_RP2350)
			.unwrap();
		let front = unsafe { engine.front_buffer::<u8>() }.as_ptr();
		assert_eq!(front, unsafe { engine.back_buffer::<u8>() }.as_ptr());
		// None of these may block
		engine.flip_blocking();
		engine.flip_async();
		engine.wait_for_flip();
		engine.swap(true);
		engine.flip_now();
		run_frame(engine);
		assert_eq!(unsafe { engine.front_buffer::<u8>() }.as_ptr(), front);
	}

	#[test]
	fn wait_for_vsync_returns_at_the_next_frame() {
		let engine = engine();
		engine
			.init(640, 480, DisplayMode::Rgb565, false, &Pinout::METRO_RP2350)
			.unwrap();
		let stop = AtomicBool::new(false);
		std::thread::scope(|s| {
			s.spawn(|| {
				while !stop.load(Ordering::Relaxed) {
					unsafe { engine.on_dma_irq() };
					std::thread::yield_now();
				}
			});
			let start = engine.frame_count();
			engine.wait_for_vsync();
			assert!(engine.frame_count() > start);
			stop.store(true, Ordering::Relaxed);
		});
	}

	#[test]
	fn palette_writes_apply_to_later_lines_only() {
		let engine = engine();
		engine
			.init(320, 180, DisplayMode::Palette8, false, &Pinout::METRO_RP2350)
			.unwrap();
		unsafe { engine.back_buffer::<u8>() }.fill(1);
		engine.palette().set(1, Rgb888::new(0xff, 0, 0));

		let channel = run_to_raster(engine, 0);
		assert!(payload(engine, channel).iter().all(|w| *w == 0x00ff_0000));

		// Already encoded, so unchanged
		engine.palette().set(1, Rgb888::new(0, 0, 0xff));
		assert!(payload(engine, channel).iter().all(|w| *w == 0x00ff_0000));

		// Next frame picks it up
		run_frame(engine);
		let channel = run_to_raster(engine, 0);
		assert!(payload(engine, channel).iter().all(|w| *w == 0x0000_00ff));
	}

	#[test]
	fn cursor_inverts_one_cell() {
		let engine = engine();
		engine
			.init(0, 0, DisplayMode::TextRgb111, false, &Pinout::METRO_RP2350)
			.unwrap();
		assert_eq!((engine.width(), engine.height()), (91, 30));
		let cells = unsafe { engine.back_buffer::<u8>() };
		for cell in cells.chunks_exact_mut(2) {
			cell[0] = b' ';
			cell[1] = Attr::new(TextColour::White, TextColour::Black).as_u8();
		}

		let inverted = |engine: &Engine, raster: u16| -> Vec<usize> {
			let channel = run_to_raster(engine, raster);
			let words = payload(engine, channel);
			words
				.iter()
				.flat_map(|w| w.to_le_bytes())
				.enumerate()
				.filter(|(_, b)| *b == 0xff)
				.map(|(idx, _)| idx)
				.collect()
		};

		engine.set_cursor(2, 1);
		// Takes effect from the next frame
		run_frame(engine);
		assert!(inverted(engine, 24).len() == 13);
		assert_eq!(inverted(engine, 30), (28..41).collect::<Vec<_>>());
		// Other text rows are untouched
		assert!(inverted(engine, 48).is_empty());

		engine.cursor_off();
		run_frame(engine);
		assert!(inverted(engine, 24).is_empty());
	}

	#[test]
	fn text_lines_show_glyphs() {
		let engine = engine();
		engine
			.init(0, 0, DisplayMode::TextMono, false, &Pinout::METRO_RP2350)
			.unwrap();
		let cells = unsafe { engine.back_buffer::<u8>() };
		assert_eq!(cells.len(), 91 * 30);
		cells[91] = b'H';

		let channel = run_to_raster(engine, 24 + 10);
		let words = payload(engine, channel);
		assert_eq!(words.len(), 91);
		assert_eq!(words[0], BUILTIN_FONT.render_char_line(b'H', 10));
		assert!(words[1..].iter().all(|w| *w == 0));
	}

	#[test]
	fn reset_tears_everything_down() {
		let engine = engine();
		// Not running: nothing to do
		engine.reset();
		assert!(engine.hw.ops().is_empty());

		engine
			.init(640, 480, DisplayMode::Rgb565, true, &Pinout::METRO_RP2350)
			.unwrap();
		engine.hw.clear_ops();
		engine.reset();
		assert_eq!(
			engine.hw.ops(),
			[
				Op::DisableSerializer,
				Op::DisableIrq,
				Op::Abort(0),
				Op::Abort(1),
				Op::Abort(2)
			]
		);
		assert!(!engine.is_inited());
		assert!(!engine.hw.irq_enabled());
		assert!(engine.hw.registration().get().is_none());
		assert_eq!(engine.width(), 0);
		assert!(unsafe { engine.front_buffer::<u8>() }.is_empty());

		// Twice is harmless
		engine.hw.clear_ops();
		engine.reset();
		assert!(engine.hw.ops().is_empty());

		// And it can start again
		engine
			.init(0, 0, DisplayMode::TextRgb111, false, &Pinout::METRO_RP2350)
			.unwrap();
		assert_eq!(engine.mode(), Some(DisplayMode::TextRgb111));
	}

	#[test]
	fn init_while_running_restarts() {
		let engine = engine();
		engine
			.init(640, 480, DisplayMode::Rgb565, false, &Pinout::METRO_RP2350)
			.unwrap();
		run_frame(engine);
		engine.hw.clear_ops();
		engine
			.init(400, 300, DisplayMode::Palette8, true, &Pinout::METRO_RP2350)
			.unwrap();
		let ops = engine.hw.ops();
		assert_eq!(ops[0], Op::DisableSerializer);
		assert_eq!(engine.frame_count(), 0);
		assert_eq!((engine.width(), engine.height()), (400, 300));
	}
}

// -----------------------------------------------------------------------------
// End of file
// -----------------------------------------------------------------------------
