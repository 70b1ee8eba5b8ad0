//! The display surface: terminal mode, geometry, key polling and composite
//! refresh of many blocks on one screen.
//!
//! ```no_run
//! use std::time::Duration;
//! use blocktop::{Block, Console, row};
//!
//! let mut console = Console::new();
//! let mut servers = Block::new(["Server", "QPS"]);
//! let mut raw = console.raw_mode();
//! loop {
//!     servers.reset(vec![row!["db1", 12345]]);
//!     raw.refresh([&mut servers]).unwrap();
//!     if raw.check_button(Duration::from_secs(2)).unwrap() == Some(b'q') {
//!         break;
//!     }
//! }
//! ```

pub mod geometry;
pub mod mock;
mod mode;
pub mod terminal;

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::block::Printable;
use crate::error::RenderError;
use crate::style::Styles;

pub use geometry::Geometry;
pub use mode::{CookedMode, RawMode};
#[cfg(unix)]
pub use terminal::StdTerminal;
pub use terminal::Terminal;

/// Console settings.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Rows assumed when the window size cannot be queried.
    pub fallback_height: u16,
    /// Columns assumed when the window size cannot be queried.
    pub fallback_width: u16,
    /// Sleep between input checks in [`Console::check_button`].
    pub poll_step: Duration,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            fallback_height: 20,
            fallback_width: 80,
            poll_step: Duration::from_millis(100),
        }
    }
}

/// Owns the terminal for the lifetime of the process.
pub struct Console<T: Terminal> {
    terminal: T,
    config: ConsoleConfig,
    geometry: Arc<Geometry>,
    last_check: Option<Instant>,
    input_closed: bool,
    /// Present only while raw mode is engaged.
    saved_mode: Option<T::Mode>,
    resize_hook: Option<signal_hook::SigId>,
}

#[cfg(unix)]
impl Console<StdTerminal> {
    /// Console on stdin/stdout, tracking window resizes.
    pub fn new() -> Self {
        Self::with_config(ConsoleConfig::default())
    }

    pub fn with_config(config: ConsoleConfig) -> Self {
        let fallback = (config.fallback_height, config.fallback_width);
        let mut console = Self::with_terminal(StdTerminal::new(), config);
        match geometry::watch_resize(Arc::clone(&console.geometry), fallback) {
            Ok(id) => console.resize_hook = Some(id),
            Err(e) => warn!("Failed to watch terminal resizes: {}", e),
        }
        console
    }
}

#[cfg(unix)]
impl Default for Console<StdTerminal> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Terminal> Console<T> {
    /// Console on an arbitrary terminal. Resizes are not tracked; update the
    /// handle from [`Console::geometry_handle`] instead.
    pub fn with_terminal(terminal: T, config: ConsoleConfig) -> Self {
        let (height, width) = terminal
            .window_size()
            .unwrap_or((config.fallback_height, config.fallback_width));
        debug!(height, width, "initial terminal geometry");
        Self {
            terminal,
            config,
            geometry: Arc::new(Geometry::new(height, width)),
            last_check: None,
            input_closed: false,
            saved_mode: None,
            resize_hook: None,
        }
    }

    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut T {
        &mut self.terminal
    }

    /// Current `(rows, columns)`.
    pub fn geometry(&self) -> (u16, u16) {
        self.geometry.get()
    }

    /// Shared geometry cell, as updated by the resize handler.
    pub fn geometry_handle(&self) -> Arc<Geometry> {
        Arc::clone(&self.geometry)
    }

    /// Returns `true` once a read has hit the end of input.
    pub fn input_closed(&self) -> bool {
        self.input_closed
    }

    /// Returns `true` while raw mode is engaged.
    pub fn is_raw(&self) -> bool {
        self.saved_mode.is_some()
    }

    /// Hides typed keys and delivers them one byte at a time until the guard
    /// is dropped. Does nothing if input is not an interactive terminal.
    pub fn raw_mode(&mut self) -> RawMode<'_, T> {
        RawMode::new(self)
    }

    /// Restores normal line input until the guard is dropped.
    pub fn cooked_mode(&mut self) -> CookedMode<'_, T> {
        CookedMode::new(self)
    }

    /// Returns `true` if raw mode was engaged by this call.
    fn enter_raw(&mut self) -> bool {
        if self.saved_mode.is_some() {
            return false;
        }
        match self.terminal.enter_cbreak() {
            Ok(mode) => {
                debug!("raw mode engaged");
                self.saved_mode = Some(mode);
                true
            }
            Err(e) => {
                debug!("raw mode unavailable: {}", e);
                false
            }
        }
    }

    fn leave_raw(&mut self) {
        if let Some(mode) = self.saved_mode.take() {
            match self.terminal.restore(&mode) {
                Ok(()) => debug!("terminal mode restored"),
                Err(e) => warn!("Failed to restore terminal mode: {}", e),
            }
        }
    }

    fn read_one(&mut self) -> io::Result<Option<u8>> {
        loop {
            match self.terminal.read_byte() {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Ok(None) => {
                    if !self.input_closed {
                        debug!("end of input");
                        self.input_closed = true;
                    }
                    return Ok(None);
                }
                other => return other,
            }
        }
    }

    /// Blocks until one key is pressed. `None` only when input is closed.
    pub fn wait_button(&mut self) -> io::Result<Option<u8>> {
        self.read_one()
    }

    /// Waits up to `wait` for one key press.
    ///
    /// Time spent since the previous call returned is deducted from `wait`,
    /// so calling this once per cycle with a fixed interval keeps a steady
    /// cadence whatever the cost of the work in between. Closed input still
    /// waits out the interval; see [`Console::input_closed`].
    pub fn check_button(&mut self, wait: Duration) -> io::Result<Option<u8>> {
        let mut remaining = wait;
        if let Some(last) = self.last_check {
            let spent = self.terminal.now().saturating_duration_since(last);
            remaining = remaining.saturating_sub(spent);
        }

        let step = self.config.poll_step.max(Duration::from_millis(1));
        let mut ready = self.terminal.input_ready()?;
        while !remaining.is_zero() && !ready {
            self.terminal.sleep(step);
            remaining = remaining.saturating_sub(step);
            ready = self.terminal.input_ready()?;
        }

        let key = if ready { self.read_one()? } else { None };
        if ready && key.is_none() {
            // End of input polls as ready forever.
            self.terminal.sleep(remaining);
        }
        self.last_check = Some(self.terminal.now());
        Ok(key)
    }

    /// Clears the screen and prints `blocks` top to bottom, each getting its
    /// rows plus two lines while there is room.
    ///
    /// Empty blocks are skipped. A block whose output fails to write is
    /// abandoned and the rest are still printed; a cell that cannot be
    /// formatted aborts the refresh.
    pub fn refresh<'b, B, I>(&mut self, blocks: I) -> Result<(), RenderError>
    where
        I: IntoIterator<Item = &'b mut B>,
        B: Printable + ?Sized + 'b,
    {
        let (height, width) = self.geometry.get();
        let styled = self.terminal.is_tty();

        if let Err(e) = Styles::clear_screen(&mut self.terminal) {
            warn!("Failed to clear screen: {}", e);
        }

        let mut left_height = usize::from(height);
        for block in blocks {
            let rows = block.len();
            if rows == 0 {
                continue;
            }
            // Not enough room for a header and a row.
            if left_height <= 2 {
                break;
            }

            let block_height = (rows + 2).min(left_height);
            match block.print(&mut self.terminal, block_height, usize::from(width), styled) {
                Ok(()) => {
                    left_height -= block_height;
                    if left_height >= 2 {
                        match writeln!(self.terminal) {
                            Ok(()) => left_height -= 1,
                            Err(e) => warn!("Failed to write block separator: {}", e),
                        }
                    }
                }
                Err(RenderError::Io(e)) => warn!("Abandoned block output: {}", e),
                Err(e) => return Err(e),
            }
        }

        if let Err(e) = self.terminal.flush() {
            warn!("Failed to flush output: {}", e);
        }
        Ok(())
    }

    /// Prompts for each name in turn and returns the answers, stopping at the
    /// first blank one. Input is cooked while prompting.
    pub fn ask_for_input(&mut self, names: &[&str]) -> io::Result<Vec<String>> {
        let mut cooked = self.cooked_mode();
        let terminal = &mut cooked.terminal;

        writeln!(terminal)?;
        let mut values = Vec::new();
        for name in names {
            write!(terminal, "{}: ", name)?;
            terminal.flush()?;
            match terminal.read_line()? {
                Some(value) if !value.is_empty() => values.push(value),
                _ => break,
            }
        }
        Ok(values)
    }
}

impl<T: Terminal> Drop for Console<T> {
    fn drop(&mut self) {
        self.leave_raw();
        if let Some(id) = self.resize_hook.take() {
            signal_hook::low_level::unregister(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use crate::block::Block;
    use crate::cell::{Cell, ColorStr};
    use crate::console::mock::{MockTerminal, ModeChange};
    use crate::row;

    const CLEAR: &str = "\x1b[2J\x1b[1;1H";

    fn console(term: MockTerminal) -> Console<MockTerminal> {
        Console::with_terminal(term, ConsoleConfig::default())
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Records the budget it was given and prints one line per row.
    struct Probe {
        rows: usize,
        calls: Vec<(usize, usize)>,
        fail: bool,
    }

    impl Probe {
        fn new(rows: usize) -> Self {
            Self {
                rows,
                calls: Vec::new(),
                fail: false,
            }
        }

        fn failing(rows: usize) -> Self {
            Self {
                fail: true,
                ..Self::new(rows)
            }
        }
    }

    impl Printable for Probe {
        fn len(&self) -> usize {
            self.rows
        }

        fn print(
            &mut self,
            out: &mut dyn Write,
            height: usize,
            width: usize,
            _styled: bool,
        ) -> Result<(), RenderError> {
            self.calls.push((height, width));
            if self.fail {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone").into());
            }
            writeln!(out, "probe {}", height)?;
            Ok(())
        }
    }

    // --- geometry ---

    #[test]
    fn test_geometry_from_terminal() {
        let console = console(MockTerminal::new().with_size(40, 120));
        assert_eq!(console.geometry(), (40, 120));
    }

    #[test]
    fn test_geometry_fallback() {
        let console = console(MockTerminal::non_interactive());
        assert_eq!(console.geometry(), (20, 80));
    }

    #[test]
    fn test_resize_is_seen_by_next_refresh() {
        let mut console = console(MockTerminal::new().with_size(20, 80));
        console.geometry_handle().set(30, 100);
        let mut probe = Probe::new(3);
        console.refresh([&mut probe]).unwrap();
        assert_eq!(probe.calls, vec![(5, 100)]);
    }

    // --- raw mode ---

    #[test]
    fn test_raw_mode_restored_on_drop() {
        let mut console = console(MockTerminal::new());
        {
            let raw = console.raw_mode();
            assert!(raw.is_raw());
            assert_eq!(raw.terminal().modes(), &[ModeChange::Cbreak]);
        }
        assert!(!console.is_raw());
        assert_eq!(
            console.terminal().modes(),
            &[ModeChange::Cbreak, ModeChange::Restore]
        );
    }

    #[test]
    fn test_raw_mode_skipped_without_terminal() {
        let mut console = console(MockTerminal::non_interactive());
        {
            let raw = console.raw_mode();
            assert!(!raw.is_raw());
        }
        assert!(console.terminal().modes().is_empty());
    }

    #[test]
    fn test_nested_raw_mode_restores_once() {
        let mut console = console(MockTerminal::new());
        {
            let mut outer = console.raw_mode();
            {
                let inner = outer.raw_mode();
                assert!(inner.is_raw());
            }
            assert!(outer.is_raw());
        }
        assert_eq!(
            console.terminal().modes(),
            &[ModeChange::Cbreak, ModeChange::Restore]
        );
    }

    #[test]
    fn test_raw_mode_restored_on_panic() {
        let mut console = console(MockTerminal::new());
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _raw = console.raw_mode();
            panic!("render failed");
        }));
        assert!(result.is_err());
        assert!(!console.is_raw());
        assert_eq!(
            console.terminal().modes(),
            &[ModeChange::Cbreak, ModeChange::Restore]
        );
    }

    #[test]
    fn test_leave_raw_after_leaked_guard() {
        let mut console = console(MockTerminal::new());
        std::mem::forget(console.raw_mode());
        assert!(console.is_raw());
        console.leave_raw();
        assert_eq!(
            console.terminal().modes(),
            &[ModeChange::Cbreak, ModeChange::Restore]
        );
    }

    // --- keys ---

    #[test]
    fn test_wait_button_blocks_until_key() {
        let mut console = console(MockTerminal::new());
        console.terminal_mut().push_input_at(ms(2000), b"q");
        assert_eq!(console.wait_button().unwrap(), Some(b'q'));
        assert_eq!(console.terminal().elapsed(), ms(2000));
    }

    #[test]
    fn test_wait_button_retries_interrupted() {
        let mut console = console(MockTerminal::new());
        console.terminal_mut().push_input(b"x");
        console.terminal_mut().interrupt_reads(3);
        assert_eq!(console.wait_button().unwrap(), Some(b'x'));
    }

    #[test]
    fn test_check_button_times_out() {
        let mut console = console(MockTerminal::new());
        assert_eq!(console.check_button(ms(1000)).unwrap(), None);
        assert_eq!(console.terminal().elapsed(), ms(1000));
    }

    #[test]
    fn test_check_button_returns_ready_key_immediately() {
        let mut console = console(MockTerminal::new());
        console.terminal_mut().push_input(b"p");
        assert_eq!(console.check_button(ms(1000)).unwrap(), Some(b'p'));
        assert_eq!(console.terminal().elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_check_button_key_during_wait() {
        let mut console = console(MockTerminal::new());
        console.terminal_mut().push_input_at(ms(350), b"k");
        assert_eq!(console.check_button(ms(1000)).unwrap(), Some(b'k'));
        assert_eq!(console.terminal().elapsed(), ms(400));
    }

    #[test]
    fn test_check_button_deducts_work_between_calls() {
        let mut console = console(MockTerminal::new());
        console.check_button(ms(1000)).unwrap();
        console.terminal_mut().advance(ms(300));
        console.check_button(ms(1000)).unwrap();
        // One second per cycle including the 0.3s of work.
        assert_eq!(console.terminal().elapsed(), ms(2000));
    }

    #[test]
    fn test_check_button_steady_cadence() {
        let mut console = console(MockTerminal::new());
        console.check_button(ms(1000)).unwrap();
        for cycle in 2..=5 {
            console.terminal_mut().advance(ms(200));
            console.check_button(ms(1000)).unwrap();
            assert_eq!(console.terminal().elapsed(), Duration::from_secs(cycle));
        }
    }

    #[test]
    fn test_check_button_overrun_does_not_sleep() {
        let mut console = console(MockTerminal::new());
        console.check_button(ms(1000)).unwrap();
        console.terminal_mut().advance(ms(1500));
        assert_eq!(console.check_button(ms(1000)).unwrap(), None);
        assert_eq!(console.terminal().elapsed(), ms(2500));
    }

    #[test]
    fn test_check_button_waits_on_closed_input() {
        let mut console = console(MockTerminal::new());
        console.terminal_mut().close_input();
        assert_eq!(console.check_button(ms(1000)).unwrap(), None);
        assert_eq!(console.terminal().elapsed(), ms(1000));
        assert!(console.input_closed());

        console.terminal_mut().advance(ms(200));
        assert_eq!(console.check_button(ms(1000)).unwrap(), None);
        assert_eq!(console.terminal().elapsed(), ms(2000));
    }

    #[test]
    fn test_check_button_reads_pending_keys_before_close() {
        let mut console = console(MockTerminal::new());
        console.terminal_mut().push_input(b"p");
        console.terminal_mut().close_input();
        assert_eq!(console.check_button(ms(1000)).unwrap(), Some(b'p'));
        assert!(!console.input_closed());
        assert_eq!(console.check_button(ms(1000)).unwrap(), None);
        assert!(console.input_closed());
    }

    #[test]
    fn test_wait_button_marks_input_closed() {
        let mut console = console(MockTerminal::new());
        console.terminal_mut().close_input();
        assert_eq!(console.wait_button().unwrap(), None);
        assert!(console.input_closed());
    }

    // --- refresh ---

    #[test]
    fn test_refresh_nothing_only_clears() {
        let mut console = console(MockTerminal::new());
        console.refresh(Vec::<&mut Block>::new()).unwrap();
        assert_eq!(console.terminal().output(), CLEAR);
    }

    #[test]
    fn test_refresh_skips_empty_block() {
        let mut console = console(MockTerminal::new());
        let mut block = Block::new(["Server", "QPS"]);
        block.reset(Vec::new());
        console.refresh([&mut block]).unwrap();
        assert_eq!(console.terminal().output(), CLEAR);
    }

    #[test]
    fn test_refresh_budgets_height() {
        let mut console = console(MockTerminal::new().with_size(20, 80));
        let mut a = Probe::new(3);
        let mut b = Probe::new(30);
        let mut c = Probe::new(5);
        let blocks: [&mut dyn Printable; 3] = [&mut a, &mut b, &mut c];
        console.refresh(blocks).unwrap();
        // 5 lines for a, one separator, the remaining 14 for b.
        assert_eq!(a.calls, vec![(5, 80)]);
        assert_eq!(b.calls, vec![(14, 80)]);
        assert!(c.calls.is_empty());
    }

    #[test]
    fn test_refresh_stops_without_room_for_header_and_row() {
        let mut console = console(MockTerminal::new().with_size(8, 80));
        let mut a = Probe::new(3);
        let mut b = Probe::new(1);
        console.refresh([&mut a, &mut b]).unwrap();
        assert_eq!(a.calls, vec![(5, 80)]);
        assert!(b.calls.is_empty());
        assert_eq!(console.terminal().output(), format!("{}probe 5\n\n", CLEAR));
    }

    #[test]
    fn test_refresh_empty_block_takes_no_space() {
        let mut console = console(MockTerminal::new().with_size(20, 80));
        let mut a = Probe::new(0);
        let mut b = Probe::new(2);
        console.refresh([&mut a, &mut b]).unwrap();
        assert!(a.calls.is_empty());
        assert_eq!(b.calls, vec![(4, 80)]);
    }

    #[test]
    fn test_refresh_continues_after_write_failure() {
        let mut console = console(MockTerminal::new().with_size(20, 80));
        let mut broken = Probe::failing(3);
        let mut ok = Probe::new(3);
        console.refresh([&mut broken, &mut ok]).unwrap();
        assert_eq!(broken.calls, vec![(5, 80)]);
        // The failed block's lines are not deducted.
        assert_eq!(ok.calls, vec![(5, 80)]);
        assert!(console.terminal().output().ends_with("probe 5\n\n"));
    }

    #[test]
    fn test_refresh_survives_broken_output() {
        let mut console = console(MockTerminal::new());
        console.terminal_mut().set_fail_writes(true);
        let mut block = Block::new(["A"]);
        block.reset(vec![row![1]]);
        assert!(console.refresh([&mut block]).is_ok());
    }

    #[test]
    fn test_refresh_format_error_is_fatal() {
        struct Broken;
        impl std::fmt::Display for Broken {
            fn fmt(&self, _: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                Err(std::fmt::Error)
            }
        }

        let mut console = console(MockTerminal::new());
        let mut block = Block::new(["A"]);
        block.reset(vec![vec![Cell::display(Broken)]]);
        let err = console.refresh([&mut block]).unwrap_err();
        assert!(matches!(err, RenderError::Format(_)));
    }

    #[test]
    fn test_refresh_styles_only_on_tty() {
        let mut block = Block::new(["Server", "State"]);
        block.reset(vec![row!["db1", ColorStr::colored("up", crate::Color::Green)]]);

        let mut piped = console(MockTerminal::non_interactive());
        piped.refresh([&mut block]).unwrap();
        let out = piped.terminal().output();
        assert_eq!(
            out.strip_prefix(CLEAR).unwrap(),
            "Server  State \ndb1     up    \n\n"
        );

        let mut tty = console(MockTerminal::new());
        tty.refresh([&mut block]).unwrap();
        assert!(tty.terminal().output().contains("\x1b[1mServer  \x1b[0m"));
    }

    #[test]
    fn test_refresh_real_blocks_layout() {
        let mut console = console(MockTerminal::non_interactive().with_size(10, 40));
        let mut servers = Block::new(["Server", "QPS"]);
        let mut ops = Block::new(["Op", "Time"]);
        servers.reset(vec![row!["db1", 15_000_000], row!["db2", 999]]);
        ops.reset((0..10).map(|i| row!["query", i]).collect());
        console.refresh([&mut servers, &mut ops]).unwrap();

        let out = console.terminal_mut().take_output();
        let lines: Vec<&str> = out.strip_prefix(CLEAR).unwrap().lines().collect();
        // servers: header + 2 rows + separator; ops: 5 lines left, 3 rows fit.
        assert_eq!(lines.len(), 4 + 4);
        assert_eq!(lines[1], "db1     15M   ");
        assert_eq!(lines[3], "");
        assert_eq!(lines[4].trim_end(), "Op    Time");
        assert_eq!(lines[7].trim_end(), "query  2");
    }

    // --- prompts ---

    #[test]
    fn test_ask_for_input_stops_at_blank() {
        let mut console = console(MockTerminal::new());
        console.terminal_mut().push_input(b"Alice\n\nignored\n");
        let values = console.ask_for_input(&["name", "email", "phone"]).unwrap();
        assert_eq!(values, vec!["Alice".to_string()]);
        assert_eq!(console.terminal().output(), "\nname: email: ");
    }

    #[test]
    fn test_ask_for_input_first_blank() {
        let mut console = console(MockTerminal::new());
        console.terminal_mut().push_input(b"\n");
        assert!(console.ask_for_input(&["name", "email"]).unwrap().is_empty());
    }

    #[test]
    fn test_ask_for_input_all_answered() {
        let mut console = console(MockTerminal::new());
        console.terminal_mut().push_input(b"Alice\nalice@example.com\n");
        let values = console.ask_for_input(&["name", "email"]).unwrap();
        assert_eq!(values, vec!["Alice", "alice@example.com"]);
    }

    #[test]
    fn test_ask_for_input_end_of_input() {
        let mut console = console(MockTerminal::new());
        console.terminal_mut().push_input(b"Alice\n");
        let values = console.ask_for_input(&["name", "email"]).unwrap();
        assert_eq!(values, vec!["Alice"]);
    }

    #[test]
    fn test_ask_for_input_cooks_then_restores_raw() {
        let mut console = console(MockTerminal::new());
        {
            let mut raw = console.raw_mode();
            raw.terminal_mut().push_input(b"\n");
            raw.ask_for_input(&["name"]).unwrap();
            assert!(raw.is_raw());
        }
        assert_eq!(
            console.terminal().modes(),
            &[
                ModeChange::Cbreak,
                ModeChange::Restore,
                ModeChange::Cbreak,
                ModeChange::Restore,
            ]
        );
    }

    #[test]
    fn test_ask_for_input_restores_raw_on_error() {
        let mut console = console(MockTerminal::new());
        let mut raw = console.raw_mode();
        raw.terminal_mut().set_fail_writes(true);
        assert!(raw.ask_for_input(&["name"]).is_err());
        assert!(raw.is_raw());
    }

    #[test]
    fn test_ask_for_input_outside_raw_leaves_mode_alone() {
        let mut console = console(MockTerminal::new());
        console.terminal_mut().push_input(b"x\n");
        console.ask_for_input(&["name"]).unwrap();
        assert!(console.terminal().modes().is_empty());
        assert!(!console.is_raw());
    }
}
