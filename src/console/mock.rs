//! Scripted terminal for tests.
//!
//! Input bytes can be scheduled at points on a virtual clock that only moves
//! when the console sleeps or blocks on a read, so timing behaviour can be
//! checked exactly.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::time::{Duration, Instant};

use super::terminal::Terminal;

/// Mode transitions recorded by [`MockTerminal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChange {
    Cbreak,
    Restore,
}

#[derive(Debug)]
pub struct MockTerminal {
    input: VecDeque<(Duration, u8)>,
    interrupts: usize,
    output: Vec<u8>,
    tty: bool,
    size: Option<(u16, u16)>,
    modes: Vec<ModeChange>,
    origin: Instant,
    elapsed: Duration,
    fail_writes: bool,
    closed: bool,
}

impl MockTerminal {
    /// An interactive 24x80 terminal.
    pub fn new() -> Self {
        Self {
            input: VecDeque::new(),
            interrupts: 0,
            output: Vec::new(),
            tty: true,
            size: Some((24, 80)),
            modes: Vec::new(),
            origin: Instant::now(),
            elapsed: Duration::ZERO,
            fail_writes: false,
            closed: false,
        }
    }

    /// Output redirected to a pipe: no terminal modes, no window size.
    pub fn non_interactive() -> Self {
        Self {
            tty: false,
            size: None,
            ..Self::new()
        }
    }

    pub fn with_size(mut self, height: u16, width: u16) -> Self {
        self.size = Some((height, width));
        self
    }

    /// Queues bytes that are available immediately.
    pub fn push_input(&mut self, bytes: &[u8]) {
        let now = self.elapsed;
        self.push_input_at(now, bytes);
    }

    /// Queues bytes that become available once the clock reaches `at`.
    pub fn push_input_at(&mut self, at: Duration, bytes: &[u8]) {
        self.input.extend(bytes.iter().map(|&b| (at, b)));
    }

    /// Ends input after the queued bytes: once they are consumed, input polls
    /// as ready and reads return end of file, like stdin from `/dev/null`.
    pub fn close_input(&mut self) {
        self.closed = true;
    }

    /// Makes the next `count` reads fail with `Interrupted`.
    pub fn interrupt_reads(&mut self, count: usize) {
        self.interrupts = count;
    }

    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Moves the virtual clock forward, as if the caller did some work.
    pub fn advance(&mut self, duration: Duration) {
        self.elapsed += duration;
    }

    /// Virtual time since creation.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn modes(&self) -> &[ModeChange] {
        &self.modes
    }

    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    /// Returns everything written so far and clears the buffer.
    pub fn take_output(&mut self) -> String {
        let out = self.output();
        self.output.clear();
        out
    }
}

impl Default for MockTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for MockTerminal {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock write failure"));
        }
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock flush failure"));
        }
        Ok(())
    }
}

impl Terminal for MockTerminal {
    type Mode = usize;

    fn enter_cbreak(&mut self) -> io::Result<usize> {
        if !self.tty {
            return Err(io::Error::other("not a terminal"));
        }
        self.modes.push(ModeChange::Cbreak);
        Ok(self.modes.len())
    }

    fn restore(&mut self, _mode: &usize) -> io::Result<()> {
        self.modes.push(ModeChange::Restore);
        Ok(())
    }

    fn input_ready(&mut self) -> io::Result<bool> {
        match self.input.front() {
            Some(&(at, _)) => Ok(at <= self.elapsed),
            None => Ok(self.closed),
        }
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if self.interrupts > 0 {
            self.interrupts -= 1;
            return Err(io::Error::from(io::ErrorKind::Interrupted));
        }
        match self.input.pop_front() {
            Some((at, byte)) => {
                // A blocking read returns when the byte arrives.
                self.elapsed = self.elapsed.max(at);
                Ok(Some(byte))
            }
            None => Ok(None),
        }
    }

    fn is_tty(&self) -> bool {
        self.tty
    }

    fn window_size(&self) -> Option<(u16, u16)> {
        self.size
    }

    fn now(&self) -> Instant {
        self.origin + self.elapsed
    }

    fn sleep(&mut self, duration: Duration) {
        self.elapsed += duration;
    }
}
