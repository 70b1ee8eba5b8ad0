//! Abstraction over the controlling terminal.
//!
//! The `Terminal` trait lets the console drive the real stdin/stdout pair or a
//! scripted mock with a virtual clock for testing.

use std::io::{self, Write};
use std::time::{Duration, Instant};

/// Terminal operations needed by the console.
pub trait Terminal: Write {
    /// Snapshot of line-discipline settings.
    type Mode;

    /// Snapshots the current settings, then switches input to unechoed,
    /// byte-at-a-time mode. Fails if input is not an interactive terminal.
    fn enter_cbreak(&mut self) -> io::Result<Self::Mode>;

    /// Restores a snapshot taken by [`Terminal::enter_cbreak`].
    fn restore(&mut self, mode: &Self::Mode) -> io::Result<()>;

    /// Returns `true` if a byte can be read without blocking.
    fn input_ready(&mut self) -> io::Result<bool>;

    /// Reads one byte, blocking until it arrives. `None` means end of input.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Reads one line without its terminator. `None` means end of input
    /// before any byte was read.
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut bytes = Vec::new();
        loop {
            match self.read_byte() {
                Ok(Some(b'\n')) => break,
                Ok(Some(b)) => bytes.push(b),
                Ok(None) if bytes.is_empty() => return Ok(None),
                Ok(None) => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Returns `true` if output goes to an interactive terminal.
    fn is_tty(&self) -> bool;

    /// Current window size as `(rows, columns)`, if it can be queried.
    fn window_size(&self) -> Option<(u16, u16)>;

    fn now(&self) -> Instant;

    fn sleep(&mut self, duration: Duration);
}

#[cfg(unix)]
pub use self::unix::StdTerminal;

#[cfg(unix)]
mod unix {
    use std::io::{self, IsTerminal, Write};
    use std::time::{Duration, Instant};

    use super::Terminal;
    use crate::console::geometry::query_window_size;

    /// The process's stdin and stdout.
    #[derive(Debug)]
    pub struct StdTerminal {
        stdout: io::Stdout,
    }

    impl StdTerminal {
        pub fn new() -> Self {
            Self {
                stdout: io::stdout(),
            }
        }
    }

    impl Default for StdTerminal {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Write for StdTerminal {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.stdout.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            self.stdout.flush()
        }
    }

    impl Terminal for StdTerminal {
        type Mode = libc::termios;

        fn enter_cbreak(&mut self) -> io::Result<libc::termios> {
            // SAFETY: termios is plain old data, fully written by tcgetattr.
            let mut saved: libc::termios = unsafe { std::mem::zeroed() };
            // SAFETY: valid fd and a pointer to a live termios.
            if unsafe { libc::tcgetattr(libc::STDIN_FILENO, &mut saved) } != 0 {
                return Err(io::Error::last_os_error());
            }

            let mut cbreak = saved;
            cbreak.c_lflag &= !(libc::ICANON | libc::ECHO);
            cbreak.c_cc[libc::VMIN] = 1;
            cbreak.c_cc[libc::VTIME] = 0;
            // SAFETY: as above.
            if unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &cbreak) } != 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(saved)
        }

        fn restore(&mut self, mode: &libc::termios) -> io::Result<()> {
            // SAFETY: mode was filled in by tcgetattr.
            if unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSADRAIN, mode) } != 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        }

        fn input_ready(&mut self) -> io::Result<bool> {
            let mut fds = libc::pollfd {
                fd: libc::STDIN_FILENO,
                events: libc::POLLIN,
                revents: 0,
            };
            // SAFETY: one valid pollfd, zero timeout.
            let n = unsafe { libc::poll(&mut fds, 1, 0) };
            if n < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    return Ok(false);
                }
                return Err(err);
            }
            Ok(n > 0 && fds.revents & (libc::POLLIN | libc::POLLHUP) != 0)
        }

        fn read_byte(&mut self) -> io::Result<Option<u8>> {
            // Unbuffered so that `input_ready` never misses bytes held in a
            // userspace buffer.
            let mut byte = 0u8;
            // SAFETY: reading at most one byte into a live u8.
            let n = unsafe { libc::read(libc::STDIN_FILENO, (&mut byte as *mut u8).cast(), 1) };
            match n {
                n if n < 0 => Err(io::Error::last_os_error()),
                0 => Ok(None),
                _ => Ok(Some(byte)),
            }
        }

        fn is_tty(&self) -> bool {
            self.stdout.is_terminal()
        }

        fn window_size(&self) -> Option<(u16, u16)> {
            query_window_size()
        }

        fn now(&self) -> Instant {
            Instant::now()
        }

        fn sleep(&mut self, duration: Duration) {
            std::thread::sleep(duration);
        }
    }
}
