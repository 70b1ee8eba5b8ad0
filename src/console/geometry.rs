//! Terminal geometry shared with the resize signal handler.

use std::sync::atomic::{AtomicU32, Ordering};

/// Window size packed into one atomic so that the signal handler can update
/// it without locks. Written by the resize handler, read by refresh.
#[derive(Debug)]
pub struct Geometry(AtomicU32);

impl Geometry {
    pub fn new(height: u16, width: u16) -> Self {
        Self(AtomicU32::new(pack(height, width)))
    }

    /// Returns `(rows, columns)`.
    pub fn get(&self) -> (u16, u16) {
        let packed = self.0.load(Ordering::Relaxed);
        ((packed >> 16) as u16, packed as u16)
    }

    pub fn set(&self, height: u16, width: u16) {
        self.0.store(pack(height, width), Ordering::Relaxed);
    }
}

fn pack(height: u16, width: u16) -> u32 {
    (u32::from(height) << 16) | u32::from(width)
}

/// Queries the window size of stdin, then stdout.
///
/// Only issues `ioctl`, so it is safe to call from a signal handler.
#[cfg(unix)]
pub fn query_window_size() -> Option<(u16, u16)> {
    for fd in [libc::STDIN_FILENO, libc::STDOUT_FILENO] {
        // SAFETY: winsize is plain old data.
        let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
        // SAFETY: TIOCGWINSZ writes a winsize into the pointer we pass.
        if unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut ws) } == 0
            && ws.ws_row > 0
            && ws.ws_col > 0
        {
            return Some((ws.ws_row, ws.ws_col));
        }
    }
    None
}

/// Registers a `SIGWINCH` handler that re-queries the window size into
/// `geometry`, falling back to `fallback` when the query fails.
#[cfg(unix)]
pub fn watch_resize(
    geometry: std::sync::Arc<Geometry>,
    fallback: (u16, u16),
) -> std::io::Result<signal_hook::SigId> {
    // SAFETY: the handler only calls ioctl and stores an atomic, both of which
    // are async-signal-safe. It neither allocates nor locks.
    unsafe {
        signal_hook::low_level::register(signal_hook::consts::SIGWINCH, move || {
            let (height, width) = query_window_size().unwrap_or(fallback);
            geometry.set(height, width);
        })
    }
}
