//! Synthetic data for the `blocktop` binary.
//!
//! A handful of fake database servers whose counters grow on every tick, laid
//! out on three blocks: server status, running operations and user notes.

mod input;

pub use input::{KeyAction, handle_key, pause_until_key};

use std::time::Duration;

use chrono::Local;

use crate::block::Block;
use crate::cell::{Cell, Color, ColorStr};
use crate::row;

/// Converts a refresh interval in seconds, rejecting values that are not
/// positive or do not fit a `Duration`.
pub fn refresh_interval(secs: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|interval| !interval.is_zero())
}

/// Small deterministic generator; the demo needs variety, not quality.
#[derive(Debug, Clone)]
struct XorShift(u64);

impl XorShift {
    fn new(seed: u64) -> Self {
        Self(seed.max(1))
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn below(&mut self, bound: u64) -> u64 {
        self.next_u64() % bound.max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Primary,
    Secondary,
    Down,
}

impl Role {
    fn cell(self) -> ColorStr {
        match self {
            Role::Primary => ColorStr::colored("PRIMARY", Color::BrightGreen),
            Role::Secondary => ColorStr::colored("SECONDARY", Color::Cyan),
            Role::Down => ColorStr::colored("DOWN", Color::BrightRed),
        }
    }
}

#[derive(Debug, Clone)]
struct Server {
    name: String,
    role: Role,
    queries: u64,
    inserts: u64,
    connections: u64,
    resident: u64,
    lag: f64,
}

#[derive(Debug, Clone)]
struct Operation {
    server: usize,
    id: u64,
    namespace: &'static str,
    kind: &'static str,
    seconds: u64,
}

const NAMESPACES: [&str; 4] = ["shop.orders", "shop.users", "logs.events", "admin.$cmd"];
const KINDS: [&str; 4] = ["query", "insert", "update", "getmore"];

/// Fake servers and their running operations.
#[derive(Debug, Clone)]
pub struct DemoSource {
    rng: XorShift,
    servers: Vec<Server>,
    operations: Vec<Operation>,
    next_op: u64,
}

impl DemoSource {
    pub fn new(count: usize, seed: u64) -> Self {
        let mut rng = XorShift::new(seed);
        let servers = (0..count)
            .map(|i| Server {
                name: format!("db{}:27017", i + 1),
                role: if i == 0 { Role::Primary } else { Role::Secondary },
                queries: rng.below(20_000),
                inserts: rng.below(5_000),
                connections: 10 + rng.below(200),
                resident: 512 * 1024 * 1024 + rng.below(4 * 1024 * 1024 * 1024),
                lag: 0.0,
            })
            .collect();
        Self {
            rng,
            servers,
            operations: Vec::new(),
            next_op: 1,
        }
    }

    /// Moves every counter forward by one tick.
    pub fn advance(&mut self) {
        for (index, server) in self.servers.iter_mut().enumerate() {
            server.queries += self.rng.below(50_000);
            server.inserts += self.rng.below(8_000);
            server.resident += self.rng.below(1024 * 1024);
            server.connections = 10 + self.rng.below(300);
            if server.role != Role::Primary {
                server.lag = self.rng.below(2_500_000) as f64 / 100.0;
                server.role = if self.rng.below(20) == 0 {
                    Role::Down
                } else {
                    Role::Secondary
                };
            }
            if self.rng.below(3) == 0 {
                self.operations.push(Operation {
                    server: index,
                    id: self.next_op,
                    namespace: NAMESPACES[self.rng.below(NAMESPACES.len() as u64) as usize],
                    kind: KINDS[self.rng.below(KINDS.len() as u64) as usize],
                    seconds: 0,
                });
                self.next_op += 1;
            }
        }
        for op in &mut self.operations {
            op.seconds += 1 + self.rng.below(3);
        }
        let rng = &mut self.rng;
        self.operations.retain(|op| op.seconds < 10 || rng.below(2) == 0);
        self.operations.sort_by(|a, b| b.seconds.cmp(&a.seconds));
    }

    pub fn server_names(&self) -> Vec<String> {
        self.servers.iter().map(|s| s.name.clone()).collect()
    }

    pub fn status_headers() -> [&'static str; 7] {
        ["Server", "Role", "Queries", "Inserts", "Conn", "Res", "Lag"]
    }

    pub fn status_rows(&self) -> Vec<Vec<Cell>> {
        self.servers
            .iter()
            .map(|s| {
                let lag = if s.role == Role::Primary {
                    Cell::Empty
                } else {
                    Cell::from(s.lag)
                };
                row![
                    s.name.as_str(),
                    s.role.cell(),
                    s.queries,
                    s.inserts,
                    s.connections,
                    s.resident,
                    lag
                ]
            })
            .collect()
    }

    pub fn operation_headers() -> [&'static str; 5] {
        ["Server", "OpId", "Op", "Namespace", "Secs / Yields"]
    }

    pub fn operation_rows(&self) -> Vec<Vec<Cell>> {
        self.operations
            .iter()
            .map(|op| {
                let seconds = if op.seconds >= 10 {
                    Cell::from(ColorStr::colored(op.seconds.to_string(), Color::Yellow))
                } else {
                    Cell::from(vec![op.seconds, op.seconds * 7])
                };
                row![
                    self.servers[op.server].name.as_str(),
                    op.id,
                    op.kind,
                    op.namespace,
                    seconds
                ]
            })
            .collect()
    }
}

/// The three blocks of the demo screen, kept across refreshes.
#[derive(Debug)]
pub struct Dashboard {
    pub status: Block,
    pub operations: Block,
    pub notes: Block,
    note_rows: Vec<(String, String, String)>,
}

impl Dashboard {
    pub fn new() -> Self {
        Self {
            status: Block::new(DemoSource::status_headers()),
            operations: Block::new(DemoSource::operation_headers()),
            notes: Block::new(["Time", "Server", "Note"]),
            note_rows: Vec::new(),
        }
    }

    /// Loads fresh rows from `source` into every block.
    pub fn update(&mut self, source: &DemoSource) {
        self.status.reset(source.status_rows());
        self.operations.reset(source.operation_rows());
        self.notes.reset(
            self.note_rows
                .iter()
                .rev()
                .map(|(time, server, note)| row![time.as_str(), server.as_str(), note.as_str()])
                .collect(),
        );
    }

    /// Records a note from prompt answers. Needs both a server and a note.
    pub fn add_note(&mut self, answers: &[String]) -> bool {
        match answers {
            [server, note, ..] => {
                let time = Local::now().format("%H:%M:%S").to_string();
                self.note_rows.push((time, server.clone(), note.clone()));
                true
            }
            _ => false,
        }
    }

    pub fn blocks(&mut self) -> [&mut Block; 3] {
        [&mut self.status, &mut self.operations, &mut self.notes]
    }
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}
