use crossterm::event::{poll, read, Event, KeyCode};
use crossterm::terminal;
use std::collections::HashMap;
use std::io;
use std::time::Duration;

/// the presenter keystrokes DAMSON viewers understand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// A: toggle the decaying green activity overlay
    ToggleActivity,
    /// I: toggle the runtime-information overlay
    ToggleInfo,
    /// S: save the colour plane as output.png
    Snapshot,
    /// Q: leave; the parser worker is not waited for
    Quit,
}

/// map of keys to commands; upper case works too
const COMMAND_KEYMAP: [(char, Command); 4] = [
    ('a', Command::ToggleActivity),
    ('i', Command::ToggleInfo),
    ('s', Command::Snapshot),
    ('q', Command::Quit),
];

/// reads keypresses
pub trait Input {
    /// drain all pending keypresses into commands, without blocking
    fn poll_commands(&mut self) -> Result<Vec<Command>, io::Error>;
}

/// crossterm-backed implementation; raw mode for the lifetime of the value
pub struct TermInput {
    keymap: HashMap<char, Command>,
}

impl TermInput {
    pub fn new() -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(TermInput {
            keymap: HashMap::from(COMMAND_KEYMAP),
        })
    }
}

impl Drop for TermInput {
    fn drop(&mut self) {
        terminal::disable_raw_mode().unwrap();
    }
}

impl Input for TermInput {
    fn poll_commands(&mut self) -> Result<Vec<Command>, io::Error> {
        let mut commands = Vec::new();
        while poll(Duration::from_millis(0))? {
            if let Event::Key(evt) = read()? {
                if let KeyCode::Char(key) = evt.code {
                    if let Some(cmd) = self.keymap.get(&key.to_ascii_lowercase()) {
                        commands.push(*cmd);
                    }
                    // anything unmapped is the user's business
                }
            }
        }
        Ok(commands)
    }
}

/// Scripted input for tests: one batch of commands per poll. When the
/// script runs dry it keeps answering Quit, so presenter loops terminate.
pub struct DummyInput {
    script: std::collections::VecDeque<Vec<Command>>,
}

impl DummyInput {
    pub fn new(script: Vec<Vec<Command>>) -> Self {
        DummyInput {
            script: script.into(),
        }
    }

    /// no keypresses at all, just an eventual Quit
    pub fn quit_immediately() -> Self {
        Self::new(Vec::new())
    }
}

impl Input for DummyInput {
    fn poll_commands(&mut self) -> Result<Vec<Command>, io::Error> {
        Ok(self
            .script
            .pop_front()
            .unwrap_or_else(|| vec![Command::Quit]))
    }
}
