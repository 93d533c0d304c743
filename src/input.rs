use crate::error::Result;
use crate::machine::{Machine, KEY_COUNT};
use crossterm::event::{poll, read, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal;
use std::collections::HashMap;
use std::time::Duration;

/// using left-hand side of qwerty keyboard; the n-th character is key n
const CHIP8_CONVENTIONAL_LAYOUT: &str = "x123qweasdzc4rfv";

/// where '1' => 0x01 and 'a' => 0x0a
const CHIP8_LITERAL_LAYOUT: &str = "0123456789abcdef";

/// arrow keys stand in for the WASD keys of the conventional layout
const CHIP8_ARROW_ALIASES: [(&str, &str); 4] = [
    ("ArrowUp", "w"),
    ("ArrowDown", "s"),
    ("ArrowLeft", "a"),
    ("ArrowRight", "d"),
];

/// maps whatever a front-end calls a key to a CHIP-8 key 0x0-0xf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    keys: HashMap<String, u8>,
}

impl Default for Keymap {
    fn default() -> Self {
        Self::conventional()
    }
}

impl Keymap {
    /// build a keymap from a 16 character layout, plus aliases that point at
    /// characters of that layout. aliases to unknown characters are dropped
    pub fn from_layout(layout: &str, aliases: &[(&str, &str)]) -> Self {
        let mut keys: HashMap<String, u8> = layout
            .chars()
            .take(KEY_COUNT)
            .enumerate()
            .map(|(index, c)| (c.to_string(), index as u8))
            .collect();
        for (alias, target) in aliases {
            if let Some(index) = keys.get(*target).copied() {
                keys.insert(alias.to_string(), index);
            }
        }
        Keymap { keys }
    }

    pub fn conventional() -> Self {
        Self::from_layout(CHIP8_CONVENTIONAL_LAYOUT, &CHIP8_ARROW_ALIASES)
    }

    pub fn literal() -> Self {
        Self::from_layout(CHIP8_LITERAL_LAYOUT, &[])
    }

    pub fn resolve(&self, identifier: &str) -> Option<u8> {
        self.keys.get(identifier).copied()
    }
}

/// what the driver should do after pumping input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// reads keypresses and applies them to the machine between frames
pub trait Input {
    fn pump(&mut self, machine: &mut Machine, keymap: &Keymap) -> Result<Control>;
}

/// crossterm's name for a key, in the same terms the keymap uses
fn identifier(code: KeyCode) -> Option<String> {
    match code {
        KeyCode::Char(c) => Some(c.to_ascii_lowercase().to_string()),
        KeyCode::Up => Some("ArrowUp".to_string()),
        KeyCode::Down => Some("ArrowDown".to_string()),
        KeyCode::Left => Some("ArrowLeft".to_string()),
        KeyCode::Right => Some("ArrowRight".to_string()),
        _ => None,
    }
}

/// keyboard input from the terminal in raw mode. terminals only report key
/// presses, so a key stays down until it hasn't repeated for `hold_frames`
pub struct StdinInput {
    hold_frames: u32,
    held: [u32; KEY_COUNT],
}

impl StdinInput {
    pub fn new(hold_frames: u32) -> Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(StdinInput {
            hold_frames,
            held: [0; KEY_COUNT],
        })
    }

    fn release_expired(&mut self, machine: &mut Machine) {
        for (index, frames) in self.held.iter_mut().enumerate() {
            if *frames == 0 {
                continue;
            }
            *frames -= 1;
            if *frames == 0 {
                machine.press_key(index as u8, false);
            }
        }
    }

    fn key_event(&mut self, machine: &mut Machine, keymap: &Keymap, evt: KeyEvent) -> Control {
        if evt.code == KeyCode::Esc
            || (evt.code == KeyCode::Char('c') && evt.modifiers.contains(KeyModifiers::CONTROL))
        {
            return Control::Quit;
        }
        let Some(id) = identifier(evt.code) else {
            tracing::warn!(key = ?evt.code, "unknown key event received");
            return Control::Continue;
        };
        match keymap.resolve(&id) {
            Some(index) => {
                machine.set_key(keymap, &id, true);
                self.held[index as usize] = self.hold_frames.max(1);
            }
            None => tracing::warn!(key = %id, "can't map key to a CHIP-8 key"),
        }
        Control::Continue
    }
}

impl Drop for StdinInput {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            tracing::error!(error = %e, "failed to leave raw mode");
        }
    }
}

impl Input for StdinInput {
    fn pump(&mut self, machine: &mut Machine, keymap: &Keymap) -> Result<Control> {
        self.release_expired(machine);
        while poll(Duration::from_millis(0))? {
            if let Event::Key(evt) = read()? {
                if self.key_event(machine, keymap, evt) == Control::Quit {
                    return Ok(Control::Quit);
                }
            }
        }
        Ok(Control::Continue)
    }
}

/// one scripted key change, applied at the start of `frame`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyChange {
    pub frame: u64,
    pub identifier: String,
    pub pressed: bool,
}

/// replays key changes by frame; for testing and headless runs
pub struct ScriptedInput {
    frame: u64,
    script: Vec<KeyChange>,
    quit_at: Option<u64>,
}

impl ScriptedInput {
    pub fn new(script: Vec<KeyChange>) -> Self {
        ScriptedInput {
            frame: 0,
            script,
            quit_at: None,
        }
    }

    /// ask the driver to stop at the start of this frame
    pub fn quit_at(mut self, frame: u64) -> Self {
        self.quit_at = Some(frame);
        self
    }
}

impl Input for ScriptedInput {
    fn pump(&mut self, machine: &mut Machine, keymap: &Keymap) -> Result<Control> {
        let frame = self.frame;
        self.frame += 1;
        if self.quit_at == Some(frame) {
            return Ok(Control::Quit);
        }
        for change in self.script.iter().filter(|c| c.frame == frame) {
            machine.set_key(keymap, &change.identifier, change.pressed);
        }
        Ok(Control::Continue)
    }
}
