use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyEvent},
    terminal,
};

/// Similar to [`crossterm::event::KeyCode`] but only contains keys the machine can receive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Enter,
    Backspace,
    Tab,
    Esc,
    /// `Ctrl+C`
    Interrupt,
    Char(char),
}

/// Raw mode for as long as the guard lives.
#[derive(Debug)]
struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(RawMode)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            tracing::warn!("failed to disable raw terminal: {e}");
        }
    }
}

/// Keys read from an interactive terminal, as bytes.
///
/// Inputs are read as [`KeyEvent`]s, which read multi-byte characters as `char`. Therefore,
/// any such characters are encoded in 1-4 bytes as UTF-8, and buffered for the next reads.
///
/// Raw mode is entered on the first read and held across reads, so a polling loop does not
/// switch terminal modes on every poll. Call [`TermInput::release`] before writing output, which
/// needs normal line endings.
#[derive(Debug, Default)]
pub struct TermInput {
    pending: VecDeque<u8>,
    interrupted: bool,
    raw: Option<RawMode>,
}

impl TermInput {
    /// Next byte if a key has already been pressed.
    pub fn poll(&mut self) -> Option<u8> {
        if let Some(byte) = self.pending.pop_front() {
            return Some(byte);
        }
        if let Err(e) = self.hold_raw() {
            tracing::debug!("keyboard poll failed: {e}");
            return None;
        }
        match next_key(Some(Duration::ZERO)) {
            Ok(Some(Key::Interrupt)) => {
                self.interrupted = true;
                None
            }
            Ok(Some(key)) => {
                self.push_key(key);
                self.pending.pop_front()
            }
            Ok(None) => None,
            Err(e) => {
                tracing::debug!("keyboard poll failed: {e}");
                None
            }
        }
    }

    /// Wait for the next byte. Keys are not echoed.
    ///
    /// `Ctrl+C` is reported as [`io::ErrorKind::Interrupted`].
    pub fn read_byte(&mut self) -> io::Result<Option<u8>> {
        loop {
            if let Some(byte) = self.pending.pop_front() {
                return Ok(Some(byte));
            }
            self.hold_raw()?;
            match next_key(None)? {
                Some(Key::Interrupt) => return Err(io::ErrorKind::Interrupted.into()),
                Some(key) => self.push_key(key),
                None => continue,
            }
        }
    }

    pub fn take_interrupt(&mut self) -> bool {
        std::mem::take(&mut self.interrupted)
    }

    /// Leave raw mode, if held.
    pub fn release(&mut self) {
        self.raw = None;
    }

    pub fn is_raw(&self) -> bool {
        self.raw.is_some()
    }

    fn hold_raw(&mut self) -> io::Result<()> {
        if self.raw.is_none() {
            self.raw = Some(RawMode::enable()?);
        }
        Ok(())
    }

    fn push_key(&mut self, key: Key) {
        let mut bytes = [0u8; 4];
        let encoded: &[u8] = match key {
            Key::Enter => b"\n",
            Key::Backspace => &[0x08],
            Key::Tab => b"\t",
            Key::Esc => &[0x1b],
            Key::Interrupt => &[0x03],
            Key::Char(ch) => ch.encode_utf8(&mut bytes).as_bytes(),
        };
        self.pending.extend(encoded);
    }
}

/// Read next key from interactive terminal, within `timeout` if given.
///
/// Events are consumed until a key event is read as a valid [`Key`], or until no event arrives
/// in time. Caller must ensure terminal is in raw mode.
fn next_key(timeout: Option<Duration>) -> io::Result<Option<Key>> {
    loop {
        if let Some(timeout) = timeout {
            if !event::poll(timeout)? {
                return Ok(None);
            }
        }
        if let Ok(key) = Key::try_from(event::read()?) {
            return Ok(Some(key));
        }
    }
}

impl TryFrom<Event> for Key {
    type Error = ();
    fn try_from(event: Event) -> Result<Self, Self::Error> {
        if let Event::Key(event) = event {
            if let Ok(key) = event.try_into() {
                return Ok(key);
            }
        }
        Err(())
    }
}

impl TryFrom<KeyEvent> for Key {
    type Error = ();
    fn try_from(event: KeyEvent) -> Result<Self, Self::Error> {
        use event::{KeyCode, KeyEventKind, KeyModifiers as Mod};

        if matches!(event.kind, KeyEventKind::Release) {
            return Err(());
        }

        let key = match (event.modifiers, event.code) {
            (Mod::CONTROL, KeyCode::Char('c')) => Key::Interrupt,

            (_, KeyCode::Backspace) => Key::Backspace,
            (_, KeyCode::Enter) | (_, KeyCode::Char('\n')) => Key::Enter,
            (_, KeyCode::Tab) => Key::Tab,
            (_, KeyCode::Esc) => Key::Esc,

            // Normal character
            (Mod::NONE | Mod::SHIFT, KeyCode::Char(ch)) => Key::Char(ch),

            _ => return Err(()),
        };

        Ok(key)
    }
}
