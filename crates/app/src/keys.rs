//! Keyboard transport controls for interactive narration.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use tokio::sync::mpsc;
use tracing::debug;

/// Commands a key press can issue to the narration loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    TogglePause,
    Stop,
    Quit,
    NextSentence,
    PrevSentence,
    RateUp,
    RateDown,
    CycleVoice,
}

/// Map one key press onto a control command.
pub fn map_key(code: KeyCode) -> Option<ControlCommand> {
    match code {
        KeyCode::Char(' ') => Some(ControlCommand::TogglePause),
        KeyCode::Char('s') => Some(ControlCommand::Stop),
        KeyCode::Char('q') | KeyCode::Esc => Some(ControlCommand::Quit),
        KeyCode::Char('n') | KeyCode::Right => Some(ControlCommand::NextSentence),
        KeyCode::Char('p') | KeyCode::Left => Some(ControlCommand::PrevSentence),
        KeyCode::Char('+') | KeyCode::Char('=') => Some(ControlCommand::RateUp),
        KeyCode::Char('-') => Some(ControlCommand::RateDown),
        KeyCode::Char('v') => Some(ControlCommand::CycleVoice),
        _ => None,
    }
}

/// Read key presses on a dedicated thread and forward them as commands.
///
/// Terminal input is blocking, so it gets its own thread; the narration
/// loop receives commands through the returned channel. The thread exits
/// after forwarding `Quit` or once the receiver is dropped.
pub fn spawn_key_thread() -> mpsc::UnboundedReceiver<ControlCommand> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || loop {
        match crossterm::event::read() {
            Ok(Event::Key(key @ KeyEvent {
                kind: KeyEventKind::Press,
                ..
            })) => {
                // Raw mode swallows SIGINT, so ctrl-c arrives as a key press.
                let command = if key.code == KeyCode::Char('c')
                    && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    Some(ControlCommand::Quit)
                } else {
                    map_key(key.code)
                };
                if let Some(command) = command {
                    if tx.send(command).is_err() || command == ControlCommand::Quit {
                        break;
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                debug!("Key reader stopping: {}", e);
                break;
            }
        }
    });
    rx
}

/// Puts the terminal in raw mode for the lifetime of the guard.
pub struct RawModeGuard;

impl RawModeGuard {
    pub fn enable() -> std::io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            debug!("Failed to restore terminal: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn space_toggles_pause() {
        assert_eq!(map_key(KeyCode::Char(' ')), Some(ControlCommand::TogglePause));
    }

    #[test]
    fn quit_keys() {
        assert_eq!(map_key(KeyCode::Char('q')), Some(ControlCommand::Quit));
        assert_eq!(map_key(KeyCode::Esc), Some(ControlCommand::Quit));
    }

    #[test]
    fn seek_keys_map_to_sentence_moves() {
        assert_eq!(map_key(KeyCode::Char('n')), Some(ControlCommand::NextSentence));
        assert_eq!(map_key(KeyCode::Right), Some(ControlCommand::NextSentence));
        assert_eq!(map_key(KeyCode::Char('p')), Some(ControlCommand::PrevSentence));
        assert_eq!(map_key(KeyCode::Left), Some(ControlCommand::PrevSentence));
    }

    #[test]
    fn rate_keys_work_without_shift() {
        assert_eq!(map_key(KeyCode::Char('+')), Some(ControlCommand::RateUp));
        assert_eq!(map_key(KeyCode::Char('=')), Some(ControlCommand::RateUp));
        assert_eq!(map_key(KeyCode::Char('-')), Some(ControlCommand::RateDown));
    }

    #[test]
    fn unmapped_keys_are_ignored() {
        assert_eq!(map_key(KeyCode::Char('x')), None);
        assert_eq!(map_key(KeyCode::Tab), None);
    }
}
