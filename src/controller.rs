use std::time::Duration;
use tracing::trace;

use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crate::domain::{CVConfig, CVError, Message};
use crate::model::Model;

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &CVConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, CVError> {
        if event::poll(Duration::from_millis(self.event_poll_time))? {
            match event::read()? {
                Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                    return Ok(self.handle_key(key, model.raw_keyevents()));
                }
                Event::Resize(width, height) => {
                    return Ok(Some(Message::Resize(width as usize, height as usize)));
                }
                _ => {}
            }
        }
        Ok(None)
    }

    fn handle_key(&self, key: KeyEvent, raw: bool) -> Option<Message> {
        if raw {
            return Some(Message::RawKey(key));
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => Some(Message::Quit),
                _ => None,
            };
        }
        let message = match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Up | KeyCode::Char('k') => Some(Message::MoveUp),
            KeyCode::Down | KeyCode::Char('j') => Some(Message::MoveDown),
            KeyCode::Left | KeyCode::Char('h') => Some(Message::MoveLeft),
            KeyCode::Right | KeyCode::Char('l') => Some(Message::MoveRight),
            KeyCode::PageDown | KeyCode::Char('n') => Some(Message::NextPage),
            KeyCode::PageUp | KeyCode::Char('p') => Some(Message::PreviousPage),
            KeyCode::Home | KeyCode::Char('g') => Some(Message::FirstPage),
            KeyCode::End | KeyCode::Char('G') => Some(Message::LastPage),
            KeyCode::Char('s') => Some(Message::ToggleSort),
            KeyCode::Char('a') => Some(Message::SortAscending),
            KeyCode::Char('d') => Some(Message::SortDescending),
            KeyCode::Char('z') => Some(Message::TogglePageSize),
            KeyCode::Char('/') => Some(Message::Search),
            KeyCode::Char('c') => Some(Message::CopyCell),
            KeyCode::Char('y') => Some(Message::CopyRow),
            KeyCode::Char('?') => Some(Message::Help),
            KeyCode::Esc => Some(Message::Exit),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}
