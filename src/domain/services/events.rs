use anyhow::Result;
use crossterm::event::Event as CrosstermEvent;
use crossterm::event::EventStream;
use crossterm::event::KeyEventKind;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time;
use tui_textarea::Input;
use tui_textarea::Key;

use crate::domain::models::Event;
use crate::domain::models::UiEvent;
use crate::domain::models::ViewMode;

/// Merges terminal input with orchestrator completions into one stream the
/// UI loop can await.
pub struct EventsService {
    crossterm_events: EventStream,
    events: mpsc::UnboundedReceiver<Event>,
}

impl EventsService {
    pub fn new(events: mpsc::UnboundedReceiver<Event>) -> EventsService {
        return EventsService {
            crossterm_events: EventStream::new(),
            events,
        };
    }

    fn handle_crossterm(&self, event: CrosstermEvent) -> Option<UiEvent> {
        match event {
            CrosstermEvent::Paste(text) => {
                return Some(UiEvent::KeyboardPaste(text));
            }
            CrosstermEvent::Key(keyevent) => {
                if keyevent.kind == KeyEventKind::Release {
                    return None;
                }

                match keyevent.into() {
                    Input { key: Key::Down, .. } => {
                        return Some(UiEvent::UISelectDown());
                    }
                    Input { key: Key::Up, .. } => {
                        return Some(UiEvent::UISelectUp());
                    }
                    Input { key: Key::F(1), .. } => {
                        return Some(UiEvent::KeyboardView(ViewMode::Dashboard));
                    }
                    Input { key: Key::F(2), .. } => {
                        return Some(UiEvent::KeyboardView(ViewMode::Text));
                    }
                    Input { key: Key::F(3), .. } => {
                        return Some(UiEvent::KeyboardView(ViewMode::Instagram));
                    }
                    Input { key: Key::Tab, .. } => {
                        return Some(UiEvent::KeyboardTab());
                    }
                    Input { key: Key::Esc, .. } => {
                        return Some(UiEvent::KeyboardEsc());
                    }
                    Input {
                        key: Key::Char('c'),
                        ctrl: true,
                        ..
                    } => {
                        return Some(UiEvent::KeyboardCTRLC());
                    }
                    Input {
                        key: Key::Char('l'),
                        ctrl: true,
                        ..
                    } => {
                        return Some(UiEvent::KeyboardCTRLL());
                    }
                    Input {
                        key: Key::Char('o'),
                        ctrl: true,
                        ..
                    } => {
                        return Some(UiEvent::KeyboardCTRLO());
                    }
                    Input {
                        key: Key::Char('t'),
                        ctrl: true,
                        ..
                    } => {
                        return Some(UiEvent::KeyboardCTRLT());
                    }
                    Input {
                        key: Key::Char('x'),
                        ctrl: true,
                        ..
                    } => {
                        return Some(UiEvent::KeyboardCTRLX());
                    }
                    Input {
                        key: Key::Enter, ..
                    } => {
                        return Some(UiEvent::KeyboardEnter());
                    }
                    input => {
                        return Some(UiEvent::KeyboardCharInput(input));
                    }
                }
            }
            _ => return None,
        }
    }

    pub async fn next(&mut self) -> Result<UiEvent> {
        loop {
            let evt = tokio::select! {
                event = self.events.recv() => event.map(UiEvent::Orchestrator),
                event = self.crossterm_events.next() => match event {
                    Some(Ok(input)) => self.handle_crossterm(input),
                    Some(Err(_)) => None,
                    None => None
                },
                _ = time::sleep(time::Duration::from_millis(500)) => Some(UiEvent::UITick())
            };

            if let Some(event) = evt {
                return Ok(event);
            }
        }
    }
}
