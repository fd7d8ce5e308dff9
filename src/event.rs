use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use tokio::sync::mpsc;

use crate::error::Result;
use crate::nav::state::AsyncResult;
use crate::theme::{self, Scheme};

/// Application events.
#[derive(Debug)]
pub enum Event {
    /// A key press event.
    Key(KeyEvent),
    /// A periodic tick for rendering.
    Tick,
    /// Terminal resize event.
    Resize(u16, u16),
    /// A collaborator call finished.
    Fetched(AsyncResult),
    /// The terminal appearance changed.
    ThemeChanged(Scheme),
}

/// Async event handler that polls crossterm events and forwards them via a channel.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    tx: mpsc::UnboundedSender<Event>,
}

impl EventHandler {
    /// Create a new EventHandler with the given tick rate.
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let event_tx = tx.clone();

        tokio::spawn(async move {
            loop {
                if event::poll(tick_rate).unwrap_or(false) {
                    match event::read() {
                        // Release events arrive on some platforms; act on presses only.
                        Ok(CrosstermEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                            if event_tx.send(Event::Key(key)).is_err() {
                                break;
                            }
                        }
                        Ok(CrosstermEvent::Resize(w, h)) => {
                            if event_tx.send(Event::Resize(w, h)).is_err() {
                                break;
                            }
                        }
                        _ => {}
                    }
                } else if event_tx.send(Event::Tick).is_err() {
                    break;
                }
            }
        });

        Self { rx, tx }
    }

    /// Re-detect the terminal appearance every `interval` and send
    /// [`Event::ThemeChanged`] when it differs from the last one seen.
    pub fn watch_theme(&self, interval: Duration, initial: Scheme) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;
            let mut current = initial;
            loop {
                ticker.tick().await;
                let Ok(detected) = tokio::task::spawn_blocking(theme::detect_scheme).await
                else {
                    continue;
                };
                if detected != current {
                    current = detected;
                    if tx.send(Event::ThemeChanged(detected)).is_err() {
                        break;
                    }
                }
            }
        });
    }

    /// Get a sender clone for async tasks to post results.
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    /// Receive the next event (blocks until available).
    pub async fn next(&mut self) -> Result<Event> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| crate::error::AppError::Terminal("Event channel closed".into()))
    }
}
