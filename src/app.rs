use std::time::{Duration, Instant};

use log::info;
use tokio::sync::mpsc::UnboundedSender;

use crate::config::AppConfig;
use crate::event::Event;
use crate::nav::state::{Action, AsyncResult, Effect, Navigator, StatusMessage};
use crate::render::text::Highlighter;
use crate::source::{worker, Sources};
use crate::theme::{self, Scheme, ThemeColors};

/// How long a status message stays on screen.
pub const STATUS_TTL: Duration = Duration::from_secs(3);

/// Main application state.
pub struct App {
    pub navigator: Navigator,
    pub config: AppConfig,
    pub theme: ThemeColors,
    pub scheme: Scheme,
    pub highlighter: Highlighter,
    pub should_quit: bool,
    pub status_message: Option<(StatusMessage, Instant)>,
    sources: Sources,
}

impl App {
    pub fn new(config: AppConfig, sources: Sources, scheme: Scheme) -> Self {
        let theme = theme::resolve_theme(&config.theme, scheme);
        let highlighter = Highlighter::new(
            theme::syntax_theme_name(&config, scheme),
            config.tab_width(),
        );
        Self {
            navigator: Navigator::new(config.load_settings()),
            config,
            theme,
            scheme,
            highlighter,
            should_quit: false,
            status_message: None,
            sources,
        }
    }

    /// Initial load of the device list.
    pub fn start(&mut self) -> Vec<Effect> {
        let effects = self.navigator.start();
        self.absorb_status(effects)
    }

    /// Feed an action to the navigator. Status effects are shown here; the
    /// collaborator calls are returned.
    pub fn dispatch(&mut self, action: Action) -> Vec<Effect> {
        let effects = self.navigator.dispatch(action);
        self.absorb_status(effects)
    }

    pub fn handle_fetched(&mut self, result: AsyncResult) -> Vec<Effect> {
        self.dispatch(Action::AsyncResult(result))
    }

    pub fn handle_resize(&mut self, width: u16, height: u16) -> Vec<Effect> {
        self.dispatch(Action::Resize { width, height })
    }

    /// Run collaborator calls on the blocking pool.
    pub fn run_effects(&self, effects: Vec<Effect>, tx: &UnboundedSender<Event>) {
        for effect in effects {
            worker::spawn(effect, &self.sources, tx);
        }
    }

    fn absorb_status(&mut self, effects: Vec<Effect>) -> Vec<Effect> {
        effects
            .into_iter()
            .filter_map(|effect| match effect {
                Effect::Status(message) => {
                    self.set_status_message(message);
                    None
                }
                other => Some(other),
            })
            .collect()
    }

    /// Swap palette and syntax theme for a new appearance.
    pub fn apply_scheme(&mut self, scheme: Scheme) {
        info!("appearance changed to {scheme:?}");
        self.scheme = scheme;
        self.theme = theme::resolve_theme(&self.config.theme, scheme);
        self.highlighter
            .set_theme(theme::syntax_theme_name(&self.config, scheme));
    }

    /// Set a status message with current timestamp.
    pub fn set_status_message(&mut self, msg: StatusMessage) {
        self.status_message = Some((msg, Instant::now()));
    }

    /// Clear the status message once it has been displayed long enough.
    pub fn clear_expired_status(&mut self) {
        if let Some((_, ref created)) = self.status_message {
            if created.elapsed() > STATUS_TTL {
                self.status_message = None;
            }
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}
