mod app;
mod components;
mod config;
mod error;
mod event;
mod handler;
mod nav;
mod render;
mod source;
mod theme;
mod tui;
mod ui;

use std::fs::{self, File};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use log::info;
use simplelog::{ConfigBuilder, WriteLogger};

use crate::app::App;
use crate::config::{AppConfig, GeneralConfig, ThemeConfig};
use crate::event::{Event, EventHandler};
use crate::source::Sources;
use crate::tui::{install_panic_hook, Tui};

/// Browse simulator devices, their apps, and the files and databases
/// inside app data containers.
#[derive(Parser, Debug)]
#[command(name = "simb", version, about)]
struct Cli {
    /// Config file to load in place of the default lookup
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Simulator device set directory
    #[arg(long, value_name = "DIR")]
    device_root: Option<PathBuf>,

    /// Color scheme: auto, dark, light or custom
    #[arg(long)]
    theme: Option<String>,

    /// Log file path
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Log level: error, warn, info, debug or trace
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn overrides(&self) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                device_root: self
                    .device_root
                    .as_ref()
                    .map(|p| p.display().to_string()),
                log_file: self.log_file.as_ref().map(|p| p.display().to_string()),
                log_level: self.log_level.clone(),
            },
            theme: ThemeConfig {
                scheme: self.theme.clone(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

fn init_logging(config: &AppConfig) -> error::Result<()> {
    let path = config.log_file();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let file = File::create(&path)?;
    // A logger may already be installed; keep the first one.
    let _ = WriteLogger::init(config.log_level(), log_config, file);
    Ok(())
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();

    if let Some(root) = &cli.device_root {
        if !root.is_dir() {
            return Err(error::AppError::InvalidPath(format!(
                "{} is not a directory",
                root.display()
            )));
        }
    }

    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));

    if let Err(e) = init_logging(&config) {
        eprintln!(
            "Warning: cannot open log file {}: {}",
            config.log_file().display(),
            e
        );
    }

    let device_root = config.device_root();
    info!("simb starting, device root {}", device_root.display());

    install_panic_hook();

    let scheme = theme::detect_scheme();
    let follow_appearance = matches!(config.theme_scheme(), "auto" | "custom");
    let poll_interval = Duration::from_millis(config.poll_interval_ms());

    let mut tui = Tui::new()?;
    let mut app = App::new(config, Sources::host(&device_root), scheme);
    let mut events = EventHandler::new(Duration::from_millis(16));
    let event_tx = events.sender();

    if follow_appearance {
        events.watch_theme(poll_interval, scheme);
    }

    let (width, height) = tui.size()?;
    let mut effects = app.handle_resize(width, height);
    effects.extend(app.start());
    app.run_effects(effects, &event_tx);

    loop {
        tui.terminal_mut().draw(|frame| {
            ui::render(&app, frame);
        })?;

        let effects = match events.next().await? {
            Event::Key(key) => handler::handle_key_event(&mut app, key),
            Event::Tick => {
                app.clear_expired_status();
                Vec::new()
            }
            Event::Resize(w, h) => app.handle_resize(w, h),
            Event::Fetched(result) => app.handle_fetched(result),
            Event::ThemeChanged(scheme) => {
                app.apply_scheme(scheme);
                Vec::new()
            }
        };
        app.run_effects(effects, &event_tx);

        if app.should_quit {
            break;
        }
    }

    info!("simb exiting");
    tui.restore()?;
    Ok(())
}
