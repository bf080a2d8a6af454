mod action;
mod api;
mod app;
mod auth;
mod config;
mod error;
mod event;
mod pagination;
mod tui;
mod types;
mod ui;

use std::panic;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::action::Action;
use crate::api::RoutesApi;
use crate::app::App;
use crate::auth::StoredCredentials;
use crate::config::Config;
use crate::event::Event;
use crate::tui::EventHandler;

#[derive(Parser)]
#[command(
    name = "routefinder",
    about = "Browse airlines, airports, aircraft, and flight routes from the terminal"
)]
struct Cli {
    /// Override the routes API base URL
    #[arg(long)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in through the browser and store the token
    Login {
        /// OAuth provider: google or discord
        #[arg(long, default_value = "google")]
        provider: String,
    },
    /// Remove the stored token
    Logout,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = Config::load();
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }

    match cli.command {
        Some(Command::Login { provider }) => {
            auth::login(&config.base_url, &provider)?;
            return Ok(());
        }
        Some(Command::Logout) => {
            auth::logout()?;
            return Ok(());
        }
        None => {}
    }

    let credentials = Arc::new(StoredCredentials::new(config.token_env.clone()));
    let api = Arc::new(RoutesApi::new(config.base_url.clone(), credentials));

    // Restore the terminal before the default panic output runs.
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = tui::restore();
        original_hook(panic_info);
    }));

    let result = run(api, &config).await;

    tui::restore()?;

    result
}

async fn run(api: Arc<RoutesApi>, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut terminal = tui::init()?;

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let mut app = App::new(api, config, action_tx.clone());

    let tick_rate = Duration::from_millis(250);
    let render_rate = Duration::from_millis(16); // ~60fps
    let mut events = EventHandler::new(tick_rate, render_rate);

    loop {
        tokio::select! {
            Some(event) = events.next() => {
                if event.is_quit() {
                    action_tx.send(Action::Quit)?;
                    continue;
                }

                match event {
                    Event::Render => {
                        terminal.draw(|frame| ui::render(frame, &app))?;
                    }
                    _ => {
                        let action = app.handle_event(event);
                        if !matches!(action, Action::None) {
                            action_tx.send(action)?;
                        }
                    }
                }
            }
            Some(action) = action_rx.recv() => {
                app.update(action);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
