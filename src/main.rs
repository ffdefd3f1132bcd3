mod app;
mod config;
mod logging;
mod terminal;
mod ui;


use anyhow::Result;
use clap::Parser;
use crossterm::event::EventStream;
use futures::StreamExt;
use ratatui::layout::Rect;
use userdir_feed::{Driver, Fetcher, HttpFetcher};

use crate::app::App;
use crate::config::{Cli, Config};
use crate::terminal::Tui;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = Config::from_cli(Cli::parse())?;
    logging::init_logging(&config.log_level, &config.log_file)?;
    tracing::info!(
        base_url = %config.base_url,
        page_size = config.page_size,
        "starting"
    );

    let fetcher = HttpFetcher::new(config.base_url.as_str(), config.page_size, config.timeout)?;
    let mut driver = Driver::new(fetcher);
    let mut app = App::new(config.feed_options());

    terminal::install_panic_hook();
    let mut tui = terminal::setup()?;
    let result = run_app(&mut tui, &mut app, &mut driver).await;
    terminal::restore();

    if let Err(e) = &result {
        tracing::error!(error = %e, "exiting with error");
    }
    result
}

/// Event loop: redraw when the feed changed, then wait for either terminal input or a page
/// result. Everything that mutates the feed runs here.
async fn run_app<F: Fetcher>(
    tui: &mut Tui,
    app: &mut App,
    driver: &mut Driver<F>,
) -> Result<()> {
    let mut events = EventStream::new();
    driver.dispatch_opt(app.start());

    loop {
        if app.is_dirty() {
            let size = tui.size()?;
            driver.dispatch_opt(app.resize(Rect::new(0, 0, size.width, size.height)));
            tui.draw(|frame| ui::draw(frame, app))?;
            app.mark_clean();
        }

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(event)) => driver.dispatch_opt(app.on_event(event)),
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
            Some(outcome) = driver.next() => {
                driver.dispatch_opt(app.apply(outcome));
            }
        }

        if app.should_quit() {
            tracing::info!("quit");
            break;
        }
    }
    Ok(())
}
