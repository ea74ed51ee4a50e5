mod app;
mod cli;
mod config;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use app::App;
use cli::Cli;
use config::AppConfig;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::load_default()?,
    };
    cli.apply(&mut config);
    config.validate()?;

    let font = fitts_render::load_font(config.display.font_path.as_deref())
        .context("loading the UI font")?;
    let sink = config
        .storage
        .open_sink()
        .context("opening participant storage")?;

    let app = App::new(config, sink, font)?;
    app.run()
}
