use clap::Parser;
use migration::{Migrator, MigratorTrait};
use miette::{IntoDiagnostic, Result};
use showbill::{settings, storage, web};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "showbill", version, about = "Venue, artist, and show booking board")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    // load settings
    let settings = settings::Settings::load(&cli.config)?;
    tracing::info!(?settings, "Loaded configuration");

    // init storage (database) and bring the schema up to date
    let db = storage::init(&settings.database).await.into_diagnostic()?;
    Migrator::up(&db, None).await.into_diagnostic()?;

    // start web server
    web::serve(settings, db).await?;
    Ok(())
}
