use anyhow::Context;
use bookshelf_app::Application;
use bookshelf_kernel::settings::Settings;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "bookshelf", version, about = "Book catalogue service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run migrations and serve the HTTP API (default)
    Serve {
        /// Override `server.port`
        #[arg(long)]
        port: Option<u16>,
    },
    /// Apply pending database migrations and exit
    Migrate,
    /// Print the resolved configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().with_context(|| "failed to load bookshelf settings")?;

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            if let Some(port) = port {
                settings.server.port = port;
            }
            bookshelf_telemetry::init(&settings.telemetry)?;
            tracing::info!(env = ?settings.environment, "bookshelf serve");

            Application::connect(settings).await?.serve().await
        }
        Command::Migrate => {
            bookshelf_telemetry::init(&settings.telemetry)?;

            let application = Application::connect(settings).await?;
            let applied = application.migrate().await?;
            application.db().pool().close().await;

            println!("applied {applied} migration(s)");
            Ok(())
        }
        Command::Config => {
            println!("{settings:#?}");
            Ok(())
        }
    }
}
