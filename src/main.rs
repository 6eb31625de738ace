use anyhow::Context;
use bookshelf_app::Application;
use bookshelf_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load bookshelf settings")?;
    bookshelf_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.url,
        "bookshelf-app bootstrap starting"
    );

    Application::connect(settings).await?.serve().await
}
