//! Bookshelf application library
//!
//! Wires the kernel, database, and HTTP layers around the application
//! modules. Both the `bookshelf-app` binary and the CLI drive an
//! [`Application`].

pub mod modules;

use anyhow::Context;
use axum::Router;
use bookshelf_kernel::{settings::Settings, Db, InitCtx, ModuleRegistry};

/// A configured application: settings, database handle, and registered modules.
pub struct Application {
    settings: Settings,
    db: Db,
    registry: ModuleRegistry,
}

impl Application {
    /// Connect to the configured database and register every module.
    pub async fn connect(settings: Settings) -> anyhow::Result<Self> {
        let db = Db::connect(&settings.database.url, settings.database.max_connections)
            .await
            .context("failed to open application database")?;
        Ok(Self::new(settings, db))
    }

    /// Build an application over an existing database handle.
    pub fn new(settings: Settings, db: Db) -> Self {
        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry);
        Self {
            settings,
            db,
            registry,
        }
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    fn ctx(&self) -> InitCtx<'_> {
        InitCtx {
            settings: &self.settings,
            db: &self.db,
        }
    }

    /// Apply pending migrations from every module.
    pub async fn migrate(&self) -> anyhow::Result<usize> {
        let migrations = self.registry.collect_migrations();
        let applied = self
            .db
            .migrate(&migrations)
            .await
            .context("failed to apply migrations")?;
        tracing::info!(applied, total = migrations.len(), "migrations complete");
        Ok(applied)
    }

    /// Initialize modules, run migrations, start modules, and build the router.
    pub async fn prepare(&self) -> anyhow::Result<Router> {
        let ctx = self.ctx();
        self.registry.init_all(&ctx).await?;
        self.migrate().await?;
        self.registry.start_all(&ctx).await?;
        Ok(bookshelf_http::build_router(&self.registry, &ctx))
    }

    /// Run the HTTP server until shutdown, then stop every module.
    pub async fn serve(self) -> anyhow::Result<()> {
        let router = self.prepare().await?;
        let served = bookshelf_http::start_server(router, &self.settings.server).await;

        self.registry.stop_all().await?;
        self.db.pool().close().await;
        served
    }
}
