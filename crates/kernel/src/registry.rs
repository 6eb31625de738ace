use anyhow::Context;
use std::sync::Arc;

use crate::module::{InitCtx, Module};
use bookshelf_db::Migration;

/// Module registry for managing module lifecycle
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn Module>>,
}

impl ModuleRegistry {
    /// Create a new module registry
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Register a module with the registry
    pub fn register(&mut self, module: Arc<dyn Module>) {
        self.modules.push(module);
    }

    /// Get all registered modules in registration order
    pub fn modules(&self) -> impl Iterator<Item = &Arc<dyn Module>> {
        self.modules.iter()
    }

    /// Get a module by name
    pub fn get_module(&self, name: &str) -> Option<&Arc<dyn Module>> {
        self.modules.iter().find(|module| module.name() == name)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Initialize modules in registration order
    pub async fn init_all(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("initializing {} modules", self.modules.len());

        for module in &self.modules {
            tracing::info!(module = module.name(), "initializing module");

            module
                .init(ctx)
                .await
                .with_context(|| format!("failed to initialize module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Start modules in registration order
    pub async fn start_all(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        for module in &self.modules {
            tracing::info!(module = module.name(), "starting module");

            module
                .start(ctx)
                .await
                .with_context(|| format!("failed to start module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Stop modules in reverse registration order
    pub async fn stop_all(&self) -> anyhow::Result<()> {
        tracing::info!("stopping {} modules", self.modules.len());

        for module in self.modules.iter().rev() {
            tracing::info!(module = module.name(), "stopping module");

            module
                .stop()
                .await
                .with_context(|| format!("failed to stop module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Collect all migrations from all modules, tagged with the owning module
    pub fn collect_migrations(&self) -> Vec<(String, Migration)> {
        let mut migrations: Vec<_> = self
            .modules
            .iter()
            .flat_map(|module| {
                module
                    .migrations()
                    .into_iter()
                    .map(move |migration| (module.name().to_string(), migration))
            })
            .collect();

        // Sort by module name and migration ID for deterministic ordering
        migrations.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.id.cmp(b.1.id)));

        migrations
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use bookshelf_db::Db;
    use std::sync::Mutex;

    struct TestModule {
        name: &'static str,
        journal: Arc<Mutex<Vec<String>>>,
    }

    impl TestModule {
        fn record(&self, event: &str) {
            self.journal
                .lock()
                .unwrap()
                .push(format!("{}:{}", event, self.name));
        }
    }

    #[async_trait::async_trait]
    impl Module for TestModule {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
            self.record("init");
            Ok(())
        }

        fn migrations(&self) -> Vec<Migration> {
            vec![
                Migration {
                    id: "002_index",
                    up: "CREATE INDEX test_idx ON test (id);",
                },
                Migration {
                    id: "001_init",
                    up: "CREATE TABLE test (id INTEGER);",
                },
            ]
        }

        async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
            self.record("start");
            Ok(())
        }

        async fn stop(&self) -> anyhow::Result<()> {
            self.record("stop");
            Ok(())
        }
    }

    struct FailingModule;

    #[async_trait::async_trait]
    impl Module for FailingModule {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
            anyhow::bail!("boom")
        }
    }

    fn registry_with(names: &[&'static str]) -> (ModuleRegistry, Arc<Mutex<Vec<String>>>) {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ModuleRegistry::new();
        for &name in names {
            registry.register(Arc::new(TestModule {
                name,
                journal: journal.clone(),
            }));
        }
        (registry, journal)
    }

    #[test]
    fn test_module_registry_creation() {
        let registry = ModuleRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.collect_migrations().is_empty());
    }

    #[test]
    fn test_get_module_by_name() {
        let (registry, _) = registry_with(&["alpha", "beta"]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get_module("beta").unwrap().name(), "beta");
        assert!(registry.get_module("gamma").is_none());
    }

    #[test]
    fn test_migration_collection_is_sorted() {
        let (registry, _) = registry_with(&["zeta", "alpha"]);
        let ids: Vec<_> = registry
            .collect_migrations()
            .into_iter()
            .map(|(module, migration)| format!("{}/{}", module, migration.id))
            .collect();

        assert_eq!(
            ids,
            vec![
                "alpha/001_init",
                "alpha/002_index",
                "zeta/001_init",
                "zeta/002_index"
            ]
        );
    }

    #[tokio::test]
    async fn test_module_lifecycle_order() {
        let (registry, journal) = registry_with(&["first", "second"]);
        let settings = Settings::default();
        let db = Db::in_memory().await.unwrap();
        let ctx = InitCtx {
            settings: &settings,
            db: &db,
        };

        registry.init_all(&ctx).await.unwrap();
        registry.start_all(&ctx).await.unwrap();
        registry.stop_all().await.unwrap();

        assert_eq!(
            *journal.lock().unwrap(),
            vec![
                "init:first",
                "init:second",
                "start:first",
                "start:second",
                "stop:second",
                "stop:first"
            ]
        );
    }

    #[tokio::test]
    async fn test_init_failure_names_module() {
        let mut registry = ModuleRegistry::new();
        registry.register(Arc::new(FailingModule));
        let settings = Settings::default();
        let db = Db::in_memory().await.unwrap();
        let ctx = InitCtx {
            settings: &settings,
            db: &db,
        };

        let err = registry.init_all(&ctx).await.unwrap_err();
        assert!(err.to_string().contains("'failing'"));
    }
}
