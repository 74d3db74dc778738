// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metacrawl::application::use_cases::dataset_tasks::register_dataset_tasks;
use metacrawl::config::settings::Settings;
use metacrawl::engines::browser_session::{ChromiumSessionFactory, SessionFactory};
use metacrawl::engines::source_profile::SourceCatalog;
use metacrawl::infrastructure::database::connection;
use metacrawl::infrastructure::metrics::init_metrics;
use metacrawl::infrastructure::repositories::dataset_repo_impl::AtomicReplaceStore;
use metacrawl::presentation::routes;
use metacrawl::scheduler::schedule_config;
use metacrawl::scheduler::task_scheduler::TaskScheduler;
use metacrawl::utils::telemetry;
use migration::{Migrator, MigratorTrait};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// 等待 Ctrl+C 或 SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry()?;
    info!("Starting metacrawl...");

    // 2. Load configuration
    let settings = Settings::new()?;
    info!("Configuration loaded");

    init_metrics(&settings.metrics);

    // 3. Connect to database
    let db = Arc::new(connection::create_pool(&settings.database).await?);
    info!("Database connection established");

    info!("Running database migrations...");
    Migrator::up(db.as_ref(), None).await?;
    info!("Database migrations applied");

    // 4. Sources and scheduled tasks
    let catalog = SourceCatalog::load(&settings.extraction.sources_file)?;
    info!(
        sources = catalog.len(),
        file = %settings.extraction.sources_file,
        "Source catalog loaded"
    );

    let factory: Arc<dyn SessionFactory> =
        Arc::new(ChromiumSessionFactory::new(settings.browser.clone()));
    let store = Arc::new(AtomicReplaceStore::new(db.clone()));
    let scheduler = Arc::new(TaskScheduler::new().await?);

    let registered =
        register_dataset_tasks(&scheduler, &settings, &catalog, factory, store, env_lookup)
            .await?;
    info!(tasks = ?registered, "Scheduled tasks registered");

    let run_on_startup =
        schedule_config::run_on_startup(&settings.scheduler.env_prefix, env_lookup)
            .unwrap_or(settings.scheduler.run_on_startup);
    if run_on_startup {
        let scheduler = scheduler.clone();
        tokio::spawn(async move {
            for name in scheduler.enabled_tasks().await {
                if !scheduler.trigger(&name).await {
                    warn!(task = %name, "Startup run did not succeed");
                }
            }
        });
    }

    // 5. Start HTTP server
    let app = routes::routes(scheduler.clone());
    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 6. Stop scheduled tasks, then close persistent connections
    scheduler.shutdown().await?;
    // 连接句柄共享同一个连接池，关闭任一句柄即关闭整个池
    db.as_ref().clone().close().await?;
    info!("metacrawl stopped");

    Ok(())
}
