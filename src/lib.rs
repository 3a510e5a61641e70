//! shelf application library
//!
//! Application modules and the bootstrap that wires them to the database and
//! HTTP server.

pub mod modules;
pub mod utils;

use anyhow::Context;
use shelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// Run the service until a shutdown signal arrives, then tear everything down.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let pool = shelf_db::connect(&settings.database)
        .await
        .with_context(|| "failed to open database pool")?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &settings, pool.clone());

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    let served = shelf_http::start_server(&registry, &settings, shelf_http::shutdown_signal()).await;

    // Tear down even when serving failed, then report the first error.
    let stopped = registry.stop_modules().await;
    shelf_db::close(&pool).await;

    served?;
    stopped
}
