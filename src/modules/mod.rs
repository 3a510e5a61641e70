pub mod books;

use std::sync::Arc;

use shelf_kernel::{settings::Settings, ModuleRegistry};
use sqlx::PgPool;

use books::store::{ColumnLayout, PgBookStore};

/// Register all application modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, settings: &Settings, pool: PgPool) {
    let layout = ColumnLayout::from_legacy_flag(settings.database.legacy_columns);
    let store = Arc::new(PgBookStore::new(pool, layout));
    registry.register(books::create_module(store));
}
