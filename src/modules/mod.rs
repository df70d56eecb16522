pub mod books;

use std::sync::Arc;

use bookshelf_kernel::{settings::Settings, ModuleRegistry};

use books::repository::BookRepository;

/// Register all project modules with the registry
pub fn register_all(
    registry: &mut ModuleRegistry,
    settings: &Settings,
    books: Arc<dyn BookRepository>,
) -> anyhow::Result<()> {
    registry.register(books::create_module(books, settings.catalog.strict_schema))?;
    Ok(())
}
