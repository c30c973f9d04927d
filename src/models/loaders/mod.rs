pub mod toml_loader;

pub use toml_loader::{load_categories_toml, parse_categories_toml};
