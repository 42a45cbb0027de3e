//! Configuration loading for the Conduit transport engine.

pub mod loader;

pub use loader::{
    DataLoadError, Format, find_config_file, load_config_dir, load_transfer_config,
    require_config_dir,
};
