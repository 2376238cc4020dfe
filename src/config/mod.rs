pub mod settings;

pub use settings::{load_settings, save_settings, Settings, DEFAULT_SETTINGS_PATH};
