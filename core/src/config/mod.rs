mod load;
mod types;

pub use load::{apply_env_overrides, get_data_dir, load_default, load_from_path, resolve_dir};
pub use types::{AppConfig, CaptureConfig, ControlConfig, LoggingConfig};
