mod request;
mod settings;

pub use request::ActivationRequest;
pub use settings::{settings_path, Settings, TranslateSettings, WindowSettings};
