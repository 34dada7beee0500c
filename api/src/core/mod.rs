pub mod app_state;
pub mod background;
pub mod settings;
pub mod telemetry;
