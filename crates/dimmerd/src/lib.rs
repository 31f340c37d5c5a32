pub mod config;
pub mod device;
pub mod engine;
pub mod input;
pub mod store;

pub use config::Config;
pub use config::ConfigError;
pub use config::LogLevel;
pub use engine::ButtonEvent;
pub use engine::Engine;
pub use engine::Mode;
pub use engine::SwitchState;
