mod engine;
mod event;
pub mod level;
mod state;
mod tables;

pub use engine::Engine;
pub use event::ButtonEvent;
pub use state::SwitchState;
pub use tables::Action;
pub use tables::DimMode;
pub use tables::EventMode;
pub use tables::Mode;
pub use tables::StepSign;
pub use tables::Tables;
pub use tables::Target;
