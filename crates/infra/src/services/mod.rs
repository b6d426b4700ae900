mod event_bus;
mod messaging;

pub use event_bus::*;
pub use messaging::*;
