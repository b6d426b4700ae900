pub mod pipeline;
pub mod setup;
