pub mod add_participant;
pub mod remove_participant;
