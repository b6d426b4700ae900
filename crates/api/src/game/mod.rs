pub mod cancel_game;
pub mod create_game;
pub mod sync_game_reminders;
pub mod update_game;
