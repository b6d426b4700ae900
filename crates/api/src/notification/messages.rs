use chrono::{TimeZone, Utc};
use game_notifier_domain::Game;

fn format_start(game: &Game) -> String {
    match Utc.timestamp_millis_opt(game.start_ts).single() {
        Some(start) => start.format("%Y-%m-%d %H:%M UTC").to_string(),
        None => game.start_ts.to_string(),
    }
}

pub fn reminder(game: &Game) -> String {
    format!(
        "Reminder: **{}** starts at {}. See you there!",
        game.title,
        format_start(game)
    )
}

pub fn waitlisted_reminder(game: &Game, position: usize) -> String {
    format!(
        "Reminder: **{}** starts at {}. You are #{} on the waitlist, we will let you know if a spot opens up.",
        game.title,
        format_start(game),
        position
    )
}

pub fn join_confirmation(game: &Game) -> String {
    match game.instructions.as_deref().map(str::trim) {
        Some(instructions) if !instructions.is_empty() => format!(
            "You're in for **{}** ({}).\n\n{}",
            game.title,
            format_start(game),
            instructions
        ),
        _ => format!(
            "You're in for **{}**! It starts at {}.",
            game.title,
            format_start(game)
        ),
    }
}

pub fn promotion(game: &Game) -> String {
    format!(
        "A spot opened up in **{}** and you have been moved off the waitlist. It starts at {}.",
        game.title,
        format_start(game)
    )
}
