//! Text templates for the match log.

use rand::seq::SliceRandom;
use rand::Rng;

pub const GOAL: &[&str] = &[
    "{player} unleashes a thunderbolt from 25 yards! What a goal!",
    "{player} rises highest at the back post to head it home!",
    "Brilliant team move finished off by {player} with a calm tap-in.",
    "{player} dribbles past two defenders and slots it into the bottom corner!",
    "A defensive mix-up allows {player} to steal the ball and score!",
    "{player} smashes a volley into the roof of the net!",
    "Cool as you like! {player} chips the goalkeeper.",
];

pub const KEEPER_GOAL: &[&str] = &[
    "Unbelievable! The keeper {player} has come up for the corner and heads it in!",
    "{player} abandons his goal and scrambles home a last-gasp equaliser!",
];

pub const PENALTY_AWARD: &[&str] = &[
    "PENALTY! {def} trips {player} inside the box! The referee points to the spot.",
    "Handball! {def} blocks the shot with an arm. Penalty given!",
    "Clumsy challenge by {def} on {player}. It's a clear penalty!",
    "{def} pulls down {player} in the area. Penalty kick!",
];

pub const PENALTY_GOAL: &[&str] = &[
    "{player} sends the keeper the wrong way! Calmly finished.",
    "{player} smashes the penalty into the top corner! Unstoppable.",
    "Ice cold nerves! {player} slots the penalty home.",
    "The keeper gets a hand to it, but {player}'s penalty is too powerful!",
];

pub const PENALTY_MISS: &[&str] = &[
    "SAVED! The keeper guesses correctly and denies {player}!",
    "MISSED! {player} drags the penalty wide of the post.",
    "OFF THE BAR! {player} goes for power but hits the woodwork!",
    "Terrible penalty from {player}, straight at the goalkeeper.",
];

pub const CHANCE: &[&str] = &[
    "{player} hits the post! So close!",
    "Great save by the keeper to deny {player}!",
    "{player} fires just wide of the upright.",
    "Last ditch tackle denies {player} a clear goalscoring opportunity.",
];

pub const YELLOW: &[&str] = &[
    "Late challenge by {player}. The referee shows a yellow card.",
    "{player} pulls the shirt of the opponent. Tactical foul, yellow card.",
    "Arguments with the referee earn {player} a booking.",
    "Reckless slide tackle from {player}.",
];

pub const SECOND_YELLOW: &[&str] = &[
    "It's a second yellow for {player}! Sent off!",
    "{player} commits another foul and the referee reaches for the pocket. Second yellow, RED CARD!",
    "Foolish from {player}, already booked! An early shower.",
];

pub const STRAIGHT_RED: &[&str] = &[
    "{player} goes in with two feet! Straight Red Card!",
    "Disgraceful behaviour from {player}, the referee has no choice. Red Card!",
    "{player} denies a clear goalscoring opportunity. Sent off!",
    "Violent conduct from {player} behind the play! Straight Red!",
];

pub const SUBSTITUTION: &[&str] = &[
    "Substitution for {team}: {in} replaces {out}.",
    "{team} make a change: {out} comes off for {in}.",
    "Fresh legs for {team} as {in} comes on for {out}.",
    "Tactical change: {in} enters the fray, replacing {out}.",
];

pub const INJURY: &[&str] = &[
    "{player} goes down clutching a hamstring. That doesn't look good.",
    "The physio is on for {player}, who cannot continue.",
    "{player} limps off after a heavy collision.",
];

pub const KICK_OFF: &str = "The referee blows the whistle, and we are underway!";
pub const SECOND_HALF: &str = "Second half begins.";
pub const HALF_TIME: &str = "Half Time whistle blows.";
pub const FULL_TIME: &str = "Full Time! The referee ends the match.";

/// Pick a template and substitute `{key}` placeholders.
pub fn render<R: Rng + ?Sized>(templates: &[&str], vars: &[(&str, &str)], rng: &mut R) -> String {
    let template = templates.choose(rng).copied().unwrap_or_default();
    fill(template, vars)
}

/// Substitute `{key}` placeholders in a single template.
pub fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |text, (key, value)| {
        text.replace(&format!("{{{key}}}"), value)
    })
}

/// Announcement of stoppage minutes.
pub fn stoppage(minutes: u8) -> String {
    match minutes {
        1 => "1 minute of stoppage time indicated.".to_string(),
        n => format!("{n} minutes of stoppage time indicated."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn fills_every_placeholder() {
        let text = fill(
            "{team}: {in} for {out}",
            &[("team", "Inter"), ("in", "Frattesi"), ("out", "Barella")],
        );
        assert_eq!(text, "Inter: Frattesi for Barella");
    }

    #[test]
    fn rendered_templates_leave_no_placeholders() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..50 {
            let text = render(PENALTY_AWARD, &[("player", "Lautaro"), ("def", "Gatti")], &mut rng);
            assert!(!text.contains('{'), "{text}");
        }
    }

    #[test]
    fn stoppage_announcement_agrees_in_number() {
        assert_eq!(stoppage(1), "1 minute of stoppage time indicated.");
        assert_eq!(stoppage(4), "4 minutes of stoppage time indicated.");
    }

    #[test]
    fn empty_pool_renders_empty_text() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(render(&[], &[("player", "x")], &mut rng), "");
    }
}
