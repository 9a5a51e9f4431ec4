#![deny(warnings)]

//! Core domain models and invariants for the match engine.
//!
//! This crate defines the serializable types shared by the simulator, the
//! schedule generator and the season aggregator, plus validation helpers
//! that guard basic invariants on externally supplied data.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Unique identifier for a team, e.g. "INT".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TeamId(pub String);

/// Unique identifier for a player, e.g. "INT-FWD-0".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub String);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TeamId {
    fn from(s: &str) -> Self {
        TeamId(s.to_string())
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        PlayerId(s.to_string())
    }
}

/// Playing role of a squad member.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Goalkeeper
    GK,
    /// Defender
    DEF,
    /// Midfielder
    MID,
    /// Forward
    FWD,
}

impl Role {
    /// Whether the role plays outfield.
    pub fn is_outfield(self) -> bool {
        !matches!(self, Role::GK)
    }
}

/// A squad member with base attributes and season counters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Unique within the league, e.g. "INT-FWD-2".
    pub id: PlayerId,
    /// Display name used in commentary.
    pub name: String,
    /// Squad role; a lineup copy may differ when an outfielder keeps goal.
    pub role: Role,
    /// Base rating in [1, 99]; generated squads use [55, 99].
    pub rating: u8,
    /// Match-day rating (base plus form modifier). Only set on lineup copies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_rating: Option<u8>,
    /// Age in years.
    pub age: u8,
    /// Season goals, penalties included.
    #[serde(default)]
    pub goals: u32,
    /// Season assists.
    #[serde(default)]
    pub assists: u32,
    /// Matches started or entered from the bench this season.
    #[serde(default)]
    pub appearances: u32,
    /// Season bookings; every third one costs a match.
    #[serde(default)]
    pub yellow_cards: u32,
    /// Season sendings-off, second bookings included.
    #[serde(default)]
    pub red_cards: u32,
    /// Matches still to be served; > 0 means unavailable.
    #[serde(default)]
    pub suspension_matches_remaining: u32,
    /// Weeks still injured; > 0 means unavailable.
    #[serde(default)]
    pub injury_weeks_remaining: u32,
}

impl Player {
    /// Construct a player with zeroed season counters.
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: Role, rating: u8, age: u8) -> Self {
        Player {
            id: PlayerId(id.into()),
            name: name.into(),
            role,
            rating,
            effective_rating: None,
            age,
            goals: 0,
            assists: 0,
            appearances: 0,
            yellow_cards: 0,
            red_cards: 0,
            suspension_matches_remaining: 0,
            injury_weeks_remaining: 0,
        }
    }

    /// Rating used on match day: effective rating when present, else base.
    pub fn match_rating(&self) -> u8 {
        self.effective_rating.unwrap_or(self.rating)
    }

    /// Neither suspended nor injured.
    pub fn is_available(&self) -> bool {
        self.suspension_matches_remaining == 0 && self.injury_weeks_remaining == 0
    }

    /// Lightweight reference used in event payloads.
    pub fn to_ref(&self) -> PlayerRef {
        PlayerRef {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

/// Cumulative league record for a team.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRecord {
    /// Three per win, one per draw.
    pub points: u32,
    /// Matches played.
    pub played: u32,
    /// Matches won.
    pub won: u32,
    /// Matches drawn.
    pub drawn: u32,
    /// Matches lost.
    pub lost: u32,
    /// Goals scored.
    pub goals_for: u32,
    /// Goals conceded.
    pub goals_against: u32,
}

impl TeamRecord {
    /// Goals for minus goals against.
    pub fn goal_difference(&self) -> i64 {
        self.goals_for as i64 - self.goals_against as i64
    }
}

/// A club with rating axes, league membership and its squad.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Team {
    /// Short unique code, e.g. "INT".
    pub id: TeamId,
    /// Display name.
    pub name: String,
    /// League tier name, e.g. "Serie A".
    pub league: String,
    /// Attack axis in [1, 99].
    pub attack: u8,
    /// Midfield axis in [1, 99]; weighs most in possession.
    pub midfield: u8,
    /// Defense axis in [1, 99].
    pub defense: u8,
    /// Current season record.
    #[serde(default)]
    pub record: TeamRecord,
    /// Full squad, unavailable players included.
    pub players: Vec<Player>,
}

impl Team {
    /// Find a squad member by id.
    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    /// Mutable lookup of a squad member by id.
    pub fn player_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| &p.id == id)
    }
}

/// Formation templates. Each has exactly one goalkeeper slot and eleven slots in total.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Formation {
    /// Midfield-heavy: 4 DEF, 5 MID, 1 FWD.
    #[serde(rename = "4-2-3-1")]
    F4231,
    /// Forward-heavy: 4 DEF, 3 MID, 3 FWD.
    #[serde(rename = "4-3-3")]
    F433,
}

impl Formation {
    /// Slot counts per role, goalkeeper first.
    pub fn slots(self) -> [(Role, usize); 4] {
        match self {
            Formation::F4231 => [(Role::GK, 1), (Role::DEF, 4), (Role::MID, 5), (Role::FWD, 1)],
            Formation::F433 => [(Role::GK, 1), (Role::DEF, 4), (Role::MID, 3), (Role::FWD, 3)],
        }
    }

    /// Display tag.
    pub fn tag(self) -> &'static str {
        match self {
            Formation::F4231 => "4-2-3-1",
            Formation::F433 => "4-3-3",
        }
    }
}

/// Players in a starting eleven.
pub const STARTING_ELEVEN: usize = 11;

/// Per-match lineup: starting eleven (goalkeeper first), ordered bench and formation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lineup {
    pub starting: Vec<Player>,
    pub bench: Vec<Player>,
    pub formation: Formation,
}

/// Minimal player identity carried by events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRef {
    pub id: PlayerId,
    pub name: String,
}

/// Card colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardColor {
    Yellow,
    Red,
}

/// Referee whistles marking phase boundaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Whistle {
    KickOff,
    /// Stoppage minutes announced for the half.
    StoppageAnnounced(u8),
    HalfTime,
    SecondHalf,
    FullTime,
}

/// Kind-specific payload of a match event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    Goal {
        team_id: TeamId,
        scorer: PlayerRef,
        penalty: bool,
    },
    Card {
        team_id: TeamId,
        player: PlayerRef,
        color: CardColor,
        /// Red produced by a second booking in the same match.
        second_yellow: bool,
    },
    Substitution {
        team_id: TeamId,
        on: PlayerRef,
        off: PlayerRef,
    },
    PenaltyAward {
        team_id: TeamId,
        taker: PlayerRef,
        fouled_by: PlayerRef,
    },
    PenaltyMiss {
        team_id: TeamId,
        taker: PlayerRef,
    },
    Injury {
        team_id: TeamId,
        player: PlayerRef,
    },
    /// Near miss or other flavour line; no state change.
    Commentary {
        team_id: Option<TeamId>,
        player: Option<PlayerRef>,
    },
    Whistle {
        whistle: Whistle,
    },
}

/// A single entry in the match log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchEvent {
    pub minute: u8,
    /// Stoppage-minute offset, 0 during regular time.
    pub extra_minute: u8,
    pub kind: EventKind,
    pub text: String,
    pub important: bool,
}

impl MatchEvent {
    /// Sort key `(minute, extra_minute)`.
    pub fn clock(&self) -> (u8, u8) {
        (self.minute, self.extra_minute)
    }

    /// Team the event is attributed to, if any.
    pub fn team_id(&self) -> Option<&TeamId> {
        match &self.kind {
            EventKind::Goal { team_id, .. }
            | EventKind::Card { team_id, .. }
            | EventKind::Substitution { team_id, .. }
            | EventKind::PenaltyAward { team_id, .. }
            | EventKind::PenaltyMiss { team_id, .. }
            | EventKind::Injury { team_id, .. } => Some(team_id),
            EventKind::Commentary { team_id, .. } => team_id.as_ref(),
            EventKind::Whistle { .. } => None,
        }
    }

    /// Players acting in this event (substitute coming on included).
    pub fn actors(&self) -> Vec<&PlayerId> {
        match &self.kind {
            EventKind::Goal { scorer, .. } => vec![&scorer.id],
            EventKind::Card { player, .. } | EventKind::Injury { player, .. } => vec![&player.id],
            EventKind::Substitution { on, off, .. } => vec![&on.id, &off.id],
            EventKind::PenaltyAward {
                taker, fouled_by, ..
            } => vec![&taker.id, &fouled_by.id],
            EventKind::PenaltyMiss { taker, .. } => vec![&taker.id],
            EventKind::Commentary { player, .. } => player.iter().map(|p| &p.id).collect(),
            EventKind::Whistle { .. } => vec![],
        }
    }
}

/// Aggregate counters collected while simulating.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStats {
    pub home_possession_ticks: u32,
    pub away_possession_ticks: u32,
    pub home_chances: u32,
    pub away_chances: u32,
}

impl MatchStats {
    /// Home share of possession ticks in [0, 1]; 0.5 when nothing was recorded.
    pub fn home_possession_share(&self) -> f64 {
        let total = self.home_possession_ticks + self.away_possession_ticks;
        if total == 0 {
            return 0.5;
        }
        self.home_possession_ticks as f64 / total as f64
    }
}

/// A fixture, either scheduled (unplayed) or simulated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Fixture id, e.g. "R3-INT-JUV".
    pub id: String,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    /// Always equals the number of home `Goal` events.
    pub home_score: u32,
    /// Always equals the number of away `Goal` events.
    pub away_score: u32,
    /// False for a scheduled fixture.
    pub played: bool,
    /// 1-based calendar week.
    pub week: u32,
    /// Chronological log ending with the full-time whistle.
    pub events: Vec<MatchEvent>,
    /// Minutes added to the first half, 0..=2 by default.
    pub first_half_stoppage: u8,
    /// Minutes added to the second half, 0..=5 by default.
    pub second_half_stoppage: u8,
    /// Substitutions allowed per side in this match.
    #[serde(default)]
    pub max_subs: u8,
    /// Possession ticks and chances per side.
    #[serde(default)]
    pub stats: MatchStats,
    /// Lineups as fielded, set once simulated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_lineup: Option<Lineup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away_lineup: Option<Lineup>,
}

impl Match {
    /// An unplayed 0-0 fixture with an empty event log.
    pub fn fixture(id: impl Into<String>, home: TeamId, away: TeamId, week: u32) -> Self {
        Match {
            id: id.into(),
            home_team_id: home,
            away_team_id: away,
            home_score: 0,
            away_score: 0,
            played: false,
            week,
            events: Vec::new(),
            first_half_stoppage: 0,
            second_half_stoppage: 0,
            max_subs: 0,
            stats: MatchStats::default(),
            home_lineup: None,
            away_lineup: None,
        }
    }

    /// Whether the team takes part in this fixture.
    pub fn involves(&self, team: &TeamId) -> bool {
        &self.home_team_id == team || &self.away_team_id == team
    }

    /// Count goal events attributed to a team.
    pub fn goals_for(&self, team: &TeamId) -> u32 {
        self.events
            .iter()
            .filter(|e| matches!(&e.kind, EventKind::Goal { team_id, .. } if team_id == team))
            .count() as u32
    }
}

/// A season calendar: `weeks[i]` holds the fixtures of week `i + 1`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub weeks: Vec<Vec<Match>>,
}

impl Schedule {
    /// Number of weeks.
    pub fn len(&self) -> usize {
        self.weeks.len()
    }

    /// True when no weeks were generated.
    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }

    /// All fixtures in week order.
    pub fn matches(&self) -> impl Iterator<Item = &Match> {
        self.weeks.iter().flatten()
    }
}

/// Tunable probabilities and constants of the match simulator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Multiplier applied to the home side's strength and goal chance.
    pub home_advantage: f64,
    /// Per-tick goal probability at an attack/defense ratio of 1.
    pub base_goal_chance: f64,
    /// Probability that a failed attack still produces a chance line.
    pub chance_probability: f64,
    pub penalty_probability: f64,
    pub penalty_conversion: f64,
    /// Per-tick probability of a booking.
    pub card_probability: f64,
    /// Share of bookings that are straight reds.
    pub straight_red_probability: f64,
    /// Probability the offender belongs to the side without the ball.
    pub foul_bias_non_possessing: f64,
    /// Per-side, per-tick injury probability.
    pub injury_probability: f64,
    /// Form modifier bound: effective rating = rating ± form_swing.
    pub form_swing: u8,
    /// Goal-purpose weight of a goalkeeper in desperate mode.
    pub desperate_keeper_weight: f64,
    pub min_subs: u8,
    pub max_subs: u8,
    pub first_half_stoppage_max: u8,
    pub second_half_stoppage_max: u8,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            home_advantage: 1.1,
            base_goal_chance: 0.020,
            chance_probability: 0.015,
            penalty_probability: 0.0038,
            penalty_conversion: 0.76,
            card_probability: 0.035,
            straight_red_probability: 0.03,
            foul_bias_non_possessing: 0.6,
            injury_probability: 0.002,
            form_swing: 3,
            desperate_keeper_weight: 0.5,
            min_subs: 3,
            max_subs: 5,
            first_half_stoppage_max: 2,
            second_half_stoppage_max: 5,
        }
    }
}

/// Top-level run configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SimConfig {
    /// Seed for the deterministic RNG.
    pub rng_seed: u64,
    #[serde(default)]
    pub match_config: MatchConfig,
}

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Identifier or display name is blank.
    #[error("empty identifier or name")]
    EmptyName,
    /// Rating outside [1, 99].
    #[error("rating {0} is out of supported range [1, 99]")]
    RatingOutOfRange(u8),
    /// Probability must be within [0, 1].
    #[error("probability {field} = {value} must be within [0,1]")]
    InvalidProbability { field: &'static str, value: f64 },
    /// Multiplier must be finite and > 0.
    #[error("{0} must be finite and > 0")]
    NonPositive(&'static str),
    /// Range bounds are inverted.
    #[error("range {field} is inverted: {min} > {max}")]
    InvertedRange { field: &'static str, min: u8, max: u8 },
    /// The same identifier appears twice.
    #[error("duplicate id: {0}")]
    DuplicateId(String),
}

fn validate_rating(rating: u8) -> Result<(), ValidationError> {
    if !(1..=99).contains(&rating) {
        return Err(ValidationError::RatingOutOfRange(rating));
    }
    Ok(())
}

/// Validate a squad member.
pub fn validate_player(p: &Player) -> Result<(), ValidationError> {
    if p.id.0.trim().is_empty() || p.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    validate_rating(p.rating)
}

/// Validate a team and its roster, including unique player ids.
pub fn validate_team(t: &Team) -> Result<(), ValidationError> {
    if t.id.0.trim().is_empty() || t.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    validate_rating(t.attack)?;
    validate_rating(t.midfield)?;
    validate_rating(t.defense)?;
    let mut ids: BTreeSet<&PlayerId> = BTreeSet::new();
    for p in &t.players {
        validate_player(p)?;
        if !ids.insert(&p.id) {
            return Err(ValidationError::DuplicateId(p.id.0.clone()));
        }
    }
    Ok(())
}

/// Validate every team and check team ids are unique.
pub fn validate_league(teams: &[Team]) -> Result<(), ValidationError> {
    let mut ids: BTreeSet<&TeamId> = BTreeSet::new();
    for t in teams {
        validate_team(t)?;
        if !ids.insert(&t.id) {
            return Err(ValidationError::DuplicateId(t.id.0.clone()));
        }
    }
    Ok(())
}

/// Validate simulator tunables.
pub fn validate_match_config(c: &MatchConfig) -> Result<(), ValidationError> {
    let probabilities = [
        ("base_goal_chance", c.base_goal_chance),
        ("chance_probability", c.chance_probability),
        ("penalty_probability", c.penalty_probability),
        ("penalty_conversion", c.penalty_conversion),
        ("card_probability", c.card_probability),
        ("straight_red_probability", c.straight_red_probability),
        ("foul_bias_non_possessing", c.foul_bias_non_possessing),
        ("injury_probability", c.injury_probability),
    ];
    for (field, value) in probabilities {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(ValidationError::InvalidProbability { field, value });
        }
    }
    if !(c.home_advantage.is_finite() && c.home_advantage > 0.0) {
        return Err(ValidationError::NonPositive("home_advantage"));
    }
    if !(c.desperate_keeper_weight.is_finite() && c.desperate_keeper_weight > 0.0) {
        return Err(ValidationError::NonPositive("desperate_keeper_weight"));
    }
    if c.min_subs > c.max_subs {
        return Err(ValidationError::InvertedRange {
            field: "subs",
            min: c.min_subs,
            max: c.max_subs,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn team(id: &str) -> Team {
        Team {
            id: TeamId::from(id),
            name: format!("{id} FC"),
            league: "Serie A".to_string(),
            attack: 80,
            midfield: 78,
            defense: 76,
            record: TeamRecord::default(),
            players: vec![
                Player::new(format!("{id}-GK-0"), "Keeper", Role::GK, 75, 28),
                Player::new(format!("{id}-FWD-0"), "Striker", Role::FWD, 82, 24),
            ],
        }
    }

    #[test]
    fn serde_roundtrip_match_event() {
        let e = MatchEvent {
            minute: 45,
            extra_minute: 2,
            kind: EventKind::Card {
                team_id: TeamId::from("INT"),
                player: PlayerRef {
                    id: PlayerId::from("INT-DEF-1"),
                    name: "Bastoni".to_string(),
                },
                color: CardColor::Red,
                second_yellow: true,
            },
            text: "Second yellow".to_string(),
            important: true,
        };
        let s = serde_json::to_string(&e).unwrap();
        assert!(s.contains("\"type\":\"card\""));
        assert!(s.contains("\"color\":\"red\""));
        let back: MatchEvent = serde_json::from_str(&s).unwrap();
        assert_eq!(back, e);
    }

    #[test]
    fn fixture_is_unplayed_and_empty() {
        let m = Match::fixture("R0-A-B", TeamId::from("A"), TeamId::from("B"), 1);
        assert!(!m.played);
        assert_eq!((m.home_score, m.away_score), (0, 0));
        assert!(m.events.is_empty());
        assert!(m.involves(&TeamId::from("B")));
        assert!(!m.involves(&TeamId::from("C")));
    }

    #[test]
    fn formations_have_eleven_slots_and_one_keeper() {
        for f in [Formation::F4231, Formation::F433] {
            let slots = f.slots();
            assert_eq!(slots.iter().map(|(_, n)| n).sum::<usize>(), STARTING_ELEVEN);
            assert_eq!(slots[0], (Role::GK, 1));
        }
    }

    #[test]
    fn actors_cover_both_substitution_sides() {
        let e = MatchEvent {
            minute: 70,
            extra_minute: 0,
            kind: EventKind::Substitution {
                team_id: TeamId::from("A"),
                on: PlayerRef { id: PlayerId::from("on"), name: "On".into() },
                off: PlayerRef { id: PlayerId::from("off"), name: "Off".into() },
            },
            text: String::new(),
            important: false,
        };
        let ids: Vec<&str> = e.actors().iter().map(|p| p.0.as_str()).collect();
        assert_eq!(ids, vec!["on", "off"]);
        assert_eq!(e.team_id(), Some(&TeamId::from("A")));
    }

    #[test]
    fn league_rejects_duplicate_team_ids() {
        let teams = vec![team("A"), team("A")];
        assert_eq!(
            validate_league(&teams),
            Err(ValidationError::DuplicateId("A".to_string()))
        );
        assert!(validate_league(&[team("A"), team("B")]).is_ok());
    }

    #[test]
    fn team_rejects_duplicate_player_ids() {
        let mut t = team("A");
        let dup = t.players[0].clone();
        t.players.push(dup);
        assert!(matches!(validate_team(&t), Err(ValidationError::DuplicateId(_))));
    }

    #[test]
    fn default_config_is_valid() {
        validate_match_config(&MatchConfig::default()).unwrap();
        let bad = MatchConfig {
            min_subs: 6,
            ..MatchConfig::default()
        };
        assert!(validate_match_config(&bad).is_err());
    }

    #[test]
    fn config_fills_missing_fields_from_default() {
        let c: MatchConfig = serde_json::from_str(r#"{"home_advantage": 1.25}"#).unwrap();
        assert_eq!(c.home_advantage, 1.25);
        assert_eq!(c.penalty_conversion, MatchConfig::default().penalty_conversion);
    }

    proptest! {
        #[test]
        fn ratings_in_range_validate(rating in 1u8..=99) {
            let p = Player::new("p", "Name", Role::MID, rating, 25);
            prop_assert!(validate_player(&p).is_ok());
        }

        #[test]
        fn probabilities_above_one_rejected(v in 1.0001f64..10.0) {
            let c = MatchConfig { card_probability: v, ..MatchConfig::default() };
            let rejected = matches!(
                validate_match_config(&c),
                Err(ValidationError::InvalidProbability { .. })
            );
            prop_assert!(rejected);
        }
    }
}
