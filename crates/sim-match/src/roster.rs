//! Per-side, per-match squad state: who is on the pitch, who is waiting on
//! the bench, who has been removed, and who is on a booking.

use sim_core::{Lineup, Player, PlayerId, PlayerRef, Role};
use std::collections::{BTreeSet, VecDeque};

/// Outcome of showing a card to a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Booking {
    Yellow,
    SecondYellow,
    StraightRed,
}

/// Owned match state for one side.
#[derive(Clone, Debug)]
pub struct RosterState {
    on_pitch: Vec<Player>,
    bench: VecDeque<Player>,
    excluded: BTreeSet<PlayerId>,
    booked: BTreeSet<PlayerId>,
    subbed_on: BTreeSet<PlayerId>,
    subs_used: u8,
    max_subs: u8,
}

impl RosterState {
    /// Start from a lineup with a per-match substitution allowance.
    pub fn new(lineup: &Lineup, max_subs: u8) -> Self {
        RosterState {
            on_pitch: lineup.starting.clone(),
            bench: lineup.bench.iter().cloned().collect(),
            excluded: BTreeSet::new(),
            booked: BTreeSet::new(),
            subbed_on: BTreeSet::new(),
            subs_used: 0,
            max_subs,
        }
    }

    /// Players currently on the pitch, removed ones included.
    pub fn on_pitch(&self) -> &[Player] {
        &self.on_pitch
    }

    /// Ids that may no longer act (sent off, or injured with no substitute left).
    pub fn excluded(&self) -> &BTreeSet<PlayerId> {
        &self.excluded
    }

    /// Players still taking part.
    pub fn active(&self) -> impl Iterator<Item = &Player> {
        self.on_pitch
            .iter()
            .filter(move |p| !self.excluded.contains(&p.id))
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    /// Fraction of a full eleven still playing; scales effective strength.
    pub fn active_multiplier(&self) -> f64 {
        self.active_count() as f64 / sim_core::STARTING_ELEVEN as f64
    }

    pub fn subs_used(&self) -> u8 {
        self.subs_used
    }

    /// A substitution is allowed and someone is waiting on the bench.
    pub fn can_substitute(&self) -> bool {
        self.subs_used < self.max_subs && !self.bench.is_empty()
    }

    pub fn is_booked(&self, id: &PlayerId) -> bool {
        self.booked.contains(id)
    }

    /// Record a card. A second booking escalates to red; any red removes the player.
    pub fn book(&mut self, id: &PlayerId, straight_red: bool) -> Booking {
        let outcome = if straight_red {
            Booking::StraightRed
        } else if self.booked.contains(id) {
            Booking::SecondYellow
        } else {
            self.booked.insert(id.clone());
            Booking::Yellow
        };
        if outcome != Booking::Yellow {
            self.send_off(id);
        }
        outcome
    }

    /// Permanently remove a player from play without a replacement.
    pub fn send_off(&mut self, id: &PlayerId) {
        self.excluded.insert(id.clone());
    }

    /// Outgoing candidates for a tactical change.
    ///
    /// Outfield players only. Booked players who did not come off the bench go
    /// first, then anyone not already brought on, then the rest.
    pub fn tactical_candidates(&self) -> Vec<&Player> {
        let outfield: Vec<&Player> = self.active().filter(|p| p.role.is_outfield()).collect();
        let fresh = |p: &&Player| !self.subbed_on.contains(&p.id);

        let booked: Vec<&Player> = outfield
            .iter()
            .copied()
            .filter(|p| fresh(p) && self.booked.contains(&p.id))
            .collect();
        if !booked.is_empty() {
            return booked;
        }
        let unused: Vec<&Player> = outfield.iter().copied().filter(fresh).collect();
        if !unused.is_empty() {
            return unused;
        }
        outfield
    }

    /// Replace `off` with the first bench player of `role`, else the top of the bench.
    ///
    /// Returns `(on, off)` references, or `None` when no substitution is possible
    /// or `off` is not an active player.
    pub fn substitute(&mut self, off: &PlayerId, role: Role) -> Option<(PlayerRef, PlayerRef)> {
        if !self.can_substitute() || self.excluded.contains(off) {
            return None;
        }
        let slot = self.on_pitch.iter().position(|p| &p.id == off)?;
        let bench_idx = self.bench.iter().position(|p| p.role == role).unwrap_or(0);
        let incoming = self.bench.remove(bench_idx)?;
        let outgoing = std::mem::replace(&mut self.on_pitch[slot], incoming);
        let on = self.on_pitch[slot].to_ref();
        self.subbed_on.insert(on.id.clone());
        self.subs_used += 1;
        Some((on, outgoing.to_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::Formation;

    fn lineup() -> Lineup {
        let starting = vec![
            Player::new("gk", "Keeper", Role::GK, 80, 30),
            Player::new("d1", "D1", Role::DEF, 78, 27),
            Player::new("d2", "D2", Role::DEF, 77, 27),
            Player::new("m1", "M1", Role::MID, 79, 26),
            Player::new("f1", "F1", Role::FWD, 81, 24),
        ];
        let bench = vec![
            Player::new("bm", "Bench Mid", Role::MID, 74, 22),
            Player::new("bf", "Bench Fwd", Role::FWD, 73, 21),
        ];
        Lineup {
            starting,
            bench,
            formation: Formation::F433,
        }
    }

    fn id(s: &str) -> PlayerId {
        PlayerId::from(s)
    }

    #[test]
    fn second_yellow_escalates_and_removes() {
        let mut r = RosterState::new(&lineup(), 3);
        assert_eq!(r.book(&id("d1"), false), Booking::Yellow);
        assert_eq!(r.active_count(), 5);
        assert_eq!(r.book(&id("d1"), false), Booking::SecondYellow);
        assert_eq!(r.active_count(), 4);
        assert!(r.excluded().contains(&id("d1")));
    }

    #[test]
    fn straight_red_scales_multiplier() {
        let mut r = RosterState::new(&lineup(), 3);
        let before = r.active_multiplier();
        assert_eq!(r.book(&id("f1"), true), Booking::StraightRed);
        assert!(r.active_multiplier() < before);
        assert!((r.active_multiplier() - 4.0 / 11.0).abs() < 1e-12);
    }

    #[test]
    fn substitution_prefers_matching_role() {
        let mut r = RosterState::new(&lineup(), 3);
        let (on, off) = r.substitute(&id("f1"), Role::FWD).unwrap();
        assert_eq!(on.id, id("bf"));
        assert_eq!(off.id, id("f1"));
        assert_eq!(r.subs_used(), 1);
        assert!(r.active().any(|p| p.id == id("bf")));
        assert!(!r.active().any(|p| p.id == id("f1")));
    }

    #[test]
    fn substitution_falls_back_to_top_of_bench() {
        let mut r = RosterState::new(&lineup(), 3);
        let (on, _) = r.substitute(&id("d1"), Role::DEF).unwrap();
        assert_eq!(on.id, id("bm"));
    }

    #[test]
    fn substitutions_stop_at_allowance_or_empty_bench() {
        let mut r = RosterState::new(&lineup(), 1);
        assert!(r.substitute(&id("d1"), Role::DEF).is_some());
        assert!(!r.can_substitute());
        assert!(r.substitute(&id("d2"), Role::DEF).is_none());

        let mut r = RosterState::new(&lineup(), 5);
        assert!(r.substitute(&id("d1"), Role::DEF).is_some());
        assert!(r.substitute(&id("d2"), Role::DEF).is_some());
        assert!(r.substitute(&id("m1"), Role::MID).is_none());
    }

    #[test]
    fn sent_off_player_cannot_be_substituted() {
        let mut r = RosterState::new(&lineup(), 3);
        r.send_off(&id("m1"));
        assert!(r.substitute(&id("m1"), Role::MID).is_none());
    }

    #[test]
    fn tactical_candidates_prefer_booked_then_fresh() {
        let mut r = RosterState::new(&lineup(), 3);
        let all: Vec<&str> = r.tactical_candidates().iter().map(|p| p.id.0.as_str()).collect();
        assert_eq!(all, vec!["d1", "d2", "m1", "f1"]);

        r.book(&id("m1"), false);
        let booked: Vec<&str> = r.tactical_candidates().iter().map(|p| p.id.0.as_str()).collect();
        assert_eq!(booked, vec!["m1"]);

        r.substitute(&id("m1"), Role::MID).unwrap();
        let after: Vec<&str> = r.tactical_candidates().iter().map(|p| p.id.0.as_str()).collect();
        assert_eq!(after, vec!["d1", "d2", "f1"]);
    }
}
