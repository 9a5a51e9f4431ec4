#![deny(warnings)]

//! Season calendar generation.
//!
//! Produces a double round-robin with the circle method: one team stays
//! fixed while the others rotate around it. Odd team counts are padded with
//! a bye slot whose fixtures are dropped. The second half mirrors the first
//! with home and away swapped.

use rand::seq::SliceRandom;
use rand::Rng;
use sim_core::{Match, Schedule, TeamId};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::debug;

/// Balance violations found in a generated calendar.
#[derive(Debug, Error, PartialEq)]
pub enum ScheduleError {
    /// Week count differs from `2 × (N' - 1)`.
    #[error("expected {expected} weeks, found {found}")]
    WeekCount { expected: usize, found: usize },
    /// A match's `week` field does not match its position.
    #[error("match {id} is listed in week {listed} but says week {week}")]
    WeekMismatch { id: String, listed: u32, week: u32 },
    /// A team is scheduled against itself.
    #[error("team {0} scheduled against itself")]
    SelfMatch(TeamId),
    /// A fixture references a team outside the input list.
    #[error("unknown team {0}")]
    UnknownTeam(TeamId),
    /// The input list repeats a team.
    #[error("duplicate team {0}")]
    DuplicateTeam(TeamId),
    /// A team plays twice in the same week.
    #[error("team {team} plays more than once in week {week}")]
    DoubleBooked { team: TeamId, week: u32 },
    /// An ordered home/away pairing appears other than exactly once.
    #[error("{home} vs {away} appears {count} times")]
    PairCount { home: TeamId, away: TeamId, count: usize },
    /// Already-played or non-empty fixture.
    #[error("fixture {0} is not a fresh unplayed match")]
    NotFresh(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Slot {
    Team(TeamId),
    Bye,
}

fn push_fixture(fixtures: &mut Vec<Match>, round: usize, a: &Slot, b: &Slot, a_home: bool) {
    let (Slot::Team(a), Slot::Team(b)) = (a, b) else {
        return;
    };
    let (home, away) = if a_home { (a, b) } else { (b, a) };
    fixtures.push(Match::fixture(
        format!("R{round}-{a}-{b}"),
        home.clone(),
        away.clone(),
        round as u32 + 1,
    ));
}

/// Weeks a full calendar for `n` teams spans.
pub fn expected_weeks(n: usize) -> usize {
    if n < 2 {
        return 0;
    }
    let padded = n + n % 2;
    2 * (padded - 1)
}

/// Build a double round-robin for one tier.
///
/// Team order is shuffled first so that pairings vary between seasons.
/// Returns an empty schedule for fewer than two teams.
pub fn generate_schedule<R: Rng + ?Sized>(team_ids: &[TeamId], rng: &mut R) -> Schedule {
    if team_ids.len() < 2 {
        return Schedule::default();
    }
    let mut slots: Vec<Slot> = team_ids.iter().cloned().map(Slot::Team).collect();
    if slots.len() % 2 != 0 {
        slots.push(Slot::Bye);
    }
    slots.shuffle(rng);
    let pivot = slots.remove(0);
    let rounds = slots.len();

    let mut weeks: Vec<Vec<Match>> = Vec::with_capacity(2 * rounds);
    for round in 0..rounds {
        let mut fixtures = Vec::with_capacity(slots.len() / 2 + 1);
        push_fixture(&mut fixtures, round, &pivot, &slots[0], round % 2 == 0);
        for i in 1..=slots.len() / 2 {
            let j = slots.len() - i;
            push_fixture(&mut fixtures, round, &slots[i], &slots[j], i % 2 == 0);
        }
        weeks.push(fixtures);
        slots.rotate_left(1);
    }

    let mirrored: Vec<Vec<Match>> = weeks
        .iter()
        .enumerate()
        .map(|(idx, fixtures)| {
            let round = idx + rounds;
            fixtures
                .iter()
                .map(|m| {
                    Match::fixture(
                        format!("R{round}-{}-{}", m.away_team_id, m.home_team_id),
                        m.away_team_id.clone(),
                        m.home_team_id.clone(),
                        round as u32 + 1,
                    )
                })
                .collect()
        })
        .collect();
    weeks.extend(mirrored);

    debug!(
        teams = team_ids.len(),
        weeks = weeks.len(),
        fixtures = weeks.iter().map(Vec::len).sum::<usize>(),
        "schedule generated"
    );
    Schedule { weeks }
}

/// Check the balance invariants of a calendar built from `team_ids`.
pub fn validate_schedule(schedule: &Schedule, team_ids: &[TeamId]) -> Result<(), ScheduleError> {
    let mut teams: BTreeSet<&TeamId> = BTreeSet::new();
    for id in team_ids {
        if !teams.insert(id) {
            return Err(ScheduleError::DuplicateTeam(id.clone()));
        }
    }
    let expected = expected_weeks(team_ids.len());
    if schedule.len() != expected {
        return Err(ScheduleError::WeekCount {
            expected,
            found: schedule.len(),
        });
    }

    let mut pairs: BTreeMap<(&TeamId, &TeamId), usize> = BTreeMap::new();
    for (idx, fixtures) in schedule.weeks.iter().enumerate() {
        let listed = idx as u32 + 1;
        let mut busy: BTreeSet<&TeamId> = BTreeSet::new();
        for m in fixtures {
            if m.week != listed {
                return Err(ScheduleError::WeekMismatch {
                    id: m.id.clone(),
                    listed,
                    week: m.week,
                });
            }
            if m.played || !m.events.is_empty() || m.home_score != 0 || m.away_score != 0 {
                return Err(ScheduleError::NotFresh(m.id.clone()));
            }
            if m.home_team_id == m.away_team_id {
                return Err(ScheduleError::SelfMatch(m.home_team_id.clone()));
            }
            for team in [&m.home_team_id, &m.away_team_id] {
                if !teams.contains(team) {
                    return Err(ScheduleError::UnknownTeam(team.clone()));
                }
                if !busy.insert(team) {
                    return Err(ScheduleError::DoubleBooked {
                        team: team.clone(),
                        week: listed,
                    });
                }
            }
            *pairs.entry((&m.home_team_id, &m.away_team_id)).or_default() += 1;
        }
    }

    for &home in &teams {
        for &away in &teams {
            if home == away {
                continue;
            }
            let count = pairs.get(&(home, away)).copied().unwrap_or(0);
            if count != 1 {
                return Err(ScheduleError::PairCount {
                    home: home.clone(),
                    away: away.clone(),
                    count,
                });
            }
        }
    }
    Ok(())
}

/// Combine per-tier calendars: week `i` holds week `i` of every tier.
pub fn merge_tiers(tiers: &[Schedule]) -> Schedule {
    let weeks = tiers.iter().map(Schedule::len).max().unwrap_or(0);
    let merged = (0..weeks)
        .map(|i| {
            tiers
                .iter()
                .filter_map(|t| t.weeks.get(i))
                .flatten()
                .cloned()
                .collect()
        })
        .collect();
    Schedule { weeks: merged }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn ids(n: usize) -> Vec<TeamId> {
        (0..n).map(|i| TeamId(format!("T{i:02}"))).collect()
    }

    fn schedule(n: usize, seed: u64) -> Schedule {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        generate_schedule(&ids(n), &mut rng)
    }

    #[test]
    fn four_teams_six_weeks_two_matches_each() {
        let teams: Vec<TeamId> = ["A", "B", "C", "D"].into_iter().map(TeamId::from).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let s = generate_schedule(&teams, &mut rng);
        assert_eq!(s.len(), 6);
        assert!(s.weeks.iter().all(|w| w.len() == 2));
        validate_schedule(&s, &teams).unwrap();

        let mut unordered: BTreeMap<(TeamId, TeamId), usize> = BTreeMap::new();
        for m in s.matches() {
            let key = if m.home_team_id < m.away_team_id {
                (m.home_team_id.clone(), m.away_team_id.clone())
            } else {
                (m.away_team_id.clone(), m.home_team_id.clone())
            };
            *unordered.entry(key).or_default() += 1;
        }
        assert_eq!(unordered.len(), 6);
        assert!(unordered.values().all(|&c| c == 2));
    }

    #[test]
    fn second_half_mirrors_first() {
        let s = schedule(6, 3);
        let rounds = s.len() / 2;
        for (first, second) in s.weeks[..rounds].iter().zip(&s.weeks[rounds..]) {
            assert_eq!(first.len(), second.len());
            for (a, b) in first.iter().zip(second) {
                assert_eq!(a.home_team_id, b.away_team_id);
                assert_eq!(a.away_team_id, b.home_team_id);
                assert_eq!(b.week, a.week + rounds as u32);
            }
        }
    }

    #[test]
    fn odd_count_drops_bye_fixtures() {
        let s = schedule(5, 9);
        assert_eq!(s.len(), 10);
        assert!(s.weeks.iter().all(|w| w.len() == 2));
        assert_eq!(s.matches().count(), 20);
        validate_schedule(&s, &ids(5)).unwrap();
    }

    #[test]
    fn fewer_than_two_teams_is_empty() {
        assert!(schedule(0, 1).is_empty());
        assert!(schedule(1, 1).is_empty());
        validate_schedule(&schedule(1, 1), &ids(1)).unwrap();
    }

    #[test]
    fn two_teams_meet_home_and_away() {
        let s = schedule(2, 4);
        assert_eq!(s.len(), 2);
        validate_schedule(&s, &ids(2)).unwrap();
    }

    #[test]
    fn fixtures_are_fresh() {
        let s = schedule(8, 5);
        assert!(s
            .matches()
            .all(|m| !m.played && m.events.is_empty() && m.home_score == 0 && m.away_score == 0));
    }

    #[test]
    fn seeds_vary_the_calendar() {
        let a = schedule(10, 1);
        let b = schedule(10, 2);
        assert_ne!(a, b);
        assert_eq!(a, schedule(10, 1));
    }

    #[test]
    fn home_and_away_counts_balance_over_season() {
        let s = schedule(20, 11);
        for team in ids(20) {
            let home = s.matches().filter(|m| m.home_team_id == team).count();
            let away = s.matches().filter(|m| m.away_team_id == team).count();
            assert_eq!(home, 19);
            assert_eq!(away, 19);
        }
    }

    #[test]
    fn validation_catches_tampering() {
        let teams = ids(4);
        let mut s = schedule(4, 8);
        s.weeks[0][0].away_team_id = s.weeks[0][0].home_team_id.clone();
        assert!(matches!(
            validate_schedule(&s, &teams),
            Err(ScheduleError::SelfMatch(_))
        ));

        let mut s = schedule(4, 8);
        s.weeks.pop();
        assert_eq!(
            validate_schedule(&s, &teams),
            Err(ScheduleError::WeekCount { expected: 6, found: 5 })
        );

        let mut s = schedule(4, 8);
        s.weeks[2][0].played = true;
        assert!(matches!(validate_schedule(&s, &teams), Err(ScheduleError::NotFresh(_))));

        let s = schedule(4, 8);
        assert_eq!(
            validate_schedule(&s, &ids(3)),
            Err(ScheduleError::UnknownTeam(TeamId::from("T03")))
        );
    }

    #[test]
    fn merge_interleaves_tiers_by_week() {
        let top = schedule(4, 1);
        let second = schedule(6, 2);
        let merged = merge_tiers(&[top.clone(), second.clone()]);
        assert_eq!(merged.len(), 10);
        assert_eq!(merged.weeks[0].len(), 2 + 3);
        assert_eq!(merged.weeks[9].len(), 3);
        assert_eq!(merged.matches().count(), top.matches().count() + second.matches().count());
    }

    proptest! {
        #[test]
        fn any_league_is_balanced(n in 2usize..24, seed in any::<u64>()) {
            let teams = ids(n);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let s = generate_schedule(&teams, &mut rng);
            prop_assert_eq!(s.len(), expected_weeks(n));
            prop_assert_eq!(validate_schedule(&s, &teams), Ok(()));
        }
    }
}
