#![deny(warnings)]

//! Season aggregation: folds played matches into team records and player
//! counters, and handles the turnover between seasons.

use rand::Rng;
use serde::{Deserialize, Serialize};
use sim_core::{CardColor, EventKind, Match, Player, PlayerId, Team, TeamId};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{info, warn};

/// Points for a win.
pub const WIN_POINTS: u32 = 3;
/// Points for a draw.
pub const DRAW_POINTS: u32 = 1;
/// Every this many season bookings costs a one-match ban.
pub const YELLOWS_PER_BAN: u32 = 3;
/// Injury lay-off bounds in weeks.
pub const INJURY_WEEKS: (u32, u32) = (1, 4);

/// Errors produced while applying results.
#[derive(Debug, Error, PartialEq)]
pub enum SeasonError {
    /// Match references a team this season does not know.
    #[error("unknown team: {0}")]
    UnknownTeam(TeamId),
    /// Only completed matches can be applied.
    #[error("match {0} has not been played")]
    NotPlayed(String),
}

/// Teams moved between the two tiers at season turnover.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Turnover {
    pub relegated: Vec<TeamId>,
    pub promoted: Vec<TeamId>,
}

/// Owns the league's teams for the duration of a season.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Season {
    teams: Vec<Team>,
}

impl Season {
    pub fn new(teams: Vec<Team>) -> Self {
        Season { teams }
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn into_teams(self) -> Vec<Team> {
        self.teams
    }

    pub fn team(&self, id: &TeamId) -> Option<&Team> {
        self.teams.iter().find(|t| &t.id == id)
    }

    fn index_of(&self, id: &TeamId) -> Result<usize, SeasonError> {
        self.teams
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| SeasonError::UnknownTeam(id.clone()))
    }

    /// Apply one completed match to both sides.
    ///
    /// Existing bans and injuries of both squads tick down first, then the
    /// record, appearances, goals and cards are added and new bans or
    /// injuries are issued from the event log.
    pub fn apply_result<R: Rng + ?Sized>(&mut self, m: &Match, rng: &mut R) -> Result<(), SeasonError> {
        if !m.played {
            return Err(SeasonError::NotPlayed(m.id.clone()));
        }
        let home = self.index_of(&m.home_team_id)?;
        let away = self.index_of(&m.away_team_id)?;

        apply_side(&mut self.teams[home], m, m.home_score, m.away_score, rng);
        apply_side(&mut self.teams[away], m, m.away_score, m.home_score, rng);
        Ok(())
    }

    /// Apply every played match of a week; unplayed fixtures are skipped.
    pub fn apply_week<R: Rng + ?Sized>(&mut self, matches: &[Match], rng: &mut R) -> Result<(), SeasonError> {
        for m in matches.iter().filter(|m| m.played) {
            self.apply_result(m, rng)?;
        }
        Ok(())
    }

    /// League table for one tier: points, goal difference, goals for, then id.
    pub fn standings(&self, league: &str) -> Vec<&Team> {
        let mut table: Vec<&Team> = self.teams.iter().filter(|t| t.league == league).collect();
        table.sort_by(|a, b| table_order(a, b));
        table
    }

    /// Leading scorers across all tiers with their clubs.
    pub fn top_scorers(&self, n: usize) -> Vec<(&Team, &Player)> {
        let mut scorers: Vec<(&Team, &Player)> = self
            .teams
            .iter()
            .flat_map(|t| t.players.iter().map(move |p| (t, p)))
            .filter(|(_, p)| p.goals > 0)
            .collect();
        scorers.sort_by(|(_, a), (_, b)| b.goals.cmp(&a.goals).then_with(|| a.id.cmp(&b.id)));
        scorers.truncate(n);
        scorers
    }

    /// Swap the bottom `spots` of `top` with the top `spots` of `second`,
    /// then reset records and season counters. Bans and injuries carry over.
    pub fn start_new_season(&mut self, top: &str, second: &str, spots: usize) -> Turnover {
        let top_table: Vec<TeamId> = self.standings(top).iter().map(|t| t.id.clone()).collect();
        let second_table: Vec<TeamId> = self.standings(second).iter().map(|t| t.id.clone()).collect();
        let spots = spots.min(top_table.len()).min(second_table.len());

        let relegated = top_table[top_table.len() - spots..].to_vec();
        let promoted = second_table[..spots].to_vec();

        for team in &mut self.teams {
            if relegated.contains(&team.id) {
                team.league = second.to_string();
            } else if promoted.contains(&team.id) {
                team.league = top.to_string();
            }
            team.record = Default::default();
            for p in &mut team.players {
                p.goals = 0;
                p.assists = 0;
                p.appearances = 0;
                p.yellow_cards = 0;
                p.red_cards = 0;
            }
        }
        info!(?relegated, ?promoted, "new season started");
        Turnover {
            relegated,
            promoted,
        }
    }
}

fn table_order(a: &Team, b: &Team) -> Ordering {
    b.record
        .points
        .cmp(&a.record.points)
        .then_with(|| b.record.goal_difference().cmp(&a.record.goal_difference()))
        .then_with(|| b.record.goals_for.cmp(&a.record.goals_for))
        .then_with(|| a.id.cmp(&b.id))
}

fn apply_side<R: Rng + ?Sized>(team: &mut Team, m: &Match, scored: u32, conceded: u32, rng: &mut R) {
    for p in &mut team.players {
        p.suspension_matches_remaining = p.suspension_matches_remaining.saturating_sub(1);
        p.injury_weeks_remaining = p.injury_weeks_remaining.saturating_sub(1);
    }

    let r = &mut team.record;
    r.played += 1;
    r.goals_for += scored;
    r.goals_against += conceded;
    match scored.cmp(&conceded) {
        Ordering::Greater => {
            r.won += 1;
            r.points += WIN_POINTS;
        }
        Ordering::Equal => {
            r.drawn += 1;
            r.points += DRAW_POINTS;
        }
        Ordering::Less => r.lost += 1,
    }

    let team_id = team.id.clone();
    let lineup = if m.home_team_id == team_id {
        m.home_lineup.as_ref()
    } else {
        m.away_lineup.as_ref()
    };
    let mut appeared: BTreeSet<PlayerId> = lineup
        .map(|l| l.starting.iter().map(|p| p.id.clone()).collect())
        .unwrap_or_default();

    for e in m.events.iter().filter(|e| e.team_id() == Some(&team_id)) {
        match &e.kind {
            EventKind::Substitution { on, .. } => {
                appeared.insert(on.id.clone());
            }
            EventKind::Goal { scorer, .. } => {
                if let Some(p) = find(team, &scorer.id) {
                    p.goals += 1;
                }
            }
            EventKind::Card { player, color, .. } => {
                let Some(p) = find(team, &player.id) else {
                    continue;
                };
                match color {
                    CardColor::Red => {
                        p.red_cards += 1;
                        p.suspension_matches_remaining = p.suspension_matches_remaining.max(1);
                        info!(team = %team_id, player = %p.id, "red card suspension");
                    }
                    CardColor::Yellow => {
                        p.yellow_cards += 1;
                        if p.yellow_cards % YELLOWS_PER_BAN == 0 {
                            p.suspension_matches_remaining = p.suspension_matches_remaining.max(1);
                            info!(team = %team_id, player = %p.id, yellows = p.yellow_cards, "accumulated bookings suspension");
                        }
                    }
                }
            }
            EventKind::Injury { player, .. } => {
                let weeks = rng.gen_range(INJURY_WEEKS.0..=INJURY_WEEKS.1);
                if let Some(p) = find(team, &player.id) {
                    p.injury_weeks_remaining = p.injury_weeks_remaining.max(weeks);
                }
            }
            _ => {}
        }
    }

    for id in &appeared {
        if let Some(p) = find(team, id) {
            p.appearances += 1;
        }
    }
}

fn find<'a>(team: &'a mut Team, id: &PlayerId) -> Option<&'a mut Player> {
    let team_id = team.id.clone();
    let found = team.player_mut(id);
    if found.is_none() {
        warn!(team = %team_id, player = %id, "event references player outside the squad");
    }
    found
}
