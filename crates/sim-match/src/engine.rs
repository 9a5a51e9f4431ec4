//! Minute-by-minute match state machine.
//!
//! Phases run in a fixed order: kick-off (1), first half (2..=45), first-half
//! stoppage (45+1..=45+k1), half time, restart (46), second half (47..=90),
//! second-half stoppage (90+1..=90+k2) and the full-time whistle. Each regular
//! tick resolves, in priority order, an injury, a tactical substitution, a
//! penalty or an open-play attack, and finally a discipline check.

use crate::commentary;
use crate::lineup::build_lineup;
use crate::roster::{Booking, RosterState};
use crate::selector::{self, Purpose};
use rand::seq::SliceRandom;
use rand::Rng;
use sim_core::{
    CardColor, EventKind, Match, MatchConfig, MatchEvent, MatchStats, Player, Role, Team, Whistle,
};
use tracing::{debug, trace};

/// Simulates fixtures with a fixed set of tunables.
#[derive(Clone, Debug, Default)]
pub struct MatchSimulator {
    config: MatchConfig,
}

impl MatchSimulator {
    pub fn new(config: MatchConfig) -> Self {
        MatchSimulator { config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Play `home` against `away` and return the completed match.
    ///
    /// Team data is only read. The id defaults to `"{home}-{away}-{week}"`.
    pub fn simulate<R: Rng + ?Sized>(
        &self,
        home: &Team,
        away: &Team,
        week: u32,
        fixture_id: Option<&str>,
        rng: &mut R,
    ) -> Match {
        let cfg = &self.config;
        let home_lineup = build_lineup(home, cfg.form_swing, rng);
        let away_lineup = build_lineup(away, cfg.form_swing, rng);

        let (lo, hi) = (cfg.min_subs.min(cfg.max_subs), cfg.min_subs.max(cfg.max_subs));
        let max_subs = rng.gen_range(lo..=hi);
        let first_half_stoppage = rng.gen_range(0..=cfg.first_half_stoppage_max);
        let second_half_stoppage = rng.gen_range(0..=cfg.second_half_stoppage_max);

        let mut state = MatchState {
            config: cfg,
            home: SideState::new(home, RosterState::new(&home_lineup, max_subs)),
            away: SideState::new(away, RosterState::new(&away_lineup, max_subs)),
            events: Vec::new(),
        };

        state.whistle(1, 0, Whistle::KickOff, commentary::KICK_OFF.to_string(), false);
        for minute in 2..=45 {
            state.tick(minute, 0, rng);
        }
        if first_half_stoppage > 0 {
            state.whistle(
                45,
                0,
                Whistle::StoppageAnnounced(first_half_stoppage),
                commentary::stoppage(first_half_stoppage),
                false,
            );
            for extra in 1..=first_half_stoppage {
                state.tick(45, extra, rng);
            }
        }
        state.whistle(
            45,
            first_half_stoppage,
            Whistle::HalfTime,
            commentary::HALF_TIME.to_string(),
            false,
        );

        state.whistle(46, 0, Whistle::SecondHalf, commentary::SECOND_HALF.to_string(), false);
        for minute in 47..=90 {
            state.tick(minute, 0, rng);
        }
        if second_half_stoppage > 0 {
            state.whistle(
                90,
                0,
                Whistle::StoppageAnnounced(second_half_stoppage),
                commentary::stoppage(second_half_stoppage),
                false,
            );
            for extra in 1..=second_half_stoppage {
                state.tick(90, extra, rng);
            }
        }
        state.whistle(
            90,
            second_half_stoppage,
            Whistle::FullTime,
            commentary::FULL_TIME.to_string(),
            true,
        );

        let id = fixture_id
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}-{}-{}", home.id, away.id, week));
        debug!(
            %id,
            home = %home.id,
            away = %away.id,
            home_score = state.home.score,
            away_score = state.away.score,
            events = state.events.len(),
            "match simulated"
        );

        Match {
            id,
            home_team_id: home.id.clone(),
            away_team_id: away.id.clone(),
            home_score: state.home.score,
            away_score: state.away.score,
            played: true,
            week,
            first_half_stoppage,
            second_half_stoppage,
            max_subs,
            stats: MatchStats {
                home_possession_ticks: state.home.possession,
                away_possession_ticks: state.away.possession,
                home_chances: state.home.chances,
                away_chances: state.away.chances,
            },
            events: state.events,
            home_lineup: Some(home_lineup),
            away_lineup: Some(away_lineup),
        }
    }
}

/// Simulate with the default tunables.
pub fn simulate_match<R: Rng + ?Sized>(
    home: &Team,
    away: &Team,
    week: u32,
    fixture_id: Option<&str>,
    rng: &mut R,
) -> Match {
    MatchSimulator::default().simulate(home, away, week, fixture_id, rng)
}

/// Probability of a tactical change for one side in a given tick.
pub fn substitution_probability(minute: u8, extra_minute: u8) -> f64 {
    match minute {
        90 if extra_minute > 0 => 0.40,
        0..=59 => 0.015,
        60..=69 => 0.05,
        70..=79 => 0.10,
        _ => 0.18,
    }
}

fn roll<R: Rng + ?Sized>(rng: &mut R, p: f64) -> bool {
    rng.gen::<f64>() < p
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Home,
    Away,
}

impl Side {
    fn other(self) -> Side {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }
}

struct SideState<'t> {
    team: &'t Team,
    roster: RosterState,
    score: u32,
    possession: u32,
    chances: u32,
}

impl<'t> SideState<'t> {
    fn new(team: &'t Team, roster: RosterState) -> Self {
        SideState {
            team,
            roster,
            score: 0,
            possession: 0,
            chances: 0,
        }
    }
}

struct MatchState<'t, 'c> {
    config: &'c MatchConfig,
    home: SideState<'t>,
    away: SideState<'t>,
    events: Vec<MatchEvent>,
}

impl<'t, 'c> MatchState<'t, 'c> {
    fn side(&self, side: Side) -> &SideState<'t> {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut SideState<'t> {
        match side {
            Side::Home => &mut self.home,
            Side::Away => &mut self.away,
        }
    }

    fn push(&mut self, minute: u8, extra_minute: u8, kind: EventKind, text: String, important: bool) {
        trace!(minute, extra_minute, %text, "match event");
        self.events.push(MatchEvent {
            minute,
            extra_minute,
            kind,
            text,
            important,
        });
    }

    fn whistle(&mut self, minute: u8, extra_minute: u8, whistle: Whistle, text: String, important: bool) {
        self.push(minute, extra_minute, EventKind::Whistle { whistle }, text, important);
    }

    /// Weighted pick among a side's active players; `None` once nobody is left.
    fn pick<R: Rng + ?Sized>(&self, side: Side, purpose: Purpose, rng: &mut R) -> Option<Player> {
        let roster = &self.side(side).roster;
        if roster.active_count() == 0 {
            return None;
        }
        selector::select(roster.on_pitch(), purpose, roster.excluded(), rng).cloned()
    }

    /// Nonlinear team strength scaled by the share of the eleven still playing.
    fn strength(&self, side: Side) -> f64 {
        let s = self.side(side);
        let t = s.team;
        let base = (t.midfield as f64).powi(2)
            + (t.defense as f64).powf(1.5)
            + (t.attack as f64).powf(1.5);
        let scaled = base * s.roster.active_multiplier();
        match side {
            Side::Home => scaled * self.config.home_advantage,
            Side::Away => scaled,
        }
    }

    fn tick<R: Rng + ?Sized>(&mut self, minute: u8, extra_minute: u8, rng: &mut R) {
        for side in [Side::Home, Side::Away] {
            if self.try_injury(side, minute, extra_minute, rng) {
                return;
            }
        }
        let sub_probability = substitution_probability(minute, extra_minute);
        for side in [Side::Home, Side::Away] {
            if self.try_tactical_sub(side, sub_probability, minute, extra_minute, rng) {
                return;
            }
        }

        let home = self.strength(Side::Home);
        let away = self.strength(Side::Away);
        let home_share = if home + away > 0.0 { home / (home + away) } else { 0.5 };
        let attacking = if roll(rng, home_share) { Side::Home } else { Side::Away };
        self.side_mut(attacking).possession += 1;

        if roll(rng, self.config.penalty_probability)
            && self.try_penalty(attacking, minute, extra_minute, rng)
        {
            return;
        }
        self.open_play(attacking, minute, extra_minute, rng);
        self.discipline(attacking, minute, extra_minute, rng);
    }

    fn try_injury<R: Rng + ?Sized>(&mut self, side: Side, minute: u8, extra: u8, rng: &mut R) -> bool {
        if !roll(rng, self.config.injury_probability) {
            return false;
        }
        let Some(player) = self.pick(side, Purpose::Injury, rng) else {
            return false;
        };
        let team_id = self.side(side).team.id.clone();
        let text = commentary::render(commentary::INJURY, &[("player", player.name.as_str())], rng);
        self.push(
            minute,
            extra,
            EventKind::Injury {
                team_id,
                player: player.to_ref(),
            },
            text,
            true,
        );

        match self.side_mut(side).roster.substitute(&player.id, player.role) {
            Some((on, off)) => self.push_substitution(side, on, off, minute, extra, rng),
            None => self.side_mut(side).roster.send_off(&player.id),
        }
        true
    }

    fn try_tactical_sub<R: Rng + ?Sized>(
        &mut self,
        side: Side,
        probability: f64,
        minute: u8,
        extra: u8,
        rng: &mut R,
    ) -> bool {
        let roster = &self.side(side).roster;
        if !roster.can_substitute() || !roll(rng, probability) {
            return false;
        }
        let Some((off_id, role)) = roster
            .tactical_candidates()
            .choose(rng)
            .map(|p| (p.id.clone(), p.role))
        else {
            return false;
        };
        match self.side_mut(side).roster.substitute(&off_id, role) {
            Some((on, off)) => {
                self.push_substitution(side, on, off, minute, extra, rng);
                true
            }
            None => false,
        }
    }

    fn push_substitution<R: Rng + ?Sized>(
        &mut self,
        side: Side,
        on: sim_core::PlayerRef,
        off: sim_core::PlayerRef,
        minute: u8,
        extra: u8,
        rng: &mut R,
    ) {
        let team = self.side(side).team;
        let text = commentary::render(
            commentary::SUBSTITUTION,
            &[("team", team.name.as_str()), ("in", on.name.as_str()), ("out", off.name.as_str())],
            rng,
        );
        let team_id = team.id.clone();
        self.push(
            minute,
            extra,
            EventKind::Substitution { team_id, on, off },
            text,
            false,
        );
    }

    fn try_penalty<R: Rng + ?Sized>(&mut self, attacking: Side, minute: u8, extra: u8, rng: &mut R) -> bool {
        let Some(taker) = self.pick(attacking, Purpose::Attack, rng) else {
            return false;
        };
        let Some(fouler) = self.pick(attacking.other(), Purpose::Foul, rng) else {
            return false;
        };
        let team_id = self.side(attacking).team.id.clone();
        let text = commentary::render(
            commentary::PENALTY_AWARD,
            &[("player", taker.name.as_str()), ("def", fouler.name.as_str())],
            rng,
        );
        self.push(
            minute,
            extra,
            EventKind::PenaltyAward {
                team_id: team_id.clone(),
                taker: taker.to_ref(),
                fouled_by: fouler.to_ref(),
            },
            text,
            true,
        );

        if roll(rng, self.config.penalty_conversion) {
            self.side_mut(attacking).score += 1;
            let text = commentary::render(commentary::PENALTY_GOAL, &[("player", taker.name.as_str())], rng);
            self.push(
                minute,
                extra,
                EventKind::Goal {
                    team_id,
                    scorer: taker.to_ref(),
                    penalty: true,
                },
                text,
                true,
            );
        } else {
            let text = commentary::render(commentary::PENALTY_MISS, &[("player", taker.name.as_str())], rng);
            self.push(
                minute,
                extra,
                EventKind::PenaltyMiss {
                    team_id,
                    taker: taker.to_ref(),
                },
                text,
                true,
            );
        }
        true
    }

    fn open_play<R: Rng + ?Sized>(&mut self, attacking: Side, minute: u8, extra: u8, rng: &mut R) {
        let defending = attacking.other();
        let (att, def) = (self.side(attacking), self.side(defending));
        let attack = att.team.attack as f64 * att.roster.active_multiplier();
        let defense = (def.team.defense as f64 * def.roster.active_multiplier()).max(1.0);
        let mut probability = self.config.base_goal_chance * (attack / defense).powf(2.5);
        if attacking == Side::Home {
            probability *= self.config.home_advantage;
        }
        let desperate = minute >= 90 && def.score == att.score + 1;
        let team_id = att.team.id.clone();

        if roll(rng, probability) {
            let purpose = if desperate {
                Purpose::DesperateAttack {
                    keeper_weight: self.config.desperate_keeper_weight,
                }
            } else {
                Purpose::Attack
            };
            let Some(scorer) = self.pick(attacking, purpose, rng) else {
                return;
            };
            self.side_mut(attacking).score += 1;
            let pool = if scorer.role == Role::GK {
                commentary::KEEPER_GOAL
            } else {
                commentary::GOAL
            };
            let text = commentary::render(pool, &[("player", scorer.name.as_str())], rng);
            self.push(
                minute,
                extra,
                EventKind::Goal {
                    team_id,
                    scorer: scorer.to_ref(),
                    penalty: false,
                },
                text,
                true,
            );
        } else if roll(rng, self.config.chance_probability) {
            let Some(player) = self.pick(attacking, Purpose::Attack, rng) else {
                return;
            };
            self.side_mut(attacking).chances += 1;
            let text = commentary::render(commentary::CHANCE, &[("player", player.name.as_str())], rng);
            self.push(
                minute,
                extra,
                EventKind::Commentary {
                    team_id: Some(team_id),
                    player: Some(player.to_ref()),
                },
                text,
                false,
            );
        }
    }

    fn discipline<R: Rng + ?Sized>(&mut self, attacking: Side, minute: u8, extra: u8, rng: &mut R) {
        if !roll(rng, self.config.card_probability) {
            return;
        }
        let side = if roll(rng, self.config.foul_bias_non_possessing) {
            attacking.other()
        } else {
            attacking
        };
        let Some(offender) = self.pick(side, Purpose::Foul, rng) else {
            return;
        };
        let straight_red = roll(rng, self.config.straight_red_probability);
        let booking = self.side_mut(side).roster.book(&offender.id, straight_red);
        let (pool, color) = match booking {
            Booking::Yellow => (commentary::YELLOW, CardColor::Yellow),
            Booking::SecondYellow => (commentary::SECOND_YELLOW, CardColor::Red),
            Booking::StraightRed => (commentary::STRAIGHT_RED, CardColor::Red),
        };
        let text = commentary::render(pool, &[("player", offender.name.as_str())], rng);
        let team_id = self.side(side).team.id.clone();
        self.push(
            minute,
            extra,
            EventKind::Card {
                team_id,
                player: offender.to_ref(),
                color,
                second_yellow: booking == Booking::SecondYellow,
            },
            text,
            true,
        );
    }
}
