//! Weighted roulette-wheel selection of an on-pitch player.

use rand::Rng;
use sim_core::{Player, PlayerId, Role};
use std::collections::BTreeSet;

/// Why a player is being picked; drives the role weighting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Purpose {
    /// Scorer, penalty taker or chance. Goalkeepers never qualify.
    Attack,
    /// Late equaliser hunt: the goalkeeper gets the given small weight.
    DesperateAttack { keeper_weight: f64 },
    /// Booking or penalty-conceding defender.
    Foul,
    /// Knock: every role is equally exposed.
    Injury,
}

/// Weight of `player` for `purpose`. Attacking weights grow with `(rating/50)^3`.
pub fn weight(player: &Player, purpose: Purpose) -> f64 {
    match purpose {
        Purpose::Attack | Purpose::DesperateAttack { .. } => {
            let role_weight = match (player.role, purpose) {
                (Role::FWD, _) => 12.0,
                (Role::MID, _) => 6.0,
                (Role::DEF, _) => 1.0,
                (Role::GK, Purpose::DesperateAttack { keeper_weight }) => keeper_weight,
                (Role::GK, _) => 0.0,
            };
            role_weight * (player.match_rating() as f64 / 50.0).powi(3)
        }
        Purpose::Foul => match player.role {
            Role::DEF => 10.0,
            Role::MID => 6.0,
            Role::FWD => 2.0,
            Role::GK => 0.5,
        },
        Purpose::Injury => 1.0,
    }
}

/// Pick one player from `candidates` proportionally to [`weight`], skipping `excluded`.
///
/// Never fails on a non-empty slice: if every candidate is excluded the first
/// candidate is returned, and if all weights are zero the first eligible one is.
/// Returns `None` only for an empty slice.
pub fn select<'a, R: Rng + ?Sized>(
    candidates: &'a [Player],
    purpose: Purpose,
    excluded: &BTreeSet<PlayerId>,
    rng: &mut R,
) -> Option<&'a Player> {
    let eligible: Vec<&Player> = candidates
        .iter()
        .filter(|p| !excluded.contains(&p.id))
        .collect();
    let Some(&first) = eligible.first() else {
        return candidates.first();
    };

    let weights: Vec<f64> = eligible.iter().map(|p| weight(p, purpose)).collect();
    let total: f64 = weights.iter().sum();
    if !(total.is_finite() && total > 0.0) {
        return Some(first);
    }

    let mut remainder = rng.gen::<f64>() * total;
    for (player, w) in eligible.iter().zip(&weights) {
        remainder -= w;
        if remainder <= 0.0 {
            return Some(*player);
        }
    }
    Some(first)
}
