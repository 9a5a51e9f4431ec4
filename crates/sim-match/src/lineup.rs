//! Match-day lineup construction: availability, form, formation and bench.

use rand::Rng;
use sim_core::{Formation, Lineup, Player, Role, Team};

/// Build a fresh lineup for one match.
///
/// Suspended and injured players are left out. Each remaining player gets a
/// form modifier in `[-form_swing, +form_swing]`, one of the two formation
/// templates is drawn, and role slots are filled by effective rating. Short
/// roles are padded with the best remaining outfield players; with no eligible
/// goalkeeper the weakest outfield starter goes in goal.
pub fn build_lineup<R: Rng + ?Sized>(team: &Team, form_swing: u8, rng: &mut R) -> Lineup {
    let swing = form_swing as i16;
    let mut pool: Vec<Player> = team
        .players
        .iter()
        .filter(|p| p.is_available())
        .map(|p| {
            let modifier = if swing > 0 { rng.gen_range(-swing..=swing) } else { 0 };
            let mut copy = p.clone();
            copy.effective_rating = Some((p.rating as i16 + modifier).clamp(1, 99) as u8);
            copy
        })
        .collect();

    let formation = if rng.gen_bool(0.5) {
        Formation::F4231
    } else {
        Formation::F433
    };

    // Stable sort keeps roster order among equal ratings.
    pool.sort_by(|a, b| b.match_rating().cmp(&a.match_rating()));

    let mut keeper = take_best(&mut pool, Role::GK);
    let mut outfield: Vec<Player> = Vec::with_capacity(10);
    for (role, count) in formation.slots() {
        if role == Role::GK {
            continue;
        }
        for _ in 0..count {
            match take_best(&mut pool, role) {
                Some(p) => outfield.push(p),
                None => break,
            }
        }
    }

    let outfield_slots = sim_core::STARTING_ELEVEN - 1;
    while outfield.len() < outfield_slots {
        match take_best_where(&mut pool, |p| p.role.is_outfield()) {
            Some(p) => outfield.push(p),
            None => break,
        }
    }

    if keeper.is_none() {
        keeper = promote_keeper(&mut outfield, &mut pool);
    }

    // A squad short of outfielders still fields spare goalkeepers.
    while outfield.len() < outfield_slots && !pool.is_empty() {
        outfield.push(pool.remove(0));
    }

    outfield.sort_by_key(|p| p.role);
    let starting: Vec<Player> = keeper.into_iter().chain(outfield).collect();

    Lineup {
        starting,
        bench: pool,
        formation,
    }
}

fn take_best(pool: &mut Vec<Player>, role: Role) -> Option<Player> {
    take_best_where(pool, |p| p.role == role)
}

fn take_best_where(pool: &mut Vec<Player>, pred: impl Fn(&Player) -> bool) -> Option<Player> {
    let idx = pool.iter().position(pred)?;
    Some(pool.remove(idx))
}

/// Move the lowest-rated eligible outfield player into goal, refilling the
/// outfield from the bench pool when possible.
fn promote_keeper(outfield: &mut Vec<Player>, pool: &mut Vec<Player>) -> Option<Player> {
    let weakest = outfield
        .iter()
        .enumerate()
        .min_by_key(|(_, p)| p.match_rating())
        .map(|(i, _)| i);
    let from_bench = pool
        .iter()
        .enumerate()
        .filter(|(_, p)| p.role.is_outfield())
        .min_by_key(|(_, p)| p.match_rating())
        .map(|(i, _)| i);

    // The weakest eligible outfielder may be sitting in the pool.
    let mut keeper = match (weakest, from_bench) {
        (Some(o), Some(b)) if pool[b].match_rating() < outfield[o].match_rating() => pool.remove(b),
        (Some(o), _) => {
            let p = outfield.remove(o);
            if let Some(refill) = take_best_where(pool, |p| p.role.is_outfield()) {
                outfield.push(refill);
            }
            p
        }
        (None, Some(b)) => pool.remove(b),
        (None, None) => return None,
    };
    keeper.role = Role::GK;
    Some(keeper)
}
