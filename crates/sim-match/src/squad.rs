//! Synthetic squad generation for demo leagues, tests and benches.

use rand::seq::SliceRandom;
use rand::Rng;
use sim_core::{Player, Role, Team, TeamId, TeamRecord};

const FIRST_NAMES: &[&str] = &[
    "Marco", "Luca", "Giovanni", "Alessandro", "Matteo", "Lorenzo", "Andrea", "Federico",
    "Davide", "Simone", "Riccardo", "Nicolo", "Stefano", "Paolo", "Tommaso", "Gabriele",
];

const LAST_NAMES: &[&str] = &[
    "Rossi", "Russo", "Ferrari", "Esposito", "Bianchi", "Romano", "Colombo", "Ricci",
    "Marino", "Greco", "Bruno", "Gallo", "Conti", "De Luca", "Costa", "Giordano",
];

/// Squad shape: goalkeepers, defenders, midfielders, forwards.
pub const SQUAD_SHAPE: [(Role, usize); 4] = [(Role::GK, 3), (Role::DEF, 8), (Role::MID, 8), (Role::FWD, 7)];

/// Filler players sit below the headline team ratings, which describe the stars.
fn filler_base(team_rating: u8) -> i16 {
    let r = team_rating as i16;
    match team_rating {
        90..=u8::MAX => r - 13,
        85..=89 => r - 10,
        80..=84 => r - 7,
        _ => r - 4,
    }
}

/// Generate one squad member around `base` (±6, clamped to [55, 88]).
pub fn generate_player<R: Rng + ?Sized>(team_id: &TeamId, role: Role, base: i16, index: usize, rng: &mut R) -> Player {
    let rating = (base + rng.gen_range(-6..=6)).clamp(55, 88) as u8;
    let age = rng.gen_range(17..=34);
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Mario");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("Rossi");
    Player::new(
        format!("{team_id}-{role:?}-{index}"),
        format!("{first} {last}"),
        role,
        rating,
        age,
    )
}

/// Generate a 26-player team whose role ratings follow the team axes.
/// The squad is ordered best to worst.
pub fn generate_team<R: Rng + ?Sized>(
    id: &str,
    name: &str,
    league: &str,
    attack: u8,
    midfield: u8,
    defense: u8,
    rng: &mut R,
) -> Team {
    let team_id = TeamId::from(id);
    let mut players = Vec::with_capacity(26);
    for (role, count) in SQUAD_SHAPE {
        let base = match role {
            Role::GK | Role::DEF => filler_base(defense),
            Role::MID => filler_base(midfield),
            Role::FWD => filler_base(attack),
        };
        for i in 0..count {
            players.push(generate_player(&team_id, role, base, i, rng));
        }
    }
    players.sort_by(|a, b| b.rating.cmp(&a.rating));
    Team {
        id: team_id,
        name: name.to_string(),
        league: league.to_string(),
        attack,
        midfield,
        defense,
        record: TeamRecord::default(),
        players,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn squad_has_expected_shape_and_valid_ratings() {
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let t = generate_team("NAP", "Napoli", "Serie A", 86, 84, 82, &mut rng);
        sim_core::validate_team(&t).unwrap();
        assert_eq!(t.players.len(), 26);
        for (role, count) in SQUAD_SHAPE {
            assert_eq!(t.players.iter().filter(|p| p.role == role).count(), count);
        }
        assert!(t.players.iter().all(|p| (55..=88).contains(&p.rating)));
        assert!(t.players.windows(2).all(|w| w[0].rating >= w[1].rating));
    }

    #[test]
    fn ids_are_team_role_index() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let p = generate_player(&TeamId::from("ROM"), Role::FWD, 70, 4, &mut rng);
        assert_eq!(p.id.0, "ROM-FWD-4");
    }
}
