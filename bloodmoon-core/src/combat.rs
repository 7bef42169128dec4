//! Battle resolution
//!
//! Two resolvers share one probability model:
//! - [`expected_outcome`] is deterministic and is the only one the search
//!   may call.
//! - [`simulate_battle`] draws a random result, for the referee and for
//!   self-play.

use rand::Rng;

/// Ratio at which a fight is decided without a battle
pub const OVERWHELMING_RATIO: f64 = 1.5;

/// Probability that `attackers` beat `defenders`.
///
/// Values of 1.0 or more mean a certain win. An empty target is a certain
/// win as well.
pub fn win_probability(attackers: u32, defenders: u32) -> f64 {
    if defenders == 0 {
        return 1.0;
    }
    let a = attackers as f64;
    let d = defenders as f64;
    if attackers == defenders {
        0.5
    } else if attackers < defenders {
        a / (2.0 * d)
    } else {
        0.5 + (a - d) / (2.0 * d)
    }
}

/// True when `strong` outnumbers `weak` by at least [`OVERWHELMING_RATIO`]
pub fn overwhelms(strong: u32, weak: u32) -> bool {
    strong as f64 >= weak as f64 * OVERWHELMING_RATIO
}

/// Probability-weighted survivors of a battle
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExpectedOutcome {
    /// Expected attackers (plus converted humans) holding the cell
    pub attackers: f64,
    /// Expected defenders left
    pub defenders: f64,
}

/// Expected-value resolution of `attackers` vs `defenders`.
///
/// When the target is neutral, a win also converts an expected share of the
/// humans to the attacker's side.
pub fn expected_outcome(attackers: u32, defenders: u32, target_is_neutral: bool) -> ExpectedOutcome {
    let p = win_probability(attackers, defenders);
    let a = attackers as f64;
    let d = defenders as f64;

    if p >= 1.0 {
        return ExpectedOutcome {
            attackers: a,
            defenders: 0.0,
        };
    }
    if p <= 0.0 {
        return ExpectedOutcome {
            attackers: 0.0,
            defenders: d,
        };
    }

    let mut if_win = a * p;
    if target_is_neutral {
        if_win += d * p;
    }
    let if_lose = d * (1.0 - p);

    ExpectedOutcome {
        attackers: if_win * p,
        defenders: if_lose * (1.0 - p),
    }
}

/// Result of one sampled battle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BattleResult {
    pub attackers_won: bool,
    /// Attackers holding the cell afterwards, converted humans included
    pub attackers: u32,
    pub defenders: u32,
}

/// Sample a random battle.
///
/// On a win every attacker survives with probability p and, against humans,
/// every human is converted with probability p. On a loss every defender
/// survives with probability 1 - p.
pub fn simulate_battle<R: Rng>(
    attackers: u32,
    defenders: u32,
    target_is_neutral: bool,
    rng: &mut R,
) -> BattleResult {
    let p = win_probability(attackers, defenders);

    if rng.gen::<f64>() < p {
        let survivors = (0..attackers).filter(|_| rng.gen::<f64>() < p).count() as u32;
        let converted = if target_is_neutral {
            (0..defenders).filter(|_| rng.gen::<f64>() < p).count() as u32
        } else {
            0
        };
        BattleResult {
            attackers_won: true,
            attackers: survivors + converted,
            defenders: 0,
        }
    } else {
        let survivors = (0..defenders)
            .filter(|_| rng.gen::<f64>() < 1.0 - p)
            .count() as u32;
        BattleResult {
            attackers_won: false,
            attackers: 0,
            defenders: survivors,
        }
    }
}
