//! Position evaluation

use crate::combat::win_probability;
use crate::game::{GameState, Group, Side, Species};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Heuristic weights for position evaluation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Heuristics {
    /// Score per unit of material difference
    pub material_weight: f64,
    /// Score per extra group (spreading out)
    pub dispersion_weight: f64,
    /// Reward for a confident target within `close_radius`, divided by 1 + distance
    pub close_confident_bonus: f64,
    /// Reward for a marginal target within `close_radius`, divided by 1 + distance
    pub close_marginal_bonus: f64,
    /// Penalty for a losing target within `close_radius`, divided by 1 + distance
    pub close_losing_penalty: f64,
    /// Flat reward for a confident target within `distant_radius`
    pub distant_confident_bonus: f64,
    pub close_radius: i32,
    pub distant_radius: i32,
    /// Win probability counted as confident
    pub confident_probability: f64,
    /// Win probability counted as marginal
    pub marginal_probability: f64,
    /// Weight of count / (1 + distance to center)
    pub center_weight: f64,
    /// Score when one group can crush an adjacent rival group
    pub threat_bonus: f64,
    pub threat_radius: i32,
    /// Size ratio at which a group counts as crushing another
    pub threat_ratio: f64,
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            material_weight: 100.0,
            dispersion_weight: 10.0,
            close_confident_bonus: 40.0,
            close_marginal_bonus: 15.0,
            close_losing_penalty: 50.0,
            distant_confident_bonus: 10.0,
            close_radius: 2,
            distant_radius: 4,
            confident_probability: 0.7,
            marginal_probability: 0.5,
            center_weight: 2.0,
            threat_bonus: 20.0,
            threat_radius: 2,
            threat_ratio: 1.5,
        }
    }
}

impl Heuristics {
    /// Load weights from JSON file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Terminal score (effectively infinite)
pub const WIN_VALUE: f64 = 10000.0;

/// Evaluate position from `side`'s perspective. Positive favors `side`.
pub fn evaluate(state: &GameState, side: Side, heuristics: &Heuristics) -> f64 {
    if state.sides().is_none() {
        return 0.0;
    }

    let mine = state.side_total(side);
    let theirs = state.side_total(side.opponent());
    if mine == 0 {
        return -WIN_VALUE;
    }
    if theirs == 0 {
        return WIN_VALUE;
    }

    let my_groups = state.groups(side);
    let their_groups = state.groups(side.opponent());
    let humans = state.groups_of(Species::Human);

    let mut score = (mine as f64 - theirs as f64) * heuristics.material_weight;
    score += (my_groups.len() as f64 - their_groups.len() as f64) * heuristics.dispersion_weight;

    if !humans.is_empty() {
        score += human_prospects(&my_groups, &humans, heuristics);
        score -= rival_prospects(&their_groups, &humans, heuristics);
    }

    score += center_control(state, &my_groups, &their_groups) * heuristics.center_weight;
    score += threats(&my_groups, &their_groups, heuristics);

    score
}

/// How well placed our groups are to take human camps
fn human_prospects(groups: &[Group], humans: &[Group], h: &Heuristics) -> f64 {
    let mut score = 0.0;
    for g in groups {
        for camp in humans {
            let dist = g.coord.manhattan(camp.coord);
            let p = win_probability(g.count, camp.count);
            let falloff = 1.0 + dist as f64;

            if dist <= h.close_radius {
                if p >= h.confident_probability {
                    score += h.close_confident_bonus / falloff;
                } else if p >= h.marginal_probability {
                    score += h.close_marginal_bonus / falloff;
                } else {
                    score -= h.close_losing_penalty / falloff;
                }
            } else if dist <= h.distant_radius && p >= h.confident_probability {
                score += h.distant_confident_bonus;
            }
        }
    }
    score
}

/// The rival's chances at the same camps. Losing approaches are not
/// credited back to us.
fn rival_prospects(groups: &[Group], humans: &[Group], h: &Heuristics) -> f64 {
    let mut score = 0.0;
    for g in groups {
        for camp in humans {
            let dist = g.coord.manhattan(camp.coord);
            let p = win_probability(g.count, camp.count);
            let falloff = 1.0 + dist as f64;

            if dist <= h.close_radius && p >= h.confident_probability {
                score += h.close_confident_bonus / falloff;
            } else if dist <= h.close_radius && p >= h.marginal_probability {
                score += h.close_marginal_bonus / falloff;
            } else if dist <= h.distant_radius && p >= h.confident_probability {
                score += h.distant_confident_bonus;
            }
        }
    }
    score
}

/// Our weighted presence near the center minus theirs
fn center_control(state: &GameState, mine: &[Group], theirs: &[Group]) -> f64 {
    let center = state.center();
    let control = |groups: &[Group]| -> f64 {
        groups
            .iter()
            .map(|g| g.count as f64 / (1.0 + g.coord.manhattan(center) as f64))
            .sum()
    };
    control(mine) - control(theirs)
}

/// Nearby group pairs where one side can wipe out the other
fn threats(mine: &[Group], theirs: &[Group], h: &Heuristics) -> f64 {
    let mut score = 0.0;
    for ours in mine {
        for rival in theirs {
            if ours.coord.manhattan(rival.coord) > h.threat_radius {
                continue;
            }
            let (a, b) = (ours.count as f64, rival.count as f64);
            if a >= b * h.threat_ratio {
                score += h.threat_bonus;
            } else if b >= a * h.threat_ratio {
                score -= h.threat_bonus;
            }
        }
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Coord;
    use crate::game::Faction;

    fn duel(ours: u32, theirs: u32) -> GameState {
        let mut state = GameState::with_sides(11, 11, Faction::Vampire).unwrap();
        state.set_count(Coord::new(0, 0), Species::Vampire, ours).unwrap();
        state.set_count(Coord::new(10, 10), Species::Werewolf, theirs).unwrap();
        state
    }

    #[test]
    fn test_evaluate_symmetric() {
        let h = Heuristics::default();
        let score = evaluate(&duel(10, 10), Side::Ours, &h);
        assert!(score.abs() < 1e-9, "Score {} should be 0 for symmetric position", score);
    }

    #[test]
    fn test_side_antisymmetry_without_humans() {
        let h = Heuristics::default();
        let mut state = duel(12, 7);
        state.set_count(Coord::new(9, 9), Species::Vampire, 3).unwrap();
        let ours = evaluate(&state, Side::Ours, &h);
        let theirs = evaluate(&state, Side::Theirs, &h);
        assert!((ours + theirs).abs() < 1e-9);
    }

    #[test]
    fn test_material_advantage_scores_higher() {
        let h = Heuristics::default();
        let even = evaluate(&duel(10, 10), Side::Ours, &h);
        let ahead = evaluate(&duel(20, 10), Side::Ours, &h);
        let behind = evaluate(&duel(5, 20), Side::Ours, &h);
        assert!(ahead > even);
        assert!(behind < even);
    }

    #[test]
    fn test_material_dominates_positional_terms() {
        let h = Heuristics::default();
        let mut state = duel(10, 10);
        state.set_count(Coord::new(2, 1), Species::Human, 4).unwrap();
        let before = evaluate(&state, Side::Ours, &h);
        state.set_count(Coord::new(0, 0), Species::Vampire, 11).unwrap();
        let after = evaluate(&state, Side::Ours, &h);
        assert!(after > before);
    }

    #[test]
    fn test_terminal_sentinels() {
        let h = Heuristics::default();
        let mut lost = duel(0, 10);
        lost.set_count(Coord::new(5, 5), Species::Human, 40).unwrap();
        assert_eq!(evaluate(&lost, Side::Ours, &h), -WIN_VALUE);
        assert_eq!(evaluate(&lost, Side::Theirs, &h), WIN_VALUE);
        assert_eq!(evaluate(&duel(3, 0), Side::Ours, &h), WIN_VALUE);
    }

    #[test]
    fn test_unresolved_is_neutral() {
        let state = GameState::new(3, 3).unwrap();
        assert_eq!(evaluate(&state, Side::Ours, &Heuristics::default()), 0.0);
    }

    #[test]
    fn test_close_winnable_camp_rewarded() {
        let h = Heuristics::default();
        let base = duel(10, 10);
        let mut near = base.clone();
        near.set_count(Coord::new(1, 0), Species::Human, 3).unwrap();
        let mut risky = base.clone();
        risky.set_count(Coord::new(1, 0), Species::Human, 30).unwrap();

        let base_score = evaluate(&base, Side::Ours, &h);
        assert!(evaluate(&near, Side::Ours, &h) > base_score);
        assert!(evaluate(&risky, Side::Ours, &h) < base_score);
    }

    #[test]
    fn test_rival_near_camp_penalized() {
        let h = Heuristics::default();
        let base = duel(10, 10);
        let mut state = base.clone();
        state.set_count(Coord::new(9, 10), Species::Human, 3).unwrap();
        assert!(evaluate(&state, Side::Ours, &h) < evaluate(&base, Side::Ours, &h));
    }

    #[test]
    fn test_threat_term() {
        let h = Heuristics::default();
        let groups_a = [Group { coord: Coord::new(0, 0), count: 9 }];
        let groups_b = [Group { coord: Coord::new(1, 1), count: 6 }];
        assert_eq!(threats(&groups_a, &groups_b, &h), 20.0);
        assert_eq!(threats(&groups_b, &groups_a, &h), -20.0);

        let far = [Group { coord: Coord::new(3, 3), count: 1 }];
        assert_eq!(threats(&groups_a, &far, &h), 0.0);
    }

    #[test]
    fn test_load_partial_weights() {
        let path = std::env::temp_dir().join(format!("bloodmoon-weights-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"threat_bonus": 35.0}"#).unwrap();
        let h = Heuristics::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(h.threat_bonus, 35.0);
        assert_eq!(h.material_weight, 100.0);
    }

    #[test]
    fn test_default_heuristics() {
        let h = Heuristics::default();
        assert!(h.material_weight > h.dispersion_weight);
        assert!(h.confident_probability > h.marginal_probability);
    }
}
