//! Scenario - starting map definition

use crate::board::Coord;
use crate::game::{CellCensus, Faction, GameError, GameState};
use rand::Rng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A map: dimensions, both home cells and the opening census
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub rows: usize,
    pub cols: usize,
    pub vampire_home: Coord,
    pub werewolf_home: Coord,
    pub cells: Vec<CellCensus>,
}

impl Scenario {
    /// Home cell of `faction`
    pub fn home(&self, faction: Faction) -> Coord {
        match faction {
            Faction::Vampire => self.vampire_home,
            Faction::Werewolf => self.werewolf_home,
        }
    }

    /// Opening position seen by `faction`. Fails if that faction's home
    /// cell does not hold its own units.
    pub fn to_game_state(&self, faction: Faction) -> anyhow::Result<GameState> {
        let home = self.home(faction);
        let state = GameState::initialize(self.rows, self.cols, home, &self.cells)?;
        if state.sides().map(|s| s.ours) != Some(faction) {
            anyhow::bail!(
                "scenario '{}': {} does not hold {:?} units",
                self.name,
                home,
                faction
            );
        }
        Ok(state)
    }

    /// Load from JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let scenario: Scenario = serde_json::from_str(&content)?;
        // Catch broken maps at load time rather than at the first move
        scenario.to_game_state(Faction::Vampire)?;
        scenario.to_game_state(Faction::Werewolf)?;
        Ok(scenario)
    }

    /// Save to JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Random map, point-symmetric around the board center. `camp_pairs`
    /// mirrored pairs of human camps are placed where room allows.
    pub fn random<R: Rng>(
        rng: &mut R,
        name: &str,
        rows: usize,
        cols: usize,
        camp_pairs: usize,
    ) -> Result<Self, GameError> {
        if rows == 0 || cols < 2 {
            return Err(GameError::InvalidDimensions { rows, cols });
        }
        Ok(Self::generate(rng, name, rows, cols, camp_pairs))
    }

    /// Body of [`Scenario::random`]; needs `rows >= 1` and `cols >= 2`
    fn generate<R: Rng>(
        rng: &mut R,
        name: &str,
        rows: usize,
        cols: usize,
        camp_pairs: usize,
    ) -> Self {
        let mirror = |c: Coord| Coord::new(rows as i32 - 1 - c.row, cols as i32 - 1 - c.col);

        // Vampires start in the left half so the mirror never lands on them
        let vampire_home = Coord::new(
            rng.gen_range(0..rows as i32),
            rng.gen_range(0..(cols / 2) as i32),
        );
        let werewolf_home = mirror(vampire_home);
        let army = rng.gen_range(3..=8);

        let mut cells = vec![
            CellCensus::new(vampire_home.row, vampire_home.col, 0, army, 0),
            CellCensus::new(werewolf_home.row, werewolf_home.col, 0, 0, army),
        ];
        let mut taken = vec![vampire_home, werewolf_home];

        let mut placed = 0;
        let mut attempts = 0;
        while placed < camp_pairs && attempts < camp_pairs * 20 {
            attempts += 1;
            let spot = Coord::new(
                rng.gen_range(0..rows as i32),
                rng.gen_range(0..cols as i32),
            );
            let twin = mirror(spot);
            if spot == twin || taken.contains(&spot) || taken.contains(&twin) {
                continue;
            }
            let humans = rng.gen_range(1..=5);
            cells.push(CellCensus::new(spot.row, spot.col, humans, 0, 0));
            cells.push(CellCensus::new(twin.row, twin.col, humans, 0, 0));
            taken.push(spot);
            taken.push(twin);
            placed += 1;
        }

        Self {
            name: name.to_string(),
            rows,
            cols,
            vampire_home,
            werewolf_home,
            cells,
        }
    }

    /// Named random map (seed 666), 12x12 with 5 camp pairs
    pub fn moonrise() -> Self {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(666);
        Self::generate(&mut rng, "moonrise", 12, 12, 5)
    }

    /// Look up a built-in map by name
    pub fn named(name: &str) -> Option<Self> {
        match name {
            "default" | "classic" => Some(Self::default()),
            "moonrise" => Some(Self::moonrise()),
            _ => None,
        }
    }
}

impl Default for Scenario {
    /// Classic 10x10 opening: four units each, four human camps
    fn default() -> Self {
        Self {
            name: "classic".to_string(),
            rows: 10,
            cols: 10,
            vampire_home: Coord::new(4, 1),
            werewolf_home: Coord::new(5, 8),
            cells: vec![
                CellCensus::new(4, 1, 0, 4, 0),
                CellCensus::new(5, 8, 0, 0, 4),
                CellCensus::new(0, 0, 2, 0, 0),
                CellCensus::new(9, 9, 2, 0, 0),
                CellCensus::new(2, 4, 3, 0, 0),
                CellCensus::new(7, 5, 3, 0, 0),
            ],
        }
    }
}
