//! Game state: the population grid, faction identity and move types

use crate::board::Coord;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

// ============================================================================
// CORE TYPES
// ============================================================================

/// The three populations a cell can host
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Species {
    Human = 0,
    Vampire = 1,
    Werewolf = 2,
}

/// An armed faction. Humans can never be a side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Faction {
    Vampire,
    Werewolf,
}

impl Faction {
    pub fn opponent(self) -> Self {
        match self {
            Faction::Vampire => Faction::Werewolf,
            Faction::Werewolf => Faction::Vampire,
        }
    }

    pub fn species(self) -> Species {
        match self {
            Faction::Vampire => Species::Vampire,
            Faction::Werewolf => Species::Werewolf,
        }
    }
}

impl std::str::FromStr for Faction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vampire" | "vampires" | "v" => Ok(Faction::Vampire),
            "werewolf" | "werewolves" | "w" => Ok(Faction::Werewolf),
            other => Err(format!("unknown faction: {}", other)),
        }
    }
}

/// Side relative to the state's owner
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Ours,
    Theirs,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Side::Ours => Side::Theirs,
            Side::Theirs => Side::Ours,
        }
    }
}

/// Which faction is ours. Set once, never changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Sides {
    pub ours: Faction,
    pub theirs: Faction,
}

impl Sides {
    pub fn new(ours: Faction) -> Self {
        Self {
            ours,
            theirs: ours.opponent(),
        }
    }

    pub fn faction(&self, side: Side) -> Faction {
        match side {
            Side::Ours => self.ours,
            Side::Theirs => self.theirs,
        }
    }
}

/// Population counts of one grid cell
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub humans: u32,
    pub vampires: u32,
    pub werewolves: u32,
}

impl Cell {
    pub fn count(&self, species: Species) -> u32 {
        match species {
            Species::Human => self.humans,
            Species::Vampire => self.vampires,
            Species::Werewolf => self.werewolves,
        }
    }

    pub fn set_count(&mut self, species: Species, count: u32) {
        match species {
            Species::Human => self.humans = count,
            Species::Vampire => self.vampires = count,
            Species::Werewolf => self.werewolves = count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.humans == 0 && self.vampires == 0 && self.werewolves == 0
    }
}

/// One census entry as delivered by the arbiter: full replacement of a
/// cell's counts
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellCensus {
    pub row: i32,
    pub col: i32,
    #[serde(default)]
    pub humans: u32,
    #[serde(default)]
    pub vampires: u32,
    #[serde(default)]
    pub werewolves: u32,
}

impl CellCensus {
    pub fn new(row: i32, col: i32, humans: u32, vampires: u32, werewolves: u32) -> Self {
        Self {
            row,
            col,
            humans,
            vampires,
            werewolves,
        }
    }

    pub fn coord(&self) -> Coord {
        Coord::new(self.row, self.col)
    }

    fn cell(&self) -> Cell {
        Cell {
            humans: self.humans,
            vampires: self.vampires,
            werewolves: self.werewolves,
        }
    }
}

/// An occupied cell: where, and how many
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Group {
    pub coord: Coord,
    pub count: u32,
}

/// Relocation of `count` units to an adjacent cell
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Coord,
    pub to: Coord,
    pub count: u32,
}

impl Move {
    pub fn new(from: Coord, to: Coord, count: u32) -> Self {
        Self { from, to, count }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}->{}:{}", self.from, self.to, self.count)
    }
}

/// All relocations submitted for one turn, applied atomically
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveSet {
    moves: Vec<Move>,
}

impl MoveSet {
    pub fn new(moves: Vec<Move>) -> Self {
        Self { moves }
    }

    pub fn single(mv: Move) -> Self {
        Self { moves: vec![mv] }
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Move> {
        self.moves.iter()
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// First cell used both as a source and a target, if any
    pub fn overlap(&self) -> Option<Coord> {
        let sources: FxHashSet<Coord> = self.moves.iter().map(|m| m.from).collect();
        self.moves.iter().map(|m| m.to).find(|to| sources.contains(to))
    }

}

impl<'a> IntoIterator for &'a MoveSet {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.moves.iter()
    }
}

impl FromIterator<Move> for MoveSet {
    fn from_iter<I: IntoIterator<Item = Move>>(iter: I) -> Self {
        Self {
            moves: iter.into_iter().collect(),
        }
    }
}

impl std::fmt::Display for MoveSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, mv) in self.moves.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", mv)?;
        }
        write!(f, "]")
    }
}

/// Errors raised while building or updating a [`GameState`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("invalid board dimensions {rows}x{cols}")]
    InvalidDimensions { rows: usize, cols: usize },
    #[error("cell ({row},{col}) is outside the board")]
    OutOfBounds { row: i32, col: i32 },
    #[error("home cell ({row},{col}) holds no vampires or werewolves")]
    UnresolvedIdentity { row: i32, col: i32 },
    #[error("sides are already assigned")]
    SidesAlreadyAssigned,
}

// ============================================================================
// GAME STATE
// ============================================================================

/// Game state (clone to derive lookahead positions)
///
/// Cells are stored row-major in a flat vector so a clone is one value copy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameState {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
    sides: Option<Sides>,
    home: Option<Coord>,
}

impl GameState {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Empty board with unresolved identity
    pub fn new(rows: usize, cols: usize) -> Result<Self, GameError> {
        if rows == 0 || cols == 0 {
            return Err(GameError::InvalidDimensions { rows, cols });
        }
        Ok(Self {
            rows,
            cols,
            cells: vec![Cell::default(); rows * cols],
            sides: None,
            home: None,
        })
    }

    /// Empty board already owned by `ours`
    pub fn with_sides(rows: usize, cols: usize, ours: Faction) -> Result<Self, GameError> {
        let mut state = Self::new(rows, cols)?;
        state.assign_sides(ours)?;
        Ok(state)
    }

    /// Build from the opening census. Our faction is whichever one occupies
    /// `home`.
    pub fn initialize(
        rows: usize,
        cols: usize,
        home: Coord,
        census: &[CellCensus],
    ) -> Result<Self, GameError> {
        let mut state = Self::new(rows, cols)?;
        if !home.in_bounds(rows, cols) {
            return Err(GameError::OutOfBounds {
                row: home.row,
                col: home.col,
            });
        }
        state.apply_update(census)?;
        state.home = Some(home);

        let home_cell = state.cells[state.index(home)];
        let ours = if home_cell.vampires > 0 {
            Faction::Vampire
        } else if home_cell.werewolves > 0 {
            Faction::Werewolf
        } else {
            return Err(GameError::UnresolvedIdentity {
                row: home.row,
                col: home.col,
            });
        };
        state.sides = Some(Sides::new(ours));

        tracing::debug!(
            "Initialized {}x{} board, home {} -> {:?}",
            rows,
            cols,
            home,
            ours
        );
        Ok(state)
    }

    /// Assign our faction on a state built without a home census
    pub fn assign_sides(&mut self, ours: Faction) -> Result<(), GameError> {
        if self.sides.is_some() {
            return Err(GameError::SidesAlreadyAssigned);
        }
        self.sides = Some(Sides::new(ours));
        Ok(())
    }

    /// Replace the counts of every listed cell. Validated before anything is
    /// written, so a bad entry leaves the state untouched.
    pub fn apply_update(&mut self, census: &[CellCensus]) -> Result<(), GameError> {
        if let Some(bad) = census
            .iter()
            .find(|c| !c.coord().in_bounds(self.rows, self.cols))
        {
            return Err(GameError::OutOfBounds {
                row: bad.row,
                col: bad.col,
            });
        }
        for entry in census {
            let idx = self.index(entry.coord());
            self.cells[idx] = entry.cell();
        }
        Ok(())
    }

    /// Same board seen by `ours`. Used to hand one snapshot to both players.
    pub fn from_perspective(&self, ours: Faction) -> Self {
        let mut view = self.clone();
        view.sides = Some(Sides::new(ours));
        view
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn home(&self) -> Option<Coord> {
        self.home
    }

    pub fn sides(&self) -> Option<Sides> {
        self.sides
    }

    /// Faction playing `side`, if identity is resolved
    pub fn faction(&self, side: Side) -> Option<Faction> {
        self.sides.map(|s| s.faction(side))
    }

    pub fn in_bounds(&self, coord: Coord) -> bool {
        coord.in_bounds(self.rows, self.cols)
    }

    fn index(&self, coord: Coord) -> usize {
        coord.row as usize * self.cols + coord.col as usize
    }

    /// Get cell at coordinate, `None` off the board
    pub fn cell(&self, coord: Coord) -> Option<&Cell> {
        if self.in_bounds(coord) {
            Some(&self.cells[self.index(coord)])
        } else {
            None
        }
    }

    pub(crate) fn cell_mut(&mut self, coord: Coord) -> Option<&mut Cell> {
        if self.in_bounds(coord) {
            let idx = self.index(coord);
            Some(&mut self.cells[idx])
        } else {
            None
        }
    }

    pub fn count(&self, coord: Coord, species: Species) -> Result<u32, GameError> {
        self.cell(coord)
            .map(|c| c.count(species))
            .ok_or(GameError::OutOfBounds {
                row: coord.row,
                col: coord.col,
            })
    }

    pub fn set_count(&mut self, coord: Coord, species: Species, count: u32) -> Result<(), GameError> {
        let cell = self.cell_mut(coord).ok_or(GameError::OutOfBounds {
            row: coord.row,
            col: coord.col,
        })?;
        cell.set_count(species, count);
        Ok(())
    }

    /// Iterate every cell with its coordinate, row-major
    pub fn cells(&self) -> impl Iterator<Item = (Coord, &Cell)> + '_ {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (Coord::new((i / cols) as i32, (i % cols) as i32), cell))
    }

    /// Every cell holding `species`, row-major
    pub fn groups_of(&self, species: Species) -> Vec<Group> {
        self.cells()
            .filter_map(|(coord, cell)| {
                let count = cell.count(species);
                (count > 0).then_some(Group { coord, count })
            })
            .collect()
    }

    /// Groups of `side`; empty while identity is unresolved
    pub fn groups(&self, side: Side) -> Vec<Group> {
        match self.faction(side) {
            Some(faction) => self.groups_of(faction.species()),
            None => Vec::new(),
        }
    }

    /// Board-wide population. Summed in `u64`: single cells may hold up to
    /// `u32::MAX`.
    pub fn total(&self, species: Species) -> u64 {
        self.cells.iter().map(|c| u64::from(c.count(species))).sum()
    }

    /// Population of `side`; zero while identity is unresolved
    pub fn side_total(&self, side: Side) -> u64 {
        self.faction(side)
            .map(|f| self.total(f.species()))
            .unwrap_or(0)
    }

    /// One armed faction has been wiped out. Humans don't count.
    pub fn is_terminal(&self) -> bool {
        if self.sides.is_none() {
            return false;
        }
        self.side_total(Side::Ours) == 0 || self.side_total(Side::Theirs) == 0
    }

    pub fn center(&self) -> Coord {
        Coord::new((self.rows / 2) as i32, (self.cols / 2) as i32)
    }

    /// Non-empty cells as census entries
    pub fn census(&self) -> Vec<CellCensus> {
        self.cells()
            .filter(|(_, cell)| !cell.is_empty())
            .map(|(coord, cell)| {
                CellCensus::new(coord.row, coord.col, cell.humans, cell.vampires, cell.werewolves)
            })
            .collect()
    }
}

impl std::fmt::Display for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "GameState({}x{}, ours={:?}, total_ours={}, total_theirs={}, humans={})",
            self.rows,
            self.cols,
            self.sides.map(|s| s.ours),
            self.side_total(Side::Ours),
            self.side_total(Side::Theirs),
            self.total(Species::Human)
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================
