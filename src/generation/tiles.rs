//! Tile types, bitmask domains and adjacency rules.
//!
//! Rules are authored as "tiles allowed next to me" per tile. The solver
//! uses the inverse of that table: `compatible[t]` is the set of tiles that
//! list `t` among their allowed neighbours. The inversion is always
//! computed, never assumed, because the authored table need not be
//! symmetric.

use serde::{Deserialize, Serialize};

/// Terrain categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileType {
    Grass,
    Dirt,
    Rock,
    Path,
}

impl TileType {
    pub const COUNT: usize = 4;

    pub const ALL: [TileType; Self::COUNT] =
        [TileType::Grass, TileType::Dirt, TileType::Rock, TileType::Path];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn bit(self) -> u8 {
        1 << self.index()
    }

    /// Numeric ID for FFI serialization
    pub fn to_id(self) -> u8 {
        self.index() as u8
    }

    pub fn is_path(self) -> bool {
        self == TileType::Path
    }
}

/// Set of tile types as a bitmask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TileSet(u8);

impl TileSet {
    pub const EMPTY: TileSet = TileSet(0);

    /// Every tile a free (non-path) cell may take
    pub const GROUND: TileSet = TileSet(0b0111);

    pub const PATH: TileSet = TileSet(0b1000);

    pub fn of(tiles: &[TileType]) -> Self {
        tiles.iter().fold(Self::EMPTY, |set, t| set.with(*t))
    }

    pub fn single(tile: TileType) -> Self {
        TileSet(tile.bit())
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn with(self, tile: TileType) -> Self {
        TileSet(self.0 | tile.bit())
    }

    pub fn contains(self, tile: TileType) -> bool {
        self.0 & tile.bit() != 0
    }

    pub fn union(self, other: TileSet) -> Self {
        TileSet(self.0 | other.0)
    }

    pub fn intersection(self, other: TileSet) -> Self {
        TileSet(self.0 & other.0)
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The only member when the set is a singleton
    pub fn resolved(self) -> Option<TileType> {
        if self.len() == 1 {
            TileType::from_index(self.0.trailing_zeros() as usize)
        } else {
            None
        }
    }

    pub fn iter(self) -> impl Iterator<Item = TileType> {
        TileType::ALL.into_iter().filter(move |t| self.contains(*t))
    }

    /// `n`-th member in tile index order
    pub fn nth(self, n: usize) -> Option<TileType> {
        self.iter().nth(n)
    }
}

/// Authored adjacency table plus its derived inverse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRules {
    allowed: [TileSet; TileType::COUNT],
    compatible: [TileSet; TileType::COUNT],
}

impl TileRules {
    /// Builds rules from the authored allowed-neighbour sets, indexed by tile
    pub fn from_allowed(allowed: [TileSet; TileType::COUNT]) -> Self {
        let mut compatible = [TileSet::EMPTY; TileType::COUNT];
        for tile in TileType::ALL {
            compatible[tile.index()] = TileType::ALL
                .into_iter()
                .filter(|n| allowed[n.index()].contains(tile))
                .fold(TileSet::EMPTY, TileSet::with);
        }
        Self {
            allowed,
            compatible,
        }
    }

    /// Grass and dirt sit next to anything, rock never touches a path,
    /// and paths accept grass, dirt and other paths.
    pub fn standard() -> Self {
        use TileType::*;
        Self::from_allowed([
            TileSet::of(&[Grass, Dirt, Rock, Path]),
            TileSet::of(&[Grass, Dirt, Rock, Path]),
            TileSet::of(&[Grass, Dirt, Rock]),
            TileSet::of(&[Grass, Dirt, Path]),
        ])
    }

    pub fn allowed(&self, tile: TileType) -> TileSet {
        self.allowed[tile.index()]
    }

    /// Tiles that permit `tile` as their neighbour
    pub fn compatible(&self, tile: TileType) -> TileSet {
        self.compatible[tile.index()]
    }

    /// Union of compatible sets over every member of `domain`
    pub fn neighbor_mask(&self, domain: TileSet) -> TileSet {
        domain
            .iter()
            .fold(TileSet::EMPTY, |acc, t| acc.union(self.compatible(t)))
    }

    /// Whether `a` and `b` may sit side by side under the solver's relation
    pub fn permits(&self, a: TileType, b: TileType) -> bool {
        self.compatible(a).contains(b) && self.compatible(b).contains(a)
    }

    /// True when every authored pair is mutual
    pub fn is_symmetric(&self) -> bool {
        self.asymmetric_pairs().is_empty()
    }

    /// Authored pairs `(a, b)` where `a` allows `b` but `b` does not allow `a`
    pub fn asymmetric_pairs(&self) -> Vec<(TileType, TileType)> {
        let mut pairs = Vec::new();
        for a in TileType::ALL {
            for b in self.allowed(a).iter() {
                if !self.allowed(b).contains(a) {
                    pairs.push((a, b));
                }
            }
        }
        pairs
    }
}

impl Default for TileRules {
    fn default() -> Self {
        Self::standard()
    }
}
