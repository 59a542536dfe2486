//! Grid addressing and flat row-major storage.

use serde::{Deserialize, Serialize};

/// Cell coordinate. Signed so out-of-range queries can be expressed and rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Orthogonal neighbours in W, E, S, N order
    pub fn neighbors(self) -> [Cell; 4] {
        [
            Cell::new(self.x - 1, self.y),
            Cell::new(self.x + 1, self.y),
            Cell::new(self.x, self.y - 1),
            Cell::new(self.x, self.y + 1),
        ]
    }

    pub fn manhattan(self, other: Cell) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn chebyshev(self, other: Cell) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

/// Immutable grid dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub width: usize,
    pub height: usize,
}

impl GridSize {
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn center(&self) -> Cell {
        Cell::new((self.width / 2) as i32, (self.height / 2) as i32)
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && (cell.x as usize) < self.width && (cell.y as usize) < self.height
    }

    pub fn is_boundary(&self, cell: Cell) -> bool {
        self.contains(cell)
            && (cell.x == 0
                || cell.y == 0
                || cell.x as usize == self.width - 1
                || cell.y as usize == self.height - 1)
    }

    /// Row-major index, `None` outside the grid
    pub fn index(&self, cell: Cell) -> Option<usize> {
        if self.contains(cell) {
            Some(cell.y as usize * self.width + cell.x as usize)
        } else {
            None
        }
    }

    pub fn cell_at(&self, index: usize) -> Cell {
        Cell::new((index % self.width) as i32, (index / self.width) as i32)
    }

    /// All cells in row-major scan order (x fastest)
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.len()).map(move |i| self.cell_at(i))
    }

    /// In-grid orthogonal neighbours of `cell`
    pub fn neighbors(&self, cell: Cell) -> impl Iterator<Item = Cell> + '_ {
        cell.neighbors().into_iter().filter(move |n| self.contains(*n))
    }
}

/// Dense per-cell storage, row-major
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid<T> {
    size: GridSize,
    data: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn filled(size: GridSize, value: T) -> Self {
        Self {
            size,
            data: vec![value; size.len()],
        }
    }
}

impl<T> Grid<T> {
    pub fn from_fn(size: GridSize, mut f: impl FnMut(Cell) -> T) -> Self {
        let data = size.cells().map(&mut f).collect();
        Self { size, data }
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn get(&self, cell: Cell) -> Option<&T> {
        self.size.index(cell).map(|i| &self.data[i])
    }

    pub fn get_mut(&mut self, cell: Cell) -> Option<&mut T> {
        self.size.index(cell).map(move |i| &mut self.data[i])
    }

    /// Writes `value` at `cell`; out-of-range writes are ignored
    pub fn set(&mut self, cell: Cell, value: T) {
        if let Some(slot) = self.get_mut(cell) {
            *slot = value;
        }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn iter(&self) -> impl Iterator<Item = (Cell, &T)> + '_ {
        self.data
            .iter()
            .enumerate()
            .map(move |(i, v)| (self.size.cell_at(i), v))
    }

    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> Grid<U> {
        Grid {
            size: self.size,
            data: self.data.iter().map(&mut f).collect(),
        }
    }

    /// Rows as nested vectors, `[y][x]`
    pub fn to_rows(&self) -> Vec<Vec<T>>
    where
        T: Clone,
    {
        self.data
            .chunks(self.size.width.max(1))
            .map(|row| row.to_vec())
            .collect()
    }
}
