//! Grid geometry over a linear tile index.

/// One of the eight compass directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Row - 1.
    N,
    /// Row - 1, column + 1.
    NE,
    /// Column + 1.
    E,
    /// Row + 1, column + 1.
    SE,
    /// Row + 1.
    S,
    /// Row + 1, column - 1.
    SW,
    /// Column - 1.
    W,
    /// Row - 1, column - 1.
    NW,
}

impl Direction {
    /// All directions in compass order.
    pub const ALL: [Direction; 8] = [
        Direction::N,
        Direction::NE,
        Direction::E,
        Direction::SE,
        Direction::S,
        Direction::SW,
        Direction::W,
        Direction::NW,
    ];

    /// Column and row offsets.
    #[must_use]
    pub const fn delta(self) -> (isize, isize) {
        match self {
            Direction::N => (0, -1),
            Direction::NE => (1, -1),
            Direction::E => (1, 0),
            Direction::SE => (1, 1),
            Direction::S => (0, 1),
            Direction::SW => (-1, 1),
            Direction::W => (-1, 0),
            Direction::NW => (-1, -1),
        }
    }
}

/// Dimensions of a rectangular grid addressed by a row-major linear index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridSize {
    /// Columns.
    pub width: usize,
    /// Rows.
    pub height: usize,
}

impl GridSize {
    /// Create a new grid size.
    #[must_use]
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Number of tiles.
    #[must_use]
    pub const fn len(self) -> usize {
        self.width * self.height
    }

    /// True for a degenerate grid.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Column and row of `index`.
    #[must_use]
    #[inline]
    pub const fn coords(self, index: usize) -> (usize, usize) {
        (index % self.width, index / self.width)
    }

    /// Linear index of a column and row.
    #[must_use]
    #[inline]
    pub const fn index(self, column: usize, row: usize) -> usize {
        row * self.width + column
    }

    /// One step from `index` in `direction`, or `None` off the edge.
    #[must_use]
    #[inline]
    pub fn step(self, index: usize, direction: Direction) -> Option<usize> {
        let (column, row) = self.coords(index);
        let (dx, dy) = direction.delta();
        let column = column.checked_add_signed(dx)?;
        let row = row.checked_add_signed(dy)?;
        (column < self.width && row < self.height).then(|| self.index(column, row))
    }

    /// The eight neighbors of `index` in compass order.
    ///
    /// Returns a fixed-size array to avoid heap allocation; edge and corner tiles
    /// get `None` in the directions that leave the grid.
    #[must_use]
    #[inline]
    pub fn neighbors(self, index: usize) -> [Option<usize>; 8] {
        Direction::ALL.map(|direction| self.step(index, direction))
    }

    /// King-move distance between two tiles.
    #[must_use]
    pub const fn chebyshev(self, a: usize, b: usize) -> usize {
        let (ax, ay) = self.coords(a);
        let (bx, by) = self.coords(b);
        let dx = ax.abs_diff(bx);
        let dy = ay.abs_diff(by);
        if dx > dy { dx } else { dy }
    }
}
