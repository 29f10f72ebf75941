//! Board state: tiles, pieces, top markers and occupancy.

use std::ops::Range;

use crate::board::{GridSize, Piece, PieceId, PieceType, Side, Tile, TileType, TopKind, TopSlot};
use crate::config::{Config, Options};
use crate::replay::LogEntry;
use crate::rng::{RandomSource, shuffle};

/// Complete board state of a match.
///
/// Tiles are stored row-major over the full board: rows `0..home_height` are the own home,
/// row `home_height` is the middle strip and the remaining rows are the enemy home. Pieces are
/// kept in one collection per side; a [`PieceId`] addresses own pieces as `0..n` and enemy
/// pieces as `n..2n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: GridSize,
    home_height: usize,
    tiles: Vec<Tile>,
    own: Vec<Piece>,
    enemy: Vec<Piece>,
    tops: Vec<TopSlot>,
    occupancy: Vec<Option<PieceId>>,
}

impl Board {
    /// Lay out a fresh board from a balanced configuration.
    ///
    /// The own home receives a shuffled multiset of the tile amounts and the enemy home is its
    /// mirror. The middle strip is filled from the middle amounts, mirrored around the center
    /// column. Pieces are dropped on shuffled standable home tiles (thrones prefer fortresses);
    /// a piece that finds no room stays in reserve.
    #[must_use]
    pub fn setup<R: RandomSource + ?Sized>(config: &Config, rng: &mut R) -> Self {
        let size = config.board_size();
        let home_height = config.home_height();
        let home_len = size.width * home_height;
        let mut types = vec![TileType::Empty; size.len()];

        let mut home: Vec<TileType> = TileType::PLACEABLE
            .iter()
            .flat_map(|&t| std::iter::repeat_n(t, usize::from(config.tile_amount(t))))
            .collect();
        home.resize(home_len, TileType::Empty);
        shuffle(&mut home, rng);
        for (index, &tile_type) in home.iter().enumerate() {
            types[index] = tile_type;
            types[mirror(size, home_height, index)] = tile_type;
        }

        let half = size.width / 2;
        let middle: Vec<TileType> = TileType::MIDDLE
            .iter()
            .flat_map(|&t| std::iter::repeat_n(t, usize::from(config.middle_amount(t))))
            .take(half)
            .collect();
        let offset = if config.has(Options::VP_EQUIDISTANT) {
            (half - middle.len()) / 2
        } else {
            0
        };
        for (slot, &tile_type) in middle.iter().enumerate() {
            // Innermost slot first, mirrored onto the enemy half
            let column = half - 1 - (slot + offset);
            types[size.index(column, home_height)] = tile_type;
            types[size.index(size.width - 1 - column, home_height)] = tile_type;
        }

        let terrain = config.has(Options::TERRAIN);
        let mut candidates: Vec<usize> = (0..home_len).collect();
        shuffle(&mut candidates, rng);
        let mut taken = vec![false; size.len()];
        let mut own_positions = Vec::new();
        for piece_type in config.piece_list() {
            let standable = |t: &usize| !taken[*t] && piece_type.can_stand(types[*t], terrain);
            let pick = if piece_type == PieceType::Throne {
                candidates
                    .iter()
                    .copied()
                    .find(|t| standable(t) && types[*t] == TileType::Fortress)
                    .or_else(|| candidates.iter().copied().find(standable))
            } else {
                candidates.iter().copied().find(standable)
            };
            if let Some(tile) = pick {
                taken[tile] = true;
            }
            own_positions.push(pick);
        }
        let enemy_positions: Vec<Option<usize>> = own_positions
            .iter()
            .map(|p| p.map(|t| mirror(size, home_height, t)))
            .collect();

        Self::assemble(config, types, &own_positions, &enemy_positions)
    }

    /// Rebuild a board from a replay log preamble.
    ///
    /// Arrays shorter than the configuration implies are padded (empty tiles, pieces in
    /// reserve); longer arrays are cut. Positions outside the board become reserve.
    #[must_use]
    pub fn from_preamble(
        config: &Config,
        tiles: &[TileType],
        own_positions: &[Option<usize>],
        enemy_positions: &[Option<usize>],
    ) -> Self {
        let size = config.board_size();
        let pieces = config.piece_total();
        let mut types = tiles.to_vec();
        types.resize(size.len(), TileType::Empty);

        let fit = |positions: &[Option<usize>]| {
            let mut fitted: Vec<Option<usize>> = positions
                .iter()
                .map(|p| p.filter(|&t| t < size.len()))
                .collect();
            fitted.resize(pieces, None);
            fitted
        };

        Self::assemble(config, types, &fit(own_positions), &fit(enemy_positions))
    }

    fn assemble(
        config: &Config,
        types: Vec<TileType>,
        own_positions: &[Option<usize>],
        enemy_positions: &[Option<usize>],
    ) -> Self {
        let size = config.board_size();
        let mut board = Self {
            size,
            home_height: config.home_height(),
            tiles: types.into_iter().map(Tile::new).collect(),
            own: Vec::new(),
            enemy: Vec::new(),
            tops: Vec::new(),
            occupancy: vec![None; size.len()],
        };

        let list = config.piece_list();
        for (side, positions) in [(Side::Own, own_positions), (Side::Enemy, enemy_positions)] {
            let pieces: Vec<Piece> = list.iter().map(|&t| Piece::new(t)).collect();
            match side {
                Side::Own => board.own = pieces,
                Side::Enemy => board.enemy = pieces,
            }
            for (local, position) in positions.iter().enumerate().take(list.len()) {
                let id = board.global(side, local);
                board.move_piece(id, *position);
                board.note_fortress_visit(id);
            }
        }

        for side in [Side::Own, Side::Enemy] {
            for index in 0..size.len() {
                if board.alignment(index) == Some(side)
                    && board.tiles[index].tile_type == TileType::Plains
                {
                    let slot = board.tops.len();
                    board.tops.push(TopSlot {
                        kind: TopKind::Farm,
                        side,
                        position: Some(index),
                    });
                    board.tiles[index].top = Some(slot);
                }
            }
        }
        for side in [Side::Own, Side::Enemy] {
            let capturable = (0..size.len())
                .filter(|&i| board.alignment(i) != Some(side))
                .filter(|&i| board.tiles[i].tile_type == TileType::Fortress)
                .count();
            for _ in 0..capturable {
                board.tops.push(TopSlot {
                    kind: TopKind::City,
                    side,
                    position: None,
                });
            }
        }

        board
    }

    /// Full board dimensions.
    #[must_use]
    pub const fn size(&self) -> GridSize {
        self.size
    }

    /// Rows in one home region.
    #[must_use]
    pub const fn home_height(&self) -> usize {
        self.home_height
    }

    /// Region a tile lies in: a side's home, or `None` for the middle strip.
    #[must_use]
    pub const fn alignment(&self, index: usize) -> Option<Side> {
        let (_, row) = self.size.coords(index);
        if row < self.home_height {
            Some(Side::Own)
        } else if row == self.home_height {
            None
        } else {
            Some(Side::Enemy)
        }
    }

    /// All tiles in row-major order.
    #[must_use]
    #[inline]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Tile at `index`.
    #[must_use]
    #[inline]
    pub fn tile(&self, index: usize) -> &Tile {
        &self.tiles[index]
    }

    /// Terrain of every tile, as written into a log preamble.
    #[must_use]
    pub fn tile_types(&self) -> Vec<TileType> {
        self.tiles.iter().map(|t| t.tile_type).collect()
    }

    /// Ids of one side's pieces.
    #[must_use]
    pub fn piece_ids(&self, side: Side) -> Range<PieceId> {
        match side {
            Side::Own => 0..self.own.len(),
            Side::Enemy => self.own.len()..self.own.len() + self.enemy.len(),
        }
    }

    /// Total number of pieces on both sides.
    #[must_use]
    pub fn piece_count(&self) -> usize {
        self.own.len() + self.enemy.len()
    }

    /// One side's pieces.
    #[must_use]
    pub fn pieces(&self, side: Side) -> &[Piece] {
        match side {
            Side::Own => &self.own,
            Side::Enemy => &self.enemy,
        }
    }

    /// Split a global id into side and local index.
    #[must_use]
    pub fn local(&self, id: PieceId) -> (Side, usize) {
        if id < self.own.len() {
            (Side::Own, id)
        } else {
            (Side::Enemy, id - self.own.len())
        }
    }

    /// Global id of a side's local index.
    #[must_use]
    pub fn global(&self, side: Side, local: usize) -> PieceId {
        match side {
            Side::Own => local,
            Side::Enemy => self.own.len() + local,
        }
    }

    /// Side a piece belongs to.
    #[must_use]
    pub fn side_of(&self, id: PieceId) -> Side {
        self.local(id).0
    }

    /// Piece by global id.
    #[must_use]
    pub fn piece(&self, id: PieceId) -> &Piece {
        match self.local(id) {
            (Side::Own, local) => &self.own[local],
            (Side::Enemy, local) => &self.enemy[local],
        }
    }

    fn piece_mut(&mut self, id: PieceId) -> &mut Piece {
        match self.local(id) {
            (Side::Own, local) => &mut self.own[local],
            (Side::Enemy, local) => &mut self.enemy[local],
        }
    }

    /// Piece standing on `index`.
    #[must_use]
    #[inline]
    pub fn occupant(&self, index: usize) -> Option<PieceId> {
        self.occupancy[index]
    }

    /// Board positions of one side's pieces, in local order.
    #[must_use]
    pub fn positions(&self, side: Side) -> Vec<Option<usize>> {
        self.pieces(side).iter().map(|p| p.position).collect()
    }

    /// All top marker slots.
    #[must_use]
    pub fn tops(&self) -> &[TopSlot] {
        &self.tops
    }

    /// Top marker standing on `index`.
    #[must_use]
    pub fn top_at(&self, index: usize) -> Option<(usize, &TopSlot)> {
        self.tiles[index].top.map(|slot| (slot, &self.tops[slot]))
    }

    /// First unplaced city slot of `side`.
    #[must_use]
    pub fn free_city_slot(&self, side: Side) -> Option<usize> {
        self.tops
            .iter()
            .position(|t| t.kind == TopKind::City && t.side == side && t.position.is_none())
    }

    /// Move a piece to a tile, or off the board with `None`.
    ///
    /// The vacated tile is only cleared if this piece still holds it, so the two halves of a
    /// swap can be applied (or undone) one after the other.
    pub fn move_piece(&mut self, id: PieceId, to: Option<usize>) {
        let from = self.piece(id).position;
        if let Some(from) = from {
            if self.occupancy[from] == Some(id) {
                self.occupancy[from] = None;
            }
        }
        if let Some(to) = to {
            self.occupancy[to] = Some(id);
        }
        self.piece_mut(id).position = to;
    }

    /// Record the fortress a throne stands on as its spawn point.
    pub fn note_fortress_visit(&mut self, id: PieceId) {
        let side = self.side_of(id);
        let piece = *self.piece(id);
        if piece.piece_type != PieceType::Throne {
            return;
        }
        if let Some(at) = piece.position {
            if self.tiles[at].tile_type == TileType::Fortress && self.alignment(at) == Some(side) {
                self.piece_mut(id).last_fortress = Some(at);
            }
        }
    }

    /// Change a tile's terrain. A tile that stops being a fortress loses its breach.
    pub fn set_tile_type(&mut self, index: usize, tile_type: TileType) {
        let tile = &mut self.tiles[index];
        tile.tile_type = tile_type;
        if tile_type != TileType::Fortress {
            tile.breached = false;
        }
    }

    /// Set the breach flag. Ignored on anything but a fortress.
    pub fn set_breached(&mut self, index: usize, breached: bool) {
        let tile = &mut self.tiles[index];
        if tile.tile_type == TileType::Fortress {
            tile.breached = breached;
        }
    }

    /// Move a top marker to a tile, or remove it with `None`.
    pub fn place_top(&mut self, slot: usize, to: Option<usize>) {
        if let Some(from) = self.tops[slot].position {
            if self.tiles[from].top == Some(slot) {
                self.tiles[from].top = None;
            }
        }
        if let Some(to) = to {
            self.tiles[to].top = Some(slot);
        }
        self.tops[slot].position = to;
    }

    /// Whether every index an entry names exists on this board.
    #[must_use]
    pub fn fits(&self, entry: &LogEntry) -> bool {
        let on_board = |position: Option<usize>| position.is_none_or(|p| p < self.tiles.len());
        match *entry {
            LogEntry::Piece { id, from, to } => {
                id < self.piece_count() && on_board(from) && on_board(to)
            }
            LogEntry::Tile { id, .. } | LogEntry::Breach { id, .. } => id < self.tiles.len(),
            LogEntry::Top { slot, from, to } => {
                slot < self.tops.len() && on_board(from) && on_board(to)
            }
            LogEntry::Finish(_) => true,
        }
    }

    /// Apply a log entry forward (its "to" state) or backward (its "from" state).
    ///
    /// Entries that do not [`fit`](Board::fits) the board are ignored.
    pub fn apply_entry(&mut self, entry: &LogEntry, forward: bool) {
        if !self.fits(entry) {
            return;
        }
        match *entry {
            LogEntry::Piece { id, from, to } => {
                self.move_piece(id, if forward { to } else { from });
            }
            LogEntry::Tile { id, old, new } => {
                self.set_tile_type(id, if forward { new } else { old });
            }
            LogEntry::Breach { id, old, new } => {
                self.set_breached(id, if forward { new } else { old });
            }
            LogEntry::Top { slot, from, to } => {
                self.place_top(slot, if forward { to } else { from });
            }
            LogEntry::Finish(_) => {}
        }
    }
}

/// Reflect a tile across the middle row.
fn mirror(size: GridSize, home_height: usize, index: usize) -> usize {
    let (column, row) = size.coords(index);
    size.index(column, 2 * home_height - row)
}
