//! Per-piece-type move sets.
//!
//! Each piece type maps to one movement shape:
//! - single step and area moves run the distance search with a small cutoff
//! - straight lines run the search over the eight rays only and drop zig-zag paths
//! - dragons fly to any tile inside a fixed Chebyshev envelope
//! - ships flood-fill connected water
//!
//! Ports, swaps and ranged fire are layered on top.

use std::collections::BTreeSet;

use rayon::prelude::*;

use crate::board::{Board, Direction, GridSize, PieceId, PieceType, Side, TileType};
use crate::config::{Config, Options};
use crate::moves::search::{Passability, UNREACHABLE, distances};
use crate::turn::{Protection, TurnRecord};

/// Flight envelope of a dragon.
pub const DRAGON_DIST: usize = 4;
/// Charge length of a lancer.
pub const LANCER_REACH: u32 = 3;
/// Move radius of a warhorse.
pub const WARHORSE_REACH: u32 = 2;
/// Fire radius of an archer.
pub const ARCHER_RANGE: u32 = 2;
/// Fire length of a catapult.
pub const CATAPULT_RANGE: u32 = 3;

/// Legal targets of one piece, split by what the piece would do there.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveSet {
    /// Empty tiles the piece can move to.
    pub moves: BTreeSet<usize>,
    /// Enemy-held tiles the piece can capture by moving in.
    pub attacks: BTreeSet<usize>,
    /// Tiles the piece can fire at without moving.
    pub fires: BTreeSet<usize>,
    /// Tiles of own pieces the piece can trade places with.
    pub swaps: BTreeSet<usize>,
}

impl MoveSet {
    /// True if the piece can do nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
            && self.attacks.is_empty()
            && self.fires.is_empty()
            && self.swaps.is_empty()
    }

    /// Every tile the piece can act upon.
    #[must_use]
    pub fn destinations(&self) -> BTreeSet<usize> {
        self.moves
            .iter()
            .chain(&self.attacks)
            .chain(&self.fires)
            .chain(&self.swaps)
            .copied()
            .collect()
    }
}

/// Read-only view used to compute legal moves.
#[derive(Debug, Clone, Copy)]
pub struct MoveContext<'a> {
    board: &'a Board,
    config: &'a Config,
    record: &'a TurnRecord,
}

/// Passability of empty, standable tiles for one piece.
struct Enterable<'c, 'a> {
    context: &'c MoveContext<'a>,
    piece: PieceId,
}

impl Passability for Enterable<'_, '_> {
    fn is_stepable(&self, index: usize) -> bool {
        self.context.can_enter(self.piece, index)
    }
}

impl<'a> MoveContext<'a> {
    /// Create a context over the current board and turn.
    #[must_use]
    pub const fn new(board: &'a Board, config: &'a Config, record: &'a TurnRecord) -> Self {
        Self {
            board,
            config,
            record,
        }
    }

    /// Legal targets of a piece. Pieces in reserve get an empty set.
    #[must_use]
    pub fn legal_destinations(&self, id: PieceId) -> MoveSet {
        let piece = self.board.piece(id);
        let mut set = MoveSet::default();
        let Some(source) = piece.position else {
            return set;
        };

        match piece.piece_type {
            PieceType::Throne | PieceType::Soldier | PieceType::Archer | PieceType::Catapult => {
                self.area(id, source, 1, &mut set);
            }
            PieceType::Warhorse => self.area(id, source, WARHORSE_REACH, &mut set),
            PieceType::Lancer => self.straight(id, source, LANCER_REACH, &mut set),
            PieceType::Dragon => self.flight(id, source, &mut set),
            PieceType::Ship => self.chain(id, source, &mut set),
        }
        match piece.piece_type {
            PieceType::Archer => self.area_fire(id, source, &mut set),
            PieceType::Catapult => self.ray_fire(id, source, &mut set),
            _ => {}
        }
        if piece.piece_type.is_ranged() {
            set.attacks.clear();
        }
        self.ports(id, source, &mut set);
        self.swaps(id, source, &mut set);
        set
    }

    /// Legal move sets of every on-board piece of a side, skipping pieces with nothing to do.
    ///
    /// Pieces are independent queries over shared read-only state, so they run in parallel.
    #[must_use]
    pub fn all_moves(&self, side: Side) -> Vec<(PieceId, MoveSet)> {
        self.board
            .piece_ids(side)
            .into_par_iter()
            .filter(|&id| self.board.piece(id).position.is_some())
            .map(|id| (id, self.legal_destinations(id)))
            .filter(|(_, set)| !set.is_empty())
            .collect()
    }

    /// Tiles a reserve piece may spawn on.
    ///
    /// The side needs a throne whose last visited fortress is still its own and unbreached;
    /// spawning happens on the empty tiles around that fortress.
    #[must_use]
    pub fn spawn_destinations(&self, id: PieceId) -> BTreeSet<usize> {
        let side = self.board.side_of(id);
        let size = self.board.size();
        let mut tiles = BTreeSet::new();
        if self.board.piece(id).piece_type == PieceType::Throne {
            return tiles;
        }
        for throne in self.board.pieces(side) {
            if throne.piece_type != PieceType::Throne || throne.position.is_none() {
                continue;
            }
            let Some(fortress) = throne.last_fortress else {
                continue;
            };
            let tile = self.board.tile(fortress);
            if !tile.is_intact_fortress() || self.board.alignment(fortress) != Some(side) {
                continue;
            }
            tiles.extend(
                size.neighbors(fortress)
                    .into_iter()
                    .flatten()
                    .filter(|&n| self.can_enter(id, n)),
            );
        }
        tiles
    }

    /// Empty tile the piece may stand on.
    #[must_use]
    pub fn can_enter(&self, id: PieceId, tile: usize) -> bool {
        self.board.occupant(tile).is_none() && self.can_land(id, tile)
    }

    /// Enemy-held tile the piece may capture by moving in.
    #[must_use]
    pub fn can_attack(&self, id: PieceId, tile: usize) -> bool {
        let Some(occupant) = self.board.occupant(tile) else {
            return false;
        };
        self.is_enemy(id, occupant)
            && self.record.protection(occupant) != Some(Protection::Strong)
            && self.can_land(id, tile)
    }

    /// Enemy-held tile the piece may shoot at. Any protection blocks fire.
    #[must_use]
    pub fn can_fire_at(&self, id: PieceId, tile: usize) -> bool {
        self.board
            .occupant(tile)
            .is_some_and(|occupant| {
                self.is_enemy(id, occupant) && self.record.protection(occupant).is_none()
            })
    }

    /// Unbreached fortress not aligned to `side`.
    #[must_use]
    pub fn can_breach(&self, side: Side, tile: usize) -> bool {
        self.board.tile(tile).is_intact_fortress() && self.board.alignment(tile) != Some(side)
    }

    fn is_enemy(&self, id: PieceId, other: PieceId) -> bool {
        self.board.side_of(id) != self.board.side_of(other)
    }

    fn can_land(&self, id: PieceId, tile: usize) -> bool {
        let piece_type = self.board.piece(id).piece_type;
        let tile_type = self.board.tile(tile).tile_type;
        if !piece_type.can_stand(tile_type, self.config.has(Options::TERRAIN)) {
            return false;
        }
        let foreign = self.board.alignment(tile) != Some(self.board.side_of(id));
        if tile_type == TileType::Fortress && foreign {
            return self.config.can_capture_fortress(piece_type);
        }
        true
    }

    fn area(&self, id: PieceId, source: usize, reach: u32, set: &mut MoveSet) {
        let size = self.board.size();
        let dist = distances(source, reach, size, &Enterable { context: self, piece: id });
        for (tile, &d) in dist.iter().enumerate() {
            if d == UNREACHABLE {
                continue;
            }
            if tile != source {
                set.moves.insert(tile);
            }
            if d < reach {
                set.attacks.extend(
                    size.neighbors(tile)
                        .into_iter()
                        .flatten()
                        .filter(|&n| self.can_attack(id, n)),
                );
            }
        }
    }

    fn straight(&self, id: PieceId, source: usize, reach: u32, set: &mut MoveSet) {
        let mut reached = Vec::new();
        let mut blocked = Vec::new();
        let pass = |t: usize| self.can_enter(id, t);
        self.walk_rays(source, reach, &pass, &mut reached, &mut blocked);
        set.moves.extend(reached);
        set.attacks.extend(blocked.into_iter().filter(|&t| self.can_attack(id, t)));
    }

    fn flight(&self, id: PieceId, source: usize, set: &mut MoveSet) {
        let size = self.board.size();
        for tile in 0..size.len() {
            if tile == source || size.chebyshev(source, tile) > DRAGON_DIST {
                continue;
            }
            if self.can_enter(id, tile) {
                set.moves.insert(tile);
            } else if self.can_attack(id, tile) {
                set.attacks.insert(tile);
            }
        }
    }

    fn chain(&self, id: PieceId, source: usize, set: &mut MoveSet) {
        let size = self.board.size();
        let mut seen = vec![false; size.len()];
        seen[source] = true;
        let mut frontier = vec![source];
        while let Some(tile) = frontier.pop() {
            for neighbor in size.neighbors(tile).into_iter().flatten() {
                if seen[neighbor] {
                    continue;
                }
                seen[neighbor] = true;
                if self.board.tile(neighbor).tile_type.is_chain() && self.can_enter(id, neighbor) {
                    set.moves.insert(neighbor);
                    frontier.push(neighbor);
                }
            }
        }
        set.attacks.extend(
            size.neighbors(source)
                .into_iter()
                .flatten()
                .filter(|&n| self.can_attack(id, n)),
        );
    }

    fn ports(&self, id: PieceId, source: usize, set: &mut MoveSet) {
        if !self.config.has(Options::PORTS) || self.board.tile(source).tile_type != TileType::Port {
            return;
        }
        let alignment = self.board.alignment(source);
        set.moves.extend((0..self.board.size().len()).filter(|&t| {
            t != source
                && self.board.tile(t).tile_type == TileType::Port
                && self.board.alignment(t) == alignment
                && self.can_enter(id, t)
        }));
    }

    fn swaps(&self, id: PieceId, source: usize, set: &mut MoveSet) {
        let side = self.board.side_of(id);
        for neighbor in self.board.size().neighbors(source).into_iter().flatten() {
            if let Some(other) = self.board.occupant(neighbor) {
                if self.board.side_of(other) == side && self.can_swap(id, other) {
                    set.swaps.insert(neighbor);
                }
            }
        }
    }

    /// Two own pieces can trade places if each can stand on the other's tile.
    #[must_use]
    pub fn can_swap(&self, a: PieceId, b: PieceId) -> bool {
        let (pa, pb) = (self.board.piece(a), self.board.piece(b));
        let (Some(ta), Some(tb)) = (pa.position, pb.position) else {
            return false;
        };
        let terrain = self.config.has(Options::TERRAIN);
        a != b
            && self.board.side_of(a) == self.board.side_of(b)
            && pa.piece_type.can_stand(self.board.tile(tb).tile_type, terrain)
            && pb.piece_type.can_stand(self.board.tile(ta).tile_type, terrain)
    }

    fn area_fire(&self, id: PieceId, source: usize, set: &mut MoveSet) {
        // Arrows fly over everything
        let dist = distances(source, ARCHER_RANGE, self.board.size(), &|_: usize| true);
        set.fires.extend(
            dist.iter()
                .enumerate()
                .filter(|&(tile, &d)| tile != source && d != UNREACHABLE)
                .map(|(tile, _)| tile)
                .filter(|&tile| self.can_fire_at(id, tile)),
        );
    }

    fn ray_fire(&self, id: PieceId, source: usize, set: &mut MoveSet) {
        let side = self.board.side_of(id);
        let open = |t: usize| self.board.occupant(t).is_none() && !self.can_breach(side, t);
        let mut reached = Vec::new();
        let mut blocked = Vec::new();
        self.walk_rays(source, CATAPULT_RANGE, &open, &mut reached, &mut blocked);
        set.fires.extend(
            blocked
                .into_iter()
                .filter(|&t| self.can_breach(side, t) || self.can_fire_at(id, t)),
        );
    }

    /// Run the distance search restricted to the eight rays from `source`, then walk each ray
    /// outward. A tile counts as reached only when its distance equals its step on the ray, so
    /// a path that bends through a neighboring ray is rejected. The first tile that fails ends
    /// its ray and is reported as blocking.
    fn walk_rays(
        &self,
        source: usize,
        reach: u32,
        pass: &dyn Fn(usize) -> bool,
        reached: &mut Vec<usize>,
        blocked: &mut Vec<usize>,
    ) {
        let size = self.board.size();
        let rays: Vec<Vec<usize>> = Direction::ALL
            .iter()
            .map(|&direction| ray(size, source, direction, reach))
            .collect();
        let mut on_ray = vec![false; size.len()];
        for &tile in rays.iter().flatten() {
            on_ray[tile] = true;
        }
        let dist = distances(source, reach, size, &|t: usize| on_ray[t] && pass(t));
        for ray in &rays {
            for (step, &tile) in (1u32..).zip(ray) {
                if dist[tile] == step {
                    reached.push(tile);
                } else {
                    blocked.push(tile);
                    break;
                }
            }
        }
    }
}

/// Tiles from `source` outward in `direction`, at most `reach` long.
fn ray(size: GridSize, source: usize, direction: Direction, reach: u32) -> Vec<usize> {
    std::iter::successors(size.step(source, direction), |&tile| size.step(tile, direction))
        .take(reach as usize)
        .collect()
}
