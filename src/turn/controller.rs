//! Match controller.
//!
//! Owns the board, the balanced configuration and the current turn record. Every accepted
//! action becomes a list of [`LogEntry`] values that are applied to the board, appended to the
//! replay log (if one is attached) and handed back to the caller.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::board::{Board, PieceId, PieceType, Side, TileType, TopKind};
use crate::config::{Config, Options};
use crate::error::{ActionError, LogError};
use crate::moves::{MoveContext, MoveSet};
use crate::replay::{LogEntry, ReplayWriter};
use crate::rng::RandomSource;
use crate::turn::{ActionBits, TurnRecord};

/// Limited special action, paid from the side's favor budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Favor {
    /// Bonus move.
    Hasten,
    /// Bonus attack, once per turn.
    Assault,
    /// Swap with any own piece on the board.
    Conspire,
    /// Jump to a random free tile of the own home.
    Deceive,
}

impl Favor {
    /// All favors.
    pub const ALL: [Favor; 4] = [Favor::Hasten, Favor::Assault, Favor::Conspire, Favor::Deceive];
}

/// Kind of action requested for a piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Move to an empty tile.
    Move,
    /// Capture an enemy by moving onto it.
    Attack,
    /// Shoot at an enemy or breach a fortress without moving.
    Fire,
    /// Trade places with an adjacent own piece.
    Swap,
    /// Bring a reserve piece onto the board.
    Spawn,
    /// End the turn.
    Pass,
    /// Spend a favor.
    Favor(Favor),
}

/// A fully specified action of the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Action {
    /// Acting piece.
    pub piece: PieceId,
    /// Target tile.
    pub destination: usize,
    /// What the piece does there.
    pub kind: ActionKind,
}

/// Why a side won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WinReason {
    /// Captured enough thrones.
    Throne,
    /// Captured enough fortresses.
    Fortress,
    /// Reached the victory-point target.
    VictoryPoints,
    /// Led when the turn limit ran out.
    SetPieceBattle,
}

impl WinReason {
    /// Keyword used by the replay log.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            WinReason::Throne => "throne",
            WinReason::Fortress => "fortress",
            WinReason::VictoryPoints => "points",
            WinReason::SetPieceBattle => "battle",
        }
    }

    /// Inverse of [`WinReason::keyword`].
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "throne" => Some(WinReason::Throne),
            "fortress" => Some(WinReason::Fortress),
            "points" => Some(WinReason::VictoryPoints),
            "battle" => Some(WinReason::SetPieceBattle),
            _ => None,
        }
    }
}

/// Final result of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum MatchOutcome {
    /// One side won.
    Victory {
        /// Winning side.
        side: Side,
        /// Rule that decided the match.
        reason: WinReason,
    },
    /// Nobody won.
    Draw,
}

impl MatchOutcome {
    /// Winning side, if any.
    #[must_use]
    pub const fn winner(self) -> Option<Side> {
        match self {
            MatchOutcome::Victory { side, .. } => Some(side),
            MatchOutcome::Draw => None,
        }
    }
}

/// Effects of one accepted action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionOutcome {
    /// Board mutations in the order they were applied, including a final
    /// [`LogEntry::Finish`] if the match ended.
    pub entries: Vec<LogEntry>,
    /// Rule that spent the turn, or empty if the side may keep acting.
    pub exhausted: ActionBits,
    /// The side to move changed, or the match ended.
    pub turn_ended: bool,
    /// Outcome if this action ended the match.
    pub finished: Option<MatchOutcome>,
}

/// A running match.
#[derive(Debug)]
pub struct Match<R: RandomSource> {
    config: Config,
    board: Board,
    rng: R,
    side: Side,
    turn: u32,
    record: TurnRecord,
    favors_used: [u16; 2],
    throne_captures: [u16; 2],
    fortress_captures: [u16; 2],
    points: [u16; 2],
    passes: u8,
    outcome: Option<MatchOutcome>,
    writer: Option<ReplayWriter>,
}

impl<R: RandomSource> Match<R> {
    /// Balance `config`, lay out a fresh board and start with the own side to move.
    pub fn new(config: Config, mut rng: R) -> Self {
        let config = config.balance();
        let board = Board::setup(&config, &mut rng);
        Self::from_board(config, board, rng)
    }

    /// Start a match on a prepared board. The board must have the configuration's dimensions.
    pub fn from_board(config: Config, board: Board, rng: R) -> Self {
        let config = config.balance();
        info!(
            name = %config.name,
            width = config.width,
            height = config.height,
            pieces = board.piece_count(),
            "match started"
        );
        let mut game = Self {
            config,
            board,
            rng,
            side: Side::Own,
            turn: 0,
            record: TurnRecord::new(),
            favors_used: [0; 2],
            throne_captures: [0; 2],
            fortress_captures: [0; 2],
            points: [0; 2],
            passes: 0,
            outcome: None,
            writer: None,
        };
        game.begin_turn();
        game
    }

    /// Attach a replay log in `dir`. Call before the first action so the preamble holds the
    /// starting position.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or the file cannot be created.
    pub fn record_to(&mut self, dir: &Path) -> Result<PathBuf, LogError> {
        let writer = ReplayWriter::create(dir, &self.config, &self.board)?;
        let path = writer.path().to_path_buf();
        self.writer = Some(writer);
        Ok(path)
    }

    /// Balanced configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Current board.
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Side whose turn it is.
    #[must_use]
    pub const fn side_to_move(&self) -> Side {
        self.side
    }

    /// Number of completed turns.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Ledger of the current turn.
    #[must_use]
    pub const fn record(&self) -> &TurnRecord {
        &self.record
    }

    /// Final result, once the match has ended.
    #[must_use]
    pub const fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    /// Whether the match has ended.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Thrones `side` has captured.
    #[must_use]
    pub const fn throne_captures(&self, side: Side) -> u16 {
        self.throne_captures[side.index()]
    }

    /// Fortresses `side` has captured.
    #[must_use]
    pub const fn fortress_captures(&self, side: Side) -> u16 {
        self.fortress_captures[side.index()]
    }

    /// Victory points `side` has scored.
    #[must_use]
    pub const fn points(&self, side: Side) -> u16 {
        self.points[side.index()]
    }

    /// Favors `side` may still spend.
    #[must_use]
    pub fn favors_left(&self, side: Side) -> u16 {
        if !self.config.has(Options::FAVORS) {
            return 0;
        }
        self.config.favor_limit.saturating_sub(self.favors_used[side.index()])
    }

    /// Path of the attached replay log.
    #[must_use]
    pub fn log_path(&self) -> Option<&Path> {
        self.writer.as_ref().map(ReplayWriter::path)
    }

    /// Move legality view over the current state.
    #[must_use]
    pub const fn context(&self) -> MoveContext<'_> {
        MoveContext::new(&self.board, &self.config, &self.record)
    }

    /// Legal targets of an on-board piece this turn.
    #[must_use]
    pub fn legal_destinations(&self, piece: PieceId) -> MoveSet {
        self.context().legal_destinations(piece)
    }

    /// Every regular action the side to move may take now, excluding pass and favors.
    ///
    /// Sub-actions a piece already used this turn are left out, so each returned action would
    /// be accepted by [`Match::apply_action`].
    #[must_use]
    pub fn legal_actions(&self) -> Vec<Action> {
        let context = self.context();
        let mut actions = Vec::new();
        if self.outcome.is_some() {
            return actions;
        }
        let mut push = |piece: PieceId, tiles: &BTreeSet<usize>, kind: ActionKind| {
            actions.extend(tiles.iter().map(|&destination| Action {
                piece,
                destination,
                kind,
            }));
        };
        for (piece, set) in context.all_moves(self.side) {
            let used = self.record.actor_bits(piece);
            if !used.contains(ActionBits::MOVE) {
                push(piece, &set.moves, ActionKind::Move);
            }
            if !used.contains(ActionBits::ATTACK) {
                push(piece, &set.attacks, ActionKind::Attack);
            }
            if !used.contains(ActionBits::FIRE) {
                push(piece, &set.fires, ActionKind::Fire);
            }
            let swaps: BTreeSet<usize> = set
                .swaps
                .iter()
                .copied()
                .filter(|&tile| !used.intersects(self.swap_bit(tile)))
                .collect();
            push(piece, &swaps, ActionKind::Swap);
        }
        for piece in self.board.piece_ids(self.side) {
            if self.board.piece(piece).position.is_none() {
                push(piece, &context.spawn_destinations(piece), ActionKind::Spawn);
            }
        }
        actions
    }

    /// Bit a swap onto `tile` would use.
    fn swap_bit(&self, tile: usize) -> ActionBits {
        let mount = self
            .board
            .occupant(tile)
            .is_some_and(|p| self.board.piece(p).piece_type == PieceType::Warhorse);
        if mount {
            ActionBits::MOUNT
        } else {
            ActionBits::SWAP
        }
    }

    /// Apply an action for the side to move.
    ///
    /// `destination` is ignored by [`ActionKind::Pass`] and [`Favor::Deceive`], and `piece` is
    /// ignored by [`ActionKind::Pass`]. After a regular action the turn record is checked and a
    /// spent turn passes to the opponent.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError`] if the rules reject the action; the match is then unchanged.
    /// A [`ActionError::Log`] is returned after the action was applied, when only the log
    /// write failed.
    pub fn apply_action(
        &mut self,
        piece: PieceId,
        destination: usize,
        kind: ActionKind,
    ) -> Result<ActionOutcome, ActionError> {
        if self.outcome.is_some() {
            return Err(ActionError::MatchFinished);
        }
        let mut outcome = ActionOutcome::default();
        match kind {
            ActionKind::Pass => {}
            ActionKind::Favor(favor) => {
                self.check_piece(piece)?;
                self.apply_favor(piece, destination, favor, &mut outcome.entries)?;
            }
            _ => {
                self.check_piece(piece)?;
                let bit = self.apply_regular(piece, destination, kind, &mut outcome.entries)?;
                self.record.update(piece, bit, true);
            }
        }
        debug!(piece, destination, ?kind, entries = outcome.entries.len(), "action applied");

        self.check_captures(&mut outcome);
        if outcome.finished.is_none() {
            outcome.exhausted = self.record.actions_exhausted();
            let regular = !matches!(kind, ActionKind::Favor(_));
            if kind == ActionKind::Pass || (regular && !outcome.exhausted.is_empty()) {
                self.end_turn(&mut outcome);
            }
        }
        self.flush_log(&outcome.entries)?;
        Ok(outcome)
    }

    /// End the match in a draw on external request.
    ///
    /// # Errors
    ///
    /// Returns an error if the match is already over or the log write fails.
    pub fn declare_draw(&mut self) -> Result<ActionOutcome, ActionError> {
        if self.outcome.is_some() {
            return Err(ActionError::MatchFinished);
        }
        let mut outcome = ActionOutcome::default();
        self.finish(MatchOutcome::Draw, &mut outcome);
        self.flush_log(&outcome.entries)?;
        Ok(outcome)
    }

    fn check_piece(&self, piece: PieceId) -> Result<(), ActionError> {
        if piece >= self.board.piece_count() || self.board.side_of(piece) != self.side {
            return Err(ActionError::NotYourPiece(piece));
        }
        Ok(())
    }

    fn require_fresh(&self, piece: PieceId, bit: ActionBits) -> Result<(), ActionError> {
        if self.record.actor_bits(piece).intersects(bit) {
            return Err(ActionError::AlreadyActed(piece));
        }
        Ok(())
    }

    fn apply_regular(
        &mut self,
        piece: PieceId,
        destination: usize,
        kind: ActionKind,
        entries: &mut Vec<LogEntry>,
    ) -> Result<ActionBits, ActionError> {
        let illegal = ActionError::IllegalDestination { piece, destination };
        if kind == ActionKind::Spawn {
            if self.board.piece(piece).position.is_some() {
                return Err(ActionError::OnBoard(piece));
            }
            if !self.context().spawn_destinations(piece).contains(&destination) {
                return Err(illegal);
            }
            self.relocate(piece, destination, entries);
            self.arrive(destination, entries);
            return Ok(ActionBits::SPAWN);
        }

        if self.board.piece(piece).position.is_none() {
            return Err(ActionError::OffBoard(piece));
        }
        let set = self.legal_destinations(piece);
        match kind {
            ActionKind::Move => {
                self.require_fresh(piece, ActionBits::MOVE)?;
                if !set.moves.contains(&destination) {
                    return Err(illegal);
                }
                self.relocate(piece, destination, entries);
                self.arrive(destination, entries);
                Ok(ActionBits::MOVE)
            }
            ActionKind::Attack => {
                self.require_fresh(piece, ActionBits::ATTACK)?;
                if !set.attacks.contains(&destination) {
                    return Err(illegal);
                }
                self.strike(piece, destination, entries);
                Ok(ActionBits::ATTACK)
            }
            ActionKind::Fire => {
                self.require_fresh(piece, ActionBits::FIRE)?;
                if !set.fires.contains(&destination) {
                    return Err(illegal);
                }
                self.fire_at(piece, destination, entries);
                Ok(ActionBits::FIRE)
            }
            ActionKind::Swap => {
                if !set.swaps.contains(&destination) {
                    return Err(illegal);
                }
                let partner = self.board.occupant(destination).ok_or(illegal)?;
                let bit = self.swap_bit(destination);
                self.require_fresh(piece, bit)?;
                self.swap(piece, partner, entries);
                Ok(bit)
            }
            ActionKind::Spawn | ActionKind::Pass | ActionKind::Favor(_) => Ok(ActionBits::NONE),
        }
    }

    fn apply_favor(
        &mut self,
        piece: PieceId,
        destination: usize,
        favor: Favor,
        entries: &mut Vec<LogEntry>,
    ) -> Result<(), ActionError> {
        if self.favors_left(self.side) == 0 {
            return Err(ActionError::FavorUnavailable);
        }
        if self.board.piece(piece).position.is_none() {
            return Err(ActionError::OffBoard(piece));
        }
        let illegal = ActionError::IllegalDestination { piece, destination };
        let bit = match favor {
            Favor::Hasten => {
                if self.record.assault_bits(piece).contains(ActionBits::MOVE) {
                    return Err(ActionError::AlreadyActed(piece));
                }
                if !self.legal_destinations(piece).moves.contains(&destination) {
                    return Err(illegal);
                }
                self.relocate(piece, destination, entries);
                self.arrive(destination, entries);
                ActionBits::MOVE
            }
            Favor::Assault => {
                if self.record.assault_total().contains(ActionBits::ATTACK) {
                    return Err(ActionError::FavorUnavailable);
                }
                if !self.legal_destinations(piece).attacks.contains(&destination) {
                    return Err(illegal);
                }
                self.strike(piece, destination, entries);
                ActionBits::ATTACK
            }
            Favor::Conspire => {
                if destination >= self.board.size().len() {
                    return Err(illegal);
                }
                let partner = self
                    .board
                    .occupant(destination)
                    .filter(|&other| self.context().can_swap(piece, other))
                    .ok_or(illegal)?;
                self.swap(piece, partner, entries);
                ActionBits::SWAP
            }
            Favor::Deceive => {
                let context = self.context();
                let home: Vec<usize> = (0..self.board.size().len())
                    .filter(|&t| self.board.alignment(t) == Some(self.side))
                    .filter(|&t| context.can_enter(piece, t))
                    .collect();
                if home.is_empty() {
                    return Err(illegal);
                }
                let to = home[self.rng.next_below(home.len())];
                self.relocate(piece, to, entries);
                self.arrive(to, entries);
                ActionBits::MOVE
            }
        };
        self.favors_used[self.side.index()] += 1;
        self.record.update(piece, bit, false);
        Ok(())
    }

    /// Apply an entry to the board and keep it for the log.
    fn push(&mut self, entry: LogEntry, entries: &mut Vec<LogEntry>) {
        self.board.apply_entry(&entry, true);
        entries.push(entry);
    }

    fn relocate(&mut self, piece: PieceId, to: usize, entries: &mut Vec<LogEntry>) {
        let from = self.board.piece(piece).position;
        self.push(
            LogEntry::Piece {
                id: piece,
                from,
                to: Some(to),
            },
            entries,
        );
        self.board.note_fortress_visit(piece);
    }

    fn swap(&mut self, piece: PieceId, partner: PieceId, entries: &mut Vec<LogEntry>) {
        let here = self.board.piece(piece).position;
        let there = self.board.piece(partner).position;
        self.push(
            LogEntry::Piece {
                id: piece,
                from: here,
                to: there,
            },
            entries,
        );
        self.push(
            LogEntry::Piece {
                id: partner,
                from: there,
                to: here,
            },
            entries,
        );
        self.board.note_fortress_visit(piece);
        self.board.note_fortress_visit(partner);
    }

    /// Remove the enemy on `destination` and move in.
    fn strike(&mut self, piece: PieceId, destination: usize, entries: &mut Vec<LogEntry>) {
        if let Some(target) = self.board.occupant(destination) {
            self.remove(target, entries);
        }
        self.relocate(piece, destination, entries);
        self.arrive(destination, entries);
    }

    fn fire_at(&mut self, piece: PieceId, destination: usize, entries: &mut Vec<LogEntry>) {
        let breaches = self.board.piece(piece).piece_type == PieceType::Catapult
            && self.context().can_breach(self.side, destination);
        if breaches {
            self.push(
                LogEntry::Breach {
                    id: destination,
                    old: false,
                    new: true,
                },
                entries,
            );
        } else if let Some(target) = self.board.occupant(destination) {
            self.remove(target, entries);
        }
    }

    fn remove(&mut self, target: PieceId, entries: &mut Vec<LogEntry>) {
        let from = self.board.piece(target).position;
        self.push(
            LogEntry::Piece {
                id: target,
                from,
                to: None,
            },
            entries,
        );
        if self.board.piece(target).piece_type == PieceType::Throne {
            self.throne_captures[self.side.index()] += 1;
            info!(side = ?self.side, target, "throne captured");
        }
    }

    /// Effects of a piece of the moving side arriving on `tile`.
    fn arrive(&mut self, tile: usize, entries: &mut Vec<LogEntry>) {
        let alignment = self.board.alignment(tile);
        if self.board.tile(tile).tile_type == TileType::Fortress && alignment != Some(self.side) {
            // Middle fortresses are held for points, not captured
            if !(self.config.is_victory_points() && alignment.is_none()) {
                self.capture_fortress(tile, entries);
            }
            return;
        }
        let farm = self
            .board
            .top_at(tile)
            .filter(|(_, top)| top.kind == TopKind::Farm && top.side != self.side)
            .map(|(slot, _)| slot);
        if let Some(slot) = farm {
            self.push(
                LogEntry::Top {
                    slot,
                    from: Some(tile),
                    to: None,
                },
                entries,
            );
        }
    }

    fn capture_fortress(&mut self, tile: usize, entries: &mut Vec<LogEntry>) {
        if self.board.tile(tile).breached {
            self.push(
                LogEntry::Breach {
                    id: tile,
                    old: true,
                    new: false,
                },
                entries,
            );
        }
        self.push(
            LogEntry::Tile {
                id: tile,
                old: TileType::Fortress,
                new: TileType::Plains,
            },
            entries,
        );
        let opposing = self
            .board
            .top_at(tile)
            .filter(|(_, top)| top.side != self.side)
            .map(|(slot, _)| slot);
        if let Some(slot) = opposing {
            self.push(
                LogEntry::Top {
                    slot,
                    from: Some(tile),
                    to: None,
                },
                entries,
            );
        }
        if let Some(slot) = self.board.free_city_slot(self.side) {
            self.push(
                LogEntry::Top {
                    slot,
                    from: None,
                    to: Some(tile),
                },
                entries,
            );
        }
        self.fortress_captures[self.side.index()] += 1;
        info!(side = ?self.side, tile, "fortress captured");
    }

    fn check_captures(&mut self, outcome: &mut ActionOutcome) {
        if self.config.is_victory_points() {
            return;
        }
        let index = self.side.index();
        let reason = if self.config.win_throne > 0
            && self.throne_captures[index] >= self.config.win_throne
        {
            Some(WinReason::Throne)
        } else if self.config.win_fortress > 0
            && self.fortress_captures[index] >= self.config.win_fortress
        {
            Some(WinReason::Fortress)
        } else {
            None
        };
        if let Some(reason) = reason {
            self.finish(
                MatchOutcome::Victory {
                    side: self.side,
                    reason,
                },
                outcome,
            );
        }
    }

    fn end_turn(&mut self, outcome: &mut ActionOutcome) {
        outcome.turn_ended = true;
        let idle = self.record.is_idle() && self.record.assault_total().is_empty();
        self.passes = if idle { self.passes.saturating_add(1) } else { 0 };

        if self.config.is_victory_points() {
            let index = self.side.index();
            self.points[index] = self.points[index].saturating_add(self.middle_fortresses_held());
            if self.points[index] >= self.config.victory_points {
                self.finish(
                    MatchOutcome::Victory {
                        side: self.side,
                        reason: WinReason::VictoryPoints,
                    },
                    outcome,
                );
                return;
            }
        }

        self.turn += 1;
        if self.config.battle_pass > 0 && self.passes >= self.config.battle_pass {
            self.finish(MatchOutcome::Draw, outcome);
            return;
        }
        let limit = u32::from(self.config.set_piece_battle);
        if limit > 0 && self.turn >= limit {
            let result = self.set_piece_result();
            self.finish(result, outcome);
            return;
        }

        self.side = self.side.opponent();
        self.begin_turn();
        debug!(turn = self.turn, side = ?self.side, "turn passed");
    }

    /// Fresh record with protections for the side about to move.
    fn begin_turn(&mut self) {
        self.record = TurnRecord::new();
        let terrain = self.config.has(Options::TERRAIN);
        for id in self.board.piece_ids(self.side.opponent()) {
            let Some(at) = self.board.piece(id).position else {
                continue;
            };
            let tile = self.board.tile(at);
            if tile.is_intact_fortress() {
                self.record.add_protect(id, true);
            } else if terrain && tile.tile_type == TileType::Forest {
                self.record.add_protect(id, false);
            }
        }
    }

    fn middle_fortresses_held(&self) -> u16 {
        let held = (0..self.board.size().len())
            .filter(|&t| self.board.alignment(t).is_none())
            .filter(|&t| self.board.tile(t).tile_type == TileType::Fortress)
            .filter(|&t| {
                self.board
                    .occupant(t)
                    .is_some_and(|id| self.board.side_of(id) == self.side)
            })
            .count();
        u16::try_from(held).unwrap_or(u16::MAX)
    }

    fn set_piece_result(&self) -> MatchOutcome {
        let (own, enemy) = (Side::Own.index(), Side::Enemy.index());
        let order = self.throne_captures[own]
            .cmp(&self.throne_captures[enemy])
            .then(self.fortress_captures[own].cmp(&self.fortress_captures[enemy]));
        let side = match order {
            Ordering::Greater => Side::Own,
            Ordering::Less => Side::Enemy,
            Ordering::Equal => return MatchOutcome::Draw,
        };
        MatchOutcome::Victory {
            side,
            reason: WinReason::SetPieceBattle,
        }
    }

    fn finish(&mut self, result: MatchOutcome, outcome: &mut ActionOutcome) {
        self.outcome = Some(result);
        outcome.turn_ended = true;
        outcome.finished = Some(result);
        outcome.entries.push(LogEntry::Finish(result));
        info!(?result, turn = self.turn, "match finished");
    }

    fn flush_log(&mut self, entries: &[LogEntry]) -> Result<(), ActionError> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        for entry in entries {
            match entry {
                LogEntry::Finish(result) => writer.finish(*result)?,
                _ => writer.append(entry)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::XorShift;

    // Local order per side: 0 throne, 1-2 soldiers, 3 lancer, 4 warhorse, 5 dragon,
    // 6 archer, 7 catapult, 8 ship

    fn open_config() -> Config {
        Config {
            tile_amounts: [0; 6],
            middle_amounts: [0; 5],
            piece_amounts: [1, 2, 1, 1, 1, 1, 1, 1],
            ..Config::default()
        }
        .balance()
    }

    /// Board from `(column, row, type)` tiles and `(local, column, row)` pieces.
    fn scenario(
        config: &Config,
        tiles: &[(usize, usize, TileType)],
        own: &[(usize, usize, usize)],
        enemy: &[(usize, usize, usize)],
    ) -> Board {
        let size = config.board_size();
        let mut types = vec![TileType::Empty; size.len()];
        for &(column, row, tile_type) in tiles {
            types[size.index(column, row)] = tile_type;
        }
        let place = |pieces: &[(usize, usize, usize)]| {
            let mut positions = vec![None; config.piece_total()];
            for &(local, column, row) in pieces {
                positions[local] = Some(size.index(column, row));
            }
            positions
        };
        Board::from_preamble(config, &types, &place(own), &place(enemy))
    }

    fn game(config: Config, board: Board) -> Match<XorShift> {
        Match::from_board(config, board, XorShift::new(1))
    }

    #[test]
    fn test_new_match_starts_with_own_side() {
        let game = Match::new(Config::default(), XorShift::new(7));
        assert_eq!(game.side_to_move(), Side::Own);
        assert_eq!(game.turn(), 0);
        assert!(!game.is_finished());
        assert_eq!(game.favors_left(Side::Own), 2);
    }

    #[test]
    fn test_two_moves_end_turn() {
        let config = open_config();
        let board = scenario(&config, &[], &[(0, 0, 0), (1, 2, 1), (2, 6, 1)], &[(0, 8, 8)]);
        let mut game = game(config, board);
        let size = game.board().size();

        let first = game.apply_action(1, size.index(2, 2), ActionKind::Move).unwrap();
        assert!(!first.turn_ended);
        assert!(first.exhausted.is_empty());

        let second = game.apply_action(2, size.index(6, 2), ActionKind::Move).unwrap();
        assert!(second.turn_ended);
        assert_eq!(second.exhausted, ActionBits::MOVE | ActionBits::SWAP);
        assert_eq!(game.side_to_move(), Side::Enemy);
        assert_eq!(game.turn(), 1);
    }

    #[test]
    fn test_same_bit_twice_rejected() {
        let config = open_config();
        let board = scenario(&config, &[], &[(0, 0, 0), (1, 2, 1)], &[(0, 8, 8)]);
        let mut game = game(config, board);
        let size = game.board().size();
        game.apply_action(1, size.index(2, 2), ActionKind::Move).unwrap();
        let err = game.apply_action(1, size.index(2, 3), ActionKind::Move).unwrap_err();
        assert!(matches!(err, ActionError::AlreadyActed(1)));
    }

    #[test]
    fn test_rejects_foreign_and_illegal() {
        let config = open_config();
        let board = scenario(&config, &[], &[(0, 0, 0), (1, 2, 1)], &[(0, 8, 8)]);
        let mut game = game(config, board);
        let enemy_throne = game.board().global(Side::Enemy, 0);
        let err = game.apply_action(enemy_throne, 0, ActionKind::Move).unwrap_err();
        assert!(matches!(err, ActionError::NotYourPiece(_)));

        let far = game.board().size().index(2, 3);
        let err = game.apply_action(1, far, ActionKind::Move).unwrap_err();
        assert!(matches!(err, ActionError::IllegalDestination { piece: 1, .. }));

        let err = game.apply_action(3, far, ActionKind::Move).unwrap_err();
        assert!(matches!(err, ActionError::OffBoard(3)));
        assert!(game.record().is_idle());
    }

    #[test]
    fn test_throne_capture_wins() {
        let config = open_config();
        let board = scenario(&config, &[], &[(0, 0, 0), (1, 4, 3)], &[(0, 4, 4)]);
        let mut game = game(config, board);
        let size = game.board().size();
        let target = size.index(4, 4);
        let enemy_throne = game.board().global(Side::Enemy, 0);

        let outcome = game.apply_action(1, target, ActionKind::Attack).unwrap();
        let result = MatchOutcome::Victory {
            side: Side::Own,
            reason: WinReason::Throne,
        };
        assert_eq!(
            outcome.entries,
            vec![
                LogEntry::Piece {
                    id: enemy_throne,
                    from: Some(target),
                    to: None
                },
                LogEntry::Piece {
                    id: 1,
                    from: Some(size.index(4, 3)),
                    to: Some(target)
                },
                LogEntry::Finish(result),
            ]
        );
        assert_eq!(outcome.finished, Some(result));
        assert_eq!(game.throne_captures(Side::Own), 1);
        assert!(matches!(
            game.apply_action(1, 0, ActionKind::Pass),
            Err(ActionError::MatchFinished)
        ));
    }

    #[test]
    fn test_fortress_capture_entry_order() {
        let config = open_config();
        let mut board = scenario(
            &config,
            &[(4, 5, TileType::Fortress)],
            &[(0, 0, 0), (1, 4, 4)],
            &[(0, 8, 8)],
        );
        let size = board.size();
        let fortress = size.index(4, 5);
        board.set_breached(fortress, true);
        let city = board.free_city_slot(Side::Own).unwrap();
        let mut game = game(config, board);

        let outcome = game.apply_action(1, fortress, ActionKind::Move).unwrap();
        assert_eq!(
            outcome.entries,
            vec![
                LogEntry::Piece {
                    id: 1,
                    from: Some(size.index(4, 4)),
                    to: Some(fortress)
                },
                LogEntry::Breach {
                    id: fortress,
                    old: true,
                    new: false
                },
                LogEntry::Tile {
                    id: fortress,
                    old: TileType::Fortress,
                    new: TileType::Plains
                },
                LogEntry::Top {
                    slot: city,
                    from: None,
                    to: Some(fortress)
                },
            ]
        );
        assert_eq!(game.fortress_captures(Side::Own), 1);
        assert_eq!(game.board().tile(fortress).tile_type, TileType::Plains);
        assert_eq!(game.board().top_at(fortress).map(|(slot, _)| slot), Some(city));
    }

    #[test]
    fn test_fortress_occupant_is_strongly_protected() {
        let config = open_config();
        let board = scenario(
            &config,
            &[(4, 5, TileType::Fortress)],
            &[(0, 0, 0), (1, 4, 4)],
            &[(0, 8, 8), (1, 4, 5)],
        );
        let mut game = game(config, board);
        let defender = game.board().global(Side::Enemy, 1);
        assert_eq!(game.record().protection(defender), Some(crate::turn::Protection::Strong));
        let err = game
            .apply_action(1, game.board().size().index(4, 5), ActionKind::Attack)
            .unwrap_err();
        assert!(matches!(err, ActionError::IllegalDestination { .. }));
    }

    #[test]
    fn test_entering_enemy_farm_razes_it() {
        let config = open_config();
        let board = scenario(
            &config,
            &[(4, 5, TileType::Plains)],
            &[(0, 0, 0), (1, 4, 4)],
            &[(0, 8, 8)],
        );
        let farm = board.top_at(board.size().index(4, 5)).map(|(slot, _)| slot).unwrap();
        let mut game = game(config, board);
        let tile = game.board().size().index(4, 5);
        let outcome = game.apply_action(1, tile, ActionKind::Move).unwrap();
        assert_eq!(
            outcome.entries[1],
            LogEntry::Top {
                slot: farm,
                from: Some(tile),
                to: None
            }
        );
        assert!(game.board().top_at(tile).is_none());
    }

    #[test]
    fn test_spawn_ends_turn() {
        let config = open_config();
        let board = scenario(&config, &[(0, 0, TileType::Fortress)], &[(0, 0, 0)], &[(0, 8, 8)]);
        let mut game = game(config, board);
        let outcome = game.apply_action(1, 1, ActionKind::Spawn).unwrap();
        assert_eq!(
            outcome.entries,
            vec![LogEntry::Piece {
                id: 1,
                from: None,
                to: Some(1)
            }]
        );
        assert_eq!(outcome.exhausted, ActionBits::SPAWN);
        assert!(outcome.turn_ended);
        assert_eq!(game.side_to_move(), Side::Enemy);
    }

    #[test]
    fn test_spawn_needs_reserve_piece() {
        let config = open_config();
        let board = scenario(
            &config,
            &[(0, 0, TileType::Fortress)],
            &[(0, 0, 0), (1, 4, 2)],
            &[(0, 8, 8)],
        );
        let mut game = game(config, board);
        assert!(matches!(
            game.apply_action(1, 1, ActionKind::Spawn),
            Err(ActionError::OnBoard(1))
        ));
        assert!(matches!(
            game.apply_action(2, 40, ActionKind::Spawn),
            Err(ActionError::IllegalDestination { .. })
        ));
    }

    #[test]
    fn test_catapult_breaches_fortress() {
        let config = open_config();
        let board = scenario(
            &config,
            &[(4, 5, TileType::Fortress)],
            &[(0, 0, 0), (7, 4, 3)],
            &[(0, 8, 8)],
        );
        let mut game = game(config, board);
        let fortress = game.board().size().index(4, 5);
        let outcome = game.apply_action(7, fortress, ActionKind::Fire).unwrap();
        assert_eq!(
            outcome.entries,
            vec![LogEntry::Breach {
                id: fortress,
                old: false,
                new: true
            }]
        );
        assert_eq!(outcome.exhausted, ActionBits::ATTACK | ActionBits::FIRE);
        assert!(game.board().tile(fortress).breached);
    }

    #[test]
    fn test_mount_swap_is_free() {
        let config = open_config();
        let board = scenario(&config, &[], &[(0, 0, 0), (1, 4, 2), (4, 5, 2)], &[(0, 8, 8)]);
        let mut game = game(config, board);
        let size = game.board().size();
        let outcome = game.apply_action(1, size.index(5, 2), ActionKind::Swap).unwrap();
        assert!(outcome.exhausted.is_empty());
        assert_eq!(game.record().actor_bits(1), ActionBits::MOUNT);
        assert_eq!(game.board().occupant(size.index(5, 2)), Some(1));
        assert_eq!(game.board().occupant(size.index(4, 2)), Some(4));
    }

    #[test]
    fn test_swap_targets_outside_board_rejected() {
        let config = open_config();
        let board = scenario(&config, &[], &[(0, 0, 0), (1, 4, 2), (4, 5, 2)], &[(0, 8, 8)]);
        let mut game = game(config, board);
        let before = game.board().clone();
        let outside = game.board().size().len() + 3;
        for kind in [ActionKind::Swap, ActionKind::Favor(Favor::Conspire)] {
            let err = game.apply_action(1, outside, kind).unwrap_err();
            assert!(matches!(
                err,
                ActionError::IllegalDestination { piece: 1, destination } if destination == outside
            ));
        }
        assert_eq!(game.board(), &before);
        assert_eq!(game.favors_left(Side::Own), 2);
    }

    #[test]
    fn test_hasten_grants_bonus_move() {
        let config = open_config();
        let board = scenario(&config, &[], &[(0, 0, 0), (1, 4, 1)], &[(0, 8, 8)]);
        let mut game = game(config, board);
        let size = game.board().size();
        game.apply_action(1, size.index(4, 2), ActionKind::Move).unwrap();
        let bonus = game
            .apply_action(1, size.index(4, 3), ActionKind::Favor(Favor::Hasten))
            .unwrap();
        assert!(!bonus.turn_ended);
        assert_eq!(game.favors_left(Side::Own), 1);
        assert_eq!(game.record().assault_bits(1), ActionBits::MOVE);
        assert!(matches!(
            game.apply_action(1, size.index(4, 4), ActionKind::Favor(Favor::Hasten)),
            Err(ActionError::AlreadyActed(1))
        ));
    }

    #[test]
    fn test_favors_run_out() {
        let config = Config {
            favor_limit: 1,
            ..open_config()
        };
        let board = scenario(&config, &[], &[(0, 0, 0), (1, 4, 1)], &[(0, 8, 8)]);
        let mut game = game(config, board);
        game.apply_action(1, 0, ActionKind::Favor(Favor::Deceive)).unwrap();
        assert!(matches!(
            game.apply_action(1, 0, ActionKind::Favor(Favor::Deceive)),
            Err(ActionError::FavorUnavailable)
        ));
    }

    #[test]
    fn test_deceive_stays_in_own_home() {
        let config = open_config();
        let board = scenario(&config, &[], &[(0, 0, 0), (1, 4, 1)], &[(0, 8, 8)]);
        let mut game = game(config, board);
        let outcome = game.apply_action(1, 0, ActionKind::Favor(Favor::Deceive)).unwrap();
        let LogEntry::Piece { to: Some(to), .. } = outcome.entries[0] else {
            panic!("expected a piece entry");
        };
        assert_eq!(game.board().alignment(to), Some(Side::Own));
        assert_ne!(to, game.board().size().index(4, 1));
    }

    #[test]
    fn test_idle_passes_draw() {
        let config = open_config();
        let board = scenario(&config, &[], &[(0, 0, 0)], &[(0, 8, 8)]);
        let mut game = game(config, board);
        assert!(game.apply_action(0, 0, ActionKind::Pass).unwrap().finished.is_none());
        assert!(game.apply_action(0, 0, ActionKind::Pass).unwrap().finished.is_none());
        let last = game.apply_action(0, 0, ActionKind::Pass).unwrap();
        assert_eq!(last.finished, Some(MatchOutcome::Draw));
        assert_eq!(last.entries, vec![LogEntry::Finish(MatchOutcome::Draw)]);
    }

    #[test]
    fn test_set_piece_battle_limit() {
        let config = Config {
            set_piece_battle: 2,
            battle_pass: 0,
            ..open_config()
        };
        let board = scenario(&config, &[], &[(0, 0, 0)], &[(0, 8, 8)]);
        let mut game = game(config, board);
        game.apply_action(0, 0, ActionKind::Pass).unwrap();
        let last = game.apply_action(0, 0, ActionKind::Pass).unwrap();
        assert_eq!(last.finished, Some(MatchOutcome::Draw));
    }

    #[test]
    fn test_victory_points_from_middle_fortress() {
        let config = Config {
            options: Options::VICTORY_POINTS | Options::TERRAIN,
            victory_points: 1,
            ..open_config()
        }
        .balance();
        let board = scenario(
            &config,
            &[(4, 4, TileType::Fortress)],
            &[(0, 0, 0), (1, 4, 3)],
            &[(0, 8, 8)],
        );
        let mut game = game(config, board);
        let middle = game.board().size().index(4, 4);
        let moved = game.apply_action(1, middle, ActionKind::Move).unwrap();
        assert_eq!(moved.entries.len(), 1);
        assert_eq!(game.board().tile(middle).tile_type, TileType::Fortress);

        let end = game.apply_action(0, 0, ActionKind::Pass).unwrap();
        assert_eq!(
            end.finished,
            Some(MatchOutcome::Victory {
                side: Side::Own,
                reason: WinReason::VictoryPoints
            })
        );
        assert_eq!(game.points(Side::Own), 1);
    }

    #[test]
    fn test_declare_draw() {
        let mut game = Match::new(Config::default(), XorShift::new(3));
        let outcome = game.declare_draw().unwrap();
        assert_eq!(outcome.finished, Some(MatchOutcome::Draw));
        assert!(matches!(game.declare_draw(), Err(ActionError::MatchFinished)));
    }

    #[test]
    fn test_legal_actions_are_accepted() {
        let mut game = Match::new(Config::default(), XorShift::new(11));
        for _ in 0..20 {
            let actions = game.legal_actions();
            let Some(&action) = actions.first() else {
                game.apply_action(0, 0, ActionKind::Pass).unwrap();
                continue;
            };
            game.apply_action(action.piece, action.destination, action.kind).unwrap();
            if game.is_finished() {
                break;
            }
        }
    }

    #[test]
    fn test_legal_actions_skip_used_bits() {
        let config = open_config();
        let board = scenario(&config, &[], &[(0, 0, 0), (1, 4, 1)], &[(0, 8, 8)]);
        let mut game = game(config, board);
        let size = game.board().size();
        game.apply_action(1, size.index(4, 2), ActionKind::Move).unwrap();
        assert!(
            game.legal_actions()
                .iter()
                .all(|a| !(a.piece == 1 && a.kind == ActionKind::Move))
        );
    }

    #[test]
    fn test_win_reason_keywords() {
        for reason in [
            WinReason::Throne,
            WinReason::Fortress,
            WinReason::VictoryPoints,
            WinReason::SetPieceBattle,
        ] {
            assert_eq!(WinReason::from_keyword(reason.keyword()), Some(reason));
        }
        assert_eq!(WinReason::from_keyword("luck"), None);
    }
}
