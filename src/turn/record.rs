//! Per-turn action ledger.

use std::collections::BTreeMap;
use std::ops::{BitOr, BitOrAssign};

use crate::board::PieceId;

/// Bit-set of sub-actions a piece performed in one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ActionBits(u8);

impl ActionBits {
    /// Nothing.
    pub const NONE: ActionBits = ActionBits(0);
    /// Moved to an empty tile.
    pub const MOVE: ActionBits = ActionBits(1);
    /// Traded places with an own piece.
    pub const SWAP: ActionBits = ActionBits(1 << 1);
    /// Captured by moving in.
    pub const ATTACK: ActionBits = ActionBits(1 << 2);
    /// Shot without moving.
    pub const FIRE: ActionBits = ActionBits(1 << 3);
    /// Entered from reserve.
    pub const SPAWN: ActionBits = ActionBits(1 << 4);
    /// Swapped onto a mount. Never ends a turn.
    pub const MOUNT: ActionBits = ActionBits(1 << 5);

    /// Raw bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: ActionBits) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether any bit of `other` is set.
    #[must_use]
    pub const fn intersects(self, other: ActionBits) -> bool {
        self.0 & other.0 != 0
    }

    /// No bit set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for ActionBits {
    type Output = ActionBits;

    fn bitor(self, rhs: ActionBits) -> ActionBits {
        ActionBits(self.0 | rhs.0)
    }
}

impl BitOrAssign for ActionBits {
    fn bitor_assign(&mut self, rhs: ActionBits) {
        self.0 |= rhs.0;
    }
}

/// Immunity granted to a piece for one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Protection {
    /// Blocks ranged fire.
    Soft,
    /// Blocks fire and melee attacks.
    Strong,
}

/// Ledger of one side's turn.
///
/// Regular actions go to the actor ledger and decide when the turn is spent. Favor actions go
/// to the assault ledger and never spend the turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnRecord {
    actors: BTreeMap<PieceId, ActionBits>,
    assaults: BTreeMap<PieceId, ActionBits>,
    protections: BTreeMap<PieceId, Protection>,
    last_actor: Option<(PieceId, ActionBits)>,
    last_assault: Option<(PieceId, ActionBits)>,
}

impl TurnRecord {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `piece` performed `action`, in the actor ledger if `is_regular`, else in the
    /// assault ledger.
    pub fn update(&mut self, piece: PieceId, action: ActionBits, is_regular: bool) {
        let (ledger, last) = if is_regular {
            (&mut self.actors, &mut self.last_actor)
        } else {
            (&mut self.assaults, &mut self.last_assault)
        };
        *ledger.entry(piece).or_default() |= action;
        *last = Some((piece, action));
    }

    /// Make `piece` immune for the rest of the turn. A strong protection is never downgraded.
    pub fn add_protect(&mut self, piece: PieceId, strong: bool) {
        let level = if strong {
            Protection::Strong
        } else {
            Protection::Soft
        };
        let current = self.protections.entry(piece).or_insert(level);
        *current = (*current).max(level);
    }

    /// Protection of `piece`, if any.
    #[must_use]
    pub fn protection(&self, piece: PieceId) -> Option<Protection> {
        self.protections.get(&piece).copied()
    }

    /// Regular bits `piece` used this turn.
    #[must_use]
    pub fn actor_bits(&self, piece: PieceId) -> ActionBits {
        self.actors.get(&piece).copied().unwrap_or_default()
    }

    /// Favor bits `piece` used this turn.
    #[must_use]
    pub fn assault_bits(&self, piece: PieceId) -> ActionBits {
        self.assaults.get(&piece).copied().unwrap_or_default()
    }

    /// Favor bits used by any piece this turn.
    #[must_use]
    pub fn assault_total(&self) -> ActionBits {
        self.assaults.values().fold(ActionBits::NONE, |acc, &bits| acc | bits)
    }

    /// Most recent regular action.
    #[must_use]
    pub const fn last_actor(&self) -> Option<(PieceId, ActionBits)> {
        self.last_actor
    }

    /// Most recent favor action.
    #[must_use]
    pub const fn last_assault(&self) -> Option<(PieceId, ActionBits)> {
        self.last_assault
    }

    /// True if no regular action happened yet.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.actors.is_empty()
    }

    /// Which rule spent the turn, or [`ActionBits::NONE`] if the side may keep acting.
    ///
    /// Checked in priority order: any attack or fire; then two moves or plain swaps across all
    /// actors; then any spawn. Mount swaps are free.
    #[must_use]
    pub fn actions_exhausted(&self) -> ActionBits {
        let all = self
            .actors
            .values()
            .fold(ActionBits::NONE, |acc, &bits| acc | bits);
        if all.intersects(ActionBits::ATTACK | ActionBits::FIRE) {
            return ActionBits::ATTACK | ActionBits::FIRE;
        }
        let steps: usize = self
            .actors
            .values()
            .map(|bits| {
                usize::from(bits.contains(ActionBits::MOVE))
                    + usize::from(bits.contains(ActionBits::SWAP))
            })
            .sum();
        if steps >= 2 {
            return ActionBits::MOVE | ActionBits::SWAP;
        }
        if all.contains(ActionBits::SPAWN) {
            return ActionBits::SPAWN;
        }
        ActionBits::NONE
    }
}
