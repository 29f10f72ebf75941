//! Configuration balancing.
//!
//! Repairs arbitrary user-chosen totals into a configuration that can always be laid out and
//! won. The pass is total, deterministic and idempotent. Step order matters: tiles before the
//! fortress count is derived from them, pieces before win thresholds are clamped against them.

use tracing::{debug, warn};

use crate::board::{PieceType, TileType};
use crate::config::{
    Config, MAX_BATTLE_PASS, MAX_FAVORS, MAX_HEIGHT, MAX_NAME_LEN, MAX_SET_PIECE_BATTLE,
    MAX_VICTORY_POINTS, MAX_WIDTH, MIN_HEIGHT, MIN_WIDTH, Options,
};

impl Config {
    /// Return the balanced form of this configuration.
    ///
    /// After balancing:
    /// - the home tile amounts fit the home area,
    /// - each middle half fits `width / 2` slots (one row slot stays empty in
    ///   victory-points mode),
    /// - the pieces fit the home area,
    /// - at least one win condition is reachable unless victory-points mode is on.
    #[must_use]
    pub fn balance(mut self) -> Self {
        self.clamp_limits();
        self.balance_tiles();
        self.balance_middle();
        self.balance_pieces();
        if self.capturers == 0 {
            self.capturers = PieceType::ALL_MASK;
        }
        if !self.is_victory_points() {
            self.balance_win_conditions();
        }
        self
    }

    fn clamp_limits(&mut self) {
        if self.name.len() > MAX_NAME_LEN {
            let mut end = MAX_NAME_LEN;
            while !self.name.is_char_boundary(end) {
                end -= 1;
            }
            self.name.truncate(end);
        }
        self.width = self.width.clamp(MIN_WIDTH, MAX_WIDTH);
        self.height = self.height.clamp(MIN_HEIGHT, MAX_HEIGHT);
        self.battle_pass = self.battle_pass.min(MAX_BATTLE_PASS);
        self.options = Options::from_bits(self.options.bits());
        self.victory_points = self.victory_points.clamp(1, MAX_VICTORY_POINTS);
        self.set_piece_battle = self.set_piece_battle.min(MAX_SET_PIECE_BATTLE);
        self.favor_limit = self.favor_limit.min(MAX_FAVORS);
        self.capturers &= PieceType::ALL_MASK;

        let area = clamp_u16(self.home_area());
        for amount in self
            .tile_amounts
            .iter_mut()
            .chain(self.middle_amounts.iter_mut())
            .chain(self.piece_amounts.iter_mut())
        {
            *amount = (*amount).min(area);
        }
        self.win_throne = self.win_throne.min(area);
        self.win_fortress = self.win_fortress.min(area);
        if !self.has(Options::PORTS) {
            self.tile_amounts[port_bucket()] = 0;
        }
    }

    fn balance_tiles(&mut self) {
        let area = self.home_area();
        let height = clamp_u16(self.home_height());
        let row_balancing = self.has(Options::ROW_BALANCING);

        let mut floors = [0u16; TileType::PLACEABLE.len()];
        if row_balancing {
            for (amount, floor) in self.tile_amounts.iter_mut().zip(floors.iter_mut()) {
                if *amount > 0 {
                    *amount = (*amount).max(height);
                    *floor = height;
                }
            }
        }

        while !reduce_round_robin(&mut self.tile_amounts, &floors, area) {
            // Every present type sits on its row floor; drop the highest one entirely
            if let Some(last) = self.tile_amounts.iter().rposition(|&a| a > 0) {
                debug!(bucket = last, "dropping tile type to fit home area");
                self.tile_amounts[last] = 0;
                floors[last] = 0;
            }
        }

        if row_balancing {
            let max_open = (self.home_height() - 1) * self.home_width().saturating_sub(2);
            let mut present: Vec<usize> = (0..self.tile_amounts.len())
                .filter(|&i| self.tile_amounts[i] > 0)
                .collect();
            if present.is_empty() {
                present.push(plains_bucket());
            }
            let mut next = 0;
            while area - sum(&self.tile_amounts) > max_open {
                self.tile_amounts[present[next % present.len()]] += 1;
                next += 1;
            }
        }
    }

    fn balance_middle(&mut self) {
        let width = self.home_width();
        let half = width / 2;
        let vp = self.is_victory_points();
        // Victory-points mode keeps at least one empty slot in the middle row
        let capacity = if vp && width % 2 == 0 { half - 1 } else { half };

        let floors = [0u16; TileType::MIDDLE.len()];
        reduce_round_robin(&mut self.middle_amounts, &floors, capacity);

        if vp && self.has(Options::VP_EQUIDISTANT) {
            let used = sum(&self.middle_amounts);
            if (half - used) % 2 == 1 {
                if let Some(last) = self.middle_amounts.iter().rposition(|&a| a > 0) {
                    self.middle_amounts[last] -= 1;
                } else if used < capacity {
                    self.middle_amounts[0] += 1;
                } else {
                    warn!(
                        width,
                        "middle strip cannot be centered with victory points on this width"
                    );
                }
            }
        }
    }

    fn balance_pieces(&mut self) {
        let area = self.home_area();
        let floors = [0u16; PieceType::ALL.len()];
        reduce_round_robin(&mut self.piece_amounts, &floors, area);
        if sum(&self.piece_amounts) == 0 {
            self.piece_amounts[PieceType::Throne as usize] = 1;
        }
    }

    fn balance_win_conditions(&mut self) {
        let thrones = self.piece_amount(PieceType::Throne);
        self.win_throne = self.win_throne.min(thrones);

        let fortress_slots = self
            .tile_amount(TileType::Fortress)
            .saturating_add(self.middle_amount(TileType::Fortress).saturating_mul(2));
        let capturers: u16 = PieceType::ALL
            .iter()
            .filter(|&&t| self.can_capture_fortress(t))
            .map(|&t| self.piece_amount(t))
            .sum();
        self.win_fortress = self.win_fortress.min(fortress_slots.min(capturers));

        if self.win_throne == 0 && self.win_fortress == 0 {
            self.win_throne = 1;
            if thrones == 0 {
                if self.piece_total() >= self.home_area() {
                    if let Some(last) = self.piece_amounts.iter().rposition(|&a| a > 0) {
                        self.piece_amounts[last] -= 1;
                    }
                }
                self.piece_amounts[PieceType::Throne as usize] += 1;
                debug!("no win condition left; added a throne piece");
            }
        }

        if self.set_piece_battle > 0 {
            self.set_piece_battle = self
                .set_piece_battle
                .max(self.win_throne)
                .max(self.win_fortress);
        }
    }
}

/// Take one unit at a time from the highest bucket above its floor, walking downward and
/// wrapping, until the total is at most `limit`. Returns `false` if every bucket hit its floor
/// first.
fn reduce_round_robin(amounts: &mut [u16], floors: &[u16], limit: usize) -> bool {
    let len = amounts.len();
    let mut cursor = len;
    while sum(amounts) > limit {
        let next = (1..=len)
            .map(|offset| (cursor + len - offset) % len)
            .find(|&i| amounts[i] > floors[i]);
        match next {
            Some(i) => {
                amounts[i] -= 1;
                cursor = i;
            }
            None => return false,
        }
    }
    true
}

fn sum(amounts: &[u16]) -> usize {
    amounts.iter().map(|&a| usize::from(a)).sum()
}

fn clamp_u16(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

fn port_bucket() -> usize {
    TileType::PLACEABLE.len() - 1
}

fn plains_bucket() -> usize {
    TileType::PLACEABLE
        .iter()
        .position(|&t| t == TileType::Plains)
        .unwrap_or(0)
}
