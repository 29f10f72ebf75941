//! Fixed-order byte layout of a configuration.
//!
//! Layout (all multi-byte integers little-endian):
//! - 1 byte: name length, then the name bytes
//! - 1 byte each: home width, home height, battle-pass threshold
//! - 2 bytes each: options, victory points, set-piece battle, favor limit
//! - 2 bytes per bucket: tile amounts, middle amounts, piece amounts
//! - 2 bytes each: throne win, fortress win, capturer mask

use crate::config::{Config, MAX_NAME_LEN, Options};
use crate::error::WireError;

impl Config {
    /// Encode into the wire layout.
    ///
    /// Names longer than 255 bytes are cut at a character boundary.
    #[must_use]
    pub fn to_wire(&self) -> Vec<u8> {
        let mut end = self.name.len().min(MAX_NAME_LEN);
        while !self.name.is_char_boundary(end) {
            end -= 1;
        }
        let name = &self.name.as_bytes()[..end];

        let mut out = Vec::with_capacity(1 + name.len() + 3 + 2 * (4 + 3 + 19));
        #[allow(clippy::cast_possible_truncation)]
        out.push(name.len() as u8);
        out.extend_from_slice(name);
        out.push(self.width);
        out.push(self.height);
        out.push(self.battle_pass);
        for value in [
            self.options.bits(),
            self.victory_points,
            self.set_piece_battle,
            self.favor_limit,
        ] {
            out.extend_from_slice(&value.to_le_bytes());
        }
        for value in self
            .tile_amounts
            .iter()
            .chain(&self.middle_amounts)
            .chain(&self.piece_amounts)
        {
            out.extend_from_slice(&value.to_le_bytes());
        }
        for value in [self.win_throne, self.win_fortress, self.capturers] {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out
    }

    /// Decode from the wire layout. Trailing bytes are ignored.
    ///
    /// The result is returned as read; run [`Config::balance`] before using it.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Truncated`] if the buffer ends inside a field.
    pub fn from_wire(bytes: &[u8]) -> Result<Self, WireError> {
        let mut reader = WireReader { bytes, offset: 0 };

        let name_len = usize::from(reader.u8()?);
        let name = String::from_utf8_lossy(reader.take(name_len)?).into_owned();
        let width = reader.u8()?;
        let height = reader.u8()?;
        let battle_pass = reader.u8()?;
        let options = Options::from_bits(reader.u16()?);
        let victory_points = reader.u16()?;
        let set_piece_battle = reader.u16()?;
        let favor_limit = reader.u16()?;

        let mut config = Config {
            name,
            width,
            height,
            battle_pass,
            options,
            victory_points,
            set_piece_battle,
            favor_limit,
            ..Config::default()
        };
        for amount in &mut config.tile_amounts {
            *amount = reader.u16()?;
        }
        for amount in &mut config.middle_amounts {
            *amount = reader.u16()?;
        }
        for amount in &mut config.piece_amounts {
            *amount = reader.u16()?;
        }
        config.win_throne = reader.u16()?;
        config.win_fortress = reader.u16()?;
        config.capturers = reader.u16()?;
        Ok(config)
    }
}

struct WireReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> WireReader<'a> {
    fn take(&mut self, needed: usize) -> Result<&'a [u8], WireError> {
        let end = self.offset + needed;
        let slice = self.bytes.get(self.offset..end).ok_or(WireError::Truncated {
            offset: self.offset,
            needed,
        })?;
        self.offset = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, WireError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, WireError> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }
}
