//! Replay log reader.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::board::{Board, TileType};
use crate::config::{Config, Options};
use crate::error::LogError;
use crate::replay::{ACTION_SECTION, CONFIG_SECTION, Cursor, LogEntry};

/// Keyed array indexes above this are treated as malformed.
const MAX_KEYED_INDEX: usize = 1 << 12;

/// A parsed replay log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayLog {
    /// Configuration the match was played with.
    pub config: Config,
    /// Starting terrain, one entry per board tile.
    pub tiles: Vec<TileType>,
    /// Starting positions of the own pieces, in local order.
    pub own: Vec<Option<usize>>,
    /// Starting positions of the enemy pieces, in local order.
    pub enemy: Vec<Option<usize>>,
    /// Recorded mutations.
    pub entries: Vec<LogEntry>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Config,
    Action,
    Unknown,
}

impl ReplayLog {
    /// Read and parse a log file.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Open`] if the file cannot be read and [`LogError::EmptyActions`] if
    /// it holds no parsable action.
    pub fn open(path: &Path) -> Result<Self, LogError> {
        let text = fs::read_to_string(path).map_err(|source| LogError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse log text.
    ///
    /// Keyed arrays grow as indexes appear and are then cut or padded to the size the
    /// configuration implies (empty tiles, pieces in reserve).
    ///
    /// # Errors
    ///
    /// Returns [`LogError::EmptyActions`] if the action section holds no parsable entry.
    pub fn parse(text: &str) -> Result<Self, LogError> {
        let mut config = Config::default();
        let mut tiles: Vec<TileType> = Vec::new();
        let mut own: Vec<Option<usize>> = Vec::new();
        let mut enemy: Vec<Option<usize>> = Vec::new();
        let mut entries = Vec::new();
        let mut section = Section::None;

        for (number, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('[') && line.ends_with(']') {
                section = match line {
                    CONFIG_SECTION => Section::Config,
                    ACTION_SECTION => Section::Action,
                    _ => Section::Unknown,
                };
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                debug!(line = number + 1, "skipping line without '='");
                continue;
            };
            let accepted = match section {
                Section::Config => {
                    parse_config_line(&mut config, &mut tiles, &mut own, &mut enemy, key, value)
                }
                Section::Action => match LogEntry::parse(key.trim(), value) {
                    Some(entry) => {
                        entries.push(entry);
                        true
                    }
                    None => false,
                },
                Section::None | Section::Unknown => false,
            };
            if !accepted {
                debug!(line = number + 1, key, "skipping unrecognized line");
            }
        }

        let config = config.balance();
        tiles.resize(config.board_size().len(), TileType::Empty);
        own.resize(config.piece_total(), None);
        enemy.resize(config.piece_total(), None);

        let board = Board::from_preamble(&config, &tiles, &own, &enemy);
        entries.retain(|entry| {
            let fits = board.fits(entry);
            if !fits {
                debug!(%entry, "skipping entry outside the board");
            }
            fits
        });
        if entries.is_empty() {
            return Err(LogError::EmptyActions);
        }
        Ok(Self {
            config,
            tiles,
            own,
            enemy,
            entries,
        })
    }

    /// Board at the start of the match.
    #[must_use]
    pub fn initial_board(&self) -> Board {
        Board::from_preamble(&self.config, &self.tiles, &self.own, &self.enemy)
    }

    /// Cursor positioned before the first entry.
    #[must_use]
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.initial_board(), self.entries.clone())
    }
}

fn parse_config_line(
    config: &mut Config,
    tiles: &mut Vec<TileType>,
    own: &mut Vec<Option<usize>>,
    enemy: &mut Vec<Option<usize>>,
    key: &str,
    value: &str,
) -> bool {
    let key = key.trim();
    if key == "name" {
        config.name = value.to_string();
        return true;
    }
    let value = value.trim();
    if let Some((array, index)) = keyed(key) {
        return match array {
            "tile" => {
                let Some(tile_type) = value.parse().ok().and_then(TileType::from_code) else {
                    return false;
                };
                set_grown(tiles, index, tile_type);
                true
            }
            "piece_own" | "piece_ene" => {
                let Ok(position) = value.parse::<i64>() else {
                    return false;
                };
                let target = if array == "piece_own" { own } else { enemy };
                set_grown(target, index, usize::try_from(position).ok());
                true
            }
            _ => false,
        };
    }
    match key {
        "width" => set_scalar(&mut config.width, value),
        "height" => set_scalar(&mut config.height, value),
        "battle_pass" => set_scalar(&mut config.battle_pass, value),
        "options" => value
            .parse()
            .map(|bits| config.options = Options::from_bits(bits))
            .is_ok(),
        "victory_points" => set_scalar(&mut config.victory_points, value),
        "set_piece_battle" => set_scalar(&mut config.set_piece_battle, value),
        "favor_limit" => set_scalar(&mut config.favor_limit, value),
        "tile_amounts" => set_list(&mut config.tile_amounts, value),
        "middle_amounts" => set_list(&mut config.middle_amounts, value),
        "piece_amounts" => set_list(&mut config.piece_amounts, value),
        "win_throne" => set_scalar(&mut config.win_throne, value),
        "win_fortress" => set_scalar(&mut config.win_fortress, value),
        "capturers" => set_scalar(&mut config.capturers, value),
        _ => false,
    }
}

/// Split `key[index]` into its parts.
fn keyed(key: &str) -> Option<(&str, usize)> {
    let (array, rest) = key.split_once('[')?;
    let index: usize = rest.strip_suffix(']')?.parse().ok()?;
    (index < MAX_KEYED_INDEX).then_some((array, index))
}

fn set_grown<T: Clone + Default>(values: &mut Vec<T>, index: usize, value: T) {
    if values.len() <= index {
        values.resize(index + 1, T::default());
    }
    values[index] = value;
}

fn set_scalar<T: std::str::FromStr>(field: &mut T, value: &str) -> bool {
    match value.parse() {
        Ok(parsed) => {
            *field = parsed;
            true
        }
        Err(_) => false,
    }
}

/// Fill an amount table from a comma-separated list. Missing trailing values keep their
/// current amount; extra values are ignored.
fn set_list(field: &mut [u16], value: &str) -> bool {
    let parsed: Result<Vec<u16>, _> = value.split(',').map(|v| v.trim().parse()).collect();
    let Ok(parsed) = parsed else {
        return false;
    };
    for (slot, amount) in field.iter_mut().zip(parsed) {
        *slot = amount;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL_LOG: &str = "\
[Config]
name=Tiny
width=5
height=2
tile_amounts=1,0,0,0,0,0
middle_amounts=0,0,0,0,0
piece_amounts=1,1,0,0,0,0,0,0
tile[3]=1
piece_own[0]=3
piece_own[1]=0
piece_ene[1]=-1
[Notes]
anything=goes
[Action]
piece=1,0,1
garbage line
piece=1,2
finish=draw
";

    #[test]
    fn test_parse_small_log() {
        let log = ReplayLog::parse(SMALL_LOG).unwrap();
        assert_eq!(log.config.name, "Tiny");
        assert_eq!(log.config.width, 5);
        assert_eq!(log.tiles.len(), 5 * 5);
        assert_eq!(log.tiles[3], TileType::Fortress);
        assert_eq!(log.tiles[0], TileType::Empty);
        assert_eq!(log.own, vec![Some(3), Some(0)]);
        assert_eq!(log.enemy, vec![None, None]);
        assert_eq!(log.entries.len(), 2);
    }

    #[test]
    fn test_oversized_arrays_are_cut() {
        let text = SMALL_LOG.replace("piece_ene[1]=-1", "piece_ene[9]=4\ntile[30]=2");
        let log = ReplayLog::parse(&text).unwrap();
        assert_eq!(log.enemy.len(), 2);
        assert_eq!(log.tiles.len(), 25);
    }

    #[test]
    fn test_empty_actions_is_fatal() {
        let text = "[Config]\nname=x\n[Action]\nnonsense\n";
        assert!(matches!(ReplayLog::parse(text), Err(LogError::EmptyActions)));
        assert!(matches!(ReplayLog::parse(""), Err(LogError::EmptyActions)));
    }

    #[test]
    fn test_actions_outside_section_ignored() {
        let text = "piece=1,0,1\n[Action]\nfinish=draw\n";
        let log = ReplayLog::parse(text).unwrap();
        assert_eq!(log.entries, vec![LogEntry::Finish(crate::turn::MatchOutcome::Draw)]);
    }

    #[test]
    fn test_huge_index_skipped() {
        let text = SMALL_LOG.replace("tile[3]=1", "tile[99999999]=1");
        let log = ReplayLog::parse(&text).unwrap();
        assert_eq!(log.tiles.len(), 25);
        assert!(log.tiles.iter().all(|&t| t == TileType::Empty));
    }

    #[test]
    fn test_entries_outside_board_skipped() {
        let text = "[Config]\nwidth=5\nheight=2\ntile[0]=3\n[Action]\n\
                    piece=0,0,99999\ntop=0,-1,99999\ntile=4000,0,1\nfinish=draw\n";
        let log = ReplayLog::parse(text).unwrap();
        assert_eq!(log.entries, vec![LogEntry::Finish(crate::turn::MatchOutcome::Draw)]);

        let mut cursor = log.cursor();
        assert!(cursor.next().is_some());
        assert!(cursor.next().is_none());
    }

    #[test]
    fn test_only_out_of_range_entries_is_fatal() {
        let text = "[Config]\nwidth=5\nheight=2\n[Action]\npiece=0,0,99999\n";
        assert!(matches!(ReplayLog::parse(text), Err(LogError::EmptyActions)));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ReplayLog::open(&dir.path().join("missing.log")).unwrap_err();
        assert!(matches!(err, LogError::Open { .. }));
    }

    #[test]
    fn test_initial_board_from_preamble() {
        let log = ReplayLog::parse(SMALL_LOG).unwrap();
        let board = log.initial_board();
        assert_eq!(board.occupant(3), Some(0));
        assert_eq!(board.piece(0).last_fortress, Some(3));
    }
}
