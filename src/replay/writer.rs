//! Append-only replay log writer.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::board::{Board, Side};
use crate::config::Config;
use crate::error::LogError;
use crate::replay::{ACTION_SECTION, CONFIG_SECTION, LogEntry};
use crate::turn::MatchOutcome;

/// Suffixes tried before giving up on a free log file name.
const MAX_NAME_SUFFIX: usize = 1000;

/// Writes a replay log, flushing after every entry.
#[derive(Debug)]
pub struct ReplayWriter {
    path: PathBuf,
    out: Option<BufWriter<File>>,
}

impl ReplayWriter {
    /// Create `dir` if needed and start `<dir>/<name>.log` with the preamble.
    ///
    /// Characters of the match name that are unsafe in a file name are replaced by `_`. An
    /// existing log is never overwritten; the name gets a `-1`, `-2`, ... suffix instead. If the
    /// preamble cannot be written the new file is removed again.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or the file cannot be created, or the preamble cannot
    /// be written.
    pub fn create(dir: &Path, config: &Config, board: &Board) -> Result<Self, LogError> {
        fs::create_dir_all(dir).map_err(|source| LogError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let (path, file) = create_unique(dir, &file_stem(&config.name))?;
        let mut out = BufWriter::new(file);
        let written = write_preamble(&mut out, config, board)
            .and_then(|()| out.flush().map_err(LogError::from));
        if let Err(e) = written {
            drop(out);
            fs::remove_file(&path).ok();
            return Err(e);
        }
        debug!(path = %path.display(), "replay log created");
        Ok(Self {
            path,
            out: Some(out),
        })
    }

    /// File being written.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the finish entry was written.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.out.is_none()
    }

    /// Append one entry. A [`LogEntry::Finish`] closes the log.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Closed`] after the log was finished, or an I/O error.
    pub fn append(&mut self, entry: &LogEntry) -> Result<(), LogError> {
        if let LogEntry::Finish(outcome) = entry {
            return self.finish(*outcome);
        }
        let out = self.out.as_mut().ok_or(LogError::Closed)?;
        writeln!(out, "{entry}")?;
        out.flush()?;
        Ok(())
    }

    /// Write the terminal entry and close the log.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Closed`] if the log was already finished, or an I/O error.
    pub fn finish(&mut self, outcome: MatchOutcome) -> Result<(), LogError> {
        let mut out = self.out.take().ok_or(LogError::Closed)?;
        writeln!(out, "{}", LogEntry::Finish(outcome))?;
        out.flush()?;
        debug!(path = %self.path.display(), "replay log closed");
        Ok(())
    }
}

fn write_preamble(out: &mut impl Write, config: &Config, board: &Board) -> Result<(), LogError> {
    writeln!(out, "{CONFIG_SECTION}")?;
    writeln!(out, "name={}", config.name.replace(['\n', '\r'], " "))?;
    writeln!(out, "width={}", config.width)?;
    writeln!(out, "height={}", config.height)?;
    writeln!(out, "battle_pass={}", config.battle_pass)?;
    writeln!(out, "options={}", config.options.bits())?;
    writeln!(out, "victory_points={}", config.victory_points)?;
    writeln!(out, "set_piece_battle={}", config.set_piece_battle)?;
    writeln!(out, "favor_limit={}", config.favor_limit)?;
    writeln!(out, "tile_amounts={}", join(&config.tile_amounts))?;
    writeln!(out, "middle_amounts={}", join(&config.middle_amounts))?;
    writeln!(out, "piece_amounts={}", join(&config.piece_amounts))?;
    writeln!(out, "win_throne={}", config.win_throne)?;
    writeln!(out, "win_fortress={}", config.win_fortress)?;
    writeln!(out, "capturers={}", config.capturers)?;
    for (index, tile) in board.tiles().iter().enumerate() {
        writeln!(out, "tile[{index}]={}", tile.tile_type.code())?;
    }
    for (side, key) in [(Side::Own, "piece_own"), (Side::Enemy, "piece_ene")] {
        for (index, piece) in board.pieces(side).iter().enumerate() {
            match piece.position {
                Some(at) => writeln!(out, "{key}[{index}]={at}")?,
                None => writeln!(out, "{key}[{index}]=-1")?,
            }
        }
    }
    writeln!(out, "{ACTION_SECTION}")?;
    Ok(())
}

/// Open a new file `<stem>.log` in `dir`, or the first free `<stem>-<n>.log`.
fn create_unique(dir: &Path, stem: &str) -> Result<(PathBuf, File), LogError> {
    let mut path = dir.join(format!("{stem}.log"));
    for suffix in 1..=MAX_NAME_SUFFIX {
        match File::create_new(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                path = dir.join(format!("{stem}-{suffix}.log"));
            }
            Err(source) => return Err(LogError::Create { path, source }),
        }
    }
    Err(LogError::Create {
        source: io::Error::new(io::ErrorKind::AlreadyExists, "no free log file name"),
        path,
    })
}

fn join(values: &[u16]) -> String {
    values.iter().map(u16::to_string).collect::<Vec<_>>().join(",")
}

/// File-name-safe form of a match name.
fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() { "match".to_string() } else { stem }
}
