//! Plain-text position checkpoint.
//!
//! Layout: the yaw and pitch positions (actuation seconds), one per line.
//! The older labelled layout (`pos_yaw = ` / value / `pos_pitch = ` / value)
//! is still accepted on load.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracker_traits::{PositionStore, SavedPosition};

use crate::error::TrackerError;

/// Replace `path` with `bytes` via a synced sibling temp file and rename, so
/// a crash mid-write never leaves a truncated checkpoint behind.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("new");
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(&tmp, path)
}

#[derive(Debug, Clone)]
pub struct FilePositionStore {
    path: PathBuf,
}

impl FilePositionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// First two lines that parse as finite floats, in (yaw, pitch) order.
pub fn parse_position(text: &str) -> Result<SavedPosition, TrackerError> {
    let mut values = text
        .lines()
        .filter_map(|l| l.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite());
    match (values.next(), values.next()) {
        (Some(yaw_s), Some(pitch_s)) => Ok(SavedPosition { yaw_s, pitch_s }),
        _ => Err(TrackerError::Store(
            "expected two numeric lines (yaw, pitch)".into(),
        )),
    }
}

pub fn format_position(pos: SavedPosition) -> String {
    format!("{}\n{}\n", pos.yaw_s, pos.pitch_s)
}

impl PositionStore for FilePositionStore {
    fn load(&mut self) -> Result<Option<SavedPosition>, Box<dyn std::error::Error + Send + Sync>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Box::new(TrackerError::Store(format!(
                    "read {}: {e}",
                    self.path.display()
                ))));
            }
        };
        let pos = parse_position(&text).map_err(|e| match e {
            TrackerError::Store(m) => TrackerError::Store(format!("{}: {m}", self.path.display())),
            other => other,
        })?;
        tracing::debug!(path = %self.path.display(), yaw_s = pos.yaw_s, pitch_s = pos.pitch_s, "position loaded");
        Ok(Some(pos))
    }

    fn save(
        &mut self,
        position: SavedPosition,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        write_atomic(&self.path, format_position(position).as_bytes()).map_err(|e| {
            TrackerError::Store(format!("write {}: {e}", self.path.display()))
        })?;
        tracing::debug!(path = %self.path.display(), "position saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FilePositionStore::new(dir.path().join("absent.txt"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_then_load_is_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("position_save.txt");
        let mut store = FilePositionStore::new(&path);
        let pos = SavedPosition {
            yaw_s: 6.21,
            pitch_s: -15.93,
        };
        store.save(pos).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "6.21\n-15.93\n");
        assert_eq!(store.load().unwrap(), Some(pos));
        assert!(!path.with_extension("new").exists());
    }

    #[test]
    fn labelled_layout_is_accepted() {
        let pos = parse_position("pos_yaw = \n3.5\npos_pitch = \n-1.25\n").unwrap();
        assert_eq!(
            pos,
            SavedPosition {
                yaw_s: 3.5,
                pitch_s: -1.25
            }
        );
    }

    #[test]
    fn single_value_is_a_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.txt");
        fs::write(&path, "1.0\n").unwrap();
        let err = FilePositionStore::new(&path).load().unwrap_err();
        let typed = err.downcast_ref::<TrackerError>().unwrap();
        assert!(matches!(typed, TrackerError::Store(_)));
    }

    #[test]
    fn nan_lines_are_skipped() {
        let pos = parse_position("NaN\n2\n3\n").unwrap();
        assert_eq!(pos.yaw_s, 2.0);
        assert_eq!(pos.pitch_s, 3.0);
    }
}
