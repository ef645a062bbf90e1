//! Saving and restoring the warper's corners and active flag
//!
//! The persisted form is a named group inside a TOML document:
//!
//! ```toml
//! [corners]
//! active = true
//!
//! [[corners.corner]]
//! x = 0.0
//! y = 0.0
//! # ... four corner entries in top-left, top-right, bottom-right,
//! # bottom-left order
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use toml::{Table, Value};

use crate::error::WarpError;
use crate::geometry::Point;
use crate::host::HostPort;
use crate::warper::Warper;

/// Group name used when none is given
pub const DEFAULT_GROUP: &str = "corners";

/// The externally visible state of a warper
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub corners: [Point; 4],
    pub active: bool,
}

/// On-disk layout of a warper group
#[derive(Debug, Deserialize)]
struct WarperRecord {
    #[serde(default)]
    corner: Vec<Point>,
    #[serde(default)]
    active: bool,
}

impl StateSnapshot {
    /// Read the named group from a document
    ///
    /// Entries past the fourth corner are ignored. NaN or infinite
    /// coordinates make the record malformed.
    pub fn from_document(doc: &Table, group: &str) -> Result<Self, WarpError> {
        let value = doc
            .get(group)
            .ok_or_else(|| WarpError::MissingGroup(group.to_string()))?;

        let record: WarperRecord = value
            .clone()
            .try_into()
            .map_err(|e: toml::de::Error| WarpError::MalformedRecord(e.to_string()))?;

        if record.corner.len() < 4 {
            return Err(WarpError::TooFewCorners(record.corner.len()));
        }

        let mut corners = [Point::ZERO; 4];
        corners.copy_from_slice(&record.corner[..4]);
        if let Some(p) = corners.iter().find(|p| !p.is_finite()) {
            return Err(WarpError::MalformedRecord(format!(
                "non-finite corner {}",
                p
            )));
        }
        Ok(Self {
            corners,
            active: record.active,
        })
    }

    /// Replace the named group in a document with this snapshot
    pub fn write_to_document(&self, doc: &mut Table, group: &str) {
        let corner = self
            .corners
            .iter()
            .map(|p| {
                let mut entry = Table::new();
                entry.insert("x".to_string(), Value::Float(p.x));
                entry.insert("y".to_string(), Value::Float(p.y));
                Value::Table(entry)
            })
            .collect();

        let mut table = Table::new();
        table.insert("corner".to_string(), Value::Array(corner));
        table.insert("active".to_string(), Value::Boolean(self.active));

        doc.insert(group.to_string(), Value::Table(table));
    }
}

impl<H: HostPort> Warper<H> {
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            corners: *self.corners().points(),
            active: self.is_active(),
        }
    }

    /// Apply all four corners with one recomputation, then the active flag
    pub fn restore(&mut self, snapshot: &StateSnapshot) {
        self.set_all_corners(snapshot.corners);
        self.activate(snapshot.active);
    }

    pub fn save_to_table(&self, doc: &mut Table, group: &str) {
        self.snapshot().write_to_document(doc, group);
    }

    /// Restore from a named group, leaving the warper untouched on bad input
    pub fn load_from_table(&mut self, doc: &Table, group: &str) -> Result<(), WarpError> {
        match StateSnapshot::from_document(doc, group) {
            Ok(snapshot) => {
                self.restore(&snapshot);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Incorrect warper formatting: {}", e);
                Err(e)
            }
        }
    }

    /// Save to a TOML file under the default group
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut doc = Table::new();
        self.save_to_table(&mut doc, DEFAULT_GROUP);

        let content = toml::to_string_pretty(&doc).context("Failed to serialize warper")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write warper to {:?}", path))?;

        tracing::info!("Saved warper to {:?}", path);
        Ok(())
    }

    /// Load from a TOML file written by [`Warper::save`]
    pub fn load(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read warper from {:?}", path))?;
        let doc: Table = toml::from_str(&content)
            .with_context(|| format!("Failed to parse warper from {:?}", path))?;

        self.load_from_table(&doc, DEFAULT_GROUP)
            .with_context(|| format!("Failed to load warper from {:?}", path))?;

        tracing::info!("Loaded warper from {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Corner, Rect};
    use crate::host::{HeadlessHost, InputChannel};

    fn warper() -> Warper<HeadlessHost> {
        Warper::with_rect(HeadlessHost::new(0.0, 0.0), Rect::from_size(100.0, 100.0))
    }

    fn quad() -> [Point; 4] {
        [
            Point::new(3.0, 4.0),
            Point::new(97.0, -2.0),
            Point::new(105.0, 99.0),
            Point::new(-1.0, 92.0),
        ]
    }

    #[test]
    fn test_save_and_load_table() {
        let mut src = warper();
        src.set_all_corners(quad());
        src.activate(true);

        let mut doc = Table::new();
        src.save_to_table(&mut doc, "screen");

        let mut dst = warper();
        dst.load_from_table(&doc, "screen").unwrap();
        assert_eq!(dst.corners().points(), &quad());
        assert!(dst.is_active());
        assert!(dst.host().is_subscribed(InputChannel::Pointer));
        assert_eq!(dst.matrix(), src.matrix());
    }

    #[test]
    fn test_document_layout() {
        let snapshot = StateSnapshot {
            corners: quad(),
            active: false,
        };
        let mut doc = Table::new();
        snapshot.write_to_document(&mut doc, DEFAULT_GROUP);

        let text = toml::to_string(&doc).unwrap();
        let parsed: Table = toml::from_str(&text).unwrap();
        let group = parsed["corners"].as_table().unwrap();
        assert_eq!(group["corner"].as_array().unwrap().len(), 4);
        assert_eq!(group["active"].as_bool(), Some(false));
        assert_eq!(group["corner"][1]["x"].as_float(), Some(97.0));
    }

    #[test]
    fn test_missing_group_leaves_state() {
        let mut w = warper();
        w.set_corner(Corner::TopLeft, Point::new(7.0, 7.0));
        let before = w.snapshot();

        let doc: Table = toml::from_str("[other]\nactive = true").unwrap();
        assert_eq!(
            w.load_from_table(&doc, DEFAULT_GROUP),
            Err(WarpError::MissingGroup("corners".to_string()))
        );
        assert_eq!(w.snapshot(), before);
    }

    #[test]
    fn test_too_few_corners_leaves_state() {
        let mut w = warper();
        let before = w.snapshot();
        let matrix = w.matrix();

        let doc: Table = toml::from_str(
            r#"
            [corners]
            active = true
            corner = [{ x = 1, y = 2 }, { x = 3, y = 4 }, { x = 5, y = 6 }]
            "#,
        )
        .unwrap();
        assert_eq!(
            w.load_from_table(&doc, DEFAULT_GROUP),
            Err(WarpError::TooFewCorners(3))
        );
        assert_eq!(w.snapshot(), before);
        assert_eq!(w.matrix(), matrix);
        assert!(!w.is_active());
    }

    #[test]
    fn test_malformed_group() {
        let mut w = warper();
        let doc: Table = toml::from_str("corners = 5").unwrap();
        assert!(matches!(
            w.load_from_table(&doc, DEFAULT_GROUP),
            Err(WarpError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_non_finite_corners_leave_state() {
        let mut w = warper();
        w.set_corner(Corner::TopLeft, Point::new(7.0, 7.0));
        let before = w.snapshot();
        let matrix = w.matrix();

        let doc: Table = toml::from_str(
            r#"
            [corners]
            active = true
            corner = [
                { x = nan, y = 0 },
                { x = 100, y = 0 },
                { x = 100, y = 100 },
                { x = 0, y = inf },
            ]
            "#,
        )
        .unwrap();
        assert!(matches!(
            w.load_from_table(&doc, DEFAULT_GROUP),
            Err(WarpError::MalformedRecord(_))
        ));
        assert_eq!(w.snapshot(), before);
        assert_eq!(w.matrix(), matrix);
        assert!(!w.is_active());
        assert!(!w.is_degenerate());
    }

    #[test]
    fn test_extra_corners_ignored() {
        let mut w = warper();
        let doc: Table = toml::from_str(
            r#"
            [corners]
            corner = [
                { x = 0, y = 0 },
                { x = 50, y = 0 },
                { x = 50, y = 50 },
                { x = 0, y = 50 },
                { x = 999, y = 999 },
            ]
            "#,
        )
        .unwrap();
        w.load_from_table(&doc, DEFAULT_GROUP).unwrap();
        assert_eq!(w.corner(Corner::BottomRight), Point::new(50.0, 50.0));
        // Missing active entry reads as inactive
        assert!(!w.is_active());
        let p = w.to_warped_space(Point::new(100.0, 100.0)).unwrap();
        assert!((p.x - 50.0).abs() < 1e-9 && (p.y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!("quadwarp-test-{}.toml", std::process::id()));

        let mut src = warper();
        src.set_all_corners(quad());
        src.save(&path).unwrap();

        let mut dst = warper();
        dst.load(&path).unwrap();
        assert_eq!(dst.snapshot(), src.snapshot());

        std::fs::remove_file(&path).ok();
        assert!(dst.load(&path).is_err());
    }
}
