// The zone geometry table: a static mapping from zone id to the rectangle of
// the frame that feeds the corresponding light unit. Loaded once per run from
// a JSON file keyed by string-encoded ids, optionally rescaled by a global
// factor when the analyzed frame is not at native capture resolution.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

/// Identifier of one light zone. Stable across runs, starting at 1.
pub type ZoneId = u32;

/// A zone's rectangle in frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ZoneRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ZoneRect {
    /// Whether the rectangle lies fully within a frame of the given size.
    pub fn fits_within(&self, frame_width: u32, frame_height: u32) -> bool {
        self.x as u64 + self.width as u64 <= frame_width as u64
            && self.y as u64 + self.height as u64 <= frame_height as u64
    }
}

/// The full id -> rectangle mapping, iterated in ascending id order.
#[derive(Debug, Clone, Default)]
pub struct ZoneTable {
    zones: BTreeMap<ZoneId, ZoneRect>,
}

impl ZoneTable {
    /// Loads the table from a JSON object of `{"<id>": {x, y, width, height}}`.
    /// A missing or malformed file yields an empty table (and so an empty run
    /// output), which is a diagnostic rather than an error.
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                log::warn!("zone table {} unavailable ({err}); no zones loaded", path.display());
                return Self::default();
            }
        };
        let raw: BTreeMap<String, ZoneRect> = match serde_json::from_str(&text) {
            Ok(raw) => raw,
            Err(err) => {
                log::warn!("zone table {} is malformed ({err}); no zones loaded", path.display());
                return Self::default();
            }
        };

        let mut zones = BTreeMap::new();
        for (key, rect) in raw {
            match key.parse::<ZoneId>() {
                Ok(id) => {
                    zones.insert(id, rect);
                }
                Err(_) => log::warn!("ignoring zone with non-numeric id {key:?}"),
            }
        }
        Self { zones }
    }

    pub fn from_rects(rects: impl IntoIterator<Item = (ZoneId, ZoneRect)>) -> Self {
        Self { zones: rects.into_iter().collect() }
    }

    /// A copy of the table with every rectangle scaled by a global factor.
    pub fn scaled(&self, factor: f64) -> Self {
        let zones = self
            .zones
            .iter()
            .map(|(&id, rect)| {
                (
                    id,
                    ZoneRect {
                        x: (rect.x as f64 * factor) as u32,
                        y: (rect.y as f64 * factor) as u32,
                        width: (rect.width as f64 * factor) as u32,
                        height: (rect.height as f64 * factor) as u32,
                    },
                )
            })
            .collect();
        Self { zones }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ZoneId, ZoneRect)> + '_ {
        self.zones.iter().map(|(&id, &rect)| (id, rect))
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_check_accepts_exact_fit_and_rejects_overflow() {
        let rect = ZoneRect { x: 10, y: 10, width: 30, height: 20 };
        assert!(rect.fits_within(40, 30));
        assert!(!rect.fits_within(39, 30));
        assert!(!rect.fits_within(40, 29));
    }

    #[test]
    fn scaling_truncates_toward_zero() {
        let table = ZoneTable::from_rects([(1, ZoneRect { x: 3, y: 5, width: 7, height: 9 })]);
        let scaled = table.scaled(0.5);
        let (_, rect) = scaled.iter().next().unwrap();
        assert_eq!(rect, ZoneRect { x: 1, y: 2, width: 3, height: 4 });
    }

    #[test]
    fn missing_file_yields_empty_table() {
        let table = ZoneTable::load(Path::new("/nonexistent/segments.json"));
        assert!(table.is_empty());
    }
}
