// Per-zone last-committed colors, carried between runs through a small
// line-oriented state file (`zone r g b`, one line per zone). The store is an
// explicit object threaded through the pipeline; it is the only shared
// mutable resource during dispatch and the change detector is its only
// writer.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use crate::core_modules::color::{self, Color3};
use crate::core_modules::zones::ZoneId;

/// Zone count used to seed the store when no state file exists yet.
pub const DEFAULT_ZONE_COUNT: u32 = 20;

/// Change-detection sensitivity: a zone is re-sent when the aggregate
/// channel distance exceeds `manhattan`, or any single channel moves more
/// than `component`. The dual test catches broad drift and single-channel
/// spikes that a summed metric would mask.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub component: i32,
    pub manhattan: f64,
}

/// The persisted map of zone id -> last-committed color (host order).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorState {
    colors: BTreeMap<ZoneId, [u8; 3]>,
}

impl ColorState {
    /// A store seeded with `count` zones, all black.
    pub fn with_default_zones(count: u32) -> Self {
        Self {
            colors: (1..=count).map(|id| (id, [0, 0, 0])).collect(),
        }
    }

    /// Loads the store from its state file. A missing file seeds the default
    /// zone set instead; unparsable lines are skipped.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(err) => {
                log::info!(
                    "color state {} unavailable ({err}); seeding {DEFAULT_ZONE_COUNT} zones",
                    path.display()
                );
                Self::with_default_zones(DEFAULT_ZONE_COUNT)
            }
        }
    }

    fn parse(text: &str) -> Self {
        let mut colors = BTreeMap::new();
        for line in text.lines() {
            let mut fields = line.split_whitespace();
            let parsed = (
                fields.next().and_then(|f| f.parse::<ZoneId>().ok()),
                fields.next().and_then(|f| f.parse::<u8>().ok()),
                fields.next().and_then(|f| f.parse::<u8>().ok()),
                fields.next().and_then(|f| f.parse::<u8>().ok()),
            );
            if let (Some(zone), Some(r), Some(g), Some(b)) = parsed {
                colors.insert(zone, [r, g, b]);
            } else if !line.trim().is_empty() {
                log::warn!("skipping malformed color state line {line:?}");
            }
        }
        Self { colors }
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for (zone, [r, g, b]) in &self.colors {
            out.push_str(&format!("{zone} {r} {g} {b}\n"));
        }
        out
    }

    /// Rewrites the state file in full, covering every known zone.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, self.render())
    }

    /// Whether a zone's new color differs enough from its last-committed
    /// color to be worth re-sending. A zone with no prior color is always
    /// significant.
    pub fn is_significant(&self, zone: ZoneId, new_color: Color3, thresholds: &Thresholds) -> bool {
        let Some(prev) = self.colors.get(&zone) else {
            return true;
        };
        let new = color::host_order(new_color);
        let red_diff = (prev[0] as i32 - new[0] as i32).abs();
        let green_diff = (prev[1] as i32 - new[1] as i32).abs();
        let blue_diff = (prev[2] as i32 - new[2] as i32).abs();
        let manhattan_diff = (red_diff + green_diff + blue_diff) as f64;

        manhattan_diff > thresholds.manhattan
            || red_diff > thresholds.component
            || green_diff > thresholds.component
            || blue_diff > thresholds.component
    }

    /// Records a zone's newly committed color.
    pub fn commit(&mut self, zone: ZoneId, new_color: Color3) {
        self.colors.insert(zone, color::host_order(new_color));
    }

    pub fn get(&self, zone: ZoneId) -> Option<[u8; 3]> {
        self.colors.get(&zone).copied()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULTS: Thresholds = Thresholds { component: 250, manhattan: 150.0 };

    #[test]
    fn a_color_is_never_significant_against_itself() {
        let mut state = ColorState::default();
        let color = Color3([40, 90, 210]);
        state.commit(7, color);
        assert!(!state.is_significant(7, color, &DEFAULTS));
    }

    #[test]
    fn unknown_zone_is_always_significant() {
        let state = ColorState::default();
        assert!(state.is_significant(3, Color3([0, 0, 0]), &DEFAULTS));
    }

    #[test]
    fn black_to_white_exceeds_the_aggregate_threshold() {
        let state = ColorState::with_default_zones(1);
        assert!(state.is_significant(1, Color3([255, 255, 255]), &DEFAULTS));
    }

    #[test]
    fn single_channel_spike_trips_the_component_threshold() {
        let mut state = ColorState::default();
        state.commit(1, Color3([100, 100, 100]));
        let spike = Color3([100, 100, 180]); // channel 2 (host red) jumps by 80
        let tight = Thresholds { component: 50, manhattan: 500.0 };
        assert!(state.is_significant(1, spike, &tight));
        // Same spike under the default per-channel cap stays sub-threshold.
        assert!(!state.is_significant(1, spike, &DEFAULTS));
    }

    #[test]
    fn small_drift_is_not_significant_under_defaults() {
        let mut state = ColorState::default();
        state.commit(4, Color3([10, 20, 30]));
        assert!(!state.is_significant(4, Color3([40, 40, 50]), &DEFAULTS));
    }

    #[test]
    fn state_file_round_trips() {
        let mut state = ColorState::with_default_zones(3);
        state.commit(2, Color3([1, 2, 3]));
        let reparsed = ColorState::parse(&state.render());
        assert_eq!(reparsed, state);
        assert_eq!(reparsed.get(2), Some([3, 2, 1]));
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let state = ColorState::parse("1 10 20 30\ngarbage\n2 1 2 3\n");
        assert_eq!(state.len(), 2);
        assert_eq!(state.get(1), Some([10, 20, 30]));
    }
}
