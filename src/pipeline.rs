// THEORY:
// The `pipeline` module is the top-level API for one run of the engine. It
// wires the stages together in their fixed order: letterbox preprocessing,
// concurrent per-zone analysis and change detection, command encoding, and
// report assembly. All tunables arrive as one immutable `Settings` value
// constructed at the start of the run; nothing reads ambient state.
//
// The pipeline also owns the cross-run state contracts: the color store it
// was constructed with (updated in place by the change detector) and the
// preprocessed frame it retains as the next run's motion reference. The
// hosting process persists both through `persist_state` after the report is
// emitted.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::config::Settings;
use crate::core_modules::color;
use crate::core_modules::color_state::ColorState;
use crate::core_modules::command::{self, BrightnessPolicy};
use crate::core_modules::frame::{self, Frame, LETTERBOX_MARGIN};
use crate::core_modules::zones::{ZoneId, ZoneTable};
use crate::dispatch::{self, ZoneContext};
use crate::error::PipelineError;

/// Geometry is authored at native capture resolution; analysis currently
/// runs at the same scale.
const GEOMETRY_SCALE: f64 = 1.0;

/// One changed zone in the run's summary output.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SegmentSummary {
    pub segment: ZoneId,
    #[serde(rename = "dominantColor")]
    pub dominant_color: [u8; 3],
}

/// The structured output of one run. Both fields are always present, empty
/// when no zone changed.
#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub commands: BTreeMap<String, String>,
    pub segments: Vec<SegmentSummary>,
}

/// The engine for one invocation: analyze a frame, emit commands for zones
/// whose color moved, and carry the state forward.
pub struct ZonePipeline {
    settings: Arc<Settings>,
    zones: ZoneTable,
    state: Arc<Mutex<ColorState>>,
    prev_frame: Option<Arc<Frame>>,
}

impl ZonePipeline {
    pub fn new(
        settings: Settings,
        zones: ZoneTable,
        state: ColorState,
        prev_frame: Option<Frame>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            zones,
            state: Arc::new(Mutex::new(state)),
            prev_frame: prev_frame.map(Arc::new),
        }
    }

    /// Processes one captured frame into a report, retaining the preprocessed
    /// frame as the next run's motion reference.
    pub async fn process(&mut self, captured: Frame) -> FrameReport {
        let prepared = if self.settings.enable_letterbox_detection {
            frame::crop_letterbox(&captured, self.settings.threshold_value, LETTERBOX_MARGIN)
        } else {
            captured
        };

        let current = Arc::new(prepared);
        let ctx = ZoneContext {
            frame: current.clone(),
            prev_frame: self.prev_frame.clone(),
            settings: self.settings.clone(),
            state: self.state.clone(),
        };
        let readings = dispatch::analyze_all_zones(ctx, &self.zones.scaled(GEOMETRY_SCALE)).await;

        let brightness = BrightnessPolicy::from_settings(&self.settings);
        let mut report = FrameReport::default();
        for reading in readings {
            match command::encode(reading.zone, reading.color, brightness) {
                Ok(cmd) => {
                    report.commands.insert(command::device_key(reading.zone), cmd);
                    report.segments.push(SegmentSummary {
                        segment: reading.zone,
                        dominant_color: color::host_order(reading.color),
                    });
                }
                Err(err) => log::warn!("dropping zone {}: {err}", reading.zone),
            }
        }

        self.prev_frame = Some(current);
        report
    }

    /// Writes the color state and the previous-frame snapshot for the next
    /// invocation.
    pub fn persist_state(
        &self,
        color_path: &Path,
        snapshot_path: &Path,
    ) -> Result<(), PipelineError> {
        self.state.lock().unwrap().save(color_path)?;
        if let Some(frame) = &self.prev_frame {
            frame.save(snapshot_path)?;
        }
        Ok(())
    }

    /// The last committed color of a zone, if any.
    pub fn committed_color(&self, zone: ZoneId) -> Option<[u8; 3]> {
        self.state.lock().unwrap().get(zone)
    }
}
