use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CueKind {
    /// Short bell, used at the phase boundary and by the completion alert.
    Short,
}

/// Sound output.
///
/// Calls are fire-and-forget. An implementation that fails to play (missing
/// asset, no audio device) handles it itself; nothing is reported back.
pub trait CueSink {
    fn play_cue(&mut self, kind: CueKind);
    fn stop_all_cues(&mut self);
}

impl<S: CueSink + ?Sized> CueSink for Box<S> {
    fn play_cue(&mut self, kind: CueKind) {
        (**self).play_cue(kind);
    }

    fn stop_all_cues(&mut self) {
        (**self).stop_all_cues();
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SilentCueSink;

impl CueSink for SilentCueSink {
    fn play_cue(&mut self, _kind: CueKind) {}

    fn stop_all_cues(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cue", rename_all = "snake_case")]
pub enum CueRecord {
    Played { kind: CueKind },
    StoppedAll,
}

/// Remembers every call, in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingCueSink {
    records: Vec<CueRecord>,
}

impl RecordingCueSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[CueRecord] {
        &self.records
    }

    pub fn played(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r, CueRecord::Played { .. }))
            .count()
    }
}

impl CueSink for RecordingCueSink {
    fn play_cue(&mut self, kind: CueKind) {
        self.records.push(CueRecord::Played { kind });
    }

    fn stop_all_cues(&mut self) {
        self.records.push(CueRecord::StoppedAll);
    }
}
