use tracing::debug;

use crate::error::Result;
use crate::timer::{DurationOptions, SessionConfig};

/// Persistence for the last durations the user picked, in minutes.
pub trait DurationStore {
    fn load_meditate_minutes(&self) -> Result<Option<u64>>;
    fn load_rest_minutes(&self) -> Result<Option<u64>>;
    fn save_meditate_minutes(&mut self, minutes: u64) -> Result<()>;
    fn save_rest_minutes(&mut self, minutes: u64) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDurationStore {
    meditate: Option<u64>,
    rest: Option<u64>,
}

impl MemoryDurationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurationStore for MemoryDurationStore {
    fn load_meditate_minutes(&self) -> Result<Option<u64>> {
        Ok(self.meditate)
    }

    fn load_rest_minutes(&self) -> Result<Option<u64>> {
        Ok(self.rest)
    }

    fn save_meditate_minutes(&mut self, minutes: u64) -> Result<()> {
        self.meditate = Some(minutes);
        Ok(())
    }

    fn save_rest_minutes(&mut self, minutes: u64) -> Result<()> {
        self.rest = Some(minutes);
        Ok(())
    }
}

/// Session durations from the store.
///
/// A missing or unsupported stored value selects the first option.
///
/// # Errors
/// Propagates store read failures.
pub fn load_preferred_config<S: DurationStore + ?Sized>(
    store: &S,
    options: &DurationOptions,
) -> Result<SessionConfig> {
    let stored_meditate = store.load_meditate_minutes()?;
    let stored_rest = store.load_rest_minutes()?;
    let meditate = options.resolve_meditate(stored_meditate);
    let rest = options.resolve_rest(stored_rest);
    debug!(?stored_meditate, ?stored_rest, meditate, rest, "resolved preferred durations");
    Ok(SessionConfig::from_minutes(meditate, rest))
}

/// Persist a picker choice. Both values must be supported options.
///
/// # Errors
/// Returns a validation error for unsupported values (nothing is written),
/// or propagates store write failures.
pub fn save_durations<S: DurationStore + ?Sized>(
    store: &mut S,
    options: &DurationOptions,
    meditate_min: u64,
    rest_min: u64,
) -> Result<()> {
    options.check_meditate(meditate_min)?;
    options.check_rest(rest_min)?;
    store.save_meditate_minutes(meditate_min)?;
    store.save_rest_minutes(rest_min)?;
    Ok(())
}
