pub mod config;
pub mod prefs;
pub mod run;
pub mod simulate;
pub mod stats;

use meditation_core::Event;

/// Print events as JSON lines on stdout.
pub fn emit(events: &[Event]) -> Result<(), serde_json::Error> {
    for event in events {
        tracing::debug!(event = event.name(), "session event");
        println!("{}", serde_json::to_string(event)?);
    }
    Ok(())
}
