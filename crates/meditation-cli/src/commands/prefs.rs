use clap::Subcommand;
use meditation_core::ports::{load_preferred_config, save_durations};
use meditation_core::{Config, Database, DurationStore};
use serde_json::json;

#[derive(Subcommand)]
pub enum PrefsAction {
    /// Show the stored durations and the session they select
    Show,
    /// Remember new durations (must be supported options)
    Set {
        /// Meditate minutes
        #[arg(long)]
        meditate: u64,
        /// Rest minutes
        #[arg(long)]
        rest: u64,
    },
    /// List the supported duration options
    Options,
}

pub fn run(action: PrefsAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let mut db = Database::open()?;

    match action {
        PrefsAction::Show => {
            let out = json!({
                "stored_meditate_minutes": db.load_meditate_minutes()?,
                "stored_rest_minutes": db.load_rest_minutes()?,
                "session": load_preferred_config(&db, &config.options)?,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        PrefsAction::Set { meditate, rest } => {
            save_durations(&mut db, &config.options, meditate, rest)?;
            println!("ok");
        }
        PrefsAction::Options => {
            println!("{}", serde_json::to_string_pretty(&config.options)?);
        }
    }
    Ok(())
}
