use chrono::Local;
use clap::Subcommand;
use meditation_core::Database;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Totals, today's sessions and active days this week
    Summary,
    /// Most recent completed sessions
    Recent {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        StatsAction::Summary => {
            let stats = db.stats(Local::now())?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Recent { limit } => {
            let sessions = db.recent_sessions(limit)?;
            println!("{}", serde_json::to_string_pretty(&sessions)?);
        }
    }
    Ok(())
}
