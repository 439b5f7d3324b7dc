//! Rebalance the persisted goal list after manual edits.
//!
//! Usage: cargo run --bin rebalance_goals [-- --dry-run]

use alertdeck::config::Config;
use alertdeck::goals::GoalSettings;
use alertdeck::store::JsonStore;

fn main() -> anyhow::Result<()> {
    let dry_run = std::env::args().any(|a| a == "--dry-run");

    let config = Config::load()?;
    let store: JsonStore<GoalSettings> = JsonStore::new(config.goals_path());

    let Some(mut settings) = store.try_load()? else {
        println!("No goal list at {}", store.path().display());
        return Ok(());
    };
    settings.rebalance();

    println!("=== Goals ({}) ===", settings.goals.len());
    for (i, goal) in settings.goals.iter().enumerate() {
        let marker = if goal.active { "*" } else { " " };
        let reset = if goal.reset_on_complete { " [resets]" } else { "" };
        println!(
            " {marker}{:>2}. {:<30} {:>10.2} / {:<10.2} ({:>5.1}%){reset}",
            i + 1,
            goal.title,
            goal.current,
            goal.target,
            goal.percent()
        );
    }

    if dry_run {
        println!("\nDry run; {} left unchanged", store.path().display());
    } else {
        store.save(&settings)?;
        println!("\nSaved {}", store.path().display());
    }
    Ok(())
}
