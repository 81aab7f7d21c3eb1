//! Checkpoint inspection for sync-state tooling.

use clap::Subcommand;
use glucosync_core::storage::data_dir;
use glucosync_core::CheckpointStore;

#[derive(Subcommand)]
pub enum CheckpointAction {
    /// Print the current checkpoint
    Show,
    /// Remove the checkpoint, forcing the next sync to a full fetch
    Clear,
}

pub fn run(action: CheckpointAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = CheckpointStore::new(&data_dir()?);
    match action {
        CheckpointAction::Show => match store.load() {
            Some(checkpoint) => {
                println!("{}", serde_json::to_string_pretty(&checkpoint)?);
            }
            None => println!("no checkpoint (next sync will be a full fetch)"),
        },
        CheckpointAction::Clear => {
            store.clear()?;
            println!("checkpoint cleared");
        }
    }
    Ok(())
}
