//! Validate a Cutline playback script.

use std::path::PathBuf;

use crate::script::Script;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating script at: {}", path.display());

    let script =
        Script::load(&path).map_err(|e| anyhow::anyhow!("Failed to load script: {e}"))?;

    if let Some(name) = &script.name {
        println!("  Name: {name}");
    }
    println!("  Steps: {}", script.steps.len());
    println!("  Events: {}", script.event_count());
    println!("  Simulated time: {:.3}s", script.total_advance());

    if script.steps.is_empty() {
        println!("\nScript is valid but does nothing.");
    } else {
        println!("\nScript is valid.");
    }

    Ok(())
}
