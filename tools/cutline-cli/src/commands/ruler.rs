//! Print the ruler and track geometry of a script's final timeline.

use std::path::PathBuf;

use cutline_common::config::AppConfig;
use cutline_playback::TimelineLayout;

use super::simulate::{Simulation, DEFAULT_TICK_SECS};
use crate::script::Script;

pub fn run(path: PathBuf, width: Option<f64>, config: &AppConfig) -> anyhow::Result<()> {
    let script =
        Script::load(&path).map_err(|e| anyhow::anyhow!("Failed to load script: {e}"))?;

    let mut simulation = Simulation::new(&config.playback, DEFAULT_TICK_SECS);
    simulation.run(&script);
    let sync = simulation.sync();

    let mut ruler = config.ruler.clone();
    if let Some(width) = width {
        anyhow::ensure!(width > 0.0, "width must be positive");
        ruler.viewport_width_px = width;
    }
    let layout = TimelineLayout::from_config(sync.total_duration(), &ruler);

    println!(
        "Timeline: {:.3}s at {:.2} px/s",
        layout.total_duration(),
        layout.pixels_per_second()
    );
    println!();

    println!("Ruler:");
    for tick in layout.ruler_ticks(ruler.tick_interval_secs) {
        println!("  {:>6}  x={:.1}", tick.label, tick.x);
    }
    println!();

    println!("Segments:");
    if sync.spans().is_empty() {
        println!("  (none)");
    }
    for rect in layout.segment_rects(sync.spans()) {
        let name = sync
            .engine()
            .segment(rect.id)
            .map(|s| s.name().to_string())
            .unwrap_or_default();
        let marker = if sync.selected() == Some(rect.id) {
            " *"
        } else {
            ""
        };
        println!(
            "  {} {}  x={:.1} width={:.1}{marker}",
            rect.id, name, rect.x, rect.width
        );
    }
    println!();

    println!(
        "Playhead: {:.3}s  x={:.1}",
        sync.current_time(),
        layout.x_for_time(sync.current_time())
    );
    Ok(())
}
