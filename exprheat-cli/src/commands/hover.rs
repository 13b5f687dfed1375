//! Hover command implementation - resolve a canvas point to its cell and tooltip

use anyhow::Result;
use exprheat_render::{PointerEvent, PointerTarget};
use serde_json::json;
use std::time::Instant;

use super::{build_view, ViewArgs};
use crate::config::Config;

pub const NO_CELL: &str = "no cell";

/// Tooltip lines for a canvas-relative point, or `None` when it misses the grid
pub fn probe(config: &Config, args: &ViewArgs, x: f64, y: f64) -> Result<Option<Vec<String>>> {
    let mut view = build_view(config, args)?;
    view.handle_pointer(
        PointerEvent::Move { target: PointerTarget::Canvas, x, y },
        Instant::now(),
    );
    let lines = match view.tooltip() {
        Some(t) => {
            log::debug!(
                "({:.1}, {:.1}) -> row {}, column {}",
                x,
                y,
                t.cell.gene_row,
                t.cell.sample_column
            );
            Some(t.lines.clone())
        }
        None => {
            log::debug!("({:.1}, {:.1}) misses the grid", x, y);
            None
        }
    };
    Ok(lines)
}

pub fn execute(config: &Config, args: &ViewArgs, x: f64, y: f64, as_json: bool) -> Result<()> {
    let lines = probe(config, args, x, y)?;
    if as_json {
        println!("{}", json!({ "x": x, "y": y, "lines": lines }));
        return Ok(());
    }
    match lines {
        Some(lines) => {
            for line in lines {
                println!("{}", line);
            }
        }
        None => println!("{}", NO_CELL),
    }
    Ok(())
}
