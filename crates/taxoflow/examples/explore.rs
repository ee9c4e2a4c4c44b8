//! Loads every configured dataset from a directory and prints a layout
//! summary of each diagram.
//!
//! ```text
//! cargo run --example explore -- <data-dir> [config.toml]
//! ```

use std::{env, process};

use futures::executor::block_on;
use log::error;

use taxoflow::{Explorer, config, layout::LayoutOutcome, loader::FileFetcher};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = env::args().skip(1);
    let Some(data_dir) = args.next() else {
        eprintln!("usage: explore <data-dir> [config.toml]");
        process::exit(2);
    };

    let app_config = match config::load_config(args.next()) {
        Ok(app_config) => app_config,
        Err(err) => {
            error!(err:% = err; "Failed to load configuration");
            process::exit(1);
        }
    };

    let explorer = Explorer::new(app_config, FileFetcher::new(data_dir));
    explorer.register_overview();

    let diagram_ids: Vec<String> = explorer.config().diagrams.keys().cloned().collect();
    for diagram_id in &diagram_ids {
        if let Err(err) = block_on(explorer.open(diagram_id)) {
            error!(diagram_id = diagram_id.as_str(), err:% = err; "Skipping diagram");
            continue;
        }
        explorer.toggle_all(diagram_id, false);
    }

    let mut ids = vec![explorer.config().overview.diagram_id.clone()];
    ids.extend(diagram_ids);
    for id in &ids {
        let Some(result) = block_on(explorer.layout(id, Some(1280.0), false)) else {
            continue;
        };
        let (width, height) = result.nodes.iter().fold((0.0f32, 0.0f32), |(w, h), node| {
            (
                w.max(node.position.x() + node.style.width.unwrap_or_default()),
                h.max(node.position.y() + node.style.height.unwrap_or_default()),
            )
        });
        let outcome = match &result.outcome {
            LayoutOutcome::Computed => "computed".to_string(),
            LayoutOutcome::Fallback(reason) => format!("fallback ({reason})"),
            LayoutOutcome::Empty => "empty".to_string(),
        };
        println!(
            "{id:<24} {:>4} nodes {:>4} edges  {width:>8.1} x {height:<8.1} {outcome}",
            result.nodes.len(),
            result.edges.len(),
        );
    }
}
