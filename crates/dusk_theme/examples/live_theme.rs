//! Live Theme Demo
//!
//! Loads a theme directory, prints every component's resolved stylesheet and
//! reprints a component whenever its stylesheet or `theme.json` changes.
//!
//! Run with:
//! `cargo run -p dusk_theme --example live_theme -- <theme-dir | config.toml>`
//!
//! Set `RUST_LOG=dusk_theme=debug,dusk_watch=debug` to follow the watcher.

use std::path::PathBuf;
use std::sync::{Arc, Weak};

use anyhow::Context;
use dusk_theme::{PlainCompiler, ThemeConfig, ThemeManager};
use tracing_subscriber::EnvFilter;

fn print_component(manager: &ThemeManager, component: &str) {
    match manager.get_component_artifact(component) {
        Some(artifact) => println!("── {component}\n{}\n", artifact.resolved_text()),
        None => println!("── {component} (not resolved)\n"),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let target = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("theme"));
    let manager = if target.extension().is_some_and(|ext| ext == "toml") {
        ThemeManager::from_config_file(&target, PlainCompiler)
            .with_context(|| format!("starting from {}", target.display()))?
    } else {
        ThemeManager::new(ThemeConfig::new(target), PlainCompiler)
            .context("starting theme manager")?
    };
    let manager = Arc::new(manager);
    tracing::info!(dir = %manager.theme_dir().display(), "theme loaded");

    for component in manager.component_names() {
        print_component(&manager, &component);

        let weak: Weak<ThemeManager> = Arc::downgrade(&manager);
        let name = component.clone();
        manager.register_component(component, move || {
            if let Some(manager) = weak.upgrade() {
                print_component(&manager, &name);
            }
        });
    }

    println!("watching for changes, press Ctrl+C to quit");
    loop {
        std::thread::park();
    }
}
