//! Exercises the native notify backend against a real temporary directory.

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use dusk_watch::{FileWatchRegistry, WatchScope, WatcherConfig};

fn wait_for(timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(20));
    }
    done()
}

#[test]
fn saving_a_watched_file_fires_its_callback_once() {
    let dir = tempfile::tempdir().unwrap();
    let css = dir.path().join("panel.css");
    fs::write(&css, "background: var(--primary);").unwrap();

    let registry =
        FileWatchRegistry::new(WatcherConfig::default().settle(Duration::from_millis(80))).unwrap();
    assert!(registry.watch(&css, WatchScope::component("panel")));

    let hits = Arc::new(AtomicUsize::new(0));
    {
        let hits = Arc::clone(&hits);
        registry.subscribe("panel", move |event| {
            assert_eq!(event.component, "panel");
            hits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
    }

    fs::write(&css, "background: var(--secondary);").unwrap();

    assert!(wait_for(Duration::from_secs(5), || {
        hits.load(Ordering::SeqCst) >= 1
    }));
    thread::sleep(Duration::from_millis(400));
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    registry.shutdown();
}

#[test]
fn watching_a_missing_path_fails_quietly() {
    let dir = tempfile::tempdir().unwrap();
    let registry = FileWatchRegistry::new(WatcherConfig::default()).unwrap();

    assert!(!registry.watch(dir.path().join("nope.css"), WatchScope::component("nope")));
    assert!(registry.watched_paths().is_empty());
}

#[test]
fn shutdown_stops_the_dispatcher() {
    let dir = tempfile::tempdir().unwrap();
    let registry = FileWatchRegistry::new(WatcherConfig::default()).unwrap();
    assert!(registry.watch(dir.path(), WatchScope::DirectoryWide));

    registry.shutdown();
    assert!(registry.is_shut_down());
    assert!(registry.watched_paths().is_empty());
}
