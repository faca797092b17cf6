//! Chrona
//!
//! Headless run of the dashboard: plays the intro, lays out the default
//! widgets and drives them with a scripted sequence of key presses.

use chrona::config::Config;
use chrona::context::Scope;
use chrona::dashboard::{default_shortcuts, default_widgets, Dashboard, DashboardAction};
use chrona::intro::{IntroConfig, IntroSequencer};
use chrona::layout::{use_zoom, Position};
use chrona::shortcuts::{KeyEvent, KeyEventSource, ShortcutBinding};
use std::time::Duration;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_default();
    config.logging.init_tracing();
    config.validate()?;

    tracing::info!("Chrona v{}", env!("CARGO_PKG_VERSION"));

    // Intro
    let intro = IntroSequencer::new(IntroConfig {
        auto_start: config.dashboard.intro_auto_start,
    });
    let mut intro_state = intro.subscribe();
    let intro_log = tokio::spawn(async move {
        while intro_state.changed().await.is_ok() {
            let state = *intro_state.borrow_and_update();
            tracing::info!(phase = %state.phase, skipped = state.is_skipped, "Intro phase");
            if state.is_complete {
                break;
            }
        }
    });

    // Dashboard
    let mut scope = Scope::new();
    let mut dashboard = Dashboard::new(&mut scope, &config.dashboard)?;
    for widget in default_widgets() {
        dashboard.add_widget(widget)?;
    }
    log_layout(&dashboard);

    let zoom = use_zoom(&scope);

    // Keyboard
    let keys = KeyEventSource::new();
    let (tx, mut actions) = mpsc::unbounded_channel::<DashboardAction>();
    let binding = ShortcutBinding::attach(&keys, default_shortcuts(), move |action| {
        let _ = tx.send(action);
    });

    println!("Shortcuts:");
    for shortcut in binding.shortcuts() {
        println!("  {:<10} {}", shortcut.chord_label(), shortcut.description);
    }
    println!();

    tokio::time::sleep(Duration::from_millis(1200)).await;

    let script = [
        KeyEvent::new("2"),
        KeyEvent::new("g").shift(),
        KeyEvent::new("=").ctrl(),
        KeyEvent::new("=").ctrl(),
        KeyEvent::new("Escape"),
    ];
    for event in script {
        let event = keys.emit(event);
        if !event.default_prevented() {
            tracing::debug!(key = %event.key, "Key not bound");
        }
    }

    // Everything the script triggered is queued; drain it
    while let Ok(action) = actions.try_recv() {
        if !dashboard.apply(action) {
            intro.skip();
        }
    }

    tracing::info!(zoom = zoom.viewport().percent(), "Zoom");
    log_layout(&dashboard);

    // Drop a widget near a grid line, through the current zoom
    let snap = dashboard.drag_widget("notes", Position::new(409.0, 261.0))?;
    tracing::info!(
        position = %snap.position(),
        snapped_x = snap.snapped_x,
        snapped_y = snap.snapped_y,
        "Dragged notes"
    );

    drop(binding);
    tracing::info!(listeners = keys.listener_count(), "Shortcuts detached");

    intro_log.await?;
    tracing::info!(
        complete = intro.is_complete(),
        skipped = intro.is_skipped(),
        "Intro finished"
    );

    Ok(())
}

fn log_layout(dashboard: &Dashboard) {
    tracing::info!(mode = %dashboard.mode(), "Layout");
    for widget in dashboard.widgets() {
        tracing::info!(
            widget = %widget.id,
            position = %widget.position,
            pinned = widget.pinned,
            "  placed"
        );
    }
}
