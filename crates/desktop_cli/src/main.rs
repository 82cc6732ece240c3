//! Demo driver for `desktop_core`.
//!
//! # Responsibility
//! - Exercise the desktop service end to end with the configured backend.
//! - Print events and results after each step, one per line.
//!
//! Configuration comes from `DESKTOP_*` environment variables. File logging
//! starts only when `DESKTOP_LOG_DIR` points at an absolute directory.

use desktop_core::{
    default_log_level, init_logging, CanvasState, DesktopConfig, DesktopEvent, DesktopService,
    ItemKind, Position, Viewport,
};
use log::info;
use serde_json::json;
use std::process::ExitCode;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::broadcast::Receiver;

const ENV_LOG_DIR: &str = "DESKTOP_LOG_DIR";
const DEMO_OWNER: &str = "user123";

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("desktop_cli error: {message}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), String> {
    let config = DesktopConfig::from_env().map_err(|err| err.to_string())?;
    if let Ok(log_dir) = std::env::var(ENV_LOG_DIR) {
        let level = config.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, &log_dir)?;
    }
    println!("desktop_core version={}", desktop_core::core_version());

    let service = DesktopService::from_config(&config).map_err(|err| err.to_string())?;
    let mut events = service.events().subscribe();

    let note = service
        .create_item(
            DEMO_OWNER,
            ItemKind::Note,
            "Welcome Note",
            Position::new(100.0, 100.0),
            Some(json!("Welcome to your virtual desktop!")),
        )
        .map_err(|err| err.to_string())?;
    service
        .create_item(
            DEMO_OWNER,
            ItemKind::Table,
            "Sample Data",
            Position::new(400.0, 100.0),
            Some(json!([
                ["Name", "Age", "City"],
                ["Alice", "30", "NYC"],
                ["Bob", "25", "LA"]
            ])),
        )
        .map_err(|err| err.to_string())?;

    let mut edited = note.clone();
    edited.content = json!("Welcome back to your virtual desktop!");
    service.update_item(edited).map_err(|err| err.to_string())?;

    service
        .generate_ai_content(
            DEMO_OWNER,
            "Create a Python class for vector operations",
            "code",
            Position::new(200.0, 300.0),
        )
        .await
        .map_err(|err| err.to_string())?;

    let outcome = service.force_flush().await;
    print_events(&mut events);
    println!("flush failed_ids={:?}", outcome.failed_ids());

    let items = service
        .load_user_items(DEMO_OWNER)
        .await
        .map_err(|err| err.to_string())?;
    for item in &items {
        println!(
            "item id={} type={} title={:?} x={} y={}",
            item.id,
            item.kind.as_str(),
            item.title,
            item.position.x,
            item.position.y
        );
    }

    service.update_canvas_state(
        DEMO_OWNER,
        CanvasState {
            position: Position::new(150.0, 150.0),
            scale: 1.5,
            ..CanvasState::default()
        },
    );
    let visible = service.visible_items(DEMO_OWNER, &items, Viewport::new(800.0, 600.0));
    println!("visible_items={}", visible.len());

    service.shutdown().await;
    print_events(&mut events);
    info!("event=demo_done module=cli status=ok items={}", items.len());
    Ok(())
}

fn print_events(events: &mut Receiver<DesktopEvent>) {
    loop {
        match events.try_recv() {
            Ok(event) => println!("event={} {}", event.name(), describe(&event)),
            Err(TryRecvError::Lagged(skipped)) => println!("event=lagged skipped={skipped}"),
            Err(_) => break,
        }
    }
}

fn describe(event: &DesktopEvent) -> String {
    match event {
        DesktopEvent::ItemCreated(item)
        | DesktopEvent::ItemUpdated(item)
        | DesktopEvent::AiContentGenerated(item) => format!("item_id={}", item.id),
        DesktopEvent::ItemDeleted { item_id, owner_id } => {
            format!("item_id={item_id} owner_id={owner_id}")
        }
        DesktopEvent::ItemsLoaded { owner_id, count } => {
            format!("owner_id={owner_id} count={count}")
        }
        DesktopEvent::CanvasUpdated { owner_id, state } => format!(
            "owner_id={owner_id} x={} y={} scale={}",
            state.position.x, state.position.y, state.scale
        ),
        DesktopEvent::FlushCompleted(summary) => serde_json::to_string(summary)
            .unwrap_or_else(|err| format!("summary_unavailable={err}")),
    }
}
