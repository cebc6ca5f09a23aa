//! dlbar demo driver.
//!
//! Simulates a short download session and logs every notification and
//! keep-alive service transition, so the state machine can be watched
//! end to end without a real download engine.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;

use dlbar::{
    ContentId, ControllerHandle, ForegroundCoordinator, ItemState, NeverAutoOpen,
    NotificationController, NotificationPayload, NotificationSurface, NotifyConfig, OfflineItem,
    ServiceHost, StatusUpdate, channel, format_duration, run,
};

/// Surface that logs every presentation change.
struct LogSurface;

impl NotificationSurface for LogSurface {
    fn create(&mut self, payload: &NotificationPayload) {
        log::info!(
            "[surface] create: \"{}\" [{}]",
            payload.message,
            payload.link.label()
        );
    }

    fn update(&mut self, payload: &NotificationPayload) {
        log::info!(
            "[surface] update: \"{}\" [{}]",
            payload.message,
            payload.link.label()
        );
    }

    fn close(&mut self) {
        log::info!("[surface] close");
    }
}

/// Host that logs service transitions and completes binds asynchronously
/// through the event channel, like a real platform would.
struct LogHost {
    handle: ControllerHandle,
}

impl ServiceHost for LogHost {
    fn start_and_bind(&mut self) {
        log::info!("[service] start + bind requested");
        let handle = self.handle.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            handle.notify_service_connected();
        });
    }

    fn stop_and_unbind(&mut self, was_cancelled: bool) {
        log::info!("[service] stop + unbind (cancelled: {was_cancelled})");
    }

    fn push_notification(&mut self, id: u32, update: &StatusUpdate) {
        log::info!("[service] pinned notification {id}: \"{}\"", update.title);
    }
}

fn print_usage() {
    eprintln!("Usage: dlbar [OPTIONS]");
    eprintln!();
    eprintln!("Runs a scripted download simulation against the notification");
    eprintln!("state machine, logging every surface and service transition.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --fast              Shrink the debounce timers so the demo finishes quickly");
    eprintln!("  --config <PATH>     Load timings from a TOML file instead of the default path");
    eprintln!("  -h, --help          Show this help");
}

fn parse_args() -> Option<(bool, PathBuf)> {
    let mut fast = false;
    let mut config_path = NotifyConfig::default_path();

    let args: Vec<String> = env::args().skip(1).collect();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--fast" => fast = true,
            "--config" => {
                i += 1;
                if i < args.len() {
                    config_path = PathBuf::from(&args[i]);
                } else {
                    eprintln!("Error: --config requires a value");
                    std::process::exit(1);
                }
            }
            "-h" | "--help" => return None,
            other => {
                eprintln!("Error: unknown option {other}");
                std::process::exit(1);
            }
        }
        i += 1;
    }

    Some((fast, config_path))
}

fn item(id: &str, title: &str) -> OfflineItem {
    OfflineItem::new(ContentId::new("download", id), title)
}

#[tokio::main]
async fn main() -> dlbar::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some((fast, config_path)) = parse_args() else {
        print_usage();
        return Ok(());
    };

    let mut config = NotifyConfig::load(&config_path)?;
    if fast {
        config = config.with_accelerating_ms(150).with_result_ms(300);
    }
    log::info!(
        "timers: accelerating {}ms, result {}ms",
        config.accelerating_ms,
        config.result_ms
    );

    let started = Instant::now();
    let (handle, rx) = channel();

    let controller = NotificationController::with_surface(false, config.clone(), LogSurface);
    let coordinator = ForegroundCoordinator::new(LogHost {
        handle: handle.clone(),
    });
    let shutdown = CancellationToken::new();

    let loop_task = tokio::spawn(run(
        controller,
        coordinator,
        Arc::new(NeverAutoOpen),
        handle.clone(),
        rx,
        shutdown.clone(),
    ));

    let beat = if fast {
        Duration::from_millis(100)
    } else {
        Duration::from_millis(800)
    };

    // An accelerated download kicks things off.
    log::info!("--- starting report.pdf (accelerated) ---");
    handle.notify_download_started();
    let mut report = item("1", "report.pdf");
    report.is_accelerated = true;
    report.total_bytes = 12 * 1024 * 1024;
    report.notification_id = Some(1);
    handle.notify_item_updated(report.clone());

    // Let the accelerating animation run out.
    sleep(config.accelerating_duration() + beat).await;

    // A second download joins.
    log::info!("--- starting archive.zip ---");
    let mut archive = item("2", "archive.zip");
    archive.total_bytes = 80 * 1024 * 1024;
    archive.notification_id = Some(2);
    handle.notify_item_updated(archive.clone());
    sleep(beat).await;

    // The user pauses it, then resumes.
    log::info!("--- pausing archive.zip ---");
    archive.state = ItemState::Paused;
    handle.notify_item_updated(archive.clone());
    sleep(beat).await;

    log::info!("--- resuming archive.zip ---");
    archive.state = ItemState::InProgress;
    handle.notify_item_updated(archive.clone());
    sleep(beat).await;

    // The first download finishes.
    log::info!("--- report.pdf completes ---");
    report.state = ItemState::Complete;
    report.received_bytes = report.total_bytes;
    handle.notify_item_completed(report);
    sleep(config.result_duration() + beat).await;

    // The second one fails.
    log::info!("--- archive.zip fails ---");
    archive.state = ItemState::Failed;
    handle.notify_item_updated(archive);
    sleep(config.result_duration() + beat).await;

    shutdown.cancel();
    let (controller, coordinator) = loop_task.await.map_err(std::io::Error::other)?;

    log::info!(
        "done in {}: state {:?}, {} tracked items, service bound: {}",
        format_duration(started.elapsed()),
        controller.state(),
        controller.tracked().len(),
        coordinator.is_bound()
    );
    Ok(())
}
