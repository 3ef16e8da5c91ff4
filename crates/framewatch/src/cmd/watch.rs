use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use framewatch_client::Client;
use framewatch_store::{Event, EventKind, LogLevel};
use serde::Serialize;

use crate::cmd::{connect, new_client, parse_duration, save_options, Context, WatchArgs};
use crate::exit::{CliError, CliResult, FAILURE, INTERNAL, SUCCESS};
use crate::output::{optional, print_log_record, print_report};

/// Pause between probe ticks while nothing is connected.
const IDLE_SLEEP: Duration = Duration::from_millis(50);

const MIB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Interrupted,
    Elapsed,
    FrameLimit,
    Lost,
}

#[derive(Debug, Serialize)]
struct WatchSummary {
    server: String,
    connected: bool,
    application: Option<String>,
    thread_count: usize,
    frames: u64,
    fps_average: Option<f64>,
    fps_min: Option<f64>,
    fps_max: Option<f64>,
    last_frame_ms: Option<f64>,
    tasks: usize,
    profiling_results: usize,
    allocators: usize,
    memory_peak_mib: f64,
    log_records: usize,
    errors: usize,
}

pub fn run(args: WatchArgs, context: &Context) -> CliResult<i32> {
    let deadline = args
        .duration
        .as_deref()
        .map(parse_duration)
        .transpose()?
        .map(|duration| Instant::now() + duration);

    let mut client = new_client(context)?;
    let format = context.format;
    client
        .session_mut()
        .diagnostics
        .subscribe(EventKind::Push, move |event| {
            if let Event::Push(record) = event {
                print_log_record(record, format);
            }
        })
        .map_err(|err| CliError::new(INTERNAL, format!("log subscription failed: {err}")))?;

    if args.probe {
        if let Some(addr) = args.addr.as_deref() {
            client.session_mut().remember_server(addr);
        }
        client.set_probing(true);
        client.start();
    } else {
        connect(&mut client, args.addr.as_deref())?;
    }

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let stop = loop {
        if !running.load(Ordering::SeqCst) {
            break Stop::Interrupted;
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            break Stop::Elapsed;
        }
        if args.probe {
            client.tick(Instant::now());
        }
        if client.is_connected() {
            client.pump();
        } else if args.probe {
            thread::sleep(IDLE_SLEEP);
            continue;
        }
        if args
            .frames
            .is_some_and(|limit| client.session().store.fps.frames() >= limit)
        {
            break Stop::FrameLimit;
        }
        if !client.is_connected() && !args.probe {
            break Stop::Lost;
        }
    };
    tracing::debug!(?stop, "watch finished");

    let summary = summarize(&client);
    client.shutdown();
    save_options(&mut client, context)?;
    print_report(&summary, &summary_rows(&summary), format);

    if stop == Stop::Lost {
        return Err(CliError::new(
            FAILURE,
            "the connection to the application was lost",
        ));
    }
    Ok(SUCCESS)
}

fn summarize(client: &Client) -> WatchSummary {
    let session = client.session();
    let store = &session.store;
    WatchSummary {
        server: session.options.server.clone(),
        connected: client.is_connected(),
        application: session.application.name.clone(),
        thread_count: session.application.thread_count,
        frames: store.fps.frames(),
        fps_average: store.fps.average(),
        fps_min: store.fps.min(),
        fps_max: store.fps.max(),
        last_frame_ms: store.frame_dt.last().map(|point| point.value),
        tasks: store.tasks.item_count(),
        profiling_results: store.profiling_results.len(),
        allocators: store.memory.len(),
        memory_peak_mib: store.memory.max() / MIB,
        log_records: session.diagnostics.len(),
        errors: session.diagnostics.count_at_least(LogLevel::Error),
    }
}

fn summary_rows(summary: &WatchSummary) -> Vec<(&'static str, String)> {
    vec![
        ("server", summary.server.clone()),
        ("connected", summary.connected.to_string()),
        (
            "application",
            summary.application.clone().unwrap_or_else(|| "-".to_string()),
        ),
        ("threads", summary.thread_count.to_string()),
        ("frames", summary.frames.to_string()),
        ("fps_avg", optional(summary.fps_average, 1)),
        ("fps_min", optional(summary.fps_min, 1)),
        ("fps_max", optional(summary.fps_max, 1)),
        ("last_frame_ms", optional(summary.last_frame_ms, 3)),
        ("tasks", summary.tasks.to_string()),
        ("profiling_results", summary.profiling_results.to_string()),
        ("allocators", summary.allocators.to_string()),
        ("memory_peak_mib", format!("{:.2}", summary.memory_peak_mib)),
        ("log_records", summary.log_records.to_string()),
        ("errors", summary.errors.to_string()),
    ]
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
