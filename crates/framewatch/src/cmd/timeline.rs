use std::time::Instant;

use framewatch_timeline::layout::APPROX_CHAR_WIDTH;
use framewatch_timeline::{SpanRect, TimelineConfig, TimelineLayout, Viewport};
use serde::Serialize;

use crate::cmd::{connect, new_client, parse_duration, save_options, Context, TimelineArgs};
use crate::exit::{CliError, CliResult, SUCCESS, USAGE};
use crate::output::print_rows;

const HEADER: [&str; 8] = ["FRAME", "THREAD", "DEPTH", "X", "Y", "W", "COLOR", "LABEL"];

#[derive(Debug, Serialize)]
struct SpanRow {
    frame: u64,
    thread: usize,
    depth: u32,
    name: String,
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    color: String,
    label: Option<String>,
}

impl From<&SpanRect<'_>> for SpanRow {
    fn from(placed: &SpanRect<'_>) -> Self {
        Self {
            frame: placed.span.frame,
            thread: placed.span.thread,
            depth: placed.span.depth,
            name: placed.span.name.clone(),
            x: placed.rect.x,
            y: placed.rect.y,
            w: placed.rect.w,
            h: placed.rect.h,
            color: placed.color.to_hex(),
            label: placed.fitted_label(APPROX_CHAR_WIDTH),
        }
    }
}

pub fn run(args: TimelineArgs, context: &Context) -> CliResult<i32> {
    let duration = parse_duration(&args.duration)?;
    if !(args.width > 0.0 && args.height > 0.0) {
        return Err(CliError::new(USAGE, "viewport size must be positive"));
    }

    let mut client = new_client(context)?;
    connect(&mut client, args.addr.as_deref())?;
    let deadline = Instant::now() + duration;
    while client.is_connected() && Instant::now() < deadline {
        client.pump();
    }
    client.shutdown();
    save_options(&mut client, context)?;

    let session = client.session();
    let config = TimelineConfig::default();
    let mut viewport = Viewport::with_config(args.width, args.height, &config);
    viewport.set_zoom(args.zoom);
    let extent = TimelineLayout::content_extent(&session.store.tasks, &config);
    if args.follow {
        viewport.scroll_to_end(extent);
    } else {
        viewport.set_content_width(extent);
    }

    let layout = TimelineLayout::compute(
        &session.store.tasks,
        session.application.thread_count,
        &viewport,
        &config,
    );
    tracing::info!(
        frames = layout.frames().len(),
        spans = layout.spans().len(),
        lanes = layout.lane_count(),
        "timeline laid out"
    );

    let rows: Vec<SpanRow> = layout.spans().iter().map(SpanRow::from).collect();
    print_rows(&rows, &HEADER, span_cells, context.format);
    Ok(SUCCESS)
}

fn span_cells(row: &SpanRow) -> Vec<String> {
    vec![
        row.frame.to_string(),
        row.thread.to_string(),
        row.depth.to_string(),
        format!("{:.1}", row.x),
        format!("{:.1}", row.y),
        format!("{:.1}", row.w),
        row.color.clone(),
        row.label.clone().unwrap_or_else(|| row.name.clone()),
    ]
}
