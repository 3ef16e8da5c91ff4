//! Known message types.
//!
//! Inbound types are produced by the instrumented application; outbound
//! types are sent by the client. Any other type string is legal on the wire
//! and is routed to the fallback handler by the dispatcher.

/// Per-frame timing: `{t, dt, rawDt?}` in seconds.
pub const MONITORING_FRAME: &str = "monitoring.frame";

/// Allocator sample: `{name, t, size}` with size in bytes.
pub const MONITORING_MEMORY: &str = "monitoring.memory";

/// Aggregated profiling result: `{name, samples, mean, median, stddev, total}`.
pub const PROFILING_RESULT: &str = "profiling.result";

/// One timed region on a worker thread: `{frame, thread, depth, t, dt, name}`.
pub const PROFILING_TASK: &str = "profiling.task";

/// Remote log line: `{lvl, msg}`.
pub const LOGGING_MSG: &str = "logging.msg";

/// Application description: `{name?, threadCount?}`.
pub const APPLICATION_INFORMATION: &str = "application.information";

/// The application did not recognise a message we sent: `{msgtype}`.
pub const UNHANDLED: &str = "gamedevwebtools.unhandled";

/// A relay reports the application side connected.
pub const PIPE_CONNECTED: &str = "tooling.pipe.application.connected";

/// A relay reports the application side disconnected.
pub const PIPE_DISCONNECTED: &str = "tooling.pipe.application.disconnected";

/// Outbound: pause/resume the application.
pub const SERVICE_ACTIVATE: &str = "application.service.activate";

/// Outbound: ask the application to exit.
pub const SERVICE_QUIT: &str = "application.service.quit";

/// Outbound: advance a paused application by one frame.
pub const SERVICE_STEP: &str = "application.service.step";

/// Outbound: forwarded key release `{key}`.
pub const INPUT_KEY_UP: &str = "input.keyup";

/// Outbound: forwarded key press `{key}`.
pub const INPUT_KEY_DOWN: &str = "input.keydown";

/// Every inbound type the client handles itself.
pub const INBOUND: [&str; 9] = [
    MONITORING_FRAME,
    MONITORING_MEMORY,
    PROFILING_RESULT,
    PROFILING_TASK,
    LOGGING_MSG,
    APPLICATION_INFORMATION,
    UNHANDLED,
    PIPE_CONNECTED,
    PIPE_DISCONNECTED,
];

/// Returns true if the type is one the client handles itself.
pub fn is_known_inbound(msg_type: &str) -> bool {
    INBOUND.contains(&msg_type)
}

/// Returns true if the type is a service command.
pub fn is_service(msg_type: &str) -> bool {
    msg_type.starts_with("application.service.")
}
