//! Built-in handlers for every message type the application sends.

use framewatch_store::{LogLevel, ProfilingResult, SeriesPoint, ThreadSpan, MAX_THREAD_COUNT};
use framewatch_wire::{kinds, Message};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::dispatch::Dispatcher;
use crate::error::{ClientError, Result};
use crate::session::Session;

/// Register a handler for each known inbound type.
pub fn register_builtin(dispatcher: &mut Dispatcher<Session>) -> Result<()> {
    dispatcher.register(kinds::MONITORING_FRAME, on_frame)?;
    dispatcher.register(kinds::MONITORING_MEMORY, on_memory)?;
    dispatcher.register(kinds::PROFILING_RESULT, on_profiling_result)?;
    dispatcher.register(kinds::PROFILING_TASK, on_profiling_task)?;
    dispatcher.register(kinds::LOGGING_MSG, on_log)?;
    dispatcher.register(kinds::APPLICATION_INFORMATION, on_application_information)?;
    dispatcher.register(kinds::UNHANDLED, on_unhandled)?;
    dispatcher.register(kinds::PIPE_CONNECTED, |session: &mut Session, _: &Message| {
        session
            .diagnostics
            .info("The application connected to the piping server.");
        Ok(())
    })?;
    dispatcher.register(kinds::PIPE_DISCONNECTED, |session: &mut Session, _: &Message| {
        session
            .diagnostics
            .info("The application disconnected from the piping server.");
        Ok(())
    })?;
    Ok(())
}

/// Fallback for types nobody registered.
pub fn on_unrecognized(session: &mut Session, message: &Message) -> Result<()> {
    session
        .diagnostics
        .warning(format!("Unknown message - {}", message.to_json()));
    Ok(())
}

fn number(message: &Message, field: &'static str) -> Result<f64> {
    message.f64(field).ok_or_else(|| invalid(message, field))
}

fn invalid(message: &Message, field: &'static str) -> ClientError {
    ClientError::InvalidField {
        msg_type: message.msg_type.clone(),
        field,
    }
}

fn from_fields<T: DeserializeOwned>(message: &Message) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(message.fields.clone()))?)
}

fn on_frame(session: &mut Session, message: &Message) -> Result<()> {
    let t = number(message, "t")?;
    let dt = number(message, "dt")?;
    let raw_dt = message.f64("rawDt");

    let store = &mut session.store;
    store.frame_dt.push(SeriesPoint::new(t, dt * 1000.0));
    if let Some(raw_dt) = raw_dt {
        store.frame_raw_dt.push(SeriesPoint::new(t, raw_dt * 1000.0));
    }
    store.fps.record(raw_dt.unwrap_or(dt));
    Ok(())
}

fn on_memory(session: &mut Session, message: &Message) -> Result<()> {
    let name = message.str("name").ok_or_else(|| invalid(message, "name"))?;
    let t = number(message, "t")?;
    let size = number(message, "size")?;
    session.store.memory.push(name, t, size);
    Ok(())
}

fn on_profiling_result(session: &mut Session, message: &Message) -> Result<()> {
    let result: ProfilingResult = from_fields(message)?;
    session.store.profiling_results.push(result);
    Ok(())
}

fn on_profiling_task(session: &mut Session, message: &Message) -> Result<()> {
    let span: ThreadSpan = from_fields(message)?;
    if span.thread >= MAX_THREAD_COUNT {
        return Err(invalid(message, "thread"));
    }
    session.store.tasks.push(span.frame, span);
    Ok(())
}

fn on_log(session: &mut Session, message: &Message) -> Result<()> {
    let level = message
        .get("lvl")
        .and_then(Value::as_i64)
        .and_then(LogLevel::from_wire)
        .unwrap_or(LogLevel::Fatal);
    let text = message.str("msg").unwrap_or_default();
    session.diagnostics.remote(level, text);
    Ok(())
}

fn on_application_information(session: &mut Session, message: &Message) -> Result<()> {
    let info = &mut session.application;
    let mut changed = false;
    if let Some(name) = message.str("name") {
        if info.name.as_deref() != Some(name) {
            info.name = Some(name.to_string());
            changed = true;
        }
    }
    if let Some(thread_count) = message.u64("threadCount") {
        let thread_count = usize::try_from(thread_count)
            .ok()
            .filter(|&count| count <= MAX_THREAD_COUNT)
            .ok_or_else(|| invalid(message, "threadCount"))?;
        if info.thread_count != thread_count {
            info.thread_count = thread_count;
            changed = true;
        }
    }
    if changed {
        tracing::debug!(name = ?info.name, threads = info.thread_count, "application information changed");
        session.invalidation.mark();
    }
    Ok(())
}

fn on_unhandled(session: &mut Session, message: &Message) -> Result<()> {
    let msg_type = match message.get("msgtype") {
        Some(Value::String(msg_type)) => msg_type.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    };
    session.diagnostics.error(format!(
        "The application doesn't recognise the message with the type '{msg_type}'"
    ));
    Ok(())
}
