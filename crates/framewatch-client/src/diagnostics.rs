use framewatch_store::{BoundedSeries, Event, EventKind, LogLevel, LogRecord, SubscriptionId};

/// Application-level log channel.
///
/// Records from this client (`Local`) and from the application (`Remote`)
/// share one bounded history and are mirrored to `tracing`.
#[derive(Debug)]
pub struct Diagnostics {
    records: BoundedSeries<LogRecord>,
}

impl Diagnostics {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: BoundedSeries::new(capacity),
        }
    }

    pub fn record(&mut self, record: LogRecord) {
        mirror(&record);
        self.records.push(record);
    }

    pub fn local(&mut self, level: LogLevel, text: impl Into<String>) {
        self.record(LogRecord::local(level, text));
    }

    pub fn remote(&mut self, level: LogLevel, text: impl Into<String>) {
        self.record(LogRecord::remote(level, text));
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.local(LogLevel::Information, text);
    }

    pub fn warning(&mut self, text: impl Into<String>) {
        self.local(LogLevel::Warning, text);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.local(LogLevel::Error, text);
    }

    /// Oldest first.
    pub fn records(&self) -> impl Iterator<Item = &LogRecord> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&LogRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of retained records at `level` or above.
    pub fn count_at_least(&self, level: LogLevel) -> usize {
        self.records.iter().filter(|record| record.level >= level).count()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn subscribe<F>(&mut self, kind: EventKind, callback: F) -> framewatch_store::Result<SubscriptionId>
    where
        F: FnMut(Event<'_, LogRecord, std::collections::VecDeque<LogRecord>>) + 'static,
    {
        self.records.subscribe(kind, callback)
    }
}

fn mirror(record: &LogRecord) {
    let source = record.source;
    let text = record.text.as_str();
    match record.level {
        LogLevel::Trace => tracing::trace!(?source, "{text}"),
        LogLevel::Debug => tracing::debug!(?source, "{text}"),
        LogLevel::Information => tracing::info!(?source, "{text}"),
        LogLevel::Warning => tracing::warn!(?source, "{text}"),
        LogLevel::Error | LogLevel::Critical | LogLevel::Fatal => {
            tracing::error!(?source, level = %record.level, "{text}")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use framewatch_store::LogSource;

    use super::*;

    #[test]
    fn records_are_bounded() {
        let mut diagnostics = Diagnostics::new(2);
        diagnostics.info("one");
        diagnostics.warning("two");
        diagnostics.remote(LogLevel::Fatal, "three");

        let texts: Vec<&str> = diagnostics.records().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, ["two", "three"]);
        assert_eq!(diagnostics.last().unwrap().source, LogSource::Remote);
    }

    #[test]
    fn counts_by_severity() {
        let mut diagnostics = Diagnostics::new(10);
        diagnostics.info("a");
        diagnostics.error("b");
        diagnostics.remote(LogLevel::Critical, "c");
        assert_eq!(diagnostics.count_at_least(LogLevel::Error), 2);
        assert_eq!(diagnostics.count_at_least(LogLevel::Trace), 3);
    }

    #[test]
    fn subscribers_see_new_records() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut diagnostics = Diagnostics::new(10);
        diagnostics
            .subscribe(EventKind::Push, move |event| {
                if let Event::Push(record) = event {
                    sink.borrow_mut().push(record.text.clone());
                }
            })
            .unwrap();

        diagnostics.error("boom");
        assert_eq!(*seen.borrow(), ["boom"]);
    }
}
