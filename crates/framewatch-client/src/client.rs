use std::time::Instant;

use framewatch_transport::{Dialer, TcpDialer};
use framewatch_wire::{kinds, Message, WireError};
use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;
use crate::connection::{Connection, ConnectionEvent, ConnectionState, DisconnectReason};
use crate::dispatch::{Dispatcher, Route};
use crate::error::{ClientError, Result};
use crate::handlers;
use crate::options::ClientOptions;
use crate::session::Session;

type EventListener = Box<dyn FnMut(&ConnectionEvent)>;

/// A live telemetry client: one connection, its session, and the handlers
/// that feed the session.
///
/// Everything runs on the caller's thread. Drive it with [`Client::tick`]
/// for reconnection and [`Client::pump`] for incoming data.
pub struct Client<D: Dialer = TcpDialer> {
    connection: Connection<D>,
    session: Session,
    dispatcher: Dispatcher<Session>,
    listeners: Vec<EventListener>,
}

impl Client<TcpDialer> {
    /// Client dialing over TCP with the timeouts from `config`.
    pub fn tcp(config: ClientConfig, options: ClientOptions) -> Result<Self> {
        let dialer = TcpDialer {
            connect_timeout: config.connect_timeout,
            write_timeout: config.write_timeout,
        };
        Self::new(dialer, config, options)
    }
}

impl<D: Dialer> Client<D> {
    pub fn new(dialer: D, config: ClientConfig, options: ClientOptions) -> Result<Self> {
        let session = Session::new(&config, options)?;
        let mut dispatcher = Dispatcher::new(handlers::on_unrecognized);
        handlers::register_builtin(&mut dispatcher)?;
        let mut connection = Connection::new(dialer, &config);
        connection.set_probing(session.options.probe_for_running_applications);
        Ok(Self {
            connection,
            session,
            dispatcher,
            listeners: Vec::new(),
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn connection(&self) -> &Connection<D> {
        &self.connection
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Add a handler for a message type.
    pub fn register<F>(&mut self, msg_type: impl Into<String>, handler: F) -> Result<()>
    where
        F: FnMut(&mut Session, &Message) -> Result<()> + 'static,
    {
        self.dispatcher.register(msg_type, handler)
    }

    /// Observe lifecycle events after the client has handled them.
    pub fn on_connection_event<F>(&mut self, listener: F)
    where
        F: FnMut(&ConnectionEvent) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Connect to the remembered server when auto-connect is on.
    ///
    /// A failure here is reported as information only; probing picks the
    /// connection up later.
    pub fn start(&mut self) {
        if !self.session.options.auto_connect {
            return;
        }
        let server = self.session.options.server.clone();
        if self.connection.probe(&server).is_err() {
            self.session
                .diagnostics
                .info(format!("Couldn't connect to {server}!"));
        }
        self.handle_events();
    }

    /// Connect to `addr` and remember it as the server.
    pub fn connect(&mut self, addr: &str) -> Result<()> {
        self.session.remember_server(addr);
        let result = self.connection.connect(addr);
        self.handle_events();
        result
    }

    pub fn disconnect(&mut self) {
        self.connection.disconnect();
        self.handle_events();
    }

    /// Turn reconnection probing on or off and remember the choice.
    pub fn set_probing(&mut self, enabled: bool) {
        self.session.options.probe_for_running_applications = enabled;
        self.connection.set_probing(enabled);
    }

    /// Advance timers; probes the remembered server when one is due.
    pub fn tick(&mut self, now: Instant) {
        if self.connection.tick(now) {
            let server = self.session.options.server.clone();
            if let Err(err) = self.connection.probe(&server) {
                debug!(addr = %server, error = %err, "probe found nothing");
            }
        }
        self.handle_events();
    }

    /// Read once (bounded by the read timeout) and dispatch every complete
    /// message. Returns the number of messages dispatched.
    pub fn pump(&mut self) -> usize {
        let burst = self.connection.poll();
        let mut dispatched = 0;
        for decoded in burst {
            match decoded {
                Ok(message) => {
                    dispatched += 1;
                    let (route, result) = self.dispatcher.dispatch(&mut self.session, &message);
                    if route == Route::Fallback {
                        debug!(msg_type = %message.msg_type, "no handler registered");
                    }
                    if let Err(err) = result {
                        self.session.diagnostics.warning(format!(
                            "Can't handle the message '{}': {err}",
                            message.msg_type
                        ));
                    }
                }
                Err(err) => {
                    self.session
                        .diagnostics
                        .error(format!("Can't decode a message: {err}"));
                }
            }
        }
        self.handle_events();
        dispatched
    }

    /// Send a message. Failures are also logged to the diagnostics channel.
    pub fn send(&mut self, message: &Message) -> Result<()> {
        let result = self.connection.send(message);
        if let Err(err) = &result {
            let text = match err {
                ClientError::NotConnected => format!(
                    "Can't send a message '{}' - the application isn't connected!",
                    message.msg_type
                ),
                ClientError::Wire(WireError::MessageTooLarge { .. }) => {
                    "Can't send a message longer than 0xFFFF bytes".to_string()
                }
                other => format!("Can't send a message '{}': {other}", message.msg_type),
            };
            self.session.diagnostics.error(text);
        }
        self.handle_events();
        result
    }

    /// Send `msg_type` with the fields of a JSON object (or `null`).
    pub fn send_value(&mut self, msg_type: &str, fields: Value) -> Result<()> {
        let message = Message::from_value(msg_type, fields)?;
        self.send(&message)
    }

    /// Toggle the application's active state.
    pub fn activate(&mut self) -> Result<()> {
        self.send(&Message::new(kinds::SERVICE_ACTIVATE))?;
        self.session.toggle_active();
        Ok(())
    }

    /// Ask a paused application to advance one frame.
    pub fn step(&mut self) -> Result<()> {
        self.send(&Message::new(kinds::SERVICE_STEP))
    }

    /// Ask the application to exit. The resulting disconnect is expected.
    pub fn quit(&mut self) -> Result<()> {
        self.connection.expect_disconnect();
        self.send(&Message::new(kinds::SERVICE_QUIT))
    }

    pub fn key_down(&mut self, key: u32) -> Result<()> {
        self.send(&Message::new(kinds::INPUT_KEY_DOWN).field("key", key))
    }

    pub fn key_up(&mut self, key: u32) -> Result<()> {
        self.send(&Message::new(kinds::INPUT_KEY_UP).field("key", key))
    }

    /// Close without reporting a disconnect and stop probing.
    pub fn shutdown(&mut self) {
        self.connection.shutdown();
    }

    fn handle_events(&mut self) {
        for event in self.connection.take_events() {
            match event {
                ConnectionEvent::Connecting => {
                    debug!(addr = ?self.connection.address(), "connecting");
                }
                ConnectionEvent::Connected => {
                    self.session.reset_telemetry();
                    let addr = self.connection.address().unwrap_or_default().to_string();
                    self.session.diagnostics.info(format!("Connected to {addr}"));
                }
                ConnectionEvent::Disconnected { reason } => match reason {
                    DisconnectReason::Unexpected => self
                        .session
                        .diagnostics
                        .error("The connection to the application was lost"),
                    DisconnectReason::Expected => self
                        .session
                        .diagnostics
                        .info("Disconnected from the application."),
                    DisconnectReason::PossibleProbe => debug!("probe disconnect"),
                },
            }
            for listener in &mut self.listeners {
                listener(&event);
            }
        }
    }
}

impl<D: Dialer> std::fmt::Debug for Client<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("connection", &self.connection)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use framewatch_store::{LogLevel, SeriesPoint};
    use serde_json::json;

    use super::*;
    use crate::testing::FakeDialer;

    fn options(auto_connect: bool, probing: bool) -> ClientOptions {
        ClientOptions {
            auto_connect,
            server: "app:8080".to_string(),
            probe_for_running_applications: probing,
        }
    }

    fn client(dialer: &FakeDialer, options: ClientOptions) -> Client<FakeDialer> {
        Client::new(dialer.clone(), ClientConfig::default(), options).unwrap()
    }

    fn errors(client: &Client<FakeDialer>) -> usize {
        client.session().diagnostics.count_at_least(LogLevel::Error)
    }

    #[test]
    fn probe_failure_is_silent_and_probing_continues() {
        let dialer = FakeDialer::refusing();
        let mut client = client(&dialer, options(false, true));
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        client.on_connection_event(move |event| sink.borrow_mut().push(*event));

        let start = Instant::now();
        client.tick(start);
        client.tick(start + Duration::from_secs(1));
        assert_eq!(
            *events.borrow(),
            [
                ConnectionEvent::Connecting,
                ConnectionEvent::Disconnected {
                    reason: DisconnectReason::PossibleProbe
                }
            ]
        );
        assert_eq!(errors(&client), 0);
        assert!(client.session().diagnostics.is_empty());

        client.tick(start + Duration::from_secs(2));
        assert_eq!(dialer.dials(), ["app:8080", "app:8080"]);

        dialer.accept_next();
        client.tick(start + Duration::from_secs(3));
        assert!(client.is_connected());
        assert_eq!(errors(&client), 0);
    }

    #[test]
    fn start_logs_information_when_nothing_listens() {
        let dialer = FakeDialer::refusing();
        let mut client = client(&dialer, options(true, false));
        client.start();

        assert_eq!(errors(&client), 0);
        let record = client.session().diagnostics.last().unwrap();
        assert_eq!(record.level, LogLevel::Information);
        assert_eq!(record.text, "Couldn't connect to app:8080!");
    }

    #[test]
    fn start_without_auto_connect_does_nothing() {
        let dialer = FakeDialer::refusing();
        let mut client = client(&dialer, options(false, false));
        client.start();
        assert!(dialer.dials().is_empty());
    }

    #[test]
    fn connecting_clears_previous_session_data() {
        let dialer = FakeDialer::default();
        dialer.accept_next();
        let mut client = client(&dialer, options(false, false));
        client.session_mut().store.frame_dt.push(SeriesPoint::new(0.0, 1.0));

        client.connect("app:8080").unwrap();
        assert!(client.session().store.is_empty());
        assert_eq!(
            client.session().diagnostics.last().unwrap().text,
            "Connected to app:8080"
        );
    }

    #[test]
    fn connect_remembers_a_new_server() {
        let dialer = FakeDialer::default();
        dialer.accept_next();
        let mut client = client(&dialer, options(false, false));

        client.connect("other:9000").unwrap();
        assert_eq!(client.session().options.server, "other:9000");
        assert!(client.session_mut().take_options_dirty());
    }

    #[test]
    fn pump_dispatches_into_the_store() {
        let dialer = FakeDialer::default();
        let pipe = dialer.accept_next();
        let mut client = client(&dialer, options(false, false));
        client.connect("app:8080").unwrap();

        pipe.feed_message(&Message::new("monitoring.frame").field("t", 0.0).field("dt", 0.016));
        pipe.feed_message(
            &Message::from_value(
                "profiling.task",
                json!({"frame": 1, "thread": 0, "t": 0.0, "dt": 0.001, "name": "update"}),
            )
            .unwrap(),
        );
        assert_eq!(client.pump(), 2);
        assert_eq!(client.session().store.frame_dt.len(), 1);
        assert_eq!(client.session().store.tasks.item_count(), 1);
        assert!(client.session().invalidation.take());
    }

    #[test]
    fn bad_messages_are_logged_and_the_connection_survives() {
        let dialer = FakeDialer::default();
        let pipe = dialer.accept_next();
        let mut client = client(&dialer, options(false, false));
        client.connect("app:8080").unwrap();

        let garbage = b"{oops";
        pipe.feed(&(garbage.len() as u16).to_le_bytes());
        pipe.feed(garbage);
        pipe.feed_message(&Message::new("monitoring.frame").field("t", 0.0));
        pipe.feed_message(&Message::new("logging.msg").field("lvl", 2).field("msg", "hi"));

        assert_eq!(client.pump(), 2);
        assert!(client.is_connected());
        let texts: Vec<String> = client
            .session()
            .diagnostics
            .records()
            .map(|record| record.text.clone())
            .collect();
        assert!(texts[1].starts_with("Can't decode a message"));
        assert!(texts[2].starts_with("Can't handle the message 'monitoring.frame'"));
        assert_eq!(texts[3], "hi");
    }

    #[test]
    fn unexpected_drop_is_an_error() {
        let dialer = FakeDialer::default();
        let pipe = dialer.accept_next();
        let mut client = client(&dialer, options(false, false));
        client.connect("app:8080").unwrap();

        pipe.close();
        client.pump();
        assert_eq!(client.state(), ConnectionState::Disconnected);
        let record = client.session().diagnostics.last().unwrap();
        assert_eq!(record.level, LogLevel::Error);
        assert_eq!(record.text, "The connection to the application was lost");
    }

    #[test]
    fn disconnect_is_information() {
        let dialer = FakeDialer::default();
        dialer.accept_next();
        let mut client = client(&dialer, options(false, false));
        client.connect("app:8080").unwrap();

        client.disconnect();
        assert_eq!(errors(&client), 0);
        assert_eq!(
            client.session().diagnostics.last().unwrap().text,
            "Disconnected from the application."
        );
    }

    #[test]
    fn quit_makes_the_close_expected() {
        let dialer = FakeDialer::default();
        let pipe = dialer.accept_next();
        let mut client = client(&dialer, options(false, false));
        client.connect("app:8080").unwrap();

        client.quit().unwrap();
        pipe.close();
        client.pump();
        assert_eq!(errors(&client), 0);
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn activate_toggles_only_when_sent() {
        let dialer = FakeDialer::default();
        let pipe = dialer.accept_next();
        let mut client = client(&dialer, options(false, false));

        assert!(client.activate().is_err());
        assert!(client.session().is_active());

        client.connect("app:8080").unwrap();
        client.activate().unwrap();
        assert!(!client.session().is_active());
        client.step().unwrap();
        client.key_down(32).unwrap();
        assert!(!pipe.written().is_empty());
    }

    #[test]
    fn sending_while_disconnected_is_logged() {
        let dialer = FakeDialer::default();
        let mut client = client(&dialer, options(false, false));

        let err = client.send(&Message::new("application.service.step")).unwrap_err();
        assert!(matches!(err, ClientError::NotConnected));
        let record = client.session().diagnostics.last().unwrap();
        assert_eq!(record.level, LogLevel::Error);
        assert_eq!(
            record.text,
            "Can't send a message 'application.service.step' - the application isn't connected!"
        );
    }

    #[test]
    fn oversized_send_is_logged_and_not_written() {
        let dialer = FakeDialer::default();
        let pipe = dialer.accept_next();
        let mut client = client(&dialer, options(false, false));
        client.connect("app:8080").unwrap();

        let err = client
            .send_value("console.eval", json!({"code": "x".repeat(70_000)}))
            .unwrap_err();
        assert!(matches!(err, ClientError::Wire(WireError::MessageTooLarge { .. })));
        assert!(pipe.written().is_empty());
        assert_eq!(
            client.session().diagnostics.last().unwrap().text,
            "Can't send a message longer than 0xFFFF bytes"
        );
    }

    #[test]
    fn custom_handlers_and_duplicates() {
        let dialer = FakeDialer::default();
        let mut client = client(&dialer, options(false, false));
        client
            .register("custom.ping", |session: &mut Session, _: &Message| {
                session.diagnostics.info("pong");
                Ok(())
            })
            .unwrap();
        let err = client
            .register("monitoring.frame", |_: &mut Session, _: &Message| Ok(()))
            .unwrap_err();
        assert!(matches!(err, ClientError::DuplicateHandler(_)));
    }

    #[test]
    fn shutdown_is_silent() {
        let dialer = FakeDialer::default();
        dialer.accept_next();
        let mut client = client(&dialer, options(false, true));
        client.connect("app:8080").unwrap();
        let before = client.session().diagnostics.len();

        client.shutdown();
        client.pump();
        assert_eq!(client.session().diagnostics.len(), before);
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }
}
