use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use framewatch_client::{Client, ClientConfig, ClientOptions};

use crate::exit::{client_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod send;
pub mod service;
pub mod timeline;
pub mod version;
pub mod watch;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect, ingest telemetry and print log records and a summary.
    Watch(WatchArgs),
    /// Send a single message.
    Send(SendArgs),
    /// Send a service command (activate, step, quit).
    Service(ServiceArgs),
    /// Collect telemetry for a while and print the timeline layout.
    Timeline(TimelineArgs),
    /// Show version information.
    Version(VersionArgs),
}

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub format: OutputFormat,
    pub options: Option<PathBuf>,
}

pub fn run(command: Command, context: &Context) -> CliResult<i32> {
    match command {
        Command::Watch(args) => watch::run(args, context),
        Command::Send(args) => send::run(args, context),
        Command::Service(args) => service::run(args, context),
        Command::Timeline(args) => timeline::run(args, context),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Application address (host:port). Default: the remembered server.
    pub addr: Option<String>,
    /// Keep probing for the application instead of failing when it is absent.
    #[arg(long)]
    pub probe: bool,
    /// Exit after N frames.
    #[arg(long)]
    pub frames: Option<u64>,
    /// Exit after this long (e.g. 10s, 500ms).
    #[arg(long)]
    pub duration: Option<String>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Application address (host:port). Default: the remembered server.
    pub addr: Option<String>,
    /// Message type.
    #[arg(long = "type", short = 't', value_name = "TYPE")]
    pub msg_type: String,
    /// Message fields as a JSON object.
    #[arg(long)]
    pub json: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ServiceAction {
    Activate,
    Step,
    Quit,
}

#[derive(Args, Debug)]
pub struct ServiceArgs {
    /// Command to send.
    #[arg(value_enum)]
    pub action: ServiceAction,
    /// Application address (host:port). Default: the remembered server.
    pub addr: Option<String>,
}

#[derive(Args, Debug)]
pub struct TimelineArgs {
    /// Application address (host:port). Default: the remembered server.
    pub addr: Option<String>,
    /// How long to collect before laying out (e.g. 2s, 500ms).
    #[arg(long, default_value = "2s")]
    pub duration: String,
    /// Viewport width in pixels.
    #[arg(long, default_value_t = 1200.0)]
    pub width: f64,
    /// Viewport height in pixels.
    #[arg(long, default_value_t = 400.0)]
    pub height: f64,
    /// Zoom factor.
    #[arg(long, default_value_t = 1.0)]
    pub zoom: f64,
    /// Scroll to the newest frames instead of the oldest.
    #[arg(long)]
    pub follow: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn load_options(context: &Context) -> CliResult<ClientOptions> {
    match &context.options {
        Some(path) => {
            ClientOptions::load(path).map_err(|err| client_error("loading options failed", err))
        }
        None => Ok(ClientOptions::default()),
    }
}

/// Build a TCP client from the loaded options. Nothing is dialed and no
/// probe fires until the command connects or ticks.
pub(crate) fn new_client(context: &Context) -> CliResult<Client> {
    let options = load_options(context)?;
    Client::tcp(ClientConfig::default(), options)
        .map_err(|err| client_error("client setup failed", err))
}

/// Connect to `addr`, or to the remembered server when none is given.
pub(crate) fn connect(client: &mut Client, addr: Option<&str>) -> CliResult<String> {
    let addr = addr
        .map(str::to_string)
        .unwrap_or_else(|| client.session().options.server.clone());
    client
        .connect(&addr)
        .map_err(|err| client_error("connect failed", err))?;
    Ok(addr)
}

/// Persist options the session changed, when an options file is in use.
pub(crate) fn save_options(client: &mut Client, context: &Context) -> CliResult<()> {
    let Some(path) = &context.options else {
        return Ok(());
    };
    if !client.session_mut().take_options_dirty() {
        return Ok(());
    }
    client
        .session()
        .options
        .save(path)
        .map_err(|err| client_error("saving options failed", err))
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
