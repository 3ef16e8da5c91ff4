use std::time::{Duration, Instant};

use framewatch_client::{Client, ClientError};
use serde::Serialize;

use crate::cmd::{connect, new_client, save_options, Context, ServiceAction, ServiceArgs};
use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::print_report;

/// How long `quit` waits for the application to hang up.
const QUIT_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize)]
struct ServiceReport<'a> {
    server: &'a str,
    action: &'a str,
    active: bool,
    closed_by_peer: bool,
}

pub fn run(args: ServiceArgs, context: &Context) -> CliResult<i32> {
    let mut client = new_client(context)?;
    let server = connect(&mut client, args.addr.as_deref())?;

    let result = send_action(&mut client, args.action);
    let closed_by_peer =
        result.is_ok() && args.action == ServiceAction::Quit && wait_for_close(&mut client);
    let active = client.session().is_active();
    client.shutdown();
    result.map_err(|err| client_error("service command failed", err))?;
    save_options(&mut client, context)?;

    let action = action_name(args.action);
    let report = ServiceReport {
        server: &server,
        action,
        active,
        closed_by_peer,
    };
    let rows = [
        ("server", server.clone()),
        ("action", action.to_string()),
        ("active", active.to_string()),
        ("closed_by_peer", closed_by_peer.to_string()),
    ];
    print_report(&report, &rows, context.format);
    Ok(SUCCESS)
}

fn send_action(client: &mut Client, action: ServiceAction) -> Result<(), ClientError> {
    match action {
        ServiceAction::Activate => client.activate(),
        ServiceAction::Step => client.step(),
        ServiceAction::Quit => client.quit(),
    }
}

fn wait_for_close(client: &mut Client) -> bool {
    let start = Instant::now();
    while client.is_connected() && start.elapsed() < QUIT_GRACE {
        client.pump();
    }
    !client.is_connected()
}

fn action_name(action: ServiceAction) -> &'static str {
    match action {
        ServiceAction::Activate => "activate",
        ServiceAction::Step => "step",
        ServiceAction::Quit => "quit",
    }
}
