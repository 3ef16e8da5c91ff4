use framewatch_wire::Message;
use serde::Serialize;
use serde_json::Value;

use crate::cmd::{connect, new_client, save_options, Context, SendArgs};
use crate::exit::{client_error, wire_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::print_report;

#[derive(Debug, Serialize)]
struct SendReport<'a> {
    server: &'a str,
    #[serde(rename = "type")]
    msg_type: &'a str,
    fields: usize,
}

pub fn run(args: SendArgs, context: &Context) -> CliResult<i32> {
    let message = build_message(&args)?;

    let mut client = new_client(context)?;
    let server = connect(&mut client, args.addr.as_deref())?;
    let sent = client.send(&message);
    client.shutdown();
    sent.map_err(|err| client_error("send failed", err))?;
    save_options(&mut client, context)?;

    let report = SendReport {
        server: &server,
        msg_type: &message.msg_type,
        fields: message.fields.len(),
    };
    let rows = [
        ("server", server.clone()),
        ("type", message.msg_type.clone()),
        ("fields", report.fields.to_string()),
    ];
    print_report(&report, &rows, context.format);
    Ok(SUCCESS)
}

fn build_message(args: &SendArgs) -> CliResult<Message> {
    if args.msg_type.trim().is_empty() {
        return Err(CliError::new(USAGE, "--type must not be empty"));
    }
    let fields = match &args.json {
        Some(json) => serde_json::from_str::<Value>(json)
            .map_err(|err| CliError::new(USAGE, format!("--json is not valid JSON: {err}")))?,
        None => Value::Null,
    };
    Message::from_value(args.msg_type.as_str(), fields)
        .map_err(|err| wire_error("--json must be an object", err))
}
