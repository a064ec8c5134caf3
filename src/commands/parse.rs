use anyhow::Result;
use serde::Serialize;

use crate::command::{Command, detect_service, parse_command};
use crate::config::Service;

/// Output of the parse command
#[derive(Debug, Serialize)]
pub struct ParseResponse {
    pub triggered: bool,
    pub service: Option<&'static str>,
    pub command: Option<Command>,
}

pub fn run(body: &str, service: Option<Service>) -> Result<()> {
    let response = inspect(body, service);
    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}

fn inspect(body: &str, service: Option<Service>) -> ParseResponse {
    let detected = detect_service(body);
    let service = service.or(detected);

    ParseResponse {
        triggered: detected.is_some(),
        service: service.map(Service::name),
        command: service.and_then(|s| parse_command(s, body)),
    }
}
