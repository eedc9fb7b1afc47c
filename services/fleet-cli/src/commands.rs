//! Subcommand parsing and execution

use anyhow::{Context, Result, anyhow, bail};
use fleet_api::{MachineryType, ReportFilter, RouteStatus, auth, drivers, fuel, routes, users, vehicles};
use fleet_client::ApiClient;
use serde::Serialize;
use serde_json::{Value, json};

pub const USAGE: &str = "\
usage: fleetctl [--config <path>] <command>

commands:
  login <email> <password>
  logout
  whoami
  drivers list [--page N] [--limit N] | get <id> | delete <id>
  vehicles list [--page N] [--limit N] | get <id> | delete <id>
  routes list [--page N] [--limit N] | get <id> | start <id> | complete <id> <liters> | cancel <id>
  fuel report <from> <to> [--vehicle <id>]... [--machinery LIGHT|HEAVY]
  users list";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Paging {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, PartialEq)]
pub enum Command {
    Help,
    Login { email: String, password: String },
    Logout,
    Whoami,
    DriversList(Paging),
    DriversGet(String),
    DriversDelete(String),
    VehiclesList(Paging),
    VehiclesGet(u64),
    VehiclesDelete(u64),
    RoutesList(Paging),
    RoutesGet(u64),
    RouteTransition { id: u64, target: RouteStatus, actual_fuel_l: Option<f64> },
    FuelReport(ReportFilter),
    UsersList,
}

impl Command {
    /// Parse the arguments following the program name and global flags.
    pub fn parse(args: &[String]) -> Result<Self> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let command = match args.as_slice() {
            [] | ["help"] | ["--help"] | ["-h"] => Command::Help,
            ["login", email, password] => Command::Login {
                email: email.to_string(),
                password: password.to_string(),
            },
            ["logout"] => Command::Logout,
            ["whoami"] => Command::Whoami,
            ["drivers", "list", rest @ ..] => Command::DriversList(parse_paging(rest)?),
            ["drivers", "get", id] => Command::DriversGet(id.to_string()),
            ["drivers", "delete", id] => Command::DriversDelete(id.to_string()),
            ["vehicles", "list", rest @ ..] => Command::VehiclesList(parse_paging(rest)?),
            ["vehicles", "get", id] => Command::VehiclesGet(parse_id(id)?),
            ["vehicles", "delete", id] => Command::VehiclesDelete(parse_id(id)?),
            ["routes", "list", rest @ ..] => Command::RoutesList(parse_paging(rest)?),
            ["routes", "get", id] => Command::RoutesGet(parse_id(id)?),
            ["routes", "start", id] => Command::RouteTransition {
                id: parse_id(id)?,
                target: RouteStatus::InProgress,
                actual_fuel_l: None,
            },
            ["routes", "complete", id, liters] => Command::RouteTransition {
                id: parse_id(id)?,
                target: RouteStatus::Completed,
                actual_fuel_l: Some(
                    liters
                        .parse()
                        .with_context(|| format!("invalid liters: {liters}"))?,
                ),
            },
            ["routes", "cancel", id] => Command::RouteTransition {
                id: parse_id(id)?,
                target: RouteStatus::Cancelled,
                actual_fuel_l: None,
            },
            ["fuel", "report", from, to, rest @ ..] => {
                Command::FuelReport(parse_report(from, to, rest)?)
            }
            ["users", "list"] => Command::UsersList,
            _ => bail!("unrecognized command: {}\n\n{USAGE}", args.join(" ")),
        };
        Ok(command)
    }
}

fn parse_id(raw: &str) -> Result<u64> {
    raw.parse().with_context(|| format!("invalid id: {raw}"))
}

fn parse_paging(rest: &[&str]) -> Result<Paging> {
    let mut paging = Paging::default();
    let mut iter = rest.iter();
    while let Some(flag) = iter.next() {
        let value = iter
            .next()
            .ok_or_else(|| anyhow!("{flag} requires a value"))?;
        let parsed: u32 = value
            .parse()
            .with_context(|| format!("invalid value for {flag}: {value}"))?;
        match *flag {
            "--page" => paging.page = Some(parsed),
            "--limit" => paging.limit = Some(parsed),
            other => bail!("unknown flag: {other}"),
        }
    }
    Ok(paging)
}

fn parse_report(from: &str, to: &str, rest: &[&str]) -> Result<ReportFilter> {
    let mut filter = ReportFilter {
        from: from.to_string(),
        to: to.to_string(),
        vehicle_ids: Vec::new(),
        machinery_type: None,
    };
    let mut iter = rest.iter();
    while let Some(flag) = iter.next() {
        let value = iter
            .next()
            .ok_or_else(|| anyhow!("{flag} requires a value"))?;
        match *flag {
            "--vehicle" => filter.vehicle_ids.push(parse_id(value)?),
            "--machinery" => {
                filter.machinery_type = Some(
                    MachineryType::from_name(value)
                        .ok_or_else(|| anyhow!("unknown machinery type: {value}"))?,
                )
            }
            other => bail!("unknown flag: {other}"),
        }
    }
    Ok(filter)
}

/// Execute a command. Returns the JSON document to print, if any.
pub async fn run(client: &ApiClient, command: Command) -> Result<Option<Value>> {
    let output = match command {
        Command::Help => None,
        Command::Login { email, password } => {
            Some(to_json(&auth::login(client, &email, &password).await?)?)
        }
        Command::Logout => {
            auth::logout(client).await;
            None
        }
        Command::Whoami => Some(match auth::current_user(client).await {
            Some(user) => to_json(&user)?,
            None => json!({ "authenticated": false }),
        }),
        Command::DriversList(p) => Some(to_json(&drivers::list(client, p.page, p.limit).await?)?),
        Command::DriversGet(id) => Some(to_json(&drivers::get(client, &id).await?)?),
        Command::DriversDelete(id) => {
            drivers::delete(client, &id).await?;
            Some(json!({ "deleted": id }))
        }
        Command::VehiclesList(p) => Some(to_json(&vehicles::list(client, p.page, p.limit).await?)?),
        Command::VehiclesGet(id) => Some(to_json(&vehicles::get(client, id).await?)?),
        Command::VehiclesDelete(id) => {
            vehicles::delete(client, id).await?;
            Some(json!({ "deleted": id }))
        }
        Command::RoutesList(p) => Some(to_json(&routes::list(client, p.page, p.limit).await?)?),
        Command::RoutesGet(id) => Some(to_json(&routes::get(client, id).await?)?),
        Command::RouteTransition {
            id,
            target,
            actual_fuel_l,
        } => {
            let current = routes::get(client, id).await?;
            if !current.status.can_transition_to(target) {
                bail!(
                    "route {} is {} and cannot move to {}",
                    current.code,
                    current.status.label(),
                    target.label()
                );
            }
            let route = match (target, actual_fuel_l) {
                (RouteStatus::InProgress, _) => routes::start(client, id).await?,
                (RouteStatus::Completed, Some(liters)) => routes::complete(client, id, liters).await?,
                (RouteStatus::Cancelled, _) => routes::cancel(client, id).await?,
                _ => bail!("unsupported route transition to {}", target.label()),
            };
            Some(to_json(&route)?)
        }
        Command::FuelReport(filter) => Some(to_json(&fuel::report(client, &filter).await?)?),
        Command::UsersList => Some(to_json(&users::list(client).await?)?),
    };
    Ok(output)
}

fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).context("failed to serialize output")
}
