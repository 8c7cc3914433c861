use crate::command::{Command, Descriptor, Method};
use clap::{value_t, App, AppSettings, Arg, ArgMatches, ErrorKind, SubCommand};
use std::path::PathBuf;

fn positional(name: &'static str, help: &'static str) -> Arg<'static, 'static> {
    Arg::with_name(name).required(true).help(help)
}

fn option(name: &'static str, short: &'static str, help: &'static str) -> Arg<'static, 'static> {
    Arg::with_name(name)
        .short(short)
        .long(name)
        .takes_value(true)
        .help(help)
}

fn list(about: &'static str) -> App<'static, 'static> {
    SubCommand::with_name("list")
        .about(about)
        .arg(option("limit", "l", "Maximum number of items to return."))
        .arg(option("offset", "o", "Number of items to skip.").requires("limit"))
}

fn parser() -> App<'static, 'static> {
    App::new("sensu-cli")
        .about("Query and control a Sensu server through its REST API.")
        .version(env!("CARGO_PKG_VERSION"))
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("config")
                .long("config")
                .takes_value(true)
                .help("Settings file to use instead of ~/.sensu/settings.toml."),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Log requests and responses to stderr."),
        )
        .arg(
            Arg::with_name("no-color")
                .long("no-color")
                .help("Disable colored output."),
        )
        .subcommand(
            SubCommand::with_name("client")
                .about("List, show or delete clients.")
                .setting(AppSettings::SubcommandRequiredElseHelp)
                .subcommand(list("List clients."))
                .subcommand(
                    SubCommand::with_name("show")
                        .about("Show a client.")
                        .arg(positional("NAME", "Client name.")),
                )
                .subcommand(
                    SubCommand::with_name("history")
                        .about("Show the check history of a client.")
                        .arg(positional("NAME", "Client name.")),
                )
                .subcommand(
                    SubCommand::with_name("delete")
                        .about("Delete a client.")
                        .arg(positional("NAME", "Client name.")),
                ),
        )
        .subcommand(SubCommand::with_name("info").about("Show server information."))
        .subcommand(
            SubCommand::with_name("health")
                .about("Check transport health.")
                .arg(option("consumers", "c", "Minimum number of transport consumers.").required(true))
                .arg(option("messages", "m", "Maximum number of queued messages.").required(true)),
        )
        .subcommand(
            SubCommand::with_name("check")
                .about("List, show or request checks.")
                .setting(AppSettings::SubcommandRequiredElseHelp)
                .subcommand(SubCommand::with_name("list").about("List checks."))
                .subcommand(
                    SubCommand::with_name("show")
                        .about("Show a check definition.")
                        .arg(positional("NAME", "Check name.")),
                )
                .subcommand(
                    SubCommand::with_name("request")
                        .about("Request a check execution.")
                        .arg(positional("CHECK", "Check name."))
                        .arg(positional("SUBSCRIBERS", "Comma separated subscribers.")),
                ),
        )
        .subcommand(
            SubCommand::with_name("event")
                .about("List, show or delete events.")
                .setting(AppSettings::SubcommandRequiredElseHelp)
                .subcommand(SubCommand::with_name("list").about("List current events."))
                .subcommand(
                    SubCommand::with_name("show")
                        .about("Show the events of a client.")
                        .arg(positional("CLIENT", "Client name."))
                        .arg(option("check", "k", "Limit to a single check.")),
                )
                .subcommand(
                    SubCommand::with_name("delete")
                        .about("Delete an event.")
                        .arg(positional("CLIENT", "Client name."))
                        .arg(positional("CHECK", "Check name.")),
                ),
        )
        .subcommand(
            SubCommand::with_name("resolve")
                .about("Resolve an event.")
                .arg(positional("CLIENT", "Client name."))
                .arg(positional("CHECK", "Check name.")),
        )
        .subcommand(
            SubCommand::with_name("silence")
                .about("Silence a client or one of its checks.")
                .arg(positional("CLIENT", "Client name."))
                .arg(option("check", "k", "Silence only this check."))
                .arg(option("reason", "r", "Why the alerts are silenced."))
                .arg(option("expires", "e", "Minutes until the silence expires.")),
        )
        .subcommand(
            SubCommand::with_name("stash")
                .about("List, show, create or delete stashes.")
                .setting(AppSettings::SubcommandRequiredElseHelp)
                .subcommand(list("List stashes."))
                .subcommand(
                    SubCommand::with_name("show")
                        .about("Show a stash.")
                        .arg(positional("PATH", "Stash path.")),
                )
                .subcommand(
                    SubCommand::with_name("delete")
                        .about("Delete a stash.")
                        .arg(positional("PATH", "Stash path.")),
                )
                .subcommand(
                    SubCommand::with_name("create")
                        .about("Create a stash interactively.")
                        .arg(positional("PATH", "Stash path.")),
                ),
        )
        .subcommand(
            SubCommand::with_name("aggregate")
                .about("List, show or delete aggregates.")
                .setting(AppSettings::SubcommandRequiredElseHelp)
                .subcommand(list("List aggregates."))
                .subcommand(
                    SubCommand::with_name("show")
                        .about("Show the aggregates of a check.")
                        .arg(positional("CHECK", "Check name."))
                        .arg(option("id", "i", "Aggregate id.")),
                )
                .subcommand(
                    SubCommand::with_name("delete")
                        .about("Delete the aggregates of a check.")
                        .arg(positional("CHECK", "Check name.")),
                ),
        )
}

pub struct Cli {
    pub config: Option<PathBuf>,
    pub verbose: bool,
    pub color: bool,
    pub descriptor: Descriptor,
}

impl Cli {
    pub fn parsed() -> Self {
        let matches = parser().get_matches();
        match Cli::from_matches(&matches) {
            Ok(cli) => cli,
            Err(error) => error.exit(),
        }
    }

    fn from_matches(matches: &ArgMatches) -> Result<Self, clap::Error> {
        Ok(Cli {
            config: matches.value_of("config").map(PathBuf::from),
            verbose: matches.is_present("verbose"),
            color: !matches.is_present("no-color"),
            descriptor: descriptor(matches)?,
        })
    }
}

fn number(args: &ArgMatches, name: &str) -> Result<Option<u64>, clap::Error> {
    if args.is_present(name) {
        value_t!(args, name, u64).map(Some)
    } else {
        Ok(None)
    }
}

fn paginated(descriptor: Descriptor, args: &ArgMatches) -> Result<Descriptor, clap::Error> {
    Ok(descriptor
        .with_opt("limit", number(args, "limit")?)
        .with_opt("offset", number(args, "offset")?))
}

fn subscribers(args: &ArgMatches) -> Option<Vec<String>> {
    args.value_of("SUBSCRIBERS").map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|subscriber| !subscriber.is_empty())
            .map(String::from)
            .collect()
    })
}

fn missing_subcommand(name: &str) -> clap::Error {
    clap::Error::with_description(
        &format!("'{}' requires a subcommand", name),
        ErrorKind::MissingSubcommand,
    )
}

fn descriptor(matches: &ArgMatches) -> Result<Descriptor, clap::Error> {
    let descriptor = match matches.subcommand() {
        ("client", Some(sub)) => match sub.subcommand() {
            ("list", Some(args)) => paginated(Descriptor::new(Command::Clients, Method::Get), args)?,
            ("show", Some(args)) => Descriptor::new(Command::Clients, Method::Get)
                .with_opt("name", args.value_of("NAME")),
            ("history", Some(args)) => Descriptor::new(Command::Clients, Method::Get)
                .with_opt("name", args.value_of("NAME"))
                .with("history", true),
            ("delete", Some(args)) => Descriptor::new(Command::Clients, Method::Delete)
                .with_opt("name", args.value_of("NAME")),
            _ => return Err(missing_subcommand("client")),
        },
        ("info", Some(_)) => Descriptor::new(Command::Info, Method::Get),
        ("health", Some(args)) => Descriptor::new(Command::Health, Method::Get)
            .with_opt("consumers", number(args, "consumers")?)
            .with_opt("messages", number(args, "messages")?),
        ("check", Some(sub)) => match sub.subcommand() {
            ("list", Some(_)) => Descriptor::new(Command::Checks, Method::Get),
            ("show", Some(args)) => Descriptor::new(Command::Checks, Method::Get)
                .with_opt("name", args.value_of("NAME")),
            ("request", Some(args)) => Descriptor::new(Command::Checks, Method::Post)
                .with_opt("check", args.value_of("CHECK"))
                .with_opt("subscribers", subscribers(args)),
            _ => return Err(missing_subcommand("check")),
        },
        ("event", Some(sub)) => match sub.subcommand() {
            ("list", Some(_)) => Descriptor::new(Command::Events, Method::Get),
            ("show", Some(args)) => Descriptor::new(Command::Events, Method::Get)
                .with_opt("client", args.value_of("CLIENT"))
                .with_opt("check", args.value_of("check")),
            ("delete", Some(args)) => Descriptor::new(Command::Events, Method::Delete)
                .with_opt("client", args.value_of("CLIENT"))
                .with_opt("check", args.value_of("CHECK")),
            _ => return Err(missing_subcommand("event")),
        },
        ("resolve", Some(args)) => Descriptor::new(Command::Resolve, Method::Post)
            .with_opt("client", args.value_of("CLIENT"))
            .with_opt("check", args.value_of("CHECK")),
        ("silence", Some(args)) => Descriptor::new(Command::Silence, Method::Post)
            .with_opt("client", args.value_of("CLIENT"))
            .with_opt("check", args.value_of("check"))
            .with_opt("reason", args.value_of("reason"))
            .with_opt("expires", number(args, "expires")?),
        ("stash", Some(sub)) => match sub.subcommand() {
            ("list", Some(args)) => paginated(Descriptor::new(Command::Stashes, Method::Get), args)?,
            ("show", Some(args)) => Descriptor::new(Command::Stashes, Method::Get)
                .with_opt("path", args.value_of("PATH")),
            ("delete", Some(args)) => Descriptor::new(Command::Stashes, Method::Delete)
                .with_opt("path", args.value_of("PATH")),
            ("create", Some(args)) => Descriptor::new(Command::Stashes, Method::Post)
                .with("create", true)
                .with_opt("create_path", args.value_of("PATH")),
            _ => return Err(missing_subcommand("stash")),
        },
        ("aggregate", Some(sub)) => match sub.subcommand() {
            ("list", Some(args)) => {
                paginated(Descriptor::new(Command::Aggregates, Method::Get), args)?
            }
            ("show", Some(args)) => Descriptor::new(Command::Aggregates, Method::Get)
                .with_opt("check", args.value_of("CHECK"))
                .with_opt("id", args.value_of("id")),
            ("delete", Some(args)) => Descriptor::new(Command::Aggregates, Method::Delete)
                .with_opt("check", args.value_of("CHECK")),
            _ => return Err(missing_subcommand("aggregate")),
        },
        _ => return Err(missing_subcommand("sensu-cli")),
    };
    Ok(descriptor)
}

#[cfg(test)]
fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    let matches = parser().get_matches_from_safe(args.iter().copied())?;
    Cli::from_matches(&matches)
}

#[test]
fn test_min_cli() {
    let cli = parse(&["sensu-cli", "info"]).unwrap();
    assert_eq!(cli.config, None);
    assert_eq!(cli.verbose, false);
    assert_eq!(cli.color, true);
    assert_eq!(cli.descriptor, Descriptor::new(Command::Info, Method::Get));
}

#[test]
fn test_global_options() {
    let cli = parse(&[
        "sensu-cli",
        "--config",
        "/tmp/settings.toml",
        "-v",
        "--no-color",
        "event",
        "list",
    ])
    .unwrap();
    assert_eq!(cli.config, Some(PathBuf::from("/tmp/settings.toml")));
    assert_eq!(cli.verbose, true);
    assert_eq!(cli.color, false);
    assert_eq!(cli.descriptor, Descriptor::new(Command::Events, Method::Get));
}

#[test]
fn test_client_commands() {
    let list = parse(&["sensu-cli", "client", "list", "-l", "10", "-o", "20"]).unwrap();
    assert_eq!(
        list.descriptor,
        Descriptor::new(Command::Clients, Method::Get)
            .with("limit", 10u64)
            .with("offset", 20u64)
    );

    let history = parse(&["sensu-cli", "client", "history", "web-01"]).unwrap();
    assert_eq!(
        history.descriptor,
        Descriptor::new(Command::Clients, Method::Get)
            .with("name", "web-01")
            .with("history", true)
    );

    let delete = parse(&["sensu-cli", "client", "delete", "web-01"]).unwrap();
    assert_eq!(delete.descriptor.method(), Method::Delete);
}

#[test]
fn test_offset_requires_limit() {
    assert!(parse(&["sensu-cli", "stash", "list", "-o", "5"]).is_err());
    assert!(parse(&["sensu-cli", "stash", "list", "-l", "ten"]).is_err());
}

#[test]
fn test_health_command() {
    let health = parse(&["sensu-cli", "health", "-c", "2", "-m", "100"]).unwrap();
    assert_eq!(
        health.descriptor,
        Descriptor::new(Command::Health, Method::Get)
            .with("consumers", 2u64)
            .with("messages", 100u64)
    );
    assert!(parse(&["sensu-cli", "health", "-c", "2"]).is_err());
}

#[test]
fn test_check_request() {
    let request = parse(&["sensu-cli", "check", "request", "cpu", "web, db"]).unwrap();
    assert_eq!(
        request.descriptor,
        Descriptor::new(Command::Checks, Method::Post)
            .with("check", "cpu")
            .with("subscribers", vec!["web".to_owned(), "db".to_owned()])
    );
}

#[test]
fn test_silence_command() {
    let silence = parse(&[
        "sensu-cli", "silence", "web-01", "-k", "cpu", "-r", "deploy", "-e", "30",
    ])
    .unwrap();
    assert_eq!(
        silence.descriptor,
        Descriptor::new(Command::Silence, Method::Post)
            .with("client", "web-01")
            .with("check", "cpu")
            .with("reason", "deploy")
            .with("expires", 30u64)
    );
}

#[test]
fn test_stash_create() {
    let create = parse(&["sensu-cli", "stash", "create", "maintenance/web-01"]).unwrap();
    assert_eq!(
        create.descriptor,
        Descriptor::new(Command::Stashes, Method::Post)
            .with("create", true)
            .with("create_path", "maintenance/web-01")
    );
}

#[test]
fn test_aggregate_show() {
    let show = parse(&["sensu-cli", "aggregate", "show", "disk", "-i", "1400"]).unwrap();
    assert_eq!(
        show.descriptor,
        Descriptor::new(Command::Aggregates, Method::Get)
            .with("check", "disk")
            .with("id", "1400")
    );
}

#[test]
fn test_missing_subcommand() {
    assert!(parse(&["sensu-cli"]).is_err());
    assert!(parse(&["sensu-cli", "event"]).is_err());
}
