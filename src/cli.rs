use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use rgw_ratelimit::RateLimitSpec;

fn limit_args() -> Vec<Arg> {
    vec![
        Arg::new("enabled")
            .long("enabled")
            .num_args(1)
            .value_parser(value_parser!(bool))
            .help("Turn the limit on or off"),
        Arg::new("max-read-bytes")
            .long("max-read-bytes")
            .num_args(1)
            .value_parser(value_parser!(i64))
            .help("Max bytes read"),
        Arg::new("max-write-bytes")
            .long("max-write-bytes")
            .num_args(1)
            .value_parser(value_parser!(i64))
            .help("Max bytes written"),
        Arg::new("max-read-ops")
            .long("max-read-ops")
            .num_args(1)
            .value_parser(value_parser!(i64))
            .help("Max read operations"),
        Arg::new("max-write-ops")
            .long("max-write-ops")
            .num_args(1)
            .value_parser(value_parser!(i64))
            .help("Max write operations"),
    ]
}

fn uid_arg() -> Arg {
    Arg::new("uid")
        .long("uid")
        .num_args(1)
        .required(true)
        .help("User ID")
}

fn bucket_arg() -> Arg {
    Arg::new("bucket")
        .long("bucket")
        .num_args(1)
        .required(true)
        .help("Bucket name")
}

pub fn build_cli() -> Command {
    Command::new("rgw-ratelimit")
        .about("Manage Ceph RadosGW rate limits through the admin ops API")
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .num_args(1)
                .global(true)
                .help("Override RUST_LOG level (e.g., info, debug)"),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .help("Print version and exit")
                .action(ArgAction::SetTrue),
        )
        .disable_version_flag(true)
        .subcommand(
            Command::new("user")
                .about("Per-user rate limits")
                .subcommand_required(true)
                .subcommand(Command::new("get").arg(uid_arg()))
                .subcommand(Command::new("set").arg(uid_arg()).args(limit_args())),
        )
        .subcommand(
            Command::new("bucket")
                .about("Per-bucket rate limits")
                .subcommand_required(true)
                .subcommand(Command::new("get").arg(bucket_arg()))
                .subcommand(Command::new("set").arg(bucket_arg()).args(limit_args())),
        )
        .subcommand(
            Command::new("global")
                .about("Gateway-wide rate limits")
                .subcommand_required(true)
                .subcommand(Command::new("get"))
                .subcommand(
                    Command::new("set")
                        .arg(
                            Arg::new("scope")
                                .long("scope")
                                .num_args(1)
                                .required(true)
                                .value_parser(["user", "bucket", "anon"])
                                .help("Which global limit to set"),
                        )
                        .args(limit_args()),
                ),
        )
}

/// The global limits that can be set. `global` itself is only ever read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalTarget {
    User,
    Bucket,
    Anon,
}

impl GlobalTarget {
    fn from_arg(s: &str) -> Option<Self> {
        match s {
            "user" => Some(GlobalTarget::User),
            "bucket" => Some(GlobalTarget::Bucket),
            "anon" => Some(GlobalTarget::Anon),
            _ => None,
        }
    }
}

/// What the binary was asked to do, already mapped onto the client API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    GetUser(RateLimitSpec),
    SetUser(RateLimitSpec),
    GetBucket(RateLimitSpec),
    SetBucket(RateLimitSpec),
    GetGlobal,
    SetGlobal(GlobalTarget, RateLimitSpec),
}

fn apply_limits(spec: &mut RateLimitSpec, m: &ArgMatches) {
    spec.enabled = m.get_one::<bool>("enabled").copied();
    spec.max_read_bytes = m.get_one::<i64>("max-read-bytes").copied();
    spec.max_write_bytes = m.get_one::<i64>("max-write-bytes").copied();
    spec.max_read_ops = m.get_one::<i64>("max-read-ops").copied();
    spec.max_write_ops = m.get_one::<i64>("max-write-ops").copied();
}

pub fn action_from_matches(matches: &ArgMatches) -> Option<Action> {
    let (group, sub) = matches.subcommand()?;
    let (op, m) = sub.subcommand()?;
    let mut spec = RateLimitSpec::default();
    let action = match (group, op) {
        ("user", "get") => {
            spec.uid = m.get_one::<String>("uid").cloned();
            Action::GetUser(spec)
        }
        ("user", "set") => {
            spec.uid = m.get_one::<String>("uid").cloned();
            apply_limits(&mut spec, m);
            Action::SetUser(spec)
        }
        ("bucket", "get") => {
            spec.bucket = m.get_one::<String>("bucket").cloned();
            Action::GetBucket(spec)
        }
        ("bucket", "set") => {
            spec.bucket = m.get_one::<String>("bucket").cloned();
            apply_limits(&mut spec, m);
            Action::SetBucket(spec)
        }
        ("global", "get") => Action::GetGlobal,
        ("global", "set") => {
            let target = GlobalTarget::from_arg(m.get_one::<String>("scope")?)?;
            spec.global = Some(true);
            apply_limits(&mut spec, m);
            Action::SetGlobal(target, spec)
        }
        _ => return None,
    };
    Some(action)
}

pub fn init_logging(level: Option<&str>) {
    // Respect explicit level, else default to info, allow env override via RUST_LOG
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(lvl) = level {
        builder.parse_filters(lvl);
    }
    // Logs go to stderr so stdout stays machine readable.
    builder.target(env_logger::Target::Stderr).init();
}
