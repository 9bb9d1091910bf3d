use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use pxr_reconcile::{DesiredState, ReconcileError};
use pxr_schemas::{ConfigSettings, Direction, PersistenceLayer, TransferAction};
use serde_json::{json, Value};

mod commands;

#[derive(Parser)]
#[command(name = "pxr")]
#[command(about = "Reconcile ProxySQL admin configuration", long_about = None)]
struct Cli {
    #[command(flatten)]
    login: LoginArgs,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set or read one global variable
    Variable(VariableArgs),

    /// Ensure a frontend/backend user is present or absent
    User(UserArgs),

    /// Ensure a backend server is present or absent
    Server(ServerArgs),

    /// Ensure a scheduler job is present or absent
    Schedule(ScheduleArgs),

    /// Move whole config families between persistence layers
    Transfer(TransferArgs),

    /// Compute layered config hash + report unused keys
    ConfigHash {
        /// Paths in merge order (base -> site -> host...)
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

/// Where the admin interface lives and how to log in.
#[derive(Args, Debug, Default)]
struct LoginArgs {
    /// Layered config paths in merge order
    #[arg(long = "config", global = true)]
    config_paths: Vec<String>,

    #[arg(long, global = true)]
    login_host: Option<String>,

    #[arg(long, global = true, allow_hyphen_values = true)]
    login_port: Option<i64>,

    #[arg(long, global = true)]
    login_user: Option<String>,

    #[arg(long, global = true)]
    login_unix_socket: Option<PathBuf>,

    /// my.cnf-style file with a [client] user/password
    #[arg(long, global = true)]
    credentials_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PropagationArgs {
    /// Decide and report, but do not write
    #[arg(long)]
    dry_run: bool,

    /// Skip SAVE ... TO DISK after a change
    #[arg(long)]
    no_save_to_disk: bool,

    /// Skip LOAD ... TO RUNTIME after a change
    #[arg(long)]
    no_load_to_runtime: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StateArg {
    Present,
    Absent,
}

impl From<StateArg> for DesiredState {
    fn from(s: StateArg) -> Self {
        match s {
            StateArg::Present => DesiredState::Present,
            StateArg::Absent => DesiredState::Absent,
        }
    }
}

#[derive(Args, Debug)]
struct StateArgs {
    #[arg(long, value_enum, default_value_t = StateArg::Present)]
    state: StateArg,

    /// Allow --state absent to delete more than one matching row
    #[arg(long)]
    force_delete: bool,

    /// Set a nullable field to NULL explicitly (repeatable)
    #[arg(long = "clear", value_name = "FIELD")]
    clear: Vec<String>,
}

#[derive(Args, Debug)]
struct VariableArgs {
    /// Variable name, e.g. mysql-max_connections
    #[arg(long)]
    name: String,

    /// Desired value. Omit to read the current value.
    #[arg(long)]
    value: Option<String>,

    #[command(flatten)]
    propagation: PropagationArgs,
}

#[derive(Args, Debug)]
struct UserArgs {
    #[arg(long)]
    username: String,

    #[arg(long, value_name = "BOOL")]
    backend: Option<bool>,

    #[arg(long, value_name = "BOOL")]
    frontend: Option<bool>,

    /// Env var holding the user's password
    #[arg(long, value_name = "VAR")]
    password_env: Option<String>,

    #[arg(long, value_name = "BOOL")]
    active: Option<bool>,

    #[arg(long, value_name = "BOOL")]
    use_ssl: Option<bool>,

    #[arg(long)]
    default_hostgroup: Option<i64>,

    #[arg(long)]
    default_schema: Option<String>,

    #[arg(long, value_name = "BOOL")]
    transaction_persistent: Option<bool>,

    #[arg(long, value_name = "BOOL")]
    fast_forward: Option<bool>,

    #[arg(long)]
    max_connections: Option<i64>,

    #[command(flatten)]
    state: StateArgs,

    #[command(flatten)]
    propagation: PropagationArgs,
}

#[derive(Args, Debug)]
struct ServerArgs {
    #[arg(long)]
    hostgroup_id: Option<i64>,

    #[arg(long)]
    hostname: String,

    #[arg(long, allow_hyphen_values = true)]
    port: Option<i64>,

    /// ONLINE, OFFLINE_SOFT, OFFLINE_HARD
    #[arg(long)]
    status: Option<String>,

    #[arg(long)]
    weight: Option<i64>,

    #[arg(long, allow_hyphen_values = true)]
    compression: Option<i64>,

    #[arg(long)]
    max_connections: Option<i64>,

    #[arg(long, allow_hyphen_values = true)]
    max_replication_lag: Option<i64>,

    #[arg(long, value_name = "BOOL")]
    use_ssl: Option<bool>,

    #[arg(long)]
    max_latency_ms: Option<i64>,

    #[arg(long)]
    comment: Option<String>,

    #[command(flatten)]
    state: StateArgs,

    #[command(flatten)]
    propagation: PropagationArgs,
}

#[derive(Args, Debug)]
struct ScheduleArgs {
    #[arg(long, value_name = "BOOL")]
    active: Option<bool>,

    #[arg(long, allow_hyphen_values = true)]
    interval_ms: Option<i64>,

    /// Script or binary the scheduler runs
    #[arg(long)]
    filename: String,

    #[arg(long)]
    arg1: Option<String>,

    #[arg(long)]
    arg2: Option<String>,

    #[arg(long)]
    arg3: Option<String>,

    #[arg(long)]
    arg4: Option<String>,

    #[arg(long)]
    arg5: Option<String>,

    #[arg(long)]
    comment: Option<String>,

    #[command(flatten)]
    state: StateArgs,

    #[command(flatten)]
    propagation: PropagationArgs,
}

#[derive(Args, Debug)]
struct TransferArgs {
    /// LOAD or SAVE
    #[arg(long)]
    action: TransferAction,

    /// FROM or TO
    #[arg(long)]
    direction: Direction,

    /// CONFIG, DISK, MEMORY or RUNTIME
    #[arg(long)]
    layer: PersistenceLayer,

    /// Config family, e.g. "MYSQL USERS" (repeatable, issued in order)
    #[arg(long = "family", required = true)]
    families: Vec<ConfigSettings>,

    /// List the commands without sending them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(out) => {
            println!("{out}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err:#}");
            println!("{}", failure_body(&err));
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr; stdout carries only the JSON result.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

async fn run(cli: Cli) -> Result<Value> {
    let login = &cli.login;
    match &cli.cmd {
        Commands::Variable(args) => {
            let desired = commands::record::variable_descriptor(args)?;
            commands::record::apply(login, &args.propagation, desired, DesiredState::Present, false)
                .await
        }
        Commands::User(args) => {
            let desired = commands::record::user_descriptor(args)?;
            commands::record::apply(
                login,
                &args.propagation,
                desired,
                args.state.state.into(),
                args.state.force_delete,
            )
            .await
        }
        Commands::Server(args) => {
            let desired = commands::record::server_descriptor(args)?;
            commands::record::apply(
                login,
                &args.propagation,
                desired,
                args.state.state.into(),
                args.state.force_delete,
            )
            .await
        }
        Commands::Schedule(args) => {
            let desired = commands::record::schedule_descriptor(args)?;
            commands::record::apply(
                login,
                &args.propagation,
                desired,
                args.state.state.into(),
                args.state.force_delete,
            )
            .await
        }
        Commands::Transfer(args) => commands::transfer::run(login, args).await,
        Commands::ConfigHash { paths } => commands::config_hash(paths),
    }
}

fn failure_body(err: &anyhow::Error) -> Value {
    match err.downcast_ref::<ReconcileError>() {
        Some(e) => json!({
            "failed": true,
            "error": e.code(),
            "msg": e.to_string(),
        }),
        None => json!({
            "failed": true,
            "msg": format!("{err:#}"),
        }),
    }
}
