mod cmd;
mod model;
mod output;
mod queries;

use clap::{Parser, Subcommand};
use cmd::{
    auth::AuthSubcommand, cache::CacheSubcommand, comment::CommentSubcommand,
    issue::IssueSubcommand, label::LabelSubcommand, profile::ProfileSubcommand,
    project::ProjectSubcommand, team::TeamSubcommand, user::UserSubcommand,
};
use lnr_core::context::Context;
use lnr_core::credentials::CredentialStore;
use lnr_core::env::Environment;
use lnr_core::profile::OutputFormat;
use lnr_core::secret::Secret;
use serde_json::Value;

#[derive(Parser)]
#[command(
    name = "lnr",
    about = "Command-line client for Linear: profiles, cached lookups and GraphQL access",
    version,
    propagate_version = true
)]
struct Cli {
    /// Profile to use (default: $LNR_PROFILE, then "default")
    #[arg(long, global = true)]
    profile: Option<String>,

    /// API key for this invocation (LNR_API_KEY still wins)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log debug detail to stderr
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in, log out and inspect credentials
    Auth {
        #[command(subcommand)]
        subcommand: AuthSubcommand,
    },

    /// Manage named profiles
    Profile {
        #[command(subcommand)]
        subcommand: ProfileSubcommand,
    },

    /// Inspect or clear the local cache
    Cache {
        #[command(subcommand)]
        subcommand: CacheSubcommand,
    },

    /// Teams
    Team {
        #[command(subcommand)]
        subcommand: TeamSubcommand,
    },

    /// Workspace members
    User {
        #[command(subcommand)]
        subcommand: UserSubcommand,
    },

    /// Issue labels
    Label {
        #[command(subcommand)]
        subcommand: LabelSubcommand,
    },

    /// Projects
    Project {
        #[command(subcommand)]
        subcommand: ProjectSubcommand,
    },

    /// Issues
    Issue {
        #[command(subcommand)]
        subcommand: IssueSubcommand,
    },

    /// Issue comments
    Comment {
        #[command(subcommand)]
        subcommand: CommentSubcommand,
    },

    /// Run a raw GraphQL document and print the data as JSON
    Api {
        /// Document text, @file, or @- for stdin
        query: String,
        /// Variable as NAME=VALUE (repeatable); JSON values are parsed
        #[arg(long = "var", value_name = "NAME=VALUE", value_parser = cmd::api::parse_var)]
        vars: Vec<(String, Value)>,
        /// Follow cursor pagination and print every node
        #[arg(long, requires = "connection")]
        paginate: bool,
        /// Dotted path to the paged connection, e.g. team.issues
        #[arg(long, value_name = "PATH")]
        connection: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let env = Environment::from_process();
    let api_key_flag = cli.api_key.and_then(Secret::new);

    // Keys that must never be printed, whatever fails.
    let mut secrets: Vec<Secret> = [&env.api_key, &env.legacy_api_key, &api_key_flag]
        .into_iter()
        .flatten()
        .cloned()
        .collect();

    let result = Context::new(env, cli.profile.as_deref(), api_key_flag)
        .map_err(anyhow::Error::from)
        .and_then(|ctx| {
            if let Ok(Some(stored)) = ctx.store().credential(ctx.profile_name()) {
                secrets.push(stored);
            }
            let json = cli.json || ctx.output() == OutputFormat::Json;
            dispatch(&ctx, cli.command, json)
        });

    if let Err(e) = result {
        eprintln!("error: {}", lnr_cli::render_error(&e, &secrets));
        std::process::exit(lnr_cli::exit_code(&e));
    }
}

fn dispatch(ctx: &Context, command: Commands, json: bool) -> anyhow::Result<()> {
    match command {
        Commands::Auth { subcommand } => cmd::auth::run(ctx, subcommand, json),
        Commands::Profile { subcommand } => cmd::profile::run(ctx, subcommand, json),
        Commands::Cache { subcommand } => cmd::cache::run(ctx, subcommand, json),
        Commands::Team { subcommand } => cmd::team::run(ctx, subcommand, json),
        Commands::User { subcommand } => cmd::user::run(ctx, subcommand, json),
        Commands::Label { subcommand } => cmd::label::run(ctx, subcommand, json),
        Commands::Project { subcommand } => cmd::project::run(ctx, subcommand, json),
        Commands::Issue { subcommand } => cmd::issue::run(ctx, subcommand, json),
        Commands::Comment { subcommand } => cmd::comment::run(ctx, subcommand, json),
        Commands::Api {
            query,
            vars,
            paginate,
            connection,
        } => cmd::api::run(ctx, &query, vars, paginate, connection.as_deref()),
    }
}
