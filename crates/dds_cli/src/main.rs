//! `dds` command-line entry point.
//!
//! # Responsibility
//! - Resolve settings from flags and `DDS_*` environment variables.
//! - Initialize optional file logging, open the store, dispatch a command.

mod commands;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dds_core::{default_log_level, init_logging, open_db, HashKey, ListQuery, LogSettings};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "dds", version, about = "Manage the dds data vault store")]
pub struct Cli {
    /// Store file attached as the `dds` schema.
    #[arg(long, env = "DDS_DB_PATH", default_value = "dds.sqlite3", global = true)]
    pub db: PathBuf,

    /// trace|debug|info|warn|error
    #[arg(long, env = "DDS_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when unset.
    #[arg(long, env = "DDS_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    /// Also echo warnings and errors to stderr (`true|false` via env).
    #[arg(long, env = "DDS_LOG_ECHO", global = true)]
    pub log_echo: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the store (if needed) and apply the schema.
    Init,
    /// Print schema version and row counts.
    Status,
    /// User hub rows.
    User {
        #[command(subcommand)]
        command: UserCommand,
    },
    /// Letter hub and content rows.
    Letter {
        #[command(subcommand)]
        command: LetterCommand,
    },
    /// Post link rows.
    Post {
        #[command(subcommand)]
        command: PostCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    Add {
        #[arg(long)]
        id: i32,
        #[arg(long)]
        hash: HashKey,
    },
    List(ListArgs),
}

#[derive(Debug, Subcommand)]
pub enum LetterCommand {
    /// Insert a letter hub row, plus its content when title and body are given.
    Add {
        #[arg(long)]
        id: i32,
        #[arg(long)]
        hash: HashKey,
        #[arg(long, requires = "body")]
        title: Option<String>,
        #[arg(long, requires = "title")]
        body: Option<String>,
    },
    /// Print one letter with its content and posting users.
    Show {
        #[arg(long)]
        hash: HashKey,
    },
    List(ListArgs),
}

#[derive(Debug, Subcommand)]
pub enum PostCommand {
    /// Link existing user and letter hubs.
    Add {
        #[arg(long)]
        user: HashKey,
        #[arg(long)]
        letter: HashKey,
    },
    /// Write hubs, content and link in one transaction.
    Publish {
        #[arg(long)]
        user_id: i32,
        #[arg(long)]
        user_hash: HashKey,
        #[arg(long)]
        letter_id: i32,
        #[arg(long)]
        letter_hash: HashKey,
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
    },
    List {
        #[arg(long, conflicts_with = "letter")]
        user: Option<HashKey>,
        #[arg(long)]
        letter: Option<HashKey>,
        #[command(flatten)]
        page: ListArgs,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    #[arg(long)]
    pub limit: Option<u32>,
    #[arg(long, default_value_t = 0)]
    pub offset: u32,
}

impl ListArgs {
    pub fn query(&self) -> ListQuery {
        ListQuery {
            limit: self.limit,
            offset: self.offset,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        let mut settings = LogSettings::new(level, log_dir);
        settings.echo_stderr = cli.log_echo;
        init_logging(&settings).context("failed to initialize logging")?;
    }

    let mut conn = open_db(&cli.db)
        .with_context(|| format!("failed to open store `{}`", cli.db.display()))?;
    info!("event=cli_command module=cli status=start command={}", cli.command.name());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    commands::execute(&mut conn, &cli.command, &cli.db, &mut out)
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Status => "status",
            Self::User { .. } => "user",
            Self::Letter { .. } => "letter",
            Self::Post { .. } => "post",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command, LetterCommand, PostCommand};
    use clap::Parser;

    const KEY_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const KEY_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    #[test]
    fn parses_global_db_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["dds", "status", "--db", "/tmp/vault.sqlite3"]).unwrap();
        assert_eq!(cli.db.to_str(), Some("/tmp/vault.sqlite3"));
        assert!(matches!(cli.command, Command::Status));
    }

    #[test]
    fn log_echo_is_off_unless_requested() {
        let quiet = Cli::try_parse_from(["dds", "--log-dir", "/tmp/dds-logs", "init"]).unwrap();
        assert!(!quiet.log_echo);

        let echoing = Cli::try_parse_from(["dds", "init", "--log-echo"]).unwrap();
        assert!(echoing.log_echo);
        assert!(matches!(echoing.command, Command::Init));
    }

    #[test]
    fn rejects_malformed_hash_key() {
        let err = Cli::try_parse_from(["dds", "user", "add", "--id", "1", "--hash", "nope"])
            .unwrap_err();
        assert!(err.to_string().contains("32 characters"));
    }

    #[test]
    fn letter_title_requires_body() {
        let result = Cli::try_parse_from([
            "dds", "letter", "add", "--id", "1", "--hash", KEY_B, "--title", "Hello",
        ]);
        assert!(result.is_err());

        let cli = Cli::try_parse_from([
            "dds", "letter", "add", "--id", "1", "--hash", KEY_B, "--title", "Hello", "--body",
            "Body",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Letter {
                command: LetterCommand::Add { title: Some(_), body: Some(_), .. }
            }
        ));
    }

    #[test]
    fn post_list_filters_are_exclusive() {
        let result = Cli::try_parse_from([
            "dds", "post", "list", "--user", KEY_A, "--letter", KEY_B,
        ]);
        assert!(result.is_err());

        let cli = Cli::try_parse_from(["dds", "post", "list", "--user", KEY_A, "--limit", "5"])
            .unwrap();
        match cli.command {
            Command::Post {
                command: PostCommand::List { user, letter, page },
            } => {
                assert_eq!(user.map(|key| key.to_string()), Some(KEY_A.to_string()));
                assert!(letter.is_none());
                assert_eq!(page.limit, Some(5));
                assert_eq!(page.offset, 0);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
