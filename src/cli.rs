use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use mindsync::auth::Provider;

/// Terminal client for the MindSync task service.
/// Runs the interactive task screen when no command is given.
#[derive(Parser)]
#[command(name = "mindsync", version, about = "Manage MindSync tasks from the terminal")]
pub struct Cli {
    /// Path to a config.toml overriding the default location.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the interactive task screen.
    Tui,
    /// Print tasks grouped into Overdue, Today, Upcoming and Completed.
    List,
    /// Add a task, e.g. `mindsync add Buy milk !high #errands`.
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        /// Due date, `YYYY-MM-DD HH:MM` or `YYYY-MM-DD`.
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Toggle a task between completed and pending.
    Done { id: String },
    /// Delete a task.
    Delete { id: String },
    /// Sign in with email and password.
    Login {
        email: String,
        #[arg(long, env = "MINDSYNC_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in.
    Register {
        name: String,
        email: String,
        #[arg(long, env = "MINDSYNC_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign in with a token issued by Google or Apple.
    SignIn {
        #[arg(value_enum)]
        provider: ProviderArg,
        token: String,
    },
    /// Forget the saved session.
    Logout,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ProviderArg {
    Google,
    Apple,
}

impl From<ProviderArg> for Provider {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Google => Provider::Google,
            ProviderArg::Apple => Provider::Apple,
        }
    }
}
