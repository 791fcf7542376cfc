// main.rs

mod app;
mod cli;
mod ui;

use std::fs::{self, OpenOptions};
use std::io;
use std::sync::Arc;

use chrono::Local;
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dotenv::dotenv;
use env_logger::{Env, Target};
use ratatui::{backend::CrosstermBackend, Terminal};

use app::App;
use cli::{Cli, Commands};
use mindsync::api::TaskApi;
use mindsync::auth::AuthApi;
use mindsync::config::Config;
use mindsync::grouping::{group_tasks, Bucket};
use mindsync::parser::{format_datetime_input, parse_datetime_input, parse_quick_add};
use mindsync::session::{Session, SessionFile};
use mindsync::store::TaskStore;
use mindsync::Error;

// The TUI owns the terminal, so its logs go to a file.
fn init_logging(config: &Config, to_file: bool) -> io::Result<()> {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(if to_file {
        "info"
    } else {
        "warn"
    }));
    if to_file {
        if let Some(parent) = config.log_file.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)?;
        builder.target(Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn open_store(config: &Config, session: Option<Session>) -> Result<TaskStore, Error> {
    Ok(TaskStore::new(TaskApi::new(config, session)?))
}

async fn print_buckets(store: &TaskStore) -> Result<(), Error> {
    let tasks = store.load().await?;
    let grouped = group_tasks(&tasks, &Local::now());
    for bucket in Bucket::DISPLAY_ORDER {
        println!("{} ({})", bucket, grouped.bucket(bucket).len());
        for task in grouped.bucket(bucket) {
            let due = task
                .due_date
                .as_ref()
                .map(|d| format!(", due {}", format_datetime_input(d)))
                .unwrap_or_default();
            println!("  [{}] {} ({}{})", task.id, task.title, task.priority, due);
        }
    }
    Ok(())
}

async fn run_tui(store: TaskStore) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(store);
    match store.load().await {
        Err(Error::NoUserIdentifier) => {
            eprintln!("Not signed in. Run `mindsync login <email>` first.");
            return Ok(());
        }
        Err(err) => log::warn!("starting with an empty list: {}", err),
        Ok(_) => {}
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    terminal.hide_cursor()?;

    let app = App::new(store);

    let res = ui::run_app(&mut terminal, app).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let command = cli.command.unwrap_or(Commands::Tui);
    init_logging(&config, matches!(command, Commands::Tui))?;

    let session_file = SessionFile::new(&config.session_path);

    match command {
        Commands::Tui => {
            let store = open_store(&config, session_file.load()?)?;
            run_tui(store).await?;
        }
        Commands::List => {
            let store = open_store(&config, session_file.load()?)?;
            print_buckets(&store).await?;
        }
        Commands::Add {
            text,
            due,
            description,
        } => {
            let mut draft = parse_quick_add(&text.join(" ")).into_draft();
            if draft.title.is_empty() {
                return Err(Error::Validation("title is required".to_string()).into());
            }
            if let Some(raw) = due {
                draft.due_date = Some(parse_datetime_input(&raw).ok_or_else(|| {
                    Error::Validation(format!("could not read due date '{}'", raw))
                })?);
            }
            draft.description = description.filter(|d| !d.is_empty());

            let store = open_store(&config, session_file.load()?)?;
            let tasks = store.add(draft).await?;
            if let Some(task) = tasks.first() {
                println!("Added [{}] {}", task.id, task.title);
            }
        }
        Commands::Done { id } => {
            let store = open_store(&config, session_file.load()?)?;
            store.load().await?;
            store.toggle_status(&id).await?;
            if let Some(task) = store.get(&id) {
                println!("[{}] {} is now {}", task.id, task.title, task.status);
            }
        }
        Commands::Delete { id } => {
            let store = open_store(&config, session_file.load()?)?;
            store.delete(&id).await?;
            println!("Deleted {}", id);
        }
        Commands::Login { email, password } => {
            let session = AuthApi::new(&config)?.login(&email, &password).await?;
            session_file.save(&session)?;
            println!("Signed in as {}", session.email.as_deref().unwrap_or(&email));
        }
        Commands::Register {
            name,
            email,
            password,
        } => {
            let session = AuthApi::new(&config)?
                .register(&name, &email, &password)
                .await?;
            session_file.save(&session)?;
            println!("Welcome, {}", session.name.as_deref().unwrap_or(&name));
        }
        Commands::SignIn { provider, token } => {
            let session = AuthApi::new(&config)?
                .sign_in_with(provider.into(), &token)
                .await?;
            session_file.save(&session)?;
            println!("Signed in as user {}", session.user_id);
        }
        Commands::Logout => {
            session_file.clear()?;
            println!("Signed out");
        }
    }

    Ok(())
}
