//! # servdesk
//!
//! A small service desk for the command line. Customer service staff file
//! service requests against a fixed catalog, hand them to workers, and workers
//! track their tasks to completion. An admin manages the accounts.
//!
//! ## Getting started
//!
//! The first run seeds three accounts and a three-item service catalog:
//!
//! | Username   | Password     | Role               |
//! |------------|--------------|--------------------|
//! | `admin`    | `admin123`   | `admin`            |
//! | `service1` | `service123` | `customer_service` |
//! | `worker1`  | `worker123`  | `worker`           |
//!
//! ```bash
//! servdesk login service1 service123
//! servdesk service list
//! servdesk request add "Sara" 0500000000 <SERVICE_ID> "Leaking kitchen tap" --priority high
//! servdesk request assign <REQUEST_ID> <WORKER_ID>
//! servdesk task add <REQUEST_ID> <WORKER_ID> "Replace tap washer" --due 2026-11-01
//! ```
//!
//! Workers follow their own queue:
//!
//! ```bash
//! servdesk login worker1 worker123
//! servdesk task list --mine
//! servdesk task status <TASK_ID> in_progress
//! servdesk task note <TASK_ID> "Washer replaced, tap tested"
//! servdesk task status <TASK_ID> completed
//! ```
//!
//! `servdesk stats` prints the dashboard counters.
//!
//! ## Data Storage
//!
//! Every collection is one JSON file in your local data directory:
//! *   Linux: `~/.local/share/servdesk/`
//! *   macOS: `~/Library/Application Support/servdesk/`
//! *   Windows: `%APPDATA%\servdesk\`
//!
//! You can override this by setting the `SERVDESK_DB` environment variable to a directory.
//! Set `RUST_LOG=info` (or `debug`) to see what the store is doing.

use std::io;

use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};

use servdesk::commands::*;
use servdesk::config::Config;
use servdesk::desk::{RequestForm, TaskForm, UserEdit, UserForm};
use servdesk::models::{Priority, RequestStatus, Role, TaskStatus, Theme};
use servdesk::seed;
use servdesk::storage::FileStore;

#[derive(Parser)]
#[command(name = "servdesk")]
#[command(about = "Service request and worker task desk", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the session
    Login {
        username: String,
        password: String,
    },
    /// Forget the current session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Manage user accounts
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Browse the service catalog
    Service {
        #[command(subcommand)]
        command: ServiceCommands,
    },
    /// Manage service requests
    Request {
        #[command(subcommand)]
        command: RequestCommands,
    },
    /// Manage worker tasks
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Show dashboard counters
    Stats,
    /// Show or set the theme preference
    Theme {
        /// light or dark
        theme: Option<Theme>,
    },
    /// Reset the database (delete every collection and the session)
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// List users
    List {
        /// Only users with this role
        #[arg(short, long)]
        role: Option<Role>,
    },
    /// Add a user
    Add {
        username: String,
        password: String,
        /// Display name (quoted if it has spaces)
        full_name: String,
        /// admin, customer_service or worker
        #[arg(short, long, default_value = "worker")]
        role: Role,
        #[arg(short, long)]
        email: Option<String>,
        #[arg(short, long)]
        phone: Option<String>,
    },
    /// Edit a user
    Edit {
        id: String,
        #[arg(short, long)]
        username: Option<String>,
        /// New password (left unchanged when omitted)
        #[arg(long)]
        password: Option<String>,
        #[arg(short, long)]
        full_name: Option<String>,
        #[arg(short, long)]
        role: Option<Role>,
        #[arg(short, long)]
        email: Option<String>,
        #[arg(short, long)]
        phone: Option<String>,
    },
    /// Remove a user
    Remove {
        id: String,
    },
}

#[derive(Subcommand)]
enum ServiceCommands {
    /// List catalog services
    List,
}

#[derive(Subcommand)]
enum RequestCommands {
    /// List requests
    List {
        #[arg(short, long)]
        status: Option<RequestStatus>,
        /// Only requests assigned to the logged-in user
        #[arg(short, long)]
        mine: bool,
    },
    /// File a new request
    Add {
        customer_name: String,
        customer_phone: String,
        service_id: String,
        description: String,
        #[arg(short, long)]
        email: Option<String>,
        /// low, medium or high
        #[arg(short, long, default_value = "medium")]
        priority: Priority,
    },
    /// Change a request's status
    Status {
        id: String,
        status: RequestStatus,
    },
    /// Assign a request to a worker
    Assign {
        id: String,
        worker_id: String,
    },
    /// Remove a request (its tasks are kept)
    Remove {
        id: String,
    },
}

#[derive(Subcommand)]
enum TaskCommands {
    /// List tasks
    List {
        #[arg(short, long)]
        worker: Option<String>,
        #[arg(short, long)]
        request: Option<String>,
        #[arg(short, long)]
        status: Option<TaskStatus>,
        /// Only tasks of the logged-in user
        #[arg(short, long, conflicts_with = "worker")]
        mine: bool,
    },
    /// Create a task for a request
    Add {
        request_id: String,
        worker_id: String,
        title: String,
        #[arg(short = 'D', long, default_value = "")]
        description: String,
        #[arg(short, long, default_value = "medium")]
        priority: Priority,
        /// Due date in YYYY-MM-DD
        #[arg(short, long)]
        due: Option<NaiveDate>,
    },
    /// Change a task's status
    Status {
        id: String,
        status: TaskStatus,
    },
    /// Replace a task's notes
    Note {
        id: String,
        notes: String,
    },
    /// Remove a task
    Remove {
        id: String,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = Config::load();
    let store = FileStore::new(config.data_dir);
    seed::initialize(&store);

    match cli.command {
        Commands::Login { username, password } => cmd_login(&store, &username, &password, false),
        Commands::Logout => cmd_logout(&store, false),
        Commands::Whoami => cmd_whoami(&store),
        Commands::User { command } => match command {
            UserCommands::List { role } => cmd_user_list(&store, role),
            UserCommands::Add { username, password, full_name, role, email, phone } => {
                let form = UserForm { username, password, role, full_name, email, phone };
                cmd_user_add(&store, form, false)
            }
            UserCommands::Edit { id, username, password, full_name, role, email, phone } => {
                let edit = UserEdit { username, password, role, full_name, email, phone };
                cmd_user_edit(&store, &id, edit, false)
            }
            UserCommands::Remove { id } => cmd_user_remove(&store, &id, false),
        },
        Commands::Service { command } => match command {
            ServiceCommands::List => cmd_service_list(&store),
        },
        Commands::Request { command } => match command {
            RequestCommands::List { status, mine } => cmd_request_list(&store, status, mine),
            RequestCommands::Add {
                customer_name,
                customer_phone,
                service_id,
                description,
                email,
                priority,
            } => {
                let form = RequestForm {
                    customer_name,
                    customer_phone,
                    customer_email: email,
                    service_id,
                    description,
                    priority,
                };
                cmd_request_add(&store, form, false)
            }
            RequestCommands::Status { id, status } => {
                cmd_request_status(&store, &id, status, false)
            }
            RequestCommands::Assign { id, worker_id } => {
                cmd_request_assign(&store, &id, &worker_id, false)
            }
            RequestCommands::Remove { id } => cmd_request_remove(&store, &id, false),
        },
        Commands::Task { command } => match command {
            TaskCommands::List { worker, request, status, mine } => {
                cmd_task_list(&store, worker, request, status, mine)
            }
            TaskCommands::Add { request_id, worker_id, title, description, priority, due } => {
                let form =
                    TaskForm { request_id, worker_id, title, description, priority, due_date: due };
                cmd_task_add(&store, form, false)
            }
            TaskCommands::Status { id, status } => cmd_task_status(&store, &id, status, false),
            TaskCommands::Note { id, notes } => cmd_task_note(&store, &id, notes, false),
            TaskCommands::Remove { id } => cmd_task_remove(&store, &id, false),
        },
        Commands::Stats => cmd_stats(&store),
        Commands::Theme { theme } => cmd_theme(&store, theme, false),
        Commands::Reset { force } => cmd_reset(&store, force),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "servdesk", &mut io::stdout());
        }
    }
}
