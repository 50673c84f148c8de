use std::io::{self, Write};

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::desk::{Desk, DeskError, DeskResult, RequestForm, TaskForm, UserEdit, UserForm};
use crate::models::{Priority, RequestStatus, Role, ServiceRequest, Task, TaskStatus, Theme};
use crate::prefs;
use crate::session::Session;
use crate::storage::{self, Store};

fn header(titles: &[&str]) -> Vec<Cell> {
    titles.iter().map(|t| Cell::new(t).add_attribute(Attribute::Bold)).collect()
}

fn new_table(titles: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(titles));
    table
}

fn priority_color(p: Priority) -> Color {
    match p {
        Priority::High => Color::Red,
        Priority::Medium => Color::Yellow,
        Priority::Low => Color::Green,
    }
}

fn request_status_color(s: RequestStatus) -> Color {
    match s {
        RequestStatus::New => Color::Cyan,
        RequestStatus::Assigned | RequestStatus::InProgress => Color::Yellow,
        RequestStatus::Completed => Color::Green,
        RequestStatus::Cancelled => Color::Grey,
    }
}

fn task_status_color(s: TaskStatus) -> Color {
    match s {
        TaskStatus::Pending => Color::Cyan,
        TaskStatus::InProgress => Color::Yellow,
        TaskStatus::Completed => Color::Green,
        TaskStatus::Cancelled => Color::Grey,
    }
}

/// Prints `done` on success or the error otherwise, unless `silent`.
fn report(result: DeskResult<()>, done: String, silent: bool) {
    if silent {
        return;
    }
    match result {
        Ok(()) => println!("{done}"),
        Err(e) => eprintln!("{e}."),
    }
}

/// Resolves `--mine` to the logged-in user's id. `Ok(None)` when `mine` is off.
pub fn session_owner(store: &dyn Store, mine: bool) -> DeskResult<Option<String>> {
    if !mine {
        return Ok(None);
    }
    match Session::new(store).current_user() {
        Some(u) => Ok(Some(u.id)),
        None => Err(DeskError::NotLoggedIn),
    }
}

/// Requests shown by `request list`.
pub fn select_requests(
    store: &dyn Store,
    status: Option<RequestStatus>,
    mine: bool,
) -> DeskResult<Vec<ServiceRequest>> {
    let assignee = session_owner(store, mine)?;
    Ok(Desk::new(store).request_queue(status, assignee.as_deref()))
}

/// Tasks shown by `task list`. With `mine` the logged-in user replaces `worker`.
pub fn select_tasks(
    store: &dyn Store,
    worker: Option<String>,
    request: Option<String>,
    status: Option<TaskStatus>,
    mine: bool,
) -> DeskResult<Vec<Task>> {
    let worker = session_owner(store, mine)?.or(worker);
    Ok(Desk::new(store).task_queue(worker.as_deref(), request.as_deref(), status))
}

pub fn cmd_login(store: &dyn Store, username: &str, password: &str, silent: bool) {
    match Session::new(store).login(username, password) {
        Some(user) => {
            if !silent {
                println!("Welcome, {} ({}).", user.full_name, user.role);
            }
        }
        None => {
            if !silent {
                eprintln!("Invalid username or password.");
            }
        }
    }
}

pub fn cmd_logout(store: &dyn Store, silent: bool) {
    Session::new(store).logout();
    if !silent {
        println!("Logged out.");
    }
}

pub fn cmd_whoami(store: &dyn Store) {
    match Session::new(store).current_user() {
        Some(u) => println!("{} ({}) id = {}", u.username, u.role, u.id),
        None => println!("Not logged in."),
    }
}

pub fn cmd_user_list(store: &dyn Store, role: Option<Role>) {
    let desk = Desk::new(store);
    let users = match role {
        Some(r) => desk.users().by_role(r),
        None => desk.users().list(),
    };
    if users.is_empty() {
        println!("No users found.");
        return;
    }
    let mut table = new_table(&["ID", "Username", "Name", "Role", "Email", "Phone", "Created"]);
    for u in users {
        table.add_row(vec![
            Cell::new(&u.id),
            Cell::new(&u.username),
            Cell::new(&u.full_name),
            Cell::new(u.role),
            Cell::new(u.email.unwrap_or_else(|| "-".into())),
            Cell::new(u.phone.unwrap_or_else(|| "-".into())),
            Cell::new(u.created_at.format("%Y-%m-%d")),
        ]);
    }
    println!("{table}");
}

pub fn cmd_user_add(store: &dyn Store, form: UserForm, silent: bool) {
    match Desk::new(store).create_user(form) {
        Ok(u) => {
            if !silent {
                println!("User '{}' added (id = {}).", u.username, u.id);
            }
        }
        Err(e) => {
            if !silent {
                eprintln!("{e}.");
            }
        }
    }
}

pub fn cmd_user_edit(store: &dyn Store, id: &str, edit: UserEdit, silent: bool) {
    report(Desk::new(store).update_user(id, edit), format!("User {id} updated."), silent);
}

pub fn cmd_user_remove(store: &dyn Store, id: &str, silent: bool) {
    report(Desk::new(store).delete_user(id), format!("User {id} removed."), silent);
}

pub fn cmd_service_list(store: &dyn Store) {
    let services = Desk::new(store).services().list();
    if services.is_empty() {
        println!("No services found.");
        return;
    }
    let mut table = new_table(&["ID", "Name", "Category", "Minutes", "Description"]);
    for s in services {
        table.add_row(vec![
            Cell::new(&s.id),
            Cell::new(&s.name),
            Cell::new(&s.category),
            Cell::new(s.estimated_duration),
            Cell::new(&s.description),
        ]);
    }
    println!("{table}");
}

/// Lists requests, optionally filtered by status or to those assigned to the current user.
pub fn cmd_request_list(store: &dyn Store, status: Option<RequestStatus>, mine: bool) {
    let requests = match select_requests(store, status, mine) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{e}.");
            return;
        }
    };
    if requests.is_empty() {
        println!("No requests found.");
        return;
    }
    let mut table = new_table(&[
        "ID", "Customer", "Phone", "Service", "Priority", "Status", "Worker", "Updated",
    ]);
    for r in requests {
        table.add_row(vec![
            Cell::new(&r.id),
            Cell::new(&r.customer_name),
            Cell::new(&r.customer_phone),
            Cell::new(&r.service_name),
            Cell::new(r.priority).fg(priority_color(r.priority)),
            Cell::new(r.status).fg(request_status_color(r.status)),
            Cell::new(r.assigned_worker_name.unwrap_or_else(|| "-".into())),
            Cell::new(r.updated_at.format("%Y-%m-%d %H:%M")),
        ]);
    }
    println!("{table}");
}

pub fn cmd_request_add(store: &dyn Store, form: RequestForm, silent: bool) {
    match Desk::new(store).create_request(form) {
        Ok(r) => {
            if !silent {
                println!("Request added (id = {}).", r.id);
            }
        }
        Err(e) => {
            if !silent {
                eprintln!("{e}.");
            }
        }
    }
}

pub fn cmd_request_status(store: &dyn Store, id: &str, status: RequestStatus, silent: bool) {
    report(
        Desk::new(store).set_request_status(id, status),
        format!("Request {id} is now {status}."),
        silent,
    );
}

pub fn cmd_request_assign(store: &dyn Store, id: &str, worker_id: &str, silent: bool) {
    report(
        Desk::new(store).assign_worker(id, worker_id),
        format!("Request {id} assigned to worker {worker_id}."),
        silent,
    );
}

pub fn cmd_request_remove(store: &dyn Store, id: &str, silent: bool) {
    report(Desk::new(store).delete_request(id), format!("Request {id} removed."), silent);
}

/// Lists tasks. Filters combine; `mine` restricts to the logged-in worker.
pub fn cmd_task_list(
    store: &dyn Store,
    worker: Option<String>,
    request: Option<String>,
    status: Option<TaskStatus>,
    mine: bool,
) {
    let tasks = match select_tasks(store, worker, request, status, mine) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("{e}.");
            return;
        }
    };
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }
    let mut table = new_table(&[
        "ID", "Title", "Request", "Worker", "Priority", "Status", "Due", "Completed", "Notes",
    ]);
    for t in tasks {
        table.add_row(vec![
            Cell::new(&t.id),
            Cell::new(&t.title),
            Cell::new(&t.request_id),
            Cell::new(&t.worker_name),
            Cell::new(t.priority).fg(priority_color(t.priority)),
            Cell::new(t.status).fg(task_status_color(t.status)),
            Cell::new(t.due_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into())),
            Cell::new(
                t.completed_at
                    .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".into()),
            ),
            Cell::new(t.notes.unwrap_or_default()),
        ]);
    }
    println!("{table}");
}

pub fn cmd_task_add(store: &dyn Store, form: TaskForm, silent: bool) {
    match Desk::new(store).create_task(form) {
        Ok(t) => {
            if !silent {
                println!("Task added (id = {}) for {}.", t.id, t.worker_name);
            }
        }
        Err(e) => {
            if !silent {
                eprintln!("{e}.");
            }
        }
    }
}

pub fn cmd_task_status(store: &dyn Store, id: &str, status: TaskStatus, silent: bool) {
    report(
        Desk::new(store).set_task_status(id, status),
        format!("Task {id} is now {status}."),
        silent,
    );
}

pub fn cmd_task_note(store: &dyn Store, id: &str, notes: String, silent: bool) {
    report(
        Desk::new(store).set_task_notes(id, notes),
        format!("Notes saved for task {id}."),
        silent,
    );
}

pub fn cmd_task_remove(store: &dyn Store, id: &str, silent: bool) {
    report(Desk::new(store).delete_task(id), format!("Task {id} removed."), silent);
}

pub fn cmd_stats(store: &dyn Store) {
    let s = Desk::new(store).stats();
    let mut table = new_table(&["", "Total", "Pending", "In progress", "Completed"]);
    table.add_row(vec![
        Cell::new("Requests").add_attribute(Attribute::Bold),
        Cell::new(s.total_requests),
        Cell::new(s.pending_requests),
        Cell::new(s.in_progress_requests),
        Cell::new(s.completed_requests),
    ]);
    table.add_row(vec![
        Cell::new("Tasks").add_attribute(Attribute::Bold),
        Cell::new(s.total_tasks),
        Cell::new(s.pending_tasks),
        Cell::new(s.in_progress_tasks),
        Cell::new(s.completed_tasks),
    ]);
    println!("{table}");
    println!("Workers: {} ({} active)", s.total_workers, s.active_workers);
}

/// Shows the stored theme, or stores a new one.
pub fn cmd_theme(store: &dyn Store, theme: Option<Theme>, silent: bool) {
    match theme {
        Some(t) => {
            prefs::set_theme(store, t);
            if !silent {
                println!("Theme set to {t}.");
            }
        }
        None => {
            if !silent {
                println!("{}", prefs::theme(store));
            }
        }
    }
}

/// Removes every collection, the session and the theme.
pub fn cmd_reset(store: &dyn Store, force: bool) {
    if !force {
        print!(
            "Are you sure you want to delete all users, requests and tasks? \
             This cannot be undone. [y/N] "
        );
        let _ = io::stdout().flush();
        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() || input.trim().to_lowercase() != "y" {
            println!("Aborted.");
            return;
        }
    }
    storage::clear(store);
    println!("Database reset successfully.");
}
