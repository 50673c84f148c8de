use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use thiserror::Error;

use crate::models::{
    DashboardStats, NewRequest, NewTask, NewUser, Priority, RequestPatch, RequestStatus, Role,
    Service, ServiceRequest, Task, TaskPatch, TaskStatus, User, UserPatch,
};
use crate::repository::{Requests, Services, Tasks, Users};
use crate::session::hash_password;
use crate::storage::Store;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DeskError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("unknown service '{0}'")]
    UnknownService(String),

    #[error("no worker with id '{0}'")]
    UnknownWorker(String),

    #[error("unknown request '{0}'")]
    UnknownRequest(String),

    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("not logged in; run `servdesk login <username> <password>` first")]
    NotLoggedIn,
}

pub type DeskResult<T> = Result<T, DeskError>;

/// Input of the "new account" form.
#[derive(Debug, Clone)]
pub struct UserForm {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Input of the "edit account" form. A blank or absent field keeps its old value.
#[derive(Debug, Clone, Default)]
pub struct UserEdit {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Input of the "new service request" form.
#[derive(Debug, Clone)]
pub struct RequestForm {
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub service_id: String,
    pub description: String,
    pub priority: Priority,
}

/// Input of the "new task" form.
#[derive(Debug, Clone)]
pub struct TaskForm {
    pub request_id: String,
    pub worker_id: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
}

fn require(value: &str, field: &'static str) -> DeskResult<()> {
    if value.trim().is_empty() {
        return Err(DeskError::MissingField(field));
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn found(ok: bool, kind: &'static str, id: &str) -> DeskResult<()> {
    if ok {
        Ok(())
    } else {
        Err(DeskError::NotFound { kind, id: id.to_string() })
    }
}

/// Day-to-day operations of the service desk: the checks the forms make
/// before handing records to the repositories.
pub struct Desk<'s> {
    store: &'s dyn Store,
}

impl<'s> Desk<'s> {
    pub fn new(store: &'s dyn Store) -> Self {
        Desk { store }
    }

    pub fn users(&self) -> Users<'s> {
        Users::new(self.store)
    }

    pub fn services(&self) -> Services<'s> {
        Services::new(self.store)
    }

    pub fn requests(&self) -> Requests<'s> {
        Requests::new(self.store)
    }

    pub fn tasks(&self) -> Tasks<'s> {
        Tasks::new(self.store)
    }

    pub fn workers(&self) -> Vec<User> {
        self.users().by_role(Role::Worker)
    }

    fn worker(&self, worker_id: &str) -> DeskResult<User> {
        self.users()
            .get_by_id(worker_id)
            .filter(|u| u.role == Role::Worker)
            .ok_or_else(|| DeskError::UnknownWorker(worker_id.to_string()))
    }

    pub fn create_user(&self, form: UserForm) -> DeskResult<User> {
        require(&form.username, "username")?;
        require(&form.password, "password")?;
        require(&form.full_name, "full name")?;
        let users = self.users();
        if users.by_username(&form.username).is_some() {
            return Err(DeskError::UsernameTaken(form.username));
        }
        let password_hash =
            hash_password(&form.password).map_err(|e| DeskError::Hash(e.to_string()))?;
        let user = users.create(NewUser {
            username: form.username,
            password_hash,
            role: form.role,
            full_name: form.full_name,
            email: non_empty(form.email),
            phone: non_empty(form.phone),
        });
        log::debug!("created user {} ({})", user.username, user.id);
        Ok(user)
    }

    pub fn update_user(&self, id: &str, edit: UserEdit) -> DeskResult<()> {
        if let Some(username) = &edit.username {
            require(username, "username")?;
        }
        if let Some(full_name) = &edit.full_name {
            require(full_name, "full name")?;
        }
        let password_hash = match non_empty(edit.password) {
            Some(p) => Some(hash_password(&p).map_err(|e| DeskError::Hash(e.to_string()))?),
            None => None,
        };
        let patch = UserPatch {
            username: edit.username,
            password_hash,
            role: edit.role,
            full_name: edit.full_name,
            email: non_empty(edit.email),
            phone: non_empty(edit.phone),
        };
        found(self.users().update(id, patch), "user", id)
    }

    pub fn delete_user(&self, id: &str) -> DeskResult<()> {
        found(self.users().delete(id), "user", id)
    }

    pub fn create_request(&self, form: RequestForm) -> DeskResult<ServiceRequest> {
        require(&form.customer_name, "customer name")?;
        require(&form.customer_phone, "customer phone")?;
        require(&form.service_id, "service")?;
        require(&form.description, "description")?;
        let service: Service = self
            .services()
            .get_by_id(&form.service_id)
            .ok_or_else(|| DeskError::UnknownService(form.service_id.clone()))?;
        let request = self.requests().create(NewRequest {
            customer_id: format!("customer-{}", Utc::now().timestamp_millis()),
            customer_name: form.customer_name,
            customer_phone: form.customer_phone,
            customer_email: non_empty(form.customer_email),
            service_id: service.id,
            service_name: service.name,
            description: form.description,
            status: RequestStatus::New,
            priority: form.priority,
            assigned_to: None,
            assigned_worker_name: None,
        });
        log::debug!("created request {} for {}", request.id, request.service_name);
        Ok(request)
    }

    pub fn set_request_status(&self, id: &str, status: RequestStatus) -> DeskResult<()> {
        let patch = RequestPatch { status: Some(status), ..Default::default() };
        found(self.requests().update(id, patch), "request", id)
    }

    /// Hands the request to a worker and marks it assigned.
    pub fn assign_worker(&self, request_id: &str, worker_id: &str) -> DeskResult<()> {
        let worker = self.worker(worker_id)?;
        let patch = RequestPatch {
            assigned_to: Some(worker.id),
            assigned_worker_name: Some(worker.full_name),
            status: Some(RequestStatus::Assigned),
            ..Default::default()
        };
        found(self.requests().update(request_id, patch), "request", request_id)
    }

    /// Removes the request. Its tasks stay behind.
    pub fn delete_request(&self, id: &str) -> DeskResult<()> {
        found(self.requests().delete(id), "request", id)
    }

    pub fn create_task(&self, form: TaskForm) -> DeskResult<Task> {
        require(&form.title, "title")?;
        if self.requests().get_by_id(&form.request_id).is_none() {
            return Err(DeskError::UnknownRequest(form.request_id));
        }
        let worker = self.worker(&form.worker_id)?;
        let task = self.tasks().create(NewTask {
            request_id: form.request_id,
            worker_id: worker.id,
            worker_name: worker.full_name,
            title: form.title,
            description: form.description,
            status: TaskStatus::Pending,
            priority: form.priority,
            due_date: form.due_date,
            notes: None,
        });
        log::debug!("created task {} for {}", task.id, task.worker_name);
        Ok(task)
    }

    pub fn set_task_status(&self, id: &str, status: TaskStatus) -> DeskResult<()> {
        let patch = TaskPatch { status: Some(status), ..Default::default() };
        found(self.tasks().update(id, patch), "task", id)
    }

    pub fn set_task_notes(&self, id: &str, notes: String) -> DeskResult<()> {
        let patch = TaskPatch { notes: Some(notes), ..Default::default() };
        found(self.tasks().update(id, patch), "task", id)
    }

    pub fn delete_task(&self, id: &str) -> DeskResult<()> {
        found(self.tasks().delete(id), "task", id)
    }

    /// Requests matching every given filter, in insertion order.
    pub fn request_queue(
        &self,
        status: Option<RequestStatus>,
        assignee: Option<&str>,
    ) -> Vec<ServiceRequest> {
        let requests = match assignee {
            Some(worker_id) => self.requests().assigned_to(worker_id),
            None => self.requests().list(),
        };
        requests
            .into_iter()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .collect()
    }

    /// Tasks matching every given filter, in insertion order.
    pub fn task_queue(
        &self,
        worker: Option<&str>,
        request: Option<&str>,
        status: Option<TaskStatus>,
    ) -> Vec<Task> {
        let tasks = match worker {
            Some(worker_id) => self.tasks().by_worker(worker_id),
            None => self.tasks().list(),
        };
        tasks
            .into_iter()
            .filter(|t| request.map_or(true, |r| t.request_id == r))
            .filter(|t| status.map_or(true, |s| t.status == s))
            .collect()
    }

    pub fn stats(&self) -> DashboardStats {
        let requests = self.requests().list();
        let tasks = self.tasks().list();
        let workers = self.workers();

        let busy: HashSet<&str> = tasks
            .iter()
            .filter(|t| matches!(t.status, TaskStatus::Pending | TaskStatus::InProgress))
            .map(|t| t.worker_id.as_str())
            .collect();
        let count_requests =
            |pred: fn(RequestStatus) -> bool| requests.iter().filter(|r| pred(r.status)).count();
        let count_tasks =
            |status: TaskStatus| tasks.iter().filter(|t| t.status == status).count();

        DashboardStats {
            total_requests: requests.len(),
            pending_requests: count_requests(|s| s == RequestStatus::New),
            in_progress_requests: count_requests(|s| {
                matches!(s, RequestStatus::Assigned | RequestStatus::InProgress)
            }),
            completed_requests: count_requests(|s| s == RequestStatus::Completed),
            total_tasks: tasks.len(),
            pending_tasks: count_tasks(TaskStatus::Pending),
            in_progress_tasks: count_tasks(TaskStatus::InProgress),
            completed_tasks: count_tasks(TaskStatus::Completed),
            total_workers: workers.len(),
            active_workers: workers.iter().filter(|w| busy.contains(w.id.as_str())).count(),
        }
    }
}
