use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{
    NewRequest, NewService, NewTask, NewUser, RequestPatch, RequestStatus, Role, Service,
    ServiceRequest, Task, TaskPatch, TaskStatus, User, UserPatch,
};
use crate::storage::{self, keys, Store};

/// A record kept as one JSON array under a fixed key.
pub trait Record: Serialize + DeserializeOwned + Clone {
    /// Storage key of the collection.
    const KEY: &'static str;
    /// Creation fields supplied by the caller.
    type Draft;

    fn id(&self) -> &str;
    fn from_draft(draft: Self::Draft, id: String, now: DateTime<Utc>) -> Self;
}

/// A record that can be patched and deleted after creation.
pub trait Mutable: Record {
    type Patch;

    fn apply(&mut self, patch: Self::Patch, now: DateTime<Utc>);
}

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// `<unix millis>-<9 base36 chars>`.
pub fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("{}-{}", Utc::now().timestamp_millis(), suffix)
}

/// CRUD access to one collection.
///
/// Every call reads the whole collection, works on it in memory and writes it
/// back. Storage failures are swallowed by [`storage::read`]/[`storage::write`].
pub struct Repository<'s, R> {
    store: &'s dyn Store,
    _record: PhantomData<R>,
}

pub type Users<'s> = Repository<'s, User>;
pub type Services<'s> = Repository<'s, Service>;
pub type Requests<'s> = Repository<'s, ServiceRequest>;
pub type Tasks<'s> = Repository<'s, Task>;

impl<'s, R: Record> Repository<'s, R> {
    pub fn new(store: &'s dyn Store) -> Self {
        Repository { store, _record: PhantomData }
    }

    /// All records in insertion order.
    pub fn list(&self) -> Vec<R> {
        storage::read(self.store, R::KEY, Vec::new())
    }

    pub fn get_by_id(&self, id: &str) -> Option<R> {
        self.list().into_iter().find(|r| r.id() == id)
    }

    pub fn is_empty(&self) -> bool {
        self.list().is_empty()
    }

    pub fn create(&self, draft: R::Draft) -> R {
        let mut records = self.list();
        let mut id = generate_id();
        while records.iter().any(|r| r.id() == id) {
            id = generate_id();
        }
        let record = R::from_draft(draft, id, Utc::now());
        records.push(record.clone());
        self.save(&records);
        record
    }

    /// Overwrites the collection.
    pub fn save(&self, records: &[R]) {
        storage::write(self.store, R::KEY, records);
    }

    fn filter(&self, pred: impl Fn(&R) -> bool) -> Vec<R> {
        self.list().into_iter().filter(|r| pred(r)).collect()
    }
}

impl<'s, R: Mutable> Repository<'s, R> {
    /// Merges `patch` into the record with `id`. Returns `false` if there is none.
    pub fn update(&self, id: &str, patch: R::Patch) -> bool {
        let mut records = self.list();
        match records.iter_mut().find(|r| r.id() == id) {
            Some(r) => {
                r.apply(patch, Utc::now());
                self.save(&records);
                true
            }
            None => false,
        }
    }

    /// Removes the record with `id`. Dependent records are left alone.
    pub fn delete(&self, id: &str) -> bool {
        let mut records = self.list();
        let len_before = records.len();
        records.retain(|r| r.id() != id);
        if records.len() == len_before {
            return false;
        }
        self.save(&records);
        true
    }
}

impl<'s> Users<'s> {
    pub fn by_username(&self, username: &str) -> Option<User> {
        self.list().into_iter().find(|u| u.username == username)
    }

    pub fn by_role(&self, role: Role) -> Vec<User> {
        self.filter(|u| u.role == role)
    }
}

impl<'s> Requests<'s> {
    pub fn by_status(&self, status: RequestStatus) -> Vec<ServiceRequest> {
        self.filter(|r| r.status == status)
    }

    pub fn assigned_to(&self, worker_id: &str) -> Vec<ServiceRequest> {
        self.filter(|r| r.assigned_to.as_deref() == Some(worker_id))
    }
}

impl<'s> Tasks<'s> {
    pub fn by_worker(&self, worker_id: &str) -> Vec<Task> {
        self.filter(|t| t.worker_id == worker_id)
    }

    pub fn by_request(&self, request_id: &str) -> Vec<Task> {
        self.filter(|t| t.request_id == request_id)
    }

    pub fn by_status(&self, status: TaskStatus) -> Vec<Task> {
        self.filter(|t| t.status == status)
    }
}

impl Record for User {
    const KEY: &'static str = keys::USERS;
    type Draft = NewUser;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(d: NewUser, id: String, now: DateTime<Utc>) -> Self {
        User {
            id,
            username: d.username,
            password_hash: d.password_hash,
            role: d.role,
            full_name: d.full_name,
            email: d.email,
            phone: d.phone,
            created_at: now,
        }
    }
}

impl Mutable for User {
    type Patch = UserPatch;

    fn apply(&mut self, p: UserPatch, _now: DateTime<Utc>) {
        if let Some(v) = p.username {
            self.username = v;
        }
        if let Some(v) = p.password_hash {
            self.password_hash = v;
        }
        if let Some(v) = p.role {
            self.role = v;
        }
        if let Some(v) = p.full_name {
            self.full_name = v;
        }
        if let Some(v) = p.email {
            self.email = Some(v);
        }
        if let Some(v) = p.phone {
            self.phone = Some(v);
        }
    }
}

impl Record for Service {
    const KEY: &'static str = keys::SERVICES;
    type Draft = NewService;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(d: NewService, id: String, now: DateTime<Utc>) -> Self {
        Service {
            id,
            name: d.name,
            description: d.description,
            category: d.category,
            estimated_duration: d.estimated_duration,
            created_at: now,
        }
    }
}

impl Record for ServiceRequest {
    const KEY: &'static str = keys::REQUESTS;
    type Draft = NewRequest;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(d: NewRequest, id: String, now: DateTime<Utc>) -> Self {
        ServiceRequest {
            id,
            customer_id: d.customer_id,
            customer_name: d.customer_name,
            customer_phone: d.customer_phone,
            customer_email: d.customer_email,
            service_id: d.service_id,
            service_name: d.service_name,
            description: d.description,
            status: d.status,
            priority: d.priority,
            assigned_to: d.assigned_to,
            assigned_worker_name: d.assigned_worker_name,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }
}

impl Mutable for ServiceRequest {
    type Patch = RequestPatch;

    fn apply(&mut self, p: RequestPatch, now: DateTime<Utc>) {
        if let Some(v) = p.customer_name {
            self.customer_name = v;
        }
        if let Some(v) = p.customer_phone {
            self.customer_phone = v;
        }
        if let Some(v) = p.customer_email {
            self.customer_email = Some(v);
        }
        if let Some(v) = p.description {
            self.description = v;
        }
        if let Some(v) = p.status {
            self.status = v;
        }
        if let Some(v) = p.priority {
            self.priority = v;
        }
        if let Some(v) = p.assigned_to {
            self.assigned_to = Some(v);
        }
        if let Some(v) = p.assigned_worker_name {
            self.assigned_worker_name = Some(v);
        }
        if let Some(v) = p.completed_at {
            self.completed_at = Some(v);
        }
        self.updated_at = now;
    }
}

impl Record for Task {
    const KEY: &'static str = keys::TASKS;
    type Draft = NewTask;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(d: NewTask, id: String, now: DateTime<Utc>) -> Self {
        Task {
            id,
            request_id: d.request_id,
            worker_id: d.worker_id,
            worker_name: d.worker_name,
            title: d.title,
            description: d.description,
            status: d.status,
            priority: d.priority,
            due_date: d.due_date,
            created_at: now,
            updated_at: now,
            completed_at: None,
            notes: d.notes,
        }
    }
}

impl Mutable for Task {
    type Patch = TaskPatch;

    fn apply(&mut self, p: TaskPatch, now: DateTime<Utc>) {
        let completing = p.status == Some(TaskStatus::Completed);
        if let Some(v) = p.title {
            self.title = v;
        }
        if let Some(v) = p.description {
            self.description = v;
        }
        if let Some(v) = p.status {
            self.status = v;
        }
        if let Some(v) = p.priority {
            self.priority = v;
        }
        if let Some(v) = p.due_date {
            self.due_date = Some(v);
        }
        if let Some(v) = p.notes {
            self.notes = Some(v);
        }
        self.updated_at = now;
        if completing && self.completed_at.is_none() {
            self.completed_at = Some(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_have_timestamp_and_base36_suffix() {
        let id = generate_id();
        let (millis, suffix) = id.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(suffix.len(), 9);
        assert!(suffix.bytes().all(|b| ID_ALPHABET.contains(&b)));
    }
}
