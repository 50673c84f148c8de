use chrono::NaiveDate;
use servdesk::desk::{Desk, DeskError, RequestForm, TaskForm, UserEdit, UserForm};
use servdesk::models::{Priority, RequestStatus, Role, TaskStatus};
use servdesk::seed;
use servdesk::session::Session;
use servdesk::storage::MemoryStore;

fn seeded() -> MemoryStore {
    let store = MemoryStore::new();
    seed::initialize(&store);
    store
}

fn request_form(desk: &Desk) -> RequestForm {
    let service = desk.services().list().remove(1);
    RequestForm {
        customer_name: "Sara".into(),
        customer_phone: "0500000000".into(),
        customer_email: Some(String::new()),
        service_id: service.id,
        description: "Deep clean after renovation".into(),
        priority: Priority::High,
    }
}

fn worker_id(desk: &Desk) -> String {
    desk.workers().remove(0).id
}

#[test]
fn test_create_user_rejects_duplicate_username() {
    let store = seeded();
    let desk = Desk::new(&store);
    let form = UserForm {
        username: "worker1".into(),
        password: "pw".into(),
        role: Role::Worker,
        full_name: "Dup".into(),
        email: None,
        phone: None,
    };
    assert_eq!(desk.create_user(form), Err(DeskError::UsernameTaken("worker1".into())));
    assert_eq!(desk.users().list().len(), 3);
}

#[test]
fn test_create_user_requires_fields_and_can_log_in() {
    let store = seeded();
    let desk = Desk::new(&store);
    let mut form = UserForm {
        username: "worker2".into(),
        password: "  ".into(),
        role: Role::Worker,
        full_name: "Second Worker".into(),
        email: Some("w2@example.com".into()),
        phone: None,
    };
    assert_eq!(desk.create_user(form.clone()), Err(DeskError::MissingField("password")));

    form.password = "pw2".into();
    let user = desk.create_user(form).unwrap();
    assert_eq!(user.email.as_deref(), Some("w2@example.com"));
    assert_eq!(desk.workers().len(), 2);

    let auth = Session::new(&store).login("worker2", "pw2").unwrap();
    assert_eq!(auth.id, user.id);
}

#[test]
fn test_update_user_password_only_when_given() {
    let store = seeded();
    let desk = Desk::new(&store);
    let id = worker_id(&desk);
    let session = Session::new(&store);

    let edit = UserEdit {
        full_name: Some("Renamed".into()),
        password: Some(String::new()),
        ..Default::default()
    };
    desk.update_user(&id, edit).unwrap();
    assert_eq!(session.login("worker1", "worker123").unwrap().full_name, "Renamed");

    let edit = UserEdit { password: Some("fresh".into()), ..Default::default() };
    desk.update_user(&id, edit).unwrap();
    assert!(session.login("worker1", "worker123").is_none());
    assert!(session.login("worker1", "fresh").is_some());

    let edit = UserEdit { username: Some("".into()), ..Default::default() };
    assert_eq!(desk.update_user(&id, edit), Err(DeskError::MissingField("username")));
    assert!(matches!(
        desk.update_user("ghost", UserEdit::default()),
        Err(DeskError::NotFound { kind: "user", .. })
    ));
}

#[test]
fn test_update_user_blank_contact_keeps_old_value() {
    let store = seeded();
    let desk = Desk::new(&store);
    let id = worker_id(&desk);

    let edit = UserEdit { email: Some("w1@example.com".into()), ..Default::default() };
    desk.update_user(&id, edit).unwrap();

    let edit = UserEdit {
        email: Some("   ".into()),
        phone: Some(String::new()),
        ..Default::default()
    };
    desk.update_user(&id, edit).unwrap();
    let user = desk.users().get_by_id(&id).unwrap();
    assert_eq!(user.email.as_deref(), Some("w1@example.com"));
    assert_eq!(user.phone.as_deref(), Some("0501234567"));
}

#[test]
fn test_create_request_copies_service_name() {
    let store = seeded();
    let desk = Desk::new(&store);
    let form = request_form(&desk);
    let service = desk.services().get_by_id(&form.service_id).unwrap();

    let r = desk.create_request(form).unwrap();
    assert_eq!(r.status, RequestStatus::New);
    assert_eq!(r.service_name, service.name);
    assert_eq!(r.customer_email, None);
    assert!(r.customer_id.starts_with("customer-"));
    assert_eq!(desk.requests().list(), vec![r]);
}

#[test]
fn test_create_request_validation() {
    let store = seeded();
    let desk = Desk::new(&store);

    let mut form = request_form(&desk);
    form.customer_phone = String::new();
    assert_eq!(desk.create_request(form), Err(DeskError::MissingField("customer phone")));

    let mut form = request_form(&desk);
    form.service_id = "no-such-service".into();
    assert_eq!(desk.create_request(form), Err(DeskError::UnknownService("no-such-service".into())));
    assert!(desk.requests().list().is_empty());
}

#[test]
fn test_assign_worker_marks_request_assigned() {
    let store = seeded();
    let desk = Desk::new(&store);
    let r = desk.create_request(request_form(&desk)).unwrap();
    let worker = desk.workers().remove(0);

    desk.assign_worker(&r.id, &worker.id).unwrap();
    let r = desk.requests().get_by_id(&r.id).unwrap();
    assert_eq!(r.status, RequestStatus::Assigned);
    assert_eq!(r.assigned_to.as_deref(), Some(worker.id.as_str()));
    assert_eq!(r.assigned_worker_name.as_deref(), Some(worker.full_name.as_str()));
}

#[test]
fn test_assign_rejects_non_workers() {
    let store = seeded();
    let desk = Desk::new(&store);
    let r = desk.create_request(request_form(&desk)).unwrap();
    let admin = desk.users().by_username("admin").unwrap();

    assert_eq!(
        desk.assign_worker(&r.id, &admin.id),
        Err(DeskError::UnknownWorker(admin.id.clone()))
    );
    assert_eq!(desk.requests().get_by_id(&r.id).unwrap().status, RequestStatus::New);

    let w = worker_id(&desk);
    assert!(matches!(
        desk.assign_worker("ghost", &w),
        Err(DeskError::NotFound { kind: "request", .. })
    ));
}

#[test]
fn test_request_status_is_unconstrained() {
    let store = seeded();
    let desk = Desk::new(&store);
    let r = desk.create_request(request_form(&desk)).unwrap();

    for status in [
        RequestStatus::Completed,
        RequestStatus::New,
        RequestStatus::Cancelled,
        RequestStatus::InProgress,
    ] {
        desk.set_request_status(&r.id, status).unwrap();
        assert_eq!(desk.requests().get_by_id(&r.id).unwrap().status, status);
    }
}

#[test]
fn test_task_lifecycle() {
    let store = seeded();
    let desk = Desk::new(&store);
    let r = desk.create_request(request_form(&desk)).unwrap();
    let w = worker_id(&desk);
    let due = NaiveDate::from_ymd_opt(2026, 11, 1).unwrap();

    let t = desk
        .create_task(TaskForm {
            request_id: r.id.clone(),
            worker_id: w.clone(),
            title: "Clean kitchen".into(),
            description: String::new(),
            priority: Priority::Medium,
            due_date: Some(due),
        })
        .unwrap();
    assert_eq!(t.status, TaskStatus::Pending);
    assert_eq!(t.worker_name, "First Worker");
    assert_eq!(desk.tasks().by_worker(&w), vec![t.clone()]);

    desk.set_task_status(&t.id, TaskStatus::InProgress).unwrap();
    desk.set_task_notes(&t.id, "Half done".into()).unwrap();
    desk.set_task_status(&t.id, TaskStatus::Completed).unwrap();

    let done = desk.tasks().get_by_id(&t.id).unwrap();
    assert_eq!(done.notes.as_deref(), Some("Half done"));
    assert_eq!(done.due_date, Some(due));
    assert!(done.completed_at.is_some());

    desk.delete_task(&t.id).unwrap();
    assert!(matches!(desk.delete_task(&t.id), Err(DeskError::NotFound { kind: "task", .. })));
}

#[test]
fn test_create_task_checks_references() {
    let store = seeded();
    let desk = Desk::new(&store);
    let w = worker_id(&desk);
    let form = TaskForm {
        request_id: "ghost".into(),
        worker_id: w,
        title: "Anything".into(),
        description: String::new(),
        priority: Priority::Low,
        due_date: None,
    };
    assert_eq!(desk.create_task(form.clone()), Err(DeskError::UnknownRequest("ghost".into())));

    let r = desk.create_request(request_form(&desk)).unwrap();
    let form = TaskForm { request_id: r.id, worker_id: "ghost".into(), ..form };
    assert_eq!(desk.create_task(form), Err(DeskError::UnknownWorker("ghost".into())));
    assert!(desk.tasks().list().is_empty());
}

#[test]
fn test_delete_request_keeps_tasks() {
    let store = seeded();
    let desk = Desk::new(&store);
    let r = desk.create_request(request_form(&desk)).unwrap();
    let form = TaskForm {
        request_id: r.id.clone(),
        worker_id: worker_id(&desk),
        title: "Orphan".into(),
        description: String::new(),
        priority: Priority::Low,
        due_date: None,
    };
    desk.create_task(form).unwrap();

    desk.delete_request(&r.id).unwrap();
    assert!(desk.requests().list().is_empty());
    assert_eq!(desk.tasks().by_request(&r.id).len(), 1);
}

#[test]
fn test_queues_combine_filters() {
    let store = seeded();
    let desk = Desk::new(&store);
    let w = worker_id(&desk);
    let other = desk
        .create_user(UserForm {
            username: "worker2".into(),
            password: "pw".into(),
            role: Role::Worker,
            full_name: "Second Worker".into(),
            email: None,
            phone: None,
        })
        .unwrap();

    let assigned = desk.create_request(request_form(&desk)).unwrap();
    let open = desk.create_request(request_form(&desk)).unwrap();
    desk.assign_worker(&assigned.id, &w).unwrap();

    let request_ids = |status, assignee: Option<&str>| -> Vec<String> {
        desk.request_queue(status, assignee).into_iter().map(|r| r.id).collect()
    };
    assert_eq!(request_ids(None, None), vec![assigned.id.clone(), open.id.clone()]);
    assert_eq!(request_ids(None, Some(w.as_str())), vec![assigned.id.clone()]);
    assert_eq!(request_ids(Some(RequestStatus::New), None), vec![open.id.clone()]);
    assert!(request_ids(Some(RequestStatus::New), Some(w.as_str())).is_empty());

    let task = |request_id: &str, worker_id: &str| {
        desk.create_task(TaskForm {
            request_id: request_id.to_string(),
            worker_id: worker_id.to_string(),
            title: "Work".into(),
            description: String::new(),
            priority: Priority::Medium,
            due_date: None,
        })
        .unwrap()
        .id
    };
    let t1 = task(&assigned.id, &w);
    let t2 = task(&open.id, &w);
    let t3 = task(&assigned.id, &other.id);
    desk.set_task_status(&t2, TaskStatus::Completed).unwrap();

    let task_ids = |worker: Option<&str>, request: Option<&str>, status| -> Vec<String> {
        desk.task_queue(worker, request, status).into_iter().map(|t| t.id).collect()
    };
    assert_eq!(task_ids(None, None, None).len(), 3);
    assert_eq!(task_ids(Some(w.as_str()), Some(assigned.id.as_str()), None), vec![t1.clone()]);
    assert_eq!(task_ids(None, Some(assigned.id.as_str()), None), vec![t1, t3]);
    assert_eq!(task_ids(Some(w.as_str()), None, Some(TaskStatus::Completed)), vec![t2]);
    assert!(task_ids(Some(other.id.as_str()), Some(open.id.as_str()), None).is_empty());
}

#[test]
fn test_stats() {
    let store = seeded();
    let desk = Desk::new(&store);
    let w = worker_id(&desk);

    let a = desk.create_request(request_form(&desk)).unwrap();
    let b = desk.create_request(request_form(&desk)).unwrap();
    let c = desk.create_request(request_form(&desk)).unwrap();
    desk.assign_worker(&a.id, &w).unwrap();
    desk.set_request_status(&b.id, RequestStatus::Completed).unwrap();

    let task = |request_id: &str| TaskForm {
        request_id: request_id.to_string(),
        worker_id: w.clone(),
        title: "Work".into(),
        description: String::new(),
        priority: Priority::Medium,
        due_date: None,
    };
    let t1 = desk.create_task(task(&a.id)).unwrap();
    let t2 = desk.create_task(task(&c.id)).unwrap();
    desk.set_task_status(&t1.id, TaskStatus::Completed).unwrap();

    let s = desk.stats();
    assert_eq!(s.total_requests, 3);
    assert_eq!(s.pending_requests, 1);
    assert_eq!(s.in_progress_requests, 1);
    assert_eq!(s.completed_requests, 1);
    assert_eq!(s.total_tasks, 2);
    assert_eq!(s.pending_tasks, 1);
    assert_eq!(s.in_progress_tasks, 0);
    assert_eq!(s.completed_tasks, 1);
    assert_eq!(s.total_workers, 1);
    assert_eq!(s.active_workers, 1);

    desk.set_task_status(&t2.id, TaskStatus::Cancelled).unwrap();
    assert_eq!(desk.stats().active_workers, 0);
}
