use crate::models::{NewService, NewUser, Role, ServiceRequest, Task};
use crate::repository::{Services, Users};
use crate::session::hash_password;
use crate::storage::{self, keys, Store};

struct SeedAccount {
    username: &'static str,
    password: &'static str,
    role: Role,
    full_name: &'static str,
    email: Option<&'static str>,
    phone: Option<&'static str>,
}

const ACCOUNTS: &[SeedAccount] = &[
    SeedAccount {
        username: "admin",
        password: "admin123",
        role: Role::Admin,
        full_name: "General Manager",
        email: Some("admin@example.com"),
        phone: None,
    },
    SeedAccount {
        username: "service1",
        password: "service123",
        role: Role::CustomerService,
        full_name: "Customer Service Agent",
        email: Some("service@example.com"),
        phone: None,
    },
    SeedAccount {
        username: "worker1",
        password: "worker123",
        role: Role::Worker,
        full_name: "First Worker",
        email: None,
        phone: Some("0501234567"),
    },
];

// (name, description, category, minutes)
const CATALOG: &[(&str, &str, &str, u32)] = &[
    ("General maintenance", "General maintenance for facilities", "maintenance", 120),
    ("Cleaning", "Full cleaning services", "cleaning", 90),
    ("Electrical", "Electrical work and repairs", "electrical", 60),
];

/// Creates the default accounts when there are no users at all.
pub fn initialize_users(store: &dyn Store) {
    let users = Users::new(store);
    if !users.is_empty() {
        return;
    }
    let mut created = Vec::with_capacity(ACCOUNTS.len());
    for account in ACCOUNTS {
        let password_hash = match hash_password(account.password) {
            Ok(h) => h,
            Err(e) => {
                log::error!("Failed to hash seed password for '{}': {e}", account.username);
                continue;
            }
        };
        created.push(users.create(NewUser {
            username: account.username.to_string(),
            password_hash,
            role: account.role,
            full_name: account.full_name.to_string(),
            email: account.email.map(str::to_string),
            phone: account.phone.map(str::to_string),
        }));
    }
    log::info!("Seeded {} default accounts", created.len());
}

/// Creates the default catalog when there are no services at all.
pub fn initialize_services(store: &dyn Store) {
    let services = Services::new(store);
    if !services.is_empty() {
        return;
    }
    for (name, description, category, minutes) in CATALOG {
        services.create(NewService {
            name: name.to_string(),
            description: description.to_string(),
            category: category.to_string(),
            estimated_duration: *minutes,
        });
    }
    log::info!("Seeded {} catalog services", CATALOG.len());
}

/// Makes sure an empty collection is stored under `key`.
fn initialize_empty<T>(store: &dyn Store, key: &str)
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    let existing: Vec<T> = storage::read(store, key, Vec::new());
    if existing.is_empty() {
        storage::write(store, key, &existing);
    }
}

/// Seeds every collection that is still empty. Safe to run on every start.
pub fn initialize(store: &dyn Store) {
    initialize_users(store);
    initialize_services(store);
    initialize_empty::<ServiceRequest>(store, keys::REQUESTS);
    initialize_empty::<Task>(store, keys::TASKS);
}
