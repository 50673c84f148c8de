use crate::models::Theme;
use crate::storage::{self, keys, Store};

pub fn theme(store: &dyn Store) -> Theme {
    storage::read(store, keys::THEME, Theme::default())
}

pub fn set_theme(store: &dyn Store, theme: Theme) {
    storage::write(store, keys::THEME, &theme);
}
