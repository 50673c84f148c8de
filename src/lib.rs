pub mod commands;
pub mod config;
pub mod desk;
pub mod models;
pub mod prefs;
pub mod repository;
pub mod seed;
pub mod session;
pub mod storage;
