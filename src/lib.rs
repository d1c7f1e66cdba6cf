#[macro_use]
extern crate rocket;
extern crate rocket_okapi;

pub mod config;
pub mod db;
pub mod models;
pub mod routes;
pub mod server;
pub mod services;
pub mod utils;
