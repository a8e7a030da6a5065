#[macro_use]
extern crate rocket;

pub mod api;
pub mod certificates;
pub mod cli;
pub mod client;
pub mod database;
pub mod db;
pub mod env;
pub mod error;
pub mod models;
pub mod password_reset;
pub mod report;
pub mod reset_flow;
pub mod reset_form;
pub mod reset_link;
pub mod reset_token;
pub mod smoke;
pub mod telemetry;
pub mod validation;
#[cfg(test)]
mod test;

use api::{api_forgot_password, api_reset_password, health};
use env::Settings;
use rocket::{Build, Rocket};
use sqlx::{Pool, Sqlite};
use telemetry::TelemetryFairing;
use tracing::info;
use validation::{bad_request_api, default_api, not_found_api, unprocessable_api};

pub fn init_rocket(pool: Pool<Sqlite>, settings: Settings) -> Rocket<Build> {
    info!("Starting quizcert service");

    rocket::build()
        .manage(pool)
        .manage(settings)
        .register(
            "/api",
            catchers![bad_request_api, unprocessable_api, not_found_api, default_api],
        )
        .mount(
            "/api",
            routes![api_forgot_password, api_reset_password, health],
        )
        .attach(TelemetryFairing)
}
