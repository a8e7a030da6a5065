use rocket::serde::json::{Json, Value, json};
use rocket::{Build, Rocket};

use crate::telemetry::TelemetryFairing;

#[get("/test")]
pub fn smoke_test() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

pub fn smoke_rocket() -> Rocket<Build> {
    rocket::build()
        .mount("/api", routes![smoke_test])
        .attach(TelemetryFairing)
}
