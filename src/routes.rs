use actix_web::{get, post, web, HttpResponse};
use serde::Serialize;
use serde_json::json;

use crate::{
    auth::Caller,
    error::AppError,
    payloads::{ActivityPayload, CredentialsPayload, JoinPayload, TripPayload},
    schemas::Trip,
    state::AppState,
};

#[derive(Serialize)]
struct LoginResponse {
    token: String,
    email: String,
}

#[derive(Serialize)]
struct JoinResponse {
    msg: &'static str,
    trip: Trip,
}

#[post("/auth/register")]
async fn register(
    state: web::Data<AppState>,
    json: web::Json<CredentialsPayload>,
) -> Result<HttpResponse, AppError> {
    let credentials = json.into_inner().validate()?;
    state
        .auth
        .register(&credentials.email, &credentials.password)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "msg": "Registered" })))
}

#[post("/auth/login")]
async fn login(
    state: web::Data<AppState>,
    json: web::Json<CredentialsPayload>,
) -> Result<HttpResponse, AppError> {
    let credentials = json.into_inner().validate()?;
    let token = state
        .auth
        .login(&credentials.email, &credentials.password)
        .await?;
    Ok(HttpResponse::Ok().json(LoginResponse {
        token,
        email: credentials.email,
    }))
}

#[post("/trip")]
async fn create_trip(
    state: web::Data<AppState>,
    caller: Caller,
    json: web::Json<TripPayload>,
) -> Result<HttpResponse, AppError> {
    let new = json.into_inner().validate()?;
    let trip = state.trips.create_trip(&caller.0, new).await?;
    Ok(HttpResponse::Ok().json(trip))
}

#[get("/trip")]
async fn list_trips(state: web::Data<AppState>, caller: Caller) -> Result<HttpResponse, AppError> {
    let trips = state.trips.list_trips(&caller.0).await?;
    Ok(HttpResponse::Ok().json(trips))
}

// The join code is the trip id
#[post("/trip/join")]
async fn join_trip(
    state: web::Data<AppState>,
    caller: Caller,
    json: web::Json<JoinPayload>,
) -> Result<HttpResponse, AppError> {
    let code = json.into_inner().validate()?;
    let trip = state.trips.join_trip(&caller.0, &code).await?;
    Ok(HttpResponse::Ok().json(JoinResponse {
        msg: "Joined trip!",
        trip,
    }))
}

#[post("/trip/{trip_id}/activity")]
async fn add_activity(
    state: web::Data<AppState>,
    caller: Caller,
    trip_id: web::Path<String>,
    json: web::Json<ActivityPayload>,
) -> Result<HttpResponse, AppError> {
    let new = json.into_inner().validate()?;
    let activity = state
        .trips
        .add_activity(&caller.0, &trip_id.into_inner(), new)
        .await?;
    Ok(HttpResponse::Ok().json(activity))
}

#[get("/trip/{trip_id}/activity")]
async fn list_activities(
    state: web::Data<AppState>,
    caller: Caller,
    trip_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let activities = state
        .trips
        .list_activities(&caller.0, &trip_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(activities))
}

#[post("/trip/{trip_id}/activity/{index}/vote")]
async fn toggle_vote(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<(String, usize)>,
) -> Result<HttpResponse, AppError> {
    let (trip_id, index) = path.into_inner();
    let activity = state.trips.toggle_vote(&caller.0, &trip_id, index).await?;
    Ok(HttpResponse::Ok().json(activity))
}

#[get("/health")]
async fn health(state: web::Data<AppState>) -> HttpResponse {
    match state.store.ping().await {
        Ok(()) => HttpResponse::Ok().json(json!({ "status": "ok" })),
        Err(_) => HttpResponse::ServiceUnavailable().json(json!({ "status": "unavailable" })),
    }
}

/// Mounts every route, the API ones under `/api`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _| AppError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _| AppError::Validation(err.to_string()).into()),
    )
    .service(health)
    .service(
        web::scope("/api")
            .service(register)
            .service(login)
            .service(create_trip)
            .service(list_trips)
            .service(join_trip)
            .service(add_activity)
            .service(list_activities)
            .service(toggle_vote),
    );
}
