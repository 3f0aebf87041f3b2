use crate::auth::Caller;
use crate::errors::AppError;
use crate::models::*;
use crate::policy::Operation;
use crate::repository::CustomerDirectory;
use crate::vehicles::VehicleLookupService;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Vehicle lookups and CRUD.
    pub vehicles: VehicleLookupService,
    /// Resolves API tokens to customers.
    pub customers: Arc<dyn CustomerDirectory>,
}

/// Unwraps a JSON request body.
///
/// A request sent without a JSON content type is treated as an empty body, so
/// the handler reports the missing field itself. Malformed or mistyped JSON
/// becomes `AppError::BadRequest`.
fn json_body<T: Default>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(rejection) => {
            tracing::warn!("Rejected request body: {}", rejection.body_text());
            Err(AppError::BadRequest(rejection.body_text()))
        }
    }
}

/// Health check endpoint.
///
/// Returns the service status and version.
///
/// # Returns
///
/// * `(StatusCode, Json<serde_json::Value>)` - HTTP 200 OK with health status JSON.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "vehicle-portal-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// GET /vehicles/my-vehicles
///
/// Vehicles owned by the authenticated customer, newest first.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `caller` - The resolved caller; must be an authenticated customer.
///
/// # Returns
///
/// * `Result<Json<MyVehiclesResponse>, AppError>` - The owned vehicles and their count, or 401.
#[utoipa::path(
    get,
    path = "/vehicles/my-vehicles",
    responses(
        (status = 200, body = MyVehiclesResponse),
        (status = 401, description = "Authentication required")
    ),
    security(("token" = []))
)]
pub async fn my_vehicles(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<MyVehiclesResponse>, AppError> {
    let customer = caller.require(Operation::MyVehicles)?;
    tracing::info!("GET /vehicles/my-vehicles - customer: {}", customer.id);

    let vehicles = state.vehicles.list_owned_vehicles(customer).await?;
    let count = vehicles.len();

    Ok(Json(MyVehiclesResponse { vehicles, count }))
}

/// POST /vehicles/create (alias: /vehicles/create-or-get-vehicle-info)
///
/// Creates the vehicle if it does not exist, otherwise returns the existing one,
/// together with its drivers, helpers, latest PO number and control documents.
/// Responds 201 when a vehicle was created and 200 when one was found.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `caller` - The resolved caller; must be an authenticated customer.
/// * `payload` - Body carrying `vehicle_number`. A missing body counts as a missing number.
///
/// # Returns
///
/// * `Result<(StatusCode, Json<CreateOrGetVehicleResponse>), AppError>` - The vehicle view
///   flagged with `created`, or 400 when the number is blank.
#[utoipa::path(
    post,
    path = "/vehicles/create",
    request_body = CreateOrGetVehicleRequest,
    responses(
        (status = 201, description = "New vehicle created", body = CreateOrGetVehicleResponse),
        (status = 200, description = "Existing vehicle found", body = CreateOrGetVehicleResponse),
        (status = 400, description = "Vehicle number is required"),
        (status = 401, description = "Authentication required")
    ),
    security(("token" = []))
)]
pub async fn create_or_get_vehicle(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    payload: Result<Json<CreateOrGetVehicleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateOrGetVehicleResponse>), AppError> {
    let customer = caller.require(Operation::CreateOrGetVehicle)?;
    let payload = json_body(payload)?;
    tracing::info!(
        "POST /vehicles/create - vehicle_number: {:?}, customer: {}",
        payload.vehicle_number,
        customer.id
    );

    let lookup = state
        .vehicles
        .create_or_get_vehicle(customer, payload.vehicle_number.as_deref().unwrap_or(""))
        .await?;

    let status = if lookup.outcome.is_created() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(CreateOrGetVehicleResponse {
            data: lookup.data,
            created: lookup.outcome.is_created(),
            message: lookup.outcome.message().to_string(),
        }),
    ))
}

/// GET /vehicles/vehicle-complete-data?vehicle_reg_no=...
///
/// Consolidated view of a vehicle, matched by exact registration number.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `caller` - The resolved caller. Anonymous callers are allowed.
/// * `params` - Query parameters containing `vehicle_reg_no`.
///
/// # Returns
///
/// * `Result<Json<VehicleCompleteData>, AppError>` - The vehicle view, 400 or 404.
#[utoipa::path(
    get,
    path = "/vehicles/vehicle-complete-data",
    params(VehicleCompleteDataQuery),
    responses(
        (status = 200, body = VehicleCompleteData),
        (status = 400, description = "vehicle_reg_no query parameter is required"),
        (status = 404, description = "Vehicle not found")
    )
)]
pub async fn vehicle_complete_data(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Query(params): Query<VehicleCompleteDataQuery>,
) -> Result<Json<VehicleCompleteData>, AppError> {
    caller.authorize(Operation::VehicleCompleteData)?;
    tracing::info!(
        "GET /vehicles/vehicle-complete-data - vehicle_reg_no: {:?}",
        params.vehicle_reg_no
    );

    let data = state
        .vehicles
        .get_vehicle_complete_data(params.vehicle_reg_no.as_deref().unwrap_or(""))
        .await?;

    Ok(Json(data))
}

/// GET /vehicles
#[utoipa::path(
    get,
    path = "/vehicles",
    responses((status = 200, body = [Vehicle]))
)]
pub async fn list_vehicles(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<Vec<Vehicle>>, AppError> {
    caller.authorize(Operation::ListVehicles)?;
    tracing::info!("GET /vehicles");

    Ok(Json(state.vehicles.list_vehicles().await?))
}

/// POST /vehicles
///
/// Plain create. The registration number is normalized and must not exist yet.
#[utoipa::path(
    post,
    path = "/vehicles",
    request_body = CreateVehicleRequest,
    responses(
        (status = 201, body = Vehicle),
        (status = 400, description = "Missing or duplicate registration number"),
        (status = 401, description = "Authentication required")
    ),
    security(("token" = []))
)]
pub async fn create_vehicle(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    payload: Result<Json<CreateVehicleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Vehicle>), AppError> {
    let customer = caller.require(Operation::CreateVehicle)?;
    let payload = json_body(payload)?;
    tracing::info!(
        "POST /vehicles - vehicleRegistrationNo: {:?}",
        payload.vehicle_registration_no
    );

    let vehicle = state.vehicles.create_vehicle(customer, payload).await?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

/// GET /vehicles/{registration_no}
#[utoipa::path(
    get,
    path = "/vehicles/{registration_no}",
    params(("registration_no" = String, Path, description = "Exact registration number")),
    responses(
        (status = 200, body = Vehicle),
        (status = 404, description = "Vehicle not found")
    )
)]
pub async fn retrieve_vehicle(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(registration_no): Path<String>,
) -> Result<Json<Vehicle>, AppError> {
    caller.authorize(Operation::RetrieveVehicle)?;
    tracing::info!("GET /vehicles/{}", registration_no);

    Ok(Json(state.vehicles.retrieve_vehicle(&registration_no).await?))
}

/// PUT/PATCH /vehicles/{registration_no}
///
/// Updates `remark` and `metadata`. Ownership is never changed here.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `caller` - The resolved caller; must be an authenticated customer.
/// * `registration_no` - Exact registration number.
/// * `payload` - Fields to change. Absent fields are left as they are.
///
/// # Returns
///
/// * `Result<Json<Vehicle>, AppError>` - The updated vehicle or an error.
#[utoipa::path(
    patch,
    path = "/vehicles/{registration_no}",
    params(("registration_no" = String, Path, description = "Exact registration number")),
    request_body = UpdateVehicleRequest,
    responses(
        (status = 200, body = Vehicle),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Vehicle not found")
    ),
    security(("token" = []))
)]
pub async fn update_vehicle(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(registration_no): Path<String>,
    payload: Result<Json<UpdateVehicleRequest>, JsonRejection>,
) -> Result<Json<Vehicle>, AppError> {
    caller.require(Operation::UpdateVehicle)?;
    let payload = json_body(payload)?;
    tracing::info!("PATCH /vehicles/{}", registration_no);

    Ok(Json(
        state
            .vehicles
            .update_vehicle(&registration_no, payload)
            .await?,
    ))
}

/// DELETE /vehicles/{registration_no}
#[utoipa::path(
    delete,
    path = "/vehicles/{registration_no}",
    params(("registration_no" = String, Path, description = "Exact registration number")),
    responses(
        (status = 200, body = MessageResponse),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Vehicle not found")
    ),
    security(("token" = []))
)]
pub async fn delete_vehicle(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(registration_no): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    caller.require(Operation::DeleteVehicle)?;
    tracing::info!("DELETE /vehicles/{}", registration_no);

    let message = state.vehicles.delete_vehicle(&registration_no).await?;
    Ok(Json(MessageResponse { message }))
}
