use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::handlers;
use crate::models::{
    CreateOrGetVehicleRequest, CreateOrGetVehicleResponse, CreateVehicleRequest, Document,
    MessageResponse, MyVehiclesResponse, Person, UpdateVehicleRequest, Vehicle,
    VehicleCompleteData,
};

#[derive(OpenApi)]
#[openapi(
    info(title = "Vehicle Portal API", description = "Vehicles, their drivers/helpers and control documents"),
    paths(
        handlers::health,
        handlers::my_vehicles,
        handlers::create_or_get_vehicle,
        handlers::vehicle_complete_data,
        handlers::list_vehicles,
        handlers::create_vehicle,
        handlers::retrieve_vehicle,
        handlers::update_vehicle,
        handlers::delete_vehicle,
    ),
    components(schemas(
        Vehicle,
        Person,
        Document,
        VehicleCompleteData,
        CreateOrGetVehicleRequest,
        CreateOrGetVehicleResponse,
        CreateVehicleRequest,
        UpdateVehicleRequest,
        MyVehiclesResponse,
        MessageResponse,
    )),
    modifiers(&TokenAuth),
    tags((name = "vehicles"))
)]
pub struct ApiDoc;

/// Registers the `token` security scheme referenced by authenticated paths.
struct TokenAuth;

impl Modify for TokenAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "token",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}
