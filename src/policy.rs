//! Which operations need an authenticated customer.

use crate::errors::AppError;
use crate::models::Customer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListVehicles,
    RetrieveVehicle,
    CreateVehicle,
    UpdateVehicle,
    DeleteVehicle,
    MyVehicles,
    CreateOrGetVehicle,
    VehicleCompleteData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Public,
    Authenticated,
}

/// Operation to required capability.
pub const POLICY: &[(Operation, Capability)] = &[
    (Operation::ListVehicles, Capability::Public),
    (Operation::RetrieveVehicle, Capability::Public),
    (Operation::VehicleCompleteData, Capability::Public),
    (Operation::CreateVehicle, Capability::Authenticated),
    (Operation::UpdateVehicle, Capability::Authenticated),
    (Operation::DeleteVehicle, Capability::Authenticated),
    (Operation::MyVehicles, Capability::Authenticated),
    (Operation::CreateOrGetVehicle, Capability::Authenticated),
];

/// Unlisted operations require authentication.
pub fn required_capability(operation: Operation) -> Capability {
    POLICY
        .iter()
        .find(|(op, _)| *op == operation)
        .map(|(_, capability)| *capability)
        .unwrap_or(Capability::Authenticated)
}

pub fn authorize(operation: Operation, caller: Option<&Customer>) -> Result<(), AppError> {
    match (required_capability(operation), caller) {
        (Capability::Public, _) | (Capability::Authenticated, Some(_)) => Ok(()),
        (Capability::Authenticated, None) => Err(AppError::Unauthorized(
            "Authentication credentials were not provided".to_string(),
        )),
    }
}
