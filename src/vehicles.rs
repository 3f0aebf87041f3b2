use std::collections::HashSet;
use std::sync::Arc;

use crate::errors::AppError;
use crate::models::{
    normalize_registration_no, CreateVehicleRequest, Customer, DocumentType, Person, Tagging,
    UpdateVehicleRequest, Vehicle, VehicleCompleteData,
};
use crate::repository::{
    DocumentRepository, NewVehicle, PurchaseOrderRepository, TaggingRepository, VehicleChanges,
    VehicleRepository,
};

/// Whether `create_or_get_vehicle` inserted a new row or found an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    Created,
    Found,
}

impl LookupOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, LookupOutcome::Created)
    }

    pub fn message(&self) -> &'static str {
        match self {
            LookupOutcome::Created => "New vehicle created",
            LookupOutcome::Found => "Existing vehicle found",
        }
    }
}

/// Result of `create_or_get_vehicle`.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleLookup {
    pub data: VehicleCompleteData,
    pub outcome: LookupOutcome,
}

/// Vehicle lookups, the consolidated vehicle view, and vehicle CRUD.
#[derive(Clone)]
pub struct VehicleLookupService {
    vehicles: Arc<dyn VehicleRepository>,
    taggings: Arc<dyn TaggingRepository>,
    purchase_orders: Arc<dyn PurchaseOrderRepository>,
    documents: Arc<dyn DocumentRepository>,
}

impl VehicleLookupService {
    pub fn new(
        vehicles: Arc<dyn VehicleRepository>,
        taggings: Arc<dyn TaggingRepository>,
        purchase_orders: Arc<dyn PurchaseOrderRepository>,
        documents: Arc<dyn DocumentRepository>,
    ) -> Self {
        Self {
            vehicles,
            taggings,
            purchase_orders,
            documents,
        }
    }

    /// Builds the service over a single store implementing every repository.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: VehicleRepository
            + TaggingRepository
            + PurchaseOrderRepository
            + DocumentRepository
            + 'static,
    {
        Self::new(store.clone(), store.clone(), store.clone(), store)
    }

    /// Vehicles owned by `customer`, newest first, without duplicates.
    pub async fn list_owned_vehicles(&self, customer: &Customer) -> Result<Vec<Vehicle>, AppError> {
        let vehicles = self.vehicles.list_by_customer(customer.id).await?;
        let mut seen = HashSet::new();
        Ok(vehicles.into_iter().filter(|v| seen.insert(v.id)).collect())
    }

    /// Looks up a vehicle by normalized registration number, creating it for
    /// `customer` when absent. An unowned vehicle is claimed by `customer`; an
    /// owned one is never reassigned.
    pub async fn create_or_get_vehicle(
        &self,
        customer: &Customer,
        vehicle_number: &str,
    ) -> Result<VehicleLookup, AppError> {
        let registration_no = normalize_registration_no(vehicle_number)
            .ok_or_else(|| AppError::BadRequest("Vehicle number is required".to_string()))?;

        let (vehicle, created) = self
            .vehicles
            .claim_or_create(&registration_no, customer.id)
            .await?;

        let outcome = if created {
            tracing::info!("Created vehicle {} for customer {}", registration_no, customer.id);
            LookupOutcome::Created
        } else {
            LookupOutcome::Found
        };

        let data = self.complete_data(vehicle).await?;
        Ok(VehicleLookup { data, outcome })
    }

    /// Consolidated view of the vehicle whose registration number equals
    /// `vehicle_reg_no` exactly.
    pub async fn get_vehicle_complete_data(
        &self,
        vehicle_reg_no: &str,
    ) -> Result<VehicleCompleteData, AppError> {
        if vehicle_reg_no.is_empty() {
            return Err(AppError::BadRequest(
                "vehicle_reg_no query parameter is required".to_string(),
            ));
        }

        let vehicle = self.require_vehicle(vehicle_reg_no).await?;
        self.complete_data(vehicle).await
    }

    /// Deletes a vehicle and returns the confirmation message.
    pub async fn delete_vehicle(&self, vehicle_reg_no: &str) -> Result<String, AppError> {
        if !self
            .vehicles
            .delete_by_registration_no(vehicle_reg_no)
            .await?
        {
            return Err(not_found());
        }

        tracing::info!("Deleted vehicle {}", vehicle_reg_no);
        Ok(format!("Vehicle {} deleted successfully", vehicle_reg_no))
    }

    pub async fn list_vehicles(&self) -> Result<Vec<Vehicle>, AppError> {
        self.vehicles.list_all().await
    }

    pub async fn retrieve_vehicle(&self, vehicle_reg_no: &str) -> Result<Vehicle, AppError> {
        self.require_vehicle(vehicle_reg_no).await
    }

    /// Inserts a vehicle owned by `customer`. Duplicate numbers are rejected.
    pub async fn create_vehicle(
        &self,
        customer: &Customer,
        request: CreateVehicleRequest,
    ) -> Result<Vehicle, AppError> {
        let registration_no = request
            .vehicle_registration_no
            .as_deref()
            .and_then(normalize_registration_no)
            .ok_or_else(|| {
                AppError::BadRequest("vehicleRegistrationNo is required".to_string())
            })?;

        let new_vehicle = NewVehicle {
            vehicle_registration_no: registration_no,
            customer_id: Some(customer.id),
            remark: request.remark,
            metadata: metadata_object(request.metadata)?,
        };

        self.vehicles.insert(new_vehicle).await?.ok_or_else(|| {
            AppError::BadRequest("vehicle with this registration number already exists".to_string())
        })
    }

    /// Updates descriptive fields only. Ownership is untouched.
    pub async fn update_vehicle(
        &self,
        vehicle_reg_no: &str,
        request: UpdateVehicleRequest,
    ) -> Result<Vehicle, AppError> {
        let changes = VehicleChanges {
            remark: request.remark,
            metadata: match request.metadata {
                Some(value) => Some(metadata_object(Some(value))?),
                None => None,
            },
        };

        self.vehicles
            .update(vehicle_reg_no, changes)
            .await?
            .ok_or_else(not_found)
    }

    async fn require_vehicle(&self, vehicle_reg_no: &str) -> Result<Vehicle, AppError> {
        self.vehicles
            .find_by_registration_no(vehicle_reg_no)
            .await?
            .ok_or_else(not_found)
    }

    async fn complete_data(&self, vehicle: Vehicle) -> Result<VehicleCompleteData, AppError> {
        let taggings = self.taggings.taggings_for_vehicle(vehicle.id).await?;
        let (drivers, helpers) = distinct_people(&taggings);

        let po_number = match taggings.first() {
            Some(latest) => self
                .purchase_orders
                .latest_link_for_tagging(latest.id)
                .await?
                .and_then(|link| link.po_id),
            None => None,
        };

        let documents = self
            .documents
            .documents_for_reference(vehicle.id, &DocumentType::VEHICLE_CONTROL)
            .await?;

        tracing::debug!(
            "Vehicle {}: {} taggings, {} drivers, {} helpers, {} documents",
            vehicle.vehicle_registration_no,
            taggings.len(),
            drivers.len(),
            helpers.len(),
            documents.len()
        );

        Ok(VehicleCompleteData {
            vehicle,
            drivers,
            helpers,
            po_number,
            documents,
        })
    }
}

/// Collects the distinct drivers and helpers of `taggings` (newest first).
///
/// Each id is kept once, in first-seen order, with the attributes from its
/// first (most recent) occurrence.
pub fn distinct_people(taggings: &[Tagging]) -> (Vec<Person>, Vec<Person>) {
    let mut drivers = Vec::new();
    let mut helpers = Vec::new();
    let mut seen_drivers = HashSet::new();
    let mut seen_helpers = HashSet::new();

    for tagging in taggings {
        if let Some(driver) = &tagging.driver {
            if seen_drivers.insert(driver.id) {
                drivers.push(driver.clone());
            }
        }
        if let Some(helper) = &tagging.helper {
            if seen_helpers.insert(helper.id) {
                helpers.push(helper.clone());
            }
        }
    }

    (drivers, helpers)
}

fn metadata_object(value: Option<serde_json::Value>) -> Result<serde_json::Value, AppError> {
    match value {
        None | Some(serde_json::Value::Null) => Ok(serde_json::json!({})),
        Some(value @ serde_json::Value::Object(_)) => Ok(value),
        Some(_) => Err(AppError::BadRequest(
            "metadata must be a JSON object".to_string(),
        )),
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Vehicle not found".to_string())
}
