//! Data-access traits, one per entity.
//!
//! `VehicleLookupService` depends only on these traits, so the aggregation
//! logic runs the same against PostgreSQL (`db_storage::PgStore`) and the
//! in-process store (`memory_store::MemoryStore`).

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Customer, Document, DocumentType, PurchaseOrderLink, Tagging, Vehicle};

/// Fields for a vehicle inserted through the plain create endpoint.
#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub vehicle_registration_no: String,
    pub customer_id: Option<Uuid>,
    pub remark: Option<String>,
    pub metadata: serde_json::Value,
}

/// Partial update of a vehicle's descriptive fields.
#[derive(Debug, Clone, Default)]
pub struct VehicleChanges {
    pub remark: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[async_trait]
pub trait VehicleRepository: Send + Sync {
    /// Atomically fetches the vehicle for `registration_no`, inserting it owned by
    /// `customer_id` when absent, or attaching `customer_id` when it has no owner.
    ///
    /// Returns the resulting row and whether it was inserted.
    async fn claim_or_create(
        &self,
        registration_no: &str,
        customer_id: Uuid,
    ) -> Result<(Vehicle, bool), AppError>;

    async fn find_by_registration_no(
        &self,
        registration_no: &str,
    ) -> Result<Option<Vehicle>, AppError>;

    /// Vehicles owned by `customer_id`, newest first.
    async fn list_by_customer(&self, customer_id: Uuid) -> Result<Vec<Vehicle>, AppError>;

    /// Every vehicle, newest first.
    async fn list_all(&self) -> Result<Vec<Vehicle>, AppError>;

    /// Inserts a vehicle. Returns `None` if the registration number is taken.
    async fn insert(&self, vehicle: NewVehicle) -> Result<Option<Vehicle>, AppError>;

    async fn update(
        &self,
        registration_no: &str,
        changes: VehicleChanges,
    ) -> Result<Option<Vehicle>, AppError>;

    /// Deletes by exact registration number. Returns whether a row was removed.
    async fn delete_by_registration_no(&self, registration_no: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait TaggingRepository: Send + Sync {
    /// Taggings of a vehicle, newest first, with driver and helper resolved.
    async fn taggings_for_vehicle(&self, vehicle_id: Uuid) -> Result<Vec<Tagging>, AppError>;
}

#[async_trait]
pub trait PurchaseOrderRepository: Send + Sync {
    /// Most recent purchase-order link of a tagging.
    async fn latest_link_for_tagging(
        &self,
        tagging_id: Uuid,
    ) -> Result<Option<PurchaseOrderLink>, AppError>;
}

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Documents referencing `reference_id` whose type is in `types`, newest first.
    async fn documents_for_reference(
        &self,
        reference_id: Uuid,
        types: &[DocumentType],
    ) -> Result<Vec<Document>, AppError>;
}

#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    /// Resolves an API token digest (see `auth::hash_token`) to its customer.
    /// Expired tokens resolve to `None`.
    async fn customer_for_token_hash(&self, token_hash: &str)
        -> Result<Option<Customer>, AppError>;
}
