use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

// ============ Database Models ============

/// An authenticated portal customer.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A vehicle keyed by its registration number.
///
/// `remark` and `metadata` are descriptive fields the portal stores as-is.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Vehicle {
    pub id: Uuid,
    #[serde(rename = "vehicleRegistrationNo")]
    pub vehicle_registration_no: String,
    /// Owning customer. Set once, on first claim.
    #[serde(rename = "customer")]
    pub customer_id: Option<Uuid>,
    pub remark: Option<String>,
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
    #[serde(rename = "created")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updated")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Driver or helper as surfaced in a vehicle's aggregated view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Person {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "phoneNo")]
    pub phone_no: Option<String>,
    pub language: Option<String>,
    #[serde(rename = "type")]
    pub person_type: Option<String>,
    pub uid: Option<String>,
}

/// Assignment of a driver and/or helper to a vehicle at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Tagging {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub driver: Option<Person>,
    pub helper: Option<Person>,
    pub created_at: DateTime<Utc>,
}

/// Link between a tagging and a purchase order.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct PurchaseOrderLink {
    pub id: Uuid,
    pub tagging_id: Uuid,
    pub po_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Control document types attached to vehicles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    VehicleRegistration,
    VehicleInsurance,
    VehiclePuc,
}

impl DocumentType {
    /// Document types included in a vehicle's aggregated view.
    pub const VEHICLE_CONTROL: [DocumentType; 3] = [
        DocumentType::VehicleRegistration,
        DocumentType::VehicleInsurance,
        DocumentType::VehiclePuc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::VehicleRegistration => "vehicle_registration",
            DocumentType::VehicleInsurance => "vehicle_insurance",
            DocumentType::VehiclePuc => "vehicle_puc",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        Self::VEHICLE_CONTROL
            .into_iter()
            .find(|t| t.as_str() == tag)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DocumentType::VehicleRegistration => "Vehicle Registration",
            DocumentType::VehicleInsurance => "Vehicle Insurance",
            DocumentType::VehiclePuc => "Pollution Certificate (PUC)",
        }
    }
}

/// Human label for a stored document type tag. Unknown tags are echoed back.
pub fn document_type_display(tag: &str) -> String {
    DocumentType::parse(tag)
        .map(|t| t.display_name().to_string())
        .unwrap_or_else(|| tag.to_string())
}

/// A stored compliance document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Document {
    pub id: Uuid,
    #[serde(rename = "referenceId")]
    pub reference_id: Uuid,
    #[serde(rename = "type")]
    pub document_type: String,
    pub type_display: String,
    pub name: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    #[serde(rename = "created")]
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn new(
        id: Uuid,
        reference_id: Uuid,
        document_type: impl Into<String>,
        name: Option<String>,
        file_path: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let document_type = document_type.into();
        Self {
            id,
            reference_id,
            type_display: document_type_display(&document_type),
            document_type,
            name,
            file_path,
            created_at,
        }
    }
}

/// Trims surrounding whitespace and upper-cases a raw registration number.
///
/// Returns `None` when nothing is left after trimming.
pub fn normalize_registration_no(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}

// ============ API Request Models ============

/// Body of `POST /vehicles/create`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateOrGetVehicleRequest {
    pub vehicle_number: Option<String>,
}

/// Query of `GET /vehicles/vehicle-complete-data`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VehicleCompleteDataQuery {
    /// Registration number, matched exactly.
    pub vehicle_reg_no: Option<String>,
}

/// Body of `POST /vehicles`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateVehicleRequest {
    #[serde(rename = "vehicleRegistrationNo")]
    pub vehicle_registration_no: Option<String>,
    pub remark: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
}

/// Body of `PUT`/`PATCH /vehicles/{registration_no}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateVehicleRequest {
    pub remark: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
}

// ============ API Response Models ============

/// Consolidated view of a vehicle and everything attached to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VehicleCompleteData {
    pub vehicle: Vehicle,
    pub drivers: Vec<Person>,
    pub helpers: Vec<Person>,
    pub po_number: Option<String>,
    pub documents: Vec<Document>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CreateOrGetVehicleResponse {
    #[serde(flatten)]
    pub data: VehicleCompleteData,
    pub created: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MyVehiclesResponse {
    pub vehicles: Vec<Vehicle>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}
