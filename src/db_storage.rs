use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::{AppError, ResultExt};
use crate::models::{Customer, Document, DocumentType, Person, PurchaseOrderLink, Tagging, Vehicle};
use crate::repository::{
    CustomerDirectory, DocumentRepository, NewVehicle, PurchaseOrderRepository,
    TaggingRepository, VehicleChanges, VehicleRepository,
};

const VEHICLE_COLUMNS: &str =
    "id, vehicle_registration_no, customer_id, remark, metadata, created_at, updated_at";

/// PostgreSQL-backed implementation of every repository trait.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Row returned by the get-or-create upsert.
#[derive(FromRow)]
struct ClaimedVehicle {
    #[sqlx(flatten)]
    vehicle: Vehicle,
    created: bool,
}

/// Tagging joined with its driver and helper columns.
#[derive(FromRow)]
struct TaggingRow {
    id: Uuid,
    vehicle_id: Uuid,
    created_at: DateTime<Utc>,
    driver_id: Option<Uuid>,
    driver_name: Option<String>,
    driver_phone_no: Option<String>,
    driver_language: Option<String>,
    driver_type: Option<String>,
    driver_uid: Option<String>,
    helper_id: Option<Uuid>,
    helper_name: Option<String>,
    helper_phone_no: Option<String>,
    helper_language: Option<String>,
    helper_type: Option<String>,
    helper_uid: Option<String>,
}

impl From<TaggingRow> for Tagging {
    fn from(row: TaggingRow) -> Self {
        let driver = row.driver_id.map(|id| Person {
            id,
            name: row.driver_name.unwrap_or_default(),
            phone_no: row.driver_phone_no,
            language: row.driver_language,
            person_type: row.driver_type,
            uid: row.driver_uid,
        });
        let helper = row.helper_id.map(|id| Person {
            id,
            name: row.helper_name.unwrap_or_default(),
            phone_no: row.helper_phone_no,
            language: row.helper_language,
            person_type: row.helper_type,
            uid: row.helper_uid,
        });

        Tagging {
            id: row.id,
            vehicle_id: row.vehicle_id,
            driver,
            helper,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct DocumentRow {
    id: Uuid,
    reference_id: Uuid,
    document_type: String,
    name: Option<String>,
    file_path: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document::new(
            row.id,
            row.reference_id,
            row.document_type,
            row.name,
            row.file_path,
            row.created_at,
        )
    }
}

#[async_trait]
impl VehicleRepository for PgStore {
    async fn claim_or_create(
        &self,
        registration_no: &str,
        customer_id: Uuid,
    ) -> Result<(Vehicle, bool), AppError> {
        // Single statement: insert, or attach the owner only when the row has none.
        // xmax = 0 holds only for a freshly inserted tuple.
        let claimed = sqlx::query_as::<_, ClaimedVehicle>(&format!(
            r#"
            INSERT INTO vehicles (vehicle_registration_no, customer_id)
            VALUES ($1, $2)
            ON CONFLICT (vehicle_registration_no) DO UPDATE
            SET customer_id = COALESCE(vehicles.customer_id, EXCLUDED.customer_id),
                updated_at = CASE
                    WHEN vehicles.customer_id IS NULL THEN now()
                    ELSE vehicles.updated_at
                END
            RETURNING {VEHICLE_COLUMNS}, (xmax = 0) AS created
            "#
        ))
        .bind(registration_no)
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("claim_or_create vehicle {}", registration_no))?;

        tracing::debug!(
            "claim_or_create {} -> created={}",
            registration_no,
            claimed.created
        );

        Ok((claimed.vehicle, claimed.created))
    }

    async fn find_by_registration_no(
        &self,
        registration_no: &str,
    ) -> Result<Option<Vehicle>, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(&format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE vehicle_registration_no = $1"
        ))
        .bind(registration_no)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vehicle)
    }

    async fn list_by_customer(&self, customer_id: Uuid) -> Result<Vec<Vehicle>, AppError> {
        let vehicles = sqlx::query_as::<_, Vehicle>(&format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE customer_id = $1 \
             ORDER BY created_at DESC, seq DESC"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(vehicles)
    }

    async fn list_all(&self) -> Result<Vec<Vehicle>, AppError> {
        let vehicles = sqlx::query_as::<_, Vehicle>(&format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles ORDER BY created_at DESC, seq DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(vehicles)
    }

    async fn insert(&self, vehicle: NewVehicle) -> Result<Option<Vehicle>, AppError> {
        let inserted = sqlx::query_as::<_, Vehicle>(&format!(
            r#"
            INSERT INTO vehicles (vehicle_registration_no, customer_id, remark, metadata)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (vehicle_registration_no) DO NOTHING
            RETURNING {VEHICLE_COLUMNS}
            "#
        ))
        .bind(&vehicle.vehicle_registration_no)
        .bind(vehicle.customer_id)
        .bind(&vehicle.remark)
        .bind(&vehicle.metadata)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("insert vehicle {}", vehicle.vehicle_registration_no))?;

        if inserted.is_some() {
            tracing::debug!("Inserted vehicle {}", vehicle.vehicle_registration_no);
        }

        Ok(inserted)
    }

    async fn update(
        &self,
        registration_no: &str,
        changes: VehicleChanges,
    ) -> Result<Option<Vehicle>, AppError> {
        let updated = sqlx::query_as::<_, Vehicle>(&format!(
            r#"
            UPDATE vehicles
            SET remark = COALESCE($2, remark),
                metadata = COALESCE($3, metadata),
                updated_at = now()
            WHERE vehicle_registration_no = $1
            RETURNING {VEHICLE_COLUMNS}
            "#
        ))
        .bind(registration_no)
        .bind(&changes.remark)
        .bind(&changes.metadata)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("update vehicle {}", registration_no))?;

        Ok(updated)
    }

    async fn delete_by_registration_no(&self, registration_no: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM vehicles WHERE vehicle_registration_no = $1")
            .bind(registration_no)
            .execute(&self.pool)
            .await
            .with_context(|| format!("delete vehicle {}", registration_no))?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TaggingRepository for PgStore {
    async fn taggings_for_vehicle(&self, vehicle_id: Uuid) -> Result<Vec<Tagging>, AppError> {
        let rows = sqlx::query_as::<_, TaggingRow>(
            r#"
            SELECT t.id, t.vehicle_id, t.created_at,
                   d.id AS driver_id, d.name AS driver_name, d.phone_no AS driver_phone_no,
                   d.language AS driver_language, d.person_type AS driver_type, d.uid AS driver_uid,
                   h.id AS helper_id, h.name AS helper_name, h.phone_no AS helper_phone_no,
                   h.language AS helper_language, h.person_type AS helper_type, h.uid AS helper_uid
            FROM driver_vehicle_taggings t
            LEFT JOIN drivers d ON d.id = t.driver_id
            LEFT JOIN helpers h ON h.id = t.helper_id
            WHERE t.vehicle_id = $1
            ORDER BY t.created_at DESC, t.seq DESC
            "#,
        )
        .bind(vehicle_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Tagging::from).collect())
    }
}

#[async_trait]
impl PurchaseOrderRepository for PgStore {
    async fn latest_link_for_tagging(
        &self,
        tagging_id: Uuid,
    ) -> Result<Option<PurchaseOrderLink>, AppError> {
        let link = sqlx::query_as::<_, PurchaseOrderLink>(
            r#"
            SELECT id, tagging_id, po_id, created_at
            FROM po_driver_vehicle_taggings
            WHERE tagging_id = $1
            ORDER BY created_at DESC, seq DESC
            LIMIT 1
            "#,
        )
        .bind(tagging_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(link)
    }
}

#[async_trait]
impl DocumentRepository for PgStore {
    async fn documents_for_reference(
        &self,
        reference_id: Uuid,
        types: &[DocumentType],
    ) -> Result<Vec<Document>, AppError> {
        let types: Vec<String> = types.iter().map(|t| t.as_str().to_string()).collect();

        let rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, reference_id, document_type, name, file_path, created_at
            FROM document_control
            WHERE reference_id = $1 AND document_type = ANY($2)
            ORDER BY created_at DESC, seq DESC
            "#,
        )
        .bind(reference_id)
        .bind(types)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Document::from).collect())
    }
}

#[async_trait]
impl CustomerDirectory for PgStore {
    async fn customer_for_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT c.id, c.name, c.email, c.created_at
            FROM customer_tokens t
            JOIN customers c ON c.id = t.customer_id
            WHERE t.token_hash = $1
              AND (t.expires_at IS NULL OR t.expires_at > now())
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }
}
