use std::env;
use std::sync::Arc;
use uuid::Uuid;

use vehicle_portal_api::db::Database;
use vehicle_portal_api::db_storage::PgStore;
use vehicle_portal_api::repository::VehicleRepository;
use vehicle_portal_api::vehicles::VehicleLookupService;

async fn connect() -> anyhow::Result<Database> {
    let db_url = env::var("TEST_DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("Set TEST_DATABASE_URL to run this test"))?;

    let db = Database::new(&db_url, 2).await?;
    db.apply_schema().await?;
    Ok(db)
}

async fn insert_customer(db: &Database) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) =
        sqlx::query_as("INSERT INTO customers (name) VALUES ('Smoke Test') RETURNING id")
            .fetch_one(&db.pool)
            .await?;
    Ok(id)
}

/// Claim-or-create against PostgreSQL: insert, find, then first-claim-wins.
/// Marked ignored so it only runs against a disposable database.
#[tokio::test]
#[ignore]
async fn claim_or_create_smoke_test() -> anyhow::Result<()> {
    let db = connect().await?;
    let store = PgStore::new(db.pool.clone());

    let a = insert_customer(&db).await?;
    let b = insert_customer(&db).await?;

    // Unique number per run
    let number = format!("ZZ{}", Uuid::new_v4().simple()).to_uppercase();

    let (first, created) = store.claim_or_create(&number, a).await?;
    assert!(created);
    assert_eq!(first.customer_id, Some(a));

    let (second, created) = store.claim_or_create(&number, b).await?;
    assert!(!created);
    assert_eq!(second.id, first.id);
    assert_eq!(second.customer_id, Some(a));

    assert!(store.delete_by_registration_no(&number).await?);
    Ok(())
}

/// Full aggregation over seeded rows.
#[tokio::test]
#[ignore]
async fn complete_data_smoke_test() -> anyhow::Result<()> {
    let db = connect().await?;
    let store = Arc::new(PgStore::new(db.pool.clone()));
    let service = VehicleLookupService::from_store(store.clone());

    let customer = insert_customer(&db).await?;
    let number = format!("YY{}", Uuid::new_v4().simple()).to_uppercase();
    let (vehicle, _) = store.claim_or_create(&number, customer).await?;

    let (driver_id,): (Uuid,) =
        sqlx::query_as("INSERT INTO drivers (name, phone_no) VALUES ('Smoke Driver', '9000000000') RETURNING id")
            .fetch_one(&db.pool)
            .await?;
    let (tagging_id,): (Uuid,) = sqlx::query_as(
        "INSERT INTO driver_vehicle_taggings (vehicle_id, driver_id) VALUES ($1, $2) RETURNING id",
    )
    .bind(vehicle.id)
    .bind(driver_id)
    .fetch_one(&db.pool)
    .await?;

    let po = format!("PO-{}", Uuid::new_v4().simple());
    sqlx::query("INSERT INTO purchase_orders (id) VALUES ($1)")
        .bind(&po)
        .execute(&db.pool)
        .await?;
    sqlx::query("INSERT INTO po_driver_vehicle_taggings (tagging_id, po_id) VALUES ($1, $2)")
        .bind(tagging_id)
        .bind(&po)
        .execute(&db.pool)
        .await?;
    sqlx::query(
        "INSERT INTO document_control (reference_id, document_type, name) VALUES ($1, 'vehicle_insurance', 'ins.pdf'), ($1, 'other', 'misc.pdf')",
    )
    .bind(vehicle.id)
    .execute(&db.pool)
    .await?;

    let data = service
        .get_vehicle_complete_data(&number)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    assert_eq!(data.drivers.len(), 1);
    assert_eq!(data.drivers[0].id, driver_id);
    assert_eq!(data.po_number.as_deref(), Some(po.as_str()));
    assert_eq!(data.documents.len(), 1);
    assert_eq!(data.documents[0].document_type, "vehicle_insurance");

    service
        .delete_vehicle(&number)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    Ok(())
}
