//! In-process store implementing every repository trait.
//!
//! All state sits behind one lock, so `claim_or_create` is atomic with respect
//! to concurrent callers. Rows carry an insertion sequence number that breaks
//! timestamp ties the same way the `seq` columns do in PostgreSQL.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::auth::hash_token;
use crate::errors::AppError;
use crate::models::{Customer, Document, DocumentType, Person, PurchaseOrderLink, Tagging, Vehicle};
use crate::repository::{
    CustomerDirectory, DocumentRepository, NewVehicle, PurchaseOrderRepository,
    TaggingRepository, VehicleChanges, VehicleRepository,
};

#[derive(Debug, Clone)]
struct StoredTagging {
    seq: u64,
    id: Uuid,
    vehicle_id: Uuid,
    driver_id: Option<Uuid>,
    helper_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct StoredToken {
    customer_id: Uuid,
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct State {
    next_seq: u64,
    customers: HashMap<Uuid, Customer>,
    tokens: HashMap<String, StoredToken>,
    vehicles: Vec<(u64, Vehicle)>,
    drivers: HashMap<Uuid, Person>,
    helpers: HashMap<Uuid, Person>,
    taggings: Vec<StoredTagging>,
    po_links: Vec<(u64, PurchaseOrderLink)>,
    documents: Vec<(u64, Document)>,
}

impl State {
    fn seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn vehicle_mut(&mut self, registration_no: &str) -> Option<&mut Vehicle> {
        self.vehicles
            .iter_mut()
            .map(|(_, v)| v)
            .find(|v| v.vehicle_registration_no == registration_no)
    }

    fn vehicles_newest_first(&self, filter: impl Fn(&Vehicle) -> bool) -> Vec<Vehicle> {
        let mut rows: Vec<&(u64, Vehicle)> =
            self.vehicles.iter().filter(|(_, v)| filter(v)).collect();
        rows.sort_by(|(a_seq, a), (b_seq, b)| {
            b.created_at.cmp(&a.created_at).then(b_seq.cmp(a_seq))
        });
        rows.into_iter().map(|(_, v)| v.clone()).collect()
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, AppError> {
        self.state
            .read()
            .map_err(|_| AppError::InternalError("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, AppError> {
        self.state
            .write()
            .map_err(|_| AppError::InternalError("memory store lock poisoned".to_string()))
    }

    /// Registers a customer and an API token for it.
    pub fn add_customer(&self, name: &str, token: &str) -> Result<Customer, AppError> {
        self.add_customer_with_expiry(name, token, None)
    }

    pub fn add_customer_with_expiry(
        &self,
        name: &str,
        token: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Customer, AppError> {
        let customer = Customer {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: None,
            created_at: Utc::now(),
        };
        let mut state = self.write()?;
        state.customers.insert(customer.id, customer.clone());
        state.tokens.insert(
            hash_token(token),
            StoredToken {
                customer_id: customer.id,
                expires_at,
            },
        );
        Ok(customer)
    }

    /// Inserts a vehicle row as-is, e.g. an unowned vehicle from a back-office import.
    pub fn add_vehicle(
        &self,
        registration_no: &str,
        customer_id: Option<Uuid>,
        created_at: DateTime<Utc>,
    ) -> Result<Vehicle, AppError> {
        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            vehicle_registration_no: registration_no.to_string(),
            customer_id,
            remark: None,
            metadata: serde_json::json!({}),
            created_at,
            updated_at: None,
        };
        let mut state = self.write()?;
        let seq = state.seq();
        state.vehicles.push((seq, vehicle.clone()));
        Ok(vehicle)
    }

    pub fn add_driver(&self, driver: Person) -> Result<(), AppError> {
        self.write()?.drivers.insert(driver.id, driver);
        Ok(())
    }

    pub fn add_helper(&self, helper: Person) -> Result<(), AppError> {
        self.write()?.helpers.insert(helper.id, helper);
        Ok(())
    }

    /// Records a tagging and returns its id.
    pub fn add_tagging(
        &self,
        vehicle_id: Uuid,
        driver_id: Option<Uuid>,
        helper_id: Option<Uuid>,
        created_at: DateTime<Utc>,
    ) -> Result<Uuid, AppError> {
        let mut state = self.write()?;
        let seq = state.seq();
        let id = Uuid::new_v4();
        state.taggings.push(StoredTagging {
            seq,
            id,
            vehicle_id,
            driver_id,
            helper_id,
            created_at,
        });
        Ok(id)
    }

    pub fn add_po_link(
        &self,
        tagging_id: Uuid,
        po_id: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Result<Uuid, AppError> {
        let mut state = self.write()?;
        let seq = state.seq();
        let link = PurchaseOrderLink {
            id: Uuid::new_v4(),
            tagging_id,
            po_id: po_id.map(str::to_string),
            created_at,
        };
        let id = link.id;
        state.po_links.push((seq, link));
        Ok(id)
    }

    pub fn add_document(
        &self,
        reference_id: Uuid,
        document_type: &str,
        name: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Result<Document, AppError> {
        let document = Document::new(
            Uuid::new_v4(),
            reference_id,
            document_type,
            name.map(str::to_string),
            None,
            created_at,
        );
        let mut state = self.write()?;
        let seq = state.seq();
        state.documents.push((seq, document.clone()));
        Ok(document)
    }

    /// Number of vehicle rows, for asserting on side effects.
    pub fn vehicle_count(&self) -> Result<usize, AppError> {
        Ok(self.read()?.vehicles.len())
    }
}

#[async_trait]
impl VehicleRepository for MemoryStore {
    async fn claim_or_create(
        &self,
        registration_no: &str,
        customer_id: Uuid,
    ) -> Result<(Vehicle, bool), AppError> {
        let mut state = self.write()?;

        if let Some(vehicle) = state.vehicle_mut(registration_no) {
            if vehicle.customer_id.is_none() {
                vehicle.customer_id = Some(customer_id);
                vehicle.updated_at = Some(Utc::now());
            }
            return Ok((vehicle.clone(), false));
        }

        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            vehicle_registration_no: registration_no.to_string(),
            customer_id: Some(customer_id),
            remark: None,
            metadata: serde_json::json!({}),
            created_at: Utc::now(),
            updated_at: None,
        };
        let seq = state.seq();
        state.vehicles.push((seq, vehicle.clone()));
        Ok((vehicle, true))
    }

    async fn find_by_registration_no(
        &self,
        registration_no: &str,
    ) -> Result<Option<Vehicle>, AppError> {
        Ok(self
            .read()?
            .vehicles
            .iter()
            .map(|(_, v)| v)
            .find(|v| v.vehicle_registration_no == registration_no)
            .cloned())
    }

    async fn list_by_customer(&self, customer_id: Uuid) -> Result<Vec<Vehicle>, AppError> {
        Ok(self
            .read()?
            .vehicles_newest_first(|v| v.customer_id == Some(customer_id)))
    }

    async fn list_all(&self) -> Result<Vec<Vehicle>, AppError> {
        Ok(self.read()?.vehicles_newest_first(|_| true))
    }

    async fn insert(&self, vehicle: NewVehicle) -> Result<Option<Vehicle>, AppError> {
        let mut state = self.write()?;
        if state.vehicle_mut(&vehicle.vehicle_registration_no).is_some() {
            return Ok(None);
        }

        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            vehicle_registration_no: vehicle.vehicle_registration_no,
            customer_id: vehicle.customer_id,
            remark: vehicle.remark,
            metadata: vehicle.metadata,
            created_at: Utc::now(),
            updated_at: None,
        };
        let seq = state.seq();
        state.vehicles.push((seq, vehicle.clone()));
        Ok(Some(vehicle))
    }

    async fn update(
        &self,
        registration_no: &str,
        changes: VehicleChanges,
    ) -> Result<Option<Vehicle>, AppError> {
        let mut state = self.write()?;
        let Some(vehicle) = state.vehicle_mut(registration_no) else {
            return Ok(None);
        };

        if let Some(remark) = changes.remark {
            vehicle.remark = Some(remark);
        }
        if let Some(metadata) = changes.metadata {
            vehicle.metadata = metadata;
        }
        vehicle.updated_at = Some(Utc::now());
        Ok(Some(vehicle.clone()))
    }

    async fn delete_by_registration_no(&self, registration_no: &str) -> Result<bool, AppError> {
        let mut state = self.write()?;
        let Some(index) = state
            .vehicles
            .iter()
            .position(|(_, v)| v.vehicle_registration_no == registration_no)
        else {
            return Ok(false);
        };

        let (_, vehicle) = state.vehicles.remove(index);

        // Cascade to taggings and their purchase-order links
        let removed: Vec<Uuid> = state
            .taggings
            .iter()
            .filter(|t| t.vehicle_id == vehicle.id)
            .map(|t| t.id)
            .collect();
        state.taggings.retain(|t| t.vehicle_id != vehicle.id);
        state
            .po_links
            .retain(|(_, link)| !removed.contains(&link.tagging_id));

        Ok(true)
    }
}

#[async_trait]
impl TaggingRepository for MemoryStore {
    async fn taggings_for_vehicle(&self, vehicle_id: Uuid) -> Result<Vec<Tagging>, AppError> {
        let state = self.read()?;
        let mut rows: Vec<&StoredTagging> = state
            .taggings
            .iter()
            .filter(|t| t.vehicle_id == vehicle_id)
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.seq.cmp(&a.seq)));

        Ok(rows
            .into_iter()
            .map(|t| Tagging {
                id: t.id,
                vehicle_id: t.vehicle_id,
                driver: t.driver_id.and_then(|id| state.drivers.get(&id).cloned()),
                helper: t.helper_id.and_then(|id| state.helpers.get(&id).cloned()),
                created_at: t.created_at,
            })
            .collect())
    }
}

#[async_trait]
impl PurchaseOrderRepository for MemoryStore {
    async fn latest_link_for_tagging(
        &self,
        tagging_id: Uuid,
    ) -> Result<Option<PurchaseOrderLink>, AppError> {
        Ok(self
            .read()?
            .po_links
            .iter()
            .filter(|(_, link)| link.tagging_id == tagging_id)
            .max_by(|(a_seq, a), (b_seq, b)| {
                a.created_at.cmp(&b.created_at).then(a_seq.cmp(b_seq))
            })
            .map(|(_, link)| link.clone()))
    }
}

#[async_trait]
impl DocumentRepository for MemoryStore {
    async fn documents_for_reference(
        &self,
        reference_id: Uuid,
        types: &[DocumentType],
    ) -> Result<Vec<Document>, AppError> {
        let state = self.read()?;
        let mut rows: Vec<&(u64, Document)> = state
            .documents
            .iter()
            .filter(|(_, d)| {
                d.reference_id == reference_id
                    && types.iter().any(|t| t.as_str() == d.document_type)
            })
            .collect();
        rows.sort_by(|(a_seq, a), (b_seq, b)| {
            b.created_at.cmp(&a.created_at).then(b_seq.cmp(a_seq))
        });
        Ok(rows.into_iter().map(|(_, d)| d.clone()).collect())
    }
}

#[async_trait]
impl CustomerDirectory for MemoryStore {
    async fn customer_for_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Customer>, AppError> {
        let state = self.read()?;
        let Some(token) = state.tokens.get(token_hash) else {
            return Ok(None);
        };
        if token.expires_at.is_some_and(|expires| expires <= Utc::now()) {
            return Ok(None);
        }
        Ok(state.customers.get(&token.customer_id).cloned())
    }
}
