//! Client repository for database operations.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use kopa_core::loan::{ClientDirectory, ClientRef, LoanError};
use kopa_shared::types::ClientId;

use super::db_err;
use crate::entities::clients;

/// Input for registering a client.
#[derive(Debug, Clone)]
pub struct NewClient {
    /// Legal name; also names the client's receivable account.
    pub full_name: String,
    /// National ID number, unique per client.
    pub id_number: String,
    /// Optional phone number.
    pub phone_number: Option<String>,
}

/// Client repository implementation.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    db: DatabaseConnection,
}

impl ClientRepository {
    /// Create a new client repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Register a client.
    pub async fn create(&self, input: NewClient) -> Result<ClientRef, LoanError> {
        let model = clients::ActiveModel {
            id: Set(ClientId::new().into_inner()),
            full_name: Set(input.full_name),
            id_number: Set(input.id_number),
            phone_number: Set(input.phone_number),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map_err(db_err)?;

        Ok(to_domain(model))
    }

    /// Find a client by national ID number.
    pub async fn find_by_id_number(&self, id_number: &str) -> Result<Option<ClientRef>, LoanError> {
        let model = clients::Entity::find()
            .filter(clients::Column::IdNumber.eq(id_number))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(to_domain))
    }
}

impl ClientDirectory for ClientRepository {
    async fn find_client(&self, id: ClientId) -> Result<Option<ClientRef>, LoanError> {
        let model = clients::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(to_domain))
    }
}

fn to_domain(model: clients::Model) -> ClientRef {
    ClientRef {
        id: ClientId::from_uuid(model.id),
        full_name: model.full_name,
        id_number: model.id_number,
    }
}
