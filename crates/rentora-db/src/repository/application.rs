//! SurrealDB implementation of [`ApplicationRepository`].

use chrono::{DateTime, Utc};
use rentora_core::error::RentoraResult;
use rentora_core::models::application::{
    ApplicationStatus, CreateApplication, RentalApplication,
};
use rentora_core::repository::{ApplicationRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::CountRow;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ApplicationRow {
    property_id: String,
    tenant_id: String,
    status: String,
    move_in_date: Option<DateTime<Utc>>,
    message: Option<String>,
    documents: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ApplicationRowWithId {
    record_id: String,
    property_id: String,
    tenant_id: String,
    status: String,
    move_in_date: Option<DateTime<Utc>>,
    message: Option<String>,
    documents: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<ApplicationStatus, DbError> {
    match s {
        "pending" => Ok(ApplicationStatus::Pending),
        "approved" => Ok(ApplicationStatus::Approved),
        "rejected" => Ok(ApplicationStatus::Rejected),
        "withdrawn" => Ok(ApplicationStatus::Withdrawn),
        other => Err(DbError::Migration(format!(
            "unknown application status: {other}"
        ))),
    }
}

fn build_application(
    id: Uuid,
    property_id: &str,
    tenant_id: &str,
    status: &str,
    move_in_date: Option<DateTime<Utc>>,
    message: Option<String>,
    documents: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Result<RentalApplication, DbError> {
    Ok(RentalApplication {
        id,
        property_id: Uuid::parse_str(property_id)
            .map_err(|e| DbError::Migration(format!("invalid property UUID: {e}")))?,
        tenant_id: Uuid::parse_str(tenant_id)
            .map_err(|e| DbError::Migration(format!("invalid tenant UUID: {e}")))?,
        status: parse_status(status)?,
        move_in_date,
        message,
        documents,
        created_at,
        updated_at,
    })
}

impl ApplicationRow {
    fn into_application(self, id: Uuid) -> Result<RentalApplication, DbError> {
        build_application(
            id,
            &self.property_id,
            &self.tenant_id,
            &self.status,
            self.move_in_date,
            self.message,
            self.documents,
            self.created_at,
            self.updated_at,
        )
    }
}

impl ApplicationRowWithId {
    fn try_into_application(self) -> Result<RentalApplication, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        build_application(
            id,
            &self.property_id,
            &self.tenant_id,
            &self.status,
            self.move_in_date,
            self.message,
            self.documents,
            self.created_at,
            self.updated_at,
        )
    }
}

/// SurrealDB implementation of the rental application repository.
#[derive(Clone)]
pub struct SurrealApplicationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealApplicationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ApplicationRepository for SurrealApplicationRepository<C> {
    async fn create(&self, input: CreateApplication) -> RentoraResult<RentalApplication> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let documents = input
            .documents
            .unwrap_or(serde_json::Value::Array(Vec::new()));

        let result = self
            .db
            .query(
                "CREATE type::record('application', $id) SET \
                 property_id = $property_id, \
                 tenant_id = $tenant_id, \
                 status = $status, \
                 move_in_date = $move_in_date, \
                 message = $message, \
                 documents = $documents",
            )
            .bind(("id", id_str.clone()))
            .bind(("property_id", input.property_id.to_string()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("status", ApplicationStatus::Pending.as_str().to_string()))
            .bind(("move_in_date", input.move_in_date))
            .bind(("message", input.message))
            .bind(("documents", documents))
            .await
            .map_err(|e| DbError::from_write("application", e))?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_write("application", e))?;

        let rows: Vec<ApplicationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "application".into(),
            id: id_str,
        })?;

        Ok(row.into_application(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> RentoraResult<RentalApplication> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('application', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ApplicationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "application".into(),
            id: id_str,
        })?;

        Ok(row.into_application(id)?)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
        message: Option<String>,
    ) -> RentoraResult<RentalApplication> {
        let id_str = id.to_string();

        let query = if message.is_some() {
            "UPDATE type::record('application', $id) SET \
             status = $status, message = $message, \
             updated_at = time::now()"
        } else {
            "UPDATE type::record('application', $id) SET \
             status = $status, updated_at = time::now()"
        };

        let mut builder = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("status", status.as_str().to_string()));
        if let Some(message) = message {
            builder = builder.bind(("message", message));
        }

        let result = builder
            .await
            .map_err(|e| DbError::from_write("application", e))?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_write("application", e))?;

        let rows: Vec<ApplicationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "application".into(),
            id: id_str,
        })?;

        Ok(row.into_application(id)?)
    }

    async fn list_by_tenant(
        &self,
        tenant_id: Uuid,
        status: Option<ApplicationStatus>,
        pagination: Pagination,
    ) -> RentoraResult<PaginatedResult<RentalApplication>> {
        let tenant_id_str = tenant_id.to_string();

        let where_clause = if status.is_some() {
            "WHERE tenant_id = $tenant_id AND status = $status"
        } else {
            "WHERE tenant_id = $tenant_id"
        };

        let count_query =
            format!("SELECT count() AS total FROM application {where_clause} GROUP ALL");
        let list_query = format!(
            "SELECT meta::id(id) AS record_id, * FROM application {where_clause} \
             ORDER BY created_at DESC LIMIT $limit START $offset",
        );

        let mut count_builder = self
            .db
            .query(&count_query)
            .bind(("tenant_id", tenant_id_str.clone()));
        if let Some(ref status) = status {
            count_builder = count_builder.bind(("status", status.as_str().to_string()));
        }
        let mut count_result = count_builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut builder = self
            .db
            .query(&list_query)
            .bind(("tenant_id", tenant_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));
        if let Some(ref status) = status {
            builder = builder.bind(("status", status.as_str().to_string()));
        }
        let mut result = builder.await.map_err(DbError::from)?;

        let rows: Vec<ApplicationRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_application())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn count(&self) -> RentoraResult<u64> {
        let mut result = self
            .db
            .query("SELECT count() AS total FROM application GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn count_pending(&self) -> RentoraResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM application \
                 WHERE status = 'pending' GROUP ALL",
            )
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn count_since(&self, since: DateTime<Utc>) -> RentoraResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM application \
                 WHERE created_at >= $since GROUP ALL",
            )
            .bind(("since", since))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}
