//! SurrealDB implementation of [`TicketRepository`].
//!
//! Ticket numbers are derived from the most recently created ticket
//! (`TKT-001`, `TKT-002`, ...). Two concurrent creates may race for a
//! number; the row id, not the number, is the identity.

use chrono::{DateTime, Duration, Utc};
use rentora_core::error::RentoraResult;
use rentora_core::models::ticket::{
    CreateTicket, CreateTicketMessage, PriorityCount, Ticket, TicketFilters, TicketMessage,
    TicketPriority, TicketStatistics, TicketStatus, UpdateTicket,
};
use rentora_core::repository::{PaginatedResult, Pagination, TicketRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::CountRow;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct TicketRow {
    ticket_number: String,
    subject: String,
    description: String,
    status: String,
    priority: String,
    category: String,
    customer_email: String,
    customer_name: String,
    assigned_to: Option<String>,
    tags: Vec<String>,
    sla_due_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct TicketRowWithId {
    record_id: String,
    ticket_number: String,
    subject: String,
    description: String,
    status: String,
    priority: String,
    category: String,
    customer_email: String,
    customer_name: String,
    assigned_to: Option<String>,
    tags: Vec<String>,
    sla_due_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct TicketNumberRow {
    ticket_number: String,
}

#[derive(Debug, SurrealValue)]
struct MessageRow {
    ticket_id: String,
    author: String,
    body: String,
    internal: bool,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct MessageRowWithId {
    record_id: String,
    ticket_id: String,
    author: String,
    body: String,
    internal: bool,
    created_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<TicketStatus, DbError> {
    match s {
        "open" => Ok(TicketStatus::Open),
        "in_progress" => Ok(TicketStatus::InProgress),
        "resolved" => Ok(TicketStatus::Resolved),
        "closed" => Ok(TicketStatus::Closed),
        "escalated" => Ok(TicketStatus::Escalated),
        other => Err(DbError::Migration(format!("unknown ticket status: {other}"))),
    }
}

fn parse_priority(s: &str) -> Result<TicketPriority, DbError> {
    match s {
        "low" => Ok(TicketPriority::Low),
        "medium" => Ok(TicketPriority::Medium),
        "high" => Ok(TicketPriority::High),
        "urgent" => Ok(TicketPriority::Urgent),
        other => Err(DbError::Migration(format!(
            "unknown ticket priority: {other}"
        ))),
    }
}

impl TicketRow {
    fn into_ticket(self, id: Uuid) -> Result<Ticket, DbError> {
        Ok(Ticket {
            id,
            ticket_number: self.ticket_number,
            subject: self.subject,
            description: self.description,
            status: parse_status(&self.status)?,
            priority: parse_priority(&self.priority)?,
            category: self.category,
            customer_email: self.customer_email,
            customer_name: self.customer_name,
            assigned_to: self.assigned_to,
            tags: self.tags,
            sla_due_at: self.sla_due_at,
            last_activity_at: self.last_activity_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl TicketRowWithId {
    fn try_into_ticket(self) -> Result<Ticket, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        Ok(Ticket {
            id,
            ticket_number: self.ticket_number,
            subject: self.subject,
            description: self.description,
            status: parse_status(&self.status)?,
            priority: parse_priority(&self.priority)?,
            category: self.category,
            customer_email: self.customer_email,
            customer_name: self.customer_name,
            assigned_to: self.assigned_to,
            tags: self.tags,
            sla_due_at: self.sla_due_at,
            last_activity_at: self.last_activity_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl MessageRow {
    fn into_message(self, id: Uuid) -> Result<TicketMessage, DbError> {
        Ok(TicketMessage {
            id,
            ticket_id: Uuid::parse_str(&self.ticket_id)
                .map_err(|e| DbError::Migration(format!("invalid ticket UUID: {e}")))?,
            author: self.author,
            body: self.body,
            internal: self.internal,
            created_at: self.created_at,
        })
    }
}

impl MessageRowWithId {
    fn try_into_message(self) -> Result<TicketMessage, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        Ok(TicketMessage {
            id,
            ticket_id: Uuid::parse_str(&self.ticket_id)
                .map_err(|e| DbError::Migration(format!("invalid ticket UUID: {e}")))?,
            author: self.author,
            body: self.body,
            internal: self.internal,
            created_at: self.created_at,
        })
    }
}

/// Next sequential ticket number after `last` (`None` starts at 001).
fn next_ticket_number(last: Option<&str>) -> String {
    let next = last
        .and_then(|n| n.strip_prefix("TKT-"))
        .and_then(|n| n.parse::<u64>().ok())
        .map(|n| n + 1)
        .unwrap_or(1);
    format!("TKT-{next:03}")
}

fn sla_due_at(priority: TicketPriority) -> DateTime<Utc> {
    Utc::now() + Duration::hours(priority.sla_hours())
}

fn filter_clause(filters: &TicketFilters) -> Option<String> {
    let mut conds = Vec::new();
    if !filters.status.is_empty() {
        conds.push("status IN $statuses".to_string());
    }
    if !filters.priority.is_empty() {
        conds.push("priority IN $priorities".to_string());
    }
    if filters.category.is_some() {
        conds.push("category = $category".to_string());
    }
    if filters.search.is_some() {
        conds.push(
            "(string::lowercase(subject) CONTAINS $search \
             OR string::lowercase(description) CONTAINS $search)"
                .to_string(),
        );
    }
    if conds.is_empty() {
        None
    } else {
        Some(conds.join(" AND "))
    }
}

/// SurrealDB implementation of the support ticket repository.
#[derive(Clone)]
pub struct SurrealTicketRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTicketRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn latest_ticket_number(&self) -> Result<Option<String>, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT ticket_number FROM ticket \
                 ORDER BY created_at DESC LIMIT 1",
            )
            .await?;
        let rows: Vec<TicketNumberRow> = result.take(0)?;
        Ok(rows.into_iter().next().map(|r| r.ticket_number))
    }

    async fn count_where(&self, condition: &str) -> Result<u64, DbError> {
        let query = format!("SELECT count() AS total FROM ticket {condition} GROUP ALL");
        let mut result = self.db.query(&query).await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}

impl<C: Connection> TicketRepository for SurrealTicketRepository<C> {
    async fn create(&self, input: CreateTicket) -> RentoraResult<Ticket> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let ticket_number = next_ticket_number(self.latest_ticket_number().await?.as_deref());
        let due = sla_due_at(input.priority);

        let result = self
            .db
            .query(
                "CREATE type::record('ticket', $id) SET \
                 ticket_number = $ticket_number, \
                 subject = $subject, description = $description, \
                 status = $status, priority = $priority, \
                 category = $category, \
                 customer_email = $customer_email, \
                 customer_name = $customer_name, \
                 assigned_to = NONE, tags = $tags, \
                 sla_due_at = $sla_due_at",
            )
            .bind(("id", id_str.clone()))
            .bind(("ticket_number", ticket_number))
            .bind(("subject", input.subject))
            .bind(("description", input.description))
            .bind(("status", TicketStatus::Open.as_str().to_string()))
            .bind(("priority", input.priority.as_str().to_string()))
            .bind(("category", input.category))
            .bind(("customer_email", input.customer_email))
            .bind(("customer_name", input.customer_name))
            .bind(("tags", input.tags))
            .bind(("sla_due_at", due))
            .await
            .map_err(|e| DbError::from_write("ticket", e))?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_write("ticket", e))?;

        let rows: Vec<TicketRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "ticket".into(),
            id: id_str,
        })?;

        Ok(row.into_ticket(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> RentoraResult<Ticket> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('ticket', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TicketRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "ticket".into(),
            id: id_str,
        })?;

        Ok(row.into_ticket(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateTicket) -> RentoraResult<Ticket> {
        let id_str = id.to_string();

        // A priority change recomputes the SLA due date.
        let new_due = input.priority.map(sla_due_at);

        let mut sets = Vec::new();
        if input.subject.is_some() {
            sets.push("subject = $subject");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.priority.is_some() {
            sets.push("priority = $priority");
            sets.push("sla_due_at = $sla_due_at");
        }
        if input.category.is_some() {
            sets.push("category = $category");
        }
        if input.assigned_to.is_some() {
            sets.push("assigned_to = $assigned_to");
        }
        if input.tags.is_some() {
            sets.push("tags = $tags");
        }
        sets.push("last_activity_at = time::now()");
        sets.push("updated_at = time::now()");

        let query = format!("UPDATE type::record('ticket', $id) SET {}", sets.join(", "));

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(subject) = input.subject {
            builder = builder.bind(("subject", subject));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(ref status) = input.status {
            builder = builder.bind(("status", status.as_str().to_string()));
        }
        if let Some(ref priority) = input.priority {
            builder = builder.bind(("priority", priority.as_str().to_string()));
        }
        if let Some(due) = new_due {
            builder = builder.bind(("sla_due_at", due));
        }
        if let Some(category) = input.category {
            builder = builder.bind(("category", category));
        }
        if let Some(assigned_to) = input.assigned_to {
            builder = builder.bind(("assigned_to", assigned_to));
        }
        if let Some(tags) = input.tags {
            builder = builder.bind(("tags", tags));
        }

        let result = builder.await.map_err(|e| DbError::from_write("ticket", e))?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_write("ticket", e))?;

        let rows: Vec<TicketRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "ticket".into(),
            id: id_str,
        })?;

        Ok(row.into_ticket(id)?)
    }

    async fn delete(&self, id: Uuid) -> RentoraResult<()> {
        let id_str = id.to_string();

        self.db
            .query(
                "DELETE ticket_message WHERE ticket_id = $id; \
                 DELETE type::record('ticket', $id)",
            )
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn set_status(&self, id: Uuid, status: TicketStatus) -> RentoraResult<Ticket> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "UPDATE type::record('ticket', $id) SET \
                 status = $status, \
                 last_activity_at = time::now(), \
                 updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("status", status.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TicketRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "ticket".into(),
            id: id_str,
        })?;

        Ok(row.into_ticket(id)?)
    }

    async fn add_message(&self, input: CreateTicketMessage) -> RentoraResult<TicketMessage> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let ticket_id_str = input.ticket_id.to_string();

        // Adding a message touches the parent ticket's activity clock.
        let result = self
            .db
            .query(
                "CREATE type::record('ticket_message', $id) SET \
                 ticket_id = $ticket_id, author = $author, \
                 body = $body, internal = $internal; \
                 UPDATE type::record('ticket', $ticket_id) SET \
                 last_activity_at = time::now(), \
                 updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("ticket_id", ticket_id_str))
            .bind(("author", input.author))
            .bind(("body", input.body))
            .bind(("internal", input.internal))
            .await
            .map_err(|e| DbError::from_write("ticket_message", e))?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_write("ticket_message", e))?;

        let rows: Vec<MessageRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "ticket_message".into(),
            id: id_str,
        })?;

        Ok(row.into_message(id)?)
    }

    async fn list_messages(&self, ticket_id: Uuid) -> RentoraResult<Vec<TicketMessage>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM ticket_message \
                 WHERE ticket_id = $ticket_id \
                 ORDER BY created_at ASC",
            )
            .bind(("ticket_id", ticket_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MessageRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| row.try_into_message())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn list(
        &self,
        filters: TicketFilters,
        pagination: Pagination,
    ) -> RentoraResult<PaginatedResult<Ticket>> {
        let where_clause = filter_clause(&filters)
            .map(|c| format!("WHERE {c}"))
            .unwrap_or_default();

        let count_query = format!("SELECT count() AS total FROM ticket {where_clause} GROUP ALL");
        let list_query = format!(
            "SELECT meta::id(id) AS record_id, * FROM ticket {where_clause} \
             ORDER BY created_at DESC LIMIT $limit START $offset",
        );

        let statuses: Vec<String> = filters
            .status
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();
        let priorities: Vec<String> = filters
            .priority
            .iter()
            .map(|p| p.as_str().to_string())
            .collect();
        let search = filters.search.as_ref().map(|s| s.to_lowercase());

        let bind_filters = |mut builder: surrealdb::method::Query<'_, C>| {
            if !statuses.is_empty() {
                builder = builder.bind(("statuses", statuses.clone()));
            }
            if !priorities.is_empty() {
                builder = builder.bind(("priorities", priorities.clone()));
            }
            if let Some(ref category) = filters.category {
                builder = builder.bind(("category", category.clone()));
            }
            if let Some(ref search) = search {
                builder = builder.bind(("search", search.clone()));
            }
            builder
        };

        let mut count_result = bind_filters(self.db.query(&count_query))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = bind_filters(self.db.query(&list_query))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TicketRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_ticket())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn statistics(&self) -> RentoraResult<TicketStatistics> {
        let total = self.count_where("").await?;
        let open = self.count_where("WHERE status = 'open'").await?;
        let in_progress = self.count_where("WHERE status = 'in_progress'").await?;
        let resolved = self.count_where("WHERE status = 'resolved'").await?;
        let closed = self.count_where("WHERE status = 'closed'").await?;
        let escalated = self.count_where("WHERE status = 'escalated'").await?;

        let mut by_priority = Vec::new();
        for priority in TicketPriority::all() {
            let count = self
                .count_where(&format!("WHERE priority = '{}'", priority.as_str()))
                .await?;
            by_priority.push(PriorityCount {
                priority: *priority,
                count,
            });
        }

        Ok(TicketStatistics {
            total,
            open,
            in_progress,
            resolved,
            closed,
            escalated,
            by_priority,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_numbers_are_sequential() {
        assert_eq!(next_ticket_number(None), "TKT-001");
        assert_eq!(next_ticket_number(Some("TKT-001")), "TKT-002");
        assert_eq!(next_ticket_number(Some("TKT-099")), "TKT-100");
        assert_eq!(next_ticket_number(Some("TKT-999")), "TKT-1000");
    }

    #[test]
    fn malformed_last_number_restarts_sequence() {
        assert_eq!(next_ticket_number(Some("garbage")), "TKT-001");
    }
}
