//! SurrealDB implementation of [`AdRepository`].

use chrono::{DateTime, Utc};
use rentora_core::error::RentoraResult;
use rentora_core::models::ad::{
    AdBid, AdStatus, BidStatus, Catalogue, CreateAdBid, CreateServiceAd, ServiceAd, UpdateAdBid,
    UpdateServiceAd,
};
use rentora_core::repository::AdRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct AdRow {
    title: String,
    owner_id: Option<String>,
    owner_name: String,
    description: String,
    category: String,
    location: serde_json::Value,
    price: i64,
    images: Vec<String>,
    documents: Vec<String>,
    status: String,
    bid_count: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct AdRowWithId {
    record_id: String,
    title: String,
    owner_id: Option<String>,
    owner_name: String,
    description: String,
    category: String,
    location: serde_json::Value,
    price: i64,
    images: Vec<String>,
    documents: Vec<String>,
    status: String,
    bid_count: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct BidRow {
    ad_id: String,
    bidder_id: String,
    bidder_name: String,
    amount: i64,
    message: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct BidRowWithId {
    record_id: String,
    ad_id: String,
    bidder_id: String,
    bidder_name: String,
    amount: i64,
    message: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct CatalogueRowWithId {
    record_id: String,
    provider_id: String,
    services: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_ad_status(s: &str) -> Result<AdStatus, DbError> {
    match s {
        "open" => Ok(AdStatus::Open),
        "closed" => Ok(AdStatus::Closed),
        other => Err(DbError::Migration(format!("unknown ad status: {other}"))),
    }
}

fn parse_bid_status(s: &str) -> Result<BidStatus, DbError> {
    match s {
        "placed" => Ok(BidStatus::Placed),
        "accepted" => Ok(BidStatus::Accepted),
        "rejected" => Ok(BidStatus::Rejected),
        other => Err(DbError::Migration(format!("unknown bid status: {other}"))),
    }
}

fn parse_optional_uuid(value: Option<String>) -> Result<Option<Uuid>, DbError> {
    value
        .map(|s| {
            Uuid::parse_str(&s).map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))
        })
        .transpose()
}

impl AdRow {
    fn into_ad(self, id: Uuid) -> Result<ServiceAd, DbError> {
        Ok(ServiceAd {
            id,
            title: self.title,
            owner_id: parse_optional_uuid(self.owner_id)?,
            owner_name: self.owner_name,
            description: self.description,
            category: self.category,
            location: self.location,
            price: self.price,
            images: self.images,
            documents: self.documents,
            status: parse_ad_status(&self.status)?,
            bid_count: self.bid_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl AdRowWithId {
    fn try_into_ad(self) -> Result<ServiceAd, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        Ok(ServiceAd {
            id,
            title: self.title,
            owner_id: parse_optional_uuid(self.owner_id)?,
            owner_name: self.owner_name,
            description: self.description,
            category: self.category,
            location: self.location,
            price: self.price,
            images: self.images,
            documents: self.documents,
            status: parse_ad_status(&self.status)?,
            bid_count: self.bid_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl BidRow {
    fn into_bid(self, id: Uuid) -> Result<AdBid, DbError> {
        Ok(AdBid {
            id,
            ad_id: Uuid::parse_str(&self.ad_id)
                .map_err(|e| DbError::Migration(format!("invalid ad UUID: {e}")))?,
            bidder_id: Uuid::parse_str(&self.bidder_id)
                .map_err(|e| DbError::Migration(format!("invalid bidder UUID: {e}")))?,
            bidder_name: self.bidder_name,
            amount: self.amount,
            message: self.message,
            status: parse_bid_status(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl BidRowWithId {
    fn try_into_bid(self) -> Result<AdBid, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        Ok(AdBid {
            id,
            ad_id: Uuid::parse_str(&self.ad_id)
                .map_err(|e| DbError::Migration(format!("invalid ad UUID: {e}")))?,
            bidder_id: Uuid::parse_str(&self.bidder_id)
                .map_err(|e| DbError::Migration(format!("invalid bidder UUID: {e}")))?,
            bidder_name: self.bidder_name,
            amount: self.amount,
            message: self.message,
            status: parse_bid_status(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl CatalogueRowWithId {
    fn try_into_catalogue(self) -> Result<Catalogue, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        Ok(Catalogue {
            id,
            provider_id: Uuid::parse_str(&self.provider_id)
                .map_err(|e| DbError::Migration(format!("invalid provider UUID: {e}")))?,
            services: self.services,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the service marketplace repository.
#[derive(Clone)]
pub struct SurrealAdRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAdRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AdRepository for SurrealAdRepository<C> {
    async fn create_ad(&self, input: CreateServiceAd) -> RentoraResult<ServiceAd> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('ad', $id) SET \
                 title = $title, owner_id = $owner_id, \
                 owner_name = $owner_name, \
                 description = $description, category = $category, \
                 location = $location, price = $price, \
                 images = $images, documents = $documents, \
                 status = $status, bid_count = 0",
            )
            .bind(("id", id_str.clone()))
            .bind(("title", input.title))
            .bind(("owner_id", input.owner_id.map(|o| o.to_string())))
            .bind(("owner_name", input.owner_name))
            .bind(("description", input.description))
            .bind(("category", input.category))
            .bind(("location", input.location))
            .bind(("price", input.price))
            .bind(("images", input.images))
            .bind(("documents", input.documents))
            .bind(("status", AdStatus::Open.as_str().to_string()))
            .await
            .map_err(|e| DbError::from_write("ad", e))?;

        let mut result = result.check().map_err(|e| DbError::from_write("ad", e))?;

        let rows: Vec<AdRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "ad".into(),
            id: id_str,
        })?;

        Ok(row.into_ad(id)?)
    }

    async fn get_ad(&self, id: Uuid) -> RentoraResult<ServiceAd> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('ad', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AdRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "ad".into(),
            id: id_str,
        })?;

        Ok(row.into_ad(id)?)
    }

    async fn update_ad(&self, id: Uuid, input: UpdateServiceAd) -> RentoraResult<ServiceAd> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.title.is_some() {
            sets.push("title = $title");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.category.is_some() {
            sets.push("category = $category");
        }
        if input.location.is_some() {
            sets.push("location = $location");
        }
        if input.price.is_some() {
            sets.push("price = $price");
        }
        if input.images.is_some() {
            sets.push("images = $images");
        }
        if input.documents.is_some() {
            sets.push("documents = $documents");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        sets.push("updated_at = time::now()");

        let query = format!("UPDATE type::record('ad', $id) SET {}", sets.join(", "));

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(title) = input.title {
            builder = builder.bind(("title", title));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(category) = input.category {
            builder = builder.bind(("category", category));
        }
        if let Some(location) = input.location {
            builder = builder.bind(("location", location));
        }
        if let Some(price) = input.price {
            builder = builder.bind(("price", price));
        }
        if let Some(images) = input.images {
            builder = builder.bind(("images", images));
        }
        if let Some(documents) = input.documents {
            builder = builder.bind(("documents", documents));
        }
        if let Some(ref status) = input.status {
            builder = builder.bind(("status", status.as_str().to_string()));
        }

        let result = builder.await.map_err(|e| DbError::from_write("ad", e))?;
        let mut result = result.check().map_err(|e| DbError::from_write("ad", e))?;

        let rows: Vec<AdRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "ad".into(),
            id: id_str,
        })?;

        Ok(row.into_ad(id)?)
    }

    async fn delete_ad(&self, id: Uuid) -> RentoraResult<()> {
        let id_str = id.to_string();

        self.db
            .query(
                "DELETE bid WHERE ad_id = $id; \
                 DELETE type::record('ad', $id)",
            )
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list_ads(&self) -> RentoraResult<Vec<ServiceAd>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM ad \
                 ORDER BY created_at DESC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AdRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| row.try_into_ad())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn create_bid(&self, input: CreateAdBid) -> RentoraResult<AdBid> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let ad_id_str = input.ad_id.to_string();

        // Placing a bid bumps the ad's denormalized bid count.
        let result = self
            .db
            .query(
                "CREATE type::record('bid', $id) SET \
                 ad_id = $ad_id, bidder_id = $bidder_id, \
                 bidder_name = $bidder_name, amount = $amount, \
                 message = $message, status = $status; \
                 UPDATE type::record('ad', $ad_id) SET \
                 bid_count += 1, updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("ad_id", ad_id_str))
            .bind(("bidder_id", input.bidder_id.to_string()))
            .bind(("bidder_name", input.bidder_name))
            .bind(("amount", input.amount))
            .bind(("message", input.message))
            .bind(("status", BidStatus::Placed.as_str().to_string()))
            .await
            .map_err(|e| DbError::from_write("bid", e))?;

        let mut result = result.check().map_err(|e| DbError::from_write("bid", e))?;

        let rows: Vec<BidRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "bid".into(),
            id: id_str,
        })?;

        Ok(row.into_bid(id)?)
    }

    async fn get_bid(&self, id: Uuid) -> RentoraResult<AdBid> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('bid', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BidRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "bid".into(),
            id: id_str,
        })?;

        Ok(row.into_bid(id)?)
    }

    async fn update_bid(&self, id: Uuid, input: UpdateAdBid) -> RentoraResult<AdBid> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.amount.is_some() {
            sets.push("amount = $amount");
        }
        if input.message.is_some() {
            sets.push("message = $message");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        sets.push("updated_at = time::now()");

        let query = format!("UPDATE type::record('bid', $id) SET {}", sets.join(", "));

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(amount) = input.amount {
            builder = builder.bind(("amount", amount));
        }
        if let Some(message) = input.message {
            builder = builder.bind(("message", message));
        }
        if let Some(ref status) = input.status {
            builder = builder.bind(("status", status.as_str().to_string()));
        }

        let result = builder.await.map_err(|e| DbError::from_write("bid", e))?;
        let mut result = result.check().map_err(|e| DbError::from_write("bid", e))?;

        let rows: Vec<BidRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "bid".into(),
            id: id_str,
        })?;

        Ok(row.into_bid(id)?)
    }

    async fn delete_bid(&self, id: Uuid) -> RentoraResult<()> {
        self.db
            .query("DELETE type::record('bid', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list_bids(&self, ad_id: Option<Uuid>) -> RentoraResult<Vec<AdBid>> {
        let query = if ad_id.is_some() {
            "SELECT meta::id(id) AS record_id, * FROM bid \
             WHERE ad_id = $ad_id ORDER BY created_at DESC"
        } else {
            "SELECT meta::id(id) AS record_id, * FROM bid \
             ORDER BY created_at DESC"
        };

        let mut builder = self.db.query(query);
        if let Some(ad_id) = ad_id {
            builder = builder.bind(("ad_id", ad_id.to_string()));
        }
        let mut result = builder.await.map_err(DbError::from)?;

        let rows: Vec<BidRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| row.try_into_bid())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn upsert_catalogue(
        &self,
        provider_id: Uuid,
        services: Vec<String>,
    ) -> RentoraResult<Catalogue> {
        let provider_id_str = provider_id.to_string();

        let mut existing = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM catalogue \
                 WHERE provider_id = $provider_id",
            )
            .bind(("provider_id", provider_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CatalogueRowWithId> = existing.take(0).map_err(DbError::from)?;

        let query = match rows.first() {
            Some(row) => {
                let id = row.record_id.clone();
                self.db
                    .query(
                        "UPDATE type::record('catalogue', $id) SET \
                         services = $services, updated_at = time::now()",
                    )
                    .bind(("id", id))
            }
            None => self
                .db
                .query(
                    "CREATE type::record('catalogue', $id) SET \
                     provider_id = $provider_id, services = $services",
                )
                .bind(("id", Uuid::new_v4().to_string()))
                .bind(("provider_id", provider_id_str.clone())),
        };

        let result = query
            .bind(("services", services))
            .await
            .map_err(|e| DbError::from_write("catalogue", e))?;
        result
            .check()
            .map_err(|e| DbError::from_write("catalogue", e))?;

        self.get_catalogue(provider_id).await?.ok_or_else(|| {
            DbError::NotFound {
                entity: "catalogue".into(),
                id: provider_id_str,
            }
            .into()
        })
    }

    async fn get_catalogue(&self, provider_id: Uuid) -> RentoraResult<Option<Catalogue>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM catalogue \
                 WHERE provider_id = $provider_id",
            )
            .bind(("provider_id", provider_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CatalogueRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_catalogue()?)),
            None => Ok(None),
        }
    }
}
