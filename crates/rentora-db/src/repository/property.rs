//! SurrealDB implementation of [`PropertyRepository`].
//!
//! Listing composes the WHERE clause incrementally from the filter
//! set; amenity filters require every requested amenity to be present.

use chrono::{DateTime, Utc};
use rentora_core::error::RentoraResult;
use rentora_core::models::property::{
    CreateProperty, Property, PropertyFilters, PropertySort, PropertyStatus, SortOrder,
    UpdateProperty,
};
use rentora_core::repository::{PaginatedResult, Pagination, PropertyRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::CountRow;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct PropertyRow {
    title: String,
    description: Option<String>,
    price: i64,
    currency: String,
    property_type: String,
    rental_type: String,
    rental_period: String,
    bedrooms: u32,
    bathrooms: u32,
    area: Option<f64>,
    location: serde_json::Value,
    amenities: Vec<String>,
    images: Vec<String>,
    landlord_id: String,
    available_date: Option<DateTime<Utc>>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct PropertyRowWithId {
    record_id: String,
    title: String,
    description: Option<String>,
    price: i64,
    currency: String,
    property_type: String,
    rental_type: String,
    rental_period: String,
    bedrooms: u32,
    bathrooms: u32,
    area: Option<f64>,
    location: serde_json::Value,
    amenities: Vec<String>,
    images: Vec<String>,
    landlord_id: String,
    available_date: Option<DateTime<Utc>>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct LocationRow {
    location: serde_json::Value,
}

fn parse_status(s: &str) -> Result<PropertyStatus, DbError> {
    match s {
        "available" => Ok(PropertyStatus::Available),
        "rented" => Ok(PropertyStatus::Rented),
        "archived" => Ok(PropertyStatus::Archived),
        other => Err(DbError::Migration(format!(
            "unknown property status: {other}"
        ))),
    }
}

fn parse_landlord(landlord_id: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(landlord_id)
        .map_err(|e| DbError::Migration(format!("invalid landlord UUID: {e}")))
}

impl PropertyRow {
    fn into_property(self, id: Uuid) -> Result<Property, DbError> {
        Ok(Property {
            id,
            title: self.title,
            description: self.description,
            price: self.price,
            currency: self.currency,
            property_type: self.property_type,
            rental_type: self.rental_type,
            rental_period: self.rental_period,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            area: self.area,
            location: self.location,
            amenities: self.amenities,
            images: self.images,
            landlord_id: parse_landlord(&self.landlord_id)?,
            available_date: self.available_date,
            status: parse_status(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl PropertyRowWithId {
    fn try_into_property(self) -> Result<Property, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        Ok(Property {
            id,
            title: self.title,
            description: self.description,
            price: self.price,
            currency: self.currency,
            property_type: self.property_type,
            rental_type: self.rental_type,
            rental_period: self.rental_period,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            area: self.area,
            location: self.location,
            amenities: self.amenities,
            images: self.images,
            landlord_id: parse_landlord(&self.landlord_id)?,
            available_date: self.available_date,
            status: parse_status(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Assemble the WHERE clause for a filter set. Returns the clause
/// (without the leading WHERE) or `None` when unfiltered.
fn filter_clause(filters: &PropertyFilters) -> Option<String> {
    let mut conds = Vec::new();
    if filters.city.is_some() {
        conds.push("location.city = $city".to_string());
    }
    if filters.min_price.is_some() {
        conds.push("price >= $min_price".to_string());
    }
    if filters.max_price.is_some() {
        conds.push("price <= $max_price".to_string());
    }
    if filters.property_type.is_some() {
        conds.push("property_type = $property_type".to_string());
    }
    if filters.bedrooms.is_some() {
        conds.push("bedrooms = $bedrooms".to_string());
    }
    if filters.bathrooms.is_some() {
        conds.push("bathrooms = $bathrooms".to_string());
    }
    if filters.rental_type.is_some() {
        conds.push("rental_type = $rental_type".to_string());
    }
    if !filters.amenities.is_empty() {
        conds.push("amenities CONTAINSALL $amenities".to_string());
    }
    if conds.is_empty() {
        None
    } else {
        Some(conds.join(" AND "))
    }
}

fn order_clause(filters: &PropertyFilters) -> String {
    let direction = match filters.sort_order {
        Some(SortOrder::Asc) => "ASC",
        Some(SortOrder::Desc) | None => "DESC",
    };
    let column = match filters.sort_by {
        Some(PropertySort::Price) => "price",
        Some(PropertySort::Location) => "title",
        Some(PropertySort::Date) | None => "created_at",
    };
    format!("ORDER BY {column} {direction}")
}

/// SurrealDB implementation of the Property repository.
#[derive(Clone)]
pub struct SurrealPropertyRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPropertyRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PropertyRepository for SurrealPropertyRepository<C> {
    async fn create(&self, input: CreateProperty) -> RentoraResult<Property> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('property', $id) SET \
                 title = $title, description = $description, \
                 price = $price, currency = $currency, \
                 property_type = $property_type, \
                 rental_type = $rental_type, \
                 rental_period = $rental_period, \
                 bedrooms = $bedrooms, bathrooms = $bathrooms, \
                 area = $area, location = $location, \
                 amenities = $amenities, images = $images, \
                 landlord_id = $landlord_id, \
                 available_date = $available_date, \
                 status = $status",
            )
            .bind(("id", id_str.clone()))
            .bind(("title", input.title))
            .bind(("description", input.description))
            .bind(("price", input.price))
            .bind(("currency", input.currency.unwrap_or_else(|| "ZAR".into())))
            .bind(("property_type", input.property_type))
            .bind(("rental_type", input.rental_type))
            .bind((
                "rental_period",
                input.rental_period.unwrap_or_else(|| "monthly".into()),
            ))
            .bind(("bedrooms", input.bedrooms))
            .bind(("bathrooms", input.bathrooms))
            .bind(("area", input.area))
            .bind(("location", input.location))
            .bind(("amenities", input.amenities))
            .bind(("images", input.images))
            .bind(("landlord_id", input.landlord_id.to_string()))
            .bind(("available_date", input.available_date))
            .bind(("status", PropertyStatus::Available.as_str().to_string()))
            .await
            .map_err(|e| DbError::from_write("property", e))?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_write("property", e))?;

        let rows: Vec<PropertyRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "property".into(),
            id: id_str,
        })?;

        Ok(row.into_property(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> RentoraResult<Property> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('property', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PropertyRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "property".into(),
            id: id_str,
        })?;

        Ok(row.into_property(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateProperty) -> RentoraResult<Property> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.title.is_some() {
            sets.push("title = $title");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.price.is_some() {
            sets.push("price = $price");
        }
        if input.currency.is_some() {
            sets.push("currency = $currency");
        }
        if input.property_type.is_some() {
            sets.push("property_type = $property_type");
        }
        if input.rental_type.is_some() {
            sets.push("rental_type = $rental_type");
        }
        if input.rental_period.is_some() {
            sets.push("rental_period = $rental_period");
        }
        if input.bedrooms.is_some() {
            sets.push("bedrooms = $bedrooms");
        }
        if input.bathrooms.is_some() {
            sets.push("bathrooms = $bathrooms");
        }
        if input.area.is_some() {
            sets.push("area = $area");
        }
        if input.location.is_some() {
            sets.push("location = $location");
        }
        if input.amenities.is_some() {
            sets.push("amenities = $amenities");
        }
        if input.images.is_some() {
            sets.push("images = $images");
        }
        if input.available_date.is_some() {
            sets.push("available_date = $available_date");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        sets.push("updated_at = time::now()");

        let query = format!("UPDATE type::record('property', $id) SET {}", sets.join(", "));

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(title) = input.title {
            builder = builder.bind(("title", title));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(price) = input.price {
            builder = builder.bind(("price", price));
        }
        if let Some(currency) = input.currency {
            builder = builder.bind(("currency", currency));
        }
        if let Some(property_type) = input.property_type {
            builder = builder.bind(("property_type", property_type));
        }
        if let Some(rental_type) = input.rental_type {
            builder = builder.bind(("rental_type", rental_type));
        }
        if let Some(rental_period) = input.rental_period {
            builder = builder.bind(("rental_period", rental_period));
        }
        if let Some(bedrooms) = input.bedrooms {
            builder = builder.bind(("bedrooms", bedrooms));
        }
        if let Some(bathrooms) = input.bathrooms {
            builder = builder.bind(("bathrooms", bathrooms));
        }
        if let Some(area) = input.area {
            builder = builder.bind(("area", area));
        }
        if let Some(location) = input.location {
            builder = builder.bind(("location", location));
        }
        if let Some(amenities) = input.amenities {
            builder = builder.bind(("amenities", amenities));
        }
        if let Some(images) = input.images {
            builder = builder.bind(("images", images));
        }
        if let Some(available_date) = input.available_date {
            builder = builder.bind(("available_date", available_date));
        }
        if let Some(ref status) = input.status {
            builder = builder.bind(("status", status.as_str().to_string()));
        }

        let result = builder
            .await
            .map_err(|e| DbError::from_write("property", e))?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_write("property", e))?;

        let rows: Vec<PropertyRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "property".into(),
            id: id_str,
        })?;

        Ok(row.into_property(id)?)
    }

    async fn delete(&self, id: Uuid) -> RentoraResult<()> {
        self.db
            .query("DELETE type::record('property', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(
        &self,
        filters: PropertyFilters,
        pagination: Pagination,
    ) -> RentoraResult<PaginatedResult<Property>> {
        let where_clause = filter_clause(&filters)
            .map(|c| format!("WHERE {c}"))
            .unwrap_or_default();

        let count_query = format!("SELECT count() AS total FROM property {where_clause} GROUP ALL");
        let list_query = format!(
            "SELECT meta::id(id) AS record_id, * FROM property {where_clause} {} \
             LIMIT $limit START $offset",
            order_clause(&filters),
        );

        let bind_filters = |mut builder: surrealdb::method::Query<'_, C>| {
            if let Some(ref city) = filters.city {
                builder = builder.bind(("city", city.clone()));
            }
            if let Some(min_price) = filters.min_price {
                builder = builder.bind(("min_price", min_price));
            }
            if let Some(max_price) = filters.max_price {
                builder = builder.bind(("max_price", max_price));
            }
            if let Some(ref property_type) = filters.property_type {
                builder = builder.bind(("property_type", property_type.clone()));
            }
            if let Some(bedrooms) = filters.bedrooms {
                builder = builder.bind(("bedrooms", bedrooms));
            }
            if let Some(bathrooms) = filters.bathrooms {
                builder = builder.bind(("bathrooms", bathrooms));
            }
            if let Some(ref rental_type) = filters.rental_type {
                builder = builder.bind(("rental_type", rental_type.clone()));
            }
            if !filters.amenities.is_empty() {
                builder = builder.bind(("amenities", filters.amenities.clone()));
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

        let rows: Vec<PropertyRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_property())
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
            .query("SELECT count() AS total FROM property GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn count_since(&self, since: DateTime<Utc>) -> RentoraResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM property \
                 WHERE created_at >= $since GROUP ALL",
            )
            .bind(("since", since))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn locations_since(&self, since: DateTime<Utc>) -> RentoraResult<Vec<serde_json::Value>> {
        let mut result = self
            .db
            .query(
                "SELECT location FROM property \
                 WHERE created_at >= $since",
            )
            .bind(("since", since))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<LocationRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().map(|r| r.location).collect())
    }
}
