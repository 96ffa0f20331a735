// db/propertydb.rs
use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::db::DBClient;

use crate::models::propertymodel::{AnalyticsCounter, Property, PropertySearchFilters};

#[async_trait]
pub trait PropertyExt {
    async fn create_property(&self, property: &Property) -> Result<Property, sqlx::Error>;

    async fn get_property(&self, property_id: Uuid) -> Result<Option<Property>, sqlx::Error>;

    async fn get_properties(
        &self,
        filters: &PropertySearchFilters,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Property>, sqlx::Error>;

    async fn get_property_count(&self, filters: &PropertySearchFilters)
        -> Result<i64, sqlx::Error>;

    /// Writes the owner-editable fields. The verification summary and the
    /// analytics counters are never touched here.
    async fn update_property(&self, property: &Property) -> Result<Property, sqlx::Error>;

    async fn update_property_images(
        &self,
        property_id: Uuid,
        images: Vec<String>,
    ) -> Result<Property, sqlx::Error>;

    /// Returns `false` when nothing was deleted, either because the listing
    /// is gone or because an open verification case still references it.
    async fn delete_property(&self, property_id: Uuid) -> Result<bool, sqlx::Error>;

    async fn increment_analytics(
        &self,
        property_id: Uuid,
        counter: AnalyticsCounter,
    ) -> Result<Option<Property>, sqlx::Error>;
}

fn push_property_filters<'a>(
    builder: &mut QueryBuilder<'a, Postgres>,
    filters: &'a PropertySearchFilters,
) {
    builder.push(" WHERE TRUE");

    if filters.active_only {
        builder.push(" AND is_active = TRUE");
    }
    if let Some(state) = filters.state.as_deref() {
        builder.push(" AND state = ").push_bind(state.to_string());
    }
    if let Some(city) = filters.city.as_deref() {
        builder
            .push(" AND city ILIKE ")
            .push_bind(format!("%{}%", city));
    }
    if let Some(property_type) = filters.property_type.as_deref() {
        builder
            .push(" AND property_type = ")
            .push_bind(property_type.to_string());
    }
    if let Some(min_price) = filters.min_price {
        builder.push(" AND price >= ").push_bind(min_price);
    }
    if let Some(max_price) = filters.max_price {
        builder.push(" AND price <= ").push_bind(max_price);
    }
    if let Some(bedrooms) = filters.bedrooms {
        builder.push(" AND bedrooms = ").push_bind(bedrooms);
    }
    if let Some(bathrooms) = filters.bathrooms {
        builder.push(" AND bathrooms = ").push_bind(bathrooms);
    }
    if let Some(status) = filters.verification_status {
        builder.push(" AND verification_status = ").push_bind(status);
    }
    if let Some(agent_id) = filters.agent_id {
        builder.push(" AND agent_id = ").push_bind(agent_id);
    }
    if let Some(search) = filters.search.as_deref() {
        let pattern = format!("%{}%", search);
        builder
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR address ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl PropertyExt for DBClient {
    async fn create_property(&self, property: &Property) -> Result<Property, sqlx::Error> {
        sqlx::query_as::<_, Property>(
            r#"
            INSERT INTO properties (
                id, agent_id, title, description, address, state, city, property_type,
                price, currency, bedrooms, bathrooms, size, latitude, longitude,
                images, documents, features, is_active, is_premium, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                $16, $17, $18, $19, $20, $21, $22)
            RETURNING *
            "#,
        )
        .bind(property.id)
        .bind(property.agent_id)
        .bind(&property.title)
        .bind(&property.description)
        .bind(&property.address)
        .bind(&property.state)
        .bind(&property.city)
        .bind(&property.property_type)
        .bind(property.price)
        .bind(&property.currency)
        .bind(property.bedrooms)
        .bind(property.bathrooms)
        .bind(&property.size)
        .bind(property.latitude)
        .bind(property.longitude)
        .bind(&property.images)
        .bind(&property.documents)
        .bind(&property.features)
        .bind(property.is_active)
        .bind(property.is_premium)
        .bind(property.created_at)
        .bind(property.updated_at)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_property(&self, property_id: Uuid) -> Result<Option<Property>, sqlx::Error> {
        sqlx::query_as::<_, Property>("SELECT * FROM properties WHERE id = $1")
            .bind(property_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_properties(
        &self,
        filters: &PropertySearchFilters,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Property>, sqlx::Error> {
        let offset = (page.saturating_sub(1) as i64) * limit as i64;

        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM properties");
        push_property_filters(&mut builder, filters);

        // Sort column comes from a closed enum, never from user text.
        builder
            .push(" ORDER BY ")
            .push(filters.sort_by.column())
            .push(if filters.ascending { " ASC" } else { " DESC" })
            .push(", id LIMIT ")
            .push_bind(limit as i64)
            .push(" OFFSET ")
            .push_bind(offset);

        builder
            .build_query_as::<Property>()
            .fetch_all(&self.pool)
            .await
    }

    async fn get_property_count(
        &self,
        filters: &PropertySearchFilters,
    ) -> Result<i64, sqlx::Error> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM properties");
        push_property_filters(&mut builder, filters);

        builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
    }

    async fn update_property(&self, property: &Property) -> Result<Property, sqlx::Error> {
        sqlx::query_as::<_, Property>(
            r#"
            UPDATE properties
            SET title = $2, description = $3, address = $4, state = $5, city = $6,
                property_type = $7, price = $8, currency = $9, bedrooms = $10,
                bathrooms = $11, size = $12, latitude = $13, longitude = $14,
                documents = $15, features = $16, is_active = $17, is_premium = $18,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(property.id)
        .bind(&property.title)
        .bind(&property.description)
        .bind(&property.address)
        .bind(&property.state)
        .bind(&property.city)
        .bind(&property.property_type)
        .bind(property.price)
        .bind(&property.currency)
        .bind(property.bedrooms)
        .bind(property.bathrooms)
        .bind(&property.size)
        .bind(property.latitude)
        .bind(property.longitude)
        .bind(&property.documents)
        .bind(&property.features)
        .bind(property.is_active)
        .bind(property.is_premium)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_property_images(
        &self,
        property_id: Uuid,
        images: Vec<String>,
    ) -> Result<Property, sqlx::Error> {
        sqlx::query_as::<_, Property>(
            r#"
            UPDATE properties
            SET images = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(property_id)
        .bind(images)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_property(&self, property_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM properties
            WHERE id = $1
              AND NOT EXISTS (
                SELECT 1 FROM verifications
                WHERE property_id = $1 AND status IN ('pending', 'in-progress')
              )
            "#,
        )
        .bind(property_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_analytics(
        &self,
        property_id: Uuid,
        counter: AnalyticsCounter,
    ) -> Result<Option<Property>, sqlx::Error> {
        let column = counter.column();
        let query = format!(
            "UPDATE properties SET {column} = {column} + 1 WHERE id = $1 RETURNING *"
        );

        sqlx::query_as::<_, Property>(&query)
            .bind(property_id)
            .fetch_optional(&self.pool)
            .await
    }
}
