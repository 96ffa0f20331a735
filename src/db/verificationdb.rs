// db/verificationdb.rs
use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::db::DBClient;

use crate::models::{
    propertymodel::VerificationSummary,
    verificationmodels::{VerificationCase, VerificationFilter, VerificationStats},
};

#[async_trait]
pub trait VerificationExt {
    /// Inserts a new case. Returns `None` when the property already has a
    /// pending or in-progress case.
    async fn create_verification(
        &self,
        case: &VerificationCase,
    ) -> Result<Option<VerificationCase>, sqlx::Error>;

    async fn get_verification(
        &self,
        verification_id: Uuid,
    ) -> Result<Option<VerificationCase>, sqlx::Error>;

    async fn get_open_verification_for_property(
        &self,
        property_id: Uuid,
    ) -> Result<Option<VerificationCase>, sqlx::Error>;

    async fn get_verification_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<VerificationCase>, sqlx::Error>;

    /// Persists `case` only if the stored version still equals
    /// `expected_version`, bumping it by one. When `summary` is given the
    /// property's verification fields are written in the same transaction.
    /// Returns `None` on a version mismatch.
    async fn update_verification(
        &self,
        case: &VerificationCase,
        expected_version: i64,
        summary: Option<&VerificationSummary>,
    ) -> Result<Option<VerificationCase>, sqlx::Error>;

    async fn get_verifications(
        &self,
        filter: &VerificationFilter,
        page: u32,
        limit: u32,
    ) -> Result<Vec<VerificationCase>, sqlx::Error>;

    async fn get_verification_count(
        &self,
        filter: &VerificationFilter,
    ) -> Result<i64, sqlx::Error>;

    async fn get_verification_stats(&self) -> Result<VerificationStats, sqlx::Error>;
}

fn push_verification_filter<'a>(
    builder: &mut QueryBuilder<'a, Postgres>,
    filter: &'a VerificationFilter,
) {
    builder.push(" WHERE TRUE");

    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status);
    }
    if let Some(priority) = filter.priority {
        builder.push(" AND priority = ").push_bind(priority);
    }
    if let Some(assigned_to) = filter.assigned_to {
        builder.push(" AND assigned_to = ").push_bind(assigned_to);
    }
    if let Some(requested_by) = filter.requested_by {
        builder.push(" AND requested_by = ").push_bind(requested_by);
    }
}

#[async_trait]
impl VerificationExt for DBClient {
    async fn create_verification(
        &self,
        case: &VerificationCase,
    ) -> Result<Option<VerificationCase>, sqlx::Error> {
        // The partial unique index settles races between concurrent requests.
        sqlx::query_as::<_, VerificationCase>(
            r#"
            INSERT INTO verifications (
                id, property_id, requested_by, assigned_to, status, priority,
                payment_amount, payment_status, payment_reference, paid_at,
                score_overall, score_breakdown, notes, timeline, version,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            ON CONFLICT (property_id) WHERE status IN ('pending', 'in-progress') DO NOTHING
            RETURNING *
            "#,
        )
        .bind(case.id)
        .bind(case.property_id)
        .bind(case.requested_by)
        .bind(case.assigned_to)
        .bind(case.status)
        .bind(case.priority)
        .bind(case.payment.amount)
        .bind(case.payment.status)
        .bind(&case.payment.reference)
        .bind(case.payment.paid_at)
        .bind(case.score.overall)
        .bind(&case.score.breakdown)
        .bind(&case.notes)
        .bind(&case.timeline)
        .bind(case.version)
        .bind(case.created_at)
        .bind(case.updated_at)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_verification(
        &self,
        verification_id: Uuid,
    ) -> Result<Option<VerificationCase>, sqlx::Error> {
        sqlx::query_as::<_, VerificationCase>("SELECT * FROM verifications WHERE id = $1")
            .bind(verification_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_open_verification_for_property(
        &self,
        property_id: Uuid,
    ) -> Result<Option<VerificationCase>, sqlx::Error> {
        sqlx::query_as::<_, VerificationCase>(
            r#"
            SELECT * FROM verifications
            WHERE property_id = $1 AND status IN ('pending', 'in-progress')
            "#,
        )
        .bind(property_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_verification_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<VerificationCase>, sqlx::Error> {
        sqlx::query_as::<_, VerificationCase>(
            "SELECT * FROM verifications WHERE payment_reference = $1",
        )
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
    }

    async fn update_verification(
        &self,
        case: &VerificationCase,
        expected_version: i64,
        summary: Option<&VerificationSummary>,
    ) -> Result<Option<VerificationCase>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, VerificationCase>(
            r#"
            UPDATE verifications
            SET assigned_to = $3,
                status = $4,
                payment_status = $5,
                payment_reference = $6,
                paid_at = $7,
                score_overall = $8,
                score_breakdown = $9,
                notes = $10,
                timeline = $11,
                version = version + 1,
                updated_at = $12
            WHERE id = $1 AND version = $2
            RETURNING *
            "#,
        )
        .bind(case.id)
        .bind(expected_version)
        .bind(case.assigned_to)
        .bind(case.status)
        .bind(case.payment.status)
        .bind(&case.payment.reference)
        .bind(case.payment.paid_at)
        .bind(case.score.overall)
        .bind(&case.score.breakdown)
        .bind(&case.notes)
        .bind(&case.timeline)
        .bind(case.updated_at)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(updated) = updated else {
            tx.rollback().await?;
            return Ok(None);
        };

        if let Some(summary) = summary {
            sqlx::query(
                r#"
                UPDATE properties
                SET verification_status = 'verified',
                    verification_score = $2,
                    last_verified = $3,
                    verified_by = $4,
                    updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(summary.property_id)
            .bind(summary.score)
            .bind(summary.verified_at)
            .bind(summary.verified_by)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Some(updated))
    }

    async fn get_verifications(
        &self,
        filter: &VerificationFilter,
        page: u32,
        limit: u32,
    ) -> Result<Vec<VerificationCase>, sqlx::Error> {
        let offset = (page.saturating_sub(1) as i64) * limit as i64;

        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM verifications");
        push_verification_filter(&mut builder, filter);
        builder
            .push(" ORDER BY created_at DESC, id LIMIT ")
            .push_bind(limit as i64)
            .push(" OFFSET ")
            .push_bind(offset);

        builder
            .build_query_as::<VerificationCase>()
            .fetch_all(&self.pool)
            .await
    }

    async fn get_verification_count(
        &self,
        filter: &VerificationFilter,
    ) -> Result<i64, sqlx::Error> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM verifications");
        push_verification_filter(&mut builder, filter);

        builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
    }

    async fn get_verification_stats(&self) -> Result<VerificationStats, sqlx::Error> {
        let (pending, completed, revenue) = sqlx::query_as::<_, (i64, i64, i64)>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'pending'),
                COUNT(*) FILTER (WHERE status = 'completed'),
                COALESCE(SUM(payment_amount) FILTER (WHERE payment_status = 'paid'), 0)::BIGINT
            FROM verifications
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(VerificationStats {
            pending_verifications: pending,
            completed_verifications: completed,
            total_revenue: revenue,
        })
    }
}
