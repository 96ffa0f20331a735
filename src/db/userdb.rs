// db/userdb.rs
use async_trait::async_trait;
use sqlx::{types::Json, Postgres, QueryBuilder};
use uuid::Uuid;

use super::db::DBClient;

use crate::models::usermodel::{NewUser, ProfileUpdate, User, UserFilter, UserRole};

#[async_trait]
pub trait UserExt {
    /// Looks a user up by whichever identifier is given, checked in order.
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
        phone: Option<&str>,
        referral_code: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error>;

    async fn get_users(
        &self,
        filter: &UserFilter,
        page: u32,
        limit: u32,
    ) -> Result<Vec<User>, sqlx::Error>;

    async fn get_user_count(&self, filter: &UserFilter) -> Result<i64, sqlx::Error>;

    /// Inserts the account and, when `referred_by` is set, bumps the
    /// referrer's counter in the same transaction.
    async fn save_user(&self, new_user: NewUser) -> Result<User, sqlx::Error>;

    async fn mark_phone_verified(&self, user_id: Uuid) -> Result<User, sqlx::Error>;

    async fn update_verification_code(
        &self,
        user_id: Uuid,
        code: &str,
    ) -> Result<User, sqlx::Error>;

    async fn update_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<User, sqlx::Error>;

    async fn update_user_status(
        &self,
        user_id: Uuid,
        is_verified: Option<bool>,
        role: Option<UserRole>,
    ) -> Result<Option<User>, sqlx::Error>;

    async fn increment_properties_handled(&self, user_id: Uuid) -> Result<(), sqlx::Error>;
}

fn push_user_filter<'a>(builder: &mut QueryBuilder<'a, Postgres>, filter: &'a UserFilter) {
    builder.push(" WHERE TRUE");

    if let Some(role) = filter.role {
        builder.push(" AND role = ").push_bind(role);
    }

    if let Some(search) = filter.search.as_deref() {
        let pattern = format!("%{}%", search);
        builder
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR phone ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
        phone: Option<&str>,
        referral_code: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut user: Option<User> = None;

        if let Some(user_id) = user_id {
            user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        } else if let Some(email) = email {
            user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
                .bind(email.to_lowercase())
                .fetch_optional(&self.pool)
                .await?;
        } else if let Some(phone) = phone {
            user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE phone = $1")
                .bind(phone)
                .fetch_optional(&self.pool)
                .await?;
        } else if let Some(referral_code) = referral_code {
            user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE referral_code = $1")
                .bind(referral_code)
                .fetch_optional(&self.pool)
                .await?;
        }

        Ok(user)
    }

    async fn get_users(
        &self,
        filter: &UserFilter,
        page: u32,
        limit: u32,
    ) -> Result<Vec<User>, sqlx::Error> {
        let offset = (page.saturating_sub(1) as i64) * limit as i64;

        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM users");
        push_user_filter(&mut builder, filter);
        builder
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(limit as i64)
            .push(" OFFSET ")
            .push_bind(offset);

        builder.build_query_as::<User>().fetch_all(&self.pool).await
    }

    async fn get_user_count(&self, filter: &UserFilter) -> Result<i64, sqlx::Error> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_user_filter(&mut builder, filter);

        builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
    }

    async fn save_user(&self, new_user: NewUser) -> Result<User, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, phone, email, password, role, is_verified,
                verification_code, referral_code, referred_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.name)
        .bind(&new_user.phone)
        .bind(new_user.email.to_lowercase())
        .bind(&new_user.password)
        .bind(new_user.role)
        .bind(new_user.is_verified)
        .bind(&new_user.verification_code)
        .bind(&new_user.referral_code)
        .bind(new_user.referred_by)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(referrer_id) = new_user.referred_by {
            sqlx::query(
                "UPDATE users SET total_referrals = total_referrals + 1, updated_at = NOW() WHERE id = $1",
            )
            .bind(referrer_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(user)
    }

    async fn mark_phone_verified(&self, user_id: Uuid) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET is_verified = TRUE, verification_code = NULL, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_verification_code(
        &self,
        user_id: Uuid,
        code: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET verification_code = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(code)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                avatar = COALESCE($3, avatar),
                company = COALESCE($4, company),
                location = COALESCE($5, location),
                bio = COALESCE($6, bio),
                social_links = COALESCE($7, social_links),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(update.name)
        .bind(update.avatar)
        .bind(update.company)
        .bind(update.location)
        .bind(update.bio)
        .bind(update.social_links.map(Json))
        .fetch_one(&self.pool)
        .await
    }

    async fn update_user_status(
        &self,
        user_id: Uuid,
        is_verified: Option<bool>,
        role: Option<UserRole>,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET is_verified = COALESCE($2, is_verified),
                role = COALESCE($3, role),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(is_verified)
        .bind(role)
        .fetch_optional(&self.pool)
        .await
    }

    async fn increment_properties_handled(&self, user_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET properties_handled = properties_handled + 1, updated_at = NOW() WHERE id = $1",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
