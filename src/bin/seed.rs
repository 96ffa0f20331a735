//! Creates the initial admin account. Existing data is never touched: the
//! run is a no-op when a user with `ADMIN_EMAIL` already exists.
use std::sync::Arc;

use anyhow::{anyhow, Context};
use dotenv::dotenv;
use sqlx::postgres::PgPoolOptions;

use propertyverify::{
    db::{DBClient, UserExt},
    models::usermodel::{NewUser, UserRole},
    service::referral::generate_referral_code,
    utils::password,
};

fn env(name: &str) -> anyhow::Result<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .with_context(|| format!("{} must be set", name))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt().init();

    let database_url = env("DATABASE_URL")?;
    let name = env("ADMIN_NAME")?;
    let phone = env("ADMIN_PHONE")?;
    let email = env("ADMIN_EMAIL")?.trim().to_lowercase();
    let admin_password = env("ADMIN_PASSWORD")?;

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .context("failed to connect to the database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    let db_client = Arc::new(DBClient::new(pool));

    if db_client.get_user(None, Some(&email), None, None).await?.is_some() {
        tracing::info!("Admin {} already exists, nothing to do", email);
        db_client.close().await;
        return Ok(());
    }

    let hashed = password::hash(admin_password).map_err(|e| anyhow!(e.to_string()))?;

    let admin = db_client
        .save_user(NewUser {
            referral_code: generate_referral_code(&name),
            name,
            phone,
            email,
            password: hashed,
            role: UserRole::Admin,
            verification_code: None,
            referred_by: None,
            is_verified: true,
        })
        .await
        .context("failed to create admin")?;

    tracing::info!("Admin {} created", admin.email);
    db_client.close().await;

    Ok(())
}
