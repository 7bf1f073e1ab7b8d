//! Seeds the database with demo users and posts.

use std::path::PathBuf;

use plaza_db::{Database, seed};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plaza=info".into()),
        )
        .init();

    let _ = dotenvy::dotenv();
    let path = std::env::var("PLAZA_DB_PATH").unwrap_or_else(|_| "./plaza.db".to_string());

    let db = Database::open(&PathBuf::from(&path))?;
    seed::populate(&db)?;

    tracing::info!("Database populated with initial data.");
    Ok(())
}
