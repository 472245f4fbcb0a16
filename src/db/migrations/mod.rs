use anyhow::Result;
use sqlx::{Executor, PgPool};
use tracing::info;

/// Schema files, applied in order on every start. Each one is idempotent.
const MIGRATIONS: &[(&str, &str)] = &[
    ("001_create_users.sql", include_str!("sql/001_create_users.sql")),
    (
        "002_create_reference_tables.sql",
        include_str!("sql/002_create_reference_tables.sql"),
    ),
    ("003_create_items.sql", include_str!("sql/003_create_items.sql")),
    ("004_create_events.sql", include_str!("sql/004_create_events.sql")),
];

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    for (name, sql) in ordered_migrations() {
        pool.execute(sql).await?;
        info!("Applied migration: {}", name);
    }

    Ok(())
}

fn ordered_migrations() -> Vec<(&'static str, &'static str)> {
    let mut entries = MIGRATIONS.to_vec();
    entries.sort_by_key(|(name, _)| order_value(name));
    entries
}

/// Numeric prefix of a migration file name
fn order_value(name: &str) -> usize {
    name.split('_')
        .next()
        .and_then(|prefix| prefix.parse::<usize>().ok())
        .unwrap_or(usize::MAX)
}
