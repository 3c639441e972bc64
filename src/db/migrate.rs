use sqlx::PgPool;

/// Create the call-log tables and indexes if they do not exist yet.
/// Safe to run on every start-up.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(include_str!("../../sql/schema.sql"))
        .execute(pool)
        .await?;
    tracing::info!("call-log schema applied");
    Ok(())
}
