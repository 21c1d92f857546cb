use sqlx::{postgres::PgPoolOptions, PgPool};

/// Connects and brings the schema up to date before the pool is handed out.
pub async fn connect(database_url: &str) -> PgPool {
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(database_url)
        .await
        .unwrap_or_else(|err| {
            tracing::error!("{:}", err);
            panic!("Error connecting to database {}", database_url)
        });

    match sqlx::migrate!().run(&pool).await {
        Ok(_) => (),
        Err(err) => {
            tracing::error!("{}", err);
            panic!("Failed to run database migrations");
        }
    }

    pool
}
