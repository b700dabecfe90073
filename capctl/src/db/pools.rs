//! Connection pool construction from [`PoolSettings`].

use crate::config::{DatabaseConfig, PoolSettings};
use crate::db::errors::Result;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

/// Translate pool settings into SQLx options. Zero idle timeout or lifetime means never.
pub fn pool_options(settings: &PoolSettings) -> PgPoolOptions {
    let options = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs));

    let options = match settings.idle_timeout_secs {
        0 => options.idle_timeout(None),
        secs => options.idle_timeout(Duration::from_secs(secs)),
    };

    match settings.max_lifetime_secs {
        0 => options.max_lifetime(None),
        secs => options.max_lifetime(Duration::from_secs(secs)),
    }
}

/// Open the pool described by `config`.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    tracing::debug!(
        max_connections = config.pool.max_connections,
        min_connections = config.pool.min_connections,
        "Opening database pool"
    );
    Ok(pool_options(&config.pool).connect(&config.url).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_options_follow_settings() {
        let settings = PoolSettings {
            max_connections: 7,
            min_connections: 2,
            acquire_timeout_secs: 3,
            idle_timeout_secs: 60,
            max_lifetime_secs: 120,
        };
        let options = pool_options(&settings);

        assert_eq!(options.get_max_connections(), 7);
        assert_eq!(options.get_min_connections(), 2);
        assert_eq!(options.get_acquire_timeout(), Duration::from_secs(3));
        assert_eq!(options.get_idle_timeout(), Some(Duration::from_secs(60)));
        assert_eq!(options.get_max_lifetime(), Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_zero_means_no_limit() {
        let settings = PoolSettings {
            idle_timeout_secs: 0,
            max_lifetime_secs: 0,
            ..Default::default()
        };
        let options = pool_options(&settings);

        assert_eq!(options.get_idle_timeout(), None);
        assert_eq!(options.get_max_lifetime(), None);
    }
}
