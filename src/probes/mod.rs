use serde::Serialize;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::Settings;

/// Upper bound on a single probe, so a hung peer cannot wedge /deps.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of probing one dependency, computed fresh per request.
#[derive(Debug, Clone, PartialEq)]
pub enum DependencyStatus {
    Unconfigured,
    Healthy,
    Unhealthy(String),
}

impl DependencyStatus {
    /// An unconfigured dependency never fails the aggregate.
    pub fn is_passing(&self) -> bool {
        !matches!(self, DependencyStatus::Unhealthy(_))
    }
}

/// Wire shape of one dependency in the /deps payload.
#[derive(Debug, Serialize)]
pub struct DependencyReport {
    pub configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&DependencyStatus> for DependencyReport {
    fn from(status: &DependencyStatus) -> Self {
        match status {
            DependencyStatus::Unconfigured => Self {
                configured: false,
                ok: None,
                error: None,
            },
            DependencyStatus::Healthy => Self {
                configured: true,
                ok: Some(true),
                error: None,
            },
            DependencyStatus::Unhealthy(reason) => Self {
                configured: true,
                ok: Some(false),
                error: Some(reason.clone()),
            },
        }
    }
}

/// A connection string that does not parse is kept as Broken and surfaces
/// as Unhealthy from the probe instead of aborting startup.
enum RedisHandle {
    Ready(redis::Client),
    Broken(String),
}

enum SqlHandle {
    Ready(PgPool),
    Broken(String),
}

/// Probe handles built once at startup and shared by the request handlers.
pub struct Dependencies {
    redis: Option<RedisHandle>,
    sql: Option<SqlHandle>,
    probe_timeout: Duration,
}

/// Joined result of both probes.
pub struct DepsReport {
    pub ok: bool,
    pub redis: DependencyStatus,
    pub sql: DependencyStatus,
}

impl Dependencies {
    pub fn from_settings(settings: &Settings) -> Self {
        let redis = settings.redis.as_deref().map(|url| {
            match redis::Client::open(url) {
                Ok(client) => RedisHandle::Ready(client),
                Err(e) => {
                    tracing::warn!("Invalid redis connection string: {}", e);
                    RedisHandle::Broken(e.to_string())
                }
            }
        });

        // connect_lazy: the pool only dials when a probe asks for a connection
        let sql = settings.sql.as_deref().map(|url| {
            match PgPoolOptions::new().max_connections(2).connect_lazy(url) {
                Ok(pool) => SqlHandle::Ready(pool),
                Err(e) => {
                    tracing::warn!("Invalid sql connection string: {}", e);
                    SqlHandle::Broken(e.to_string())
                }
            }
        });

        Self {
            redis,
            sql,
            probe_timeout: PROBE_TIMEOUT,
        }
    }

    /// Overrides the probe bound; tests use this to avoid wall-clock waits.
    pub fn with_probe_timeout(mut self, bound: Duration) -> Self {
        self.probe_timeout = bound;
        self
    }

    pub fn redis_configured(&self) -> bool {
        self.redis.is_some()
    }

    pub fn sql_configured(&self) -> bool {
        self.sql.is_some()
    }

    /// PING against the cache endpoint.
    pub async fn check_redis(&self) -> DependencyStatus {
        let client = match &self.redis {
            None => return DependencyStatus::Unconfigured,
            Some(RedisHandle::Broken(reason)) => {
                return DependencyStatus::Unhealthy(reason.clone());
            }
            Some(RedisHandle::Ready(client)) => client,
        };

        match timeout(self.probe_timeout, ping_redis(client)).await {
            Ok(Ok(())) => DependencyStatus::Healthy,
            Ok(Err(e)) => {
                tracing::warn!("Redis probe failed: {}", e);
                DependencyStatus::Unhealthy(e.to_string())
            }
            Err(_) => {
                tracing::warn!("Redis probe timed out after {:?}", self.probe_timeout);
                DependencyStatus::Unhealthy(format!(
                    "probe timed out after {:?}",
                    self.probe_timeout
                ))
            }
        }
    }

    /// SELECT 1 against the database endpoint.
    pub async fn check_sql(&self) -> DependencyStatus {
        let pool = match &self.sql {
            None => return DependencyStatus::Unconfigured,
            Some(SqlHandle::Broken(reason)) => {
                return DependencyStatus::Unhealthy(reason.clone());
            }
            Some(SqlHandle::Ready(pool)) => pool,
        };

        match timeout(self.probe_timeout, select_one(pool)).await {
            Ok(Ok(())) => DependencyStatus::Healthy,
            Ok(Err(e)) => {
                tracing::warn!("Sql probe failed: {}", e);
                DependencyStatus::Unhealthy(e.to_string())
            }
            Err(_) => {
                tracing::warn!("Sql probe timed out after {:?}", self.probe_timeout);
                DependencyStatus::Unhealthy(format!(
                    "probe timed out after {:?}",
                    self.probe_timeout
                ))
            }
        }
    }

    /// Runs both probes concurrently; overall ok is true unless a configured
    /// dependency is unhealthy.
    pub async fn check_all(&self) -> DepsReport {
        let (redis, sql) = tokio::join!(self.check_redis(), self.check_sql());
        let ok = redis.is_passing() && sql.is_passing();
        DepsReport { ok, redis, sql }
    }
}

async fn ping_redis(client: &redis::Client) -> redis::RedisResult<()> {
    // the connection is dropped, and with it closed, on every exit path
    let mut conn = client.get_multiplexed_async_connection().await?;
    let _: String = redis::cmd("PING").query_async(&mut conn).await?;
    Ok(())
}

async fn select_one(pool: &PgPool) -> sqlx::Result<()> {
    // execute() returns the pooled connection on success and on failure
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_and_healthy_pass_the_aggregate() {
        assert!(DependencyStatus::Unconfigured.is_passing());
        assert!(DependencyStatus::Healthy.is_passing());
        assert!(!DependencyStatus::Unhealthy("boom".to_string()).is_passing());
    }

    #[test]
    fn test_report_shape_unconfigured() {
        let report = DependencyReport::from(&DependencyStatus::Unconfigured);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json, serde_json::json!({"configured": false}));
    }

    #[test]
    fn test_report_shape_healthy() {
        let report = DependencyReport::from(&DependencyStatus::Healthy);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json, serde_json::json!({"configured": true, "ok": true}));
    }

    #[test]
    fn test_report_shape_unhealthy() {
        let report = DependencyReport::from(&DependencyStatus::Unhealthy("refused".to_string()));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"configured": true, "ok": false, "error": "refused"})
        );
    }

    #[tokio::test]
    async fn test_nothing_configured_aggregates_ok() {
        let deps = Dependencies::from_settings(&Settings::default());
        let report = deps.check_all().await;
        assert!(report.ok);
        assert_eq!(report.redis, DependencyStatus::Unconfigured);
        assert_eq!(report.sql, DependencyStatus::Unconfigured);
    }

    #[tokio::test]
    async fn test_unparseable_connection_strings_are_unhealthy() {
        let settings = Settings {
            redis: Some("not a redis url".to_string()),
            sql: Some("not a sql url".to_string()),
        };
        let deps = Dependencies::from_settings(&settings);
        let report = deps.check_all().await;

        assert!(!report.ok);
        for status in [&report.redis, &report.sql] {
            match status {
                DependencyStatus::Unhealthy(reason) => assert!(!reason.is_empty()),
                other => panic!("expected Unhealthy, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_timeout_bounds_a_hung_peer() {
        // a peer that accepts and then never replies
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(async move {
                    let _socket = socket;
                    tokio::time::sleep(Duration::from_secs(60)).await;
                });
            }
        });

        let settings = Settings {
            redis: Some(format!("redis://{}", addr)),
            sql: None,
        };
        let deps = Dependencies::from_settings(&settings)
            .with_probe_timeout(Duration::from_millis(100));

        let started = std::time::Instant::now();
        let report = deps.check_all().await;
        assert!(started.elapsed() < Duration::from_secs(5));

        assert!(!report.ok);
        match &report.redis {
            DependencyStatus::Unhealthy(reason) => assert!(reason.contains("timed out")),
            other => panic!("expected Unhealthy, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_one_unhealthy_dependency_fails_the_aggregate() {
        // unroutable local port, the connect fails fast
        let settings = Settings {
            redis: Some("redis://127.0.0.1:1".to_string()),
            sql: None,
        };
        let deps = Dependencies::from_settings(&settings);
        let report = deps.check_all().await;

        assert!(!report.ok);
        assert!(matches!(report.redis, DependencyStatus::Unhealthy(_)));
        assert_eq!(report.sql, DependencyStatus::Unconfigured);
    }
}
