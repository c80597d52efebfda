//! Background task scheduler.
//!
//! Periodically scans for residents who are overdue, either from an approved
//! leave or from an attendance check-out, and publishes the counts as gauges.

use sqlx::PgPool;
use tokio::time::{interval, Duration};

use crate::api::validation::now_seconds;
use crate::config::Config;
use crate::services::attendance_service::AttendanceService;
use crate::services::leave_service::{LeaveService, ShelterCount};
use crate::services::metrics_service;

/// Spawn all background scheduler tasks (fire-and-forget).
pub fn spawn_all(db: PgPool, config: Config) {
    let period = Duration::from_secs(config.overdue_scan_interval_secs.max(1));

    tokio::spawn(async move {
        // Let the server finish starting before the first scan
        tokio::time::sleep(Duration::from_secs(15)).await;
        let mut ticker = interval(period);

        loop {
            ticker.tick().await;
            tracing::debug!("Running overdue scan");
            if let Err(e) = scan_overdue(&db, &config.shelters).await {
                tracing::warn!("Overdue scan failed: {}", e);
            }
        }
    });

    tracing::info!(
        interval_secs = period.as_secs(),
        "Background scheduler started: overdue scan"
    );
}

/// Run one overdue scan and update the gauges for every configured shelter.
pub async fn scan_overdue(db: &PgPool, shelters: &[String]) -> crate::error::Result<()> {
    let now = now_seconds();

    let leave = LeaveService::new(db.clone())
        .count_overdue_by_shelter(now)
        .await?;
    let attendance = AttendanceService::new(db.clone())
        .count_overdue_by_shelter(now)
        .await?;

    publish("leave", shelters, &leave);
    publish("attendance", shelters, &attendance);
    Ok(())
}

fn publish(kind: &'static str, shelters: &[String], counts: &[ShelterCount]) {
    for shelter in shelters {
        let count = count_for(counts, shelter);
        metrics_service::set_overdue_gauge(kind, shelter, count);
        if count > 0 {
            tracing::warn!(shelter = %shelter, kind = kind, count = count, "Residents overdue");
        }
    }
}

/// Count for a shelter; shelters missing from the query result have none.
fn count_for(counts: &[ShelterCount], shelter: &str) -> i64 {
    counts
        .iter()
        .find(|c| c.shelter == shelter)
        .map(|c| c.count)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_shelter_counts_as_zero() {
        let counts = vec![ShelterCount {
            shelter: "Haven".into(),
            count: 2,
        }];
        assert_eq!(count_for(&counts, "Haven"), 2);
        assert_eq!(count_for(&counts, "Abba"), 0);
    }
}
