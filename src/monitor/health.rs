//! Station liveness refresh.

use chrono::Utc;
use serde::Serialize;

use super::{Monitor, MonitorError};
use crate::db::Station;
use crate::probe::ProbeTarget;

/// A station together with the outcome of its latest reachability check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationView {
    #[serde(flatten)]
    pub station: Station,
    pub is_online: bool,
}

impl Monitor {
    /// Probe a station and record whether, and since when, it is online.
    ///
    /// `last_checked` is stamped whatever the probe says; an unreachable or
    /// timed-out station is reported offline, not as an error. Only the
    /// liveness columns are written, so an edit made while the probe runs
    /// is kept.
    pub async fn refresh_station_status(&self, id: i64) -> Result<StationView, MonitorError> {
        let station = self
            .stations
            .find_station(id)?
            .ok_or(MonitorError::NotFound(id))?;

        let target = ProbeTarget::from(&station);
        let online_since =
            match tokio::time::timeout(self.timeouts.status, self.probe.status_check(&target)).await {
                Ok(since) => since,
                Err(_) => {
                    tracing::warn!(
                        "Status check for {} timed out after {:?}",
                        station.name,
                        self.timeouts.status
                    );
                    None
                }
            };

        let station = self
            .stations
            .record_check(id, Utc::now(), online_since)
            .map_err(|e| MonitorError::from_db(id, e))?;

        let is_online = online_since.is_some();
        tracing::info!(
            "Station {} ({}) is {}",
            station.name,
            station.host,
            if is_online { "online" } else { "offline" }
        );

        Ok(StationView { station, is_online })
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::super::{ProbeTimeouts, StationRequest};
    use super::*;
    use crate::db::StationRepository;
    use chrono::TimeZone;
    use std::time::Duration;

    #[tokio::test]
    async fn test_online_station_records_since() {
        let h = harness();
        let station = h.store.create_station(&hen_fields()).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();
        h.probe.set_online_since(Some(t1));

        let view = h.monitor.refresh_station_status(station.id).await.unwrap();
        assert!(view.is_online);
        assert_eq!(view.station.online_since, Some(t1));

        let stored = h.store.find_station(station.id).unwrap().unwrap();
        assert_eq!(stored.online_since, Some(t1));
        assert!(stored.last_checked.is_some());
        assert_eq!(
            h.probe.last_target(),
            Some(ProbeTarget {
                host: "10.0.0.5".to_string(),
                port: 22,
                username: "ops".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_unreachable_station_clears_since() {
        let h = harness();
        let station = h.store.create_station(&hen_fields()).unwrap();
        let since = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        h.store.record_check(station.id, since, Some(since)).unwrap();
        h.probe.set_online_since(None);

        let view = h.monitor.refresh_station_status(station.id).await.unwrap();
        assert!(!view.is_online);
        assert_eq!(view.station.online_since, None);

        let stored = h.store.find_station(station.id).unwrap().unwrap();
        assert_eq!(stored.online_since, None);
        assert!(stored.last_checked.is_some());
    }

    #[tokio::test]
    async fn test_last_checked_always_advances() {
        let h = harness();
        let station = h.store.create_station(&hen_fields()).unwrap();

        h.probe.set_online_since(Some(Utc::now()));
        let first = h.monitor.refresh_station_status(station.id).await.unwrap();

        h.probe.set_online_since(None);
        let second = h.monitor.refresh_station_status(station.id).await.unwrap();

        let (a, b) = (
            first.station.last_checked.unwrap(),
            second.station.last_checked.unwrap(),
        );
        assert!(b >= a);
    }

    #[tokio::test]
    async fn test_unknown_station_is_not_probed() {
        let h = harness();

        let err = h.monitor.refresh_station_status(7).await.unwrap_err();
        assert!(matches!(err, MonitorError::NotFound(7)));
        assert_eq!(h.probe.status_calls(), 0);
        assert_eq!(h.store.writes(), 0);
    }

    #[tokio::test]
    async fn test_slow_probe_counts_as_offline() {
        let h = harness_with(ProbeTimeouts {
            status: Duration::from_millis(20),
            ..Default::default()
        });
        let station = h.store.create_station(&hen_fields()).unwrap();
        h.probe.set_online_since(Some(Utc::now()));
        h.probe.set_delay(Duration::from_secs(5));

        let view = h.monitor.refresh_station_status(station.id).await.unwrap();
        assert!(!view.is_online);
        assert!(view.station.last_checked.is_some());
    }

    #[tokio::test]
    async fn test_refresh_keeps_concurrent_edit() {
        let h = harness();
        let station = h.store.create_station(&hen_fields()).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();
        h.probe.set_online_since(Some(t1));
        h.probe.set_delay(Duration::from_millis(100));

        let renamed = StationRequest {
            name: Some("Renamed".to_string()),
            location: Some("Lab".to_string()),
            host: Some("10.9.9.9".to_string()),
            port: Some(22),
            username: Some("ops".to_string()),
        };
        let (view, edited) = tokio::join!(h.monitor.refresh_station_status(station.id), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            h.monitor.edit_station(station.id, &renamed)
        });

        let view = view.unwrap();
        let edited = edited.unwrap();
        assert_eq!(edited.last_checked, None);
        assert_eq!(view.station.name, "Renamed");
        assert_eq!(view.station.host, "10.9.9.9");

        let stored = h.store.find_station(station.id).unwrap().unwrap();
        assert_eq!(stored.name, "Renamed");
        assert_eq!(stored.host, "10.9.9.9");
        assert_eq!(stored.online_since, Some(t1));
        assert!(stored.last_checked.is_some());
    }

    #[test]
    fn test_view_serializes_flat() {
        let view = StationView {
            station: Station {
                id: 3,
                name: "Hen-1".to_string(),
                ..Default::default()
            },
            is_online: false,
        };

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["isOnline"], false);
        assert!(json["onlineSince"].is_null());
        assert!(json.get("station").is_none());
    }
}
