//! Unit and integration tests for rf-sim.

use chrono::{DateTime, Utc};

use rf_agent::{AgentStatus, RosterEntry};
use rf_core::{GeoPoint, SimTime};
use rf_spatial::{AStarRouter, RoadNetwork, RoadNetworkBuilder};

use crate::{OptionsPatch, Sim, SimBuilder, SimEvent, SimOptions};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// `n × n` lattice, `step` degrees apart.  Rows are "Row {r} Street",
/// columns "Column {c} Avenue".
fn grid(n: usize, step: f64) -> RoadNetwork {
    let mut b = RoadNetworkBuilder::new();
    for r in 0..n {
        let pts: Vec<GeoPoint> = (0..n).map(|c| GeoPoint::new(r as f64 * step, c as f64 * step)).collect();
        b.add_line(None, Some(format!("Row {r} Street")), &pts);
    }
    for c in 0..n {
        let pts: Vec<GeoPoint> = (0..n).map(|r| GeoPoint::new(r as f64 * step, c as f64 * step)).collect();
        b.add_line(None, Some(format!("Column {c} Avenue")), &pts);
    }
    b.build()
}

fn roster(n: usize) -> Vec<RosterEntry> {
    (0..n)
        .map(|i| RosterEntry::new(format!("a{i}"), format!("Agent {i}"), AgentStatus::ALL[i % 5]))
        .collect()
}

fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

fn build(n: usize, options: SimOptions) -> Sim<AStarRouter> {
    SimBuilder::new(grid(4, 0.005), AStarRouter::new())
        .options(options)
        .roster(roster(n))
        .seed(7)
        .epoch(epoch())
        .build()
        .unwrap()
}

/// Built and with the construction events drained.
fn sim(n: usize) -> Sim<AStarRouter> {
    let mut s = build(n, SimOptions::default());
    s.drain_events();
    s
}

fn agent_events(events: &[SimEvent]) -> usize {
    events.iter().filter(|e| matches!(e, SimEvent::Agent(_))).count()
}

// ── Builder ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use rf_spatial::SpatialError;

    use super::*;
    use crate::SimError;

    #[test]
    fn builds_stopped_with_every_agent_placed() {
        let mut s = build(6, SimOptions::default());
        assert!(!s.is_running());
        assert_eq!(s.status().agents, 6);
        assert_eq!(s.snapshots().len(), 6);
        assert_eq!(s.zones().len(), 5);
        let events = s.drain_events();
        assert!(events.iter().any(|e| matches!(e, SimEvent::Status(st) if !st.running && st.agents == 6)));
    }

    #[test]
    fn roster_is_ordered_by_status() {
        let s = sim(10);
        let statuses: Vec<AgentStatus> = s.snapshots().iter().map(|a| a.status).collect();
        let mut sorted = statuses.clone();
        sorted.sort();
        assert_eq!(statuses, sorted);
        assert_eq!(statuses[0], AgentStatus::OnDuty);
    }

    #[test]
    fn duplicate_ids_are_dropped() {
        let mut r = roster(3);
        r.push(RosterEntry::new("a0", "Again", AgentStatus::Online));
        let s = SimBuilder::new(grid(3, 0.005), AStarRouter::new()).roster(r).build().unwrap();
        assert_eq!(s.status().agents, 3);
    }

    #[test]
    fn empty_network_is_fatal() {
        let result = SimBuilder::new(RoadNetworkBuilder::new().build(), AStarRouter::new()).build();
        assert!(matches!(result, Err(SimError::Spatial(SpatialError::EmptyNetwork))));
    }

    #[test]
    fn invalid_options_rejected() {
        let options = SimOptions { min_speed: 80.0, ..SimOptions::default() };
        let result = SimBuilder::new(grid(3, 0.005), AStarRouter::new()).options(options).build();
        assert!(matches!(result, Err(SimError::Config(_))));
    }
}

// ── Options ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod options {
    use super::*;
    use crate::{OptionsApplied, SimError};

    #[test]
    fn defaults() {
        let o = SimOptions::default();
        assert_eq!(o.update_interval_ms, 5_000);
        assert_eq!((o.min_speed, o.max_speed), (20.0, 60.0));
        // km/h per hour: +5 and -7 km/h over one 5 s update.
        assert_eq!((o.acceleration, o.deceleration), (3_600.0, 5_040.0));
        assert_eq!(o.turn_threshold, 30.0);
        assert_eq!(o.speed_variation, 0.1);
        assert_eq!(o.heat_zone_speed_factor, 0.5);
        assert!(!o.update_server);
        assert_eq!(o.sync_timeout_ms, 5_000);
        assert_eq!(o.heat_zone_interval_ms, 300_000);
        assert_eq!(o.stuck_timeout_ms, None);
        assert!(o.validate().is_ok());
    }

    #[test]
    fn validation_rules() {
        let bad = [
            SimOptions { min_speed: 61.0, ..SimOptions::default() },
            SimOptions { acceleration: -1.0, ..SimOptions::default() },
            SimOptions { max_speed: f64::NAN, ..SimOptions::default() },
            SimOptions { speed_variation: 1.0, ..SimOptions::default() },
            SimOptions { heat_zone_speed_factor: 0.0, ..SimOptions::default() },
            SimOptions { heat_zone_speed_factor: 1.5, ..SimOptions::default() },
            SimOptions { update_interval_ms: 0, ..SimOptions::default() },
            SimOptions { sync_interval_ms: 0, ..SimOptions::default() },
            SimOptions { stuck_timeout_ms: Some(0), ..SimOptions::default() },
            SimOptions { stuck_timeout_ms: Some(1_000), ..SimOptions::default() },
            SimOptions { stuck_timeout_ms: Some(5_000), ..SimOptions::default() },
        ];
        for o in bad {
            assert!(o.validate().is_err(), "{o:?}");
        }
        let stuck = SimOptions { stuck_timeout_ms: Some(5_001), ..SimOptions::default() };
        assert!(stuck.validate().is_ok());
        let edge = SimOptions { min_speed: 40.0, max_speed: 40.0, speed_variation: 0.0, ..SimOptions::default() };
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn merge_replaces_only_present_fields() {
        let patch = OptionsPatch { max_speed: Some(90.0), stuck_timeout_ms: Some(30_000), ..OptionsPatch::default() };
        let o = SimOptions::default().merged(&patch);
        assert_eq!(o.max_speed, 90.0);
        assert_eq!(o.min_speed, 20.0);
        assert_eq!(o.stuck_timeout_ms, Some(30_000));
        let off = o.merged(&OptionsPatch { stuck_timeout_ms: Some(0), ..OptionsPatch::default() });
        assert_eq!(off.stuck_timeout_ms, None);
        assert!(OptionsPatch::default().is_empty());
        assert!(!patch.is_empty());
    }

    #[test]
    fn serde_fills_defaults() {
        let o: SimOptions = serde_json::from_str(r#"{"max_speed": 80}"#).unwrap();
        assert_eq!(o.max_speed, 80.0);
        assert_eq!(o.update_interval_ms, 5_000);
        let p: OptionsPatch = serde_json::from_str(r#"{"update_server": true}"#).unwrap();
        assert_eq!(p.update_server, Some(true));
        assert_eq!(p.min_speed, None);
    }

    #[test]
    fn invalid_set_options_leaves_live_options() {
        let mut s = sim(2);
        let err = s.set_options(&OptionsPatch { min_speed: Some(100.0), ..OptionsPatch::default() });
        assert!(matches!(err, Err(SimError::Config(_))));
        assert_eq!(s.options(), &SimOptions::default());
        assert!(s.drain_events().is_empty());
    }

    #[test]
    fn valid_set_options_is_published() {
        let mut s = sim(2);
        let applied = s.set_options(&OptionsPatch { max_speed: Some(70.0), ..OptionsPatch::default() }).unwrap();
        assert_eq!(applied, OptionsApplied::Live);
        assert_eq!(s.options().max_speed, 70.0);
        let events = s.drain_events();
        assert!(matches!(&events[..], [SimEvent::Options(o)] if o.max_speed == 70.0));
    }
}

// ── Lifecycle ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod lifecycle {
    use rf_core::AgentId;

    use super::*;
    use crate::OptionsApplied;

    #[test]
    fn each_agent_ticks_once_per_interval() {
        let mut s = sim(5);
        s.start(&OptionsPatch::default()).unwrap();
        assert!(s.is_running());
        s.drain_events();

        s.advance_to(SimTime(4_999));
        assert_eq!(agent_events(&s.drain_events()), 0);
        s.advance_to(SimTime(5_000));
        assert_eq!(agent_events(&s.drain_events()), 5);
        s.advance_to(SimTime(25_000));
        assert_eq!(agent_events(&s.drain_events()), 20);
        assert_eq!(s.now(), SimTime(25_000));
        assert_eq!(s.next_wake(), Some(SimTime(30_000)));
    }

    #[test]
    fn start_then_stop_freezes_everything() {
        let mut s = sim(5);
        s.start(&OptionsPatch::default()).unwrap();
        s.stop();
        let frozen = s.snapshots();
        s.drain_events();

        s.advance_to(SimTime(60_000));
        assert!(s.drain_events().is_empty());
        assert_eq!(s.snapshots(), frozen);
        assert_eq!(s.next_wake(), None);
    }

    #[test]
    fn stop_is_idempotent() {
        let mut s = sim(2);
        s.stop();
        assert!(s.drain_events().is_empty());
        s.start(&OptionsPatch::default()).unwrap();
        s.stop();
        s.drain_events();
        s.stop();
        assert!(s.drain_events().is_empty());
        assert!(!s.is_running());
    }

    #[test]
    fn stop_keeps_agent_state_and_restart_resumes() {
        let mut s = sim(3);
        s.start(&OptionsPatch::default()).unwrap();
        s.advance_to(SimTime(20_000));
        s.stop();
        let odometers: Vec<f64> = s.snapshots().iter().map(|a| a.odometer_km).collect();
        assert!(odometers.iter().all(|&km| km > 0.0));

        s.advance_to(SimTime(100_000));
        s.start(&OptionsPatch::default()).unwrap();
        s.advance_to(SimTime(105_000));
        for (before, after) in odometers.iter().zip(s.snapshots()) {
            // One 5 s tick after the restart, not 85 s of catch-up.
            let step = after.odometer_km - before;
            assert!(step > 0.0 && step <= 60.0 * 5.0 / 3_600.0 + 1e-9, "step {step}");
        }
    }

    #[test]
    fn reset_rebuilds_roster() {
        let mut s = sim(4);
        s.start(&OptionsPatch::default()).unwrap();
        s.advance_to(SimTime(10_000));

        s.reset(None);
        assert!(!s.is_running());
        assert_eq!(s.status().agents, 4);
        assert!(s.snapshots().iter().all(|a| a.odometer_km == 0.0));

        s.reset(Some(roster(2)));
        assert_eq!(s.status().agents, 2);
        s.reset(None);
        assert_eq!(s.status().agents, 2);
    }

    #[test]
    fn interval_change_applies_from_next_fire() {
        let mut s = sim(5);
        s.start(&OptionsPatch::default()).unwrap();
        s.advance_to(SimTime(5_000));
        s.set_options(&OptionsPatch { update_interval_ms: Some(1_000), ..OptionsPatch::default() }).unwrap();
        s.drain_events();

        s.advance_to(SimTime(10_000));
        assert_eq!(agent_events(&s.drain_events()), 5);
        s.advance_to(SimTime(10_999));
        assert_eq!(agent_events(&s.drain_events()), 0);
        s.advance_to(SimTime(11_000));
        assert_eq!(agent_events(&s.drain_events()), 5);
    }

    #[test]
    fn switching_roster_source_stops_and_requests_reset() {
        let mut s = sim(3);
        s.start(&OptionsPatch::default()).unwrap();
        let applied = s.set_options(&OptionsPatch { use_adapter: Some(true), ..OptionsPatch::default() }).unwrap();
        assert_eq!(applied, OptionsApplied::ResetRequired);
        assert!(!s.is_running());
    }

    #[test]
    fn stuck_timeout_not_above_interval_is_rejected() {
        let mut s = sim(2);
        let patch = OptionsPatch { stuck_timeout_ms: Some(1_000), ..OptionsPatch::default() };
        assert!(matches!(s.start(&patch), Err(crate::SimError::Config(_))));
        assert!(!s.is_running());
    }

    #[test]
    fn parked_agents_are_reset_after_timeout() {
        let options = SimOptions {
            min_speed: 0.0,
            max_speed: 0.0,
            speed_variation: 0.0,
            stuck_timeout_ms: Some(12_000),
            ..SimOptions::default()
        };
        let mut s = build(1, options);
        let agent = AgentId(0);
        s.start(&OptionsPatch::default()).unwrap();

        // Ticks at 5 s and 10 s cover no distance.
        s.advance_to(SimTime(14_999));
        let state = s.mobility.state(agent).unwrap();
        assert_eq!(state.last_update, SimTime(10_000));
        assert_eq!(state.last_moved, SimTime::ZERO);

        // 15 s without movement exceeds 12 s: re-placed now.
        s.advance_to(SimTime(15_000));
        assert_eq!(s.mobility.state(agent).unwrap().last_moved, SimTime(15_000));
        s.advance_to(SimTime(29_999));
        assert_eq!(s.mobility.state(agent).unwrap().last_moved, SimTime(15_000));
        s.advance_to(SimTime(30_000));
        assert_eq!(s.mobility.state(agent).unwrap().last_moved, SimTime(30_000));
    }

    #[test]
    fn moving_agents_are_never_reset() {
        let mut s = sim(4);
        let patch = OptionsPatch { stuck_timeout_ms: Some(6_000), ..OptionsPatch::default() };
        s.start(&patch).unwrap();
        let mut odometers = vec![0.0; 4];
        for t in (5_000..=120_000).step_by(5_000) {
            s.advance_to(SimTime(t));
            for (i, a) in s.snapshots().iter().enumerate() {
                // A reset would zero the odometer.
                assert!(a.odometer_km > odometers[i], "{} at {t}", a.id);
                odometers[i] = a.odometer_km;
            }
        }
    }

    #[test]
    fn same_seed_same_trajectories() {
        let mut a = sim(6);
        let mut b = sim(6);
        for s in [&mut a, &mut b] {
            s.start(&OptionsPatch::default()).unwrap();
            s.advance_to(SimTime(120_000));
        }
        assert_eq!(a.snapshots(), b.snapshots());
    }

    #[test]
    fn speeds_stay_in_bounds() {
        let mut s = sim(8);
        s.start(&OptionsPatch::default()).unwrap();
        for t in (5_000..=200_000).step_by(5_000) {
            s.advance_to(SimTime(t));
            for a in s.snapshots() {
                assert!((20.0..=60.0).contains(&a.speed), "{} at {t}: {}", a.id, a.speed);
            }
        }
    }
}

// ── Location sync ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod sync {
    use chrono::TimeDelta;

    use super::*;

    fn sync_patch() -> OptionsPatch {
        OptionsPatch { update_server: Some(true), sync_interval_ms: Some(1_000), ..OptionsPatch::default() }
    }

    #[test]
    fn batches_cover_every_agent() {
        let mut s = sim(4);
        s.start(&sync_patch()).unwrap();
        s.advance_to(SimTime(3_000));
        let batches = s.take_sync_batches();
        assert_eq!(batches.len(), 3);
        assert!(batches.iter().all(|b| b.len() == 4));
        assert!(s.take_sync_batches().is_empty());

        let first = &batches[0][0];
        assert_eq!(first.position_received_at, epoch() + TimeDelta::milliseconds(1_000));
        assert_eq!(first.position_origin_ref_id, crate::external::DEFAULT_ORIGIN_TAG);
        let snap = s.snapshot(&first.id).unwrap();
        assert_eq!((first.latitude, first.longitude), (snap.position.lat, snap.position.lon));
    }

    #[test]
    fn report_wire_names() {
        let mut s = sim(1);
        s.start(&sync_patch()).unwrap();
        s.advance_to(SimTime(1_000));
        let batch = s.take_sync_batches().remove(0);
        let json = serde_json::to_value(&batch[0]).unwrap();
        for key in ["latitude", "longitude", "id", "positionReceivedAt", "positionOriginRefId"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn toggling_sync_while_running() {
        let mut s = sim(2);
        s.start(&OptionsPatch::default()).unwrap();
        s.advance_to(SimTime(10_000));
        assert!(s.take_sync_batches().is_empty());

        s.set_options(&OptionsPatch { update_server: Some(true), ..OptionsPatch::default() }).unwrap();
        s.advance_to(SimTime(15_000));
        assert_eq!(s.take_sync_batches().len(), 1);

        s.set_options(&OptionsPatch { update_server: Some(false), ..OptionsPatch::default() }).unwrap();
        s.advance_to(SimTime(60_000));
        assert!(s.take_sync_batches().is_empty());
    }
}

// ── Destinations ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod destinations {
    use super::*;
    use crate::SimError;

    /// The lattice corner farthest from `p`.
    fn far_corner(p: GeoPoint) -> GeoPoint {
        [(0.0, 0.0), (0.0, 0.015), (0.015, 0.0), (0.015, 0.015)]
            .into_iter()
            .map(|(lat, lon)| GeoPoint::new(lat, lon))
            .max_by(|a, b| p.distance_km(*a).total_cmp(&p.distance_km(*b)))
            .unwrap()
    }

    #[test]
    fn route_assigned_and_published() {
        let mut s = sim(3);
        let agent = s.snapshots().remove(0);
        let route = s.set_destination(&agent.id, far_corner(agent.position)).unwrap();
        assert!(!route.is_empty());

        let events = s.drain_events();
        let update = events
            .iter()
            .find_map(|e| match e {
                SimEvent::Route(r) => Some(r.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(update.id, agent.id);
        assert_eq!(update.edges, route.edges);
        assert_eq!(update.coordinates.len(), route.len() + 1);
        assert_eq!(update.eta_secs, route.eta_secs(agent.speed));
        assert_eq!(s.snapshot(&agent.id).unwrap().position, update.coordinates[0]);
        assert_eq!(s.routes().len(), 1);
    }

    #[test]
    fn remaining_route_shrinks_as_agent_drives() {
        let mut s = sim(1);
        let agent = s.snapshots().remove(0);
        let route = s.set_destination(&agent.id, far_corner(agent.position)).unwrap();
        assert!(route.len() > 1);
        let before = s.routes().remove(0);
        assert!((before.distance_km - route.distance_km).abs() < 1e-9);

        s.start(&OptionsPatch::default()).unwrap();
        s.advance_to(SimTime(5_000));
        let after = s.routes().remove(0);
        let moved = s.snapshot(&agent.id).unwrap();

        assert!((before.distance_km - after.distance_km - moved.odometer_km).abs() < 1e-9);
        assert!(after.eta_secs.unwrap() < before.eta_secs.unwrap());
        assert_eq!(after.coordinates[0], moved.position);
        assert_eq!(after.coordinates.len(), after.edges.len() + 1);
        assert_eq!(after.edges.last(), route.edges.last());
    }

    #[test]
    fn unknown_agent() {
        let mut s = sim(2);
        let err = s.set_destination("nobody", GeoPoint::new(0.0, 0.0)).unwrap_err();
        assert!(matches!(err, SimError::AgentNotFound(id) if id == "nobody"));
    }

    #[test]
    fn batch_requests_are_independent() {
        let mut s = sim(2);
        let target = GeoPoint::new(0.015, 0.015);
        let results = s.set_destinations(&[("ghost".into(), target), ("a1".into(), target)]);
        assert_eq!(results.len(), 2);
        assert!(results[0].is_err());
        assert!(results[1].is_ok());
    }

    #[test]
    fn following_agent_completes_and_reports() {
        let mut s = sim(1);
        let agent = s.snapshots().remove(0);
        s.set_destination(&agent.id, far_corner(agent.position)).unwrap();
        s.start(&OptionsPatch::default()).unwrap();
        // Under 4 km of road at ≥ 20 km/h.
        s.advance_to(SimTime(20 * 60_000));
        let events = s.drain_events();
        assert!(events.iter().any(|e| matches!(e, SimEvent::DestinationReached { id, .. } if *id == agent.id)));
    }
}

// ── Zones and queries ─────────────────────────────────────────────────────────

#[cfg(test)]
mod zones_and_queries {
    use std::sync::Arc;

    use rf_zones::{ExportFormat, ZoneExport};

    use super::*;

    #[test]
    fn regeneration_swaps_the_whole_set() {
        let mut s = sim(1);
        let old = s.zones();
        assert_eq!(s.generate_heat_zones().unwrap(), 5);
        assert!(!Arc::ptr_eq(&old, &s.zones()));
        assert_eq!(old.len(), 5);

        let events = s.drain_events();
        assert!(matches!(&events[..], [SimEvent::HeatZones(ZoneExport::Polygons(z))] if z.len() == 5));
        assert_eq!(s.export_zones(ExportFormat::Paths).len(), 5);
    }

    #[test]
    fn periodic_regeneration() {
        let mut s = sim(1);
        s.start(&OptionsPatch { heat_zone_interval_ms: Some(1_000), ..OptionsPatch::default() }).unwrap();
        s.drain_events();
        s.advance_to(SimTime(3_000));
        let n = s.drain_events().iter().filter(|e| matches!(e, SimEvent::HeatZones(_))).count();
        assert_eq!(n, 3);
    }

    #[test]
    fn road_search_and_nearest() {
        let s = sim(1);
        let hits = s.search_roads("row 1");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Row 1 Street");
        assert_eq!(hits[0].nodes.len(), 4);
        assert_eq!(s.search_roads("avenue").len(), 4);

        let near = s.nearest(GeoPoint::new(0.0051, 0.0049)).unwrap();
        assert_eq!(near.node_position, GeoPoint::new(0.005, 0.005));
        assert!(near.edge_name.is_some());
    }
}

// ── External collaborators ────────────────────────────────────────────────────

#[cfg(test)]
mod external {
    use std::io::Write;

    use super::*;
    use crate::{ExternalError, JsonFileRoster, RosterSource, SyntheticRoster};

    #[test]
    fn synthetic_roster() {
        let r = SyntheticRoster::default().fetch().unwrap();
        assert_eq!(r.len(), 70);
        assert_eq!(r[0].id, "0");
        assert_eq!(r[69].name, "V69");
        assert_eq!(r, SyntheticRoster::default().fetch().unwrap());
    }

    #[test]
    fn json_file_roster() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            r#"[
                {{"id": "x1", "callsign": "Medic 1", "status": "onshift"}},
                {{"id": "x2", "name": "Medic 2", "position": {{"lat": 0.01, "lon": 0.01}}}},
                {{"id": "x3", "name": "Medic 3", "status": "parked"}}
            ]"#
        )
        .unwrap();
        let r = JsonFileRoster::new(f.path()).fetch().unwrap();
        assert_eq!(r.len(), 3);
        assert_eq!(r[0].name, "Medic 1");
        assert_eq!(r[0].status, AgentStatus::OnDuty);
        assert_eq!(r[1].position, Some(GeoPoint::new(0.01, 0.01)));
        assert_eq!(r[2].status, AgentStatus::Unknown);

        let s = SimBuilder::new(grid(4, 0.005), AStarRouter::new()).roster(r).build().unwrap();
        assert_eq!(s.snapshot("x2").unwrap().position, GeoPoint::new(0.01, 0.01));
    }

    #[test]
    fn json_file_roster_errors() {
        let missing = JsonFileRoster::new("/definitely/not/here.json").fetch();
        assert!(matches!(missing, Err(ExternalError::Io(_))));

        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "{{not json").unwrap();
        assert!(matches!(JsonFileRoster::new(f.path()).fetch(), Err(ExternalError::Json(_))));
    }
}

// ── Async service ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod service {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;
    use crate::{
        Collaborators, ExternalError, LocationReport, LocationSink, OptionsApplied, RosterSource,
        SimService, SyntheticRoster,
    };

    struct Down;

    impl RosterSource for Down {
        fn fetch(&self) -> Result<Vec<RosterEntry>, ExternalError> {
            Err(ExternalError::Unavailable("down".into()))
        }
    }

    #[derive(Default)]
    struct Collect(Mutex<Vec<usize>>);

    impl LocationSink for Collect {
        fn push(&self, batch: &[LocationReport]) -> Result<(), ExternalError> {
            self.0.lock().unwrap().push(batch.len());
            Ok(())
        }
    }

    fn fast() -> OptionsPatch {
        OptionsPatch { update_interval_ms: Some(20), ..OptionsPatch::default() }
    }

    #[tokio::test]
    async fn no_events_after_stop() {
        let handle = SimService::spawn(sim(3), Collaborators::default());
        let mut rx = handle.subscribe();
        handle.start(fast()).await.unwrap();

        let ticked = tokio::time::timeout(Duration::from_secs(5), async {
            while !matches!(rx.recv().await, Ok(SimEvent::Agent(_))) {}
        })
        .await;
        assert!(ticked.is_ok());

        handle.stop().await;
        loop {
            match rx.try_recv() {
                Ok(SimEvent::Status(st)) if !st.running => break,
                Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                Err(e) => panic!("stopped status not seen: {e:?}"),
            }
        }
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn failed_roster_fetch_keeps_last_roster() {
        let collab = Collaborators { adapter: Some(Arc::new(Down)), ..Collaborators::default() };
        let handle = SimService::spawn(sim(4), collab);
        let applied = handle
            .set_options(OptionsPatch { use_adapter: Some(true), ..OptionsPatch::default() })
            .await
            .unwrap();
        assert_eq!(applied, OptionsApplied::ResetRequired);
        let status = handle.status().await;
        assert!(!status.running);
        assert_eq!(status.agents, 4);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn switching_to_adapter_reloads() {
        let collab = Collaborators {
            adapter: Some(Arc::new(SyntheticRoster::new(9, 1))),
            ..Collaborators::default()
        };
        let handle = SimService::spawn(sim(4), collab);
        handle.set_options(OptionsPatch { use_adapter: Some(true), ..OptionsPatch::default() }).await.unwrap();
        assert_eq!(handle.status().await.agents, 9);
        assert_eq!(handle.snapshots().await.len(), 9);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn sync_batches_reach_the_sink() {
        let sink = Arc::new(Collect::default());
        let collab = Collaborators { sink: sink.clone(), ..Collaborators::default() };
        let handle = SimService::spawn(sim(3), collab);
        handle
            .start(OptionsPatch { update_server: Some(true), sync_interval_ms: Some(20), ..fast() })
            .await
            .unwrap();

        let got = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if !sink.0.lock().unwrap().is_empty() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(got.is_ok());
        assert!(sink.0.lock().unwrap().iter().all(|&n| n == 3));
        handle.stop().await;
        handle.shutdown().await;
    }
}
