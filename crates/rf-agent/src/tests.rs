//! Unit tests for rf-agent.

#[cfg(test)]
mod status {
    use crate::AgentStatus;

    #[test]
    fn labels_round_trip() {
        for s in AgentStatus::ALL {
            assert_eq!(AgentStatus::from_label(s.as_str()), s);
        }
    }

    #[test]
    fn lenient_parse() {
        assert_eq!(AgentStatus::from_label("on-duty"), AgentStatus::OnDuty);
        assert_eq!(AgentStatus::from_label(" online "), AgentStatus::Online);
        assert_eq!(AgentStatus::from_label("parked"), AgentStatus::Unknown);
    }

    #[test]
    fn ordering_is_roster_order() {
        assert!(AgentStatus::OnDuty < AgentStatus::Online);
        assert!(AgentStatus::Online < AgentStatus::Offline);
        assert!(AgentStatus::Offline < AgentStatus::Untracked);
        assert!(AgentStatus::Untracked < AgentStatus::Unknown);
    }
}

#[cfg(test)]
mod builder {
    use rf_core::{AgentId, CoreError, GeoPoint};
    use crate::{AgentStatus, AgentStoreBuilder, RosterEntry};

    fn roster() -> Vec<RosterEntry> {
        vec![
            RosterEntry::new("u1", "Untracked One", AgentStatus::Untracked),
            RosterEntry::new("f1", "Offline One", AgentStatus::Offline),
            RosterEntry::new("d1", "Duty One", AgentStatus::OnDuty),
            RosterEntry::new("n1", "Online One", AgentStatus::Online),
            RosterEntry::new("d2", "Duty Two", AgentStatus::OnDuty),
            RosterEntry::new("x1", "Mystery", AgentStatus::Unknown),
        ]
    }

    #[test]
    fn sorted_by_status_stable_within_status() {
        let (store, rngs) = AgentStoreBuilder::new(1).entries(roster()).build();
        assert_eq!(store.count, 6);
        assert_eq!(rngs.len(), 6);
        let ids: Vec<&str> = store.external_id.iter().map(String::as_str).collect();
        assert_eq!(ids, ["d1", "d2", "n1", "f1", "u1", "x1"]);
    }

    #[test]
    fn lookup_by_external_id() {
        let (store, _) = AgentStoreBuilder::new(1).entries(roster()).build();
        assert_eq!(store.lookup("n1").unwrap(), AgentId(2));
        assert!(matches!(store.lookup("zz"), Err(CoreError::UnknownExternalId(_))));
        assert!(store.check(AgentId(5)).is_ok());
        assert!(matches!(store.check(AgentId(6)), Err(CoreError::AgentNotFound(_))));
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let (store, _) = AgentStoreBuilder::new(1)
            .entry(RosterEntry::new("a", "First", AgentStatus::Online))
            .entry(RosterEntry::new("a", "Second", AgentStatus::Online))
            .build();
        assert_eq!(store.count, 1);
        assert_eq!(store.name[0], "First");
    }

    #[test]
    fn initial_positions_carried() {
        let p = GeoPoint::new(-1.28, 36.82);
        let (store, _) = AgentStoreBuilder::new(1)
            .entry(RosterEntry::new("a", "A", AgentStatus::Online).at(p))
            .entry(RosterEntry::new("b", "B", AgentStatus::Online))
            .build();
        assert_eq!(store.initial_position, vec![Some(p), None]);
    }

    #[test]
    fn flags_are_deterministic_and_plausible() {
        let many: Vec<RosterEntry> = (0..2_000)
            .map(|i| RosterEntry::new(format!("v{i}"), format!("V{i}"), AgentStatus::Online))
            .collect();
        let (a, _) = AgentStoreBuilder::new(77).entries(many.clone()).build();
        let (b, _) = AgentStoreBuilder::new(77).entries(many).build();
        assert_eq!(a.flags, b.flags);

        let frac = |f: fn(&crate::AgentFlags) -> bool| {
            a.flags.iter().filter(|x| f(x)).count() as f64 / a.count as f64
        };
        assert!((frac(|f| f.connectivity) - 0.7).abs() < 0.05);
        assert!((frac(|f| f.mechanical_fault) - 0.05).abs() < 0.03);
        assert!((frac(|f| f.low_fuel) - 0.3).abs() < 0.05);
        assert!(a.flags.iter().all(|f| !f.in_heat_zone));
    }

    #[test]
    fn empty_roster() {
        let (store, rngs) = AgentStoreBuilder::new(0).build();
        assert!(store.is_empty());
        assert!(rngs.is_empty());
        assert_eq!(store.agent_ids().count(), 0);
    }
}
