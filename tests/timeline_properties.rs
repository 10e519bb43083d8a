use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use proptest::prelude::*;
use timeline_scheduler::merge;
use timeline_scheduler::{ItemKind, Overlay, SyncState, TimelineError, TimelineItem, TimelineSnapshot};

const KINDS: [ItemKind; 4] = [ItemKind::Fixed, ItemKind::Work, ItemKind::Break, ItemKind::Buffer];

fn midnight() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2026-01-12T00:00:00+09:00").unwrap()
}

// (start minute, length, kind) triples laid out on one day, ids in input order
fn items_strategy() -> impl Strategy<Value = Vec<TimelineItem>> {
    prop::collection::vec((0i64..1380, 1i64..180, 0usize..KINDS.len()), 1..24).prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(i, (start, len, kind))| {
                let kind = KINDS[kind];
                let start = midnight() + Duration::minutes(start);
                TimelineItem {
                    id: format!("item-{i}"),
                    title: None,
                    start,
                    end: start + Duration::minutes(len),
                    kind,
                    editable: kind == ItemKind::Work,
                    source_ref: None,
                }
            })
            .collect()
    })
}

fn overlay_for(items: Vec<TimelineItem>) -> Overlay {
    Overlay::new(TimelineSnapshot {
        date: NaiveDate::from_ymd_opt(2026, 1, 12).unwrap(),
        working_hours: vec![],
        items: merge::merge(items),
        dropped: 0,
    })
}

proptest! {
    #[test]
    fn merge_orders_without_losing_items(items in items_strategy()) {
        let merged = merge::merge(items.clone());

        let ordered = merged.windows(2).all(|w| {
            w[0].start < w[1].start || (w[0].start == w[1].start && w[0].kind <= w[1].kind)
        });
        prop_assert!(ordered);

        let mut before: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        let mut after: Vec<&str> = merged.iter().map(|i| i.id.as_str()).collect();
        before.sort_unstable();
        after.sort_unstable();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn violations_match_intersecting_committed_pairs(items in items_strategy()) {
        let committed: Vec<&TimelineItem> = items.iter().filter(|i| !i.kind.is_capacity()).collect();
        let mut intersecting = 0;
        for (i, a) in committed.iter().enumerate() {
            for b in &committed[i + 1..] {
                if a.start < b.end && b.start < a.end {
                    intersecting += 1;
                }
            }
        }

        let violations = merge::validate_non_overlap(&items);
        prop_assert_eq!(violations.len(), intersecting);
        prop_assert!(violations.iter().all(|v| v.overlap_minutes > 0));
    }

    #[test]
    fn locked_edits_leave_overlay_untouched(
        items in items_strategy(),
        pick in any::<prop::sample::Index>(),
        shift in -120i64..120,
    ) {
        let mut overlay = overlay_for(items);
        let target = overlay.items()[pick.index(overlay.items().len())].clone();
        let start = target.start + Duration::minutes(shift);
        let end = target.end + Duration::minutes(shift);

        let before = overlay.clone();
        let result = overlay.apply_move(&target.id, start, end);

        if target.editable {
            prop_assert!(result.is_ok());
            prop_assert_eq!(overlay.state(), SyncState::Dirty);
            prop_assert!(overlay.items().windows(2).all(|w| w[0].start <= w[1].start));
            for item in overlay.items().iter().filter(|i| i.id != target.id) {
                prop_assert_eq!(Some(item), before.baseline().get(&item.id));
            }
        } else {
            prop_assert_eq!(result, Err(TimelineError::NotEditable { id: target.id.clone() }));
            prop_assert_eq!(overlay, before);
        }
    }
}
