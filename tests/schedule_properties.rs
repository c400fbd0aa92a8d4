//! Property tests: overlap symmetry, add/conflict agreement, toggle involution.

use proptest::prelude::*;

use study_planner::time::{format_minutes, overlaps, to_minutes};
use study_planner::{Database, ErrorKind, NewTask, Planner, PlannerDefaults};

fn setup_planner() -> Planner<Database> {
    Planner::open(Database::open_in_memory().unwrap(), PlannerDefaults::default()).unwrap()
}

proptest! {
    #[test]
    fn prop_overlap_is_symmetric(sa in 0u32..1440, da in 0u32..300, sb in 0u32..1440, db in 0u32..300) {
        prop_assert_eq!(overlaps(sa, da, sb, db), overlaps(sb, db, sa, da));
    }

    #[test]
    fn prop_minutes_round_trip(minutes in 0u32..1440) {
        prop_assert_eq!(to_minutes(&format_minutes(minutes)).unwrap(), minutes);
    }

    #[test]
    fn prop_second_add_matches_overlap_test(
        sa in 0u32..1440, da in 1u32..240,
        sb in 0u32..1440, db in 1u32..240,
    ) {
        let mut planner = setup_planner();
        planner.add_task(NewTask::new("A", "2024-05-10", format_minutes(sa), da)).unwrap();

        let second = NewTask::new("B", "2024-05-10", format_minutes(sb), db);
        let result = planner.add_task(second.clone());

        if overlaps(sa, da, sb, db) {
            prop_assert_eq!(result.unwrap_err().kind(), ErrorKind::SchedulingConflict);
            prop_assert!(planner.force_add_task(second).is_ok());
        } else {
            prop_assert!(result.is_ok());
        }
        prop_assert_eq!(planner.list_by_date("2024-05-10").len(), 2);
    }

    #[test]
    fn prop_update_in_place_never_conflicts_with_itself(start in 0u32..1440, duration in 1u32..600) {
        let mut planner = setup_planner();
        let task = planner
            .add_task(NewTask::new("Solo", "2024-05-10", format_minutes(start), duration))
            .unwrap();
        prop_assert!(planner.update_task(task).is_ok());
    }

    #[test]
    fn prop_toggle_twice_restores(toggles in 0usize..6) {
        let mut planner = setup_planner();
        let task = planner.add_task(NewTask::new("T", "2024-05-10", "09:00", 30)).unwrap();

        for _ in 0..toggles {
            planner.toggle_task(task.id).unwrap();
        }
        let completed = planner.get_task(task.id).unwrap().is_completed;
        prop_assert_eq!(completed, toggles % 2 == 1);
    }
}
