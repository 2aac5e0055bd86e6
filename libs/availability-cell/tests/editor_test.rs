mod common;

use std::sync::Arc;

use assert_matches::assert_matches;

use availability_cell::{EditToggle, Preset, RangeField, RangeStatus};
use shared_models::error::PortalError;
use shared_models::notice::NoticeLevel;

use common::{days_from_today, editor_at, range, today, InMemoryStore};

#[tokio::test]
async fn test_load_marks_every_range_submitted() {
    let store = Arc::new(InMemoryStore::seeded(
        days_from_today(1),
        vec![range("09:00", "10:00"), range("14:00", "15:00")],
    ));
    let mut editor = editor_at(store, 8, 0);

    let loaded = editor.load_for_date(days_from_today(1)).await;

    assert_eq!(loaded, 2);
    assert_eq!(editor.selected_date(), days_from_today(1));
    assert!(editor.ranges().iter().all(|entry| entry.status == RangeStatus::Submitted));
    assert!(editor.editing_id().is_none());
}

#[tokio::test]
async fn test_load_failure_falls_back_to_empty_set() {
    let store = Arc::new(InMemoryStore::seeded(days_from_today(1), vec![range("09:00", "10:00")]));
    let mut editor = editor_at(store.clone(), 8, 0);
    editor.add_range();

    store.fail_reads(true);
    let loaded = editor.load_for_date(days_from_today(1)).await;

    assert_eq!(loaded, 0);
    assert!(editor.ranges().is_empty());
}

#[tokio::test]
async fn test_add_range_uses_default_and_stays_local() {
    let store = Arc::new(InMemoryStore::default());
    let mut editor = editor_at(store.clone(), 8, 0);

    let id = editor.add_range();

    let entry = editor.range(id).unwrap();
    assert_eq!(entry.range, range("09:00", "10:00"));
    assert_eq!(entry.status, RangeStatus::New);
    assert!(store.saves().is_empty());
}

#[tokio::test]
async fn test_submitted_range_must_be_unlocked_before_update() {
    let date = days_from_today(2);
    let store = Arc::new(InMemoryStore::seeded(date, vec![range("09:00", "10:00")]));
    let mut editor = editor_at(store, 8, 0);
    editor.load_for_date(date).await;
    let id = editor.ranges()[0].id;

    let result = editor.update_field(id, RangeField::End, "11:00");
    assert_matches!(result, Err(PortalError::Validation(_)));
    assert_eq!(editor.range(id).unwrap().range.end, "10:00");
    let notices = editor.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Warning);

    assert_eq!(editor.toggle_edit(id).await.unwrap(), EditToggle::Entered);
    editor.update_field(id, RangeField::End, "11:00").unwrap();
    assert_eq!(editor.range(id).unwrap().range.end, "11:00");
}

#[tokio::test]
async fn test_toggle_edit_rejects_new_range() {
    let store = Arc::new(InMemoryStore::default());
    let mut editor = editor_at(store, 8, 0);
    let id = editor.add_range();

    let result = editor.toggle_edit(id).await;

    assert_matches!(result, Err(PortalError::Validation(msg)) if msg.contains("Save"));
    assert_eq!(editor.status_of(id), Some(RangeStatus::New));
}

#[tokio::test]
async fn test_toggle_edit_twice_discards_changes_and_reloads() {
    let date = days_from_today(1);
    let store = Arc::new(InMemoryStore::seeded(date, vec![range("09:00", "10:00")]));
    let mut editor = editor_at(store, 8, 0);
    editor.load_for_date(date).await;
    let id = editor.ranges()[0].id;

    editor.toggle_edit(id).await.unwrap();
    editor.update_field(id, RangeField::Start, "08:00").unwrap();
    let toggled = editor.toggle_edit(id).await.unwrap();

    assert_eq!(toggled, EditToggle::Cancelled);
    assert_eq!(editor.ranges().len(), 1);
    assert_eq!(editor.ranges()[0].range, range("09:00", "10:00"));
    assert_eq!(editor.ranges()[0].status, RangeStatus::Submitted);
    assert!(editor.editing_id().is_none());
}

#[tokio::test]
async fn test_only_one_range_can_be_edited_at_a_time() {
    let date = days_from_today(1);
    let store = Arc::new(InMemoryStore::seeded(
        date,
        vec![range("09:00", "10:00"), range("11:00", "12:00")],
    ));
    let mut editor = editor_at(store, 8, 0);
    editor.load_for_date(date).await;
    let first = editor.ranges()[0].id;
    let second = editor.ranges()[1].id;

    editor.toggle_edit(first).await.unwrap();
    let result = editor.toggle_edit(second).await;

    assert_matches!(result, Err(PortalError::Validation(_)));
    assert_eq!(editor.editing_id(), Some(first));
    assert_eq!(editor.status_of(second), Some(RangeStatus::Submitted));
}

#[tokio::test]
async fn test_save_range_persists_whole_set_and_marks_only_that_range() {
    let date = days_from_today(3);
    let store = Arc::new(InMemoryStore::default());
    let mut editor = editor_at(store.clone(), 8, 0);
    editor.load_for_date(date).await;

    let first = editor.add_range();
    let second = editor.add_range();
    editor.update_field(second, RangeField::Start, "13:00").unwrap();
    editor.update_field(second, RangeField::End, "14:00").unwrap();

    let outcome = editor.save_range(first).await.unwrap();

    assert_eq!(outcome.persisted, 2);
    assert!(!outcome.partial_today);
    assert_eq!(store.saves(), vec![(date, vec![range("09:00", "10:00"), range("13:00", "14:00")])]);
    assert_eq!(editor.status_of(first), Some(RangeStatus::Submitted));
    assert_eq!(editor.status_of(second), Some(RangeStatus::New));
}

#[tokio::test]
async fn test_save_range_after_edit_exits_edit_mode() {
    let date = days_from_today(1);
    let store = Arc::new(InMemoryStore::seeded(date, vec![range("09:00", "10:00")]));
    let mut editor = editor_at(store.clone(), 8, 0);
    editor.load_for_date(date).await;
    let id = editor.ranges()[0].id;

    editor.toggle_edit(id).await.unwrap();
    editor.update_field(id, RangeField::End, "10:30").unwrap();
    editor.save_range(id).await.unwrap();

    assert_eq!(editor.status_of(id), Some(RangeStatus::Submitted));
    assert!(editor.editing_id().is_none());
    assert_eq!(store.stored(date), vec![range("09:00", "10:30")]);
}

#[tokio::test]
async fn test_save_range_rejects_duplicates_without_store_call() {
    let date = days_from_today(1);
    let store = Arc::new(InMemoryStore::seeded(date, vec![range("09:00", "10:00")]));
    let mut editor = editor_at(store.clone(), 8, 0);
    editor.load_for_date(date).await;
    let id = editor.add_range();

    let result = editor.save_range(id).await;

    assert_matches!(result, Err(PortalError::Validation(msg)) if msg.contains("already exists"));
    assert!(store.saves().is_empty());
    assert_eq!(editor.status_of(id), Some(RangeStatus::New));
}

#[tokio::test]
async fn test_save_range_rejects_inverted_and_malformed_times() {
    let store = Arc::new(InMemoryStore::default());
    let mut editor = editor_at(store.clone(), 8, 0);
    editor.load_for_date(days_from_today(1)).await;
    let id = editor.add_range();

    editor.update_field(id, RangeField::End, "08:00").unwrap();
    assert_matches!(editor.save_range(id).await, Err(PortalError::Validation(_)));

    editor.update_field(id, RangeField::End, "9:75").unwrap();
    assert_matches!(editor.save_range(id).await, Err(PortalError::Validation(_)));

    assert!(store.saves().is_empty());
}

#[tokio::test]
async fn test_save_range_rejects_invalid_sibling_range() {
    let store = Arc::new(InMemoryStore::default());
    let mut editor = editor_at(store.clone(), 8, 0);
    editor.load_for_date(days_from_today(4)).await;
    let first = editor.add_range();
    let second = editor.add_range();
    editor.update_field(second, RangeField::Start, "15:00").unwrap();
    editor.update_field(second, RangeField::End, "11:00").unwrap();

    let result = editor.save_range(first).await;

    assert_matches!(result, Err(PortalError::Validation(msg)) if msg.starts_with("Slot 2"));
    assert!(store.saves().is_empty());
    assert_eq!(editor.status_of(first), Some(RangeStatus::New));
}

#[tokio::test]
async fn test_unpadded_minutes_are_not_saved() {
    let store = Arc::new(InMemoryStore::default());
    let mut editor = editor_at(store.clone(), 8, 0);
    editor.load_for_date(days_from_today(2)).await;
    let id = editor.add_range();
    editor.update_field(id, RangeField::Start, "12: 5").unwrap();
    editor.update_field(id, RangeField::End, "13:00").unwrap();

    assert_matches!(editor.save_range(id).await, Err(PortalError::Validation(_)));
    assert_matches!(editor.save_all().await, Err(PortalError::Validation(_)));
    assert!(store.saves().is_empty());
}

#[tokio::test]
async fn test_save_range_today_rejects_elapsed_and_flags_partial() {
    let store = Arc::new(InMemoryStore::default());
    let mut editor = editor_at(store.clone(), 9, 30);
    editor.load_for_date(today()).await;

    let elapsed = editor.add_range();
    editor.update_field(elapsed, RangeField::Start, "07:00").unwrap();
    editor.update_field(elapsed, RangeField::End, "08:00").unwrap();
    assert_matches!(editor.save_range(elapsed).await, Err(PortalError::Validation(_)));
    assert!(store.saves().is_empty());

    editor.update_field(elapsed, RangeField::End, "10:00").unwrap();
    let outcome = editor.save_range(elapsed).await.unwrap();
    assert!(outcome.partial_today);
}

#[tokio::test]
async fn test_save_all_today_excludes_elapsed_ranges() {
    let store = Arc::new(InMemoryStore::default());
    let mut editor = editor_at(store.clone(), 14, 30);
    editor.load_for_date(today()).await;

    let morning = editor.apply_preset(Preset::Morning).unwrap();
    let afternoon = editor.add_range();
    editor.update_field(afternoon, RangeField::Start, "14:00").unwrap();
    editor.update_field(afternoon, RangeField::End, "16:00").unwrap();
    let evening = editor.add_range();
    editor.update_field(evening, RangeField::Start, "18:00").unwrap();
    editor.update_field(evening, RangeField::End, "19:00").unwrap();

    let outcome = editor.save_all().await.unwrap();

    assert_eq!(outcome.persisted, 2);
    assert!(outcome.partial_today);
    assert_eq!(
        store.saves(),
        vec![(today(), vec![range("14:00", "16:00"), range("18:00", "19:00")])]
    );
    assert!(editor.range(morning).is_none());
    assert!(editor.ranges().iter().all(|entry| entry.status == RangeStatus::Submitted));
}

#[tokio::test]
async fn test_save_all_today_rejects_when_everything_elapsed() {
    let store = Arc::new(InMemoryStore::default());
    let mut editor = editor_at(store.clone(), 18, 0);
    editor.load_for_date(today()).await;
    editor.apply_preset(Preset::Fullday).unwrap();

    let result = editor.save_all().await;

    assert_matches!(result, Err(PortalError::Validation(msg)) if msg.contains("already passed"));
    assert!(store.saves().is_empty());
    assert_eq!(editor.ranges().len(), 1);
    assert_eq!(editor.ranges()[0].status, RangeStatus::New);
}

#[tokio::test]
async fn test_save_all_rejects_past_dates_locally() {
    let store = Arc::new(InMemoryStore::default());
    let mut editor = editor_at(store.clone(), 8, 0);
    editor.load_for_date(days_from_today(-1)).await;
    editor.add_range();

    let result = editor.save_all().await;

    assert_matches!(result, Err(PortalError::PastDate(date)) if date == days_from_today(-1));
    assert!(store.saves().is_empty());
}

#[tokio::test]
async fn test_save_all_requires_ranges_and_no_duplicates() {
    let store = Arc::new(InMemoryStore::default());
    let mut editor = editor_at(store.clone(), 8, 0);
    editor.load_for_date(days_from_today(1)).await;

    assert_matches!(editor.save_all().await, Err(PortalError::Validation(_)));

    editor.add_range();
    editor.add_range();
    assert_matches!(
        editor.save_all().await,
        Err(PortalError::Validation(msg)) if msg.contains("Duplicate")
    );
    assert!(store.saves().is_empty());
}

#[tokio::test]
async fn test_save_all_store_failure_leaves_state_untouched() {
    let store = Arc::new(InMemoryStore::default());
    let mut editor = editor_at(store.clone(), 8, 0);
    editor.load_for_date(days_from_today(1)).await;
    let id = editor.add_range();
    store.fail_writes(true);

    let result = editor.save_all().await;

    assert_matches!(result, Err(PortalError::StoreRejection(_)));
    assert_eq!(editor.status_of(id), Some(RangeStatus::New));
    let notices = editor.take_notices();
    assert_eq!(notices.last().unwrap().level, NoticeLevel::Error);
}

#[tokio::test]
async fn test_remove_range_persists_remaining_set() {
    let date = days_from_today(1);
    let store = Arc::new(InMemoryStore::seeded(
        date,
        vec![range("09:00", "10:00"), range("11:00", "12:00")],
    ));
    let mut editor = editor_at(store.clone(), 8, 0);
    editor.load_for_date(date).await;
    let first = editor.ranges()[0].id;

    editor.remove_range(first).await.unwrap();

    assert_eq!(store.stored(date), vec![range("11:00", "12:00")]);
    assert_eq!(editor.ranges().len(), 1);
    assert!(editor.range(first).is_none());
}

#[tokio::test]
async fn test_remove_range_failure_restores_prior_state_exactly() {
    let date = days_from_today(1);
    let store = Arc::new(InMemoryStore::seeded(
        date,
        vec![range("09:00", "10:00"), range("11:00", "12:00")],
    ));
    let mut editor = editor_at(store.clone(), 8, 0);
    editor.load_for_date(date).await;
    let second = editor.ranges()[1].id;
    editor.toggle_edit(second).await.unwrap();
    editor.update_field(second, RangeField::End, "12:30").unwrap();
    let fresh = editor.add_range();
    let before = editor.ranges().to_vec();

    store.fail_writes(true);
    let first = editor.ranges()[0].id;
    let result = editor.remove_range(first).await;

    assert_matches!(result, Err(PortalError::StoreRejection(_)));
    assert_eq!(editor.ranges(), before.as_slice());
    assert_eq!(editor.editing_id(), Some(second));
    assert_eq!(editor.status_of(fresh), Some(RangeStatus::New));
}

#[tokio::test]
async fn test_apply_preset_target_priority() {
    let date = days_from_today(1);
    let store = Arc::new(InMemoryStore::seeded(date, vec![range("09:00", "10:00")]));
    let mut editor = editor_at(store, 8, 0);

    // Empty set: a range is created.
    let created = editor.apply_preset(Preset::Afternoon).unwrap();
    assert_eq!(editor.range(created).unwrap().range, range("13:00", "17:00"));
    assert_eq!(editor.status_of(created), Some(RangeStatus::New));

    // All submitted, nothing editing: rejected.
    editor.load_for_date(date).await;
    let submitted = editor.ranges()[0].id;
    assert_matches!(editor.apply_preset(Preset::Morning), Err(PortalError::Validation(_)));

    // Most recently added new range wins over older new ones.
    let older = editor.add_range();
    let newer = editor.add_range();
    assert_eq!(editor.apply_preset(Preset::Morning).unwrap(), newer);
    assert_eq!(editor.range(newer).unwrap().range, range("09:00", "12:00"));
    assert_eq!(editor.range(older).unwrap().range, range("09:00", "10:00"));

    // The range being edited wins over new ones.
    editor.toggle_edit(submitted).await.unwrap();
    assert_eq!(editor.apply_preset(Preset::Fullday).unwrap(), submitted);
    assert_eq!(editor.range(submitted).unwrap().range, range("09:00", "17:00"));
    assert_eq!(editor.range(newer).unwrap().range, range("09:00", "12:00"));
}

#[tokio::test]
async fn test_apply_bulk_targets_following_days() {
    let store = Arc::new(InMemoryStore::default());
    let mut editor = editor_at(store.clone(), 8, 0);
    editor.load_for_date(today()).await;
    editor.apply_preset(Preset::Morning).unwrap();

    let outcome = editor.apply_bulk(5).await.unwrap();

    let expected: Vec<_> = (1..=5).map(days_from_today).collect();
    assert_eq!(outcome.dates, expected);
    assert_eq!(outcome.updated, 5);
    assert_eq!(store.bulk_calls(), vec![(expected, vec![range("09:00", "12:00")])]);
    assert_eq!(store.stored(days_from_today(5)), vec![range("09:00", "12:00")]);
}

#[tokio::test]
async fn test_apply_bulk_skips_dates_before_today() {
    let store = Arc::new(InMemoryStore::default());
    let mut editor = editor_at(store, 8, 0);
    editor.load_for_date(days_from_today(-3)).await;
    editor.add_range();

    let outcome = editor.apply_bulk(5).await.unwrap();

    assert_eq!(outcome.dates, vec![today(), days_from_today(1), days_from_today(2)]);
}

#[tokio::test]
async fn test_apply_bulk_rejects_when_no_dates_remain() {
    let store = Arc::new(InMemoryStore::default());
    let mut editor = editor_at(store.clone(), 8, 0);
    editor.load_for_date(today()).await;
    editor.add_range();

    assert_matches!(editor.apply_bulk(0).await, Err(PortalError::Validation(_)));

    editor.load_for_date(days_from_today(-10)).await;
    editor.add_range();
    assert_matches!(editor.apply_bulk(3).await, Err(PortalError::Validation(_)));

    assert!(store.bulk_calls().is_empty());
}

#[tokio::test]
async fn test_apply_bulk_validates_like_save_all() {
    let store = Arc::new(InMemoryStore::default());
    let mut editor = editor_at(store.clone(), 8, 0);
    editor.load_for_date(today()).await;

    assert_matches!(editor.apply_bulk(3).await, Err(PortalError::Validation(_)));

    let id = editor.add_range();
    editor.update_field(id, RangeField::End, "08:00").unwrap();
    assert_matches!(
        editor.apply_bulk(3).await,
        Err(PortalError::Validation(msg)) if msg.starts_with("Slot 1")
    );
    assert!(store.bulk_calls().is_empty());
}

#[tokio::test]
async fn test_clear_all_empties_store_and_state() {
    let date = days_from_today(1);
    let store = Arc::new(InMemoryStore::seeded(date, vec![range("09:00", "10:00")]));
    let mut editor = editor_at(store.clone(), 8, 0);
    editor.load_for_date(date).await;
    let id = editor.ranges()[0].id;
    editor.toggle_edit(id).await.unwrap();

    editor.clear_all().await.unwrap();

    assert!(editor.ranges().is_empty());
    assert!(editor.editing_id().is_none());
    assert!(store.stored(date).is_empty());
}

#[tokio::test]
async fn test_clear_all_rejects_past_date() {
    let store = Arc::new(InMemoryStore::default());
    let mut editor = editor_at(store.clone(), 8, 0);
    editor.load_for_date(days_from_today(-1)).await;

    assert_matches!(editor.clear_all().await, Err(PortalError::PastDate(_)));
    assert!(store.saves().is_empty());
}

#[tokio::test]
async fn test_preview_slots_uses_saved_ranges_and_current_time() {
    let store = Arc::new(InMemoryStore::seeded(
        today(),
        vec![range("09:00", "11:00"), range("13:00", "14:00")],
    ));
    let mut editor = editor_at(store, 10, 0);
    editor.load_for_date(today()).await;
    editor.add_range();

    assert_eq!(editor.preview_slots(30), vec!["10:30", "13:00", "13:30"]);
}
