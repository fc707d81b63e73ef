// Tab lifecycle scenarios driven through the Workspace controller
// Covers dirty tracking, temp ids, bulk close with pinned tabs, reorder
// rejection and the empty-workspace state, plus session round trips

use crate::tabs::TabId;
use crate::workspace::Workspace;
use querydeck_utils::data::{Script, ScriptId};
use querydeck_utils::session::SessionSnapshot;

fn script(id: u64, name: &str, query: &str) -> Script {
    Script::placeholder(ScriptId::Persisted(id), name, query)
}

fn titles(workspace: &Workspace) -> Vec<String> {
    workspace.tabs().iter().map(|t| t.title.clone()).collect()
}

/// Workspace with tabs `[P(pinned), A, B, C]`, C active.
fn pinned_fixture() -> (Workspace, TabId) {
    let mut workspace = Workspace::default();
    let p = workspace.open_script(script(1, "P", "SELECT 'p';"));
    workspace.pin_tab(&p);
    let a = workspace.open_script(script(2, "A", "SELECT 'a';"));
    workspace.open_script(script(3, "B", "SELECT 'b';"));
    workspace.open_script(script(4, "C", "SELECT 'c';"));
    (workspace, a)
}

#[test]
fn test_edit_then_restore_keeps_unsaved_change() {
    let mut workspace = Workspace::default();
    let id = workspace.open_script(script(5, "users", "SELECT 1;"));
    workspace.handle_editor_change("SELECT 2;");
    assert!(workspace.tab(&id).unwrap().is_dirty);

    let snapshot = workspace.snapshot();
    assert_eq!(snapshot.unsaved_change(5), Some("SELECT 2;"));
    assert_eq!(snapshot.unsaved_changes.len(), 1);

    let mut fresh = Workspace::default();
    fresh.set_scripts(vec![script(5, "users", "SELECT 1;")]);
    assert!(fresh.restore_session(&snapshot));

    let tab = fresh.tab(&id).unwrap();
    assert!(tab.is_dirty);
    assert_eq!(tab.as_script().unwrap().content, "SELECT 2;");
    assert_eq!(fresh.live_buffer(), "SELECT 2;");
}

#[test]
fn test_new_scripts_get_decreasing_temp_ids() {
    let mut workspace = Workspace::default();
    let first = workspace.create_new_script();
    workspace.handle_editor_change("SELECT 'first';");
    let second = workspace.create_new_script();
    workspace.handle_editor_change("SELECT 'second';");

    assert_eq!(first, TabId::for_script(ScriptId::Temporary(-1)));
    assert_eq!(second, TabId::for_script(ScriptId::Temporary(-2)));

    let snapshot = workspace.snapshot();
    let temps: Vec<(i64, &str)> = snapshot
        .temp_scripts
        .iter()
        .map(|t| (t.id, t.content.as_str()))
        .collect();
    assert_eq!(temps, vec![(-1, "SELECT 'first';"), (-2, "SELECT 'second';")]);
    assert!(snapshot.next_temp_id.unwrap() <= -3);
}

#[test]
fn test_close_to_right_spares_pinned() {
    let (mut workspace, a) = pinned_fixture();

    assert_eq!(workspace.close_tabs_to_right(&a), 2);
    assert_eq!(titles(&workspace), vec!["P", "A"]);
    // C was active and is gone; focus lands on the last survivor.
    assert_eq!(workspace.active_tab_id(), Some(&a));
    assert_eq!(workspace.live_buffer(), "SELECT 'a';");
}

#[test]
fn test_close_to_left_spares_pinned() {
    let (mut workspace, _) = pinned_fixture();
    let b = TabId::for_script(ScriptId::Persisted(3));

    assert_eq!(workspace.close_tabs_to_left(&b), 1);
    assert_eq!(titles(&workspace), vec!["P", "B", "C"]);
}

#[test]
fn test_close_others_spares_pinned() {
    let (mut workspace, a) = pinned_fixture();

    assert_eq!(workspace.close_other_tabs(&a), 2);
    assert_eq!(titles(&workspace), vec!["P", "A"]);
}

#[test]
fn test_reorder_unpinned_before_pinned_is_rejected() {
    let (mut workspace, _) = pinned_fixture();
    let before = titles(&workspace);

    assert!(!workspace.reorder_tabs(2, 0));
    assert_eq!(titles(&workspace), before);

    assert!(workspace.reorder_tabs(3, 1));
    assert_eq!(titles(&workspace), vec!["P", "C", "A", "B"]);
}

#[test]
fn test_unpin_moves_to_front_of_unpinned() {
    let (mut workspace, _) = pinned_fixture();
    let b = TabId::for_script(ScriptId::Persisted(3));
    workspace.pin_tab(&b);
    assert_eq!(titles(&workspace), vec!["P", "B", "A", "C"]);

    let p = TabId::for_script(ScriptId::Persisted(1));
    workspace.unpin_tab(&p);
    assert_eq!(titles(&workspace), vec!["B", "P", "A", "C"]);
    assert!(workspace.registry().pinned_form_prefix());
}

#[test]
fn test_closing_only_tab_empties_workspace() {
    let mut workspace = Workspace::default();
    let id = workspace.open_script(script(5, "users", "SELECT 1;"));
    workspace.handle_editor_change("SELECT 2;");

    assert!(workspace.close_tab(&id));
    assert_eq!(workspace.active_tab_id(), None);
    assert_eq!(workspace.live_buffer(), "");
    assert!(workspace.active_tab().is_none());
}

#[test]
fn test_close_all_without_pins_clears_selection() {
    let mut workspace = Workspace::default();
    workspace.open_script(script(1, "a", "SELECT 1;"));
    workspace.open_table_view("users", "public", "pg");

    assert_eq!(workspace.close_all_tabs(), 2);
    assert_eq!(workspace.active_tab_id(), None);
    assert_eq!(workspace.live_buffer(), "");
}

#[test]
fn test_switching_tabs_hands_over_buffer() {
    let mut workspace = Workspace::default();
    let a = workspace.open_script(script(1, "a", "SELECT 'a';"));
    let b = workspace.open_script(script(2, "b", "SELECT 'b';"));
    workspace.handle_editor_change("SELECT 'b2';");

    assert!(workspace.switch_to_tab(&a));
    assert_eq!(workspace.live_buffer(), "SELECT 'a';");
    assert_eq!(workspace.tab(&b).unwrap().as_script().unwrap().content, "SELECT 'b2';");

    assert!(workspace.switch_to_tab(&b));
    assert_eq!(workspace.live_buffer(), "SELECT 'b2';");
    assert!(!workspace.switch_to_tab(&TabId::for_script(ScriptId::Persisted(99))));
}

#[test]
fn test_table_view_opens_once() {
    let mut workspace = Workspace::default();
    let first = workspace.open_table_view("users", "public", "pg-local");
    let again = workspace.open_table_view("users", "public", "pg-local");

    assert_eq!(first, again);
    assert_eq!(workspace.tabs().len(), 1);
    assert_eq!(workspace.tabs()[0].title, "public.users");
    assert!(!workspace.tabs()[0].can_rename);
}

#[test]
fn test_round_trip_preserves_tabs_and_active() {
    let mut workspace = Workspace::default();
    workspace.set_scripts(vec![script(5, "users", "SELECT 1;"), script(6, "orders", "SELECT 6;")]);
    let users = workspace.open_script(script(5, "users", "SELECT 1;"));
    workspace.handle_editor_change("SELECT 2;");
    workspace.open_script(script(6, "orders", "SELECT 6;"));
    workspace.create_new_script();
    workspace.handle_editor_change("SELECT 'draft';");
    workspace.switch_to_tab(&users);

    let snapshot = workspace.snapshot();
    let mut fresh = Workspace::default();
    fresh.set_scripts(vec![script(5, "users", "SELECT 1;"), script(6, "orders", "SELECT 6;")]);
    assert!(fresh.restore_session(&snapshot));

    let ids = |ws: &Workspace| ws.tabs().iter().map(|t| t.id.clone()).collect::<Vec<_>>();
    assert_eq!(ids(&fresh), ids(&workspace));
    assert_eq!(fresh.active_tab_id(), Some(&users));
    for (restored, original) in fresh.tabs().iter().zip(workspace.tabs()) {
        assert_eq!(restored.is_dirty, original.is_dirty);
        assert_eq!(
            restored.as_script().map(|s| s.content.as_str()),
            original.as_script().map(|s| s.content.as_str())
        );
    }

    // The restored temp id must never be handed out again.
    let next = fresh.create_new_script();
    assert_eq!(next, TabId::for_script(ScriptId::Temporary(-2)));
    assert_eq!(fresh.snapshot().next_temp_id, Some(-3));
}

#[test]
fn test_restore_without_active_focuses_last_tab() {
    let mut workspace = Workspace::default();
    workspace.set_scripts(vec![script(5, "users", "SELECT 1;"), script(6, "orders", "SELECT 6;")]);
    let snapshot = SessionSnapshot {
        open_script_ids: vec![ScriptId::Persisted(5), ScriptId::Persisted(6)],
        active_script_id: Some(ScriptId::Persisted(40)),
        ..Default::default()
    };

    assert!(workspace.restore_session(&snapshot));
    assert_eq!(
        workspace.active_tab_id(),
        Some(&TabId::for_script(ScriptId::Persisted(6)))
    );
    assert_eq!(workspace.live_buffer(), "SELECT 6;");
}

#[test]
fn test_mark_saved_after_edit_is_clean() {
    let mut workspace = Workspace::default();
    let id = workspace.create_new_script();
    workspace.handle_editor_change("SELECT 1;");
    assert!(workspace.tab(&id).unwrap().is_dirty);

    workspace.mark_script_saved(ScriptId::Temporary(-1), "SELECT 1;");
    assert!(!workspace.tab(&id).unwrap().is_dirty);
}
