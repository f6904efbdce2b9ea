//! End-to-end render cycles between a server session and a client mirror.

use std::sync::{Arc, Mutex};

use rwt_client::ClientMirror;
use rwt_server::{
    ClientMessage, EventType, MenuItemStyle, MenuStyle, ObjectId, Operation, Properties, PropertyValue, SessionStore,
    ShellStyle, SyncConfig, SyncError, UiSession, WidgetKey,
};
use rwt_shared::OperationKind;

struct MenuFixture {
    session: UiSession,
    shell: WidgetKey,
    menu: WidgetKey,
    item: WidgetKey,
}

fn menu_fixture(style: MenuItemStyle) -> MenuFixture {
    let mut session = UiSession::new("test", SyncConfig::default()).unwrap();
    let tree = session.widgets_mut();
    let shell = tree.create_shell(&[ShellStyle::Title]);
    tree.open_shell(shell).unwrap();
    let menu = tree.create_menu(shell, MenuStyle::Bar).unwrap();
    let item = tree.create_menu_item(menu, style).unwrap();
    MenuFixture {
        session,
        shell,
        menu,
        item,
    }
}

fn text_of<'a>(mirror: &'a ClientMirror, id: &ObjectId) -> &'a str {
    mirror
        .property(id, "text")
        .and_then(PropertyValue::as_str)
        .unwrap_or("")
}

fn flag_of(mirror: &ClientMirror, id: &ObjectId, name: &str, default: bool) -> bool {
    mirror
        .property(id, name)
        .and_then(PropertyValue::as_bool)
        .unwrap_or(default)
}

/// Every live widget is mirrored with the values the server holds
fn assert_converged(session: &UiSession, mirror: &ClientMirror) {
    let tree = session.widgets();
    let live = tree.live_keys();
    assert_eq!(mirror.len(), live.len());
    for key in live {
        let id = tree.id(key).expect("rendered widget has an id");
        assert!(mirror.contains(id), "{} missing on the client", id);
        assert_eq!(tree.find_by_id(id), Some(key));
        let mut children: Vec<WidgetKey> = mirror
            .children(id)
            .iter()
            .filter_map(|child| tree.find_by_id(child))
            .collect();
        children.sort();
        let mut expected = tree.children(key).to_vec();
        expected.sort();
        assert_eq!(children, expected);
        assert_eq!(flag_of(mirror, id, "enabled", true), tree.is_enabled(key));
        if let Some(text) = tree.text(key) {
            assert_eq!(text_of(mirror, id), text);
        }
        if let Some(item) = tree.menu_item(key) {
            assert_eq!(flag_of(mirror, id, "selection", false), item.selection());
            assert_eq!(mirror.is_listening(id, "Selection"), tree.has_listener(key, EventType::Selection));
        }
        if let Some(shell) = tree.shell(key) {
            assert_eq!(flag_of(mirror, id, "visibility", false), shell.is_visible());
        }
    }
}

#[test]
fn test_enabled_lifecycle_of_one_widget() {
    let MenuFixture {
        mut session, item, ..
    } = menu_fixture(MenuItemStyle::Push);

    let first = session.render().unwrap();
    let id = session.widget_id(item).unwrap();
    assert_eq!(first.count_kind(&id, OperationKind::Create), 1);
    assert_eq!(first.operations_for(&id).len(), 1);
    assert!(first.find_create_property(&id, "enabled").is_none());

    session.widgets_mut().set_enabled(item, false).unwrap();
    let second = session.render().unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(second.count_kind(&id, OperationKind::Set), 1);
    match &second.operations[0] {
        Operation::Set { properties, .. } => {
            assert_eq!(properties.len(), 1);
            assert_eq!(properties.get("enabled"), Some(&PropertyValue::Bool(false)));
        }
        other => panic!("unexpected {:?}", other),
    }

    // enabled now differs from the baseline and a Set is already queued
    session.widgets_mut().set_enabled(item, true).unwrap();
    session
        .protocol_mut()
        .remote_object(&id)
        .unwrap()
        .set("enabled", true)
        .unwrap();
    assert_eq!(session.protocol().writer().len(), 1);
    session.widgets_mut().dispose(item).unwrap();
    let third = session.render().unwrap();
    let for_item = third.operations_for(&id);
    assert_eq!(for_item.len(), 1);
    assert_eq!(for_item[0].kind(), OperationKind::Destroy);
    assert_eq!(third.count_kind(&id, OperationKind::Set), 0);

    assert!(session.render().unwrap().operations_for(&id).is_empty());
}

#[test]
fn test_selection_round_trip_with_client() {
    let MenuFixture {
        mut session, item, ..
    } = menu_fixture(MenuItemStyle::Check);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let observed = Arc::clone(&seen);
    session
        .widgets_mut()
        .add_listener(item, EventType::Selection, move |tree, event| {
            let selection = tree.menu_item(event.widget).map(|item| item.selection());
            observed.lock().unwrap().push(selection);
        })
        .unwrap();

    let mut mirror = ClientMirror::new();
    mirror.apply(&session.render().unwrap()).unwrap();
    let id = session.widget_id(item).unwrap();
    assert!(mirror.is_listening(&id, "Selection"));
    assert_converged(&session, &mirror);

    mirror.user_set(&id, "selection", true).unwrap();
    assert!(mirror.fire(&id, "Selection", Properties::new()).unwrap());
    let response = session.process_message(&mirror.take_message()).unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![Some(true)]);

    mirror.apply(&response).unwrap();
    assert_eq!(mirror.request_counter(), 2);
    assert_converged(&session, &mirror);
}

#[test]
fn test_json_exchange_converges() {
    let MenuFixture {
        mut session,
        shell,
        menu,
        item,
    } = menu_fixture(MenuItemStyle::Cascade);
    let tree = session.widgets_mut();
    tree.set_text(shell, "Editor").unwrap();
    tree.set_text(item, "Recent").unwrap();
    let drop_down = tree.create_menu(shell, MenuStyle::DropDown).unwrap();
    tree.set_item_menu(item, Some(drop_down)).unwrap();
    let entry = tree.create_menu_item(drop_down, MenuItemStyle::Push).unwrap();
    tree.set_text(entry, "notes.txt").unwrap();

    let mut mirror = ClientMirror::new();
    let inbound = mirror.take_message().to_json_string().unwrap();
    mirror.apply_json(&session.process_json(&inbound).unwrap()).unwrap();
    assert_converged(&session, &mirror);

    let item_id = session.widget_id(item).unwrap();
    let drop_down_id = session.widget_id(drop_down).unwrap();
    assert_eq!(
        mirror.property(&item_id, "menu").and_then(PropertyValue::as_object_id),
        Some(drop_down_id)
    );

    let tree = session.widgets_mut();
    tree.set_enabled(menu, false).unwrap();
    tree.dispose(drop_down).unwrap();
    tree.set_text(shell, "Editor - notes.txt").unwrap();
    let inbound = mirror.take_message().to_json_string().unwrap();
    mirror.apply_json(&session.process_json(&inbound).unwrap()).unwrap();
    assert_converged(&session, &mirror);
    assert!(mirror.property(&item_id, "menu").map_or(true, PropertyValue::is_null));
}

#[test]
fn test_stale_ids_are_ignored() {
    let MenuFixture {
        mut session, menu, item, ..
    } = menu_fixture(MenuItemStyle::Push);
    session.render().unwrap();
    let item_id = session.widget_id(item).unwrap();
    session.widgets_mut().dispose(menu).unwrap();
    session.render().unwrap();

    let late = ClientMessage::new(session.request_counter())
        .with_set(item_id.clone(), Properties::new().with("selection", true))
        .with_notify(item_id, "Selection", Properties::new())
        .with_notify("w99", "Selection", Properties::new());
    let response = session.process_message(&late).unwrap();
    assert!(response.is_empty());
}

#[test]
fn test_retried_cycle_matches_clean_cycle() {
    let mut failed = menu_fixture(MenuItemStyle::Radio);
    let mut clean = menu_fixture(MenuItemStyle::Radio);
    for fixture in [&mut failed, &mut clean] {
        fixture.session.render().unwrap();
        let tree = fixture.session.widgets_mut();
        tree.set_text(fixture.item, "Large").unwrap();
        tree.set_custom_variant(fixture.menu, Some("compact")).unwrap();
    }

    let item_id = failed.session.widget_id(failed.item).unwrap();
    let bad = ClientMessage::new(1).with_set(item_id, Properties::new().with("selection", 7));
    assert!(matches!(
        failed.session.process_message(&bad),
        Err(SyncError::Handler { .. })
    ));

    let retried = failed.session.render().unwrap();
    let expected = clean.session.render().unwrap();
    assert_eq!(retried, expected);
    assert_eq!(retried.len(), 2);
}

#[test]
fn test_closing_a_shell_destroys_its_tree() {
    let MenuFixture {
        mut session,
        shell,
        menu,
        item,
    } = menu_fixture(MenuItemStyle::Push);
    let mut mirror = ClientMirror::new();
    mirror.apply(&session.render().unwrap()).unwrap();
    let shell_id = session.widget_id(shell).unwrap();
    let ids: Vec<ObjectId> = [item, menu, shell]
        .into_iter()
        .map(|key| session.widget_id(key).unwrap())
        .collect();

    let close = ClientMessage::new(1).with_notify(shell_id, "Close", Properties::new());
    let response = session.process_message(&close).unwrap();
    let destroyed: Vec<&ObjectId> = response
        .operations
        .iter()
        .filter(|operation| operation.kind() == OperationKind::Destroy)
        .map(Operation::target)
        .collect();
    assert_eq!(destroyed, ids.iter().collect::<Vec<_>>());

    mirror.apply(&response).unwrap();
    assert!(mirror.is_empty());
}

#[test]
fn test_modal_shell_blocks_other_shells() {
    let MenuFixture {
        mut session, item, ..
    } = menu_fixture(MenuItemStyle::Push);
    let fired = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&fired);
    let tree = session.widgets_mut();
    tree.add_listener(item, EventType::Selection, move |_, _| {
        *counter.lock().unwrap() += 1;
    })
    .unwrap();
    let dialog = tree.create_shell(&[ShellStyle::ApplicationModal]);
    tree.open_shell(dialog).unwrap();
    session.render().unwrap();

    let item_id = session.widget_id(item).unwrap();
    let click = ClientMessage::new(1).with_notify(item_id.clone(), "Selection", Properties::new());
    session.process_message(&click).unwrap();
    assert_eq!(*fired.lock().unwrap(), 0);

    session.widgets_mut().dispose(dialog).unwrap();
    session.render().unwrap();
    let click = ClientMessage::new(3).with_notify(item_id, "Selection", Properties::new());
    session.process_message(&click).unwrap();
    assert_eq!(*fired.lock().unwrap(), 1);
}

#[test]
fn test_sessions_render_in_parallel() {
    let store = SessionStore::new(SyncConfig::default()).unwrap();
    let ids: Vec<String> = (0..4).map(|_| store.create_session().unwrap()).collect();

    std::thread::scope(|scope| {
        for (n, id) in ids.iter().enumerate() {
            let store = &store;
            scope.spawn(move || {
                let mut mirror = ClientMirror::new();
                store
                    .with_session(id, |session| {
                        let tree = session.widgets_mut();
                        let shell = tree.create_shell(&[]);
                        tree.set_text(shell, &format!("session {}", n)).unwrap();
                    })
                    .unwrap();
                for _ in 0..=n {
                    let response = store.process_message(id, &mirror.take_message()).unwrap();
                    mirror.apply(&response).unwrap();
                }
                assert_eq!(mirror.len(), 1);
                assert_eq!(mirror.request_counter(), n as u64 + 1);
            });
        }
    });

    for (n, id) in ids.iter().enumerate() {
        let counter = store.with_session(id, |session| session.request_counter()).unwrap();
        assert_eq!(counter, n as u64 + 1);
    }
}
