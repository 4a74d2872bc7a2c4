use rickdex_core::favorites::{FavoritesStore, Mutation, SkipReason, scope_key};
use rickdex_core::kv::{KeyValueStore, MemoryStore, SqliteStore};
use rickdex_core::model::{Gender, Place, Record, RecordId, Status};
use rickdex_core::session::{Identity, Session};
use rickdex_core::view::FavoriteLookup;
use std::cell::RefCell;
use std::rc::Rc;

fn character(id: u32, name: &str) -> Record {
    Record {
        id: RecordId(id),
        name: name.to_string(),
        status: Status::Alive,
        species: "Human".to_string(),
        subtype: String::new(),
        gender: Gender::Male,
        origin: Place::default(),
        last_known_location: Place {
            name: "Earth (C-137)".to_string(),
            reference: String::new(),
        },
        image_ref: String::new(),
        episode_refs: Vec::new(),
        url: String::new(),
        created_at: "2017-11-04T18:48:46.250Z".to_string(),
    }
}

fn ids<K: KeyValueStore>(store: &FavoritesStore<K>) -> Vec<u32> {
    store.entries().iter().map(|e| e.id().0).collect()
}

#[test]
fn switching_identity_swaps_the_working_set() {
    let kv = Rc::new(MemoryStore::new());
    let session = Session::anonymous(Rc::clone(&kv));
    let favorites = Rc::new(FavoritesStore::new(Rc::clone(&kv)));
    let _follow = favorites.follow(session.identities());

    let rick = Identity::new("rick");
    let morty = Identity::new("morty");

    session.login(rick.clone()).expect("login rick");
    assert_eq!(
        favorites.add(&character(1, "Rick Sanchez"), "me").expect("add"),
        Mutation::Applied
    );
    favorites
        .add(&character(2, "Morty Smith"), "")
        .expect("add");
    assert_eq!(ids(&favorites), vec![1, 2]);

    session.login(morty).expect("login morty");
    assert!(favorites.is_empty());
    assert!(!favorites.is_favorite(RecordId(1)));

    session.login(rick).expect("login rick again");
    assert_eq!(ids(&favorites), vec![1, 2]);
    assert_eq!(favorites.favorite_notes(RecordId(1)).as_deref(), Some("me"));
}

#[test]
fn logout_empties_favorites_before_subscribers_run() {
    let kv = Rc::new(MemoryStore::new());
    let session = Session::anonymous(Rc::clone(&kv));
    let favorites = Rc::new(FavoritesStore::new(Rc::clone(&kv)));
    let _follow = favorites.follow(session.identities());

    session.login(Identity::new("summer")).expect("login");
    favorites
        .add(&character(3, "Summer Smith"), "")
        .expect("add");

    // Registered after the store, so it runs once the store has switched.
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let probe = Rc::clone(&favorites);
    let _watch = session.identities().subscribe(move |identity| {
        sink.borrow_mut().push((identity.is_some(), probe.len()));
    });

    session.logout().expect("logout");
    assert_eq!(*seen.borrow(), vec![(true, 1), (false, 0)]);
    assert!(favorites.identity().is_none());

    let skipped = favorites
        .add(&character(4, "Beth Smith"), "")
        .expect("add while logged out");
    assert_eq!(skipped, Mutation::Skipped(SkipReason::NoIdentity));

    // The persisted collection is untouched by logout.
    assert!(
        kv.get(&scope_key(&Identity::new("summer")))
            .expect("get")
            .is_some()
    );
}

#[test]
fn identity_change_during_delivery_leaves_store_on_latest() {
    let kv = Rc::new(MemoryStore::new());
    let session = Rc::new(Session::anonymous(Rc::clone(&kv)));
    let favorites = Rc::new(FavoritesStore::new(Rc::clone(&kv)));
    let _follow = favorites.follow(session.identities());

    session.login(Identity::new("rick")).expect("login rick");
    favorites
        .add(&character(1, "Rick Sanchez"), "")
        .expect("add");
    session.logout().expect("logout");

    // Hands the session to morty as soon as rick is announced.
    let handoff = Rc::downgrade(&session);
    let _handoff = session.identities().subscribe(move |identity| {
        if identity.as_ref().is_some_and(|i| i.uid == "rick") {
            if let Some(session) = handoff.upgrade() {
                session.login(Identity::new("morty")).expect("login morty");
            }
        }
    });

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let watcher = Rc::clone(&favorites);
    let _watch = session.identities().subscribe(move |identity| {
        sink.borrow_mut().push((
            identity.as_ref().map(|i| i.uid.clone()),
            watcher.identity().map(|i| i.uid),
            watcher.len(),
        ));
    });

    session.login(Identity::new("rick")).expect("login rick again");

    assert_eq!(session.current().map(|i| i.uid).as_deref(), Some("morty"));
    assert_eq!(favorites.identity().map(|i| i.uid).as_deref(), Some("morty"));
    assert!(favorites.is_empty());
    assert!(!favorites.is_favorite(RecordId(1)));

    let seen = seen.borrow();
    for (announced, loaded, _) in seen.iter() {
        assert_eq!(announced, loaded, "store lagged the announced identity");
    }
    assert_eq!(
        seen.last(),
        Some(&(Some("morty".to_string()), Some("morty".to_string()), 0))
    );
}

#[test]
fn favorites_and_session_survive_reopening_sqlite() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("store.sqlite3");

    {
        let kv = Rc::new(SqliteStore::open(&path).expect("open"));
        let session = Session::restore(Rc::clone(&kv));
        let favorites = Rc::new(FavoritesStore::new(Rc::clone(&kv)));
        let _follow = favorites.follow(session.identities());
        session
            .login(Identity::new("jerry").with_email("jerry@earth.test"))
            .expect("login");
        favorites
            .add(&character(5, "Jerry Smith"), "")
            .expect("add");
        favorites
            .update_notes(RecordId(5), "  keep an eye on him ")
            .expect("notes");
    }

    let kv = Rc::new(SqliteStore::open(&path).expect("reopen"));
    let session = Session::restore(Rc::clone(&kv));
    let favorites = Rc::new(FavoritesStore::new(Rc::clone(&kv)));
    let _follow = favorites.follow(session.identities());

    let identity = session.current().expect("restored identity");
    assert_eq!(identity.uid, "jerry");
    assert_eq!(identity.email.as_deref(), Some("jerry@earth.test"));
    let entry = favorites.get(RecordId(5)).expect("restored favorite");
    assert_eq!(entry.record.name, "Jerry Smith");
    assert_eq!(entry.notes, "  keep an eye on him ");
}

#[test]
fn corrupt_blob_loads_as_empty_and_is_replaced_on_write() {
    let kv = Rc::new(MemoryStore::new());
    let squanchy = Identity::new("squanchy");
    kv.set(&scope_key(&squanchy), "{not json").expect("seed");

    let favorites = FavoritesStore::new(Rc::clone(&kv));
    favorites.switch_identity(Some(&squanchy));
    assert!(favorites.is_empty());

    favorites
        .add(&character(6, "Squanchy"), "")
        .expect("add");
    let raw = kv
        .get(&scope_key(&squanchy))
        .expect("get")
        .expect("blob");
    let parsed: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
    assert_eq!(parsed[0]["id"], 6);
    assert!(parsed[0]["addedDate"].is_string());
}

#[test]
fn toggle_and_notes_gating() {
    let kv = Rc::new(MemoryStore::new());
    let favorites = FavoritesStore::new(Rc::clone(&kv));
    favorites.switch_identity(Some(&Identity::new("birdperson")));
    let record = character(7, "Birdperson");

    assert_eq!(favorites.toggle(&record, "wings").expect("on"), Mutation::Applied);
    assert!(favorites.is_favorite(RecordId(7)));
    assert_eq!(
        favorites.update_notes(RecordId(7), "   ").expect("blank"),
        Mutation::Skipped(SkipReason::BlankNotes)
    );
    assert_eq!(
        favorites.update_notes(RecordId(8), "who").expect("absent"),
        Mutation::Skipped(SkipReason::NotFound)
    );
    assert_eq!(favorites.favorite_notes(RecordId(7)).as_deref(), Some("wings"));

    let writes = kv.write_count();
    assert_eq!(favorites.toggle(&record, "").expect("off"), Mutation::Applied);
    assert!(favorites.is_empty());
    assert_eq!(kv.write_count(), writes + 1);
}
