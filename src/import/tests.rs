// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-ContentLoader-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of content-loader and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use rstest::{fixture, rstest};

use super::{AceRequest, ContentCreator, ContentSink, ImportError, ImportSummary, StructuralError};
use crate::listener::{ChangeEvent, RecordingListener};
use crate::model::{NodePath, PropertyInput, PropertyType, PropertyValue, SourceValue, Value};
use crate::policy::ImportPolicy;
use crate::reader::ContentReader;
use crate::store::{
    ContentStore, InMemoryStore, NodeTypeDef, PrincipalKind, PrincipalStore, StoreError,
    JCR_DATA, JCR_LAST_MODIFIED, JCR_MIME_TYPE, JCR_PRIMARY_TYPE, MIX_REFERENCEABLE,
    MIX_VERSIONABLE, NT_UNSTRUCTURED,
};

type Creator<'a> = ContentCreator<'a, InMemoryStore>;

fn path(raw: &str) -> NodePath {
    NodePath::parse(raw).expect("path")
}

fn text(value: &str) -> PropertyValue {
    PropertyValue::Single(Value::String(value.to_owned()))
}

#[fixture]
fn store() -> InMemoryStore {
    let mut store = InMemoryStore::new();
    store.ensure_path(&path("/x")).expect("anchor");
    store
}

/// Runs one pass below `/x` and returns its summary.
fn run<F>(store: &mut InMemoryStore, policy: ImportPolicy, body: F) -> ImportSummary
where
    F: FnOnce(&mut Creator<'_>) -> Result<(), ImportError>,
{
    let mut listener = RecordingListener::new();
    run_recorded(store, policy, &mut listener, body)
}

fn run_recorded<F>(
    store: &mut InMemoryStore,
    policy: ImportPolicy,
    listener: &mut RecordingListener,
    body: F,
) -> ImportSummary
where
    F: FnOnce(&mut Creator<'_>) -> Result<(), ImportError>,
{
    let mut creator = ContentCreator::new(store, policy).with_listener(listener);
    creator.begin(path("/x"), Some("default")).expect("begin");
    body(&mut creator).expect("import");
    creator.end().expect("end")
}

fn node(
    creator: &mut Creator<'_>,
    name: &str,
    properties: &[(&str, &str)],
) -> Result<(), ImportError> {
    creator.enter_node(Some(name), None, &[])?;
    for (key, value) in properties {
        creator.set_property(key, PropertyType::String, (*value).into())?;
    }
    creator.leave_node()
}

fn referenceable(creator: &mut Creator<'_>, name: &str) -> Result<(), ImportError> {
    creator.enter_node(Some(name), None, &[MIX_REFERENCEABLE])?;
    creator.leave_node()
}

#[rstest]
fn imports_basic_content_below_the_anchor(mut store: InMemoryStore) {
    let mut listener = RecordingListener::new();
    let summary = run_recorded(&mut store, ImportPolicy::default(), &mut listener, |c| {
        node(c, "basic-content", &[("foo", "bar")])
    });

    assert_eq!(summary.created_root, Some(path("/x/basic-content")));
    assert_eq!(
        store.property(&path("/x/basic-content"), "foo").expect("property"),
        Some(text("bar"))
    );
    assert_eq!(
        listener.events(),
        [
            ChangeEvent::Create(path("/x/basic-content")),
            ChangeEvent::Create(path("/x/basic-content/foo")),
        ]
    );
}

#[rstest]
fn unnamed_top_level_node_takes_the_default_name(mut store: InMemoryStore) {
    run(&mut store, ImportPolicy::default(), |c| {
        c.enter_node(None, Some(NT_UNSTRUCTURED), &[])?;
        c.leave_node()
    });
    assert!(store.node_exists(&path("/x/default")));
}

#[rstest]
fn unnamed_node_below_the_top_level_is_rejected(mut store: InMemoryStore) {
    let mut creator = ContentCreator::new(&mut store, ImportPolicy::default());
    creator.begin(path("/x"), Some("default")).expect("begin");
    creator.enter_node(Some("a"), None, &[]).expect("enter");

    let err = creator.enter_node(None, None, &[]).expect_err("unnamed child");
    assert_eq!(err, ImportError::Structural(StructuralError::UnnamedNodeBelowRoot { depth: 2 }));
}

#[rstest]
fn balanced_calls_restore_depth_and_extra_leave_underflows(mut store: InMemoryStore) {
    let mut creator = ContentCreator::new(&mut store, ImportPolicy::default());
    assert_eq!(
        creator.leave_node(),
        Err(ImportError::Structural(StructuralError::NotStarted))
    );

    creator.begin(path("/x"), Some("default")).expect("begin");
    for name in ["a", "b", "c"] {
        creator.enter_node(Some(name), None, &[]).expect("enter");
    }
    assert_eq!(creator.depth(), 4);
    assert_eq!(creator.current_node(), Some(&path("/x/a/b/c")));
    for _ in 0..3 {
        creator.leave_node().expect("leave");
    }
    assert_eq!(creator.depth(), 1);
    assert_eq!(
        creator.leave_node(),
        Err(ImportError::Structural(StructuralError::StackUnderflow))
    );
    creator.end().expect("end");
    assert_eq!(
        creator.set_property("late", PropertyType::String, "x".into()),
        Err(ImportError::Structural(StructuralError::NotStarted))
    );
}

#[rstest]
fn begin_requires_an_existing_anchor(mut store: InMemoryStore) {
    let mut creator = ContentCreator::new(&mut store, ImportPolicy::default());
    assert!(matches!(
        creator.begin(path("/missing"), None),
        Err(ImportError::Store(StoreError::ItemNotFound { .. }))
    ));
}

#[rstest]
fn parent_node_import_writes_into_the_anchor(mut store: InMemoryStore) {
    let mut listener = RecordingListener::new();
    let summary = {
        let mut creator =
            ContentCreator::new(&mut store, ImportPolicy::default()).with_listener(&mut listener);
        creator.begin(path("/x"), None).expect("begin");
        creator.enter_node(None, None, &[]).expect("enter anchor");
        assert_eq!(creator.depth(), 2);
        assert_eq!(creator.current_node(), Some(&path("/x")));
        creator.set_property("title", PropertyType::String, "Anchor".into()).expect("title");
        node(&mut creator, "child", &[]).expect("child");
        creator.leave_node().expect("leave anchor");
        creator.end().expect("end")
    };

    assert_eq!(summary.created_root, Some(path("/x/child")));
    assert_eq!(store.property(&path("/x"), "title").expect("title"), Some(text("Anchor")));
    assert!(!listener.events().contains(&ChangeEvent::Create(path("/x"))));
}

#[rstest]
fn reimport_without_overwrite_keeps_existing_values(mut store: InMemoryStore) {
    run(&mut store, ImportPolicy::default(), |c| {
        node(c, "page", &[("title", "first"), ("keep", "me")])
    });
    let identifier = store.identifier(&path("/x/page")).expect("id");

    run(&mut store, ImportPolicy::default(), |c| node(c, "page", &[("title", "second")]));

    let page = path("/x/page");
    assert_eq!(store.identifier(&page).expect("id"), identifier);
    assert_eq!(store.property(&page, "title").expect("title"), Some(text("first")));
    assert_eq!(store.property(&page, "keep").expect("keep"), Some(text("me")));
}

#[rstest]
fn property_overwrite_rewrites_existing_values(mut store: InMemoryStore) {
    run(&mut store, ImportPolicy::default(), |c| node(c, "page", &[("title", "first")]));

    let mut listener = RecordingListener::new();
    let policy = ImportPolicy::default().with_property_overwrite(true);
    run_recorded(&mut store, policy, &mut listener, |c| node(c, "page", &[("title", "second")]));

    assert_eq!(store.property(&path("/x/page"), "title").expect("title"), Some(text("second")));
    assert_eq!(listener.events(), [ChangeEvent::Modify(path("/x/page/title"))]);
}

#[rstest]
fn overwrite_replaces_the_existing_node(mut store: InMemoryStore) {
    run(&mut store, ImportPolicy::default(), |c| {
        c.enter_node(Some("page"), None, &[])?;
        node(c, "old", &[])?;
        c.leave_node()
    });
    let before = store.identifier(&path("/x/page")).expect("id");

    let mut listener = RecordingListener::new();
    let policy = ImportPolicy::default().with_overwrite(true);
    run_recorded(&mut store, policy, &mut listener, |c| node(c, "page", &[]));

    assert_ne!(store.identifier(&path("/x/page")).expect("id"), before);
    assert!(!store.node_exists(&path("/x/page/old")));
    assert_eq!(listener.events(), [ChangeEvent::Create(path("/x/page"))]);
}

#[rstest]
fn ignore_overwrite_flag_suspends_node_overwrite(mut store: InMemoryStore) {
    run(&mut store, ImportPolicy::default(), |c| {
        c.enter_node(Some("page"), None, &[])?;
        node(c, "old", &[])?;
        c.leave_node()
    });

    let mut creator = ContentCreator::new(&mut store, ImportPolicy::default().with_overwrite(true));
    creator.set_ignore_overwrite_flag(true);
    creator.begin(path("/x"), Some("default")).expect("begin");
    node(&mut creator, "page", &[]).expect("page");
    creator.end().expect("end");
    drop(creator);

    assert!(store.node_exists(&path("/x/page/old")));
}

#[rstest]
fn mixins_are_added_once(mut store: InMemoryStore) {
    run(&mut store, ImportPolicy::default(), |c| {
        c.enter_node(Some("a"), None, &["mix:title"])?;
        c.leave_node()?;
        c.enter_node(Some("a"), None, &["mix:title", MIX_REFERENCEABLE])?;
        c.leave_node()
    });
    let a = path("/x/a");
    assert!(store.is_node_type(&a, "mix:title").expect("title"));
    assert!(store.is_node_type(&a, MIX_REFERENCEABLE).expect("referenceable"));
}

#[rstest]
fn lexical_values_are_typed(mut store: InMemoryStore) {
    run(&mut store, ImportPolicy::default(), |c| {
        c.enter_node(Some("typed"), None, &[])?;
        c.set_property("count", PropertyType::Long, "42".into())?;
        c.set_property("flag", PropertyType::Boolean, "TRUE".into())?;
        c.set_property("when", PropertyType::Date, "2024-03-01T10:00:00.000+01:00".into())?;
        c.set_property("tags", PropertyType::String, vec!["a", "b"].into())?;
        c.leave_node()
    });

    let typed = path("/x/typed");
    assert_eq!(store.property(&typed, "count").expect("count"), Some(Value::Long(42).into()));
    assert_eq!(store.property(&typed, "flag").expect("flag"), Some(Value::Boolean(true).into()));
    let when = store.property(&typed, "when").expect("when").expect("date");
    assert_eq!(
        when.single().and_then(Value::as_date).map(|date| date.timestamp()),
        Some(1_709_283_600)
    );
    assert_eq!(
        store.property(&typed, "tags").expect("tags"),
        Some(PropertyValue::Multi(vec![Value::String("a".into()), Value::String("b".into())]))
    );
}

#[rstest]
fn malformed_lexical_value_is_a_store_error(mut store: InMemoryStore) {
    let mut creator = ContentCreator::new(&mut store, ImportPolicy::default());
    creator.begin(path("/x"), Some("default")).expect("begin");
    creator.enter_node(Some("typed"), None, &[]).expect("enter");
    let err = creator
        .set_property("count", PropertyType::Long, "many".into())
        .expect_err("not a long");
    assert!(matches!(err, ImportError::Store(StoreError::ValueFormat { .. })));
}

#[rstest]
fn forward_reference_resolves_when_the_target_is_left(mut store: InMemoryStore) {
    let mut listener = RecordingListener::new();
    let summary = run_recorded(&mut store, ImportPolicy::default(), &mut listener, |c| {
        c.enter_node(Some("a"), None, &[])?;
        c.set_property("ref", PropertyType::Reference, "/x/later".into())?;
        c.leave_node()?;
        referenceable(c, "later")
    });

    let target = store.identifier(&path("/x/later")).expect("id");
    assert_eq!(
        store.property(&path("/x/a"), "ref").expect("ref"),
        Some(Value::Reference(target).into())
    );
    assert!(summary.unresolved_references.is_empty());
    assert_eq!(listener.events().last(), Some(&ChangeEvent::Create(path("/x/a/ref"))));
}

#[rstest]
#[case::target_first(true)]
#[case::source_first(false)]
fn reference_resolution_does_not_depend_on_order(
    mut store: InMemoryStore,
    #[case] target_first: bool,
) {
    run(&mut store, ImportPolicy::default(), |c| {
        if target_first {
            referenceable(c, "b")?;
        }
        c.enter_node(Some("a"), None, &[])?;
        c.set_property("ref", PropertyType::Reference, "../b".into())?;
        c.leave_node()?;
        if !target_first {
            referenceable(c, "b")?;
        }
        Ok(())
    });

    let target = store.identifier(&path("/x/b")).expect("id");
    assert_eq!(
        store.property(&path("/x/a"), "ref").expect("ref"),
        Some(Value::Reference(target).into())
    );
}

#[rstest]
fn references_to_unreferenceable_or_missing_nodes_stay_unresolved(mut store: InMemoryStore) {
    let summary = run(&mut store, ImportPolicy::default(), |c| {
        c.enter_node(Some("a"), None, &[])?;
        c.set_property("plain", PropertyType::Reference, "/x/plain".into())?;
        c.set_property("ghost", PropertyType::Reference, "/x/ghost".into())?;
        c.leave_node()?;
        node(c, "plain", &[])
    });

    assert_eq!(store.property(&path("/x/a"), "plain").expect("plain"), None);
    let targets = summary
        .unresolved_references
        .iter()
        .map(|reference| (reference.target.as_str(), reference.property.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(targets, [("/x/ghost", "/x/a/ghost"), ("/x/plain", "/x/a/plain")]);
}

#[rstest]
fn malformed_reference_values_are_reported_instead_of_failing(mut store: InMemoryStore) {
    let summary = run(&mut store, ImportPolicy::default(), |c| {
        referenceable(c, "t")?;
        c.enter_node(Some("a"), None, &[])?;
        c.set_property("one", PropertyType::Reference, "later/".into())?;
        c.set_property("many", PropertyType::Reference, vec!["/x/t", "../../../up"].into())?;
        c.leave_node()
    });

    let a = path("/x/a");
    let t = store.identifier(&path("/x/t")).expect("t id");
    assert_eq!(store.property(&a, "one").expect("one"), None);
    assert_eq!(
        store.property(&a, "many").expect("many"),
        Some(PropertyValue::Multi(vec![Value::Reference(t)]))
    );
    let targets = summary
        .unresolved_references
        .iter()
        .map(|reference| (reference.target.as_str(), reference.property.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(targets, [("../../../up", "/x/a/many"), ("later/", "/x/a/one")]);
}

#[rstest]
fn multi_valued_references_fill_in_as_targets_arrive(mut store: InMemoryStore) {
    let mut creator = ContentCreator::new(&mut store, ImportPolicy::default());
    creator.begin(path("/x"), Some("default")).expect("begin");
    referenceable(&mut creator, "b").expect("b");
    creator.enter_node(Some("a"), None, &[]).expect("a");
    creator
        .set_property("refs", PropertyType::Reference, vec!["/x/b", "./c", "/x/d"].into())
        .expect("refs");
    creator.leave_node().expect("leave a");

    let b = creator.session().identifier(&path("/x/b")).expect("b id");
    assert_eq!(
        creator.session().property(&path("/x/a"), "refs").expect("refs"),
        Some(PropertyValue::Multi(vec![
            Value::Reference(b.clone()),
            Value::Path("/x/a/c".into()),
            Value::Path("/x/d".into()),
        ]))
    );

    referenceable(&mut creator, "d").expect("d");
    creator.enter_node(Some("a"), None, &[]).expect("a again");
    referenceable(&mut creator, "c").expect("c");
    creator.leave_node().expect("leave a again");

    let c = creator.session().identifier(&path("/x/a/c")).expect("c id");
    let d = creator.session().identifier(&path("/x/d")).expect("d id");
    assert_eq!(
        creator.session().property(&path("/x/a"), "refs").expect("refs"),
        Some(PropertyValue::Multi(vec![
            Value::Reference(b),
            Value::Reference(c),
            Value::Reference(d),
        ]))
    );
    let summary = creator.end().expect("end");
    assert!(summary.unresolved_references.is_empty());
}

#[rstest]
#[case::checkin_policy(true)]
#[case::marker_only(false)]
fn node_imported_as_checked_in_is_checked_in_at_the_end(
    mut store: InMemoryStore,
    #[case] checkin: bool,
) {
    let policy = ImportPolicy::default().with_auto_checkout(true).with_checkin(checkin);
    let summary = run(&mut store, policy, |c| {
        c.enter_node(Some("v"), None, &[MIX_VERSIONABLE])?;
        c.set_property("jcr:isCheckedOut", PropertyType::Boolean, "false".into())?;
        c.set_property("title", PropertyType::String, "Versioned".into())?;
        c.leave_node()
    });

    let v = path("/x/v");
    assert_eq!(summary.checked_in, vec![v.clone()]);
    assert!(!store.is_checked_out(&v).expect("state"));
    assert_eq!(store.property(&v, "title").expect("title"), Some(text("Versioned")));
}

#[fixture]
fn checked_in_store(mut store: InMemoryStore) -> InMemoryStore {
    let v = store.add_node(&path("/x"), "v", None).expect("v");
    store.add_mixin(&v, MIX_VERSIONABLE).expect("mixin");
    store.save().expect("save");
    store.checkin(&v).expect("checkin");
    store.save().expect("save");
    store
}

#[rstest]
fn auto_checkout_opens_the_versionable_ancestor(
    #[from(checked_in_store)] mut store: InMemoryStore,
) {
    let mut listener = RecordingListener::new();
    run_recorded(&mut store, ImportPolicy::default(), &mut listener, |c| {
        c.enter_node(Some("v"), None, &[])?;
        node(c, "child", &[("foo", "bar")])?;
        c.leave_node()
    });

    assert_eq!(listener.events()[0], ChangeEvent::Checkout(path("/x/v")));
    assert_eq!(
        listener.events().iter().filter(|e| matches!(e, ChangeEvent::Checkout(_))).count(),
        1
    );
    assert!(store.node_exists(&path("/x/v/child")));
    assert!(store.is_checked_out(&path("/x/v")).expect("state"));
}

#[rstest]
fn writes_below_checked_in_node_fail_without_auto_checkout(
    #[from(checked_in_store)] mut store: InMemoryStore,
) {
    let mut creator =
        ContentCreator::new(&mut store, ImportPolicy::default().with_auto_checkout(false));
    creator.begin(path("/x"), Some("default")).expect("begin");
    creator.enter_node(Some("v"), None, &[]).expect("existing node");
    let err = creator
        .set_property("foo", PropertyType::String, "bar".into())
        .expect_err("checked in");
    assert_eq!(err, ImportError::Store(StoreError::CheckedIn { path: path("/x/v") }));
}

struct UnnamedChildReader;

impl ContentReader for UnnamedChildReader {
    fn parse(&self, _data: &[u8], sink: &mut dyn ContentSink) -> Result<(), ImportError> {
        sink.enter_node(Some("half"), None, &[])?;
        sink.enter_node(None, None, &[])
    }
}

#[rstest]
fn begin_is_rejected_until_the_open_pass_ends_or_aborts(mut store: InMemoryStore) {
    let mut creator = ContentCreator::new(&mut store, ImportPolicy::default());
    creator.begin(path("/x"), Some("default")).expect("begin");
    creator.enter_node(Some("a"), None, &[]).expect("enter");

    assert_eq!(
        creator.begin(path("/x"), None),
        Err(ImportError::Structural(StructuralError::AlreadyStarted))
    );
    assert_eq!(creator.current_node(), Some(&path("/x/a")));

    creator.abort();
    assert_eq!(creator.depth(), 0);
    assert_eq!(creator.end(), Err(ImportError::Structural(StructuralError::NotStarted)));
    creator.begin(path("/x"), Some("default")).expect("begin after abort");
    creator.end().expect("end");
}

#[rstest]
fn failed_read_leaves_the_creator_ready_for_another_pass(mut store: InMemoryStore) {
    let mut creator = ContentCreator::new(&mut store, ImportPolicy::default());
    let err = creator
        .import(path("/x"), Some("default"), &UnnamedChildReader, &[])
        .expect_err("unnamed child");
    assert_eq!(err, ImportError::Structural(StructuralError::UnnamedNodeBelowRoot { depth: 2 }));
    assert_eq!(creator.depth(), 0);

    creator.begin(path("/x"), Some("default")).expect("begin");
    node(&mut creator, "b", &[]).expect("b");
    let summary = creator.end().expect("end");
    assert_eq!(summary.created_root, Some(path("/x/b")));
}

fn tree(creator: &mut Creator<'_>, children: &[&str]) -> Result<(), ImportError> {
    creator.enter_node(Some("tree"), None, &[])?;
    for child in children {
        node(creator, child, &[])?;
    }
    creator.leave_node()
}

#[rstest]
#[case::merge(true)]
#[case::no_merge(false)]
fn merge_removes_children_missing_from_the_second_pass(
    mut store: InMemoryStore,
    #[case] merge: bool,
) {
    run(&mut store, ImportPolicy::default(), |c| tree(c, &["a", "b"]));

    let mut listener = RecordingListener::new();
    let policy = ImportPolicy::default().with_merge(merge);
    let summary = run_recorded(&mut store, policy, &mut listener, |c| tree(c, &["a"]));

    assert!(store.node_exists(&path("/x/tree/a")));
    assert_eq!(store.node_exists(&path("/x/tree/b")), !merge);
    assert_eq!(listener.events().contains(&ChangeEvent::Delete(path("/x/tree/b"))), merge);
    assert!(summary.skipped_deletions.is_empty());
}

#[rstest]
fn failed_removal_is_skipped_and_the_pass_continues(mut store: InMemoryStore) {
    run(&mut store, ImportPolicy::default(), |c| tree(c, &["a", "b", "c"]));
    store.lock_node(&path("/x/tree/b"));

    let summary = run(&mut store, ImportPolicy::default().with_merge(true), |c| tree(c, &["a"]));

    assert_eq!(summary.skipped_deletions, vec![path("/x/tree/b")]);
    assert!(store.node_exists(&path("/x/tree/b")));
    assert!(!store.node_exists(&path("/x/tree/c")));
}

#[rstest]
fn property_merge_strips_unasserted_properties_on_leave(mut store: InMemoryStore) {
    store.register_node_type(
        NodeTypeDef::primary("app:page").with_supertype(NT_UNSTRUCTURED).with_mandatory("title"),
    );
    run(&mut store, ImportPolicy::default(), |c| {
        c.enter_node(Some("page"), Some("app:page"), &[])?;
        c.set_property("title", PropertyType::String, "Home".into())?;
        c.set_property("stale", PropertyType::String, "old".into())?;
        c.set_property("kept", PropertyType::String, "yes".into())?;
        c.leave_node()
    });

    let mut creator =
        ContentCreator::new(&mut store, ImportPolicy::default().with_property_merge(true));
    creator.begin(path("/x"), Some("default")).expect("begin");
    creator.enter_node(Some("page"), None, &[]).expect("enter");
    creator.set_property("kept", PropertyType::String, "yes".into()).expect("kept");
    creator.leave_node().expect("leave");

    let page = path("/x/page");
    let names = creator.session().property_names(&page).expect("names");
    assert!(!names.iter().any(|name| name == "stale"));
    assert!(names.iter().any(|name| name == "kept"));
    assert!(names.iter().any(|name| name == "title"));
    assert!(names.iter().any(|name| name == JCR_PRIMARY_TYPE));
    creator.end().expect("end");
}

#[rstest]
fn file_node_gets_content_metadata(mut store: InMemoryStore) {
    let mut creator = ContentCreator::new(&mut store, ImportPolicy::default());
    creator.begin(path("/x"), Some("default")).expect("begin");
    creator.create_file_node("assets/readme.txt", b"hello".to_vec(), None, 1_000).expect("file");
    assert_eq!(creator.current_node(), Some(&path("/x/readme.txt/jcr:content")));
    creator.leave_node().expect("leave content");
    creator.leave_node().expect("leave file");
    creator.create_file_node("blob.bin", Vec::new(), None, 0).expect("blob");
    creator.leave_node().expect("leave content");
    creator.leave_node().expect("leave file");
    creator.end().expect("end");
    drop(creator);

    let content = path("/x/readme.txt/jcr:content");
    assert_eq!(store.primary_type(&path("/x/readme.txt")).expect("type"), "nt:file");
    assert_eq!(store.primary_type(&content).expect("type"), "nt:resource");
    assert_eq!(store.property(&content, JCR_MIME_TYPE).expect("mime"), Some(text("text/plain")));
    assert_eq!(
        store.property(&content, JCR_DATA).expect("data"),
        Some(Value::Binary(b"hello".to_vec()).into())
    );
    let modified = store.property(&content, JCR_LAST_MODIFIED).expect("modified").expect("date");
    assert_eq!(
        modified.single().and_then(Value::as_date).map(|date| date.timestamp_millis()),
        Some(1_000)
    );

    let blob = path("/x/blob.bin/jcr:content");
    assert_eq!(
        store.property(&blob, JCR_MIME_TYPE).expect("mime"),
        Some(text("application/octet-stream"))
    );
    let modified = store.property(&blob, JCR_LAST_MODIFIED).expect("modified").expect("date");
    assert!(modified.single().and_then(Value::as_date).is_some_and(|d| d.timestamp() > 0));
}

#[rstest]
#[case::older(500, b"v1")]
#[case::same(1_000, b"v1")]
#[case::newer(2_000, b"v2")]
fn existing_file_is_only_updated_by_newer_content(
    mut store: InMemoryStore,
    #[case] last_modified: i64,
    #[case] expected: &[u8],
) {
    fn file(creator: &mut Creator<'_>, data: &[u8], modified: i64) -> Result<(), ImportError> {
        creator.create_file_node("f.txt", data.to_vec(), Some("text/plain"), modified)?;
        creator.leave_node()?;
        creator.leave_node()
    }
    run(&mut store, ImportPolicy::default(), |c| file(c, b"v1", 1_000));
    run(&mut store, ImportPolicy::default(), |c| file(c, b"v2", last_modified));

    assert_eq!(
        store.property(&path("/x/f.txt/jcr:content"), JCR_DATA).expect("data"),
        Some(Value::Binary(expected.to_vec()).into())
    );
}

#[rstest]
fn relocate_or_create_path_walks_and_creates(mut store: InMemoryStore) {
    let mut listener = RecordingListener::new();
    {
        let mut creator =
            ContentCreator::new(&mut store, ImportPolicy::default()).with_listener(&mut listener);
        creator.begin(path("/x"), Some("default")).expect("begin");
        assert!(!creator.relocate_or_create_path("a/b", None).expect("missing"));
        assert_eq!(creator.depth(), 1);

        assert!(creator.relocate_or_create_path("/a/b", Some(NT_UNSTRUCTURED)).expect("create"));
        assert_eq!(creator.current_node(), Some(&path("/x/a/b")));
        creator.leave_node().expect("leave");

        assert!(creator.relocate_or_create_path("a", None).expect("existing"));
        assert_eq!(creator.current_node(), Some(&path("/x/a")));
        creator.leave_node().expect("leave");
        creator.end().expect("end");
    }

    assert_eq!(
        listener.events(),
        [ChangeEvent::Create(path("/x/a")), ChangeEvent::Create(path("/x/a/b"))]
    );
}

fn relocate_and_fill(creator: &mut Creator<'_>) -> Result<(), ImportError> {
    creator.relocate_or_create_path("a/b", Some(NT_UNSTRUCTURED))?;
    node(creator, "f", &[])?;
    creator.leave_node()
}

#[rstest]
fn merge_keeps_siblings_along_a_relocated_path(mut store: InMemoryStore) {
    run(&mut store, ImportPolicy::default(), relocate_and_fill);
    store.add_node(&path("/x/a"), "manual", None).expect("manual");
    store.add_node(&path("/x/a/b"), "kept", None).expect("kept");
    store.add_node(&path("/x/a/b/f"), "old", None).expect("old");
    store.save().expect("save");

    run(&mut store, ImportPolicy::default().with_merge(true), relocate_and_fill);

    assert!(store.node_exists(&path("/x/a/manual")));
    assert!(store.node_exists(&path("/x/a/b/kept")));
    assert!(store.node_exists(&path("/x/a/b/f")));
    assert!(!store.node_exists(&path("/x/a/b/f/old")));
}

#[rstest]
fn failed_reorder_of_an_existing_child_is_not_fatal(mut store: InMemoryStore) {
    let v = store.add_node(&path("/x"), "v", None).expect("v");
    store.add_mixin(&v, MIX_VERSIONABLE).expect("mixin");
    store.add_node(&v, "child", None).expect("child");
    store.save().expect("save");
    store.checkin(&v).expect("checkin");
    store.save().expect("save");

    let mut creator =
        ContentCreator::new(&mut store, ImportPolicy::default().with_auto_checkout(false));
    creator.begin(path("/x"), Some("default")).expect("begin");
    creator.enter_node(Some("v"), None, &[]).expect("v");
    creator.enter_node(Some("child"), None, &[]).expect("reorder failure is swallowed");
    assert_eq!(creator.depth(), 3);
    assert_eq!(creator.current_node(), Some(&path("/x/v/child")));
    assert!(!creator.session().is_checked_out(&v).expect("state"));
}

#[rstest]
fn source_values_are_coerced_and_none_removes(mut store: InMemoryStore) {
    run(&mut store, ImportPolicy::default(), |c| {
        c.enter_node(Some("n"), None, &[])?;
        c.set_value("count", Some(SourceValue::Integer(1)))?;
        c.leave_node()
    });

    let mut listener = RecordingListener::new();
    run_recorded(&mut store, ImportPolicy::default(), &mut listener, |c| {
        c.enter_node(Some("n"), None, &[])?;
        c.set_value("count", Some(SourceValue::Integer(2)))?;
        c.set_value("count", None)?;
        c.set_value("ratio", Some(SourceValue::Float(0.5)))?;
        c.set_values("tags", vec!["a".into(), "b".into()])?;
        c.set_value("scratch", Some(true.into()))?;
        c.set_value("scratch", None)?;
        c.leave_node()
    });

    let n = path("/x/n");
    assert_eq!(store.property(&n, "count").expect("count"), Some(Value::Long(1).into()));
    assert_eq!(store.property(&n, "ratio").expect("ratio"), Some(Value::Double(0.5).into()));
    assert_eq!(
        store.property(&n, "tags").expect("tags"),
        Some(PropertyValue::Multi(vec![Value::String("a".into()), Value::String("b".into())]))
    );
    assert_eq!(store.property(&n, "scratch").expect("scratch"), None);
    assert!(listener.events().contains(&ChangeEvent::Delete(path("/x/n/scratch"))));
}

#[rstest]
fn created_nodes_ledger_names_workspace_and_path(mut store: InMemoryStore) {
    let mut creator =
        ContentCreator::new(&mut store, ImportPolicy::default()).with_created_nodes_ledger();
    creator.begin(path("/x"), Some("default")).expect("begin");
    creator.enter_node(Some("a"), None, &[]).expect("a");
    node(&mut creator, "b", &[]).expect("b");
    creator.leave_node().expect("leave");
    creator.end().expect("end");

    assert_eq!(creator.take_created_nodes(), ["default:/x/a", "default:/x/a/b"]);
    assert!(creator.take_created_nodes().is_empty());
}

#[rstest]
fn group_members_include_users_from_the_same_pass(mut store: InMemoryStore) {
    run(&mut store, ImportPolicy::default(), |c| {
        let mut properties = super::PrincipalProperties::new();
        properties.insert("email".to_owned(), "u@example.com".into());
        c.create_user("u", "secret", properties)?;
        c.create_group("g", &["u", "ghost"], Default::default())
    });

    assert_eq!(store.declared_members("g").expect("members"), ["u"]);
    assert!(store.verify_password("u", "secret"));
    assert_eq!(
        store.authorizable_property("u", "email").expect("email"),
        Some(Value::String("u@example.com".into()))
    );
    let home = store.authorizable("g").expect("lookup").expect("group").home;
    assert!(home.as_str().starts_with("/home/groups/"));
    assert_eq!(home.depth(), 6);
}

#[rstest]
fn principal_kind_conflicts_are_rejected(mut store: InMemoryStore) {
    let mut creator = ContentCreator::new(&mut store, ImportPolicy::default());
    creator.begin(path("/x"), Some("default")).expect("begin");
    creator.create_user("u", "secret", Default::default()).expect("user");
    creator.create_user("u", "other", Default::default()).expect("same kind is reused");

    assert_eq!(
        creator.create_group("u", &[], Default::default()),
        Err(ImportError::PrincipalTypeConflict { name: "u".into(), existing: PrincipalKind::User })
    );
}

#[rstest]
fn unknown_hash_algorithm_fails_principal_creation(mut store: InMemoryStore) {
    let policy = ImportPolicy { principal_hash_algorithm: "md5".into(), ..ImportPolicy::default() };
    let mut creator = ContentCreator::new(&mut store, policy);
    creator.begin(path("/x"), Some("default")).expect("begin");
    assert_eq!(
        creator.create_group("g", &[], Default::default()),
        Err(ImportError::HashingUnavailable { algorithm: "md5".into() })
    );
}

#[rstest]
fn ace_for_principal_created_in_the_same_pass(mut store: InMemoryStore) {
    run(&mut store, ImportPolicy::default(), |c| {
        c.create_group("editors", &[], Default::default())?;
        c.create_user("u", "secret", Default::default())?;
        c.create_ace(AceRequest::new("editors").granting(["jcr:read"]))?;
        c.create_ace(
            AceRequest::new("u")
                .granting(["jcr:write"])
                .denying(["jcr:read"])
                .ordered("first"),
        )?;
        c.create_ace(AceRequest::new("u"))
    });

    let entries = store.access_control_entries(&path("/x")).expect("acl");
    let principals = entries.iter().map(|entry| entry.principal.as_str()).collect::<Vec<_>>();
    assert_eq!(principals, ["u", "editors"]);
    assert!(entries[0].granted.contains("jcr:write"));
    assert!(entries[0].denied.contains("jcr:read"));
}

#[rstest]
fn ace_errors(mut store: InMemoryStore) {
    let mut creator = ContentCreator::new(&mut store, ImportPolicy::default());
    creator.begin(path("/x"), Some("default")).expect("begin");
    assert_eq!(
        creator.create_ace(AceRequest::new("nobody").granting(["jcr:read"])),
        Err(ImportError::PrincipalNotFound { principal_id: "nobody".into() })
    );

    creator.create_user("u", "secret", Default::default()).expect("user");
    let err = creator
        .create_ace(AceRequest::new("u").granting(["jcr:read"]).ordered("sideways"))
        .expect_err("bad order");
    assert!(matches!(err, ImportError::Store(StoreError::AccessControl { .. })));
}
