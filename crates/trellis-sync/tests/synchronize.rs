//! End-to-end synchronize and audit runs against real temporary trees with
//! in-memory ACL, identity and ownership handlers.

use assert_matches::assert_matches;
use proptest::prelude::*;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use trellis_core::{
    AclKind, AclTag, ApplyOp, DriftReport, DriftViolation, ExecPolicy, Perms, Principal, Role,
    SyncError,
};
use trellis_sync::Synchronizer;
use trellis_testkit::{MockEffects, MockOp, ProjectFixture};

const USERS: [&str; 5] = ["alice", "bob", "carol", "dave", "erin"];

fn populated() -> ProjectFixture {
    let fixture = ProjectFixture::new("proj").unwrap();
    fixture.mkdir("data/raw").unwrap();
    fixture.write("data/raw/run1.csv", "1,2,3\n").unwrap();
    fixture.write("README", "hello\n").unwrap();
    fixture
}

fn rule(mock: &MockEffects, path: &std::path::Path, kind: AclKind, tag: AclTag) -> Option<Perms> {
    mock.acl(path, kind)?
        .into_iter()
        .find(|e| e.tag == tag)
        .map(|e| e.perms)
}

fn user(name: &str) -> AclTag {
    AclTag::User(Principal::from(name))
}

#[test]
fn concrete_scenario() {
    let fixture = ProjectFixture::new("proj").unwrap();
    let mock = MockEffects::with_users(USERS);
    let assignment = fixture.assignment("alice", &["bob"], &["carol"], false).unwrap();
    let sync = Synchronizer::new(&mock);

    sync.synchronize(&fixture.dir(), &fixture.record(), &assignment)
        .unwrap();

    let dir = fixture.dir();
    for kind in [AclKind::Access, AclKind::Default] {
        assert_eq!(rule(&mock, &dir, kind, user("alice")), Some(Perms::ALL));
        assert_eq!(rule(&mock, &dir, kind, user("bob")), Some(Perms::ALL));
        assert_eq!(rule(&mock, &dir, kind, user("carol")), Some(Perms::READ_EXECUTE));
        assert_eq!(rule(&mock, &dir, kind, AclTag::Other), Some(Perms::NONE));
    }
    assert_eq!(
        sync.audit(&dir, &fixture.record(), &assignment).unwrap(),
        DriftReport::InSync
    );

    // created externally, outside any synchronize run
    let secret = fixture.write("secret", "shh").unwrap();
    assert_eq!(mock.acl(&secret, AclKind::Access), None);

    sync.synchronize(&dir, &fixture.record(), &assignment).unwrap();
    assert_eq!(mock.acl(&secret, AclKind::Access), mock.acl(&dir, AclKind::Access));
    assert_eq!(mock.acl(&secret, AclKind::Default), None);
}

#[test]
fn record_is_owner_only_and_owned() {
    let fixture = populated();
    let mock = MockEffects::with_users(USERS);
    let assignment = fixture.assignment("alice", &["bob"], &["carol"], true).unwrap();

    Synchronizer::new(&mock)
        .synchronize(&fixture.dir(), &fixture.record(), &assignment)
        .unwrap();

    let record = fixture.record();
    assert_eq!(rule(&mock, &record, AclKind::Access, user("alice")), Some(Perms::ALL));
    assert_eq!(rule(&mock, &record, AclKind::Access, user("bob")), None);
    assert_eq!(rule(&mock, &record, AclKind::Access, AclTag::Other), Some(Perms::NONE));
    let alice = mock.identity_of("alice");
    assert_eq!(mock.owner_of(&record), alice);
    assert_eq!(mock.owner_of(&fixture.dir()), alice);
    // ownership is not recursive
    assert_eq!(mock.owner_of(&fixture.path("README")), None);
}

#[test]
fn ownership_precedes_acl_changes() {
    let fixture = populated();
    let mock = MockEffects::with_users(USERS);
    let assignment = fixture.assignment("alice", &[], &[], false).unwrap();

    Synchronizer::new(&mock)
        .synchronize(&fixture.dir(), &fixture.record(), &assignment)
        .unwrap();

    let journal = mock.journal();
    assert_matches!(&journal[..2], [MockOp::SetOwner { .. }, MockOp::SetOwner { .. }]);
    assert!(journal[2..]
        .iter()
        .all(|op| !matches!(op, MockOp::SetOwner { .. })));
    assert_matches!(
        journal.last(),
        Some(MockOp::WriteAcl { kind: AclKind::Access, path }) if *path == fixture.record()
    );
}

#[test]
fn escaping_link_is_left_alone_and_reported_once() {
    let fixture = populated();
    let target = fixture.write_outside("shared/notes.txt", "outside").unwrap();
    let target_dir = target.parent().unwrap().to_path_buf();
    fixture.symlink("data/escape", &target_dir).unwrap();
    let mock = MockEffects::with_users(USERS);
    let assignment = fixture.assignment("alice", &["bob"], &[], false).unwrap();

    let summary = Synchronizer::new(&mock)
        .synchronize(&fixture.dir(), &fixture.record(), &assignment)
        .unwrap();

    assert_eq!(summary.skipped.len(), 1);
    assert_matches!(
        &summary.skipped[0],
        SyncError::Containment { path, resolved, .. }
            if *path == fixture.path("data/escape") && *resolved == target_dir
    );
    assert!(mock
        .journal()
        .iter()
        .all(|op| !op.path().starts_with(fixture.outside())));
    assert_eq!(mock.acl(&target, AclKind::Access), None);
    assert_eq!(mock.acl(&target_dir, AclKind::Access), None);
}

#[test]
fn symlink_root_mutates_nothing() {
    let fixture = populated();
    let alias = fixture.layout().root().join("alias");
    std::os::unix::fs::symlink(fixture.dir(), &alias).unwrap();
    let mock = MockEffects::with_users(USERS);
    let assignment = fixture.assignment("alice", &[], &[], false).unwrap();

    assert_matches!(
        Synchronizer::new(&mock).synchronize(&alias, &fixture.record(), &assignment),
        Err(SyncError::SymlinkRoot { path }) if path == alias
    );
    assert!(mock.journal().is_empty());
}

#[test]
fn symlink_record_mutates_nothing() {
    let fixture = populated();
    let real = fixture.write_outside("record.toml", "").unwrap();
    let record = fixture.layout().root().join(".linked.toml");
    std::os::unix::fs::symlink(&real, &record).unwrap();
    let mock = MockEffects::with_users(USERS);
    let assignment = fixture.assignment("alice", &[], &[], false).unwrap();

    assert_matches!(
        Synchronizer::new(&mock).synchronize(&fixture.dir(), &record, &assignment),
        Err(SyncError::SymlinkRoot { .. })
    );
    assert!(mock.journal().is_empty());
}

#[test]
fn unknown_principal_mutates_nothing() {
    let fixture = populated();
    let mock = MockEffects::with_users(["alice", "bob"]);
    let assignment = fixture.assignment("alice", &["bob"], &["zed"], false).unwrap();

    assert_matches!(
        Synchronizer::new(&mock).synchronize(&fixture.dir(), &fixture.record(), &assignment),
        Err(SyncError::PrincipalResolution { principal }) if principal.as_str() == "zed"
    );
    assert!(mock.journal().is_empty());
}

#[test]
fn refused_root_chown_keeps_root_acl_and_updates_the_rest() {
    let fixture = populated();
    let mock = MockEffects::with_users(USERS);
    let alice = mock.identity_of("alice").unwrap();
    mock.refuse(fixture.dir());
    let assignment = fixture.assignment("alice", &["bob"], &[], false).unwrap();

    let err = Synchronizer::new(&mock)
        .synchronize(&fixture.dir(), &fixture.record(), &assignment)
        .unwrap_err();
    assert_matches!(err, SyncError::Incomplete { ref summary } => {
        // the root's ACL is not attempted, so its chown is the only failure
        assert_matches!(
            summary.failures.as_slice(),
            [SyncError::Apply { operation: ApplyOp::SetOwner, path, .. }]
                if *path == fixture.dir()
        );
        assert_eq!(summary.visited, summary.updated + 1);
    });
    assert_eq!(mock.acl(&fixture.dir(), AclKind::Access), None);
    assert_eq!(mock.owner_of(&fixture.record()), Some(alice));
    let readme = fixture.path("README");
    assert_eq!(rule(&mock, &readme, AclKind::Access, user("bob")), Some(Perms::ALL));
    assert!(mock.acl(&fixture.record(), AclKind::Access).is_some());
}

#[test]
fn refused_record_chown_keeps_record_acl_and_updates_the_tree() {
    let fixture = populated();
    let mock = MockEffects::with_users(USERS);
    let alice = mock.identity_of("alice").unwrap();
    mock.refuse(fixture.record());
    let assignment = fixture.assignment("alice", &["bob"], &[], false).unwrap();

    let err = Synchronizer::new(&mock)
        .synchronize(&fixture.dir(), &fixture.record(), &assignment)
        .unwrap_err();
    assert_matches!(err, SyncError::Incomplete { ref summary } => {
        assert_matches!(
            summary.failures.as_slice(),
            [SyncError::Apply { operation: ApplyOp::SetOwner, path, .. }]
                if *path == fixture.record()
        );
        assert_eq!(summary.visited, summary.updated + 1);
    });
    assert_eq!(mock.owner_of(&fixture.dir()), Some(alice));
    assert_eq!(mock.acl(&fixture.record(), AclKind::Access), None);
    for path in [fixture.dir(), fixture.path("README"), fixture.path("data/raw/run1.csv")] {
        assert_eq!(rule(&mock, &path, AclKind::Access, user("bob")), Some(Perms::ALL));
    }
}

#[test]
fn refused_entry_is_incomplete_but_rest_is_updated() {
    let fixture = populated();
    let mock = MockEffects::with_users(USERS);
    mock.refuse(fixture.path("data/raw/run1.csv"));
    let assignment = fixture.assignment("alice", &[], &[], false).unwrap();

    let err = Synchronizer::new(&mock)
        .synchronize(&fixture.dir(), &fixture.record(), &assignment)
        .unwrap_err();
    assert_matches!(err, SyncError::Incomplete { ref summary } => {
        assert_eq!(summary.failures.len(), 1);
    });
    assert!(mock.acl(&fixture.path("README"), AclKind::Access).is_some());
    assert!(mock.acl(&fixture.record(), AclKind::Access).is_some());
}

#[test]
fn promotion_changes_only_the_promoted_rule() {
    let fixture = populated();
    let mock = MockEffects::with_users(USERS);
    let mut assignment = fixture.assignment("alice", &["bob"], &["carol", "dave"], false).unwrap();
    let sync = Synchronizer::new(&mock);
    sync.synchronize(&fixture.dir(), &fixture.record(), &assignment)
        .unwrap();
    let before = mock.acl_snapshot();

    assignment
        .grant(Principal::from("carol"), Role::Member)
        .unwrap();
    sync.synchronize(&fixture.dir(), &fixture.record(), &assignment)
        .unwrap();
    let after = mock.acl_snapshot();

    assert_eq!(before.len(), after.len());
    for (key, old) in &before {
        let new = &after[key];
        let rules = |entries: &Vec<trellis_core::AclEntry>| {
            entries
                .iter()
                .filter(|e| matches!(&e.tag, AclTag::User(p) if p.as_str() != "carol"))
                .cloned()
                .collect::<Vec<_>>()
        };
        assert_eq!(rules(old), rules(new), "{}", key.0.display());
    }
    for kind in [AclKind::Access, AclKind::Default] {
        assert_eq!(
            rule(&mock, &fixture.dir(), kind, user("carol")),
            Some(Perms::ALL)
        );
    }
    assert_eq!(
        rule(&mock, &fixture.path("README"), AclKind::Access, user("carol")),
        Some(Perms::ALL)
    );
}

#[test]
fn public_toggle_round_trips() {
    let fixture = populated();
    let mock = MockEffects::with_users(USERS);
    let mut assignment = fixture.assignment("alice", &[], &[], false).unwrap();
    let sync = Synchronizer::new(&mock);
    let dir = fixture.dir();
    let other = |kind| rule(&mock, &dir, kind, AclTag::Other);

    sync.synchronize(&dir, &fixture.record(), &assignment).unwrap();
    let private = mock.acl_snapshot();
    assert_eq!(other(AclKind::Access), Some(Perms::NONE));
    assert_eq!(other(AclKind::Default), Some(Perms::NONE));

    assignment.set_public(true);
    sync.synchronize(&dir, &fixture.record(), &assignment).unwrap();
    assert_eq!(other(AclKind::Access), Some(Perms::READ_EXECUTE));
    assert_eq!(other(AclKind::Default), Some(Perms::READ_EXECUTE));
    assert_eq!(
        rule(&mock, &fixture.record(), AclKind::Access, AclTag::Other),
        Some(Perms::NONE)
    );

    assignment.set_public(false);
    sync.synchronize(&dir, &fixture.record(), &assignment).unwrap();
    assert_eq!(mock.acl_snapshot(), private);
}

#[test]
fn fresh_tree_audits_as_missing_owner() {
    let fixture = populated();
    let mock = MockEffects::with_users(USERS);
    let assignment = fixture.assignment("alice", &["bob"], &[], false).unwrap();
    let report = Synchronizer::new(&mock)
        .audit(&fixture.dir(), &fixture.record(), &assignment)
        .unwrap();
    assert_matches!(
        report.violation(),
        Some(DriftViolation::MissingRule { role: Role::Owner, principal, .. })
            if principal.as_str() == "alice"
    );
    assert!(report.to_string().starts_with("needs fixed"));
}

#[test]
fn preserve_file_mode_keeps_plain_files_non_executable() {
    let fixture = populated();
    let script = fixture.write("bin/run.sh", "#!/bin/sh\n").unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    fs::set_permissions(fixture.path("README"), fs::Permissions::from_mode(0o644)).unwrap();
    let mock = MockEffects::with_users(USERS);
    let assignment = fixture.assignment("alice", &["bob"], &["carol"], false).unwrap();
    let sync = Synchronizer::new(&mock).with_policy(ExecPolicy::PreserveFileMode);

    sync.synchronize(&fixture.dir(), &fixture.record(), &assignment)
        .unwrap();

    let readme = fixture.path("README");
    assert_eq!(rule(&mock, &readme, AclKind::Access, user("bob")), Some(Perms::READ_WRITE));
    assert_eq!(rule(&mock, &readme, AclKind::Access, user("carol")), Some(Perms::READ));
    assert_eq!(rule(&mock, &script, AclKind::Access, user("carol")), Some(Perms::READ_EXECUTE));
    assert_eq!(
        rule(&mock, &fixture.path("data"), AclKind::Access, user("carol")),
        Some(Perms::READ_EXECUTE)
    );
    // the record stays owner rwx regardless of policy
    assert_eq!(
        rule(&mock, &fixture.record(), AclKind::Access, user("alice")),
        Some(Perms::ALL)
    );
    assert!(sync
        .audit(&fixture.dir(), &fixture.record(), &assignment)
        .unwrap()
        .is_in_sync());
}

fn arb_roles() -> impl Strategy<Value = (Vec<usize>, Vec<usize>, bool)> {
    // owner is always alice; each other user gets no role, member or collaborator
    (prop::collection::vec(0u8..3, USERS.len() - 1), any::<bool>()).prop_map(|(picks, public)| {
        let mut members = Vec::new();
        let mut collaborators = Vec::new();
        for (i, pick) in picks.into_iter().enumerate() {
            match pick {
                1 => members.push(i + 1),
                2 => collaborators.push(i + 1),
                _ => {}
            }
        }
        (members, collaborators, public)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn synchronize_is_idempotent_and_audits_clean((members, collaborators, public) in arb_roles()) {
        let fixture = populated();
        let mock = MockEffects::with_users(USERS);
        let members: Vec<&str> = members.iter().map(|&i| USERS[i]).collect();
        let collaborators: Vec<&str> = collaborators.iter().map(|&i| USERS[i]).collect();
        let assignment = fixture.assignment("alice", &members, &collaborators, public).unwrap();
        let sync = Synchronizer::new(&mock);

        sync.synchronize(&fixture.dir(), &fixture.record(), &assignment).unwrap();
        let once = mock.acl_snapshot();
        sync.synchronize(&fixture.dir(), &fixture.record(), &assignment).unwrap();
        prop_assert_eq!(&once, &mock.acl_snapshot());
        prop_assert!(sync.audit(&fixture.dir(), &fixture.record(), &assignment).unwrap().is_in_sync());
    }
}
