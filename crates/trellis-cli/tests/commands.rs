//! Command handlers against a temporary project root with in-memory effects

use assert_matches::assert_matches;
use tempfile::TempDir;
use trellis_cli::{CliError, ProjectContext, RecordStore};
use trellis_core::{
    AclKind, AclTag, DriftReport, ExecPolicy, Perms, Principal, ProjectId, ProjectLayout, Role,
    RoleError,
};
use trellis_testkit::MockEffects;

struct Env {
    _root: TempDir,
    layout: ProjectLayout,
    mock: MockEffects,
}

impl Env {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::new(root.path().canonicalize().unwrap());
        Self {
            _root: root,
            layout,
            mock: MockEffects::with_users(["alice", "bob", "carol", "dave"]),
        }
    }

    fn as_user(&self, name: &str) -> ProjectContext<'_, MockEffects> {
        ProjectContext::new(
            &self.mock,
            RecordStore::new(self.layout.clone()),
            ExecPolicy::AlwaysTraverse,
            Principal::from(name),
        )
    }

    fn rule(&self, project: &ProjectId, name: &str) -> Option<Perms> {
        self.mock
            .acl(&self.layout.project_dir(project), AclKind::Access)?
            .into_iter()
            .find(|e| e.tag == AclTag::User(Principal::from(name)))
            .map(|e| e.perms)
    }
}

fn id(name: &str) -> ProjectId {
    ProjectId::new(name).unwrap()
}

#[test]
fn create_makes_caller_owner_and_synchronizes() {
    let env = Env::new();
    let alice = env.as_user("alice");
    alice.create(&id("scan"), false).unwrap();

    let info = alice.info(&id("scan")).unwrap();
    assert_eq!(info.owner().as_str(), "alice");
    assert!(!info.is_public());
    assert_eq!(env.rule(&id("scan"), "alice"), Some(Perms::ALL));
    assert_eq!(alice.list().unwrap(), vec![id("scan")]);

    let checks = alice.check(Some(&id("scan"))).unwrap();
    assert!(checks[0].is_clean());
}

#[test]
fn create_refuses_existing_project() {
    let env = Env::new();
    let alice = env.as_user("alice");
    alice.create(&id("scan"), false).unwrap();
    assert_matches!(
        alice.create(&id("scan"), true),
        Err(CliError::ProjectExists { .. })
    );
}

#[test]
fn members_manage_users_collaborators_do_not() {
    let env = Env::new();
    env.as_user("alice").create(&id("scan"), false).unwrap();
    env.as_user("alice")
        .set_role(&id("scan"), &"bob".into(), Role::Member)
        .unwrap();

    env.as_user("bob")
        .set_role(&id("scan"), &"carol".into(), Role::Collaborator)
        .unwrap();
    assert_eq!(env.rule(&id("scan"), "carol"), Some(Perms::READ_EXECUTE));

    assert_matches!(
        env.as_user("carol")
            .set_role(&id("scan"), &"dave".into(), Role::Member),
        Err(CliError::NotPermitted { .. })
    );
    assert_matches!(
        env.as_user("carol").remove_user(&id("scan"), &"bob".into()),
        Err(CliError::NotPermitted { .. })
    );
}

#[test]
fn unknown_user_cannot_be_added() {
    let env = Env::new();
    env.as_user("alice").create(&id("scan"), false).unwrap();
    assert_matches!(
        env.as_user("alice")
            .set_role(&id("scan"), &"mallory".into(), Role::Member),
        Err(CliError::UnknownUser { .. })
    );
    assert_eq!(env.as_user("alice").info(&id("scan")).unwrap().members().len(), 0);
}

#[test]
fn owner_rules_are_enforced() {
    let env = Env::new();
    let alice = env.as_user("alice");
    alice.create(&id("scan"), false).unwrap();

    assert_matches!(
        alice.set_role(&id("scan"), &"alice".into(), Role::Member),
        Err(CliError::Role(RoleError::OwnerDemotion { .. }))
    );
    assert_matches!(
        alice.remove_user(&id("scan"), &"alice".into()),
        Err(CliError::Role(RoleError::OwnerRemoval { .. }))
    );

    alice
        .set_role(&id("scan"), &"bob".into(), Role::Owner)
        .unwrap();
    let info = alice.info(&id("scan")).unwrap();
    assert_eq!(info.owner().as_str(), "bob");
    assert_eq!(info.role_of(&"alice".into()), None);
    assert_eq!(env.rule(&id("scan"), "alice"), None);
    assert_eq!(env.rule(&id("scan"), "bob"), Some(Perms::ALL));
}

#[test]
fn grant_then_revoke_restores_the_tree_acl() {
    let env = Env::new();
    let alice = env.as_user("alice");
    alice.create(&id("scan"), false).unwrap();
    let dir = env.layout.project_dir(&id("scan"));
    let before = env.mock.acl(&dir, AclKind::Access);

    alice
        .set_role(&id("scan"), &"carol".into(), Role::Collaborator)
        .unwrap();
    assert_ne!(env.mock.acl(&dir, AclKind::Access), before);
    alice.remove_user(&id("scan"), &"carol".into()).unwrap();
    assert_eq!(env.mock.acl(&dir, AclKind::Access), before);
}

#[test]
fn only_owner_deletes() {
    let env = Env::new();
    env.as_user("alice").create(&id("scan"), false).unwrap();
    env.as_user("alice")
        .set_role(&id("scan"), &"bob".into(), Role::Member)
        .unwrap();

    assert_matches!(
        env.as_user("bob").delete(&id("scan")),
        Err(CliError::NotPermitted { .. })
    );
    env.as_user("alice").delete(&id("scan")).unwrap();
    assert!(!env.layout.project_dir(&id("scan")).exists());
    assert!(!env.layout.record_path(&id("scan")).exists());
    assert!(env.as_user("alice").list().unwrap().is_empty());
}

#[test]
fn update_requires_a_role() {
    let env = Env::new();
    env.as_user("alice").create(&id("scan"), false).unwrap();
    assert_matches!(
        env.as_user("dave").update(&id("scan")),
        Err(CliError::NotPermitted { .. })
    );
    env.as_user("alice").update(&id("scan")).unwrap();
}

#[test]
fn check_reports_each_project_independently() {
    let env = Env::new();
    let alice = env.as_user("alice");
    alice.create(&id("alpha"), false).unwrap();
    alice.create(&id("beta"), false).unwrap();

    // beta drifts: someone opened it to the world by hand
    env.mock.tamper(
        &env.layout.project_dir(&id("beta")),
        AclKind::Access,
        |entries| {
            for entry in entries.iter_mut() {
                if entry.tag == AclTag::Other {
                    entry.perms = Perms::READ_EXECUTE;
                }
            }
        },
    );

    let outcomes = alice.check(None).unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].project, id("alpha"));
    assert!(outcomes[0].is_clean());
    assert_eq!(outcomes[1].project, id("beta"));
    assert_matches!(&outcomes[1].result, Ok(DriftReport::OutOfSync(_)));

    alice.update(&id("beta")).unwrap();
    assert!(alice.check(None).unwrap().iter().all(|o| o.is_clean()));
}

#[test]
fn missing_project_is_named() {
    let env = Env::new();
    assert_matches!(
        env.as_user("alice").info(&id("ghost")),
        Err(CliError::MissingProject { .. })
    );
    let outcomes = env.as_user("alice").check(Some(&id("ghost"))).unwrap();
    assert!(!outcomes[0].is_clean());
}
