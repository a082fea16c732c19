//! Path containment
//!
//! A path is contained when its canonical form (all symbolic links
//! resolved) is the root or lies below it. The check has to run for every
//! visited entry: a link anywhere in the tree can send one branch outside
//! the root even though the root itself is clean.

use std::io;
use std::path::{Path, PathBuf};

/// Where a candidate path resolves relative to a boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Containment {
    /// Resolves to the boundary or one of its descendants
    Inside(PathBuf),
    /// Resolves somewhere else
    Outside(PathBuf),
}

/// A root canonicalized once per run.
///
/// Every entry of a walk is checked against this same value rather than a
/// freshly resolved root, so a link swapped in mid-run cannot move the
/// boundary itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainmentBoundary {
    root: PathBuf,
}

impl ContainmentBoundary {
    /// Canonicalize `root`
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self {
            root: root.as_ref().canonicalize()?,
        })
    }

    /// Canonical root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `candidate` and place it relative to the boundary.
    ///
    /// Fails if the candidate cannot be resolved (vanished entry, dangling
    /// link, unreadable ancestor).
    pub fn resolve(&self, candidate: &Path) -> io::Result<Containment> {
        let resolved = candidate.canonicalize()?;
        if lies_within(&self.root, &resolved) {
            Ok(Containment::Inside(resolved))
        } else {
            Ok(Containment::Outside(resolved))
        }
    }
}

/// Whether `candidate` resolves to `root` or below it.
///
/// Both paths are canonicalized; anything that cannot be resolved is not
/// contained.
pub fn is_contained(root: &Path, candidate: &Path) -> bool {
    match (root.canonicalize(), candidate.canonicalize()) {
        (Ok(root), Ok(candidate)) => lies_within(&root, &candidate),
        _ => false,
    }
}

/// Strip trailing components of `resolved` until it equals `root` or runs
/// out at the filesystem root. Both must already be canonical.
fn lies_within(root: &Path, resolved: &Path) -> bool {
    resolved.ancestors().any(|ancestor| ancestor == root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::symlink;

    struct Tree {
        _tmp: tempfile::TempDir,
        base: PathBuf,
    }

    impl Tree {
        fn path(&self, rel: &str) -> PathBuf {
            self.base.join(rel)
        }
    }

    fn tree() -> Tree {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().canonicalize().unwrap();
        fs::create_dir_all(base.join("test/day")).unwrap();
        fs::create_dir_all(base.join("test/night")).unwrap();
        for file in ["test/day/red", "test/day/yellow", "test/night/blue", "test/lunch", "cyan"] {
            fs::write(base.join(file), b"").unwrap();
        }
        symlink(base.join("test/day/red"), base.join("magenta")).unwrap();
        symlink(base.join("test/day/yellow"), base.join("test/orange")).unwrap();
        symlink(base.join("test/night/blue"), base.join("test/night/purple")).unwrap();
        Tree { _tmp: tmp, base }
    }

    #[test]
    fn plain_descendants() {
        let t = tree();
        assert!(is_contained(&t.base, &t.path("test")));
        assert!(is_contained(&t.base, &t.path("test/day")));
        assert!(is_contained(&t.base, &t.path("test/night/blue")));
        assert!(is_contained(&t.path("test"), &t.path("test/day/red")));
        assert!(is_contained(&t.path("test/night"), &t.path("test/night/blue")));
        assert!(is_contained(&t.path("test"), &t.path("test")));
        assert!(!is_contained(&t.path("test"), &t.path("cyan")));
    }

    #[test]
    fn links_are_judged_by_their_target() {
        let t = tree();
        // outside by name, inside by target
        assert!(is_contained(&t.path("test"), &t.path("magenta")));
        assert!(is_contained(&t.path("test"), &t.path("test/orange")));
        assert!(is_contained(&t.path("test/night"), &t.path("test/night/purple")));
    }

    #[test]
    fn dot_dot_is_resolved_before_comparing() {
        let t = tree();
        assert!(is_contained(&t.path("test"), &t.path("test/../magenta")));
        assert!(!is_contained(&t.path("test"), &t.path("test/../cyan")));
        assert!(is_contained(&t.path("test/.."), &t.path("magenta")));
        assert!(!is_contained(&t.path("test/day"), &t.path("test/night/..")));
    }

    #[test]
    fn sibling_with_shared_prefix_is_outside() {
        let t = tree();
        fs::create_dir(t.path("test-other")).unwrap();
        assert!(!is_contained(&t.path("test"), &t.path("test-other")));
    }

    #[test]
    fn unresolvable_candidate_is_not_contained() {
        let t = tree();
        symlink(t.path("nowhere"), t.path("test/dangling")).unwrap();
        assert!(!is_contained(&t.path("test"), &t.path("test/dangling")));
        assert!(!is_contained(&t.path("test"), &t.path("test/missing")));
    }

    #[test]
    fn boundary_reports_resolved_target() {
        let t = tree();
        let outside = tempfile::tempdir().unwrap();
        let target = outside.path().canonicalize().unwrap();
        symlink(&target, t.path("test/escape")).unwrap();

        let boundary = ContainmentBoundary::new(t.path("test")).unwrap();
        assert_eq!(
            boundary.resolve(&t.path("test/escape")).unwrap(),
            Containment::Outside(target)
        );
        assert_eq!(
            boundary.resolve(&t.path("test/orange")).unwrap(),
            Containment::Inside(t.path("test/day/yellow"))
        );
        assert!(boundary.resolve(&t.path("test/missing")).is_err());
    }
}
