//! POSIX ACLs through the `setfacl` / `getfacl` tools
//!
//! Specs are written whole with `--set`, never merged, so whatever rules an
//! entry carried before are replaced. Reads list both kinds in one call and
//! keep the requested one.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{debug, trace};
use trellis_core::acl::{check_required_entries, parse_acl_text};
use trellis_core::{AclEffectError, AclEffects, AclEntry, AclKind, AclSpec};

/// ACL handler shelling out to the system ACL tools
#[derive(Debug, Clone)]
pub struct CommandAclHandler {
    setfacl: PathBuf,
    getfacl: PathBuf,
}

impl CommandAclHandler {
    /// Use the given binaries, falling back to a `PATH` lookup for each
    pub fn locate(setfacl: Option<&Path>, getfacl: Option<&Path>) -> Result<Self, AclEffectError> {
        Ok(Self {
            setfacl: find_tool("setfacl", setfacl)?,
            getfacl: find_tool("getfacl", getfacl)?,
        })
    }

    fn run(&self, tool: &Path, args: Vec<OsString>, path: &Path) -> Result<Output, AclEffectError> {
        trace!(tool = %tool.display(), ?args, "Running ACL tool");
        let output = tool_command(tool, &args).output().map_err(|e| {
            AclEffectError::Unsupported {
                message: format!("cannot run {}: {e}", tool.display()),
            }
        })?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(classify_failure(path, &String::from_utf8_lossy(&output.stderr)))
        }
    }
}

impl AclEffects for CommandAclHandler {
    fn read_acl(&self, path: &Path, kind: AclKind) -> Result<Vec<AclEntry>, AclEffectError> {
        let output = self.run(&self.getfacl, getfacl_args(path), path)?;
        let text = String::from_utf8_lossy(&output.stdout);
        let entries = parse_acl_text(&text, kind).map_err(|reason| AclEffectError::Corrupt {
            path: path.to_path_buf(),
            reason,
        })?;
        if kind == AclKind::Access {
            check_required_entries(&entries).map_err(|reason| AclEffectError::Corrupt {
                path: path.to_path_buf(),
                reason,
            })?;
        }
        Ok(entries)
    }

    fn write_acl(&self, path: &Path, kind: AclKind, spec: &AclSpec) -> Result<(), AclEffectError> {
        self.run(&self.setfacl, setfacl_args(path, kind, spec), path)?;
        debug!(path = %path.display(), %kind, acl = %spec.to_text(), "Set ACL");
        Ok(())
    }

    fn remove_default_acl(&self, path: &Path) -> Result<(), AclEffectError> {
        let args = vec![OsString::from("-k"), OsString::from("--"), path.into()];
        self.run(&self.setfacl, args, path)?;
        debug!(path = %path.display(), "Removed default ACL");
        Ok(())
    }
}

fn find_tool(name: &str, configured: Option<&Path>) -> Result<PathBuf, AclEffectError> {
    match configured {
        Some(path) if path.is_file() => Ok(path.to_path_buf()),
        Some(path) => Err(AclEffectError::Unsupported {
            message: format!("configured {name} {} does not exist", path.display()),
        }),
        None => which::which(name).map_err(|e| AclEffectError::Unsupported {
            message: format!("{name} not found on PATH: {e}"),
        }),
    }
}

/// Failures are classified from stderr, so the tool must speak the C locale
fn tool_command(tool: &Path, args: &[OsString]) -> Command {
    let mut command = Command::new(tool);
    command.args(args).env("LC_ALL", "C");
    command
}

fn getfacl_args(path: &Path) -> Vec<OsString> {
    vec![
        "--omit-header".into(),
        "--absolute-names".into(),
        "--".into(),
        path.into(),
    ]
}

fn setfacl_args(path: &Path, kind: AclKind, spec: &AclSpec) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::with_capacity(5);
    if kind == AclKind::Default {
        args.push("-d".into());
    }
    args.push("--set".into());
    args.push(spec.to_text().into());
    args.push("--".into());
    args.push(path.into());
    args
}

/// Map tool stderr to an error kind
fn classify_failure(path: &Path, stderr: &str) -> AclEffectError {
    let message = stderr.trim().to_string();
    if message.contains("No such file or directory") {
        AclEffectError::NotFound {
            path: path.to_path_buf(),
        }
    } else if message.contains("Operation not supported") {
        AclEffectError::Unsupported { message }
    } else {
        AclEffectError::Refused {
            path: path.to_path_buf(),
            message,
        }
    }
}
