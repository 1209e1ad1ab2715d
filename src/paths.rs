//! Path resolution against a base directory.

use std::path::{Component, Path, PathBuf};

/// Resolve `path` against `base` into an absolute, lexically normalized path.
///
/// Absolute inputs ignore `base`. `.` components are dropped and `..` pops the
/// previous component; it never climbs above the root. The filesystem is not
/// consulted, so symlinks are left alone.
pub fn resolve_path(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&base.join(path))
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(p) => out.push(p.as_os_str()),
            Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                // Popping a bare root is a no-op, which is what we want.
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}
