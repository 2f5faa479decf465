//! Scope suggestions derived from changed paths.

use std::path::Path;

/// Directory names too generic to make a useful scope.
const GENERIC_DIRS: &[&str] = &["src", "lib", "crates", "packages", "pkg", "app", "source"];

const MAX_HINTS: usize = 3;

/// Suggest commit scopes for a set of changed paths.
///
/// Prefers the deepest specific directory shared by every path. With a
/// single file and no such directory the file stem is used, so `src/api.py`
/// suggests `api`. Otherwise each path contributes its top-level area.
pub fn scope_hints<S: AsRef<str>>(paths: &[S]) -> Vec<String> {
    if paths.is_empty() {
        return Vec::new();
    }

    let dirs: Vec<Vec<&str>> = paths.iter().map(|p| dir_components(p.as_ref())).collect();

    let mut common: Vec<&str> = dirs[0].clone();
    for d in &dirs[1..] {
        let shared = common.iter().zip(d).take_while(|(a, b)| a == b).count();
        common.truncate(shared);
    }

    if let Some(specific) = common.iter().rev().find(|c| !is_generic(c)) {
        return sanitize(specific).into_iter().collect();
    }

    let mut hints: Vec<String> = Vec::new();
    for (path, components) in paths.iter().zip(&dirs) {
        let area = components
            .iter()
            .find(|c| !is_generic(c))
            .map(|c| c.to_string())
            .or_else(|| file_stem(path.as_ref()));
        if let Some(hint) = area.as_deref().and_then(sanitize)
            && !hints.contains(&hint)
        {
            hints.push(hint);
        }
        if hints.len() == MAX_HINTS {
            break;
        }
    }
    hints
}

fn dir_components(path: &str) -> Vec<&str> {
    let mut parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
    parts.pop();
    parts
}

fn is_generic(component: &str) -> bool {
    GENERIC_DIRS.contains(&component.to_lowercase().as_str())
}

fn file_stem(path: &str) -> Option<String> {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
}

/// Lowercase and reduce to `[a-z0-9_-]`, or `None` if nothing usable remains.
fn sanitize(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('-').to_string();
    (!cleaned.is_empty()).then_some(cleaned)
}
