use std::{fs, io, path::Path, sync::LazyLock};

use eyre::{Result, WrapErr};
use regex::Regex;
use tracing::{info, warn};

/// Start of the bullet line this crate owns.
pub const PROJECTS_LINE_PREFIX: &str = "- 🔭 Currently actively developing my ";

static PROJECTS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*- 🔭 Currently actively developing my .*$").expect("valid projects line regex")
});

/// Render the bullet line for `names`, linking each to its GitHub repository.
///
/// Returns `None` when `names` is empty.
pub fn build_projects_line<S: AsRef<str>>(names: &[S], github_user: &str) -> Option<String> {
    let links: Vec<String> = names
        .iter()
        .map(|n| {
            let name = n.as_ref();
            format!("[{name}](https://github.com/{github_user}/{name})")
        })
        .collect();

    let listed = match links.as_slice() {
        [] => return None,
        [only] => format!("{only} project."),
        [first, second] => format!("{first} & {second} projects."),
        [init @ .., last] => format!("{} & {last} projects.", init.join(", ")),
    };

    Some(format!("{PROJECTS_LINE_PREFIX}{listed}"))
}

/// Replace every projects line in `content` with exactly one `new_line`.
///
/// The first existing projects line is replaced in place, keeping its
/// indentation, and the others are dropped. Without one, `new_line` goes after
/// the first line starting with `anchor`, or at the end of the content.
pub fn replace_projects_block(content: &str, new_line: &str, anchor: Option<&str>) -> String {
    let mut out = String::with_capacity(content.len() + new_line.len() + 1);
    let mut replaced = false;

    for line in content.split_inclusive('\n') {
        let (text, ending) = split_line_ending(line);
        if PROJECTS_LINE.is_match(text) {
            if !replaced {
                let indent = &text[..text.len() - text.trim_start().len()];
                out.push_str(indent);
                out.push_str(new_line.trim_start());
                out.push_str(ending);
                replaced = true;
            }
            continue;
        }
        out.push_str(line);
    }

    if replaced {
        return out;
    }

    if let Some(anchor) = anchor.filter(|a| !a.is_empty()) {
        let mut inserted = String::with_capacity(out.len() + new_line.len() + 1);
        let mut done = false;
        for line in out.split_inclusive('\n') {
            inserted.push_str(line);
            if !done && line.trim_start().starts_with(anchor) {
                let (_, ending) = split_line_ending(line);
                let ending = if ending.is_empty() { "\n" } else { ending };
                if !line.ends_with('\n') {
                    inserted.push_str(ending);
                }
                inserted.push_str(new_line);
                inserted.push_str(ending);
                done = true;
            }
        }
        if done {
            return inserted;
        }
    }

    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(new_line);
    out.push('\n');
    out
}

/// Rewrite the projects line of the file at `path`.
///
/// A missing file or an empty `names` list is a no-op. Returns whether the
/// file was written.
pub fn update_readme<S: AsRef<str>>(
    path: &Path,
    names: &[S],
    github_user: &str,
    anchor: Option<&str>,
) -> Result<bool> {
    let Some(new_line) = build_projects_line(names, github_user) else {
        info!("no projects to list, leaving README untouched");
        return Ok(false);
    };

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "README not found, skipping update");
            return Ok(false);
        }
        Err(e) => {
            return Err(e).wrap_err_with(|| format!("failed to read {}", path.display()));
        }
    };

    let updated = replace_projects_block(&content, &new_line, anchor);
    if updated == content {
        info!(path = %path.display(), "README already up to date");
        return Ok(false);
    }

    fs::write(path, updated).wrap_err_with(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), line = %new_line, "README updated");
    Ok(true)
}

fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(text) = line.strip_suffix("\r\n") {
        (text, "\r\n")
    } else if let Some(text) = line.strip_suffix('\n') {
        (text, "\n")
    } else {
        (line, "")
    }
}
