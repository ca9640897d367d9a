//! Local wildcard expansion for `mput`

use std::fs;
use std::io;
use std::path::Path;

pub fn has_wildcard(pattern: &str) -> bool {
    pattern.contains(['*', '?'])
}

/// `*` matches any run of characters, `?` exactly one.
pub fn wildcard_match(pat: &str, text: &str) -> bool {
    fn helper(p: &[char], t: &[char]) -> bool {
        match p.split_first() {
            None => t.is_empty(),
            Some((&'*', rest)) => helper(rest, t) || (!t.is_empty() && helper(p, &t[1..])),
            Some((c, rest)) => {
                !t.is_empty() && (*c == '?' || *c == t[0]) && helper(rest, &t[1..])
            }
        }
    }
    let p: Vec<char> = pat.chars().collect();
    let t: Vec<char> = text.chars().collect();
    helper(&p, &t)
}

/// Expands `pattern` against the entries of its directory. Dot entries are
/// skipped and the result is sorted. A pattern without wildcards comes back
/// unchanged.
pub fn expand_local(pattern: &str) -> io::Result<Vec<String>> {
    if !has_wildcard(pattern) {
        return Ok(vec![pattern.to_string()]);
    }

    let path = Path::new(pattern);
    let (dir, file_pat) = match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => (parent, name.to_string_lossy().into_owned()),
        _ => (Path::new(""), pattern.to_string()),
    };
    let read_from = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };

    let mut matches = Vec::new();
    for entry in fs::read_dir(read_from)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || !wildcard_match(&file_pat, &name) {
            continue;
        }
        matches.push(dir.join(&name).to_string_lossy().into_owned());
    }
    matches.sort();
    Ok(matches)
}
