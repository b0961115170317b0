//! Relative path arithmetic between mirrored documents and resources
//!
//! Paths are compared segment by segment. With `B` the directory segments of
//! the referencing document and `T` the segments of the resource, the result
//! is one `..` per segment of `B` past the common prefix, followed by the
//! rest of `T`. An empty result becomes `./`, and a result that does not
//! start with `.` or `/` gets a `./` prefix.

/// Non-empty segments of a URL path
#[must_use]
pub fn path_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Directory segments of a document path (its final segment dropped)
///
/// `/products/item` -> `["products"]`, `/docs/` -> `["docs"]`, `/` -> `[]`.
#[must_use]
pub fn document_dir_segments(path: &str) -> Vec<&str> {
    let dir = path.rfind('/').map_or("", |idx| &path[..idx]);
    path_segments(dir)
}

/// Relative reference from directory `base` to `target`
#[must_use]
pub fn calculate_relative_path(base: &[&str], target: &[&str]) -> String {
    let common = base
        .iter()
        .zip(target.iter())
        .take_while(|(b, t)| b == t)
        .count();

    let mut parts: Vec<&str> = vec![".."; base.len() - common];
    parts.extend_from_slice(&target[common..]);
    let relative = parts.join("/");

    if relative.is_empty() {
        "./".to_string()
    } else if relative.starts_with('.') || relative.starts_with('/') {
        relative
    } else {
        format!("./{relative}")
    }
}

/// Relative reference between two mirrored files, host directories included
///
/// For same-host pairs the host segment is part of the common prefix, so the
/// result equals the plain path computation. For different hosts the
/// reference climbs to the mirror root and descends into the resource host.
#[must_use]
pub fn mirror_relative_path(
    base_host: &str,
    document_path: &str,
    resource_host: &str,
    resource_path: &str,
) -> String {
    let mut base = vec![base_host];
    base.extend(document_dir_segments(document_path));

    let mut target = vec![resource_host];
    target.extend(path_segments(resource_path));

    calculate_relative_path(&base, &target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sibling_directory() {
        let base = document_dir_segments("/products/item");
        let target = path_segments("/style.css");
        assert_eq!(calculate_relative_path(&base, &target), "../style.css");
    }

    #[test]
    fn same_directory_gets_dot_prefix() {
        let base = document_dir_segments("/blog/post");
        let target = path_segments("/blog/img/a.png");
        assert_eq!(calculate_relative_path(&base, &target), "./img/a.png");
    }

    #[test]
    fn root_document() {
        assert_eq!(
            calculate_relative_path(&document_dir_segments("/"), &path_segments("/style.css")),
            "./style.css"
        );
        assert_eq!(calculate_relative_path(&[], &[]), "./");
    }

    #[test]
    fn cross_host_climbs_to_mirror_root() {
        let rel = mirror_relative_path("example.com", "/a/page", "cdn.example.com", "/lib.js");
        assert_eq!(rel, "../../cdn.example.com/lib.js");
    }
}
