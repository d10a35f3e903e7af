//! Canonical path spelling used for every comparison, persisted document
//! and cache key: forward-slash separated, no repeated or trailing
//! separators, Windows drive letters as `/X/...` (uppercase) and UNC
//! shares as `/server/share/...`. Filesystem calls go through
//! [`to_platform`].

pub fn to_canonical(path: &str) -> String {
    let slashed = path.trim().replace('\\', "/");

    // Drive-letter spellings ("C:", "c:/foo") root under "/C".
    let bytes = slashed.as_bytes();
    let rooted = if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
        let drive = (bytes[0] as char).to_ascii_uppercase();
        format!("/{}{}", drive, &slashed[2..])
    } else {
        slashed
    };

    // Collapsing separator runs also folds UNC "//server/share" into
    // "/server/share".
    let mut out = String::with_capacity(rooted.len());
    let mut prev_sep = false;
    for c in rooted.chars() {
        if c == '/' {
            if !prev_sep {
                out.push('/');
            }
            prev_sep = true;
        } else {
            out.push(c);
            prev_sep = false;
        }
    }
    while out.ends_with('/') && out.len() > 1 {
        out.pop();
    }
    out
}

/// Renders a canonical path in the spelling the platform's filesystem
/// calls expect. Pass-through on POSIX platforms.
pub fn to_platform(path: &str) -> String {
    let canonical = to_canonical(path);
    if !cfg!(windows) {
        return canonical;
    }

    let trimmed = match canonical.strip_prefix('/') {
        Some(rest) => rest,
        None => return canonical.replace('/', "\\"),
    };
    let mut segments = trimmed.splitn(2, '/');
    let first = segments.next().unwrap_or("");
    let rest = segments.next().unwrap_or("");

    if first.len() == 1 && first.as_bytes()[0].is_ascii_alphabetic() {
        if rest.is_empty() {
            format!("{}:\\", first.to_ascii_uppercase())
        } else {
            format!("{}:\\{}", first.to_ascii_uppercase(), rest.replace('/', "\\"))
        }
    } else {
        format!("\\\\{}", trimmed.replace('/', "\\"))
    }
}

pub fn basename(path: &str) -> String {
    let canonical = to_canonical(path);
    canonical.rsplit('/').next().unwrap_or("").to_string()
}

/// True when the path still carries unresolved `.` or `..` segments.
pub fn is_abnormal(path: &str) -> bool {
    path.replace('\\', "/")
        .split('/')
        .any(|segment| segment == "." || segment == "..")
}

/// Separator-bounded containment: `folder` contains itself and anything
/// under `folder + "/"`, but never a sibling that merely shares the
/// textual prefix (`/foo/barbaz` is not under `/foo/bar`).
pub fn is_ancestor_of(folder: &str, candidate: &str) -> bool {
    let folder = to_canonical(folder);
    let candidate = to_canonical(candidate);

    if candidate == folder {
        return true;
    }

    if folder == "/" {
        return candidate.starts_with('/');
    }

    if cfg!(windows) {
        let candidate_lower = candidate.to_ascii_lowercase();
        let folder_lower = folder.to_ascii_lowercase();
        if candidate_lower == folder_lower {
            return true;
        }
        return candidate_lower.starts_with(&(folder_lower + "/"));
    }

    candidate.starts_with(&(folder + "/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_posix_passes_through() {
        assert_eq!(to_canonical("/media/shows/Lost"), "/media/shows/Lost");
    }

    #[test]
    fn canonical_maps_drive_letters() {
        assert_eq!(to_canonical("C:\\Media\\Shows"), "/C/Media/Shows");
        assert_eq!(to_canonical("c:/media"), "/C/media");
        assert_eq!(to_canonical("D:"), "/D");
    }

    #[test]
    fn canonical_maps_unc_shares() {
        assert_eq!(to_canonical("\\\\nas\\media\\shows"), "/nas/media/shows");
        assert_eq!(to_canonical("//nas/media"), "/nas/media");
    }

    #[test]
    fn canonical_strips_trailing_and_repeated_separators() {
        assert_eq!(to_canonical("/media/shows/"), "/media/shows");
        assert_eq!(to_canonical("/media//shows///x"), "/media/shows/x");
        assert_eq!(to_canonical("/"), "/");
    }

    #[test]
    fn canonical_is_idempotent() {
        for raw in [
            "/media/shows/Lost",
            "C:\\Media\\Shows\\",
            "\\\\nas\\media",
            "/media//shows/",
        ] {
            let once = to_canonical(raw);
            assert_eq!(to_canonical(&once), once);
        }
    }

    #[test]
    fn basename_returns_last_segment() {
        assert_eq!(basename("/media/shows/Lost"), "Lost");
        assert_eq!(basename("C:\\Media\\episode.mkv"), "episode.mkv");
        assert_eq!(basename("/media/shows/"), "shows");
    }

    #[test]
    fn abnormal_detects_dot_segments() {
        assert!(is_abnormal("/media/./shows"));
        assert!(is_abnormal("/media/../other"));
        assert!(is_abnormal("C:\\media\\..\\other"));
        assert!(!is_abnormal("/media/shows/file.v2.mkv"));
    }

    #[test]
    fn ancestor_exact_match() {
        assert!(is_ancestor_of("/media/shows", "/media/shows"));
        assert!(is_ancestor_of("/media/shows", "/media/shows/"));
    }

    #[test]
    fn ancestor_child_path() {
        assert!(is_ancestor_of("/media/shows", "/media/shows/s01/e01.mkv"));
        assert!(!is_ancestor_of("/media/shows", "/media/shows-extra"));
    }

    #[test]
    fn ancestor_root() {
        assert!(is_ancestor_of("/", "/anything"));
        assert!(!is_ancestor_of("/other", "/anything"));
    }

    #[test]
    fn ancestor_mixed_spellings() {
        assert!(is_ancestor_of("C:\\Media", "/C/Media/Shows"));
        assert!(is_ancestor_of("\\\\nas\\media", "/nas/media/shows"));
    }
}
