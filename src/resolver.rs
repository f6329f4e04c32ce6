use std::collections::HashSet;
use std::path::Path;

use crate::organizer::OrganizeError;

/// Suffix attempts before a single file is declared unresolvable.
pub const MAX_SUFFIX_ATTEMPTS: usize = 1000;

/// Pick a unique file name inside `category_dir` for `cleaned_name`.
///
/// The name is used as-is when free; otherwise `_1`, `_2`, ... are tried in
/// order and the first free integer wins. "Free" means absent on disk and
/// absent from `reserved`, the set of names already claimed earlier in the
/// same pass. The chosen name is inserted into `reserved` before returning,
/// so later resolutions in the pass can never collide with it.
pub fn resolve_destination(
    category_dir: &Path,
    cleaned_name: &str,
    extension: &str,
    reserved: &mut HashSet<String>,
) -> Result<String, OrganizeError> {
    for attempt in 0..=MAX_SUFFIX_ATTEMPTS {
        let candidate = candidate_name(cleaned_name, extension, attempt);
        if !reserved.contains(&candidate) && !category_dir.join(&candidate).exists() {
            reserved.insert(candidate.clone());
            return Ok(candidate);
        }
    }

    Err(OrganizeError::CollisionExhausted {
        name: candidate_name(cleaned_name, extension, 0),
        attempts: MAX_SUFFIX_ATTEMPTS,
    })
}

fn candidate_name(cleaned_name: &str, extension: &str, counter: usize) -> String {
    match (counter, extension.is_empty()) {
        (0, true) => cleaned_name.to_string(),
        (0, false) => format!("{}.{}", cleaned_name, extension),
        (n, true) => format!("{}_{}", cleaned_name, n),
        (n, false) => format!("{}_{}.{}", cleaned_name, n, extension),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn free_name_is_used_as_is() {
        let dir = tempdir().unwrap();
        let mut reserved = HashSet::new();

        let name = resolve_destination(dir.path(), "report", "pdf", &mut reserved).unwrap();
        assert_eq!(name, "report.pdf");
        assert!(reserved.contains("report.pdf"));
    }

    #[test]
    fn on_disk_collision_takes_first_suffix() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("report.pdf"), b"x").unwrap();
        let mut reserved = HashSet::new();

        let name = resolve_destination(dir.path(), "report", "pdf", &mut reserved).unwrap();
        assert_eq!(name, "report_1.pdf");
    }

    #[test]
    fn reserved_collision_takes_first_suffix() {
        let dir = tempdir().unwrap();
        let mut reserved = HashSet::new();

        let first = resolve_destination(dir.path(), "document_report", "pdf", &mut reserved).unwrap();
        let second = resolve_destination(dir.path(), "document_report", "pdf", &mut reserved).unwrap();
        assert_eq!(first, "document_report.pdf");
        assert_eq!(second, "document_report_1.pdf");
    }

    #[test]
    fn first_free_integer_wins_across_gaps() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("photo.jpg"), b"x").unwrap();
        fs::write(dir.path().join("photo_1.jpg"), b"x").unwrap();
        fs::write(dir.path().join("photo_3.jpg"), b"x").unwrap();
        let mut reserved = HashSet::new();

        let name = resolve_destination(dir.path(), "photo", "jpg", &mut reserved).unwrap();
        assert_eq!(name, "photo_2.jpg");
    }

    #[test]
    fn extensionless_names_get_bare_suffixes() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("makefile"), b"x").unwrap();
        let mut reserved = HashSet::new();

        let name = resolve_destination(dir.path(), "makefile", "", &mut reserved).unwrap();
        assert_eq!(name, "makefile_1");
    }

    #[test]
    fn exhaustion_is_an_error_not_a_loop() {
        let dir = tempdir().unwrap();
        let mut reserved = HashSet::new();
        reserved.insert("note.txt".to_string());
        for n in 1..=MAX_SUFFIX_ATTEMPTS {
            reserved.insert(format!("note_{}.txt", n));
        }

        let err = resolve_destination(dir.path(), "note", "txt", &mut reserved).unwrap_err();
        assert!(matches!(err, OrganizeError::CollisionExhausted { .. }));
    }
}
