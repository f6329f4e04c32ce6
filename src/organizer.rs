use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;
use walkdir::WalkDir;

use crate::classifier::CategoryMap;
use crate::config::Config;
use crate::describe::{Describer, FileFacts};
use crate::history::{HistoryStore, OperationRecord};
use crate::normalizer::Normalizer;
use crate::resolver::resolve_destination;
use crate::{HISTORY_FILE_NAME, JUNK_FILES, MAX_FILES_PER_PASS};

/// Failures local to one file. None of these abort the pass; they land in
/// the summary as `(path, reason)` entries.
#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error("no free name based on {name} after {attempts} suffix attempts")]
    CollisionExhausted { name: String, attempts: usize },

    #[error("failed to create category folder {path}: {source}")]
    CategoryDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to move to {to}: {reason}")]
    MoveFailed { to: PathBuf, reason: String },

    #[error("source file vanished mid-run")]
    SourceVanished,
}

/// One file discovered during traversal, alive only for the pass.
#[derive(Debug, Clone)]
pub struct PendingFile {
    pub path: PathBuf,
    pub base_name: String,
    pub extension: String,
    pub depth: usize,
}

/// A resolved move: where a file goes and under what name. In a dry run
/// this is the whole output; in a real run the move has already happened.
#[derive(Debug, Clone)]
pub struct PlannedMove {
    pub source: PathBuf,
    pub category: &'static str,
    pub new_name: String,
    pub destination: PathBuf,
}

/// Per-pass outcome counts plus the detail needed for follow-up.
#[derive(Debug, Default)]
pub struct OrganizeSummary {
    pub moved: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failures: Vec<(PathBuf, String)>,
    pub planned: Vec<PlannedMove>,
}

/// Walks the source root once and runs classify -> normalize -> resolve ->
/// move -> record for every candidate file, in lexicographic path order so
/// collision suffixes are reproducible.
pub struct Organizer {
    root: PathBuf,
    categories: CategoryMap,
    normalizer: Normalizer,
    history: HistoryStore,
    describer: Option<Describer>,
    limit: usize,
}

impl Organizer {
    /// `describer` is `None` when descriptions are disabled or the
    /// credential is absent; records then carry no description.
    pub fn new(root: PathBuf, describer: Option<Describer>) -> Result<Self> {
        if Config::is_system_path(&root) {
            anyhow::bail!("refusing to organize system path: {}", root.display());
        }
        if !root.is_dir() {
            anyhow::bail!("source root is not a directory: {}", root.display());
        }
        let root = root
            .canonicalize()
            .with_context(|| format!("failed to resolve source root {}", root.display()))?;

        Ok(Self {
            history: HistoryStore::open(&root),
            root,
            categories: CategoryMap::new(),
            normalizer: Normalizer::new(),
            describer,
            limit: MAX_FILES_PER_PASS,
        })
    }

    /// Lower the per-pass candidate cap (mostly for tests).
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn categories(&self) -> &CategoryMap {
        &self.categories
    }

    /// Run one full pass. With `dry_run` nothing on disk changes and the
    /// summary's `planned` list is the would-be result.
    pub fn run(&self, dry_run: bool) -> Result<OrganizeSummary> {
        let mut summary = OrganizeSummary::default();
        let candidates = self.collect_candidates(&mut summary)?;

        // Reserved names per category folder, shared across the pass so a
        // dry run stays collision-correct even though it moves nothing.
        let mut reserved: HashMap<&'static str, HashSet<String>> = HashMap::new();

        let pb = ProgressBar::new(candidates.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} files ({eta})")?
                .progress_chars("#>-"),
        );

        for pending in &candidates {
            pb.inc(1);
            match self.process(pending, &mut reserved, dry_run) {
                Ok(planned) => {
                    summary.moved += 1;
                    summary.planned.push(planned);
                }
                Err(e) => {
                    summary.failed += 1;
                    summary.failures.push((pending.path.clone(), e.to_string()));
                }
            }
        }

        pb.finish_and_clear();
        Ok(summary)
    }

    /// Organize a single named file through the same pipeline.
    pub fn organize_file(&self, path: &Path, dry_run: bool) -> Result<OrganizeSummary> {
        let mut summary = OrganizeSummary::default();

        if !path.is_file() {
            anyhow::bail!("file not found: {}", path.display());
        }
        let path = path
            .canonicalize()
            .with_context(|| format!("failed to resolve {}", path.display()))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if name == HISTORY_FILE_NAME || is_junk(&name) || self.already_organized(&path) {
            summary.skipped += 1;
            return Ok(summary);
        }

        let pending = pending_file(&path, 0);
        let mut reserved: HashMap<&'static str, HashSet<String>> = HashMap::new();
        match self.process(&pending, &mut reserved, dry_run) {
            Ok(planned) => {
                summary.moved += 1;
                summary.planned.push(planned);
            }
            Err(e) => {
                summary.failed += 1;
                summary.failures.push((pending.path.clone(), e.to_string()));
            }
        }
        Ok(summary)
    }

    /// Collect every candidate before touching anything, so the walk never
    /// sees files this pass already moved. Skips are counted here.
    fn collect_candidates(&self, summary: &mut OrganizeSummary) -> Result<Vec<PendingFile>> {
        if !self.root.is_dir() {
            anyhow::bail!("source root does not exist: {}", self.root.display());
        }

        let mut candidates = Vec::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok());

        for entry in walker {
            if candidates.len() >= self.limit {
                println!(
                    "{} Collected maximum {} files. Stopping early.",
                    "⚠️".yellow(),
                    self.limit
                );
                break;
            }

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            if name == HISTORY_FILE_NAME || is_junk(&name) || self.already_organized(path) {
                summary.skipped += 1;
                continue;
            }

            candidates.push(pending_file(path, entry.depth()));
        }

        candidates.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(candidates)
    }

    /// True if the file sits directly under a folder named after a known
    /// category label: it was organized by a previous pass and re-touching
    /// it would break idempotence.
    fn already_organized(&self, path: &Path) -> bool {
        path.parent()
            .and_then(|parent| parent.file_name())
            .map(|name| self.categories.is_category_label(&name.to_string_lossy()))
            .unwrap_or(false)
    }

    /// classify -> normalize -> resolve -> move -> describe -> record.
    fn process(
        &self,
        pending: &PendingFile,
        reserved: &mut HashMap<&'static str, HashSet<String>>,
        dry_run: bool,
    ) -> Result<PlannedMove, OrganizeError> {
        let category = self.categories.classify(&pending.extension);
        let cleaned = self.normalizer.normalize(&pending.base_name);

        let category_dir = self.root.join(category);
        let reserved_names = reserved.entry(category).or_default();
        let unique_name =
            resolve_destination(&category_dir, &cleaned, &pending.extension, reserved_names)?;
        let destination = category_dir.join(&unique_name);

        let planned = PlannedMove {
            source: pending.path.clone(),
            category,
            new_name: unique_name,
            destination: destination.clone(),
        };

        if dry_run {
            return Ok(planned);
        }

        let size_bytes = match fs::metadata(&pending.path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(OrganizeError::SourceVanished)
            }
            Err(_) => 0,
        };

        fs::create_dir_all(&category_dir).map_err(|source| OrganizeError::CategoryDirFailed {
            path: category_dir.clone(),
            source,
        })?;

        // rename fails across filesystems; fall back to copy+delete.
        if let Err(rename_err) = fs::rename(&pending.path, &destination) {
            let options = fs_extra::file::CopyOptions::new();
            fs_extra::file::move_file(&pending.path, &destination, &options).map_err(|_| {
                OrganizeError::MoveFailed {
                    to: destination.clone(),
                    reason: rename_err.to_string(),
                }
            })?;
        }

        // Bounded best-effort call; any failure means a null description.
        let description = self.describer.as_ref().and_then(|describer| {
            let facts = FileFacts {
                original_name: pending
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                new_name: planned.new_name.clone(),
                extension: pending.extension.clone(),
                category: category.to_string(),
                size_bytes,
            };
            describer.describe(&facts).ok()
        });

        let record = OperationRecord::organized(
            &pending.path,
            &destination,
            category,
            size_bytes,
            description,
        );
        // A history write failure loses this record only; the move stands.
        if let Err(e) = self.history.append(&record) {
            eprintln!(
                "{} Failed to record move of {}: {}",
                "⚠️".yellow(),
                pending.path.display(),
                e
            );
        }

        Ok(planned)
    }

    /// Files per category folder plus the current unorganized count, read
    /// live from disk for the stats surface.
    pub fn folder_counts(&self) -> Result<(Vec<(&'static str, usize)>, usize)> {
        let mut per_category = Vec::new();
        for label in self.categories.labels() {
            let dir = self.root.join(label);
            let count = match fs::read_dir(&dir) {
                Ok(entries) => entries
                    .filter_map(|e| e.ok())
                    .filter(|e| e.path().is_file())
                    .count(),
                Err(_) => 0,
            };
            per_category.push((*label, count));
        }

        let mut summary = OrganizeSummary::default();
        let pending = self.collect_candidates(&mut summary)?.len();
        Ok((per_category, pending))
    }
}

fn pending_file(path: &Path, depth: usize) -> PendingFile {
    let base_name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();
    PendingFile {
        path: path.to_path_buf(),
        base_name,
        extension,
        depth,
    }
}

fn is_junk(name: &str) -> bool {
    JUNK_FILES.contains(&name) || name.starts_with("~$")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"content").unwrap();
    }

    fn organizer(root: &Path) -> Organizer {
        Organizer::new(root.to_path_buf(), None).unwrap()
    }

    #[test]
    fn pass_moves_files_into_category_folders() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("archives_validate_3d0c1bda-5cee-4dca-9834_20250819.zip"));
        touch(&dir.path().join("images_peter-herrmann-gDLbqHXRIe8-unsplash_20250819_132529.jpg"));
        touch(&dir.path().join("nested/Quarterly Report.pdf"));

        let org = organizer(dir.path());
        let summary = org.run(false).unwrap();

        assert_eq!(summary.moved, 3);
        assert_eq!(summary.failed, 0);
        assert!(dir.path().join("archives/archives_validate.zip").is_file());
        assert!(dir
            .path()
            .join("images/images_peter_herrmann_unsplash.jpg")
            .is_file());
        assert!(dir.path().join("documents/quarterly_report.pdf").is_file());

        let records = org.history().read_all().unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.description.is_none()));
    }

    #[test]
    fn second_pass_is_idempotent() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("photo_20250819_132529.jpg"));
        touch(&dir.path().join("notes.txt"));

        let org = organizer(dir.path());
        let first = org.run(false).unwrap();
        assert_eq!(first.moved, 2);

        let second = org.run(false).unwrap();
        assert_eq!(second.moved, 0);
        assert_eq!(second.failed, 0);
        // Both moved files plus the history log are recognized as settled.
        assert_eq!(second.skipped, 3);
        assert_eq!(org.history().read_all().unwrap().len(), 2);
    }

    #[test]
    fn files_in_category_folders_are_skipped_without_records() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("images/photo.jpg"));

        let org = organizer(dir.path());
        let summary = org.run(false).unwrap();

        assert_eq!(summary.moved, 0);
        assert_eq!(summary.skipped, 1);
        assert!(dir.path().join("images/photo.jpg").is_file());
        assert!(org.history().read_all().unwrap().is_empty());
    }

    #[test]
    fn same_pass_collisions_take_suffixes_in_path_order() {
        let dir = tempdir().unwrap();
        // Both normalize to "report.pdf"; '-' sorts before '_'.
        touch(&dir.path().join("report-20250819.pdf"));
        touch(&dir.path().join("report_132529.pdf"));

        let org = organizer(dir.path());
        let summary = org.run(false).unwrap();

        assert_eq!(summary.moved, 2);
        assert!(dir.path().join("documents/report.pdf").is_file());
        assert!(dir.path().join("documents/report_1.pdf").is_file());
    }

    #[test]
    fn destination_uniqueness_holds_across_a_pass() {
        let dir = tempdir().unwrap();
        for prefix in ["a", "b", "c"] {
            touch(&dir.path().join(format!("{prefix}/song_20250819.mp3")));
        }

        let org = organizer(dir.path());
        let summary = org.run(false).unwrap();
        assert_eq!(summary.moved, 3);

        let mut destinations: Vec<_> = summary
            .planned
            .iter()
            .map(|p| p.destination.clone())
            .collect();
        destinations.sort();
        destinations.dedup();
        assert_eq!(destinations.len(), 3);
    }

    #[test]
    fn junk_files_are_skipped() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join(".DS_Store"));
        touch(&dir.path().join("~$draft.docx"));
        touch(&dir.path().join("real.txt"));

        let org = organizer(dir.path());
        let summary = org.run(false).unwrap();

        assert_eq!(summary.moved, 1);
        assert_eq!(summary.skipped, 2);
        assert!(dir.path().join(".DS_Store").is_file());
        assert!(dir.path().join("~$draft.docx").is_file());
    }

    #[test]
    fn dry_run_changes_nothing() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("photo_20250819.jpg"));

        let org = organizer(dir.path());
        let summary = org.run(true).unwrap();

        assert_eq!(summary.moved, 1);
        assert_eq!(summary.planned.len(), 1);
        assert_eq!(summary.planned[0].category, "images");
        assert_eq!(summary.planned[0].new_name, "photo.jpg");
        assert!(dir.path().join("photo_20250819.jpg").is_file());
        assert!(!dir.path().join("images").exists());
        assert!(org.history().read_all().unwrap().is_empty());
    }

    #[test]
    fn dry_run_plans_are_collision_correct() {
        let dir = tempdir().unwrap();
        // Both normalize to "report.pdf"; with nothing written to disk the
        // reserved set alone must keep the plan collision-free.
        touch(&dir.path().join("report-20250819.pdf"));
        touch(&dir.path().join("report_132529.pdf"));

        let org = organizer(dir.path());
        let summary = org.run(true).unwrap();

        let names: Vec<_> = summary.planned.iter().map(|p| p.new_name.as_str()).collect();
        assert_eq!(names, vec!["report.pdf", "report_1.pdf"]);
    }

    #[test]
    fn one_failing_file_does_not_abort_the_pass() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("song.mp3"));
        touch(&dir.path().join("photo.jpg"));

        // Exhaust every candidate name for "song.mp3" so its resolution
        // fails while the rest of the pass proceeds.
        let audio_dir = dir.path().join("audio");
        touch(&audio_dir.join("song.mp3"));
        for n in 1..=crate::resolver::MAX_SUFFIX_ATTEMPTS {
            fs::write(audio_dir.join(format!("song_{}.mp3", n)), b"x").unwrap();
        }

        let org = organizer(dir.path());
        let summary = org.run(false).unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.moved, 1);
        assert!(dir.path().join("song.mp3").is_file());
        assert!(dir.path().join("images/photo.jpg").is_file());
        assert!(summary.failures[0].1.contains("suffix attempts"));
    }

    #[test]
    fn candidate_cap_stops_collection_early() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("a.txt"));
        touch(&dir.path().join("b.txt"));
        touch(&dir.path().join("c.txt"));

        let org = organizer(dir.path()).with_limit(1);
        let summary = org.run(false).unwrap();
        assert_eq!(summary.moved, 1);
    }

    #[test]
    fn single_file_endpoint_moves_and_records() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("presentation_final_20250819.pptx");
        touch(&file);

        let org = organizer(dir.path());
        let summary = org.organize_file(&file, false).unwrap();

        assert_eq!(summary.moved, 1);
        assert!(dir
            .path()
            .join("presentations/presentation_final.pptx")
            .is_file());
        assert_eq!(org.history().read_all().unwrap().len(), 1);
    }

    #[test]
    fn single_file_endpoint_skips_organized_files() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("images/photo.jpg");
        touch(&file);

        let org = organizer(dir.path());
        let summary = org.organize_file(&file, false).unwrap();
        assert_eq!(summary.skipped, 1);
        assert!(file.is_file());
    }

    #[test]
    fn missing_single_file_is_an_error() {
        let dir = tempdir().unwrap();
        let org = organizer(dir.path());
        assert!(org.organize_file(&dir.path().join("gone.pdf"), false).is_err());
    }

    #[test]
    fn history_log_is_never_moved() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("doc.pdf"));

        let org = organizer(dir.path());
        org.run(false).unwrap();
        // The first pass created the log; a second pass must leave it alone.
        org.run(false).unwrap();
        assert!(dir.path().join(HISTORY_FILE_NAME).is_file());
    }

    #[test]
    fn all_noise_names_get_the_placeholder() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("20250819_132529.jpg"));

        let org = organizer(dir.path());
        let summary = org.run(false).unwrap();
        assert_eq!(summary.moved, 1);
        assert!(dir.path().join("images/file.jpg").is_file());
    }

    #[test]
    fn folder_counts_reflect_disk_state() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("a.jpg"));
        touch(&dir.path().join("b.jpg"));
        touch(&dir.path().join("pending.xyz"));

        let org = organizer(dir.path());
        org.organize_file(&dir.path().join("a.jpg"), false).unwrap();
        org.organize_file(&dir.path().join("b.jpg"), false).unwrap();

        let (per_category, pending) = org.folder_counts().unwrap();
        let images = per_category
            .iter()
            .find(|(label, _)| *label == "images")
            .unwrap();
        assert_eq!(images.1, 2);
        assert_eq!(pending, 1);
    }
}
