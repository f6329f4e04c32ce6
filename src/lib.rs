//! TidyDrop - organizes files dropped into a watched folder

pub mod classifier;
pub mod cli;
pub mod config;
pub mod describe;
pub mod history;
pub mod normalizer;
pub mod organizer;
pub mod resolver;

// Re-exports for easy access
pub use classifier::CategoryMap;
pub use cli::{Cli, Commands};
pub use config::Config;
pub use describe::Describer;
pub use history::{HistoryStats, HistoryStore, OperationRecord};
pub use normalizer::Normalizer;
pub use organizer::{OrganizeError, OrganizeSummary, Organizer, PlannedMove};

// Export all constants
pub mod colors {
    use colored::Color;

    pub const SUCCESS: Color = Color::TrueColor { r: 77, g: 255, b: 157 };
    pub const HEADER: Color = Color::TrueColor { r: 157, g: 77, b: 255 };
    pub const PATH: Color = Color::TrueColor { r: 77, g: 195, b: 255 };
    pub const WARNING: Color = Color::TrueColor { r: 255, g: 217, b: 61 };
    pub const CATEGORY: Color = Color::TrueColor { r: 255, g: 154, b: 61 };
}

/// Current version of TidyDrop
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum files to collect in one pass before stopping early
pub const MAX_FILES_PER_PASS: usize = 5000;

/// Fallback category for unknown or missing extensions
pub const FALLBACK_CATEGORY: &str = "other";

/// Base name used when normalization strips every segment
pub const PLACEHOLDER_NAME: &str = "file";

/// History log file, kept inside the source root
pub const HISTORY_FILE_NAME: &str = ".tidydrop_history.jsonl";

/// OS metadata droppings that are never worth moving
pub const JUNK_FILES: &[&str] = &[
    ".DS_Store", "Thumbs.db", "desktop.ini", ".localized",
];

/// System paths to never touch
pub const SYSTEM_PATHS: &[&str] = &[
    r"C:\Windows", r"C:\Program Files", r"C:\ProgramData",
    r"C:\System Volume Information", "/System", "/usr",
    "/bin", "/sbin", "/etc", "/var", "/lib",
];

/// Extension -> category table, matched after lowercasing
pub const CATEGORY_TABLE: &[(&str, &[&str])] = &[
    ("images", &["jpg", "jpeg", "png", "gif", "bmp", "svg", "webp", "tiff"]),
    ("documents", &["pdf", "doc", "docx", "txt", "rtf", "odt", "pages"]),
    ("spreadsheets", &["xls", "xlsx", "csv", "ods", "numbers"]),
    ("presentations", &["ppt", "pptx", "odp", "key"]),
    ("videos", &["mp4", "avi", "mkv", "mov", "wmv", "flv", "webm", "m4v"]),
    ("audio", &["mp3", "wav", "flac", "aac", "ogg", "wma", "m4a"]),
    ("archives", &["zip", "rar", "7z", "tar", "gz", "bz2", "xz"]),
    ("executables", &["exe", "msi", "dmg", "pkg", "deb", "rpm", "appimage"]),
    ("code", &["py", "js", "html", "css", "java", "cpp", "c", "php", "rb", "go"]),
    ("fonts", &["ttf", "otf", "woff", "woff2", "eot"]),
];
