//! File and directory eligibility rules
//!
//! Directories are pruned by name. Files go through an ordered policy where
//! the first matching rule wins: hidden, size, extension deny-list,
//! extension allow-list, well-known extensionless names, then MIME sniffing.

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Default maximum indexable file size (5 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Hidden directories that are still worth indexing
const HIDDEN_DIR_ALLOWLIST: &[&str] = &[".github", ".gitlab", ".circleci"];

/// Directory names that are never descended into
const SKIP_DIRS: &[&str] = &[
    // Version control
    ".git", ".svn", ".hg", ".bzr",
    // Python
    "__pycache__", ".pytest_cache", ".mypy_cache", ".tox", "venv", "env", ".env",
    "virtualenv", ".venv", ".eggs", "htmlcov",
    // Node.js
    "node_modules", ".npm", ".yarn", ".pnpm-store",
    // Frontend frameworks
    ".next", ".nuxt", ".svelte-kit", ".gatsby", ".cache", ".output", ".parcel-cache",
    // IDE and editors
    ".idea", ".vscode", ".vs", ".sublime", ".atom", ".settings", ".project", ".classpath",
    // Build output
    "dist", "build", "out", "target", "bin", "obj", ".gradle", ".maven",
    // System and temporary
    ".DS_Store", "Thumbs.db", ".Trash", "$RECYCLE.BIN", "tmp", "temp", "cache", "logs",
    // Other
    "vendor", "packages", ".bundle", "coverage", ".terraform", ".serverless", ".aws-sam",
];

/// Glob patterns matched against directory names
const SKIP_DIR_PATTERNS: &[&str] = &["*.egg-info"];

/// Dotfiles that are indexed despite being hidden
const HIDDEN_FILE_ALLOWLIST: &[&str] = &[
    ".gitignore",
    ".gitattributes",
    ".editorconfig",
    ".env",
    ".env.example",
];

/// Extensions that are never text
const SKIP_EXTENSIONS: &[&str] = &[
    // Executables and libraries
    ".exe", ".dll", ".so", ".dylib", ".sys", ".com", ".app", ".deb", ".rpm", ".dmg", ".pkg",
    ".msi", ".apk",
    // Compiled artifacts
    ".o", ".obj", ".pyc", ".pyo", ".pyd", ".class", ".jar", ".war", ".beam", ".elc", ".out",
    ".a", ".lib",
    // Archives
    ".zip", ".rar", ".7z", ".tar", ".gz", ".bz2", ".xz", ".tgz", ".iso", ".cab",
    // Images
    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".svg", ".ico", ".webp", ".tiff", ".tif", ".psd",
    ".ai", ".eps", ".raw",
    // Audio and video
    ".mp3", ".mp4", ".avi", ".mkv", ".mov", ".wmv", ".flv", ".webm", ".wav", ".flac", ".aac",
    ".ogg", ".wma", ".m4a", ".opus", ".mpg", ".mpeg", ".3gp", ".m4v",
    // Office and documents
    ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".odt", ".ods", ".odp", ".pdf", ".epub",
    ".mobi",
    // Fonts
    ".ttf", ".otf", ".woff", ".woff2", ".eot",
    // Databases
    ".db", ".sqlite", ".sqlite3", ".mdb", ".accdb",
    // Other binary data
    ".bin", ".dat", ".data", ".dump", ".img",
    // Models and weights
    ".h5", ".hdf5", ".pkl", ".pickle", ".npy", ".npz", ".model", ".weights", ".onnx", ".pb",
    ".pth", ".pt",
    // Temporary files and backups
    ".tmp", ".temp", ".cache", ".swp", ".swo", ".swn", ".bak", ".backup", ".old", ".orig",
];

/// Extensions that are always text
const TEXT_EXTENSIONS: &[&str] = &[
    // Source code
    ".py", ".pyw", ".pyx", ".pyi", ".js", ".jsx", ".ts", ".tsx", ".mjs", ".cjs", ".java", ".c",
    ".cpp", ".cc", ".cxx", ".h", ".hpp", ".hxx", ".cs", ".vb", ".fs", ".go", ".rs", ".php",
    ".phtml", ".rb", ".erb", ".swift", ".kt", ".kts", ".scala", ".r", ".m", ".mm", ".lua", ".pl",
    ".pm", ".sh", ".bash", ".zsh", ".fish", ".bat", ".cmd", ".ps1",
    // Markup and configuration
    ".html", ".htm", ".xhtml", ".xml", ".xsl", ".xslt", ".css", ".scss", ".sass", ".less",
    ".json", ".jsonc", ".yaml", ".yml", ".toml", ".ini", ".cfg", ".conf", ".config",
    ".properties", ".env",
    // Documentation and plain text
    ".txt", ".text", ".md", ".markdown", ".mdown", ".rst", ".tex", ".latex", ".org", ".log",
    ".csv", ".tsv",
    // Build and project files
    ".makefile", ".mk", ".gradle", ".cmake", ".dockerfile",
    // Other development formats
    ".sql", ".graphql", ".gql", ".proto", ".vue", ".svelte",
];

/// Extensionless file names (compared lowercase) that are text
const KNOWN_TEXT_NAMES: &[&str] = &[
    "makefile", "dockerfile", "rakefile", "gemfile", "pipfile", "procfile", "vagrantfile",
    "jenkinsfile", "justfile", "brewfile", "readme", "license", "licence", "copying", "authors",
    "contributors", "notice", "changelog", "todo",
];

/// Non-`text/*` MIME types that are still line-oriented text
const TEXT_MIME_TYPES: &[&str] = &["application/json", "application/xml"];

/// Why a file was accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexReason {
    TextExt,
    KnownText,
    MimeText,
}

/// Why a file was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Hidden,
    Error,
    Empty,
    TooLarge,
    SkipExt,
    Unknown,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Hidden => "hidden",
            SkipReason::Error => "error",
            SkipReason::Empty => "empty",
            SkipReason::TooLarge => "too_large",
            SkipReason::SkipExt => "skip_ext",
            SkipReason::Unknown => "unknown",
        }
    }

    /// Human label used in run summaries
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::Hidden => "hidden files",
            SkipReason::Error => "read errors",
            SkipReason::Empty => "empty files",
            SkipReason::TooLarge => "too large",
            SkipReason::SkipExt => "binary/media files",
            SkipReason::Unknown => "unknown type",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of classifying a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Index(IndexReason),
    Skip(SkipReason),
}

/// Classification result plus the size observed while classifying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileCheck {
    pub eligibility: Eligibility,
    pub size: u64,
}

impl FileCheck {
    fn skip(reason: SkipReason, size: u64) -> Self {
        Self {
            eligibility: Eligibility::Skip(reason),
            size,
        }
    }

    fn index(reason: IndexReason, size: u64) -> Self {
        Self {
            eligibility: Eligibility::Index(reason),
            size,
        }
    }
}

/// Lowercase extension of a file name including the dot, or an empty string
pub fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Applies the directory and file eligibility rules
#[derive(Debug, Clone)]
pub struct Classifier {
    max_file_size: u64,
    skip_dir_globs: GlobSet,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_SIZE)
    }
}

impl Classifier {
    pub fn new(max_file_size: u64) -> Self {
        let mut builder = GlobSetBuilder::new();
        for pattern in SKIP_DIR_PATTERNS {
            match Glob::new(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => tracing::warn!(pattern, error = %e, "invalid directory skip pattern"),
            }
        }
        let skip_dir_globs = builder.build().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to build directory skip patterns");
            GlobSet::empty()
        });

        Self {
            max_file_size,
            skip_dir_globs,
        }
    }

    /// Whether a directory with this name should be pruned from the walk
    pub fn should_skip_dir(&self, name: &str) -> bool {
        if name.starts_with('.') && !HIDDEN_DIR_ALLOWLIST.contains(&name) {
            return true;
        }
        SKIP_DIRS.contains(&name) || self.skip_dir_globs.is_match(name)
    }

    /// Classify a file on disk, reading its size from the filesystem
    pub fn classify_file(&self, path: &Path) -> FileCheck {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let size = std::fs::metadata(path).map(|m| m.len());
        self.classify(&name, path, size)
    }

    /// Classify a file given its name and an already observed size
    pub fn classify(&self, name: &str, path: &Path, size: std::io::Result<u64>) -> FileCheck {
        if name.starts_with('.') && !HIDDEN_FILE_ALLOWLIST.contains(&name) {
            return FileCheck::skip(SkipReason::Hidden, 0);
        }

        let size = match size {
            Ok(size) => size,
            Err(_) => return FileCheck::skip(SkipReason::Error, 0),
        };
        if size == 0 {
            return FileCheck::skip(SkipReason::Empty, 0);
        }
        if size > self.max_file_size {
            return FileCheck::skip(SkipReason::TooLarge, size);
        }

        let ext = extension_of(name);
        if SKIP_EXTENSIONS.contains(&ext.as_str()) {
            return FileCheck::skip(SkipReason::SkipExt, size);
        }
        if TEXT_EXTENSIONS.contains(&ext.as_str()) {
            return FileCheck::index(IndexReason::TextExt, size);
        }

        let lower = name.to_lowercase();
        if (ext.is_empty() && KNOWN_TEXT_NAMES.contains(&lower.as_str()))
            || HIDDEN_FILE_ALLOWLIST.contains(&name)
        {
            return FileCheck::index(IndexReason::KnownText, size);
        }

        if let Some(mime) = mime_guess::from_path(path).first() {
            if mime.type_().as_str() == "text" || TEXT_MIME_TYPES.contains(&mime.essence_str()) {
                return FileCheck::index(IndexReason::MimeText, size);
            }
        }

        FileCheck::skip(SkipReason::Unknown, size)
    }
}
