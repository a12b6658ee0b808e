use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// LSP language identifier sent with `textDocument/didOpen`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Language(Cow<'static, str>);

impl Language {
    pub const TYPESCRIPT: Language = Language(Cow::Borrowed("typescript"));
    pub const TYPESCRIPT_REACT: Language = Language(Cow::Borrowed("typescriptreact"));
    pub const JAVASCRIPT: Language = Language(Cow::Borrowed("javascript"));
    pub const JAVASCRIPT_REACT: Language = Language(Cow::Borrowed("javascriptreact"));
    pub const PYTHON: Language = Language(Cow::Borrowed("python"));
    pub const RUST: Language = Language(Cow::Borrowed("rust"));
    pub const GO: Language = Language(Cow::Borrowed("go"));
    pub const JAVA: Language = Language(Cow::Borrowed("java"));
    pub const RUBY: Language = Language(Cow::Borrowed("ruby"));
    pub const CSHARP: Language = Language(Cow::Borrowed("csharp"));
    pub const PHP: Language = Language(Cow::Borrowed("php"));
    pub const PLAINTEXT: Language = Language(Cow::Borrowed("plaintext"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Map a file extension (with or without the leading dot) to a language id.
    pub fn from_extension(ext: &str) -> Self {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "ts" | "mts" | "cts" => Self::TYPESCRIPT,
            "tsx" => Self::TYPESCRIPT_REACT,
            "js" | "mjs" | "cjs" => Self::JAVASCRIPT,
            "jsx" => Self::JAVASCRIPT_REACT,
            "py" | "pyi" => Self::PYTHON,
            "rs" => Self::RUST,
            "go" => Self::GO,
            "java" => Self::JAVA,
            "rb" => Self::RUBY,
            "cs" => Self::CSHARP,
            "php" => Self::PHP,
            _ => Self::PLAINTEXT,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Language {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

impl AsRef<str> for Language {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
