//! Naming and visibility of uploaded objects.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// How an uploaded object is named in its container or share.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectNaming {
    /// `<uuid-v4><original extension>`, e.g. `1b4e...c9.png`.
    RandomId,
    /// `<yyyyMMdd_HHmmss>_<original filename>` in UTC.
    Timestamped,
}

impl ObjectNaming {
    /// Name for an object uploaded as `original_filename` at `now`.
    ///
    /// Any directory components of `original_filename` are discarded.
    #[must_use]
    pub fn object_name(self, original_filename: &str, now: DateTime<Utc>) -> String {
        let file_name = base_name(original_filename);
        match self {
            Self::RandomId => {
                let extension = file_name
                    .rfind('.')
                    .filter(|&dot| dot > 0)
                    .and_then(|dot| file_name.get(dot..))
                    .unwrap_or("");
                format!("{}{}", Uuid::new_v4(), extension.to_ascii_lowercase())
            }
            Self::Timestamped => format!("{}_{file_name}", now.format("%Y%m%d_%H%M%S")),
        }
    }
}

/// Anonymous access level of a blob container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Blobs can be read anonymously by URL.
    PublicRead,
    /// Only authenticated requests can read.
    Private,
}

fn base_name(path: &str) -> &str {
    let trimmed = path.trim();
    trimmed
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("upload")
}
