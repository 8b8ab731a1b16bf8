//! Header resolution. Source files spell the same column with spaces or
//! underscores and inconsistent case; every lookup goes through here.

use crate::error::{PipelineError, Result, Stage};

/// A logical column and the header spellings it may appear under.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
}

impl Column {
    pub const fn new(name: &'static str, aliases: &'static [&'static str]) -> Self {
        Column { name, aliases }
    }

    fn matches(&self, header: &str) -> bool {
        let header = normalize_header(header);
        std::iter::once(self.name)
            .chain(self.aliases.iter().copied())
            .any(|candidate| normalize_header(candidate).eq_ignore_ascii_case(&header))
    }
}

/// Spaces become underscores so `"AC Type"` and `"AC_Type"` compare equal.
pub fn normalize_header(header: &str) -> String {
    header.trim().replace(' ', "_")
}

pub fn find(headers: &[String], column: &Column) -> Option<usize> {
    headers.iter().position(|h| column.matches(h))
}

/// Resolves every wanted column to its index, failing on the first absent one.
pub fn resolve(
    stage: Stage,
    context: &str,
    headers: &[String],
    wanted: &[Column],
) -> Result<Vec<usize>> {
    wanted
        .iter()
        .map(|column| {
            find(headers, column).ok_or_else(|| PipelineError::Schema {
                stage,
                column: column.name.to_string(),
                context: context.to_string(),
            })
        })
        .collect()
}
