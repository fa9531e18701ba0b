use serde::{Deserialize, Serialize};

/// Coarse candidate selection applied by the store before any scoring.
///
/// The prefilter only narrows the set of records handed to the scorer; it
/// never decides a match on its own. `FullScan` hands every record over and
/// is the mode to use when the caller needs results that depend on the
/// similarity threshold alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PrefilterMode {
    /// Literal, case-sensitive containment (`LIKE '%filter%'`).
    #[default]
    Substring,
    /// Return every record.
    FullScan,
}

impl PrefilterMode {
    /// Whether `value` survives the prefilter for `filter`.
    ///
    /// For comma-delimited fields the filter is split the same way the token
    /// matcher splits it and every piece must occur somewhere in `value`.
    pub fn admits(self, value: &str, filter: &str, multi_valued: bool) -> bool {
        match self {
            PrefilterMode::FullScan => true,
            PrefilterMode::Substring if multi_valued => {
                filter.split(',').all(|token| value.contains(token))
            }
            PrefilterMode::Substring => value.contains(filter),
        }
    }
}
