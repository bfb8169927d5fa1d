use serde::{Deserialize, Serialize};

/// Prefix that always excludes a `.txt` file (parameter dumps)
pub const PARAMETER_PREFIX: &str = "para";
pub const MONKEY_PREFIX: &str = "monkey";
pub const BLOCK_PREFIX: &str = "block";

const CSV_SUFFIX: &str = ".csv";
const TXT_SUFFIX: &str = ".txt";

/// Filename rules for one transfer run. Built once and passed by reference;
/// nothing here is read from global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub include_csv: bool,
    pub include_txt: bool,
    pub exclude_monkey_prefix: bool,
    pub exclude_block_prefix: bool,
    pub custom_exclude_prefix: String,
    pub move_after_copy: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            include_csv: true,
            include_txt: false,
            exclude_monkey_prefix: false,
            exclude_block_prefix: false,
            custom_exclude_prefix: String::new(),
            move_after_copy: false,
        }
    }
}

impl FilterConfig {
    /// Whether a file with this name should be transferred.
    /// Only the name is inspected, never the path or the contents.
    pub fn is_eligible(&self, file_name: &str) -> bool {
        let name_lower = file_name.to_lowercase();

        if self.include_csv && name_lower.ends_with(CSV_SUFFIX) {
            true
        } else if self.include_txt && name_lower.ends_with(TXT_SUFFIX) {
            !self.is_excluded_txt(&name_lower)
        } else {
            false
        }
    }

    /// Trimmed, lowercased custom prefix, or None when blank
    pub fn custom_prefix(&self) -> Option<String> {
        let trimmed = self.custom_exclude_prefix.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
    }

    fn is_excluded_txt(&self, name_lower: &str) -> bool {
        if name_lower.starts_with(PARAMETER_PREFIX) {
            return true;
        }
        if self.exclude_monkey_prefix && name_lower.starts_with(MONKEY_PREFIX) {
            return true;
        }
        if self.exclude_block_prefix && name_lower.starts_with(BLOCK_PREFIX) {
            return true;
        }
        self.custom_prefix()
            .map(|prefix| name_lower.starts_with(&prefix))
            .unwrap_or(false)
    }
}
