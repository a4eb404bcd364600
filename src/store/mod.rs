pub mod roster;
pub mod tables;

pub use roster::{ClearConfirmation, RosterStore};
pub use tables::TableStore;

use crate::errors::{AppError, AppResult};

pub(crate) fn require_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Name is required."));
    }
    Ok(name.to_string())
}

pub(crate) fn normalize_category(category: Option<&str>) -> Option<String> {
    category
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
