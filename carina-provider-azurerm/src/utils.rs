//! Utility functions for value normalization

/// Normalize an Azure location (e.g., "West Europe" -> "westeurope")
pub fn normalize_location(s: &str) -> String {
    s.chars()
        .filter(|c| *c != ' ')
        .flat_map(char::to_lowercase)
        .collect()
}
