//! Per-project settings: data shape and wire form.
//!
//! The wire form is a plain JSON object with every field defaulted, so blobs
//! written by older or newer builds round-trip: unknown fields are ignored,
//! missing fields fall back to defaults.

use serde::{Deserialize, Serialize};

/// Note ordering within a project. `None` means "follow the global sort".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    None,
    ModificationDate,
    CreationDate,
    Title,
}

/// Sort direction. Always one of the two variants, never unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

/// Settings owned by a single project, keyed by its location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    pub sort_by: SortBy,
    pub sort_direction: SortDirection,
    pub show_in_common_list: bool,
    pub first_line_as_title: bool,
    pub show_nested_folders_content: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_origin: Option<String>,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            sort_by: SortBy::None,
            sort_direction: SortDirection::Descending,
            show_in_common_list: true,
            first_line_as_title: true,
            show_nested_folders_content: true,
            git_origin: None,
        }
    }
}

impl ProjectSettings {
    /// True while no setting has been changed from its default.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_are_stable() {
        let mut settings = ProjectSettings::default();
        settings.sort_by = SortBy::ModificationDate;
        settings.sort_direction = SortDirection::Ascending;
        settings.git_origin = Some("https://example.com/repo.git".to_string());

        let json = serde_json::to_string(&settings).expect("serialize");
        assert!(json.contains("\"sort_by\":\"modification_date\""));
        assert!(json.contains("\"sort_direction\":\"ascending\""));
        assert!(json.contains("\"git_origin\""));
    }

    #[test]
    fn missing_fields_default() {
        let settings: ProjectSettings =
            serde_json::from_str("{\"sort_by\":\"title\"}").expect("parse");
        assert_eq!(settings.sort_by, SortBy::Title);
        assert_eq!(settings.sort_direction, SortDirection::Descending);
        assert!(settings.show_in_common_list);
        assert!(settings.git_origin.is_none());
    }

    #[test]
    fn unknown_fields_ignored() {
        let settings: ProjectSettings =
            serde_json::from_str("{\"first_line_as_title\":false,\"added_in_v9\":42}")
                .expect("parse");
        assert!(!settings.first_line_as_title);
    }

    #[test]
    fn default_origin_omitted_from_wire() {
        let json = serde_json::to_string(&ProjectSettings::default()).expect("serialize");
        assert!(!json.contains("git_origin"));
    }
}
