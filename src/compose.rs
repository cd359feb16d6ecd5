//! Prompt composition
//!
//! Builds the prompt text for each mode and splices the user's source text
//! into the `[]` placeholder right before dispatch.

use crate::catalog::{TaskPreset, QUALITIES};
use std::fmt;
use std::str::FromStr;

pub const PLACEHOLDER: &str = "[]";
pub const REWRITE_SUFFIX: &str = "Rewrite the following selection []";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Selections,
    Freeform,
    Tasks,
    Images,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Selections, Mode::Freeform, Mode::Tasks, Mode::Images];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Selections => "selections",
            Self::Freeform => "freeform",
            Self::Tasks => "tasks",
            Self::Images => "images",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "Unknown mode '{}'. Expected one of: selections, freeform, tasks, images",
                    s
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityToggle {
    pub name: String,
    pub selected: bool,
}

/// Writer, genre and quality choices for attribute mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelection {
    pub writer: String,
    pub style: String,
    pub qualities: Vec<QualityToggle>,
}

impl Default for AttributeSelection {
    fn default() -> Self {
        Self::with_qualities(QUALITIES.iter().copied())
    }
}

impl AttributeSelection {
    /// All toggles start off, in the given order.
    pub fn with_qualities<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            writer: String::new(),
            style: String::new(),
            qualities: names
                .into_iter()
                .map(|name| QualityToggle {
                    name: name.to_string(),
                    selected: false,
                })
                .collect(),
        }
    }

    /// Flip a toggle by name. Returns the new state, or `None` if unknown.
    pub fn toggle(&mut self, name: &str) -> Option<bool> {
        let quality = self
            .qualities
            .iter_mut()
            .find(|q| q.name.eq_ignore_ascii_case(name.trim()))?;
        quality.selected = !quality.selected;
        Some(quality.selected)
    }

    pub fn set_quality(&mut self, name: &str, selected: bool) -> bool {
        match self
            .qualities
            .iter_mut()
            .find(|q| q.name.eq_ignore_ascii_case(name.trim()))
        {
            Some(quality) => {
                quality.selected = selected;
                true
            }
            None => false,
        }
    }

    pub fn selected_qualities(&self) -> impl Iterator<Item = &str> {
        self.qualities
            .iter()
            .filter(|q| q.selected)
            .map(|q| q.name.as_str())
    }

    /// The qualities clause runs straight into the rewrite instruction with
    /// no separator.
    pub fn compose(&self) -> String {
        let mut prompt = String::new();

        if !self.writer.is_empty() {
            prompt.push_str(&format!("In the style of {}.\n", self.writer));
        }
        if !self.style.is_empty() {
            prompt.push_str(&format!("In the genre of {}.\n", self.style));
        }

        let qualities: Vec<&str> = self.selected_qualities().collect();
        if !qualities.is_empty() {
            prompt.push_str("Using the principals of ");
            prompt.push_str(&qualities.join(", "));
        }

        prompt.push_str(REWRITE_SUFFIX);
        prompt
    }
}

pub fn compose_task(task: &TaskPreset) -> String {
    task.description.to_string()
}

/// Splice `source` into the first `[]` of the trimmed prompt.
///
/// Later markers are left as they are.
pub fn insert_source_text(prompt: &str, source: &str) -> String {
    let prompt = prompt.trim();
    match prompt.split_once(PLACEHOLDER) {
        Some((prefix, remainder)) => format!("{}[{}]{}", prefix, source, remainder),
        None => prompt.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TASKS;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_insert_without_marker_is_trimmed_identity() {
        assert_eq!(
            insert_source_text("  Summarize this story.\n", "ignored"),
            "Summarize this story."
        );
    }

    #[test]
    fn test_insert_replaces_marker() {
        assert_eq!(insert_source_text("Rewrite []", "X"), "Rewrite [X]");
    }

    #[test]
    fn test_insert_only_first_marker() {
        assert_eq!(insert_source_text("A[]B[]C", "S"), "A[S]B[]C");
    }

    #[test]
    fn test_insert_marker_at_edges() {
        assert_eq!(insert_source_text("[] is my draft", "S"), "[S] is my draft");
        assert_eq!(insert_source_text("[]", ""), "[]");
    }

    #[test]
    fn test_compose_writer_and_quality() {
        let mut selection = AttributeSelection::default();
        selection.writer = "Jane Austen".to_string();
        selection.set_quality("show not tell", true);

        assert_eq!(
            selection.compose(),
            "In the style of Jane Austen.\nUsing the principals of show not tell\
             Rewrite the following selection []"
        );
    }

    #[test]
    fn test_compose_nothing_selected() {
        assert_eq!(
            AttributeSelection::default().compose(),
            "Rewrite the following selection []"
        );
    }

    #[test]
    fn test_compose_everything_keeps_insertion_order() {
        let mut selection =
            AttributeSelection::with_qualities(["increasing brevity", "evoking emotions"]);
        selection.writer = "Mark Twain".to_string();
        selection.style = "Horror".to_string();
        selection.set_quality("evoking emotions", true);
        selection.set_quality("increasing brevity", true);

        assert_eq!(
            selection.compose(),
            "In the style of Mark Twain.\nIn the genre of Horror.\n\
             Using the principals of increasing brevity, evoking emotions\
             Rewrite the following selection []"
        );
    }

    #[test]
    fn test_toggle_flips_and_reports_unknown() {
        let mut selection = AttributeSelection::default();
        assert_eq!(selection.toggle("Make Wordier"), Some(true));
        assert_eq!(selection.toggle("make wordier"), Some(false));
        assert_eq!(selection.toggle("be funny"), None);
    }

    #[test]
    fn test_compose_task_is_verbatim() {
        assert_eq!(compose_task(&TASKS[3]), TASKS[3].description);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Images".parse::<Mode>().unwrap(), Mode::Images);
        assert_eq!(" tasks ".parse::<Mode>().unwrap(), Mode::Tasks);
        assert!("poetry".parse::<Mode>().is_err());
    }
}
