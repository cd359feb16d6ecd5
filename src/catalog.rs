//! Static choices offered to the user: writers, genres, qualities and task
//! presets. Preset descriptions live under `data/tasks/`.

/// A fixed task preset. Selecting one replaces the prompt text wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskPreset {
    pub label: &'static str,
    pub description: &'static str,
}

pub const WRITERS: &[&str] = &[
    "Steven King",
    "J.R.R. Tolkien",
    "Franz Kafka",
    "William Faulkner",
    "Edgar Allan Poe",
    "James Joyce",
    "Mark Twain",
    "Jules Verne",
    "Jane Austen",
    "Herman Melville",
    "H.P. Lovecraft",
    "Isaac Asimov",
    "Arthur C. Clarke",
    "Robert Heinlein",
    "Ernest Hemingway",
    "Jack Kerouac",
    "Hunter S. Thompson",
];

pub const STYLES: &[&str] = &[
    "Epic Fantasy",
    "Sci-Fi",
    "Hard Boiled",
    "Gonzo Journalism",
    "Light Fantasy",
    "Horror",
];

pub const QUALITIES: &[&str] = &[
    "show not tell",
    "evoking emotions",
    "increasing brevity",
    "increasing suspense",
    "make wordier",
    "keeping all original elements",
];

pub const TASKS: &[TaskPreset] = &[
    TaskPreset {
        label: "Provide feedback and suggestions for improvement",
        description: include_str!("../data/tasks/feedback.txt"),
    },
    TaskPreset {
        label: "Edit for grammatical errors",
        description: include_str!("../data/tasks/grammar.txt"),
    },
    TaskPreset {
        label: "Show Not Tell",
        description: include_str!("../data/tasks/show_not_tell.txt"),
    },
    TaskPreset {
        label: "dialog",
        description: include_str!("../data/tasks/dialog.txt"),
    },
];

/// Look up a preset by exact label, case-insensitively.
pub fn find_task(label: &str) -> Option<&'static TaskPreset> {
    TASKS
        .iter()
        .find(|task| task.label.eq_ignore_ascii_case(label.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_task_has_a_placeholder() {
        for task in TASKS {
            assert!(task.description.contains("[]"), "{}", task.label);
        }
    }

    #[test]
    fn test_task_descriptions_have_no_trailing_newline() {
        for task in TASKS {
            assert_eq!(task.description, task.description.trim_end(), "{}", task.label);
        }
    }

    #[test]
    fn test_find_task_ignores_case() {
        let task = find_task("show not tell").unwrap();
        assert_eq!(task.label, "Show Not Tell");
        assert!(find_task("summarize").is_none());
    }

    #[test]
    fn test_lists_are_non_empty() {
        assert!(!WRITERS.is_empty());
        assert!(!STYLES.is_empty());
        assert!(!QUALITIES.is_empty());
    }
}
