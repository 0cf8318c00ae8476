//! Narrative text preparation
//!
//! Instructors embed pacing cues for the voice-over talent in the narrative
//! text. Lines consisting only of such a cue are stripped before rendering:
//!
//! - `[pause]`, `[pause 2s]`, `[PAUSE: breathe]`, `[...]`
//! - SSML-style breaks: `<break/>`, `<break time="3s"/>`

/// Narrative split into renderable lines
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NarrativeScript {
    pub lines: Vec<String>,
    /// Number of cue lines removed
    pub markers_removed: usize,
}

impl NarrativeScript {
    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }
}

/// Whether a line is nothing but a pacing cue
pub fn is_pause_marker(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return false;
    }
    let lower = trimmed.to_ascii_lowercase();

    if let Some(inner) = lower.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        let inner = inner.trim();
        return inner == "..."
            || inner
                .strip_prefix("pause")
                .map_or(false, |rest| rest.is_empty() || rest.starts_with(&[' ', ':', '-', '='][..]));
    }

    lower.starts_with("<break") && lower.ends_with("/>")
}

/// Strip cue lines and trailing blank lines
pub fn parse_narrative(text: &str) -> NarrativeScript {
    let mut script = NarrativeScript::default();
    for line in text.lines() {
        if is_pause_marker(line) {
            script.markers_removed += 1;
        } else {
            script.lines.push(line.trim_end().to_string());
        }
    }
    while script.lines.last().map_or(false, |l| l.is_empty()) {
        script.lines.pop();
    }
    script
}
