use std::fmt;

use serde::Serialize;

/// mpv shows this as the title while a streaming URL is still resolving.
pub const UNRESOLVED_PREFIX: &str = "playlist";
pub const MAX_TITLE_CHARS: usize = 30;
const SUFFIX: &str = "...";

/// The line Waybar reads from a custom module with `"return-type": "json"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Status {
    pub text: String,
    pub class: String,
}

impl Status {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn playing(title: &str) -> Self {
        let mut text = if title.starts_with(UNRESOLVED_PREFIX) {
            "Connecting".to_string()
        } else {
            title.chars().take(MAX_TITLE_CHARS).collect()
        };
        text.push_str(SUFFIX);
        Self {
            text,
            class: "playing".into(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_title_is_cut_to_thirty_chars() {
        let title = "abcdefghijklmnopqrstuvwxyz0123456789ABCDEFGHI";
        assert_eq!(title.len(), 45);
        let st = Status::playing(title);
        assert_eq!(st.text, "abcdefghijklmnopqrstuvwxyz0123...");
        assert_eq!(st.class, "playing");
    }

    #[test]
    fn short_title_is_kept() {
        assert_eq!(Status::playing("Lofi radio").text, "Lofi radio...");
        assert_eq!(Status::playing("").text, "...");
    }

    #[test]
    fn truncation_counts_chars_not_bytes() {
        let title = "日本語".repeat(15);
        let st = Status::playing(&title);
        assert_eq!(st.text.chars().count(), MAX_TITLE_CHARS + SUFFIX.len());
        assert!(st.text.starts_with("日本語日本語"));
    }

    #[test]
    fn placeholder_becomes_connecting() {
        let st = Status::playing("playlist?list=PLx0sYbCqOb8TBPRdmBHs5Iftvv9TPboYG&some=very-long-tail");
        assert_eq!(st.text, "Connecting...");
        assert_eq!(Status::playing("playlist").text, "Connecting...");
    }

    #[test]
    fn renders_waybar_json() {
        assert_eq!(Status::idle().to_string(), r#"{"text":"","class":""}"#);
        assert_eq!(
            Status::playing("Song").to_string(),
            r#"{"text":"Song...","class":"playing"}"#
        );
    }
}
