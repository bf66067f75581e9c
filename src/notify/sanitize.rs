//! Input scrubbing for relayed contact-form fields.

/// Maximum length of a relayed field, in characters.
const MAX_FIELD_CHARS: usize = 500;

/// Strips HTML tags and truncates to the relay field limit.
#[must_use]
pub fn clean_field(input: &str) -> String {
    let stripped = strip_html(input);
    stripped.trim().chars().take(MAX_FIELD_CHARS).collect()
}

/// Removes everything between `<` and `>`, inclusive. Unclosed tags are
/// dropped through to the end of the input.
#[must_use]
pub fn strip_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for ch in input.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_simple_tags() {
        assert_eq!(strip_html("<b>hello</b> world"), "hello world");
        assert_eq!(
            strip_html("<script>alert(1)</script>hi"),
            "alert(1)hi"
        );
    }

    #[test]
    fn unclosed_tag_swallows_the_rest() {
        assert_eq!(strip_html("before <img src=x onerror"), "before ");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(strip_html("no markup here"), "no markup here");
    }

    #[test]
    fn clean_field_trims_and_truncates() {
        let long = "a".repeat(600);
        assert_eq!(clean_field(&long).chars().count(), 500);
        assert_eq!(clean_field("  padded  "), "padded");
    }
}
