use crate::font::TextMeasurer;

/// Splits on hard line breaks. Empty segments survive so that consecutive
/// newlines produce blank lines.
pub(crate) fn split_hard_breaks(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|segment| segment.strip_suffix('\r').unwrap_or(segment))
        .collect()
}

/// Collapses runs of whitespace inside a segment to single spaces.
pub(crate) fn normalize_segment(segment: &str) -> String {
    segment.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Greedy word wrap: hard breaks first, then each segment is filled word by
/// word while the measured width stays within `max_width`.
pub fn wrap_text(
    text: &str,
    max_width: f32,
    font_size: f32,
    measurer: &dyn TextMeasurer,
) -> Vec<String> {
    let mut lines = Vec::new();
    for segment in split_hard_breaks(text) {
        lines.extend(wrap_segment(segment, max_width, font_size, measurer));
    }
    lines
}

fn wrap_segment(
    segment: &str,
    max_width: f32,
    font_size: f32,
    measurer: &dyn TextMeasurer,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in segment.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{} {}", current, word);
        if measurer.measure(&candidate, font_size) > max_width {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        } else {
            current = candidate;
        }
    }

    // A blank segment still occupies a line.
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::EstimatedMetrics;

    /// Every character is exactly one font-size wide.
    struct Monospace;

    impl TextMeasurer for Monospace {
        fn measure(&self, text: &str, font_size: f32) -> f32 {
            text.chars().count() as f32 * font_size
        }
    }

    #[test]
    fn greedy_fill() {
        let lines = wrap_text("aa bb cc dd", 5.0, 1.0, &Monospace);
        assert_eq!(lines, vec!["aa bb", "cc dd"]);
    }

    #[test]
    fn overflowing_word_starts_new_line() {
        let lines = wrap_text("a bbbbbbbb c", 5.0, 1.0, &Monospace);
        assert_eq!(lines, vec!["a", "bbbbbbbb", "c"]);
    }

    #[test]
    fn single_long_word_is_never_split() {
        let word = "x".repeat(60);
        let lines = wrap_text(&word, 10.0, 1.0, &Monospace);
        assert_eq!(lines, vec![word]);
    }

    #[test]
    fn hard_breaks_preserve_empty_lines() {
        let lines = wrap_text("one\n\ntwo\n", 100.0, 1.0, &Monospace);
        assert_eq!(lines, vec!["one", "", "two", ""]);
    }

    #[test]
    fn hard_breaks_are_wrapped_independently() {
        let lines = wrap_text("aa bb cc\ndd", 5.0, 1.0, &Monospace);
        assert_eq!(lines, vec!["aa bb", "cc", "dd"]);
    }

    #[test]
    fn crlf_is_a_hard_break() {
        let lines = wrap_text("a\r\nb", 100.0, 1.0, &Monospace);
        assert_eq!(lines, vec!["a", "b"]);
    }

    #[test]
    fn rewrapping_is_idempotent() {
        let text = "the quick brown fox jumps over the lazy dog and keeps running";
        for width in [60.0, 120.0, 200.0, 400.0] {
            let first = wrap_text(text, width, 20.0, &EstimatedMetrics);
            let joined = first.join(" ");
            let second = wrap_text(&joined, width, 20.0, &EstimatedMetrics);
            assert_eq!(first, second, "width {width}");
        }
    }

    #[test]
    fn whitespace_runs_collapse() {
        assert_eq!(normalize_segment("  a   b\tc "), "a b c");
        let lines = wrap_text("a    b", 100.0, 1.0, &Monospace);
        assert_eq!(lines, vec!["a b"]);
    }
}
