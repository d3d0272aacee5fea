//! Fixed-width text helpers
//!
//! Receipt layout works in characters, not bytes: every helper here counts
//! `char`s so multi-byte UTF-8 names pad the same as ASCII.

/// Character width of a string
pub fn text_width(s: &str) -> usize {
    s.chars().count()
}

/// Truncate a string to at most `max_width` characters
pub fn truncate(s: &str, max_width: usize) -> String {
    s.chars().take(max_width).collect()
}

/// Pad a string to a specific width
///
/// If the string is longer than the width, it will be truncated.
pub fn pad(s: &str, width: usize, align_right: bool) -> String {
    let current_width = text_width(s);
    if current_width >= width {
        return truncate(s, width);
    }
    let spaces = width - current_width;
    if align_right {
        format!("{}{}", " ".repeat(spaces), s)
    } else {
        format!("{}{}", s, " ".repeat(spaces))
    }
}

/// Center a string within `width`
///
/// Left padding is `floor(gap / 2)`, the remainder goes right. Strings at
/// least as wide as the line are truncated.
pub fn center(s: &str, width: usize) -> String {
    let current_width = text_width(s);
    if current_width >= width {
        return truncate(s, width);
    }
    let gap = width - current_width;
    let left = gap / 2;
    let right = gap - left;
    format!("{}{}{}", " ".repeat(left), s, " ".repeat(right))
}

/// Left and right text on one line, spaces filling the gap
///
/// When both halves do not fit, they are joined by a single space and the
/// result is cut to `width`.
pub fn line_lr(left: &str, right: &str, width: usize) -> String {
    let lw = text_width(left);
    let rw = text_width(right);

    if lw + rw >= width {
        pad(&format!("{} {}", left, right), width, false)
    } else {
        format!("{}{}{}", left, " ".repeat(width - lw - rw), right)
    }
}

/// Split text into chunks of at most `width` characters, breaking on spaces
/// where possible
pub fn wrap(s: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in s.split_whitespace() {
        let mut word = word.to_string();
        // Hard-split words longer than a line
        while text_width(&word) > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let head = truncate(&word, width);
            word = word.chars().skip(width).collect();
            lines.push(head);
        }
        if word.is_empty() {
            continue;
        }

        let needed = if current.is_empty() {
            text_width(&word)
        } else {
            text_width(&current) + 1 + text_width(&word)
        };
        if needed > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_width() {
        assert_eq!(text_width("hello"), 5);
        assert_eq!(text_width("چائے"), 4);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello world", 5), "hello");
        assert_eq!(truncate("hi", 5), "hi");
    }

    #[test]
    fn test_pad() {
        assert_eq!(pad("hi", 5, false), "hi   ");
        assert_eq!(pad("hi", 5, true), "   hi");
        assert_eq!(pad("hello world", 5, false), "hello");
    }

    #[test]
    fn test_center_symmetry() {
        for s in ["", "a", "TEST RECEIPT", "THANK YOU!", "odd length text"] {
            let c = center(s, 48);
            assert_eq!(text_width(&c), 48);
            assert_eq!(c.trim(), s.trim());

            let left = c.len() - c.trim_start().len();
            let right = c.len() - c.trim_end().len();
            if !s.is_empty() {
                assert!(left.abs_diff(right) <= 1, "{:?}", c);
                assert!(left <= right);
            }
        }
    }

    #[test]
    fn test_center_too_long() {
        let s = "x".repeat(60);
        assert_eq!(center(&s, 48), "x".repeat(48));
    }

    #[test]
    fn test_line_lr() {
        let line = line_lr("TOTAL:", "Rs.100.00", 20);
        assert_eq!(line, "TOTAL:     Rs.100.00");
        assert_eq!(text_width(&line_lr(&"a".repeat(30), "b", 20)), 20);
    }

    #[test]
    fn test_wrap() {
        assert_eq!(
            wrap("House 12, Street 4, Quetta", 12),
            vec!["House 12,", "Street 4,", "Quetta"]
        );
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert!(wrap("   ", 10).is_empty());
    }
}
