//! Output comparison

/// Split into lines with trailing whitespace removed and trailing blank lines dropped
fn normalized_lines(s: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = s.lines().map(str::trim_end).collect();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines
}

/// Exact comparison after whitespace normalization
pub fn compare_output(actual: &str, expected: &str) -> bool {
    normalized_lines(actual) == normalized_lines(expected)
}

/// Token-wise comparison where numeric tokens may differ by at most `epsilon`.
/// Non-numeric tokens must match exactly.
pub fn compare_floats(actual: &str, expected: &str, epsilon: f64) -> bool {
    let mut actual = actual.split_whitespace();
    let mut expected = expected.split_whitespace();

    loop {
        match (actual.next(), expected.next()) {
            (None, None) => return true,
            (Some(a), Some(e)) => {
                if !tokens_match(a, e, epsilon) {
                    return false;
                }
            }
            _ => return false,
        }
    }
}

fn tokens_match(actual: &str, expected: &str, epsilon: f64) -> bool {
    match (actual.parse::<f64>(), expected.parse::<f64>()) {
        (Ok(a), Ok(e)) if a.is_finite() && e.is_finite() => (a - e).abs() <= epsilon,
        _ => actual == expected,
    }
}

/// Pick the comparison the problem declares
pub fn outputs_match(actual: &str, expected: &str, float_epsilon: Option<f64>) -> bool {
    match float_epsilon {
        Some(epsilon) => compare_floats(actual, expected, epsilon),
        None => compare_output(actual, expected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(compare_output("hello\nworld", "hello\nworld"));
    }

    #[test]
    fn test_trailing_whitespace_and_newlines() {
        assert!(compare_output("hello  \nworld\t\n\n\n", "hello\nworld"));
        assert!(compare_output("2\r\n", "2"));
        assert!(compare_output("", "\n\n"));
    }

    #[test]
    fn test_leading_and_inner_whitespace_matter() {
        assert!(!compare_output(" hello", "hello"));
        assert!(!compare_output("1  2", "1 2"));
        assert!(!compare_output("a\n\nb", "a\nb"));
    }

    #[test]
    fn test_mismatch() {
        assert!(!compare_output("3\n", "2\n"));
    }

    #[test]
    fn test_float_tolerance() {
        assert!(compare_floats("3.14159\n", "3.1416", 1e-3));
        assert!(!compare_floats("3.15", "3.1416", 1e-3));
        assert!(compare_floats("0.5 YES", "0.50000001 YES", 1e-6));
        assert!(!compare_floats("0.5 NO", "0.5 YES", 1e-6));
        assert!(!compare_floats("1 2", "1 2 3", 1e-6));
        assert!(!compare_floats("nan", "0", 1.0));
    }

    #[test]
    fn test_outputs_match_dispatch() {
        assert!(outputs_match("1.0001", "1.0", Some(1e-3)));
        assert!(!outputs_match("1.0001", "1.0", None));
    }
}
