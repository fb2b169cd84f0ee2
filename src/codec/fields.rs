//! Field-level CSV primitives shared by the subscription and template readers.

/// Quote a field if it contains a comma, a double quote, or a newline.
/// Internal quotes are doubled.
pub fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Split one line into fields.
///
/// A `"` toggles quoted mode, except that `""` inside quoted mode is a
/// literal quote. Commas separate fields only outside quoted mode. An
/// unterminated quote runs to the end of the line. Fields are not trimmed.
pub fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);

    fields
}

/// Parse the longest leading decimal number, ignoring anything after it:
/// `"12abc"` is 12, `"abc"` is None. Leading whitespace is skipped.
pub fn parse_leading_float(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    // Exponent only counts if at least one digit follows it.
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

/// Render a number the way the CSV expects: plain decimal, no grouping,
/// no trailing `.0` on whole numbers.
pub fn format_number(n: f64) -> String {
    // -0 would otherwise render as "-0".
    if n == 0.0 {
        return "0".to_string();
    }
    n.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_plain() {
        assert_eq!(escape_field("Netflix"), "Netflix");
        assert_eq!(escape_field(""), "");
    }

    #[test]
    fn test_escape_comma_and_quote() {
        assert_eq!(escape_field(r#"Acme, "Pro""#), r#""Acme, ""Pro""""#);
        assert_eq!(escape_field("a\nb"), "\"a\nb\"");
    }

    #[test]
    fn test_split_simple() {
        assert_eq!(split_line("a,b,,c"), vec!["a", "b", "", "c"]);
        assert_eq!(split_line(""), vec![""]);
        assert_eq!(split_line("a,"), vec!["a", ""]);
    }

    #[test]
    fn test_split_quoted() {
        assert_eq!(
            split_line(r#"1,"Acme, ""Pro""",3"#),
            vec!["1", r#"Acme, "Pro""#, "3"]
        );
        assert_eq!(split_line(r#""""#), vec![""]);
    }

    #[test]
    fn test_split_quote_mid_field_toggles() {
        // Quotes are stripped wherever they appear.
        assert_eq!(split_line(r#"ab"c,d"e"#), vec!["abc,de"]);
    }

    #[test]
    fn test_split_unterminated_quote() {
        assert_eq!(split_line(r#"a,"b,c"#), vec!["a", "b,c"]);
    }

    #[test]
    fn test_leading_float() {
        assert_eq!(parse_leading_float("1490"), Some(1490.0));
        assert_eq!(parse_leading_float("9.99"), Some(9.99));
        assert_eq!(parse_leading_float(".5"), Some(0.5));
        assert_eq!(parse_leading_float("5."), Some(5.0));
        assert_eq!(parse_leading_float("-3"), Some(-3.0));
        assert_eq!(parse_leading_float("12abc"), Some(12.0));
        assert_eq!(parse_leading_float("1e3"), Some(1000.0));
        assert_eq!(parse_leading_float("1e"), Some(1.0));
        assert_eq!(parse_leading_float("1,000"), Some(1.0));
        assert_eq!(parse_leading_float("abc"), None);
        assert_eq!(parse_leading_float("."), None);
        assert_eq!(parse_leading_float("-"), None);
        assert_eq!(parse_leading_float(""), None);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1490.0), "1490");
        assert_eq!(format_number(9.99), "9.99");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(1234567.5), "1234567.5");
    }
}
