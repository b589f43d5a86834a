/// Iterator over the lines of a raw email, each line keeping its own
/// terminator (`\n`, `\r\n` or a lone `\r`).
///
/// The final line is yielded without a terminator when the text does not
/// end with a line break. Concatenating every yielded line gives back the
/// original text byte for byte.
///
/// # Examples
///
/// ```rust
/// let lines: Vec<&str> = postman_utils::split_lines_inclusive("A: 1\r\nB: 2\n\rtail").collect();
/// assert_eq!(lines, vec!["A: 1\r\n", "B: 2\n", "\r", "tail"]);
/// ```
pub fn split_lines_inclusive(raw: &str) -> LinesInclusive<'_> {
    LinesInclusive { rest: raw }
}

/// Lines of a raw email with their terminators, see [`split_lines_inclusive`].
#[derive(Debug, Clone)]
pub struct LinesInclusive<'a> {
    rest: &'a str,
}

impl<'a> Iterator for LinesInclusive<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        let bytes = self.rest.as_bytes();
        let end = match bytes.iter().position(|&b| b == b'\n' || b == b'\r') {
            Some(pos) if bytes[pos] == b'\r' && bytes.get(pos + 1) == Some(&b'\n') => pos + 2,
            Some(pos) => pos + 1,
            None => bytes.len(),
        };
        let (line, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(line)
    }
}

/// Returns whether a line consists of nothing but a line break, marking the
/// boundary between the header section and the body.
///
/// # Examples
///
/// ```rust
/// assert!(postman_utils::is_blank_line("\r\n"));
/// assert!(!postman_utils::is_blank_line(" \r\n"));
/// assert!(!postman_utils::is_blank_line(""));
/// ```
pub fn is_blank_line(line: &str) -> bool {
    matches!(line, "\n" | "\r\n" | "\r")
}

/// Parses headers from a raw email, returning an ordered list of headers
/// and a reference to the content after the blank-line separator.
///
/// Headers are preserved in their original order with case-preserved keys
/// and trimmed values. Folded continuation lines are appended to the value
/// of the header they continue.
///
/// # Examples
///
/// ```rust
/// let (headers, content) = postman_utils::parse_raw_headers(
///     "From: alice@example.com\r\nTo: bob@example.com\r\n\r\nHello!"
/// );
/// assert_eq!(headers.len(), 2);
/// assert_eq!(headers[0], ("From".to_string(), "alice@example.com".to_string()));
/// assert_eq!(content, "Hello!");
/// ```
pub fn parse_raw_headers(raw: &str) -> (Vec<(String, String)>, &str) {
    let mut headers: Vec<(String, String)> = Vec::new();
    let mut pos = 0;

    for line in split_lines_inclusive(raw) {
        if is_blank_line(line) {
            pos += line.len();
            break;
        }

        let content = line.trim_end_matches(['\r', '\n']);
        if content.starts_with([' ', '\t']) {
            if let Some((_, value)) = headers.last_mut() {
                value.push(' ');
                value.push_str(content.trim());
                pos += line.len();
                continue;
            }
        }

        match content.split_once(':') {
            Some((key, value)) => headers.push((key.trim().to_string(), value.trim().to_string())),
            // Line is not a header (no colon) and not blank, treat as start of content
            None => break,
        }

        pos += line.len();
    }

    (headers, &raw[pos..])
}
