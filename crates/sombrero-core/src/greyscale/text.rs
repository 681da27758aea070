/// A line of a text file split from its terminator so that rewrites can put
/// back exactly the bytes they did not touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextLine<'a> {
    pub content: &'a str,
    pub terminator: &'a str,
}

pub fn split_lines(content: &str) -> Vec<TextLine<'_>> {
    content
        .split_inclusive('\n')
        .map(|raw| {
            let body_len = if raw.ends_with("\r\n") {
                raw.len() - 2
            } else if raw.ends_with('\n') {
                raw.len() - 1
            } else {
                raw.len()
            };
            let (content, terminator) = raw.split_at(body_len);
            TextLine {
                content,
                terminator,
            }
        })
        .collect()
}

/// Renders a value the way the compilation files store them: shortest
/// round-trip decimal, integral values keep a trailing `.0`.
pub fn format_greyscale_value(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value.is_sign_negative() {
            "-inf".to_string()
        } else {
            "inf".to_string()
        };
    }

    let mut rendered = value.to_string();
    if !rendered.contains('.') {
        rendered.push_str(".0");
    }
    rendered
}
