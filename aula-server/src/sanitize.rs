//! Theory Content Sanitization
//!
//! Fixed allow-list policy for rich-text theory pages, not a general HTML
//! sanitizer. Disallowed markup is stripped (removed), never escaped-and-kept;
//! script/style/iframe elements are dropped together with their raw content.
//! Code pages never pass through this filter — their content is stored
//! verbatim and rendered as preformatted text.
//!
//! The output is stable: `sanitize_theory_html` is idempotent.

const ALLOWED_TAGS: &[&str] = &[
    "p", "b", "i", "em", "strong", "a", "ul", "ol", "li", "code", "pre", "h1", "h2", "h3", "h4",
    "h5", "h6",
];

const ALLOWED_ATTRS: &[&str] = &["href", "target", "rel"];

/// Elements whose raw content is removed along with the tags
const DROP_CONTENT_TAGS: &[&str] = &["script", "style", "iframe"];

const ALLOWED_HREF_SCHEMES: &[&str] = &["http", "https", "mailto"];

#[derive(Debug)]
struct Tag {
    name: String,
    closing: bool,
    attrs: Vec<(String, String)>,
}

enum Markup {
    /// A parsed tag ending at the byte offset
    Tag(Tag, usize),
    /// Comment / doctype / processing instruction ending at the byte offset
    Skip(usize),
    /// The `<` does not open valid markup
    Text,
}

/// Sanitize theory page content against the tag/attribute allow-list.
pub fn sanitize_theory_html(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            let start = i;
            while i < bytes.len() && bytes[i] != b'<' {
                i += 1;
            }
            out.push_str(&input[start..i]);
            continue;
        }

        match parse_markup(input, i) {
            Markup::Skip(end) => i = end,
            Markup::Tag(tag, end) => {
                i = end;
                if tag.closing {
                    if ALLOWED_TAGS.contains(&tag.name.as_str()) {
                        out.push_str("</");
                        out.push_str(&tag.name);
                        out.push('>');
                    }
                } else if DROP_CONTENT_TAGS.contains(&tag.name.as_str()) {
                    i = skip_element_content(input, i, &tag.name);
                } else if ALLOWED_TAGS.contains(&tag.name.as_str()) {
                    emit_tag(&mut out, &tag);
                }
                // Any other tag is stripped; its inner text continues normally.
            }
            Markup::Text => {
                // A stray '<' that opens nothing; emit it inert so the output
                // contains raw '<' only in tags this filter produced itself.
                out.push_str("&lt;");
                i += 1;
            }
        }
    }

    out
}

/// Parse the markup starting at `input[start] == '<'`
fn parse_markup(input: &str, start: usize) -> Markup {
    let rest = &input[start..];

    if rest.starts_with("<!--") {
        return match rest.find("-->") {
            Some(pos) => Markup::Skip(start + pos + 3),
            None => Markup::Skip(input.len()),
        };
    }
    if rest.starts_with("<!") || rest.starts_with("<?") {
        return match rest.find('>') {
            Some(pos) => Markup::Skip(start + pos + 1),
            None => Markup::Skip(input.len()),
        };
    }

    let bytes = input.as_bytes();
    let mut i = start + 1;
    let closing = if i < bytes.len() && bytes[i] == b'/' {
        i += 1;
        true
    } else {
        false
    };

    // Tag name: ASCII alphabetic start, alphanumeric continuation
    let name_start = i;
    if i >= bytes.len() || !bytes[i].is_ascii_alphabetic() {
        return Markup::Text;
    }
    while i < bytes.len() && bytes[i].is_ascii_alphanumeric() {
        i += 1;
    }
    let name = input[name_start..i].to_ascii_lowercase();

    // Attributes until '>'
    let mut attrs: Vec<(String, String)> = Vec::new();
    loop {
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            i += 1;
        }
        if i >= bytes.len() {
            return Markup::Text;
        }
        if bytes[i] == b'>' {
            return Markup::Tag(
                Tag {
                    name,
                    closing,
                    attrs,
                },
                i + 1,
            );
        }

        let attr_start = i;
        while i < bytes.len()
            && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'-' || bytes[i] == b'_')
        {
            i += 1;
        }
        if i == attr_start {
            // Unexpected character; skip it so parsing always progresses
            i += 1;
            continue;
        }
        let attr_name = input[attr_start..i].to_ascii_lowercase();

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let mut value = String::new();
        if i < bytes.len() && bytes[i] == b'=' {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i < bytes.len() && (bytes[i] == b'"' || bytes[i] == b'\'') {
                let quote = bytes[i];
                i += 1;
                let value_start = i;
                while i < bytes.len() && bytes[i] != quote {
                    i += 1;
                }
                if i >= bytes.len() {
                    // Unterminated quote: not a well-formed tag
                    return Markup::Text;
                }
                value = input[value_start..i].to_string();
                i += 1;
            } else {
                let value_start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                    i += 1;
                }
                value = input[value_start..i].to_string();
            }
        }
        attrs.push((attr_name, value));
    }
}

/// Emit an allowed opening tag, keeping only allow-listed attributes
fn emit_tag(out: &mut String, tag: &Tag) {
    out.push('<');
    out.push_str(&tag.name);
    for (name, value) in &tag.attrs {
        if !ALLOWED_ATTRS.contains(&name.as_str()) {
            continue;
        }
        if name == "href" && !href_allowed(value) {
            continue;
        }
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&value.replace('"', "&quot;"));
        out.push('"');
    }
    out.push('>');
}

/// Allow relative URLs and the http/https/mailto schemes
fn href_allowed(value: &str) -> bool {
    // Collapse whitespace/control obfuscation before scheme detection
    let cleaned: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_ascii_control())
        .collect();
    match cleaned.find(':') {
        None => true,
        Some(colon) => {
            let head = &cleaned[..colon];
            if head.contains('/') || head.contains('?') || head.contains('#') {
                // ':' belongs to the path/query, not a scheme
                return true;
            }
            ALLOWED_HREF_SCHEMES.contains(&head.to_ascii_lowercase().as_str())
        }
    }
}

/// Skip everything up to and including the matching close tag
fn skip_element_content(input: &str, from: usize, name: &str) -> usize {
    let haystack = input[from..].to_ascii_lowercase();
    let needle = format!("</{name}");
    match haystack.find(&needle) {
        Some(pos) => {
            let close_start = from + pos;
            match input[close_start..].find('>') {
                Some(gt) => close_start + gt + 1,
                None => input.len(),
            }
        }
        None => input.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_allowed_tags() {
        let input = "<p>Hello <strong>world</strong></p><h2>Title</h2>";
        assert_eq!(sanitize_theory_html(input), input);
    }

    #[test]
    fn strips_script_with_content() {
        assert_eq!(
            sanitize_theory_html("<p>a</p><script>alert(1)</script><p>b</p>"),
            "<p>a</p><p>b</p>"
        );
    }

    #[test]
    fn strips_script_case_insensitively() {
        assert_eq!(sanitize_theory_html("<SCRIPT>alert(1)</SCRIPT>ok"), "ok");
    }

    #[test]
    fn unclosed_script_drops_rest() {
        assert_eq!(sanitize_theory_html("before<script>alert(1)"), "before");
    }

    #[test]
    fn strips_disallowed_tag_but_keeps_text() {
        assert_eq!(
            sanitize_theory_html("<div><p>kept</p></div>"),
            "<p>kept</p>"
        );
    }

    #[test]
    fn drops_disallowed_attributes() {
        assert_eq!(
            sanitize_theory_html(r#"<p onclick="x()" style="color:red">t</p>"#),
            "<p>t</p>"
        );
    }

    #[test]
    fn keeps_allowed_link_attributes() {
        assert_eq!(
            sanitize_theory_html(r#"<a href="https://example.com" target="_blank" rel="noopener">x</a>"#),
            r#"<a href="https://example.com" target="_blank" rel="noopener">x</a>"#
        );
    }

    #[test]
    fn drops_javascript_href() {
        assert_eq!(
            sanitize_theory_html(r#"<a href="javascript:alert(1)">x</a>"#),
            "<a>x</a>"
        );
        // Whitespace obfuscation does not slip through
        assert_eq!(
            sanitize_theory_html("<a href=\"jav\tascript:alert(1)\">x</a>"),
            "<a>x</a>"
        );
    }

    #[test]
    fn keeps_relative_href() {
        assert_eq!(
            sanitize_theory_html(r#"<a href="/modules/1">x</a>"#),
            r#"<a href="/modules/1">x</a>"#
        );
    }

    #[test]
    fn removes_comments_and_doctype() {
        assert_eq!(
            sanitize_theory_html("<!doctype html><!-- note --><p>t</p>"),
            "<p>t</p>"
        );
    }

    #[test]
    fn stray_angle_bracket_is_made_inert() {
        assert_eq!(sanitize_theory_html("a < b"), "a &lt; b");
    }

    #[test]
    fn nested_tag_smuggling_does_not_survive() {
        let out = sanitize_theory_html("<scr<script>ipt>alert(1)</script>");
        assert!(!out.contains("<script"), "got: {out}");
    }

    #[test]
    fn normalizes_tag_case() {
        assert_eq!(sanitize_theory_html("<P>t</P>"), "<p>t</p>");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let inputs = [
            "<p>Hello <strong>world</strong></p>",
            r#"<a href="https://example.com" onclick="x">link</a>"#,
            "<scr<script>ipt>alert(1)</script>",
            "a < b > c",
            "<div><ul><li>one</li></ul></div>",
            r#"<a href='it"s'>q</a>"#,
        ];
        for input in inputs {
            let once = sanitize_theory_html(input);
            let twice = sanitize_theory_html(&once);
            assert_eq!(once, twice, "not idempotent for: {input}");
        }
    }
}
