//! Gemtext parser and HTML generator.
//!
//! Gemtext is line oriented: the first characters of a line decide its kind.
//! Parsing produces a flat list of [`Line`]s, each annotated with whether it
//! opens or closes a run of same-kind lines, which is all the HTML generator
//! needs to group list items, quotes and preformatted blocks.

use html_escape::{encode_double_quoted_attribute, encode_text};
use regex::Regex;
use std::sync::LazyLock;

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^=>\s*(\S+)(?:\s+(.+))?$").expect("valid link regex"));

static OTHER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(```|###|##|#|>|\* )\s*(.*)$").expect("valid line prefix regex")
});

/// Kind of a gemtext line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineType {
    Text,
    Link,
    PreStart,
    PreEnd,
    Pre,
    Quoted,
    ListItem,
    H1,
    H2,
    H3,
}

impl LineType {
    fn from_prefix(prefix: &str) -> Self {
        match prefix {
            "```" => Self::PreStart,
            "* " => Self::ListItem,
            "#" => Self::H1,
            "##" => Self::H2,
            "###" => Self::H3,
            _ => Self::Quoted,
        }
    }
}

/// A parsed gemtext line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub line_type: LineType,
    /// Previous line is of a different type (or this is the first line).
    pub first: bool,
    /// Next line is of a different type (or this is the last line).
    pub last: bool,
    /// Display text: label for links, alt text for preformatted starts.
    pub text: String,
    /// Link target, only set for [`LineType::Link`].
    pub target: Option<String>,
    /// 1-based line number in the source.
    pub number: usize,
}

/// Parses a gemtext document into annotated lines.
pub fn parse(gemtext: &str) -> Vec<Line> {
    let mut pre_mode = false;
    let mut raw: Vec<(LineType, String, Option<String>)> = Vec::new();

    for line in gemtext.lines() {
        if pre_mode {
            if line.starts_with("```") {
                raw.push((LineType::PreEnd, String::new(), None));
                pre_mode = false;
            } else {
                raw.push((LineType::Pre, line.to_string(), None));
            }
            continue;
        }

        if let Some(caps) = LINK_RE.captures(line) {
            let target = caps[1].to_string();
            let label = caps
                .get(2)
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| target.clone());
            raw.push((LineType::Link, label, Some(target)));
        } else if let Some(caps) = OTHER_RE.captures(line) {
            let line_type = LineType::from_prefix(&caps[1]);
            if line_type == LineType::PreStart {
                pre_mode = true;
            }
            raw.push((line_type, caps[2].to_string(), None));
        } else {
            raw.push((LineType::Text, line.to_string(), None));
        }
    }

    let types: Vec<LineType> = raw.iter().map(|(t, _, _)| *t).collect();

    raw.into_iter()
        .enumerate()
        .map(|(index, (line_type, text, target))| Line {
            line_type,
            first: index == 0 || types[index - 1] != line_type,
            last: types.get(index + 1) != Some(&line_type),
            text,
            target,
            number: index + 1,
        })
        .collect()
}

/// Returns the text of the first level-one heading, if any.
pub fn title(lines: &[Line]) -> Option<&str> {
    lines
        .iter()
        .find(|line| line.line_type == LineType::H1)
        .map(|line| line.text.as_str())
}

/// Renders parsed lines as HTML, passing each link target through `href_for`.
pub fn render_html<F>(lines: &[Line], href_for: F) -> String
where
    F: Fn(&str) -> String,
{
    lines
        .iter()
        .map(|line| render_line(line, &href_for))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Converts gemtext to HTML, keeping link targets unchanged.
pub fn to_html(gemtext: &str) -> String {
    render_html(&parse(gemtext), str::to_string)
}

fn render_line<F>(line: &Line, href_for: &F) -> String
where
    F: Fn(&str) -> String,
{
    let escaped = encode_text(&line.text);

    match line.line_type {
        LineType::Text => format!("<p>{escaped}</p>"),
        LineType::Link => {
            let href = href_for(line.target.as_deref().unwrap_or(""));
            format!(
                "<a href=\"{}\">{escaped}</a>",
                encode_double_quoted_attribute(&href)
            )
        }
        LineType::H1 => format!("<h1>{escaped}</h1>"),
        LineType::H2 => format!("<h2>{escaped}</h2>"),
        LineType::H3 => format!("<h3>{escaped}</h3>"),
        LineType::ListItem => {
            let open = if line.first { "<ul><li>" } else { "<li>" };
            let close = if line.last { "</li></ul>" } else { "</li>" };
            format!("{open}{escaped}{close}")
        }
        LineType::Pre => match (line.first, line.last) {
            (true, true) => format!("<pre>{escaped}</pre>"),
            (true, false) => format!("<pre>{escaped}"),
            (false, true) => format!("{escaped}</pre>"),
            (false, false) => escaped.into_owned(),
        },
        LineType::PreStart if escaped.is_empty() => "<figure>".to_string(),
        LineType::PreStart => format!("<figure><figcaption>{escaped}</figcaption>"),
        LineType::PreEnd => "</figure>".to_string(),
        LineType::Quoted => {
            let open = if line.first { "<blockquote><p>" } else { "<p>" };
            let close = if line.last { "</p></blockquote>" } else { "</p>" };
            format!("{open}{escaped}{close}")
        }
    }
}
