//! TSDoc block parsing: leading description text plus the `@deprecated` tag.
use serde::Serialize;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Deprecation {
    pub reason: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TsDoc {
    pub description: Option<String>,
    pub deprecated: Option<Deprecation>,
}

impl TsDoc {
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.deprecated.is_none()
    }
}

/// Parse the text of a block comment (without the surrounding `/*` and `*/`).
///
/// Only JSDoc-style blocks (`/** ... */`, i.e. text starting with `*`) carry
/// documentation; anything else yields an empty [`TsDoc`].
pub fn parse_block(text: &str) -> TsDoc {
    let Some(body) = text.strip_prefix('*') else {
        return TsDoc::default();
    };

    let mut description = Vec::<String>::new();
    let mut deprecated: Option<Vec<String>> = None;
    let mut in_tag: Option<String> = None;

    for raw in body.lines() {
        let line = raw.trim();
        let line = line.strip_prefix('*').unwrap_or(line);
        let line = line.strip_prefix(' ').unwrap_or(line).trim_end();

        if let Some(tag_line) = line.strip_prefix('@') {
            let (tag, rest) = match tag_line.find(char::is_whitespace) {
                Some(idx) => (&tag_line[..idx], tag_line[idx..].trim()),
                None => (tag_line, ""),
            };
            if tag == "deprecated" {
                let mut lines = Vec::new();
                if !rest.is_empty() {
                    lines.push(rest.to_string());
                }
                deprecated = Some(lines);
            }
            in_tag = Some(tag.to_string());
            continue;
        }

        match in_tag.as_deref() {
            None => description.push(line.to_string()),
            Some("deprecated") => {
                if let Some(lines) = deprecated.as_mut() {
                    if !line.trim().is_empty() {
                        lines.push(line.trim().to_string());
                    }
                }
            }
            Some(_) => {}
        }
    }

    let description = description.join("\n").trim().to_string();
    TsDoc {
        description: if description.is_empty() { None } else { Some(description) },
        deprecated: deprecated.map(|lines| {
            let reason = lines.join(" ").trim().to_string();
            Deprecation { reason: if reason.is_empty() { None } else { Some(reason) } }
        }),
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_description() {
        let doc = parse_block("* The user's display name ");
        assert_eq!(doc.description.as_deref(), Some("The user's display name"));
        assert!(doc.deprecated.is_none());
    }

    #[test]
    fn multi_line_description_and_deprecated_reason() {
        let doc = parse_block("*\n * First line.\n * Second line.\n *\n * @deprecated Use `fullName`\n *   instead.\n ");
        assert_eq!(doc.description.as_deref(), Some("First line.\nSecond line."));
        assert_eq!(
            doc.deprecated,
            Some(Deprecation { reason: Some("Use `fullName` instead.".into()) })
        );
    }

    #[test]
    fn bare_deprecated_has_no_reason() {
        let doc = parse_block("* @deprecated ");
        assert_eq!(doc.description, None);
        assert_eq!(doc.deprecated, Some(Deprecation { reason: None }));
    }

    #[test]
    fn plain_block_comment_is_not_docs() {
        assert!(parse_block(" just a note ").is_empty());
    }

    #[test]
    fn other_tags_are_ignored() {
        let doc = parse_block("* Hello\n * @example foo()\n * more example ");
        assert_eq!(doc.description.as_deref(), Some("Hello"));
        assert!(doc.deprecated.is_none());
    }
}
