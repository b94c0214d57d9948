//! swc front end: one parsed TypeScript file with its comments and a line index.
use std::path::{Path, PathBuf};

use swc_common::comments::{Comment, CommentKind, Comments, SingleThreadedComments};
use swc_common::{BytePos, Span, Spanned};
use swc_ecma_ast::{EsVersion, Module};
use swc_ecma_parser::lexer::Lexer;
use swc_ecma_parser::{Parser, StringInput, Syntax, TsSyntax};

use crate::diagnostics::SourceLocation;
use crate::tsdoc::{self, TsDoc};

/// Spans start at 1 because swc reserves `BytePos(0)` for dummy spans.
const START_POS: u32 = 1;

pub struct ParsedModule {
    pub path: PathBuf,
    pub module: Module,
    comments: SingleThreadedComments,
    source: String,
    line_starts: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct ParseFailure {
    pub message: String,
    pub location: SourceLocation,
}

impl ParsedModule {
    pub fn parse(path: &Path, source: String) -> Result<Self, ParseFailure> {
        let comments = SingleThreadedComments::default();
        let is_tsx = path.extension().is_some_and(|ext| ext == "tsx");
        let syntax = Syntax::Typescript(TsSyntax {
            tsx: is_tsx,
            dts: path.to_string_lossy().ends_with(".d.ts"),
            ..Default::default()
        });
        let line_starts = line_starts(&source);

        let end = START_POS + source.len() as u32;
        let parse_result = {
            let input = StringInput::new(&source, BytePos(START_POS), BytePos(end));
            let lexer = Lexer::new(syntax, EsVersion::EsNext, input, Some(&comments));
            let mut parser = Parser::new_from(lexer);
            let module = parser.parse_module();
            let recovered = parser.take_errors();
            match module {
                Ok(module) => match recovered.into_iter().next() {
                    None => Ok(module),
                    Some(err) => Err((err.kind().msg().to_string(), err.span())),
                },
                Err(err) => Err((err.kind().msg().to_string(), err.span())),
            }
        };

        match parse_result {
            Ok(module) => Ok(Self { path: path.to_path_buf(), module, comments, source, line_starts }),
            Err((message, span)) => {
                let location = locate(path, &source, &line_starts, span.lo);
                Err(ParseFailure { message, location })
            }
        }
    }

    /// Source text covered by `span`, for messages.
    pub fn snippet(&self, span: Span) -> &str {
        self.text_between(span.lo, span.hi)
    }

    fn text_between(&self, lo: BytePos, hi: BytePos) -> &str {
        let lo = lo.0.saturating_sub(START_POS) as usize;
        let hi = hi.0.saturating_sub(START_POS) as usize;
        self.source.get(lo..hi).unwrap_or("")
    }

    pub fn location(&self, span: Span) -> SourceLocation {
        locate(&self.path, &self.source, &self.line_starts, span.lo)
    }

    /// TSDoc attached to the token starting at `pos` (the closest `/** */` block wins).
    pub fn doc_at(&self, pos: BytePos) -> TsDoc {
        self.leading_doc(pos)
            .or_else(|| self.same_line_doc(pos))
            .map(|comment| tsdoc::parse_block(&comment.text))
            .unwrap_or_default()
    }

    fn leading_doc(&self, pos: BytePos) -> Option<Comment> {
        self.comments.get_leading(pos)?.into_iter().rev().find(is_doc_block)
    }

    /// In `{ /** doc */ name: T }` swc keeps the block as a trailing comment of `{`.
    /// Such a block still documents `pos` when only spaces separate the two.
    fn same_line_doc(&self, pos: BytePos) -> Option<Comment> {
        let (_, trailing) = self.comments.borrow_all();
        let doc = trailing
            .values()
            .flatten()
            .filter(|c| is_doc_block(c) && c.span.hi <= pos)
            .filter(|c| self.text_between(c.span.hi, pos).chars().all(|ch| ch == ' ' || ch == '\t'))
            .max_by_key(|c| c.span.hi)
            .cloned();
        doc
    }

    /// First non-empty doc among several candidate positions (e.g. `export` keyword
    /// then the declaration keyword).
    pub fn doc_at_any(&self, positions: &[BytePos]) -> TsDoc {
        positions
            .iter()
            .map(|pos| self.doc_at(*pos))
            .find(|doc| !doc.is_empty())
            .unwrap_or_default()
    }
}

fn is_doc_block(comment: &Comment) -> bool {
    comment.kind == CommentKind::Block && comment.text.starts_with('*')
}

fn line_starts(source: &str) -> Vec<usize> {
    let mut starts = vec![0];
    starts.extend(source.match_indices('\n').map(|(idx, _)| idx + 1));
    starts
}

fn locate(path: &Path, source: &str, line_starts: &[usize], pos: BytePos) -> SourceLocation {
    let offset = (pos.0.saturating_sub(START_POS) as usize).min(source.len());
    let line_idx = line_starts.partition_point(|start| *start <= offset).saturating_sub(1);
    let line_start = line_starts.get(line_idx).copied().unwrap_or(0);
    let column = source
        .get(line_start..offset)
        .map(|prefix| prefix.chars().count())
        .unwrap_or(0);
    SourceLocation::new(path, line_idx as u32 + 1, column as u32 + 1)
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use swc_ecma_ast::{Decl, ModuleDecl, ModuleItem};

    #[test]
    fn locations_are_one_based() {
        let src = "// header\nexport interface User {\n  id: string;\n}\n".to_string();
        let parsed = ParsedModule::parse(Path::new("src/user.ts"), src).unwrap();
        let item = &parsed.module.body[0];
        let loc = parsed.location(item.span());
        assert_eq!((loc.line, loc.column), (2, 1));
    }

    #[test]
    fn docs_attach_to_export_keyword() {
        let src = "/** A user. */\nexport interface User { id: string }\n".to_string();
        let parsed = ParsedModule::parse(Path::new("a.ts"), src).unwrap();
        let ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) = &parsed.module.body[0] else {
            panic!("expected export");
        };
        assert!(matches!(export.decl, Decl::TsInterface(_)));
        let doc = parsed.doc_at_any(&[export.span.lo, export.decl.span().lo]);
        assert_eq!(doc.description.as_deref(), Some("A user."));
    }

    fn doc_before(parsed: &ParsedModule, needle: &str) -> TsDoc {
        let offset = parsed.source.find(needle).unwrap();
        parsed.doc_at(BytePos(START_POS + offset as u32))
    }

    #[test]
    fn same_line_docs_attach_to_the_next_property() {
        let src = "type A = { /** Inline limit. */ limit: number; /** Offset. */ offset: number };\n".to_string();
        let parsed = ParsedModule::parse(Path::new("a.ts"), src).unwrap();
        assert_eq!(doc_before(&parsed, "limit:").description.as_deref(), Some("Inline limit."));
        assert_eq!(doc_before(&parsed, "offset:").description.as_deref(), Some("Offset."));
    }

    #[test]
    fn syntax_errors_are_reported_with_location() {
        let src = "export interface {\n".to_string();
        let err = ParsedModule::parse(Path::new("broken.ts"), src).err().unwrap();
        assert_eq!(err.location.file, PathBuf::from("broken.ts"));
        assert!(!err.message.is_empty());
    }
}
