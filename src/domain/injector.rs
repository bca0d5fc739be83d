//! Instrumentation engine core.
//!
//! Parses one source unit, walks its inherent impl blocks (recursing into
//! inline modules), and produces the instrumented text. Mutation is done as
//! byte-offset splices into the original text, computed from span locations:
//! everything outside the inserted statements is preserved byte-for-byte,
//! and a unit with nothing to instrument comes back unchanged.

use anyhow::{ensure, Context, Result};
use proc_macro2::LineColumn;
use serde::Serialize;
use syn::spanned::Spanned;
use syn::{ImplItem, Item, ItemImpl, Type, Visibility};

use crate::domain::classify::{classify, loggable_params};
use crate::domain::conventions::{is_target_type, LOGGER_CONST, MARKER};
use crate::domain::synthesize::{render_log_statement, render_logger_const};

/// One instrumented method, as reported to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct MethodRecord {
    pub class: String,
    pub method: String,
    pub action: String,
    pub event: String,
    pub params: Vec<String>,
}

/// A pending text insertion at a byte offset of the original source.
struct Edit {
    offset: usize,
    text: String,
}

/// Instrument a single source unit. Returns the (possibly identical) new
/// text and the records of every method that gained a statement this run.
/// A unit that fails to parse is a fatal error for the run.
pub fn instrument_unit(unit_name: &str, src: &str) -> Result<(String, Vec<MethodRecord>)> {
    let file = syn::parse_file(src)
        .with_context(|| format!("Failed to parse source unit: {unit_name}"))?;

    let lines = LineIndex::new(src);
    let mut edits = Vec::new();
    let mut records = Vec::new();
    scan_items(&file.items, src, &lines, &mut edits, &mut records)
        .with_context(|| format!("Failed to instrument source unit: {unit_name}"))?;

    Ok((apply_edits(src, edits), records))
}

/// Scan one module scope. Target impl blocks are grouped by type name first
/// so the logger constant is ensured exactly once per type even when the
/// type has several inherent impl blocks.
fn scan_items(
    items: &[Item],
    src: &str,
    lines: &LineIndex,
    edits: &mut Vec<Edit>,
    records: &mut Vec<MethodRecord>,
) -> Result<()> {
    let mut by_type: Vec<(String, Vec<&ItemImpl>)> = Vec::new();

    for item in items {
        match item {
            Item::Impl(imp) if imp.trait_.is_none() => {
                if let Some(name) = self_type_name(imp) {
                    if is_target_type(&name) {
                        match by_type.iter_mut().find(|(n, _)| *n == name) {
                            Some((_, blocks)) => blocks.push(imp),
                            None => by_type.push((name, vec![imp])),
                        }
                    }
                }
            }
            Item::Mod(module) => {
                // Recurse into inline modules; each is its own scope.
                if let Some((_, content)) = &module.content {
                    scan_items(content, src, lines, edits, records)?;
                }
            }
            _ => {}
        }
    }

    for (type_name, blocks) in by_type {
        let already_has_const = blocks
            .iter()
            .any(|block| block_has_item_named(block, LOGGER_CONST));
        if !already_has_const {
            let first = blocks[0];
            let offset = lines.offset(src, open_brace_end(first));
            ensure!(offset <= src.len(), "impl block span out of bounds for {type_name}");
            let indent = line_indent(src, lines, first.impl_token.span.start().line);
            edits.push(Edit {
                offset,
                text: format!("\n{indent}    {}\n", render_logger_const(&type_name)),
            });
        }
        for block in blocks {
            instrument_block(&type_name, block, src, lines, edits, records)?;
        }
    }

    Ok(())
}

fn instrument_block(
    type_name: &str,
    block: &ItemImpl,
    src: &str,
    lines: &LineIndex,
    edits: &mut Vec<Edit>,
    records: &mut Vec<MethodRecord>,
) -> Result<()> {
    for item in &block.items {
        let ImplItem::Fn(method) = item else { continue };
        if !matches!(method.vis, Visibility::Public(_)) {
            continue;
        }

        // Idempotency: a first statement carrying the marker means the
        // method was instrumented by a previous run.
        if let Some(first) = method.block.stmts.first() {
            let span = first.span();
            let start = lines.offset(src, span.start());
            let end = lines.offset(src, span.end());
            if src.get(start..end).map(|s| s.contains(MARKER)).unwrap_or(false) {
                continue;
            }
        }

        let method_name = method.sig.ident.to_string();
        let action_class = classify(&method_name);
        let params = loggable_params(&method.sig);
        let stmt = render_log_statement(action_class, &method_name, &params);

        let offset = lines.offset(src, method.block.brace_token.span.open().end());
        ensure!(
            offset <= src.len(),
            "method body span out of bounds for {type_name}::{method_name}"
        );
        let indent = line_indent(src, lines, method.sig.fn_token.span.start().line);
        edits.push(Edit {
            offset,
            text: format!("\n{indent}    {stmt}"),
        });

        records.push(MethodRecord {
            class: type_name.to_string(),
            method: method_name,
            action: action_class.action().to_string(),
            event: action_class.event().to_string(),
            params,
        });
    }
    Ok(())
}

/// Apply edits back-to-front so earlier offsets stay valid.
fn apply_edits(src: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by(|a, b| b.offset.cmp(&a.offset));
    let mut out = src.to_string();
    for edit in edits {
        out.insert_str(edit.offset, &edit.text);
    }
    out
}

fn self_type_name(imp: &ItemImpl) -> Option<String> {
    match &*imp.self_ty {
        Type::Path(tp) => tp.path.segments.last().map(|seg| seg.ident.to_string()),
        _ => None,
    }
}

/// Idempotent field injection is matched by item name only, like the
/// original: any impl item named `LOG_CLASS` counts.
fn block_has_item_named(block: &ItemImpl, name: &str) -> bool {
    block.items.iter().any(|item| match item {
        ImplItem::Const(c) => c.ident == name,
        ImplItem::Fn(f) => f.sig.ident == name,
        ImplItem::Type(t) => t.ident == name,
        _ => false,
    })
}

/// Position just after the `{` of an impl block.
fn open_brace_end(block: &ItemImpl) -> LineColumn {
    block.brace_token.span.open().end()
}

/// Leading whitespace of the given 1-based line, preserved verbatim so the
/// inserted statement follows the file's own indentation style.
fn line_indent(src: &str, lines: &LineIndex, line: usize) -> String {
    let start = lines.line_start(line);
    src[start..]
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect()
}

/// Byte offsets of line starts, for translating span line/column positions
/// (1-based line, 0-based column in characters) into byte offsets.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(src: &str) -> Self {
        let mut starts = vec![0];
        for (i, b) in src.bytes().enumerate() {
            if b == b'\n' {
                starts.push(i + 1);
            }
        }
        Self { starts }
    }

    fn line_start(&self, line: usize) -> usize {
        self.starts.get(line.saturating_sub(1)).copied().unwrap_or(0)
    }

    fn offset(&self, src: &str, lc: LineColumn) -> usize {
        let base = match self.starts.get(lc.line.saturating_sub(1)) {
            Some(b) => *b,
            None => return src.len(),
        };
        let mut remaining = lc.column;
        for (i, ch) in src[base..].char_indices() {
            if remaining == 0 || ch == '\n' {
                return base + i;
            }
            remaining -= 1;
        }
        src.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDGET_SERVICE: &str = r#"pub struct WidgetServiceImpl {
    repo: WidgetRepository,
}

impl WidgetServiceImpl {
    pub fn create_widget(&self, widget_id: String) -> Widget {
        self.repo.insert(widget_id)
    }

    pub fn get_widget(&self, widget_id: i64) -> Option<Widget> {
        self.repo.get(widget_id)
    }

    fn helper(&self) {
        // private, must stay untouched
    }
}
"#;

    #[test]
    fn test_public_methods_gain_first_statement() {
        let (out, records) = instrument_unit("widget_service_impl.rs", WIDGET_SERVICE).unwrap();

        let create_pos = out.find("pub fn create_widget").unwrap();
        let stmt_pos = out[create_pos..].find("log::info!").unwrap() + create_pos;
        let body_pos = out[create_pos..].find("self.repo.insert").unwrap() + create_pos;
        assert!(stmt_pos < body_pos, "statement must come first in the body");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].method, "create_widget");
        assert_eq!(records[0].action, "WRITE");
        assert_eq!(records[0].event, "db-write");
        assert_eq!(records[0].params, vec!["widget_id"]);
        assert_eq!(records[1].method, "get_widget");
        assert_eq!(records[1].event, "db-read");
    }

    #[test]
    fn test_private_method_untouched() {
        let (out, _) = instrument_unit("widget_service_impl.rs", WIDGET_SERVICE).unwrap();
        let helper_pos = out.find("fn helper").unwrap();
        assert!(
            !out[helper_pos..].contains("log::info!"),
            "private helper must not be instrumented"
        );
    }

    #[test]
    fn test_logger_const_added_once_at_top() {
        let (out, _) = instrument_unit("widget_service_impl.rs", WIDGET_SERVICE).unwrap();
        assert_eq!(out.matches("const LOG_CLASS").count(), 1);

        let impl_pos = out.find("impl WidgetServiceImpl {").unwrap();
        let const_pos = out.find("const LOG_CLASS").unwrap();
        let first_fn_pos = out.find("pub fn create_widget").unwrap();
        assert!(impl_pos < const_pos && const_pos < first_fn_pos);
        assert!(out.contains("const LOG_CLASS: &'static str = \"WidgetServiceImpl\";"));
    }

    #[test]
    fn test_output_still_parses() {
        let (out, _) = instrument_unit("widget_service_impl.rs", WIDGET_SERVICE).unwrap();
        syn::parse_file(&out).expect("instrumented unit must remain valid Rust");
    }

    #[test]
    fn test_idempotent_on_second_pass() {
        let (once, records) = instrument_unit("a.rs", WIDGET_SERVICE).unwrap();
        assert!(!records.is_empty());
        let (twice, records) = instrument_unit("a.rs", &once).unwrap();
        assert_eq!(once, twice, "second pass must be byte-identical");
        assert!(records.is_empty(), "second pass must not re-instrument");
    }

    #[test]
    fn test_non_target_type_is_byte_identical() {
        let src = r#"pub struct WidgetController;

impl WidgetController {
    pub fn get_widget(&self, widget_id: i64) {}
}
"#;
        let (out, records) = instrument_unit("controller.rs", src).unwrap();
        assert_eq!(out, src);
        assert!(records.is_empty());
    }

    #[test]
    fn test_trait_impl_not_instrumented() {
        let src = r#"pub struct OrderServiceImpl;

impl Clone for OrderServiceImpl {
    fn clone(&self) -> Self {
        OrderServiceImpl
    }
}
"#;
        let (out, records) = instrument_unit("order.rs", src).unwrap();
        assert_eq!(out, src);
        assert!(records.is_empty());
    }

    #[test]
    fn test_existing_log_class_item_not_duplicated() {
        let src = r#"pub struct OrderServiceImpl;

impl OrderServiceImpl {
    const LOG_CLASS: &'static str = "OrderServiceImpl";

    pub fn archive_order(&self, order_id: i64) {
        unimplemented!()
    }
}
"#;
        let (out, records) = instrument_unit("order.rs", src).unwrap();
        assert_eq!(out.matches("const LOG_CLASS").count(), 1);
        // archive_* matches no rule: deliberate READ fallback.
        assert_eq!(records[0].action, "READ");
        assert_eq!(records[0].event, "db-read");
    }

    #[test]
    fn test_const_ensured_once_across_split_impls() {
        let src = r#"pub struct OrderServiceImpl;

impl OrderServiceImpl {
    pub fn get_order(&self, order_id: i64) {}
}

impl OrderServiceImpl {
    pub fn delete_order(&self, order_id: i64) {}
}
"#;
        let (out, records) = instrument_unit("order.rs", src).unwrap();
        assert_eq!(out.matches("const LOG_CLASS").count(), 1);
        assert_eq!(records.len(), 2);
        syn::parse_file(&out).unwrap();
    }

    #[test]
    fn test_nested_module_scanned() {
        let src = r#"mod inner {
    pub struct UserServiceImpl;

    impl UserServiceImpl {
        pub fn update_user(&self, user_id: String) {}
    }
}
"#;
        let (out, records) = instrument_unit("nested.rs", src).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].params, vec!["user_id"]);
        assert!(out.contains("log::info!"));
        syn::parse_file(&out).unwrap();
    }

    #[test]
    fn test_formatting_outside_insertions_preserved() {
        let src = "pub struct  WeirdServiceImpl ;\n\nimpl WeirdServiceImpl {\n    pub fn list_all(&self)   ->   u32 {\n        0\n    }\n}\n";
        let (out, _) = instrument_unit("weird.rs", src).unwrap();
        // The odd spacing on unrelated lines must survive untouched.
        assert!(out.contains("pub struct  WeirdServiceImpl ;"));
        assert!(out.contains("pub fn list_all(&self)   ->   u32 {"));
        syn::parse_file(&out).unwrap();
    }

    #[test]
    fn test_parse_failure_is_fatal() {
        let err = instrument_unit("broken.rs", "pub struct {").unwrap_err();
        assert!(err.to_string().contains("broken.rs"));
    }
}
