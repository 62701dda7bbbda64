//! Element rendering: tag and attribute resolution, literal markup substitution, nested
//! element attributes and the opening/closing wrapper rebuild.

use crate::context::Context;
use crate::engine::{debug_assert_slots, Expansion, Renderer, Scope};
use crate::resolver::resolve;
use etch_blocks::{Metadata, MetadataVariant, Node, Special};
use indexmap::IndexMap;

pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Attributes after placeholder resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeSet {
    pub values: IndexMap<String, String>,
    /// ` key="value"` pairs ready to splice after a tag name
    pub markup: String,
    /// At least one value contained a placeholder
    pub had_expression: bool,
}

/// Resolve attribute templates, leaving out the keys in `skip`.
pub fn resolve_attributes(
    templates: &IndexMap<String, String>,
    ctx: &Context,
    skip: &[&str],
) -> AttributeSet {
    let mut set = AttributeSet::default();
    for (key, raw) in templates {
        if skip.contains(&key.as_str()) {
            continue;
        }
        let resolved = resolve(raw, ctx);
        set.had_expression |= resolved.had_expression;
        set.values.insert(key.clone(), resolved.text);
    }
    set.markup = attribute_markup(&set.values);
    set
}

/// Empty values render as bare boolean attributes.
pub fn attribute_markup(values: &IndexMap<String, String>) -> String {
    let mut out = String::new();
    for (key, value) in values {
        if value.is_empty() {
            out.push_str(&format!(" {}", key));
        } else {
            out.push_str(&format!(" {}=\"{}\"", key, escape_attribute(value)));
        }
    }
    out
}

pub fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Make a data-driven tag name safe: lowercase, spaces to hyphens, only `[a-z0-9-_]`,
/// no repeated hyphens and no leading digit.
pub fn sanitize_tag(raw: &str, fallback: &str) -> String {
    let mut tag = String::with_capacity(raw.len());
    for c in raw.trim().to_lowercase().chars() {
        let c = if c.is_whitespace() { '-' } else { c };
        if !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_') {
            continue;
        }
        if c == '-' && tag.ends_with('-') {
            continue;
        }
        tag.push(c);
    }
    let tag = tag.trim_matches('-');

    match tag.chars().next() {
        None => fallback.to_string(),
        Some(first) if first.is_ascii_digit() => fallback.to_string(),
        Some(_) => tag.to_string(),
    }
}

/// Byte index of the `>` closing the tag that starts at `s[0]`, skipping quoted values.
fn tag_end(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices().skip(1) {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '>' => return Some(i),
                '<' => return None,
                _ => {}
            },
        }
    }
    None
}

fn tag_name(open_tag: &str) -> String {
    open_tag
        .trim_start_matches('<')
        .chars()
        .take_while(|c| !c.is_whitespace() && *c != '/' && *c != '>')
        .collect::<String>()
        .to_lowercase()
}

/// Split a leading opening tag off `fragment`: `("<div class=x>", rest)`.
fn split_leading_tag(fragment: &str) -> Option<(&str, &str)> {
    let s = fragment.trim_start();
    if !s.starts_with('<') || s.starts_with("</") || s.starts_with("<!") {
        return None;
    }
    let end = tag_end(s)?;
    Some((&s[..=end], &s[end + 1..]))
}

/// Split a trailing closing tag off `fragment`: `(rest, "</div>")`.
fn split_trailing_close(fragment: &str) -> Option<(&str, &str)> {
    let s = fragment.trim_end();
    if !s.ends_with('>') {
        return None;
    }
    let start = s.rfind("</")?;
    let name = &s[start + 2..s.len() - 1];
    let valid = !name.trim().is_empty()
        && name
            .trim()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':');
    valid.then(|| (&s[..start], &s[start..]))
}

/// Content of the single element `markup` consists of, or the markup itself when it is
/// not one element.
fn element_content(markup: &str) -> &str {
    let Some((open_tag, rest)) = split_leading_tag(markup) else {
        return markup;
    };
    let name = tag_name(open_tag);
    if open_tag.ends_with("/>") || is_void_element(&name) {
        return rest;
    }
    let Some((inner, _)) = split_trailing_close(rest) else {
        return markup;
    };
    match matching_close(rest, &name) {
        Some(close) if close == inner.len() => inner,
        _ => markup,
    }
}

/// Byte offset in `s` of the `</name>` that closes an element already opened before `s`.
fn matching_close(s: &str, name: &str) -> Option<usize> {
    let mut depth = 1usize;
    let mut from = 0;
    while let Some(found) = s[from..].find('<') {
        let start = from + found;
        let tag = &s[start..];
        let Some(end) = tag_end(tag) else {
            from = start + 1;
            continue;
        };
        if let Some(closing) = tag.strip_prefix("</") {
            if tag_name(closing) == name {
                depth -= 1;
                if depth == 0 {
                    return Some(start);
                }
            }
        } else if !tag.starts_with("<!") && !tag[..end].ends_with('/') && tag_name(tag) == name {
            depth += 1;
        }
        from = start + end;
    }
    None
}

/// Locate the first opening `<name ...>` tag: `(start, index of '>')`.
fn find_opening_tag(markup: &str, name: &str) -> Option<(usize, usize)> {
    let needle = format!("<{}", name);
    let mut from = 0;
    while let Some(found) = markup[from..].find(&needle) {
        let start = from + found;
        let after = start + needle.len();
        let boundary = markup[after..]
            .chars()
            .next()
            .map(|c| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(false);
        if boundary {
            let end = tag_end(&markup[start..])?;
            return Some((start, start + end));
        }
        from = after;
    }
    None
}

impl Renderer<'_, '_> {
    pub(crate) fn render_element(&mut self, node: &Node, scope: &Scope) -> Expansion {
        let Some(meta) = node.metadata.as_ref() else {
            return Expansion::One(self.passthrough(node, scope));
        };
        let ctx = &scope.context;

        if meta.variant == Some(MetadataVariant::Text) {
            return Expansion::One(self.render_text(node, meta, scope));
        }

        let tag = self.resolve_tag(meta, ctx);
        let is_svg = meta.special == Some(Special::Svg);
        let skip: &[&str] = if is_svg { &["src"] } else { &[] };
        let attributes = resolve_attributes(&meta.attributes, ctx, skip);
        if attributes.had_expression {
            self.register_styles(&meta.styles);
        }

        if is_svg {
            return Expansion::One(self.render_svg(node, meta, &tag, attributes, ctx));
        }

        let inside_style = scope.inside_style || tag == "style";
        let child_scope = Scope {
            inside_style,
            ..scope.clone()
        };
        let resolve_literals = !inside_style || self.engine.options.resolve_inside_style;

        let (open, close) = if meta.remove_wrapper {
            (String::new(), String::new())
        } else if is_void_element(&tag) {
            (format!("<{}{}>", tag, attributes.markup), String::new())
        } else {
            (
                format!("<{}{}>", tag, attributes.markup),
                format!("</{}>", tag),
            )
        };

        let mut out = node.shallow_clone();
        out.metadata = None;

        if out.has_wrapper() {
            let last = out.inner_slots.len() - 1;
            for (i, slot) in out.inner_slots.iter_mut().enumerate() {
                let Some(fragment) = slot.as_mut() else {
                    continue;
                };
                let current: &str = fragment;
                *fragment = if i == 0 {
                    let rest = split_leading_tag(current)
                        .map(|(_, rest)| rest)
                        .unwrap_or(current);
                    format!("{}{}", open, self.literal(rest, meta, ctx, resolve_literals))
                } else if i == last {
                    let rest = split_trailing_close(current)
                        .map(|(rest, _)| rest)
                        .unwrap_or(current);
                    format!("{}{}", self.literal(rest, meta, ctx, resolve_literals), close)
                } else {
                    self.literal(current, meta, ctx, resolve_literals)
                };
            }
        } else if node.children.is_empty() {
            let markup = node.literal_markup();
            let content = self.literal(element_content(&markup), meta, ctx, resolve_literals);
            out.inner_slots = vec![Some(format!("{}{}", open, content)), Some(close)];
        } else {
            for fragment in out.inner_slots.iter_mut().flatten() {
                *fragment = self.literal(fragment, meta, ctx, resolve_literals);
            }
            out.inner_slots.insert(0, Some(open));
            out.inner_slots.push(Some(close));
        }

        let children = self.process_children(&node.children, &child_scope);
        out.replace_children(children);
        out.inner_markup = out.literal_markup();
        debug_assert_slots(&out);

        Expansion::One(out)
    }

    /// Text nodes keep their markup; only placeholders and nested attributes change.
    fn render_text(&mut self, node: &Node, meta: &Metadata, scope: &Scope) -> Node {
        let ctx = &scope.context;
        let resolve_literals = !scope.inside_style || self.engine.options.resolve_inside_style;

        let mut out = node.shallow_clone();
        out.metadata = None;
        if out.inner_slots.is_empty() {
            out.inner_markup = self.literal(&node.inner_markup, meta, ctx, resolve_literals);
        } else {
            for fragment in out.inner_slots.iter_mut().flatten() {
                *fragment = self.literal(fragment, meta, ctx, resolve_literals);
            }
        }

        let children = self.process_children(&node.children, scope);
        out.replace_children(children);
        if !out.inner_slots.is_empty() {
            out.inner_markup = out.literal_markup();
        }
        debug_assert_slots(&out);
        out
    }

    fn resolve_tag(&self, meta: &Metadata, ctx: &Context) -> String {
        let fallback = self.engine.options.fallback_tag.as_str();
        let raw = meta
            .tag
            .as_deref()
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .unwrap_or(fallback);

        if meta.dynamic_tag {
            sanitize_tag(&resolve(raw, ctx).text, fallback)
        } else {
            raw.to_string()
        }
    }

    /// Resolve a literal fragment and apply nested element attributes to it.
    fn literal(
        &mut self,
        fragment: &str,
        meta: &Metadata,
        ctx: &Context,
        substitute: bool,
    ) -> String {
        let text = if substitute {
            resolve(fragment, ctx).text
        } else {
            fragment.to_string()
        };
        if meta.nested.is_empty() {
            text
        } else {
            self.apply_nested(&text, meta, ctx)
        }
    }

    /// Splice resolved attributes into elements embedded in literal markup, found by a
    /// `data-etch-ref` marker or by tag name.
    fn apply_nested(&mut self, markup: &str, meta: &Metadata, ctx: &Context) -> String {
        let mut out = markup.to_string();
        for (anchor, nested) in &meta.nested {
            let attributes = resolve_attributes(&nested.attributes, ctx, &[]);
            if attributes.had_expression {
                self.register_styles(&nested.styles);
            }

            let marker = format!("data-etch-ref=\"{}\"", anchor);
            if let Some(pos) = out.find(&marker) {
                let start = if out[..pos].ends_with(' ') { pos - 1 } else { pos };
                out.replace_range(start..pos + marker.len(), &attributes.markup);
                continue;
            }

            let name = nested.tag.as_deref().unwrap_or(anchor);
            if let Some((start, end)) = find_opening_tag(&out, name) {
                let self_closing = out[start..end].trim_end().ends_with('/');
                let replacement = format!(
                    "<{}{}{}>",
                    name,
                    attributes.markup,
                    if self_closing { " /" } else { "" }
                );
                out.replace_range(start..=end, &replacement);
            }
        }
        out
    }
}
