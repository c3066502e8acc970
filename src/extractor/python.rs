//! Indentation-based source recovery for Python handlers.

use regex::Regex;

/// Kind of top-level Python definition found by [`find_definition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DefinitionKind {
    Function,
    Class,
}

/// Verb-named methods a class-based view may define.
const VIEW_METHODS: &[&str] = &["get", "post", "put", "patch", "delete", "head", "options"];

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn is_def_line(trimmed: &str) -> bool {
    trimmed.starts_with("def ") || trimmed.starts_with("async def ")
}

/// Returns the source of the function decorated by the decorator ending at `offset`.
///
/// The returned text starts at the line holding `decorator_start` (so decorators are
/// kept) and ends with the last line of the function body. Returns `None` when no
/// `def` follows the decorator stack.
pub(crate) fn decorated_function(text: &str, decorator_start: usize, offset: usize) -> Option<String> {
    let line_start = text[..decorator_start].rfind('\n').map_or(0, |i| i + 1);
    let decorator_indent = indent_of(&text[line_start..]);
    let after = text[offset..].find('\n').map_or(text.len(), |i| offset + i + 1);

    let lines: Vec<&str> = text[after..].lines().collect();
    for (index, line) in lines.iter().enumerate() {
        let trimmed = line.trim_start();
        if is_def_line(trimmed) {
            let end = block_end(&lines, index);
            let head = &text[line_start..after];
            return Some(format!("{}{}", head, lines[..=end].join("\n")));
        }
        let continuation = trimmed.starts_with('@')
            || trimmed.is_empty()
            || trimmed.starts_with('#')
            || trimmed.starts_with(')')
            || indent_of(line) > decorator_indent;
        if !continuation {
            return None;
        }
    }

    None
}

/// Finds a top-level or nested `def`/`class` named `name` and returns its source.
pub(crate) fn find_definition(text: &str, name: &str) -> Option<(DefinitionKind, String)> {
    let pattern = format!(
        r"(?m)^[ \t]*(?:async[ \t]+)?(def|class)[ \t]+{}\b",
        regex::escape(name)
    );
    let re = Regex::new(&pattern).ok()?;
    let captures = re.captures(text)?;
    let start = captures.get(0)?.start();

    let kind = match captures.get(1)?.as_str() {
        "class" => DefinitionKind::Class,
        _ => DefinitionKind::Function,
    };

    let lines: Vec<&str> = text[start..].lines().collect();
    let end = block_end(&lines, 0);
    Some((kind, lines[..=end].join("\n")))
}

/// Lists the HTTP verbs a class-based view handles, uppercased, in definition order.
///
/// Only methods defined directly in the class body count; nested helpers are ignored.
pub(crate) fn class_view_methods(class_source: &str) -> Vec<String> {
    let mut lines = class_source.lines();
    let Some(header) = lines.next() else {
        return Vec::new();
    };
    let class_indent = indent_of(header);

    let mut body_indent: Option<usize> = None;
    let mut methods = Vec::new();

    for line in lines {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let indent = indent_of(line);
        if indent <= class_indent {
            continue;
        }
        let body_indent = *body_indent.get_or_insert(indent);
        if indent != body_indent {
            continue;
        }

        let signature = trimmed.strip_prefix("async ").unwrap_or(trimmed);
        let Some(rest) = signature.strip_prefix("def ") else {
            continue;
        };
        let name: String = rest
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        if VIEW_METHODS.contains(&name.as_str()) {
            let verb = name.to_uppercase();
            if !methods.contains(&verb) {
                methods.push(verb);
            }
        }
    }

    methods
}

/// Finds the index of the last line of the block that starts at `lines[start]`.
///
/// A multi-line signature is followed to its closing parenthesis, then every line
/// that is blank or indented deeper than the header belongs to the block. Trailing
/// blank lines are not part of the block.
fn block_end(lines: &[&str], start: usize) -> usize {
    let header_indent = indent_of(lines[start]);
    let mut end = start;
    let mut depth: i32 = 0;

    // Signature, possibly spanning several lines
    for (index, line) in lines.iter().enumerate().skip(start) {
        end = index;
        depth += bracket_delta(line);
        if depth <= 0 {
            break;
        }
    }

    for (index, line) in lines.iter().enumerate().skip(end + 1) {
        if line.trim().is_empty() || indent_of(line) > header_indent {
            end = index;
        } else {
            break;
        }
    }

    while end > start && lines[end].trim().is_empty() {
        end -= 1;
    }
    end
}

/// Net count of opened brackets on one line, ignoring quoted text and comments.
fn bracket_delta(line: &str) -> i32 {
    let bytes = line.as_bytes();
    let mut depth = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'\'' | b'"') => {
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'#' => break,
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            _ => {}
        }
        i += 1;
    }
    depth
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWS: &str = r#"from django.http import JsonResponse
from django.views import View


def list_users(request):
    users = [{"id": 1}]
    return JsonResponse(users, safe=False)


class UserDetail(View):
    def get(self, request, pk):
        return JsonResponse({"id": pk})

    def delete(self, request, pk):
        def audit():
            pass
        return JsonResponse({}, status=204)

    def helper(self):
        return None


async def stream(request):
    return None
"#;

    #[test]
    fn test_find_function_definition() {
        let (kind, source) = find_definition(VIEWS, "list_users").unwrap();

        assert_eq!(kind, DefinitionKind::Function);
        assert!(source.starts_with("def list_users(request):"));
        assert!(source.ends_with("return JsonResponse(users, safe=False)"));
        assert!(!source.contains("class UserDetail"));
    }

    #[test]
    fn test_find_class_definition_and_methods() {
        let (kind, source) = find_definition(VIEWS, "UserDetail").unwrap();

        assert_eq!(kind, DefinitionKind::Class);
        assert!(source.contains("def helper(self):"));
        assert!(!source.contains("async def stream"));
        assert_eq!(class_view_methods(&source), vec!["GET", "DELETE"]);
    }

    #[test]
    fn test_find_async_definition() {
        let (kind, source) = find_definition(VIEWS, "stream").unwrap();

        assert_eq!(kind, DefinitionKind::Function);
        assert!(source.starts_with("async def stream"));
    }

    #[test]
    fn test_find_definition_requires_whole_name() {
        assert!(find_definition(VIEWS, "list_user").is_none());
        assert!(find_definition(VIEWS, "missing").is_none());
    }

    #[test]
    fn test_class_without_verbs_has_no_methods() {
        let source = "class Plain:\n    def helper(self):\n        pass\n";
        assert!(class_view_methods(source).is_empty());
    }

    #[test]
    fn test_decorated_function_keeps_decorators_and_body() {
        let text = "@app.route('/ping')\n@login_required\ndef ping():\n    return 'pong'\n\n@app.route('/other')\ndef other():\n    pass\n";
        let end = text.find(")\n").unwrap() + 1;

        let source = decorated_function(text, 0, end).unwrap();

        assert_eq!(
            source,
            "@app.route('/ping')\n@login_required\ndef ping():\n    return 'pong'"
        );
    }

    #[test]
    fn test_decorated_function_with_multiline_signature() {
        let text = "@app.get('/items')\nasync def items(\n    skip: int = 0,\n):\n    return []\nprint('done')\n";
        let end = text.find(")\n").unwrap() + 1;

        let source = decorated_function(text, 0, end).unwrap();

        assert!(source.contains("async def items("));
        assert!(source.ends_with("    return []"));
        assert!(!source.contains("print('done')"));
    }

    #[test]
    fn test_brackets_inside_strings_do_not_extend_signature() {
        let text = "@app.route('/split')\ndef split(sep=\"(\", close=')'):  # (\n    return sep\n\nx = 1\n";
        let end = text.find(")\n").unwrap() + 1;

        let source = decorated_function(text, 0, end).unwrap();

        assert!(source.ends_with("    return sep"));
        assert!(!source.contains("x = 1"));
    }

    #[test]
    fn test_bracket_delta_skips_quotes_and_comments() {
        assert_eq!(bracket_delta("def f(a, b):"), 0);
        assert_eq!(bracket_delta("def f("), 1);
        assert_eq!(bracket_delta("    x: str = \"(\","), 0);
        assert_eq!(bracket_delta("    y: str = 'it\\'s (',  # ["), 0);
        assert_eq!(bracket_delta("):"), -1);
    }

    #[test]
    fn test_decorated_function_missing_def() {
        let text = "@app.route('/ping')\nx = 1\n";
        let end = text.find(")\n").unwrap() + 1;

        assert!(decorated_function(text, 0, end).is_none());
    }
}
