//! Bracket-matching source recovery for JavaScript and TypeScript handlers.

use regex::Regex;

/// Walks `bytes` from `start`, calling `visit` for every byte outside string
/// literals and comments. Stops when `visit` returns `true` and yields that index.
fn scan_code(bytes: &[u8], start: usize, mut visit: impl FnMut(usize, u8) -> bool) -> Option<usize> {
    let mut i = start;
    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'\'' | b'"' | b'`' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i += 1;
            }
            _ => {
                if visit(i, b) {
                    return Some(i);
                }
            }
        }
        i += 1;
    }
    None
}

/// Returns the index of the bracket closing the one at `open`.
///
/// String literals and comments are skipped. Returns `None` for unbalanced text.
pub(crate) fn matching_close(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if !matches!(bytes.get(open), Some(b'(' | b'[' | b'{')) {
        return None;
    }

    let mut depth = 0i32;
    scan_code(bytes, open, |_, b| {
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            _ => {}
        }
        depth == 0
    })
}

/// Splits a call's argument text on commas that are not nested in brackets or strings.
pub(crate) fn split_top_level(args: &str) -> Vec<&str> {
    let bytes = args.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut last = 0;

    scan_code(bytes, 0, |i, b| {
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            b',' if depth == 0 => {
                parts.push(&args[last..i]);
                last = i + 1;
            }
            _ => {}
        }
        false
    });
    parts.push(&args[last..]);

    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

fn line_start(text: &str, index: usize) -> usize {
    text[..index].rfind('\n').map_or(0, |i| i + 1)
}

fn skip_whitespace(text: &str, index: usize) -> usize {
    index + (text[index..].len() - text[index..].trim_start().len())
}

/// Finds the definition of the function `name` and returns its source.
///
/// Recognizes `function name(...) {...}` declarations and `const|let|var name =`
/// bindings to function expressions or arrow functions.
pub(crate) fn find_function(text: &str, name: &str) -> Option<String> {
    let name = regex::escape(name);

    let declaration = Regex::new(&format!(
        r"(?m)^[ \t]*(?:export[ \t]+)?(?:async[ \t]+)?function\s*\*?\s*{}\s*\(",
        name
    ))
    .ok()?;
    if let Some(found) = declaration.find(text) {
        let params_close = matching_close(text, found.end() - 1)?;
        let body_open = params_close + text[params_close..].find('{')?;
        let body_close = matching_close(text, body_open)?;
        return Some(text[line_start(text, found.start())..=body_close].trim().to_string());
    }

    let binding = Regex::new(&format!(
        r"(?m)^[ \t]*(?:export[ \t]+)?(?:const|let|var)[ \t]+{}\s*(?::[^=]+)?=\s*",
        name
    ))
    .ok()?;
    let found = binding.find(text)?;
    let start = line_start(text, found.start());
    let end = function_expression_end(text, found.end())?;

    let mut source_end = end + 1;
    if text[source_end..].starts_with(';') {
        source_end += 1;
    }
    Some(text[start..source_end].trim().to_string())
}

/// Returns the index of the last character of the function expression at `index`.
fn function_expression_end(text: &str, index: usize) -> Option<usize> {
    let mut cursor = skip_whitespace(text, index);
    if text[cursor..].starts_with("async") {
        cursor = skip_whitespace(text, cursor + "async".len());
    }

    if text[cursor..].starts_with("function") {
        let params_open = cursor + text[cursor..].find('(')?;
        let params_close = matching_close(text, params_open)?;
        let body_open = params_close + text[params_close..].find('{')?;
        return matching_close(text, body_open);
    }

    // Arrow function: `(a, b) => ...` or `a => ...`
    let arrow = if text[cursor..].starts_with('(') {
        let params_close = matching_close(text, cursor)?;
        skip_whitespace(text, params_close + 1)
    } else {
        let ident_len = text[cursor..]
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
            .unwrap_or(text.len() - cursor);
        if ident_len == 0 {
            return None;
        }
        skip_whitespace(text, cursor + ident_len)
    };
    if !text[arrow..].starts_with("=>") {
        return None;
    }

    let body = skip_whitespace(text, arrow + 2);
    if text[body..].starts_with('{') {
        return matching_close(text, body);
    }

    // Expression body runs to the end of the statement
    let rest = &text[body..];
    let len = rest.find([';', '\n']).unwrap_or(rest.len());
    Some(body + len.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_close_skips_strings_and_comments() {
        let text = "fn({ a: ')', b: \"}\" /* ) */ }) // )\n";
        let close = matching_close(text, 3).unwrap();
        assert_eq!(&text[3..=close], "{ a: ')', b: \"}\" /* ) */ }");

        let call_close = matching_close(text, 2).unwrap();
        assert_eq!(&text[call_close..=call_close], ")");
        assert_eq!(call_close, close + 1);
    }

    #[test]
    fn test_matching_close_unbalanced() {
        assert!(matching_close("(a, b", 0).is_none());
        assert!(matching_close("abc", 0).is_none());
    }

    #[test]
    fn test_split_top_level() {
        let parts = split_top_level(", auth, (req, res) => { res.json({ a: 1, b: 2 }); }");
        assert_eq!(parts, vec!["auth", "(req, res) => { res.json({ a: 1, b: 2 }); }"]);
    }

    #[test]
    fn test_find_function_declaration() {
        let text = "// DELETE user\nfunction deleteUser(req, res) {\n  res.status(200).json({ ok: true });\n}\n\nfunction other() {}\n";
        let source = find_function(text, "deleteUser").unwrap();
        assert_eq!(
            source,
            "function deleteUser(req, res) {\n  res.status(200).json({ ok: true });\n}"
        );
    }

    #[test]
    fn test_find_arrow_function_binding() {
        let text = "const createUser = (req, res) => {\n  const { name } = req.body;\n  res.status(201).json({ name });\n};\nconst x = 1;\n";
        let source = find_function(text, "createUser").unwrap();
        assert!(source.starts_with("const createUser = (req, res) => {"));
        assert!(source.ends_with("};"));
        assert!(!source.contains("const x = 1"));
    }

    #[test]
    fn test_find_async_arrow_and_expression_body() {
        let text = "const updateUser = async (req, res) => {\n  await save(req.body);\n};\nconst ping = req => res.send('pong');\n";
        assert!(find_function(text, "updateUser").unwrap().contains("await save"));
        assert_eq!(
            find_function(text, "ping").unwrap(),
            "const ping = req => res.send('pong');"
        );
    }

    #[test]
    fn test_find_function_expression_binding() {
        let text = "export const list = function (req, res) {\n  res.json([]);\n}\n";
        assert!(find_function(text, "list").unwrap().ends_with("}"));
    }

    #[test]
    fn test_non_function_binding_is_not_a_handler() {
        let text = "const router = require('express').Router();\n";
        assert!(find_function(text, "router").is_none());
        assert!(find_function(text, "missing").is_none());
    }
}
