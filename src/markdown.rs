//! Markdown report generation.

use crate::cli::Framework;
use crate::endpoint::{sorted_for_document, Endpoint};

const NO_DESCRIPTION: &str = "_No description available._";
const NONE_MARKER: &str = "_None_";

/// Renders the Markdown report for `endpoints`.
///
/// Endpoints are sorted by framework, path and method, and grouped under one
/// `##` heading per framework. Missing documentation is rendered as placeholder
/// text; rendering never fails.
pub fn render_markdown(endpoints: &[Endpoint]) -> String {
    let mut out = String::from("# API Documentation\n");
    let mut current_group: Option<Framework> = None;

    for endpoint in sorted_for_document(endpoints) {
        if current_group != Some(endpoint.framework) {
            out.push_str(&format!("\n## {}\n", endpoint.framework.display_name()));
            current_group = Some(endpoint.framework);
        }
        render_endpoint(&mut out, endpoint);
    }

    out
}

fn render_endpoint(out: &mut String, endpoint: &Endpoint) {
    out.push_str(&format!("\n### {}\n\n", heading_text(endpoint)));
    out.push_str(&format!(
        "- **Endpoint:** `{} {}`\n",
        endpoint.method, endpoint.path
    ));
    out.push_str(&format!("- **Source:** `{}`\n\n", endpoint.file));

    let description = endpoint
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(NO_DESCRIPTION);
    out.push_str(description);
    out.push('\n');

    if let Some(ref source) = endpoint.source {
        out.push('\n');
        push_fenced(out, source_language(endpoint), source);
    }

    out.push_str("\n#### Query Parameters\n\n");
    if endpoint.query_params.is_empty() {
        out.push_str(NONE_MARKER);
        out.push('\n');
    } else {
        out.push_str("| Name | Type | Description |\n");
        out.push_str("| --- | --- | --- |\n");
        for param in &endpoint.query_params {
            out.push_str(&format!(
                "| {} | {} | {} |\n",
                table_cell(&param.name),
                table_cell(param.param_type.as_deref().unwrap_or("-")),
                table_cell(&param.description)
            ));
        }
    }

    out.push_str("\n#### Request Body\n\n");
    match endpoint.request_body {
        Some(ref body) => {
            let description = body.description.trim();
            if !description.is_empty() {
                out.push_str(description);
                out.push('\n');
            }
            if body.has_schema() {
                let schema = serde_json::to_string_pretty(&body.schema)
                    .unwrap_or_else(|_| body.schema.to_string());
                if !description.is_empty() {
                    out.push('\n');
                }
                push_fenced(out, "json", &schema);
            }
        }
        None => {
            out.push_str(NONE_MARKER);
            out.push('\n');
        }
    }

    out.push_str("\n#### Responses\n\n");
    if endpoint.responses.is_empty() {
        out.push_str(NONE_MARKER);
        out.push('\n');
    } else {
        for response in &endpoint.responses {
            out.push_str(&format!(
                "- `{}`: {}\n",
                response.status_code,
                response.description.trim()
            ));
        }
    }
}

/// Fence language for an endpoint's handler source.
fn source_language(endpoint: &Endpoint) -> &'static str {
    match endpoint.framework {
        Framework::Express if endpoint.file.ends_with(".ts") => "typescript",
        Framework::Express => "javascript",
        Framework::Django | Framework::Fastapi | Framework::Flask => "python",
    }
}

/// Writes `body` as a fenced code block, lengthening the fence when the body
/// itself contains backtick runs.
fn push_fenced(out: &mut String, language: &str, body: &str) {
    let longest_run = body
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    let fence = "`".repeat(longest_run.max(2) + 1);

    out.push_str(&format!("{}{}\n", fence, language));
    out.push_str(body.trim_end());
    out.push_str(&format!("\n{}\n", fence));
}

/// A heading must stay on one line, so model summaries are flattened.
fn heading_text(endpoint: &Endpoint) -> String {
    let text = endpoint.summary.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        format!("{} {}", endpoint.method, endpoint.path)
    } else {
        text
    }
}

fn table_cell(text: &str) -> String {
    text.trim().replace('|', "\\|").replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::test_support::endpoint;
    use crate::endpoint::{QueryParam, RequestBody, ResponseDoc};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_report_has_only_title() {
        assert_eq!(render_markdown(&[]), "# API Documentation\n");
    }

    #[test]
    fn test_undocumented_endpoint_uses_placeholders() {
        let ep = endpoint(Framework::Flask, "GET", "/ping");

        let markdown = render_markdown(&[ep]);

        assert_eq!(
            markdown,
            "# API Documentation

## Flask

### GET /ping

- **Endpoint:** `GET /ping`
- **Source:** `app.py`

_No description available._

#### Query Parameters

_None_

#### Request Body

_None_

#### Responses

_None_
"
        );
    }

    #[test]
    fn test_enriched_endpoint_sections() {
        let mut ep = endpoint(Framework::Fastapi, "POST", "/items");
        ep.summary = "Create item".to_string();
        ep.description = Some("Stores a new item.".to_string());
        ep.source = Some("async def create_item(item: Item):\n    return item".to_string());
        ep.query_params = vec![QueryParam {
            name: "dry_run".to_string(),
            description: "Validate only | no write".to_string(),
            param_type: Some("boolean".to_string()),
        }];
        ep.request_body = Some(RequestBody {
            description: "Item payload".to_string(),
            schema: serde_json::json!({"type": "object"}),
        });
        ep.responses = vec![ResponseDoc {
            status_code: "201".to_string(),
            description: "Created".to_string(),
        }];

        let markdown = render_markdown(&[ep]);

        assert!(markdown.contains("## FastAPI\n"));
        assert!(markdown.contains("### Create item\n"));
        assert!(markdown.contains("Stores a new item.\n"));
        assert!(markdown.contains(
            "```python\nasync def create_item(item: Item):\n    return item\n```\n"
        ));
        assert!(markdown.contains("| dry_run | boolean | Validate only \\| no write |\n"));
        assert!(markdown.contains(
            "Item payload\n\n```json\n{\n  \"type\": \"object\"\n}\n```\n"
        ));
        assert!(markdown.contains("- `201`: Created\n"));
    }

    #[test]
    fn test_groups_in_sorted_order() {
        let endpoints = vec![
            endpoint(Framework::Flask, "GET", "/b"),
            endpoint(Framework::Express, "GET", "/z"),
            endpoint(Framework::Flask, "GET", "/a"),
        ];

        let markdown = render_markdown(&endpoints);

        let express = markdown.find("## Express").unwrap();
        let flask = markdown.find("## Flask").unwrap();
        let a = markdown.find("### GET /a").unwrap();
        let b = markdown.find("### GET /b").unwrap();
        assert!(express < flask);
        assert!(flask < a && a < b);
        assert_eq!(markdown.matches("## Flask").count(), 1);
    }

    #[test]
    fn test_multiline_summary_stays_in_heading() {
        let mut ep = endpoint(Framework::Flask, "GET", "/users");
        ep.summary = "List\n  all users\r\n".to_string();
        let mut blank = endpoint(Framework::Flask, "GET", "/blank");
        blank.summary = " \n ".to_string();

        let markdown = render_markdown(&[ep, blank]);

        assert!(markdown.contains("\n### List all users\n\n- **Endpoint:** `GET /users`"));
        assert!(markdown.contains("\n### GET /blank\n\n"));
    }

    #[test]
    fn test_typescript_source_fence() {
        let mut ep = endpoint(Framework::Express, "GET", "/x");
        ep.file = "routes/x.ts".to_string();
        ep.source = Some("router.get('/x', (req, res) => res.send(`ok`));".to_string());

        let markdown = render_markdown(&[ep]);

        assert!(markdown.contains("```typescript\nrouter.get("));
    }

    #[test]
    fn test_fence_is_longer_than_backticks_in_source() {
        let mut out = String::new();
        push_fenced(&mut out, "python", "doc = \"\"\"\n```\nexample\n```\n\"\"\"");
        assert!(out.starts_with("````python\n"));
        assert!(out.ends_with("\n````\n"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let endpoints = vec![
            endpoint(Framework::Django, "ANY", "/users/"),
            endpoint(Framework::Flask, "POST", "/items"),
            endpoint(Framework::Flask, "GET", "/items"),
        ];

        assert_eq!(render_markdown(&endpoints), render_markdown(&endpoints));
    }
}
