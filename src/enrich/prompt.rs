//! Prompts sent to documentation models.

use crate::enrich::EnrichmentRequest;
use serde_json::json;

/// Instructions for documenting a single endpoint.
pub const ENDPOINT_INSTRUCTIONS: &str = r#"You are an expert software engineer and technical writer. Document the single HTTP endpoint described below.

Rules:
- Base everything on the handler source when it is given. Do not invent fields.
- Path parameters are part of the URL path. Never list them under "query_params".
- Only describe a request body when the handler reads one.
- Keep types to: string, integer, number, boolean, object, array.

Return ONLY one JSON object with these keys:
  "summary": a short title,
  "description": a few sentences on what the handler does and how it handles errors,
  "query_params": [{"name": ..., "description": ..., "type": ...}] or [],
  "request_body": {"description": ..., "schema": {...}} or null,
  "responses": [{"status_code": "200", "description": ...}] or []"#;

/// Instructions for documenting a batch of endpoints at once.
pub const BATCH_INSTRUCTIONS: &str = r#"You are an expert technical writer. Given raw endpoint data (method, path, framework, file, and sometimes source), return an enriched JSON array with one object per endpoint.

Each object must repeat the endpoint's "method" and "path" exactly as given and add "summary" and "description". Add "query_params", "request_body" and "responses" when the source shows them. If information is missing, write a short, sensible description.

IMPORTANT: Return ONLY the JSON array."#;

/// Builds the prompt for one endpoint.
pub fn endpoint_prompt(request: &EnrichmentRequest) -> String {
    let mut prompt = format!(
        "{}\n\nEndpoint: {} {}\nFramework: {}\nFile: {}\n",
        ENDPOINT_INSTRUCTIONS, request.method, request.path, request.framework, request.file
    );
    match request.source {
        Some(ref source) => {
            prompt.push_str("\nHandler source:\n```\n");
            prompt.push_str(source);
            prompt.push_str("\n```\n");
        }
        None => prompt.push_str("\nThe handler source is not available.\n"),
    }
    prompt
}

/// Builds the prompt for a whole batch.
///
/// The endpoint list travels as JSON so the model can echo method and path back.
pub fn batch_prompt(requests: &[EnrichmentRequest]) -> Result<String, serde_json::Error> {
    let payload = json!({
        "system": BATCH_INSTRUCTIONS,
        "user": {
            "task": "enrich_endpoints",
            "endpoints": requests,
        },
    });
    serde_json::to_string(&payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Framework;

    fn request(source: Option<&str>) -> EnrichmentRequest {
        EnrichmentRequest {
            method: "GET".to_string(),
            path: "/users/<int:user_id>".to_string(),
            framework: Framework::Flask,
            file: "app.py".to_string(),
            source: source.map(str::to_string),
        }
    }

    #[test]
    fn test_endpoint_prompt_includes_source() {
        let prompt = endpoint_prompt(&request(Some("def get_user(user_id): ...")));

        assert!(prompt.contains("Endpoint: GET /users/<int:user_id>"));
        assert!(prompt.contains("Framework: flask"));
        assert!(prompt.contains("def get_user(user_id): ..."));
    }

    #[test]
    fn test_endpoint_prompt_without_source() {
        let prompt = endpoint_prompt(&request(None));
        assert!(prompt.contains("source is not available"));
    }

    #[test]
    fn test_batch_prompt_is_json() {
        let prompt = batch_prompt(&[request(None)]).unwrap();

        let value: serde_json::Value = serde_json::from_str(&prompt).unwrap();
        assert_eq!(value["user"]["task"], "enrich_endpoints");
        assert_eq!(value["user"]["endpoints"][0]["framework"], "flask");
        assert!(value["user"]["endpoints"][0].get("source").is_none());
    }
}
