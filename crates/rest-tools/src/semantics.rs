//! MCP tool annotations derived from HTTP method semantics (RFC 9110).

use crate::catalog::ToolAction;
use reqwest::Method;
use rmcp::model::ToolAnnotations;

/// Generate annotations for a catalog entry.
///
/// HTTP-backed tools always set `openWorldHint` (they talk to an external
/// system); the login tool is local and closed-world.
#[must_use]
pub fn annotations_for(action: &ToolAction) -> ToolAnnotations {
    match action {
        ToolAction::Login => ToolAnnotations {
            title: None,
            read_only_hint: Some(false),
            destructive_hint: Some(false),
            idempotent_hint: Some(true),
            open_world_hint: Some(false),
        },
        ToolAction::Http { method, .. } => annotations_for_method(method),
    }
}

fn annotations_for_method(method: &Method) -> ToolAnnotations {
    let open_world_hint = Some(true);

    if method == Method::GET {
        return ToolAnnotations {
            title: None,
            read_only_hint: Some(true),
            destructive_hint: Some(false),
            idempotent_hint: Some(true),
            open_world_hint,
        };
    }

    if method == Method::POST {
        return ToolAnnotations {
            title: None,
            read_only_hint: Some(false),
            destructive_hint: Some(false),
            idempotent_hint: Some(false),
            open_world_hint,
        };
    }

    if method == Method::PUT {
        return ToolAnnotations {
            title: None,
            read_only_hint: Some(false),
            destructive_hint: Some(true),
            idempotent_hint: Some(true),
            open_world_hint,
        };
    }

    ToolAnnotations {
        title: None,
        read_only_hint: None,
        destructive_hint: None,
        idempotent_hint: None,
        open_world_hint,
    }
}
