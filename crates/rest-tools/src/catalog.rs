//! The static routing table: one entry per backend REST endpoint.
//!
//! Tools are data, not code. Each entry names an HTTP method, a path template
//! and a set of typed parameters; the [`runtime`](crate::runtime) consumes the
//! table with one generic dispatch-and-register routine. Adding an endpoint
//! means adding an entry here, nothing else.

use reqwest::Method;
use serde_json::{Value, json};

/// Where a tool argument lands in the outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamLocation {
    /// Substituted into the path template, percent-encoded as one segment.
    Path,
    /// Appended as a query pair.
    Query,
    /// Sent as an HTTP header (dropped when the value is empty).
    Header,
    /// Inserted as one field of a JSON object body.
    BodyField,
    /// Used verbatim as the whole JSON body.
    Body,
}

#[derive(Debug, Clone)]
pub struct ParamSpec {
    /// Argument name exposed to the MCP client.
    pub name: &'static str,
    /// Name on the wire (path placeholder, query key, header name, or body
    /// field).
    pub http_name: &'static str,
    pub location: ParamLocation,
    pub required: bool,
    pub schema: Value,
}

#[derive(Debug, Clone)]
pub enum ToolAction {
    /// Local credential mutation; no outbound call.
    Login,
    /// One outbound REST call.
    Http {
        method: Method,
        path: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub action: ToolAction,
    pub params: Vec<ParamSpec>,
}

fn string_schema(description: &str) -> Value {
    json!({"type": "string", "description": description})
}

fn path_param(name: &'static str, description: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        http_name: name,
        location: ParamLocation::Path,
        required: true,
        schema: string_schema(description),
    }
}

fn body_field(name: &'static str, schema: Value) -> ParamSpec {
    ParamSpec {
        name,
        http_name: name,
        location: ParamLocation::BodyField,
        required: true,
        schema,
    }
}

/// `itemLimit` / `continuationPoint` pagination, configuration-listing
/// endpoints only.
fn paging_params() -> [ParamSpec; 2] {
    [
        ParamSpec {
            name: "itemLimit",
            http_name: "itemLimit",
            location: ParamLocation::Query,
            required: false,
            schema: json!({
                "type": "integer",
                "description": "Maximum number of items to return in one page"
            }),
        },
        ParamSpec {
            name: "continuationPoint",
            http_name: "continuationPoint",
            location: ParamLocation::Query,
            required: false,
            schema: string_schema("Opaque pagination cursor returned by a previous call"),
        },
    ]
}

/// Runtime message-list size cap, alarm endpoints only.
fn max_values_param() -> ParamSpec {
    ParamSpec {
        name: "maxValues",
        http_name: "maxValues",
        location: ParamLocation::Query,
        required: false,
        schema: json!({
            "type": "integer",
            "description": "Maximum number of messages to return"
        }),
    }
}

fn language_param() -> ParamSpec {
    ParamSpec {
        name: "language",
        http_name: "Accept-Language",
        location: ParamLocation::Header,
        required: false,
        schema: string_schema("Locale for message texts, e.g. 'en-US' or 'de-DE'"),
    }
}

fn content_language_param() -> ParamSpec {
    ParamSpec {
        name: "contentLanguage",
        http_name: "Content-Language",
        location: ParamLocation::Header,
        required: false,
        schema: string_schema("Locale of the texts contained in the request body"),
    }
}

fn get(
    name: &'static str,
    description: &'static str,
    path: &'static str,
    params: Vec<ParamSpec>,
) -> ToolSpec {
    ToolSpec {
        name,
        description,
        action: ToolAction::Http {
            method: Method::GET,
            path,
        },
        params,
    }
}

/// The full tool table exposed by the gateway.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn scada_tools() -> Vec<ToolSpec> {
    let mut tools = vec![ToolSpec {
        name: "login",
        description: "Store backend credentials for all subsequent calls. Replaces any \
                      previously stored username/password and clears a configured bearer \
                      token. Credentials are only verified by the next backend call.",
        action: ToolAction::Login,
        params: vec![
            ParamSpec {
                name: "username",
                http_name: "username",
                location: ParamLocation::BodyField,
                required: true,
                schema: string_schema("Backend user name"),
            },
            ParamSpec {
                name: "password",
                http_name: "password",
                location: ParamLocation::BodyField,
                required: true,
                schema: string_schema("Backend password"),
            },
        ],
    }];

    // --- tag management ---------------------------------------------------

    tools.push(get(
        "read_tag_value",
        "Read the current runtime value of a tag.",
        "/tagManagement/Value/{tagName}",
        vec![path_param("tagName", "Name of the tag")],
    ));

    tools.push(ToolSpec {
        name: "write_tag_value",
        description: "Write a new runtime value to a tag.",
        action: ToolAction::Http {
            method: Method::PUT,
            path: "/tagManagement/Value/{tagName}",
        },
        params: vec![
            path_param("tagName", "Name of the tag"),
            body_field(
                "value",
                json!({"description": "New value for the tag (number, string or boolean)"}),
            ),
        ],
    });

    tools.push(ToolSpec {
        name: "read_tag_values",
        description: "Read the current runtime values of several tags in one call.",
        action: ToolAction::Http {
            method: Method::POST,
            path: "/tagManagement/Values",
        },
        params: vec![body_field(
            "variableNames",
            json!({
                "type": "array",
                "items": {"type": "string"},
                "description": "Names of the tags to read"
            }),
        )],
    });

    tools.push(ToolSpec {
        name: "write_tag_values",
        description: "Write runtime values to several tags in one call.",
        action: ToolAction::Http {
            method: Method::PUT,
            path: "/tagManagement/Values",
        },
        params: vec![body_field(
            "variables",
            json!({
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "value": {}
                    },
                    "required": ["name", "value"]
                },
                "description": "Tag name/value pairs to write"
            }),
        )],
    });

    tools.push(get(
        "browse_tag",
        "Read the configuration of a single tag.",
        "/tagManagement/Variable/{name}",
        vec![path_param("name", "Name of the tag")],
    ));

    tools.push(get(
        "browse_tags",
        "List configured tags.",
        "/tagManagement/Variables",
        paging_params().into(),
    ));

    tools.push(get(
        "read_connection",
        "Read the configuration and state of a named connection.",
        "/tagManagement/Connection/{name}",
        vec![path_param("name", "Name of the connection")],
    ));

    tools.push(get(
        "browse_connections",
        "List configured connections.",
        "/tagManagement/Connections",
        paging_params().into(),
    ));

    tools.push(get(
        "read_tag_group",
        "Read the configuration of a tag group.",
        "/tagManagement/Group/{name}",
        vec![path_param("name", "Name of the tag group")],
    ));

    tools.push(get(
        "browse_tag_groups",
        "List configured tag groups.",
        "/tagManagement/Groups",
        paging_params().into(),
    ));

    tools.push(get(
        "read_structure_type",
        "Read the definition of a structure type.",
        "/tagManagement/StructureType/{name}",
        vec![path_param("name", "Name of the structure type")],
    ));

    tools.push(get(
        "browse_structure_types",
        "List configured structure types.",
        "/tagManagement/StructureTypes",
        paging_params().into(),
    ));

    // --- tag logging ------------------------------------------------------

    tools.push(get(
        "browse_archives",
        "List process value archives.",
        "/tagLogging/ProcessValueArchives",
        paging_params().into(),
    ));

    tools.push(get(
        "read_archive",
        "Read the configuration of a process value archive.",
        "/tagLogging/ProcessValueArchive/{name}",
        vec![path_param("name", "Name of the archive")],
    ));

    tools.push(get(
        "read_archive_variable",
        "Read the configuration of an archived variable.",
        "/tagLogging/Variable/{name}",
        vec![path_param("name", "Name of the archived variable")],
    ));

    tools.push(get(
        "browse_archive_variables",
        "List archived variables.",
        "/tagLogging/Variables",
        paging_params().into(),
    ));

    tools.push(ToolSpec {
        name: "read_archive_values",
        description: "Read historical values from one or more process value archives. The \
                      request selects archives, variables per archive, time ranges and \
                      per-variable value caps; it is passed to the backend unchanged.",
        action: ToolAction::Http {
            method: Method::POST,
            path: "/tagLogging/Values",
        },
        params: vec![body_field(
            "archives",
            json!({
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "variables": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "name": {"type": "string"},
                                    "maxValues": {"type": "integer"},
                                    "timeFrom": {"type": "string"},
                                    "timeTo": {"type": "string"}
                                },
                                "required": ["name"]
                            }
                        }
                    },
                    "required": ["name", "variables"]
                },
                "description": "Archive value selection, forwarded verbatim"
            }),
        )],
    });

    // --- alarming ---------------------------------------------------------

    tools.push(get(
        "read_alarms",
        "Read current alarm messages.",
        "/alarmManagement/Messages",
        vec![max_values_param(), language_param()],
    ));

    tools.push(get(
        "read_alarm",
        "Read a single alarm message by number.",
        "/alarmManagement/Message/{id}",
        vec![path_param("id", "Message number"), language_param()],
    ));

    tools.push(get(
        "read_alarm_class",
        "Read the configuration of a message class.",
        "/alarmManagement/MessageClass/{name}",
        vec![path_param("name", "Name of the message class"), language_param()],
    ));

    tools.push(get(
        "browse_alarm_classes",
        "List configured message classes.",
        "/alarmManagement/MessageClasses",
        {
            let mut p: Vec<ParamSpec> = paging_params().into();
            p.push(language_param());
            p
        },
    ));

    tools.push(get(
        "read_alarm_type",
        "Read the configuration of a message type.",
        "/alarmManagement/MessageType/{name}",
        vec![path_param("name", "Name of the message type"), language_param()],
    ));

    tools.push(get(
        "browse_alarm_types",
        "List configured message types.",
        "/alarmManagement/MessageTypes",
        {
            let mut p: Vec<ParamSpec> = paging_params().into();
            p.push(language_param());
            p
        },
    ));

    tools.push(get(
        "read_alarm_group",
        "Read the configuration of a message group.",
        "/alarmManagement/MessageGroup/{name}",
        vec![path_param("name", "Name of the message group"), language_param()],
    ));

    tools.push(get(
        "browse_alarm_groups",
        "List configured message groups.",
        "/alarmManagement/MessageGroups",
        {
            let mut p: Vec<ParamSpec> = paging_params().into();
            p.push(language_param());
            p
        },
    ));

    tools.push(get(
        "read_alarm_block",
        "Read the configuration of a message block.",
        "/alarmManagement/MessageBlock/{name}",
        vec![path_param("name", "Name of the message block"), language_param()],
    ));

    tools.push(get(
        "browse_alarm_blocks",
        "List configured message blocks.",
        "/alarmManagement/MessageBlocks",
        {
            let mut p: Vec<ParamSpec> = paging_params().into();
            p.push(language_param());
            p
        },
    ));

    tools.push(get(
        "read_rest_filter",
        "Read a named REST filter definition.",
        "/alarmManagement/RestFilter/{name}",
        vec![path_param("name", "Name of the filter")],
    ));

    tools.push(get(
        "browse_rest_filters",
        "List named REST filter definitions.",
        "/alarmManagement/RestFilters",
        paging_params().into(),
    ));

    tools.push(ToolSpec {
        name: "write_rest_filter",
        description: "Create or replace a named REST filter definition.",
        action: ToolAction::Http {
            method: Method::PUT,
            path: "/alarmManagement/RestFilter/{name}",
        },
        params: vec![
            path_param("name", "Name of the filter"),
            ParamSpec {
                name: "filter",
                http_name: "filter",
                location: ParamLocation::Body,
                required: true,
                schema: json!({
                    "type": "object",
                    "description": "Filter definition, forwarded verbatim as the request body"
                }),
            },
            content_language_param(),
        ],
    });

    tools.push(get(
        "read_filtered_alarms",
        "Read alarm messages selected by a named REST filter.",
        "/alarmManagement/FilteredMessages/{filterName}",
        vec![
            path_param("filterName", "Name of the REST filter"),
            max_values_param(),
            language_param(),
        ],
    ));

    tools
}
