// src/tools/definitions.rs

use serde_json::{Value, json};

/// The fixed function schema offered to the model on the first round of
/// every conversation. Names must match `ToolKind::from_name`.
pub fn tool_schema() -> Vec<Value> {
    vec![
        json!({
            "type": "function",
            "function": {
                "name": "search_context",
                "description": "Search emails and contacts for information about clients. Use this to answer questions about clients.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "Search query to find relevant emails and contacts"
                        }
                    },
                    "required": ["query"]
                }
            }
        }),
        json!({
            "type": "function",
            "function": {
                "name": "send_email",
                "description": "Send an email to a recipient. Use this to communicate with clients.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "to": {
                            "type": "string",
                            "description": "Recipient email address"
                        },
                        "subject": {
                            "type": "string",
                            "description": "Email subject line"
                        },
                        "body": {
                            "type": "string",
                            "description": "Email body content"
                        },
                        "cc": {
                            "type": "array",
                            "items": {"type": "string"},
                            "description": "Optional CC email addresses"
                        }
                    },
                    "required": ["to", "subject", "body"]
                }
            }
        }),
        json!({
            "type": "function",
            "function": {
                "name": "create_calendar_event",
                "description": "Create a calendar event/appointment. Use this to schedule meetings. IMPORTANT: Always include the attendee's email address in the 'attendees' array so they receive an invitation.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "summary": {
                            "type": "string",
                            "description": "Event title/summary"
                        },
                        "start_time": {
                            "type": "string",
                            "description": "Start time in ISO 8601 format (e.g., 2026-05-15T14:00:00Z)"
                        },
                        "end_time": {
                            "type": "string",
                            "description": "End time in ISO 8601 format (e.g., 2026-05-15T15:00:00Z)"
                        },
                        "attendees": {
                            "type": "array",
                            "items": {"type": "string"},
                            "description": "List of attendee email addresses. REQUIRED: Always include the email address of the person who requested the meeting so they receive an invitation. If the event is created from an email, use the sender's email address."
                        },
                        "description": {
                            "type": "string",
                            "description": "Optional event description"
                        }
                    },
                    "required": ["summary", "start_time", "end_time", "attendees"]
                }
            }
        }),
        json!({
            "type": "function",
            "function": {
                "name": "get_calendar_events",
                "description": "Get calendar events for a time period. Use this to check availability or find upcoming meetings.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "time_min": {
                            "type": "string",
                            "description": "Minimum time in ISO 8601 format (optional)"
                        },
                        "time_max": {
                            "type": "string",
                            "description": "Maximum time in ISO 8601 format (optional)"
                        }
                    }
                }
            }
        }),
        json!({
            "type": "function",
            "function": {
                "name": "search_crm_contact",
                "description": "Search for a contact in the CRM by name or email.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "Contact name or email to search for"
                        }
                    },
                    "required": ["query"]
                }
            }
        }),
        json!({
            "type": "function",
            "function": {
                "name": "create_crm_contact",
                "description": "Create a new contact in the CRM.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "email": {
                            "type": "string",
                            "description": "Contact email address (required)"
                        },
                        "first_name": {
                            "type": "string",
                            "description": "Contact first name"
                        },
                        "last_name": {
                            "type": "string",
                            "description": "Contact last name"
                        },
                        "phone": {
                            "type": "string",
                            "description": "Contact phone number"
                        },
                        "company": {
                            "type": "string",
                            "description": "Company name"
                        }
                    },
                    "required": ["email"]
                }
            }
        }),
        json!({
            "type": "function",
            "function": {
                "name": "create_crm_note",
                "description": "Create a note for a CRM contact.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "contact_id": {
                            "type": "string",
                            "description": "CRM contact ID"
                        },
                        "note": {
                            "type": "string",
                            "description": "Note content"
                        }
                    },
                    "required": ["contact_id", "note"]
                }
            }
        }),
        json!({
            "type": "function",
            "function": {
                "name": "create_task",
                "description": "Create a task that needs to be completed over time (e.g., scheduling that requires waiting for an email response).",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "task_type": {
                            "type": "string",
                            "description": "Type of task (e.g., 'schedule_appointment', 'create_contact')"
                        },
                        "description": {
                            "type": "string",
                            "description": "Task description"
                        },
                        "input_data": {
                            "type": "object",
                            "description": "Task input data and current state"
                        }
                    },
                    "required": ["task_type", "description", "input_data"]
                }
            }
        }),
        json!({
            "type": "function",
            "function": {
                "name": "create_standing_instruction",
                "description": "Create a standing instruction that the assistant will remember and apply automatically when specific events occur (e.g., emails, calendar events, CRM changes). Use this when the user asks you to remember something or set up an automation.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "instruction": {
                            "type": "string",
                            "description": "The instruction text describing what should happen (e.g., 'When someone emails me about booking a call, automatically create a calendar event')"
                        },
                        "trigger_type": {
                            "type": "string",
                            "description": "When to apply this instruction: 'communication' (for email events), 'calendar' (for calendar events), 'crm' (for CRM events), or 'all' (for all events). If not specified, will be auto-detected from the instruction text.",
                            "enum": ["communication", "calendar", "crm", "all"]
                        }
                    },
                    "required": ["instruction"]
                }
            }
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::dispatcher::ToolKind;

    #[test]
    fn test_every_schema_name_maps_to_a_kind() {
        for tool in tool_schema() {
            let name = tool["function"]["name"].as_str().unwrap();
            assert!(
                ToolKind::from_name(name).is_some(),
                "schema tool '{}' has no ToolKind",
                name
            );
        }
    }
}
