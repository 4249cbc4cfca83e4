// src/agent/prompt.rs

//! System and trigger prompt assembly. The date/time anchor is always
//! explicit: the model must resolve relative dates ("next Tuesday") against
//! the supplied anchor, never its own training cutoff.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::providers::registry::Capabilities;
use crate::store::instructions::{StandingInstruction, TriggerType};

fn date_anchor(now: DateTime<Utc>) -> (String, String, String) {
    (
        now.format("%Y-%m-%d").to_string(),
        now.format("%A").to_string(),
        now.format("%H:%M:%S UTC").to_string(),
    )
}

/// System prompt for a conversation turn: persona, date anchor, connected
/// integrations, and the literal text of every active standing instruction.
pub fn build_system_prompt(
    now: DateTime<Utc>,
    caps: &Capabilities,
    instructions: &[StandingInstruction],
) -> String {
    let (date, weekday, time) = date_anchor(now);

    let mut prompt = format!(
        r#"You are an AI assistant for a Financial Advisor. You help manage client relationships by:
- Answering questions about clients using information from emails and the CRM
- Performing actions like scheduling appointments, sending emails, creating contacts
- Remembering and following standing instructions

CRITICAL: Today is {date} ({weekday}) at {time}.
When someone mentions relative dates like "next Tuesday", "tomorrow", "next week", you MUST calculate the actual date based on today's date ({date}).
Always use ISO 8601 format (YYYY-MM-DDTHH:MM:SSZ) for calendar event times.

Available integrations:
"#
    );

    if caps.email.is_some() {
        prompt.push_str("- Email: Read and send messages\n");
    }
    if caps.calendar.is_some() {
        prompt.push_str("- Calendar: View and create events\n");
    }
    if caps.crm.is_some() {
        prompt.push_str("- CRM: Search, create, and manage contacts and notes\n");
    }

    if !instructions.is_empty() {
        prompt.push_str("\n## Standing Instructions (always follow these):\n");
        for instruction in instructions {
            prompt.push_str(&format!("- {}\n", instruction.instruction));
        }
    }

    prompt.push_str(
        r#"
Be helpful, professional, and proactive. When scheduling appointments, handle the full flow including finding the contact, sending email with available times, waiting for the response, creating the calendar event when confirmed, and adding notes to the CRM.

Use tool calling to perform actions. Create tasks for multi-step processes that require waiting.

When creating calendar events:
- ALWAYS include the attendee's email address in the 'attendees' parameter so they receive an invitation
- If creating an event from an email, use the sender's email address as an attendee
- Calculate dates from relative terms based on TODAY's date, and ensure the date is in the future

If the user asks you to remember something or set up an automation (e.g., "when someone emails me...", "when I create a contact..."), use the create_standing_instruction tool to save it.
"#,
    );

    prompt
}

/// Synthetic prompt for the trigger evaluator: the event, the matching
/// instructions verbatim, and the same anchoring/attendee directives.
pub fn build_trigger_prompt(
    now: DateTime<Utc>,
    source: TriggerType,
    summary: &Value,
    instructions: &[StandingInstruction],
) -> String {
    let (date, weekday, time) = date_anchor(now);

    let mut prompt = format!(
        "CRITICAL: Today is {date} ({weekday}) at {time}.\n\nA {source} event occurred:\n{}\n\nYou have these standing instructions:\n",
        serde_json::to_string_pretty(summary).unwrap_or_else(|_| summary.to_string()),
    );

    for instruction in instructions {
        prompt.push_str(&format!("- {}\n", instruction.instruction));
    }

    prompt.push_str(&format!(
        "\nShould you take any action? Use tools if needed.\n\n\
         IMPORTANT: When calculating dates from relative terms (e.g., 'next Tuesday', 'tomorrow'), \
         use TODAY's date ({date}) to determine the actual future date. Always use ISO 8601 format \
         (YYYY-MM-DDTHH:MM:SSZ) for calendar events. Ensure dates are in the future, not the past.\n\n\
         CRITICAL: When creating calendar events, ALWAYS include the attendee's email address in the \
         'attendees' parameter. If this event was triggered by an email, use the sender's email \
         address (from the 'from' field in the event data above) as an attendee so they receive an \
         invitation."
    ));

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn anchor() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 4, 15, 30, 0).unwrap()
    }

    #[test]
    fn test_system_prompt_carries_date_anchor() {
        let prompt = build_system_prompt(anchor(), &Capabilities::default(), &[]);
        assert!(prompt.contains("2026-03-04"));
        assert!(prompt.contains("Wednesday"));
    }

    #[test]
    fn test_system_prompt_lists_instructions_verbatim() {
        let instructions = vec![StandingInstruction {
            id: 1,
            user_id: 1,
            instruction: "Notify me about new contacts".to_string(),
            trigger_type: TriggerType::Crm,
            is_active: true,
        }];
        let prompt = build_system_prompt(anchor(), &Capabilities::default(), &instructions);
        assert!(prompt.contains("- Notify me about new contacts"));
    }

    #[test]
    fn test_trigger_prompt_names_source_and_sender_directive() {
        let summary = json!({"from": "alice@x.com", "subject": "Booking"});
        let instructions = vec![StandingInstruction {
            id: 1,
            user_id: 1,
            instruction: "Schedule calls automatically".to_string(),
            trigger_type: TriggerType::Communication,
            is_active: true,
        }];
        let prompt =
            build_trigger_prompt(anchor(), TriggerType::Communication, &summary, &instructions);
        assert!(prompt.contains("A communication event occurred"));
        assert!(prompt.contains("alice@x.com"));
        assert!(prompt.contains("attendees"));
    }
}
