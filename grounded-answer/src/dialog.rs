//! Dialog context rendering and history bookkeeping.

use ai_llm_service::Role;

use crate::model::{DialogMessage, Request, Response};

/// Renders `history` as `role: content` lines, skipping blank messages.
///
/// A message deserialized without a role renders as `user`.
///
/// # Example
/// ```
/// # use grounded_answer::{DialogMessage, format_dialog_context};
/// # use ai_llm_service::Role;
/// let h = vec![
///     DialogMessage::new(Role::User, "hi"),
///     DialogMessage::new(Role::Assistant, "  "),
///     DialogMessage::new(Role::Assistant, "hello"),
/// ];
/// assert_eq!(format_dialog_context(&h), "user: hi\nassistant: hello");
/// ```
pub fn format_dialog_context(history: &[DialogMessage]) -> String {
    history
        .iter()
        .filter_map(|m| {
            let content = m.content.trim();
            if content.is_empty() {
                return None;
            }
            Some(format!("{}: {content}", m.role))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Caller-supplied context if non-blank, otherwise the formatted history.
pub fn resolve_dialog_context(req: &Request) -> String {
    match req.dialog_context.as_deref().map(str::trim) {
        Some(ctx) if !ctx.is_empty() => ctx.to_string(),
        _ => format_dialog_context(&req.history),
    }
}

/// Appends one finished turn to `history` so it can be re-supplied next time.
///
/// The assistant message is the clarifying question when one was requested,
/// else the answer text.
pub fn append_turn(history: &mut Vec<DialogMessage>, question: &str, response: &Response) {
    let question = question.trim();
    if !question.is_empty() {
        history.push(DialogMessage::new(Role::User, question));
    }

    let reply = if response.need_clarification {
        response
            .clarifying_question
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .unwrap_or("need clarification")
    } else {
        response.answer.trim()
    };
    if !reply.is_empty() {
        history.push(DialogMessage::new(Role::Assistant, reply));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_renders_empty() {
        assert_eq!(format_dialog_context(&[]), "");
    }

    #[test]
    fn trims_content_and_keeps_roles() {
        let h = vec![
            DialogMessage::new(Role::System, "  be short "),
            DialogMessage::new(Role::Tool, "result"),
        ];
        assert_eq!(format_dialog_context(&h), "system: be short\ntool: result");
    }

    #[test]
    fn explicit_context_wins_over_history() {
        let req = Request::new("q")
            .with_history(vec![DialogMessage::new(Role::User, "old")])
            .with_dialog_context("  rendered elsewhere  ");
        assert_eq!(resolve_dialog_context(&req), "rendered elsewhere");
    }

    #[test]
    fn blank_context_falls_back_to_history() {
        let req = Request::new("q")
            .with_history(vec![DialogMessage::new(Role::User, "old")])
            .with_dialog_context("   ");
        assert_eq!(resolve_dialog_context(&req), "user: old");
    }

    #[test]
    fn append_turn_records_answer_or_clarification() {
        let mut h = Vec::new();
        let answered = Response {
            answer: "X is Y [C1]".into(),
            ..Default::default()
        };
        append_turn(&mut h, " What is X? ", &answered);
        assert_eq!(h.len(), 2);
        assert_eq!(h[0], DialogMessage::new(Role::User, "What is X?"));
        assert_eq!(h[1], DialogMessage::new(Role::Assistant, "X is Y [C1]"));

        let clarify = Response {
            need_clarification: true,
            clarifying_question: Some("Which version?".into()),
            ..Default::default()
        };
        append_turn(&mut h, "How to install?", &clarify);
        assert_eq!(h[3].content, "Which version?");

        let bare = Response {
            need_clarification: true,
            ..Default::default()
        };
        append_turn(&mut h, "And then?", &bare);
        assert_eq!(h[5].content, "need clarification");
    }
}
