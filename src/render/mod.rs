//! Pure HTML rendering of a conversation: no state of its own, identical
//! output for identical input.

use crate::models::chat::{ ChatMessage, Conversation, Role };

const USER_BUBBLE_STYLE: &str =
    "background-color:#e26161;color:white;float:right;padding:10px;border-radius:5px;margin-top:10px;";
const ASSISTANT_BUBBLE_STYLE: &str =
    "background-color:#3b3b3b;color:white;padding:10px;border-radius:5px;margin-top:10px;";
const ERROR_BANNER_STYLE: &str =
    "background-color:#8b1e1e;color:white;padding:10px;border-radius:5px;margin-top:10px;";

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

pub fn render_message(message: &ChatMessage) -> String {
    let content = escape_html(&message.content);
    match message.role {
        Role::User =>
            format!(
                "<div style='{}'>{}</div><div style='clear:both;'></div>",
                USER_BUBBLE_STYLE,
                content
            ),
        Role::Assistant => format!("<div style='{}'>{}</div>", ASSISTANT_BUBBLE_STYLE, content),
    }
}

pub fn render_messages(conversation: &Conversation) -> String {
    conversation.messages.iter().map(render_message).collect()
}

pub fn render_page(
    conversation: &Conversation,
    error: Option<&str>,
    max_message_chars: usize
) -> String {
    let mut page = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Gemini Chatbot</title>\n</head>\n\
         <body style='font-family:sans-serif;max-width:640px;margin:40px auto;'>\n\
         <h1>Gemini Chatbot</h1>\n"
    );

    if let Some(message) = error {
        page.push_str(
            &format!("<div style='{}'>{}</div>\n", ERROR_BANNER_STYLE, escape_html(message))
        );
    }

    page.push_str(
        &format!(
            "<form method='post' action='/chat'>\n\
             <input type='text' name='message' maxlength='{}' placeholder='You:' autofocus>\n\
             <button type='submit'>Send</button>\n</form>\n",
            max_message_chars
        )
    );

    page.push_str(&render_messages(conversation));
    page.push_str("\n</body>\n</html>\n");
    page
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_conversation() -> Conversation {
        let mut conversation = Conversation::new("s");
        conversation.messages.push(ChatMessage::new(Role::User, "hello"));
        conversation.messages.push(ChatMessage::new(Role::Assistant, "hi back"));
        conversation
    }

    #[test]
    fn roles_get_their_own_theme() {
        let conversation = sample_conversation();
        let html = render_messages(&conversation);
        assert!(html.contains("#e26161"));
        assert!(html.contains("#3b3b3b"));
        assert!(html.contains("float:right"));
    }

    #[test]
    fn messages_appear_in_insertion_order() {
        let conversation = sample_conversation();
        let html = render_messages(&conversation);
        let user_at = html.find("hello").unwrap();
        let assistant_at = html.find("hi back").unwrap();
        assert!(user_at < assistant_at);
    }

    #[test]
    fn rendering_is_idempotent() {
        let conversation = sample_conversation();
        assert_eq!(render_messages(&conversation), render_messages(&conversation));
        assert_eq!(
            render_page(&conversation, None, 100),
            render_page(&conversation, None, 100)
        );
    }

    #[test]
    fn content_is_html_escaped() {
        let mut conversation = Conversation::new("s");
        conversation.messages.push(
            ChatMessage::new(Role::Assistant, "<script>alert('x')</script>")
        );
        let html = render_messages(&conversation);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn page_carries_form_and_optional_error_banner() {
        let conversation = Conversation::new("s");
        let plain = render_page(&conversation, None, 100);
        assert!(plain.contains("<form method='post' action='/chat'>"));
        assert!(plain.contains("maxlength='100'"));
        assert!(!plain.contains("#8b1e1e"));

        let with_error = render_page(&conversation, Some("Please enter a message."), 100);
        assert!(with_error.contains("Please enter a message."));
        assert!(with_error.contains("#8b1e1e"));
    }
}
