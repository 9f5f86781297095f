#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::AttemptId;
use super::ExecutionResult;
use super::Fragment;
use super::Role;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    Image { image: String },
    Code { text: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentPart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<Fragment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ExecutionResult>,
    /// Attempt that produced this message. Only set on assistant messages.
    #[serde(skip)]
    pub attempt: Option<AttemptId>,
    /// Set while the message is the target of an in-flight stream.
    #[serde(skip)]
    pub streaming: bool,
}

impl Message {
    pub fn user(text: &str, attachments: Vec<ContentPart>) -> Message {
        let mut content = vec![];
        if !text.is_empty() {
            content.push(ContentPart::Text {
                text: text.replace('\t', "  "),
            });
        }
        content.extend(attachments);

        return Message {
            role: Role::User,
            content,
            object: None,
            result: None,
            attempt: None,
            streaming: false,
        };
    }

    pub fn assistant(fragment: Fragment, attempt: AttemptId) -> Message {
        return Message {
            role: Role::Assistant,
            content: render_content(&fragment),
            object: Some(fragment),
            result: None,
            attempt: Some(attempt),
            streaming: false,
        };
    }

    /// Swaps the attached fragment for `fragment`, re-rendering content from
    /// scratch. Fields missing from `fragment` are gone afterwards.
    pub fn replace_object(&mut self, fragment: Fragment) {
        self.content = render_content(&fragment);
        self.object = Some(fragment);
    }

    pub fn is_assistant(&self) -> bool {
        return self.role == Role::Assistant;
    }

    pub fn text(&self) -> String {
        return self
            .content
            .iter()
            .filter_map(|part| {
                if let ContentPart::Text { text } = part {
                    return Some(text.as_str());
                }
                return None;
            })
            .collect::<Vec<&str>>()
            .join("\n");
    }
}

fn render_content(fragment: &Fragment) -> Vec<ContentPart> {
    let mut content = vec![];
    if let Some(commentary) = fragment.commentary() {
        content.push(ContentPart::Text {
            text: commentary.to_string(),
        });
    }

    if let Some(code) = fragment.as_code().and_then(|code| return code.code.as_ref()) {
        content.push(ContentPart::Code { text: code.clone() });
    }

    return content;
}
