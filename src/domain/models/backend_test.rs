use anyhow::Result;

use super::ChatRequest;
use super::GenerationConfig;
use super::GenerationSettings;
use super::ModelDescriptor;
use crate::domain::models::AttemptId;
use crate::domain::models::CodeFragment;
use crate::domain::models::ContentPart;
use crate::domain::models::Fragment;
use crate::domain::models::Message;
use crate::domain::models::Session;

fn settings() -> GenerationSettings {
    return GenerationSettings {
        template: "auto".to_string(),
        model: ModelDescriptor {
            id: "gpt-4o-mini".to_string(),
            provider: "OpenAI".to_string(),
            provider_id: "openai".to_string(),
            name: "gpt-4o-mini".to_string(),
        },
        config: GenerationConfig {
            model: "gpt-4o-mini".to_string(),
            api_key: Some("".to_string()),
            ..Default::default()
        },
    };
}

#[test]
fn it_flattens_code_parts_into_text() {
    let messages = vec![
        Message::user("Build a counter", vec![]),
        Message::assistant(
            Fragment::Code(CodeFragment {
                commentary: Some("Sure".to_string()),
                code: Some("let x = 1;".to_string()),
                ..Default::default()
            }),
            AttemptId(1),
        ),
    ];

    let req = ChatRequest::new(&messages, &Session::default(), &settings());

    assert_eq!(req.messages.len(), 2);
    assert_eq!(
        req.messages[1].content[1],
        ContentPart::Text {
            text: "let x = 1;".to_string()
        }
    );
}

#[test]
fn it_treats_empty_api_keys_as_absent() {
    let req = ChatRequest::new(&[], &Session::default(), &settings());
    assert_eq!(req.api_key(), None);
}

#[test]
fn it_serializes_identity_fields() -> Result<()> {
    let session = Session {
        user_id: Some("u-1".to_string()),
        team_id: Some("t-1".to_string()),
        access_token: None,
        auth_required: true,
    };
    let req = ChatRequest::new(&[Message::user("hi", vec![])], &session, &settings());
    let value = serde_json::to_value(&req)?;

    assert_eq!(value["userID"], "u-1");
    assert_eq!(value["teamID"], "t-1");
    assert_eq!(value["model"]["providerId"], "openai");
    assert_eq!(value["messages"][0]["role"], "user");
    assert_eq!(value["messages"][0]["content"][0]["type"], "text");

    return Ok(());
}
