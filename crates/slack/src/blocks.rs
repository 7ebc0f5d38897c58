use std::collections::BTreeMap;

use polyglot_core::{ModalView, TargetLanguage};
use serde::Serialize;

pub const TEXT_BLOCK_ID: &str = "text";
pub const LANGUAGE_BLOCK_ID: &str = "lang";
pub const INPUT_ACTION_ID: &str = "a";

const MODAL_TITLE: &str = "DeepL Translation";
/// Slack rejects section text longer than this.
const SECTION_TEXT_LIMIT: usize = 3000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum TextObject {
    #[serde(rename = "plain_text")]
    Plain { text: String },
    #[serde(rename = "mrkdwn")]
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub text: TextObject,
    pub value: String,
}

impl From<TargetLanguage> for SelectOption {
    fn from(language: TargetLanguage) -> Self {
        Self { text: TextObject::plain(language.label()), value: language.code().to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputElement {
    PlainTextInput {
        action_id: String,
        multiline: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        initial_value: Option<String>,
    },
    StaticSelect {
        action_id: String,
        placeholder: TextObject,
        options: Vec<SelectOption>,
        #[serde(skip_serializing_if = "Option::is_none")]
        initial_option: Option<SelectOption>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section { block_id: String, text: TextObject },
    Context { block_id: String, elements: Vec<TextObject> },
    Input { block_id: String, label: TextObject, element: InputElement },
    Divider { block_id: String },
}

/// A Block Kit modal, as accepted by `views.open`, `views.update` and
/// `response_action: update`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct View {
    #[serde(rename = "type")]
    pub view_type: &'static str,
    pub callback_id: String,
    pub title: TextObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit: Option<TextObject>,
    pub close: TextObject,
    pub private_metadata: String,
    pub blocks: Vec<Block>,
}

/// Payload sent back with a `view_submission` acknowledgment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "response_action", rename_all = "snake_case")]
pub enum AckPayload {
    Update { view: View },
    Errors { errors: BTreeMap<String, String> },
}

impl AckPayload {
    pub fn field_error(block_id: &str, message: impl Into<String>) -> Self {
        Self::Errors { errors: BTreeMap::from([(block_id.to_owned(), message.into())]) }
    }
}

pub struct ViewBuilder {
    callback_id: String,
    submit: Option<TextObject>,
    close: TextObject,
    private_metadata: String,
    blocks: Vec<Block>,
}

impl ViewBuilder {
    pub fn new(callback_id: impl Into<String>) -> Self {
        Self {
            callback_id: callback_id.into(),
            submit: None,
            close: TextObject::plain("Close"),
            private_metadata: String::new(),
            blocks: Vec::new(),
        }
    }

    pub fn submit(mut self, label: impl Into<String>) -> Self {
        self.submit = Some(TextObject::plain(label));
        self
    }

    pub fn private_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.private_metadata = metadata.into();
        self
    }

    pub fn section(mut self, block_id: impl Into<String>, text: TextObject) -> Self {
        self.blocks.push(Block::Section { block_id: block_id.into(), text });
        self
    }

    pub fn context(mut self, block_id: impl Into<String>, elements: Vec<TextObject>) -> Self {
        self.blocks.push(Block::Context { block_id: block_id.into(), elements });
        self
    }

    pub fn divider(mut self, block_id: impl Into<String>) -> Self {
        self.blocks.push(Block::Divider { block_id: block_id.into() });
        self
    }

    pub fn input(
        mut self,
        block_id: impl Into<String>,
        label: impl Into<String>,
        element: InputElement,
    ) -> Self {
        self.blocks.push(Block::Input {
            block_id: block_id.into(),
            label: TextObject::plain(label),
            element,
        });
        self
    }

    pub fn build(self) -> View {
        View {
            view_type: "modal",
            callback_id: self.callback_id,
            title: TextObject::plain(MODAL_TITLE),
            submit: self.submit,
            close: self.close,
            private_metadata: self.private_metadata,
            blocks: self.blocks,
        }
    }
}

pub fn render_view(view: &ModalView) -> View {
    match view {
        ModalView::Input { private_metadata } | ModalView::NewRunner { private_metadata } => {
            input_view(view.callback_id(), private_metadata)
        }
        ModalView::Loading { language, source_text } => {
            ViewBuilder::new(view.callback_id())
                .section(
                    "translation.loading.status.v1",
                    TextObject::mrkdwn(format!(
                        ":hourglass_flowing_sand: Translating into *{}*...",
                        language.label()
                    )),
                )
                .context(
                    "translation.loading.source.v1",
                    vec![TextObject::plain(truncate_for_block(source_text))],
                )
                .build()
        }
        ModalView::Result { language, source_text, translated_text } => {
            ViewBuilder::new(view.callback_id())
                .submit("Translate another")
                .section(
                    "translation.result.text.v1",
                    TextObject::plain(truncate_for_block(translated_text)),
                )
                .context(
                    "translation.result.language.v1",
                    vec![TextObject::mrkdwn(format!(
                        "Translated into *{}* (`{}`)",
                        language.label(),
                        language.code()
                    ))],
                )
                .divider("translation.result.divider.v1")
                .section(
                    "translation.result.source.v1",
                    TextObject::plain(truncate_for_block(source_text)),
                )
                .build()
        }
    }
}

fn input_view(callback_id: &str, private_metadata: &str) -> View {
    ViewBuilder::new(callback_id)
        .submit("Translate")
        .private_metadata(private_metadata)
        .input(
            TEXT_BLOCK_ID,
            "Text",
            InputElement::PlainTextInput {
                action_id: INPUT_ACTION_ID.to_owned(),
                multiline: true,
                initial_value: None,
            },
        )
        .input(
            LANGUAGE_BLOCK_ID,
            "Target language",
            InputElement::StaticSelect {
                action_id: INPUT_ACTION_ID.to_owned(),
                placeholder: TextObject::plain("Choose a language"),
                options: TargetLanguage::ALL.into_iter().map(SelectOption::from).collect(),
                initial_option: None,
            },
        )
        .build()
}

fn truncate_for_block(text: &str) -> String {
    if text.chars().count() <= SECTION_TEXT_LIMIT {
        return text.to_owned();
    }
    let mut truncated: String = text.chars().take(SECTION_TEXT_LIMIT - 1).collect();
    truncated.push('…');
    truncated
}

#[cfg(test)]
mod tests {
    use polyglot_core::modal::{NEW_RUNNER_CALLBACK_ID, RUN_TRANSLATION_CALLBACK_ID};
    use polyglot_core::{ModalView, TargetLanguage};
    use serde_json::json;

    use super::{
        render_view, truncate_for_block, AckPayload, Block, InputElement, LANGUAGE_BLOCK_ID,
        SECTION_TEXT_LIMIT,
    };

    #[test]
    fn input_view_has_text_and_language_inputs() {
        let view = render_view(&ModalView::initial());

        assert_eq!(view.callback_id, RUN_TRANSLATION_CALLBACK_ID);
        assert!(view.submit.is_some());
        assert_eq!(view.blocks.len(), 2);
        let Block::Input { element: InputElement::StaticSelect { options, .. }, block_id, .. } =
            &view.blocks[1]
        else {
            panic!("expected language selector");
        };
        assert_eq!(block_id, LANGUAGE_BLOCK_ID);
        assert_eq!(options.len(), TargetLanguage::ALL.len());
    }

    #[test]
    fn new_runner_keeps_private_metadata() {
        let view =
            render_view(&ModalView::NewRunner { private_metadata: "C1:1700000000.1".to_owned() });

        assert_eq!(view.callback_id, RUN_TRANSLATION_CALLBACK_ID);
        assert_eq!(view.private_metadata, "C1:1700000000.1");
    }

    #[test]
    fn loading_view_cannot_be_submitted() {
        let view = render_view(&ModalView::Loading {
            language: TargetLanguage::Spanish,
            source_text: "Hello".to_owned(),
        });

        assert!(view.submit.is_none());
        let rendered = serde_json::to_value(&view).expect("serialize");
        let heading = rendered["blocks"][0]["text"]["text"].as_str().unwrap_or_default();
        assert!(heading.contains("Spanish"));
        assert_eq!(rendered["blocks"][1]["elements"][0]["text"], "Hello");
    }

    #[test]
    fn result_view_serializes_to_block_kit() {
        let view = render_view(&ModalView::Result {
            language: TargetLanguage::Spanish,
            source_text: "Hello".to_owned(),
            translated_text: "Hola".to_owned(),
        });
        let rendered = serde_json::to_value(&view).expect("serialize");

        assert_eq!(rendered["type"], "modal");
        assert_eq!(rendered["callback_id"], NEW_RUNNER_CALLBACK_ID);
        assert_eq!(rendered["title"], json!({"type": "plain_text", "text": "DeepL Translation"}));
        assert_eq!(rendered["blocks"][0]["type"], "section");
        assert_eq!(rendered["blocks"][0]["text"]["text"], "Hola");
        assert_eq!(rendered["blocks"][2]["type"], "divider");
    }

    #[test]
    fn ack_payload_uses_response_action_tag() {
        let update = AckPayload::Update { view: render_view(&ModalView::initial()) };
        let rendered = serde_json::to_value(&update).expect("serialize");
        assert_eq!(rendered["response_action"], "update");
        assert_eq!(rendered["view"]["callback_id"], RUN_TRANSLATION_CALLBACK_ID);

        let errors = AckPayload::field_error(LANGUAGE_BLOCK_ID, "Choose a language");
        assert_eq!(
            serde_json::to_value(&errors).expect("serialize"),
            json!({"response_action": "errors", "errors": {"lang": "Choose a language"}})
        );
    }

    #[test]
    fn long_text_is_truncated_on_a_char_boundary() {
        let long = "é".repeat(SECTION_TEXT_LIMIT + 10);
        let truncated = truncate_for_block(&long);

        assert_eq!(truncated.chars().count(), SECTION_TEXT_LIMIT);
        assert!(truncated.ends_with('…'));
        assert_eq!(truncate_for_block("short"), "short");
    }
}
