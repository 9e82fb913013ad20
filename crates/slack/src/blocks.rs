use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    PlainText { text: String },
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::PlainText { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::PlainText { text } | Self::Mrkdwn { text } => text,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Danger,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ButtonElement {
    pub action_id: String,
    pub text: TextObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ButtonStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ButtonElement {
    pub fn new(action_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            text: TextObject::plain(label),
            style: None,
            value: None,
        }
    }

    pub fn style(mut self, style: ButtonStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OptionObject {
    pub text: TextObject,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StaticSelectElement {
    pub action_id: String,
    pub placeholder: TextObject,
    pub options: Vec<OptionObject>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    Button(ButtonElement),
    StaticSelect(StaticSelectElement),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header {
        text: TextObject,
    },
    Section {
        #[serde(skip_serializing_if = "Option::is_none")]
        block_id: Option<String>,
        text: TextObject,
    },
    Divider,
    Image {
        image_url: String,
        alt_text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<TextObject>,
    },
    Actions {
        block_id: String,
        elements: Vec<Element>,
    },
    Context {
        elements: Vec<TextObject>,
    },
    Input {
        block_id: String,
        label: TextObject,
        element: Element,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Home,
    Modal,
}

/// A home tab or modal surface, serialized as the `view` argument of `views.*` calls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct View {
    #[serde(rename = "type")]
    pub kind: ViewKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<TextObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit: Option<TextObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close: Option<TextObject>,
    pub blocks: Vec<Block>,
}

impl View {
    pub fn home(blocks: Vec<Block>) -> Self {
        Self {
            kind: ViewKind::Home,
            callback_id: None,
            title: None,
            submit: None,
            close: None,
            blocks,
        }
    }

    pub fn modal(
        callback_id: impl Into<String>,
        title: impl Into<String>,
        submit: impl Into<String>,
        close: impl Into<String>,
        blocks: Vec<Block>,
    ) -> Self {
        Self {
            kind: ViewKind::Modal,
            callback_id: Some(callback_id.into()),
            title: Some(TextObject::plain(title)),
            submit: Some(TextObject::plain(submit)),
            close: Some(TextObject::plain(close)),
            blocks,
        }
    }
}

#[derive(Default)]
pub struct BlocksBuilder {
    blocks: Vec<Block>,
}

impl BlocksBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Header { text: TextObject::plain(text) });
        self
    }

    pub fn section<F>(mut self, build: F) -> Self
    where
        F: FnOnce(&mut SectionBuilder),
    {
        let mut builder = SectionBuilder::default();
        build(&mut builder);
        self.blocks.push(builder.build());
        self
    }

    pub fn divider(mut self) -> Self {
        self.blocks.push(Block::Divider);
        self
    }

    pub fn image(
        mut self,
        image_url: impl Into<String>,
        alt_text: impl Into<String>,
        title: Option<&str>,
    ) -> Self {
        self.blocks.push(Block::Image {
            image_url: image_url.into(),
            alt_text: alt_text.into(),
            title: title.map(TextObject::plain),
        });
        self
    }

    pub fn actions<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ActionsBuilder),
    {
        let mut builder = ActionsBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Actions { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn context<F>(mut self, build: F) -> Self
    where
        F: FnOnce(&mut ContextBuilder),
    {
        let mut builder = ContextBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Context { elements: builder.build() });
        self
    }

    pub fn input(
        mut self,
        block_id: impl Into<String>,
        label: impl Into<String>,
        element: Element,
    ) -> Self {
        self.blocks.push(Block::Input {
            block_id: block_id.into(),
            label: TextObject::plain(label),
            element,
        });
        self
    }

    pub fn build(self) -> Vec<Block> {
        self.blocks
    }
}

#[derive(Default)]
pub struct SectionBuilder {
    block_id: Option<String>,
    text: Option<TextObject>,
}

impl SectionBuilder {
    pub fn block_id(&mut self, block_id: impl Into<String>) -> &mut Self {
        self.block_id = Some(block_id.into());
        self
    }

    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> Block {
        Block::Section {
            block_id: self.block_id,
            text: self.text.unwrap_or_else(|| TextObject::plain(" ")),
        }
    }
}

#[derive(Default)]
pub struct ActionsBuilder {
    elements: Vec<Element>,
}

impl ActionsBuilder {
    pub fn button(&mut self, button: ButtonElement) -> &mut Self {
        self.elements.push(Element::Button(button));
        self
    }

    fn build(self) -> Vec<Element> {
        self.elements
    }
}

#[derive(Default)]
pub struct ContextBuilder {
    elements: Vec<TextObject>,
}

impl ContextBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> Vec<TextObject> {
        self.elements
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Block, BlocksBuilder, ButtonElement, ButtonStyle, View};

    #[test]
    fn builder_preserves_block_order() {
        let blocks = BlocksBuilder::new()
            .header("Hello")
            .section(|section| {
                section.mrkdwn("*bold*");
            })
            .divider()
            .context(|context| {
                context.plain("footnote");
            })
            .build();

        assert_eq!(blocks.len(), 4);
        assert!(matches!(blocks[0], Block::Header { .. }));
        assert!(matches!(blocks[2], Block::Divider));
    }

    #[test]
    fn blocks_serialize_to_block_kit_shape() {
        let blocks = BlocksBuilder::new()
            .section(|section| {
                section.block_id("intro").plain("hi");
            })
            .actions("buttons", |actions| {
                actions.button(ButtonElement::new("go", "Go").style(ButtonStyle::Primary));
            })
            .image("https://img.example/a.png", "chart", None)
            .build();

        let value = serde_json::to_value(&blocks).expect("serialize");

        assert_eq!(
            value,
            json!([
                {
                    "type": "section",
                    "block_id": "intro",
                    "text": { "type": "plain_text", "text": "hi" },
                },
                {
                    "type": "actions",
                    "block_id": "buttons",
                    "elements": [{
                        "type": "button",
                        "action_id": "go",
                        "text": { "type": "plain_text", "text": "Go" },
                        "style": "primary",
                    }],
                },
                { "type": "image", "image_url": "https://img.example/a.png", "alt_text": "chart" },
            ])
        );
    }

    #[test]
    fn home_view_omits_modal_fields() {
        let value = serde_json::to_value(View::home(Vec::new())).expect("serialize");

        assert_eq!(value, json!({ "type": "home", "blocks": [] }));
    }

    #[test]
    fn modal_view_carries_callback_and_buttons() {
        let value =
            serde_json::to_value(View::modal("cb", "Title", "Submit", "Close", Vec::new()))
                .expect("serialize");

        assert_eq!(value["type"], "modal");
        assert_eq!(value["callback_id"], "cb");
        assert_eq!(value["submit"]["text"], "Submit");
        assert_eq!(value["close"]["type"], "plain_text");
    }
}
