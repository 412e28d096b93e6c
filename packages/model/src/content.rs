//! # Typed Block Content
//!
//! One content struct per [`BlockType`]. Every struct keeps the keys it does
//! not model in a flattened `extra` map so persisted payloads survive a
//! load/save cycle untouched.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::block::BlockType;
use crate::error::{ModelError, ModelResult};

macro_rules! block_content {
    ($($variant:ident($content:ident)),+ $(,)?) => {
        /// Block payload, tagged by block type
        #[derive(Debug, Clone, PartialEq)]
        pub enum BlockContent {
            $($variant($content),)+
        }

        impl BlockContent {
            pub fn block_type(&self) -> BlockType {
                match self {
                    $(BlockContent::$variant(_) => BlockType::$variant,)+
                }
            }

            /// Decode a persisted content object for the given block type.
            ///
            /// Fields whose JSON type does not fit the typed struct are kept
            /// verbatim in `extra`; only a non-object payload is an error.
            pub fn from_json(block_type: BlockType, value: Value) -> ModelResult<Self> {
                match value {
                    Value::Null => Ok(Self::decode(block_type, Map::new())),
                    Value::Object(fields) => Ok(Self::decode(block_type, fields)),
                    other => Err(ModelError::ContentNotObject(other.to_string())),
                }
            }

            fn decode(block_type: BlockType, fields: Map<String, Value>) -> Self {
                match block_type {
                    $(BlockType::$variant => BlockContent::$variant(decode_lenient(block_type, fields)),)+
                }
            }

            /// Encode into the persisted content object
            pub fn to_json(&self) -> Value {
                let encoded = match self {
                    $(BlockContent::$variant(content) => serde_json::to_value(content),)+
                };
                encoded.unwrap_or_else(|_| Value::Object(Map::new()))
            }
        }

        $(
            impl ExtraFields for $content {
                fn extra_mut(&mut self) -> &mut Map<String, Value> {
                    &mut self.extra
                }
            }

            impl From<$content> for BlockContent {
                fn from(content: $content) -> Self {
                    BlockContent::$variant(content)
                }
            }
        )+
    };
}

block_content! {
    Text(TextContent),
    Image(ImageContent),
    Button(ButtonContent),
    Form(FormContent),
    Video(VideoContent),
    Code(CodeContent),
    Map(MapContent),
    Testimonial(TestimonialContent),
    Calendar(CalendarContent),
    Ecommerce(EcommerceContent),
    Team(TeamContent),
    Chart(ChartContent),
    Audio(AudioContent),
    Countdown(CountdownContent),
    Social(SocialContent),
    Spacer(SpacerContent),
    Container(ContainerContent),
    Grid(GridContent),
    Tabs(TabsContent),
    Accordion(AccordionContent),
}

impl BlockContent {
    /// Content a freshly instantiated library block starts with
    pub fn default_for(block_type: BlockType) -> Self {
        match block_type {
            BlockType::Text => TextContent {
                text: "Enter your text here".to_string(),
                ..Default::default()
            }
            .into(),
            BlockType::Image => ImageContent {
                alt: "Image".to_string(),
                ..Default::default()
            }
            .into(),
            BlockType::Button => ButtonContent {
                text: "Click me".to_string(),
                url: "#".to_string(),
                ..Default::default()
            }
            .into(),
            BlockType::Form => FormContent {
                fields: vec![FormField {
                    name: "email".to_string(),
                    label: "Email".to_string(),
                    field_type: "email".to_string(),
                    required: true,
                }],
                ..Default::default()
            }
            .into(),
            BlockType::Video => VideoContent::default().into(),
            BlockType::Code => CodeContent {
                language: Some("html".to_string()),
                ..Default::default()
            }
            .into(),
            BlockType::Map => MapContent {
                zoom: Some(14),
                ..Default::default()
            }
            .into(),
            BlockType::Testimonial => TestimonialContent {
                quote: "This product changed my life!".to_string(),
                author: "Happy Customer".to_string(),
                ..Default::default()
            }
            .into(),
            BlockType::Calendar => CalendarContent {
                title: "Book a call".to_string(),
                ..Default::default()
            }
            .into(),
            BlockType::Ecommerce => EcommerceContent {
                product_name: "Product".to_string(),
                currency: Some("USD".to_string()),
                ..Default::default()
            }
            .into(),
            BlockType::Team => TeamContent {
                title: "Our Team".to_string(),
                ..Default::default()
            }
            .into(),
            BlockType::Chart => ChartContent::default().into(),
            BlockType::Audio => AudioContent::default().into(),
            BlockType::Countdown => CountdownContent {
                label: Some("Offer ends in".to_string()),
                ..Default::default()
            }
            .into(),
            BlockType::Social => SocialContent::default().into(),
            BlockType::Spacer => SpacerContent::default().into(),
            BlockType::Container => ContainerContent::default().into(),
            BlockType::Grid => GridContent::default().into(),
            BlockType::Tabs => TabsContent {
                labels: vec!["Tab 1".to_string(), "Tab 2".to_string()],
                ..Default::default()
            }
            .into(),
            BlockType::Accordion => AccordionContent {
                titles: vec!["Section 1".to_string()],
                ..Default::default()
            }
            .into(),
        }
    }

    /// Shallow-merge JSON fields into this content, keeping the block type
    pub fn merged(&self, fields: &Map<String, Value>) -> Self {
        let mut map = match self.to_json() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, field) in fields {
            map.insert(key.clone(), field.clone());
        }
        BlockContent::decode(self.block_type(), map)
    }
}

/// Content structs carry a flattened map of the keys they do not model
trait ExtraFields: DeserializeOwned + Default {
    fn extra_mut(&mut self) -> &mut Map<String, Value>;
}

fn decode_lenient<T: ExtraFields>(block_type: BlockType, fields: Map<String, Value>) -> T {
    if let Ok(content) = serde_json::from_value::<T>(Value::Object(fields.clone())) {
        return content;
    }

    // Admit fields one at a time; the ones the struct refuses stay raw
    let mut typed = Map::new();
    let mut raw = Map::new();
    for (key, value) in fields {
        let mut candidate = typed.clone();
        candidate.insert(key.clone(), value.clone());
        if serde_json::from_value::<T>(Value::Object(candidate)).is_ok() {
            typed.insert(key, value);
        } else {
            raw.insert(key, value);
        }
    }

    warn!(
        block_type = %block_type,
        fields = ?raw.keys().collect::<Vec<_>>(),
        "Content fields do not fit their typed shape, kept as-is"
    );

    let mut content = serde_json::from_value::<T>(Value::Object(typed)).unwrap_or_default();
    content.extra_mut().extend(raw);
    content
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextContent {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageContent {
    pub src: String,
    pub alt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ButtonContent {
    pub text: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormField {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub required: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormContent {
    pub fields: Vec<FormField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VideoContent {
    pub url: String,
    pub autoplay: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CodeContent {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapContent {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TestimonialContent {
    pub quote: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CalendarContent {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EcommerceContent {
    pub product_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TeamMember {
    pub name: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TeamContent {
    pub title: String,
    pub members: Vec<TeamMember>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChartContent {
    pub chart_type: String,
    pub data: Vec<ChartPoint>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ChartContent {
    fn default() -> Self {
        Self {
            chart_type: "bar".to_string(),
            data: Vec::new(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AudioContent {
    pub src: String,
    pub title: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CountdownContent {
    pub target_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SocialLink {
    pub platform: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SocialContent {
    pub links: Vec<SocialLink>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpacerContent {
    pub height: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for SpacerContent {
    fn default() -> Self {
        Self {
            height: "40px".to_string(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContainerContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_width: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridContent {
    pub columns: u32,
    pub gap: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for GridContent {
    fn default() -> Self {
        Self {
            columns: 2,
            gap: "16px".to_string(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TabsContent {
    pub labels: Vec<String>,
    pub active: usize,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccordionContent {
    pub titles: Vec<String>,
    pub allow_multiple: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
