//! # Rule Table
//!
//! Static map from container type to the block types it may directly hold,
//! plus cardinality limits. Keys are every container-capable block type and
//! the two structural pseudo-parents, `section` and `column`.

use std::fmt;
use std::str::FromStr;

use funnel_model::BlockType;
use thiserror::Error;

/// Anything that can hold blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParentKind {
    Section,
    Column,
    Block(BlockType),
}

impl fmt::Display for ParentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentKind::Section => f.write_str("section"),
            ParentKind::Column => f.write_str("column"),
            ParentKind::Block(block_type) => f.write_str(block_type.as_str()),
        }
    }
}

impl FromStr for ParentKind {
    type Err = Rejection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "section" => Ok(ParentKind::Section),
            "column" => Ok(ParentKind::Column),
            other => other
                .parse::<BlockType>()
                .map(ParentKind::Block)
                .map_err(|_| Rejection::UnknownParent {
                    parent: other.to_string(),
                }),
        }
    }
}

impl From<BlockType> for ParentKind {
    fn from(block_type: BlockType) -> Self {
        ParentKind::Block(block_type)
    }
}

/// Nesting rule for one parent type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRule {
    pub allowed_children: &'static [BlockType],
    pub min_children: Option<usize>,
    pub max_children: Option<usize>,
    pub description: &'static str,
}

/// Why an edit was refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("'{parent}' cannot contain other blocks")]
    UnknownParent { parent: String },

    #[error("{description}. '{child}' is not allowed inside '{parent}'")]
    NotAllowed {
        parent: String,
        child: BlockType,
        description: &'static str,
    },

    #[error("'{parent}' can have a maximum {max} children")]
    MaxChildren { parent: String, max: usize },

    #[error("Forms can only have one button")]
    DuplicateFormButton,

    #[error("'{parent}' needs at least {min} children")]
    TooFewChildren { parent: String, min: usize },
}

use BlockType::*;

static SECTION: ContainerRule = ContainerRule {
    allowed_children: &[],
    min_children: None,
    max_children: None,
    description: "Sections hold columns, not blocks",
};

static COLUMN: ContainerRule = ContainerRule {
    allowed_children: &BlockType::ALL,
    min_children: None,
    max_children: None,
    description: "Columns can hold any block",
};

static CONTAINER: ContainerRule = ContainerRule {
    allowed_children: &[
        Text, Image, Button, Form, Video, Code, Map, Audio, Countdown, Social, Spacer, Testimonial,
    ],
    min_children: None,
    max_children: Some(10),
    description: "Containers hold basic content blocks",
};

static GRID: ContainerRule = ContainerRule {
    allowed_children: &[
        Text, Image, Button, Video, Container, Spacer, Testimonial, Team, Ecommerce, Social,
    ],
    min_children: None,
    max_children: Some(12),
    description: "Grids arrange content and containers in cells",
};

static TABS: ContainerRule = ContainerRule {
    allowed_children: &[Text, Image, Button, Video, Code, Container, Form],
    min_children: Some(1),
    max_children: Some(8),
    description: "Tabs hold one content panel per tab",
};

static ACCORDION: ContainerRule = ContainerRule {
    allowed_children: &[Text, Image, Button, Video, Code, Container],
    min_children: Some(1),
    max_children: Some(20),
    description: "Accordions hold collapsible content panels",
};

static FORM: ContainerRule = ContainerRule {
    allowed_children: &[Button],
    min_children: None,
    max_children: Some(1),
    description: "Forms can only contain a submit button",
};

static TEAM: ContainerRule = ContainerRule {
    allowed_children: &[Text, Image, Social],
    min_children: None,
    max_children: Some(12),
    description: "Team blocks hold member bios, photos and social links",
};

static TESTIMONIAL: ContainerRule = ContainerRule {
    allowed_children: &[Text, Image],
    min_children: None,
    max_children: Some(3),
    description: "Testimonials hold a quote and an avatar",
};

static CALENDAR: ContainerRule = ContainerRule {
    allowed_children: &[Text, Button],
    min_children: None,
    max_children: Some(2),
    description: "Calendars hold a caption and a booking button",
};

static CHART: ContainerRule = ContainerRule {
    allowed_children: &[Text],
    min_children: None,
    max_children: Some(1),
    description: "Charts hold a single caption",
};

static ECOMMERCE: ContainerRule = ContainerRule {
    allowed_children: &[Text, Image, Button],
    min_children: None,
    max_children: Some(5),
    description: "Product blocks hold descriptions, photos and a buy button",
};

/// Look up the rule for a parent type. `None` means it cannot hold blocks.
pub fn get_rule(parent: ParentKind) -> Option<&'static ContainerRule> {
    match parent {
        ParentKind::Section => Some(&SECTION),
        ParentKind::Column => Some(&COLUMN),
        ParentKind::Block(block_type) => match block_type {
            Container => Some(&CONTAINER),
            Grid => Some(&GRID),
            Tabs => Some(&TABS),
            Accordion => Some(&ACCORDION),
            Form => Some(&FORM),
            Team => Some(&TEAM),
            Testimonial => Some(&TESTIMONIAL),
            Calendar => Some(&CALENDAR),
            Chart => Some(&CHART),
            Ecommerce => Some(&ECOMMERCE),
            Text | Image | Button | Video | Code | Map | Audio | Countdown | Social | Spacer => None,
        },
    }
}

/// Block types the parent may directly hold (empty if none)
pub fn get_allowed_children(parent: ParentKind) -> &'static [BlockType] {
    get_rule(parent).map(|rule| rule.allowed_children).unwrap_or(&[])
}

/// Check whether `child` may be added to a parent currently holding
/// `current_children`.
///
/// Checks run in order: the parent has a rule, the child type is on its
/// allow-list, the form one-button rule, then the generic maximum.
pub fn can_add_child(
    parent: ParentKind,
    child: BlockType,
    current_children: &[BlockType],
) -> Result<(), Rejection> {
    let rule = get_rule(parent).ok_or_else(|| Rejection::UnknownParent {
        parent: parent.to_string(),
    })?;

    if !rule.allowed_children.contains(&child) {
        return Err(Rejection::NotAllowed {
            parent: parent.to_string(),
            child,
            description: rule.description,
        });
    }

    // Kept for forms only: a second button is refused with its own message.
    if parent == ParentKind::Block(Form)
        && child == Button
        && current_children.contains(&Button)
    {
        return Err(Rejection::DuplicateFormButton);
    }

    if let Some(max) = rule.max_children {
        if current_children.len() >= max {
            return Err(Rejection::MaxChildren {
                parent: parent.to_string(),
                max,
            });
        }
    }

    Ok(())
}

/// [`can_add_child`] for a parent given by name; unknown names are refused
pub fn can_add_child_named(
    parent: &str,
    child: BlockType,
    current_children: &[BlockType],
) -> Result<(), Rejection> {
    can_add_child(parent.parse()?, child, current_children)
}

/// Advisory check of a parent's minimum child count. Never blocks an edit.
pub fn validate_min_children(
    parent: ParentKind,
    current_children: &[BlockType],
) -> Result<(), Rejection> {
    match get_rule(parent).and_then(|rule| rule.min_children) {
        Some(min) if current_children.len() < min => Err(Rejection::TooFewChildren {
            parent: parent.to_string(),
            min,
        }),
        _ => Ok(()),
    }
}
