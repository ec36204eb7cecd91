//! Built-in schema for prose documents.

use crate::error::DocumentResult;
use crate::schema::{NodeKind, NodeType, PropertySpec, Schema, Weight};

pub const SCHEMA_NAME: &str = "prose";

pub const CONTAINER: &str = "container";
pub const PARAGRAPH: &str = "paragraph";
pub const HEADING: &str = "heading";
pub const PREFORMAT: &str = "preformat";
pub const LIST: &str = "list";
pub const LIST_ITEM: &str = "list-item";
pub const IMAGE: &str = "image";
pub const FIGURE: &str = "figure";
pub const STRONG: &str = "strong";
pub const EMPHASIS: &str = "emphasis";
pub const CODE: &str = "code";
pub const LINK: &str = "link";
pub const MENTION: &str = "mention";
pub const COMMENT: &str = "comment";

pub fn schema() -> DocumentResult<Schema> {
    Schema::builder(SCHEMA_NAME)
        .node(NodeType::container(CONTAINER))
        .node(NodeType::text(PARAGRAPH))
        .node(NodeType::text(HEADING).property(PropertySpec::value("level").with_default(1)))
        .node(NodeType::text(PREFORMAT))
        .node(NodeType::list(LIST, LIST_ITEM))
        .node(NodeType::list_item(LIST_ITEM))
        .node(NodeType::new(IMAGE, NodeKind::Block).property(PropertySpec::value("src").with_default("")))
        .node(
            NodeType::new(FIGURE, NodeKind::Block)
                .property(PropertySpec::value("src").with_default(""))
                .property(PropertySpec::child("caption", &[PARAGRAPH]).optional()),
        )
        .node(NodeType::property_annotation(STRONG).auto_expand_right(true))
        .node(NodeType::property_annotation(EMPHASIS).auto_expand_right(true))
        .node(NodeType::property_annotation(CODE))
        .node(
            NodeType::property_annotation(LINK)
                .property(PropertySpec::value("url").with_default(""))
                .weight(Weight::ShouldNotSplit),
        )
        .node(NodeType::inline_node(MENTION).property(PropertySpec::value("target").with_default("")))
        .node(NodeType::container_annotation(COMMENT).property(PropertySpec::value("text").with_default("")))
        .default_text_type(PARAGRAPH)
        .build()
}
