//! Data model for BookStack entities as returned by the REST API.
//!
//! Everything here is a read-only snapshot fetched during a single run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// List endpoint envelope: one page of rows plus the total row count.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub total: u64,
}

/// One row of the shelves list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelfSummary {
    pub id: u64,
    pub slug: String,
    pub name: String,
}

/// One row of the books list, also used for shelf members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSummary {
    pub id: u64,
    pub slug: String,
    pub name: String,
}

/// Shelf detail with its ordered member books.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shelf {
    pub id: u64,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub books: Vec<BookSummary>,
}

/// Book detail with its ordered contents tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: u64,
    pub slug: String,
    pub name: String,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub contents: Vec<ContentNode>,
}

/// A direct child of a book, discriminated by the `type` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentNode {
    Chapter(Chapter),
    Page(Page),
}

impl ContentNode {
    pub fn name(&self) -> &str {
        match self {
            ContentNode::Chapter(c) => &c.name,
            ContentNode::Page(p) => &p.name,
        }
    }

    /// The `type` tag as BookStack spells it.
    pub fn kind(&self) -> &'static str {
        match self {
            ContentNode::Chapter(_) => "chapter",
            ContentNode::Page(_) => "page",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub id: u64,
    pub name: String,
    pub updated_at: DateTime<Utc>,
    /// Pages nested under a chapter carry no `type` tag.
    #[serde(default)]
    pub pages: Vec<Page>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: u64,
    pub name: String,
    pub updated_at: DateTime<Utc>,
}

/// Remote instance metadata from `/api/system`.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemInfo {
    pub app_name: String,
    pub version: String,
}

/// Borrowed view over any node of the book tree, so traversals are written once.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Book(&'a Book),
    Chapter(&'a Chapter),
    Page(&'a Page),
}

impl<'a> Node<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Node::Book(b) => &b.name,
            Node::Chapter(c) => &c.name,
            Node::Page(p) => &p.name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Node::Book(_) => "book",
            Node::Chapter(_) => "chapter",
            Node::Page(_) => "page",
        }
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        match self {
            Node::Book(b) => b.updated_at,
            Node::Chapter(c) => c.updated_at,
            Node::Page(p) => p.updated_at,
        }
    }

    /// Direct children in remote order. Pages have none.
    pub fn children(&self) -> Vec<Node<'a>> {
        match self {
            Node::Book(b) => b.contents.iter().map(Node::from).collect(),
            Node::Chapter(c) => c.pages.iter().map(Node::Page).collect(),
            Node::Page(_) => Vec::new(),
        }
    }
}

impl<'a> From<&'a ContentNode> for Node<'a> {
    fn from(node: &'a ContentNode) -> Self {
        match node {
            ContentNode::Chapter(c) => Node::Chapter(c),
            ContentNode::Page(p) => Node::Page(p),
        }
    }
}
