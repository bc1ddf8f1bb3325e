/// Shared data structures for the gallery state
///
/// These structs represent the data model that flows between
/// the storage layer, the collection store and the front end.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Identifier of an artwork (creation time in milliseconds, bumped to stay unique)
pub type ArtworkId = i64;

/// Generation tools the gallery offers out of the box.
/// Any other tool name is accepted as a custom category.
pub const KNOWN_TOOLS: [&str; 2] = ["Midjourney", "Nanobanana"];

/// Name of the "show everything" filter
pub const ALL_FILTER: &str = "All";

/// A single artwork in the collection
///
/// Serialized with camelCase keys, which is the persisted record layout.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Artwork {
    /// Unique id, fixed for the artwork's lifetime
    pub id: ArtworkId,
    /// Self-contained image reference (a `data:` URL)
    pub image_url: String,
    /// Generation tool, also the filter category
    pub tool: String,
    /// Free-text grouping label
    pub series: String,
    pub year: i32,
    /// 1-12, only checked by the front end
    pub month: u32,
    pub prompt: String,
}

/// Everything an artwork carries except its id.
///
/// Used both to create an artwork and to replace an existing artwork's fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtworkDraft {
    pub image_url: String,
    pub tool: String,
    pub series: String,
    pub year: i32,
    pub month: u32,
    pub prompt: String,
}

impl ArtworkDraft {
    /// Attach an id, producing a full artwork
    pub fn into_artwork(self, id: ArtworkId) -> Artwork {
        Artwork {
            id,
            image_url: self.image_url,
            tool: self.tool,
            series: self.series,
            year: self.year,
            month: self.month,
            prompt: self.prompt,
        }
    }

    /// Names of the fields a form must fill before the draft is submitted.
    ///
    /// Empty when the draft is complete. The store itself never calls this.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.image_url.trim().is_empty() {
            missing.push("image");
        }
        if self.tool.trim().is_empty() {
            missing.push("tool");
        } else if self.tool == ALL_FILTER {
            missing.push("tool (\"All\" is reserved)");
        }
        if self.series.trim().is_empty() {
            missing.push("series");
        }
        if self.prompt.trim().is_empty() {
            missing.push("prompt");
        }
        if !(1..=12).contains(&self.month) {
            missing.push("month (1-12)");
        }
        missing
    }
}

impl Artwork {
    /// Copy the descriptive fields out, e.g. to pre-fill an edit form
    pub fn draft(&self) -> ArtworkDraft {
        ArtworkDraft {
            image_url: self.image_url.clone(),
            tool: self.tool.clone(),
            series: self.series.clone(),
            year: self.year,
            month: self.month,
            prompt: self.prompt.clone(),
        }
    }

    /// Overwrite every descriptive field, keeping the id
    pub fn apply(&mut self, draft: ArtworkDraft) {
        let id = self.id;
        *self = draft.into_artwork(id);
    }
}

/// Active category filter
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Filter {
    /// Show the whole collection
    #[default]
    All,
    /// Show only artworks made with this tool
    Tool(String),
}

impl Filter {
    /// Filter for a category name; exactly "All" shows everything
    pub fn named(name: &str) -> Self {
        let name = name.trim();
        if name == ALL_FILTER {
            Filter::All
        } else {
            Filter::Tool(name.to_string())
        }
    }

    /// Whether an artwork passes this filter
    pub fn matches(&self, artwork: &Artwork) -> bool {
        match self {
            Filter::All => true,
            Filter::Tool(tool) => artwork.tool == *tool,
        }
    }

    /// The tool this filter narrows to, if any
    pub fn tool(&self) -> Option<&str> {
        match self {
            Filter::All => None,
            Filter::Tool(tool) => Some(tool.as_str()),
        }
    }
}

impl FromStr for Filter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Filter::named(s))
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => f.write_str(ALL_FILTER),
            Filter::Tool(tool) => f.write_str(tool),
        }
    }
}

/// Navigation direction through the visible list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}
