//! Deep-link targets
//!
//! Decoding raw link formats happens elsewhere; the core only pattern-matches
//! on the decoded target to pick a destination and a sub-navigation.

use serde::{Deserialize, Serialize};

use crate::domain::{NotificationId, PostId, ReaderSection, SiteId};

/// A "jump to X" request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum DeepLinkTarget {
    /// A post, opened in the Reader.
    Post { site: SiteId, post: PostId },
    /// A tag stream in the Reader.
    Tag { slug: String },
    /// Reader search, optionally with a query.
    Search { query: Option<String> },
    /// A specific site.
    Site { site: SiteId },
    /// A specific notification.
    Notification { note: NotificationId },
}

/// Top-level destination a deep link resolves into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    Reader,
    Site,
    Notifications,
}

impl DeepLinkTarget {
    /// Destination that hosts this target.
    pub fn destination(&self) -> Destination {
        match self {
            Self::Post { .. } | Self::Tag { .. } | Self::Search { .. } => Destination::Reader,
            Self::Site { .. } => Destination::Site,
            Self::Notification { .. } => Destination::Notifications,
        }
    }

    /// Reader section the target lands in, if it is a Reader target.
    pub fn reader_section(&self) -> Option<ReaderSection> {
        match self {
            Self::Post { .. } => Some(ReaderSection::Subscriptions),
            Self::Tag { slug } => Some(ReaderSection::Tag(slug.clone())),
            Self::Search { .. } => Some(ReaderSection::Search),
            Self::Site { .. } | Self::Notification { .. } => None,
        }
    }
}

impl std::fmt::Display for DeepLinkTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Post { site, post } => write!(f, "post {}/{}", site, post),
            Self::Tag { slug } => write!(f, "tag {}", slug),
            Self::Search { query: Some(q) } => write!(f, "search '{}'", q),
            Self::Search { query: None } => write!(f, "search"),
            Self::Site { site } => write!(f, "{}", site),
            Self::Notification { note } => write!(f, "{}", note),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destinations() {
        let post = DeepLinkTarget::Post {
            site: SiteId(1),
            post: PostId(2),
        };
        assert_eq!(post.destination(), Destination::Reader);
        assert_eq!(post.reader_section(), Some(ReaderSection::Subscriptions));

        let tag = DeepLinkTarget::Tag {
            slug: "swift".into(),
        };
        assert_eq!(tag.reader_section(), Some(ReaderSection::Tag("swift".into())));

        let note = DeepLinkTarget::Notification {
            note: NotificationId(3),
        };
        assert_eq!(note.destination(), Destination::Notifications);
        assert_eq!(note.reader_section(), None);
    }

    #[test]
    fn test_json_shape() {
        let target: DeepLinkTarget =
            serde_json::from_str(r#"{"target":"search","query":"rust"}"#).unwrap();
        assert_eq!(
            target,
            DeepLinkTarget::Search {
                query: Some("rust".into())
            }
        );
    }
}
