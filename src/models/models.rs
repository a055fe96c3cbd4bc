use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_verified: bool,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl Account {
    pub fn profile(&self) -> Profile {
        Profile {
            id: self.id.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            avatar_url: self.avatar_url.clone(),
            bio: self.bio.clone(),
            is_admin: self.is_admin,
            is_verified: self.is_verified,
        }
    }
}

/// Public projection of an [`Account`].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub is_admin: bool,
    pub is_verified: bool,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Raw,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Raw => "raw",
        }
    }
}

/// A shayari.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Post {
    pub id: String,
    pub user_id: String,
    pub author_name: String,
    pub content: String,
    pub media_url: Option<String>,
    pub media_type: Option<MediaKind>,
    pub created_at: String,
}

/// A post as listed to readers, joined with its author and like count.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub like_count: u64,
    pub author_is_admin: bool,
    pub author_avatar_url: Option<String>,
}

impl PostView {
    /// View of a post that arrived without joins (e.g. from the change feed).
    pub fn bare(post: Post) -> Self {
        Self {
            post,
            like_count: 0,
            author_is_admin: false,
            author_avatar_url: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.post.id
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct PostDraft {
    pub content: String,
    pub author_name: Option<String>,
    pub media_url: Option<String>,
    pub media_type: Option<MediaKind>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// Which requests an admin listing shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(VerificationStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: VerificationStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "all" => Ok(StatusFilter::All),
            "pending" => Ok(StatusFilter::Only(VerificationStatus::Pending)),
            "approved" => Ok(StatusFilter::Only(VerificationStatus::Approved)),
            "rejected" => Ok(StatusFilter::Only(VerificationStatus::Rejected)),
            other => Err(format!("unknown status filter: {other}")),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VerificationRequest {
    pub id: String,
    pub user_id: String,
    pub full_name: String,
    pub phone: String,
    pub id_image_url: Option<String>,
    pub status: VerificationStatus,
    pub created_at: String,
    pub reviewed_at: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct VerificationSubmission {
    pub full_name: String,
    pub phone: String,
    pub id_image_url: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TokenData {
    pub user_id: String,
    pub created_at: String,
}

/// Issued on signup and login.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Session {
    pub token: String,
    pub user_id: String,
}

/// Everything the client needs to know about the signed-in account.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SessionState {
    pub profile: Profile,
    pub likes: Vec<String>,
    pub favorites: Vec<String>,
    pub following: Vec<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub avatar_seed: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MediaObject {
    pub public_id: String,
    pub filename: String,
    pub content_type: String,
    pub kind: MediaKind,
    pub size: usize,
    pub created_at: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UploadedMedia {
    pub url: String,
    pub kind: MediaKind,
    pub public_id: String,
}

/// A post insert as seen on the change feed.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ChangeEvent {
    pub seq: u64,
    pub post: Post,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AdminStats {
    pub total_users: usize,
    pub total_posts: usize,
    pub pending_reviews: usize,
}
