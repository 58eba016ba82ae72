use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    pub name: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    pub location: String,
    pub email: String,
    pub phone: String,
    pub website: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub id: String,
    pub company: String,
    pub position: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub id: String,
    pub school: String,
    pub degree: String,
    pub start_date: String,
    pub end_date: String,
}

/// Structured resume content edited by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeData {
    pub personal_info: PersonalInfo,
    pub summary: String,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hobbies: Option<Vec<String>>,
}

impl Default for ResumeData {
    fn default() -> Self {
        Self {
            personal_info: PersonalInfo {
                name: "Your Name".to_string(),
                role: "YOUR ROLE".to_string(),
                profile_image: Some(String::new()),
                location: "Location".to_string(),
                email: "Enter your email".to_string(),
                phone: "Enter your phone".to_string(),
                website: "Enter URL".to_string(),
                linkedin: Some("LinkedIn URL".to_string()),
            },
            summary: "Enter your professional summary".to_string(),
            experience: vec![Experience {
                id: "1".to_string(),
                company: "Company".to_string(),
                position: "Position".to_string(),
                start_date: "Start".to_string(),
                end_date: "End".to_string(),
                description: "Enter your work experience description".to_string(),
            }],
            education: vec![Education {
                id: "1".to_string(),
                school: "School".to_string(),
                degree: "DEGREE".to_string(),
                start_date: "From".to_string(),
                end_date: "Until".to_string(),
            }],
            skills: vec!["Enter skill".to_string()],
            languages: Some(vec!["Language".to_string()]),
            hobbies: Some(vec!["Hobby".to_string()]),
        }
    }
}

/// Visual styling applied to the rendered resume. Values are CSS strings.
///
/// Missing fields fall back to the default theme, so a partially stored
/// theme is merged over the defaults on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThemeType {
    pub primary_color: String,
    pub secondary_color: String,
    pub text_color: String,
    pub background_color: String,
    pub heading_font: String,
    pub body_font: String,
}

impl Default for ThemeType {
    fn default() -> Self {
        Self {
            primary_color: "#1E88E5".to_string(),
            secondary_color: "#ffffff".to_string(),
            text_color: "#333333".to_string(),
            background_color: "#f5f5f5".to_string(),
            heading_font: "\"Roboto\", sans-serif".to_string(),
            body_font: "\"Open Sans\", sans-serif".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutType {
    #[default]
    Modern,
    Classic,
}

impl LayoutType {
    /// Parses a stored layout name. Unknown names yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "modern" => Some(LayoutType::Modern),
            "classic" => Some(LayoutType::Classic),
            _ => None,
        }
    }

    /// Lenient read of an optional stored layout; anything unrecognised is `Modern`.
    pub fn from_stored(value: Option<&str>) -> Self {
        value.and_then(Self::parse).unwrap_or_default()
    }
}

/// Per-section render toggles. Presentation only; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionVisibility {
    pub picture: bool,
    pub location: bool,
    pub phone: bool,
    pub email: bool,
    pub website: bool,
    pub role: bool,
    pub about: bool,
    pub work: bool,
    pub education: bool,
    pub skills: bool,
    pub languages: bool,
    pub hobbies: bool,
    pub linkedin: bool,
    pub custom1: bool,
    pub custom2: bool,
}

impl Default for SectionVisibility {
    fn default() -> Self {
        Self {
            picture: true,
            location: true,
            phone: true,
            email: true,
            website: true,
            role: true,
            about: true,
            work: true,
            education: true,
            skills: true,
            languages: true,
            hobbies: true,
            linkedin: true,
            custom1: false,
            custom2: false,
        }
    }
}

/// The unit persisted both to the local cache and to the remote record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedContent {
    pub resume_data: ResumeData,
    pub theme: ThemeType,
    pub layout_type: LayoutType,
}

/// Lenient view of a stored content object: every part is optional and the
/// layout is read as a raw string so unknown values do not reject the blob.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentEnvelope {
    pub resume_data: Option<ResumeData>,
    pub theme: Option<ThemeType>,
    pub layout_type: Option<String>,
}

/// Remote content as found in the store, classified once at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredContent {
    /// `{resumeData, theme[, layoutType]}`
    Current(PersistedContent),
    /// Bare resume data written before the theme wrapper existed.
    Legacy(ResumeData),
}

impl StoredContent {
    /// Classifies a raw content object. An object carrying both `resumeData`
    /// and `theme` keys is current; anything else is read as legacy resume data.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        let is_current = value
            .as_object()
            .is_some_and(|obj| obj.contains_key("resumeData") && obj.contains_key("theme"));

        if is_current {
            let envelope: ContentEnvelope = serde_json::from_value(value.clone())?;
            Ok(StoredContent::Current(PersistedContent {
                resume_data: envelope.resume_data.unwrap_or_default(),
                theme: envelope.theme.unwrap_or_default(),
                layout_type: LayoutType::from_stored(envelope.layout_type.as_deref()),
            }))
        } else {
            Ok(StoredContent::Legacy(serde_json::from_value(value.clone())?))
        }
    }

    /// Migrates to the current shape. Legacy data gets the default theme and layout.
    pub fn into_current(self) -> PersistedContent {
        match self {
            StoredContent::Current(content) => content,
            StoredContent::Legacy(resume_data) => PersistedContent {
                resume_data,
                theme: ThemeType::default(),
                layout_type: LayoutType::default(),
            },
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, StoredContent::Legacy(_))
    }
}

/// Row of the remote `resumes` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeRecord {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub content: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for the `resumes` upsert.
#[derive(Debug, Clone, Serialize)]
pub struct ResumeInsert<'a> {
    pub user_id: &'a str,
    pub title: &'a str,
    pub content: &'a PersistedContent,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row of the remote `resume_templates` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeTemplate {
    pub id: Uuid,
    pub name: String,
    pub structure: Value,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_premium: bool,
    pub created_at: DateTime<Utc>,
}
