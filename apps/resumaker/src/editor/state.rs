//! In-memory edit state and the inline-editing mutations applied to it.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::resume::{
    ContentEnvelope, Education, Experience, LayoutType, PersistedContent, ResumeData,
    SectionVisibility, ThemeType,
};
use crate::models::user::UserIdentity;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("No entry with id '{0}'")]
    UnknownEntry(String),

    #[error("Index {0} is out of range")]
    IndexOutOfRange(usize),

    #[error("Unknown section '{0}'")]
    UnknownSection(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfoPatch {
    pub name: Option<String>,
    pub role: Option<String>,
    pub profile_image: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub linkedin: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperiencePatch {
    pub company: Option<String>,
    pub position: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationPatch {
    pub school: Option<String>,
    pub degree: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemePatch {
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub text_color: Option<String>,
    pub background_color: Option<String>,
    pub heading_font: Option<String>,
    pub body_font: Option<String>,
}

fn set_if(target: &mut String, value: Option<String>) {
    if let Some(v) = value {
        *target = v;
    }
}

/// Millisecond-timestamp id, bumped past any id already used in `existing`.
fn next_entry_id<'a>(existing: impl Iterator<Item = &'a str>) -> String {
    let taken: Vec<&str> = existing.collect();
    let mut candidate = Utc::now().timestamp_millis();
    while taken.contains(&candidate.to_string().as_str()) {
        candidate += 1;
    }
    candidate.to_string()
}

/// The document being edited: persisted content plus presentation-only flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditState {
    pub resume_data: ResumeData,
    pub theme: ThemeType,
    pub layout_type: LayoutType,
    pub section_visibility: SectionVisibility,
}

impl EditState {
    pub fn new(content: PersistedContent) -> Self {
        Self {
            resume_data: content.resume_data,
            theme: content.theme,
            layout_type: content.layout_type,
            section_visibility: SectionVisibility::default(),
        }
    }

    /// Seeds the state from the local cache if present, otherwise from the
    /// defaults with the identity's name and email filled in.
    pub fn hydrate(cached: Option<ContentEnvelope>, identity: Option<&UserIdentity>) -> Self {
        let cached = cached.unwrap_or_default();

        let resume_data = cached.resume_data.unwrap_or_else(|| {
            let mut data = ResumeData::default();
            if let Some(user) = identity {
                if let Some(name) = user.full_name() {
                    data.personal_info.name = name;
                }
                if let Some(email) = user.email.clone().filter(|e| !e.is_empty()) {
                    data.personal_info.email = email;
                }
            }
            data
        });

        Self::new(PersistedContent {
            resume_data,
            theme: cached.theme.unwrap_or_default(),
            layout_type: LayoutType::from_stored(cached.layout_type.as_deref()),
        })
    }

    pub fn content(&self) -> PersistedContent {
        PersistedContent {
            resume_data: self.resume_data.clone(),
            theme: self.theme.clone(),
            layout_type: self.layout_type,
        }
    }

    /// Replaces the persisted parts wholesale; visibility flags are kept.
    pub fn adopt(&mut self, content: PersistedContent) {
        self.resume_data = content.resume_data;
        self.theme = content.theme;
        self.layout_type = content.layout_type;
    }

    pub fn replace_resume_data(&mut self, resume_data: ResumeData) {
        self.resume_data = resume_data;
    }

    pub fn apply_personal(&mut self, patch: PersonalInfoPatch) {
        let info = &mut self.resume_data.personal_info;
        set_if(&mut info.name, patch.name);
        set_if(&mut info.role, patch.role);
        set_if(&mut info.location, patch.location);
        set_if(&mut info.email, patch.email);
        set_if(&mut info.phone, patch.phone);
        set_if(&mut info.website, patch.website);
        if patch.profile_image.is_some() {
            info.profile_image = patch.profile_image;
        }
        if patch.linkedin.is_some() {
            info.linkedin = patch.linkedin;
        }
    }

    pub fn set_summary(&mut self, summary: String) {
        self.resume_data.summary = summary;
    }

    /// Appends a new experience entry and returns its id.
    pub fn add_experience(&mut self, patch: ExperiencePatch) -> String {
        let id = next_entry_id(self.resume_data.experience.iter().map(|e| e.id.as_str()));
        let mut entry = Experience {
            id: id.clone(),
            company: String::new(),
            position: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            description: String::new(),
        };
        apply_experience_patch(&mut entry, patch);
        self.resume_data.experience.push(entry);
        id
    }

    pub fn update_experience(&mut self, id: &str, patch: ExperiencePatch) -> Result<(), EditError> {
        let entry = self
            .resume_data
            .experience
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| EditError::UnknownEntry(id.to_string()))?;
        apply_experience_patch(entry, patch);
        Ok(())
    }

    pub fn remove_experience(&mut self, id: &str) -> Result<(), EditError> {
        let before = self.resume_data.experience.len();
        self.resume_data.experience.retain(|e| e.id != id);
        if self.resume_data.experience.len() == before {
            return Err(EditError::UnknownEntry(id.to_string()));
        }
        Ok(())
    }

    /// Appends a new education entry and returns its id.
    pub fn add_education(&mut self, patch: EducationPatch) -> String {
        let id = next_entry_id(self.resume_data.education.iter().map(|e| e.id.as_str()));
        let mut entry = Education {
            id: id.clone(),
            school: String::new(),
            degree: String::new(),
            start_date: String::new(),
            end_date: String::new(),
        };
        apply_education_patch(&mut entry, patch);
        self.resume_data.education.push(entry);
        id
    }

    pub fn update_education(&mut self, id: &str, patch: EducationPatch) -> Result<(), EditError> {
        let entry = self
            .resume_data
            .education
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| EditError::UnknownEntry(id.to_string()))?;
        apply_education_patch(entry, patch);
        Ok(())
    }

    pub fn remove_education(&mut self, id: &str) -> Result<(), EditError> {
        let before = self.resume_data.education.len();
        self.resume_data.education.retain(|e| e.id != id);
        if self.resume_data.education.len() == before {
            return Err(EditError::UnknownEntry(id.to_string()));
        }
        Ok(())
    }

    pub fn set_skills(&mut self, skills: Vec<String>) {
        self.resume_data.skills = skills;
    }

    pub fn set_skill(&mut self, index: usize, value: String) -> Result<(), EditError> {
        let slot = self
            .resume_data
            .skills
            .get_mut(index)
            .ok_or(EditError::IndexOutOfRange(index))?;
        *slot = value;
        Ok(())
    }

    /// Appends an empty skill for inline editing.
    pub fn add_skill(&mut self) {
        self.resume_data.skills.push(String::new());
    }

    pub fn remove_skill(&mut self, index: usize) -> Result<(), EditError> {
        if index >= self.resume_data.skills.len() {
            return Err(EditError::IndexOutOfRange(index));
        }
        self.resume_data.skills.remove(index);
        Ok(())
    }

    pub fn set_languages(&mut self, languages: Vec<String>) {
        self.resume_data.languages = Some(languages);
    }

    pub fn set_hobbies(&mut self, hobbies: Vec<String>) {
        self.resume_data.hobbies = Some(hobbies);
    }

    pub fn apply_theme(&mut self, patch: ThemePatch) {
        set_if(&mut self.theme.primary_color, patch.primary_color);
        set_if(&mut self.theme.secondary_color, patch.secondary_color);
        set_if(&mut self.theme.text_color, patch.text_color);
        set_if(&mut self.theme.background_color, patch.background_color);
        set_if(&mut self.theme.heading_font, patch.heading_font);
        set_if(&mut self.theme.body_font, patch.body_font);
    }

    pub fn set_layout(&mut self, layout: LayoutType) {
        self.layout_type = layout;
    }

    /// Sets visibility flags by section name. Validates every name before
    /// applying any, so an unknown name leaves the flags untouched.
    pub fn apply_visibility(&mut self, flags: &HashMap<String, bool>) -> Result<(), EditError> {
        let mut next = self.section_visibility.clone();
        for (name, &visible) in flags {
            let slot = match name.as_str() {
                "picture" => &mut next.picture,
                "location" => &mut next.location,
                "phone" => &mut next.phone,
                "email" => &mut next.email,
                "website" => &mut next.website,
                "role" => &mut next.role,
                "about" => &mut next.about,
                "work" => &mut next.work,
                "education" => &mut next.education,
                "skills" => &mut next.skills,
                "languages" => &mut next.languages,
                "hobbies" => &mut next.hobbies,
                "linkedin" => &mut next.linkedin,
                "custom1" => &mut next.custom1,
                "custom2" => &mut next.custom2,
                _ => return Err(EditError::UnknownSection(name.clone())),
            };
            *slot = visible;
        }
        self.section_visibility = next;
        Ok(())
    }
}

fn apply_experience_patch(entry: &mut Experience, patch: ExperiencePatch) {
    set_if(&mut entry.company, patch.company);
    set_if(&mut entry.position, patch.position);
    set_if(&mut entry.start_date, patch.start_date);
    set_if(&mut entry.end_date, patch.end_date);
    set_if(&mut entry.description, patch.description);
}

fn apply_education_patch(entry: &mut Education, patch: EducationPatch) {
    set_if(&mut entry.school, patch.school);
    set_if(&mut entry.degree, patch.degree);
    set_if(&mut entry.start_date, patch.start_date);
    set_if(&mut entry.end_date, patch.end_date);
}
