// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure embed construction and size enforcement for the Notification
//! Aggregator (spec §4.7): "implementation MUST enforce the length caps...
//! and reject oversize embeds at build time."

use recon_adapters::{EmbedField, EmbedPayload};
use thiserror::Error;

const TITLE_MAX: usize = 256;
const DESCRIPTION_MAX: usize = 4096;
const FIELD_NAME_MAX: usize = 256;
const FIELD_VALUE_MAX: usize = 1024;
const FOOTER_MAX: usize = 2048;
const MAX_FIELDS: usize = 25;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EmbedError {
    #[error("title exceeds {TITLE_MAX} characters")]
    TitleTooLong,
    #[error("description exceeds {DESCRIPTION_MAX} characters")]
    DescriptionTooLong,
    #[error("field name exceeds {FIELD_NAME_MAX} characters")]
    FieldNameTooLong,
    #[error("field value exceeds {FIELD_VALUE_MAX} characters")]
    FieldValueTooLong,
    #[error("footer exceeds {FOOTER_MAX} characters")]
    FooterTooLong,
    #[error("embed cannot have more than {MAX_FIELDS} fields")]
    TooManyFields,
}

#[derive(Debug, Clone)]
pub struct EmbedBuilder {
    title: String,
    description: String,
    color: u32,
    timestamp: String,
    fields: Vec<EmbedField>,
    footer: Option<String>,
}

impl EmbedBuilder {
    pub fn new(title: impl Into<String>, color: u32, timestamp: impl Into<String>) -> Self {
        Self { title: title.into(), description: String::new(), color, timestamp: timestamp.into(), fields: Vec::new(), footer: None }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn add_field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField { name: name.into(), value: value.into(), inline });
        self
    }

    pub fn build(self) -> Result<EmbedPayload, EmbedError> {
        if self.title.chars().count() > TITLE_MAX {
            return Err(EmbedError::TitleTooLong);
        }
        if self.description.chars().count() > DESCRIPTION_MAX {
            return Err(EmbedError::DescriptionTooLong);
        }
        if let Some(footer) = &self.footer {
            if footer.chars().count() > FOOTER_MAX {
                return Err(EmbedError::FooterTooLong);
            }
        }
        if self.fields.len() > MAX_FIELDS {
            return Err(EmbedError::TooManyFields);
        }
        for field in &self.fields {
            if field.name.chars().count() > FIELD_NAME_MAX {
                return Err(EmbedError::FieldNameTooLong);
            }
            if field.value.chars().count() > FIELD_VALUE_MAX {
                return Err(EmbedError::FieldValueTooLong);
            }
        }

        Ok(EmbedPayload {
            title: self.title,
            description: self.description,
            color: self.color,
            timestamp: self.timestamp,
            fields: self.fields,
            footer: self.footer,
        })
    }
}

/// Truncate `samples` to at most `limit` entries, appending a count of the
/// remainder (spec: "up to 5 sampled targets"/"up to 5 sample URLs").
pub fn sample_with_overflow_note(samples: &[String], limit: usize) -> String {
    if samples.is_empty() {
        return "(none)".to_string();
    }
    let shown: Vec<&str> = samples.iter().take(limit).map(String::as_str).collect();
    let mut out = shown.join(", ");
    if samples.len() > limit {
        out.push_str(&format!(" (+{} more)", samples.len() - limit));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversize_title_is_rejected() {
        let builder = EmbedBuilder::new("x".repeat(TITLE_MAX + 1), 0, "t");
        assert_eq!(builder.build().unwrap_err(), EmbedError::TitleTooLong);
    }

    #[test]
    fn too_many_fields_is_rejected() {
        let mut builder = EmbedBuilder::new("title", 0, "t");
        for i in 0..=MAX_FIELDS {
            builder = builder.add_field(format!("f{i}"), "v", false);
        }
        assert_eq!(builder.build().unwrap_err(), EmbedError::TooManyFields);
    }

    #[test]
    fn within_caps_builds_successfully() {
        let embed = EmbedBuilder::new("title", 0x00ff00, "2024-01-01T00:00:00Z")
            .description("desc")
            .add_field("probed", "5", true)
            .footer("recon")
            .build()
            .unwrap();
        assert_eq!(embed.fields.len(), 1);
    }

    #[test]
    fn sample_overflow_note_reports_remainder() {
        let urls: Vec<String> = (0..8).map(|i| format!("https://a.test/{i}")).collect();
        let note = sample_with_overflow_note(&urls, 5);
        assert!(note.contains("+3 more"));
    }

    #[test]
    fn empty_samples_render_as_none() {
        assert_eq!(sample_with_overflow_note(&[], 5), "(none)");
    }
}
