//! Contact form models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use real_taste_core::{ContactMessageId, ContactStatus, Email};

use super::{ValidationError, check_max_len};

/// A stored contact form submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: ContactMessageId,
    pub name: String,
    pub email: Email,
    pub subject: String,
    pub message: String,
    pub status: ContactStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `POST /api/contact` payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// A validated contact form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContactMessage {
    pub name: String,
    pub email: Email,
    pub subject: String,
    pub message: String,
}

impl ContactForm {
    /// # Errors
    ///
    /// Returns `ValidationError` if a field is blank, too long, or the email
    /// is invalid.
    pub fn validate(self) -> Result<NewContactMessage, ValidationError> {
        let name = self.name.trim();
        let subject = self.subject.trim();
        let message = self.message.trim();
        if name.is_empty() || self.email.trim().is_empty() || subject.is_empty() || message.is_empty()
        {
            return Err(ValidationError::new("All fields are required"));
        }
        check_max_len(name, "Name", 50)?;
        check_max_len(subject, "Subject", 100)?;
        check_max_len(message, "Message", 1000)?;
        let email = Email::normalized(&self.email)
            .map_err(|_| ValidationError::new("Please enter a valid email"))?;
        Ok(NewContactMessage {
            name: name.to_owned(),
            email,
            subject: subject.to_owned(),
            message: message.to_owned(),
        })
    }
}

/// `PUT /api/contact/{id}/status` payload.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ContactStatusUpdate {
    pub status: ContactStatus,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> ContactForm {
        ContactForm {
            name: "Asha".to_string(),
            email: " Asha@Example.com".to_string(),
            subject: "Catering".to_string(),
            message: "Do you cater for 30 people?".to_string(),
        }
    }

    #[test]
    fn test_valid_form_normalizes_email() {
        let message = form().validate().unwrap();
        assert_eq!(message.email.as_str(), "asha@example.com");
    }

    #[test]
    fn test_missing_field() {
        let mut incomplete = form();
        incomplete.subject = "  ".to_string();
        assert_eq!(
            incomplete.validate().unwrap_err(),
            ValidationError::new("All fields are required")
        );
    }

    #[test]
    fn test_message_too_long() {
        let mut long = form();
        long.message = "x".repeat(1001);
        assert!(long.validate().is_err());
    }
}
