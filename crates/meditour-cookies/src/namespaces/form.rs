//! Contact form drafts
//!
//! An unsent contact form is autosaved so a visitor who navigates away can
//! pick up where they left off.

use serde::{Deserialize, Serialize};

use super::{encode_or_log, read_json};
use crate::manager::CookieManager;
use crate::options::CookieOptions;

pub const CONTACT_FORM_COOKIE: &str = "contact-form-draft";
const PURPOSE: &str = "Keeps an unsent contact form so you do not lose your message";
const LIFETIME_DAYS: i64 = 7;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactFormDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Treatment the visitor is enquiring about
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub struct FormCookies {
    manager: CookieManager,
}

impl FormCookies {
    pub fn new(manager: CookieManager) -> Self {
        Self { manager }
    }

    pub fn save_contact_form(&self, draft: &ContactFormDraft) -> bool {
        let Some(json) = encode_or_log(CONTACT_FORM_COOKIE, draft) else {
            return false;
        };

        self.manager.set_functional(
            CONTACT_FORM_COOKIE,
            &json,
            PURPOSE,
            &CookieOptions::days(LIFETIME_DAYS),
        )
    }

    pub fn get_contact_form(&self) -> Option<ContactFormDraft> {
        read_json(&self.manager, CONTACT_FORM_COOKIE)
    }

    /// Drop the draft, typically after a successful submission
    pub fn clear_contact_form(&self) -> bool {
        self.manager
            .remove(CONTACT_FORM_COOKIE, &CookieOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::test_support;

    fn draft() -> ContactFormDraft {
        ContactFormDraft {
            first_name: Some("Anna".to_string()),
            email: Some("anna@example.com".to_string()),
            treatment: Some("Knee replacement".to_string()),
            message: Some("Prices; availability & \"aftercare\"?".to_string()),
            ..ContactFormDraft::default()
        }
    }

    #[test]
    fn test_draft_roundtrip() {
        let manager = test_support::manager();
        manager.consent().accept_all();
        let forms = FormCookies::new(manager);

        assert!(forms.save_contact_form(&draft()));
        assert_eq!(forms.get_contact_form(), Some(draft()));

        assert!(forms.clear_contact_form());
        assert_eq!(forms.get_contact_form(), None);
    }

    #[test]
    fn test_draft_json_omits_empty_fields() {
        let json = serde_json::to_string(&ContactFormDraft {
            first_name: Some("A".to_string()),
            ..ContactFormDraft::default()
        })
        .unwrap();
        assert_eq!(json, r#"{"firstName":"A"}"#);
    }

    #[test]
    fn test_corrupt_draft_reads_as_absent() {
        let manager = test_support::manager();
        manager.consent().accept_all();
        manager.set(CONTACT_FORM_COOKIE, "{broken", &CookieOptions::default());

        assert_eq!(FormCookies::new(manager).get_contact_form(), None);
    }

    #[test]
    fn test_draft_refused_without_consent() {
        let forms = FormCookies::new(test_support::manager());
        assert!(!forms.save_contact_form(&draft()));
        assert_eq!(forms.get_contact_form(), None);
    }
}
