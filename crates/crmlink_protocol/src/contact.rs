//! Contact payload.

use serde::{Deserialize, Serialize};

/// A contact as the remote API represents it.
///
/// All fields are optional; serialization omits absent fields so a
/// push payload never clears remote fields the local record does not
/// carry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteContact {
    /// Remote record id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Tenant scope the record belongs to.
    #[serde(rename = "locationId", default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
    /// Given name; the push path writes the whole local name here.
    #[serde(rename = "firstName", default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Full display name, present on some pull payloads.
    #[serde(rename = "contactName", default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    /// Lowercased full name, another pull-side variant.
    #[serde(
        rename = "fullNameLowerCase",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub full_name_lower: Option<String>,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Street address line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address1: Option<String>,
    /// City.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// State or region name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Postal code.
    #[serde(rename = "postalCode", default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    /// Two-letter country code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Remote user id the contact is assigned to.
    #[serde(rename = "assignedTo", default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    /// Remote record type; pushes always mark contacts as `customer`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub contact_type: Option<String>,
    /// Update timestamp variant used by the contact endpoint.
    #[serde(rename = "dateUpdated", default, skip_serializing_if = "Option::is_none")]
    pub date_updated: Option<String>,
    /// Update timestamp variant used elsewhere.
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl RemoteContact {
    /// Best-effort display name, following the pull fallback chain.
    pub fn display_name(&self) -> Option<&str> {
        self.contact_name
            .as_deref()
            .or(self.first_name.as_deref())
            .or(self.full_name_lower.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_camel_case_and_omits_none() {
        let contact = RemoteContact {
            first_name: Some("Jane Doe".into()),
            postal_code: Some("90210".into()),
            contact_type: Some("customer".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(&contact).unwrap();
        assert_eq!(value["firstName"], "Jane Doe");
        assert_eq!(value["postalCode"], "90210");
        assert_eq!(value["type"], "customer");
        assert!(value.get("email").is_none());
        assert!(value.get("id").is_none());
    }

    #[test]
    fn display_name_fallback_chain() {
        let mut contact = RemoteContact {
            full_name_lower: Some("jane doe".into()),
            ..Default::default()
        };
        assert_eq!(contact.display_name(), Some("jane doe"));

        contact.first_name = Some("Jane".into());
        assert_eq!(contact.display_name(), Some("Jane"));

        contact.contact_name = Some("Jane Doe".into());
        assert_eq!(contact.display_name(), Some("Jane Doe"));
    }

    #[test]
    fn deserializes_pull_payload() {
        let contact: RemoteContact = serde_json::from_value(json!({
            "id": "abc123",
            "contactName": "Jane Doe",
            "email": "jane@example.com",
            "dateUpdated": "2024-01-01T00:00:00Z",
            "customField": {"ignored": true},
        }))
        .unwrap();
        assert_eq!(contact.id.as_deref(), Some("abc123"));
        assert_eq!(
            contact.date_updated.as_deref(),
            Some("2024-01-01T00:00:00Z")
        );
    }
}
