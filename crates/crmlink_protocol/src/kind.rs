//! Entity kind routing.

use std::fmt;

/// The record types synced with the remote CRM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    /// A person record (partner/contact).
    Contact,
    /// A deal/opportunity record.
    Opportunity,
    /// A task record.
    Task,
    /// A note/comment record.
    Note,
}

impl EntityKind {
    /// All kinds, in the order the poll cycle visits them.
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Contact,
        EntityKind::Opportunity,
        EntityKind::Task,
        EntityKind::Note,
    ];

    /// Collection endpoint path for list and create calls.
    pub fn collection_path(&self) -> &'static str {
        match self {
            EntityKind::Contact => "/contacts/",
            EntityKind::Opportunity => "/opportunities/",
            EntityKind::Task => "/tasks/",
            EntityKind::Note => "/notes/",
        }
    }

    /// Item endpoint path for update calls addressed by remote id.
    pub fn item_path(&self, remote_id: &str) -> String {
        match self {
            EntityKind::Contact => format!("/contacts/{remote_id}"),
            EntityKind::Opportunity => format!("/opportunities/{remote_id}"),
            EntityKind::Task => format!("/tasks/{remote_id}"),
            EntityKind::Note => format!("/notes/{remote_id}"),
        }
    }

    /// Key under which list responses carry the item array.
    pub fn page_key(&self) -> &'static str {
        match self {
            EntityKind::Contact => "contacts",
            EntityKind::Opportunity => "opportunities",
            EntityKind::Task => "tasks",
            EntityKind::Note => "notes",
        }
    }

    /// Key under which create/update responses may wrap the object.
    pub fn envelope_key(&self) -> &'static str {
        match self {
            EntityKind::Contact => "contact",
            EntityKind::Opportunity => "opportunity",
            EntityKind::Task => "task",
            EntityKind::Note => "note",
        }
    }

    /// Stable lowercase name, used in logs and queue items.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Contact => "contact",
            EntityKind::Opportunity => "opportunity",
            EntityKind::Task => "task",
            EntityKind::Note => "note",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths() {
        assert_eq!(EntityKind::Contact.collection_path(), "/contacts/");
        assert_eq!(
            EntityKind::Opportunity.item_path("abc123"),
            "/opportunities/abc123"
        );
    }

    #[test]
    fn page_and_envelope_keys() {
        let expected = [
            (EntityKind::Contact, "contacts", "contact"),
            (EntityKind::Opportunity, "opportunities", "opportunity"),
            (EntityKind::Task, "tasks", "task"),
            (EntityKind::Note, "notes", "note"),
        ];
        for (kind, page, envelope) in expected {
            assert_eq!(kind.page_key(), page);
            assert_eq!(kind.envelope_key(), envelope);
        }
    }
}
