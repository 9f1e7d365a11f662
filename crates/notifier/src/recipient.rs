//! Recipient references and resolution.
//!
//! A message status record stores which entity it was sent to. The tagged
//! variant keeps member/contact dispatch explicit instead of threading a
//! kind string through the pipeline.

use database::{contact, member, models::Contact, models::Member, DatabaseError, SqlitePool};

use crate::error::NotifierError;

/// Column value for member recipients.
pub const KIND_MEMBER: &str = "member";

/// Column value for contact recipients.
pub const KIND_CONTACT: &str = "contact";

/// Reference to a notification recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipientRef {
    /// A church member, by id.
    Member(String),
    /// A visitor contact, by id.
    Contact(String),
}

impl RecipientRef {
    /// Rebuild a reference from the stored kind tag, if recognized.
    pub fn from_kind(kind: &str, id: &str) -> Option<Self> {
        match kind {
            KIND_MEMBER => Some(RecipientRef::Member(id.to_string())),
            KIND_CONTACT => Some(RecipientRef::Contact(id.to_string())),
            _ => None,
        }
    }

    /// The kind tag stored on message status records.
    pub fn kind(&self) -> &'static str {
        match self {
            RecipientRef::Member(_) => KIND_MEMBER,
            RecipientRef::Contact(_) => KIND_CONTACT,
        }
    }

    /// The referenced entity id.
    pub fn id(&self) -> &str {
        match self {
            RecipientRef::Member(id) | RecipientRef::Contact(id) => id,
        }
    }

    /// Look the recipient up in the directory.
    pub async fn resolve(&self, pool: &SqlitePool) -> Result<Recipient, NotifierError> {
        match self {
            RecipientRef::Member(id) => match member::get_member(pool, id).await {
                Ok(m) => Ok(Recipient::from(&m)),
                Err(DatabaseError::NotFound { .. }) => Err(NotifierError::RecipientNotFound {
                    kind: KIND_MEMBER,
                    id: id.clone(),
                }),
                Err(e) => Err(e.into()),
            },
            RecipientRef::Contact(id) => match contact::get_contact(pool, id).await {
                Ok(c) => Ok(Recipient::from(&c)),
                Err(DatabaseError::NotFound { .. }) => Err(NotifierError::RecipientNotFound {
                    kind: KIND_CONTACT,
                    id: id.clone(),
                }),
                Err(e) => Err(e.into()),
            },
        }
    }
}

/// A resolved recipient, ready to be messaged.
#[derive(Debug, Clone)]
pub struct Recipient {
    /// Display name, used in message templates and audit entries.
    pub name: String,
    /// Phone number as stored in the directory (pre-normalization).
    pub phone: String,
    /// Which entity this is.
    pub reference: RecipientRef,
}

impl From<&Member> for Recipient {
    fn from(member: &Member) -> Self {
        Self {
            name: member.name.clone(),
            phone: member.phone.clone(),
            reference: RecipientRef::Member(member.id.clone()),
        }
    }
}

impl From<&Contact> for Recipient {
    fn from(contact: &Contact) -> Self {
        Self {
            name: contact.name.clone(),
            phone: contact.phone.clone(),
            reference: RecipientRef::Contact(contact.id.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips() {
        let member = RecipientRef::Member("m-1".to_string());
        assert_eq!(
            RecipientRef::from_kind(member.kind(), member.id()),
            Some(member)
        );

        let contact = RecipientRef::Contact("c-1".to_string());
        assert_eq!(
            RecipientRef::from_kind(contact.kind(), contact.id()),
            Some(contact)
        );

        assert_eq!(RecipientRef::from_kind("group", "g-1"), None);
    }
}
