use serde::{Deserialize, Serialize};
use std::fmt;

use super::{new_record_id, ContentSnapshot, Record};
use crate::collection::CollectionKind;

/// Contact details for one physical branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactEntry {
    pub id: String,
    pub branch_name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl ContactEntry {
    pub fn new(branch_name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            id: new_record_id(),
            branch_name: branch_name.into(),
            phone: phone.into(),
            email: None,
            whatsapp_number: None,
            address: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_whatsapp(mut self, number: impl Into<String>) -> Self {
        self.whatsapp_number = Some(number.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

impl Record for ContactEntry {
    const KIND: CollectionKind = CollectionKind::Contact;

    fn id(&self) -> &str {
        &self.id
    }

    fn records(snapshot: &ContentSnapshot) -> &[Self] {
        &snapshot.contact
    }

    fn replace_all(snapshot: &mut ContentSnapshot, records: Vec<Self>) {
        snapshot.contact = records;
    }
}

impl fmt::Display for ContactEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.branch_name)?;
        write!(f, "  Phone:    {}", self.phone)?;
        if let Some(email) = &self.email {
            write!(f, "\n  Email:    {}", email)?;
        }
        if let Some(number) = &self.whatsapp_number {
            write!(f, "\n  WhatsApp: {}", number)?;
        }
        if let Some(address) = &self.address {
            write!(f, "\n  Address:  {}", address)?;
        }
        Ok(())
    }
}
