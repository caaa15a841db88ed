//! In-memory gateway used by the store tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use super::{Gateway, GatewayError};
use crate::collection::CollectionKind;
use crate::mail::ContactMessage;
use crate::models::{ContentSnapshot, Record};
use crate::ordering::OrderPatch;

pub const USER: &str = "admin";
pub const PASS: &str = "secreto";
pub const TOKEN: &str = "tok-1";

#[derive(Default)]
pub struct FakeGateway {
    pub content: RefCell<ContentSnapshot>,
    pub failing_reads: RefCell<HashMap<CollectionKind, GatewayError>>,
    pub failing_writes: RefCell<HashSet<CollectionKind>>,
    pub fail_order: Cell<bool>,
    pub expired: Cell<bool>,
    pub calls: RefCell<Vec<String>>,
    pub mail: RefCell<Vec<ContactMessage>>,
    next_id: Cell<u32>,
}

impl FakeGateway {
    pub fn with_content(content: ContentSnapshot) -> Self {
        Self {
            content: RefCell::new(content),
            ..Self::default()
        }
    }

    pub fn fail_reads(&self, kind: CollectionKind) {
        self.fail_reads_with(kind, GatewayError::Transport("connection reset".to_string()));
    }

    /// Makes reads of `kind` fail with `error`.
    pub fn fail_reads_with(&self, kind: CollectionKind, error: GatewayError) {
        self.failing_reads.borrow_mut().insert(kind, error);
    }

    pub fn fail_writes(&self, kind: CollectionKind) {
        self.failing_writes.borrow_mut().insert(kind);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Calls whose name starts with `prefix`, e.g. `"update"`.
    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn log(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    fn authorize(&self, token: &str) -> Result<(), GatewayError> {
        if self.expired.get() || token != TOKEN {
            return Err(GatewayError::Unauthorized);
        }
        Ok(())
    }

    fn check_write(&self, kind: CollectionKind) -> Result<(), GatewayError> {
        if self.failing_writes.borrow().contains(&kind) {
            return Err(GatewayError::Rejected {
                status: 500,
                message: "write failed".to_string(),
            });
        }
        Ok(())
    }
}

impl Gateway for FakeGateway {
    async fn login(&self, user: &str, pass: &str) -> Result<String, GatewayError> {
        self.log(format!("login {}", user));
        if user == USER && pass == PASS {
            Ok(TOKEN.to_string())
        } else {
            Err(GatewayError::Unauthorized)
        }
    }

    async fn read<T: Record>(&self, token: &str) -> Result<Vec<T>, GatewayError> {
        self.log(format!("read {}", T::KIND));
        self.authorize(token)?;
        if let Some(error) = self.failing_reads.borrow().get(&T::KIND) {
            return Err(error.clone());
        }
        Ok(T::records(&self.content.borrow()).to_vec())
    }

    async fn create<T: Record>(&self, token: &str, record: &T) -> Result<T, GatewayError> {
        self.log(format!("create {}", T::KIND));
        self.authorize(token)?;
        self.check_write(T::KIND)?;

        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        let mut value =
            serde_json::to_value(record).map_err(|e| GatewayError::Malformed(e.to_string()))?;
        value["id"] = serde_json::Value::String(format!("srv-{}", id));
        let stored: T =
            serde_json::from_value(value).map_err(|e| GatewayError::Malformed(e.to_string()))?;

        self.content.borrow_mut().upsert(stored.clone());
        Ok(stored)
    }

    async fn update<T: Record>(&self, token: &str, record: &T) -> Result<T, GatewayError> {
        self.log(format!("update {} {}", T::KIND, record.id()));
        self.authorize(token)?;
        self.check_write(T::KIND)?;
        self.content.borrow_mut().upsert(record.clone());
        Ok(record.clone())
    }

    async fn update_order(
        &self,
        token: &str,
        kind: CollectionKind,
        patch: &[OrderPatch],
    ) -> Result<(), GatewayError> {
        self.log(format!("order {} {}", kind, patch.len()));
        self.authorize(token)?;
        if self.fail_order.get() {
            return Err(GatewayError::Transport("timeout".to_string()));
        }
        self.content.borrow_mut().apply_order(kind, patch);
        Ok(())
    }

    async fn delete(
        &self,
        token: &str,
        kind: CollectionKind,
        id: &str,
    ) -> Result<(), GatewayError> {
        self.log(format!("delete {} {}", kind, id));
        self.authorize(token)?;
        self.check_write(kind)?;
        if !self.content.borrow_mut().remove(kind, id) {
            return Err(GatewayError::Rejected {
                status: 404,
                message: format!("no record {}", id),
            });
        }
        Ok(())
    }

    async fn send_mail(&self, message: &ContactMessage) -> Result<(), GatewayError> {
        self.log("mail".to_string());
        if self.failing_writes.borrow().contains(&CollectionKind::Contact) {
            return Err(GatewayError::Transport("relay down".to_string()));
        }
        self.mail.borrow_mut().push(message.clone());
        Ok(())
    }
}
