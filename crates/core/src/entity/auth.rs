use serde::{Deserialize, Serialize};

use super::{Audit, Entity, ForeignKey, Referrer, UniqueKey};

/// Normalizes a lookup value the same way for storage and queries.
pub fn normalize(value: &str) -> String {
    value.trim().to_uppercase()
}

/// A named role that users can be assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    #[serde(flatten)]
    pub audit: Audit,
    pub name: String,
    /// Upper-cased `name`, unique per table.
    pub normalized_name: String,
    pub description: Option<String>,
}

impl Role {
    pub fn new(name: impl Into<String>, created_by: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            audit: Audit::new(created_by),
            normalized_name: normalize(&name),
            name,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Renames the role, keeping the normalized column in sync.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.normalized_name = normalize(&self.name);
    }
}

impl Entity for Role {
    const TABLE: &'static str = "roles";
    const REFERENCED_BY: &'static [Referrer] = &[Referrer {
        table: UserRole::TABLE,
        column: "role_id",
    }];

    fn audit(&self) -> &Audit {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut Audit {
        &mut self.audit
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey {
            column: "normalized_name",
            value: self.normalized_name.clone(),
        }]
    }
}

/// An application user as persisted by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(flatten)]
    pub audit: Audit,
    pub user_name: String,
    pub normalized_user_name: String,
    pub email: String,
    pub normalized_email: String,
    pub email_confirmed: bool,
}

impl User {
    pub fn new(
        user_name: impl Into<String>,
        email: impl Into<String>,
        created_by: impl Into<String>,
    ) -> Self {
        let user_name = user_name.into();
        let email = email.into();
        Self {
            audit: Audit::new(created_by),
            normalized_user_name: normalize(&user_name),
            normalized_email: normalize(&email),
            user_name,
            email,
            email_confirmed: false,
        }
    }

    pub fn with_email_confirmed(mut self, confirmed: bool) -> Self {
        self.email_confirmed = confirmed;
        self
    }
}

impl Entity for User {
    const TABLE: &'static str = "users";
    const REFERENCED_BY: &'static [Referrer] = &[Referrer {
        table: UserRole::TABLE,
        column: "user_id",
    }];

    fn audit(&self) -> &Audit {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut Audit {
        &mut self.audit
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![
            UniqueKey {
                column: "normalized_user_name",
                value: self.normalized_user_name.clone(),
            },
            UniqueKey {
                column: "normalized_email",
                value: self.normalized_email.clone(),
            },
        ]
    }
}

/// Many-to-many association between users and roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    #[serde(flatten)]
    pub audit: Audit,
    pub user_id: i64,
    pub role_id: i64,
}

impl UserRole {
    pub fn new(user_id: i64, role_id: i64, created_by: impl Into<String>) -> Self {
        Self {
            audit: Audit::new(created_by),
            user_id,
            role_id,
        }
    }
}

impl Entity for UserRole {
    const TABLE: &'static str = "user_roles";

    fn audit(&self) -> &Audit {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut Audit {
        &mut self.audit
    }

    fn foreign_keys(&self) -> Vec<ForeignKey> {
        vec![
            ForeignKey {
                column: "user_id",
                references: User::TABLE,
                value: self.user_id,
            },
            ForeignKey {
                column: "role_id",
                references: Role::TABLE,
                value: self.role_id,
            },
        ]
    }
}
