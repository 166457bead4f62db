use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "catalog.read").
/// The wildcard permission `"*"` grants everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: Permission = Permission(Cow::Borrowed("*"));
    /// Browse and search the catalog.
    pub const CATALOG_READ: Permission = Permission(Cow::Borrowed("catalog.read"));
    /// Create, edit and delete catalog items.
    pub const CATALOG_WRITE: Permission = Permission(Cow::Borrowed("catalog.write"));
    /// File a request to borrow an item.
    pub const REQUESTS_CREATE: Permission = Permission(Cow::Borrowed("requests.create"));
    /// Approve, reject and return requests; view the pending queue and active loans.
    pub const REQUESTS_MANAGE: Permission = Permission(Cow::Borrowed("requests.manage"));
    /// Read the audit log.
    pub const AUDIT_READ: Permission = Permission(Cow::Borrowed("audit.read"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
