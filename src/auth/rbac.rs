/*!
 * # Role-Based Access Control (RBAC) Module
 *
 * Maps each role to the permissions embedded in the tokens it receives.
 */

use super::permissions::consts;
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Role definition with associated permissions
#[derive(Debug, Clone)]
pub struct RoleDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub permissions: Vec<&'static str>,
}

/// The roles a user row may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Procurement,
    Viewer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Procurement => "procurement",
            Role::Viewer => "viewer",
        }
    }

    /// Permissions granted to this role.
    pub fn permissions(self) -> Vec<String> {
        ROLES
            .get(&self)
            .map(|def| def.permissions.iter().map(|p| p.to_string()).collect())
            .unwrap_or_default()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "procurement" => Ok(Role::Procurement),
            "viewer" => Ok(Role::Viewer),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

lazy_static! {
    pub static ref ROLES: HashMap<Role, RoleDefinition> = {
        let mut roles = HashMap::new();

        roles.insert(
            Role::Admin,
            RoleDefinition {
                name: "admin",
                description: "Administrator with full access",
                permissions: vec!["vendors:*", "purchaseorders:*"],
            },
        );

        roles.insert(
            Role::Procurement,
            RoleDefinition {
                name: "procurement",
                description: "Buyer managing vendors and purchase orders",
                permissions: vec![
                    consts::VENDORS_READ,
                    consts::VENDORS_MANAGE,
                    consts::PURCHASE_ORDERS_READ,
                    consts::PURCHASE_ORDERS_MANAGE,
                ],
            },
        );

        roles.insert(
            Role::Viewer,
            RoleDefinition {
                name: "viewer",
                description: "Read-only access",
                permissions: vec![consts::VENDORS_READ, consts::PURCHASE_ORDERS_READ],
            },
        );

        roles
    };
}
