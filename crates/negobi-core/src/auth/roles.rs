//! User roles and the static permission table.
//!
//! Roles come from the login response and are never refreshed during a
//! session. Permission checks are a fixed allow-list per role; the backend
//! remains the authority for every request.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::i18n::Language;

#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    SuperAdmin,
    Directive,
    Management,
    Supervisor,
    Administration,
    Purchasing,
    Sales,
    Sellers,
    Warehouse,
    Drivers,
    Viewer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ViewDashboard,
    ViewCatalog,
    ManageOrganizations,
    ManageCompanies,
    ManageUsers,
    ManageClients,
    ManageSuppliers,
    ManagePaymentTerms,
    ManageProducts,
    ManageServices,
    ManageWarehouses,
    ManageInstances,
}

use Permission::*;

const ALL_PERMISSIONS: &[Permission] = &[
    ViewDashboard,
    ViewCatalog,
    ManageOrganizations,
    ManageCompanies,
    ManageUsers,
    ManageClients,
    ManageSuppliers,
    ManagePaymentTerms,
    ManageProducts,
    ManageServices,
    ManageWarehouses,
    ManageInstances,
];

const DIRECTIVE_PERMISSIONS: &[Permission] = &[
    ViewDashboard,
    ViewCatalog,
    ManageCompanies,
    ManageUsers,
    ManageClients,
    ManageSuppliers,
    ManagePaymentTerms,
    ManageProducts,
    ManageServices,
    ManageWarehouses,
    ManageInstances,
];

const MANAGEMENT_PERMISSIONS: &[Permission] = &[
    ViewDashboard,
    ViewCatalog,
    ManageUsers,
    ManageClients,
    ManageSuppliers,
    ManagePaymentTerms,
    ManageProducts,
    ManageServices,
    ManageWarehouses,
    ManageInstances,
];

const SUPERVISOR_PERMISSIONS: &[Permission] = &[
    ViewDashboard,
    ViewCatalog,
    ManageClients,
    ManageSuppliers,
    ManageProducts,
    ManageServices,
    ManageWarehouses,
];

const ADMINISTRATION_PERMISSIONS: &[Permission] = &[
    ViewDashboard,
    ViewCatalog,
    ManageClients,
    ManageSuppliers,
    ManagePaymentTerms,
];

const PURCHASING_PERMISSIONS: &[Permission] =
    &[ViewDashboard, ViewCatalog, ManageSuppliers, ManageProducts];
const SALES_PERMISSIONS: &[Permission] = &[ViewDashboard, ViewCatalog, ManageClients];
const SELLERS_PERMISSIONS: &[Permission] = &[ViewCatalog, ManageClients];
const WAREHOUSE_PERMISSIONS: &[Permission] = &[ViewCatalog, ManageProducts, ManageWarehouses];
const DRIVERS_PERMISSIONS: &[Permission] = &[ViewCatalog];
const VIEWER_PERMISSIONS: &[Permission] = &[ViewDashboard, ViewCatalog];

impl Role {
    pub const ALL: [Role; 11] = [
        Role::SuperAdmin,
        Role::Directive,
        Role::Management,
        Role::Supervisor,
        Role::Administration,
        Role::Purchasing,
        Role::Sales,
        Role::Sellers,
        Role::Warehouse,
        Role::Drivers,
        Role::Viewer,
    ];

    /// Tag as sent by the backend.
    pub fn tag(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "superAdmin",
            Role::Directive => "directive",
            Role::Management => "management",
            Role::Supervisor => "supervisor",
            Role::Administration => "administration",
            Role::Purchasing => "purchasing",
            Role::Sales => "sales",
            Role::Sellers => "sellers",
            Role::Warehouse => "warehouse",
            Role::Drivers => "drivers",
            Role::Viewer => "viewer",
        }
    }

    pub fn label(&self, language: Language) -> &'static str {
        match language {
            Language::Es => match self {
                Role::SuperAdmin => "Super administrador",
                Role::Directive => "Directiva",
                Role::Management => "Gerencia",
                Role::Supervisor => "Supervisor",
                Role::Administration => "Administración",
                Role::Purchasing => "Compras",
                Role::Sales => "Ventas",
                Role::Sellers => "Vendedores",
                Role::Warehouse => "Almacén",
                Role::Drivers => "Choferes",
                Role::Viewer => "Consulta",
            },
            Language::En => match self {
                Role::SuperAdmin => "Super admin",
                Role::Directive => "Board",
                Role::Management => "Management",
                Role::Supervisor => "Supervisor",
                Role::Administration => "Administration",
                Role::Purchasing => "Purchasing",
                Role::Sales => "Sales",
                Role::Sellers => "Sellers",
                Role::Warehouse => "Warehouse",
                Role::Drivers => "Drivers",
                Role::Viewer => "Viewer",
            },
        }
    }

    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            Role::SuperAdmin => ALL_PERMISSIONS,
            Role::Directive => DIRECTIVE_PERMISSIONS,
            Role::Management => MANAGEMENT_PERMISSIONS,
            Role::Supervisor => SUPERVISOR_PERMISSIONS,
            Role::Administration => ADMINISTRATION_PERMISSIONS,
            Role::Purchasing => PURCHASING_PERMISSIONS,
            Role::Sales => SALES_PERMISSIONS,
            Role::Sellers => SELLERS_PERMISSIONS,
            Role::Warehouse => WAREHOUSE_PERMISSIONS,
            Role::Drivers => DRIVERS_PERMISSIONS,
            Role::Viewer => VIEWER_PERMISSIONS,
        }
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|r| r.tag().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown role: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serde_uses_backend_tags() {
        for role in Role::ALL {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.tag()));
            let parsed: Role = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn test_super_admin_can_everything() {
        for permission in ALL_PERMISSIONS {
            assert!(Role::SuperAdmin.can(*permission));
        }
    }

    #[test]
    fn test_restricted_roles() {
        assert!(!Role::Directive.can(Permission::ManageOrganizations));
        assert!(Role::Sellers.can(Permission::ManageClients));
        assert!(!Role::Sellers.can(Permission::ViewDashboard));
        assert!(!Role::Viewer.can(Permission::ManageProducts));
        assert!(Role::Warehouse.can(Permission::ManageWarehouses));
        assert!(!Role::Drivers.can(Permission::ManageClients));
    }

    #[test]
    fn test_every_role_can_view_catalog() {
        for role in Role::ALL {
            assert!(role.can(Permission::ViewCatalog), "{} cannot view catalog", role);
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(Role::Warehouse.label(Language::Es), "Almacén");
        assert_eq!(Role::Warehouse.label(Language::En), "Warehouse");
        assert_eq!("SUPERADMIN".parse::<Role>(), Ok(Role::SuperAdmin));
        assert!("owner".parse::<Role>().is_err());
    }
}
