//! Back-office collections and the operations front ends run on them.
//!
//! Each collection is a marker type implementing [`Resource`], which ties
//! the REST path to its read model and payload. The generic CRUD calls live
//! on `ApiClient`; [`ResourceService`] wraps them with the busy flag and
//! notifications, and [`ListController`] drives paginated listing.

pub mod list;
pub mod service;

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::Permission;
use crate::i18n::Language;
use crate::models::{
    Client, ClientPayload, Company, CompanyPayload, Instance, InstancePayload, Organization,
    OrganizationPayload, PaymentTerm, PaymentTermPayload, Product, ProductPayload, Service,
    ServicePayload, Supplier, SupplierPayload, User, UserPayload, Warehouse, WarehousePayload,
};

pub use list::ListController;
pub use service::ResourceService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Organizations,
    Companies,
    Clients,
    Suppliers,
    Users,
    PaymentTerms,
    Products,
    Services,
    Warehouses,
    Instances,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 10] = [
        ResourceKind::Organizations,
        ResourceKind::Companies,
        ResourceKind::Clients,
        ResourceKind::Suppliers,
        ResourceKind::Users,
        ResourceKind::PaymentTerms,
        ResourceKind::Products,
        ResourceKind::Services,
        ResourceKind::Warehouses,
        ResourceKind::Instances,
    ];

    /// Collection path relative to the API base URL.
    pub fn path(&self) -> &'static str {
        match self {
            ResourceKind::Organizations => "organizations",
            ResourceKind::Companies => "companies",
            ResourceKind::Clients => "clients",
            ResourceKind::Suppliers => "suppliers",
            ResourceKind::Users => "users",
            ResourceKind::PaymentTerms => "payment-terms",
            ResourceKind::Products => "products",
            ResourceKind::Services => "services",
            ResourceKind::Warehouses => "warehouses",
            ResourceKind::Instances => "instances",
        }
    }

    pub fn label(&self, language: Language) -> &'static str {
        match (self, language) {
            (ResourceKind::Organizations, Language::Es) => "Organizaciones",
            (ResourceKind::Companies, Language::Es) => "Empresas",
            (ResourceKind::Clients, Language::Es) => "Clientes",
            (ResourceKind::Suppliers, Language::Es) => "Proveedores",
            (ResourceKind::Users, Language::Es) => "Usuarios",
            (ResourceKind::PaymentTerms, Language::Es) => "Condiciones de pago",
            (ResourceKind::Products, Language::Es) => "Productos",
            (ResourceKind::Services, Language::Es) => "Servicios",
            (ResourceKind::Warehouses, Language::Es) => "Almacenes",
            (ResourceKind::Instances, Language::Es) => "Categorías",
            (ResourceKind::Organizations, Language::En) => "Organizations",
            (ResourceKind::Companies, Language::En) => "Companies",
            (ResourceKind::Clients, Language::En) => "Clients",
            (ResourceKind::Suppliers, Language::En) => "Suppliers",
            (ResourceKind::Users, Language::En) => "Users",
            (ResourceKind::PaymentTerms, Language::En) => "Payment terms",
            (ResourceKind::Products, Language::En) => "Products",
            (ResourceKind::Services, Language::En) => "Services",
            (ResourceKind::Warehouses, Language::En) => "Warehouses",
            (ResourceKind::Instances, Language::En) => "Categories",
        }
    }

    /// Permission needed to manage this collection.
    pub fn permission(&self) -> Permission {
        match self {
            ResourceKind::Organizations => Permission::ManageOrganizations,
            ResourceKind::Companies => Permission::ManageCompanies,
            ResourceKind::Clients => Permission::ManageClients,
            ResourceKind::Suppliers => Permission::ManageSuppliers,
            ResourceKind::Users => Permission::ManageUsers,
            ResourceKind::PaymentTerms => Permission::ManagePaymentTerms,
            ResourceKind::Products => Permission::ManageProducts,
            ResourceKind::Services => Permission::ManageServices,
            ResourceKind::Warehouses => Permission::ManageWarehouses,
            ResourceKind::Instances => Permission::ManageInstances,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        let alias = match normalized.as_str() {
            "categories" => "instances",
            "terms" => "payment-terms",
            other => other,
        };
        ResourceKind::ALL
            .iter()
            .copied()
            .find(|k| k.path() == alias)
            .ok_or_else(|| format!("unknown resource: {}", s))
    }
}

/// A REST collection with its read model and create/update payload.
pub trait Resource: Send + Sync + 'static {
    const KIND: ResourceKind;

    /// Failed create/update/delete calls are returned to the caller as
    /// errors (after notifying) instead of being folded into the outcome.
    /// Reads always resolve to an outcome.
    const PROPAGATES_ERRORS: bool = false;

    type Item: DeserializeOwned + Serialize + Clone + fmt::Debug + Send + 'static;
    type Payload: Serialize + Send + Sync;
}

macro_rules! resource {
    ($name:ident, $kind:ident, $item:ty, $payload:ty) => {
        resource!($name, $kind, $item, $payload, false);
    };
    ($name:ident, $kind:ident, $item:ty, $payload:ty, $propagates:expr) => {
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl Resource for $name {
            const KIND: ResourceKind = ResourceKind::$kind;
            const PROPAGATES_ERRORS: bool = $propagates;
            type Item = $item;
            type Payload = $payload;
        }
    };
}

resource!(Organizations, Organizations, Organization, OrganizationPayload);
resource!(Companies, Companies, Company, CompanyPayload);
resource!(Clients, Clients, Client, ClientPayload);
resource!(Suppliers, Suppliers, Supplier, SupplierPayload);
resource!(Users, Users, User, UserPayload, true);
resource!(PaymentTerms, PaymentTerms, PaymentTerm, PaymentTermPayload, true);
resource!(Products, Products, Product, ProductPayload);
resource!(Services, Services, Service, ServicePayload);
resource!(Warehouses, Warehouses, Warehouse, WarehousePayload);
resource!(Instances, Instances, Instance, InstancePayload);
