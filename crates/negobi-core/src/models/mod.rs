//! Data models for Negobi back-office entities.
//!
//! Each collection has a read model (as returned by the backend) and a
//! payload used for create/update requests:
//!
//! - `Organization`, `Company`: tenant structure
//! - `Client`, `Supplier`: commercial counterparties
//! - `User`, `UserProfile`, `RoleInfo`: back-office users
//! - `PaymentTerm`: credit terms offered to clients and suppliers
//! - `Product`, `Service`, `Instance`: sellable catalog and categories
//! - `Warehouse`: stock locations

pub mod catalog;
pub mod organization;
pub mod party;
pub mod payment_term;
pub mod user;
pub mod warehouse;

pub use catalog::{Instance, InstancePayload, Product, ProductPayload, Service, ServicePayload};
pub use organization::{Company, CompanyPayload, Organization, OrganizationPayload};
pub use party::{Client, ClientPayload, Supplier, SupplierPayload};
pub use payment_term::{PaymentTerm, PaymentTermPayload};
pub use user::{RoleInfo, User, UserPayload, UserProfile};
pub use warehouse::{Warehouse, WarehousePayload};
