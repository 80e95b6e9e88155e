pub mod auth;
pub mod people;
pub mod rbac;
pub mod tenancy;
pub mod work_orders;
