pub mod approval_service;
pub mod auth;
pub mod hierarchy;
pub mod people_service;
pub mod rbac_service;
pub mod tenancy_service;
pub mod token;
pub mod work_order_service;
