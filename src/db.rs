use std::sync::Arc;

use sqlx::PgPool;

pub mod memory;
pub mod people_repo;
pub mod rbac_repo;
pub mod tenancy_repo;
pub mod user_repo;
pub mod work_order_repo;

pub use memory::MemoryStore;
pub use people_repo::{PersonRepository, PgPersonRepository};
pub use rbac_repo::{PgRoleRepository, RoleRepository};
pub use tenancy_repo::{PgTenantRepository, TenantRepository};
pub use user_repo::{PgUserRepository, UserRepository};
pub use work_order_repo::{PgWorkOrderRepository, WorkOrderRepository};

// O cliente de persistência, montado uma vez no startup e injetado nos serviços.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub tenants: Arc<dyn TenantRepository>,
    pub roles: Arc<dyn RoleRepository>,
    pub people: Arc<dyn PersonRepository>,
    pub work_orders: Arc<dyn WorkOrderRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            tenants: Arc::new(PgTenantRepository::new(pool.clone())),
            roles: Arc::new(PgRoleRepository::new(pool.clone())),
            people: Arc::new(PgPersonRepository::new(pool.clone())),
            work_orders: Arc::new(PgWorkOrderRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            tenants: store.clone(),
            roles: store.clone(),
            people: store.clone(),
            work_orders: store,
        }
    }
}
