// src/db/memory.rs
//
// Backend em memória (STORAGE_BACKEND=memory e testes).
// Cada operação roda inteira sob o write lock, o que dá a mesma garantia
// dos UPDATEs condicionais do Postgres.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{PersonRepository, RoleRepository, TenantRepository, UserRepository, WorkOrderRepository},
    models::{
        auth::{NewUser, User},
        people::{NewPerson, Person},
        rbac::{NewRole, Role, RoleApproval},
        tenancy::{ApprovalPolicy, Instance},
        work_orders::{
            ApprovalDecision, ApprovalStatus, NewWorkOrder, Submission, WorkOrder, WorkOrderStatus,
        },
    },
};

#[derive(Default)]
struct Tables {
    instances: HashMap<Uuid, Instance>,
    users: HashMap<Uuid, User>,
    roles: HashMap<Uuid, Role>,
    people: HashMap<Uuid, Person>,
    work_orders: HashMap<Uuid, WorkOrder>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

// --- Users ---

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == new_user.email) {
            return Err(AppError::EmailAlreadyExists);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            tenant_id: new_user.tenant_id,
            email: new_user.email,
            name: new_user.name,
            password_hash: new_user.password_hash,
            role: new_user.role,
            is_active: true,
            refresh_token: None,
            refresh_token_expires_at: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn record_login(
        &self,
        user_id: Uuid,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if let Some(user) = tables.users.get_mut(&user_id) {
            let now = Utc::now();
            user.last_login_at = Some(now);
            user.refresh_token = Some(refresh_token.to_string());
            user.refresh_token_expires_at = Some(expires_at);
            user.updated_at = now;
        }
        Ok(())
    }

    async fn rotate_refresh_token(
        &self,
        user_id: Uuid,
        current: &str,
        next: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        match tables.users.get_mut(&user_id) {
            Some(user) if user.refresh_token.as_deref() == Some(current) => {
                user.refresh_token = Some(next.to_string());
                user.refresh_token_expires_at = Some(expires_at);
                user.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn clear_refresh_token(&self, user_id: Uuid) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if let Some(user) = tables.users.get_mut(&user_id) {
            user.refresh_token = None;
            user.refresh_token_expires_at = None;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn set_active(&self, user_id: Uuid, is_active: bool) -> Result<Option<User>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.get_mut(&user_id).map(|user| {
            user.is_active = is_active;
            if !is_active {
                user.refresh_token = None;
                user.refresh_token_expires_at = None;
            }
            user.updated_at = Utc::now();
            user.clone()
        }))
    }
}

// --- Instances ---

#[async_trait]
impl TenantRepository for MemoryStore {
    async fn create_instance(&self, name: &str, policy: ApprovalPolicy) -> Result<Instance, AppError> {
        let now = Utc::now();
        let instance = Instance {
            id: Uuid::new_v4(),
            name: name.to_string(),
            approval_policy: policy,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.instances.insert(instance.id, instance.clone());
        Ok(instance)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Instance>, AppError> {
        Ok(self.tables.read().await.instances.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Instance>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .instances
            .values()
            .filter(|i| i.name == name)
            .min_by_key(|i| i.created_at)
            .cloned())
    }

    async fn list_instances(&self) -> Result<Vec<Instance>, AppError> {
        let mut instances: Vec<Instance> =
            self.tables.read().await.instances.values().cloned().collect();
        instances.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(instances)
    }

    async fn update_approval_policy(
        &self,
        id: Uuid,
        policy: ApprovalPolicy,
    ) -> Result<Option<Instance>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables.instances.get_mut(&id).map(|instance| {
            instance.approval_policy = policy;
            instance.updated_at = Utc::now();
            instance.clone()
        }))
    }
}

// --- Roles ---

#[async_trait]
impl RoleRepository for MemoryStore {
    async fn create_role(&self, new_role: NewRole) -> Result<Role, AppError> {
        let mut tables = self.tables.write().await;
        let duplicated = tables
            .roles
            .values()
            .any(|r| r.tenant_id == new_role.tenant_id && r.name == new_role.name);
        if duplicated {
            return Err(AppError::UniqueConstraintViolation(
                "Já existe um cargo com esse nome.".into(),
            ));
        }

        let now = Utc::now();
        let role = Role {
            id: Uuid::new_v4(),
            tenant_id: new_role.tenant_id,
            name: new_role.name,
            description: new_role.description,
            permissions: new_role.permissions,
            can_approve_work: new_role.can_approve_work,
            level: new_role.level,
            requires_approval_from: new_role.requires_approval_from,
            created_at: now,
            updated_at: now,
        };
        tables.roles.insert(role.id, role.clone());
        Ok(role)
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Role>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.roles.get(&id).filter(|r| r.tenant_id == tenant_id).cloned())
    }

    async fn find_many(&self, tenant_id: Uuid, ids: &[Uuid]) -> Result<Vec<Role>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .roles
            .values()
            .filter(|r| r.tenant_id == tenant_id && ids.contains(&r.id))
            .cloned()
            .collect())
    }

    async fn list_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<Role>, AppError> {
        let tables = self.tables.read().await;
        let mut roles: Vec<Role> = tables
            .roles
            .values()
            .filter(|r| r.tenant_id == tenant_id)
            .cloned()
            .collect();
        roles.sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.name.cmp(&b.name)));
        Ok(roles)
    }

    async fn update_approval(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        approval: RoleApproval,
    ) -> Result<Option<Role>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .roles
            .get_mut(&id)
            .filter(|r| r.tenant_id == tenant_id)
            .map(|role| {
                role.can_approve_work = approval.can_approve_work;
                role.level = approval.level;
                role.requires_approval_from = approval.requires_approval_from;
                role.updated_at = Utc::now();
                role.clone()
            }))
    }
}

// --- People ---

#[async_trait]
impl PersonRepository for MemoryStore {
    async fn create_person(&self, new_person: NewPerson) -> Result<Person, AppError> {
        let mut tables = self.tables.write().await;
        if let Some(user_id) = new_person.user_id {
            let linked = tables
                .people
                .values()
                .any(|p| p.tenant_id == new_person.tenant_id && p.user_id == Some(user_id));
            if linked {
                return Err(AppError::UniqueConstraintViolation(
                    "Este usuário já está vinculado a outra pessoa.".into(),
                ));
            }
        }

        let now = Utc::now();
        let person = Person {
            id: Uuid::new_v4(),
            tenant_id: new_person.tenant_id,
            name: new_person.name,
            email: new_person.email,
            role_id: new_person.role_id,
            user_id: new_person.user_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.people.insert(person.id, person.clone());
        Ok(person)
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Person>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.people.get(&id).filter(|p| p.tenant_id == tenant_id).cloned())
    }

    async fn find_by_user(&self, tenant_id: Uuid, user_id: Uuid) -> Result<Option<Person>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .people
            .values()
            .find(|p| p.tenant_id == tenant_id && p.user_id == Some(user_id) && p.is_active)
            .cloned())
    }

    async fn list_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<Person>, AppError> {
        let tables = self.tables.read().await;
        let mut people: Vec<Person> = tables
            .people
            .values()
            .filter(|p| p.tenant_id == tenant_id)
            .cloned()
            .collect();
        people.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(people)
    }

    async fn assign_role(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        role_id: Option<Uuid>,
    ) -> Result<Option<Person>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .people
            .get_mut(&id)
            .filter(|p| p.tenant_id == tenant_id)
            .map(|person| {
                person.role_id = role_id;
                person.updated_at = Utc::now();
                person.clone()
            }))
    }
}

// --- Work orders ---

#[async_trait]
impl WorkOrderRepository for MemoryStore {
    async fn create_work_order(&self, new_order: NewWorkOrder) -> Result<WorkOrder, AppError> {
        let now = Utc::now();
        let order = WorkOrder {
            id: Uuid::new_v4(),
            tenant_id: new_order.tenant_id,
            title: new_order.title,
            description: new_order.description,
            assigned_to: new_order.assigned_to,
            status: WorkOrderStatus::Scheduled,
            scheduled_for: new_order.scheduled_for,
            completion_notes: None,
            photos: Vec::new(),
            submitted_by: None,
            submitted_at: None,
            approval_status: None,
            reviewed_by: None,
            reviewed_at: None,
            approved_by: None,
            approved_at: None,
            review_notes: None,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.work_orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<WorkOrder>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.work_orders.get(&id).filter(|o| o.tenant_id == tenant_id).cloned())
    }

    async fn list_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<WorkOrder>, AppError> {
        let tables = self.tables.read().await;
        let mut orders: Vec<WorkOrder> = tables
            .work_orders
            .values()
            .filter(|o| o.tenant_id == tenant_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn update_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        expected: WorkOrderStatus,
        next: WorkOrderStatus,
    ) -> Result<Option<WorkOrder>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .work_orders
            .get_mut(&id)
            .filter(|o| o.tenant_id == tenant_id && o.status == expected)
            .map(|order| {
                order.status = next;
                order.updated_at = Utc::now();
                order.clone()
            }))
    }

    async fn submit_for_approval(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        submission: Submission,
    ) -> Result<Option<WorkOrder>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .work_orders
            .get_mut(&id)
            .filter(|o| o.tenant_id == tenant_id && o.status.can_submit())
            .map(|order| {
                order.status = WorkOrderStatus::PendingApproval;
                order.approval_status = Some(ApprovalStatus::Pending);
                order.submitted_by = Some(submission.submitted_by);
                order.submitted_at = Some(submission.submitted_at);
                order.completion_notes = submission.completion_notes;
                order.photos = submission.photos;
                order.reviewed_by = None;
                order.reviewed_at = None;
                order.approved_by = None;
                order.approved_at = None;
                order.review_notes = None;
                order.updated_at = Utc::now();
                order.clone()
            }))
    }

    async fn record_decision(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        decision: ApprovalDecision,
    ) -> Result<Option<WorkOrder>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .work_orders
            .get_mut(&id)
            .filter(|o| o.tenant_id == tenant_id && o.approval_status == Some(ApprovalStatus::Pending))
            .map(|order| {
                order.approval_status = Some(decision.outcome);
                order.status = decision.resulting_status();
                order.reviewed_by = Some(decision.reviewer);
                order.reviewed_at = Some(decision.decided_at);
                order.approved_by = decision.approved_by();
                order.approved_at = decision.approved_at();
                order.review_notes = decision.notes;
                order.updated_at = Utc::now();
                order.clone()
            }))
    }
}
