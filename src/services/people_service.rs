// src/services/people_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{PersonRepository, RoleRepository, UserRepository},
    models::people::{CreatePersonPayload, NewPerson, Person},
};

#[derive(Clone)]
pub struct PeopleService {
    people: Arc<dyn PersonRepository>,
    roles: Arc<dyn RoleRepository>,
    users: Arc<dyn UserRepository>,
}

impl PeopleService {
    pub fn new(
        people: Arc<dyn PersonRepository>,
        roles: Arc<dyn RoleRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self { people, roles, users }
    }

    pub async fn create_person(&self, tenant_id: Uuid, payload: CreatePersonPayload) -> Result<Person, AppError> {
        if let Some(role_id) = payload.role_id {
            self.ensure_role(tenant_id, role_id).await?;
        }

        // O login vinculado precisa ser da mesma instância.
        if let Some(user_id) = payload.user_id {
            let same_tenant = self
                .users
                .find_by_id(user_id)
                .await?
                .is_some_and(|u| u.tenant_id == tenant_id);
            if !same_tenant {
                return Err(AppError::InvalidInput("errors.unknown_user"));
            }
        }

        let person = self
            .people
            .create_person(NewPerson {
                tenant_id,
                name: payload.name.trim().to_string(),
                email: payload.email.map(|e| e.trim().to_lowercase()),
                role_id: payload.role_id,
                user_id: payload.user_id,
            })
            .await?;

        tracing::info!(tenant_id = %tenant_id, person_id = %person.id, "✅ Pessoa cadastrada");
        Ok(person)
    }

    pub async fn list_people(&self, tenant_id: Uuid) -> Result<Vec<Person>, AppError> {
        self.people.list_by_tenant(tenant_id).await
    }

    pub async fn get_person(&self, tenant_id: Uuid, person_id: Uuid) -> Result<Person, AppError> {
        self.people
            .find_by_id(tenant_id, person_id)
            .await?
            .ok_or(AppError::NotFound("person"))
    }

    /// `None` remove o cargo da pessoa (ela deixa de participar de aprovações).
    pub async fn assign_role(
        &self,
        tenant_id: Uuid,
        person_id: Uuid,
        role_id: Option<Uuid>,
    ) -> Result<Person, AppError> {
        if let Some(role_id) = role_id {
            self.ensure_role(tenant_id, role_id).await?;
        }

        self.people
            .assign_role(tenant_id, person_id, role_id)
            .await?
            .ok_or(AppError::NotFound("person"))
    }

    async fn ensure_role(&self, tenant_id: Uuid, role_id: Uuid) -> Result<(), AppError> {
        match self.roles.find_by_id(tenant_id, role_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::InvalidInput("errors.unknown_role")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::Repositories,
        models::{auth::{NewUser, UserRole}, rbac::NewRole},
    };

    fn service(repos: &Repositories) -> PeopleService {
        PeopleService::new(repos.people.clone(), repos.roles.clone(), repos.users.clone())
    }

    fn person(name: &str, role_id: Option<Uuid>, user_id: Option<Uuid>) -> CreatePersonPayload {
        CreatePersonPayload {
            name: name.into(),
            email: None,
            role_id,
            user_id,
        }
    }

    async fn role(repos: &Repositories, tenant_id: Uuid) -> Uuid {
        repos
            .roles
            .create_role(NewRole {
                tenant_id,
                name: "Técnico".into(),
                description: None,
                permissions: vec![],
                can_approve_work: false,
                level: 1,
                requires_approval_from: vec![],
            })
            .await
            .unwrap()
            .id
    }

    async fn user(repos: &Repositories, tenant_id: Uuid, email: &str) -> Uuid {
        repos
            .users
            .create_user(NewUser {
                tenant_id,
                email: email.into(),
                name: "Login".into(),
                password_hash: "x".into(),
                role: UserRole::TeamMember,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn people_only_reference_roles_and_users_of_their_tenant() {
        let repos = Repositories::in_memory();
        let people = service(&repos);
        let tenant = Uuid::new_v4();
        let other = Uuid::new_v4();

        let local_role = role(&repos, tenant).await;
        let foreign_role = role(&repos, other).await;
        let foreign_user = user(&repos, other, "fora@outra.com").await;

        let ok = people.create_person(tenant, person("João", Some(local_role), None)).await.unwrap();
        assert_eq!(ok.role_id, Some(local_role));

        let bad_role = people.create_person(tenant, person("Ana", Some(foreign_role), None)).await;
        assert!(matches!(bad_role, Err(AppError::InvalidInput("errors.unknown_role"))));

        let bad_user = people.create_person(tenant, person("Ana", None, Some(foreign_user))).await;
        assert!(matches!(bad_user, Err(AppError::InvalidInput("errors.unknown_user"))));
    }

    #[tokio::test]
    async fn a_login_links_to_a_single_person() {
        let repos = Repositories::in_memory();
        let people = service(&repos);
        let tenant = Uuid::new_v4();
        let login = user(&repos, tenant, "joao@acme.com").await;

        people.create_person(tenant, person("João", None, Some(login))).await.unwrap();
        let again = people.create_person(tenant, person("João 2", None, Some(login))).await;

        assert!(matches!(again, Err(AppError::UniqueConstraintViolation(_))));
    }

    #[tokio::test]
    async fn assigning_and_clearing_roles() {
        let repos = Repositories::in_memory();
        let people = service(&repos);
        let tenant = Uuid::new_v4();
        let role_id = role(&repos, tenant).await;
        let p = people.create_person(tenant, person("João", None, None)).await.unwrap();

        let assigned = people.assign_role(tenant, p.id, Some(role_id)).await.unwrap();
        assert_eq!(assigned.role_id, Some(role_id));

        let cleared = people.assign_role(tenant, p.id, None).await.unwrap();
        assert_eq!(cleared.role_id, None);

        let elsewhere = people.assign_role(Uuid::new_v4(), p.id, None).await;
        assert!(matches!(elsewhere, Err(AppError::NotFound("person"))));
    }
}
