// src/services/hierarchy.rs

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{rbac::Role, tenancy::ApprovalPolicy},
};

/// Profundidade máxima percorrida na política transitiva.
/// A lista `requires_approval_from` é configurada à mão e pode ter ciclos.
pub const MAX_APPROVAL_DEPTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    /// O cargo de quem decide não tem `can_approve_work`.
    ActorCannotApprove,
    /// O cargo de quem decide não está na cadeia do cargo de quem executou.
    NotInApprovalChain,
    /// Um dos cargos não existe nesta instância.
    UnknownRole,
}

// Visão em memória dos cargos de uma instância, indexados por id.
pub struct RoleHierarchy {
    roles: HashMap<Uuid, Role>,
}

impl RoleHierarchy {
    pub fn new(roles: Vec<Role>) -> Self {
        Self {
            roles: roles.into_iter().map(|r| (r.id, r)).collect(),
        }
    }

    pub fn get(&self, role_id: Uuid) -> Option<&Role> {
        self.roles.get(&role_id)
    }

    /// Cargos que podem revisar o trabalho de `submitter_role_id`.
    ///
    /// Ordem: camada da cadeia primeiro, depois `level` crescente (o nível
    /// mais baixo que pode aprovar aparece primeiro). Ids desconhecidos são
    /// ignorados, e o próprio cargo de quem executou nunca entra.
    pub fn approver_roles(&self, submitter_role_id: Uuid, policy: ApprovalPolicy) -> Vec<&Role> {
        let Some(submitter) = self.get(submitter_role_id) else {
            return Vec::new();
        };

        let max_depth = match policy {
            ApprovalPolicy::Direct => 1,
            ApprovalPolicy::Transitive => MAX_APPROVAL_DEPTH,
        };

        let mut visited: HashSet<Uuid> = HashSet::from([submitter.id]);
        let mut result = Vec::new();
        let mut frontier = vec![submitter];

        // BFS por camadas
        for _ in 0..max_depth {
            let mut layer: Vec<&Role> = frontier
                .iter()
                .flat_map(|role| role.requires_approval_from.iter())
                .filter_map(|id| self.get(*id))
                .filter(|role| visited.insert(role.id))
                .collect();

            if layer.is_empty() {
                break;
            }

            layer.sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.name.cmp(&b.name)));
            result.extend(layer.iter().copied());
            frontier = layer;
        }

        result
    }

    /// As duas condições são exigidas: o cargo precisa poder aprovar e
    /// precisa estar na cadeia do cargo de quem executou.
    pub fn check_eligibility(
        &self,
        actor_role_id: Uuid,
        submitter_role_id: Uuid,
        policy: ApprovalPolicy,
    ) -> Eligibility {
        let (Some(actor), Some(_)) = (self.get(actor_role_id), self.get(submitter_role_id)) else {
            return Eligibility::UnknownRole;
        };

        if !actor.can_approve_work {
            return Eligibility::ActorCannotApprove;
        }

        let in_chain = self
            .approver_roles(submitter_role_id, policy)
            .iter()
            .any(|role| role.id == actor.id);

        if in_chain {
            Eligibility::Eligible
        } else {
            Eligibility::NotInApprovalChain
        }
    }
}

/// Valida a lista de aprovadores de um cargo antes de gravar.
///
/// `found` são os cargos que o repositório encontrou para `requested` dentro
/// da mesma instância. Aprovadores de nível igual são aceitos.
pub fn validate_approval_chain(
    role_id: Option<Uuid>,
    level: i32,
    requested: &[Uuid],
    found: &[Role],
) -> Result<(), AppError> {
    if role_id.is_some_and(|id| requested.contains(&id)) {
        return Err(AppError::InvalidInput("errors.approval_chain_self"));
    }

    for id in requested {
        let Some(approver) = found.iter().find(|r| r.id == *id) else {
            return Err(AppError::InvalidInput("errors.approval_chain_unknown_role"));
        };
        if approver.level < level {
            return Err(AppError::InvalidInput("errors.approval_chain_level"));
        }
    }

    Ok(())
}
