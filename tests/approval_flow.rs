mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use common::{id, spawn_app, token, TestApp};

// Técnico (A) só pode ser aprovado pelo Supervisor (B).
// O Gerente (C) também aprova trabalho, mas não está na cadeia de A.
struct Scenario {
    tenant_id: Uuid,
    admin: Value,
    supervisor: Value,
    manager: Value,
    technician: String,
    supervisor_person: String,
    role_b: String,
    work_order: String,
}

async fn setup(app: &TestApp) -> Scenario {
    let tenant_id = app.create_instance("Acme").await;
    let admin = app.signup(tenant_id, "admin@acme.com", "ADMIN").await;
    let supervisor = app.signup(tenant_id, "supervisor@acme.com", "SUPERVISOR").await;
    let manager = app.signup(tenant_id, "gerente@acme.com", "MANAGER").await;
    let base = format!("/api/instances/{tenant_id}");

    let create_role = |body: Value| {
        let uri = format!("{base}/roles");
        let token = token(&admin).to_string();
        async move {
            let (status, role) = app.post(&uri, Some(&token), body).await;
            assert_eq!(status, StatusCode::CREATED, "cargo: {role}");
            id(&role)
        }
    };

    let role_b = create_role(json!({
        "name": "Supervisor",
        "level": 2,
        "canApproveWork": true,
        "permissions": ["work-orders:approve"]
    }))
    .await;
    let role_c = create_role(json!({ "name": "Gerente", "level": 3, "canApproveWork": true })).await;
    let role_a = create_role(json!({
        "name": "Técnico",
        "level": 1,
        "requiresApprovalFrom": [role_b]
    }))
    .await;

    let create_person = |body: Value| {
        let uri = format!("{base}/people");
        let token = token(&admin).to_string();
        async move {
            let (status, person) = app.post(&uri, Some(&token), body).await;
            assert_eq!(status, StatusCode::CREATED, "pessoa: {person}");
            id(&person)
        }
    };

    let technician = create_person(json!({ "name": "João", "roleId": role_a })).await;
    let supervisor_person = create_person(json!({
        "name": "Ana",
        "roleId": role_b,
        "userId": supervisor["user"]["id"]
    }))
    .await;
    create_person(json!({
        "name": "Carlos",
        "roleId": role_c,
        "userId": manager["user"]["id"]
    }))
    .await;

    let (status, order) = app
        .post(
            &format!("{base}/work-orders"),
            Some(token(&admin)),
            json!({ "title": "Troca do compressor", "assignedTo": technician }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "ordem: {order}");
    assert_eq!(order["status"], "scheduled");

    Scenario {
        tenant_id,
        admin,
        supervisor,
        manager,
        technician,
        supervisor_person,
        role_b,
        work_order: id(&order),
    }
}

fn order_uri(s: &Scenario, action: &str) -> String {
    format!("/api/instances/{}/work-orders/{}{action}", s.tenant_id, s.work_order)
}

async fn submit(app: &TestApp, s: &Scenario) {
    let (status, body) = app
        .post(
            &order_uri(s, "/submit"),
            Some(token(&s.admin)),
            json!({ "completionNotes": "Compressor trocado", "photos": ["https://fotos/1.jpg"] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "envio: {body}");
    assert_eq!(body["status"], "pending-approval");
    assert_eq!(body["approvalStatus"], "pending");
    assert_eq!(body["submittedBy"], s.technician.as_str());
}

#[tokio::test]
async fn only_roles_in_the_chain_can_approve() {
    let app = spawn_app();
    let s = setup(&app).await;
    submit(&app, &s).await;

    let (status, approvers) = app.get(&order_uri(&s, "/approvers"), token(&s.manager)).await;
    assert_eq!(status, StatusCode::OK);
    let approvers = approvers.as_array().unwrap();
    assert_eq!(approvers.len(), 1);
    assert_eq!(approvers[0]["id"], s.role_b.as_str());

    // C aprova trabalho, mas não está na cadeia de A
    let (status, _) = app
        .post(&order_uri(&s, "/approve"), Some(token(&s.manager)), json!({}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Um ADMIN sem pessoa vinculada também não decide
    let (status, _) = app
        .post(&order_uri(&s, "/approve"), Some(token(&s.admin)), json!({}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, approved) = app
        .post(
            &order_uri(&s, "/approve"),
            Some(token(&s.supervisor)),
            json!({ "notes": "  Bom trabalho  " }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "approved");
    assert_eq!(approved["approvalStatus"], "approved");
    assert_eq!(approved["approvedBy"], s.supervisor_person.as_str());
    assert_eq!(approved["reviewedBy"], s.supervisor_person.as_str());
    assert_eq!(approved["reviewNotes"], "Bom trabalho");
    assert!(approved["approvedAt"].is_string());
}

#[tokio::test]
async fn blank_rejection_reason_changes_nothing() {
    let app = spawn_app();
    let s = setup(&app).await;
    submit(&app, &s).await;

    let (status, _) = app
        .post(&order_uri(&s, "/reject"), Some(token(&s.supervisor)), json!({ "reason": "   " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, order) = app.get(&order_uri(&s, ""), token(&s.admin)).await;
    assert_eq!(order["status"], "pending-approval");
    assert_eq!(order["approvalStatus"], "pending");
    assert!(order["reviewedBy"].is_null());
}

#[tokio::test]
async fn rejected_work_can_be_reworked_and_resubmitted() {
    let app = spawn_app();
    let s = setup(&app).await;
    submit(&app, &s).await;

    let (status, rejected) = app
        .post(
            &order_uri(&s, "/reject"),
            Some(token(&s.supervisor)),
            json!({ "reason": "Faltam fotos do painel" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rejected["status"], "rejected");
    assert!(rejected["approvedBy"].is_null());
    assert_eq!(rejected["reviewNotes"], "Faltam fotos do painel");

    let (status, _) = app
        .put(&order_uri(&s, "/status"), token(&s.admin), json!({ "status": "in-progress" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    submit(&app, &s).await;
    let (_, order) = app.get(&order_uri(&s, ""), token(&s.admin)).await;
    assert!(order["reviewedBy"].is_null());
    assert!(order["reviewNotes"].is_null());
}

#[tokio::test]
async fn a_decision_is_final() {
    let app = spawn_app();
    let s = setup(&app).await;
    submit(&app, &s).await;

    let (status, _) = app
        .post(&order_uri(&s, "/approve"), Some(token(&s.supervisor)), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(&order_uri(&s, "/approve"), Some(token(&s.supervisor)), json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .post(&order_uri(&s, "/reject"), Some(token(&s.supervisor)), json!({ "reason": "Mudei de ideia" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Nem pelo status manual
    let (status, body) = app
        .put(&order_uri(&s, "/status"), token(&s.admin), json!({ "status": "in-progress" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["details"]["currentStatus"], "approved");
}

#[tokio::test]
async fn approval_states_are_reserved_to_the_workflow() {
    let app = spawn_app();
    let s = setup(&app).await;

    let (status, _) = app
        .put(&order_uri(&s, "/status"), token(&s.admin), json!({ "status": "approved" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Nada enviado ainda: não há o que aprovar
    let (status, _) = app
        .post(&order_uri(&s, "/approve"), Some(token(&s.supervisor)), json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn transitive_policy_escalates_to_the_approvers_approvers() {
    let app = spawn_app();
    let s = setup(&app).await;
    let base = format!("/api/instances/{}", s.tenant_id);

    let (_, roles) = app.get(&format!("{base}/roles"), token(&s.admin)).await;
    let role_c = roles
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["name"] == "Gerente")
        .map(id)
        .unwrap();

    // B passa a exigir C; com política transitiva, C também revisa o trabalho de A
    let (status, body) = app
        .put(
            &format!("{base}/roles/{}/approval", s.role_b),
            token(&s.admin),
            json!({ "canApproveWork": true, "level": 2, "requiresApprovalFrom": [role_c] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "cargo: {body}");

    let (status, instance) = app
        .put(
            &format!("{base}/approval-policy"),
            token(&s.admin),
            json!({ "approvalPolicy": "transitive" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(instance["approvalPolicy"], "transitive");

    submit(&app, &s).await;

    let (_, approvers) = app.get(&order_uri(&s, "/approvers"), token(&s.admin)).await;
    let names: Vec<&str> = approvers
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Supervisor", "Gerente"]);

    let (status, approved) = app
        .post(&order_uri(&s, "/approve"), Some(token(&s.manager)), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "approved");
}

#[tokio::test]
async fn role_chains_must_be_consistent() {
    let app = spawn_app();
    let s = setup(&app).await;
    let uri = format!("/api/instances/{}/roles", s.tenant_id);

    // Aprovador de nível mais baixo que o cargo aprovado
    let (status, _) = app
        .post(
            &uri,
            Some(token(&s.admin)),
            json!({ "name": "Diretor", "level": 5, "requiresApprovalFrom": [s.role_b] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Cargo inexistente na cadeia
    let (status, _) = app
        .post(
            &uri,
            Some(token(&s.admin)),
            json!({ "name": "Estagiário", "level": 1, "requiresApprovalFrom": [Uuid::new_v4()] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Nome duplicado na mesma instância
    let (status, _) = app
        .post(&uri, Some(token(&s.admin)), json!({ "name": "Supervisor", "level": 2 }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn staff_cannot_credit_work_to_someone_who_was_not_assigned() {
    let app = spawn_app();
    let s = setup(&app).await;
    let base = format!("/api/instances/{}", s.tenant_id);

    // Ordem sem responsável, aberta pelo próprio supervisor
    let (status, order) = app
        .post(&format!("{base}/work-orders"), Some(token(&s.supervisor)), json!({ "title": "Vistoria" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let order_uri = format!("{base}/work-orders/{}", id(&order));

    let (status, _) = app
        .post(
            &format!("{order_uri}/submit"),
            Some(token(&s.supervisor)),
            json!({ "personId": s.technician }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.post(&format!("{order_uri}/approve"), Some(token(&s.supervisor)), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Enviando o próprio trabalho, também não aprova
    let (status, body) = app.post(&format!("{order_uri}/submit"), Some(token(&s.supervisor)), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["submittedBy"], s.supervisor_person.as_str());

    let (status, _) = app.post(&format!("{order_uri}/approve"), Some(token(&s.supervisor)), json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, stored) = app.get(&order_uri, token(&s.admin)).await;
    assert_eq!(stored["approvalStatus"], "pending");
}

#[tokio::test]
async fn guests_cannot_submit_in_someone_elses_name() {
    let app = spawn_app();
    let s = setup(&app).await;
    let guest = app.signup(s.tenant_id, "convidado@acme.com", "GUEST").await;

    let (status, _) = app
        .post(
            &order_uri(&s, "/submit"),
            Some(token(&guest)),
            json!({ "personId": s.technician }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.post(&order_uri(&s, "/submit"), Some(token(&guest)), json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, stored) = app.get(&order_uri(&s, ""), token(&s.admin)).await;
    assert_eq!(stored["status"], "scheduled");
}
