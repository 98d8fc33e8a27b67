//! End-to-end import pipeline tests against the in-memory store.

use fieldops_models::{ChangeType, Client, EntityKind, ImportResult};
use fieldops_utils::import::{
    export_from, failure_result, ImportEngine, MemoryAuditSink, MemoryStore,
};
use fieldops_utils::{FieldOpsError, ImportConfig};
use serde_json::json;
use uuid::Uuid;

struct Harness {
    store: MemoryStore,
    audit: MemoryAuditSink,
    engine: ImportEngine<MemoryStore, MemoryAuditSink>,
}

fn harness() -> Harness {
    let store = MemoryStore::new();
    let audit = MemoryAuditSink::default();
    let engine = ImportEngine::new(store.clone(), audit.clone(), &ImportConfig::default());
    Harness { store, audit, engine }
}

fn error_rows(result: &ImportResult) -> Vec<(usize, String)> {
    result
        .errors
        .iter()
        .map(|e| (e.row, e.field.clone()))
        .collect()
}

const CLIENTS: &str = "nom_entreprise,siege_ville,sites,contact_email\n\
Acme,Lyon,\"Lyon Nord,Lyon Sud\",contact@acme.fr\n\
Globex,Paris,,\n";

const CONTRATS: &str = "reference,client,type_contrat,date_debut,date_fin,frequence,statut,prestations,montant_ht,reconduction_tacite\n\
CT-001,acme,Maintenance,01/01/2024,2024-12-31,Trimestrielle,,\"Visite,Rapport\",\"1 200,50\",oui\n\
CT-002,Globex,depannage,2024-02-01,,ponctuelle,brouillon,,,\n";

#[tokio::test]
async fn test_scenario_blank_company_name() {
    let h = harness();
    let content = "nom_entreprise,siege_nom\n,Siège A\nAcme,Siège B";

    let result = h.engine.preview(EntityKind::Clients, content).await.unwrap();

    assert!(!result.success);
    assert_eq!((result.created, result.updated), (0, 0));
    assert_eq!(error_rows(&result), vec![(1, "nom_entreprise".to_string())]);
    assert_eq!(
        serde_json::to_value(&result.preview).unwrap(),
        json!([{ "nomEntreprise": "Acme", "siegeNom": "Siège B" }])
    );
    assert!(h.store.clients().await.is_empty());
}

#[tokio::test]
async fn test_preview_is_deterministic() {
    let h = harness();
    let content = "nom_entreprise,contact_email\nAcme,bad-email\nGlobex,info@globex.com\n,x@y.fr";

    let first = h.engine.preview(EntityKind::Clients, content).await.unwrap();
    let second = h.engine.preview(EntityKind::Clients, content).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn test_row_numbers_match_between_preview_and_commit() {
    let h = harness();
    let content = "nom,prenom,email,actif\n\
Durand,Léa,lea@example.com,oui\n\
Martin,,martin@example.com,oui\n\
Petit,Jules,jules@example.com,non\n\
Bernard,Anne,anne@example.com,peut-être\n";

    let preview = h.engine.preview(EntityKind::Employes, content).await.unwrap();
    let commit = h
        .engine
        .commit(EntityKind::Employes, content, Uuid::new_v4())
        .await
        .unwrap();

    let expected = vec![(2, "prenom".to_string()), (4, "actif".to_string())];
    assert_eq!(error_rows(&preview), expected);
    assert_eq!(error_rows(&commit), expected);
}

#[tokio::test]
async fn test_commit_is_all_or_nothing() {
    let h = harness();
    let content = "nom_entreprise,contact_email\n\
Alpha,a@alpha.fr\n\
Beta,b@beta.fr\n\
Gamma,not-an-email\n\
Delta,d@delta.fr\n";

    let result = h
        .engine
        .commit(EntityKind::Clients, content, Uuid::new_v4())
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!((result.created, result.updated), (0, 0));
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].row, 3);
    assert_eq!(result.preview, None);
    assert!(h.store.clients().await.is_empty());
    assert!(h.audit.records().await.is_empty());
}

#[tokio::test]
async fn test_second_import_updates_instead_of_creating() {
    let h = harness();
    let actor = Uuid::new_v4();

    let first = h
        .engine
        .commit(EntityKind::Clients, "nom_entreprise,siege_ville\nAcme,Lyon", actor)
        .await
        .unwrap();
    assert!(first.success);
    assert_eq!((first.created, first.updated), (1, 0));

    let second = h
        .engine
        .commit(EntityKind::Clients, "nom_entreprise,siege_ville\nACME,Paris", actor)
        .await
        .unwrap();
    assert!(second.success);
    assert_eq!((second.created, second.updated), (0, 1));

    let clients = h.store.clients().await;
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0].siege_ville.as_deref(), Some("Paris"));

    let audits = h.audit.records().await;
    assert_eq!(audits.len(), 2);
    assert_eq!(audits[1].actor_id, actor);
    let change = &audits[1].changes[0];
    assert_eq!(change.change_type, ChangeType::Updated);
    assert_eq!(change.entity_id, clients[0].id);
    assert_eq!(change.before.as_ref().unwrap()["siege_ville"], json!("Lyon"));
    assert_eq!(change.after["siege_ville"], json!("Paris"));
}

#[tokio::test]
async fn test_duplicate_key_within_file() {
    let h = harness();
    let content = "nom_entreprise\nAcme\nGlobex\n acme ";

    let result = h.engine.preview(EntityKind::Clients, content).await.unwrap();

    assert_eq!(error_rows(&result), vec![(3, "nom_entreprise".to_string())]);
    assert_eq!(result.errors[0].message, "duplicate of row 1");
    assert_eq!(result.preview.as_ref().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_export_then_preview_round_trips() {
    let h = harness();
    let actor = Uuid::new_v4();

    let clients = h.engine.preview(EntityKind::Clients, CLIENTS).await.unwrap();
    assert!(clients.success, "{:?}", clients.errors);
    h.engine.commit(EntityKind::Clients, CLIENTS, actor).await.unwrap();

    let contrats = h.engine.preview(EntityKind::Contrats, CONTRATS).await.unwrap();
    assert!(contrats.success, "{:?}", contrats.errors);
    let committed = h.engine.commit(EntityKind::Contrats, CONTRATS, actor).await.unwrap();
    assert_eq!(committed.created, 2);

    let exported = export_from(&h.store, EntityKind::Clients).await.unwrap();
    assert!(exported.contains("\"Lyon Nord,Lyon Sud\""));
    let reimported = h.engine.preview(EntityKind::Clients, &exported).await.unwrap();
    assert!(reimported.success, "{:?}", reimported.errors);
    assert_eq!(reimported.preview, clients.preview);

    let exported = export_from(&h.store, EntityKind::Contrats).await.unwrap();
    let reimported = h.engine.preview(EntityKind::Contrats, &exported).await.unwrap();
    assert!(reimported.success, "{:?}", reimported.errors);
    assert_eq!(reimported.preview, contrats.preview);

    let interventions = "client,contrat,type_intervention,date_prevue,heure_prevue,duree_minutes,description\n\
Acme,CT-001,preventive,2024-03-15,08:30:15,90,\"Contrôle \"\"complet\"\", puis rapport\nsigné\"\n\
Globex,,depannage,2024-03-18,14:00,45,\n";
    let previewed = h.engine.preview(EntityKind::Interventions, interventions).await.unwrap();
    assert!(previewed.success, "{:?}", previewed.errors);
    h.engine.commit(EntityKind::Interventions, interventions, actor).await.unwrap();

    let exported = export_from(&h.store, EntityKind::Interventions).await.unwrap();
    assert!(exported.contains("08:30:15"));
    assert!(exported.contains("\"Contrôle \"\"complet\"\", puis rapport\nsigné\""));
    let reimported = h.engine.preview(EntityKind::Interventions, &exported).await.unwrap();
    assert!(reimported.success, "{:?}", reimported.errors);
    assert_eq!(reimported.preview, previewed.preview);

    h.store.insert_poste("Electricien").await;
    h.store.insert_poste("Technicien").await;
    let employes = "nom,prenom,email,postes,actif\n\
Durand,Léa,lea.durand@acme.fr,\"Electricien,Technicien\",oui\n\
Martin,Paul,,Technicien,non\n";
    let previewed = h.engine.preview(EntityKind::Employes, employes).await.unwrap();
    assert!(previewed.success, "{:?}", previewed.errors);
    h.engine.commit(EntityKind::Employes, employes, actor).await.unwrap();

    let exported = export_from(&h.store, EntityKind::Employes).await.unwrap();
    assert!(exported.contains("\"Electricien,Technicien\""));
    let reimported = h.engine.preview(EntityKind::Employes, &exported).await.unwrap();
    assert!(reimported.success, "{:?}", reimported.errors);
    assert_eq!(reimported.preview, previewed.preview);
}

#[tokio::test]
async fn test_interventions_resolve_clients_and_contracts() {
    let h = harness();
    let actor = Uuid::new_v4();
    h.engine.commit(EntityKind::Clients, CLIENTS, actor).await.unwrap();
    h.engine.commit(EntityKind::Contrats, CONTRATS, actor).await.unwrap();

    let content = "client,contrat,type_intervention,date_prevue,heure_prevue,duree_minutes\n\
Acme,CT-001,preventive,2024-03-15,08:30,90\n\
Globex,CT-001,corrective,2024-03-16,,\n\
Initech,,controle,2024-03-17,,\n\
Globex,,depannage,2024-03-18,14:00,0\n";

    let result = h
        .engine
        .commit(EntityKind::Interventions, content, actor)
        .await
        .unwrap();

    assert_eq!(
        error_rows(&result),
        vec![
            (2, "contrat".to_string()),
            (3, "client".to_string()),
            (4, "duree_minutes".to_string()),
        ]
    );
    assert!(h.store.interventions().await.is_empty());

    let valid = "client,contrat,type_intervention,date_prevue,heure_prevue\n\
Acme,CT-001,preventive,2024-03-15,08:30\n\
Acme,,preventive,2024-03-15,14:00\n";
    let result = h.engine.commit(EntityKind::Interventions, valid, actor).await.unwrap();
    assert_eq!((result.created, result.updated), (2, 0));

    let result = h.engine.commit(EntityKind::Interventions, valid, actor).await.unwrap();
    assert_eq!((result.created, result.updated), (0, 2));
}

#[tokio::test]
async fn test_resolution_errors() {
    let h = harness();
    h.store.insert_client(Client::new("Twin")).await;
    h.store.insert_client(Client::new("twin")).await;
    h.store.insert_poste("Technicien").await;

    let contrat = "reference,client,type_contrat,date_debut,frequence\nCT-9,Twin,maintenance,2024-01-01,annuelle";
    let result = h.engine.preview(EntityKind::Contrats, contrat).await.unwrap();
    assert_eq!(error_rows(&result), vec![(1, "client".to_string())]);
    assert!(result.errors[0].message.contains("ambiguous"));

    let employes = "nom,prenom,postes\nDurand,Léa,\"technicien, Soudeur\"";
    let result = h.engine.preview(EntityKind::Employes, employes).await.unwrap();
    assert_eq!(error_rows(&result), vec![(1, "postes".to_string())]);
    assert_eq!(result.errors[0].message, "unknown post(s): Soudeur");
}

#[tokio::test]
async fn test_employes_store_canonical_post_names() {
    let h = harness();
    let technicien = h.store.insert_poste("Technicien").await;

    let result = h
        .engine
        .commit(EntityKind::Employes, "nom,prenom,postes\nDurand,Léa,technicien", Uuid::new_v4())
        .await
        .unwrap();
    assert!(result.success);

    let employes = h.store.employes().await;
    assert_eq!(employes[0].postes, vec!["Technicien".to_string()]);
    assert!(employes[0].actif);

    let preview = h
        .engine
        .preview(EntityKind::Employes, "nom,prenom,postes\nDurand,Léa,technicien")
        .await
        .unwrap();
    let rows = serde_json::to_value(&preview.preview).unwrap();
    assert_eq!(rows[0]["posteIds"], json!([technicien]));
}

#[tokio::test]
async fn test_parse_errors_abort() {
    let h = harness();

    let err = h.engine.preview(EntityKind::Clients, "").await.unwrap_err();
    assert!(matches!(err, FieldOpsError::Parse { .. }));

    let err = h
        .engine
        .commit(EntityKind::Clients, "siege_nom\nSiège", Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.http_status_code(), 400);

    let body = failure_result(&err);
    assert!(!body.success);
    assert_eq!(body.errors.len(), 1);
    assert_eq!(body.errors[0].row, 0);
    assert_eq!(body.errors[0].field, "_file");
    assert!(h.store.clients().await.is_empty());
}

#[tokio::test]
async fn test_storage_failure_rolls_back() {
    let h = harness();
    h.store.fail_after_writes(2).await;

    let err = h
        .engine
        .commit(EntityKind::Clients, "nom_entreprise\nA\nB\nC", Uuid::new_v4())
        .await
        .unwrap_err();

    assert!(matches!(err, FieldOpsError::Persistence { .. }));
    assert!(err.to_string().contains("row 3"));
    assert_eq!(err.http_status_code(), 500);
    assert_eq!(failure_result(&err).errors[0].field, "_commit");
    assert!(h.store.clients().await.is_empty());
    assert!(h.audit.records().await.is_empty());
}
