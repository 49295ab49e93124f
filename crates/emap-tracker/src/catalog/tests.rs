use crate::authorization::Actor;
use crate::domain::{
    EmapStandardInput, EmapStandardPatch, RecordInput, RecordKind, TpriorityInput, TpriorityPatch,
    User, UserState,
};
use crate::error::ServiceError;
use crate::store::EntityStore;
use crate::test_support::{admin, harness, program_input, program_owner, user, Harness};

fn seed(h: &Harness, account: &User) {
    let account = account.clone();
    h.store
        .transaction(|tx| tx.insert_user(account))
        .expect("seed user");
}

fn standard(name: &str) -> EmapStandardInput {
    EmapStandardInput {
        name: name.to_string(),
        std_lang: "The program has a documented hazard identification process.".to_string(),
        tcap_id: Some(41),
    }
}

#[test]
fn members_add_standards_but_only_admins_maintain_them() {
    let h = harness();
    let member = user("Jo Member");
    let staff = admin();
    seed(&h, &member);
    seed(&h, &staff);

    let created = h
        .catalog
        .create_emap_standard(&Actor::user(member.clone()), standard("4.3.1"))
        .expect("signed-up member creates");

    let edit = EmapStandardPatch {
        std_lang: Some("Revised language".to_string()),
        ..EmapStandardPatch::default()
    };
    assert!(matches!(
        h.catalog
            .update_emap_standard(&Actor::user(member.clone()), created.id, edit.clone()),
        Err(ServiceError::PermissionDenied { .. })
    ));
    let updated = h
        .catalog
        .update_emap_standard(&Actor::user(staff.clone()), created.id, edit)
        .expect("admin edits");
    assert_eq!(updated.std_lang, "Revised language");

    assert!(matches!(
        h.catalog
            .destroy_emap_standard(&Actor::user(member), created.id),
        Err(ServiceError::PermissionDenied { .. })
    ));
    h.catalog
        .destroy_emap_standard(&Actor::user(staff), created.id)
        .expect("admin destroys");
    assert!(matches!(
        h.catalog.view_emap_standard(&Actor::anonymous(), created.id),
        Err(ServiceError::NotFound { .. })
    ));
}

#[test]
fn standards_are_public_reading() {
    let h = harness();
    let member = user("Jo Member");
    seed(&h, &member);
    let acting = Actor::user(member);
    h.catalog
        .create_emap_standard(&acting, standard("5.1.1"))
        .expect("create");
    h.catalog
        .create_emap_standard(&acting, standard("4.3.1"))
        .expect("create");

    let names: Vec<String> = h
        .catalog
        .list_emap_standards(&Actor::anonymous())
        .expect("list")
        .into_iter()
        .map(|standard| standard.name)
        .collect();
    assert_eq!(names, vec!["4.3.1".to_string(), "5.1.1".to_string()]);

    assert!(matches!(
        h.catalog
            .create_emap_standard(&Actor::anonymous(), standard("6.0")),
        Err(ServiceError::PermissionDenied { .. })
    ));
}

#[test]
fn tpriorities_attach_to_training_plans_only() {
    let h = harness();
    let owner = program_owner();
    seed(&h, &owner);
    let acting = Actor::user(owner);
    let program = h
        .programs
        .create_program(&acting, program_input("Polk County EMA", "Polk County"))
        .expect("program");
    let plan = h
        .programs
        .add_record(
            &acting,
            program.id,
            RecordInput {
                kind: RecordKind::TrainingPlan,
                name: "2025 Training Plan".to_string(),
            },
        )
        .expect("plan");
    let hira = h
        .programs
        .required_documents(&acting, program.id)
        .expect("documents")
        .into_iter()
        .find(|record| record.kind == RecordKind::Hira)
        .expect("hira");

    let priority = h
        .catalog
        .create_tpriority(
            &acting,
            TpriorityInput {
                training_plan_id: plan.id,
                name: "ICS 300".to_string(),
            },
        )
        .expect("priority");

    match h.catalog.create_tpriority(
        &acting,
        TpriorityInput {
            training_plan_id: hira.id,
            name: "ICS 400".to_string(),
        },
    ) {
        Err(ServiceError::ValidationFailed(errors)) => assert!(errors.has("training_plan_id")),
        other => panic!("expected validation failure, got {other:?}"),
    }

    let renamed = h
        .catalog
        .update_tpriority(
            &acting,
            priority.id,
            TpriorityPatch {
                name: Some("ICS 300 refresher".to_string()),
            },
        )
        .expect("rename");
    assert_eq!(renamed.name, "ICS 300 refresher");
    assert_eq!(
        h.catalog.tpriorities(&acting, plan.id).expect("list"),
        vec![renamed]
    );

    h.catalog
        .destroy_tpriority(&acting, priority.id)
        .expect("destroy");
    assert!(matches!(
        h.catalog.view_tpriority(&acting, priority.id),
        Err(ServiceError::NotFound { .. })
    ));
}

#[test]
fn tpriorities_need_a_signed_up_actor() {
    let h = harness();
    let invited = User {
        state: UserState::Invited,
        ..user("Ira Invited")
    };
    seed(&h, &invited);

    let result = h.catalog.tpriorities(&Actor::user(invited), crate::domain::RecordId::generate());
    assert!(matches!(
        result,
        Err(ServiceError::PermissionDenied { resource: "tpriority", .. })
    ));
}
