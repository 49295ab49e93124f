use clap::Args;
use emap_tracker::accounts::{AccountSettings, MemoryNotifier};
use emap_tracker::domain::{
    Invitation, NewUser, NotificationKind, PasswordChange, ProgramInput, UserPatch,
};
use emap_tracker::error::AppError;
use emap_tracker::http::TrackerServices;
use emap_tracker::{Actor, MemoryStore};
use std::sync::Arc;

const DEMO_PASSWORD: &str = "demo-password-2024";

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Name of the program enrolled by the demo member
    #[arg(long, default_value = "Story County Emergency Management")]
    pub(crate) program_name: String,
    /// Jurisdiction the demo program belongs to
    #[arg(long, default_value = "Story County")]
    pub(crate) jurisdiction: String,
    /// Print the enrolled program as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        program_name,
        jurisdiction,
        json,
    } = args;

    let store = Arc::new(MemoryStore::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let services = TrackerServices::new(store, notifier.clone(), AccountSettings::default());
    let accounts = &services.accounts;

    println!("EMAP tracker demo");

    let admin = accounts.sign_up(
        &Actor::anonymous(),
        NewUser {
            name: "Avery Administrator".to_string(),
            email_address: "avery@emap.example.gov".to_string(),
            password: DEMO_PASSWORD.to_string(),
            password_confirmation: DEMO_PASSWORD.to_string(),
            ..NewUser::default()
        },
    )?;
    println!(
        "- Bootstrapped {} <{}> -> {} (administrator: {})",
        admin.name, admin.email_address, admin.state, admin.administrator
    );
    let admin_actor = accounts.resolve_actor(Some(admin.id))?;

    let invited = accounts.invite(
        &admin_actor,
        Invitation {
            name: "Morgan Member".to_string(),
            email_address: "morgan@storycounty.example.gov".to_string(),
            agency: Some(jurisdiction.clone()),
            job_title: Some("Emergency Management Coordinator".to_string()),
        },
    )?;
    println!("- Invited {} -> {}", invited.email_address, invited.state);

    let Some(key) = notifier.last_key(invited.id, NotificationKind::Invitation) else {
        println!("  Invitation was not delivered; stopping");
        return Ok(());
    };
    println!("  Invitation key delivered ({} hex characters)", key.len());

    let activated = accounts.accept_invitation(
        invited.id,
        &key,
        PasswordChange {
            current_password: None,
            password: DEMO_PASSWORD.to_string(),
            password_confirmation: DEMO_PASSWORD.to_string(),
        },
    )?;
    println!("- Invitation accepted -> {}", activated.state);

    match accounts.accept_invitation(
        invited.id,
        &key,
        PasswordChange {
            current_password: None,
            password: DEMO_PASSWORD.to_string(),
            password_confirmation: DEMO_PASSWORD.to_string(),
        },
    ) {
        Ok(_) => println!("  Replaying the key unexpectedly succeeded"),
        Err(err) => println!("  Replaying the key is refused: {err}"),
    }

    let member = accounts.update_user(
        &admin_actor,
        activated.id,
        UserPatch {
            program: Some(true),
            ..UserPatch::default()
        },
    )?;
    println!("- Granted the program role to {}", member.name);
    let member_actor = accounts.resolve_actor(Some(member.id))?;

    let program = services.programs.create_program(
        &member_actor,
        ProgramInput {
            name: program_name,
            program_jurisdiction: jurisdiction,
            program_state: Some("IA".to_string()),
            program_street: "900 6th St".to_string(),
            program_city: "Nevada".to_string(),
            program_zip: "50201".to_string(),
            program_contact: member.name.clone(),
            contact_phone: "515-555-0100".to_string(),
            contact_email: member.email_address.clone(),
            top_issues: vec![
                "Outdated hazard analysis".to_string(),
                "Untested continuity plan".to_string(),
            ],
            ..ProgramInput::default()
        },
    )?;
    println!("- Enrolled {} at {}", program.name, program.route());

    let documents = services
        .programs
        .required_documents(&member_actor, program.id)?;
    println!("  Required documents created:");
    for record in &documents {
        println!("    - [{}] {}", record.kind, record.name);
    }

    if json {
        match serde_json::to_string_pretty(&program) {
            Ok(payload) => println!("  Program payload:\n{payload}"),
            Err(err) => println!("  Program payload unavailable: {err}"),
        }
    }

    Ok(())
}
