use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDateTime;
use tokio::io::{AsyncBufReadExt, BufReader};

use manobal_booking::booking::{SessionType, UserIdentity};
use manobal_booking::config::{NotifyConfig, ReminderConfig, WizardConfig};
use manobal_booking::directory::{
    MemoryDirectory, ProfessionalDirectory, ProfessionalKind, RestDirectory,
};
use manobal_booking::notify::{NoopNotifier, Notifier, SmtpNotifier};
use manobal_booking::reminders::{ReminderSweeper, spawn_reminder_task};
use manobal_booking::store::{BookingStore, LibSqlStore};
use manobal_booking::wizard::{BookingWizard, Step, Urgency, WizardEvent};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let name = std::env::var("MANOBAL_USER_NAME").unwrap_or_else(|_| "Student".to_string());
    let email =
        std::env::var("MANOBAL_USER_EMAIL").unwrap_or_else(|_| "student@rkgit.edu.in".to_string());
    let identity = UserIdentity {
        display_name: name.clone(),
        email: email.clone(),
    };

    eprintln!("🧘 Manobal booking console v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   User: {} <{}>", name, email);

    // ── Store ───────────────────────────────────────────────────────────
    let store: Arc<dyn BookingStore> = match std::env::var("MANOBAL_DB_PATH") {
        Ok(path) => {
            let store = LibSqlStore::new_local(std::path::Path::new(&path))
                .await
                .unwrap_or_else(|e| {
                    eprintln!("Error: Failed to open database at {}: {}", path, e);
                    std::process::exit(1);
                });
            eprintln!("   Database: {}", path);
            Arc::new(store)
        }
        Err(_) => {
            let store = LibSqlStore::new_memory().await?;
            eprintln!("   Database: in-memory (set MANOBAL_DB_PATH to persist)");
            Arc::new(store)
        }
    };

    // ── Directory ───────────────────────────────────────────────────────
    let directory: Arc<dyn ProfessionalDirectory> = match std::env::var("MANOBAL_DIRECTORY_URL") {
        Ok(url) => {
            eprintln!("   Directory: {}", url);
            Arc::new(RestDirectory::new(url))
        }
        Err(_) => {
            eprintln!("   Directory: built-in sample roster");
            Arc::new(MemoryDirectory::with_sample_data())
        }
    };

    // ── Notifications ───────────────────────────────────────────────────
    let notifier: Arc<dyn Notifier> = match NotifyConfig::from_env() {
        Some(config) => {
            eprintln!("   Email: enabled (SMTP: {})", config.smtp_host);
            match SmtpNotifier::new(config) {
                Ok(n) => Arc::new(n),
                Err(e) => {
                    eprintln!("   Warning: SMTP setup failed, emails disabled: {}", e);
                    Arc::new(NoopNotifier)
                }
            }
        }
        None => {
            eprintln!("   Email: disabled (set MANOBAL_SMTP_HOST to enable)");
            Arc::new(NoopNotifier)
        }
    };

    // ── Reminders ───────────────────────────────────────────────────────
    let reminder_config = ReminderConfig::from_env();
    if reminder_config.enabled {
        reminder_config.validate()?;
        eprintln!("   Reminders: enabled ({})", reminder_config.schedule);
        let sweeper = Arc::new(ReminderSweeper::new(
            Arc::clone(&store),
            Arc::clone(&notifier),
            reminder_config,
        ));
        let _reminder_handle = spawn_reminder_task(sweeper);
    } else {
        eprintln!("   Reminders: disabled");
    }

    // ── Wizard ──────────────────────────────────────────────────────────
    let wizard = BookingWizard::with_notifier(
        identity,
        Arc::clone(&directory),
        Arc::clone(&store),
        notifier,
        WizardConfig::from_env(),
    );

    // Event printer, so directory loads and submissions show up as they land
    let mut events = wizard.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => print_event(&event),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    eprintln!();
    print_help();
    eprintln!();
    print_status(&wizard).await;
    eprint!("> ");

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if line.is_empty() {
            eprint!("> ");
            continue;
        }
        let (command, arg) = match line.split_once(' ') {
            Some((c, a)) => (c, a.trim()),
            None => (line, ""),
        };

        match command {
            "quit" | "exit" => break,
            "help" => print_help(),
            "status" => print_status(&wizard).await,
            "issue" if !arg.is_empty() => wizard.toggle_issue(arg).await,
            "counsellor" => {
                wizard
                    .choose_professional_kind(ProfessionalKind::Counsellor)
                    .await;
            }
            "doctor" => {
                wizard
                    .choose_professional_kind(ProfessionalKind::Doctor)
                    .await;
            }
            "college" if !arg.is_empty() => wizard.select_college(arg).await,
            "colleges" => print_colleges(directory.as_ref()).await,
            "list" => print_roster(&wizard).await,
            "pick" if !arg.is_empty() => {
                if !wizard.select_professional(arg).await {
                    eprintln!("   Could not select '{}': unknown id or still loading", arg);
                }
            }
            "video" => wizard.choose_session_type(SessionType::Video).await,
            "audio" => wizard.choose_session_type(SessionType::Audio).await,
            "chat" => wizard.choose_session_type(SessionType::Chat).await,
            "slot" if !arg.is_empty() => match NaiveDateTime::parse_from_str(arg, "%Y-%m-%d %H:%M")
            {
                Ok(value) => {
                    if let Err(e) = wizard.pick_slot(value).await {
                        eprintln!("   {}", e);
                    }
                }
                Err(_) => eprintln!("   Usage: slot 2025-03-14 10:30"),
            },
            "name" if !arg.is_empty() => wizard.set_name(arg).await,
            "phone" if !arg.is_empty() => wizard.set_phone(arg).await,
            "therapy" if !arg.is_empty() => wizard.set_previous_therapy(arg).await,
            "medication" if !arg.is_empty() => wizard.set_current_medication(arg).await,
            "notes" if !arg.is_empty() => wizard.set_additional_notes(arg).await,
            "urgency" => match Urgency::from_str(arg) {
                Ok(urgency) => wizard.set_urgency(urgency).await,
                Err(_) => eprintln!("   Usage: urgency low|medium|high"),
            },
            "next" => {
                if !wizard.advance().await {
                    eprintln!("   Cannot continue yet, this step is incomplete");
                }
            }
            "back" => {
                if !wizard.retreat().await {
                    eprintln!("   Already at the first step");
                }
            }
            "submit" => match wizard.submit().await {
                Ok(record) => {
                    eprintln!("   Reference: {}", record.id);
                    eprintln!("   Type 'reset' to start another booking");
                }
                Err(e) => eprintln!("   {}", e),
            },
            "reset" => wizard.reset().await,
            _ => eprintln!("   Unknown command, 'help' lists them"),
        }

        eprint!("> ");
    }

    eprintln!("Bye!");
    Ok(())
}

fn print_help() {
    eprintln!("   Commands: issue <label> | counsellor | doctor | college <name> | colleges");
    eprintln!("             list | pick <id> | video | audio | chat | slot <YYYY-MM-DD HH:MM>");
    eprintln!("             name <text> | phone <text> | therapy <text> | medication <text>");
    eprintln!("             urgency low|medium|high | notes <text>");
    eprintln!("             next | back | status | submit | reset | quit");
}

fn print_event(event: &WizardEvent) {
    match event {
        WizardEvent::StepChanged { step } => {
            eprintln!(
                "📍 Step {}/{}: {}",
                step.index() + 1,
                Step::ALL.len(),
                step.info().title
            );
        }
        WizardEvent::DirectoryLoading { criteria } => eprintln!("⏳ Loading {}...", criteria),
        WizardEvent::DirectoryLoaded { count } => {
            eprintln!("✅ {} professionals available, 'list' to see them", count);
        }
        WizardEvent::DirectoryFailed { message } => eprintln!("❌ Directory: {}", message),
        WizardEvent::BookingSubmitted { booking_id } => {
            eprintln!("🎉 Booking confirmed: {}", booking_id);
        }
        WizardEvent::SubmissionFailed { message } => eprintln!("❌ Submission: {}", message),
        WizardEvent::DraftReset => eprintln!("ℹ️  Draft cleared"),
    }
}

async fn print_status(wizard: &BookingWizard) {
    let draft = wizard.draft().await;
    let roster = wizard.roster().await;
    let step = draft.step;

    eprintln!(
        "📍 Step {}/{}: {}",
        step.index() + 1,
        Step::ALL.len(),
        step.info().title
    );
    eprintln!("   {}", step.info().description);

    if !draft.issues.is_empty() {
        eprintln!("   Issues: {}", draft.issues.join(", "));
    }
    if let Some(kind) = draft.professional_kind {
        eprintln!("   Seeing: {}", kind);
    }
    if let Some(ref college) = draft.college {
        eprintln!("   College: {}", college);
    }
    if let Some(ref professional) = draft.professional {
        eprintln!(
            "   Professional: {} ({})",
            professional.name(),
            professional.affiliation()
        );
    }
    if let Some(session) = draft.session_type {
        eprintln!("   Session: {}, Rs. {}", session.label(), session.price());
    }
    if let Some(slot) = draft.slot {
        eprintln!("   Slot: {}", slot);
    }

    if roster.loading {
        eprintln!("   Directory: loading...");
    } else if let Some(ref error) = roster.error {
        eprintln!("   Directory: failed ({})", error);
    }

    if wizard.can_advance().await {
        eprintln!("   Ready, 'next' to continue");
    }
}

async fn print_roster(wizard: &BookingWizard) {
    let roster = wizard.roster().await;
    if roster.loading {
        eprintln!("   Still loading...");
        return;
    }
    if let Some(ref error) = roster.error {
        eprintln!("   Directory fetch failed: {}", error);
        return;
    }
    if roster.professionals.is_empty() {
        eprintln!("   Nobody to show yet: pick counsellor or doctor first (and a college)");
        return;
    }
    for p in &roster.professionals {
        eprintln!(
            "   [{}] {} ({}) ⭐ {:.1} ({} reviews)",
            p.id(),
            p.name(),
            p.affiliation(),
            p.rating(),
            p.review_count()
        );
    }
}

async fn print_colleges(directory: &dyn ProfessionalDirectory) {
    match directory.list_colleges().await {
        Ok(colleges) => {
            for college in &colleges {
                eprintln!("   {}", college.name);
            }
        }
        Err(e) => eprintln!("   Could not list colleges: {}", e),
    }
}
