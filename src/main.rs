use anyhow::Context;
use chrono::Local;
use clap::Parser;

use agronova::config::{self, Config};
use agronova::credentials::CredentialResolver;
use agronova::log::{self, SessionArtifacts, TurnRecord};
use agronova::orchestrator::Orchestrator;
use agronova::session::{parse_command, Command, Session};
use agronova::{attachment, cli, prompt, provider, settings, ux};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Keys may come from a local .env file, as in the hosted deployment.
    let _ = dotenvy::dotenv();

    let args = cli::Args::parse();
    log::init_tracing(args.debug);

    let mut cfg = Config::load_or_default(args.config.as_deref())?;
    args.apply_to(&mut cfg);

    let initial = match &args.settings {
        Some(p) => config::load_settings(p)?,
        None => settings::initialize(None),
    };

    let orchestrator = Orchestrator::new(
        provider::make_provider(&cfg)?,
        CredentialResolver::from_config(&cfg)?,
        cfg.model(),
        cfg.vision_model(),
    );

    let mut session = Session::new(initial);
    let mut artifacts = args
        .save_transcript
        .then(|| SessionArtifacts::new(&cfg.session_root(), session.id));

    if let Some(path) = &args.image {
        session.pending_image = Some(attachment::load_image(path, cfg.max_image_bytes)?);
    }

    if let Some(q) = &args.query {
        send(&orchestrator, &mut session, q, artifacts.as_mut()).await;
        finish(&session, artifacts.as_ref())?;
        return Ok(());
    }

    ux::print_banner(&session.settings);
    while let Some(line) = ux::read_line("> ") {
        let cmd = match parse_command(&line) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };

        match cmd {
            Command::Empty => {}
            Command::Quit => break,
            Command::Help => ux::print_help(),
            Command::Ask(q) => send(&orchestrator, &mut session, &q, artifacts.as_mut()).await,
            Command::Pick(i) => {
                let prompts = prompt::personalized_prompts(&session.settings);
                match prompts.get(i) {
                    Some(q) => send(&orchestrator, &mut session, q, artifacts.as_mut()).await,
                    None => eprintln!("there are only {} suggestions", prompts.len()),
                }
            }
            Command::Tips => {
                let q = prompt::tips_prompt(&session.settings);
                send(&orchestrator, &mut session, &q, artifacts.as_mut()).await;
            }
            Command::History => ux::print_history(&session.transcript),
            Command::Delete(i) => {
                let Some(abs) = session.transcript.displayed_to_absolute(i) else {
                    eprintln!("no history entry {}", i + 1);
                    continue;
                };
                let query = session.transcript.turns()[abs].query.clone();
                if ux::confirm(&format!("Delete \"{query}\"?")) {
                    session.transcript.remove_at(abs);
                }
            }
            Command::Image(path) => match attachment::load_image(&path, cfg.max_image_bytes) {
                Ok(img) => {
                    println!("attached {} for the next question", img.file_name);
                    session.pending_image = Some(img);
                }
                Err(e) => eprintln!("{e}"),
            },
            Command::Set { key, value } => match settings::field_update(&key, &value) {
                Some(fields) => {
                    session.settings = session.settings.update(&fields);
                    println!("saved {key}");
                }
                None => eprintln!("unknown setting '{key}'"),
            },
            Command::Profile => ux::print_profile(&session.settings, Local::now().date_naive()),
            Command::Prompts => ux::print_prompts(&prompt::personalized_prompts(&session.settings)),
        }
    }

    finish(&session, artifacts.as_ref())
}

/// Ask one question, render the answer (or the error) and record artifacts.
/// Nothing here ends the session.
async fn send(
    orchestrator: &Orchestrator,
    session: &mut Session,
    query: &str,
    artifacts: Option<&mut SessionArtifacts>,
) {
    let image = session.pending_image.take();
    let spinner = ux::spinner(if image.is_some() { "Analyzing..." } else { "Thinking..." });
    let outcome = orchestrator
        .ask(&mut session.transcript, query, image.as_ref(), &session.settings)
        .await;
    spinner.finish_and_clear();

    match &outcome {
        Ok(_) => {
            if let Some(turn) = session.transcript.last() {
                ux::print_turn(turn);
            }
        }
        Err(e) => ux::print_error(e),
    }

    if let Some(artifacts) = artifacts {
        let full_prompt = prompt::build_prompt(&session.settings, query);
        let record = TurnRecord::new(
            session.id,
            orchestrator.provider_name(),
            orchestrator.model_for(image.is_some()),
            &full_prompt,
            &outcome,
        );
        artifacts.record_turn(&record);
    }
}

fn finish(session: &Session, artifacts: Option<&SessionArtifacts>) -> anyhow::Result<()> {
    if let Some(artifacts) = artifacts {
        let path = artifacts
            .save_transcript(&session.transcript)
            .with_context(|| format!("saving transcript under {}", artifacts.dir().display()))?;
        println!("transcript saved to {}", path.display());
    }
    Ok(())
}
