//! An interactive trip planner for the terminal.

#[macro_use]
extern crate tracing;

use std::fmt::Display;
use std::io::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use itinera::core::conversation::Role;
use itinera::core::persistence::export_file_name;
use itinera::core::trip::TripForm;
use itinera::core::{
    Edition, PendingTurn, PlannerSession, SessionError, TurnKind,
};
use itinera::render::{
    BAR_CHAR, feedback_reply, heading, help_text, render_quick_actions,
    render_saved, render_stats, render_transcript,
};
use itinera::{Command, Config, FormCollector, config};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::select;
use tokio::time::sleep;

type Input = Lines<BufReader<Stdin>>;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env();
    debug!("starting with {config:?}");
    let mut session = config.session_builder().build();
    let edition = session.edition();

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .map(|style| style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"))
        .unwrap_or_else(|_| ProgressStyle::default_spinner());

    let mut input = BufReader::new(io::stdin()).lines();

    println!("{}", "AI Tour Planner".bright_white().bold());
    if !session.is_configured() {
        print_error(format!(
            "Gemini API key not found. Please set the {} environment \
             variable.",
            config::API_KEY_VAR
        ));
    }
    println!("{}\n", render_transcript(&[], edition, true));
    println!("{}", help_text(edition));

    loop {
        print!("\n> ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line(&mut input).await else {
            break;
        };
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(err) => {
                print_warning(err);
                continue;
            }
        };

        let turn = match command {
            Command::Empty => continue,
            Command::Quit => break,
            Command::Help => {
                println!("{}", help_text(edition));
                continue;
            }
            Command::Plan => {
                let form = collect_form(&mut input, edition).await;
                let Some(form) = form else {
                    break;
                };
                session.plan(&form)
            }
            Command::Ask(message) => session.ask(&message),
            Command::Quick(None) => {
                if edition.is_pro() {
                    println!("{}", render_quick_actions());
                } else {
                    print_warning(SessionError::Unsupported("quick actions"));
                }
                continue;
            }
            Command::Quick(Some(index)) => session.quick_action(index),
            Command::Clear => {
                session.clear();
                redraw(&session);
                continue;
            }
            Command::Save => {
                match session.save() {
                    Ok(index) => print_success(format!(
                        "Itinerary saved as #{}.",
                        index + 1
                    )),
                    Err(err) => print_warning(err),
                }
                continue;
            }
            Command::Saved => {
                match session.saved() {
                    Ok(saved) => println!("{}", render_saved(saved)),
                    Err(err) => print_warning(err),
                }
                continue;
            }
            Command::Load(index) => {
                match session.load(index) {
                    Ok(()) => redraw(&session),
                    Err(err) => print_warning(err),
                }
                continue;
            }
            Command::Feedback(feedback) => {
                let records = session.conversation().records();
                match feedback_reply(records, feedback) {
                    Some(reply) => {
                        info!("got feedback on the latest reply: {feedback:?}");
                        print_success(reply);
                    }
                    None => print_warning("There is no reply to rate yet."),
                }
                continue;
            }
            Command::Export(path) => {
                export(&session, path).await;
                continue;
            }
            Command::Stats => {
                match session.stats() {
                    Ok(stats) => println!(
                        "{}",
                        render_stats(stats, session.conversation().len())
                    ),
                    Err(err) => print_warning(err),
                }
                continue;
            }
        };

        match turn {
            Ok(turn) => {
                if run_turn(&mut session, turn, &progress_style).await {
                    redraw(&session);
                }
            }
            Err(SessionError::Unconfigured) => print_error(format!(
                "Cannot process your request. The {} environment variable \
                 is not set.",
                config::API_KEY_VAR
            )),
            Err(err) => print_warning(err),
        }
    }
}

/// Streams a turn to the terminal and commits it, returning `true` if
/// the conversation changed.
async fn run_turn(
    session: &mut PlannerSession,
    mut turn: PendingTurn,
    progress_style: &ProgressStyle,
) -> bool {
    println!("\n{}", heading(Role::User, true));
    println!("{}\n", turn.display());
    println!("{}", heading(Role::Model, true));

    let mut progress_bar = Some({
        let progress_bar = ProgressBar::new_spinner();
        progress_bar.set_style(progress_style.clone());
        progress_bar.set_message(match turn.kind() {
            TurnKind::Itinerary(_) => "Crafting your itinerary...",
            TurnKind::FollowUp => "Processing your request...",
        });
        progress_bar
    });

    loop {
        let fragment = match &progress_bar {
            Some(progress_bar) => {
                progress_bar.inc(1);
                select! {
                    fragment = turn.next() => fragment,
                    _ = sleep(Duration::from_millis(100)) => continue,
                }
            }
            None => turn.next().await,
        };

        // Finish the progress bar before printing anything else.
        if let Some(progress_bar) = progress_bar.take() {
            progress_bar.finish_and_clear();
        }

        let Some(fragment) = fragment else {
            break;
        };
        print!("{}", fragment.bright_white());
        std::io::stdout().flush().ok();
    }
    println!();

    match session.finish(turn) {
        Ok(()) => true,
        Err(err) => {
            debug!("turn not committed: {err}");
            print_warning("This reply was not added to the conversation.");
            false
        }
    }
}

async fn collect_form(
    input: &mut Input,
    edition: Edition,
) -> Option<TripForm> {
    let mut collector = FormCollector::new(edition);
    while let Some(question) = collector.question() {
        println!("\n{question}");
        print!("? ");
        std::io::stdout().flush().ok();

        let line = read_line(input).await?;
        if let Err(err) = collector.answer(&line) {
            print_warning(err);
        }
    }
    Some(collector.finish())
}

async fn export(session: &PlannerSession, path: Option<PathBuf>) {
    let json = match session.export() {
        Ok(json) => json,
        Err(err) => {
            print_warning(err);
            return;
        }
    };
    let path = path.unwrap_or_else(|| {
        PathBuf::from(export_file_name(Local::now().naive_local()))
    });
    match tokio::fs::write(&path, json).await {
        Ok(()) => print_success(format!("Exported to {}.", path.display())),
        Err(err) => {
            error!("error writing {}: {err}", path.display());
            print_error(format!("Could not write {}: {err}", path.display()));
        }
    }
}

fn redraw(session: &PlannerSession) {
    // Clear the screen and move the cursor home.
    print!("\x1b[2J\x1b[H");
    let records = session.conversation().records();
    println!("{}", render_transcript(records, session.edition(), true));
}

async fn read_line(input: &mut Input) -> Option<String> {
    match input.next_line().await {
        Ok(line) => line,
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}

fn print_success(message: impl Display) {
    println!("{}{}", BAR_CHAR.bright_green(), message.bright_green());
}

fn print_warning(message: impl Display) {
    println!("{}{}", BAR_CHAR.bright_yellow(), message.bright_yellow());
}

fn print_error(message: impl Display) {
    println!("{}{}", BAR_CHAR.bright_red(), message.bright_red());
}
