//! Line-oriented screens for each subcommand.

use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use prep_core::model::{ActionTarget, DisasterType, Level, ModuleKey, Needs, SuggestedAction};
use prep_core::time::format_elapsed;
use services::{AppServices, QuizAdvance, ReplySource};

type ConsoleResult = Result<(), Box<dyn std::error::Error>>;

/// `None` on end of input.
fn prompt(label: &str) -> io::Result<Option<String>> {
    print!("{label} ");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn describe(action: &SuggestedAction) -> String {
    let hint = match &action.target {
        ActionTarget::OpenModule(key) => format!("prep module {key}"),
        ActionTarget::StartDrill(kind) => format!("prep drill {kind}"),
        ActionTarget::EmergencyContacts => "prep contacts".to_string(),
        ActionTarget::WebSearch(url) => url.to_string(),
    };
    format!("{} -> {hint}", action.label)
}

pub async fn stats(services: &AppServices) -> ConsoleResult {
    let stats = services.learning().stats().await?;
    println!("Modules completed:  {}", stats.modules_completed);
    println!("Average quiz score: {}%", stats.average_quiz_score);
    println!("Drills completed:   {}", stats.drills_completed);

    println!();
    for status in services.quiz().levels().await? {
        let state = match (status.unlocked, status.score) {
            (false, _) => "locked".to_string(),
            (true, None) => "not attempted".to_string(),
            (true, Some(score)) => format!("best {score}%"),
        };
        println!("Level {}: {state}", status.level);
    }
    Ok(())
}

pub async fn quiz(services: &AppServices, level: Level) -> ConsoleResult {
    let quiz = services.quiz();
    let mut session = quiz.start_quiz(level).await?;
    let mut view = session.view();

    while let Some(question) = view.take() {
        println!();
        println!("Question {}/{}: {}", question.number, question.total, question.prompt);
        for (i, option) in question.options.iter().enumerate() {
            println!("  {}. {option}", i + 1);
        }

        let feedback = loop {
            let Some(line) = prompt("Your answer:")? else {
                println!("Quiz abandoned; nothing was saved.");
                return Ok(());
            };
            let Some(choice) = line.parse::<usize>().ok().and_then(|n| n.checked_sub(1)) else {
                println!("Enter an option number.");
                continue;
            };
            match quiz.answer(&mut session, choice) {
                Ok(feedback) => break feedback,
                Err(err) => println!("{err}"),
            }
        };

        if feedback.is_correct {
            println!("Correct!");
        } else {
            println!(
                "Not quite. The answer is: {}",
                question.options[feedback.correct_option]
            );
        }

        match quiz.advance(&mut session).await? {
            QuizAdvance::Next(next) => view = Some(next),
            QuizAdvance::Finished(result) => {
                let outcome = result.outcome;
                println!();
                println!(
                    "Score: {}/{} ({}%) {}",
                    outcome.correct,
                    outcome.total,
                    outcome.percent,
                    if outcome.passed { "Passed!" } else { "Try Again" }
                );
                if result.unlocked_level > outcome.level {
                    println!("Level {} is unlocked.", result.unlocked_level);
                }
            }
        }
    }
    Ok(())
}

pub async fn drill(services: &AppServices, disaster: DisasterType) -> ConsoleResult {
    let drills = services.drills();
    let elapsed = Arc::new(Mutex::new(Duration::ZERO));
    let shown = Arc::clone(&elapsed);
    let mut session = drills.start_with_ticker(disaster, move |now| {
        *shown.lock().unwrap_or_else(PoisonError::into_inner) = now;
    });

    println!("{}", disaster.drill_title());
    loop {
        println!();
        for (i, step) in session.steps().iter().enumerate() {
            let mark = if step.done { "x" } else { " " };
            println!("  [{mark}] {}. {}", i + 1, step.label);
        }

        let clock = format_elapsed(*elapsed.lock().unwrap_or_else(PoisonError::into_inner));
        let Some(line) = prompt(&format!("[{clock}] step number, 'done' or 'quit':"))? else {
            drills.cancel(session);
            return Ok(());
        };

        match line.as_str() {
            "quit" => {
                drills.cancel(session);
                println!("Drill cancelled.");
                return Ok(());
            }
            "done" => match drills.complete(&mut session).await {
                Ok(outcome) => {
                    println!(
                        "Drill complete in {}. Drills completed: {}",
                        format_elapsed(outcome.elapsed),
                        outcome.drills_completed
                    );
                    return Ok(());
                }
                Err(err) => println!("{err}"),
            },
            raw => match raw.parse::<usize>().ok().and_then(|n| n.checked_sub(1)) {
                Some(index) => {
                    if let Err(err) = session.toggle_step(index) {
                        println!("{err}");
                    }
                }
                None => println!("Enter a step number, 'done' or 'quit'."),
            },
        }
    }
}

pub async fn ask(services: &AppServices, text: String) {
    let assistant = services.assistant();
    if assistant.is_remote_enabled() {
        println!("Thinking...");
    }
    let Some(reply) = assistant.submit(text).wait().await else {
        println!("No reply.");
        return;
    };

    if let Some(notice) = reply.notice {
        println!("({notice})");
    }
    println!("{}", reply.text);
    if let Some(action) = &reply.action {
        println!("  {}", describe(action));
    }
    if reply.source == ReplySource::Remote {
        println!("  (answered online)");
    }
}

pub async fn module(services: &AppServices, key: ModuleKey, complete: bool) -> ConsoleResult {
    let learning = services.learning();
    let module = learning.module(key);
    println!("{}", module.title);
    println!("{}", module.summary);
    for section in module.sections {
        println!();
        println!("{}", section.heading);
        for item in section.items {
            println!("  - {item}");
        }
    }

    if complete {
        let done = learning.complete_module(key).await?;
        println!();
        println!("Marked as completed ({done} modules done).");
    }
    Ok(())
}

pub fn contacts(services: &AppServices, region: Option<&str>) {
    let learning = services.learning();
    println!("National helplines:");
    for contact in learning.national_helplines() {
        println!("  {:<20} {}", contact.name, contact.number);
    }

    let Some(region) = region else {
        return;
    };
    println!();
    let regional = learning.contacts(region);
    if regional.is_empty() {
        println!("No regional contacts for {region}.");
    }
    for contact in regional {
        println!("  {:<20} {}", contact.name, contact.number);
    }
}

pub async fn profile(services: &AppServices, needs: Option<Needs>) -> ConsoleResult {
    let learning = services.learning();
    let profile = match needs {
        Some(needs) => learning.save_profile(needs).await?,
        None => learning.profile().await?,
    };
    println!("Needs: {}", profile.needs);
    println!("SOS message: {}", profile.needs.alert_message());
    Ok(())
}
