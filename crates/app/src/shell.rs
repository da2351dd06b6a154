//! Interactive terminal loop for one quiz session.

use std::fmt;
use std::str::FromStr;

use quiz_core::model::{Question, QuizResult};
use services::{
    CompletionReason, QuizSession, Scheduler, SessionError, SessionEvent, SessionState,
    TimerFired, TimerKind,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Countdown values at which the remaining time is announced.
const ANNOUNCE_AT: [u32; 2] = [10, 5];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellCommand {
    Start,
    Select(usize),
    Next,
    Previous,
    /// Zero-based question index.
    Goto(usize),
    Submit,
    Retake,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommandError {
    Unknown(String),
    InvalidQuestion(String),
}

impl fmt::Display for ShellCommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(raw) => write!(f, "unknown command {raw:?} (type h for help)"),
            Self::InvalidQuestion(raw) => write!(f, "g expects a question number, got {raw:?}"),
        }
    }
}

impl std::error::Error for ShellCommandError {}

impl FromStr for ShellCommand {
    type Err = ShellCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut parts = trimmed.split_whitespace();
        let head = parts.next().unwrap_or_default().to_ascii_lowercase();
        let command = match head.as_str() {
            "start" => Self::Start,
            "a" | "b" | "c" | "d" => {
                let offset = head.as_bytes()[0] - b'a';
                Self::Select(usize::from(offset))
            }
            "n" | "next" => Self::Next,
            "p" | "prev" => Self::Previous,
            "g" | "go" => {
                let raw = parts.next().unwrap_or_default();
                let number: usize = raw
                    .parse()
                    .ok()
                    .filter(|n| *n >= 1)
                    .ok_or_else(|| ShellCommandError::InvalidQuestion(raw.to_owned()))?;
                Self::Goto(number - 1)
            }
            "s" | "submit" => Self::Submit,
            "r" | "retake" => Self::Retake,
            "h" | "help" | "?" => Self::Help,
            "q" | "quit" => Self::Quit,
            _ => return Err(ShellCommandError::Unknown(trimmed.to_owned())),
        };
        Ok(command)
    }
}

fn print_help() {
    println!("Commands:");
    println!("  start      begin the quiz");
    println!("  a-d        pick an option for the current question");
    println!("  n / p      next / previous question");
    println!("  g <n>      jump to question n");
    println!("  s          submit");
    println!("  r          retake after finishing");
    println!("  q          quit");
}

/// Apply one command to the session.
///
/// # Errors
///
/// Returns the session's rejection; none of them end the shell.
pub fn apply<S: Scheduler>(
    session: &mut QuizSession<S>,
    command: ShellCommand,
) -> Result<(), SessionError> {
    match command {
        ShellCommand::Start => session.start(),
        ShellCommand::Select(option) => {
            let index = session.current_index();
            let label = session
                .current_question()
                .and_then(|q| q.options().get(option))
                .cloned()
                .ok_or_else(|| SessionError::UnknownOption {
                    index,
                    option: Question::option_label(option)
                        .map_or_else(|| format!("option {}", option + 1), String::from),
                })?;
            session.select_answer(index, &label)?;
            println!("Selected {label}");
            Ok(())
        }
        ShellCommand::Next => session.next_question(),
        ShellCommand::Previous => session.previous_question(),
        ShellCommand::Goto(index) => session.go_to_question(index),
        ShellCommand::Submit => session.submit().map(|_| ()),
        ShellCommand::Retake => session.retake(),
        ShellCommand::Help => {
            print_help();
            Ok(())
        }
        ShellCommand::Quit => Ok(()),
    }
}

//
// ─── RENDERING ────────────────────────────────────────────────────────────────
//

fn render_preview<S: Scheduler>(session: &QuizSession<S>) {
    let quiz = session.quiz();
    println!();
    println!("== {} ==", quiz.title());
    let details = quiz.details();
    if !details.summary.is_empty() {
        println!("{}", details.summary);
    }
    if !details.key_entities.people.is_empty() {
        println!("People: {}", details.key_entities.people.join(", "));
    }
    if !details.sections.is_empty() {
        println!("Sections: {}", details.sections.join(", "));
    }
    println!(
        "{} questions, {} seconds each. Type `start` to begin.",
        quiz.len(),
        session.settings().seconds_per_question
    );
}

fn render_question<S: Scheduler>(session: &QuizSession<S>, index: usize) {
    let Some(question) = session.quiz().question(index) else {
        return;
    };
    println!();
    println!(
        "Question {}/{} [{}] ({}s)",
        index + 1,
        session.quiz().len(),
        question.difficulty(),
        session.time_left()
    );
    println!("{}", question.text());
    for (i, option) in question.options().iter().enumerate() {
        let marker = if session.selected(index) == Some(option.as_str()) {
            '*'
        } else {
            ' '
        };
        let label = Question::option_label(i).unwrap_or('?');
        println!(" {marker}{label}) {option}");
    }
}

fn render_result<S: Scheduler>(
    session: &QuizSession<S>,
    result: &QuizResult,
    reason: CompletionReason,
) {
    println!();
    if reason == CompletionReason::TimeExpired {
        println!("Time is up!");
    }
    println!(
        "Score: {}/{} ({}%) in {}",
        result.correct_answers,
        result.total_questions,
        result.score,
        format_duration(result.time_taken)
    );
    println!("{}", result.tier().message());

    for (i, question) in session.quiz().questions().iter().enumerate() {
        let verdict = match session.is_correct(i) {
            Some(true) => "correct",
            _ => "wrong",
        };
        let picked = session.selected(i).unwrap_or("(no answer)");
        println!("{}. {} [{verdict}]", i + 1, question.text());
        println!("   your answer: {picked}; answer: {}", question.answer());
        if !question.explanation().is_empty() {
            println!("   {}", question.explanation());
        }
    }
    println!("Type `r` to retake or `q` to quit.");
}

fn render_events<S: Scheduler>(session: &mut QuizSession<S>) {
    for event in session.drain_events() {
        match event {
            SessionEvent::Started => {}
            SessionEvent::QuestionChanged { index } => render_question(session, index),
            SessionEvent::QuestionExpired { index } => {
                println!("Time is up for question {}.", index + 1);
            }
            SessionEvent::Completed {
                result,
                reason,
                ranked,
            } => {
                render_result(session, &result, reason);
                if ranked {
                    println!("New leaderboard entry!");
                }
            }
            SessionEvent::Celebrate { percent } => println!("*** {percent}%! Excellent! ***"),
            SessionEvent::PersistenceWarning(warning) => eprintln!("warning: {warning}"),
        }
    }
}

/// `m:ss` for a number of seconds.
#[must_use]
pub fn format_duration(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Drive `session` from stdin and its timer channel until the user quits
/// or input ends.
///
/// # Errors
///
/// Returns an error if stdin cannot be read.
pub async fn run<S: Scheduler>(
    mut session: QuizSession<S>,
    mut timers: mpsc::UnboundedReceiver<TimerFired>,
) -> Result<(), std::io::Error> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    render_preview(&session);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<ShellCommand>() {
                    Ok(ShellCommand::Quit) => break,
                    Ok(command) => {
                        if let Err(e) = apply(&mut session, command) {
                            println!("{e}");
                        }
                    }
                    Err(e) => println!("{e}"),
                }
            }
            Some(fired) = timers.recv() => {
                session.on_timer(fired);
                let left = session.time_left();
                if fired.kind == TimerKind::Tick
                    && session.state() == SessionState::InProgress
                    && ANNOUNCE_AT.contains(&left)
                {
                    println!("{left}s left");
                }
            }
        }
        render_events(&mut session);
    }

    if session.state() == SessionState::InProgress {
        log::info!("leaving quiz {:?} unsubmitted", session.quiz().title());
        session.abandon();
    }
    Ok(())
}
