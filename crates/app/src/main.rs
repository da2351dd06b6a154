use std::fmt;
use std::path::PathBuf;

use quiz_core::model::{
    DifficultyFilter, GenerateQuizRequest, Quiz, QuizDocument, QuizId, SortDirection, TopicSort,
};
use services::{AppServices, BackendConfig, Clock, backend::DEFAULT_BASE_URL};

mod scheduler;
mod shell;

use scheduler::TokioScheduler;

const DEFAULT_DATA_DIR: &str = "./quiz-data";

#[derive(Debug, PartialEq, Eq)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    MissingSource,
    ConflictingSource,
    InvalidDifficulty { raw: String },
    InvalidQuizId { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::MissingSource => f.write_str("play needs one of --url, --file or --id"),
            ArgsError::ConflictingSource => {
                f.write_str("--url, --file and --id cannot be combined")
            }
            ArgsError::InvalidDifficulty { raw } => {
                write!(f, "invalid --difficulty value: {raw} (all, easy, medium, hard)")
            }
            ArgsError::InvalidQuizId { raw } => write!(f, "invalid --id value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  app play --url <wikipedia_url> [--difficulty all|easy|medium|hard]");
    eprintln!("  app play --file <quiz.json>");
    eprintln!("  app play --id <remote_quiz_id>");
    eprintln!("  app history | stats | leaderboard | achievements | remote-history");
    eprintln!();
    eprintln!("Options for every command:");
    eprintln!("  --api <base_url>      default {DEFAULT_BASE_URL}");
    eprintln!("  --data-dir <dir>      default {DEFAULT_DATA_DIR}");
    eprintln!("  --player <name>       name used on the leaderboard");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_API_BASE_URL, QUIZ_DATA_DIR, QUIZ_PLAYER_NAME, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    History,
    Stats,
    Leaderboard,
    Achievements,
    RemoteHistory,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "history" => Some(Self::History),
            "stats" => Some(Self::Stats),
            "leaderboard" => Some(Self::Leaderboard),
            "achievements" => Some(Self::Achievements),
            "remote-history" => Some(Self::RemoteHistory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum QuizSource {
    Url(String),
    File(PathBuf),
    Remote(QuizId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Args {
    command: Command,
    api_base_url: String,
    data_dir: PathBuf,
    player: Option<String>,
    source: Option<QuizSource>,
    difficulty: DifficultyFilter,
}

impl Args {
    /// Parse flags after the subcommand. `env` supplies defaults the flags override.
    fn parse(
        command: Command,
        args: &mut impl Iterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let non_blank = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        let mut api_base_url =
            non_blank("QUIZ_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let mut data_dir =
            PathBuf::from(non_blank("QUIZ_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.into()));
        let mut player = non_blank("QUIZ_PLAYER_NAME");
        let mut source = None;
        let mut difficulty = DifficultyFilter::All;

        let mut set_source = |next: QuizSource| {
            if source.replace(next).is_some() {
                return Err(ArgsError::ConflictingSource);
            }
            Ok(())
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--api" => api_base_url = require_value(args, "--api")?,
                "--data-dir" => data_dir = PathBuf::from(require_value(args, "--data-dir")?),
                "--player" => player = Some(require_value(args, "--player")?),
                "--url" if command == Command::Play => {
                    set_source(QuizSource::Url(require_value(args, "--url")?))?;
                }
                "--file" if command == Command::Play => {
                    set_source(QuizSource::File(PathBuf::from(require_value(args, "--file")?)))?;
                }
                "--id" if command == Command::Play => {
                    let raw = require_value(args, "--id")?;
                    let id = raw
                        .parse::<QuizId>()
                        .map_err(|_| ArgsError::InvalidQuizId { raw: raw.clone() })?;
                    set_source(QuizSource::Remote(id))?;
                }
                "--difficulty" if command == Command::Play => {
                    let raw = require_value(args, "--difficulty")?;
                    difficulty = raw
                        .parse()
                        .map_err(|_| ArgsError::InvalidDifficulty { raw: raw.clone() })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if command == Command::Play && source.is_none() {
            return Err(ArgsError::MissingSource);
        }

        Ok(Self {
            command,
            api_base_url,
            data_dir,
            player,
            source,
            difficulty,
        })
    }
}

async fn load_quiz(
    services: &AppServices,
    source: &QuizSource,
    difficulty: DifficultyFilter,
) -> Result<Quiz, Box<dyn std::error::Error>> {
    match source {
        QuizSource::Url(url) => {
            let request = GenerateQuizRequest::new(url)?.with_difficulty(difficulty);
            println!("Generating quiz from {} ...", request.url());
            Ok(services.backend().generate_quiz(&request).await?)
        }
        QuizSource::File(path) => {
            let raw = tokio::fs::read_to_string(path).await?;
            let document: QuizDocument = serde_json::from_str(&raw)?;
            Ok(Quiz::try_from(document)?)
        }
        QuizSource::Remote(id) => Ok(services.backend().fetch_quiz(*id).await?),
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    let command = match argv.next() {
        None => {
            print_usage();
            return Ok(());
        }
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let args = Args::parse(command, &mut argv, |key| std::env::var(key).ok()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    log::debug!("parsed arguments: {args:?}");

    let services = AppServices::new_file(
        &args.data_dir,
        BackendConfig::new(&args.api_base_url),
        args.player.clone(),
        Clock::default_clock(),
    )?;
    let history = services.history();

    match args.command {
        Command::Play => {
            let Some(source) = &args.source else {
                return Err(ArgsError::MissingSource.into());
            };
            let quiz = load_quiz(&services, source, args.difficulty).await?;
            let (scheduler, timers) = TokioScheduler::channel();
            let session = services.new_session(quiz, scheduler);
            shell::run(session, timers).await?;
        }
        Command::History => {
            let results = history.list_history()?;
            if results.is_empty() {
                println!("No quizzes taken yet.");
            }
            for r in results.iter().rev() {
                println!(
                    "{}  {:<40} {:>3}%  {}/{}  {}",
                    r.date.format("%Y-%m-%d %H:%M"),
                    r.title,
                    r.score,
                    r.correct_answers,
                    r.total_questions,
                    shell::format_duration(r.time_taken)
                );
            }
        }
        Command::Stats => {
            let stats = history.get_stats()?;
            println!("Quizzes taken:  {}", stats.total_quizzes);
            println!("Average score:  {}%", stats.average_score);
            println!("Best topic:     {}%", stats.best_score());
            println!("Time spent:     {}", shell::format_duration(stats.total_time));
            for topic in stats.sorted_topics(TopicSort::Quizzes, SortDirection::Descending) {
                println!(
                    "  {:<40} {:>3} quiz(zes)  {:>3}%",
                    topic.name, topic.quizzes, topic.average_score
                );
            }
        }
        Command::Leaderboard => {
            let board = history.leaderboard()?;
            if board.entries().is_empty() {
                println!("No leaderboard entries yet. Score 85% or more to get on the board.");
            }
            for (rank, entry) in board.entries().iter().enumerate() {
                println!("{:>2}. {:<20} {:>3}%", rank + 1, entry.name, entry.score);
            }
        }
        Command::Achievements => {
            for status in history.achievements()? {
                let mark = if status.unlocked { 'x' } else { ' ' };
                println!(
                    "[{mark}] {:<16} {}",
                    status.achievement.title(),
                    status.achievement.description()
                );
            }
        }
        Command::RemoteHistory => {
            let quizzes = services.backend().list_history().await?;
            if quizzes.is_empty() {
                println!("The server has no stored quizzes.");
            }
            for quiz in quizzes {
                let date = quiz
                    .date_generated
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                println!("{:>5}  {:<10} {}  {}", quiz.id, date, quiz.title, quiz.url);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::Difficulty;

    fn parse(command: Command, argv: &[&str], env: &[(&str, &str)]) -> Result<Args, ArgsError> {
        let mut iter = argv.iter().map(|s| (*s).to_owned());
        Args::parse(command, &mut iter, |key| {
            env.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_owned())
        })
    }

    #[test]
    fn defaults_apply_without_flags() {
        let args = parse(Command::Stats, &[], &[]).unwrap();
        assert_eq!(args.api_base_url, DEFAULT_BASE_URL);
        assert_eq!(args.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(args.player, None);
    }

    #[test]
    fn flags_override_environment() {
        let env = [
            ("QUIZ_API_BASE_URL", "http://env/api"),
            ("QUIZ_PLAYER_NAME", "Env"),
            ("QUIZ_DATA_DIR", " "),
        ];
        let args = parse(Command::History, &["--player", "Flag"], &env).unwrap();
        assert_eq!(args.api_base_url, "http://env/api");
        assert_eq!(args.player.as_deref(), Some("Flag"));
        assert_eq!(args.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
    }

    #[test]
    fn play_requires_exactly_one_source() {
        assert_eq!(parse(Command::Play, &[], &[]), Err(ArgsError::MissingSource));
        assert_eq!(
            parse(Command::Play, &["--url", "u", "--file", "f"], &[]),
            Err(ArgsError::ConflictingSource)
        );

        let args = parse(
            Command::Play,
            &["--url", "https://en.wikipedia.org/wiki/Rust", "--difficulty", "Hard"],
            &[],
        )
        .unwrap();
        assert_eq!(args.difficulty, DifficultyFilter::Only(Difficulty::Hard));
        assert_eq!(
            args.source,
            Some(QuizSource::Url("https://en.wikipedia.org/wiki/Rust".into()))
        );

        let args = parse(Command::Play, &["--id", "42"], &[]).unwrap();
        assert_eq!(args.source, Some(QuizSource::Remote(QuizId::new(42))));
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(
            parse(Command::Play, &["--url"], &[]),
            Err(ArgsError::MissingValue { flag: "--url" })
        );
        assert_eq!(
            parse(Command::Play, &["--file", "q.json", "--difficulty", "brutal"], &[]),
            Err(ArgsError::InvalidDifficulty {
                raw: "brutal".into()
            })
        );
        assert_eq!(
            parse(Command::Stats, &["--url", "x"], &[]),
            Err(ArgsError::UnknownArg("--url".into()))
        );
    }
}
