use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, info};
use shared::{Capability, Role, StatisticsResponse};
use student_records_backend::{AppConfig, Backend, Session, Student};

/// Environment variable holding the sign-in secret when `--secret` is omitted
const SECRET_ENV_VAR: &str = "STUDENT_RECORDS_SECRET";

#[derive(Parser)]
#[command(
    name = "student-records",
    about = "Record student enrollments and completed subjects",
    author,
    version
)]
struct Cli {
    /// YAML configuration file (defaults to $STUDENT_RECORDS_CONFIG, then built-in defaults)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the data file from the configuration
    #[arg(long, global = true, value_name = "PATH")]
    data_file: Option<PathBuf>,

    /// Do not copy the data file into the backup directory before saving
    #[arg(long, global = true)]
    no_backup: bool,

    /// Username to sign in with
    #[arg(long, short = 'u', global = true)]
    user: Option<String>,

    /// Role to sign in as (admin, teacher, viewer)
    #[arg(long, short = 'r', global = true)]
    role: Option<Role>,

    /// Sign-in secret; falls back to $STUDENT_RECORDS_SECRET
    #[arg(long, global = true, hide = true)]
    secret: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a new student
    Add {
        id: String,
        /// Student name; may span several words
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
        /// Subject to enroll in straight away (repeatable)
        #[arg(long = "enroll", value_name = "SUBJECT")]
        enroll: Vec<String>,
    },
    /// Remove a student
    Remove { id: String },
    /// Show one student's details
    Search { id: String },
    /// Enroll a student in a subject
    Enroll { id: String, subject: String },
    /// Mark an enrolled subject as completed
    Complete {
        id: String,
        subject: String,
        #[arg(allow_hyphen_values = true)]
        mark: i64,
    },
    /// List all students
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show enrollment and completion statistics
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Undo the last change made in this session
    Undo,
    /// Read commands from stdin against one live store (undo spans the session)
    Shell,
}

/// One line typed at the shell prompt
#[derive(Parser)]
#[command(no_binary_name = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(data_file) = cli.data_file.clone() {
        config.data_file = data_file;
    }
    if cli.no_backup {
        config.backups.enabled = false;
    }
    debug!("Using data file {}", config.data_file.display());

    let mut backend = Backend::new(&config)?;
    let session = sign_in(&backend, &cli)?;
    info!("Session started for {} ({})", session.username, session.role);

    for skipped in backend.student_manager.skipped_on_load() {
        eprintln!(
            "Warning: skipped invalid record on line {}: {}",
            skipped.line_number, skipped.reason
        );
    }

    match cli.command {
        Commands::Shell => run_shell(&mut backend, &session),
        command => run_command(&mut backend, &session, command),
    }
}

fn sign_in(backend: &Backend, cli: &Cli) -> Result<Session> {
    let username = cli
        .user
        .as_deref()
        .ok_or_else(|| anyhow!("Sign in with --user and --role"))?;
    let role = cli
        .role
        .ok_or_else(|| anyhow!("Sign in with --user and --role"))?;
    let secret = match &cli.secret {
        Some(secret) => secret.clone(),
        None => std::env::var(SECRET_ENV_VAR)
            .with_context(|| format!("No secret given; set {} or pass --secret", SECRET_ENV_VAR))?,
    };

    Ok(backend.access_service.login(username, &secret, role)?)
}

fn run_shell(backend: &mut Backend, session: &Session) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        write!(stdout, "{}> ", session.role)?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        let parsed = match ShellLine::try_parse_from(line.split_whitespace()) {
            Ok(parsed) => parsed,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };

        if let Commands::Shell = parsed.command {
            eprintln!("Already in a shell");
            continue;
        }
        if let Err(e) = run_command(backend, session, parsed.command) {
            eprintln!("Error: {:#}", e);
        }
    }

    Ok(())
}

fn run_command(backend: &mut Backend, session: &Session, command: Commands) -> Result<()> {
    let manager = &mut backend.student_manager;

    match command {
        Commands::Add { id, name, enroll } => {
            session.require(Capability::AddStudent, "add students")?;
            let student = Student::with_enrolled(id, name.join(" "), enroll);
            let label = student.display_name();
            manager.add(student)?;
            println!("Student {} added successfully", label);
        }
        Commands::Remove { id } => {
            session.require(Capability::RemoveStudent, "remove students")?;
            let removed = manager.remove(&id)?;
            println!("Student {} removed successfully", removed.display_name());
        }
        Commands::Search { id } => {
            session.require(Capability::View, "view students")?;
            match manager.search(&id) {
                Some(student) => print_student_details(student),
                None => bail!("Student ID {} not found", id),
            }
        }
        Commands::Enroll { id, subject } => {
            session.require(Capability::Enroll, "enroll students")?;
            manager.enroll(&id, &subject)?;
            println!("Student {} enrolled in {}", id, subject.trim());
        }
        Commands::Complete { id, subject, mark } => {
            session.require(Capability::Complete, "record completed subjects")?;
            manager.complete(&id, &subject, mark)?;
            println!(
                "Subject {} marked as completed for {} with mark {}",
                subject.trim(),
                id,
                mark
            );
        }
        Commands::List { json } => {
            session.require(Capability::View, "view students")?;
            if json {
                println!("{}", serde_json::to_string_pretty(manager.list())?);
            } else if manager.is_empty() {
                println!("No students on record");
            } else {
                for student in manager.list() {
                    println!("{}", student);
                }
            }
        }
        Commands::Stats { json } => {
            session.require(Capability::View, "view statistics")?;
            let stats = manager.statistics();
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_statistics(&stats);
            }
        }
        Commands::Undo => {
            session.require(Capability::Undo, "undo changes")?;
            let outcome = manager.undo()?;
            println!("Undid: {}", outcome.reverted.describe());
        }
        Commands::Shell => bail!("Shell cannot be nested"),
    }

    Ok(())
}

fn print_student_details(student: &Student) {
    println!("Student ID: {}", student.id);
    println!("Name: {}", student.name);

    println!("\nSubjects enrolled ({}):", student.enrolled.len());
    if student.enrolled.is_empty() {
        println!("  No subjects currently enrolled");
    }
    for subject in &student.enrolled {
        println!("  - {}", subject);
    }

    println!("\nSubjects completed ({}):", student.completed.len());
    if student.completed.is_empty() {
        println!("  No subjects completed yet");
    }
    for completed in &student.completed {
        println!("  - {}: {}/100", completed.subject, completed.mark);
    }

    if let Some(average) = student.average_mark() {
        println!("\nAverage mark: {:.2}/100", average);
    }
}

fn print_statistics(stats: &StatisticsResponse) {
    println!("Total students: {}", stats.total_students);

    println!("\nSubject enrollment count:");
    let subjects = stats.top_subjects();
    if subjects.is_empty() {
        println!("  No enrollments");
    }
    for (subject, count) in subjects {
        println!("  {}: {} student(s)", subject, count);
    }

    println!("\nCompleted subjects per student:");
    let students = stats.top_students();
    if students.is_empty() {
        println!("  No completed subjects");
    }
    for (name, count) in students {
        println!("  {}: {} subject(s)", name, count);
    }
}
