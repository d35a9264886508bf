//! gradestore CLI Client
//!
//! Command-line interface for interacting with a gradestore server.

use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use gradestore::protocol::{Response, Status};
use gradestore::store::format_grade;
use gradestore::Client;
use tracing_subscriber::{fmt, EnvFilter};

/// gradestore CLI
#[derive(Parser, Debug)]
#[command(name = "gradestore-cli")]
#[command(about = "CLI for the gradestore grade server")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:12345")]
    server: String,

    /// Connection timeout in milliseconds
    #[arg(short, long, default_value = "5000")]
    timeout_ms: u64,

    /// Print the raw JSON response
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a grade; the stored name is reused when the id already exists
    Add {
        /// Student id
        id: String,

        /// Subject
        subject: String,

        /// Grade (0-20)
        grade: String,

        /// Student name (required for a new id)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Show all grades of a student
    Find {
        /// Student id
        id: String,
    },

    /// Change the grade of a student in a subject
    Update {
        /// Student id
        id: String,

        /// Subject
        subject: String,

        /// New grade (0-20)
        grade: String,
    },

    /// List every grade
    List,

    /// Delete all grades of a student
    Delete {
        /// Student id
        id: String,
    },

    /// Check whether a student id is free
    CheckId {
        /// Student id
        id: String,
    },

    /// Send raw command text, e.g. "BUSCAR|S1"
    Raw {
        /// Command text
        command: String,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();

    let mut client = Client::new(&args.server);
    if args.timeout_ms > 0 {
        client = client.with_timeout(Duration::from_millis(args.timeout_ms));
    }

    let result = match args.command {
        Commands::Add {
            id,
            subject,
            grade,
            name,
        } => add(&client, &id, name, &subject, &grade),
        Commands::Find { id } => client.find(&id),
        Commands::Update { id, subject, grade } => client.update(&id, &subject, &grade),
        Commands::List => client.list(),
        Commands::Delete { id } => client.delete(&id),
        Commands::CheckId { id } => client.check_id(&id),
        Commands::Raw { command } => client.send_raw(&command),
    };

    let response = match result {
        Ok(response) => response,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&response) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        print_response(&response);
    }

    if response.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Add a grade, reusing the registered name for a known id
fn add(
    client: &Client,
    id: &str,
    name: Option<String>,
    subject: &str,
    grade: &str,
) -> gradestore::Result<Response> {
    let name = match client.existing_name(id)? {
        Some(existing) => {
            if name.as_deref().is_some_and(|n| n != existing) {
                eprintln!("Estudiante encontrado: usando el nombre registrado {}", existing);
            } else {
                println!("Estudiante encontrado: {}", existing);
            }
            existing
        }
        None => match name {
            Some(name) => name,
            None => {
                return Err(gradestore::GradeError::MissingField("Nombre"));
            }
        },
    };

    client.add(id, &name, subject, grade)
}

fn print_response(response: &Response) {
    if let Some(records) = &response.data {
        if records.is_empty() {
            println!("No hay calificaciones registradas.");
        }
        for record in records {
            println!(
                "ID: {} | Nombre: {} | Materia: {} | Calificación: {}",
                record.student_id,
                record.student_name,
                record.subject,
                format_grade(record.grade)
            );
        }
        if let Some(count) = response.count {
            println!("Total: {}", count);
        }
        return;
    }

    match response.status {
        Status::Ok => println!("{}", response.text()),
        Status::NotFound | Status::Error => eprintln!("{}", response.text()),
    }
}
