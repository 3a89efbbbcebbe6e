use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use domain::error::Error;
use domain::gateway::zoom::{CreateMeetingRequest, DEFAULT_DURATION_MINUTES};
use domain::{Broker, MeetingRole, UserRole};
use log::*;
use secrecy::ExposeSecret;
use serde_json::json;
use service::{config::Config, logging::Logger};

#[derive(Debug, Parser)]
#[command(author, version, about = "Zoom credential broker", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: Config,

    /// Act as an administrator (required to create meetings and to join as host)
    #[arg(long, global = true)]
    as_admin: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print a valid Zoom API access token, acquiring one if needed
    AccessToken,
    /// Generate a Meeting SDK join signature
    Signature {
        #[arg(long)]
        meeting_number: String,
        /// 0 = participant, 1 = host
        #[arg(long, default_value = "0")]
        role: MeetingRole,
    },
    /// Schedule a new meeting
    CreateMeeting {
        #[arg(long)]
        topic: String,
        /// RFC 3339 start time, e.g. 2025-03-01T10:00:00Z
        #[arg(long)]
        start_time: DateTime<Utc>,
        /// Duration in minutes
        #[arg(long, default_value_t = DEFAULT_DURATION_MINUTES)]
        duration: u32,
    },
    /// Look up a meeting and print its join link
    JoinMeeting {
        #[arg(long)]
        meeting_id: String,
    },
}

#[tokio::main]
async fn main() {
    service::config::load_dotenv();
    let cli = Cli::parse();
    Logger::init_logger(&cli.config);

    let broker = match Broker::new(&cli.config) {
        Ok(broker) => broker,
        Err(e) => {
            error!("Failed to configure credential broker: {e}");
            std::process::exit(1);
        }
    };

    let caller = if cli.as_admin {
        UserRole::Admin
    } else {
        UserRole::User
    };

    match run(&broker, caller, cli.command).await {
        Ok(output) => println!("{output:#}"),
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}

async fn run(
    broker: &Broker,
    caller: UserRole,
    command: Command,
) -> Result<serde_json::Value, Error> {
    match command {
        Command::AccessToken => {
            let token = broker.access_token().await?;
            Ok(json!({ "access_token": token.expose_secret() }))
        }
        Command::Signature {
            meeting_number,
            role,
        } => {
            let authorization = broker
                .meetings()
                .authorize_join(caller, &meeting_number, role)?;
            Ok(json!(authorization))
        }
        Command::CreateMeeting {
            topic,
            start_time,
            duration,
        } => {
            let request = CreateMeetingRequest {
                topic,
                start_time,
                duration_minutes: duration,
            };
            let meeting = broker.meetings().create_meeting(caller, request).await?;
            Ok(json!(meeting))
        }
        Command::JoinMeeting { meeting_id } => {
            let details = broker.meetings().join_meeting(&meeting_id).await?;
            Ok(json!(details))
        }
    }
}
