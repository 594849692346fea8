//! hrms 命令行入口

use clap::{Parser, Subcommand};
use hrms_client::{
    config::ClientConfig,
    models::{ListQuery, LoginRequest, VerifyRequest},
    services::Resource,
    telemetry, ApiClient, ClientError, SessionState,
};
use serde_json::Value;

#[derive(Debug, Parser)]
#[command(name = "hrms", version, about = "HRMS API command-line client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 使用邮箱和密码登录
    Login {
        #[arg(long)]
        email: String,
        /// 也可通过 HRMS_PASSWORD 提供
        #[arg(long, env = "HRMS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// 提交验证码
    Verify {
        #[arg(long)]
        email: String,
        #[arg(long)]
        code: String,
    },
    /// 登出并清除本地会话
    Logout,
    /// 显示会话状态
    Status,
    /// 显示当前用户
    Whoami,
    /// 列出资源
    List {
        resource: String,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        page_size: Option<u32>,
        #[arg(long)]
        search: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 按优先级加载：.env.local > .env
    dotenv::from_filename(".env.local").ok();
    dotenv::dotenv().ok();

    let config = ClientConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    telemetry::init_telemetry(&config);

    let client = ApiClient::from_config(&config)?;

    match run(&client, cli.command).await {
        Ok(()) => Ok(()),
        Err(ClientError::Unauthorized) => {
            eprintln!("Session expired or rejected. Run `hrms login` to sign in again.");
            std::process::exit(2);
        }
        Err(e) => {
            tracing::debug!(error = %e, "Command failed");
            eprintln!("Error: {}", e.user_message());
            std::process::exit(1);
        }
    }
}

async fn run(client: &ApiClient, command: Command) -> hrms_client::Result<()> {
    match command {
        Command::Login { email, password } => {
            let envelope = client.auth().login(&LoginRequest::new(email, password)).await?;
            println!("{}", non_empty(&envelope.message, "Logged in"));
            if let Some(org) = client.session().active_organisation_id() {
                println!("Active organisation: {}", org);
            }
        }
        Command::Verify { email, code } => {
            let envelope = client.auth().verify(&VerifyRequest { email, code }).await?;
            println!("{}", non_empty(&envelope.message, "Verified"));
        }
        Command::Logout => {
            client.auth().logout().await?;
            println!("Logged out");
        }
        Command::Status => {
            let session = client.session();
            let state = match session.state() {
                SessionState::Authenticated => "authenticated",
                SessionState::Expired => "expired",
                SessionState::Unauthenticated => "unauthenticated",
            };
            println!("Session: {}", state);
            if let Some(exp) = session.claims().and_then(|c| c.exp()) {
                if let Some(at) = chrono::DateTime::from_timestamp(exp, 0) {
                    println!("Expires: {}", at.to_rfc3339());
                }
            }
            if let Some(org) = session.active_organisation_id() {
                println!("Organisation: {}", org);
            }
        }
        Command::Whoami => match client.session().user_profile() {
            Some(profile) => println!("{} <{}> ({})", profile.name, profile.email, profile.role),
            None => match client.session().user_info() {
                Some(info) => println!("{}", serde_json::to_string_pretty(&info)?),
                None => println!("Not logged in"),
            },
        },
        Command::List {
            resource,
            page,
            page_size,
            search,
        } => {
            let resource: Resource = resource.parse()?;
            let query = ListQuery {
                page,
                page_size,
                search,
                ..Default::default()
            };

            let envelope = client.resource::<Value>(resource).list(&query).await?;
            println!("{}", serde_json::to_string_pretty(&envelope.data)?);
            if let Some(p) = envelope.pagination() {
                println!(
                    "-- {} total, page {} of {}",
                    p.total_count,
                    p.page.unwrap_or(1),
                    p.page_count.unwrap_or(1)
                );
            }
        }
    }

    Ok(())
}

fn non_empty<'a>(message: &'a str, fallback: &'a str) -> &'a str {
    if message.is_empty() {
        fallback
    } else {
        message
    }
}
