use anyhow::Context;
use clap::Parser;
use review_sentiment::config::TomlConfig;
use review_sentiment::core::effect::{Notification, ToastLevel};
use review_sentiment::domain::ports::ConfigProvider;
use review_sentiment::utils::logger::{self, LogFormat};
use review_sentiment::utils::validation::Validate;
use review_sentiment::{
    build_classifier, CliConfig, Phase, ReviewController, ReviewError, ReviewSession,
    Sentiment, ServiceStatus, Submission,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    logger::init_logger(format, cli.verbose);
    tracing::info!("🚀 Starting review-sentiment");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    match &cli.config {
        Some(path) => {
            let file = TomlConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?;
            run(file).await
        }
        None => run(cli).await,
    }
}

async fn run<C: ConfigProvider + Validate>(config: C) -> anyhow::Result<()> {
    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("{}", e);
        std::process::exit(1);
    }

    // 建立分類器與控制器
    let (classifier, client) = build_classifier(&config).await?;
    let controller = ReviewController::new(classifier);
    let mut notices = controller.notices();

    if let Some(client) = &client {
        // Failure already shows up as a notice and in the status line.
        if controller.refresh_service_status(client).await.is_ok() {
            tracing::info!("✅ Review service reachable");
        }
    }

    print_help(&controller.session());
    render(&controller);
    drain(&mut notices);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let outcome = match Command::parse(controller.session().phase(), &line) {
            Command::Quit => break,
            Command::Help => {
                print_help(&controller.session());
                Ok(())
            }
            Command::Reset => {
                controller.reset();
                Ok(())
            }
            Command::Submit(text) => controller.submit(&text).await.map(|submission| {
                if submission == Submission::Superseded {
                    tracing::debug!("Submission superseded");
                }
            }),
            Command::Confirm => controller.confirm().await,
            Command::Change => controller.begin_edit().await,
            Command::Commit => controller.commit().await,
            Command::Select(Ok(label)) => controller.select_pending(label).await,
            Command::Select(Err(e)) => {
                println!("{}", e.user_friendly_message());
                Ok(())
            }
            Command::Unknown(other) => {
                println!("Unknown command '{}'. Type 'help'.", other);
                Ok(())
            }
        };

        drain(&mut notices);
        if let Err(e) = outcome {
            tracing::debug!("Action failed: {} (category {:?})", e, e.category());
            // 其餘錯誤已經以通知顯示
            if matches!(e, ReviewError::InvalidTransition { .. }) {
                println!("{}", e.user_friendly_message());
            }
        }
        render(&controller);
    }

    tracing::info!("👋 Bye");
    Ok(())
}

fn print_help(session: &ReviewSession) {
    let labels: Vec<&str> = session.mode().labels().iter().map(|s| s.as_str()).collect();
    println!("Rate your visit to our restaurant.");
    println!("  <text>            submit a review (while composing)");
    println!("  confirm           accept the detected sentiment");
    println!("  change            pick a different sentiment");
    println!("  select <label>    choose one of: {}", labels.join(", "));
    println!("  commit            save the chosen sentiment");
    println!("  another           submit another review");
    println!("  quit              (help, another and quit must be the whole line)");
}

fn render(controller: &ReviewController) {
    if let ServiceStatus::Disconnected(_) = controller.status() {
        println!("[Disconnected]");
    }

    let session = controller.session();
    match session.phase() {
        Phase::Composing => println!("\nPlease enter your review:"),
        Phase::Submitting => println!("Submitting..."),
        Phase::Classified | Phase::Editing => {
            if let Some(review) = session.review() {
                println!("\nYour submitted review:\n  > {}", review);
            }
            if let Some(verdict) = session.verdict() {
                println!("{}", verdict);
            }
            if session.is_editing() {
                let pending = session
                    .pending_sentiment()
                    .map(|s| s.as_str())
                    .unwrap_or("-");
                println!("Selected: {} (select <label>, then commit)", pending);
            } else if !session.is_confirmed() {
                println!("confirm | change");
            }
        }
    }
}

fn drain(notices: &mut broadcast::Receiver<review_sentiment::Notice>) {
    while let Ok(notice) = notices.try_recv() {
        match notice.notification {
            Notification::FieldError { field, message } => println!("  {}: {}", field, message),
            Notification::Toast { level, message } => {
                let marker = match level {
                    ToastLevel::Info => "i",
                    ToastLevel::Success => "+",
                    ToastLevel::Error => "!",
                };
                println!("[{}] {}", marker, message);
            }
            Notification::Disconnected { reason } => {
                tracing::warn!("⚠️ Disconnected: {}", reason);
            }
            Notification::Connected { versions } => println!(
                "Connected to app service {} / model service {}",
                versions.app_service_version, versions.model_service_version
            ),
        }
    }
}

/// One line of user input, interpreted against the current phase.
#[derive(Debug, PartialEq)]
enum Command {
    Quit,
    Help,
    Reset,
    Submit(String),
    Confirm,
    Change,
    Commit,
    Select(Result<Sentiment, ReviewError>),
    Unknown(String),
}

impl Command {
    /// Control words only count when they are the whole line, so a review
    /// such as "quit raving, this place is great" is still submitted.
    fn parse(phase: Phase, line: &str) -> Self {
        let line = line.trim();
        match line {
            "quit" | "exit" => return Self::Quit,
            "help" => return Self::Help,
            "reset" | "another" => return Self::Reset,
            _ => {}
        }
        if phase == Phase::Composing {
            return Self::Submit(line.to_string());
        }

        let (word, rest) = line
            .split_once(' ')
            .map(|(w, r)| (w, r.trim()))
            .unwrap_or((line, ""));
        match word {
            "confirm" => Self::Confirm,
            "change" => Self::Change,
            "commit" => Self::Commit,
            "select" => Self::Select(rest.parse()),
            other => match other.parse::<Sentiment>() {
                Ok(label) => Self::Select(Ok(label)),
                Err(_) => Self::Unknown(other.to_string()),
            },
        }
    }
}
