use clap::Parser;
use sh_core::{Error, Page, Result};
use sh_inference::ChatResponder;
use sh_ingest::sources::GNewsSource;
use sh_ingest::{IngestConfig, IngestPipeline, LogKind};
use sh_storage::{BackendConfig, Storage};
use sh_web::AppState;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let too_large = || format!("Duration is too large: {}", s);
        let mut total_seconds = 0u64;
        let mut current_number = String::new();
        let mut has_unit = false;

        for c in s.chars() {
            if c.is_ascii_digit() {
                current_number.push(c);
            } else if !current_number.is_empty() {
                let num = current_number.parse::<u64>().map_err(|_| too_large())?;
                let unit = match c {
                    's' => 1,
                    'm' => 60,
                    'h' => 3600,
                    'd' => 86400,
                    _ => return Err(format!("Invalid duration unit: {}", c)),
                };
                total_seconds = num
                    .checked_mul(unit)
                    .and_then(|secs| total_seconds.checked_add(secs))
                    .ok_or_else(too_large)?;
                current_number.clear();
                has_unit = true;
            } else if !c.is_whitespace() {
                return Err(format!("Invalid character in duration: {}", c));
            }
        }

        // bare numbers are seconds
        if !current_number.is_empty() {
            let num = current_number.parse::<u64>().map_err(|_| too_large())?;
            total_seconds = total_seconds.checked_add(num).ok_or_else(too_large)?;
            has_unit = true;
        }

        if !has_unit {
            return Err("Duration must include a number".to_string());
        }

        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "SwiftyHub news ingestion and fan chat backend", long_about = None)]
pub struct Cli {
    /// Storage backend: memory, supabase or sqlite
    #[arg(long, env = "SWIFTYHUB_STORAGE", default_value = "memory")]
    storage: String,
    /// Supabase project URL, or the database path for sqlite
    #[arg(long, env = "MY_SUPABASE_URL")]
    backend_url: Option<String>,
    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
    backend_key: Option<String>,
    #[arg(long, default_value = sh_storage::DEFAULT_TABLE)]
    table: String,
    #[arg(long, default_value = sh_storage::DEFAULT_BUCKET)]
    bucket: String,
    /// Inference provider: openai or dummy
    #[arg(long, default_value = "openai")]
    provider: String,
    #[arg(long, env = "OPENAI_MODEL")]
    model: Option<String>,
    #[arg(long, env = "OPENAI_BASE_URL")]
    model_url: Option<String>,
    #[arg(long, env = "OPENAI_KEY", hide_env_values = true)]
    openai_key: Option<String>,
    #[arg(long, env = "GNEWS_API_KEY", hide_env_values = true)]
    gnews_key: Option<String>,
    #[arg(long, env = "GNEWS_BASE_URL")]
    gnews_url: Option<String>,
    #[arg(long, env = "NEWS_TOPIC", default_value = "Taylor Swift")]
    topic: String,
    #[arg(long, default_value = "en")]
    language: String,
    #[arg(long, default_value_t = 10)]
    page_size: u32,
    /// How long a stored source URL blocks re-ingestion (e.g. 24h, 1d, 90m)
    #[arg(long, default_value = "24h")]
    dedup_window: HumanDuration,
    #[arg(long, default_value_t = sh_inference::chat::DEFAULT_MAX_TOKENS)]
    chat_max_tokens: u32,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        #[arg(long, env = "SWIFTYHUB_ADDR", default_value = "0.0.0.0:8080")]
        addr: SocketAddr,
    },
    /// Run the news ingestion pipeline
    Ingest {
        /// Run in periodic mode with the specified interval (e.g. 1h, 30m, 1d, 1h15m30s)
        #[arg(long)]
        interval: Option<HumanDuration>,
    },
    /// Send one message to the fan chat persona
    Chat { message: String },
    /// Print a page of stored articles as JSON
    Articles {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = Page::DEFAULT_SIZE)]
        page_size: u32,
    },
}

impl Cli {
    fn inference_config(&self) -> sh_inference::Config {
        sh_inference::Config {
            provider: self.provider.clone(),
            api_key: self.openai_key.clone(),
            model_name: self.model.clone(),
            base_url: self.model_url.clone(),
        }
    }

    fn backend_config(&self) -> BackendConfig {
        let mut config = BackendConfig::default()
            .with_table(self.table.clone())
            .with_bucket(self.bucket.clone());
        if let Some(url) = &self.backend_url {
            config = config.with_url(url.clone());
        }
        if let Some(key) = &self.backend_key {
            config = config.with_api_key(key.clone());
        }
        config
    }

    fn ingest_config(&self) -> Result<IngestConfig> {
        let dedup_window = chrono::Duration::from_std(self.dedup_window.0)
            .map_err(|e| Error::Config(format!("Invalid dedup window: {}", e)))?;
        Ok(IngestConfig {
            topic: self.topic.clone(),
            language: self.language.clone(),
            page_size: self.page_size,
            dedup_window,
            ..IngestConfig::default()
        })
    }
}

fn build_pipeline(
    cli: &Cli,
    storage: Storage,
    model: Arc<dyn sh_core::InferenceModel>,
) -> Result<IngestPipeline> {
    let source = GNewsSource::new(cli.gnews_key.clone(), cli.gnews_url.clone())?;
    Ok(IngestPipeline::new(Arc::new(source), storage, model, cli.ingest_config()?))
}

async fn run_ingest(pipeline: &IngestPipeline) -> Result<()> {
    info!("📰 Fetching today's {} news", pipeline.config().topic);
    match pipeline.run().await {
        Ok(report) => {
            info!(
                "✨ {} ({} inserted, {} skipped)",
                report.message,
                report.count(LogKind::Inserted),
                report.logs.len() - report.count(LogKind::Inserted)
            );
            Ok(())
        }
        Err(aborted) => {
            for entry in &aborted.logs {
                warn!("{}", entry.message);
            }
            Err(aborted.error)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    sh_ingest::init_logging();
    let cli = Cli::parse();

    let storage = sh_storage::create_storage(cli.storage.as_str(), &cli.backend_config()).await?;
    info!("🏦 Storage initialized successfully (using {})", cli.storage);

    let model = sh_inference::create_model(Some(cli.inference_config()))?;
    info!("🧠 Inference model initialized successfully (using {})", model.name());

    match &cli.command {
        Commands::Serve { addr } => {
            let pipeline = build_pipeline(&cli, storage.clone(), model.clone())?;
            let chat = ChatResponder::new(model).with_max_tokens(cli.chat_max_tokens);
            sh_web::serve(*addr, AppState::new(pipeline, chat, storage)).await?;
        }
        Commands::Ingest { interval } => {
            let pipeline = build_pipeline(&cli, storage, model)?;
            if let Some(interval) = interval {
                info!("Running in periodic mode with {}s interval", interval.0.as_secs());
                loop {
                    if let Err(e) = run_ingest(&pipeline).await {
                        error!("Error during ingestion: {}", e);
                        if e.is_config() {
                            return Err(e);
                        }
                    }
                    info!("Waiting {}s before next run", interval.0.as_secs());
                    tokio::time::sleep(interval.0).await;
                }
            } else {
                run_ingest(&pipeline).await?;
            }
        }
        Commands::Chat { message } => {
            let chat = ChatResponder::new(model).with_max_tokens(cli.chat_max_tokens);
            let reply = chat.reply(message).await?;
            println!("{}", reply);
        }
        Commands::Articles { page, page_size } => {
            let articles = storage.articles.list_articles(Page::new(*page, *page_size)).await?;
            let rows: Vec<serde_json::Value> = articles
                .into_iter()
                .map(|article| {
                    let image_url = article
                        .image_path
                        .as_deref()
                        .map(|key| storage.images.image_url(key));
                    serde_json::json!({
                        "id": article.id,
                        "title": article.title,
                        "ai_content": article.ai_content,
                        "image_url": image_url,
                        "source_url": article.source_url,
                        "created_at": article.created_at,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_duration() {
        assert_eq!("90".parse::<HumanDuration>().unwrap().0, Duration::from_secs(90));
        assert_eq!("1h30m".parse::<HumanDuration>().unwrap().0, Duration::from_secs(5400));
        assert_eq!("1d".parse::<HumanDuration>().unwrap().0, Duration::from_secs(86400));
        assert_eq!("1h 15m 30s".parse::<HumanDuration>().unwrap().0, Duration::from_secs(4530));
        assert!("".parse::<HumanDuration>().is_err());
        assert!("5w".parse::<HumanDuration>().is_err());
        assert!("h".parse::<HumanDuration>().is_err());
    }

    #[test]
    fn test_human_duration_overflow() {
        let err = "300000000000000d".parse::<HumanDuration>().unwrap_err();
        assert!(err.starts_with("Duration is too large"));
        assert!("99999999999999999999s".parse::<HumanDuration>().is_err());
        assert!("18446744073709551615s 1s".parse::<HumanDuration>().is_err());
        assert_eq!(
            "18446744073709551615".parse::<HumanDuration>().unwrap().0,
            Duration::from_secs(u64::MAX)
        );
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["swiftyhub", "--storage", "memory", "chat", "hi"]).unwrap();
        assert_eq!(cli.dedup_window.0, Duration::from_secs(24 * 3600));
        assert_eq!(cli.table, "ai_articles");
        assert_eq!(cli.bucket, "news-images");

        let config = cli.ingest_config().unwrap();
        assert_eq!(config.dedup_window, chrono::Duration::hours(24));
        assert_eq!(config.page_size, 10);
        assert!(matches!(cli.command, Commands::Chat { ref message } if message == "hi"));
    }

    #[test]
    fn test_ingest_interval() {
        let cli = Cli::try_parse_from(["swiftyhub", "--dedup-window", "12h", "ingest", "--interval", "30m"]).unwrap();
        assert_eq!(cli.ingest_config().unwrap().dedup_window, chrono::Duration::hours(12));
        match cli.command {
            Commands::Ingest { interval } => {
                assert_eq!(interval, Some(HumanDuration(Duration::from_secs(1800))));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
