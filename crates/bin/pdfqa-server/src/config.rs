use clap::{Parser, ValueEnum, builder::BoolishValueParser};
use std::error::Error;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_UPLOAD_DIR: &str = "./uploads";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_PARSE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PARSE_WORKERS: usize = 4;
const DEFAULT_ANSWER_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_LLM_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_RETRIEVAL_TOP_K: usize = 3;

/// Answering strategy selected at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AnswerBackend {
    Heuristic,
    Generation,
    Retrieval,
}

#[derive(Parser, Debug)]
#[command(name = "pdfqa-server", version, about = "PDF question answering daemon.")]
struct CliArgs {
    #[arg(long, env = "PDFQA_HOST", default_value = DEFAULT_HOST)]
    host: String,

    #[arg(long, env = "PDFQA_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    #[arg(
        long,
        env = "PDFQA_DEBUG",
        default_value_t = false,
        value_parser = BoolishValueParser::new()
    )]
    debug: bool,

    #[arg(long, env = "PDFQA_CORS_ORIGINS", default_value = DEFAULT_CORS_ORIGINS)]
    cors_origins: String,

    #[arg(
        long,
        env = "PDFQA_MAX_UPLOAD_BYTES",
        default_value_t = DEFAULT_MAX_UPLOAD_BYTES
    )]
    max_upload_bytes: usize,

    #[arg(long, env = "PDFQA_UPLOAD_DIR", default_value = DEFAULT_UPLOAD_DIR)]
    upload_dir: PathBuf,

    #[arg(
        long,
        env = "PDFQA_REQUEST_TIMEOUT_SECS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS
    )]
    request_timeout_secs: u64,

    #[arg(
        long,
        env = "PDFQA_PARSE_TIMEOUT_SECS",
        default_value_t = DEFAULT_PARSE_TIMEOUT_SECS
    )]
    parse_timeout_secs: u64,

    #[arg(long, env = "PDFQA_PARSE_WORKERS", default_value_t = DEFAULT_PARSE_WORKERS)]
    parse_workers: usize,

    #[arg(
        long,
        env = "PDFQA_ANSWER_BACKEND",
        value_enum,
        default_value_t = AnswerBackend::Heuristic
    )]
    answer_backend: AnswerBackend,

    #[arg(
        long,
        env = "PDFQA_ANSWER_TIMEOUT_SECS",
        default_value_t = DEFAULT_ANSWER_TIMEOUT_SECS
    )]
    answer_timeout_secs: u64,

    #[arg(long, env = "PDFQA_LLM_BASE_URL", default_value = DEFAULT_LLM_BASE_URL)]
    llm_base_url: String,

    #[arg(long, env = "PDFQA_LLM_MODEL", default_value = DEFAULT_LLM_MODEL)]
    llm_model: String,

    #[arg(long, env = "PDFQA_LLM_API_KEY")]
    llm_api_key: Option<String>,

    #[arg(
        long,
        env = "PDFQA_RETRIEVAL_TOP_K",
        default_value_t = DEFAULT_RETRIEVAL_TOP_K
    )]
    retrieval_top_k: usize,
}

/// Connection settings for a chat completions endpoint.
#[derive(Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
}

/// Answering backend together with the settings it needs.
#[derive(Clone)]
pub enum BackendConfig {
    Heuristic,
    Generation(LlmSettings),
    Retrieval { llm: LlmSettings, top_k: usize },
}

/// Runtime configuration loaded from CLI arguments and environment variables.
#[derive(Clone)]
pub struct QaConfig {
    pub addr: SocketAddr,
    pub debug: bool,
    pub cors_origins: Vec<String>,
    pub max_upload_bytes: usize,
    pub upload_dir: PathBuf,
    pub request_timeout: Duration,
    pub parse_timeout: Option<Duration>,
    pub parse_workers: usize,
    pub backend: BackendConfig,
    pub answer_timeout: Option<Duration>,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingSetting(&'static str),
    InvalidSetting { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSetting(name) => write!(f, "missing required setting: {name}"),
            Self::InvalidSetting { name, value } => {
                write!(f, "invalid {name} value: {value}")
            }
        }
    }
}

impl Error for ConfigError {}

impl QaConfig {
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::try_from(args)
    }
}

impl TryFrom<CliArgs> for QaConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let ip: IpAddr = args.host.trim().parse().map_err(|_| ConfigError::InvalidSetting {
            name: "PDFQA_HOST",
            value: args.host.clone(),
        })?;

        let cors_origins: Vec<String> = args
            .cors_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();
        if cors_origins.is_empty() {
            return Err(ConfigError::InvalidSetting {
                name: "PDFQA_CORS_ORIGINS",
                value: args.cors_origins,
            });
        }

        if args.max_upload_bytes == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "PDFQA_MAX_UPLOAD_BYTES",
                value: args.max_upload_bytes.to_string(),
            });
        }

        if args.upload_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidSetting {
                name: "PDFQA_UPLOAD_DIR",
                value: String::new(),
            });
        }

        if args.parse_workers == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "PDFQA_PARSE_WORKERS",
                value: args.parse_workers.to_string(),
            });
        }

        if args.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "PDFQA_REQUEST_TIMEOUT_SECS",
                value: args.request_timeout_secs.to_string(),
            });
        }

        let backend = match args.answer_backend {
            AnswerBackend::Heuristic => BackendConfig::Heuristic,
            AnswerBackend::Generation => BackendConfig::Generation(llm_settings(
                args.llm_api_key,
                args.llm_base_url,
                args.llm_model,
            )?),
            AnswerBackend::Retrieval => BackendConfig::Retrieval {
                llm: llm_settings(args.llm_api_key, args.llm_base_url, args.llm_model)?,
                top_k: args.retrieval_top_k.max(1),
            },
        };

        Ok(Self {
            addr: SocketAddr::new(ip, args.port),
            debug: args.debug,
            cors_origins,
            max_upload_bytes: args.max_upload_bytes,
            upload_dir: args.upload_dir,
            request_timeout: Duration::from_secs(args.request_timeout_secs),
            parse_timeout: non_zero_secs(args.parse_timeout_secs),
            parse_workers: args.parse_workers,
            backend,
            answer_timeout: non_zero_secs(args.answer_timeout_secs),
        })
    }
}

fn llm_settings(
    api_key: Option<String>,
    base_url: String,
    model: String,
) -> Result<LlmSettings, ConfigError> {
    let api_key = api_key
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::MissingSetting("PDFQA_LLM_API_KEY"))?;
    Ok(LlmSettings {
        base_url,
        model,
        api_key,
    })
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
