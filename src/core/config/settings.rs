use super::parsing::{
    env_optional, env_or_default, parse_bool, parse_cors_origins, parse_environment, parse_f64,
    parse_u16, parse_u32, parse_u64,
};
use super::secret::load_or_create_secret_key;
use super::types::{
    ApiSettings, ConfigError, CorsSettings, DatabaseSettings, GeminiSettings, GenerationSettings,
    MockExamSettings, RedisSettings, RuntimeSettings, SecuritySettings, ServerHost, ServerPort,
    ServerSettings, Settings, TelemetrySettings,
};

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("EXAMCREATE_HOST", "0.0.0.0");
        let port = env_or_default("EXAMCREATE_PORT", "8000");

        let environment = parse_environment(
            env_optional("EXAMCREATE_ENV").or_else(|| env_optional("ENVIRONMENT")),
        );
        let strict_config = env_optional("EXAMCREATE_STRICT_CONFIG")
            .map(|value| parse_bool(&value))
            .unwrap_or(false)
            || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "Exam Create API");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));
        let api_v1_str = env_or_default("API_V1_STR", "/api/v1");

        let secret_key = match env_optional("SECRET_KEY") {
            Some(value) => value,
            None => load_or_create_secret_key(),
        };
        let access_token_expire_minutes = parse_u64(
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            env_or_default("ACCESS_TOKEN_EXPIRE_MINUTES", "10080"),
        )?;
        let algorithm = env_or_default("ALGORITHM", "HS256");

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let postgres_server = env_or_default("POSTGRES_SERVER", "localhost");
        let postgres_port = parse_u16("POSTGRES_PORT", env_or_default("POSTGRES_PORT", "5432"))?;
        let postgres_user = env_or_default("POSTGRES_USER", "examcreate");
        let postgres_password = env_or_default("POSTGRES_PASSWORD", "");
        let postgres_db = env_or_default("POSTGRES_DB", "examcreate_db");
        let database_url = env_optional("DATABASE_URL");

        let redis_host = env_or_default("REDIS_HOST", "localhost");
        let redis_port = parse_u16("REDIS_PORT", env_or_default("REDIS_PORT", "6379"))?;
        let redis_db = parse_u16("REDIS_DB", env_or_default("REDIS_DB", "0"))?;
        let redis_password = env_or_default("REDIS_PASSWORD", "");

        let gemini_api_key = env_or_default("GEMINI_API_KEY", "");
        let gemini_base_url =
            env_or_default("GEMINI_BASE_URL", "https://generativelanguage.googleapis.com/v1beta");
        let gemini_model = env_or_default("GEMINI_MODEL", "gemini-2.5-flash");
        let gemini_max_output_tokens = parse_u32(
            "GEMINI_MAX_OUTPUT_TOKENS",
            env_or_default("GEMINI_MAX_OUTPUT_TOKENS", "2048"),
        )?;
        let gemini_temperature =
            parse_f64("GEMINI_TEMPERATURE", env_or_default("GEMINI_TEMPERATURE", "0.7"))?;
        let gemini_request_timeout = parse_u64(
            "GEMINI_REQUEST_TIMEOUT",
            env_or_default("GEMINI_REQUEST_TIMEOUT", "120"),
        )?;

        let generation_rate_limit =
            parse_u64("GENERATION_RATE_LIMIT", env_or_default("GENERATION_RATE_LIMIT", "10"))?;
        let generation_rate_window_seconds = parse_u64(
            "GENERATION_RATE_WINDOW_SECONDS",
            env_or_default("GENERATION_RATE_WINDOW_SECONDS", "60"),
        )?;

        let abandon_grace_minutes = parse_u64(
            "MOCK_EXAM_ABANDON_GRACE_MINUTES",
            env_or_default("MOCK_EXAM_ABANDON_GRACE_MINUTES", "1440"),
        )?;
        let sweep_interval_seconds = parse_u64(
            "MOCK_EXAM_SWEEP_INTERVAL_SECONDS",
            env_or_default("MOCK_EXAM_SWEEP_INTERVAL_SECONDS", "300"),
        )?;

        let log_level = env_or_default("EXAMCREATE_LOG_LEVEL", "info");
        let json =
            env_optional("EXAMCREATE_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, version, api_v1_str },
            security: SecuritySettings { secret_key, access_token_expire_minutes, algorithm },
            cors: CorsSettings { origins: cors_origins },
            database: DatabaseSettings {
                postgres_server,
                postgres_port,
                postgres_user,
                postgres_password,
                postgres_db,
                database_url,
            },
            redis: RedisSettings {
                host: redis_host,
                port: redis_port,
                db: redis_db,
                password: redis_password,
            },
            gemini: GeminiSettings {
                api_key: gemini_api_key,
                base_url: gemini_base_url,
                model: gemini_model,
                max_output_tokens: gemini_max_output_tokens,
                temperature: gemini_temperature,
                request_timeout_seconds: gemini_request_timeout,
            },
            generation: GenerationSettings {
                rate_limit: generation_rate_limit,
                rate_window_seconds: generation_rate_window_seconds,
            },
            mock_exam: MockExamSettings { abandon_grace_minutes, sweep_interval_seconds },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn security(&self) -> &SecuritySettings {
        &self.security
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn redis(&self) -> &RedisSettings {
        &self.redis
    }

    pub(crate) fn gemini(&self) -> &GeminiSettings {
        &self.gemini
    }

    pub(crate) fn generation(&self) -> &GenerationSettings {
        &self.generation
    }

    pub(crate) fn mock_exam(&self) -> &MockExamSettings {
        &self.mock_exam
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.gemini.request_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "GEMINI_REQUEST_TIMEOUT",
                value: "0".to_string(),
            });
        }

        if self.generation.rate_window_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "GENERATION_RATE_WINDOW_SECONDS",
                value: "0".to_string(),
            });
        }

        if self.mock_exam.sweep_interval_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "MOCK_EXAM_SWEEP_INTERVAL_SECONDS",
                value: "0".to_string(),
            });
        }

        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if self.database.database_url.is_none() && self.database.postgres_password.is_empty() {
            return Err(ConfigError::MissingSecret("POSTGRES_PASSWORD"));
        }
        if self.gemini.api_key.is_empty() {
            return Err(ConfigError::MissingSecret("GEMINI_API_KEY"));
        }
        if self.gemini.base_url.is_empty() {
            return Err(ConfigError::MissingSecret("GEMINI_BASE_URL"));
        }

        Ok(())
    }
}
