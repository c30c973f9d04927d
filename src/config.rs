use crate::error::{AppResult, ConfigError};
use std::str::FromStr;
use std::time::Duration;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- 数据库配置 ---
    pub database_url: String,
    /// 连接池上限（基础连接 + 溢出连接）
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub db_max_lifetime_secs: u64,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_temperature: f32,
    // --- 生成配置 ---
    /// 每个分类需要新增的题目数量
    pub questions_per_category: usize,
    /// 单次请求的题目数量上限
    pub batch_size: usize,
    /// 无产出批次之后的等待时间
    pub retry_delay_secs: u64,
    /// 等待时间的随机抖动上限（毫秒）
    pub retry_jitter_ms: u64,
    /// 连续无产出批次的上限，None 表示一直重试
    pub max_failed_batches: Option<u32>,
    /// 只处理指定 slug 的分类
    pub category_slug: Option<String>,
    // --- 分类种子 ---
    pub seed_categories: bool,
    pub categories_file: Option<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            db_max_connections: 15,
            db_acquire_timeout_secs: 30,
            db_max_lifetime_secs: 1800,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            llm_temperature: 0.7,
            questions_per_category: 30,
            batch_size: 15,
            retry_delay_secs: 5,
            retry_jitter_ms: 0,
            max_failed_batches: None,
            category_slug: None,
            seed_categories: false,
            categories_file: None,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// `DATABASE_URL` 与 `LLM_API_KEY` 必须存在，其余项缺省时使用默认值。
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 从任意键值来源加载配置
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let config = Self {
            database_url: required(&lookup, "DATABASE_URL")?,
            db_max_connections: parsed(&lookup, "DB_MAX_CONNECTIONS", "u32")?
                .unwrap_or(default.db_max_connections),
            db_acquire_timeout_secs: parsed(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", "u64")?
                .unwrap_or(default.db_acquire_timeout_secs),
            db_max_lifetime_secs: parsed(&lookup, "DB_MAX_LIFETIME_SECS", "u64")?
                .unwrap_or(default.db_max_lifetime_secs),
            llm_api_key: required(&lookup, "LLM_API_KEY")?,
            llm_api_base_url: lookup("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: lookup("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            llm_temperature: parsed(&lookup, "LLM_TEMPERATURE", "f32")?
                .unwrap_or(default.llm_temperature),
            questions_per_category: parsed(&lookup, "QUESTIONS_PER_CATEGORY", "usize")?
                .unwrap_or(default.questions_per_category),
            batch_size: parsed(&lookup, "BATCH_SIZE", "usize")?.unwrap_or(default.batch_size),
            retry_delay_secs: parsed(&lookup, "RETRY_DELAY_SECS", "u64")?
                .unwrap_or(default.retry_delay_secs),
            retry_jitter_ms: parsed(&lookup, "RETRY_JITTER_MS", "u64")?
                .unwrap_or(default.retry_jitter_ms),
            max_failed_batches: parsed(&lookup, "MAX_FAILED_BATCHES", "u32")?,
            category_slug: lookup("CATEGORY_SLUG").filter(|s| !s.trim().is_empty()),
            seed_categories: parsed(&lookup, "SEED_CATEGORIES", "bool")?
                .unwrap_or(default.seed_categories),
            categories_file: lookup("CATEGORIES_FILE").filter(|s| !s.trim().is_empty()),
            verbose_logging: parsed(&lookup, "VERBOSE_LOGGING", "bool")?
                .unwrap_or(default.verbose_logging),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> AppResult<()> {
        if self.batch_size == 0 {
            return Err(invalid("BATCH_SIZE", "必须大于 0"));
        }
        if self.questions_per_category == 0 {
            return Err(invalid("QUESTIONS_PER_CATEGORY", "必须大于 0"));
        }
        if self.max_failed_batches == Some(0) {
            return Err(invalid("MAX_FAILED_BATCHES", "必须大于 0，不限制请不设置该变量"));
        }
        Ok(())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn retry_jitter(&self) -> Duration {
        Duration::from_millis(self.retry_jitter_ms)
    }
}

fn required<F>(lookup: &F, var_name: &str) -> AppResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var_name)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| {
            ConfigError::EnvVarNotFound {
                var_name: var_name.to_string(),
            }
            .into()
        })
}

fn parsed<F, T>(lookup: &F, var_name: &str, expected_type: &str) -> AppResult<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var_name) {
        None => Ok(None),
        Some(value) => value.trim().parse::<T>().map(Some).map_err(|_| {
            ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }
            .into()
        }),
    }
}

fn invalid(name: &str, reason: &str) -> crate::error::AppError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_required_values_and_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/quiz"),
            ("LLM_API_KEY", "sk-test"),
        ]))
        .unwrap();

        assert_eq!(config.database_url, "postgres://localhost/quiz");
        assert_eq!(config.batch_size, 15);
        assert_eq!(config.questions_per_category, 30);
        assert_eq!(config.retry_delay(), Duration::from_secs(5));
        assert_eq!(config.max_failed_batches, None);
        assert!((config.llm_temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_missing_database_url_is_fatal() {
        let result = Config::from_lookup(lookup_from(&[("LLM_API_KEY", "sk-test")]));

        match result {
            Err(AppError::Config(ConfigError::EnvVarNotFound { var_name })) => {
                assert_eq!(var_name, "DATABASE_URL")
            }
            other => panic!("应该返回缺少环境变量错误: {:?}", other),
        }
    }

    #[test]
    fn test_unparsable_number() {
        let result = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/quiz"),
            ("LLM_API_KEY", "sk-test"),
            ("BATCH_SIZE", "fifteen"),
        ]));

        assert!(matches!(
            result,
            Err(AppError::Config(ConfigError::EnvVarParseFailed { .. }))
        ));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let result = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/quiz"),
            ("LLM_API_KEY", "sk-test"),
            ("BATCH_SIZE", "0"),
        ]));

        assert!(matches!(
            result,
            Err(AppError::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn test_retry_ceiling_and_filter() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/quiz"),
            ("LLM_API_KEY", "sk-test"),
            ("MAX_FAILED_BATCHES", "12"),
            ("CATEGORY_SLUG", "collections"),
        ]))
        .unwrap();

        assert_eq!(config.max_failed_batches, Some(12));
        assert_eq!(config.category_slug.as_deref(), Some("collections"));
    }
}
