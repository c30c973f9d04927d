use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 数据库错误
    #[error("数据库错误: {0}")]
    Database(#[from] DatabaseError),
    /// LLM 服务错误
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    /// 题目生成错误
    #[error("生成错误: {0}")]
    Generation(#[from] GenerationError),
    /// 正则表达式编译失败
    #[error("正则表达式编译失败: {0}")]
    Regex(#[from] regex::Error),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 环境变量不存在
    #[error("环境变量 {var_name} 不存在")]
    EnvVarNotFound { var_name: String },
    /// 取值不合法
    #[error("配置项 {name} 取值不合法: {reason}")]
    InvalidValue { name: String, reason: String },
}

/// 数据库错误
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// 连接数据库失败
    #[error("无法连接数据库: {source}")]
    ConnectionFailed {
        #[source]
        source: sqlx::Error,
    },
    /// 查询失败
    #[error("查询失败 ({operation}): {source}")]
    QueryFailed {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

/// LLM 服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// 构建请求失败
    #[error("构建 LLM 请求失败 (模型: {model}): {source}")]
    RequestBuildFailed {
        model: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {source}")]
    ApiCallFailed {
        model: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
}

/// 题目生成错误
#[derive(Debug, Error)]
pub enum GenerationError {
    /// 连续无产出的批次达到上限
    #[error("分类 {category} 连续 {failed_batches} 个批次没有产出，已放弃 (已入库 {accepted}/{target})")]
    RetryLimitExceeded {
        category: String,
        failed_batches: u32,
        accepted: usize,
        target: usize,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建查询失败错误
    pub fn query_failed(operation: &'static str, source: sqlx::Error) -> Self {
        AppError::Database(DatabaseError::QueryFailed { operation, source })
    }

    /// 创建LLM API调用错误
    pub fn llm_api_failed(
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Llm(LlmError::ApiCallFailed {
            model: model.into(),
            source: Box::new(source),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
