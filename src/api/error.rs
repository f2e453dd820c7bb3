// ==========================================
// 货物装箱与路径决策引擎 - API层错误类型
// ==========================================
// 职责: 汇总业务错误，转换 Repository/导入错误为调用方可理解的错误
// 说明: 业务错误均不可重试，直接返回给调用方
// ==========================================

use crate::domain::error::LogisticsError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error(transparent)]
    Logistics(#[from] LogisticsError),

    #[error("无效输入: {0}")]
    InvalidInput(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 稳定错误码
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Logistics(e) => e.error_code(),
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::DatabaseError(_) | ApiError::DatabaseConnectionError(_) => "DATABASE_ERROR",
            ApiError::ImportError(_) => "IMPORT_ERROR",
            ApiError::InternalError(_) | ApiError::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// 取出业务错误（若是）
    pub fn as_logistics(&self) -> Option<&LogisticsError> {
        match self {
            ApiError::Logistics(e) => Some(e),
            _ => None,
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 唯一约束 → 重复，未找到 → 未找到，其余归为数据库错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::Logistics(LogisticsError::NotFound { entity, id })
            }
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::Logistics(LogisticsError::Duplicate(msg))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::DatabaseQueryError(msg)
            | RepositoryError::ForeignKeyViolation(msg) => ApiError::DatabaseError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::DatabaseError(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        ApiError::ImportError(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
