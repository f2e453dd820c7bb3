// ==========================================
// 货物装箱与路径决策引擎 - 业务错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 五类业务失败均为本地同步、不可重试，直接返回调用方
// ==========================================

use thiserror::Error;

/// 业务规则错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LogisticsError {
    /// 引用的货物/集装箱/路径/设施不存在
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    /// 状态变更不是唯一合法后继
    #[error("无效的状态转换: {entity} from={from} to={to}")]
    InvalidTransition {
        entity: String,
        from: String,
        to: String,
    },

    /// 装入指定集装箱将超出重量/体积上限
    #[error(
        "集装箱容量不足: container_id={container_id}, weight={current_weight}+{item_weight}/{max_weight}, volume={current_volume}+{item_volume}/{max_volume}"
    )]
    CapacityExceeded {
        container_id: String,
        current_weight: f64,
        item_weight: f64,
        max_weight: f64,
        current_volume: f64,
        item_volume: f64,
        max_volume: f64,
    },

    /// id / 追踪号 / 已装箱货物冲突
    #[error("重复记录: {0}")]
    Duplicate(String),

    /// 步骤不在规划序列中（或倒退）
    #[error("无效的路径步骤: route_id={route_id}, step={step}")]
    InvalidRouteStep { route_id: String, step: String },
}

impl LogisticsError {
    pub fn not_found(entity: &str, id: impl Into<String>) -> Self {
        LogisticsError::NotFound {
            entity: entity.to_string(),
            id: id.into(),
        }
    }

    pub fn invalid_transition(
        entity: &str,
        from: impl ToString,
        to: impl ToString,
    ) -> Self {
        LogisticsError::InvalidTransition {
            entity: entity.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// 稳定错误码（对外协议）
    pub fn error_code(&self) -> &'static str {
        match self {
            LogisticsError::NotFound { .. } => "NOT_FOUND",
            LogisticsError::InvalidTransition { .. } => "INVALID_STATUS_TRANSITION",
            LogisticsError::CapacityExceeded { .. } => "CONTAINER_FULL",
            LogisticsError::Duplicate(_) => "ITEM_ALREADY_EXISTS",
            LogisticsError::InvalidRouteStep { .. } => "ROUTE_INVALID",
        }
    }
}

/// Result 类型别名
pub type LogisticsResult<T> = Result<T, LogisticsError>;
