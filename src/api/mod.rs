// ==========================================
// 货物装箱与路径决策引擎 - API 层
// ==========================================
// 职责: 组合引擎、仓储与事件发布，对外提供业务接口
// ==========================================

pub mod container_api;
pub mod error;
pub mod intake_api;
pub mod item_api;
pub mod routing_api;

// 重导出核心类型
pub use container_api::{ContainerApi, DestinationUtilization, HIGH_UTILIZATION_PCT};
pub use error::{ApiError, ApiResult};
pub use intake_api::{IntakeApi, IntakeBatchReport, IntakeOutcome};
pub use item_api::{ItemApi, StatusCount};
pub use routing_api::RoutingApi;

use chrono::{NaiveDateTime, Utc};

/// 统一时间戳（UTC，无时区）
pub(crate) fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}
