// ==========================================
// 货物装箱与路径决策引擎 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、容量约束接口、业务错误
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod capacity;
pub mod container;
pub mod error;
pub mod item;
pub mod route;
pub mod types;

// 重导出核心类型
pub use capacity::{CapacityConstraint, Utilization};
pub use container::{Container, ContainerItem, ContainerSpec};
pub use error::{LogisticsError, LogisticsResult};
pub use item::{Item, ItemRegistration, ItemSnapshot, DEFAULT_PRIORITY};
pub use route::Route;
pub use types::{ContainerStatus, ItemStatus, Region, RouteStatus, Station};
