// ==========================================
// 货物装箱与路径决策引擎 - 引擎层
// ==========================================
// 职责: 装箱选择、设施网络、路径规划、生命周期状态机
// 红线: Engine 不拼 SQL，不做 I/O，只修改调用方传入的实体
// ==========================================

pub mod container_optimizer;
pub mod events;
pub mod facility;
pub mod lifecycle;
pub mod packing;
pub mod route_planner;
pub mod strategy;

// 重导出核心引擎
pub use container_optimizer::ContainerOptimizer;
pub use events::{
    ChannelEventPublisher, EntityKind, NoOpEventPublisher, OptionalEventPublisher, StatusEvent,
    StatusEventPublisher,
};
pub use facility::{FacilityNetwork, FacilityStatus, LoadRandomness, SeededRandomness, StationState};
pub use lifecycle::LifecycleEngine;
pub use packing::{ContainerSelector, PackingAlgorithm};
pub use route_planner::{RoutePlanner, RoutingConfig};
pub use strategy::PlacementStrategy;
