// ==========================================
// 货物装箱与路径决策引擎 - 配置层
// ==========================================
// 职责: 系统配置管理（装箱策略、路径规划参数、随机种子）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
