// ==========================================
// 货物装箱与路径决策引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod container_repo;
pub mod error;
pub mod item_repo;
pub mod route_repo;

// 重导出核心仓储
pub use container_repo::ContainerRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use item_repo::ItemRepository;
pub use route_repo::RouteRepository;

use rusqlite::types::Type;
use std::str::FromStr;

/// 文本列解析为枚举（状态、站点）
pub(crate) fn parse_text_column<T>(idx: usize, raw: String) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}
