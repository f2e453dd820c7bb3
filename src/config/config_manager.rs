// ==========================================
// 货物装箱与路径决策引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope，目前只用 global)
// 说明: 无效配置值回落默认值并告警，不中断业务
// ==========================================

use crate::db::{configure_sqlite_connection, ensure_schema, open_sqlite_connection};
use crate::engine::route_planner::RoutingConfig;
use crate::engine::strategy::PlacementStrategy;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA 并建表（均幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            ensure_schema(&guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES (?1, ?2, ?3, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            params![GLOBAL_SCOPE, key, value],
        )?;
        tracing::info!(config_key = key, value, "配置已更新");
        Ok(())
    }

    /// 读取并解析配置值；缺失或格式错误时返回默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> RepositoryResult<T>
    where
        T: FromStr,
    {
        let Some(raw) = self.get_global_config_value(key)? else {
            return Ok(default);
        };

        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(config_key = key, raw_value = %raw, "配置格式错误，使用默认值");
                Ok(default)
            }
        }
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    // ===== 装箱策略 =====

    /// 当前生效的装箱策略（默认 BEST_FIT）
    pub fn get_placement_strategy(&self) -> RepositoryResult<PlacementStrategy> {
        self.get_parsed_or_default(config_keys::PLACEMENT_STRATEGY, PlacementStrategy::default())
    }

    pub fn set_placement_strategy(&self, strategy: PlacementStrategy) -> RepositoryResult<()> {
        self.set_global_config_value(config_keys::PLACEMENT_STRATEGY, strategy.as_str())
    }

    // ===== 路径规划 =====

    pub fn get_routing_config(&self) -> RepositoryResult<RoutingConfig> {
        let defaults = RoutingConfig::default();
        Ok(RoutingConfig {
            heavy_item_threshold: self.get_parsed_or_default(
                config_keys::HEAVY_ITEM_THRESHOLD,
                defaults.heavy_item_threshold,
            )?,
            sorting_hysteresis: self
                .get_parsed_or_default(config_keys::SORTING_HYSTERESIS, defaults.sorting_hysteresis)?,
            recovered_station_load: self.get_parsed_or_default(
                config_keys::RECOVERED_STATION_LOAD,
                defaults.recovered_station_load,
            )?,
        })
    }

    pub fn set_routing_config(&self, config: &RoutingConfig) -> RepositoryResult<()> {
        self.set_global_config_value(
            config_keys::HEAVY_ITEM_THRESHOLD,
            &config.heavy_item_threshold.to_string(),
        )?;
        self.set_global_config_value(
            config_keys::SORTING_HYSTERESIS,
            &config.sorting_hysteresis.to_string(),
        )?;
        self.set_global_config_value(
            config_keys::RECOVERED_STATION_LOAD,
            &config.recovered_station_load.to_string(),
        )
    }

    /// 设施负载随机种子（未配置时使用系统熵）
    pub fn get_facility_seed(&self) -> RepositoryResult<Option<u64>> {
        let Some(raw) = self.get_global_config_value(config_keys::FACILITY_SEED)? else {
            return Ok(None);
        };
        match raw.trim().parse::<u64>() {
            Ok(seed) => Ok(Some(seed)),
            Err(_) => {
                tracing::warn!(raw_value = %raw, "facility_seed 格式错误，忽略");
                Ok(None)
            }
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 装箱
    pub const PLACEMENT_STRATEGY: &str = "placement_strategy";

    // 路径规划
    pub const HEAVY_ITEM_THRESHOLD: &str = "heavy_item_threshold";
    pub const SORTING_HYSTERESIS: &str = "sorting_hysteresis";
    pub const RECOVERED_STATION_LOAD: &str = "recovered_station_load";

    // 设施模拟
    pub const FACILITY_SEED: &str = "facility_seed";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_placement_strategy_round_trip() {
        let config = manager();
        assert_eq!(config.get_placement_strategy().unwrap(), PlacementStrategy::BestFit);

        config.set_placement_strategy(PlacementStrategy::WorstFit).unwrap();
        assert_eq!(config.get_placement_strategy().unwrap(), PlacementStrategy::WorstFit);
    }

    #[test]
    fn test_invalid_value_falls_back_to_default() {
        let config = manager();
        config
            .set_global_config_value(config_keys::PLACEMENT_STRATEGY, "RANDOM_FIT")
            .unwrap();
        config
            .set_global_config_value(config_keys::SORTING_HYSTERESIS, "abc")
            .unwrap();

        assert_eq!(config.get_placement_strategy().unwrap(), PlacementStrategy::BestFit);
        assert_eq!(config.get_routing_config().unwrap(), RoutingConfig::default());
    }

    #[test]
    fn test_routing_config_and_seed() {
        let config = manager();
        let custom = RoutingConfig {
            heavy_item_threshold: 35.5,
            sorting_hysteresis: 10,
            recovered_station_load: 0,
        };
        config.set_routing_config(&custom).unwrap();
        assert_eq!(config.get_routing_config().unwrap(), custom);

        assert_eq!(config.get_facility_seed().unwrap(), None);
        config.set_global_config_value(config_keys::FACILITY_SEED, "42").unwrap();
        assert_eq!(config.get_facility_seed().unwrap(), Some(42));

        let snapshot: BTreeMap<String, String> =
            serde_json::from_str(&config.get_config_snapshot().unwrap()).unwrap();
        assert_eq!(snapshot.get("facility_seed").map(String::as_str), Some("42"));
        assert_eq!(snapshot.len(), 4);
    }
}
