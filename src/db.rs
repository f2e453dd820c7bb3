// ==========================================
// 货物装箱与路径决策引擎 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键、busy_timeout）
// - 幂等建表，新库与旧库都可直接打开
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 幂等创建全部业务表，并记录 schema_version
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
          version INTEGER PRIMARY KEY,
          applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
          scope_id TEXT NOT NULL,
          key TEXT NOT NULL,
          value TEXT NOT NULL,
          updated_at TEXT NOT NULL DEFAULT (datetime('now')),
          PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS item (
          item_id TEXT PRIMARY KEY,
          tracking_id TEXT NOT NULL UNIQUE,
          description TEXT NOT NULL DEFAULT '',
          weight REAL NOT NULL,
          length REAL NOT NULL,
          width REAL NOT NULL,
          height REAL NOT NULL,
          destination TEXT NOT NULL,
          priority INTEGER NOT NULL DEFAULT 1,
          status TEXT NOT NULL,
          registered_at TEXT NOT NULL,
          updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_item_status ON item(status);
        CREATE INDEX IF NOT EXISTS idx_item_destination ON item(destination);

        CREATE TABLE IF NOT EXISTS container (
          container_id TEXT PRIMARY KEY,
          container_number TEXT NOT NULL UNIQUE,
          destination TEXT NOT NULL,
          max_weight REAL NOT NULL,
          max_volume REAL NOT NULL,
          current_weight REAL NOT NULL DEFAULT 0,
          current_volume REAL NOT NULL DEFAULT 0,
          item_count INTEGER NOT NULL DEFAULT 0,
          status TEXT NOT NULL,
          created_at TEXT NOT NULL,
          closed_at TEXT,
          dispatched_at TEXT,
          delivered_at TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_container_dest_status ON container(destination, status);

        CREATE TABLE IF NOT EXISTS container_item (
          container_id TEXT NOT NULL REFERENCES container(container_id) ON DELETE CASCADE,
          item_id TEXT NOT NULL UNIQUE,
          seq_no INTEGER NOT NULL,
          tracking_id TEXT NOT NULL,
          description TEXT NOT NULL DEFAULT '',
          weight REAL NOT NULL,
          length REAL NOT NULL,
          width REAL NOT NULL,
          height REAL NOT NULL,
          PRIMARY KEY (container_id, item_id)
        );

        CREATE TABLE IF NOT EXISTS route (
          route_id TEXT PRIMARY KEY,
          item_id TEXT NOT NULL UNIQUE,
          tracking_id TEXT NOT NULL,
          steps_json TEXT NOT NULL,
          current_step TEXT NOT NULL,
          status TEXT NOT NULL,
          estimated_time_minutes REAL NOT NULL,
          estimated_completion_time TEXT NOT NULL,
          created_at TEXT NOT NULL,
          updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_route_status ON route(status);
        CREATE INDEX IF NOT EXISTS idx_route_tracking ON route(tracking_id);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
