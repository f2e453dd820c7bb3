// ==========================================
// 货物装箱与路径决策引擎 - 货物仓储
// ==========================================
// 职责: 管理 item 表的 CRUD 与统计查询
// 红线: 不含业务逻辑（状态合法性由生命周期引擎判定）
// ==========================================

use crate::db::{ensure_schema, open_sqlite_connection};
use crate::domain::item::Item;
use crate::domain::types::ItemStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::parse_text_column;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const ITEM_COLUMNS: &str = r#"
    item_id, tracking_id, description,
    weight, length, width, height,
    destination, priority, status,
    registered_at, updated_at
"#;

// ==========================================
// ItemRepository - 货物仓储
// ==========================================
pub struct ItemRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ItemRepository {
    /// 创建新的 ItemRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接创建仓储实例（幂等建表）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        ensure_schema(&*repo.get_conn()?)?;
        Ok(repo)
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> SqliteResult<Item> {
        Ok(Item {
            item_id: row.get(0)?,
            tracking_id: row.get(1)?,
            description: row.get(2)?,
            weight: row.get(3)?,
            length: row.get(4)?,
            width: row.get(5)?,
            height: row.get(6)?,
            destination: row.get(7)?,
            priority: row.get(8)?,
            status: parse_text_column(9, row.get(9)?)?,
            registered_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }

    /// 插入货物（item_id / tracking_id 冲突返回 UniqueConstraintViolation）
    pub fn insert(&self, item: &Item) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO item (
                item_id, tracking_id, description,
                weight, length, width, height,
                destination, priority, status,
                registered_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                item.item_id,
                item.tracking_id,
                item.description,
                item.weight,
                item.length,
                item.width,
                item.height,
                item.destination,
                item.priority,
                item.status.as_str(),
                item.registered_at,
                item.updated_at,
            ],
        )?;
        Ok(())
    }

    /// 更新货物（除 item_id / tracking_id / registered_at 外全部字段）
    pub fn update(&self, item: &Item) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE item SET
                description = ?2,
                weight = ?3,
                length = ?4,
                width = ?5,
                height = ?6,
                destination = ?7,
                priority = ?8,
                status = ?9,
                updated_at = ?10
            WHERE item_id = ?1
            "#,
            params![
                item.item_id,
                item.description,
                item.weight,
                item.length,
                item.width,
                item.height,
                item.destination,
                item.priority,
                item.status.as_str(),
                item.updated_at,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Item".to_string(),
                id: item.item_id.clone(),
            });
        }
        Ok(())
    }

    /// 按 ID 查询
    pub fn find_by_id(&self, item_id: &str) -> RepositoryResult<Option<Item>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM item WHERE item_id = ?1", ITEM_COLUMNS);
        let item = conn
            .query_row(&sql, params![item_id], Self::map_row)
            .optional()?;
        Ok(item)
    }

    /// 按追踪号查询
    pub fn find_by_tracking_id(&self, tracking_id: &str) -> RepositoryResult<Option<Item>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM item WHERE tracking_id = ?1", ITEM_COLUMNS);
        let item = conn
            .query_row(&sql, params![tracking_id], Self::map_row)
            .optional()?;
        Ok(item)
    }

    pub fn exists_by_tracking_id(&self, tracking_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM item WHERE tracking_id = ?1",
            params![tracking_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// 按状态查询（登记时间升序）
    pub fn list_by_status(&self, status: ItemStatus) -> RepositoryResult<Vec<Item>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM item WHERE status = ?1 ORDER BY registered_at ASC, item_id ASC",
            ITEM_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map(params![status.as_str()], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(items)
    }

    /// 按目的地查询（大小写不敏感）
    pub fn list_by_destination(&self, destination: &str) -> RepositoryResult<Vec<Item>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM item WHERE UPPER(destination) = UPPER(?1) ORDER BY registered_at ASC, item_id ASC",
            ITEM_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map(params![destination], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(items)
    }

    /// 货物所在集装箱 ID（未装箱 → None）
    pub fn placed_container_id(&self, item_id: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let id = conn
            .query_row(
                "SELECT container_id FROM container_item WHERE item_id = ?1",
                params![item_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(id)
    }

    /// 删除未装箱的货物及其路径，返回是否删除
    ///
    /// 已装箱的货物不删除（返回 false）
    pub fn delete_unplaced(&self, item_id: &str) -> RepositoryResult<bool> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let affected = tx.execute(
            r#"
            DELETE FROM item
            WHERE item_id = ?1
              AND NOT EXISTS (SELECT 1 FROM container_item WHERE item_id = ?1)
            "#,
            params![item_id],
        )?;
        if affected > 0 {
            tx.execute("DELETE FROM route WHERE item_id = ?1", params![item_id])?;
        }
        tx.commit()?;
        Ok(affected > 0)
    }

    /// 各状态货物数量
    pub fn count_by_status(&self) -> RepositoryResult<Vec<(ItemStatus, i64)>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT status, COUNT(*) FROM item GROUP BY status ORDER BY status")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((parse_text_column::<ItemStatus>(0, row.get(0)?)?, row.get::<_, i64>(1)?))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 各目的地平均重量
    pub fn average_weight_by_destination(&self) -> RepositoryResult<Vec<(String, f64)>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT destination, AVG(weight) FROM item GROUP BY destination ORDER BY destination",
        )?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }
}
