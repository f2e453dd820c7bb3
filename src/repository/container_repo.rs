// ==========================================
// 货物装箱与路径决策引擎 - 集装箱仓储
// ==========================================
// 职责: 管理 container / container_item 表
// 说明: 箱内货物按装入顺序 (seq_no) 保存，整箱保存在单个事务内完成
// 红线: 不含业务逻辑（容量与状态守卫由生命周期引擎负责）
// ==========================================

use crate::db::{ensure_schema, open_sqlite_connection};
use crate::domain::container::{Container, ContainerItem};
use crate::domain::types::ContainerStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::parse_text_column;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Result as SqliteResult, Row,
};
use std::sync::{Arc, Mutex};

const CONTAINER_COLUMNS: &str = r#"
    container_id, container_number, destination,
    max_weight, max_volume,
    current_weight, current_volume, item_count,
    status, created_at, closed_at, dispatched_at, delivered_at
"#;

// ==========================================
// ContainerRepository - 集装箱仓储
// ==========================================
pub struct ContainerRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ContainerRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        ensure_schema(&*repo.get_conn()?)?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // 箱内货物另行加载
    fn map_row(row: &Row<'_>) -> SqliteResult<Container> {
        Ok(Container {
            container_id: row.get(0)?,
            container_number: row.get(1)?,
            destination: row.get(2)?,
            max_weight: row.get(3)?,
            max_volume: row.get(4)?,
            current_weight: row.get(5)?,
            current_volume: row.get(6)?,
            item_count: row.get(7)?,
            status: parse_text_column(8, row.get(8)?)?,
            items: Vec::new(),
            created_at: row.get(9)?,
            closed_at: row.get(10)?,
            dispatched_at: row.get(11)?,
            delivered_at: row.get(12)?,
        })
    }

    fn load_items(conn: &Connection, container_id: &str) -> SqliteResult<Vec<ContainerItem>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT item_id, tracking_id, description, weight, length, width, height
            FROM container_item
            WHERE container_id = ?1
            ORDER BY seq_no ASC
            "#,
        )?;
        let items = stmt
            .query_map(params![container_id], |row| {
                Ok(ContainerItem {
                    item_id: row.get(0)?,
                    tracking_id: row.get(1)?,
                    description: row.get(2)?,
                    weight: row.get(3)?,
                    length: row.get(4)?,
                    width: row.get(5)?,
                    height: row.get(6)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(items)
    }

    fn query_with_items(
        conn: &Connection,
        sql: &str,
        args: &[String],
    ) -> SqliteResult<Vec<Container>> {
        let mut stmt = conn.prepare(sql)?;
        let mut containers = stmt
            .query_map(params_from_iter(args.iter()), Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        for container in containers.iter_mut() {
            container.items = Self::load_items(conn, &container.container_id)?;
        }
        Ok(containers)
    }

    /// 插入新集装箱（含箱内货物）
    pub fn insert(&self, container: &Container) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO container (
                container_id, container_number, destination,
                max_weight, max_volume,
                current_weight, current_volume, item_count,
                status, created_at, closed_at, dispatched_at, delivered_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                container.container_id,
                container.container_number,
                container.destination,
                container.max_weight,
                container.max_volume,
                container.current_weight,
                container.current_volume,
                container.item_count,
                container.status.as_str(),
                container.created_at,
                container.closed_at,
                container.dispatched_at,
                container.delivered_at,
            ],
        )?;
        Self::write_items(&tx, container)?;
        tx.commit()?;
        Ok(())
    }

    /// 整箱保存（状态、合计、时间戳、箱内货物）
    pub fn save(&self, container: &Container) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let affected = tx.execute(
            r#"
            UPDATE container SET
                destination = ?2,
                max_weight = ?3,
                max_volume = ?4,
                current_weight = ?5,
                current_volume = ?6,
                item_count = ?7,
                status = ?8,
                closed_at = ?9,
                dispatched_at = ?10,
                delivered_at = ?11
            WHERE container_id = ?1
            "#,
            params![
                container.container_id,
                container.destination,
                container.max_weight,
                container.max_volume,
                container.current_weight,
                container.current_volume,
                container.item_count,
                container.status.as_str(),
                container.closed_at,
                container.dispatched_at,
                container.delivered_at,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Container".to_string(),
                id: container.container_id.clone(),
            });
        }

        tx.execute(
            "DELETE FROM container_item WHERE container_id = ?1",
            params![container.container_id],
        )?;
        Self::write_items(&tx, container)?;
        tx.commit()?;
        Ok(())
    }

    fn write_items(conn: &Connection, container: &Container) -> SqliteResult<()> {
        let mut stmt = conn.prepare(
            r#"
            INSERT INTO container_item (
                container_id, item_id, seq_no, tracking_id, description,
                weight, length, width, height
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )?;
        for (seq, item) in container.items.iter().enumerate() {
            stmt.execute(params![
                container.container_id,
                item.item_id,
                seq as i64,
                item.tracking_id,
                item.description,
                item.weight,
                item.length,
                item.width,
                item.height,
            ])?;
        }
        Ok(())
    }

    pub fn find_by_id(&self, container_id: &str) -> RepositoryResult<Option<Container>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM container WHERE container_id = ?1", CONTAINER_COLUMNS);
        let container = conn
            .query_row(&sql, params![container_id], Self::map_row)
            .optional()?;

        match container {
            Some(mut c) => {
                c.items = Self::load_items(&conn, &c.container_id)?;
                Ok(Some(c))
            }
            None => Ok(None),
        }
    }

    pub fn find_by_number(&self, container_number: &str) -> RepositoryResult<Option<Container>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM container WHERE container_number = ?1",
            CONTAINER_COLUMNS
        );
        let container = conn
            .query_row(&sql, params![container_number], Self::map_row)
            .optional()?;

        match container {
            Some(mut c) => {
                c.items = Self::load_items(&conn, &c.container_id)?;
                Ok(Some(c))
            }
            None => Ok(None),
        }
    }

    pub fn exists_by_number(&self, container_number: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM container WHERE container_number = ?1",
            params![container_number],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// 按状态集合查询（创建时间升序）
    pub fn list_by_statuses(&self, statuses: &[ContainerStatus]) -> RepositoryResult<Vec<Container>> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM container WHERE status IN ({}) ORDER BY created_at ASC, container_id ASC",
            CONTAINER_COLUMNS,
            placeholders(1, statuses.len())
        );
        let args: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();
        Ok(Self::query_with_items(&conn, &sql, &args)?)
    }

    /// 按目的地（大小写不敏感）+ 状态集合查询，保持创建顺序
    pub fn list_by_destination_and_statuses(
        &self,
        destination: &str,
        statuses: &[ContainerStatus],
    ) -> RepositoryResult<Vec<Container>> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM container WHERE UPPER(destination) = UPPER(?1) AND status IN ({}) \
             ORDER BY created_at ASC, container_id ASC",
            CONTAINER_COLUMNS,
            placeholders(2, statuses.len())
        );
        let mut args = vec![destination.to_string()];
        args.extend(statuses.iter().map(|s| s.as_str().to_string()));
        Ok(Self::query_with_items(&conn, &sql, &args)?)
    }

    /// 货物当前所在的集装箱 ID
    pub fn find_container_id_of_item(&self, item_id: &str) -> RepositoryResult<Option<String>> {
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

    /// 删除集装箱（箱内货物级联删除），返回是否存在
    pub fn delete(&self, container_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM container WHERE container_id = ?1",
            params![container_id],
        )?;
        Ok(affected > 0)
    }

    pub fn count_by_status(&self) -> RepositoryResult<Vec<(ContainerStatus, i64)>> {
        let conn = self.get_conn()?;
        let mut stmt = conn
            .prepare("SELECT status, COUNT(*) FROM container GROUP BY status ORDER BY status")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    parse_text_column::<ContainerStatus>(0, row.get(0)?)?,
                    row.get::<_, i64>(1)?,
                ))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }
}

/// 生成 "?n, ?n+1, ..." 占位符
fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}
