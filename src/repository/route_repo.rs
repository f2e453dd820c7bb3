// ==========================================
// 货物装箱与路径决策引擎 - 路径仓储
// ==========================================
// 职责: 管理 route 表
// 存储: 步骤序列以 JSON 文本保存 (steps_json)
// ==========================================

use crate::db::{ensure_schema, open_sqlite_connection};
use crate::domain::route::Route;
use crate::domain::types::{RouteStatus, Station};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::parse_text_column;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const ROUTE_COLUMNS: &str = r#"
    route_id, item_id, tracking_id, steps_json,
    current_step, status, estimated_time_minutes,
    estimated_completion_time, created_at, updated_at
"#;

pub struct RouteRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RouteRepository {
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

    fn map_row(row: &Row<'_>) -> SqliteResult<Route> {
        let steps_json: String = row.get(3)?;
        let steps: Vec<Station> = serde_json::from_str(&steps_json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

        Ok(Route {
            route_id: row.get(0)?,
            item_id: row.get(1)?,
            tracking_id: row.get(2)?,
            steps,
            current_step: parse_text_column(4, row.get(4)?)?,
            status: parse_text_column(5, row.get(5)?)?,
            estimated_time_minutes: row.get(6)?,
            estimated_completion_time: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    pub fn insert(&self, route: &Route) -> RepositoryResult<()> {
        let steps_json = serde_json::to_string(&route.steps)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO route (
                route_id, item_id, tracking_id, steps_json,
                current_step, status, estimated_time_minutes,
                estimated_completion_time, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                route.route_id,
                route.item_id,
                route.tracking_id,
                steps_json,
                route.current_step.as_str(),
                route.status.as_str(),
                route.estimated_time_minutes,
                route.estimated_completion_time,
                route.created_at,
                route.updated_at,
            ],
        )?;
        Ok(())
    }

    /// 保存进度（当前步骤、状态、更新时间）
    pub fn update_progress(&self, route: &Route) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE route SET
                current_step = ?2,
                status = ?3,
                updated_at = ?4
            WHERE route_id = ?1
            "#,
            params![
                route.route_id,
                route.current_step.as_str(),
                route.status.as_str(),
                route.updated_at,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Route".to_string(),
                id: route.route_id.clone(),
            });
        }
        Ok(())
    }

    fn find_one(&self, column: &str, value: &str) -> RepositoryResult<Option<Route>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM route WHERE {} = ?1", ROUTE_COLUMNS, column);
        let route = conn
            .query_row(&sql, params![value], Self::map_row)
            .optional()?;
        Ok(route)
    }

    pub fn find_by_id(&self, route_id: &str) -> RepositoryResult<Option<Route>> {
        self.find_one("route_id", route_id)
    }

    pub fn find_by_item_id(&self, item_id: &str) -> RepositoryResult<Option<Route>> {
        self.find_one("item_id", item_id)
    }

    pub fn find_by_tracking_id(&self, tracking_id: &str) -> RepositoryResult<Option<Route>> {
        self.find_one("tracking_id", tracking_id)
    }

    pub fn list_by_status(&self, status: RouteStatus) -> RepositoryResult<Vec<Route>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM route WHERE status = ?1 ORDER BY created_at ASC, route_id ASC",
            ROUTE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let routes = stmt
            .query_map(params![status.as_str()], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(routes)
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<Route>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM route ORDER BY created_at ASC, route_id ASC",
            ROUTE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let routes = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(routes)
    }

    /// 已完成且晚于预估完成时间的路径
    pub fn list_delayed(&self) -> RepositoryResult<Vec<Route>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM route WHERE status = ?1 AND updated_at > estimated_completion_time \
             ORDER BY updated_at ASC",
            ROUTE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let routes = stmt
            .query_map(params![RouteStatus::Completed.as_str()], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(routes)
    }
}
