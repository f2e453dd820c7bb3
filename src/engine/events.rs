// ==========================================
// 货物装箱与路径决策引擎 - 状态变更事件发布
// ==========================================
// 职责: 定义状态事件发布 trait，实现依赖倒置
// 说明: Engine 层定义 trait，外部消息桥接实现适配器
// 约束: 发布失败只记录告警，不回滚已提交的状态转换
// ==========================================

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::Arc;
use tokio::sync::mpsc;

// ==========================================
// 状态事件类型
// ==========================================

/// 事件所属实体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Item,
    Container,
    Route,
    Facility,
}

impl EntityKind {
    pub fn as_str(&self) -> &str {
        match self {
            EntityKind::Item => "ITEM",
            EntityKind::Container => "CONTAINER",
            EntityKind::Route => "ROUTE",
            EntityKind::Facility => "FACILITY",
        }
    }
}

/// 状态变更事件
///
/// 每次提交的状态转换（货物/集装箱/路径）发布一条
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEvent {
    /// 实体类型
    pub entity: EntityKind,
    /// 实体 ID
    pub entity_id: String,
    /// 追踪号（货物/路径事件携带）
    pub tracking_id: Option<String>,
    /// 转换前状态（新建时为 None）
    pub previous_status: Option<String>,
    /// 新状态
    pub new_status: String,
    /// 相关指标（重量、利用率、预估耗时等）
    pub metrics: BTreeMap<String, f64>,
    /// 事件时间
    pub occurred_at: NaiveDateTime,
}

impl StatusEvent {
    pub fn new(entity: EntityKind, entity_id: impl Into<String>, new_status: impl ToString) -> Self {
        Self {
            entity,
            entity_id: entity_id.into(),
            tracking_id: None,
            previous_status: None,
            new_status: new_status.to_string(),
            metrics: BTreeMap::new(),
            occurred_at: Utc::now().naive_utc(),
        }
    }

    pub fn with_previous(mut self, previous: impl ToString) -> Self {
        self.previous_status = Some(previous.to_string());
        self
    }

    pub fn with_tracking_id(mut self, tracking_id: impl Into<String>) -> Self {
        self.tracking_id = Some(tracking_id.into());
        self
    }

    pub fn with_metric(mut self, name: &str, value: f64) -> Self {
        self.metrics.insert(name.to_string(), value);
        self
    }

    pub fn at(mut self, occurred_at: NaiveDateTime) -> Self {
        self.occurred_at = occurred_at;
        self
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 状态事件发布者 Trait
///
/// # 实现说明
/// - `ChannelEventPublisher` 把事件送入 tokio 通道，由外部消息桥接消费
/// - 投递与重试不在本引擎范围内
pub trait StatusEventPublisher: Send + Sync {
    /// 发布状态事件
    ///
    /// # 返回
    /// - `Ok(())`: 已交给下游
    /// - `Err`: 发布失败（调用方只记录告警）
    fn publish(&self, event: StatusEvent) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
///
/// 用于不需要事件发布的场景（如单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl StatusEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: StatusEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventPublisher: 跳过事件发布 - entity={}, id={}, status={}",
            event.entity.as_str(),
            event.entity_id,
            event.new_status
        );
        Ok(())
    }
}

/// 基于 tokio 无界通道的发布者
#[derive(Debug, Clone)]
pub struct ChannelEventPublisher {
    sender: mpsc::UnboundedSender<StatusEvent>,
}

impl ChannelEventPublisher {
    /// 创建发布者与对应的接收端
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StatusEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl StatusEventPublisher for ChannelEventPublisher {
    fn publish(&self, event: StatusEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.sender
            .send(event)
            .map_err(|e| format!("事件通道已关闭: {}", e.0.entity_id).into())
    }
}

/// 可选的事件发布者包装
///
/// 简化 Option<Arc<dyn StatusEventPublisher>> 的使用；失败只告警
#[derive(Clone)]
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn StatusEventPublisher>>,
}

impl OptionalEventPublisher {
    /// 创建带发布者的实例
    pub fn with_publisher(publisher: Arc<dyn StatusEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    /// 创建空实例（不发布事件）
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件（如果有发布者）；失败记录 warn 后吞掉
    pub fn publish(&self, event: StatusEvent) {
        match &self.inner {
            Some(publisher) => {
                let entity = event.entity;
                let entity_id = event.entity_id.clone();
                if let Err(e) = publisher.publish(event) {
                    tracing::warn!(
                        entity = entity.as_str(),
                        entity_id = %entity_id,
                        error = %e,
                        "状态事件发布失败"
                    );
                }
            }
            None => {
                tracing::debug!(
                    "OptionalEventPublisher: 未配置发布者，跳过事件 - entity={}, id={}",
                    event.entity.as_str(),
                    event.entity_id
                );
            }
        }
    }

    /// 检查是否配置了发布者
    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalEventPublisher {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_event_builder() {
        let event = StatusEvent::new(EntityKind::Container, "C001", "CLOSED")
            .with_previous("LOADING")
            .with_metric("weight_pct", 87.5);

        assert_eq!(event.entity_id, "C001");
        assert_eq!(event.previous_status.as_deref(), Some("LOADING"));
        assert_eq!(event.metrics.get("weight_pct"), Some(&87.5));
        assert!(event.tracking_id.is_none());
    }

    #[test]
    fn test_channel_publisher_delivers() {
        let (publisher, mut receiver) = ChannelEventPublisher::channel();
        let event = StatusEvent::new(EntityKind::Item, "I001", "ROUTING").with_tracking_id("TRK-1");

        publisher.publish(event.clone()).unwrap();
        assert_eq!(receiver.try_recv().unwrap(), event);
    }

    #[test]
    fn test_channel_publisher_closed_is_error() {
        let (publisher, receiver) = ChannelEventPublisher::channel();
        drop(receiver);

        let result = publisher.publish(StatusEvent::new(EntityKind::Route, "R001", "COMPLETED"));
        assert!(result.is_err());
    }

    #[test]
    fn test_optional_publisher_swallows_failure() {
        let (channel, receiver) = ChannelEventPublisher::channel();
        drop(receiver);

        let publisher = OptionalEventPublisher::with_publisher(Arc::new(channel));
        assert!(publisher.is_configured());
        // 不应 panic
        publisher.publish(StatusEvent::new(EntityKind::Item, "I001", "SHIPPED"));
    }

    #[test]
    fn test_optional_publisher_none() {
        let publisher = OptionalEventPublisher::none();
        assert!(!publisher.is_configured());
        publisher.publish(StatusEvent::new(EntityKind::Facility, "SORTING_AREA_A", "DOWN"));

        let noop = Arc::new(NoOpEventPublisher) as Arc<dyn StatusEventPublisher>;
        assert!(noop.publish(StatusEvent::new(EntityKind::Item, "I001", "ROUTING")).is_ok());
    }
}
