// ==========================================
// 货物 API 集成测试
// ==========================================
// 覆盖: 登记、状态链、明细修改、统计、删除
// ==========================================


#[cfg(test)]
mod item_api_test {
    use freight_routing::ItemStatus;

    use crate::test_helpers::{container_spec, create_test_state, registration};

    #[test]
    fn test_item_status_chain_is_strict() {
        let (_tmp, state) = create_test_state(31);
        let api = &state.item_api;
        let item = api
            .register_item(registration("Atlanta", 8.0, (1.0, 1.0, 1.0)))
            .unwrap();
        assert_eq!(item.status, ItemStatus::Registered);

        let err = api
            .update_item_status(&item.item_id, ItemStatus::Processing)
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_STATUS_TRANSITION", "跳过 ROUTING 应失败");

        let routed = api.update_item_status(&item.item_id, ItemStatus::Routing).unwrap();
        assert_eq!(routed.status, ItemStatus::Routing);

        let err = api
            .update_item_status(&item.item_id, ItemStatus::Routing)
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_STATUS_TRANSITION", "重复转换应失败");

        for target in [ItemStatus::Processing, ItemStatus::Containerized, ItemStatus::Shipped] {
            api.update_item_status(&item.item_id, target).unwrap();
        }
        let shipped = api.get_item(&item.item_id).unwrap();
        assert_eq!(shipped.status, ItemStatus::Shipped);

        let err = api
            .update_item_status(&item.item_id, ItemStatus::Registered)
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_STATUS_TRANSITION", "终态不可回退");

        let missing = api.update_item_status("I404", ItemStatus::Routing).unwrap_err();
        assert_eq!(missing.error_code(), "NOT_FOUND");
    }

    #[test]
    fn test_update_details_keeps_identity_and_status() {
        let (_tmp, state) = create_test_state(32);
        let api = &state.item_api;
        let item = api
            .register_item(registration("Atlanta", 8.0, (1.0, 1.0, 1.0)))
            .unwrap();
        api.update_item_status(&item.item_id, ItemStatus::Routing).unwrap();

        let mut details = registration("Savannah", 9.5, (2.0, 1.0, 1.0));
        details.tracking_id = Some("TRK-IGNORED".to_string());
        details.priority = Some(5);
        let updated = api.update_item_details(&item.item_id, details).unwrap();

        assert_eq!(updated.tracking_id, item.tracking_id, "追踪号不可修改");
        assert_eq!(updated.status, ItemStatus::Routing, "状态不可经由明细修改");
        assert_eq!(updated.destination, "Savannah");
        assert_eq!(updated.priority, 5);
        assert_eq!(updated.volume(), 2.0);

        let by_tracking = api.get_item_by_tracking_id(&item.tracking_id).unwrap();
        assert_eq!(by_tracking.weight, 9.5);
    }

    #[test]
    fn test_queries_statistics_and_delete() {
        let (_tmp, state) = create_test_state(33);
        let api = &state.item_api;
        let a = api.register_item(registration("Denver", 10.0, (1.0, 1.0, 1.0))).unwrap();
        api.register_item(registration("denver", 20.0, (1.0, 1.0, 1.0))).unwrap();
        api.register_item(registration("Austin", 4.0, (1.0, 1.0, 1.0))).unwrap();
        api.update_item_status(&a.item_id, ItemStatus::Routing).unwrap();

        assert_eq!(api.list_items_by_destination("DENVER").unwrap().len(), 2);
        assert_eq!(api.list_items_by_status(ItemStatus::Registered).unwrap().len(), 2);

        let averages = api.average_weight_by_destination().unwrap();
        let austin = averages.iter().find(|(d, _)| d == "Austin").unwrap();
        assert_eq!(austin.1, 4.0);

        let counts = api.item_counts_by_status().unwrap();
        let total: i64 = counts.iter().map(|c| c.count).sum();
        assert_eq!(total, 3);

        api.delete_item(&a.item_id).unwrap();
        assert_eq!(api.get_item(&a.item_id).unwrap_err().error_code(), "NOT_FOUND");
        assert_eq!(api.delete_item(&a.item_id).unwrap_err().error_code(), "NOT_FOUND");
    }

    #[test]
    fn test_delete_rejects_placed_item_and_removes_route() {
        let (_tmp, state) = create_test_state(34);
        let container = state
            .container_api
            .create_container(container_spec("Denver", 500.0, 50.0))
            .unwrap();
        let outcome = state
            .intake_api
            .process_registration(registration("Denver", 10.0, (1.0, 1.0, 1.0)))
            .unwrap();
        let item_id = outcome.item.item_id.as_str();
        assert_eq!(outcome.container_id.as_deref(), Some(container.container_id.as_str()));

        let err = state.item_api.delete_item(item_id).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_STATUS_TRANSITION", "已装箱货物不可删除");
        assert!(state.item_api.get_item(item_id).is_ok());
        assert_eq!(
            state.container_api.get_container(&container.container_id).unwrap().item_count,
            1,
            "拒绝删除后集装箱计数不变"
        );

        state
            .container_api
            .remove_item_from_container(&container.container_id, item_id)
            .unwrap();
        state.item_api.delete_item(item_id).unwrap();

        assert_eq!(state.item_api.get_item(item_id).unwrap_err().error_code(), "NOT_FOUND");
        assert_eq!(
            state.routing_api.get_route_by_item_id(item_id).unwrap_err().error_code(),
            "NOT_FOUND",
            "路径随货物一并删除"
        );
    }
}
