//! Order status lifecycle
//!
//! Applies partial status updates and plans the push notifications that
//! follow from them. Planning is pure (no IO) so the fan-out rules are
//! unit-testable; orchestration around the database and the notifier
//! stays thin.
//!
//! Fan-out rules per channel:
//! - `status` changed by an admin: notify the pharmacy only (the admin
//!   is acting on the warehouse's behalf).
//! - `status` changed by anyone else: notify pharmacy and admins.
//! - `warehouseStatus`: notify pharmacy and admins.
//! - `pharmacyStatus`: notify warehouse and admins.
//! A channel value with no notification phrase is persisted silently.

use shared::error::{AppError, ErrorCode};
use shared::models::{Order, OrderStatusUpdate, Role};
use shared::util::format_date;
use sqlx::PgPool;

use crate::auth::ActingUser;
use crate::db;
use crate::error::{ServiceError, ServiceResult};
use crate::notify::{Notifier, PushMessage};

pub const NOTIFICATION_TITLE: &str = "PharmaLink";

/// Everything notification planning needs to know about one order.
#[derive(Debug, Clone)]
pub struct NotifyContext {
    pub order_id: i64,
    pub pharmacy_name: String,
    pub warehouse_name: String,
    pub pharmacy_tokens: Vec<String>,
    pub warehouse_tokens: Vec<String>,
    pub admin_tokens: Vec<String>,
    pub created_at: i64,
}

impl NotifyContext {
    fn body(&self, sender_label: &str, phrase: &str) -> String {
        format!(
            "{}: طلبية الصيدلية {} من مستودع {} بتاريخ {}: {}",
            sender_label,
            self.pharmacy_name,
            self.warehouse_name,
            format_date(self.created_at),
            phrase
        )
    }

    fn messages_for(&self, audiences: &[&[String]], sender_label: &str, phrase: &str) -> Vec<PushMessage> {
        let body = self.body(sender_label, phrase);
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for audience in audiences {
            for token in *audience {
                if seen.insert(token.as_str()) {
                    out.push(PushMessage::new(
                        token.clone(),
                        NOTIFICATION_TITLE,
                        &body,
                        self.order_id,
                    ));
                }
            }
        }
        out
    }
}

/// Plan the push messages for one status update. Pure: inspects only the
/// update, the actor's role and the context.
pub fn plan_notifications(
    update: &OrderStatusUpdate,
    actor_role: Role,
    ctx: &NotifyContext,
) -> Vec<PushMessage> {
    let mut messages = Vec::new();
    let label = actor_role.label();

    if let Some(status) = update.status {
        if let Some(phrase) = status.phrase() {
            let batch = if actor_role == Role::Admin {
                ctx.messages_for(&[&ctx.pharmacy_tokens], label, phrase)
            } else {
                ctx.messages_for(&[&ctx.pharmacy_tokens, &ctx.admin_tokens], label, phrase)
            };
            messages.extend(batch);
        }
    }

    if let Some(warehouse_status) = update.warehouse_status {
        if let Some(phrase) = warehouse_status.phrase() {
            messages.extend(ctx.messages_for(
                &[&ctx.pharmacy_tokens, &ctx.admin_tokens],
                label,
                phrase,
            ));
        }
    }

    if let Some(pharmacy_status) = update.pharmacy_status {
        if let Some(phrase) = pharmacy_status.phrase() {
            messages.extend(ctx.messages_for(
                &[&ctx.warehouse_tokens, &ctx.admin_tokens],
                label,
                phrase,
            ));
        }
    }

    messages
}

async fn load_notify_context(pool: &PgPool, order: &Order) -> ServiceResult<NotifyContext> {
    let pharmacy_tokens = db::users::push_tokens(pool, order.pharmacy.id).await?;
    let warehouse_tokens = db::users::push_tokens(pool, order.warehouse.id).await?;
    let admin_tokens = db::users::admin_push_tokens(pool).await?;

    Ok(NotifyContext {
        order_id: order.id,
        pharmacy_name: order.pharmacy.name.clone(),
        warehouse_name: order.warehouse.name.clone(),
        pharmacy_tokens,
        warehouse_tokens,
        admin_tokens,
        created_at: order.created_at,
    })
}

/// Apply a partial status update to one order, then dispatch the planned
/// notifications best-effort. Returns the updated order.
pub async fn apply_status_update(
    pool: &PgPool,
    notifier: &Notifier,
    order_id: i64,
    update: OrderStatusUpdate,
    actor: ActingUser,
) -> ServiceResult<Order> {
    let updated = db::orders::update_status(pool, order_id, &update).await?;
    if !updated {
        return Err(ServiceError::App(AppError::new(ErrorCode::OrderNotFound)));
    }

    let order = db::orders::find_by_id(pool, order_id)
        .await?
        .ok_or_else(|| ServiceError::App(AppError::new(ErrorCode::OrderNotFound)))?;

    let ctx = load_notify_context(pool, &order).await?;
    notifier.dispatch(plan_notifications(&update, actor.role, &ctx));

    Ok(order)
}

/// Run one operation per order id, sequentially and independently. A
/// failure is logged and the batch continues. Returns the ids that
/// succeeded.
async fn run_batch<F, Fut>(order_ids: &[i64], mut apply: F) -> Vec<i64>
where
    F: FnMut(i64) -> Fut,
    Fut: std::future::Future<Output = ServiceResult<()>>,
{
    let mut updated = Vec::with_capacity(order_ids.len());
    for &order_id in order_ids {
        match apply(order_id).await {
            Ok(()) => updated.push(order_id),
            Err(e) => {
                let err: AppError = e.into();
                tracing::warn!(order_id, error = %err, "batch status update failed for order");
            }
        }
    }
    updated
}

/// Apply the same status update to several orders sequentially. Each order
/// is updated and notified on its own. Returns the ids that were updated
/// successfully.
pub async fn apply_status_update_batch(
    pool: &PgPool,
    notifier: &Notifier,
    order_ids: &[i64],
    update: OrderStatusUpdate,
    actor: ActingUser,
) -> Vec<i64> {
    run_batch(order_ids, |order_id| async move {
        apply_status_update(pool, notifier, order_id, update, actor)
            .await
            .map(|_| ())
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{OrderStatus, PharmacyStatus, WarehouseStatus};

    fn ctx() -> NotifyContext {
        NotifyContext {
            order_id: 77,
            pharmacy_name: "صيدلية الشفاء".into(),
            warehouse_name: "مستودع النور".into(),
            pharmacy_tokens: vec!["ph-1".into(), "ph-2".into()],
            warehouse_tokens: vec!["wh-1".into()],
            admin_tokens: vec!["ad-1".into()],
            // 2024-03-05 00:00:00 UTC
            created_at: 1_709_596_800_000,
        }
    }

    #[test]
    fn admin_status_change_notifies_pharmacy_only() {
        let update = OrderStatusUpdate {
            status: Some(OrderStatus::Confirm),
            ..Default::default()
        };
        let messages = plan_notifications(&update, Role::Admin, &ctx());

        let tokens: Vec<&str> = messages.iter().map(|m| m.to.as_str()).collect();
        assert_eq!(tokens, ["ph-1", "ph-2"]);
    }

    #[test]
    fn warehouse_status_change_notifies_pharmacy_and_admins() {
        let update = OrderStatusUpdate {
            status: Some(OrderStatus::Shipping),
            ..Default::default()
        };
        let messages = plan_notifications(&update, Role::Warehouse, &ctx());

        let tokens: Vec<&str> = messages.iter().map(|m| m.to.as_str()).collect();
        assert_eq!(tokens, ["ph-1", "ph-2", "ad-1"]);
    }

    #[test]
    fn warehouse_sub_status_notifies_pharmacy_and_admins() {
        let update = OrderStatusUpdate {
            warehouse_status: Some(WarehouseStatus::Declined),
            ..Default::default()
        };
        let messages = plan_notifications(&update, Role::Admin, &ctx());

        let tokens: Vec<&str> = messages.iter().map(|m| m.to.as_str()).collect();
        assert_eq!(tokens, ["ph-1", "ph-2", "ad-1"]);
    }

    #[test]
    fn pharmacy_sub_status_notifies_warehouse_and_admins() {
        let update = OrderStatusUpdate {
            pharmacy_status: Some(PharmacyStatus::Received),
            ..Default::default()
        };
        let messages = plan_notifications(&update, Role::Pharmacy, &ctx());

        let tokens: Vec<&str> = messages.iter().map(|m| m.to.as_str()).collect();
        assert_eq!(tokens, ["wh-1", "ad-1"]);
    }

    #[test]
    fn phraseless_values_produce_no_messages() {
        let update = OrderStatusUpdate {
            status: Some(OrderStatus::Pending),
            warehouse_status: Some(WarehouseStatus::Unread),
            ..Default::default()
        };
        assert!(plan_notifications(&update, Role::Warehouse, &ctx()).is_empty());
    }

    #[test]
    fn seen_flag_alone_produces_no_messages() {
        let update = OrderStatusUpdate {
            seen_by_admin: Some(true),
            ..Default::default()
        };
        assert!(plan_notifications(&update, Role::Admin, &ctx()).is_empty());
    }

    #[test]
    fn empty_audience_produces_no_messages() {
        let mut context = ctx();
        context.pharmacy_tokens.clear();
        context.admin_tokens.clear();

        let update = OrderStatusUpdate {
            status: Some(OrderStatus::Delivery),
            ..Default::default()
        };
        assert!(plan_notifications(&update, Role::Warehouse, &context).is_empty());
    }

    #[test]
    fn shared_tokens_are_deduplicated_within_a_channel() {
        let mut context = ctx();
        context.admin_tokens = vec!["ph-1".into(), "ad-1".into()];

        let update = OrderStatusUpdate {
            status: Some(OrderStatus::Confirm),
            ..Default::default()
        };
        let messages = plan_notifications(&update, Role::Warehouse, &context);

        let tokens: Vec<&str> = messages.iter().map(|m| m.to.as_str()).collect();
        assert_eq!(tokens, ["ph-1", "ph-2", "ad-1"]);
    }

    #[test]
    fn multiple_channels_plan_independently() {
        let update = OrderStatusUpdate {
            status: Some(OrderStatus::Confirm),
            warehouse_status: Some(WarehouseStatus::Sent),
            ..Default::default()
        };
        let messages = plan_notifications(&update, Role::Admin, &ctx());

        // status (admin actor): pharmacy only; warehouseStatus: pharmacy + admins
        assert_eq!(messages.len(), 2 + 3);
        let confirm_phrase = OrderStatus::Confirm.phrase().unwrap();
        let sent_phrase = WarehouseStatus::Sent.phrase().unwrap();
        assert!(messages[0].body.contains(confirm_phrase));
        assert!(messages[4].body.contains(sent_phrase));
    }

    #[tokio::test]
    async fn batch_continues_past_a_failing_order() {
        let ids = [11i64, 12, 13, 14];
        let attempted = std::cell::RefCell::new(Vec::new());

        let updated = run_batch(&ids, |id| {
            attempted.borrow_mut().push(id);
            async move {
                if id == 12 {
                    Err(ServiceError::App(AppError::new(ErrorCode::OrderNotFound)))
                } else {
                    Ok(())
                }
            }
        })
        .await;

        // Every id got its own attempt; only the failing one is missing
        // from the result.
        assert_eq!(attempted.into_inner(), vec![11, 12, 13, 14]);
        assert_eq!(updated, vec![11, 13, 14]);
    }

    #[tokio::test]
    async fn batch_of_n_ids_runs_n_operations_even_when_all_fail() {
        let ids = [1i64, 2, 3];
        let attempted = std::cell::RefCell::new(0usize);

        let updated = run_batch(&ids, |_id| {
            *attempted.borrow_mut() += 1;
            async move { Err(ServiceError::App(AppError::new(ErrorCode::OrderNotFound))) }
        })
        .await;

        assert_eq!(attempted.into_inner(), 3);
        assert!(updated.is_empty());
    }

    #[test]
    fn body_names_both_parties_and_the_order_date() {
        let update = OrderStatusUpdate {
            status: Some(OrderStatus::Delivery),
            ..Default::default()
        };
        let messages = plan_notifications(&update, Role::Warehouse, &ctx());

        let body = &messages[0].body;
        assert!(body.starts_with(Role::Warehouse.label()));
        assert!(body.contains("صيدلية الشفاء"));
        assert!(body.contains("مستودع النور"));
        assert!(body.contains("05/03/2024"));
        assert!(body.contains(OrderStatus::Delivery.phrase().unwrap()));
        assert_eq!(messages[0].title, NOTIFICATION_TITLE);
    }
}
