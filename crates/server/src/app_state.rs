use std::sync::Arc;

use catalog_api::ApiContext;
use dashboard_core::{MutationController, NotificationKey, OperationKind, ToastBoard};
use shared::{domain::EntityKind, protocol::CatalogEvent};
use tokio::sync::broadcast;

pub(crate) type DashboardController = MutationController<Arc<ToastBoard>>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) api: ApiContext,
    pub(crate) events: broadcast::Sender<CatalogEvent>,
    pub(crate) toasts: Arc<ToastBoard>,
    controllers: Arc<Controllers>,
}

/// Dashboard mutation controllers, shared by every request so the pending
/// gate holds across browser tabs.
struct Controllers {
    brand: ControllerSet,
    category: ControllerSet,
    product: ControllerSet,
}

struct ControllerSet {
    create: DashboardController,
    update: DashboardController,
    delete: DashboardController,
}

impl ControllerSet {
    fn new(entity: EntityKind, toasts: &Arc<ToastBoard>) -> Self {
        let controller = |operation| {
            MutationController::new(NotificationKey::new(operation, entity), Arc::clone(toasts))
        };
        Self {
            create: controller(OperationKind::Create),
            update: controller(OperationKind::Update),
            delete: controller(OperationKind::Delete),
        }
    }
}

impl AppState {
    pub(crate) fn new(api: ApiContext) -> Self {
        let (events, _) = broadcast::channel(256);
        let toasts = Arc::new(ToastBoard::new());
        let controllers = Controllers {
            brand: ControllerSet::new(EntityKind::Brand, &toasts),
            category: ControllerSet::new(EntityKind::Category, &toasts),
            product: ControllerSet::new(EntityKind::Product, &toasts),
        };
        Self {
            api,
            events,
            toasts,
            controllers: Arc::new(controllers),
        }
    }

    pub(crate) fn controller(
        &self,
        operation: OperationKind,
        entity: EntityKind,
    ) -> &DashboardController {
        let set = match entity {
            EntityKind::Brand => &self.controllers.brand,
            EntityKind::Category => &self.controllers.category,
            EntityKind::Product => &self.controllers.product,
        };
        match operation {
            OperationKind::Create => &set.create,
            OperationKind::Update => &set.update,
            OperationKind::Delete => &set.delete,
        }
    }
}
