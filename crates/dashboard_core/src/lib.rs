//! Operator-side building blocks for the catalog dashboard: keyed toasts,
//! the single-flight mutation gate, the delete confirmation flow and the
//! list cache those flows invalidate.

pub mod cache;
pub mod client;
pub mod mutation;
pub mod notify;
pub mod selection;

pub use cache::{Invalidate, ListCache};
pub use client::{CatalogClient, ClientError};
pub use mutation::{MutationController, MutationError, MutationOutcome, MutationPhase};
pub use notify::{
    Notification, NotificationKey, NotificationLevel, Notifier, OperationKind, ToastBoard,
};
pub use selection::{ConfirmationFlow, DialogState, Navigator};
