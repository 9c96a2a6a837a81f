//! Server-rendered operator dashboard under `/dashboard`.

use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use catalog_api::{fetch_brand_products, fetch_page, mutations, ApiContext};
use dashboard_core::{
    ConfirmationFlow, Invalidate, MutationError, Navigator, Notification, OperationKind,
};
use shared::{
    domain::{BrandId, BrandSummary, CategoryId, CategorySummary, EntityKind, ProductId},
    error::{ApiError, ErrorCode},
    pagination::{Page, Window},
    protocol::MutationResponse,
    query::{ListQuery, Location, SortOrder},
};
use storage::{EntityStore, ListFilter};
use tracing::{debug, error};

use crate::{api::status_for, app_state::AppState};

mod form;
mod render;

use form::EntityForm;
use render::{FormChoices, Row};

pub(crate) fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/dashboard") }))
        .route("/dashboard", get(overview_page))
        .route("/dashboard/:kind", get(list_page))
        .route("/dashboard/:kind/delete", post(confirm_delete))
        .route("/dashboard/:kind/create", get(create_page).post(submit_create))
        .route("/dashboard/:kind/edit/:id", get(edit_page).post(submit_edit))
        .route("/dashboard/:kind/products/:id", get(brand_products_page))
}

/// Failure rendered as a standalone HTML page.
pub(crate) struct PageError {
    status: StatusCode,
    message: String,
}

impl From<ApiError> for PageError {
    fn from(err: ApiError) -> Self {
        Self {
            status: status_for(err.code),
            message: err.message,
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let body = render::layout("Something went wrong", &[], &render::error_body(&self.message));
        (self.status, Html(body)).into_response()
    }
}

type PageResult<T> = Result<T, PageError>;

fn resolve_kind(slug: &str) -> PageResult<EntityKind> {
    EntityKind::from_slug(slug).ok_or_else(|| PageError {
        status: StatusCode::NOT_FOUND,
        message: format!("No dashboard section named '{slug}'"),
    })
}

/// Toasts to show on this render. Settled ones are consumed so they appear
/// once; loading ones stay until their operation settles.
fn take_toasts(state: &AppState) -> Vec<Notification> {
    let mut toasts = state.toasts.take_settled();
    toasts.extend(state.toasts.snapshot());
    toasts
}

fn page(state: &AppState, title: &str, body: &str) -> Html<String> {
    Html(render::layout(title, &take_toasts(state), body))
}

async fn overview_page(State(state): State<Arc<AppState>>) -> PageResult<Html<String>> {
    let overview = catalog_api::overview(&state.api).await?;
    Ok(page(&state, "Catalog overview", &render::overview(&overview)))
}

async fn list_page(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    RawQuery(raw): RawQuery,
) -> PageResult<Html<String>> {
    let kind = resolve_kind(&slug)?;
    let location = Location::with_query(kind.dashboard_path(), raw.as_deref());
    let query = ListQuery::from_location(&location);
    let flow = ConfirmationFlow::new(kind, location.clone());

    let storage = &state.api.storage;
    let rows: Page<Row> = match kind {
        EntityKind::Brand => render::brand_rows(fetch_page(storage, &query).await?, &flow),
        EntityKind::Category => render::category_rows(fetch_page(storage, &query).await?, &flow),
        EntityKind::Product => {
            render::product_rows(fetch_page(storage, &query).await?, Some(&flow))
        }
    };

    let dialog = flow.state(state.controller(OperationKind::Delete, kind));
    let mut body = render::list_view(kind, &location, &query, &rows);
    body.push_str(&render::dialog(&flow, dialog));
    Ok(page(&state, &format!("{}s", kind.label()), &body))
}

async fn brand_products_page(
    State(state): State<Arc<AppState>>,
    Path((slug, id)): Path<(String, i64)>,
    RawQuery(raw): RawQuery,
) -> PageResult<Html<String>> {
    if resolve_kind(&slug)? != EntityKind::Brand {
        return Err(PageError {
            status: StatusCode::NOT_FOUND,
            message: "Only brands have a product listing".into(),
        });
    }
    let location = Location::with_query(
        format!("{}/products/{id}", EntityKind::Brand.dashboard_path()),
        raw.as_deref(),
    );
    let query = ListQuery::from_location(&location);
    let (brand, products) = fetch_brand_products(&state.api, BrandId(id), &query).await?;

    let rows = render::product_rows(products, None);
    let body = render::list_view(EntityKind::Product, &location, &query, &rows);
    Ok(page(&state, &format!("Products of {}", brand.name), &body))
}

/// Captures the URL a flow navigates to so it can become a redirect.
#[derive(Default)]
struct RedirectNavigator {
    target: Mutex<Option<String>>,
}

impl RedirectNavigator {
    fn target(&self) -> Option<String> {
        self.target
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for RedirectNavigator {
    fn push(&self, url: &str) {
        *self.target.lock().unwrap_or_else(PoisonError::into_inner) = Some(url.to_string());
    }
}

async fn confirm_delete(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    RawQuery(raw): RawQuery,
) -> PageResult<Redirect> {
    let kind = resolve_kind(&slug)?;
    let flow = ConfirmationFlow::new(
        kind,
        Location::with_query(kind.dashboard_path(), raw.as_deref()),
    );
    let navigator = RedirectNavigator::default();
    let api = &state.api;

    let outcome = flow
        .confirm(
            state.controller(OperationKind::Delete, kind),
            &navigator,
            &state.events,
            move |id| async move { mutations::delete(api, kind, id).await },
        )
        .await;

    match outcome {
        Ok(_) => Ok(Redirect::to(
            &navigator.target().unwrap_or_else(|| flow.success_url()),
        )),
        Err(err) => {
            // The dialog stays open over the error toast.
            debug!(entity = %kind, error = %err, "delete not completed");
            Ok(Redirect::to(&flow.location().to_string()))
        }
    }
}

async fn form_choices(api: &ApiContext) -> PageResult<(Vec<BrandSummary>, Vec<CategorySummary>)> {
    let everything = Window {
        skip: 0,
        take: u32::MAX,
    };
    let filter = ListFilter::default();
    let brands =
        EntityStore::<BrandSummary>::find_many(&api.storage, &filter, SortOrder::Asc, everything)
            .await
            .map_err(load_failed)?;
    let categories =
        EntityStore::<CategorySummary>::find_many(&api.storage, &filter, SortOrder::Asc, everything)
            .await
            .map_err(load_failed)?;
    Ok((brands, categories))
}

fn load_failed(err: anyhow::Error) -> PageError {
    error!(error = %format!("{err:#}"), "failed to load form choices");
    ApiError::new(ErrorCode::Internal, "Failed to load brands and categories").into()
}

async fn render_form(
    state: &AppState,
    kind: EntityKind,
    action: &str,
    title: &str,
    values: &EntityForm,
    error: Option<&str>,
) -> PageResult<Html<String>> {
    let (brands, categories) = match kind {
        EntityKind::Product => form_choices(&state.api).await?,
        _ => (Vec::new(), Vec::new()),
    };
    let choices = FormChoices {
        brands: &brands,
        categories: &categories,
    };
    let body = render::entity_form(kind, action, values, error, &choices);
    Ok(page(state, title, &body))
}

async fn create_page(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> PageResult<Html<String>> {
    let kind = resolve_kind(&slug)?;
    let action = format!("{}/create", kind.dashboard_path());
    let title = format!("New {}", kind.label().to_ascii_lowercase());
    render_form(&state, kind, &action, &title, &EntityForm::default(), None).await
}

async fn submit_create(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Form(values): Form<EntityForm>,
) -> PageResult<Response> {
    let kind = resolve_kind(&slug)?;
    let controller = state.controller(OperationKind::Create, kind);
    let (api, form) = (&state.api, &values);
    let target = Some(values.name.trim().to_string());
    let outcome = controller
        .execute(target, move |_| async move { create(api, kind, form).await })
        .await;

    let action = format!("{}/create", kind.dashboard_path());
    let title = format!("New {}", kind.label().to_ascii_lowercase());
    settle_form(&state, kind, outcome, &action, &title, &values).await
}

async fn edit_page(
    State(state): State<Arc<AppState>>,
    Path((slug, id)): Path<(String, i64)>,
) -> PageResult<Html<String>> {
    let kind = resolve_kind(&slug)?;
    let values = match kind {
        EntityKind::Brand => {
            EntityForm::from_brand(&mutations::get_brand(&state.api, BrandId(id)).await?)
        }
        EntityKind::Category => {
            EntityForm::from_category(&mutations::get_category(&state.api, CategoryId(id)).await?)
        }
        EntityKind::Product => {
            EntityForm::from_product(&mutations::get_product(&state.api, ProductId(id)).await?)
        }
    };
    let action = format!("{}/edit/{id}", kind.dashboard_path());
    let title = format!("Edit {} #{id}", kind.label().to_ascii_lowercase());
    render_form(&state, kind, &action, &title, &values, None).await
}

async fn submit_edit(
    State(state): State<Arc<AppState>>,
    Path((slug, id)): Path<(String, i64)>,
    Form(values): Form<EntityForm>,
) -> PageResult<Response> {
    let kind = resolve_kind(&slug)?;
    let controller = state.controller(OperationKind::Update, kind);
    let (api, form) = (&state.api, &values);
    let outcome = controller
        .execute(Some(id), move |id| async move { update(api, kind, id, form).await })
        .await;

    let action = format!("{}/edit/{id}", kind.dashboard_path());
    let title = format!("Edit {} #{id}", kind.label().to_ascii_lowercase());
    settle_form(&state, kind, outcome, &action, &title, &values).await
}

/// Success goes back to the list; failure re-renders the form with the
/// submitted values.
async fn settle_form(
    state: &AppState,
    kind: EntityKind,
    outcome: Result<MutationResponse, MutationError>,
    action: &str,
    title: &str,
    values: &EntityForm,
) -> PageResult<Response> {
    match outcome {
        Ok(_) => {
            state.events.invalidate_after_change(kind);
            Ok(Redirect::to(&kind.dashboard_path()).into_response())
        }
        Err(err) => {
            let message = err.to_string();
            let html = render_form(state, kind, action, title, values, Some(&message)).await?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, html).into_response())
        }
    }
}

async fn create(
    api: &ApiContext,
    kind: EntityKind,
    form: &EntityForm,
) -> Result<MutationResponse, ApiError> {
    match kind {
        EntityKind::Brand => {
            mutations::create_brand(api, &form.brand_input()).await?;
        }
        EntityKind::Category => {
            mutations::create_category(api, &form.category_input()).await?;
        }
        EntityKind::Product => {
            mutations::create_product(api, &form.product_input()?).await?;
        }
    }
    Ok(MutationResponse::new(format!("{} created", kind.label())))
}

async fn update(
    api: &ApiContext,
    kind: EntityKind,
    id: i64,
    form: &EntityForm,
) -> Result<MutationResponse, ApiError> {
    match kind {
        EntityKind::Brand => mutations::update_brand(api, BrandId(id), &form.brand_input()).await,
        EntityKind::Category => {
            mutations::update_category(api, CategoryId(id), &form.category_input()).await
        }
        EntityKind::Product => {
            mutations::update_product(api, ProductId(id), &form.product_input()?).await
        }
    }
}
