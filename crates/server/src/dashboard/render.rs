//! HTML for the dashboard pages. Every dynamic value passes through
//! [`escape`] before it is written into markup.

use std::fmt::Write as _;

use dashboard_core::{ConfirmationFlow, DialogState, Notification, NotificationLevel};
use shared::{
    domain::{format_price, BrandSummary, CategorySummary, EntityKind, ProductSummary},
    pagination::{page_links, Page, PageLink},
    protocol::CatalogOverview,
    query::{ListQuery, Location, SortOrder},
};

use super::form::EntityForm;

const PER_PAGE_CHOICES: [u32; 3] = [5, 10, 20];

pub(crate) fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub(crate) fn layout(title: &str, toasts: &[Notification], body: &str) -> String {
    let mut nav = String::new();
    for kind in EntityKind::ALL {
        let _ = write!(
            nav,
            r#"<a href="{}">{}s</a> "#,
            kind.dashboard_path(),
            kind.label()
        );
    }
    format!(
        r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>{title} | Catalog admin</title></head>
<body>
<nav><a href="/dashboard">Overview</a> {nav}</nav>
{toasts}
<main>
<h1>{title}</h1>
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
        toasts = render_toasts(toasts),
    )
}

fn render_toasts(toasts: &[Notification]) -> String {
    if toasts.is_empty() {
        return String::new();
    }
    let mut out = String::from(r#"<ul class="toasts">"#);
    for toast in toasts {
        let level = match toast.level {
            NotificationLevel::Loading => "loading",
            NotificationLevel::Success => "success",
            NotificationLevel::Error => "error",
        };
        let _ = write!(
            out,
            r#"<li class="toast toast-{level}" data-key="{}">{}</li>"#,
            toast.key,
            escape(&toast.message)
        );
    }
    out.push_str("</ul>");
    out
}

pub(crate) fn overview(overview: &CatalogOverview) -> String {
    let counts = [
        (EntityKind::Brand, overview.brands),
        (EntityKind::Category, overview.categories),
        (EntityKind::Product, overview.products),
    ];
    let mut out = String::from("<dl>");
    for (kind, count) in counts {
        let _ = write!(
            out,
            r#"<dt><a href="{}">{}s</a></dt><dd>{count}</dd>"#,
            kind.dashboard_path(),
            kind.label()
        );
    }
    out.push_str("</dl>");
    out
}

pub(crate) struct Action {
    label: &'static str,
    href: String,
}

/// One table row with its cells already escaped.
pub(crate) struct Row {
    cells: Vec<String>,
    actions: Vec<Action>,
}

pub(crate) fn brand_rows(page: Page<BrandSummary>, flow: &ConfirmationFlow) -> Page<Row> {
    page.map(|brand| Row {
        cells: vec![
            brand.id.to_string(),
            image_cell(brand.image_url.as_deref(), &brand.name),
            escape(&brand.name),
            brand.product_count.to_string(),
        ],
        actions: vec![
            Action {
                label: "View products",
                href: format!("{}/products/{}", EntityKind::Brand.dashboard_path(), brand.id),
            },
            edit_action(EntityKind::Brand, brand.id.0),
            delete_action(flow, brand.id.0),
        ],
    })
}

pub(crate) fn category_rows(page: Page<CategorySummary>, flow: &ConfirmationFlow) -> Page<Row> {
    page.map(|category| Row {
        cells: vec![
            category.id.to_string(),
            escape(&category.name),
            category.product_count.to_string(),
        ],
        actions: vec![
            edit_action(EntityKind::Category, category.id.0),
            delete_action(flow, category.id.0),
        ],
    })
}

/// Product rows; `flow` is absent on read-only listings.
pub(crate) fn product_rows(
    page: Page<ProductSummary>,
    flow: Option<&ConfirmationFlow>,
) -> Page<Row> {
    page.map(|product| {
        let mut actions = vec![edit_action(EntityKind::Product, product.id.0)];
        if let Some(flow) = flow {
            actions.push(delete_action(flow, product.id.0));
        }
        Row {
            cells: vec![
                product.id.to_string(),
                image_cell(product.image_url.as_deref(), &product.name),
                escape(&product.name),
                escape(&product.brand_name),
                product
                    .category_name
                    .as_deref()
                    .map(escape)
                    .unwrap_or_else(|| "-".into()),
                format_price(product.price_cents),
            ],
            actions,
        }
    })
}

pub(crate) fn headers(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Brand => &["ID", "Image", "Name", "Products"],
        EntityKind::Category => &["ID", "Name", "Products"],
        EntityKind::Product => &["ID", "Image", "Name", "Brand", "Category", "Price"],
    }
}

fn image_cell(url: Option<&str>, alt: &str) -> String {
    match url {
        Some(url) => format!(
            r#"<img src="{}" alt="{}" width="48" height="48">"#,
            escape(url),
            escape(alt)
        ),
        None => "-".into(),
    }
}

fn edit_action(kind: EntityKind, id: i64) -> Action {
    Action {
        label: "Edit",
        href: format!("{}/edit/{id}", kind.dashboard_path()),
    }
}

fn delete_action(flow: &ConfirmationFlow, id: i64) -> Action {
    Action {
        label: "Delete",
        href: flow.request_url(id),
    }
}

/// Search box, sortable table, pagination and per-page choices for one list.
pub(crate) fn list_view(
    kind: EntityKind,
    location: &Location,
    query: &ListQuery,
    rows: &Page<Row>,
) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        r#"<p><a href="{}/create">New {}</a></p>"#,
        kind.dashboard_path(),
        kind.label().to_ascii_lowercase()
    );
    out.push_str(&search_form(location, query));
    out.push_str(&table(kind, location, query, rows));
    out.push_str(&pagination(location, query, rows));
    out
}

fn search_form(location: &Location, query: &ListQuery) -> String {
    let mut hidden = String::new();
    if let Some(sort) = query.sort.as_param() {
        let _ = write!(hidden, r#"<input type="hidden" name="sort" value="{sort}">"#);
    }
    if query.per_page != ListQuery::default().per_page {
        let _ = write!(
            hidden,
            r#"<input type="hidden" name="perPage" value="{}">"#,
            query.per_page
        );
    }
    format!(
        r#"<form method="get" action="{action}" role="search">
<input type="search" name="search" value="{value}" placeholder="Search by name">{hidden}
<button type="submit">Search</button>
</form>
"#,
        action = escape(location.path()),
        value = escape(query.search.as_deref().unwrap_or_default()),
    )
}

fn table(kind: EntityKind, location: &Location, query: &ListQuery, rows: &Page<Row>) -> String {
    let mut out = String::from("<table>\n<thead><tr>");
    for header in headers(kind) {
        if *header == "Name" {
            let arrow = match query.sort {
                SortOrder::None => "",
                SortOrder::Asc => " &#9650;",
                SortOrder::Desc => " &#9660;",
            };
            let href = query.with_sort(query.sort.toggled()).encode(location);
            let _ = write!(
                out,
                r#"<th><a href="{}">Name{arrow}</a></th>"#,
                escape(&href)
            );
        } else {
            let _ = write!(out, "<th>{header}</th>");
        }
    }
    out.push_str("<th>Actions</th></tr></thead>\n<tbody>\n");

    if rows.rows.is_empty() {
        let colspan = headers(kind).len() + 1;
        let message = if rows.is_past_end() {
            "No results on this page."
        } else {
            "Nothing matches the current filter."
        };
        let _ = writeln!(out, r#"<tr><td colspan="{colspan}">{message}</td></tr>"#);
    }
    for row in &rows.rows {
        out.push_str("<tr>");
        for cell in &row.cells {
            let _ = write!(out, "<td>{cell}</td>");
        }
        out.push_str("<td>");
        for action in &row.actions {
            let _ = write!(
                out,
                r#"<a href="{}">{}</a> "#,
                escape(&action.href),
                action.label
            );
        }
        out.push_str("</td></tr>\n");
    }
    out.push_str("</tbody>\n</table>\n");
    out
}

fn pagination(location: &Location, query: &ListQuery, rows: &Page<Row>) -> String {
    let mut out = format!(
        r#"<nav class="pagination"><span>{} result(s), page {} of {}</span> "#,
        rows.total_count,
        rows.page,
        rows.total_pages.max(1)
    );
    for link in page_links(rows.page, rows.total_pages) {
        let href = |page: u32| escape(&query.with_page(page).encode(location));
        let _ = match link {
            PageLink::Previous(page) => write!(out, r#"<a href="{}">Previous</a> "#, href(page)),
            PageLink::Number {
                page,
                current: true,
            } => write!(out, r#"<strong aria-current="page">{page}</strong> "#),
            PageLink::Number { page, .. } => write!(out, r#"<a href="{}">{page}</a> "#, href(page)),
            PageLink::Gap => write!(out, "&hellip; "),
            PageLink::Next(page) => write!(out, r#"<a href="{}">Next</a> "#, href(page)),
        };
    }
    out.push_str("<span>Per page:");
    for choice in PER_PAGE_CHOICES {
        if choice == query.per_page {
            let _ = write!(out, " <strong>{choice}</strong>");
        } else {
            let href = query.with_per_page(choice).encode(location);
            let _ = write!(out, r#" <a href="{}">{choice}</a>"#, escape(&href));
        }
    }
    out.push_str("</span></nav>\n");
    out
}

/// Confirmation dialog, present only while the selection parameter is set.
pub(crate) fn dialog(flow: &ConfirmationFlow, state: DialogState) -> String {
    let id = match state {
        DialogState::Closed => return String::new(),
        DialogState::Open { id } | DialogState::Pending { id } => id,
    };
    let kind = flow.kind();
    let action = {
        let query = flow.location().query_string();
        format!("{}/delete?{query}", kind.dashboard_path())
    };
    let disabled = if state.actions_enabled() { "" } else { " disabled" };
    let confirm_label = if state.actions_enabled() {
        "Delete"
    } else {
        "Deleting..."
    };
    format!(
        r#"<dialog open aria-labelledby="confirm-title">
<h2 id="confirm-title">Delete {label} #{id}?</h2>
<p>This will permanently remove the {lower}. This action cannot be undone.</p>
<form method="post" action="{action}">
<button type="submit"{disabled}>{confirm_label}</button>
<a href="{cancel}">Cancel</a>
</form>
</dialog>
"#,
        label = kind.label(),
        lower = kind.label().to_ascii_lowercase(),
        action = escape(&action),
        cancel = escape(&flow.cancel_url()),
    )
}

pub(crate) struct FormChoices<'a> {
    pub brands: &'a [BrandSummary],
    pub categories: &'a [CategorySummary],
}

/// Create/edit form. `error` is shown above the fields after a failed submit.
pub(crate) fn entity_form(
    kind: EntityKind,
    action: &str,
    values: &EntityForm,
    error: Option<&str>,
    choices: &FormChoices<'_>,
) -> String {
    let mut out = String::new();
    if let Some(error) = error {
        let _ = write!(out, r#"<p class="form-error" role="alert">{}</p>"#, escape(error));
    }
    let _ = write!(out, r#"<form method="post" action="{}">"#, escape(action));
    out.push_str(&text_field("name", "Name", &values.name));
    match kind {
        EntityKind::Brand => {
            out.push_str(&text_field("image_url", "Image URL", &values.image_url));
        }
        EntityKind::Category => {}
        EntityKind::Product => {
            out.push_str(&text_field("description", "Description", &values.description));
            out.push_str(&text_field("price", "Price", &values.price));
            out.push_str(&select(
                "brand_id",
                "Brand",
                &values.brand_id,
                false,
                choices.brands.iter().map(|b| (b.id.0, b.name.as_str())),
            ));
            out.push_str(&select(
                "category_id",
                "Category",
                &values.category_id,
                true,
                choices.categories.iter().map(|c| (c.id.0, c.name.as_str())),
            ));
            out.push_str(&text_field("image_url", "Image URL", &values.image_url));
        }
    }
    let _ = write!(
        out,
        r#"<button type="submit">Save</button> <a href="{}">Cancel</a></form>"#,
        kind.dashboard_path()
    );
    out
}

fn text_field(name: &str, label: &str, value: &str) -> String {
    format!(
        r#"<label>{label} <input type="text" name="{name}" value="{}"></label><br>"#,
        escape(value)
    )
}

fn select<'a>(
    name: &str,
    label: &str,
    selected: &str,
    optional: bool,
    options: impl Iterator<Item = (i64, &'a str)>,
) -> String {
    let mut out = format!(r#"<label>{label} <select name="{name}">"#);
    if optional {
        out.push_str(r#"<option value="">None</option>"#);
    }
    for (id, text) in options {
        let marker = if id.to_string() == selected {
            " selected"
        } else {
            ""
        };
        let _ = write!(
            out,
            r#"<option value="{id}"{marker}>{}</option>"#,
            escape(text)
        );
    }
    out.push_str("</select></label><br>");
    out
}

pub(crate) fn error_body(message: &str) -> String {
    format!(
        r#"<p role="alert">{}</p><p><a href="/dashboard">Back to overview</a></p>"#,
        escape(message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_and_quotes() {
        assert_eq!(
            escape(r#"<b>"Tom's" & co</b>"#),
            "&lt;b&gt;&quot;Tom&#39;s&quot; &amp; co&lt;/b&gt;"
        );
    }

    #[test]
    fn dialog_posts_back_with_current_params() {
        let flow = ConfirmationFlow::new(
            EntityKind::Brand,
            Location::parse("/dashboard/brand?page=2&brandId=4"),
        );
        let html = dialog(&flow, DialogState::Open { id: 4 });
        assert!(html.contains(r#"action="/dashboard/brand/delete?page=2&amp;brandId=4""#));
        assert!(html.contains(r#"href="/dashboard/brand?page=2""#));
        assert!(!html.contains("disabled"));

        let pending = dialog(&flow, DialogState::Pending { id: 4 });
        assert!(pending.contains("disabled"));
        assert!(dialog(&flow, DialogState::Closed).is_empty());
    }
}
