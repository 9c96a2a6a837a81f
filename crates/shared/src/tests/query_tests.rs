use super::*;

#[test]
fn missing_params_decode_to_defaults() {
    let query = ListQuery::from_query_str("");
    assert_eq!(query, ListQuery::default());
    assert_eq!(query.page, 1);
    assert_eq!(query.per_page, 5);
    assert_eq!(query.sort, SortOrder::None);
    assert!(query.search.is_none());
}

#[test]
fn malformed_numbers_fall_back_to_defaults() {
    let query = ListQuery::from_query_str("page=abc&perPage=-3");
    assert_eq!(query.page, DEFAULT_PAGE);
    assert_eq!(query.per_page, DEFAULT_PER_PAGE);

    let query = ListQuery::from_query_str("page=0&perPage=2.5");
    assert_eq!(query.page, DEFAULT_PAGE);
    assert_eq!(query.per_page, DEFAULT_PER_PAGE);
}

#[test]
fn decodes_well_formed_values() {
    let query = ListQuery::from_query_str("?search=Nike&sort=desc&page=3&perPage=10");
    assert_eq!(query.search.as_deref(), Some("Nike"));
    assert_eq!(query.sort, SortOrder::Desc);
    assert_eq!(query.page, 3);
    assert_eq!(query.per_page, 10);
}

#[test]
fn unknown_sort_and_empty_search_are_ignored() {
    let query = ListQuery::from_query_str("sort=ASC&search=");
    assert_eq!(query.sort, SortOrder::None);
    assert!(query.search.is_none());
}

#[test]
fn first_occurrence_of_a_key_wins() {
    let query = ListQuery::from_query_str("page=2&page=7");
    assert_eq!(query.page, 2);
}

#[test]
fn encode_omits_defaults_and_keeps_unrelated_params() {
    let current = Location::parse("/dashboard/brand?brandId=42&tab=media");
    let url = ListQuery::default().with_search(Some("ad")).encode(&current);
    assert_eq!(url, "/dashboard/brand?brandId=42&tab=media&search=ad");
}

#[test]
fn encode_overrides_existing_values_in_place() {
    let current = Location::parse("/dashboard/brand?page=2&search=old&brandId=7");
    let query = ListQuery {
        search: Some("new".into()),
        page: 4,
        ..ListQuery::default()
    };
    assert_eq!(
        query.encode(&current),
        "/dashboard/brand?page=4&search=new&brandId=7"
    );
}

#[test]
fn empty_and_null_patch_values_remove_keys() {
    let current = Location::parse("/dashboard/brand?search=x&sort=asc&brandId=1");
    let patch = QueryPatch::new().set("search", "").clear("sort");
    assert_eq!(encode(&patch, &current), "/dashboard/brand?brandId=1");
}

#[test]
fn round_trips_well_formed_queries() {
    let base = Location::new("/dashboard/product");
    let queries = [
        ListQuery::default(),
        ListQuery {
            search: Some("red shoes & socks".into()),
            sort: SortOrder::Asc,
            page: 3,
            per_page: 20,
        },
        ListQuery {
            search: None,
            sort: SortOrder::Desc,
            page: 1,
            per_page: 1,
        },
    ];
    for query in queries {
        let url = query.encode(&base);
        assert_eq!(ListQuery::from_location(&Location::parse(&url)), query, "{url}");
    }
}

#[test]
fn selection_and_list_state_do_not_clobber_each_other() {
    let listing = Location::parse("/dashboard/brand?search=ac&page=2");
    let selected = listing.apply(&SelectionState::selected(9).patch(EntityKind::Brand));
    assert_eq!(selected.to_string(), "/dashboard/brand?search=ac&page=2&brandId=9");
    assert_eq!(
        SelectionState::from_location(&selected, EntityKind::Brand).active_id,
        Some(9)
    );
    assert_eq!(
        ListQuery::from_location(&selected),
        ListQuery::from_location(&listing)
    );

    let cleared = selected.apply(&SelectionState::default().patch(EntityKind::Brand));
    assert_eq!(cleared, listing);
}

#[test]
fn selection_param_is_entity_specific() {
    let location = Location::parse("/dashboard/product?brandId=3");
    assert!(!SelectionState::from_location(&location, EntityKind::Product).is_open());
    assert!(SelectionState::from_location(&location, EntityKind::Brand).is_open());
}

#[test]
fn unparsable_selection_is_absent() {
    let location = Location::parse("/dashboard/brand?brandId=abc");
    assert_eq!(
        SelectionState::from_location(&location, EntityKind::Brand),
        SelectionState::default()
    );
}

#[test]
fn filter_changes_reset_to_first_page() {
    let query = ListQuery::default().with_page(4);
    assert_eq!(query.with_search(Some("x")).page, 1);
    assert_eq!(query.with_sort(SortOrder::Asc).page, 1);
    assert_eq!(SortOrder::None.toggled(), SortOrder::Asc);
    assert_eq!(SortOrder::Asc.toggled(), SortOrder::Desc);
}
