use scholaria_core::{
    normalize_search_options, Entity, EntityRepository, NewFinding, NewResearcher, NewSubject,
    RawSearchParams, RepoError, ScanQuery, SearchConfig, SearchOptions, ServiceError,
    SqliteEntityRepository, Store, Subject,
};

fn small_pages() -> SearchConfig {
    SearchConfig {
        default_page_size: 3,
        max_page_size: 5,
        default_sort: "name".to_string(),
    }
}

fn setup_with_subjects(count: usize) -> Store {
    let store = Store::open_in_memory(small_pages()).unwrap();
    let subjects = store.subjects().unwrap();
    for index in 0..count {
        subjects
            .create(NewSubject::new(format!("Subject {index:02}"), "Biology"))
            .unwrap();
    }
    store
}

fn raw(pairs: &[(&str, &str)]) -> RawSearchParams {
    let mut params = RawSearchParams::default();
    for (key, value) in pairs {
        let value = Some((*value).to_string());
        match *key {
            "filter" => params.filter = value,
            "fields" => params.fields = value,
            "page" => params.page = value,
            "limit" => params.limit = value,
            "sort" => params.sort = value,
            other => panic!("unknown param {other}"),
        }
    }
    params
}

fn names(page: &scholaria_core::SearchPage) -> Vec<String> {
    page.result
        .iter()
        .map(|doc| doc["name"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn defaults_apply_when_params_are_absent() {
    let store = setup_with_subjects(4);
    let page = store
        .subjects()
        .unwrap()
        .search_raw(&RawSearchParams::default())
        .unwrap();

    assert_eq!(page.options.page, 1);
    assert_eq!(page.options.limit, 3);
    assert_eq!(page.options.sort, "name");
    assert_eq!(page.options.fields, Subject::DEFAULT_FIELDS.join(","));
    assert_eq!(names(&page), vec!["Subject 00", "Subject 01", "Subject 02"]);
}

#[test]
fn limit_above_maximum_is_clamped() {
    let store = setup_with_subjects(8);
    let page = store
        .subjects()
        .unwrap()
        .search_raw(&raw(&[("limit", "1000")]))
        .unwrap();

    assert_eq!(page.options.limit, 5);
    assert_eq!(page.result.len(), 5);
}

#[test]
fn zero_and_negative_pages_behave_as_first_page() {
    let store = setup_with_subjects(6);
    let subjects = store.subjects().unwrap();
    let first = subjects.search_raw(&raw(&[("page", "1")])).unwrap();

    for page in ["0", "-3", "not-a-number"] {
        let result = subjects.search_raw(&raw(&[("page", page)])).unwrap();
        assert_eq!(result.options.page, 1);
        assert_eq!(names(&result), names(&first), "page input `{page}`");
    }
}

#[test]
fn hand_built_options_are_bounded_before_scanning() {
    let store = setup_with_subjects(8);
    let options = SearchOptions {
        filter: Default::default(),
        fields: String::new(),
        page: 0,
        limit: 900,
        sort: "name".to_string(),
    };

    let page = store.subjects().unwrap().search(&options).unwrap();
    assert_eq!(page.options.page, 1);
    assert_eq!(page.options.limit, 5);
    assert_eq!(page.result.len(), 5);
}

#[test]
fn page_p_equals_manual_skip_over_full_listing() {
    let store = setup_with_subjects(11);
    let subjects = store.subjects().unwrap();
    let all = subjects
        .search_raw(&raw(&[("limit", "5"), ("page", "1")]))
        .unwrap();
    let rest = subjects
        .search_raw(&raw(&[("limit", "5"), ("page", "2")]))
        .unwrap();
    let tail = subjects
        .search_raw(&raw(&[("limit", "5"), ("page", "3")]))
        .unwrap();

    let mut listing = names(&all);
    listing.extend(names(&rest));
    listing.extend(names(&tail));
    let expected: Vec<String> = (0..11).map(|index| format!("Subject {index:02}")).collect();
    assert_eq!(listing, expected);

    let limit = 4_usize;
    for page_number in 1..=3_usize {
        let page = subjects
            .search_raw(&raw(&[
                ("limit", limit.to_string().as_str()),
                ("page", page_number.to_string().as_str()),
            ]))
            .unwrap();
        let skip = limit * (page_number - 1);
        let manual: Vec<String> = expected.iter().skip(skip).take(limit).cloned().collect();
        assert!(page.result.len() <= limit);
        assert_eq!(names(&page), manual, "page {page_number}");
    }
}

#[test]
fn page_past_the_end_is_empty() {
    let store = setup_with_subjects(2);
    let page = store
        .subjects()
        .unwrap()
        .search_raw(&raw(&[("page", "40")]))
        .unwrap();
    assert!(page.result.is_empty());
}

#[test]
fn descending_sort_reverses_order() {
    let store = setup_with_subjects(4);
    let page = store
        .subjects()
        .unwrap()
        .search_raw(&raw(&[("sort", "-name"), ("limit", "5")]))
        .unwrap();
    assert_eq!(
        names(&page),
        vec!["Subject 03", "Subject 02", "Subject 01", "Subject 00"]
    );
}

#[test]
fn filter_matches_scalar_fields() {
    let store = setup_with_subjects(3);
    store
        .subjects()
        .unwrap()
        .create(NewSubject::new("Toxicology", "Animal Science"))
        .unwrap();

    let page = store
        .subjects()
        .unwrap()
        .search_raw(&raw(&[("filter", r#"{"field_of_study": "Animal Science"}"#)]))
        .unwrap();
    assert_eq!(names(&page), vec!["Toxicology"]);

    let none = store
        .subjects()
        .unwrap()
        .search_raw(&raw(&[("filter", r#"{"no_such_field": "Animal Science"}"#)]))
        .unwrap();
    assert!(none.result.is_empty());
}

#[test]
fn filter_operator_objects_surface_as_invalid_query() {
    let store = setup_with_subjects(1);
    let err = store
        .subjects()
        .unwrap()
        .search_raw(&raw(&[("filter", r#"{"name": {"$regex": "Sub"}}"#)]))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Repo(RepoError::InvalidQuery(_))));
}

#[test]
fn filter_on_reference_field_matches_set_membership() {
    let store = Store::open_in_memory(SearchConfig::default()).unwrap();
    let subject = store
        .subjects()
        .unwrap()
        .create(NewSubject::new("Toxicology", "Animal Science"))
        .unwrap();
    let mut linked = NewResearcher::new("Ada", "Lovelace");
    linked.subjects = vec![subject.id];
    let linked = store.researchers().unwrap().create(linked).unwrap();
    store
        .researchers()
        .unwrap()
        .create(NewResearcher::new("Alan", "Turing"))
        .unwrap();

    let filter = format!(r#"{{"subjects": "{}"}}"#, subject.id);
    let page = store
        .researchers()
        .unwrap()
        .search_raw(&raw(&[("filter", filter.as_str())]))
        .unwrap();
    assert_eq!(page.result.len(), 1);
    assert_eq!(page.result[0]["id"], linked.id.to_string());
}

#[test]
fn default_projection_hides_reference_sets() {
    let store = setup_with_subjects(1);
    let page = store
        .subjects()
        .unwrap()
        .search_raw(&RawSearchParams::default())
        .unwrap();

    let doc = &page.result[0];
    assert!(doc.contains_key("id"));
    assert!(doc.contains_key("name"));
    assert!(!doc.contains_key("researchers"));
    assert!(!doc.contains_key("findings"));
}

#[test]
fn projected_reference_fields_are_populated() {
    let store = Store::open_in_memory(SearchConfig::default()).unwrap();
    let finding = store
        .findings()
        .unwrap()
        .create(NewFinding::new("On Dosage", "Summary"))
        .unwrap();
    let mut body = NewSubject::new("Toxicology", "Animal Science");
    body.findings = vec![finding.id];
    store.subjects().unwrap().create(body).unwrap();

    let page = store
        .subjects()
        .unwrap()
        .search_raw(&raw(&[("fields", "name,findings")]))
        .unwrap();

    let doc = &page.result[0];
    assert_eq!(doc.len(), 3);
    let findings = doc["findings"].as_array().unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0]["title"], "On Dosage");
}

#[test]
fn normalizing_normalized_options_is_identity() {
    let config = small_pages();
    let inputs = [
        RawSearchParams::default(),
        raw(&[("page", "-2"), ("limit", "99"), ("sort", " -name ")]),
        raw(&[("filter", r#"{"name": "x", "n": 1.5}"#), ("fields", " name , ,id ")]),
        raw(&[("filter", "garbage"), ("fields", ""), ("limit", "2.7")]),
    ];

    for input in inputs {
        let once = normalize_search_options(&input, Subject::DEFAULT_FIELDS, &config);
        let twice = normalize_search_options(&once.to_raw(), Subject::DEFAULT_FIELDS, &config);
        assert_eq!(once, twice);
    }
}

#[test]
fn repository_scan_with_zero_limit_returns_nothing_but_still_checks_filter() {
    let store = setup_with_subjects(3);
    let repo = SqliteEntityRepository::<Subject>::try_new(store.connection()).unwrap();

    let empty = repo
        .scan(&ScanQuery {
            sort: "name".to_string(),
            limit: 0,
            ..ScanQuery::default()
        })
        .unwrap();
    assert!(empty.is_empty());

    let mut filter = scholaria_core::Document::new();
    filter.insert("name".to_string(), serde_json::json!({"$ne": "x"}));
    let err = repo
        .scan(&ScanQuery {
            filter,
            sort: "name".to_string(),
            limit: 0,
            skip: 0,
        })
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidQuery(_)));
}
