use chrono::{TimeZone, Utc};
use facetsync::app::{FilterSession, Intent, MemoryAddress};
use facetsync::domain::{CategoryNode, CategoryTree, FilterCriteria, Item, SortKey};
use facetsync::fetch::{LoadStatus, Runtime};
use facetsync::query::{decode, encode_query, CategoryIndex};
use facetsync::source::MemoryCatalog;
use facetsync::Config;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

fn tree() -> Arc<CategoryTree> {
    Arc::new(CategoryTree::new(vec![CategoryNode::new("furniture", "Furniture")
        .with_child(
            CategoryNode::new("desks", "Desks").with_child(CategoryNode::new("standing", "Standing")),
        )
        .with_child(CategoryNode::new("chairs", "Chairs"))]))
}

fn item(id: &str, price: f64, category: &str, color: &str) -> Item {
    Item {
        id: id.to_string(),
        name: format!("Item {id}"),
        price,
        category_id: category.to_string(),
        attributes: BTreeMap::from([("color".to_string(), color.to_string())]),
        popularity: 0,
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
    }
}

fn catalog() -> Arc<MemoryCatalog> {
    Arc::new(MemoryCatalog::new(vec![
        item("a", 320.0, "desks", "oak"),
        item("b", 80.0, "chairs", "black"),
        item("c", 540.0, "standing", "white"),
        item("d", 150.0, "chairs", "oak"),
        item("e", 45.0, "lamps", "black"),
    ]))
}

#[test]
fn intents_reach_the_address_in_canonical_form() {
    let mut session = FilterSession::new(&Config::default(), MemoryAddress::new("/catalog", ""), None);
    session.start();

    session.dispatch(&Intent::SetPriceMin(Some(100.0)));
    session.dispatch(&Intent::SetSort(SortKey::PriceAscending));
    assert_eq!(session.address().href(), "/catalog?sort=priceAsc&priceMin=100");

    let restored = decode("?sort=priceAsc&priceMin=100", None);
    assert_eq!(&restored, session.criteria());
}

#[test]
fn rich_criteria_survive_encode_then_decode() {
    let set = |values: &[&str]| values.iter().map(|v| v.to_string()).collect::<BTreeSet<_>>();

    let mut criteria = FilterCriteria {
        sort: SortKey::PriceDescending,
        category_ids: set(&["%41", "a,z", "b c", "x+y", "q?r#s", "k=v&w"]),
        page: 3,
        page_size: 48,
        ..FilterCriteria::default()
    };
    criteria.price.min = Some(12.5);
    criteria.price.max = Some(99.75);
    criteria.attributes.insert("size & fit".to_string(), set(&["m=l", "wide, long"]));
    criteria.attributes.insert("color".to_string(), set(&["blue", "red+white"]));
    criteria.attributes.insert("note?#1".to_string(), set(&["50%", "a&b"]));

    let encoded = encode_query(&criteria);
    assert!(encoded.starts_with("?sort=priceDesc&priceMin=12.5&priceMax=99.75&categoryIds="));
    assert!(!encoded[1..].contains(['#', '?', '+', ' ']));

    assert_eq!(decode(&encoded, None), criteria);
}

#[test]
fn canonical_form_is_a_fixed_point() {
    let index = CategoryIndex::new(tree());
    let queries = [
        "",
        "?page=1&pageSize=20&sort=recent",
        "pageSize=50&color=red,blue&categoryIds=chairs,desks&priceMax=500",
        "/catalog?priceMin=abc&priceMax=99.50&page=-3&size=&size=xl",
        "?category=desks&page=4",
        "?sort=bogus&color=&material=oak%20veneer",
    ];

    for query in queries {
        let once = encode_query(&decode(query, Some(&index)));
        let twice = encode_query(&decode(&once, Some(&index)));
        assert_eq!(once, twice, "query {query:?} is not stable");
    }
}

#[test]
fn reordered_criteria_encode_identically() {
    let mut first = FilterCriteria::default();
    first.attributes.insert(
        "color".to_string(),
        BTreeSet::from(["red".to_string(), "blue".to_string()]),
    );
    first.category_ids.extend(["b".to_string(), "a".to_string()]);

    let mut second = FilterCriteria::default();
    second.category_ids.extend(["a".to_string(), "b".to_string()]);
    second.attributes.insert(
        "color".to_string(),
        BTreeSet::from(["blue".to_string(), "red".to_string()]),
    );

    assert_eq!(encode_query(&first), encode_query(&second));
    assert_eq!(encode_query(&first), "?categoryIds=a,b&color=blue,red");
}

#[test]
fn category_toggles_follow_the_tree() {
    let mut session = FilterSession::new(
        &Config::default(),
        MemoryAddress::new("/catalog", "?page=3"),
        Some(tree()),
    );
    session.start();

    session.dispatch(&Intent::ToggleCategory("desks".to_string()));
    assert_eq!(session.address().href(), "/catalog?categoryIds=desks,standing");

    session.dispatch(&Intent::ToggleCategory("standing".to_string()));
    assert_eq!(session.address().href(), "/catalog?categoryIds=desks");

    session.dispatch(&Intent::ToggleCategory("desks".to_string()));
    assert_eq!(session.address().href(), "/catalog");
}

#[tokio::test(start_paused = true)]
async fn runtime_loads_filtered_pages_from_the_catalog() {
    let config = Config {
        prefetch: false,
        ..Config::default()
    };
    let session = FilterSession::new(&config, MemoryAddress::new("/catalog", "?sort=priceAsc"), Some(tree()));
    let mut runtime = Runtime::new(session, catalog(), &config);

    runtime.start();
    runtime.settle().await;
    let view = runtime.session().view();
    assert_eq!(view.status, LoadStatus::Ready);
    let prices: Vec<f64> = view
        .results
        .as_ref()
        .map(|page| page.data.iter().map(|item| item.price).collect())
        .unwrap_or_default();
    assert_eq!(prices, vec![45.0, 80.0, 150.0, 320.0, 540.0]);

    runtime.dispatch(&Intent::SelectCategory("furniture".to_string()));
    runtime.dispatch(&Intent::ToggleAttribute {
        key: "color".to_string(),
        value: "oak".to_string(),
    });
    runtime.settle().await;

    let session = runtime.session();
    assert_eq!(
        session.address().href(),
        "/catalog?sort=priceAsc&categoryIds=chairs,desks,furniture,standing&color=oak"
    );
    let ids: Vec<&str> = session
        .view()
        .results
        .as_ref()
        .map(|page| page.data.iter().map(|item| item.id.as_str()).collect())
        .unwrap_or_default();
    assert_eq!(ids, vec!["d", "a"]);
    assert_eq!(session.address().replacements(), 3);
}
