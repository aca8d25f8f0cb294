//! Walks a table page by page through `next` links, the way a client would.

use mirror_core::{next_link, EntityId, EntityIdCodec, FieldRule, FilterSchema, SortOrder};
use mirror_db::{ColumnMap, LimitCfg, Page, QueryBuilder, SqlValue};

const PATH: &str = "/api/v1/accounts";
const ANCHOR: &str = "account.id";

struct Table {
    ids: Vec<EntityId>,
}

impl Table {
    fn with_nums(nums: impl IntoIterator<Item = u64>) -> Self {
        Self {
            ids: nums
                .into_iter()
                .map(|n| EntityId::new(0, 0, n).unwrap())
                .collect(),
        }
    }

    fn insert(&mut self, num: u64) {
        self.ids.push(EntityId::new(0, 0, num).unwrap());
    }

    /// One request: parse → plan → "execute" → page + next link.
    fn get(&self, query: &str) -> (Vec<EntityId>, Option<String>) {
        let schema = FilterSchema::closed()
            .field(ANCHOR, FieldRule::EntityId)
            .paged();
        let columns = ColumnMap::new().scalar(ANCHOR, "id");

        let pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        let filters = schema.parse(&pairs, &EntityIdCodec::default()).unwrap();
        let plan = QueryBuilder::new(&columns, SortOrder::Asc, LimitCfg { default: 25, max: 200 })
            .build(&filters)
            .unwrap();

        let mut rows: Vec<EntityId> = self
            .ids
            .iter()
            .copied()
            .filter(|id| {
                plan.matches(&|col: &str| (col == "id").then_some(SqlValue::BigInt(id.packed())))
            })
            .collect();
        rows.sort();
        if plan.order == SortOrder::Desc {
            rows.reverse();
        }
        rows.truncate(plan.fetch_limit() as usize);

        let page = Page::from_overfetch(rows, plan.limit);
        let next = page.items.last().and_then(|last| {
            next_link(
                PATH,
                Some(query),
                !page.has_more,
                ANCHOR,
                &last.to_string(),
                plan.order,
            )
        });
        (page.items, next)
    }
}

fn query_of(link: &str) -> &str {
    link.split_once('?').map(|(_, q)| q).unwrap_or_default()
}

#[test]
fn thousand_rows_in_five_pages() {
    let table = Table::with_nums((1..=1000).map(|n| n * 10));

    let mut seen = Vec::new();
    let mut pages = 0;
    let mut query = "limit=200".to_string();
    loop {
        let (items, next) = table.get(&query);
        pages += 1;
        assert_eq!(items.len(), 200, "page {pages}");
        seen.extend(items);
        match next {
            Some(link) => query = query_of(&link).to_string(),
            None => break,
        }
        assert!(pages < 10, "pagination did not terminate");
    }

    assert_eq!(pages, 5);
    let mut expected = table.ids.clone();
    expected.sort();
    assert_eq!(seen, expected);
}

#[test]
fn concurrent_inserts_behind_the_cursor_are_skipped() {
    let mut table = Table::with_nums((1..=1000).map(|n| n * 10));
    let original: Vec<EntityId> = table.ids.clone();

    let (first, next) = table.get("limit=200");
    let cursor = first.last().unwrap().num();
    assert_eq!(cursor, 2000);

    // lands before the cursor: never served
    table.insert(15);

    let mut seen = first;
    let mut link = next;
    while let Some(l) = link {
        let (items, next) = table.get(query_of(&l));
        seen.extend(items);
        link = next;
    }
    assert_eq!(seen, original);

    // lands beyond the final cursor after the walk ended: not part of it
    table.insert(20_000);
    assert!(!seen.contains(&EntityId::new(0, 0, 20_000).unwrap()));
}

#[test]
fn rows_appended_ahead_of_the_cursor_are_picked_up() {
    let mut table = Table::with_nums(1..=10);
    let (first, next) = table.get("limit=4");
    table.insert(11);

    let mut seen = first;
    let mut link = next;
    while let Some(l) = link {
        let (items, next) = table.get(query_of(&l));
        seen.extend(items);
        link = next;
    }
    let nums: Vec<u64> = seen.iter().map(EntityId::num).collect();
    assert_eq!(nums, (1..=11).collect::<Vec<_>>());
}

#[test]
fn descending_walk_keeps_the_upper_bound_filter() {
    let table = Table::with_nums(1..=50);

    let mut seen = Vec::new();
    let mut query = "order=desc&limit=20&account.id=lte:0.0.45".to_string();
    loop {
        let (items, next) = table.get(&query);
        seen.extend(items);
        match next {
            Some(link) => {
                assert!(link.contains("account.id=lt:"));
                assert!(!link.contains("lte:0.0.45"));
                query = query_of(&link).to_string();
            }
            None => break,
        }
    }
    let nums: Vec<u64> = seen.iter().map(EntityId::num).collect();
    assert_eq!(nums, (1..=45).rev().collect::<Vec<_>>());
}

#[test]
fn next_link_is_stable() {
    let table = Table::with_nums(1..=10);
    let (_, a) = table.get("limit=3&account.id=gte:0.0.2");
    let (_, b) = table.get("limit=3&account.id=gte:0.0.2");
    assert_eq!(a, b);
    assert_eq!(a.as_deref(), Some("/api/v1/accounts?limit=3&account.id=gt:0.0.4"));
}
