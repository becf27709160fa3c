use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

use redcat_domain::Place;
use redcat_storage::{
	Error,
	places::{SearchHit, SearchParams},
	valkey::ValkeyStore,
};
use redcat_testkit::TestIndex;

const INDEX_SETTLE_ATTEMPTS: usize = 50;

fn place(id: &str, name: &str, lat: f64, lon: f64, categories: &[&str]) -> Place {
	Place {
		id: id.to_string(),
		name: name.to_string(),
		lat,
		lon,
		country: "CY".to_string(),
		category_ids: categories.iter().map(|category| category.to_string()).collect(),
		..Default::default()
	}
}

async fn connect(test_index: &TestIndex) -> ValkeyStore {
	let store = ValkeyStore::connect(&test_index.valkey_config())
		.await
		.expect("Failed to connect to Valkey.");

	store
		.ensure_places_index(&CancellationToken::new())
		.await
		.expect("Failed to ensure places index.");

	store
}

// Indexing is asynchronous on the server, so poll until the expected number of hits shows up.
async fn search_settled(store: &ValkeyStore, params: &SearchParams, expected: usize) -> Vec<SearchHit> {
	let cancel = CancellationToken::new();
	let mut hits = Vec::new();

	for _ in 0..INDEX_SETTLE_ATTEMPTS {
		hits = store.search_nearest(&cancel, params).await.expect("Failed to search places.");

		if hits.len() >= expected {
			break;
		}

		time::sleep(Duration::from_millis(100)).await;
	}

	hits
}

#[tokio::test]
#[ignore = "Requires external Valkey with the search module. Set REDCAT_VALKEY_URL to run."]
async fn nearest_search_orders_by_distance_and_filters_categories() {
	let Some(url) = redcat_testkit::env_valkey_url() else {
		eprintln!("Skipping nearest_search_orders_by_distance_and_filters_categories; set REDCAT_VALKEY_URL to run.");

		return;
	};
	let test_index = TestIndex::new(&url);
	let store = connect(&test_index).await;
	let cancel = CancellationToken::new();

	for place in [
		place("A", "Alpha", 35.1700, 33.3600, &["testcat"]),
		place("B", "Bravo", 35.1710, 33.3610, &["testcat", "other"]),
		place("C", "Charlie", 35.2500, 33.4500, &["unrelated"]),
	] {
		store.upsert(&cancel, &place).await.expect("Failed to upsert place.");
	}

	let filtered = SearchParams {
		lat: 35.1705,
		lon: 33.3605,
		limit: 5,
		category_ids: vec!["testcat".to_string()],
	};
	let hits = search_settled(&store, &filtered, 2).await;
	let mut ids = hits.iter().map(|hit| hit.place.id.as_str()).collect::<Vec<_>>();

	assert_eq!(hits.len(), 2);
	assert!(hits[0].distance_m <= hits[1].distance_m);
	assert!(hits.iter().all(|hit| hit.distance_m < 200.0));

	ids.sort_unstable();

	assert_eq!(ids, vec!["A", "B"]);

	let unfiltered = SearchParams { category_ids: Vec::new(), ..filtered };
	let hits = search_settled(&store, &unfiltered, 3).await;

	assert_eq!(hits.len(), 3);
	assert_eq!(hits[2].place.id, "C");
	assert!(hits.windows(2).all(|pair| pair[0].distance_m <= pair[1].distance_m));

	test_index.cleanup().await.expect("Failed to cleanup test index.");
}

#[tokio::test]
#[ignore = "Requires external Valkey with the search module. Set REDCAT_VALKEY_URL to run."]
async fn limit_truncates_nearest_and_far_category_stays_reachable() {
	let Some(url) = redcat_testkit::env_valkey_url() else {
		eprintln!("Skipping limit_truncates_nearest_and_far_category_stays_reachable; set REDCAT_VALKEY_URL to run.");

		return;
	};
	let test_index = TestIndex::new(&url);
	let store = connect(&test_index).await;
	let cancel = CancellationToken::new();

	for place in [
		place("A", "Alpha", 35.1700, 33.3600, &["testcat"]),
		place("B", "Bravo", 35.1710, 33.3610, &["testcat"]),
		place("C", "London", 51.5074, -0.1278, &["othercat"]),
	] {
		store.upsert(&cancel, &place).await.expect("Failed to upsert place.");
	}

	let far = SearchParams {
		lat: 35.1705,
		lon: 33.3605,
		limit: 2,
		category_ids: vec!["othercat".to_string()],
	};
	let hits = search_settled(&store, &far, 1).await;

	assert_eq!(hits.len(), 1);
	assert_eq!(hits[0].place.id, "C");
	assert!(hits[0].distance_m > 3_000_000.0, "got {}", hits[0].distance_m);

	let filtered = SearchParams { category_ids: vec!["testcat".to_string()], ..far.clone() };
	let hits = search_settled(&store, &filtered, 2).await;
	let mut ids = hits.iter().map(|hit| hit.place.id.as_str()).collect::<Vec<_>>();

	assert_eq!(hits.len(), 2);
	assert!(hits[0].distance_m <= hits[1].distance_m);

	ids.sort_unstable();

	assert_eq!(ids, vec!["A", "B"]);

	let unfiltered = SearchParams { category_ids: Vec::new(), ..far };
	let hits = search_settled(&store, &unfiltered, 2).await;

	assert_eq!(hits.len(), 2);
	assert!(hits.iter().all(|hit| hit.place.id != "C"));
	assert!(hits.iter().all(|hit| hit.distance_m < 200.0));

	test_index.cleanup().await.expect("Failed to cleanup test index.");
}

#[tokio::test]
#[ignore = "Requires external Valkey with the search module. Set REDCAT_VALKEY_URL to run."]
async fn upsert_get_delete_round_trip() {
	let Some(url) = redcat_testkit::env_valkey_url() else {
		eprintln!("Skipping upsert_get_delete_round_trip; set REDCAT_VALKEY_URL to run.");

		return;
	};
	let test_index = TestIndex::new(&url);
	let store = connect(&test_index).await;
	let cancel = CancellationToken::new();
	let mut stored = place("round", "Round Trip", 35.17, 33.36, &["a", "b"]);

	assert_eq!(store.key("round"), format!("{}{{round}}", test_index.key_prefix()));
	assert_eq!(store.index, test_index.index());

	stored.category_labels = vec!["Dining > Cafe".to_string(), "Retail".to_string()];

	store.upsert(&cancel, &stored).await.expect("Failed to upsert place.");

	let fetched = store.get(&cancel, "round").await.expect("Failed to get place.");

	assert_eq!(fetched, stored);

	// Full replacement clears fields the new version leaves empty.
	let replacement = place("round", "Renamed", 35.17, 33.36, &[]);

	store.upsert(&cancel, &replacement).await.expect("Failed to replace place.");

	let fetched = store.get(&cancel, "round").await.expect("Failed to get place.");

	assert_eq!(fetched.name, "Renamed");
	assert!(fetched.category_ids.is_empty());
	assert!(fetched.category_labels.is_empty());

	store.delete(&cancel, "round").await.expect("Failed to delete place.");
	store.delete(&cancel, "round").await.expect("Failed to delete missing place.");

	let missing = store.get(&cancel, "round").await.expect("Failed to get missing place.");

	assert!(missing.is_empty());

	test_index.cleanup().await.expect("Failed to cleanup test index.");
}

#[tokio::test]
#[ignore = "Requires external Valkey with the search module. Set REDCAT_VALKEY_URL to run."]
async fn ensure_index_is_idempotent_and_race_safe() {
	let Some(url) = redcat_testkit::env_valkey_url() else {
		eprintln!("Skipping ensure_index_is_idempotent_and_race_safe; set REDCAT_VALKEY_URL to run.");

		return;
	};
	let test_index = TestIndex::new(&url);
	let first = ValkeyStore::connect(&test_index.valkey_config())
		.await
		.expect("Failed to connect to Valkey.");
	let second = ValkeyStore::connect(&test_index.valkey_config())
		.await
		.expect("Failed to connect to Valkey.");
	let cancel = CancellationToken::new();
	let (a, b) =
		tokio::join!(first.ensure_places_index(&cancel), second.ensure_places_index(&cancel));

	a.expect("Failed to ensure index from first store.");
	b.expect("Failed to ensure index from second store.");
	first.ensure_places_index(&cancel).await.expect("Failed to re-ensure index.");

	test_index.cleanup().await.expect("Failed to cleanup test index.");
}

#[tokio::test]
#[ignore = "Requires external Valkey with the search module. Set REDCAT_VALKEY_URL to run."]
async fn cancelled_token_short_circuits_commands() {
	let Some(url) = redcat_testkit::env_valkey_url() else {
		eprintln!("Skipping cancelled_token_short_circuits_commands; set REDCAT_VALKEY_URL to run.");

		return;
	};
	let test_index = TestIndex::new(&url);
	let store = ValkeyStore::connect(&test_index.valkey_config())
		.await
		.expect("Failed to connect to Valkey.");
	let cancel = CancellationToken::new();

	cancel.cancel();

	let result = store.get(&cancel, "anything").await;

	assert!(matches!(result, Err(Error::Cancelled)));

	let result = store.upsert(&cancel, &place("x", "X", 0.0, 0.0, &[])).await;

	assert!(matches!(result, Err(Error::Cancelled)));

	test_index.cleanup().await.expect("Failed to cleanup test index.");
}

#[tokio::test]
#[ignore = "Requires external Valkey with the search module. Set REDCAT_VALKEY_URL to run."]
async fn blank_ids_are_rejected_before_any_command() {
	let Some(url) = redcat_testkit::env_valkey_url() else {
		eprintln!("Skipping blank_ids_are_rejected_before_any_command; set REDCAT_VALKEY_URL to run.");

		return;
	};

	redcat_testkit::with_test_index(&url, |test_index| {
		let cfg = test_index.valkey_config();

		async move {
			let store = ValkeyStore::connect(&cfg).await.expect("Failed to connect to Valkey.");
			let cancel = CancellationToken::new();

			assert!(matches!(store.get(&cancel, "  ").await, Err(Error::Validation(_))));
			assert!(matches!(store.delete(&cancel, "").await, Err(Error::Validation(_))));
			assert!(matches!(
				store.upsert(&cancel, &place(" ", "Blank", 0.0, 0.0, &[])).await,
				Err(Error::Validation(_))
			));

			Ok(())
		}
	})
	.await
	.expect("Failed to run blank id checks.");
}
