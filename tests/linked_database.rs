use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use gldb::{
    CsvStore, DataStore, DatabaseConfig, FederationConfig, FederationRequest,
    GenericLinkedDatabase, InMemoryRdfStore, MissingDataPolicy, Query, QueryLanguage,
    QueryResult, Store, StoreConfig, StoreError, StoreResult,
};
use serde_json::json;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

fn rdf_and_csv() -> (Arc<InMemoryRdfStore>, Arc<CsvStore>, GenericLinkedDatabase) {
    let rdf = Arc::new(InMemoryRdfStore::new().unwrap());
    let csv = Arc::new(CsvStore::new());
    let db = GenericLinkedDatabase::from_stores([
        ("rdf_database", rdf.clone() as Arc<dyn Store>),
        ("csv_database", csv.clone() as Arc<dyn Store>),
    ])
    .unwrap();
    (rdf, csv, db)
}

async fn loaded_database() -> GenericLinkedDatabase {
    let (_, _, db) = rdf_and_csv();
    for file in ["metadata.ttl", "temperature.csv", "random_data.csv", "users.csv"] {
        assert!(db.linked_upload(&fixture(file)).await.unwrap(), "{file} should load");
    }
    db
}

/// A sink accepting JSON-LD files; counts upload attempts
struct JsonLdSink {
    uploads: AtomicUsize,
}

#[async_trait]
impl Store for JsonLdSink {
    fn store_type(&self) -> &'static str {
        "jsonld_sink"
    }

    fn display_name(&self) -> &'static str {
        "JSON-LD Sink"
    }

    fn query_language(&self) -> QueryLanguage {
        QueryLanguage::Sparql
    }

    fn expected_file_extensions(&self) -> BTreeSet<String> {
        BTreeSet::from([".jsonld".to_string()])
    }

    async fn execute_query(&self, _query: &Query) -> StoreResult<QueryResult> {
        Err(StoreError::unsupported("sink stores cannot be queried"))
    }

    async fn upload_file(&self, _path: &Path) -> StoreResult<bool> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

#[tokio::test]
async fn test_store_names_are_unique() {
    let (_, _, db) = rdf_and_csv();
    assert_eq!(db.manager().len(), 2);
    assert_eq!(db.get("rdf_database").unwrap().store_type(), "in_memory_rdf");
    assert_eq!(db.store("csv_database").unwrap().store_type(), "csv");

    let err = db
        .add_store("csv_database", Arc::new(CsvStore::new()))
        .unwrap_err();
    assert_eq!(err, StoreError::duplicate_name("csv_database"));
    assert_eq!(db.manager().len(), 2);

    assert!(db.get("graphdb").err().unwrap().is_not_found());
}

#[tokio::test]
async fn test_stores_are_partitioned_by_capability() {
    let (_, _, db) = rdf_and_csv();
    let data: Vec<String> = db.data_stores().into_iter().map(|(n, _)| n).collect();
    let meta: Vec<String> = db.metadata_stores().into_iter().map(|(n, _)| n).collect();
    assert_eq!(data, vec!["csv_database"]);
    assert_eq!(meta, vec!["rdf_database"]);
}

#[tokio::test]
async fn test_result_keeps_query_and_description() {
    let db = loaded_database().await;
    let query = Query::sparql("SELECT ?s ?p ?o WHERE { ?s ?p ?o }").with_description("all triples");

    let result = db.execute_query("rdf_database", &query).await.unwrap();
    assert_eq!(result.query().id(), query.id());
    assert_eq!(result.description(), Some("all triples"));
    assert_eq!(result.len(), Ok(8));

    // executing again yields an independent result
    let again = db.execute_query("rdf_database", &query).await.unwrap();
    assert_eq!(again.len(), Ok(8));
}

#[tokio::test]
async fn test_query_factory_binds_dialect() {
    let db = loaded_database().await;
    let csv = db.get("csv_database").unwrap();

    let query = csv.query("users.csv");
    assert_eq!(query.language(), QueryLanguage::Table);
    let table = query.execute(csv.as_ref()).await.unwrap().into_table().unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.columns[2].data_type, "bool");

    let err = db
        .execute_query("csv_database", &Query::sparql("ASK {}"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::UnsupportedOperation { .. }));
}

#[tokio::test]
async fn test_sparql_and_route_use_first_matching_store() {
    let db = loaded_database().await;

    let ask = db
        .sparql("ASK { <https://example.org/random_dataset> ?p ?o }")
        .await
        .unwrap();
    assert_eq!(ask.data(), &gldb::ResultData::Boolean { value: true });

    let table = db.route(&Query::table("random_data.csv")).await.unwrap();
    assert_eq!(table.len(), Ok(4));

    let err = db.sparql("SELECT WHERE {").await.unwrap_err();
    assert!(matches!(err, StoreError::QuerySyntax { .. }));
}

#[tokio::test]
async fn test_csv_upload_is_idempotent() {
    let (_, csv, db) = rdf_and_csv();
    let path = fixture("random_data.csv");

    assert!(db.linked_upload(&path).await.unwrap());
    assert!(db.linked_upload(&path).await.unwrap());
    assert_eq!(csv.table_names().await.unwrap(), vec!["random_data.csv"]);
    assert_eq!(csv.table("random_data.csv").unwrap().len(), 4);
}

#[tokio::test]
async fn test_rdf_upload_is_idempotent() {
    let (rdf, _, db) = rdf_and_csv();
    let path = fixture("metadata.ttl");

    assert!(db.linked_upload(&path).await.unwrap());
    assert!(db.linked_upload(&path).await.unwrap());
    assert_eq!(rdf.triple_count().unwrap(), 8);
}

#[tokio::test]
async fn test_csv_upload_without_a_claiming_store() {
    let rdf = Arc::new(InMemoryRdfStore::new().unwrap());
    let sink = Arc::new(JsonLdSink {
        uploads: AtomicUsize::new(0),
    });
    let db = GenericLinkedDatabase::from_stores([
        ("rdf_database", rdf.clone() as Arc<dyn Store>),
        ("jsonld_database", sink.clone() as Arc<dyn Store>),
    ])
    .unwrap();

    assert!(!db.linked_upload(&fixture("temperature.csv")).await.unwrap());
    assert_eq!(rdf.triple_count().unwrap(), 0);
    assert_eq!(sink.uploads.load(Ordering::SeqCst), 0);

    let err = db.linked_upload(&fixture("absent.csv")).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_datasets_created_on_date() {
    let db = loaded_database().await;

    let results = db.datasets_created_on("2024-01-01").await.unwrap();
    assert_eq!(results.len(), 1);

    let record = &results[0];
    assert_eq!(record.data().name, "temperature.csv");
    assert_eq!(record.data().len(), 3);
    assert_eq!(record.data().columns[1].data_type, "float");

    let metadata = record.metadata();
    assert_eq!(metadata["@id"], json!("ex:temperature_dataset"));
    assert_eq!(metadata["@type"], json!("dcat:Dataset"));
    assert_eq!(metadata["dcterms:created"], json!("2024-01-01"));
    assert_eq!(metadata["dcterms:title"], json!("Temperature measurements"));
    assert_eq!(metadata["dcat:distribution"], json!("ex:temperature_distribution"));
    assert_eq!(
        metadata["@context"],
        json!({
            "dcat": "http://www.w3.org/ns/dcat#",
            "dcterms": "http://purl.org/dc/terms/",
            "ex": "https://example.org/"
        })
    );

    assert!(db.datasets_created_on("1999-12-31").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_data_policy() {
    let db = loaded_database().await;
    assert!(db.linked_upload(&fixture("orphan.ttl")).await.unwrap());

    let err = db.datasets_created_on("2024-01-01").await.unwrap_err();
    assert_eq!(
        err,
        StoreError::missing_data("https://example.org/orphan_dataset", "deleted.csv")
    );

    let request =
        FederationRequest::created_on("2024-01-01").with_missing_data(MissingDataPolicy::Skip);
    let report = db.federate(&request).await.unwrap();
    assert_eq!(report.candidates, 2);
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].data().name, "temperature.csv");
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].dataset, "https://example.org/orphan_dataset");
    assert_eq!(report.skipped[0].key, "deleted.csv");
    assert!(!report.is_complete());
}

#[tokio::test]
async fn test_configured_database_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("gldb.json");

    let config = DatabaseConfig {
        stores: vec![
            StoreConfig::InMemoryRdf {
                name: "rdf_database".to_string(),
                namespaces: None,
                skolem_base: None,
            },
            StoreConfig::Csv {
                name: "csv_database".to_string(),
                delimiter: None,
            },
        ],
        federation: FederationConfig {
            missing_data: MissingDataPolicy::Skip,
            ..FederationConfig::default()
        },
    };
    config.save(&config_path).unwrap();

    let loaded = DatabaseConfig::load(&config_path).unwrap();
    assert_eq!(loaded, config);

    let db = GenericLinkedDatabase::from_config(&loaded).unwrap();
    assert_eq!(
        db.info(),
        "GenericLinkedDatabase(stores=[rdf_database: in_memory_rdf, csv_database: csv])"
    );
    for file in ["metadata.ttl", "orphan.ttl", "temperature.csv"] {
        assert!(db.linked_upload(&fixture(file)).await.unwrap());
    }

    // skip policy comes from the config
    let results = db.datasets_created_on("2024-01-01").await.unwrap();
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn test_federation_names_explicit_stores() {
    let db = loaded_database().await;
    db.add_store("spare_csv", Arc::new(CsvStore::new())).unwrap();

    // the spare store holds no tables, so every candidate is missing
    let request = FederationRequest::created_on("2024-01-01")
        .with_metadata_store("rdf_database")
        .with_data_store("spare_csv")
        .with_missing_data(MissingDataPolicy::Skip);
    let report = db.federate(&request).await.unwrap();
    assert!(report.results.is_empty());
    assert_eq!(report.skipped.len(), 1);

    let request = FederationRequest::created_on("2024-01-01").with_data_store("nope");
    assert!(db.federate(&request).await.unwrap_err().is_not_found());
}
