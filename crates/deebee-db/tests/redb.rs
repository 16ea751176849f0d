#![cfg(feature = "redb")]

use bson::doc;
use deebee_db::{Database, DatabaseConfig};
use deebee_store::RedbStore;

fn open(dir: &tempfile::TempDir) -> Database<RedbStore> {
    let store = RedbStore::open(&dir.path().join("deebee.redb")).unwrap();
    Database::open(store, DatabaseConfig::default())
}

#[test]
fn documents_and_indexes_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let db = open(&dir);
        let coll = db.collection("example").unwrap();
        coll.create_index(["color", "flavor"]).unwrap();
        coll.insert(doc! { "color": "red", "flavor": "watermelon" })
            .unwrap();
        coll.insert(doc! { "color": "red", "flavor": "raspberry" })
            .unwrap();
        coll.insert(doc! { "color": "purple", "flavor": "good" })
            .unwrap();
    }

    let db = open(&dir);
    let coll = db.collection("example").unwrap();
    assert_eq!(coll.list_indexes().unwrap().len(), 1);

    let cursor = coll
        .find(doc! { "color": "red" })
        .unwrap()
        .sort("flavor", -1);
    assert!(cursor.get_index().unwrap().is_some());
    let flavors: Vec<String> = cursor
        .to_vec()
        .unwrap()
        .iter()
        .map(|d| d.get_str("flavor").unwrap().to_string())
        .collect();
    assert_eq!(flavors, vec!["watermelon", "raspberry"]);
}
