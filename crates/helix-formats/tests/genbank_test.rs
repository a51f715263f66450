use helix_core::location::{CompoundOp, Location};
use helix_core::sequence::MetadataValue;
use helix_formats::iterator::RecordIterator;
use pretty_assertions::assert_eq;

const S1_MINIMAL: &str = include_str!("fixtures/s1_minimal.gb");

fn parse_one(source: &str) -> helix_core::sequence::Sequence {
    RecordIterator::new(source)
        .next()
        .expect("a record")
        .expect("parse to succeed")
}

#[test]
fn parses_locus_fields() {
    let record = parse_one(S1_MINIMAL);
    assert_eq!(record.name, "AJ131352");
    assert_eq!(record.id, "AJ131352");
    assert_eq!(record.data.len(), 1104);
    assert_eq!(
        record.annotations.get("molecule_type"),
        Some(&MetadataValue::Text("DNA".to_string()))
    );
    assert_eq!(
        record.annotations.get("topology"),
        Some(&MetadataValue::Text("linear".to_string()))
    );
    assert_eq!(
        record.annotations.get("data_file_division"),
        Some(&MetadataValue::Text("PLN".to_string()))
    );
}

#[test]
fn parses_version_and_accession() {
    let record = parse_one(S1_MINIMAL);
    assert_eq!(
        record.annotations.get("sequence_version"),
        Some(&MetadataValue::Integer(1))
    );
    assert_eq!(
        record.annotations.get("accessions"),
        Some(&MetadataValue::List(vec![MetadataValue::Text("AJ131352".to_string())]))
    );
}

#[test]
fn parses_source_and_taxonomy() {
    let record = parse_one(S1_MINIMAL);
    assert_eq!(
        record.annotations.get("organism"),
        Some(&MetadataValue::Text("Test organism".to_string()))
    );
    let MetadataValue::List(taxa) = record.annotations.get("taxonomy").unwrap() else {
        panic!("expected a list");
    };
    assert!(taxa.contains(&MetadataValue::Text("Fungi".to_string())));
}

#[test]
fn parses_reference_block() {
    let record = parse_one(S1_MINIMAL);
    let MetadataValue::List(refs) = record.annotations.get("references").unwrap() else {
        panic!("expected a list");
    };
    assert_eq!(refs.len(), 1);
    let MetadataValue::List(fields) = &refs[0] else {
        panic!("expected a list entry");
    };
    assert_eq!(fields[0], MetadataValue::Integer(1));
    assert_eq!(fields[2], MetadataValue::Text("A study of a test gene".to_string()));
}

#[test]
fn parses_all_nine_features() {
    let record = parse_one(S1_MINIMAL);
    assert_eq!(record.features.len(), 9);
    assert_eq!(record.features[0].key, "source");
    assert_eq!(record.features[1].key, "CDS");
    let exon_count = record.features.iter().filter(|f| f.key == "exon").count();
    let intron_count = record.features.iter().filter(|f| f.key == "intron").count();
    assert_eq!(exon_count, 4);
    assert_eq!(intron_count, 3);
}

#[test]
fn cds_location_is_a_join_of_four_parts() {
    let record = parse_one(S1_MINIMAL);
    let cds = record.features.iter().find(|f| f.key == "CDS").unwrap();
    match &cds.location {
        Location::Compound { operation, parts } => {
            assert_eq!(*operation, CompoundOp::Join);
            assert_eq!(parts.len(), 4);
            assert_eq!(parts[0].bounds(), (0, 117));
            assert_eq!(parts[3].bounds(), (966, 1104));
        }
        Location::Simple(_) => panic!("expected a compound join location"),
    }
}

#[test]
fn translation_qualifier_is_stripped_of_quotes_and_whitespace() {
    let record = parse_one(S1_MINIMAL);
    let cds = record.features.iter().find(|f| f.key == "CDS").unwrap();
    let translation = cds
        .get_qualifier("translation")
        .expect("translation qualifier present")
        .expect("translation has a value");
    assert_eq!(translation, "MEDYDPWNLRFQSKYKSRDA");
}

#[test]
fn other_qualifiers_keep_their_quotes() {
    let record = parse_one(S1_MINIMAL);
    let cds = record.features.iter().find(|f| f.key == "CDS").unwrap();
    let product = cds.get_qualifier("product").unwrap().unwrap();
    assert_eq!(product, "\"test protein\"");
}

#[test]
fn record_iterator_stops_cleanly_at_eof() {
    let mut it = RecordIterator::new(S1_MINIMAL);
    assert!(it.next().unwrap().is_ok());
    assert!(it.next().is_none());
}

#[test]
fn two_records_back_to_back_both_parse() {
    let doubled = format!("{S1_MINIMAL}{S1_MINIMAL}");
    let records: Vec<_> = RecordIterator::new(&doubled).collect();
    assert_eq!(records.len(), 2);
    for r in &records {
        assert!(r.is_ok());
        assert_eq!(r.as_ref().unwrap().data.len(), 1104);
    }
}

#[test]
fn with_features_false_skips_features_but_keeps_sequence() {
    let record = RecordIterator::new(S1_MINIMAL)
        .with_features(false)
        .next()
        .expect("a record")
        .expect("parse to succeed");
    assert!(record.features.is_empty());
    assert_eq!(record.data.len(), 1104);
    assert_eq!(record.name, "AJ131352");
}

#[test]
fn malformed_record_then_valid_record_resyncs() {
    let garbage = "LOCUS       broken\nORIGIN\n        1 acgt\n//\n";
    let combined = format!("{garbage}{S1_MINIMAL}");
    let mut it = RecordIterator::new(&combined);
    assert!(it.next().expect("a result for the broken record").is_err());
    let second = it.next().expect("a result for the resynced record");
    assert!(second.is_ok());
    assert_eq!(second.unwrap().name, "AJ131352");
    assert!(it.next().is_none());
}

#[test]
fn dblink_joins_accession_and_id_without_double_colon() {
    let record = parse_one(S1_MINIMAL);
    assert_eq!(record.dbxrefs, vec!["BioProject:PRJNA12144".to_string()]);
}

#[test]
fn nid_pid_gi_are_captured_in_annotations() {
    let record = parse_one(S1_MINIMAL);
    assert_eq!(
        record.annotations.get("nid"),
        Some(&MetadataValue::Text("g1234567".to_string()))
    );
    assert_eq!(
        record.annotations.get("pid"),
        Some(&MetadataValue::Text("g7654321".to_string()))
    );
    assert_eq!(
        record.annotations.get("gi"),
        Some(&MetadataValue::Text("1234567".to_string()))
    );
}

#[test]
fn consrtm_is_kept_distinct_from_authors() {
    let record = parse_one(S1_MINIMAL);
    let MetadataValue::List(refs) = record.annotations.get("references").unwrap() else {
        panic!("expected a list");
    };
    let MetadataValue::List(fields) = &refs[0] else {
        panic!("expected a list entry");
    };
    assert_eq!(fields[1], MetadataValue::Text("Doe,J.".to_string()));
}
