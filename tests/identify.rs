use csv_fusion::{
    identify::{ID_COLUMN_ALIASES, IdentifierDetector, detect_id_column},
    table::{Column, Table},
};

fn table_with(names: &[&str]) -> Table {
    Table::from_columns(names.iter().map(|n| Column::new(*n, vec![None])).collect()).unwrap()
}

#[test]
fn detection_ignores_case_and_outer_whitespace() {
    let table = table_with(&["income", " Customer_ID "]);
    assert_eq!(detect_id_column(&table), Some(" Customer_ID ".to_string()));
}

#[test]
fn first_alias_in_column_order_wins() {
    let table = table_with(&["name", "ClientID", "cust_id"]);
    assert_eq!(detect_id_column(&table).as_deref(), Some("ClientID"));
}

#[test]
fn no_alias_means_no_identifier() {
    let table = table_with(&["customer", "identifier", "customer id"]);
    assert_eq!(detect_id_column(&table), None);
}

#[test]
fn every_builtin_alias_is_recognized() {
    let detector = IdentifierDetector::default();
    for alias in ID_COLUMN_ALIASES {
        assert!(detector.is_alias(&alias.to_uppercase()), "{alias}");
    }
}

#[test]
fn custom_aliases_replace_builtin_set() {
    let detector = IdentifierDetector::with_aliases(["Member_No"]);
    let table = table_with(&["customer_id", "member_no"]);
    assert_eq!(detector.detect(&table), Some("member_no"));
}
