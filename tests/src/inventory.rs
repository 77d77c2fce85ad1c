use std::collections::BTreeMap;
use std::io::Write;

use fleetr_common::network::address::Address;
use fleetr_common::network::host::HostSet;
use fleetr_common::network::inventory::{resolve, InventoryInput, InventoryItem, RawMapping};
use fleetr_common::Error;
use tempfile::NamedTempFile;

use crate::util::addr;

fn yaml_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn named(pairs: &[(&str, &str)]) -> HostSet {
    HostSet::Named(
        pairs
            .iter()
            .map(|(name, address)| (name.to_string(), addr(address)))
            .collect::<BTreeMap<String, Address>>(),
    )
}

fn path_of(file: &NamedTempFile) -> String {
    file.path().to_string_lossy().into_owned()
}

#[test]
fn inverted_mapping_is_turned_around() {
    let input = InventoryInput::Mapping(RawMapping::from([
        ("10.0.0.5".to_string(), "web1".to_string()),
        ("10.0.0.6".to_string(), "web2".to_string()),
    ]));

    let hosts = resolve(&input).unwrap();
    assert_eq!(hosts, named(&[("web1", "10.0.0.5"), ("web2", "10.0.0.6")]));
}

#[test]
fn yaml_sources_are_merged_last_file_wins() {
    let first = yaml_file(
        "web:\n  hosts:\n    web1: 10.0.0.5\n    web2: 10.0.0.6\n",
    );
    let second = yaml_file(
        "db:\n  hosts:\n    db1: 10.0.1.5\n    web2: 10.0.0.66\n",
    );

    let input = InventoryInput::Sequence(vec![
        InventoryItem::Text(path_of(&first)),
        InventoryItem::Text(path_of(&second)),
    ]);

    let hosts = resolve(&input).unwrap();
    assert_eq!(
        hosts,
        named(&[
            ("db1", "10.0.1.5"),
            ("web1", "10.0.0.5"),
            ("web2", "10.0.0.66"),
        ])
    );
}

#[test]
fn yaml_sources_written_in_opposite_directions_are_merged() {
    let by_name = yaml_file("web:\n  hosts:\n    web1: 10.0.0.5\n");
    let by_address = yaml_file("db:\n  hosts:\n    10.0.1.5: db1\n");

    let input: InventoryInput = format!("{},{}", path_of(&by_name), path_of(&by_address))
        .parse()
        .unwrap();

    assert_eq!(
        resolve(&input).unwrap(),
        named(&[("db1", "10.0.1.5"), ("web1", "10.0.0.5")])
    );
}

#[test]
fn single_yaml_source_resolves_from_the_command_line_form() {
    let file = yaml_file("all:\n  hosts:\n    10.0.0.7: cache1\n");
    let input: InventoryInput = path_of(&file).parse().unwrap();

    assert_eq!(resolve(&input).unwrap(), named(&[("cache1", "10.0.0.7")]));
}

#[test]
fn missing_source_file_is_unresolvable() {
    let input = InventoryInput::Scalar("/definitely/not/here.yaml".to_string());
    assert!(matches!(
        resolve(&input),
        Err(Error::UnresolvableInventory(_))
    ));
}

#[test]
fn command_line_address_list_keeps_its_order() {
    let input: InventoryInput = "10.0.0.9, 10.0.0.2,::1".parse().unwrap();
    let hosts = resolve(&input).unwrap();
    assert_eq!(
        hosts,
        HostSet::List(vec![addr("10.0.0.9"), addr("10.0.0.2"), addr("::1")])
    );
}

#[test]
fn garbage_is_rejected() {
    let input = InventoryInput::Scalar("not-a-host".to_string());
    assert!(resolve(&input).is_err());
}
