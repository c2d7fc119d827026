use annofetch::chrom_map::{
    BundledMappings, ChromosomeMap, DirectoryMappings, MappingCatalog, mapping_file_name,
};
use annofetch::domain::Build;

fn build(name: &str) -> Build {
    name.parse().unwrap()
}

#[test]
fn every_bundled_build_resolves() {
    for name in BundledMappings::builds() {
        let map = BundledMappings.lookup(&build(name));
        assert!(!map.is_empty(), "{name} mapping is empty");
        assert_eq!(map.get("1"), Some("chr1"));
        assert_eq!(map.get("MT"), Some("chrM"));
    }
}

#[test]
fn missing_build_yields_empty_map() {
    let map = BundledMappings.lookup(&build("CanFam3.1"));
    assert!(map.is_empty());
    assert_eq!(map, ChromosomeMap::default());
}

#[test]
fn directory_mapping_overrides_bundled() {
    let temp = tempfile::tempdir().unwrap();
    let grch38 = build("GRCh38");
    std::fs::write(
        temp.path().join(mapping_file_name(&grch38)),
        "# custom\n1\tNC_000001.11\n",
    )
    .unwrap();

    let catalog = DirectoryMappings::new(temp.path());
    let map = catalog.lookup(&grch38);
    assert_eq!(map.len(), 1);
    assert_eq!(map.get("1"), Some("NC_000001.11"));
}

#[test]
fn directory_mapping_falls_back_to_bundled() {
    let temp = tempfile::tempdir().unwrap();
    let catalog = DirectoryMappings::new(temp.path());
    assert_eq!(catalog.lookup(&build("GRCh37")).get("X"), Some("chrX"));
    assert!(catalog.lookup(&build("Sscrofa11.1")).is_empty());
}

#[test]
fn boxed_catalog_delegates() {
    let catalog: Box<dyn MappingCatalog> = Box::new(BundledMappings);
    assert_eq!(catalog.lookup(&build("GRCm39")).get("19"), Some("chr19"));
}
