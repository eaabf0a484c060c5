use ns_core::Real;
use ns_eos::InterpEos;
use ns_table::Table;

/// Load the bundled APR-like core table (columns ed, pr in MeV/fm^3, nb in
/// 1/fm^3, mun in MeV) and bind it to an engine with the default crust.
pub fn apr_eos() -> InterpEos {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/apr_core.csv");
    let text = std::fs::read_to_string(path).expect("bundled core table");

    let mut table = Table::new();
    table.add_column("ed", "MeV/fm^3").unwrap();
    table.add_column("pr", "MeV/fm^3").unwrap();
    table.add_column("nb", "1/fm^3").unwrap();
    table.add_column("mun", "MeV").unwrap();
    for line in text.lines().skip(1) {
        let row: Vec<Real> = line
            .split(',')
            .map(|s| s.trim().parse().expect("numeric field"))
            .collect();
        table.push_row(&row).unwrap();
    }

    let mut eos = InterpEos::new();
    eos.default_low_dens_eos().unwrap();
    eos.read_table(&table, "ed", "pr", Some("nb")).unwrap();
    assert!(eos.check().is_empty());
    eos
}

pub fn init_tracing() {
    tracing_subscriber::fmt().with_test_writer().try_init().ok();
}
