use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Table};

use ptrend_core::Run;

/// Create a styled table for output
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS);
    table
}

/// Table of stored runs in canonical order
pub fn runs_table(runs: &[Run]) -> Table {
    let mut table = create_table();
    table.set_header(vec!["#", "ID", "Description", "Type"]);
    for run in runs {
        table.add_row(vec![
            Cell::new(run.order_index + 1).set_alignment(CellAlignment::Right),
            Cell::new(run.id).set_alignment(CellAlignment::Right),
            Cell::new(&run.description),
            Cell::new(run.test_type),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use ptrend_core::TestType;

    #[test]
    fn test_runs_table_lists_every_run() {
        let runs = vec![
            Run {
                id: 7,
                description: "release 1".to_string(),
                test_type: TestType::Jmeter,
                order_index: 0,
            },
            Run {
                id: 9,
                description: "release 2".to_string(),
                test_type: TestType::Jmeter,
                order_index: 1,
            },
        ];
        let rendered = runs_table(&runs).to_string();
        assert!(rendered.contains("release 1"));
        assert!(rendered.contains("release 2"));
        assert!(rendered.contains("jmeter"));
    }
}
