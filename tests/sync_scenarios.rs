use clan_sheets::SyncError;
use clan_sheets::classify::{ABSENT_COLOR, ACTIVE_COLOR};
use clan_sheets::config::SyncConfig;
use clan_sheets::io::SpreadsheetClient;
use clan_sheets::io::memory::{ClientCall, MemoryClient};
use clan_sheets::mirror::mirror_sheet;
use clan_sheets::model::{
    CellRange, CellStyle, Color, SheetGrid, SheetStatus, SyncWarning, Worksheet,
};
use clan_sheets::roster::{read_roster, write_roster};
use clan_sheets::sync;
use pretty_assertions::assert_eq;

const SOURCE: &str = "source";
const DEST: &str = "clan";

fn grid(rows: &[&[&str]]) -> SheetGrid {
    rows.iter()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect()
}

fn wars_grid() -> SheetGrid {
    grid(&[
        &["War log", ""],
        &["Season 12", ""],
        &["Name", "Tag"],
        &["Alice", "#TAG1"],
        &["Bob", "#TAG2"],
        &["", ""],
    ])
}

fn source_with_wars() -> MemoryClient {
    let mut source = MemoryClient::new();
    source.create_spreadsheet(SOURCE, "Clan wars");
    source.seed_sheet(SOURCE, "Wars", wars_grid());
    source.set_background(SOURCE, "Wars", 3, 0, ACTIVE_COLOR);
    source.set_background(SOURCE, "Wars", 4, 0, ABSENT_COLOR);
    source.set_background(SOURCE, "Wars", 5, 0, ACTIVE_COLOR);
    source
}

fn empty_destination() -> MemoryClient {
    let mut destination = MemoryClient::new();
    destination.create_spreadsheet(DEST, "Clan");
    destination
}

#[test]
fn wars_sheet_becomes_tag_name_roster() {
    let source = source_with_wars();
    let mut destination = empty_destination();

    let report = sync::run(&source, SOURCE, &mut destination, DEST, &SyncConfig::default())
        .expect("sync runs");

    assert_eq!(
        report.status_of("Wars"),
        Some(&SheetStatus::RosterSynced { entries: 1 })
    );
    assert_eq!(
        destination.values(DEST, "Wars").expect("roster sheet"),
        grid(&[&["Player tag", "Player name"], &["TAG1", "Alice"]])
    );

    let sheet = destination.worksheet(DEST, "Wars").expect("created");
    assert_eq!((sheet.row_count, sheet.column_count), (1000, 2));

    let styles = destination.styles(DEST, "Wars");
    assert_eq!(styles.len(), 1);
    assert_eq!(styles[0].0, CellRange::row(0, 2));
    assert!(styles[0].1.bold);
    assert!(report.warnings.is_empty());
}

#[test]
fn extraction_alone_returns_only_active_rows() {
    let source = source_with_wars();
    let extraction = read_roster(&source, SOURCE, &SyncConfig::default()).expect("roster read");

    let entries: Vec<_> = extraction.roster.entries().collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].identifier, "TAG1");
    assert_eq!(entries[0].name, "Alice");
}

#[test]
fn missing_sheet_is_created_with_source_extent() {
    let mut source = MemoryClient::new();
    source.seed_sheet(SOURCE, "Members", grid(&[&["a", "b"], &["c", "d"]]));
    let mut destination = empty_destination();

    let report = sync::run(&source, SOURCE, &mut destination, DEST, &SyncConfig::default())
        .expect("sync runs");

    assert_eq!(
        report.status_of("Members"),
        Some(&SheetStatus::Mirrored { rows: 2 })
    );
    let sheet = destination.worksheet(DEST, "Members").expect("created");
    assert!(sheet.row_count >= 2 && sheet.column_count >= 2);
    assert_eq!(
        destination.values(DEST, "Members").expect("mirror"),
        grid(&[&["a", "b"], &["c", "d"]])
    );
}

#[test]
fn shrinking_source_leaves_no_stale_cells() {
    let mut source = MemoryClient::new();
    source.seed_sheet(SOURCE, "Members", grid(&[&["x"]]));
    let mut destination = empty_destination();
    let stale: SheetGrid = (0..5)
        .map(|row| (0..5).map(|col| format!("old{row}{col}")).collect())
        .collect();
    destination.seed_sheet(DEST, "Members", stale);

    sync::run(&source, SOURCE, &mut destination, DEST, &SyncConfig::default())
        .expect("sync runs");

    assert_eq!(
        destination.values(DEST, "Members").expect("mirror"),
        grid(&[&["x"]])
    );
    assert_eq!(
        destination.calls(),
        &[
            ClientCall::Clear {
                title: "Members".into()
            },
            ClientCall::Update {
                title: "Members".into(),
                row: 0,
                column: 0,
                rows: 1
            },
        ]
    );
}

#[test]
fn empty_source_sheet_empties_destination() {
    let mut source = MemoryClient::new();
    source.seed_sheet(SOURCE, "Notes", Vec::new());
    let mut destination = empty_destination();
    destination.seed_sheet(DEST, "Notes", grid(&[&["left", "over"]]));

    let report = sync::run(&source, SOURCE, &mut destination, DEST, &SyncConfig::default())
        .expect("sync runs");

    assert_eq!(
        report.status_of("Notes"),
        Some(&SheetStatus::Mirrored { rows: 0 })
    );
    assert!(destination.values(DEST, "Notes").expect("sheet").is_empty());
}

#[test]
fn empty_grid_into_missing_sheet_creates_single_cell_sheet() {
    let mut destination = empty_destination();
    let sheet = mirror_sheet(&mut destination, DEST, "Blank", &Vec::new()).expect("mirrored");
    assert_eq!((sheet.row_count, sheet.column_count), (1, 1));
    assert!(destination.values(DEST, "Blank").expect("sheet").is_empty());
}

#[test]
fn mirrored_grids_read_back_unchanged() {
    let grids = vec![
        grid(&[&["a"]]),
        grid(&[&["1", "2", "3"], &["", "x", ""], &["0042", "=SUM(A1:A2)", " padded "]]),
        grid(&[&["only"], &["ragged", "row", "here"]]),
        grid(&[&["", ""], &["", ""]]),
    ];

    for source_grid in grids {
        let mut destination = empty_destination();
        mirror_sheet(&mut destination, DEST, "Data", &source_grid).expect("mirrored");
        assert_eq!(destination.values(DEST, "Data").expect("sheet"), source_grid);
    }
}

#[test]
fn mirroring_twice_matches_mirroring_once() {
    let source_grid = grid(&[&["h1", "h2"], &["v1", "v2"], &["v3", ""]]);

    let mut once = empty_destination();
    mirror_sheet(&mut once, DEST, "Data", &source_grid).expect("first");

    let mut twice = empty_destination();
    mirror_sheet(&mut twice, DEST, "Data", &source_grid).expect("first");
    mirror_sheet(&mut twice, DEST, "Data", &source_grid).expect("second");

    assert_eq!(once.export(DEST), twice.export(DEST));
}

#[test]
fn short_colour_metadata_excludes_trailing_rows() {
    let mut source = MemoryClient::new();
    source.seed_sheet(
        SOURCE,
        "Wars",
        grid(&[
            &["", ""],
            &["", ""],
            &["Name", "Tag"],
            &["Alice", "#TAG1"],
            &["Bob", "#TAG2"],
            &["Carol", "#TAG3"],
        ]),
    );
    for row in 3..6 {
        source.set_background(SOURCE, "Wars", row, 0, ACTIVE_COLOR);
    }
    source.limit_color_rows(SOURCE, "Wars", 1);
    let mut destination = empty_destination();

    let report = sync::run(&source, SOURCE, &mut destination, DEST, &SyncConfig::default())
        .expect("sync runs");

    assert_eq!(
        report.status_of("Wars"),
        Some(&SheetStatus::RosterSynced { entries: 1 })
    );
    assert_eq!(
        destination.values(DEST, "Wars").expect("roster"),
        grid(&[&["Player tag", "Player name"], &["TAG1", "Alice"]])
    );
    assert_eq!(
        report.warnings,
        vec![
            SyncWarning::MissingColor { row: 4 },
            SyncWarning::MissingColor { row: 5 },
        ]
    );
}

#[test]
fn short_wars_sheet_writes_header_only() {
    let mut source = MemoryClient::new();
    source.seed_sheet(SOURCE, "Wars", grid(&[&["War log"], &["Name", "Tag"]]));
    let mut destination = empty_destination();
    destination.seed_sheet(DEST, "Wars", grid(&[&["OLD", "Stale player"]]));

    let report = sync::run(&source, SOURCE, &mut destination, DEST, &SyncConfig::default())
        .expect("sync runs");

    assert_eq!(
        report.status_of("Wars"),
        Some(&SheetStatus::RosterSynced { entries: 0 })
    );
    assert_eq!(
        destination.values(DEST, "Wars").expect("roster"),
        grid(&[&["Player tag", "Player name"]])
    );
}

#[test]
fn unreachable_spreadsheets_abort_before_any_sheet() {
    let source = MemoryClient::new();
    let mut destination = MemoryClient::new();

    let result = sync::run(&source, SOURCE, &mut destination, DEST, &SyncConfig::default());

    assert!(matches!(result, Err(SyncError::Access { ref spreadsheet, .. }) if spreadsheet == SOURCE));
    assert!(destination.calls().is_empty());
}

#[test]
fn unreachable_destination_aborts_before_any_sheet() {
    let mut source = source_with_wars();
    source.seed_sheet(SOURCE, "Members", grid(&[&["a"]]));
    let mut destination = MemoryClient::new();

    let result = sync::run(&source, SOURCE, &mut destination, DEST, &SyncConfig::default());

    assert!(matches!(result, Err(SyncError::Access { ref spreadsheet, .. }) if spreadsheet == DEST));
    assert!(destination.calls().is_empty());
}

/// Source that opens fine but cannot list its worksheets.
struct UnlistableSource(MemoryClient);

impl SpreadsheetClient for UnlistableSource {
    fn open(&self, spreadsheet_id: &str) -> clan_sheets::Result<String> {
        self.0.open(spreadsheet_id)
    }

    fn worksheets(&self, _spreadsheet_id: &str) -> clan_sheets::Result<Vec<Worksheet>> {
        Err(SyncError::Api {
            status: 503,
            message: "backend unavailable".into(),
        })
    }

    fn values(&self, spreadsheet_id: &str, title: &str) -> clan_sheets::Result<SheetGrid> {
        self.0.values(spreadsheet_id, title)
    }

    fn background_colors(
        &self,
        spreadsheet_id: &str,
        title: &str,
        range: CellRange,
    ) -> clan_sheets::Result<Vec<Option<Color>>> {
        self.0.background_colors(spreadsheet_id, title, range)
    }

    fn add_worksheet(
        &mut self,
        spreadsheet_id: &str,
        title: &str,
        rows: usize,
        columns: usize,
    ) -> clan_sheets::Result<Worksheet> {
        self.0.add_worksheet(spreadsheet_id, title, rows, columns)
    }

    fn clear(&mut self, spreadsheet_id: &str, sheet: &Worksheet) -> clan_sheets::Result<()> {
        self.0.clear(spreadsheet_id, sheet)
    }

    fn update(
        &mut self,
        spreadsheet_id: &str,
        sheet: &Worksheet,
        row: usize,
        column: usize,
        values: &SheetGrid,
    ) -> clan_sheets::Result<()> {
        self.0.update(spreadsheet_id, sheet, row, column, values)
    }

    fn format(
        &mut self,
        spreadsheet_id: &str,
        sheet: &Worksheet,
        range: CellRange,
        style: CellStyle,
    ) -> clan_sheets::Result<()> {
        self.0.format(spreadsheet_id, sheet, range, style)
    }
}

#[test]
fn unlistable_source_is_reported_as_access_failure() {
    let source = UnlistableSource(source_with_wars());
    let mut destination = empty_destination();

    let result = sync::run(&source, SOURCE, &mut destination, DEST, &SyncConfig::default());

    match result {
        Err(SyncError::Access {
            spreadsheet,
            reason,
        }) => {
            assert_eq!(spreadsheet, SOURCE);
            assert!(reason.contains("backend unavailable"), "reason: {reason}");
        }
        other => panic!("expected an access failure, got {other:?}"),
    }
    assert!(destination.calls().is_empty());
}

#[test]
fn failing_sheet_does_not_stop_the_run() {
    let mut source = source_with_wars();
    source.seed_sheet(SOURCE, "Members", grid(&[&["a"]]));
    source.seed_sheet(SOURCE, "Log", grid(&[&["b"]]));
    let mut destination = empty_destination();
    destination.seed_sheet(DEST, "Members", grid(&[&["old"]]));
    destination.fail_writes(DEST, "Members");

    let report = sync::run(&source, SOURCE, &mut destination, DEST, &SyncConfig::default())
        .expect("sync runs");

    let titles: Vec<&str> = report.sheets.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Wars", "Members", "Log"]);
    assert!(matches!(
        report.status_of("Members"),
        Some(SheetStatus::Failed { .. })
    ));
    assert_eq!(
        report.status_of("Log"),
        Some(&SheetStatus::Mirrored { rows: 1 })
    );
    assert_eq!(
        report.status_of("Wars"),
        Some(&SheetStatus::RosterSynced { entries: 1 })
    );
    assert!(report.has_failures());
    assert_eq!(destination.values(DEST, "Log").expect("log"), grid(&[&["b"]]));
}

#[test]
fn header_format_failure_is_a_warning_only() {
    let source = source_with_wars();
    let mut destination = empty_destination();
    destination.seed_sheet(DEST, "Wars", Vec::new());
    destination.fail_formatting(DEST, "Wars");

    let report = sync::run(&source, SOURCE, &mut destination, DEST, &SyncConfig::default())
        .expect("sync runs");

    assert_eq!(
        report.status_of("Wars"),
        Some(&SheetStatus::RosterSynced { entries: 1 })
    );
    assert!(matches!(
        report.warnings.as_slice(),
        [SyncWarning::HeaderFormat { sheet, .. }] if sheet == "Wars"
    ));
    assert!(
        destination
            .calls()
            .iter()
            .any(|call| matches!(call, ClientCall::Format { title, .. } if title == "Wars"))
    );
    assert_eq!(
        destination.values(DEST, "Wars").expect("roster"),
        grid(&[&["Player tag", "Player name"], &["TAG1", "Alice"]])
    );
}

#[test]
fn roster_write_clears_before_writing() {
    let mut destination = empty_destination();
    destination.seed_sheet(DEST, "Wars", grid(&[&["X", "Y"], &["A", "B"], &["C", "D"]]));
    let mut roster = clan_sheets::model::Roster::new();
    roster.insert("TAG9".into(), "Zed".into(), 3);

    let write = write_roster(&mut destination, DEST, &roster, &SyncConfig::default())
        .expect("roster written");

    assert_eq!(write.entries, 1);
    assert!(write.format_warning.is_none());
    let calls = destination.calls();
    assert!(matches!(calls[0], ClientCall::Clear { .. }));
    assert!(matches!(calls[1], ClientCall::Update { row: 0, rows: 1, .. }));
    assert!(matches!(calls[2], ClientCall::Update { row: 1, rows: 1, .. }));
    assert!(matches!(calls[3], ClientCall::Format { .. }));
    assert_eq!(
        destination.values(DEST, "Wars").expect("roster"),
        grid(&[&["Player tag", "Player name"], &["TAG9", "Zed"]])
    );
}

#[test]
fn roster_write_failure_marks_only_that_sheet() {
    let source = source_with_wars();
    let mut destination = empty_destination();
    destination.fail_writes(DEST, "Wars");

    let report = sync::run(&source, SOURCE, &mut destination, DEST, &SyncConfig::default())
        .expect("sync runs");

    assert!(matches!(
        report.status_of("Wars"),
        Some(SheetStatus::Failed { .. })
    ));
}

#[test]
fn custom_reference_colour_and_tolerance_apply() {
    let mut source = MemoryClient::new();
    source.seed_sheet(
        SOURCE,
        "Wars",
        grid(&[&[""], &[""], &[""], &["Alice", "#TAG1"], &["Bob", "#TAG2"]]),
    );
    source.set_background(SOURCE, "Wars", 3, 0, Color::new(0.0, 0.5, 1.0));
    source.set_background(SOURCE, "Wars", 4, 0, Color::new(0.0, 0.58, 1.0));
    let config = SyncConfig {
        active_color: Color::new(0.0, 0.52, 1.0),
        tolerance: 0.05,
        ..SyncConfig::default()
    };

    let extraction = read_roster(&source, SOURCE, &config).expect("roster read");

    assert_eq!(extraction.roster.get("TAG1"), Some("Alice"));
    assert_eq!(extraction.roster.get("TAG2"), None);
}

#[test]
fn renamed_roster_sheet_is_routed_by_configuration() {
    let mut source = source_with_wars();
    source.seed_sheet(SOURCE, "Roster", wars_grid());
    source.set_background(SOURCE, "Roster", 4, 0, ACTIVE_COLOR);
    let mut destination = empty_destination();
    let config = SyncConfig {
        roster_sheet: "Roster".into(),
        ..SyncConfig::default()
    };

    let report = sync::run(&source, SOURCE, &mut destination, DEST, &config).expect("sync runs");

    assert_eq!(
        report.status_of("Wars"),
        Some(&SheetStatus::Mirrored { rows: 6 })
    );
    assert_eq!(
        report.status_of("Roster"),
        Some(&SheetStatus::RosterSynced { entries: 1 })
    );
    assert_eq!(
        destination.values(DEST, "Roster").expect("roster"),
        grid(&[&["Player tag", "Player name"], &["TAG2", "Bob"]])
    );
    assert_eq!(destination.values(DEST, "Wars").expect("mirror"), wars_grid());
}
