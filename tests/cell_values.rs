use sheet_model::{
    Calendar, CellReference, CellValue, Date, DateTime, ErrorValue, Font, ModelError,
    NumberFormat, RichText, Time, Timedelta, Workbook, MAX_STRING_LENGTH,
};

fn r(text: &str) -> CellReference {
    CellReference::parse(text).unwrap()
}

fn wb() -> Workbook {
    Workbook::new()
}

#[test]
fn inferred_input_covers_the_whole_chain() {
    let mut wb = wb();
    let id = wb.active_sheet().id();

    let cases: &[(&str, CellValue)] = &[
        ("hello", CellValue::Text("hello".to_string())),
        ("", CellValue::Text(String::new())),
        ("=", CellValue::Text("=".to_string())),
        ("TRUE", CellValue::Boolean(true)),
        ("false", CellValue::Boolean(false)),
        ("42", CellValue::Number(42.0)),
        ("-13.5", CellValue::Number(-13.5)),
        ("-1E3", CellValue::Number(-1000.0)),
        ("2.4e-2", CellValue::Number(0.024)),
        ("#DIV/0!", CellValue::Error(ErrorValue::Div0)),
        ("#VALUE!", CellValue::Error(ErrorValue::Value)),
        ("#winning", CellValue::Text("#winning".to_string())),
    ];
    for (input, expected) in cases {
        wb.set_cell_value_inferred(id, r("A1"), input).unwrap();
        assert_eq!(&wb.active_sheet().value(r("A1")), expected, "{input:?}");
    }
}

#[test]
fn percent_input_scales_and_formats() {
    let mut wb = wb();
    let id = wb.active_sheet().id();

    wb.set_cell_value_inferred(id, r("A1"), "3.1%").unwrap();
    assert_eq!(wb.active_sheet().value(r("A1")), CellValue::Number(0.031));
    assert_eq!(
        wb.cell_number_format(id, r("A1")),
        Some(&NumberFormat::percentage())
    );

    wb.set_cell_value_inferred(id, r("A2"), "200%").unwrap();
    assert_eq!(wb.active_sheet().value(r("A2")), CellValue::Number(2.0));
}

#[test]
fn time_input_binds_a_time_format() {
    let mut wb = wb();
    let id = wb.active_sheet().id();

    wb.set_cell_value_inferred(id, r("A1"), "12:30:45").unwrap();
    let expected = Time::new(12, 30, 45, 0).to_number();
    assert_eq!(
        wb.active_sheet().value(r("A1")),
        CellValue::Number(expected)
    );
    assert_eq!(wb.cell_number_format(id, r("A1")), Some(&NumberFormat::time()));
    assert!(wb.cell_is_date(id, r("A1")));

    // Minutes:seconds with a fraction.
    wb.set_cell_value_inferred(id, r("A2"), "30:33.865633336").unwrap();
    let expected = Time::new(0, 30, 33, 865_633).to_number();
    assert_eq!(
        wb.active_sheet().value(r("A2")),
        CellValue::Number(expected)
    );

    // 30 hours is not a time of day.
    wb.set_cell_value_inferred(id, r("A3"), "30:40").unwrap();
    assert_eq!(
        wb.active_sheet().value(r("A3")),
        CellValue::Text("30:40".to_string())
    );
}

#[test]
fn formula_input_is_stored_without_the_equals_sign() {
    let mut wb = wb();
    let id = wb.active_sheet().id();

    wb.set_cell_value_inferred(id, r("C1"), "=SUM(A1:B2)").unwrap();
    let cell = wb.active_sheet().cell(r("C1")).unwrap();
    assert!(cell.has_formula());
    assert_eq!(cell.formula.as_deref(), Some("SUM(A1:B2)"));
    assert_eq!(cell.value, CellValue::Empty);
}

#[test]
fn illegal_control_characters_are_rejected() {
    let mut wb = wb();
    let id = wb.active_sheet().id();

    assert!(matches!(
        wb.set_cell_value(id, r("A1"), "null\u{0000}byte"),
        Err(ModelError::IllegalCharacter(0))
    ));
    assert!(matches!(
        wb.set_cell_value_inferred(id, r("A1"), "escape\u{001B}"),
        Err(ModelError::IllegalCharacter(0x1B))
    ));
    // Tab, newline and carriage return are fine.
    wb.set_cell_value(id, r("A1"), "a\tb\nc\rd").unwrap();
}

#[test]
fn overlong_text_is_silently_truncated() {
    let mut wb = wb();
    let id = wb.active_sheet().id();
    let long = "y".repeat(MAX_STRING_LENGTH + 5);

    wb.set_cell_value(id, r("A1"), long.as_str()).unwrap();
    match wb.active_sheet().value(r("A1")) {
        CellValue::Text(stored) => assert_eq!(stored.chars().count(), MAX_STRING_LENGTH),
        other => panic!("expected text, got {other:?}"),
    }
}

#[test]
fn rich_text_values_keep_their_runs() {
    let mut wb = wb();
    let id = wb.active_sheet().id();

    let rich = RichText::from_segments([
        ("plain ".to_string(), None),
        ("loud".to_string(), Some(Font::default().with_bold(true))),
    ]);
    wb.set_cell_value(id, r("A1"), rich.clone()).unwrap();
    match wb.active_sheet().value(r("A1")) {
        CellValue::RichText(stored) => {
            assert_eq!(stored, rich);
            assert_eq!(stored.plain_text(), "plain loud");
        }
        other => panic!("expected rich text, got {other:?}"),
    }

    // Fully unstyled runs store as a plain string.
    wb.set_cell_value(id, r("A2"), RichText::new("flat")).unwrap();
    assert_eq!(
        wb.active_sheet().value(r("A2")),
        CellValue::Text("flat".to_string())
    );

    // The same string rules apply as for plain text.
    assert!(matches!(
        wb.set_cell_value(id, r("A3"), RichText::new("bad\u{0002}")),
        Err(ModelError::IllegalCharacter(2))
    ));
}

#[test]
fn date_round_trip_through_the_cell() {
    let mut wb = wb();
    let id = wb.active_sheet().id();

    wb.set_cell_datetime(id, r("A1"), DateTime::new(2010, 7, 13, 6, 37, 41, 0))
        .unwrap();
    assert!(wb.cell_is_date(id, r("A1")));
    let back = wb.cell_as_datetime(id, r("A1")).unwrap();
    assert_eq!(back, DateTime::new(2010, 7, 13, 6, 37, 41, 0));

    assert!(matches!(
        wb.cell_as_datetime(id, r("Z9")),
        Err(ModelError::InvalidAttribute(_))
    ));
}

#[test]
fn the_calendar_changes_serial_numbers() {
    let mut wb = wb();
    wb.set_calendar(Calendar::Mac1904);
    let id = wb.active_sheet().id();

    wb.set_cell_date(id, r("A1"), Date::new(2016, 7, 16)).unwrap();
    assert_eq!(
        wb.active_sheet().value(r("A1")),
        CellValue::Number(41_105.0)
    );
}

#[test]
fn durations_bind_an_elapsed_format_that_is_not_a_date() {
    let mut wb = wb();
    let id = wb.active_sheet().id();

    wb.set_cell_timedelta(id, r("A1"), Timedelta::new(1, 3, 0, 0, 0))
        .unwrap();
    assert_eq!(wb.active_sheet().value(r("A1")), CellValue::Number(1.125));
    assert_eq!(
        wb.cell_number_format(id, r("A1")),
        Some(&NumberFormat::duration())
    );
    assert!(!wb.cell_is_date(id, r("A1")));
}

#[test]
fn error_values_read_back_typed() {
    let mut wb = wb();
    let id = wb.active_sheet().id();

    wb.active_sheet_mut()
        .cell_mut(r("A1"))
        .set_error("#N/A")
        .unwrap();
    let cell = wb.active_sheet().cell(r("A1")).unwrap();
    assert_eq!(cell.error().unwrap(), ErrorValue::Na);
    assert_eq!(cell.error().unwrap().to_string(), "#N/A");

    wb.set_cell_value(id, r("A1"), 5.0).unwrap();
    assert!(matches!(
        wb.active_sheet().cell(r("A1")).unwrap().error(),
        Err(ModelError::InvalidAttribute(_))
    ));
}
