use sheet_model::{
    Alignment, CellReference, Color, Fill, Font, HorizontalAlignment, ModelError, NumberFormat,
    Workbook,
};

fn r(text: &str) -> CellReference {
    CellReference::parse(text).unwrap()
}

fn bold_font() -> Font {
    Font::default().with_bold(true)
}

#[test]
fn identical_formats_intern_to_one_id() {
    let mut wb = Workbook::new();
    let sheet = wb.stylesheet_mut();

    let a = sheet.create_format();
    let a = sheet.format_with_font(a, bold_font()).unwrap();
    let a = sheet
        .format_with_fill(a, Fill::solid(Color::red()))
        .unwrap();

    // Same components applied in the opposite order.
    let b = sheet.create_format();
    let b = sheet
        .format_with_fill(b, Fill::solid(Color::red()))
        .unwrap();
    let b = sheet.format_with_font(b, bold_font()).unwrap();

    assert_eq!(a, b);
    assert_eq!(sheet.fonts().len(), 1);
    assert_eq!(sheet.fills().len(), 1);
}

#[test]
fn setters_never_mutate_shared_records() {
    let mut wb = Workbook::new();
    let sheet = wb.stylesheet_mut();

    let base = sheet.create_format();
    let derived = sheet.format_with_font(base, bold_font()).unwrap();
    assert_ne!(base, derived);
    assert!(sheet.format(base).unwrap().font.is_none());

    let font_id = sheet.format(derived).unwrap().font.unwrap().id;
    assert_eq!(sheet.font(font_id), Some(&bold_font()));
}

#[test]
fn unknown_format_ids_are_key_errors() {
    let mut wb = Workbook::new();
    assert!(matches!(
        wb.stylesheet_mut().format_with_font(999, bold_font()),
        Err(ModelError::KeyNotFound(_))
    ));
    assert!(matches!(
        wb.set_cell_format(wb.active_sheet().id(), r("A1"), 999),
        Err(ModelError::KeyNotFound(_))
    ));
}

#[test]
fn reference_counts_track_cell_bindings() {
    let mut wb = Workbook::new();
    let id = wb.active_sheet().id();
    let format_id = {
        let sheet = wb.stylesheet_mut();
        let f = sheet.create_format();
        sheet.format_with_font(f, bold_font()).unwrap()
    };

    wb.set_cell_format(id, r("A1"), format_id).unwrap();
    wb.set_cell_format(id, r("B1"), format_id).unwrap();
    assert_eq!(wb.stylesheet().format_reference_count(format_id), 2);

    // Re-binding the same format is not double counted.
    wb.set_cell_format(id, r("A1"), format_id).unwrap();
    assert_eq!(wb.stylesheet().format_reference_count(format_id), 2);

    wb.clear_cell_format(id, r("A1")).unwrap();
    assert_eq!(wb.stylesheet().format_reference_count(format_id), 1);

    // Deleting the row releases the remaining binding.
    wb.delete_rows(id, 1, 1).unwrap();
    assert_eq!(wb.stylesheet().format_reference_count(format_id), 0);

    // Zero-count formats stay interned and usable.
    assert!(wb.stylesheet().format(format_id).is_some());
    wb.set_cell_format(id, r("C3"), format_id).unwrap();
    assert_eq!(wb.stylesheet().format_reference_count(format_id), 1);
}

#[test]
fn swapping_a_cell_format_moves_the_count() {
    let mut wb = Workbook::new();
    let id = wb.active_sheet().id();
    let plain = wb.stylesheet_mut().create_format();
    let centered = {
        let sheet = wb.stylesheet_mut();
        sheet
            .format_with_alignment(
                plain,
                Alignment {
                    horizontal: Some(HorizontalAlignment::Center),
                    ..Default::default()
                },
            )
            .unwrap()
    };

    wb.set_cell_format(id, r("A1"), plain).unwrap();
    wb.set_cell_format(id, r("A1"), centered).unwrap();
    assert_eq!(wb.stylesheet().format_reference_count(plain), 0);
    assert_eq!(wb.stylesheet().format_reference_count(centered), 1);
}

#[test]
fn named_styles_rebind_through_the_workbook() {
    let mut wb = Workbook::new();
    let id = wb.active_sheet().id();
    wb.stylesheet_mut().create_style("Percent").unwrap();
    {
        let sheet = wb.stylesheet_mut();
        let style_id = sheet.style("Percent").unwrap();
        let style_id = sheet
            .format_with_number_format(style_id, NumberFormat::percentage())
            .unwrap();
        sheet.restyle("Percent", style_id).unwrap();
    }

    wb.apply_cell_style(id, r("A1"), "Percent").unwrap();
    assert_eq!(
        wb.cell_number_format(id, r("A1")),
        Some(&NumberFormat::percentage())
    );
    assert_eq!(wb.cell_style_name(id, r("A1")).unwrap(), "Percent");

    assert!(matches!(
        wb.cell_style_name(id, r("B9")),
        Err(ModelError::InvalidAttribute(_))
    ));
    assert!(matches!(
        wb.apply_cell_style(id, r("A2"), "Missing"),
        Err(ModelError::KeyNotFound(_))
    ));
    assert!(matches!(
        wb.stylesheet_mut().create_style("Percent"),
        Err(ModelError::InvalidParameter(_))
    ));
}
